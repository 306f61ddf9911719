pub mod react;
pub mod tools;

pub use react::ReactAgent;
pub use tools::analysis_tools;
