//! Financial snapshot builder: pure normalisation of raw statements.

pub mod assemble;
pub mod lookup;
pub mod render;

pub use assemble::assemble_from_set;
pub use render::{render_peers, render_snapshot, MISSING};
