//! Capabilities the agent may invoke, keyed by name.

use crate::analysis::{AnalysisKind, Analyst};
use crate::scraper::cleaner::normalise_ticker;
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

#[async_trait]
pub trait AgentTool: Send + Sync {
    /// Unique within a registry; this is what the model writes after `Action:`.
    fn name(&self) -> &str;

    /// Tells the model when to pick this tool.
    fn description(&self) -> &str;

    async fn call(&self, input: &str) -> Result<String>;
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn AgentTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn AgentTool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn AgentTool>> {
        self.tools.get(name.trim()).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// `name: description` lines for the planner prompt.
    pub fn describe(&self) -> String {
        self.tools
            .values()
            .map(|t| format!("{}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Pull a ticker out of free-form tool input: `"ITC"`, `ticker: itc`, `'TCS'`.
pub fn ticker_from_input(input: &str) -> Option<String> {
    let cleaned = input.trim().trim_matches(|c: char| c == '"' || c == '\'' || c == '`');
    let value = cleaned
        .split_once(['=', ':'])
        .map(|(_, v)| v)
        .unwrap_or(cleaned);
    value
        .split_whitespace()
        .next()
        .map(|t| normalise_ticker(t.trim_matches(|c: char| !c.is_alphanumeric() && c != '&' && c != '-')))
        .filter(|t| !t.is_empty())
}

/// One of the snapshot-backed analyses exposed as a tool.
pub struct AnalysisTool {
    analyst: Arc<Analyst>,
    kind: AnalysisKind,
}

impl AnalysisTool {
    pub fn new(analyst: Arc<Analyst>, kind: AnalysisKind) -> Self {
        Self { analyst, kind }
    }
}

#[async_trait]
impl AgentTool for AnalysisTool {
    fn name(&self) -> &str {
        match self.kind {
            AnalysisKind::Fundamental => "Fundamental Analysis",
            AnalysisKind::Forensic => "Forensic Audit",
        }
    }

    fn description(&self) -> &str {
        match self.kind {
            AnalysisKind::Fundamental => {
                "Analyzes the company's profit & loss, balance sheet, cash flow and shareholding \
pattern. Use this for the financial health of the company. Input: the company ticker."
            }
            AnalysisKind::Forensic => {
                "Performs forensic accounting analysis to detect red flags, fraud or financial \
manipulation. Use it only for red flags. Input: the company ticker."
            }
        }
    }

    async fn call(&self, input: &str) -> Result<String> {
        let Some(ticker) = ticker_from_input(input) else {
            bail!("expected a company ticker, got {:?}", input);
        };
        let report = self.analyst.analyze(&ticker, self.kind).await?;
        Ok(report.narrative)
    }
}

/// Registry holding both analysis tools.
pub fn analysis_tools(analyst: Arc<Analyst>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(AnalysisTool::new(Arc::clone(&analyst), AnalysisKind::Fundamental)));
    registry.register(Arc::new(AnalysisTool::new(analyst, AnalysisKind::Forensic)));
    registry
}
