use crate::error::TableError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ── Statement kinds ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    ProfitLoss,
    CashFlow,
    BalanceSheet,
    Shareholding,
}

impl StatementKind {
    pub const ALL: [StatementKind; 4] = [
        StatementKind::ProfitLoss,
        StatementKind::CashFlow,
        StatementKind::BalanceSheet,
        StatementKind::Shareholding,
    ];

    /// Label of the first column when the source leaves it blank.
    pub fn key_column(self) -> &'static str {
        match self {
            StatementKind::Shareholding => "Category",
            _ => "Line Item",
        }
    }

    /// `id` of the `<section>` holding this statement on a company page.
    pub fn section_id(self) -> &'static str {
        match self {
            StatementKind::ProfitLoss => "profit-loss",
            StatementKind::CashFlow => "cash-flow",
            StatementKind::BalanceSheet => "balance-sheet",
            StatementKind::Shareholding => "shareholding",
        }
    }

    /// File stem used by the offline CSV loader.
    pub fn file_stem(self) -> &'static str {
        match self {
            StatementKind::ProfitLoss => "profit_loss",
            StatementKind::CashFlow => "cash_flow",
            StatementKind::BalanceSheet => "balance_sheet",
            StatementKind::Shareholding => "shareholding",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatementKind::ProfitLoss => "Profit & Loss",
            StatementKind::CashFlow => "Cash Flow",
            StatementKind::BalanceSheet => "Balance Sheet",
            StatementKind::Shareholding => "Shareholding",
        })
    }
}

// ── Raw statement table ───────────────────────────────────────────────────────

/// One statement as extracted from the source.
///
/// The first column names the line item (or shareholder category); the rest
/// are reporting periods, oldest first. Rows are positional and always carry
/// exactly one cell per column. Zero rows is the "no data" representation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawStatementTable {
    kind: StatementKind,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawStatementTable {
    pub fn new(
        kind: StatementKind,
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> Result<Self, TableError> {
        if columns.is_empty() {
            return Err(TableError::NoColumns);
        }
        if let Some((row, cells)) = rows
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != columns.len())
        {
            return Err(TableError::RaggedRow {
                row,
                found: cells.len(),
                expected: columns.len(),
            });
        }
        Ok(Self { kind, columns, rows })
    }

    /// The explicit "no data" table: a single key column and no rows.
    pub fn empty(kind: StatementKind) -> Self {
        Self {
            kind,
            columns: vec![kind.key_column().to_string()],
            rows: Vec::new(),
        }
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Period labels, i.e. every column after the key column.
    pub fn periods(&self) -> &[String] {
        &self.columns[1..]
    }

    /// Cell lookup by row index and column label.
    #[cfg(test)]
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).map(|cells| cells[idx].as_str())
    }
}

/// The four raw statements for one ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementSet {
    pub profit_loss: RawStatementTable,
    pub cash_flow: RawStatementTable,
    pub balance_sheet: RawStatementTable,
    pub shareholding: RawStatementTable,
}

impl StatementSet {
    pub fn empty() -> Self {
        Self {
            profit_loss: RawStatementTable::empty(StatementKind::ProfitLoss),
            cash_flow: RawStatementTable::empty(StatementKind::CashFlow),
            balance_sheet: RawStatementTable::empty(StatementKind::BalanceSheet),
            shareholding: RawStatementTable::empty(StatementKind::Shareholding),
        }
    }

    pub fn get(&self, kind: StatementKind) -> &RawStatementTable {
        match kind {
            StatementKind::ProfitLoss => &self.profit_loss,
            StatementKind::CashFlow => &self.cash_flow,
            StatementKind::BalanceSheet => &self.balance_sheet,
            StatementKind::Shareholding => &self.shareholding,
        }
    }

    pub fn set(&mut self, table: RawStatementTable) {
        match table.kind() {
            StatementKind::ProfitLoss => self.profit_loss = table,
            StatementKind::CashFlow => self.cash_flow = table,
            StatementKind::BalanceSheet => self.balance_sheet = table,
            StatementKind::Shareholding => self.shareholding = table,
        }
    }

    /// Statements that came back with no rows, in canonical order.
    pub fn missing_sections(&self) -> Vec<StatementKind> {
        StatementKind::ALL
            .into_iter()
            .filter(|k| self.get(*k).is_empty())
            .collect()
    }

    pub fn all_empty(&self) -> bool {
        StatementKind::ALL.iter().all(|k| self.get(*k).is_empty())
    }
}

// ── Snapshot ──────────────────────────────────────────────────────────────────

/// Normalised best-effort summary of one company's statements.
///
/// `None` is the missing marker: every field may be absent independently.
/// Series hold the raw cells of the five most recent periods, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialSnapshot {
    pub sales_series: Vec<Option<String>>,
    pub net_profit_series: Vec<Option<String>>,
    pub cfo_series: Vec<Option<String>>,

    pub total_assets: Option<String>,
    pub borrowings: Option<String>,
    pub cash_equivalents: Option<String>,
    pub current_assets: Option<String>,
    pub current_liabilities: Option<String>,
    pub current_ratio: Option<f64>,

    pub promoter_holding_pct: Option<String>,
    pub fii_holding_pct: Option<String>,
}

impl FinancialSnapshot {
    /// Names of the fields that carry no data at all.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let series = [
            ("sales_series", &self.sales_series),
            ("net_profit_series", &self.net_profit_series),
            ("cfo_series", &self.cfo_series),
        ];
        let scalars = [
            ("total_assets", &self.total_assets),
            ("borrowings", &self.borrowings),
            ("cash_equivalents", &self.cash_equivalents),
            ("current_assets", &self.current_assets),
            ("current_liabilities", &self.current_liabilities),
            ("promoter_holding_pct", &self.promoter_holding_pct),
            ("fii_holding_pct", &self.fii_holding_pct),
        ];

        let mut missing: Vec<&'static str> = series
            .into_iter()
            .filter(|(_, s)| s.iter().all(Option::is_none))
            .map(|(name, _)| name)
            .collect();
        missing.extend(scalars.into_iter().filter(|(_, v)| v.is_none()).map(|(n, _)| n));
        if self.current_ratio.is_none() {
            missing.push("current_ratio");
        }
        missing
    }
}

// ── Peer bundle ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanySnapshot {
    pub ticker: String,
    pub snapshot: FinancialSnapshot,
}

/// A peer that was discovered but could not be included.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedPeer {
    pub ticker: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerBundle {
    pub target: CompanySnapshot,
    pub peers: Vec<CompanySnapshot>,
    pub skipped: Vec<SkippedPeer>,
}

impl PeerBundle {
    pub fn peer_tickers(&self) -> Vec<&str> {
        self.peers.iter().map(|p| p.ticker.as_str()).collect()
    }
}
