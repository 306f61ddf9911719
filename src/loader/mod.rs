//! Offline statement source backed by CSV exports.
//!
//! Layout: `<root>/<TICKER>/{profit_loss,cash_flow,balance_sheet,shareholding}.csv`,
//! first record is the header row.

use crate::error::FetchError;
use crate::models::{RawStatementTable, StatementKind};
use crate::scraper::cleaner::normalise_ticker;
use crate::scraper::StatementSource;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct CsvStatementSource {
    root: PathBuf,
}

impl CsvStatementSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn statement_path(&self, ticker: &str, kind: StatementKind) -> PathBuf {
        self.root
            .join(normalise_ticker(ticker))
            .join(format!("{}.csv", kind.file_stem()))
    }
}

/// Parse one statement CSV. A missing file is the empty table; a row whose
/// width disagrees with the header is a `TableError`.
pub fn load_statement_csv(path: &Path, kind: StatementKind) -> Result<RawStatementTable, FetchError> {
    if !path.exists() {
        debug!("{:?} not found, treating {} as empty", path, kind);
        return Ok(RawStatementTable::empty(kind));
    }

    let csv_err = |source| FetchError::Csv {
        path: path.display().to_string(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let mut columns: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    match columns.first_mut() {
        Some(first) if first.is_empty() => *first = kind.key_column().to_string(),
        Some(_) => {}
        None => return Ok(RawStatementTable::empty(kind)),
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        rows.push(record.iter().map(|c| c.trim().to_string()).collect());
    }

    let table = RawStatementTable::new(kind, columns, rows)?;
    debug!("{:?}: {} rows", path, table.rows().len());
    Ok(table)
}

#[async_trait]
impl StatementSource for CsvStatementSource {
    async fn fetch_statement(
        &self,
        ticker: &str,
        kind: StatementKind,
    ) -> Result<RawStatementTable, FetchError> {
        load_statement_csv(&self.statement_path(ticker, kind), kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TableError;
    use crate::scraper::collect_statements;
    use crate::snapshot::assemble_from_set;
    use std::fs;

    fn fixture_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("screener-analyst-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("ITC")).unwrap();
        dir
    }

    #[test]
    fn missing_file_is_empty_table() {
        let dir = fixture_dir("missing");
        let t = load_statement_csv(&dir.join("ITC/cash_flow.csv"), StatementKind::CashFlow).unwrap();
        assert!(t.is_empty());
        assert_eq!(t.columns(), ["Line Item"]);
    }

    #[test]
    fn ragged_csv_fails_loudly() {
        let dir = fixture_dir("ragged");
        let path = dir.join("ITC/profit_loss.csv");
        fs::write(&path, ",2022,2023\nSales,10,12\nNet Profit,1\n").unwrap();
        let err = load_statement_csv(&path, StatementKind::ProfitLoss).unwrap_err();
        assert!(matches!(
            err,
            FetchError::Table(TableError::RaggedRow { row: 1, found: 2, expected: 3 })
        ));
    }

    #[test]
    fn source_reads_ticker_directory() {
        let dir = fixture_dir("source");
        fs::write(
            dir.join("ITC/balance_sheet.csv"),
            "Line Item,Mar 2023,Mar 2024\n\"Borrowings\",\"1,200\",\"1,350\"\n",
        )
        .unwrap();
        fs::write(dir.join("ITC/shareholding.csv"), ",Mar 2024\nPromoters,0.00%\n").unwrap();

        let source = CsvStatementSource::new(&dir);
        let set = tokio_test::block_on(collect_statements(&source, "itc"));
        assert_eq!(set.balance_sheet.cell(0, "Mar 2024"), Some("1,350"));
        assert_eq!(set.shareholding.columns()[0], "Category");
        assert!(set.profit_loss.is_empty());
    }

    #[test]
    fn ragged_file_leaves_other_statements_intact() {
        let dir = fixture_dir("partial");
        fs::write(dir.join("ITC/profit_loss.csv"), ",2022,2023,2024
Sales,100,120,150
").unwrap();
        fs::write(dir.join("ITC/balance_sheet.csv"), ",2023,2024
Borrowings,10
").unwrap();

        let source = CsvStatementSource::new(&dir);
        let set = tokio_test::block_on(collect_statements(&source, "ITC"));
        assert_eq!(set.profit_loss.rows().len(), 1);
        assert!(set.balance_sheet.is_empty());

        let snap = assemble_from_set(&set);
        assert_eq!(
            snap.sales_series,
            vec![None, None, Some("100".into()), Some("120".into()), Some("150".into())]
        );
        assert_eq!(snap.borrowings, None);
    }
}
