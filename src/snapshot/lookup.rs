//! Row lookup and cell coercion over raw statement tables.
//!
//! Nothing in here fails: a lookup that finds nothing yields missing cells
//! (`None`), and a cell that does not parse yields `None`.

use crate::models::RawStatementTable;

/// Case-insensitive substring pattern with alternatives.
///
/// `LinePattern::any(&["Cash from Operating", "Cash Flow from Ops"])` matches
/// a label containing either phrase.
#[derive(Debug, Clone, PartialEq)]
pub struct LinePattern {
    needles: Vec<String>,
}

impl LinePattern {
    pub fn new(needle: &str) -> Self {
        Self::any(&[needle])
    }

    pub fn any(needles: &[&str]) -> Self {
        Self {
            needles: needles.iter().map(|n| n.to_lowercase()).collect(),
        }
    }

    pub fn matches(&self, label: &str) -> bool {
        let label = label.to_lowercase();
        self.needles.iter().any(|n| label.contains(n.as_str()))
    }
}

/// A row returned by [`find_row`]: either a real table row or a synthetic one
/// made entirely of missing cells. Its length always equals the table's
/// column count.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedRow<'a> {
    cells: Vec<Option<&'a str>>,
}

impl<'a> MatchedRow<'a> {
    fn missing(width: usize) -> Self {
        Self {
            cells: vec![None; width],
        }
    }

    #[cfg(test)]
    pub fn cells(&self) -> &[Option<&'a str>] {
        &self.cells
    }

    pub fn label(&self) -> Option<&'a str> {
        self.cells.first().copied().flatten()
    }

    /// Cells after the label column, oldest period first.
    pub fn periods(&self) -> &[Option<&'a str>] {
        self.cells.get(1..).unwrap_or(&[])
    }

    pub fn is_missing(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }
}

/// First row (in table order) whose key column matches `pattern`.
pub fn find_row<'a>(table: &'a RawStatementTable, pattern: &LinePattern) -> MatchedRow<'a> {
    table
        .rows()
        .iter()
        .find(|cells| cells.first().is_some_and(|label| pattern.matches(label)))
        .map(|cells| MatchedRow {
            cells: cells.iter().map(|c| Some(c.as_str())).collect(),
        })
        .unwrap_or_else(|| MatchedRow::missing(table.columns().len()))
}

/// Most recent period value of the matching row, as the raw cell text.
/// Blank cells count as missing.
pub fn latest_value(table: &RawStatementTable, pattern: &LinePattern) -> Option<String> {
    find_row(table, pattern)
        .periods()
        .last()
        .copied()
        .flatten()
        .filter(|c| !c.trim().is_empty())
        .map(str::to_string)
}

/// Leading token of a cell as a number: `"1,234.5 Cr"` → `1234.5`.
pub fn coerce_number(cell: Option<&str>) -> Option<f64> {
    let token = cell?.split_whitespace().next()?;
    let cleaned = token.replace(',', "");
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// The last `n` period cells of `row`, oldest first, left-padded with missing
/// cells when the row covers fewer periods.
pub fn last_n_periods(row: &MatchedRow<'_>, n: usize) -> Vec<Option<String>> {
    let periods = row.periods();
    let tail = &periods[periods.len().saturating_sub(n)..];

    let mut out: Vec<Option<String>> = vec![None; n - tail.len()];
    out.extend(
        tail.iter()
            .map(|&c| c.filter(|s| !s.trim().is_empty()).map(str::to_string)),
    );
    out
}
