use crate::models::{RawStatementTable, StatementKind};
use tracing::warn;

// ── Cell text ─────────────────────────────────────────────────────────────────

/// Collapse whitespace (including non-breaking spaces) to single spaces.
/// "  1,234\u{a0}Cr \n" → "1,234 Cr"
pub fn clean_cell(s: &str) -> String {
    s.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Line-item labels carry an expand button rendered as a trailing "+".
/// "Sales +" → "Sales" | "Promoters\u{a0}+" → "Promoters"
pub fn clean_label(s: &str) -> String {
    let cleaned = clean_cell(s);
    cleaned.trim_end_matches('+').trim_end().to_string()
}

/// Normalise ticker input: "  itc " → "ITC"
pub fn normalise_ticker(s: &str) -> String {
    s.trim().to_uppercase()
}

// ── Scraped rows → RawStatementTable ─────────────────────────────────────────

/// Build a table from scraped header and body cells.
///
/// A blank or absent first header becomes the kind's key column. Rows whose
/// width differs from the header are dropped so the table stays rectangular.
pub fn build_table(
    kind: StatementKind,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> RawStatementTable {
    let mut columns: Vec<String> = headers.iter().map(|h| clean_cell(h)).collect();
    match columns.first_mut() {
        Some(first) if first.is_empty() => *first = kind.key_column().to_string(),
        Some(_) => {}
        None => return RawStatementTable::empty(kind),
    }

    let width = columns.len();
    let mut kept = Vec::with_capacity(rows.len());
    for (i, row) in rows.into_iter().enumerate() {
        if row.len() != width {
            warn!(
                "{}: dropping row {} ({} cells, header has {})",
                kind,
                i,
                row.len(),
                width
            );
            continue;
        }
        let mut cells = row.into_iter();
        let mut cleaned = Vec::with_capacity(width);
        if let Some(label) = cells.next() {
            cleaned.push(clean_label(&label));
        }
        cleaned.extend(cells.map(|c| clean_cell(&c)));
        kept.push(cleaned);
    }

    RawStatementTable::new(kind, columns, kept).unwrap_or_else(|e| {
        warn!("{}: discarding malformed table: {}", kind, e);
        RawStatementTable::empty(kind)
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
