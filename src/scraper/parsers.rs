use super::cleaner::{build_table, normalise_ticker};
use crate::error::FetchError;
use crate::models::{RawStatementTable, StatementKind};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

fn selector(s: &str) -> Result<Selector, FetchError> {
    Selector::parse(s).map_err(|_| FetchError::Selector(s.to_string()))
}

fn text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>()
}

// ── Company page ──────────────────────────────────────────────────────────────

/// Parse one statement section (`section#<id>`) of a company page.
///
/// An absent section or table is not an error: it yields the empty table.
pub fn parse_statement(doc: &Html, kind: StatementKind) -> Result<RawStatementTable, FetchError> {
    let table_sel = selector(&format!("section#{} table", kind.section_id()))?;
    let th_sel = selector("thead tr th")?;
    let tr_sel = selector("tbody tr")?;
    let td_sel = selector("td")?;

    let Some(table) = doc.select(&table_sel).next() else {
        warn!("{}: section #{} has no table", kind, kind.section_id());
        return Ok(RawStatementTable::empty(kind));
    };

    let headers: Vec<String> = table.select(&th_sel).map(text).collect();
    let rows: Vec<Vec<String>> = table
        .select(&tr_sel)
        .map(|tr| tr.select(&td_sel).map(text).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
        .collect();

    let parsed = build_table(kind, headers, rows);
    debug!(
        "{}: {} rows x {} periods",
        kind,
        parsed.rows().len(),
        parsed.periods().len()
    );
    Ok(parsed)
}

/// Parse the statement sections of a company page.
pub fn parse_company_page(
    html: &str,
    kinds: &[StatementKind],
) -> Result<Vec<RawStatementTable>, FetchError> {
    let doc = Html::parse_document(html);
    kinds.iter().map(|k| parse_statement(&doc, *k)).collect()
}

// ── Peers page ────────────────────────────────────────────────────────────────

/// Tickers linked from the peer comparison table, in page order.
///
/// `/company/TCS/consolidated/` → `TCS`. The target itself is skipped;
/// capping and de-duplication are left to the caller.
pub fn parse_peer_links(html: &str, target: &str) -> Result<Vec<String>, FetchError> {
    let doc = Html::parse_document(html);
    let link_sel = selector("table tbody td a[href^='/company/']")?;
    let target = normalise_ticker(target);

    let tickers = doc
        .select(&link_sel)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| href.split('/').nth(2))
        .map(normalise_ticker)
        .filter(|t| !t.is_empty() && *t != target)
        .collect();

    Ok(tickers)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPANY_PAGE: &str = r#"
<html><body>
<section id="profit-loss">
  <table class="data-table">
    <thead><tr><th></th><th>Mar 2021</th><th>Mar 2022</th><th>Mar 2023</th></tr></thead>
    <tbody>
      <tr><td class="text"><button>Sales&nbsp;<span>+</span></button></td><td>100</td><td>120</td><td>150</td></tr>
      <tr><td class="text">Net Profit&nbsp;+</td><td>10</td><td>12</td><td>15</td></tr>
      <tr><td class="text">Raw PDF</td></tr>
    </tbody>
  </table>
</section>
<section id="shareholding">
  <table>
    <thead><tr><th></th><th>Dec 2023</th><th>Mar 2024</th></tr></thead>
    <tbody>
      <tr><td>Promoters +</td><td>50.10%</td><td>50.20%</td></tr>
      <tr><td>FIIs +</td><td>21.00%</td><td>21.50%</td></tr>
    </tbody>
  </table>
</section>
<section id="cash-flow"><p>Not available</p></section>
</body></html>
"#;

    #[test]
    fn parses_statement_sections() {
        let tables = parse_company_page(COMPANY_PAGE, &StatementKind::ALL).unwrap();
        let pl = &tables[0];
        assert_eq!(pl.columns(), ["Line Item", "Mar 2021", "Mar 2022", "Mar 2023"]);
        assert_eq!(pl.rows().len(), 2);
        assert_eq!(pl.rows()[0], ["Sales", "100", "120", "150"]);
        assert_eq!(pl.rows()[1][0], "Net Profit");

        let sh = &tables[3];
        assert_eq!(sh.columns()[0], "Category");
        assert_eq!(sh.cell(1, "Mar 2024"), Some("21.50%"));
    }

    #[test]
    fn absent_sections_are_empty_tables() {
        let tables = parse_company_page(COMPANY_PAGE, &StatementKind::ALL).unwrap();
        assert!(tables[1].is_empty());
        assert_eq!(tables[1].kind(), StatementKind::CashFlow);
        assert!(tables[2].is_empty());
        assert_eq!(tables[2].columns(), ["Line Item"]);
    }

    #[test]
    fn peer_links_skip_target() {
        let html = r#"
<table><tbody>
  <tr><td>1</td><td><a href="/company/HINDUNILVR/consolidated/">Hindustan Unilever</a></td></tr>
  <tr><td>2</td><td><a href="/company/ITC/consolidated/">ITC</a></td></tr>
  <tr><td>3</td><td><a href="/company/NESTLEIND/">Nestle India</a></td></tr>
  <tr><td>4</td><td><a href="https://elsewhere.example/company/X/">Other</a></td></tr>
</tbody></table>"#;
        let peers = parse_peer_links(html, "itc").unwrap();
        assert_eq!(peers, vec!["HINDUNILVR", "NESTLEIND"]);
    }
}
