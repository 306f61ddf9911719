//! Text rendering of snapshots, used as the data block of analysis prompts.

use crate::models::{FinancialSnapshot, PeerBundle};
use std::fmt::Write;

/// Stand-in printed wherever a value is absent.
pub const MISSING: &str = "N/A (missing)";

fn scalar(v: &Option<String>) -> &str {
    v.as_deref().unwrap_or(MISSING)
}

fn series(values: &[Option<String>]) -> String {
    let items: Vec<String> = values
        .iter()
        .map(|v| format!("'{}'", scalar(v)))
        .collect();
    format!("[{}]", items.join(", "))
}

fn ratio(v: Option<f64>) -> String {
    v.map(|r| format!("{r:.2}")).unwrap_or_else(|| MISSING.to_string())
}

pub fn render_snapshot(s: &FinancialSnapshot) -> String {
    format!(
        "\
📈 Profit & Loss (last 5 years):
- Sales: {sales}
- Net Profit: {net_profit}

💸 Cash Flow (last 5 years):
- CFO: {cfo}
- Net Profit vs CFO Divergence: check if pattern diverges

🧮 Balance Sheet (latest year only):
- Total Assets: {total_assets}
- Borrowings: {borrowings}
- Cash & Equivalents: {cash}
- Current Ratio (CA / CL): {current_ratio}

🧾 Shareholding Pattern (latest):
- Promoter Holding: {promoter}
- FII Holding: {fii}
",
        sales = series(&s.sales_series),
        net_profit = series(&s.net_profit_series),
        cfo = series(&s.cfo_series),
        total_assets = scalar(&s.total_assets),
        borrowings = scalar(&s.borrowings),
        cash = scalar(&s.cash_equivalents),
        current_ratio = ratio(s.current_ratio),
        promoter = scalar(&s.promoter_holding_pct),
        fii = scalar(&s.fii_holding_pct),
    )
}

/// Every peer's rendered snapshot, headed by its ticker.
pub fn render_peers(bundle: &PeerBundle) -> String {
    let mut out = String::new();
    for (i, peer) in bundle.peers.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "{}:\n{}", peer.ticker, render_snapshot(&peer.snapshot));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompanySnapshot, StatementSet};
    use crate::snapshot::assemble_from_set;

    #[test]
    fn empty_snapshot_renders_missing_markers() {
        let text = render_snapshot(&assemble_from_set(&StatementSet::empty()));
        let missing_series = format!("[{}]", vec![format!("'{MISSING}'"); 5].join(", "));
        assert!(text.contains(&format!("- Sales: {missing_series}")));
        assert!(text.contains(&format!("- CFO: {missing_series}")));
        assert!(text.contains(&format!("- Current Ratio (CA / CL): {MISSING}")));
        assert!(text.contains(&format!("- FII Holding: {MISSING}")));
    }

    #[test]
    fn rendering_is_stable() {
        let snap = FinancialSnapshot {
            sales_series: vec![None, Some("120".into())],
            current_ratio: Some(2.0),
            borrowings: Some("35".into()),
            ..assemble_from_set(&StatementSet::empty())
        };
        let text = render_snapshot(&snap);
        assert!(text.contains(&format!("- Sales: ['{MISSING}', '120']")));
        assert!(text.contains("- Current Ratio (CA / CL): 2.00"));
        assert!(text.contains("- Borrowings: 35"));
        assert_eq!(text, render_snapshot(&snap));
    }

    #[test]
    fn peers_are_headed_by_ticker() {
        let snap = assemble_from_set(&StatementSet::empty());
        let company = |t: &str| CompanySnapshot { ticker: t.into(), snapshot: snap.clone() };
        let bundle = PeerBundle {
            target: company("ITC"),
            peers: vec![company("HUL"), company("DABUR")],
            skipped: vec![],
        };
        let text = render_peers(&bundle);
        assert!(text.starts_with("HUL:\n📈"));
        assert!(text.contains("\nDABUR:\n📈"));
        assert!(!text.contains("ITC:"));
    }
}
