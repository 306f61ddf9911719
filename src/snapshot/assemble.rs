use super::lookup::{coerce_number, find_row, last_n_periods, latest_value, LinePattern};
use crate::models::{FinancialSnapshot, RawStatementTable, StatementSet};
use std::sync::LazyLock;

/// Number of most recent periods kept for every series.
pub const SERIES_LEN: usize = 5;

struct Patterns {
    sales: LinePattern,
    net_profit: LinePattern,
    cfo: LinePattern,
    total_assets: LinePattern,
    borrowings: LinePattern,
    cash: LinePattern,
    current_assets: LinePattern,
    current_liabilities: LinePattern,
    promoter: LinePattern,
    fii: LinePattern,
}

static PATTERNS: LazyLock<Patterns> = LazyLock::new(|| Patterns {
    sales: LinePattern::new("Sales"),
    net_profit: LinePattern::new("Net Profit"),
    cfo: LinePattern::any(&["Cash from Operating", "Cash Flow from Ops"]),
    total_assets: LinePattern::new("Total Assets"),
    borrowings: LinePattern::new("Borrowings"),
    cash: LinePattern::new("Cash"),
    current_assets: LinePattern::new("Current Assets"),
    current_liabilities: LinePattern::new("Current Liabilities"),
    promoter: LinePattern::new("Promoter"),
    fii: LinePattern::new("FII"),
});

/// Build a snapshot from the four statements. Pure and infallible.
pub fn assemble_snapshot(
    profit_loss: &RawStatementTable,
    cash_flow: &RawStatementTable,
    balance_sheet: &RawStatementTable,
    shareholding: &RawStatementTable,
) -> FinancialSnapshot {
    let p = &*PATTERNS;

    let current_assets = latest_value(balance_sheet, &p.current_assets);
    let current_liabilities = latest_value(balance_sheet, &p.current_liabilities);
    let current_ratio = ratio(current_assets.as_deref(), current_liabilities.as_deref());

    FinancialSnapshot {
        sales_series: last_n_periods(&find_row(profit_loss, &p.sales), SERIES_LEN),
        net_profit_series: last_n_periods(&find_row(profit_loss, &p.net_profit), SERIES_LEN),
        cfo_series: last_n_periods(&find_row(cash_flow, &p.cfo), SERIES_LEN),

        total_assets: latest_value(balance_sheet, &p.total_assets),
        borrowings: latest_value(balance_sheet, &p.borrowings),
        cash_equivalents: latest_value(balance_sheet, &p.cash),
        current_assets,
        current_liabilities,
        current_ratio,

        promoter_holding_pct: latest_value(shareholding, &p.promoter),
        fii_holding_pct: latest_value(shareholding, &p.fii),
    }
}

pub fn assemble_from_set(set: &StatementSet) -> FinancialSnapshot {
    assemble_snapshot(
        &set.profit_loss,
        &set.cash_flow,
        &set.balance_sheet,
        &set.shareholding,
    )
}

/// `numerator / denominator` rounded to 2 dp (ties to even) when both parse
/// and the denominator is non-zero.
fn ratio(numerator: Option<&str>, denominator: Option<&str>) -> Option<f64> {
    let n = coerce_number(numerator)?;
    let d = coerce_number(denominator)?;
    if d == 0.0 {
        return None;
    }
    let r = (n / d * 100.0).round_ties_even() / 100.0;
    r.is_finite().then_some(r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StatementKind;

    fn table(kind: StatementKind, columns: &[&str], rows: &[&[&str]]) -> RawStatementTable {
        RawStatementTable::new(
            kind,
            columns.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    fn balance_sheet(ca: &str, cl: &str) -> RawStatementTable {
        table(
            StatementKind::BalanceSheet,
            &["Line Item", "Mar 2024"],
            &[&["Current Assets", ca], &["Current Liabilities", cl]],
        )
    }

    fn empty(kind: StatementKind) -> RawStatementTable {
        RawStatementTable::empty(kind)
    }

    fn with_balance_sheet(bs: &RawStatementTable) -> FinancialSnapshot {
        assemble_snapshot(
            &empty(StatementKind::ProfitLoss),
            &empty(StatementKind::CashFlow),
            bs,
            &empty(StatementKind::Shareholding),
        )
    }

    fn full_set() -> StatementSet {
        StatementSet {
            profit_loss: table(
                StatementKind::ProfitLoss,
                &["Line Item", "2021", "2022", "2023"],
                &[&["Sales", "100", "120", "150"], &["Net Profit", "10", "12", "15"]],
            ),
            cash_flow: table(
                StatementKind::CashFlow,
                &["Line Item", "2022", "2023"],
                &[&["Cash from Operating Activity", "8", "11"]],
            ),
            balance_sheet: table(
                StatementKind::BalanceSheet,
                &["Line Item", "2022", "2023"],
                &[
                    &["Borrowings", "40", "35"],
                    &["Total Assets", "900", "1,000"],
                    &["Cash Equivalents", "20", "25"],
                    &["Current Assets", "400", "500 Cr"],
                    &["Current Liabilities", "200", "250 Cr"],
                ],
            ),
            shareholding: table(
                StatementKind::Shareholding,
                &["Category", "Dec 2023", "Mar 2024"],
                &[&["Promoters", "50.10%", "50.20%"], &["FIIs", "20.00%", "21.50%"]],
            ),
        }
    }

    #[test]
    fn current_ratio_from_crore_cells() {
        let snap = with_balance_sheet(&balance_sheet("500 Cr", "250 Cr"));
        assert_eq!(snap.current_ratio, Some(2.0));
    }

    #[test]
    fn current_ratio_rounds_to_two_places() {
        let snap = with_balance_sheet(&balance_sheet("100", "3"));
        assert_eq!(snap.current_ratio, Some(33.33));
    }

    #[test]
    fn current_ratio_halves_round_to_even() {
        assert_eq!(with_balance_sheet(&balance_sheet("1", "8")).current_ratio, Some(0.12));
        assert_eq!(with_balance_sheet(&balance_sheet("3", "8")).current_ratio, Some(0.38));
    }

    #[test]
    fn current_ratio_gating() {
        assert_eq!(with_balance_sheet(&balance_sheet("500", "0")).current_ratio, None);
        assert_eq!(with_balance_sheet(&balance_sheet("500", "n/a")).current_ratio, None);
        assert_eq!(with_balance_sheet(&balance_sheet("", "250")).current_ratio, None);

        let only_assets = table(
            StatementKind::BalanceSheet,
            &["Line Item", "2024"],
            &[&["Current Assets", "500"]],
        );
        assert_eq!(with_balance_sheet(&only_assets).current_ratio, None);
    }

    #[test]
    fn all_tables_empty_yields_all_missing() {
        let snap = assemble_from_set(&StatementSet::empty());
        assert_eq!(snap.sales_series, vec![None; SERIES_LEN]);
        assert_eq!(snap.net_profit_series, vec![None; SERIES_LEN]);
        assert_eq!(snap.cfo_series, vec![None; SERIES_LEN]);
        assert_eq!(snap.total_assets, None);
        assert_eq!(snap.current_ratio, None);
        assert_eq!(snap.promoter_holding_pct, None);
        assert_eq!(snap.missing_fields().len(), 11);
    }

    #[test]
    fn any_subset_of_empty_tables_still_assembles() {
        let full = full_set();
        for mask in 0u8..16 {
            let mut set = full.clone();
            for (bit, kind) in StatementKind::ALL.into_iter().enumerate() {
                if mask & (1 << bit) != 0 {
                    set.set(RawStatementTable::empty(kind));
                }
            }
            let snap = assemble_from_set(&set);
            assert_eq!(snap.sales_series.len(), SERIES_LEN);
            assert_eq!(snap.cfo_series.len(), SERIES_LEN);
            assert_eq!(snap.current_ratio.is_some(), mask & 0b0100 == 0);
        }
    }

    #[test]
    fn assembly_is_deterministic() {
        let set = full_set();
        assert_eq!(assemble_from_set(&set), assemble_from_set(&set));
    }

    #[test]
    fn full_snapshot_fields() {
        let snap = assemble_from_set(&full_set());
        assert_eq!(
            snap.sales_series,
            vec![None, None, Some("100".into()), Some("120".into()), Some("150".into())]
        );
        assert_eq!(snap.cfo_series[3..], [Some("8".to_string()), Some("11".to_string())]);
        assert_eq!(snap.total_assets.as_deref(), Some("1,000"));
        assert_eq!(snap.borrowings.as_deref(), Some("35"));
        assert_eq!(snap.cash_equivalents.as_deref(), Some("25"));
        assert_eq!(snap.current_ratio, Some(2.0));
        assert_eq!(snap.promoter_holding_pct.as_deref(), Some("50.20%"));
        assert_eq!(snap.fii_holding_pct.as_deref(), Some("21.50%"));
        assert!(snap.missing_fields().is_empty());
    }
}
