use crate::models::StatementKind;

pub const ANALYST_SYSTEM: &str = "You are a financial analyst AI.";
pub const COMPARISON_SYSTEM: &str = "You are a financial comparison analyst AI.";

const MISSING_DATA_FOOTER: &str = "If any critical data is missing, tell the user \
which specific items are unavailable before drawing conclusions.";

fn missing_note(missing: &[StatementKind]) -> String {
    if missing.is_empty() {
        return String::new();
    }
    let names: Vec<String> = missing.iter().map(|k| k.to_string()).collect();
    format!("\nNote: no data could be retrieved for: {}.\n", names.join(", "))
}

pub fn fundamental_prompt(ticker: &str, summary: &str, missing: &[StatementKind]) -> String {
    format!(
        "Evaluate the fundamental strength and risks of {ticker} from the structured data below.

1. 💸 Cash flow: compare Net Profit with Cash from Operating Activities, flag divergence, \
comment on earnings quality.
2. 📈 Profit & Loss: revenue and profit growth, margin trends, inconsistent or declining growth.
3. 🧮 Balance sheet: debt, liquidity, capital structure, negative working capital.
4. 🧾 Shareholding: promoter and FII stake, recent changes and what they signal.
5. 🔍 Red flags: rising profits with falling CFO, rising leverage, promoter selling.
6. 📊 Conclude with an overall health score (0-100), a strong / average / weak verdict \
and 3-5 plain-English bullet points.

Financial data:
{summary}{note}
{MISSING_DATA_FOOTER}
",
        note = missing_note(missing),
    )
}

pub fn forensic_prompt(ticker: &str, summary: &str, missing: &[StatementKind]) -> String {
    format!(
        "Act as a forensic accountant reviewing {ticker}. Look for signs of accounting fraud, \
manipulation or financial red flags in the data below:

1. Persistent gap between CFO and Net Profit (earnings quality)
2. Receivable or inventory build-up relative to sales
3. Abnormal jumps in borrowings
4. Declining promoter holding
5. High or rising leverage
6. Combinations of the above

Return:
- 📛 Red flags (3-5 bullets) with the reasoning for each
- ✅ Forensic risk score (0-100)
- ⛔ Recommendation: 'Avoid', 'Caution' or 'No Red Flags'

Financial data:
{summary}{note}
{MISSING_DATA_FOOTER}
",
        note = missing_note(missing),
    )
}

pub fn comparison_prompt(target: &str, peers: &[&str], target_summary: &str, peer_summaries: &str) -> String {
    format!(
        "Compare the financial health of the target company with its industry peers across \
profitability, cash flow quality, balance sheet strength and promoter confidence.

Target: {target}
Peers: {peers}

🔹 Target company financials:
{target_summary}
🔸 Peer company financials:
{peer_summaries}
Return:
1. 📊 Strengths and weaknesses of each company
2. 📈 Which company leads on profitability, CFO trend, leverage and promoter confidence
3. ✅ A score out of 100 for each company
4. 🏆 Final verdict: the best positioned company
",
        peers = if peers.is_empty() { "none available".to_string() } else { peers.join(", ") },
    )
}
