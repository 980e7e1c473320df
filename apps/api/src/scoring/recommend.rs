//! Recommendation Selector: picks the weakest pillars and attaches advice.

use serde::{Deserialize, Serialize};

use crate::scoring::feedback::Tier;

pub const DEFAULT_FOCUS_AREAS: usize = 2;

/// Minimal view of a pillar needed to rank it.
#[derive(Debug, Clone, PartialEq)]
pub struct PillarScore {
    pub name: String,
    pub average: f64,
    pub tier: Tier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub pillar: String,
    pub tier: Tier,
    pub average_score: f64,
    pub advice_text: String,
}

/// Returns the `n` lowest-averaging pillars. `summaries` must already be in catalog
/// order; the sort is stable, so equal averages keep that order.
pub fn select_focus_areas(summaries: &[PillarScore], n: usize) -> Vec<&PillarScore> {
    let mut ranked: Vec<&PillarScore> = summaries.iter().collect();
    ranked.sort_by(|a, b| a.average.total_cmp(&b.average));
    ranked.truncate(n);
    ranked
}

/// Advice text for a pillar, falling back to generic guidance for unknown names.
pub fn advice_for(pillar: &str) -> &'static str {
    let key = pillar.trim();
    PILLAR_ADVICE
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(key))
        .map(|(_, advice)| *advice)
        .unwrap_or(GENERIC_ADVICE)
}

const GENERIC_ADVICE: &str = "Review the practices in this area with your finance team, agree on clear owners and deadlines, and reassess in three months.";

#[rustfmt::skip]
const PILLAR_ADVICE: &[(&str, &str)] = &[
    ("Business Plan", "Document your mission, products and three-year forecasts in a single business plan, and link capital investment and funding decisions back to it."),
    ("Break Even and Margin", "Cost each product group accurately, track direct expenses against overheads, and run regular what-if scenarios to know the volume you need to break even."),
    ("Blueprint", "Map your core financial processes, write down the procedures behind them, and automate data capture so controls do not rely on manual re-entry."),
    ("Actual Results", "Produce monthly management accounts within days of month-end, report KPIs alongside the financials, and reforecast whenever results drift from budget."),
    ("Bank/Cashflow", "Update your cashflow forecast at least weekly, reconcile bank balances promptly, and keep a close eye on debtor, creditor and stock balances."),
    ("Compliance", "Keep a statutory calendar for payroll, VAT, tax and company returns, assign an owner to each deadline, and review it monthly."),
    ("Cashflow", "Forecast cash weekly and reconcile bank balances promptly so shortfalls are visible well before they happen."),
    ("Forecasting", "Compare forecasts to actuals every month and adjust assumptions as soon as variances appear."),
    ("Internal Controls", "Introduce segregation of duties and approval limits, and review them whenever roles change."),
    ("Strategy", "Translate your strategy into measurable annual targets and review progress against them quarterly."),
    ("Debt Management", "Schedule every repayment, monitor covenants, and refinance expensive debt where possible."),
];
