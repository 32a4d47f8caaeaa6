use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Cumulative active seconds for one application on one local calendar day.
/// Totals only ever grow; merges are additive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTotal {
    pub app_name: String,
    pub date: NaiveDate,
    pub total_seconds: i64,
}

/// Filter for the daily-totals read contract. All fields optional; date
/// bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct TotalsQuery {
    pub app_name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<u32>,
}
