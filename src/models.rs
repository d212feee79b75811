use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One normalized expense produced by the loader. `merchant` keeps the cell
/// text as stored; it is lowercased and trimmed only at comparison time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub amount: f64,
    pub date: Option<NaiveDate>,
    pub merchant: String,
    pub category: Option<String>,
}

/// A freshly extracted expense, not yet persisted, being checked against
/// history before the save flow commits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    pub amount: f64,
    #[serde(default)]
    pub merchant: String,
}
