//! resibo — turning a loosely structured expense sheet into a clean record
//! set, and deciding whether a freshly scanned receipt is a re-submission.
//!
//! The sheet client, OCR pipeline, and chat bot live elsewhere; this crate
//! only consumes raw rows (via [`RowSource`]) and candidate expenses, and
//! produces records, duplicate verdicts, and summary aggregates.

mod dedup;
mod error;
mod fmt;
mod loader;
mod models;
mod settings;
mod source;
mod summary;

pub use dedup::{
    merchant_similarity, DuplicateDetector, DuplicateMatch, DuplicateReport, MatchReason,
};
pub use error::{ResiboError, Result};
pub use fmt::peso;
pub use loader::{
    infer_roles, parse_amount, parse_date_dayfirst, ColumnRoles, TableLoader, CANONICAL_HEADERS,
};
pub use models::{ExpenseRecord, NewExpense};
pub use settings::Settings;
pub use source::{CsvSnapshot, RowSource, StaticRows};
pub use summary::{category_insights, monthly_summary, CategoryShare, MonthlySummary};
