use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::{ResiboError, Result};
use crate::models::ExpenseRecord;
use crate::source::RowSource;

// ---------------------------------------------------------------------------
// Cell normalization helpers
// ---------------------------------------------------------------------------

/// Strip thousands separators and known currency markers, then parse.
/// Anything that does not survive as a finite number is treated as missing;
/// `f64::from_str` accepts "nan" and "inf", which are never real amounts.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw
        .replace(',', "")
        .replace('\u{20b1}', "")
        .replace("PHP", "")
        .replace('P', "")
        .replace('$', "");
    match s.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => None,
    }
}

// Day-before-month formats come ahead of month-first; ISO dates are
// unambiguous and tried first.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d/%m/%y",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%d %B %Y",
];

/// Parse a date cell with day-first ambiguity resolution.
pub fn parse_date_dayfirst(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d);
        }
    }
    // "Added Date" style cells carry a time suffix; retry on the date part
    if let Some(first) = raw.split_whitespace().next() {
        if first != raw {
            return parse_date_dayfirst(first);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Header discovery
// ---------------------------------------------------------------------------

const HEADER_TOKENS: &[&str] = &["date", "amount", "store", "merchant", "category"];

/// Headers assumed when no recognizable header row exists in the sheet.
pub const CANONICAL_HEADERS: &[&str] = &[
    "Date",
    "Store/Merchant",
    "Amount",
    "Category",
    "Payment Method",
    "Notes",
    "Receipt Date",
    "Added Date",
];

fn find_header_row(rows: &[Vec<String>]) -> Option<usize> {
    rows.iter().position(|row| {
        if row.len() < 3 {
            return false;
        }
        let text = row.join(" ").to_lowercase();
        HEADER_TOKENS.iter().any(|t| text.contains(t))
    })
}

// ---------------------------------------------------------------------------
// Column role inference
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Amount,
    Date,
    Category,
    Merchant,
}

type HeaderPredicate = fn(&str) -> bool;

// Ordered rule table, evaluated top to bottom; the first column whose
// lowercased header satisfies the predicate takes the role.
const HEADER_RULES: &[(Role, HeaderPredicate)] = &[
    (Role::Amount, |h| h.contains("amount")),
    (Role::Date, |h| {
        h.contains("date") && !h.contains("added") && !h.contains("receipt")
    }),
    (Role::Category, |h| h.contains("category")),
    (Role::Merchant, |h| {
        h.contains("store") || h.contains("merchant") || h.contains("vendor")
    }),
];

/// Column indexes discovered for each role. Discovered, never configured;
/// a role is absent when no qualifying column exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnRoles {
    pub amount: Option<usize>,
    pub date: Option<usize>,
    pub category: Option<usize>,
    pub merchant: Option<usize>,
}

impl ColumnRoles {
    fn slot(&mut self, role: Role) -> &mut Option<usize> {
        match role {
            Role::Amount => &mut self.amount,
            Role::Date => &mut self.date,
            Role::Category => &mut self.category,
            Role::Merchant => &mut self.merchant,
        }
    }
}

/// Discover column roles from header text, with content-based fallbacks for
/// amount and date. Priority is fixed by `HEADER_RULES` order and, within a
/// role, by column position.
pub fn infer_roles(headers: &[String], rows: &[Vec<String>]) -> ColumnRoles {
    let lowered: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
    let mut roles = ColumnRoles::default();

    for (role, predicate) in HEADER_RULES {
        if let Some(idx) = lowered.iter().position(|h| predicate(h)) {
            *roles.slot(*role) = Some(idx);
        }
    }

    // Content fallbacks: a column qualifies when at least one of its cells
    // coerces. Only amount and date have a content-based path.
    if roles.amount.is_none() {
        roles.amount = (0..headers.len()).find(|&i| {
            rows.iter()
                .any(|r| r.get(i).is_some_and(|c| parse_amount(c).is_some()))
        });
        if let Some(idx) = roles.amount {
            debug!(column = idx, "amount role from numeric content fallback");
        }
    }
    if roles.date.is_none() {
        roles.date = (0..headers.len()).find(|&i| {
            rows.iter()
                .any(|r| r.get(i).is_some_and(|c| parse_date_dayfirst(c).is_some()))
        });
        if let Some(idx) = roles.date {
            debug!(column = idx, "date role from parseable content fallback");
        }
    }

    roles
}

// ---------------------------------------------------------------------------
// TableLoader
// ---------------------------------------------------------------------------

/// Turns raw sheet rows of unknown shape into a clean record set.
///
/// The loader never raises for malformed data; individual bad rows are
/// dropped silently. It only fails when the table is structurally unusable,
/// meaning no amount column can be discovered at all.
#[derive(Debug, Clone)]
pub struct TableLoader {
    fallback_headers: Vec<String>,
}

impl Default for TableLoader {
    fn default() -> Self {
        Self {
            fallback_headers: CANONICAL_HEADERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl TableLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback_headers(headers: Vec<String>) -> Self {
        Self {
            fallback_headers: headers,
        }
    }

    /// Fetch from the given backing-store handle and load.
    pub fn load_from(&self, source: &dyn RowSource) -> Result<Vec<ExpenseRecord>> {
        self.load(&source.fetch_all_rows()?)
    }

    /// Load raw rows into normalized records, in source append order.
    ///
    /// Empty input is a legitimate empty state, not an error. A table with
    /// no discoverable amount column fails with `UnusableSource`.
    pub fn load(&self, raw_rows: &[Vec<String>]) -> Result<Vec<ExpenseRecord>> {
        if raw_rows.is_empty() {
            return Ok(Vec::new());
        }

        let (headers, data): (Vec<String>, &[Vec<String>]) = match find_header_row(raw_rows) {
            Some(i) => {
                debug!(row = i + 1, "found header row");
                (raw_rows[i].clone(), &raw_rows[i + 1..])
            }
            None => {
                // Lossy: every row is treated as data, including whatever
                // the real header might have been.
                warn!("no header row found, assuming canonical headers");
                (self.fallback_headers.clone(), raw_rows)
            }
        };

        // Zip cells to headers positionally: surplus cells are dropped and
        // short rows pad out with empty strings. All-blank rows are noise
        // from manual sheet edits.
        let rows: Vec<Vec<String>> = data
            .iter()
            .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
            .map(|row| {
                (0..headers.len())
                    .map(|i| row.get(i).cloned().unwrap_or_default())
                    .collect::<Vec<String>>()
            })
            .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
            .collect();

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let roles = infer_roles(&headers, &rows);
        let Some(amount_idx) = roles.amount else {
            warn!("no amount column discoverable, table is unusable");
            return Err(ResiboError::UnusableSource);
        };
        debug!(?roles, "inferred column roles");

        let mut records = Vec::new();
        for row in &rows {
            let Some(amount) = parse_amount(&row[amount_idx]) else {
                continue;
            };
            if amount <= 0.0 {
                continue;
            }
            let date = roles.date.and_then(|i| parse_date_dayfirst(&row[i]));
            // Dateless records are tolerated only when the whole table has
            // no date column.
            if roles.date.is_some() && date.is_none() {
                continue;
            }
            records.push(ExpenseRecord {
                amount,
                date,
                merchant: roles.merchant.map(|i| row[i].clone()).unwrap_or_default(),
                category: roles.category.map(|i| row[i].clone()),
            });
        }

        debug!(rows = rows.len(), kept = records.len(), "load complete");
        Ok(records)
    }
}
