use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};
use tracing::debug;

use crate::fmt::peso;
use crate::models::ExpenseRecord;

/// One category's slice of the scoped spend.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryShare {
    pub category: String,
    pub total: f64,
    /// Share of the scoped total, 0-100.
    pub percent: f64,
}

/// Aggregates over the record set for the reporting layer to render.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySummary {
    pub total: f64,
    pub transactions: usize,
    pub average: f64,
    /// Top five categories with their share of the spend, largest first.
    pub by_category: Vec<CategoryShare>,
    /// Top five merchants by spend, largest first.
    pub top_merchants: Vec<(String, f64)>,
}

fn month_start(today: NaiveDate) -> NaiveDate {
    today.with_day(1).unwrap_or(today)
}

fn grouped_totals<F>(records: &[&ExpenseRecord], key: F) -> Vec<(String, f64)>
where
    F: Fn(&ExpenseRecord) -> Option<String>,
{
    let mut totals: HashMap<String, f64> = HashMap::new();
    for r in records {
        if let Some(k) = key(r) {
            *totals.entry(k).or_default() += r.amount;
        }
    }
    let mut out: Vec<(String, f64)> = totals.into_iter().collect();
    // Largest first; name breaks ties so output is stable
    out.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0)));
    out
}

/// Summarize spending for the month containing `today`.
///
/// When the current month has no records the scope widens to the current
/// year, then to everything; a dateless table always summarizes everything.
/// Returns `None` only for an empty record set.
pub fn monthly_summary(records: &[ExpenseRecord], today: NaiveDate) -> Option<MonthlySummary> {
    if records.is_empty() {
        return None;
    }

    let scoped: Vec<&ExpenseRecord> = if records.iter().any(|r| r.date.is_some()) {
        let start = month_start(today);
        let in_month: Vec<&ExpenseRecord> = records
            .iter()
            .filter(|r| r.date.is_some_and(|d| d >= start))
            .collect();
        if !in_month.is_empty() {
            in_month
        } else {
            let in_year: Vec<&ExpenseRecord> = records
                .iter()
                .filter(|r| r.date.is_some_and(|d| d.year() == today.year()))
                .collect();
            if !in_year.is_empty() {
                debug!(count = in_year.len(), "no current-month data, widening to year");
                in_year
            } else {
                debug!(count = records.len(), "no current-year data, using all records");
                records.iter().collect()
            }
        }
    } else {
        debug!(count = records.len(), "dateless table, using all records");
        records.iter().collect()
    };

    let total: f64 = scoped.iter().map(|r| r.amount).sum();
    let transactions = scoped.len();
    let average = total / transactions as f64;

    // total > 0 here: every record amount is positive and the scope is
    // never empty.
    let by_category: Vec<CategoryShare> = grouped_totals(&scoped, |r| {
        r.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
    })
    .into_iter()
    .take(5)
    .map(|(category, amount)| CategoryShare {
        category,
        total: amount,
        percent: (amount / total) * 100.0,
    })
    .collect();
    let mut top_merchants = grouped_totals(&scoped, |r| {
        let m = r.merchant.trim();
        (!m.is_empty()).then(|| m.to_string())
    });
    top_merchants.truncate(5);

    Some(MonthlySummary {
        total,
        transactions,
        average,
        by_category,
        top_merchants,
    })
}

/// Month-over-month observations per category, plus overall totals.
/// Only swings larger than 20% are worth reporting.
pub fn category_insights(records: &[ExpenseRecord], today: NaiveDate) -> Vec<String> {
    let mut insights = Vec::new();
    if records.is_empty() {
        return insights;
    }

    let has_dates = records.iter().any(|r| r.date.is_some());
    let has_categories = records.iter().any(|r| r.category.is_some());

    if has_dates && has_categories {
        let this_month = month_start(today);
        let last_month = month_start(this_month - Duration::days(1));

        let current: Vec<&ExpenseRecord> = records
            .iter()
            .filter(|r| r.date.is_some_and(|d| d >= this_month))
            .collect();
        let previous: Vec<&ExpenseRecord> = records
            .iter()
            .filter(|r| r.date.is_some_and(|d| d >= last_month && d < this_month))
            .collect();

        let current_totals = grouped_totals(&current, |r| r.category.clone());
        let previous_totals: HashMap<String, f64> =
            grouped_totals(&previous, |r| r.category.clone())
                .into_iter()
                .collect();

        for (category, amount) in &current_totals {
            let Some(&last_amount) = previous_totals.get(category) else {
                continue;
            };
            if last_amount <= 0.0 {
                continue;
            }
            let change = ((amount - last_amount) / last_amount) * 100.0;
            if change.abs() > 20.0 {
                let direction = if change > 0.0 { "increased" } else { "decreased" };
                insights.push(format!(
                    "{category} {direction} by {:.1}% from last month",
                    change.abs()
                ));
            }
        }
    }

    let total: f64 = records.iter().map(|r| r.amount).sum();
    insights.push(format!(
        "Total spending across all records: {}",
        peso(total)
    ));

    if has_dates {
        let dates: Vec<NaiveDate> = records.iter().filter_map(|r| r.date).collect();
        if let (Some(min), Some(max)) = (dates.iter().min(), dates.iter().max()) {
            insights.push(format!("Data covers period: {min} to {max}"));
        }
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(amount: f64, merchant: &str, category: &str, date: Option<NaiveDate>) -> ExpenseRecord {
        ExpenseRecord {
            amount,
            date,
            merchant: merchant.to_string(),
            category: (!category.is_empty()).then(|| category.to_string()),
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_summary_scopes_to_current_month() {
        let records = vec![
            record(100.0, "Jollibee", "Food", Some(day(2024, 6, 5))),
            record(200.0, "Shell", "Transport", Some(day(2024, 6, 10))),
            record(999.0, "Old Store", "Other", Some(day(2024, 3, 1))),
        ];
        let s = monthly_summary(&records, day(2024, 6, 15)).unwrap();
        assert_eq!(s.transactions, 2);
        assert_eq!(s.total, 300.0);
        assert_eq!(s.average, 150.0);
    }

    #[test]
    fn test_summary_falls_back_to_year_then_all() {
        let records = vec![record(100.0, "Jollibee", "Food", Some(day(2024, 2, 5)))];
        // June has nothing; February of the same year does
        let s = monthly_summary(&records, day(2024, 6, 15)).unwrap();
        assert_eq!(s.transactions, 1);

        // A later year has nothing either; everything is used
        let s = monthly_summary(&records, day(2025, 6, 15)).unwrap();
        assert_eq!(s.transactions, 1);
    }

    #[test]
    fn test_summary_dateless_uses_everything() {
        let records = vec![
            record(100.0, "Jollibee", "Food", None),
            record(50.0, "Shell", "Transport", None),
        ];
        let s = monthly_summary(&records, day(2024, 6, 15)).unwrap();
        assert_eq!(s.transactions, 2);
        assert_eq!(s.total, 150.0);
    }

    #[test]
    fn test_summary_empty_is_none() {
        assert!(monthly_summary(&[], day(2024, 6, 15)).is_none());
    }

    #[test]
    fn test_category_breakdown_sorted_with_shares() {
        let records = vec![
            record(50.0, "A", "Food", Some(day(2024, 6, 1))),
            record(300.0, "B", "Transport", Some(day(2024, 6, 2))),
            record(100.0, "C", "Food", Some(day(2024, 6, 3))),
        ];
        let s = monthly_summary(&records, day(2024, 6, 15)).unwrap();
        assert_eq!(s.by_category.len(), 2);
        assert_eq!(s.by_category[0].category, "Transport");
        assert_eq!(s.by_category[0].total, 300.0);
        assert!((s.by_category[0].percent - 66.7).abs() < 0.1);
        assert_eq!(s.by_category[1].category, "Food");
        assert_eq!(s.by_category[1].total, 150.0);
        assert!((s.by_category[1].percent - 33.3).abs() < 0.1);
    }

    #[test]
    fn test_category_breakdown_capped_at_five() {
        let records: Vec<ExpenseRecord> = (0..7)
            .map(|i| {
                record(
                    10.0 + i as f64,
                    "Store",
                    &format!("Cat {i}"),
                    Some(day(2024, 6, 1)),
                )
            })
            .collect();
        let s = monthly_summary(&records, day(2024, 6, 15)).unwrap();
        assert_eq!(s.by_category.len(), 5);
        assert_eq!(s.by_category[0].category, "Cat 6");
    }

    #[test]
    fn test_top_merchants_capped_at_five() {
        let records: Vec<ExpenseRecord> = (0..8)
            .map(|i| {
                record(
                    10.0 + i as f64,
                    &format!("Store {i}"),
                    "Misc",
                    Some(day(2024, 6, 1)),
                )
            })
            .collect();
        let s = monthly_summary(&records, day(2024, 6, 15)).unwrap();
        assert_eq!(s.top_merchants.len(), 5);
        assert_eq!(s.top_merchants[0].0, "Store 7");
    }

    #[test]
    fn test_insights_flag_large_swings() {
        let records = vec![
            record(100.0, "A", "Food", Some(day(2024, 5, 10))),
            record(160.0, "B", "Food", Some(day(2024, 6, 10))),
            record(100.0, "C", "Transport", Some(day(2024, 5, 12))),
            record(110.0, "D", "Transport", Some(day(2024, 6, 12))),
        ];
        let insights = category_insights(&records, day(2024, 6, 15));
        assert!(insights
            .iter()
            .any(|i| i.contains("Food increased by 60.0%")));
        // 10% swing stays quiet
        assert!(!insights.iter().any(|i| i.contains("Transport")));
        assert!(insights
            .iter()
            .any(|i| i.contains("Total spending across all records")));
        assert!(insights
            .iter()
            .any(|i| i.contains("Data covers period: 2024-05-10 to 2024-06-12")));
    }

    #[test]
    fn test_insights_empty_records() {
        assert!(category_insights(&[], day(2024, 6, 15)).is_empty());
    }
}
