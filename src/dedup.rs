use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fmt::peso;
use crate::models::{ExpenseRecord, NewExpense};

// ---------------------------------------------------------------------------
// Merchant similarity
// ---------------------------------------------------------------------------

/// Merchant similarity on a 0-100 scale, symmetric. Both sides are trimmed
/// and lowercased first; an empty side scores 0 so missing data never fakes
/// a strong match.
pub fn merchant_similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(&a, &b) * 100.0
}

// ---------------------------------------------------------------------------
// Classification tiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchReason {
    ExactAmountSimilarMerchant,
    CloseAmountVerySimilarMerchant,
    ExactAmountMerchantMissing,
}

impl std::fmt::Display for MatchReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ExactAmountSimilarMerchant => "Exact amount + similar merchant",
            Self::CloseAmountVerySimilarMerchant => "Very close amount + very similar merchant",
            Self::ExactAmountMerchantMissing => "Exact amount (merchant info missing)",
        };
        f.write_str(s)
    }
}

/// One historical record that qualified as a likely duplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateMatch {
    pub amount: f64,
    pub merchant: String,
    pub date: Option<NaiveDate>,
    pub reason: MatchReason,
    pub similarity: f64,
}

/// Outcome of a duplicate check: the strongest qualifying record plus how
/// many records qualified in total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateReport {
    pub is_duplicate: bool,
    pub best_match: Option<DuplicateMatch>,
    pub match_count: usize,
}

impl DuplicateReport {
    fn clean(n: usize) -> Self {
        debug!(checked = n, "no duplicates detected");
        Self {
            is_duplicate: false,
            best_match: None,
            match_count: 0,
        }
    }

    /// User-facing warning text for the save flow to show before asking
    /// for an override.
    pub fn message(&self, candidate: &NewExpense) -> String {
        let Some(best) = &self.best_match else {
            return "No duplicates detected".to_string();
        };
        let new_merchant = match candidate.merchant.trim() {
            "" => "Unknown",
            m => m,
        };
        let existing_merchant = match best.merchant.as_str() {
            "" => "Unknown",
            m => m,
        };
        let when = best
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "Unknown date".to_string());
        let mut msg = format!(
            "Possible duplicate receipt found!\n\
             New receipt: {} at {}\n\
             Existing: {} at {} on {}\n\
             Reason: {}",
            peso(candidate.amount),
            new_merchant,
            peso(best.amount),
            existing_merchant,
            when,
            best.reason,
        );
        if self.match_count > 1 {
            msg.push_str(&format!("\nFound {} similar receipts", self.match_count));
        }
        msg
    }
}

// ---------------------------------------------------------------------------
// DuplicateDetector
// ---------------------------------------------------------------------------

/// Stateless classifier deciding whether a candidate expense is a likely
/// re-submission of an existing record.
///
/// Conservative by construction: when evidence is insufficient it answers
/// "not duplicate" rather than blocking an entry. The tiers are ordered and
/// the first that holds decides; they trade false positives (two unrelated
/// same-amount purchases) against false negatives (a resubmission whose
/// amount the OCR read slightly differently).
#[derive(Debug, Clone)]
pub struct DuplicateDetector {
    pub window_days: i64,
    pub fallback_tail: usize,
    pub similar_threshold: f64,
    pub very_similar_threshold: f64,
    pub close_amount_tolerance: f64,
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self {
            window_days: 30,
            fallback_tail: 20,
            similar_threshold: 70.0,
            very_similar_threshold: 85.0,
            close_amount_tolerance: 2.0,
        }
    }
}

impl DuplicateDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check against history as of today.
    pub fn check(&self, candidate: &NewExpense, records: &[ExpenseRecord]) -> DuplicateReport {
        self.check_as_of(candidate, records, Local::now().date_naive())
    }

    /// Check with an explicit "today", mainly for tests and replays.
    pub fn check_as_of(
        &self,
        candidate: &NewExpense,
        records: &[ExpenseRecord],
        today: NaiveDate,
    ) -> DuplicateReport {
        if records.is_empty() {
            return DuplicateReport::clean(0);
        }

        // Dated history narrows to the trailing window; a dateless table
        // falls back to the most recently appended records.
        let pool: Vec<&ExpenseRecord> = if records.iter().any(|r| r.date.is_some()) {
            let cutoff = today - Duration::days(self.window_days);
            records
                .iter()
                .filter(|r| r.date.is_some_and(|d| d >= cutoff))
                .collect()
        } else {
            let skip = records.len().saturating_sub(self.fallback_tail);
            records[skip..].iter().collect()
        };
        debug!(pool = pool.len(), "checking for duplicates");

        let mut matches: Vec<DuplicateMatch> = Vec::new();
        for record in &pool {
            let amount_diff = (record.amount - candidate.amount).abs();
            let similarity = merchant_similarity(&record.merchant, &candidate.merchant);
            let merchant_missing =
                candidate.merchant.trim().is_empty() || record.merchant.trim().is_empty();

            let reason = if amount_diff == 0.0 && similarity >= self.similar_threshold {
                Some(MatchReason::ExactAmountSimilarMerchant)
            } else if amount_diff <= self.close_amount_tolerance
                && similarity >= self.very_similar_threshold
            {
                Some(MatchReason::CloseAmountVerySimilarMerchant)
            } else if amount_diff == 0.0 && merchant_missing {
                Some(MatchReason::ExactAmountMerchantMissing)
            } else {
                None
            };

            if let Some(reason) = reason {
                debug!(%reason, amount = record.amount, similarity, "duplicate match");
                matches.push(DuplicateMatch {
                    amount: record.amount,
                    merchant: record.merchant.trim().to_lowercase(),
                    date: record.date,
                    reason,
                    similarity,
                });
            }
        }

        if matches.is_empty() {
            return DuplicateReport::clean(pool.len());
        }

        // Best match is the highest similarity; the earliest-inserted wins
        // ties, so strict greater-than only.
        let mut best: Option<&DuplicateMatch> = None;
        for m in &matches {
            if best.map_or(true, |b| m.similarity > b.similarity) {
                best = Some(m);
            }
        }

        DuplicateReport {
            is_duplicate: true,
            best_match: best.cloned(),
            match_count: matches.len(),
        }
    }
}
