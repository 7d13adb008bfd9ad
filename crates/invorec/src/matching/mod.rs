//! Probabilistic matching of an extracted invoice against recorded bank
//! transactions. Three independent additive signals; a match is accepted
//! only when the best candidate strictly exceeds the threshold, so no
//! single signal can carry a decision alone. A wrong auto-match is worse
//! than no match.

use chrono::NaiveDate;
use tracing::debug;

use crate::config::ScoringConfig;
use crate::error::ScanError;
use crate::extract::ExtractedInvoice;
use crate::parser::{self, patterns};
use crate::scope::Scope;

/// Read-only candidate supplied by the transaction store. `amount` is
/// signed as recorded on the statement (debits negative).
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionCandidate {
    pub id: String,
    pub label: String,
    pub amount: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchDecision {
    pub transaction_id: Option<String>,
    pub score: u32,
}

impl MatchDecision {
    pub fn unmatched() -> Self {
        Self {
            transaction_id: None,
            score: 0,
        }
    }

    /// Normalized confidence stored with an accepted match.
    pub fn confidence(&self) -> Option<f64> {
        self.transaction_id
            .as_ref()
            .map(|_| (self.score as f64 / 100.0).min(1.0))
    }
}

/// Transaction store collaborator. Implementations own the window query,
/// including the exclusion of already-linked transactions and of labels
/// matching the configured patterns.
pub trait TransactionStore: Send + Sync {
    fn query_candidates(
        &self,
        scope: &Scope,
        from: NaiveDate,
        to: NaiveDate,
        exclude_linked: bool,
        exclude_labels: &[String],
    ) -> Result<Vec<TransactionCandidate>, ScanError>;
}

#[derive(Clone)]
pub struct MatchingEngine {
    config: ScoringConfig,
}

impl MatchingEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Keeps the highest-scoring candidate; accepts it only when the
    /// score strictly exceeds the configured threshold.
    pub fn decide(
        &self,
        invoice: &ExtractedInvoice,
        candidates: &[TransactionCandidate],
    ) -> MatchDecision {
        let mut best: Option<(&TransactionCandidate, u32)> = None;

        for candidate in candidates {
            let score = self.score(invoice, candidate);
            if best.map(|(_, s)| score > s).unwrap_or(true) {
                best = Some((candidate, score));
            }
        }

        match best {
            Some((candidate, score)) if score > self.config.accept_threshold => {
                debug!(
                    "Matched transaction '{}' with score {}",
                    candidate.id, score
                );
                MatchDecision {
                    transaction_id: Some(candidate.id.clone()),
                    score,
                }
            }
            Some((_, score)) => MatchDecision {
                transaction_id: None,
                score,
            },
            None => MatchDecision::unmatched(),
        }
    }

    pub fn score(&self, invoice: &ExtractedInvoice, candidate: &TransactionCandidate) -> u32 {
        self.amount_score(invoice, candidate)
            + self.date_score(invoice, candidate)
            + self.vendor_score(invoice, candidate)
    }

    /// Compares the invoice amount against the candidate's absolute
    /// amount and against any foreign-currency amount embedded in the
    /// label, keeping the closer of the two differences.
    fn amount_score(&self, invoice: &ExtractedInvoice, candidate: &TransactionCandidate) -> u32 {
        let Some(amount) = invoice.amount else {
            return 0;
        };

        let mut diff = (amount - candidate.amount.abs()).abs();
        for label_amount in label_amounts(&candidate.label) {
            diff = diff.min((amount - label_amount).abs());
        }

        let cfg = &self.config;
        if diff < 0.02 {
            cfg.amount_exact
        } else if diff < 0.5 {
            cfg.amount_close
        } else if diff < 2.0 {
            cfg.amount_near
        } else if amount > 0.0 && diff / amount < 0.05 {
            cfg.amount_relative
        } else {
            0
        }
    }

    fn date_score(&self, invoice: &ExtractedInvoice, candidate: &TransactionCandidate) -> u32 {
        let Some(date) = invoice.date else {
            return 0;
        };

        let days = (date - candidate.date).num_days().abs();
        let cfg = &self.config;
        if days <= 1 {
            cfg.date_same_day
        } else if days <= 3 {
            cfg.date_three_days
        } else if days <= 7 {
            cfg.date_week
        } else if days <= 14 {
            cfg.date_fortnight
        } else {
            // Being inside the window at all is weak evidence already.
            cfg.date_in_window
        }
    }

    fn vendor_score(&self, invoice: &ExtractedInvoice, candidate: &TransactionCandidate) -> u32 {
        let Some(vendor) = invoice.vendor.as_deref() else {
            return 0;
        };

        let vendor = vendor.to_lowercase();
        let label = candidate.label.to_lowercase();

        if label.contains(&vendor) || vendor.contains(&label) {
            return self.config.vendor_contains;
        }

        let token_hit = vendor
            .split_whitespace()
            .filter(|token| token.len() > 3)
            .any(|token| label.contains(token));
        if token_hit {
            self.config.vendor_token
        } else {
            0
        }
    }
}

/// Amounts written into a transaction label in foreign-currency notation
/// ("PAYPAL 21,60 EUR", "$30.00 AMAZON").
fn label_amounts(label: &str) -> Vec<f64> {
    patterns::CURRENCY_AMOUNT
        .captures_iter(label)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .filter_map(|m| parser::parse_decimal(m.as_str()))
        .collect()
}
