use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::random::RandomSource;
use crate::models::LoanRecord;

/// Bounds of the placeholder acceptance rate, inclusive.
pub const PLACEHOLDER_RATE_MIN: u8 = 40;
pub const PLACEHOLDER_RATE_MAX: u8 = 90;

/// Acceptance rate shown for a loan application.
///
/// `Placeholder` is a locally generated stand-in used when the backend's
/// model returned no rate. It is not a score and never leaves this client.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "source", content = "value", rename_all = "snake_case")]
pub enum AcceptanceRate {
    Reported(f64),
    Placeholder(u8),
}

impl AcceptanceRate {
    pub fn resolve(reported: Option<f64>, rng: &dyn RandomSource) -> Self {
        match reported {
            Some(rate) => AcceptanceRate::Reported(rate),
            None => AcceptanceRate::Placeholder(
                rng.uniform_inclusive(PLACEHOLDER_RATE_MIN, PLACEHOLDER_RATE_MAX),
            ),
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            AcceptanceRate::Reported(rate) => *rate,
            AcceptanceRate::Placeholder(rate) => f64::from(*rate),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, AcceptanceRate::Placeholder(_))
    }
}

/// A loan application made from this client, as kept locally.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedLoan {
    /// The record exactly as the backend returned it.
    pub record: LoanRecord,
    pub acceptance_rate: AcceptanceRate,
    pub applied_at: DateTime<Utc>,
}

/// Local list of applications, newest first.
pub struct LoanBook {
    loans: Vec<CachedLoan>,
    rng: Arc<dyn RandomSource>,
}

impl LoanBook {
    pub fn new(rng: Arc<dyn RandomSource>) -> Self {
        Self {
            loans: Vec::new(),
            rng,
        }
    }

    /// Cache an apply response and make it the current loan.
    pub fn record(&mut self, record: LoanRecord) -> &CachedLoan {
        let acceptance_rate = AcceptanceRate::resolve(record.acceptance_rate, self.rng.as_ref());
        if acceptance_rate.is_placeholder() {
            debug!(loan_id = ?record.id, rate = acceptance_rate.value(), "Backend returned no acceptance rate, using placeholder");
        }
        self.loans.insert(
            0,
            CachedLoan {
                record,
                acceptance_rate,
                applied_at: Utc::now(),
            },
        );
        &self.loans[0]
    }

    /// The most recent application.
    pub fn current(&self) -> Option<&CachedLoan> {
        self.loans.first()
    }

    pub fn loans(&self) -> &[CachedLoan] {
        &self.loans
    }

    pub fn clear(&mut self) {
        self.loans.clear();
    }
}

/// Aggregates for the dashboard overview cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct LoanSummary {
    pub total_applications: usize,
    pub total_requested: f64,
    /// Approved or processing.
    pub active: usize,
}

impl LoanSummary {
    pub fn from_records(records: &[LoanRecord]) -> Self {
        Self {
            total_applications: records.len(),
            total_requested: records.iter().filter_map(|r| r.amount_requested).sum(),
            active: records.iter().filter(|r| r.is_active()).count(),
        }
    }
}
