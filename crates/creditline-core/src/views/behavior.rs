//! Display models for the financial behavior score.
//!
//! Everything here is read straight off the backend payload. Ratings and
//! per-category points are never recomputed on the client.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{BehaviorPayload, CategoryScore};

/// The behavior score is out of 8.
pub const MAX_BEHAVIOR_SCORE: f64 = 8.0;

/// Known spending categories in display order.
pub const CATEGORY_LABELS: [(&str, &str); 8] = [
    ("transport", "Transport"),
    ("education", "Education"),
    ("medical", "Medical"),
    ("food_shopping", "Food & Shopping"),
    ("groceries", "Groceries"),
    ("emi", "EMI"),
    ("entertainment", "Entertainment"),
    ("others", "Others"),
];

/// Display label for a category key. Unknown keys are shown as-is.
pub fn category_label(key: &str) -> &str {
    CATEGORY_LABELS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, label)| *label)
        .unwrap_or(key)
}

fn category_order(key: &str) -> usize {
    CATEGORY_LABELS
        .iter()
        .position(|(k, _)| *k == key)
        .unwrap_or(CATEGORY_LABELS.len())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Positive,
    Neutral,
    Negative,
    Muted,
}

impl Tone {
    pub fn color(&self) -> &'static str {
        match self {
            Tone::Positive => "#16a34a",
            Tone::Neutral => "#ca8a04",
            Tone::Negative => "#dc2626",
            Tone::Muted => "#4b5563",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Good,
    Average,
    Bad,
    Unknown,
}

impl Rating {
    pub fn from_payload(raw: Option<&str>) -> Self {
        match raw {
            Some("good") => Rating::Good,
            Some("average") => Rating::Average,
            Some("bad") => Rating::Bad,
            _ => Rating::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Rating::Good => "Excellent",
            Rating::Average => "Average",
            Rating::Bad => "Needs Improvement",
            Rating::Unknown => "Unknown",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Rating::Good => Tone::Positive,
            Rating::Average => Tone::Neutral,
            Rating::Bad => Tone::Negative,
            Rating::Unknown => Tone::Muted,
        }
    }

    pub fn summary(&self) -> Option<&'static str> {
        match self {
            Rating::Good => Some("Your financial health is excellent!"),
            Rating::Average => Some("Your financial health is average."),
            Rating::Bad => Some("Consider improving your spending habits."),
            Rating::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CategoryRow {
    pub key: String,
    pub label: String,
    pub spending: f64,
    /// Share of income spent, in percent.
    pub percentage: f64,
    pub threshold: f64,
    pub meets_target: bool,
}

impl CategoryRow {
    fn from_score(key: &str, score: &CategoryScore) -> Self {
        Self {
            key: key.to_string(),
            label: category_label(key).to_string(),
            spending: score.spending.unwrap_or(0.0),
            percentage: score.percentage.unwrap_or(0.0),
            threshold: score.threshold.unwrap_or(0.0),
            meets_target: score.point.unwrap_or(false),
        }
    }
}

/// One slice of the spending distribution chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct DistributionSlice {
    pub key: String,
    pub label: String,
    pub spending: f64,
    /// Fraction of total spending, 0.0 to 1.0.
    pub share: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CategoryBreakdown {
    rows: Vec<CategoryRow>,
}

impl CategoryBreakdown {
    pub fn from_scores(scores: &BTreeMap<String, CategoryScore>) -> Self {
        let mut rows: Vec<CategoryRow> = scores
            .iter()
            .map(|(key, score)| CategoryRow::from_score(key, score))
            .collect();
        // Stable sort: unknown keys keep the map's alphabetical order.
        rows.sort_by_key(|row| category_order(&row.key));
        Self { rows }
    }

    /// Every category, including ones with no spending.
    pub fn threshold_comparison(&self) -> &[CategoryRow] {
        &self.rows
    }

    /// Categories with spending, for the distribution chart.
    pub fn distribution(&self) -> Vec<DistributionSlice> {
        let spent: Vec<&CategoryRow> = self.rows.iter().filter(|r| r.spending > 0.0).collect();
        let total: f64 = spent.iter().map(|r| r.spending).sum();
        spent
            .into_iter()
            .map(|row| DistributionSlice {
                key: row.key.clone(),
                label: row.label.clone(),
                spending: row.spending,
                share: if total > 0.0 { row.spending / total } else { 0.0 },
            })
            .collect()
    }

    pub fn targets_met(&self) -> usize {
        self.rows.iter().filter(|r| r.meets_target).count()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Everything the behavior score card and analytics page show.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct BehaviorView {
    /// False when the payload had no category scores (nothing uploaded yet).
    pub has_data: bool,
    pub total_score: f64,
    pub max_score: f64,
    pub rating: Rating,
    pub cash_inflow_pattern: String,
    pub liquidity_resilience_days: f64,
    pub transaction_depth_days: f64,
    pub has_stable_inflow: bool,
    pub categories: CategoryBreakdown,
}

impl BehaviorView {
    /// Build the view from the latest payload. Missing fields become zero or
    /// empty; nothing is carried over from earlier payloads.
    pub fn from_payload(payload: &BehaviorPayload) -> Self {
        Self {
            has_data: payload.has_categories(),
            total_score: payload.total_score.unwrap_or(0.0),
            max_score: MAX_BEHAVIOR_SCORE,
            rating: Rating::from_payload(payload.behavior_rating.as_deref()),
            cash_inflow_pattern: payload.cash_inflow_pattern.clone().unwrap_or_default(),
            liquidity_resilience_days: payload.liquidity_resilience_days.unwrap_or(0.0),
            transaction_depth_days: payload.transaction_depth_days.unwrap_or(0.0),
            has_stable_inflow: payload.has_stable_inflow.unwrap_or(false),
            categories: payload
                .category_scores
                .as_ref()
                .map(CategoryBreakdown::from_scores)
                .unwrap_or_default(),
        }
    }

    pub fn rating_label(&self) -> &'static str {
        self.rating.label()
    }

    /// The unfilled part of the score gauge.
    pub fn remaining_score(&self) -> f64 {
        (self.max_score - self.total_score).max(0.0)
    }

    pub fn stability_label(&self) -> &'static str {
        if self.has_stable_inflow {
            "Stable"
        } else {
            "Unstable"
        }
    }
}
