use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::de_flag;

/// Financial behavior analysis as computed by the backend.
///
/// Every field is optional; the view models decide what absence means.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BehaviorPayload {
    pub total_score: Option<f64>,
    pub behavior_rating: Option<String>,
    pub cash_inflow_pattern: Option<String>,
    pub liquidity_resilience_days: Option<f64>,
    pub transaction_depth_days: Option<f64>,
    pub has_stable_inflow: Option<bool>,
    pub category_scores: Option<BTreeMap<String, CategoryScore>>,
}

impl BehaviorPayload {
    /// Whether there is anything to show. The front-end asks the user to
    /// upload statements otherwise.
    pub fn has_categories(&self) -> bool {
        self.category_scores.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub spending: Option<f64>,
    pub percentage: Option<f64>,
    pub threshold: Option<f64>,
    #[serde(default, deserialize_with = "de_flag")]
    pub point: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_behavior_payload() {
        let payload: BehaviorPayload = serde_json::from_str(
            r#"{
                "total_score": 6,
                "behavior_rating": "good",
                "cash_inflow_pattern": "regular",
                "liquidity_resilience_days": 45,
                "transaction_depth_days": 180,
                "has_stable_inflow": true,
                "category_scores": {
                    "groceries": {"spending": 500, "percentage": 12.5, "threshold": 20, "point": 1},
                    "emi": {"spending": 0, "percentage": 0, "threshold": 30, "point": 0}
                }
            }"#,
        )
        .unwrap();

        assert_eq!(payload.total_score, Some(6.0));
        let scores = payload.category_scores.unwrap();
        assert_eq!(scores["groceries"].point, Some(true));
        assert_eq!(scores["emi"].point, Some(false));
    }

    #[test]
    fn test_point_flag_variants() {
        let as_bool: CategoryScore = serde_json::from_str(r#"{"point": true}"#).unwrap();
        let as_null: CategoryScore = serde_json::from_str(r#"{"point": null}"#).unwrap();
        let missing: CategoryScore = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(as_bool.point, Some(true));
        assert_eq!(as_null.point, None);
        assert_eq!(missing.point, None);
    }

    #[test]
    fn test_empty_payload() {
        let payload: BehaviorPayload = serde_json::from_str("{}").unwrap();
        assert!(!payload.has_categories());
        assert_eq!(payload, BehaviorPayload::default());
    }
}
