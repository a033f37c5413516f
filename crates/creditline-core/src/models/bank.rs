use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::de_opt_id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bank {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub interest_rate: Option<f64>,
    pub trust_score: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Bank {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unnamed bank")
    }
}
