use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::de_opt_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CityTier {
    #[serde(rename = "tier_1")]
    Tier1,
    #[serde(rename = "tier_2")]
    Tier2,
    #[serde(rename = "tier_3")]
    Tier3,
}

impl CityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CityTier::Tier1 => "tier_1",
            CityTier::Tier2 => "tier_2",
            CityTier::Tier3 => "tier_3",
        }
    }
}

impl fmt::Display for CityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CityTier {
    type Err = String;

    /// Accepts form labels ("Tier 1") as well as wire values ("tier_1").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(' ', "_").as_str() {
            "tier_1" | "1" => Ok(CityTier::Tier1),
            "tier_2" | "2" => Ok(CityTier::Tier2),
            "tier_3" | "3" => Ok(CityTier::Tier3),
            _ => Err(format!("Unknown city tier: {}", s)),
        }
    }
}

/// Loan form as entered in the front-end.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanForm {
    pub loan_amount: f64,
    pub loan_duration: u32,
    pub monthly_income: f64,
    pub total_assets: f64,
    pub existing_debts_count: u32,
    pub total_debt_amount: f64,
    #[serde(rename = "monthlyEMI")]
    pub monthly_emi: f64,
    pub city_tier: CityTier,
}

/// Body of `POST /api/loans/apply`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanApplication {
    pub amount_requested: f64,
    pub loan_duration: u32,
    pub monthly_income: f64,
    pub total_assets: f64,
    pub num_debts: u32,
    pub total_debt_amount: f64,
    pub monthly_emis: f64,
    pub city_tier: CityTier,
}

impl From<LoanForm> for LoanApplication {
    fn from(form: LoanForm) -> Self {
        Self {
            amount_requested: form.loan_amount,
            loan_duration: form.loan_duration,
            monthly_income: form.monthly_income,
            total_assets: form.total_assets,
            num_debts: form.existing_debts_count,
            total_debt_amount: form.total_debt_amount,
            monthly_emis: form.monthly_emi,
            city_tier: form.city_tier,
        }
    }
}

/// A loan as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub user_id: Option<String>,
    pub amount_requested: Option<f64>,
    pub loan_duration: Option<u32>,
    pub status: Option<String>,
    pub acceptance_rate: Option<f64>,
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LoanRecord {
    /// Approved or still being processed.
    pub fn is_active(&self) -> bool {
        matches!(self.status.as_deref(), Some("processing") | Some("approved"))
    }
}
