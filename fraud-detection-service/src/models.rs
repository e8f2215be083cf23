use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Column order the classifier was trained on. Also the leading columns of
/// the record store.
pub const FEATURE_NAMES: [&str; 4] = [
    "age",
    "months_as_customer",
    "policy_annual_premium",
    "total_claim_amount",
];

pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

/// Predicted class of a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Fraud,
    Genuine,
}

impl Label {
    /// Raw classifier output 1 is fraud; every other value is genuine.
    pub fn from_raw(raw: i64) -> Self {
        if raw == 1 { Label::Fraud } else { Label::Genuine }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Fraud => "Fraud",
            Label::Genuine => "Genuine",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated model inputs for a single claim.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClaimFeatures {
    pub age: u32,
    pub months_as_customer: u32,
    pub policy_annual_premium: f64,
    pub total_claim_amount: f64,
}

impl ClaimFeatures {
    /// Feature vector in [`FEATURE_NAMES`] order.
    pub fn to_vector(&self) -> [f64; FEATURE_COUNT] {
        [
            f64::from(self.age),
            f64::from(self.months_as_customer),
            self.policy_annual_premium,
            self.total_claim_amount,
        ]
    }
}

/// One row of the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub age: u32,
    pub months_as_customer: u32,
    pub policy_annual_premium: f64,
    pub total_claim_amount: f64,
    #[serde(rename = "ML_Prediction")]
    pub ml_prediction: Option<Label>,
}

impl ClaimRecord {
    pub fn labelled(features: ClaimFeatures, label: Label) -> Self {
        Self {
            age: features.age,
            months_as_customer: features.months_as_customer,
            policy_annual_premium: features.policy_annual_premium,
            total_claim_amount: features.total_claim_amount,
            ml_prediction: Some(label),
        }
    }
}

/// Raw claim form as posted by the user dashboard.
///
/// Every field defaults to empty so a missing input reaches validation
/// instead of failing extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClaimForm {
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub months: String,
    #[serde(default)]
    pub premium: String,
    #[serde(default)]
    pub claim: String,
}

#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: String },

    #[error("{field} must be a number, got `{value}`")]
    NotANumber { field: String, value: String },

    #[error("{field} must be zero or greater")]
    Negative { field: String },

    #[error("{field} must be a finite number")]
    NotFinite { field: String },

    #[error("{field} is out of range")]
    OutOfRange { field: String },
}

impl ValidationError {
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Missing { field }
            | ValidationError::NotANumber { field, .. }
            | ValidationError::Negative { field }
            | ValidationError::NotFinite { field }
            | ValidationError::OutOfRange { field } => field,
        }
    }
}

impl ClaimForm {
    pub fn parse(&self) -> Result<ClaimFeatures, ValidationError> {
        Ok(ClaimFeatures {
            age: parse_count("age", &self.age)?,
            months_as_customer: parse_count("months", &self.months)?,
            policy_annual_premium: parse_amount("premium", &self.premium)?,
            total_claim_amount: parse_amount("claim", &self.claim)?,
        })
    }
}

fn non_empty<'a>(field: &str, raw: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Missing {
            field: field.to_string(),
        });
    }
    Ok(trimmed)
}

fn parse_count(field: &str, raw: &str) -> Result<u32, ValidationError> {
    let value = non_empty(field, raw)?;
    let parsed: i64 = value.parse().map_err(|_| ValidationError::NotANumber {
        field: field.to_string(),
        value: value.to_string(),
    })?;
    if parsed < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    u32::try_from(parsed).map_err(|_| ValidationError::OutOfRange {
        field: field.to_string(),
    })
}

fn parse_amount(field: &str, raw: &str) -> Result<f64, ValidationError> {
    let value = non_empty(field, raw)?;
    let parsed: f64 = value.parse().map_err(|_| ValidationError::NotANumber {
        field: field.to_string(),
        value: value.to_string(),
    })?;
    if !parsed.is_finite() {
        return Err(ValidationError::NotFinite {
            field: field.to_string(),
        });
    }
    if parsed < 0.0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(parsed)
}
