use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A fractional real-estate asset tokenized into a fixed supply of tokens.
///
/// Monetary columns are carried as decimal strings end to end so the API
/// serves exactly what the database holds; scoring parses them on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub location: String,
    pub property_type: String,
    pub total_value: String,
    pub total_tokens: i32,
    pub available_tokens: i32,
    #[serde(rename = "expectedROI")]
    pub expected_roi: String,
    pub min_investment: String,
    pub image_url: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Property {
    /// A property is investable only while it is active and has tokens left.
    pub fn is_investable(&self) -> bool {
        self.is_active && self.available_tokens > 0
    }

    pub fn min_investment_amount(&self) -> f64 {
        parse_decimal(&self.min_investment)
    }

    pub fn expected_roi_pct(&self) -> f64 {
        parse_decimal(&self.expected_roi)
    }
}

/// A user's token holding in one property, with cost basis and current value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    pub id: i32,
    pub user_id: i32,
    pub property_id: i32,
    pub tokens_owned: i32,
    pub investment_amount: String,
    pub current_value: String,
    pub purchase_date: DateTime<Utc>,
}

impl Investment {
    pub fn invested_amount(&self) -> f64 {
        parse_decimal(&self.investment_amount)
    }

    pub fn current_value_amount(&self) -> f64 {
        parse_decimal(&self.current_value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub wallet_address: Option<String>,
    pub kyc_status: String,
    pub created_at: DateTime<Utc>,
}

/// Tolerant decimal parse for currency/percentage strings ("$2,500.00",
/// "14.2"). Unparseable input yields 0.0 rather than an error; callers treat
/// that as "no signal".
pub fn parse_decimal(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse::<f64>().unwrap_or(0.0)
}
