use crate::domain::property::{Investment, Property};
use serde::Serialize;

/// Aggregate view of one user's holdings, computed on demand from current
/// records. No persistence, no caching.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_portfolio_value: f64,
    pub total_invested: f64,
    pub total_returns: f64,
    pub avg_roi: f64,
    pub token_balance: i64,
    pub active_properties: usize,
}

pub fn summarize(properties: &[Property], investments: &[Investment]) -> PortfolioSummary {
    let total_portfolio_value: f64 = investments.iter().map(|inv| inv.current_value_amount()).sum();
    let total_invested: f64 = investments.iter().map(|inv| inv.invested_amount()).sum();
    let total_returns = total_portfolio_value - total_invested;
    let avg_roi = if total_invested > 0.0 {
        (total_returns / total_invested) * 100.0
    } else {
        0.0
    };
    let token_balance: i64 = investments.iter().map(|inv| i64::from(inv.tokens_owned)).sum();
    let active_properties = properties.iter().filter(|p| p.is_active).count();

    PortfolioSummary {
        total_portfolio_value,
        total_invested,
        total_returns,
        avg_roi,
        token_balance,
        active_properties,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn investment(amount: &str, value: &str, tokens: i32) -> Investment {
        Investment {
            id: 1,
            user_id: 1,
            property_id: 1,
            tokens_owned: tokens,
            investment_amount: amount.to_string(),
            current_value: value.to_string(),
            purchase_date: Utc::now(),
        }
    }

    fn property(id: i32, is_active: bool) -> Property {
        Property {
            id,
            title: "P".to_string(),
            description: "D".to_string(),
            location: "L".to_string(),
            property_type: "Residential".to_string(),
            total_value: "1000000".to_string(),
            total_tokens: 1000,
            available_tokens: 500,
            expected_roi: "12.0".to_string(),
            min_investment: "1000".to_string(),
            image_url: "https://example.com/p.jpg".to_string(),
            is_active,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn summarizes_returns_and_roi() {
        let investments = vec![
            investment("1000", "1100", 10),
            investment("2000", "2100", 20),
        ];
        let properties = vec![property(1, true), property(2, false), property(3, true)];

        let summary = summarize(&properties, &investments);
        assert_eq!(summary.total_invested, 3000.0);
        assert_eq!(summary.total_portfolio_value, 3200.0);
        assert_eq!(summary.total_returns, 200.0);
        assert!((summary.avg_roi - 6.666_666_666_666_667).abs() < 1e-9);
        assert_eq!(summary.token_balance, 30);
        assert_eq!(summary.active_properties, 2);
    }

    #[test]
    fn empty_holdings_produce_zeroed_summary() {
        let summary = summarize(&[], &[]);
        assert_eq!(summary.total_invested, 0.0);
        assert_eq!(summary.avg_roi, 0.0);
        assert_eq!(summary.token_balance, 0);
    }
}
