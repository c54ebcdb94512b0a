use crate::domain::property::{Investment, Property, User};
use crate::storage::PropertyStore;
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

// Decimal columns are selected as text so the domain keeps the exact
// database representation.
const PROPERTY_COLUMNS: &str = "id, title, description, location, property_type, \
     total_value::text, total_tokens, available_tokens, expected_roi::text, \
     min_investment::text, image_url, is_active, created_at";

type PropertyRow = (
    i32,
    String,
    String,
    String,
    String,
    String,
    i32,
    i32,
    String,
    String,
    String,
    bool,
    DateTime<Utc>,
);

type InvestmentRow = (i32, i32, i32, i32, String, String, DateTime<Utc>);

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PropertyStore for PgStore {
    async fn get_properties(&self) -> anyhow::Result<Vec<Property>> {
        let rows = sqlx::query_as::<_, PropertyRow>(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .context("select properties failed")?;

        Ok(rows.into_iter().map(property_from_row).collect())
    }

    async fn get_property(&self, id: i32) -> anyhow::Result<Option<Property>> {
        let row = sqlx::query_as::<_, PropertyRow>(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("select property failed")?;

        Ok(row.map(property_from_row))
    }

    async fn get_user(&self, id: i32) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<
            _,
            (
                i32,
                String,
                String,
                Option<String>,
                String,
                DateTime<Utc>,
            ),
        >(
            "SELECT id, username, email, wallet_address, kyc_status, created_at \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("select user failed")?;

        Ok(row.map(
            |(id, username, email, wallet_address, kyc_status, created_at)| User {
                id,
                username,
                email,
                wallet_address,
                kyc_status,
                created_at,
            },
        ))
    }

    async fn get_investments_by_user(&self, user_id: i32) -> anyhow::Result<Vec<Investment>> {
        let rows = sqlx::query_as::<_, InvestmentRow>(
            "SELECT id, user_id, property_id, tokens_owned, investment_amount::text, \
             current_value::text, purchase_date \
             FROM investments WHERE user_id = $1 ORDER BY id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("select investments failed")?;

        Ok(rows.into_iter().map(investment_from_row).collect())
    }
}

fn property_from_row(row: PropertyRow) -> Property {
    let (
        id,
        title,
        description,
        location,
        property_type,
        total_value,
        total_tokens,
        available_tokens,
        expected_roi,
        min_investment,
        image_url,
        is_active,
        created_at,
    ) = row;

    Property {
        id,
        title,
        description,
        location,
        property_type,
        total_value,
        total_tokens,
        available_tokens,
        expected_roi,
        min_investment,
        image_url,
        is_active,
        created_at,
    }
}

fn investment_from_row(row: InvestmentRow) -> Investment {
    let (id, user_id, property_id, tokens_owned, investment_amount, current_value, purchase_date) =
        row;

    Investment {
        id,
        user_id,
        property_id,
        tokens_owned,
        investment_amount,
        current_value,
        purchase_date,
    }
}
