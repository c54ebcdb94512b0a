use crate::domain::property::Investment;
use anyhow::Context;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct NewInvestment {
    pub user_id: i32,
    pub property_id: i32,
    pub tokens_owned: i32,
    pub investment_amount: f64,
}

/// Purchase flow: decrement the property's available tokens, record the
/// investment at cost basis, and append a purchase transaction. All three
/// writes commit atomically; an insufficient token balance aborts the whole
/// purchase.
pub async fn create_investment(
    pool: &sqlx::PgPool,
    new: &NewInvestment,
) -> anyhow::Result<Investment> {
    anyhow::ensure!(new.tokens_owned > 0, "tokens_owned must be positive");
    anyhow::ensure!(
        new.investment_amount.is_finite() && new.investment_amount > 0.0,
        "investment_amount must be positive"
    );

    let mut tx = pool.begin().await.context("begin transaction failed")?;

    let updated = sqlx::query(
        "UPDATE properties \
         SET available_tokens = available_tokens - $2 \
         WHERE id = $1 AND is_active AND available_tokens >= $2",
    )
    .bind(new.property_id)
    .bind(new.tokens_owned)
    .execute(&mut *tx)
    .await
    .context("update property tokens failed")?;

    anyhow::ensure!(
        updated.rows_affected() == 1,
        "property {} is not investable for {} tokens",
        new.property_id,
        new.tokens_owned
    );

    let (id, investment_amount, current_value, purchase_date): (
        i32,
        String,
        String,
        DateTime<Utc>,
    ) = sqlx::query_as(
        "INSERT INTO investments (user_id, property_id, tokens_owned, investment_amount, current_value) \
         VALUES ($1, $2, $3, $4::numeric(10, 2), $4::numeric(10, 2)) \
         RETURNING id, investment_amount::text, current_value::text, purchase_date",
    )
    .bind(new.user_id)
    .bind(new.property_id)
    .bind(new.tokens_owned)
    .bind(new.investment_amount)
    .fetch_one(&mut *tx)
    .await
    .context("insert investment failed")?;

    let transaction_hash = format!("0x{}", uuid::Uuid::new_v4().simple());
    sqlx::query(
        "INSERT INTO transactions (user_id, property_id, type, amount, tokens, transaction_hash) \
         VALUES ($1, $2, 'purchase', $3::numeric(10, 2), $4, $5)",
    )
    .bind(new.user_id)
    .bind(new.property_id)
    .bind(new.investment_amount)
    .bind(new.tokens_owned)
    .bind(transaction_hash)
    .execute(&mut *tx)
    .await
    .context("insert transaction failed")?;

    tx.commit().await.context("commit transaction failed")?;

    Ok(Investment {
        id,
        user_id: new.user_id,
        property_id: new.property_id,
        tokens_owned: new.tokens_owned,
        investment_amount,
        current_value,
        purchase_date,
    })
}
