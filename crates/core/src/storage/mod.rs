pub mod investments;
pub mod pg;

use crate::domain::property::{Investment, Property, User};
use anyhow::Context;

/// Read-only view of the record store as the recommendation engine consumes
/// it. Writes (investments, transactions) live in [`investments`] and are an
/// API-layer concern.
#[async_trait::async_trait]
pub trait PropertyStore: Send + Sync {
    async fn get_properties(&self) -> anyhow::Result<Vec<Property>>;

    async fn get_property(&self, id: i32) -> anyhow::Result<Option<Property>>;

    async fn get_user(&self, id: i32) -> anyhow::Result<Option<User>>;

    async fn get_investments_by_user(&self, user_id: i32) -> anyhow::Result<Vec<Investment>>;
}

pub async fn migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("sqlx migrations failed")?;
    Ok(())
}
