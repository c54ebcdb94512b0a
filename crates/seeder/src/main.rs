use anyhow::Context;
use clap::Parser;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod data;

#[derive(Debug, Parser)]
#[command(name = "tessera_seeder")]
struct Args {
    /// Report what would be written without touching the database.
    #[arg(long)]
    dry_run: bool,

    /// Wipe existing rows before seeding. Without this, a non-empty database
    /// is left untouched.
    #[arg(long)]
    reset: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = tessera_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let users = data::sample_users();
    let properties = data::sample_properties();
    let investments = data::sample_investments();

    if args.dry_run {
        tracing::info!(
            dry_run = true,
            users = users.len(),
            properties = properties.len(),
            investments = investments.len(),
            "seed dry-run"
        );
        return Ok(());
    }

    let db_url = settings.require_database_url()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    tessera_core::storage::migrate(&pool).await?;

    if args.reset {
        reset(&pool).await?;
    } else if !is_empty(&pool).await? {
        tracing::info!("database already seeded; use --reset to reseed");
        return Ok(());
    }

    let user_ids = insert_users(&pool, &users).await?;
    let property_ids = insert_properties(&pool, &properties).await?;
    let inserted = insert_investments(&pool, &investments, &user_ids, &property_ids).await?;

    tracing::info!(
        users = user_ids.len(),
        properties = property_ids.len(),
        investments = inserted,
        "seed complete"
    );

    Ok(())
}

async fn is_empty(pool: &PgPool) -> anyhow::Result<bool> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM properties")
        .fetch_one(pool)
        .await
        .context("count properties failed")?;
    Ok(count == 0)
}

async fn reset(pool: &PgPool) -> anyhow::Result<()> {
    // Delete in FK order.
    for table in ["transactions", "investments", "properties", "users"] {
        sqlx::query(&format!("DELETE FROM {table}"))
            .execute(pool)
            .await
            .with_context(|| format!("delete from {table} failed"))?;
    }
    tracing::warn!("existing rows deleted");
    Ok(())
}

async fn insert_users(pool: &PgPool, users: &[data::SeedUser]) -> anyhow::Result<Vec<i32>> {
    let mut ids = Vec::with_capacity(users.len());
    for user in users {
        let (id,): (i32,) = sqlx::query_as(
            "INSERT INTO users (username, email, wallet_address, kyc_status) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(user.username)
        .bind(user.email)
        .bind(user.wallet_address)
        .bind(user.kyc_status)
        .fetch_one(pool)
        .await
        .with_context(|| format!("insert user {} failed", user.username))?;
        ids.push(id);
    }
    Ok(ids)
}

async fn insert_properties(
    pool: &PgPool,
    properties: &[data::SeedProperty],
) -> anyhow::Result<Vec<i32>> {
    let mut ids = Vec::with_capacity(properties.len());
    for property in properties {
        let (id,): (i32,) = sqlx::query_as(
            "INSERT INTO properties \
             (title, description, location, property_type, total_value, total_tokens, \
              available_tokens, expected_roi, min_investment, image_url, is_active) \
             VALUES ($1, $2, $3, $4, $5::numeric(12, 2), $6, $7, $8::numeric(5, 2), \
                     $9::numeric(10, 2), $10, TRUE) \
             RETURNING id",
        )
        .bind(property.title)
        .bind(property.description)
        .bind(property.location)
        .bind(property.property_type)
        .bind(property.total_value)
        .bind(property.total_tokens)
        .bind(property.available_tokens)
        .bind(property.expected_roi)
        .bind(property.min_investment)
        .bind(property.image_url)
        .fetch_one(pool)
        .await
        .with_context(|| format!("insert property {} failed", property.title))?;
        ids.push(id);
    }
    Ok(ids)
}

async fn insert_investments(
    pool: &PgPool,
    investments: &[data::SeedInvestment],
    user_ids: &[i32],
    property_ids: &[i32],
) -> anyhow::Result<usize> {
    let mut inserted = 0usize;
    for inv in investments {
        let user_id = user_ids[inv.user_idx];
        let property_id = property_ids[inv.property_idx];

        sqlx::query(
            "INSERT INTO investments \
             (user_id, property_id, tokens_owned, investment_amount, current_value) \
             VALUES ($1, $2, $3, $4::numeric(10, 2), $5::numeric(10, 2))",
        )
        .bind(user_id)
        .bind(property_id)
        .bind(inv.tokens_owned)
        .bind(inv.investment_amount)
        .bind(inv.current_value)
        .execute(pool)
        .await
        .context("insert investment failed")?;

        sqlx::query(
            "INSERT INTO transactions (user_id, property_id, type, amount, tokens) \
             VALUES ($1, $2, 'purchase', $3::numeric(10, 2), $4)",
        )
        .bind(user_id)
        .bind(property_id)
        .bind(inv.investment_amount)
        .bind(inv.tokens_owned)
        .execute(pool)
        .await
        .context("insert transaction failed")?;

        inserted += 1;
    }
    Ok(inserted)
}

fn init_sentry(settings: &tessera_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
