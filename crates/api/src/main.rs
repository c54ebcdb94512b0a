use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tessera_core::domain::property::{Investment, Property};
use tessera_core::domain::recommendation::PropertyRecommendation;
use tessera_core::engine::{RecommendationEngine, ScoringConfig};
use tessera_core::llm::{anthropic::AnthropicClient, InferenceClient};
use tessera_core::portfolio::{self, PortfolioSummary};
use tessera_core::storage::{self, investments::NewInvestment, pg::PgStore, PropertyStore};

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

    let pool: Option<PgPool> = match settings.require_database_url() {
        Ok(db_url) => match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
        {
            Ok(pool) => match storage::migrate(&pool).await {
                Ok(()) => Some(pool),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "db migrations failed; starting API in degraded mode");
                    None
                }
            },
            Err(e) => {
                let err = anyhow::Error::new(e);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "db connect failed; starting API in degraded mode");
                None
            }
        },
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "DATABASE_URL missing; starting API in degraded mode");
            None
        }
    };

    // A missing inference key only disables primary scoring; the engine then
    // serves recommendations from the rule-based scorer.
    let llm: Option<Arc<dyn InferenceClient>> = match AnthropicClient::from_settings(&settings) {
        Ok(client) => Some(Arc::new(client)),
        Err(err) => {
            tracing::warn!(error = %err, "inference client unavailable; recommendations will be rule-based");
            None
        }
    };

    let store: Option<Arc<dyn PropertyStore>> = pool
        .as_ref()
        .map(|pool| Arc::new(PgStore::new(pool.clone())) as Arc<dyn PropertyStore>);
    let engine = store
        .as_ref()
        .map(|store| Arc::new(RecommendationEngine::new(store.clone(), llm, ScoringConfig::from_env())));

    let state = AppState {
        pool,
        store,
        engine,
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/properties", get(list_properties))
        .route("/api/properties/:id", get(get_property))
        .route("/api/investments", post(create_investment))
        .route("/api/users/:id/investments", get(list_user_investments))
        .route("/api/users/:id/portfolio", get(get_portfolio))
        .route("/api/users/:id/recommendations", get(get_recommendations))
        .route(
            "/api/users/:id/recommendations/:property_id/explanation",
            get(explain_recommendation),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    pool: Option<PgPool>,
    store: Option<Arc<dyn PropertyStore>>,
    engine: Option<Arc<RecommendationEngine>>,
}

async fn list_properties(
    State(state): State<AppState>,
) -> Result<Json<Vec<Property>>, StatusCode> {
    let Some(store) = &state.store else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let properties = store.get_properties().await.map_err(internal_error)?;
    Ok(Json(properties))
}

async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Property>, StatusCode> {
    let Some(store) = &state.store else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let property = store
        .get_property(id)
        .await
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(property))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateInvestmentRequest {
    user_id: i32,
    property_id: i32,
    tokens_owned: i32,
    investment_amount: f64,
}

async fn create_investment(
    State(state): State<AppState>,
    Json(req): Json<CreateInvestmentRequest>,
) -> Result<Json<Investment>, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let new = NewInvestment {
        user_id: req.user_id,
        property_id: req.property_id,
        tokens_owned: req.tokens_owned,
        investment_amount: req.investment_amount,
    };

    let investment = storage::investments::create_investment(pool, &new)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "create investment rejected");
            StatusCode::UNPROCESSABLE_ENTITY
        })?;
    Ok(Json(investment))
}

async fn list_user_investments(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> Result<Json<Vec<Investment>>, StatusCode> {
    let Some(store) = &state.store else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let investments = store
        .get_investments_by_user(user_id)
        .await
        .map_err(internal_error)?;
    Ok(Json(investments))
}

async fn get_portfolio(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> Result<Json<PortfolioSummary>, StatusCode> {
    let Some(store) = &state.store else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let properties = store.get_properties().await.map_err(internal_error)?;
    let investments = store
        .get_investments_by_user(user_id)
        .await
        .map_err(internal_error)?;
    Ok(Json(portfolio::summarize(&properties, &investments)))
}

#[derive(Debug, Deserialize)]
struct RecommendationQuery {
    limit: Option<i64>,
}

async fn get_recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
    Query(query): Query<RecommendationQuery>,
) -> Result<Json<Vec<PropertyRecommendation>>, StatusCode> {
    let Some(engine) = &state.engine else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    // Non-positive limits fall through to the engine default.
    let limit = query.limit.and_then(|n| usize::try_from(n).ok());
    let recommendations = engine.generate_recommendations(user_id, limit).await;
    Ok(Json(recommendations))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExplanationResponse {
    property_id: i32,
    user_id: i32,
    explanation: String,
}

async fn explain_recommendation(
    State(state): State<AppState>,
    Path((user_id, property_id)): Path<(i32, i32)>,
) -> Result<Json<ExplanationResponse>, StatusCode> {
    let Some(engine) = &state.engine else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let explanation = engine.explain_recommendation(property_id, user_id).await;
    Ok(Json(ExplanationResponse {
        property_id,
        user_id,
        explanation,
    }))
}

fn internal_error(e: anyhow::Error) -> StatusCode {
    sentry_anyhow::capture_anyhow(&e);
    tracing::error!(error = %e, "request failed");
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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
