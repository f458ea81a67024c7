//! JSON API over the hydrated store.

use std::path::Path;

use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::aggregate;
use crate::error::{MteError, Result};
use crate::lookup;
use crate::model::{Aggregation, VariantMte};
use crate::store::Store;
use crate::sync::{AirtableClient, ProbeReport, SyncStatus};

/// Shared handles given to every request handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Store,
    pub airtable: AirtableClient,
}

impl AppState {
    pub fn new(store: Store, airtable: AirtableClient) -> Self {
        Self { store, airtable }
    }
}

/// Builds the router. When `static_dir` is given, unmatched paths are served
/// from it with `index.html` as the fallback page.
pub fn router(state: AppState, static_dir: Option<&Path>) -> Router {
    let mut router = Router::new()
        .route("/modules", get(list_modules))
        .route("/models/:module_name", get(list_models))
        .route("/variants/:model_name", get(list_variants))
        .route("/calculate_mte", post(calculate_mte))
        .route("/mte-calculate", post(mte_calculate))
        .route("/test_airtable", get(test_airtable));

    if let Some(dir) = static_dir {
        let assets = ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")));
        router = router.fallback_service(assets);
    }

    router
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Serves `router` on `listener` until Ctrl-C.
pub async fn serve(listener: TcpListener, router: Router) -> Result<()> {
    info!(address = %listener.local_addr()?, "listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

/// A variant reference as submitted by clients: either a bare name or an
/// object carrying `variant_name`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum VariantRef {
    Name(String),
    Object { variant_name: Option<String> },
}

impl VariantRef {
    fn into_name(self) -> Option<String> {
        match self {
            VariantRef::Name(name) => Some(name),
            VariantRef::Object { variant_name } => variant_name,
        }
    }
}

/// Body of both calculate endpoints. A missing or `null` list is empty.
#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    #[serde(default)]
    pub variants: Option<Vec<VariantRef>>,
}

impl CalculateRequest {
    fn is_empty(&self) -> bool {
        self.variants.as_ref().is_none_or(Vec::is_empty)
    }

    fn into_names(self) -> Vec<String> {
        self.variants
            .unwrap_or_default()
            .into_iter()
            .filter_map(VariantRef::into_name)
            .collect()
    }
}

#[derive(Debug, Serialize)]
struct SyncedAggregation {
    #[serde(flatten)]
    aggregation: Aggregation,
    airtable_sync: SyncStatus,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(&'static str),
    Internal(MteError),
}

impl From<MteError> for ApiError {
    fn from(error: MteError) -> Self {
        ApiError::Internal(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": message })),
            )
                .into_response(),
            ApiError::Internal(error) => {
                error!(%error, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": "internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

async fn list_modules(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    let modules = state.store.read(lookup::list_modules).await?;
    Ok(Json(modules))
}

async fn list_models(
    State(state): State<AppState>,
    UrlPath(module_name): UrlPath<String>,
) -> ApiResult<Vec<String>> {
    let models = state
        .store
        .read(move |conn| lookup::list_models(conn, &module_name))
        .await?;
    Ok(Json(models))
}

async fn list_variants(
    State(state): State<AppState>,
    UrlPath(model_name): UrlPath<String>,
) -> ApiResult<Vec<VariantMte>> {
    let variants = state
        .store
        .read(move |conn| lookup::list_variants(conn, &model_name))
        .await?;
    Ok(Json(variants))
}

async fn resolve(state: &AppState, names: Vec<String>) -> Result<Aggregation> {
    state
        .store
        .read(move |conn| aggregate::aggregate(conn, &names))
        .await
}

/// Empty input is a valid request with a zero total and nothing is pushed.
async fn calculate_mte(
    State(state): State<AppState>,
    Json(request): Json<CalculateRequest>,
) -> ApiResult<Aggregation> {
    let names = request.into_names();
    if names.is_empty() {
        return Ok(Json(Aggregation::empty()));
    }
    let aggregation = resolve(&state, names).await?;
    let status = state.airtable.push(&aggregation).await;
    info!(
        matched = aggregation.variants.len(),
        overall_mte = aggregation.overall_mte,
        airtable_sync = ?status,
        "MTE calculated"
    );
    Ok(Json(aggregation))
}

/// Rejects empty input and reports the sync outcome alongside the result.
async fn mte_calculate(
    State(state): State<AppState>,
    Json(request): Json<CalculateRequest>,
) -> ApiResult<SyncedAggregation> {
    if request.is_empty() {
        return Err(ApiError::BadRequest("No variants provided"));
    }
    let aggregation = resolve(&state, request.into_names()).await?;
    let airtable_sync = state.airtable.push(&aggregation).await;
    info!(
        matched = aggregation.variants.len(),
        overall_mte = aggregation.overall_mte,
        ?airtable_sync,
        "MTE calculated"
    );
    Ok(Json(SyncedAggregation {
        aggregation,
        airtable_sync,
    }))
}

async fn test_airtable(State(state): State<AppState>) -> (StatusCode, Json<ProbeReport>) {
    let report = state.airtable.probe().await;
    let status =
        StatusCode::from_u16(report.http_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(report))
}
