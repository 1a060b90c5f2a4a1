//! Raffle gateway service - HTTP surface over the raffle core.
//!
//! | Route | Operation |
//! |-------|-----------|
//! | `POST /raffles` | close a period (201) |
//! | `POST /raffles/:id/draw` | draw the winner |
//! | `GET /raffles/:id` | raffle record |
//! | `GET /raffles/:id/proof/:index` | inclusion proof for one entry |
//! | `GET /raffles/:id/report` | transparency report |
//! | `GET /health` | liveness |
//!
//! Scheduling lives outside the gateway: a cron job or operator calls the
//! two POST routes at period end.

use crate::domain::config::GatewayConfig;
use crate::domain::error::{ApiError, ApiResult, GatewayError};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use raffle_draw::{
    EntryProof, ExternalSeedProvider, HttpRandomnessBeacon, InMemoryRaffleRepository,
    JsonFileEntrySource, Period, RaffleApi, RaffleId, RaffleRecord, RaffleService,
    TransparencyReport,
};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Raffle gateway service
pub struct RaffleGatewayService {
    config: GatewayConfig,
    raffles: Arc<dyn RaffleApi>,
}

impl RaffleGatewayService {
    /// Assemble the production stack: HTTP beacon, JSON ledger, in-memory store.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        config
            .validate()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        let beacon = HttpRandomnessBeacon::new(&config.raffle)?;
        let seeds = ExternalSeedProvider::new(beacon, &config.raffle);
        let raffles = RaffleService::new(
            Arc::new(JsonFileEntrySource::new(&config.entries_file)),
            Arc::new(InMemoryRaffleRepository::new()),
            Arc::new(seeds),
        );

        Ok(Self::with_api(config, Arc::new(raffles)))
    }

    /// Serve an already assembled raffle API.
    pub fn with_api(config: GatewayConfig, raffles: Arc<dyn RaffleApi>) -> Self {
        Self { config, raffles }
    }

    /// HTTP router
    pub fn router(&self) -> Router {
        build_router(Arc::clone(&self.raffles))
    }

    /// Serve until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{}: {}", self.config.bind_addr, e)))?;

        info!(
            addr = %self.config.bind_addr,
            entries_file = %self.config.entries_file.display(),
            beacon = %self.config.raffle.beacon_url,
            "[raffle] Gateway listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| GatewayError::Serve(e.to_string()))?;

        info!("[raffle] Gateway stopped");
        Ok(())
    }
}

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    raffles: Arc<dyn RaffleApi>,
}

/// Build the HTTP router over `raffles`.
pub fn build_router(raffles: Arc<dyn RaffleApi>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/raffles", post(close_period))
        .route("/raffles/:id", get(get_raffle))
        .route("/raffles/:id/draw", post(draw_winner))
        .route("/raffles/:id/proof/:index", get(inclusion_proof))
        .route("/raffles/:id/report", get(transparency_report))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { raffles })
}

/// Body of `POST /raffles`
#[derive(Debug, Deserialize)]
pub struct CloseRequest {
    /// Period key, e.g. `2024-11`
    pub period: String,
}

fn parse_id(raw: &str) -> ApiResult<RaffleId> {
    Ok(raw.parse::<RaffleId>()?)
}

async fn close_period(
    State(state): State<AppState>,
    payload: Result<Json<CloseRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RaffleRecord>)> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let period = Period::new(request.period)?;

    let raffle = state.raffles.close_period(period).await?;
    Ok((StatusCode::CREATED, Json(RaffleRecord::from(&raffle))))
}

async fn draw_winner(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<RaffleRecord>> {
    let raffle = state.raffles.draw_winner(parse_id(&id)?).await?;
    Ok(Json(RaffleRecord::from(&raffle)))
}

async fn get_raffle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<RaffleRecord>> {
    let raffle = state.raffles.get_raffle(parse_id(&id)?).await?;
    Ok(Json(RaffleRecord::from(&raffle)))
}

async fn inclusion_proof(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, String)>,
) -> ApiResult<Json<EntryProof>> {
    let id = parse_id(&id)?;
    let index: u64 = index
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid entry index: {}", index)))?;

    Ok(Json(state.raffles.inclusion_proof(id, index).await?))
}

async fn transparency_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TransparencyReport>> {
    Ok(Json(state.raffles.transparency_report(parse_id(&id)?).await?))
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "raffle-gateway",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use raffle_draw::{FixedSeedProvider, MockEntrySource, Seed};
    use serde_json::Value;
    use tower::ServiceExt;

    const FIXTURE_ROOT: &str = "61f744c570bf1efdbf1c81e1f2284c505a7ec3b3ca678df8da9cef7924ebaab3";

    fn test_router() -> Router {
        let mut source =
            MockEntrySource::with_period("2024-11", &["e1", "e2", "e3", "e4", "e5"]);
        source.insert("2024-12", &[]);
        let seed = Seed::external("BITCOIN", &"0".repeat(64)).unwrap();
        let service = RaffleService::new(
            Arc::new(source),
            Arc::new(InMemoryRaffleRepository::new()),
            Arc::new(FixedSeedProvider::new(seed)),
        );
        build_router(Arc::new(service))
    }

    async fn send(
        router: &Router,
        method: &str,
        uri: &str,
        body: Option<&str>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn close(router: &Router, period: &str) -> (StatusCode, Value) {
        let body = format!(r#"{{"period":"{}"}}"#, period);
        send(router, "POST", "/raffles", Some(&body)).await
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&test_router(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_close_returns_201_with_commitment() {
        let router = test_router();
        let (status, body) = close(&router, "2024-11").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "CLOSED");
        assert_eq!(body["merkleRoot"], FIXTURE_ROOT);
        assert_eq!(body["entryCount"], 5);
        assert_eq!(body["period"], "2024-11");
    }

    #[tokio::test]
    async fn test_close_and_draw() {
        let router = test_router();
        let (_, closed) = close(&router, "2024-11").await;
        let id = closed["id"].as_str().unwrap().to_string();

        let uri = format!("/raffles/{}/draw", id);
        let (status, drawn) = send(&router, "POST", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(drawn["status"], "DRAWN");
        assert_eq!(drawn["winnerEntryId"], "e1");
        assert_eq!(drawn["winnerIndex"], 0);
        assert_eq!(drawn["seedSource"], "EXTERNAL");

        let (status, fetched) = send(&router, "GET", &format!("/raffles/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, drawn);
    }

    #[tokio::test]
    async fn test_second_draw_conflicts() {
        let router = test_router();
        let (_, closed) = close(&router, "2024-11").await;
        let uri = format!("/raffles/{}/draw", closed["id"].as_str().unwrap());

        send(&router, "POST", &uri, None).await;
        let (status, body) = send(&router, "POST", &uri, None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "invalid_state");
        assert!(body["error"]["message"].as_str().unwrap().contains("e1"));
    }

    #[tokio::test]
    async fn test_reclose_conflicts() {
        let router = test_router();
        close(&router, "2024-11").await;
        let (status, _) = close(&router, "2024-11").await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_empty_period_is_422() {
        let (status, body) = close(&test_router(), "2024-12").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "validation");
    }

    #[tokio::test]
    async fn test_bad_requests_are_400() {
        let router = test_router();
        let (status, _) = close(&router, "2024/11").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&router, "POST", "/raffles", Some("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "validation");

        let (status, _) = send(&router, "POST", "/raffles/not-a-uuid/draw", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_raffle_is_404() {
        let uri = format!("/raffles/{}", RaffleId::new());
        let (status, body) = send(&test_router(), "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn test_inclusion_proof_route() {
        let router = test_router();
        let (_, closed) = close(&router, "2024-11").await;
        let id = closed["id"].as_str().unwrap();

        let uri = format!("/raffles/{}/proof/2", id);
        let (status, proof) = send(&router, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(proof["entryId"], "e3");
        assert_eq!(proof["merkleRoot"], FIXTURE_ROOT);
        assert_eq!(proof["proof"]["leafIndex"], 2);

        let (status, _) = send(&router, "GET", &format!("/raffles/{}/proof/9", id), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&router, "GET", &format!("/raffles/{}/proof/x", id), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_report_route() {
        let router = test_router();
        let (_, closed) = close(&router, "2024-11").await;
        let id = closed["id"].as_str().unwrap();

        let (status, _) = send(&router, "GET", &format!("/raffles/{}/report", id), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        send(&router, "POST", &format!("/raffles/{}/draw", id), None).await;
        let uri = format!("/raffles/{}/report", id);
        let (status, report) = send(&router, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["verificationPassed"], true);
        assert_eq!(report["totalEntries"], 5);
        assert_eq!(report["winnerEntryId"], "e1");
    }
}
