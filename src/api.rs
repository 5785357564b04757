//! REST API for the container loader.
//!
//! Thin adapter over the engine: requests are validated, handed to the
//! orchestrator (directly or through a worker) and the results serialized.
//! Uses Axum as the web framework and supports CORS.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use std::sync::OnceLock;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::catalog::{self, CatalogEntry};
use crate::config::{ApiConfig, OptimizerConfig};
use crate::error::PackError;
use crate::model::{CartonType, ContainerSpec, Orientation, PackRequest, PalletType};
use crate::orchestrator::{
    NoFitRecord, PackEvent, PackingStats, PlacementRecord, Progress, RunSnapshot, RunState,
    StepOutcome, StepReport, pack,
};
use crate::search::PackingConfig;
use crate::types::Vec3;
use crate::worker::{self, WorkerMessage};

#[derive(Clone)]
struct ApiState {
    optimizer_config: OptimizerConfig,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Request body for the packing endpoints.
///
/// The container is given either inline or as a catalog code. Gap and
/// clearance override the server configuration for this run only.
#[derive(Deserialize, Clone, ToSchema)]
#[schema(
    example = json!({
        "container_code": "20GP",
        "requests": [
            {
                "carton": { "id": 1, "name": "Euro carton", "length": 600.0, "width": 400.0, "height": 300.0 },
                "quantity": 12
            }
        ],
        "box_gap": 2.0
    })
)]
pub struct PackPayload {
    #[serde(default)]
    pub container: Option<ContainerSpec>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub container_code: Option<String>,
    pub requests: Vec<PackRequest>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub wall_clearance: Option<f64>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub box_gap: Option<f64>,
}

#[derive(Debug)]
struct ValidatedPayload {
    container: ContainerSpec,
    requests: Vec<PackRequest>,
    config: PackingConfig,
}

#[derive(Debug)]
enum PayloadError {
    MissingContainer,
    AmbiguousContainer,
    UnknownContainerCode(String),
    InvalidOverride(&'static str, f64),
}

impl PackPayload {
    fn into_validated(self, defaults: PackingConfig) -> Result<ValidatedPayload, PayloadError> {
        let container = match (self.container, self.container_code) {
            (Some(_), Some(_)) => return Err(PayloadError::AmbiguousContainer),
            (Some(spec), None) => spec,
            (None, Some(code)) => match catalog::find(&code) {
                Some(entry) => entry.spec,
                None => return Err(PayloadError::UnknownContainerCode(code)),
            },
            (None, None) => return Err(PayloadError::MissingContainer),
        };

        let mut config = defaults;
        if let Some(clearance) = self.wall_clearance {
            if !clearance.is_finite() || clearance < 0.0 {
                return Err(PayloadError::InvalidOverride("wall_clearance", clearance));
            }
            config.wall_clearance = clearance;
        }
        if let Some(gap) = self.box_gap {
            if !gap.is_finite() || gap < 0.0 {
                return Err(PayloadError::InvalidOverride("box_gap", gap));
            }
            config.box_gap = gap;
        }

        Ok(ValidatedPayload {
            container,
            requests: self.requests,
            config,
        })
    }
}

/// Response of the blocking packing endpoint.
#[derive(Serialize, ToSchema)]
pub struct PackResponse {
    pub state: RunState,
    pub placements: Vec<PlacementRecord>,
    pub no_fit: Vec<NoFitRecord>,
    pub stats: PackingStats,
    pub is_complete: bool,
}

impl From<RunSnapshot> for PackResponse {
    fn from(snapshot: RunSnapshot) -> Self {
        let is_complete = snapshot.state == RunState::Completed && snapshot.no_fit.is_empty();
        Self {
            state: snapshot.state,
            placements: snapshot.placements,
            no_fit: snapshot.no_fit,
            stats: snapshot.stats,
            is_complete,
        }
    }
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
    /// Machine-readable code for engine errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
            code: None,
        }
    }

    fn from_pack_error(err: &PackError) -> Self {
        let error = match err {
            PackError::InvalidContainer(_) => "Invalid container configuration",
            PackError::InvalidRequest { .. } => "Invalid input data",
            PackError::NotIdle(_) => "Run could not be started",
        };
        Self {
            code: Some(err.code().to_string()),
            ..Self::new(error, err.to_string())
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn validation_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid input data",
        details,
    )
}

fn pack_error(err: PackError) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorResponse::from_pack_error(&err)),
    )
        .into_response()
}

fn parse_payload(
    payload: Result<Json<PackPayload>, JsonRejection>,
    defaults: PackingConfig,
) -> Result<ValidatedPayload, Response> {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(err) => return Err(json_deserialize_error(err)),
    };

    payload.into_validated(defaults).map_err(|err| match err {
        PayloadError::MissingContainer => {
            validation_error("Either container or container_code must be specified")
        }
        PayloadError::AmbiguousContainer => {
            validation_error("Specify either container or container_code, not both")
        }
        PayloadError::UnknownContainerCode(code) => {
            validation_error(format!("Unknown container code '{}'", code))
        }
        PayloadError::InvalidOverride(field, value) => validation_error(format!(
            "{} must be a finite value of 0 or greater, got {}",
            field, value
        )),
    })
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_pack, handle_pack_stream, handle_containers),
    components(
        schemas(
            PackPayload,
            PackResponse,
            ErrorResponse,
            ContainerSpec,
            CatalogEntry,
            CartonType,
            PalletType,
            PackRequest,
            Orientation,
            Vec3,
            RunState,
            Progress,
            PlacementRecord,
            NoFitRecord,
            PackingStats,
            StepOutcome,
            StepReport,
            PackEvent
        )
    ),
    tags((name = "packing", description = "Endpoints for container load planning"))
)]
struct ApiDoc;

/// Builds the router with all endpoints and CORS.
fn router(optimizer_config: OptimizerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let state = ApiState { optimizer_config };

    Router::new()
        .route("/pack", post(handle_pack))
        .route("/pack_stream", post(handle_pack_stream))
        .route("/containers", get(handle_containers))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .layer(cors)
        .with_state(state)
}

/// Starts the API server and blocks until it terminates.
pub async fn start_api_server(
    config: ApiConfig,
    optimizer_config: OptimizerConfig,
) -> std::io::Result<()> {
    let app = router(optimizer_config);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        host = config.display_host(),
        port = config.port(),
        "Server running"
    );
    if config.binds_to_all_interfaces() {
        tracing::info!("Local access: http://localhost:{}", config.port());
    }
    tracing::info!("Endpoints: POST /pack, POST /pack_stream, GET /containers, GET /docs/openapi.json");

    axum::serve(listener, app).await
}

/// Handler for POST /pack endpoint.
///
/// Runs the whole job to completion and returns the final snapshot.
#[utoipa::path(
    post,
    path = "/pack",
    request_body = PackPayload,
    responses(
        (status = 200, description = "Packing run finished", body = PackResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or container configuration",
            body = ErrorResponse
        )
    ),
    tag = "packing"
)]
async fn handle_pack(
    State(state): State<ApiState>,
    payload: Result<Json<PackPayload>, JsonRejection>,
) -> Response {
    let request = match parse_payload(payload, state.optimizer_config.packing_config()) {
        Ok(request) => request,
        Err(response) => return response,
    };

    tracing::info!(lines = request.requests.len(), "New pack request");
    let ValidatedPayload {
        container,
        requests,
        config,
    } = request;

    let result = tokio::task::spawn_blocking(move || pack(container, requests, config)).await;
    match result {
        Ok(Ok(snapshot)) => {
            tracing::info!(
                placed = snapshot.stats.total_placed,
                no_fit = snapshot.stats.no_fit_count,
                utilization = snapshot.stats.utilization_percent,
                "Pack request finished"
            );
            (StatusCode::OK, Json(PackResponse::from(snapshot))).into_response()
        }
        Ok(Err(err)) => pack_error(err),
        Err(err) => {
            tracing::error!(error = %err, "Packing task failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Packing task failed",
                err.to_string(),
            )
        }
    }
}

/// Handler for POST /pack_stream endpoint (SSE).
///
/// Streams `PackEvent`s as Server-Sent Events while the worker places one
/// carton per step. Closing the stream cancels the run.
#[utoipa::path(
    post,
    path = "/pack_stream",
    request_body = PackPayload,
    responses(
        (
            status = 200,
            description = "Streams pack events in real-time",
            content_type = "text/event-stream",
            body = PackEvent
        ),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or container configuration",
            body = ErrorResponse
        )
    ),
    tag = "packing"
)]
async fn handle_pack_stream(
    State(state): State<ApiState>,
    payload: Result<Json<PackPayload>, JsonRejection>,
) -> Response {
    let request = match parse_payload(payload, state.optimizer_config.packing_config()) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let mut handle = match worker::spawn(request.container, request.requests, request.config) {
        Ok(handle) => handle,
        Err(err) => return pack_error(err),
    };

    let (tx, rx) = mpsc::channel::<String>(32);

    tokio::spawn(async move {
        let started = PackEvent::Started {
            total_count: handle.total_count(),
            interior_volume: handle.interior_volume(),
        };
        if !send_event(&tx, &started).await {
            handle.cancel().await;
            return;
        }

        while let Some(message) = handle.step().await {
            match message {
                WorkerMessage::Step(report) => {
                    if !send_event(&tx, &PackEvent::Step { report }).await {
                        tracing::info!("Stream closed by client, cancelling run");
                        handle.cancel().await;
                        return;
                    }
                }
                WorkerMessage::Finished(snapshot) => {
                    let finished = PackEvent::Finished {
                        state: snapshot.state,
                        stats: snapshot.stats,
                    };
                    send_event(&tx, &finished).await;
                    return;
                }
            }
        }
    });

    let stream = ReceiverStream::new(rx)
        .map(|msg| Ok::<_, std::convert::Infallible>(Event::default().data(msg)));
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

/// Serializes and forwards one event. Returns `false` once the receiver is gone.
async fn send_event(tx: &mpsc::Sender<String>, event: &PackEvent) -> bool {
    match serde_json::to_string(event) {
        Ok(json) => tx.send(json).await.is_ok(),
        Err(err) => {
            tracing::warn!(error = %err, "Could not serialize pack event");
            true
        }
    }
}

/// Handler for GET /containers endpoint.
#[utoipa::path(
    get,
    path = "/containers",
    responses((status = 200, description = "Built-in container catalog", body = [CatalogEntry])),
    tag = "packing"
)]
async fn handle_containers() -> Json<Vec<CatalogEntry>> {
    Json(catalog::standard_containers())
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> PackPayload {
        serde_json::from_str(json).expect("Should parse valid JSON")
    }

    #[test]
    fn openapi_doc_lists_expected_paths() {
        let doc = openapi_doc();
        let paths = &doc.paths.paths;
        for path in ["/pack", "/pack_stream", "/containers"] {
            assert!(
                paths.contains_key(path),
                "OpenAPI documentation is missing the {} path",
                path
            );
        }
    }

    #[test]
    fn openapi_doc_contains_key_schemas() {
        let doc = openapi_doc();
        let components = doc
            .components
            .as_ref()
            .expect("OpenAPI documentation contains no components");
        let schemas = &components.schemas;
        for name in ["PackPayload", "PackResponse", "ErrorResponse", "PackEvent"] {
            assert!(
                schemas.contains_key(name),
                "Expected schema '{}' is missing from OpenAPI spec",
                name
            );
        }
    }

    #[test]
    fn payload_resolves_catalog_code() {
        let request = payload(
            r#"{
                "container_code": "40hc",
                "requests": [{"carton": {"id": 1, "name": "A", "length": 10.0, "width": 10.0, "height": 10.0}, "quantity": 2}]
            }"#,
        );
        let validated = request
            .into_validated(PackingConfig::default())
            .expect("Should validate successfully");
        assert_eq!(validated.container.internal_height, 2698.0);
        assert_eq!(validated.requests[0].quantity, 2);
    }

    #[test]
    fn payload_overrides_replace_configured_values() {
        let request = payload(
            r#"{
                "container": {
                    "external_length": 110.0, "external_width": 110.0, "external_height": 110.0,
                    "internal_length": 100.0, "internal_width": 100.0, "internal_height": 100.0,
                    "wall_thickness": 5.0
                },
                "requests": [],
                "box_gap": 0.0
            }"#,
        );
        let validated = request
            .into_validated(PackingConfig::default())
            .expect("Should validate successfully");
        assert_eq!(validated.config.box_gap, 0.0);
        assert_eq!(
            validated.config.wall_clearance,
            PackingConfig::DEFAULT_WALL_CLEARANCE
        );
    }

    #[test]
    fn payload_requires_exactly_one_container_source() {
        let missing = payload(r#"{"requests": []}"#);
        assert!(matches!(
            missing.into_validated(PackingConfig::default()),
            Err(PayloadError::MissingContainer)
        ));

        let unknown = payload(r#"{"container_code": "45XX", "requests": []}"#);
        assert!(matches!(
            unknown.into_validated(PackingConfig::default()),
            Err(PayloadError::UnknownContainerCode(_))
        ));
    }

    #[test]
    fn payload_rejects_negative_gap() {
        let request = payload(r#"{"container_code": "20GP", "requests": [], "box_gap": -1.0}"#);
        assert!(matches!(
            request.into_validated(PackingConfig::default()),
            Err(PayloadError::InvalidOverride("box_gap", _))
        ));
    }

    #[test]
    fn engine_errors_carry_machine_code() {
        let err = PackError::InvalidRequest {
            line: 2,
            reason: crate::model::ValidationError::InvalidQuantity("zero".into()),
        };
        let body = serde_json::to_value(ErrorResponse::from_pack_error(&err)).unwrap();
        assert_eq!(body["error"], "Invalid input data");
        assert_eq!(body["code"], "invalid_request");
        assert_eq!(body["details"], err.to_string());

        let plain = serde_json::to_value(ErrorResponse::new("Invalid JSON data", "eof")).unwrap();
        assert!(plain.get("code").is_none());
    }

    #[test]
    fn response_is_complete_only_without_no_fit() {
        let snapshot = pack(
            ContainerSpec::with_interior(100.0, 100.0, 100.0),
            vec![
                PackRequest::new(CartonType::new(1, "fits", 10.0, 10.0, 10.0).unwrap(), 1),
                PackRequest::new(CartonType::new(2, "huge", 200.0, 10.0, 10.0).unwrap(), 1),
            ],
            PackingConfig::default(),
        )
        .unwrap();
        let response = PackResponse::from(snapshot);
        assert_eq!(response.state, RunState::Completed);
        assert!(!response.is_complete);
        assert_eq!(response.no_fit.len(), 1);
    }
}
