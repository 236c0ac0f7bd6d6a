//! HTTP front of the mocker: configuration endpoints and stub dispatch.

use crate::config::{import_entries, ExportDocument, GlobalSettings, MockerConfig, RoutePayload};
use crate::error::ConfigError;
use crate::registry::Registry;
use crate::response::{ResponseDefinition, RouteId, WELCOME_BODY};
use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use percent_encoding::percent_decode_str;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub settings: Arc<GlobalSettings>,
    pub stats: Arc<DispatchStats>,
    /// Served when no registered response matches
    pub fallback: Arc<ResponseDefinition>,
}

/// Counters for dispatched stub requests.
#[derive(Debug, Default)]
pub struct DispatchStats {
    requests_total: AtomicU64,
    requests_matched: AtomicU64,
    requests_unmatched: AtomicU64,
}

impl DispatchStats {
    pub fn total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn matched(&self) -> u64 {
        self.requests_matched.load(Ordering::Relaxed)
    }

    pub fn unmatched(&self) -> u64 {
        self.requests_unmatched.load(Ordering::Relaxed)
    }
}

/// Mocker HTTP server.
pub struct MockServer {
    state: AppState,
}

impl MockServer {
    /// Build the registry (welcome route plus configured routes) and the server state.
    pub fn new(config: MockerConfig) -> Result<Self, ConfigError> {
        let registry = Registry::with_default_route()?;
        for route in &config.routes {
            registry.register(route.to_group()?);
        }

        info!(
            routes = registry.len(),
            max_body_bytes = config.settings.max_body_bytes,
            "Mocker initialized"
        );

        Ok(Self {
            state: AppState {
                registry: Arc::new(registry),
                settings: Arc::new(config.settings),
                stats: Arc::new(DispatchStats::default()),
                fallback: Arc::new(ResponseDefinition::new("/", "GET").with_body(WELCOME_BODY)),
            },
        })
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.state.registry
    }

    pub fn stats(&self) -> &DispatchStats {
        &self.state.stats
    }

    /// Axum router serving the configuration endpoints and every stubbed route.
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Serve on `listener` until Ctrl+C.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        info!(address = %addr, "Mocker listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        let stats = self.stats();
        info!(
            requests = stats.total(),
            matched = stats.matched(),
            unmatched = stats.unmatched(),
            "Mocker stopped"
        );
        Ok(())
    }
}

/// Configuration endpoints only claim their own method; any other method on
/// those paths is dispatched like a stubbed route.
fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/create", post(create_route).fallback(dispatch))
        .route("/import", post(import_routes).fallback(dispatch))
        .route("/export", get(export_routes).head(dispatch).fallback(dispatch))
        .fallback(dispatch)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Body of every configuration reply.
#[derive(Debug, Serialize)]
struct Reply {
    msg: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

fn ok_reply() -> Response {
    Json(Reply {
        msg: "ok",
        detail: None,
    })
    .into_response()
}

fn error_reply(error: ConfigError) -> Response {
    warn!(error = %error, "Configuration rejected");
    (
        StatusCode::BAD_REQUEST,
        Json(Reply {
            msg: error.message(),
            detail: Some(error.to_string()),
        }),
    )
        .into_response()
}

/// Validate one route payload and register it, replacing any previous group.
fn register_payload(registry: &Registry, value: &Value) -> Result<RouteId, ConfigError> {
    let payload = RoutePayload::from_json(value)?;
    let group = payload.to_group()?;
    let id = group.id().clone();
    let mode = group.mode();
    let responses = group.responses().len();

    let replaced = registry.register(group);
    info!(
        route = %id,
        mode = ?mode,
        responses,
        replaced = replaced.is_some(),
        "Route registered"
    );
    Ok(id)
}

async fn create_route(State(state): State<AppState>, body: Bytes) -> Response {
    let result = serde_json::from_slice::<Value>(&body)
        .map_err(|e| ConfigError::InvalidRequest(e.to_string()))
        .and_then(|value| register_payload(&state.registry, &value));

    match result {
        Ok(_) => ok_reply(),
        Err(e) => error_reply(e),
    }
}

/// Register every entry of an import document in order.
///
/// The first failing entry stops the import; entries before it stay registered.
async fn import_routes(State(state): State<AppState>, body: Bytes) -> Response {
    let document = match serde_json::from_slice::<Value>(&body) {
        Ok(document) => document,
        Err(e) => return error_reply(ConfigError::ImportFailed(e.to_string())),
    };
    let entries = match import_entries(&document) {
        Ok(entries) => entries,
        Err(e) => return error_reply(e),
    };

    for (index, entry) in entries.iter().enumerate() {
        if let Err(e) = register_payload(&state.registry, entry) {
            warn!(index, "Import aborted, earlier entries stay registered");
            return error_reply(e);
        }
    }

    info!(imported = entries.len(), "Import finished");
    ok_reply()
}

async fn export_routes(State(state): State<AppState>) -> Json<ExportDocument> {
    let data = state
        .registry
        .snapshot()
        .iter()
        .map(|group| RoutePayload::from_group(group))
        .collect::<Vec<_>>();

    debug!(routes = data.len(), "Exporting routes");
    Json(ExportDocument::new(data))
}

/// Serve the registered response for the request's route, or the default one.
async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    state.stats.requests_total.fetch_add(1, Ordering::Relaxed);

    let id = request_route_id(&request);
    let body = match axum::body::to_bytes(request.into_body(), state.settings.max_body_bytes).await {
        Ok(body) => body,
        Err(e) => {
            warn!(route = %id, error = %e, "Request body rejected");
            return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response();
        }
    };

    match state.registry.dispatch(id.as_str(), &body) {
        Some(response) => {
            state.stats.requests_matched.fetch_add(1, Ordering::Relaxed);
            if state.settings.log_matches {
                info!(route = %id, status = response.status(), "Request matched");
            }
            render(&response, &state.settings)
        }
        None => {
            state.stats.requests_unmatched.fetch_add(1, Ordering::Relaxed);
            if state.settings.log_unmatched {
                warn!(route = %id, "No matching response, serving default");
            }
            render(&state.fallback, &state.settings)
        }
    }
}

/// Route identity of an inbound request, built from the percent-decoded path.
fn request_route_id(request: &Request) -> RouteId {
    let path = percent_decode_str(request.uri().path()).decode_utf8_lossy();
    RouteId::new(&path, request.method().as_str())
}

/// Turn a response definition into an HTTP response.
///
/// A `Content-Type` header wins over `content_type`; with neither, the
/// configured default applies.
fn render(definition: &ResponseDefinition, settings: &GlobalSettings) -> Response {
    let status = StatusCode::from_u16(definition.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let content_type = definition
        .header("content-type")
        .or(definition.content_type())
        .unwrap_or(settings.default_content_type.as_str());

    let mut builder = axum::http::Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type);

    for (name, value) in definition.headers() {
        if !name.eq_ignore_ascii_case("content-type") {
            builder = builder.header(name.as_str(), value.as_str());
        }
    }

    match builder.body(Body::from(definition.body().to_string())) {
        Ok(response) => response,
        Err(e) => {
            warn!(route = %definition.route_id(), error = %e, "Stored response is not valid HTTP");
            (StatusCode::INTERNAL_SERVER_ERROR, "invalid stub response").into_response()
        }
    }
}
