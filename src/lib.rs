use axum::{Router, extract::FromRef, http::HeaderName};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod policy;
pub mod repository;
pub mod telemetry;
pub mod validation;

pub mod routes;
use routes::{public, users};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{
    InMemoryUserRepository, PostgresUserRepository, RepositoryState, UserRepository,
};

/// ApiDoc
///
/// OpenAPI document for the users API, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::fetch_all_users, handlers::get_user_by_id,
        handlers::update_user, handlers::delete_user
    ),
    components(
        schemas(
            models::User, models::Role, models::UpdateUserRequest,
            models::UsersListResponse, models::UserResponse, models::MessageResponse,
            validation::FieldError, error::ValidationErrorBody, error::ErrorBody,
        )
    ),
    tags(
        (name = "users", description = "User accounts API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared state handed to every handler: the user repository and the
/// immutable configuration.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Let the auth extractor pull its dependencies out of AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing table, applies the observability and CORS layers and
/// attaches the shared state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(users::user_routes(state.clone()))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                // Request id first, so the trace span below can record it.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request span, tagged with the service name and the `x-request-id`
/// set by `SetRequestIdLayer` so every event of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        service = telemetry::SERVICE_NAME,
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
