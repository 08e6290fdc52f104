use axum::{
    Router,
    extract::{FromRef, Request, State},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
    routing::get,
};
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
pub mod password;
pub mod random;
pub mod repository;
pub mod share;
pub mod token;

// Routing segregated by access level (public, authenticated).
pub mod routes;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::ApiError;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use token::TokenService;

/// ApiDoc
///
/// OpenAPI document for every handler annotated with `#[utoipa::path]`.
/// Served at `/api-docs/openapi.json`, browsable at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::signup, handlers::signin, handlers::add_content, handlers::list_content,
        handlers::delete_content, handlers::share_brain, handlers::get_shared_brain
    ),
    components(
        schemas(
            models::SignupRequest, models::SigninRequest, models::SigninResponse,
            models::CreateContentRequest, models::DeleteContentRequest, models::ShareRequest,
            models::ShareResponse, models::ContentItem, models::ContentOwner,
            models::ContentListResponse, models::SharedBrainResponse, models::MessageResponse,
        )
    ),
    tags(
        (name = "second-brain", description = "Bookmark storage and public sharing API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Everything a handler may need, built once in `main` and cloned per request.
/// The store is injected here; there is no global handle.
#[derive(Clone)]
pub struct AppState {
    /// Persistence layer (Postgres or in-memory).
    pub repo: RepositoryState,
    /// Issues and verifies identity tokens.
    pub tokens: TokenService,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Assembles the state, deriving the token service from the configuration.
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.token_ttl_hours);
        Self {
            repo,
            tokens,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(app_state: &AppState) -> TokenService {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Guards the authenticated router. Verifies the `authorization` header and attaches
/// the resulting `AuthUser` to the request extensions, or short-circuits with the
/// gate's 401/403 response.
async fn auth_middleware(
    State(tokens): State<TokenService>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = auth::authenticate(request.headers(), &tokens)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// create_router
///
/// Builds the full application: API routes under `/api/v1`, docs, health check,
/// and the tracing / request-id / CORS layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let api = public::public_routes().merge(
        authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        )),
    );

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Monitoring / load balancer probe.
        .route("/health", get(|| async { "ok" }))
        .nest("/api/v1", api)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
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
/// Span for one request, tagged with the `x-request-id` so every log line of the
/// request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
