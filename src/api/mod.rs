//! HTTP surface: system endpoints, OpenAPI document, and router composition.

pub mod system;

use axum::Router;
use axum::middleware;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::domain::ChatMessage;
use crate::error::{ErrorBody, ErrorResponse};
use crate::ws;

/// OpenAPI description of the HTTP endpoints.
///
/// The chat socket itself is not described here; its only payload is
/// [`ChatMessage`], which is listed as a schema.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "chat-hub", description = "WebSocket broadcast hub"),
    paths(system::health_handler),
    components(schemas(system::HealthResponse, ErrorResponse, ErrorBody, ChatMessage)),
    tags((name = "System", description = "Service health"))
)]
pub struct ApiDoc;

/// Builds the complete application router.
///
/// - `GET /health`
/// - `GET /ws/chat?name=` (websocket upgrade only; any non-upgrade request
///   under `/ws`, routed or not, gets 426)
/// - `GET /swagger-ui` (with the `swagger-ui` feature)
pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .merge(system::routes())
        .nest(ws::handler::WS_PREFIX, ws::handler::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(ws::handler::require_upgrade)),
        )
        .with_state(state)
}
