//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; system endpoints live
//! at the root. The OpenAPI document is served at `/api-docs/openapi.json`
//! and, with the `swagger-ui` feature, browsable at `/swagger-ui`.

pub mod dto;
pub mod handlers;

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI description of the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "release-monitor-gateway",
        description = "Incremental state synchronization for a release monitoring dashboard"
    ),
    paths(
        handlers::system::health_handler,
        handlers::system::stats_handler,
        handlers::monitor::get_monitor,
        handlers::monitor::list_services,
        handlers::monitor::get_service,
        handlers::events::ingest_event,
        handlers::actions::request_action,
    ),
    components(schemas(
        dto::ServiceDto,
        dto::StatusDto,
        dto::FlagsDto,
        dto::FreshnessDto,
        dto::MonitorSnapshotResponse,
        dto::ServiceListResponse,
        dto::PaginationMeta,
        dto::IngestResponse,
        dto::IgnoredDto,
        dto::ActionRequest,
        dto::ActionResponse,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
    )),
    tags(
        (name = "System", description = "Health and counters"),
        (name = "Monitor", description = "Read the synchronized model"),
        (name = "Events", description = "Feed upstream events"),
        (name = "Actions", description = "Approval decisions"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }));

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/swagger.json", ApiDoc::openapi()),
    );

    router
}
