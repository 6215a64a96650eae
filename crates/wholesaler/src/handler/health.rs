use crate::{domain::response::ApiResponse, service::WholesalerErrorRecovery, state::AppState};
use axum::{
    Json,
    extract::Extension,
    response::IntoResponse,
    routing::get,
};
use serde::Serialize;
use shared::resilience::CircuitBreakerStatus;
use std::sync::Arc;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationHealth {
    pub circuit_breaker: CircuitBreakerStatus,
}

#[utoipa::path(
    get,
    path = "/api/wholesalers/health",
    tag = "Wholesaler",
    responses(
        (status = 200, description = "Notification circuit breaker snapshot", body = ApiResponse<NotificationHealth>)
    )
)]
pub async fn notification_health(
    Extension(recovery): Extension<Arc<WholesalerErrorRecovery>>,
) -> impl IntoResponse {
    let circuit_breaker = recovery.circuit_breaker().status().await;

    Json(ApiResponse::ok(NotificationHealth { circuit_breaker }))
}

pub fn health_routes(app_state: Arc<AppState>) -> OpenApiRouter {
    OpenApiRouter::new()
        .route("/api/wholesalers/health", get(notification_health))
        .layer(Extension(app_state.di_container.recovery.clone()))
}
