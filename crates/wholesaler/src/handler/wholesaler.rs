use crate::{
    abstract_trait::DynWholesalerNotificationService,
    domain::response::{
        ApiResponse, OrderNotificationOutcome, OrderWholesalerStatus, PendingOrdersResponse,
        SweepSummary,
    },
    state::AppState,
};
use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use serde_json::json;
use shared::errors::{ErrorResponse, HttpError};
use std::sync::Arc;
use tracing::{error, info};
use utoipa_axum::router::OpenApiRouter;

const ENDPOINTS: [&str; 6] = [
    "GET /api/wholesalers/test",
    "POST /api/wholesalers/process-notifications",
    "POST /api/wholesalers/notify/{order_id}",
    "GET /api/wholesalers/pending",
    "GET /api/wholesalers/status/{order_id}",
    "GET /api/wholesalers/health",
];

fn parse_order_id(raw: &str) -> Result<i32, HttpError> {
    raw.trim()
        .parse()
        .map_err(|_| HttpError::BadRequest(format!("Invalid order id: {raw}")))
}

#[utoipa::path(
    get,
    path = "/api/wholesalers/test",
    tag = "Wholesaler",
    responses(
        (status = 200, description = "Wholesaler routes are reachable")
    )
)]
pub async fn test_routes() -> impl IntoResponse {
    Json(json!({
        "success": true,
        "message": "Wholesaler routes are working",
        "timestamp": Utc::now().to_rfc3339(),
        "endpoints": ENDPOINTS,
    }))
}

#[utoipa::path(
    post,
    path = "/api/wholesalers/process-notifications",
    tag = "Wholesaler",
    responses(
        (status = 200, description = "Sweep finished", body = ApiResponse<SweepSummary>),
        (status = 500, description = "Orders could not be queried", body = ErrorResponse)
    )
)]
pub async fn process_notifications(
    Extension(service): Extension<DynWholesalerNotificationService>,
) -> Result<impl IntoResponse, HttpError> {
    let summary = service.process_pending_notifications().await.map_err(|e| {
        error!("❌ Wholesaler notification sweep failed: {e}");
        HttpError::Internal(e.to_string())
    })?;

    let message = format!(
        "Processed {} orders: {} notifications sent, {} failed",
        summary.processed, summary.success_count, summary.error_count
    );
    info!("📨 {message}");

    Ok((StatusCode::OK, Json(ApiResponse::with_message(message, summary))))
}

#[utoipa::path(
    post,
    path = "/api/wholesalers/notify/{order_id}",
    tag = "Wholesaler",
    params(("order_id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Notifications processed for the order", body = ApiResponse<OrderNotificationOutcome>),
        (status = 400, description = "Order missing, not eligible or busy", body = ErrorResponse)
    )
)]
pub async fn notify_order(
    Extension(service): Extension<DynWholesalerNotificationService>,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let order_id = parse_order_id(&order_id)?;
    let outcome = service
        .process_order_notifications(order_id)
        .await
        .map_err(|e| HttpError::BadRequest(e.to_string()))?;

    let message = outcome.message.clone().unwrap_or_else(|| {
        format!(
            "Wholesaler notifications processed for order {}",
            outcome.order_number
        )
    });

    Ok((StatusCode::OK, Json(ApiResponse::with_message(message, outcome))))
}

#[utoipa::path(
    get,
    path = "/api/wholesalers/pending",
    tag = "Wholesaler",
    responses(
        (status = 200, description = "Orders with outstanding notifications", body = ApiResponse<PendingOrdersResponse>),
        (status = 500, description = "Orders could not be queried", body = ErrorResponse)
    )
)]
pub async fn pending_notifications(
    Extension(service): Extension<DynWholesalerNotificationService>,
) -> Result<impl IntoResponse, HttpError> {
    let pending = service
        .find_pending()
        .await
        .map_err(|e| HttpError::Internal(e.to_string()))?;

    Ok((StatusCode::OK, Json(ApiResponse::ok(pending))))
}

#[utoipa::path(
    get,
    path = "/api/wholesalers/status/{order_id}",
    tag = "Wholesaler",
    params(("order_id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Per-wholesaler notification status", body = ApiResponse<OrderWholesalerStatus>),
        (status = 400, description = "Order id is not a number", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse)
    )
)]
pub async fn order_status(
    Extension(service): Extension<DynWholesalerNotificationService>,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let order_id = parse_order_id(&order_id)?;
    let status = service.find_order_status(order_id).await?;

    Ok((StatusCode::OK, Json(ApiResponse::ok(status))))
}

pub fn wholesaler_routes(app_state: Arc<AppState>) -> OpenApiRouter {
    OpenApiRouter::new()
        .route("/api/wholesalers/test", get(test_routes))
        .route(
            "/api/wholesalers/process-notifications",
            post(process_notifications),
        )
        .route("/api/wholesalers/notify/{order_id}", post(notify_order))
        .route("/api/wholesalers/pending", get(pending_notifications))
        .route("/api/wholesalers/status/{order_id}", get(order_status))
        .layer(Extension(app_state.di_container.notification_service.clone()))
}
