use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use shared::{CreatePayment, Patch, Payment, UpdatePayment};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::error::AppError;
use crate::metrics::{track_requests, Metrics};
use crate::store::{PaymentStore, PaymentUpdate};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PaymentStore>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(store: impl PaymentStore + 'static, metrics: Metrics) -> Self {
        Self {
            store: Arc::new(store),
            metrics,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/payments", get(list_payments).post(create_payment))
        .route("/api/payments/", get(list_payments).post(create_payment))
        .route("/api/payments/:id", get(get_payment).put(update_payment))
        .route("/api/payments/order/:order_id", get(list_payments_by_order))
        .route("/api/payments/user/:user_id", get(list_payments_by_user))
        .route_layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            track_requests,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// `null` and an empty `transaction_id` both mean "leave unchanged", the same
/// as omitting the field.
impl From<UpdatePayment> for PaymentUpdate {
    fn from(request: UpdatePayment) -> Self {
        let transaction_id = match request.transaction_id {
            Patch::Value(id) if id.is_empty() => None,
            other => other.value(),
        };
        Self {
            status: request.status.value(),
            transaction_id,
        }
    }
}

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Payment Service is running" }))
}

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = state
        .metrics
        .render()
        .map_err(|e| AppError::Internal(format!("Failed to encode metrics: {}", e)))?;
    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}

pub async fn list_payments(State(state): State<AppState>) -> Result<Json<Vec<Payment>>, AppError> {
    Ok(Json(state.store.list().await?))
}

pub async fn get_payment(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Payment>, AppError> {
    let Path(id) = id?;
    state
        .store
        .get(id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound(id))
}

pub async fn create_payment(
    State(state): State<AppState>,
    payload: Result<Json<CreatePayment>, JsonRejection>,
) -> Result<(StatusCode, Json<Payment>), AppError> {
    let Json(request) = payload?;
    let payment = state.store.create(request).await?;
    state.metrics.payments_created.inc();

    info!(
        "Created payment {} for order {} (transaction {})",
        payment.id, payment.order_id, payment.transaction_id
    );
    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn update_payment(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdatePayment>, JsonRejection>,
) -> Result<Json<Payment>, AppError> {
    let Path(id) = id?;
    let Json(request) = payload?;
    let update = PaymentUpdate::from(request);

    let payment = state
        .store
        .update(id, update)
        .await?
        .ok_or(AppError::NotFound(id))?;

    info!(
        "Updated payment {}: status {} (transaction {})",
        payment.id, payment.status, payment.transaction_id
    );
    Ok(Json(payment))
}

pub async fn list_payments_by_order(
    State(state): State<AppState>,
    order_id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Vec<Payment>>, AppError> {
    let Path(order_id) = order_id?;
    Ok(Json(state.store.list_by_order(order_id).await?))
}

pub async fn list_payments_by_user(
    State(state): State<AppState>,
    user_id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Vec<Payment>>, AppError> {
    let Path(user_id) = user_id?;
    Ok(Json(state.store.list_by_user(user_id).await?))
}
