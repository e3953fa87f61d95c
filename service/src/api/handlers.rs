//! HTTP handlers for the transaction routes.
//!
//! Every handler passes through the shared rate limiter before touching the
//! service.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use futures::TryStreamExt;
use purchases_common::{today, Currency, TransactionId};
use tracing::info;

use super::dto::{
    ConvertQuery, ConvertedTransactionResponse, CreateTransactionRequest, TransactionResponse,
};
use super::error::ApiErrorResponse;
use crate::rate_limiter::RateLimiterGate;
use crate::transaction_service::TransactionService;

/// Shared router state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TransactionService>,
    pub gate: Arc<RateLimiterGate>,
}

impl AppState {
    /// Create router state.
    pub fn new(service: Arc<TransactionService>, gate: Arc<RateLimiterGate>) -> Self {
        Self { service, gate }
    }
}

/// `POST /transactions`
pub async fn create_transaction(
    State(state): State<AppState>,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiErrorResponse> {
    info!("Received request to create transaction");

    let Json(request) = payload?;
    let input = request.into_new_transaction(today())?;
    let created = state.gate.run(state.service.create(input)).await??;

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// `GET /transactions`
pub async fn list_transactions(
    State(state): State<AppState>,
) -> Result<Json<Vec<TransactionResponse>>, ApiErrorResponse> {
    info!("Received request to list transactions");

    state.gate.acquire().await?;
    let transactions: Vec<TransactionResponse> = state
        .service
        .get_all()
        .map_ok(TransactionResponse::from)
        .try_collect()
        .await?;

    Ok(Json(transactions))
}

/// `GET /transactions/:id`
pub async fn get_transaction(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<TransactionResponse>, ApiErrorResponse> {
    let Path(id) = id?;
    let id = TransactionId::new(id);
    info!(id = %id, "Received request to get transaction");

    state
        .gate
        .run(state.service.get_by_id(id))
        .await??
        .map(|transaction| Json(transaction.into()))
        .ok_or_else(|| ApiErrorResponse::not_found(format!("Transaction {} not found", id)))
}

/// `GET /transactions/:id/convert?currency=...`
pub async fn convert_transaction(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    query: Result<Query<ConvertQuery>, QueryRejection>,
) -> Result<Json<ConvertedTransactionResponse>, ApiErrorResponse> {
    let Path(id) = id?;
    let Query(query) = query?;
    let id = TransactionId::new(id);
    let currency = Currency::parse(&query.currency)?;
    info!(id = %id, currency = %currency, "Received request to convert transaction");

    state
        .gate
        .run(state.service.get_with_conversion(id, &currency))
        .await??
        .map(|converted| Json(converted.into()))
        .ok_or_else(|| ApiErrorResponse::not_found(format!("Transaction {} not found", id)))
}
