//! HTTP boundary.
//!
//! JSON routes over the transaction service, guarded by the rate limiter.

pub mod dto;
pub mod error;
pub mod handlers;

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub use dto::{
    ConvertQuery, ConvertedTransactionResponse, CreateTransactionRequest, TransactionResponse,
};
pub use error::{ApiError, ApiErrorResponse};
pub use handlers::{
    convert_transaction, create_transaction, get_transaction, list_transactions, AppState,
};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route("/transactions/:id", get(get_transaction))
        .route("/transactions/:id/convert", get(convert_transaction))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
