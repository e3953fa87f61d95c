//! Purchases Service
//!
//! Records purchase transactions and reports them converted into other
//! currencies using historical Treasury exchange rates. Every request passes
//! a shared rate limiter before reaching the transaction service.

pub mod api;
pub mod config;
pub mod rate_limiter;
pub mod transaction_service;

pub use api::{router, AppState};
pub use config::ServiceConfig;
pub use rate_limiter::{RateLimiterConfig, RateLimiterGate};
pub use transaction_service::{TransactionService, TransactionServiceConfig};
