//! Purchases Store
//!
//! Persistence for purchase transactions: the store contract, an in-memory
//! implementation and a PostgreSQL implementation.

pub mod error;
pub mod store;
pub mod memory;
pub mod postgres;

pub use error::{StoreError, StoreResult};
pub use store::{TransactionStore, TransactionStream};
pub use memory::InMemoryTransactionStore;
pub use postgres::PgTransactionStore;
