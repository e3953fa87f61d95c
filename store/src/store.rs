//! Transaction store contract.

use async_trait::async_trait;
use futures::stream::BoxStream;
use purchases_common::{NewTransaction, Transaction, TransactionId};

use crate::error::StoreResult;

/// Lazy stream of stored transactions.
pub type TransactionStream<'a> = BoxStream<'a, StoreResult<Transaction>>;

/// Persistence for purchase transactions.
///
/// Transactions are append-only: there is no update or delete.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Get the store name.
    fn name(&self) -> &str;

    /// Persist a new transaction and return it with its assigned id.
    async fn insert(&self, transaction: NewTransaction) -> StoreResult<Transaction>;

    /// Get a transaction by id.
    async fn get(&self, id: TransactionId) -> StoreResult<Option<Transaction>>;

    /// Stream all transactions in ascending id order.
    ///
    /// Every call starts a fresh read of the current contents.
    fn all(&self) -> TransactionStream<'_>;
}
