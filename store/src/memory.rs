//! In-memory transaction store.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use purchases_common::{NewTransaction, Transaction, TransactionId};
use tracing::debug;

use crate::error::StoreResult;
use crate::store::{TransactionStore, TransactionStream};

/// Process-local store. Contents are lost on shutdown.
pub struct InMemoryTransactionStore {
    transactions: DashMap<TransactionId, Transaction>,
    next_id: AtomicI64,
}

impl InMemoryTransactionStore {
    /// Create an empty store. Ids start at 1.
    pub fn new() -> Self {
        Self {
            transactions: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Number of stored transactions.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

impl Default for InMemoryTransactionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    fn name(&self) -> &str {
        "IN_MEMORY"
    }

    async fn insert(&self, transaction: NewTransaction) -> StoreResult<Transaction> {
        let id = TransactionId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let transaction = transaction.into_transaction(id);

        self.transactions.insert(id, transaction.clone());
        debug!(transaction_id = %id, "Transaction stored");

        Ok(transaction)
    }

    async fn get(&self, id: TransactionId) -> StoreResult<Option<Transaction>> {
        Ok(self.transactions.get(&id).map(|t| t.clone()))
    }

    fn all(&self) -> TransactionStream<'_> {
        let mut snapshot: Vec<Transaction> =
            self.transactions.iter().map(|t| t.value().clone()).collect();
        snapshot.sort_by_key(|t| t.id);

        stream::iter(snapshot.into_iter().map(Ok)).boxed()
    }
}
