//! Purchase transaction operations.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt};
use purchases_common::{
    constants, ConvertedTransaction, Currency, NewTransaction, PurchasesError, Result,
    Transaction, TransactionId,
};
use purchases_fx::{CurrencyConverter, ExchangeRateProvider};
use purchases_store::{StoreResult, TransactionStore};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Configuration for the transaction service.
#[derive(Debug, Clone)]
pub struct TransactionServiceConfig {
    /// Months searched back from the purchase date for a rate.
    pub lookback_months: u32,
    /// Maximum time to wait on any store call.
    pub store_timeout: Duration,
}

impl Default for TransactionServiceConfig {
    fn default() -> Self {
        Self {
            lookback_months: constants::DEFAULT_LOOKBACK_MONTHS,
            store_timeout: constants::store_timeout(),
        }
    }
}

/// Creates, reads and converts purchase transactions.
pub struct TransactionService {
    store: Arc<dyn TransactionStore>,
    rates: Arc<ExchangeRateProvider>,
    converter: CurrencyConverter,
    config: TransactionServiceConfig,
}

impl TransactionService {
    /// Create a new service.
    pub fn new(
        store: Arc<dyn TransactionStore>,
        rates: Arc<ExchangeRateProvider>,
        config: TransactionServiceConfig,
    ) -> Self {
        Self {
            store,
            rates,
            converter: CurrencyConverter::default(),
            config,
        }
    }

    /// Persist a validated transaction and return it with its assigned id.
    #[instrument(skip(self, transaction), fields(record_date = %transaction.record_date()))]
    pub async fn create(&self, transaction: NewTransaction) -> Result<Transaction> {
        let created = self
            .store_call("insert", self.store.insert(transaction))
            .await?;

        info!(id = %created.id, "Transaction created");
        Ok(created)
    }

    /// Look up a transaction. `Ok(None)` when the id does not exist.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_by_id(&self, id: TransactionId) -> Result<Option<Transaction>> {
        self.store_call("get", self.store.get(id)).await
    }

    /// Stream every stored transaction in ascending id order.
    ///
    /// The stream ends after the first error. Each item is subject to the
    /// store timeout on its own.
    pub fn get_all(&self) -> BoxStream<'_, Result<Transaction>> {
        let timeout = self.config.store_timeout;

        stream::unfold(Some(self.store.all()), move |state| async move {
            let mut inner = state?;
            match tokio::time::timeout(timeout, inner.next()).await {
                Ok(Some(Ok(transaction))) => Some((Ok(transaction), Some(inner))),
                Ok(Some(Err(e))) => {
                    warn!(operation = "all", error = %e, "Store call failed");
                    Some((Err(PurchasesError::from(e)), None))
                }
                Ok(None) => None,
                Err(_) => {
                    warn!(operation = "all", "Store call timed out");
                    Some((Err(timed_out("all", timeout)), None))
                }
            }
        })
        .boxed()
    }

    /// Look up a transaction and convert its amount into `currency` using
    /// the latest rate within the lookback window of its record date.
    ///
    /// `Ok(None)` when the id does not exist. A transaction with no rate in
    /// the window yields `ConversionUnavailable`.
    #[instrument(skip(self), fields(id = %id, currency = %currency))]
    pub async fn get_with_conversion(
        &self,
        id: TransactionId,
        currency: &Currency,
    ) -> Result<Option<ConvertedTransaction>> {
        let Some(transaction) = self.store_call("get", self.store.get(id)).await? else {
            debug!("Transaction not found");
            return Ok(None);
        };

        let rate = self
            .rates
            .find_rate(currency, transaction.record_date, self.config.lookback_months)
            .await?;

        let converted_amount = self.converter.convert(transaction.amount, rate.rate)?;
        let converted = ConvertedTransaction::new(transaction, &rate, converted_amount);

        info!(
            rate = %converted.exchange_rate,
            rate_effective_date = %converted.rate_effective_date,
            converted_amount = %converted.converted_amount,
            "Transaction converted"
        );
        Ok(Some(converted))
    }

    /// Get the configuration.
    pub fn config(&self) -> &TransactionServiceConfig {
        &self.config
    }

    /// Periodically drop expired rate cache entries until aborted.
    pub fn spawn_cache_cleanup(&self, interval: Duration) -> JoinHandle<()> {
        let rates = self.rates.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                rates.cleanup();
            }
        })
    }

    /// Await a store call under the store timeout.
    async fn store_call<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        match tokio::time::timeout(self.config.store_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(operation, store = self.store.name(), error = %e, "Store call failed");
                Err(e.into())
            }
            Err(_) => {
                warn!(operation, store = self.store.name(), "Store call timed out");
                Err(timed_out(operation, self.config.store_timeout))
            }
        }
    }
}

fn timed_out(operation: &str, timeout: Duration) -> PurchasesError {
    PurchasesError::Persistence(format!(
        "{} timed out after {}ms",
        operation,
        timeout.as_millis()
    ))
}
