//! Request and response bodies.

use chrono::NaiveDate;
use purchases_common::{ConvertedTransaction, NewTransaction, PurchasesError, Transaction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Body of `POST /transactions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub description: String,
    pub amount: Decimal,
    /// Defaults to the creation date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_date: Option<NaiveDate>,
}

impl CreateTransactionRequest {
    /// Validate into core input, dating it `today` when no date was sent.
    pub fn into_new_transaction(self, today: NaiveDate) -> Result<NewTransaction, PurchasesError> {
        NewTransaction::new(
            self.description,
            self.amount,
            self.record_date.unwrap_or(today),
        )
    }
}

/// Query string of the conversion route.
#[derive(Debug, Clone, Deserialize)]
pub struct ConvertQuery {
    pub currency: String,
}

/// Stored transaction. Decimals are JSON strings so their scale survives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: i64,
    pub description: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub record_date: NaiveDate,
}

impl From<Transaction> for TransactionResponse {
    fn from(transaction: Transaction) -> Self {
        Self {
            id: transaction.id.value(),
            description: transaction.description,
            amount: transaction.amount,
            record_date: transaction.record_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedTransactionResponse {
    pub id: i64,
    pub description: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub record_date: NaiveDate,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub exchange_rate: Decimal,
    pub rate_effective_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::str")]
    pub converted_amount: Decimal,
}

impl From<ConvertedTransaction> for ConvertedTransactionResponse {
    fn from(converted: ConvertedTransaction) -> Self {
        Self {
            id: converted.id.value(),
            description: converted.description,
            amount: converted.amount,
            record_date: converted.record_date,
            currency: converted.currency.code().to_string(),
            exchange_rate: converted.exchange_rate,
            rate_effective_date: converted.rate_effective_date,
            converted_amount: converted.converted_amount,
        }
    }
}
