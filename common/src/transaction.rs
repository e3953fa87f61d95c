//! Purchase transaction records and their converted projection.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Currency, ExchangeRate, PurchasesError, TransactionId};

/// Maximum description length, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 50;

/// Validated input for creating a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    description: String,
    amount: Decimal,
    record_date: NaiveDate,
}

impl NewTransaction {
    /// Validate creation input.
    pub fn new(
        description: impl Into<String>,
        amount: Decimal,
        record_date: NaiveDate,
    ) -> Result<Self, PurchasesError> {
        let description = description.into();

        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(PurchasesError::validation(
                format!(
                    "Description must be at most {} characters",
                    MAX_DESCRIPTION_LEN
                ),
                "description",
            ));
        }

        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PurchasesError::validation(
                "Amount must not be negative",
                "amount",
            ));
        }

        Ok(Self {
            description,
            amount,
            record_date,
        })
    }

    /// Free-text description, at most 50 characters.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Purchase amount in the native currency, never negative.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Date the purchase was made.
    pub fn record_date(&self) -> NaiveDate {
        self.record_date
    }

    /// Attach the identity assigned by the store.
    pub fn into_transaction(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            description: self.description,
            amount: self.amount,
            record_date: self.record_date,
        }
    }
}

/// A stored purchase transaction. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Store-assigned identity.
    pub id: TransactionId,
    /// Free-text description.
    pub description: String,
    /// Purchase amount in the native currency.
    pub amount: Decimal,
    /// Calendar date of the purchase.
    pub record_date: NaiveDate,
}

/// A transaction with its amount converted into another currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedTransaction {
    pub id: TransactionId,
    pub description: String,
    /// Original amount in the native currency.
    pub amount: Decimal,
    pub record_date: NaiveDate,
    /// Target currency.
    pub currency: Currency,
    /// Rate applied.
    pub exchange_rate: Decimal,
    /// Effective date of the applied rate; may precede `record_date`.
    pub rate_effective_date: NaiveDate,
    /// Amount in the target currency, rounded.
    pub converted_amount: Decimal,
}

impl ConvertedTransaction {
    /// Build the projection from a transaction, the rate used and the converted amount.
    pub fn new(transaction: Transaction, rate: &ExchangeRate, converted_amount: Decimal) -> Self {
        Self {
            id: transaction.id,
            description: transaction.description,
            amount: transaction.amount,
            record_date: transaction.record_date,
            currency: rate.currency.clone(),
            exchange_rate: rate.rate,
            rate_effective_date: rate.effective_date,
            converted_amount,
        }
    }

    /// Check if the rate used was published for an earlier day than the purchase.
    pub fn uses_earlier_rate(&self) -> bool {
        self.rate_effective_date < self.record_date
    }
}
