//! US Treasury Fiscal Data "Rates of Exchange" source.
//!
//! Queries `/v1/accounting/od/rates_of_exchange`, filtered on the
//! country-currency descriptor and an effective-date range. The API encodes
//! every value as a string, e.g.
//!
//! ```json
//! {"data":[{"country_currency_desc":"Euro Zone-Euro","exchange_rate":"0.822",
//!           "effective_date":"2020-12-31","record_date":"2020-12-31","src_line_nbr":"64"}]}
//! ```

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use purchases_common::{constants, Currency, ExchangeRate};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::{FxError, FxResult};
use crate::source::RateSource;

/// Default Fiscal Data API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.fiscaldata.treasury.gov/services/api/fiscal_service";

const RATES_PATH: &str = "/v1/accounting/od/rates_of_exchange";
const FIELDS: &str = "country_currency_desc,exchange_rate,effective_date,record_date,src_line_nbr";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Configuration for the Treasury source.
#[derive(Debug, Clone)]
pub struct TreasuryConfig {
    /// API base URL.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Records requested per call. Rates are published quarterly, so one
    /// page covers any realistic lookback window.
    pub page_size: u32,
}

impl Default for TreasuryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: constants::rate_source_timeout(),
            page_size: 100,
        }
    }
}

/// Rate source backed by the Treasury reporting rates of exchange.
pub struct TreasuryRateSource {
    client: reqwest::Client,
    config: TreasuryConfig,
}

impl TreasuryRateSource {
    /// Create a new Treasury source.
    pub fn new(config: TreasuryConfig) -> FxResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FxError::SourceUnavailable(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn url(&self) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), RATES_PATH)
    }
}

#[async_trait]
impl RateSource for TreasuryRateSource {
    fn name(&self) -> &str {
        "TREASURY"
    }

    #[instrument(skip(self), fields(currency = %currency))]
    async fn rates_between(
        &self,
        currency: &Currency,
        from: NaiveDate,
        to: NaiveDate,
    ) -> FxResult<Vec<ExchangeRate>> {
        // The filter syntax reserves these separators; no descriptor uses them.
        if currency.code().contains([',', ':']) {
            debug!("Currency cannot be expressed as a Treasury filter");
            return Ok(Vec::new());
        }

        let page_size = self.config.page_size.to_string();
        let response = self
            .client
            .get(self.url())
            .query(&[
                ("fields", FIELDS),
                ("filter", filter_for(currency, from, to).as_str()),
                ("sort", "-effective_date"),
                ("page[size]", page_size.as_str()),
            ])
            .send()
            .await
            .map_err(|e| classify(e, self.config.timeout))?;

        if !response.status().is_success() {
            return Err(FxError::SourceUnavailable(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify(e, self.config.timeout))?;

        let rates = parse_response(&body)?;
        debug!(count = rates.len(), "Fetched rates");
        Ok(rates)
    }
}

/// Build the `filter` query parameter.
fn filter_for(currency: &Currency, from: NaiveDate, to: NaiveDate) -> String {
    format!(
        "country_currency_desc:eq:{},effective_date:gte:{},effective_date:lte:{}",
        currency.code(),
        from.format(DATE_FORMAT),
        to.format(DATE_FORMAT),
    )
}

fn classify(err: reqwest::Error, timeout: Duration) -> FxError {
    if err.is_timeout() {
        FxError::SourceTimeout(timeout.as_millis() as u64)
    } else {
        FxError::SourceUnavailable(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct TreasuryResponse {
    data: Vec<TreasuryRecord>,
}

#[derive(Debug, Deserialize)]
struct TreasuryRecord {
    country_currency_desc: String,
    exchange_rate: String,
    effective_date: String,
    record_date: String,
    #[serde(default)]
    src_line_nbr: Option<String>,
}

impl TreasuryRecord {
    fn into_rate(self) -> FxResult<ExchangeRate> {
        let rate = Decimal::from_str(self.exchange_rate.trim())
            .map_err(|e| FxError::MalformedRate(format!("exchange_rate {:?}: {}", self.exchange_rate, e)))?;
        let effective_date = parse_date(&self.effective_date)?;
        let record_date = parse_date(&self.record_date)?;
        let source_line = match self.src_line_nbr.as_deref().map(str::trim) {
            Some(line) if !line.is_empty() => line
                .parse()
                .map_err(|_| FxError::MalformedRate(format!("src_line_nbr {:?}", line)))?,
            _ => 0,
        };

        Ok(ExchangeRate::new(Currency::new(self.country_currency_desc), rate, effective_date)
            .with_record_date(record_date)
            .with_source_line(source_line))
    }
}

fn parse_date(value: &str) -> FxResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|e| FxError::MalformedRate(format!("date {:?}: {}", value, e)))
}

fn parse_response(body: &str) -> FxResult<Vec<ExchangeRate>> {
    let response: TreasuryResponse =
        serde_json::from_str(body).map_err(|e| FxError::MalformedRate(e.to_string()))?;

    response
        .data
        .into_iter()
        .map(TreasuryRecord::into_rate)
        .collect()
}
