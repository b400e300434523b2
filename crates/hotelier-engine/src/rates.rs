//! # Exchange Rates
//!
//! USD→LKR rates for non-resident pricing.
//!
//! ```text
//!   RateConverter::get_rate()
//!        │
//!        ├── provider.fetch_rate() ── Ok(rate > 0) ──► RateQuote { source: Live }
//!        │
//!        └── any error ───────────── warn! ─────────► RateQuote { source: Fallback }
//! ```
//!
//! One attempt per call, bounded by the HTTP client's timeout. Nothing is
//! cached: every quote re-queries the provider.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use hotelier_core::{ExchangeRate, RateQuote};

use crate::config::RateSettings;
use crate::error::{EngineError, EngineResult};

/// Why a provider could not supply a rate.
#[derive(Debug, Error)]
pub enum RateError {
    #[error("Rate provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate provider returned status {0}")]
    Status(u16),

    #[error("Rate provider response has no {0} rate")]
    MissingCurrency(String),

    #[error("Rate provider returned an unusable rate: {0}")]
    InvalidRate(f64),
}

/// Source of live exchange rates.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Units of `quote` per one unit of `base`.
    async fn fetch_rate(&self, base: &str, quote: &str) -> Result<f64, RateError>;
}

// =============================================================================
// HTTP Provider
// =============================================================================

#[derive(Debug, Deserialize)]
struct LatestRates {
    rates: HashMap<String, f64>,
}

/// Calls `GET {endpoint}/{base}` and reads `rates[quote]` from the body.
#[derive(Debug, Clone)]
pub struct HttpRateProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRateProvider {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> EngineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Config(format!("rate provider client: {}", e)))?;

        Ok(HttpRateProvider {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    async fn fetch_rate(&self, base: &str, quote: &str) -> Result<f64, RateError> {
        let url = format!("{}/{}", self.endpoint, base);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RateError::Status(status.as_u16()));
        }

        let body = response.json::<LatestRates>().await?;
        body.rates
            .get(quote)
            .copied()
            .ok_or_else(|| RateError::MissingCurrency(quote.to_string()))
    }
}

// =============================================================================
// Converter
// =============================================================================

/// Turns provider answers into rate quotes, substituting the fallback on
/// any failure.
///
/// The provider is always asked for the pair a [`RateQuote`] is labelled
/// with, `RateQuote::BASE` → `RateQuote::QUOTE`.
#[derive(Clone)]
pub struct RateConverter {
    provider: Arc<dyn RateProvider>,
    fallback: ExchangeRate,
}

impl RateConverter {
    pub fn new(provider: Arc<dyn RateProvider>, settings: &RateSettings) -> EngineResult<Self> {
        Ok(RateConverter {
            provider,
            fallback: settings.fallback()?,
        })
    }

    /// Converter backed by the HTTP provider described in `settings`.
    pub fn from_settings(settings: &RateSettings) -> EngineResult<Self> {
        let provider = HttpRateProvider::new(settings.endpoint.clone(), settings.timeout())?;
        Self::new(Arc::new(provider), settings)
    }

    /// Current rate. Never fails.
    pub async fn get_rate(&self) -> RateQuote {
        let (base, quote) = (RateQuote::BASE, RateQuote::QUOTE);
        let result = self
            .provider
            .fetch_rate(base.code(), quote.code())
            .await
            .and_then(|raw| ExchangeRate::from_f64(raw).ok_or(RateError::InvalidRate(raw)));

        match result {
            Ok(rate) => {
                debug!(%base, %quote, %rate, "Live exchange rate");
                RateQuote::live(rate)
            }
            Err(e) => {
                warn!(
                    %base,
                    %quote,
                    fallback = %self.fallback,
                    error = %e,
                    "Exchange rate unavailable, using fallback"
                );
                RateQuote::fallback_with(self.fallback)
            }
        }
    }
}

impl std::fmt::Debug for RateConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateConverter")
            .field("base", &RateQuote::BASE)
            .field("quote", &RateQuote::QUOTE)
            .field("fallback", &self.fallback)
            .finish()
    }
}
