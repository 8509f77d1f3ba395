//! Tencent market data provider implementation.
//!
//! Fetches forward-adjusted daily klines from the ifzq fqkline endpoint.
//! Bars arrive as JSON arrays of strings
//! (`[date, open, close, high, low, volume, ...]`) with volume in lots of
//! 100 shares.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::ProviderError;
use crate::models::{exchange_prefix, is_valid_symbol, PriceBar, SourceCapabilities};
use crate::provider::{MarketDataProvider, Throttle};

const BASE_URL: &str = "https://web.ifzq.gtimg.cn/appstock/app/fqkline/get";
const PROVIDER_ID: &str = "TENCENT";

/// Shares per lot in the vendor's volume figures.
const LOT_SIZE: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Tencent daily kline provider.
pub struct TencentProvider {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct FqklineResponse {
    code: i64,
    #[serde(default)]
    data: Option<HashMap<String, SymbolKlines>>,
}

/// Per-symbol payload. Adjusted history lives under `qfqday`; very recent
/// listings without adjustment history come back under `day`.
#[derive(Debug, Deserialize)]
struct SymbolKlines {
    #[serde(default)]
    qfqday: Option<Vec<Vec<Value>>>,
    #[serde(default)]
    day: Option<Vec<Vec<Value>>>,
}

impl TencentProvider {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    /// Point the adapter at a different endpoint (tests, proxies).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Vendor symbol: `sh600519` / `sz000001`.
    fn vendor_symbol(&self, symbol: &str) -> Result<String, ProviderError> {
        if !is_valid_symbol(symbol) {
            return Err(ProviderError::InvalidSymbol {
                provider: PROVIDER_ID.to_string(),
                symbol: symbol.to_string(),
            });
        }
        Ok(format!("{}{}", exchange_prefix(symbol), symbol))
    }

    /// Decode a response body into canonical bars.
    fn parse_body(vendor_symbol: &str, body: &str) -> Result<Vec<PriceBar>, ProviderError> {
        let payload: FqklineResponse =
            serde_json::from_str(body).map_err(|e| ProviderError::MalformedResponse {
                provider: PROVIDER_ID.to_string(),
                message: format!("undecodable fqkline payload: {}", e),
            })?;

        if payload.code != 0 {
            return Err(ProviderError::InvalidSymbol {
                provider: PROVIDER_ID.to_string(),
                symbol: vendor_symbol.to_string(),
            });
        }

        let rows = payload
            .data
            .as_ref()
            .and_then(|data| data.get(vendor_symbol))
            .and_then(|entry| entry.qfqday.as_ref().or(entry.day.as_ref()))
            .ok_or_else(|| ProviderError::InvalidSymbol {
                provider: PROVIDER_ID.to_string(),
                symbol: vendor_symbol.to_string(),
            })?;

        rows.iter().map(|row| Self::parse_row(row)).collect()
    }

    /// Parse one `[date, open, close, high, low, volume, ...]` row.
    fn parse_row(row: &[Value]) -> Result<PriceBar, ProviderError> {
        let malformed = |message: String| ProviderError::MalformedResponse {
            provider: PROVIDER_ID.to_string(),
            message,
        };

        if row.len() < 6 {
            return Err(malformed(format!("kline row has {} fields", row.len())));
        }

        let date_raw = row[0]
            .as_str()
            .ok_or_else(|| malformed("non-string date field".to_string()))?;
        let date = NaiveDate::from_str(date_raw)
            .map_err(|e| malformed(format!("bad date '{}': {}", date_raw, e)))?;

        let open = Self::decimal_field(&row[1])?;
        let close = Self::decimal_field(&row[2])?;
        let high = Self::decimal_field(&row[3])?;
        let low = Self::decimal_field(&row[4])?;
        let lots = Self::decimal_field(&row[5])?;

        Ok(PriceBar {
            date,
            open,
            high,
            low,
            close,
            volume: lots * LOT_SIZE,
        })
    }

    /// Numeric fields arrive either as JSON strings or numbers.
    fn decimal_field(value: &Value) -> Result<Decimal, ProviderError> {
        let raw = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            other => {
                return Err(ProviderError::MalformedResponse {
                    provider: PROVIDER_ID.to_string(),
                    message: format!("non-numeric kline field: {}", other),
                })
            }
        };

        Decimal::from_str(&raw).map_err(|e| ProviderError::MalformedResponse {
            provider: PROVIDER_ID.to_string(),
            message: format!("bad number '{}': {}", raw, e),
        })
    }
}

impl Default for TencentProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProvider for TencentProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        1
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::daily_and_realtime()
    }

    fn throttle(&self) -> Throttle {
        Throttle {
            min_delay: std::time::Duration::from_millis(150),
        }
    }

    async fn fetch_daily(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> Result<Vec<PriceBar>, ProviderError> {
        let vendor_symbol = self.vendor_symbol(symbol)?;
        let url = format!(
            "{}?param={},day,,,{},qfq",
            self.base_url, vendor_symbol, lookback_days
        );

        debug!("Requesting {} daily bars for '{}' from Tencent", lookback_days, symbol);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout {
                    provider: PROVIDER_ID.to_string(),
                }
            } else {
                ProviderError::Unavailable {
                    provider: PROVIDER_ID.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(ProviderError::Unavailable {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Unavailable {
                provider: PROVIDER_ID.to_string(),
                message: e.to_string(),
            })?;

        Self::parse_body(&vendor_symbol, &body)
    }
}
