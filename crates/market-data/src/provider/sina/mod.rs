//! Sina market data provider implementation.
//!
//! Fetches daily klines from the CN_MarketDataService endpoint. Bars arrive
//! as JSON objects with string-valued fields; volume is already in shares,
//! so only field renaming and date parsing apply.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::ProviderError;
use crate::models::{exchange_prefix, is_valid_symbol, PriceBar, SourceCapabilities};
use crate::provider::{MarketDataProvider, Throttle};

const BASE_URL: &str =
    "https://quotes.sina.cn/cn/api/json_v2.php/CN_MarketDataService.getKLineData";
const PROVIDER_ID: &str = "SINA";

/// Daily bars use the 240-minute scale on this endpoint.
const DAILY_SCALE: u32 = 240;

/// Sina daily kline provider.
///
/// Last in the default chain: the endpoint throttles aggressively, so it
/// only gets traffic when both other vendors are down.
pub struct SinaProvider {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SinaKline {
    day: String,
    open: String,
    high: String,
    low: String,
    close: String,
    volume: String,
}

impl SinaProvider {
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
    fn parse_body(symbol: &str, body: &str) -> Result<Vec<PriceBar>, ProviderError> {
        // Unknown symbols answer with the JSON literal `null`.
        if body.trim() == "null" || body.trim().is_empty() {
            return Err(ProviderError::InvalidSymbol {
                provider: PROVIDER_ID.to_string(),
                symbol: symbol.to_string(),
            });
        }

        let klines: Vec<SinaKline> =
            serde_json::from_str(body).map_err(|e| ProviderError::MalformedResponse {
                provider: PROVIDER_ID.to_string(),
                message: format!("undecodable kline payload: {}", e),
            })?;

        klines.iter().map(Self::to_bar).collect()
    }

    fn to_bar(kline: &SinaKline) -> Result<PriceBar, ProviderError> {
        let malformed = |message: String| ProviderError::MalformedResponse {
            provider: PROVIDER_ID.to_string(),
            message,
        };

        let date = NaiveDate::from_str(&kline.day)
            .map_err(|e| malformed(format!("bad date '{}': {}", kline.day, e)))?;
        let parse = |raw: &str| {
            Decimal::from_str(raw).map_err(|e| malformed(format!("bad number '{}': {}", raw, e)))
        };

        Ok(PriceBar {
            date,
            open: parse(&kline.open)?,
            high: parse(&kline.high)?,
            low: parse(&kline.low)?,
            close: parse(&kline.close)?,
            volume: parse(&kline.volume)?,
        })
    }
}

impl Default for SinaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProvider for SinaProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        2
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::daily_only()
    }

    fn throttle(&self) -> Throttle {
        Throttle {
            min_delay: std::time::Duration::from_millis(300),
        }
    }

    async fn fetch_daily(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> Result<Vec<PriceBar>, ProviderError> {
        let vendor_symbol = self.vendor_symbol(symbol)?;
        let url = format!(
            "{}?symbol={}&scale={}&ma=no&datalen={}",
            self.base_url, vendor_symbol, DAILY_SCALE, lookback_days
        );

        debug!("Requesting {} daily bars for '{}' from Sina", lookback_days, symbol);

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

        Self::parse_body(symbol, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_vendor_symbol_mapping() {
        let provider = SinaProvider::new();
        assert_eq!(provider.vendor_symbol("601318").unwrap(), "sh601318");
        assert_eq!(provider.vendor_symbol("002594").unwrap(), "sz002594");
    }

    #[test]
    fn test_parse_body_decodes_klines() {
        let body = r#"[
            {"day":"2024-03-01","open":"1700.000","high":"1720.000","low":"1690.100","close":"1712.500","volume":"3241100"},
            {"day":"2024-03-04","open":"1713.000","high":"1718.000","low":"1701.000","close":"1705.000","volume":"2800000"}
        ]"#;

        let bars = SinaProvider::parse_body("600519", body).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].high, dec!(1720.000));
        // Volume is already in shares; no lot scaling.
        assert_eq!(bars[0].volume, dec!(3241100));
    }

    #[test]
    fn test_parse_body_null_is_invalid_symbol() {
        let error = SinaProvider::parse_body("999999", "null").unwrap_err();
        assert!(matches!(error, ProviderError::InvalidSymbol { .. }));
    }

    #[test]
    fn test_parse_body_garbage_is_malformed() {
        let error = SinaProvider::parse_body("600519", "var hq = {};").unwrap_err();
        assert!(matches!(error, ProviderError::MalformedResponse { .. }));
    }

    #[test]
    fn test_parse_body_bad_field_is_malformed() {
        let body = r#"[{"day":"2024-03-01","open":"x","high":"1","low":"1","close":"1","volume":"1"}]"#;
        let error = SinaProvider::parse_body("600519", body).unwrap_err();
        assert!(matches!(error, ProviderError::MalformedResponse { .. }));
    }
}
