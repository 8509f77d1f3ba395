//! Eastmoney market data provider implementation.
//!
//! Fetches daily klines from the push2his endpoint. Bars arrive as
//! comma-joined strings (`date,open,close,high,low,volume,...`) with
//! volume in lots of 100 shares; this adapter renames fields, parses dates
//! and normalizes volume to shares.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::ProviderError;
use crate::models::{is_valid_symbol, PriceBar, SourceCapabilities};
use crate::provider::{MarketDataProvider, Throttle};

const BASE_URL: &str = "https://push2his.eastmoney.com/api/qt/stock/kline/get";
const PROVIDER_ID: &str = "EASTMONEY";

/// Shares per lot in the vendor's volume figures.
const LOT_SIZE: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Eastmoney daily kline provider.
///
/// Public endpoint, no credentials; tried first because it serves the
/// longest history and adjusts prices server-side.
pub struct EastmoneyProvider {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct KlineResponse {
    data: Option<KlineData>,
}

#[derive(Debug, Deserialize)]
struct KlineData {
    #[serde(default)]
    klines: Vec<String>,
}

impl EastmoneyProvider {
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

    /// Vendor instrument id: `1.<code>` for Shanghai, `0.<code>` for
    /// Shenzhen.
    fn secid(&self, symbol: &str) -> Result<String, ProviderError> {
        if !is_valid_symbol(symbol) {
            return Err(ProviderError::InvalidSymbol {
                provider: PROVIDER_ID.to_string(),
                symbol: symbol.to_string(),
            });
        }
        let market = if symbol.starts_with('6') { "1" } else { "0" };
        Ok(format!("{}.{}", market, symbol))
    }

    /// Decode a response body into canonical bars.
    fn parse_body(symbol: &str, body: &str) -> Result<Vec<PriceBar>, ProviderError> {
        let payload: KlineResponse =
            serde_json::from_str(body).map_err(|e| ProviderError::MalformedResponse {
                provider: PROVIDER_ID.to_string(),
                message: format!("undecodable kline payload: {}", e),
            })?;

        // The endpoint answers `data: null` for unknown instruments.
        let data = payload.data.ok_or_else(|| ProviderError::InvalidSymbol {
            provider: PROVIDER_ID.to_string(),
            symbol: symbol.to_string(),
        })?;

        if data.klines.is_empty() {
            return Err(ProviderError::InvalidSymbol {
                provider: PROVIDER_ID.to_string(),
                symbol: symbol.to_string(),
            });
        }

        data.klines.iter().map(|line| Self::parse_kline(line)).collect()
    }

    /// Parse one `date,open,close,high,low,volume[,...]` line.
    fn parse_kline(line: &str) -> Result<PriceBar, ProviderError> {
        let malformed = |message: String| ProviderError::MalformedResponse {
            provider: PROVIDER_ID.to_string(),
            message,
        };

        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 6 {
            return Err(malformed(format!("kline has {} fields: '{}'", fields.len(), line)));
        }

        let date = NaiveDate::from_str(fields[0])
            .map_err(|e| malformed(format!("bad date '{}': {}", fields[0], e)))?;
        let parse_price = |raw: &str| {
            Decimal::from_str(raw).map_err(|e| malformed(format!("bad price '{}': {}", raw, e)))
        };

        let open = parse_price(fields[1])?;
        let close = parse_price(fields[2])?;
        let high = parse_price(fields[3])?;
        let low = parse_price(fields[4])?;
        let lots = parse_price(fields[5])?;

        Ok(PriceBar {
            date,
            open,
            high,
            low,
            close,
            volume: lots * LOT_SIZE,
        })
    }
}

impl Default for EastmoneyProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProvider for EastmoneyProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        0
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::daily_and_realtime()
    }

    fn throttle(&self) -> Throttle {
        Throttle {
            min_delay: std::time::Duration::from_millis(200),
        }
    }

    async fn fetch_daily(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> Result<Vec<PriceBar>, ProviderError> {
        let secid = self.secid(symbol)?;
        let url = format!(
            "{}?secid={}&klt=101&fqt=1&end=20500101&lmt={}&fields1=f1,f2,f3,f4,f5,f6&fields2=f51,f52,f53,f54,f55,f56",
            self.base_url, secid, lookback_days
        );

        debug!("Requesting {} daily bars for '{}' from Eastmoney", lookback_days, symbol);

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
    fn test_secid_mapping() {
        let provider = EastmoneyProvider::new();
        assert_eq!(provider.secid("600519").unwrap(), "1.600519");
        assert_eq!(provider.secid("000001").unwrap(), "0.000001");
        assert_eq!(provider.secid("300750").unwrap(), "0.300750");
    }

    #[test]
    fn test_secid_rejects_bad_symbol() {
        let provider = EastmoneyProvider::new();
        let error = provider.secid("AAPL").unwrap_err();
        assert!(matches!(error, ProviderError::InvalidSymbol { .. }));
    }

    #[test]
    fn test_parse_kline_normalizes_volume_to_shares() {
        let bar =
            EastmoneyProvider::parse_kline("2024-03-01,1700.00,1712.50,1720.00,1690.10,32411,5.5e9")
                .unwrap();

        assert_eq!(bar.date, "2024-03-01".parse::<NaiveDate>().unwrap());
        assert_eq!(bar.open, dec!(1700.00));
        assert_eq!(bar.close, dec!(1712.50));
        assert_eq!(bar.high, dec!(1720.00));
        assert_eq!(bar.low, dec!(1690.10));
        // 32411 lots -> 3,241,100 shares
        assert_eq!(bar.volume, dec!(3241100));
    }

    #[test]
    fn test_parse_kline_rejects_short_line() {
        let error = EastmoneyProvider::parse_kline("2024-03-01,1700.00").unwrap_err();
        assert!(matches!(error, ProviderError::MalformedResponse { .. }));
    }

    #[test]
    fn test_parse_kline_rejects_bad_date() {
        let error =
            EastmoneyProvider::parse_kline("03/01/2024,1700,1712,1720,1690,32411").unwrap_err();
        assert!(matches!(error, ProviderError::MalformedResponse { .. }));
    }

    #[test]
    fn test_parse_body_decodes_payload() {
        let body = r#"{
            "data": {
                "code": "600519",
                "klines": [
                    "2024-03-01,1700.00,1712.50,1720.00,1690.10,32411,5.5e9",
                    "2024-03-04,1713.00,1705.00,1718.00,1701.00,28000,4.8e9"
                ]
            }
        }"#;

        let bars = EastmoneyProvider::parse_body("600519", body).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, dec!(1705.00));
    }

    #[test]
    fn test_parse_body_null_data_is_invalid_symbol() {
        let error = EastmoneyProvider::parse_body("999999", r#"{"data": null}"#).unwrap_err();
        assert!(matches!(error, ProviderError::InvalidSymbol { .. }));
    }

    #[test]
    fn test_parse_body_garbage_is_malformed() {
        let error = EastmoneyProvider::parse_body("600519", "<html>oops</html>").unwrap_err();
        assert!(matches!(error, ProviderError::MalformedResponse { .. }));
    }
}
