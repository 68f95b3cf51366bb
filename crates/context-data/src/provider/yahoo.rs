//! Yahoo Finance 기반 글로벌 지수 시세 제공자.
//!
//! 최근 5일 일봉에서 마지막 두 종가로 전일 대비 변동률을 계산합니다
//! (주말/휴장을 고려해 여유 있게 조회).

use crate::error::{DataError, Result};
use crate::provider::QuoteProvider;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use context_core::Quote;
use futures::future::join_all;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, instrument, warn};
use yahoo_finance_api as yahoo;

/// Yahoo Finance 기반 글로벌 시세 제공자.
pub struct YahooQuoteProvider {
    connector: yahoo::YahooConnector,
}

impl YahooQuoteProvider {
    /// 새 제공자를 생성합니다.
    pub fn new() -> Result<Self> {
        let connector = yahoo::YahooConnector::new()
            .map_err(|e| DataError::ConfigError(format!("Yahoo connector build failed: {}", e)))?;

        Ok(Self { connector })
    }

    /// 변동률 계산 (%).
    fn change_percent(current: Decimal, previous: Decimal) -> Decimal {
        if previous.is_zero() {
            return Decimal::ZERO;
        }
        (current - previous) / previous * Decimal::from(100)
    }

    /// 단일 심볼의 최신 시세 조회.
    async fn fetch_one(&self, symbol: &str) -> Result<Quote> {
        let response = self
            .connector
            .get_quote_range(symbol, "1d", "5d")
            .await
            .map_err(|e| DataError::FetchError(format!("{}: {}", symbol, e)))?;

        let candles = response
            .quotes()
            .map_err(|e| DataError::ParseError(format!("{}: {}", symbol, e)))?;

        if candles.len() < 2 {
            return Err(DataError::NoData(format!(
                "{}: need at least 2 daily candles, got {}",
                symbol,
                candles.len()
            )));
        }

        let latest = &candles[candles.len() - 1];
        let previous = &candles[candles.len() - 2];

        let last = Decimal::from_f64_retain(latest.close)
            .ok_or_else(|| DataError::ParseError(format!("{}: invalid close", symbol)))?;
        let prev_close = Decimal::from_f64_retain(previous.close)
            .ok_or_else(|| DataError::ParseError(format!("{}: invalid prev close", symbol)))?;

        let timestamp = i64::try_from(latest.timestamp)
            .ok()
            .and_then(|t| DateTime::from_timestamp(t, 0))
            .unwrap_or_else(Utc::now);

        Ok(Quote {
            symbol: symbol.to_string(),
            name: None,
            last,
            change_percent: Self::change_percent(last, prev_close),
            volume: Decimal::from(latest.volume),
            open: Decimal::from_f64_retain(latest.open).unwrap_or(last),
            high: Decimal::from_f64_retain(latest.high).unwrap_or(last),
            low: Decimal::from_f64_retain(latest.low).unwrap_or(last),
            prev_close,
            timestamp,
        })
    }
}

#[async_trait]
impl QuoteProvider for YahooQuoteProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    #[instrument(skip(self, symbols), fields(count = symbols.len()), level = "debug")]
    async fn fetch_quotes(&self, symbols: &[String]) -> Result<HashMap<String, Quote>> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }

        let results = join_all(symbols.iter().map(|s| self.fetch_one(s))).await;

        let mut quotes = HashMap::new();
        let mut last_error = None;
        for (symbol, result) in symbols.iter().zip(results) {
            match result {
                Ok(quote) => {
                    quotes.insert(symbol.clone(), quote);
                }
                // 심볼 단위 실패는 결과에서 제외하고 계속 진행
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "글로벌 시세 조회 실패");
                    last_error = Some(e);
                }
            }
        }

        if quotes.is_empty() {
            return Err(last_error
                .unwrap_or_else(|| DataError::NoData("no global quotes returned".to_string())));
        }

        debug!(received = quotes.len(), "글로벌 시세 조회 완료");
        Ok(quotes)
    }
}
