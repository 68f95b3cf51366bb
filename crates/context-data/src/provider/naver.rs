//! 네이버 금융 폴링 API 기반 국내 시세 제공자.
//!
//! 지수(`SERVICE_INDEX`)와 종목(`SERVICE_ITEM`)을 하나의 폴링 요청으로
//! 배치 조회합니다. 인증이 필요 없는 공개 엔드포인트이므로 토큰 교환
//! 흐름 없이 사용할 수 있습니다.
//!
//! 응답에 없는 심볼은 결과 맵에서 제외됩니다 (부분 실패 허용).

use crate::error::{DataError, Result};
use crate::provider::QuoteProvider;
use async_trait::async_trait;
use chrono::Utc;
use context_core::Quote;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const DEFAULT_BASE_URL: &str = "https://polling.finance.naver.com/api/realtime";

/// 폴링 API 응답.
#[derive(Debug, Deserialize)]
struct PollingResponse {
    #[serde(rename = "resultCode")]
    result_code: String,
    result: PollingResult,
}

#[derive(Debug, Deserialize)]
struct PollingResult {
    #[serde(default)]
    areas: Vec<PollingArea>,
}

#[derive(Debug, Deserialize)]
struct PollingArea {
    #[serde(default)]
    datas: Vec<PollingData>,
}

/// 폴링 API 개별 시세 항목.
#[derive(Debug, Deserialize)]
struct PollingData {
    /// 심볼 코드
    cd: String,
    /// 종목/지수명
    nm: Option<String>,
    /// 현재가
    nv: Decimal,
    /// 등락률 (부호 없음, rf로 방향 판별)
    #[serde(default)]
    cr: Decimal,
    /// 등락 구분 (1 상한, 2 상승, 3 보합, 4 하한, 5 하락)
    #[serde(default)]
    rf: String,
    /// 누적 거래량
    #[serde(default)]
    aq: Decimal,
    /// 시가
    #[serde(default)]
    ov: Decimal,
    /// 고가
    #[serde(default)]
    hv: Decimal,
    /// 저가
    #[serde(default)]
    lv: Decimal,
    /// 전일 종가
    #[serde(default)]
    pcv: Decimal,
}

impl PollingData {
    /// 등락 구분 플래그를 반영한 부호 있는 등락률.
    fn signed_change_percent(&self) -> Decimal {
        match self.rf.as_str() {
            "4" | "5" => -self.cr,
            _ => self.cr,
        }
    }

    fn into_quote(self) -> Quote {
        let change_percent = self.signed_change_percent();
        Quote {
            symbol: self.cd,
            name: self.nm,
            last: self.nv,
            change_percent,
            volume: self.aq,
            open: self.ov,
            high: self.hv,
            low: self.lv,
            prev_close: self.pcv,
            timestamp: Utc::now(),
        }
    }
}

/// 네이버 금융 폴링 API 기반 국내 시세 제공자.
pub struct NaverQuoteProvider {
    client: Client,
    base_url: String,
}

impl NaverQuoteProvider {
    /// 기본 설정으로 생성합니다.
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout)
    }

    /// 커스텀 엔드포인트로 생성합니다 (테스트용).
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::ConfigError(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// 심볼 배치를 폴링 쿼리 문자열로 변환합니다.
    ///
    /// 숫자로만 된 코드는 종목(`SERVICE_ITEM`), 그 외는 지수
    /// (`SERVICE_INDEX`)로 분류합니다.
    fn build_query(symbols: &[String]) -> String {
        let (items, indices): (Vec<&String>, Vec<&String>) = symbols
            .iter()
            .partition(|s| s.chars().all(|c| c.is_ascii_digit()));

        let mut segments = Vec::new();
        if !indices.is_empty() {
            segments.push(format!(
                "SERVICE_INDEX:{}",
                indices.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(",")
            ));
        }
        if !items.is_empty() {
            segments.push(format!(
                "SERVICE_ITEM:{}",
                items.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(",")
            ));
        }
        segments.join("|")
    }

    /// 응답 본문을 시세 맵으로 파싱합니다.
    fn parse_body(body: &str) -> Result<HashMap<String, Quote>> {
        let resp: PollingResponse = serde_json::from_str(body)?;

        if resp.result_code != "success" {
            return Err(DataError::FetchError(format!(
                "polling API returned result code {}",
                resp.result_code
            )));
        }

        let quotes = resp
            .result
            .areas
            .into_iter()
            .flat_map(|area| area.datas)
            .map(|data| {
                let quote = data.into_quote();
                (quote.symbol.clone(), quote)
            })
            .collect();

        Ok(quotes)
    }
}

#[async_trait]
impl QuoteProvider for NaverQuoteProvider {
    fn name(&self) -> &'static str {
        "naver"
    }

    #[instrument(skip(self, symbols), fields(count = symbols.len()), level = "debug")]
    async fn fetch_quotes(&self, symbols: &[String]) -> Result<HashMap<String, Quote>> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }

        let query = Self::build_query(symbols);
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("query", query.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(DataError::FetchError(format!(
                "polling API returned {}: {}",
                status, body
            )));
        }

        let quotes = Self::parse_body(&body)?;

        if quotes.is_empty() {
            return Err(DataError::NoData(format!(
                "no quotes returned for {} symbols",
                symbols.len()
            )));
        }

        if quotes.len() < symbols.len() {
            warn!(
                requested = symbols.len(),
                received = quotes.len(),
                "일부 심볼 시세 누락 (부분 결과로 처리)"
            );
        }

        debug!(received = quotes.len(), "국내 시세 배치 조회 완료");
        Ok(quotes)
    }
}
