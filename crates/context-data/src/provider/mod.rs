//! 시세 제공자.
//!
//! - `NaverQuoteProvider`: 국내(KR) 지수/종목 시세 (네이버 금융 폴링 API)
//! - `YahooQuoteProvider`: 글로벌 지수 시세 (Yahoo Finance)
//!
//! 두 제공자는 각자 독립적인 요청 한도와 지연 특성을 가지며,
//! Aggregator가 서브 페치마다 하나를 선택합니다.

pub mod naver;
pub mod yahoo;

use crate::error::Result;
use async_trait::async_trait;
use context_core::Quote;
use std::collections::HashMap;

pub use naver::NaverQuoteProvider;
pub use yahoo::YahooQuoteProvider;

/// 시세 제공자 트레잇.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// 제공자 이름 (로그/실패 기록용).
    fn name(&self) -> &'static str;

    /// 심볼 배치의 시세를 조회합니다.
    ///
    /// # 계약
    ///
    /// 일부 심볼만 실패한 경우 해당 심볼을 결과 맵에서 제외하고 나머지를
    /// 반환합니다 (부분 실패는 오류가 아님). 하나도 성공하지 못했거나
    /// 호출 자체가 실패한 경우에만 `Err`를 반환합니다.
    async fn fetch_quotes(&self, symbols: &[String]) -> Result<HashMap<String, Quote>>;
}
