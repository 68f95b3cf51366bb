//! 컨텍스트 엔진의 에러 타입.
//!
//! 부분 데이터(PartialData)와 캐시 미스(CacheMiss)는 에러가 아니라
//! 정상적인 제어 흐름이므로 여기에 변형(variant)으로 존재하지 않습니다.

use crate::domain::Tier;
use thiserror::Error;

/// 컨텍스트 조회 에러.
#[derive(Debug, Error)]
pub enum ContextError {
    /// 업스트림 호출이 통째로 실패 (네트워크/프로토콜)
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// 개별 서브 페치 타임아웃
    #[error("Fetch timeout: {0}")]
    Timeout(String),

    /// 티어의 최소 필수 집합을 구성하지 못함. 절대 캐시되지 않습니다.
    #[error("Insufficient data for {tier} context: missing {missing}")]
    InsufficientData {
        /// 요청된 티어
        tier: Tier,
        /// 확보하지 못한 필수 서브 결과
        missing: String,
    },

    /// 장 마감 중에는 제공되지 않는 티어 요청
    #[error("{0} context is not served while the market is closed")]
    MarketClosed(Tier),

    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(String),

    /// 응답 파싱 에러
    #[error("Parse error: {0}")]
    Parse(String),
}

/// 컨텍스트 작업을 위한 Result 타입.
pub type ContextResult<T> = Result<T, ContextError>;

impl ContextError {
    /// 재시도 가능한 에러인지 확인합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ContextError::UpstreamUnavailable(_) | ContextError::Timeout(_)
        )
    }
}

impl From<config::ConfigError> for ContextError {
    fn from(err: config::ConfigError) -> Self {
        ContextError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        let upstream = ContextError::UpstreamUnavailable("connection refused".to_string());
        assert!(upstream.is_retryable());

        let closed = ContextError::MarketClosed(Tier::Intraday);
        assert!(!closed.is_retryable());
    }

    #[test]
    fn test_insufficient_data_display() {
        let err = ContextError::InsufficientData {
            tier: Tier::Primary,
            missing: "DomesticIndices".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("primary"));
        assert!(msg.contains("DomesticIndices"));
    }
}
