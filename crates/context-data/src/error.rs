//! 데이터 모듈 오류 타입.

use context_core::ContextError;
use thiserror::Error;

/// 데이터 계층 오류.
///
/// 심볼 단위 부분 실패는 오류가 아니라 결과 맵에서의 누락으로
/// 표현됩니다. 이 타입은 호출 자체가 실패한 경우에만 사용됩니다.
#[derive(Debug, Error)]
pub enum DataError {
    /// 업스트림 가져오기 오류 (네트워크/프로토콜)
    #[error("Fetch error: {0}")]
    FetchError(String),

    /// 응답 파싱 오류
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 타임아웃 오류
    #[error("Operation timeout: {0}")]
    Timeout(String),

    /// 요청한 심볼에 대한 데이터 없음
    #[error("No data: {0}")]
    NoData(String),

    /// 설정 오류
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DataError::Timeout(err.to_string())
        } else {
            DataError::FetchError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::ParseError(err.to_string())
    }
}

impl From<DataError> for ContextError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::Timeout(msg) => ContextError::Timeout(msg),
            DataError::ParseError(msg) => ContextError::Parse(msg),
            DataError::ConfigError(msg) => ContextError::Config(msg),
            DataError::FetchError(msg) | DataError::NoData(msg) => {
                ContextError::UpstreamUnavailable(msg)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
