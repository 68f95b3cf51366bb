//! 시장 폭(Market Breadth) 스냅샷.
//!
//! 고정 바스켓 구성 종목의 등락 분포를 집계한 보조 지표입니다.
//! 시세 조회에 실패한 종목은 `total`에서 제외되며 보합으로 세지 않습니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 스냅샷 데이터 출처.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreadthSource {
    /// 업스트림 시세 기반 정상 계산
    Live,
    /// 업스트림 전체 실패 시 반환되는 기본값
    Fallback,
}

/// 시장 폭 스냅샷.
///
/// # 불변식
///
/// - `advancing + declining + unchanged == total`
/// - `total <= 바스켓 크기`
/// - `ratio`: `declining > 0`이면 `advancing / declining`,
///   그 외에는 `advancing` (문서화된 퇴화 케이스, 에러 아님)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreadthSnapshot {
    /// 상승 종목 수
    pub advancing: u32,
    /// 하락 종목 수
    pub declining: u32,
    /// 보합 종목 수
    pub unchanged: u32,
    /// 집계 대상 종목 수 (조회 실패 종목 제외)
    pub total: u32,
    /// 등락 비율 (advance/decline ratio)
    pub ratio: Decimal,
    /// 계산 시각
    pub calculated_at: DateTime<Utc>,
    /// 데이터 출처
    pub source: BreadthSource,
}

impl BreadthSnapshot {
    /// 등락 종목 수로부터 스냅샷을 생성합니다.
    pub fn from_counts(advancing: u32, declining: u32, unchanged: u32) -> Self {
        let ratio = if declining > 0 {
            Decimal::from(advancing) / Decimal::from(declining)
        } else {
            Decimal::from(advancing)
        };

        Self {
            advancing,
            declining,
            unchanged,
            total: advancing + declining + unchanged,
            ratio,
            calculated_at: Utc::now(),
            source: BreadthSource::Live,
        }
    }

    /// 업스트림 전체 실패 시의 기본 스냅샷.
    ///
    /// 시장 폭은 보조 신호이므로, 조회 실패가 상위 복합 응답 전체를
    /// 실패시키지 않도록 에러 대신 이 값을 반환합니다.
    pub fn fallback() -> Self {
        Self {
            advancing: 0,
            declining: 0,
            unchanged: 0,
            total: 0,
            ratio: Decimal::ONE,
            calculated_at: Utc::now(),
            source: BreadthSource::Fallback,
        }
    }

    /// 카운트 불변식이 성립하는지 확인합니다.
    pub fn is_consistent(&self) -> bool {
        self.advancing + self.declining + self.unchanged == self.total
    }

    /// 상승 우위 여부 (ratio > 1).
    pub fn is_positive(&self) -> bool {
        self.ratio > Decimal::ONE
    }
}
