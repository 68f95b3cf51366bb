//! 시세 스냅샷 타입.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 개별 종목/지수의 시세 스냅샷.
///
/// 업스트림 제공자가 반환한 시점의 값으로 고정되며, 반환 이후 변경되지
/// 않습니다. 캐시 엔트리는 각자 자신의 복제본을 소유합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// 심볼 (예: "005930", "KOSPI", "^IXIC")
    pub symbol: String,
    /// 종목/지수명
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// 현재가 (최근 체결가)
    pub last: Decimal,
    /// 전일 대비 변동률 (%)
    pub change_percent: Decimal,
    /// 누적 거래량
    pub volume: Decimal,
    /// 시가
    pub open: Decimal,
    /// 고가
    pub high: Decimal,
    /// 저가
    pub low: Decimal,
    /// 전일 종가
    pub prev_close: Decimal,
    /// 조회 시각
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// 상승 중인지 확인합니다.
    pub fn is_up(&self) -> bool {
        self.change_percent > Decimal::ZERO
    }

    /// 하락 중인지 확인합니다.
    pub fn is_down(&self) -> bool {
        self.change_percent < Decimal::ZERO
    }

    /// 당일 변동폭(고가 - 저가)을 반환합니다.
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    /// 대표가(고가+저가+현재가 평균)를 반환합니다.
    ///
    /// 피벗 산출의 기준값으로 사용됩니다.
    pub fn typical_price(&self) -> Decimal {
        (self.high + self.low + self.last) / Decimal::from(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_quote() -> Quote {
        Quote {
            symbol: "005930".to_string(),
            name: Some("삼성전자".to_string()),
            last: dec!(71000),
            change_percent: dec!(0.85),
            volume: dec!(12345678),
            open: dec!(70500),
            high: dec!(71500),
            low: dec!(70200),
            prev_close: dec!(70400),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_direction() {
        let quote = sample_quote();
        assert!(quote.is_up());
        assert!(!quote.is_down());
    }

    #[test]
    fn test_range_and_typical_price() {
        let quote = sample_quote();
        assert_eq!(quote.range(), dec!(1300));
        // (71500 + 70200 + 71000) / 3 = 70900
        assert_eq!(quote.typical_price(), dec!(70900));
    }

    #[test]
    fn test_serde_camel_case() {
        let quote = sample_quote();
        let json = serde_json::to_string(&quote).unwrap();
        assert!(json.contains("changePercent"));
        assert!(json.contains("prevClose"));
    }
}
