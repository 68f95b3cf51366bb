//! 복합 컨텍스트 뷰.
//!
//! 티어별로 서로 다른 서브 결과 조합을 담는 복합 뷰입니다. 각 슬롯은
//! 독립적으로 채워지며, 실패한 서브 페치의 슬롯은 `None`으로 남고
//! `PartialFailure`로 기록됩니다. 복합 뷰는 항상 통째로 교체되며
//! 부분 갱신되지 않습니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::breadth::BreadthSnapshot;
use super::quote::Quote;
use super::tier::{SubResult, Tier};

/// 당일 기술적 지표 (피벗/VWAP).
///
/// 국내 대표 지수 시세로부터 파생됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntradayTechnicals {
    /// 산출 기준 심볼
    pub symbol: String,
    /// 피벗 (대표가: (고가+저가+현재가)/3)
    pub pivot: Decimal,
    /// VWAP. 업스트림이 거래대금을 제공하는 경우에만 채워집니다.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vwap: Option<Decimal>,
    /// 산출 시각
    pub computed_at: DateTime<Utc>,
}

impl IntradayTechnicals {
    /// 지수 시세로부터 기술적 지표를 파생합니다.
    pub fn from_quote(quote: &Quote) -> Self {
        Self {
            symbol: quote.symbol.clone(),
            pivot: quote.typical_price(),
            vwap: None,
            computed_at: quote.timestamp,
        }
    }
}

/// 서브 페치 실패 기록.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialFailure {
    /// 실패한 서브 결과
    pub source: SubResult,
    /// 실패 사유
    pub reason: String,
}

impl PartialFailure {
    /// 새 실패 기록을 생성합니다.
    pub fn new(source: SubResult, reason: impl Into<String>) -> Self {
        Self {
            source,
            reason: reason.into(),
        }
    }
}

/// 티어별 복합 컨텍스트 뷰.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketContext {
    /// 뷰 티어
    pub tier: Tier,
    /// 조립 시각
    pub generated_at: DateTime<Utc>,
    /// 국내 대표 지수 시세
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indices: Option<Vec<Quote>>,
    /// 섹터 성과 (섹터 ETF 시세)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sectors: Option<Vec<Quote>>,
    /// 당일 기술적 지표
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technicals: Option<IntradayTechnicals>,
    /// 글로벌 지수 시세
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_indices: Option<Vec<Quote>>,
    /// 시장 폭 스냅샷
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breadth: Option<BreadthSnapshot>,
}

impl MarketContext {
    /// 빈 복합 뷰를 생성합니다.
    pub fn new(tier: Tier, generated_at: DateTime<Utc>) -> Self {
        Self {
            tier,
            generated_at,
            indices: None,
            sectors: None,
            technicals: None,
            global_indices: None,
            breadth: None,
        }
    }

    /// 해당 서브 결과 슬롯이 채워져 있는지 확인합니다.
    pub fn has(&self, sub: SubResult) -> bool {
        match sub {
            SubResult::DomesticIndices => self.indices.is_some(),
            SubResult::SectorPerformance => self.sectors.is_some(),
            SubResult::Technicals => self.technicals.is_some(),
            SubResult::GlobalIndices => self.global_indices.is_some(),
            SubResult::Breadth => self.breadth.is_some(),
        }
    }

    /// 다른 복합 뷰에서 서브 결과를 복사해 옵니다 (형제 티어 재사용).
    ///
    /// 원본에 해당 슬롯이 채워져 있으면 복사 후 `true`를 반환합니다.
    pub fn adopt(&mut self, sub: SubResult, other: &MarketContext) -> bool {
        if !other.has(sub) {
            return false;
        }
        match sub {
            SubResult::DomesticIndices => self.indices = other.indices.clone(),
            SubResult::SectorPerformance => self.sectors = other.sectors.clone(),
            SubResult::Technicals => self.technicals = other.technicals.clone(),
            SubResult::GlobalIndices => self.global_indices = other.global_indices.clone(),
            SubResult::Breadth => self.breadth = other.breadth.clone(),
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn index_quote() -> Quote {
        Quote {
            symbol: "KOSPI".to_string(),
            name: Some("코스피".to_string()),
            last: dec!(2600.00),
            change_percent: dec!(0.42),
            volume: dec!(450000),
            open: dec!(2590.00),
            high: dec!(2612.00),
            low: dec!(2588.00),
            prev_close: dec!(2589.12),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_technicals_from_quote() {
        let quote = index_quote();
        let tech = IntradayTechnicals::from_quote(&quote);
        assert_eq!(tech.symbol, "KOSPI");
        // (2612 + 2588 + 2600) / 3 = 2600
        assert_eq!(tech.pivot, dec!(2600));
        assert!(tech.vwap.is_none());
    }

    #[test]
    fn test_has_tracks_slots() {
        let mut ctx = MarketContext::new(Tier::Primary, Utc::now());
        assert!(!ctx.has(SubResult::DomesticIndices));

        ctx.indices = Some(vec![index_quote()]);
        assert!(ctx.has(SubResult::DomesticIndices));
        assert!(!ctx.has(SubResult::Breadth));
    }

    #[test]
    fn test_adopt_copies_filled_slots_only() {
        let mut source = MarketContext::new(Tier::Intraday, Utc::now());
        source.technicals = Some(IntradayTechnicals::from_quote(&index_quote()));

        let mut target = MarketContext::new(Tier::Swing, Utc::now());
        assert!(target.adopt(SubResult::Technicals, &source));
        assert_eq!(target.technicals, source.technicals);

        // 비어 있는 슬롯은 복사되지 않음
        assert!(!target.adopt(SubResult::SectorPerformance, &source));
        assert!(target.sectors.is_none());
    }
}
