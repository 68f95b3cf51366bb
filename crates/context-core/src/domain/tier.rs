//! 티어 정의 및 정책 테이블.
//!
//! 각 티어의 캐시 키 버킷 단위, TTL, 서브 결과 의존성, 최소 필수 집합,
//! 형제 티어 재사용 경로를 정적 테이블로 정의합니다. 재사용 최적화가
//! 조건문 속에 숨지 않고 테이블로 드러나야 페치 로직과 분리해서 검증할
//! 수 있습니다.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// 컨텍스트 뷰 티어.
///
/// 캐시 키는 `{tier}:{time_bucket}` 형식으로, 버킷이 시간 경과에 따라
/// 자연스럽게 회전하므로 정상 만료에는 명시적 무효화가 필요 없습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// 주요 지수 요약 (분 단위 버킷)
    Primary,
    /// 섹터/기술적 상세 (5분 버킷)
    Detailed,
    /// 당일 단타용 (분 단위 버킷, 장중에만 제공)
    Intraday,
    /// 스윙 (시간 단위 버킷)
    Swing,
    /// 장기 (일 단위 버킷)
    LongTerm,
}

/// 복합 뷰를 구성하는 서브 결과의 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubResult {
    /// 국내 대표 지수 시세
    DomesticIndices,
    /// 섹터 성과 (섹터 ETF 시세)
    SectorPerformance,
    /// 피벗/VWAP 등 당일 기술적 지표
    Technicals,
    /// 글로벌 지수 시세
    GlobalIndices,
    /// 시장 폭 스냅샷
    Breadth,
}

impl fmt::Display for SubResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DomesticIndices => "DomesticIndices",
            Self::SectorPerformance => "SectorPerformance",
            Self::Technicals => "Technicals",
            Self::GlobalIndices => "GlobalIndices",
            Self::Breadth => "Breadth",
        };
        write!(f, "{}", s)
    }
}

impl Tier {
    /// 전체 티어 목록.
    pub const ALL: [Tier; 5] = [
        Tier::Primary,
        Tier::Detailed,
        Tier::Intraday,
        Tier::Swing,
        Tier::LongTerm,
    ];

    /// 현재 시각을 티어의 버킷 단위로 내림한 문자열.
    pub fn bucket(&self, now: DateTime<Utc>) -> String {
        match self {
            // 분 단위
            Tier::Primary | Tier::Intraday => now.format("%Y%m%d%H%M").to_string(),
            // 5분 블록
            Tier::Detailed => {
                let minute = now.minute() - now.minute() % 5;
                format!("{}{:02}", now.format("%Y%m%d%H"), minute)
            }
            // 시간 단위
            Tier::Swing => now.format("%Y%m%d%H").to_string(),
            // 일 단위
            Tier::LongTerm => now.format("%Y%m%d").to_string(),
        }
    }

    /// 캐시 키 생성.
    ///
    /// 형식: `{tier}:{time_bucket}`
    pub fn cache_key(&self, now: DateTime<Utc>) -> String {
        format!("{}:{}", self, self.bucket(now))
    }

    /// 개장 여부에 따른 동적 TTL.
    ///
    /// 실시간 가격을 추적하는 티어(Primary/Detailed/Intraday)는 장 마감
    /// 후 허용 staleness가 크게 넓어집니다. Intraday는 장 마감 중 제공되지
    /// 않으며(Aggregator가 거부), 여기서는 장중 TTL만 의미가 있습니다.
    pub fn ttl(&self, market_open: bool) -> Duration {
        let secs = match (self, market_open) {
            (Tier::Primary, true) => 60,
            (Tier::Primary, false) => 1800,
            (Tier::Detailed, true) => 300,
            (Tier::Detailed, false) => 3600,
            (Tier::Intraday, _) => 30,
            (Tier::Swing, _) => 300,
            (Tier::LongTerm, _) => 900,
        };
        Duration::from_secs(secs)
    }

    /// 이 티어가 필요로 하는 서브 결과 목록.
    pub fn dependencies(&self) -> &'static [SubResult] {
        match self {
            Tier::Primary => &[
                SubResult::DomesticIndices,
                SubResult::GlobalIndices,
                SubResult::Breadth,
            ],
            Tier::Detailed => &[
                SubResult::DomesticIndices,
                SubResult::SectorPerformance,
                SubResult::GlobalIndices,
                SubResult::Breadth,
            ],
            Tier::Intraday => &[SubResult::DomesticIndices, SubResult::Technicals],
            Tier::Swing => &[SubResult::SectorPerformance, SubResult::Technicals],
            Tier::LongTerm => &[
                SubResult::DomesticIndices,
                SubResult::SectorPerformance,
                SubResult::GlobalIndices,
                SubResult::Breadth,
            ],
        }
    }

    /// 최소 필수 집합.
    ///
    /// 이 서브 결과들이 전부 실패하면 복합 뷰는 에러로 응답하며
    /// 캐시되지 않습니다. 나머지 실패는 `PartialFailure`로 흡수됩니다.
    pub fn required(&self) -> &'static [SubResult] {
        match self {
            Tier::Primary | Tier::Intraday | Tier::LongTerm => &[SubResult::DomesticIndices],
            Tier::Detailed => &[SubResult::DomesticIndices, SubResult::SectorPerformance],
            Tier::Swing => &[SubResult::SectorPerformance],
        }
    }

    /// 형제 티어 재사용 테이블: (서브 결과, 재사용 후보 티어 목록).
    ///
    /// 후보 티어의 현재 버킷 캐시 엔트리가 유효하고 해당 서브 결과를
    /// 담고 있으면 업스트림 호출 대신 그 값을 재사용합니다. 탐색은 후보
    /// 티어의 *현재* 버킷 키로만 이뤄집니다 - 이전 버킷의 엔트리는 TTL이
    /// 남아 있어도 재사용 대상이 아닙니다 (버킷 경계가 곧 신선도 경계).
    pub fn reuse_sources(&self) -> &'static [(SubResult, &'static [Tier])] {
        match self {
            Tier::Swing => &[
                (SubResult::Technicals, &[Tier::Intraday]),
                (SubResult::SectorPerformance, &[Tier::Detailed]),
            ],
            Tier::LongTerm => &[
                (SubResult::SectorPerformance, &[Tier::Detailed, Tier::Swing]),
                (SubResult::GlobalIndices, &[Tier::Primary, Tier::Detailed]),
            ],
            _ => &[],
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tier::Primary => "primary",
            Tier::Detailed => "detailed",
            Tier::Intraday => "intraday",
            Tier::Swing => "swing",
            Tier::LongTerm => "longterm",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "primary" => Ok(Tier::Primary),
            "detailed" => Ok(Tier::Detailed),
            "intraday" => Ok(Tier::Intraday),
            "swing" => Ok(Tier::Swing),
            "longterm" | "long_term" => Ok(Tier::LongTerm),
            _ => Err(format!("Unknown tier: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, h, m, 42).unwrap()
    }

    #[test]
    fn test_bucket_granularity() {
        let now = at(10, 23);
        assert_eq!(Tier::Primary.bucket(now), "202503141023");
        assert_eq!(Tier::Intraday.bucket(now), "202503141023");
        // 5분 블록으로 내림: 23 -> 20
        assert_eq!(Tier::Detailed.bucket(now), "202503141020");
        assert_eq!(Tier::Swing.bucket(now), "2025031410");
        assert_eq!(Tier::LongTerm.bucket(now), "20250314");
    }

    #[test]
    fn test_cache_key_format() {
        let now = at(10, 23);
        assert_eq!(Tier::Primary.cache_key(now), "primary:202503141023");
        assert_eq!(Tier::LongTerm.cache_key(now), "longterm:20250314");
    }

    #[test]
    fn test_bucket_rotates_keys() {
        let key_a = Tier::Primary.cache_key(at(10, 23));
        let key_b = Tier::Primary.cache_key(at(10, 24));
        assert_ne!(key_a, key_b);

        // 같은 5분 블록 안에서는 동일 키
        assert_eq!(
            Tier::Detailed.cache_key(at(10, 21)),
            Tier::Detailed.cache_key(at(10, 24))
        );
    }

    #[test]
    fn test_ttl_table() {
        assert_eq!(Tier::Primary.ttl(true), Duration::from_secs(60));
        assert_eq!(Tier::Primary.ttl(false), Duration::from_secs(1800));
        assert_eq!(Tier::Detailed.ttl(true), Duration::from_secs(300));
        assert_eq!(Tier::Detailed.ttl(false), Duration::from_secs(3600));
        assert_eq!(Tier::Intraday.ttl(true), Duration::from_secs(30));
        // Swing/LongTerm은 개장 여부와 무관
        assert_eq!(Tier::Swing.ttl(true), Tier::Swing.ttl(false));
        assert_eq!(Tier::LongTerm.ttl(true), Duration::from_secs(900));
    }

    #[test]
    fn test_required_is_subset_of_dependencies() {
        for tier in Tier::ALL {
            for sub in tier.required() {
                assert!(
                    tier.dependencies().contains(sub),
                    "{} requires {} but does not depend on it",
                    tier,
                    sub
                );
            }
        }
    }

    #[test]
    fn test_reuse_table() {
        let swing: Vec<_> = Tier::Swing.reuse_sources().iter().map(|(s, _)| *s).collect();
        assert!(swing.contains(&SubResult::Technicals));
        assert!(swing.contains(&SubResult::SectorPerformance));

        assert!(Tier::Primary.reuse_sources().is_empty());
        assert!(Tier::Intraday.reuse_sources().is_empty());
    }

    #[test]
    fn test_from_str_roundtrip() {
        for tier in Tier::ALL {
            assert_eq!(tier.to_string().parse::<Tier>().unwrap(), tier);
        }
        assert!("scalping".parse::<Tier>().is_err());
    }
}
