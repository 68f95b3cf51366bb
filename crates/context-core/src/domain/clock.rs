//! 시장 시계.
//!
//! 개장 여부와 현재 시각을 제공합니다. TTL 정책과 캐시 키 버킷이 모두
//! 시계에 의존하므로, 테스트에서 주입할 수 있도록 트레잇으로 분리합니다.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::Asia::Seoul;

/// 시장 시계 트레잇.
pub trait MarketClock: Send + Sync {
    /// 현재 시각 (UTC).
    fn now(&self) -> DateTime<Utc>;

    /// 주어진 시각에 시장이 개장 중인지 확인합니다.
    fn is_market_open(&self, at: DateTime<Utc>) -> bool;
}

/// KRX 정규장 시계.
///
/// 거래 시간: 평일 09:00 - 15:30 KST. 공휴일 달력 조회는 인증이 필요한
/// 외부 API이므로 이 시계의 범위 밖입니다 (주말/장시간 체크만 수행).
#[derive(Debug, Clone, Copy, Default)]
pub struct KrxMarketClock;

impl KrxMarketClock {
    /// 새 KRX 시계를 생성합니다.
    pub fn new() -> Self {
        Self
    }
}

impl MarketClock for KrxMarketClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn is_market_open(&self, at: DateTime<Utc>) -> bool {
        let kst = at.with_timezone(&Seoul);

        // 주말은 항상 휴장
        if matches!(kst.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }

        // 09:00 ~ 15:30
        let minute_of_day = kst.hour() * 60 + kst.minute();
        (9 * 60..=15 * 60 + 30).contains(&minute_of_day)
    }
}

/// 고정 시계 (테스트용).
///
/// `now`와 개장 여부를 원하는 값으로 고정합니다.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
    open: bool,
}

impl FixedClock {
    /// 주어진 시각/개장 상태로 고정된 시계를 생성합니다.
    pub fn new(now: DateTime<Utc>, open: bool) -> Self {
        Self { now, open }
    }

    /// 개장 상태로 고정된 시계.
    pub fn open_at(now: DateTime<Utc>) -> Self {
        Self::new(now, true)
    }

    /// 휴장 상태로 고정된 시계.
    pub fn closed_at(now: DateTime<Utc>) -> Self {
        Self::new(now, false)
    }
}

impl MarketClock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn is_market_open(&self, _at: DateTime<Utc>) -> bool {
        self.open
    }
}
