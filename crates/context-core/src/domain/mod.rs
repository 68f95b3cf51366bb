//! 도메인 모델.
//!
//! - `Quote` - 개별 종목/지수 시세 스냅샷
//! - `BreadthSnapshot` - 시장 폭 (등락 비율) 스냅샷
//! - `Tier` / `SubResult` - 티어 정의 및 TTL/의존성/재사용 정책 테이블
//! - `MarketContext` - 티어별 복합 컨텍스트 뷰
//! - `MarketClock` - 시장 개장 여부 및 현재 시각 제공자

pub mod breadth;
pub mod clock;
pub mod context;
pub mod quote;
pub mod tier;

pub use breadth::{BreadthSnapshot, BreadthSource};
pub use clock::{FixedClock, KrxMarketClock, MarketClock};
pub use context::{IntradayTechnicals, MarketContext, PartialFailure};
pub use quote::Quote;
pub use tier::{SubResult, Tier};
