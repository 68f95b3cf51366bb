//! 캐싱 레이어.
//!
//! 단일 프로세스 인메모리 TTL 캐시입니다. 프로세스 간 일관성은 요구되지
//! 않으며, 다중 인스턴스 실행 시 인스턴스별 staleness 편차는 설계상
//! 허용됩니다.

pub mod tier;

pub use tier::{CacheEntry, TierCache};
