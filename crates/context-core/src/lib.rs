//! # Context Core
//!
//! 시장 컨텍스트 엔진의 핵심 도메인 모델 및 정책 테이블을 제공합니다.
//!
//! 이 크레이트는 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 시세 스냅샷 (`Quote`)
//! - 시장 폭 스냅샷 (`BreadthSnapshot`)
//! - 티어 정의 및 TTL/의존성/재사용 정책 테이블 (`Tier`, `SubResult`)
//! - 복합 컨텍스트 뷰 (`MarketContext`)
//! - 시장 시계 (`MarketClock`)
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
