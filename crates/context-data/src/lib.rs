//! 시장 컨텍스트 데이터 레이어.
//!
//! 시세 제공자(국내 네이버 폴링, 글로벌 Yahoo Finance), TTL 캐시,
//! 시장 폭 계산기, 티어별 컨텍스트 조립기를 제공합니다.
//!
//! ```no_run
//! use context_data::{
//!     AggregatorConfig, BreadthCalculator, ContextAggregator, NaverQuoteProvider,
//!     YahooQuoteProvider,
//! };
//! use context_core::{ContextConfig, KrxMarketClock, Tier};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ContextConfig::default();
//! let domestic = Arc::new(NaverQuoteProvider::new(std::time::Duration::from_secs(5))?);
//! let global = Arc::new(YahooQuoteProvider::new()?);
//! let breadth = Arc::new(BreadthCalculator::from_config(
//!     domestic.clone(),
//!     &config.breadth,
//! )?);
//!
//! let aggregator = ContextAggregator::new(
//!     domestic,
//!     global,
//!     breadth,
//!     Arc::new(KrxMarketClock::new()),
//!     AggregatorConfig::from_context_config(&config),
//! );
//!
//! let (_context, _failures) = aggregator.get_context(Tier::Primary, false).await?;
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod breadth;
pub mod cache;
pub mod error;
pub mod provider;

pub use aggregator::{AggregatorConfig, ContextAggregator};
pub use breadth::BreadthCalculator;
pub use cache::TierCache;
pub use error::{DataError, Result};
pub use provider::{NaverQuoteProvider, QuoteProvider, YahooQuoteProvider};
