//! 시장 폭(Market Breadth) 계산기.
//!
//! 고정 구성 종목 바스켓의 시세를 국내 제공자에서 조회하여 상승/하락/
//! 보합을 분류합니다. 티어 키 공간과 분리된 자체 캐시 슬롯(기본 TTL
//! 60초)을 가지며, 이 슬롯의 유일한 작성자입니다.

use crate::error::{DataError, Result};
use crate::provider::QuoteProvider;
use context_core::{BreadthConfig, BreadthSnapshot, Quote};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// 캐시된 스냅샷과 저장 시각.
#[derive(Debug, Clone)]
struct CachedBreadth {
    snapshot: BreadthSnapshot,
    stored_at: Instant,
}

impl CachedBreadth {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

/// 시장 폭 계산기.
///
/// 동시 호출에 안전합니다. 갱신은 슬롯의 쓰기 락을 쥔 채 수행되므로,
/// 콜드 캐시에 동시에 도착한 호출자들은 진행 중인 한 번의 업스트림
/// 조회 결과를 공유합니다 (single-flight).
pub struct BreadthCalculator {
    provider: Arc<dyn QuoteProvider>,
    basket: Vec<String>,
    ttl: Duration,
    dead_band: Decimal,
    slot: RwLock<Option<CachedBreadth>>,
}

impl BreadthCalculator {
    /// 새 계산기를 생성합니다.
    pub fn new(
        provider: Arc<dyn QuoteProvider>,
        basket: Vec<String>,
        ttl: Duration,
        dead_band: Decimal,
    ) -> Self {
        Self {
            provider,
            basket,
            ttl,
            dead_band,
            slot: RwLock::new(None),
        }
    }

    /// 설정에서 계산기를 생성합니다.
    pub fn from_config(provider: Arc<dyn QuoteProvider>, config: &BreadthConfig) -> Result<Self> {
        if config.basket.is_empty() {
            return Err(DataError::ConfigError(
                "breadth basket must not be empty".to_string(),
            ));
        }
        let dead_band = Decimal::from_f64_retain(config.dead_band_pct)
            .ok_or_else(|| DataError::ConfigError("invalid dead band".to_string()))?;

        Ok(Self::new(
            provider,
            config.basket.clone(),
            Duration::from_secs(config.ttl_secs),
            dead_band,
        ))
    }

    /// 바스켓 구성 종목 목록.
    pub fn basket(&self) -> &[String] {
        &self.basket
    }

    /// 시장 폭 스냅샷 조회.
    ///
    /// 캐시가 신선하면 그대로 반환하고, 아니면 바스켓 전체 시세를 조회해
    /// 재계산합니다. 업스트림이 통째로 실패하면 에러 대신 기본 스냅샷
    /// (`BreadthSnapshot::fallback`)을 반환합니다. 기본 스냅샷도 캐시되어
    /// 죽은 업스트림을 TTL 주기마다 한 번만 찌르게 됩니다.
    #[instrument(skip(self), level = "debug")]
    pub async fn get_breadth(&self, force_refresh: bool) -> Result<BreadthSnapshot> {
        if !force_refresh {
            let slot = self.slot.read().await;
            if let Some(cached) = slot.as_ref() {
                if cached.is_fresh(self.ttl) {
                    return Ok(cached.snapshot.clone());
                }
            }
        }

        let mut slot = self.slot.write().await;
        // 쓰기 락 대기 중 다른 태스크가 이미 갱신했을 수 있음
        if !force_refresh {
            if let Some(cached) = slot.as_ref() {
                if cached.is_fresh(self.ttl) {
                    return Ok(cached.snapshot.clone());
                }
            }
        }

        let snapshot = self.compute().await;
        *slot = Some(CachedBreadth {
            snapshot: snapshot.clone(),
            stored_at: Instant::now(),
        });

        Ok(snapshot)
    }

    /// 바스켓 시세를 조회해 스냅샷을 계산합니다.
    async fn compute(&self) -> BreadthSnapshot {
        let quotes = match self.provider.fetch_quotes(&self.basket).await {
            Ok(quotes) => quotes,
            Err(e) => {
                // 시장 폭은 보조 신호 - 상위 응답을 실패시키지 않음
                warn!(error = %e, "바스켓 시세 조회 실패, 기본 스냅샷 반환");
                return BreadthSnapshot::fallback();
            }
        };

        let snapshot = self.classify(&quotes);
        debug!(
            advancing = snapshot.advancing,
            declining = snapshot.declining,
            unchanged = snapshot.unchanged,
            total = snapshot.total,
            ratio = %snapshot.ratio,
            "시장 폭 계산 완료"
        );
        snapshot
    }

    /// 데드밴드 기준 등락 분류.
    ///
    /// 조회에 실패한 (맵에 없는) 종목은 `total`에서 제외됩니다.
    fn classify(&self, quotes: &HashMap<String, Quote>) -> BreadthSnapshot {
        let mut advancing = 0u32;
        let mut declining = 0u32;
        let mut unchanged = 0u32;

        for symbol in &self.basket {
            let Some(quote) = quotes.get(symbol) else {
                continue;
            };
            if quote.change_percent > self.dead_band {
                advancing += 1;
            } else if quote.change_percent < -self.dead_band {
                declining += 1;
            } else {
                unchanged += 1;
            }
        }

        BreadthSnapshot::from_counts(advancing, declining, unchanged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use context_core::BreadthSource;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// 프로그래밍 가능한 테스트용 제공자.
    struct StubProvider {
        quotes: HashMap<String, Quote>,
        fail: AtomicBool,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn with_changes(changes: &[(&str, Decimal)]) -> Self {
            let quotes = changes
                .iter()
                .map(|(symbol, change)| {
                    let quote = Quote {
                        symbol: symbol.to_string(),
                        name: None,
                        last: dec!(100),
                        change_percent: *change,
                        volume: dec!(1000),
                        open: dec!(100),
                        high: dec!(101),
                        low: dec!(99),
                        prev_close: dec!(100),
                        timestamp: Utc::now(),
                    };
                    (symbol.to_string(), quote)
                })
                .collect();

            Self {
                quotes,
                fail: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QuoteProvider for StubProvider {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn fetch_quotes(&self, symbols: &[String]) -> Result<HashMap<String, Quote>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(DataError::FetchError("stub down".to_string()));
            }
            Ok(symbols
                .iter()
                .filter_map(|s| self.quotes.get(s).map(|q| (s.clone(), q.clone())))
                .collect())
        }
    }

    fn basket(symbols: &[&str]) -> Vec<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    fn calculator(provider: Arc<StubProvider>, symbols: &[&str]) -> BreadthCalculator {
        BreadthCalculator::new(
            provider,
            basket(symbols),
            Duration::from_secs(60),
            dec!(0.01),
        )
    }

    #[tokio::test]
    async fn test_classification_with_dead_band() {
        // +0.02는 +0.01 데드밴드를 넘으므로 상승, 0.0은 보합
        let provider = Arc::new(StubProvider::with_changes(&[
            ("A", dec!(0.5)),
            ("B", dec!(-0.3)),
            ("C", dec!(0.02)),
            ("D", dec!(-1.0)),
            ("E", dec!(0.0)),
        ]));
        let calc = calculator(Arc::clone(&provider), &["A", "B", "C", "D", "E"]);

        let snapshot = calc.get_breadth(false).await.unwrap();
        assert_eq!(snapshot.advancing, 2);
        assert_eq!(snapshot.declining, 2);
        assert_eq!(snapshot.unchanged, 1);
        assert_eq!(snapshot.total, 5);
        assert_eq!(snapshot.ratio, dec!(1));
        assert_eq!(snapshot.source, BreadthSource::Live);
    }

    #[tokio::test]
    async fn test_partial_basket_excluded_from_total() {
        // E는 제공자 응답에 없음 -> total에서 제외, 보합 아님
        let provider = Arc::new(StubProvider::with_changes(&[
            ("A", dec!(0.5)),
            ("B", dec!(-0.3)),
        ]));
        let calc = calculator(Arc::clone(&provider), &["A", "B", "E"]);

        let snapshot = calc.get_breadth(false).await.unwrap();
        assert_eq!(snapshot.total, 2);
        assert_eq!(snapshot.unchanged, 0);
        assert!(snapshot.is_consistent());
    }

    #[tokio::test]
    async fn test_total_failure_returns_fallback() {
        let provider = Arc::new(StubProvider::with_changes(&[]));
        provider.fail.store(true, Ordering::SeqCst);
        let calc = calculator(Arc::clone(&provider), &["A", "B", "C", "D", "E"]);

        let snapshot = calc.get_breadth(false).await.unwrap();
        assert_eq!(snapshot.source, BreadthSource::Fallback);
        assert_eq!(snapshot.total, 0);
        assert_eq!(snapshot.ratio, dec!(1.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_cached_within_ttl() {
        let provider = Arc::new(StubProvider::with_changes(&[("A", dec!(0.5))]));
        let calc = calculator(Arc::clone(&provider), &["A"]);

        calc.get_breadth(false).await.unwrap();
        calc.get_breadth(false).await.unwrap();
        assert_eq!(provider.call_count(), 1);

        // TTL 경과 후에는 재조회
        tokio::time::advance(Duration::from_secs(61)).await;
        calc.get_breadth(false).await.unwrap();
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_force_refresh_bypasses_cache() {
        let provider = Arc::new(StubProvider::with_changes(&[("A", dec!(0.5))]));
        let calc = calculator(Arc::clone(&provider), &["A"]);

        calc.get_breadth(false).await.unwrap();
        calc.get_breadth(true).await.unwrap();
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_from_config_rejects_empty_basket() {
        let provider = Arc::new(StubProvider::with_changes(&[]));
        let config = BreadthConfig {
            basket: vec![],
            ttl_secs: 60,
            dead_band_pct: 0.01,
        };
        assert!(BreadthCalculator::from_config(provider, &config).is_err());
    }
}
