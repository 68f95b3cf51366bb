//! 컨텍스트 조립기.
//!
//! 티어별 정책 테이블(`Tier`)에 따라 서브 페치를 동시 실행하고, 결과를
//! 하나의 `MarketContext`로 조립해 캐시합니다. 조립 순서는 항상
//! 캐시 확인 -> 형제 티어 재사용 -> 업스트림 페치 -> 필수 집합 검증 ->
//! 캐시 저장입니다.
//!
//! 부분 실패 정책: 필수 집합(`Tier::required`) 이외의 서브 페치 실패는
//! 응답을 막지 않고 `PartialFailure` 목록으로 보고됩니다. 필수 집합이
//! 비면 에러로 응답하며, 그 결과는 캐시되지 않습니다 (다음 요청이 즉시
//! 재시도).

use crate::breadth::BreadthCalculator;
use crate::cache::TierCache;
use crate::error::DataError;
use crate::provider::QuoteProvider;
use context_core::{
    ContextConfig, ContextError, ContextResult, IntradayTechnicals, MarketClock, MarketContext,
    PartialFailure, Quote, SubResult, Tier,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// 조립기 설정.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// 국내 대표 지수 코드 (첫 번째 항목이 기술적 지표 산출 기준)
    pub index_symbols: Vec<String>,
    /// 섹터 ETF 코드
    pub sector_symbols: Vec<String>,
    /// 글로벌 지수 심볼
    pub global_symbols: Vec<String>,
    /// 서브 페치별 타임아웃
    pub quote_timeout: Duration,
    /// 조립 전체 타임아웃
    pub assembly_timeout: Duration,
}

impl AggregatorConfig {
    /// 애플리케이션 설정에서 조립기 설정을 구성합니다.
    pub fn from_context_config(config: &ContextConfig) -> Self {
        Self {
            index_symbols: config.symbols.indices.clone(),
            sector_symbols: config.symbols.sectors.clone(),
            global_symbols: config.symbols.global_indices.clone(),
            quote_timeout: Duration::from_secs(config.fetch.quote_timeout_secs),
            assembly_timeout: Duration::from_secs(config.fetch.assembly_timeout_secs),
        }
    }
}

/// 티어별 시장 컨텍스트 조립기.
///
/// 모든 티어가 하나의 캐시 인스턴스를 공유하므로, 한 티어가 만든
/// 서브 결과를 다른 티어가 재사용할 수 있습니다.
pub struct ContextAggregator {
    domestic: Arc<dyn QuoteProvider>,
    global: Arc<dyn QuoteProvider>,
    breadth: Arc<BreadthCalculator>,
    clock: Arc<dyn MarketClock>,
    cache: TierCache<MarketContext>,
    config: AggregatorConfig,
}

impl ContextAggregator {
    /// 새 조립기를 생성합니다.
    pub fn new(
        domestic: Arc<dyn QuoteProvider>,
        global: Arc<dyn QuoteProvider>,
        breadth: Arc<BreadthCalculator>,
        clock: Arc<dyn MarketClock>,
        config: AggregatorConfig,
    ) -> Self {
        Self {
            domestic,
            global,
            breadth,
            clock,
            cache: TierCache::new(),
            config,
        }
    }

    /// 티어별 시장 컨텍스트 조회.
    ///
    /// 캐시 적중 시 `(컨텍스트, 빈 실패 목록)`을 반환합니다.
    /// `force_refresh`는 캐시 확인을 건너뛰고 새로 조립한 뒤 덮어씁니다.
    ///
    /// Intraday 티어는 장중에만 제공됩니다 (휴장 시 `MarketClosed`).
    #[instrument(skip(self), fields(tier = %tier, force_refresh))]
    pub async fn get_context(
        &self,
        tier: Tier,
        force_refresh: bool,
    ) -> ContextResult<(MarketContext, Vec<PartialFailure>)> {
        let now = self.clock.now();
        let market_open = self.clock.is_market_open(now);

        if tier == Tier::Intraday && !market_open {
            return Err(ContextError::MarketClosed(tier));
        }

        let key = tier.cache_key(now);
        if !force_refresh {
            if let Some(cached) = self.cache.get(&key).await {
                debug!(key = %key, "캐시 적중");
                return Ok((cached, Vec::new()));
            }
        }

        let (ctx, failures) = tokio::time::timeout(
            self.config.assembly_timeout,
            self.assemble(tier, force_refresh),
        )
        .await
        .map_err(|_| ContextError::Timeout(format!("{} context assembly timed out", tier)))?;

        // 필수 집합이 비면 에러 응답이며 캐시하지 않음
        if let Some(missing) = tier.required().iter().find(|sub| !ctx.has(**sub)) {
            warn!(tier = %tier, missing = %missing, "필수 서브 결과 누락");
            return Err(ContextError::InsufficientData {
                tier,
                missing: missing.to_string(),
            });
        }

        self.cache
            .set(key, ctx.clone(), tier.ttl(market_open))
            .await;

        if !failures.is_empty() {
            info!(
                tier = %tier,
                failed = failures.len(),
                "부분 실패를 포함한 컨텍스트 조립 완료"
            );
        }

        Ok((ctx, failures))
    }

    /// 시장 폭 스냅샷 직접 조회.
    pub async fn get_breadth(
        &self,
        force_refresh: bool,
    ) -> ContextResult<context_core::BreadthSnapshot> {
        Ok(self.breadth.get_breadth(force_refresh).await?)
    }

    /// 캐시된 컨텍스트 엔트리 수.
    pub async fn cached_contexts(&self) -> usize {
        self.cache.len().await
    }

    /// 만료 엔트리를 일괄 제거합니다.
    pub async fn purge_expired(&self) -> usize {
        self.cache.purge_expired().await
    }

    /// 서브 페치를 동시 실행해 복합 뷰를 조립합니다.
    ///
    /// `force_refresh`는 형제 티어 재사용도 건너뛰고 전부 새로 조회합니다.
    async fn assemble(
        &self,
        tier: Tier,
        force_refresh: bool,
    ) -> (MarketContext, Vec<PartialFailure>) {
        let now = self.clock.now();
        let mut ctx = MarketContext::new(tier, now);
        let mut failures = Vec::new();

        if !force_refresh {
            self.adopt_from_siblings(tier, now, &mut ctx).await;
        }

        let deps = tier.dependencies();
        let needs = |sub: SubResult| deps.contains(&sub) && !ctx.has(sub);

        let need_technicals = needs(SubResult::Technicals);
        // 기술적 지표는 지수 시세에서 파생되므로, Technicals만 필요한
        // 티어도 지수 배치를 조회합니다
        let need_indices = needs(SubResult::DomesticIndices) || need_technicals;
        let need_sectors = needs(SubResult::SectorPerformance);
        let need_global = needs(SubResult::GlobalIndices);
        let need_breadth = needs(SubResult::Breadth);

        let (indices_res, sectors_res, global_res, breadth_res) = tokio::join!(
            self.fetch_slot(need_indices, &self.config.index_symbols, &self.domestic),
            self.fetch_slot(need_sectors, &self.config.sector_symbols, &self.domestic),
            self.fetch_slot(need_global, &self.config.global_symbols, &self.global),
            async {
                if need_breadth {
                    // 다른 서브 페치와 동일하게 개별 타임아웃 적용 - 시장 폭
                    // 업스트림이 멈춰도 전체 조립을 막지 않음
                    let guarded = tokio::time::timeout(
                        self.config.quote_timeout,
                        self.breadth.get_breadth(false),
                    )
                    .await;
                    Some(match guarded {
                        Ok(result) => result,
                        Err(_) => Err(DataError::Timeout(
                            "breadth refresh timed out".to_string(),
                        )),
                    })
                } else {
                    None
                }
            },
        );

        let index_quotes = Self::settle_quotes(
            SubResult::DomesticIndices,
            &self.config.index_symbols,
            indices_res,
            deps.contains(&SubResult::DomesticIndices),
            &mut failures,
        );
        if deps.contains(&SubResult::DomesticIndices) {
            ctx.indices = index_quotes.clone();
        }

        if need_technicals {
            match index_quotes.as_ref().and_then(|quotes| quotes.first()) {
                Some(quote) => ctx.technicals = Some(IntradayTechnicals::from_quote(quote)),
                None => failures.push(PartialFailure::new(
                    SubResult::Technicals,
                    "no index quote available to derive pivot",
                )),
            }
        }

        // 재사용으로 채워진 슬롯을 덮어쓰지 않도록 페치한 경우에만 대입
        if need_sectors {
            ctx.sectors = Self::settle_quotes(
                SubResult::SectorPerformance,
                &self.config.sector_symbols,
                sectors_res,
                true,
                &mut failures,
            );
        }

        if need_global {
            ctx.global_indices = Self::settle_quotes(
                SubResult::GlobalIndices,
                &self.config.global_symbols,
                global_res,
                true,
                &mut failures,
            );
        }

        match breadth_res {
            Some(Ok(snapshot)) => ctx.breadth = Some(snapshot),
            Some(Err(e)) => failures.push(PartialFailure::new(SubResult::Breadth, e.to_string())),
            None => {}
        }

        (ctx, failures)
    }

    /// 형제 티어의 현재 버킷 캐시에서 서브 결과를 복사해 옵니다.
    async fn adopt_from_siblings(
        &self,
        tier: Tier,
        now: chrono::DateTime<chrono::Utc>,
        ctx: &mut MarketContext,
    ) {
        for (sub, candidates) in tier.reuse_sources() {
            if ctx.has(*sub) {
                continue;
            }
            for candidate in *candidates {
                let key = candidate.cache_key(now);
                if let Some(sibling) = self.cache.get(&key).await {
                    if ctx.adopt(*sub, &sibling) {
                        debug!(sub = %sub, from = %candidate, "형제 티어 캐시 재사용");
                        break;
                    }
                }
            }
        }
    }

    /// 조건부 시세 배치 조회 (서브 페치별 타임아웃 적용).
    async fn fetch_slot(
        &self,
        wanted: bool,
        symbols: &[String],
        provider: &Arc<dyn QuoteProvider>,
    ) -> Option<crate::error::Result<HashMap<String, Quote>>> {
        if !wanted {
            return None;
        }
        match tokio::time::timeout(self.config.quote_timeout, provider.fetch_quotes(symbols)).await
        {
            Ok(result) => Some(result),
            Err(_) => Some(Err(DataError::Timeout(format!(
                "{} quote fetch timed out",
                provider.name()
            )))),
        }
    }

    /// 배치 결과를 요청 심볼 순서의 목록으로 정리합니다.
    ///
    /// 응답에 없는 심볼은 건너뛰며, 결과가 없거나 에러면 (기록 대상일 때)
    /// `PartialFailure`를 남기고 `None`을 반환합니다.
    fn settle_quotes(
        sub: SubResult,
        symbols: &[String],
        outcome: Option<crate::error::Result<HashMap<String, Quote>>>,
        record: bool,
        failures: &mut Vec<PartialFailure>,
    ) -> Option<Vec<Quote>> {
        let mut quotes = match outcome? {
            Ok(quotes) => quotes,
            Err(e) => {
                if record {
                    warn!(sub = %sub, error = %e, "서브 페치 실패");
                    failures.push(PartialFailure::new(sub, e.to_string()));
                }
                return None;
            }
        };

        // 요청 순서를 유지해 복합 뷰 직렬화가 결정적이 되도록 함
        let ordered: Vec<Quote> = symbols
            .iter()
            .filter_map(|symbol| quotes.remove(symbol))
            .collect();

        if ordered.is_empty() {
            if record {
                failures.push(PartialFailure::new(sub, "no symbols returned"));
            }
            return None;
        }

        Some(ordered)
    }
}
