//! 설정 관리.
//!
//! 파일(TOML)과 환경 변수(`MCTX__` 접두사)에서 설정을 로드합니다.
//! 심볼 목록(지수/섹터/글로벌/시장폭 바스켓)은 외부에서 주입되는 값이며,
//! 기본값은 KRX 대표 종목 기준입니다.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContextConfig {
    /// 심볼 설정
    #[serde(default)]
    pub symbols: SymbolsConfig,
    /// 시장 폭 계산 설정
    #[serde(default)]
    pub breadth: BreadthConfig,
    /// 업스트림 페치 설정
    #[serde(default)]
    pub fetch: FetchConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 심볼 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SymbolsConfig {
    /// 국내 대표 지수 코드 (첫 번째 항목이 피벗/VWAP 산출 기준)
    pub indices: Vec<String>,
    /// 섹터 성과 조회용 섹터 ETF 코드
    pub sectors: Vec<String>,
    /// 글로벌 지수 심볼 (Yahoo Finance 표기)
    pub global_indices: Vec<String>,
}

impl Default for SymbolsConfig {
    fn default() -> Self {
        Self {
            indices: vec!["KOSPI".to_string(), "KOSDAQ".to_string()],
            sectors: vec![
                "091160".to_string(), // KODEX 반도체
                "091170".to_string(), // KODEX 은행
                "117460".to_string(), // KODEX 에너지화학
                "117680".to_string(), // KODEX 철강
                "117700".to_string(), // KODEX 건설
                "102970".to_string(), // KODEX 증권
                "140710".to_string(), // KODEX 운송
                "244580".to_string(), // KODEX 바이오
            ],
            global_indices: vec![
                "^IXIC".to_string(),
                "^GSPC".to_string(),
                "^DJI".to_string(),
            ],
        }
    }
}

/// 시장 폭(Breadth) 계산 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BreadthConfig {
    /// 구성 종목 바스켓 (고정 목록)
    #[serde(default = "default_basket")]
    pub basket: Vec<String>,
    /// 스냅샷 캐시 TTL (초)
    #[serde(default = "default_breadth_ttl")]
    pub ttl_secs: u64,
    /// 등락 분류 데드밴드 (%). 이 값 이하의 변동은 보합으로 분류합니다.
    /// 바스켓 크기와 무관하게 검증된 값은 아니므로 튜닝 가능한 상수로 둡니다.
    #[serde(default = "default_dead_band")]
    pub dead_band_pct: f64,
}

fn default_breadth_ttl() -> u64 {
    60
}
fn default_dead_band() -> f64 {
    0.01
}

impl Default for BreadthConfig {
    fn default() -> Self {
        Self {
            basket: default_basket(),
            ttl_secs: default_breadth_ttl(),
            dead_band_pct: default_dead_band(),
        }
    }
}

/// 기본 바스켓: KOSPI 시가총액 상위 50 종목.
fn default_basket() -> Vec<String> {
    [
        "005930", "000660", "373220", "207940", "005380", "005490", "035420", "000270",
        "105560", "055550", "051910", "006400", "035720", "028260", "012330", "068270",
        "066570", "032830", "015760", "086790", "003550", "017670", "034730", "030200",
        "009150", "316140", "018260", "010130", "033780", "096770", "011200", "323410",
        "034020", "090430", "003670", "047050", "010950", "024110", "042660", "009540",
        "086280", "000810", "161390", "097950", "006800", "251270", "036570", "352820",
        "377300", "259960",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// 업스트림 페치 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    /// 시세 배치 조회 타임아웃 (초)
    #[serde(default = "default_quote_timeout")]
    pub quote_timeout_secs: u64,
    /// 컨텍스트 조립 전체 타임아웃 (초)
    #[serde(default = "default_assembly_timeout")]
    pub assembly_timeout_secs: u64,
}

fn default_quote_timeout() -> u64 {
    5
}
fn default_assembly_timeout() -> u64 {
    10
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            quote_timeout_secs: default_quote_timeout(),
            assembly_timeout_secs: default_assembly_timeout(),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl ContextConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()))
            // 환경 변수로 오버라이드 (예: MCTX__BREADTH__TTL_SECS=120)
            .add_source(
                config::Environment::with_prefix("MCTX")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        Self::load("config/default.toml")
    }
}
