//! 설정 관리: hookline.toml 파싱 및 런타임 설정
//!
//! [`HooklineConfig`]는 로깅과 러너 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`HOOKLINE_RUNNER_MAX_CONCURRENCY=8` 형식)
//! 3. 설정 파일 (`hookline.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), hookline_core::error::HooklineError> {
//! use hookline_core::config::HooklineConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = HooklineConfig::load("hookline.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = HooklineConfig::parse("[runner]\nfixture_mode = \"isolated\"")?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, HooklineError};

/// hookline 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HooklineConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 러너 설정
    #[serde(default)]
    pub runner: RunnerConfig,
}

impl HooklineConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, HooklineError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 파일이 없으면 기본값에서 출발하는 [`load`](Self::load)
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, HooklineError> {
        let path = path.as_ref();
        match Self::from_file(path).await {
            Ok(mut config) => {
                config.apply_env_overrides();
                config.validate()?;
                Ok(config)
            }
            Err(HooklineError::Config(ConfigError::FileNotFound { .. })) => {
                tracing::debug!(path = %path.display(), "config file not found, using defaults");
                let mut config = Self::default();
                config.apply_env_overrides();
                config.validate()?;
                Ok(config)
            }
            Err(e) => Err(e),
        }
    }

    /// TOML 파일을 파싱만 합니다 (환경변수 오버라이드, 검증 없음).
    ///
    /// 검증은 오버라이드가 끝난 뒤 [`load`](Self::load)에서 한 번 수행합니다.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, HooklineError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                HooklineError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                HooklineError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, HooklineError> {
        toml::from_str(toml_str).map_err(|e| {
            HooklineError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `HOOKLINE_{SECTION}_{FIELD}`
    /// 예: `HOOKLINE_RUNNER_FIXTURE_MODE=isolated`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "HOOKLINE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "HOOKLINE_GENERAL_LOG_FORMAT");

        // Runner
        override_usize(
            &mut self.runner.max_concurrency,
            "HOOKLINE_RUNNER_MAX_CONCURRENCY",
        );
        override_parsed(&mut self.runner.fixture_mode, "HOOKLINE_RUNNER_FIXTURE_MODE");
        override_optional_string(&mut self.runner.filter, "HOOKLINE_RUNNER_FILTER");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), HooklineError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        self.runner.validate()
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 최대 동시 실행 수 상한
pub const MAX_CONCURRENCY_LIMIT: usize = 1024;

/// 러너 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// 동시에 실행할 수 있는 concurrent 테스트 케이스 수
    pub max_concurrency: usize,
    /// fixture 공유 방식
    pub fixture_mode: FixtureMode,
    /// 전체 이름에 이 문자열이 포함된 테스트만 실행
    pub filter: Option<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 5,
            fixture_mode: FixtureMode::Shared,
            filter: None,
        }
    }
}

impl RunnerConfig {
    /// 러너 섹션만 검증합니다.
    pub fn validate(&self) -> Result<(), HooklineError> {
        if self.max_concurrency == 0 || self.max_concurrency > MAX_CONCURRENCY_LIMIT {
            return Err(ConfigError::InvalidValue {
                field: "runner.max_concurrency".to_owned(),
                reason: format!("must be between 1 and {MAX_CONCURRENCY_LIMIT}"),
            }
            .into());
        }

        if self.filter.as_deref().is_some_and(|f| f.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "runner.filter".to_owned(),
                reason: "filter must not be blank".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// fixture 공유 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixtureMode {
    /// 스코프 트리가 fixture 하나를 공유합니다.
    /// hook과 본문이 각각 잠금을 잡으므로 concurrent 케이스끼리 끼어들 수 있습니다.
    #[default]
    Shared,
    /// 테스트 케이스마다 `before_all` 이후 상태의 복제본을 받습니다.
    Isolated,
}

impl fmt::Display for FixtureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shared => write!(f, "shared"),
            Self::Isolated => write!(f, "isolated"),
        }
    }
}

impl FromStr for FixtureMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shared" => Ok(Self::Shared),
            "isolated" => Ok(Self::Isolated),
            other => Err(ConfigError::InvalidValue {
                field: "runner.fixture_mode".to_owned(),
                reason: format!("unknown mode '{other}', expected 'shared' or 'isolated'"),
            }),
        }
    }
}

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_optional_string(target: &mut Option<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = if val.is_empty() { None } else { Some(val) };
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_parsed<T: FromStr>(target: &mut T, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse value from env var, ignoring"
            ),
        }
    }
}
