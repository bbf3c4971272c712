//! 에러 타입: 도메인별 에러 정의
//!
//! 테스트 케이스 수준의 실패는 [`AssertionFailure`] 하나뿐입니다.
//! 실패는 테스트 케이스 경계에서 수집되어 해당 케이스에만 기록되며,
//! 다른 케이스나 hook 실행으로 전파되지 않습니다.
//!
//! 러너 자체의 오류(설정, 스위트 구성, 워커 조인 실패)는 [`HooklineError`]로 표현합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// hookline 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum HooklineError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 스위트 구성/실행 에러
    #[error("suite error: {0}")]
    Suite(#[from] SuiteError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 스위트 구성 및 실행 에러
#[derive(Debug, thiserror::Error)]
pub enum SuiteError {
    /// 같은 스코프에 동일한 이름의 테스트가 이미 등록됨
    #[error("test already registered in '{scope}': {name}")]
    DuplicateTest { scope: String, name: String },

    /// 허용되지 않는 생명주기 상태 전환
    #[error("invalid lifecycle transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// 동시 실행 워커 조인 실패 (패닉 이외의 원인)
    #[error("concurrent worker failed: {0}")]
    WorkerJoin(String),

    /// 등록된 테스트가 하나도 없음
    #[error("suite '{0}' has no test cases")]
    Empty(String),
}

/// 기대값 검증 실패
///
/// `expect(...)` 단언, hook 실패, 그리고 테스트 본문에서 발생한 패닉이
/// 모두 이 타입으로 변환되어 테스트 결과에 기록됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionFailure {
    /// 사람이 읽을 수 있는 실패 메시지
    pub message: String,
    /// 기대값 (Debug 표현)
    pub expected: Option<String>,
    /// 실제값 (Debug 표현)
    pub actual: Option<String>,
}

impl AssertionFailure {
    /// 기대값/실제값 없이 메시지만으로 실패를 생성합니다.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            expected: None,
            actual: None,
        }
    }

    /// 기대값과 실제값을 포함한 실패를 생성합니다.
    pub fn mismatch(
        message: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            expected: Some(expected.into()),
            actual: Some(actual.into()),
        }
    }

    /// 메시지 앞에 실패 위치를 덧붙입니다.
    pub fn context(self, context: &str) -> Self {
        Self {
            message: format!("{context}: {}", self.message),
            ..self
        }
    }

    /// 패닉 페이로드를 실패로 변환합니다.
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let detail = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_owned()
        };
        Self::new(format!("panicked: {detail}"))
    }
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let (Some(expected), Some(actual)) = (&self.expected, &self.actual) {
            write!(f, " (expected: {expected}, actual: {actual})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AssertionFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assertion_failure_display_without_values() {
        let failure = AssertionFailure::new("boom");
        assert_eq!(failure.to_string(), "boom");
    }

    #[test]
    fn assertion_failure_display_with_values() {
        let failure = AssertionFailure::mismatch("values differ", "\"a\"", "\"b\"");
        assert_eq!(
            failure.to_string(),
            "values differ (expected: \"a\", actual: \"b\")"
        );
    }

    #[test]
    fn assertion_failure_from_str_panic() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("bad state");
        let failure = AssertionFailure::from_panic(payload.as_ref());
        assert_eq!(failure.message, "panicked: bad state");
    }

    #[test]
    fn assertion_failure_from_string_panic() {
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("index 3"));
        let failure = AssertionFailure::from_panic(payload.as_ref());
        assert_eq!(failure.message, "panicked: index 3");
    }

    #[test]
    fn assertion_failure_from_unknown_panic() {
        let payload: Box<dyn std::any::Any + Send> = Box::new(42_u8);
        let failure = AssertionFailure::from_panic(payload.as_ref());
        assert!(failure.message.contains("unknown panic payload"));
    }

    #[test]
    fn assertion_failure_context_keeps_values() {
        let failure = AssertionFailure::mismatch("values differ", "1", "2")
            .context("beforeEach hook failed");
        assert_eq!(failure.message, "beforeEach hook failed: values differ");
        assert_eq!(failure.expected.as_deref(), Some("1"));
        assert_eq!(failure.actual.as_deref(), Some("2"));
    }

    #[test]
    fn config_error_converts_to_hookline_error() {
        let err: HooklineError = ConfigError::InvalidValue {
            field: "runner.max_concurrency".to_owned(),
            reason: "must be greater than 0".to_owned(),
        }
        .into();
        assert!(matches!(err, HooklineError::Config(_)));
        assert!(err.to_string().contains("runner.max_concurrency"));
    }

    #[test]
    fn suite_error_display() {
        let err = SuiteError::InvalidTransition {
            from: "done".to_owned(),
            to: "before-each".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "invalid lifecycle transition: done -> before-each"
        );

        let err = SuiteError::DuplicateTest {
            scope: "user".to_owned(),
            name: "dup".to_owned(),
        };
        assert!(err.to_string().contains("already registered"));
        assert!(err.to_string().contains("dup"));
    }
}
