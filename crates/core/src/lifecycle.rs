//! 생명주기 상태 머신: 스코프별 hook/테스트 실행 순서 계약
//!
//! # 상태 전환
//! ```text
//! NotStarted → BeforeAll → {BeforeEach → TestBody → AfterEach}* → AfterAll → Done
//! ```
//!
//! `before_each` hook이 실패하면 본문을 건너뛰므로 `BeforeEach → AfterEach`도 허용됩니다.
//! 동시 실행 테스트 케이스는 스코프 상태를 [`Lifecycle::fork`]로 복제한 뒤
//! 각자의 `{BeforeEach → TestBody → AfterEach}` 구간을 독립적으로 진행합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SuiteError;

/// 생명주기 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// 시작 전
    NotStarted,
    /// 스코프 진입 시 한 번 실행되는 hook
    BeforeAll,
    /// 각 테스트 케이스 직전 hook
    BeforeEach,
    /// 테스트 본문
    TestBody,
    /// 각 테스트 케이스 직후 hook
    AfterEach,
    /// 스코프 종료 시 한 번 실행되는 hook
    AfterAll,
    /// 종료
    Done,
}

impl Phase {
    /// 메트릭 레이블 등에 쓰이는 정적 문자열
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::BeforeAll => "before-all",
            Self::BeforeEach => "before-each",
            Self::TestBody => "test-body",
            Self::AfterEach => "after-each",
            Self::AfterAll => "after-all",
            Self::Done => "done",
        }
    }

    /// `self → next` 전환이 허용되는지 확인합니다.
    pub fn can_transition_to(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Self::NotStarted, Self::BeforeAll)
                | (Self::BeforeAll, Self::BeforeEach)
                | (Self::BeforeAll, Self::AfterAll)
                | (Self::BeforeEach, Self::TestBody)
                | (Self::BeforeEach, Self::AfterEach)
                | (Self::TestBody, Self::AfterEach)
                | (Self::AfterEach, Self::BeforeEach)
                | (Self::AfterEach, Self::AfterAll)
                | (Self::AfterAll, Self::Done)
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 한 스코프(또는 동시 실행 케이스 하나)의 현재 단계
#[derive(Debug, Clone)]
pub struct Lifecycle {
    phase: Phase,
}

impl Lifecycle {
    /// `NotStarted` 상태로 생성합니다.
    pub fn new() -> Self {
        Self {
            phase: Phase::NotStarted,
        }
    }

    /// 현재 단계
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// 다음 단계로 전환합니다. 허용되지 않는 전환이면 에러를 반환합니다.
    pub fn advance(&mut self, next: Phase) -> Result<(), SuiteError> {
        if !self.phase.can_transition_to(next) {
            return Err(SuiteError::InvalidTransition {
                from: self.phase.to_string(),
                to: next.to_string(),
            });
        }
        self.phase = next;
        Ok(())
    }

    /// 동시 실행 워커용 복제본을 만듭니다.
    ///
    /// 복제본은 스코프의 현재 단계에서 출발하여 테스트 케이스 하나의
    /// each 구간만 진행합니다. 원본 스코프 상태는 바뀌지 않습니다.
    pub fn fork(&self) -> Self {
        self.clone()
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
