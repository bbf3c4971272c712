//! 실행 결과: 테스트별 결과, 생명주기 타임라인, 집계

use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AssertionFailure;
use crate::lifecycle::Phase;

/// 테스트 케이스 최종 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// 테스트 케이스 하나의 결과
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    /// 테스트 이름
    pub name: String,
    /// 루트부터의 스코프 경로
    pub path: Vec<String>,
    /// 최종 상태
    pub status: TestStatus,
    /// 동시 실행 여부
    pub concurrent: bool,
    /// 실패 원인 (실패한 경우에만)
    pub failure: Option<AssertionFailure>,
    /// hook 포함 소요 시간 (밀리초)
    pub duration_ms: u64,
}

impl TestResult {
    /// `scope > child > name` 형식의 전체 이름
    pub fn full_name(&self) -> String {
        let mut parts = self.path.clone();
        parts.push(self.name.clone());
        parts.join(" > ")
    }

    pub(crate) fn skipped(name: &str, path: &[String], concurrent: bool) -> Self {
        Self {
            name: name.to_owned(),
            path: path.to_vec(),
            status: TestStatus::Skipped,
            concurrent,
            failure: None,
            duration_ms: 0,
        }
    }
}

/// 특정 테스트에 귀속되지 않는 스코프 수준 실패 (`after_all` hook 실패)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeFailure {
    /// 실패한 스코프 경로
    pub path: Vec<String>,
    /// 실패한 단계
    pub phase: Phase,
    /// 실패 원인
    pub failure: AssertionFailure,
}

/// 타임라인 이벤트: 실제 실행된 생명주기 단계 기록
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// 기록 순서
    pub seq: u64,
    /// 실행된 단계
    pub phase: Phase,
    /// hook이 속한 스코프 이름
    pub scope: String,
    /// 관련 테스트 이름 (each 단계와 본문)
    pub test: Option<String>,
}

/// 스레드 안전한 타임라인 기록기
///
/// 동시 실행 워커들이 같은 인스턴스에 기록하므로 순서는 실제 실행 순서를 따릅니다.
#[derive(Debug, Default)]
pub struct Timeline {
    events: Mutex<Vec<TimelineEvent>>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// 이벤트를 기록합니다.
    pub fn record(&self, phase: Phase, scope: &str, test: Option<&str>) {
        let mut events = self
            .events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let seq = events.len() as u64;
        events.push(TimelineEvent {
            seq,
            phase,
            scope: scope.to_owned(),
            test: test.map(str::to_owned),
        });
    }

    /// 지금까지 기록된 이벤트의 복사본
    pub fn snapshot(&self) -> Vec<TimelineEvent> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

/// 스위트 전체 실행 결과
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    /// 실행 식별자
    pub run_id: Uuid,
    /// 루트 스위트 이름
    pub suite: String,
    /// 등록 순서대로 정렬된 테스트 결과
    pub results: Vec<TestResult>,
    /// 스코프 수준 실패
    pub scope_failures: Vec<ScopeFailure>,
    /// 생명주기 타임라인
    pub timeline: Vec<TimelineEvent>,
    /// 루트 스코프의 최종 단계 (정상 종료 시 `Done`)
    pub state: Phase,
    /// 전체 소요 시간 (밀리초)
    pub duration_ms: u64,
}

impl SuiteReport {
    /// 통과한 테스트 수
    pub fn passed(&self) -> usize {
        self.count(TestStatus::Passed)
    }

    /// 실패한 테스트 수
    pub fn failed(&self) -> usize {
        self.count(TestStatus::Failed)
    }

    /// 건너뛴 테스트 수
    pub fn skipped(&self) -> usize {
        self.count(TestStatus::Skipped)
    }

    fn count(&self, status: TestStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// 실패한 테스트도, 스코프 실패도 없으면 `true`
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.scope_failures.is_empty()
    }

    /// 이름으로 첫 번째 결과를 찾습니다.
    pub fn result(&self, name: &str) -> Option<&TestResult> {
        self.results.iter().find(|r| r.name == name)
    }

    /// 특정 단계의 타임라인 이벤트만 추립니다.
    pub fn events_for(&self, phase: Phase) -> Vec<&TimelineEvent> {
        self.timeline.iter().filter(|e| e.phase == phase).collect()
    }
}

pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
