//! 테스트 러너 (생명주기 시퀀서)
//!
//! [`Runner`]는 [`Suite`]를 받아 hook과 테스트 본문을 정해진 순서로 실행하고
//! 테스트별 결과를 [`SuiteReport`]로 돌려줍니다.
//!
//! # 실행 순서 (스코프마다)
//! ```text
//! before_all → { before_each → body → after_each }* → after_all
//! ```
//!
//! - 순차 케이스는 등록 순서대로 하나씩 실행됩니다.
//! - 연속된 concurrent 케이스는 한 묶음으로 blocking 풀에 배치되고
//!   (`max_concurrency` 제한), 묶음이 모두 끝난 뒤 다음 항목으로 넘어갑니다.
//! - 중첩 스코프의 `before_each`는 바깥 → 안쪽, `after_each`는 안쪽 → 바깥 순서입니다.
//! - 단언 실패와 패닉은 테스트 케이스 경계에서 잡혀 해당 케이스에만 기록됩니다.
//!   `after_each`와 `after_all`은 실패 여부와 상관없이 실행됩니다.

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{FixtureMode, RunnerConfig};
use crate::error::{AssertionFailure, HooklineError, SuiteError};
use crate::lifecycle::{Lifecycle, Phase};
use crate::metrics as m;
use crate::report::{ScopeFailure, SuiteReport, TestResult, TestStatus, Timeline, millis};
use crate::suite::{CaseMode, Entry, HookFn, Outcome, Scope, Suite, TestCase};

/// Boxed future 타입 별칭 (재귀 스코프 실행용)
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 생명주기 시퀀서
#[derive(Debug, Clone)]
pub struct Runner {
    config: RunnerConfig,
}

impl Runner {
    /// 러너 설정으로 생성합니다.
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// 스위트를 실행합니다.
    ///
    /// 단언 실패는 결과에 기록될 뿐 에러로 반환되지 않습니다.
    /// `Err`는 설정 오류, 잘못된 스위트 구성, 워커 조인 실패 같은 러너 자체의 문제입니다.
    ///
    /// `F: Clone`은 `isolated` 모드에서 테스트마다 fixture를 복제하기 위해 필요합니다.
    pub async fn run<F>(&self, suite: Suite<F>) -> Result<SuiteReport, HooklineError>
    where
        F: Clone + Send + 'static,
    {
        self.config.validate()?;
        suite.validate()?;

        let Suite { scope, fixture } = suite;

        let state = Arc::new(RunState {
            timeline: Timeline::new(),
            semaphore: Arc::new(Semaphore::new(self.config.max_concurrency)),
            mode: self.config.fixture_mode,
            filter: self.config.filter.clone(),
            only: scope.has_only(),
        });

        let root = ScopeContext {
            path: Vec::new(),
            each: Arc::from(Vec::new()),
            fixture: Arc::new(Mutex::new(fixture)),
        };

        let suite_name = scope.name.clone();
        info!(
            suite = %suite_name,
            cases = scope.case_count(),
            mode = %state.mode,
            max_concurrency = self.config.max_concurrency,
            "running suite"
        );

        let started = Instant::now();
        let mut out = Collector::default();
        let final_phase = run_scope(scope, &root, &state, &mut out).await?;
        let elapsed = started.elapsed();

        metrics::counter!(m::SUITES_TOTAL).increment(1);
        metrics::histogram!(m::SUITE_DURATION_SECONDS).record(elapsed.as_secs_f64());

        let report = SuiteReport {
            run_id: Uuid::new_v4(),
            suite: suite_name,
            results: out.results,
            scope_failures: out.scope_failures,
            timeline: state.timeline.snapshot(),
            state: final_phase,
            duration_ms: millis(elapsed),
        };

        info!(
            suite = %report.suite,
            passed = report.passed(),
            failed = report.failed(),
            skipped = report.skipped(),
            duration_ms = report.duration_ms,
            "suite finished"
        );

        Ok(report)
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(RunnerConfig::default())
    }
}

// ─── 내부 실행 상태 ──────────────────────────────────────────────────

struct RunState {
    timeline: Timeline,
    semaphore: Arc<Semaphore>,
    mode: FixtureMode,
    filter: Option<String>,
    only: bool,
}

impl RunState {
    fn is_skipped<F>(&self, case: &TestCase<F>, path: &[String]) -> bool {
        if case.mode == CaseMode::Skip {
            return true;
        }
        if self.only && case.mode != CaseMode::Only {
            return true;
        }
        match &self.filter {
            Some(filter) => !full_name(path, &case.name).contains(filter.as_str()),
            None => false,
        }
    }

    /// 테스트 케이스 하나가 사용할 fixture
    fn case_fixture<F: Clone>(&self, scope_fixture: &Arc<Mutex<F>>) -> Arc<Mutex<F>> {
        match self.mode {
            FixtureMode::Shared => Arc::clone(scope_fixture),
            FixtureMode::Isolated => {
                let snapshot = lock(scope_fixture).clone();
                Arc::new(Mutex::new(snapshot))
            }
        }
    }
}

/// 스코프 하나의 each hook
struct EachHooks<F> {
    scope: String,
    before: Vec<HookFn<F>>,
    after: Vec<HookFn<F>>,
}

impl<F> Clone for EachHooks<F> {
    fn clone(&self) -> Self {
        Self {
            scope: self.scope.clone(),
            before: self.before.clone(),
            after: self.after.clone(),
        }
    }
}

struct ScopeContext<F> {
    path: Vec<String>,
    /// 루트부터 현재 스코프까지의 each hook (바깥 → 안쪽)
    each: Arc<[EachHooks<F>]>,
    fixture: Arc<Mutex<F>>,
}

#[derive(Default)]
struct Collector {
    results: Vec<TestResult>,
    scope_failures: Vec<ScopeFailure>,
}

/// concurrent 묶음에 쌓인 케이스
enum Pending<F> {
    Run(TestCase<F>),
    Skip(TestCase<F>),
}

/// 묶음 결과 자리 (등록 순서 유지)
enum Slot {
    Done(TestResult),
    Running(tokio::task::JoinHandle<Result<TestResult, SuiteError>>),
}

/// 워커로 넘길 테스트 케이스 실행 단위
struct CaseJob<F> {
    case: TestCase<F>,
    path: Vec<String>,
    each: Arc<[EachHooks<F>]>,
    fixture: Arc<Mutex<F>>,
}

// ─── 스코프 실행 ─────────────────────────────────────────────────────

fn run_scope<'a, F>(
    scope: Scope<F>,
    parent: &'a ScopeContext<F>,
    state: &'a Arc<RunState>,
    out: &'a mut Collector,
) -> BoxFuture<'a, Result<Phase, HooklineError>>
where
    F: Clone + Send + 'static,
{
    Box::pin(async move {
        let Scope {
            name,
            hooks,
            entries,
            ..
        } = scope;

        let mut path = parent.path.clone();
        path.push(name.clone());

        let mut lifecycle = Lifecycle::new();
        lifecycle.advance(Phase::BeforeAll)?;

        // 실행할 케이스가 없으면 before_all/after_all도 건너뜀
        if !any_runnable(&entries, &path, state) {
            debug!(scope = %name, "no runnable test cases, skipping scope hooks");
            mark_skipped(&entries, &path, out);
            lifecycle.advance(Phase::AfterAll)?;
            lifecycle.advance(Phase::Done)?;
            return Ok(lifecycle.phase());
        }

        state.timeline.record(Phase::BeforeAll, &name, None);
        debug!(scope = %name, "beforeAll");
        let before_all_failure = run_scope_hooks(
            hooks.before_all,
            Phase::BeforeAll,
            Arc::clone(&parent.fixture),
            true,
        )
        .await?;

        let mut each: Vec<EachHooks<F>> = parent.each.iter().cloned().collect();
        each.push(EachHooks {
            scope: name.clone(),
            before: hooks.before_each.clone(),
            after: hooks.after_each.clone(),
        });
        let ctx = ScopeContext {
            path: path.clone(),
            each: Arc::from(each),
            fixture: Arc::clone(&parent.fixture),
        };

        match before_all_failure {
            Some(failure) => {
                warn!(scope = %name, error = %failure, "beforeAll hook failed, failing scope");
                let failure = failure.context("beforeAll hook failed");
                mark_failed(&entries, &path, state, &failure, out);
            }
            None => run_entries(entries, &ctx, &mut lifecycle, state, out).await?,
        }

        lifecycle.advance(Phase::AfterAll)?;
        state.timeline.record(Phase::AfterAll, &name, None);
        debug!(scope = %name, "afterAll");
        if let Some(failure) = run_scope_hooks(
            hooks.after_all,
            Phase::AfterAll,
            Arc::clone(&parent.fixture),
            false,
        )
        .await?
        {
            warn!(scope = %name, error = %failure, "afterAll hook failed");
            out.scope_failures.push(ScopeFailure {
                path,
                phase: Phase::AfterAll,
                failure: failure.context("afterAll hook failed"),
            });
        }

        lifecycle.advance(Phase::Done)?;
        Ok(lifecycle.phase())
    })
}

async fn run_entries<F>(
    entries: Vec<Entry<F>>,
    ctx: &ScopeContext<F>,
    lifecycle: &mut Lifecycle,
    state: &Arc<RunState>,
    out: &mut Collector,
) -> Result<(), HooklineError>
where
    F: Clone + Send + 'static,
{
    let mut batch: Vec<Pending<F>> = Vec::new();

    for entry in entries {
        match entry {
            // 건너뛴 concurrent 케이스는 묶음을 끊지 않고 자리만 차지함
            Entry::Case(case) if case.concurrent && state.is_skipped(&case, &ctx.path) => {
                batch.push(Pending::Skip(case));
            }
            Entry::Case(case) if state.is_skipped(&case, &ctx.path) => {
                run_batch(std::mem::take(&mut batch), ctx, lifecycle, state, out).await?;
                out.results.push(skip_case(&case, &ctx.path));
            }
            Entry::Case(case) if case.concurrent => batch.push(Pending::Run(case)),
            Entry::Case(case) => {
                run_batch(std::mem::take(&mut batch), ctx, lifecycle, state, out).await?;
                let job = CaseJob {
                    case,
                    path: ctx.path.clone(),
                    each: Arc::clone(&ctx.each),
                    fixture: state.case_fixture(&ctx.fixture),
                };
                let mut worker = lifecycle.fork();
                let shared = Arc::clone(state);
                let (result, worker) = tokio::task::spawn_blocking(move || {
                    let result = execute_case(&job, &mut worker, &shared);
                    (result, worker)
                })
                .await
                .map_err(|e| SuiteError::WorkerJoin(e.to_string()))?;
                *lifecycle = worker;
                out.results.push(result?);
            }
            Entry::Scope(child) => {
                run_batch(std::mem::take(&mut batch), ctx, lifecycle, state, out).await?;
                run_scope(child, ctx, state, out).await?;
            }
        }
    }

    run_batch(batch, ctx, lifecycle, state, out).await
}

/// 연속된 concurrent 케이스 묶음을 실행하고 모두 끝날 때까지 기다립니다.
///
/// 결과는 완료 순서와 상관없이 등록 순서대로 수집됩니다.
async fn run_batch<F>(
    batch: Vec<Pending<F>>,
    ctx: &ScopeContext<F>,
    lifecycle: &Lifecycle,
    state: &Arc<RunState>,
    out: &mut Collector,
) -> Result<(), HooklineError>
where
    F: Clone + Send + 'static,
{
    if batch.is_empty() {
        return Ok(());
    }
    debug!(size = batch.len(), "dispatching concurrent batch");

    let mut slots = Vec::with_capacity(batch.len());
    for pending in batch {
        let case = match pending {
            Pending::Skip(case) => {
                slots.push(Slot::Done(skip_case(&case, &ctx.path)));
                continue;
            }
            Pending::Run(case) => case,
        };
        let permit = Arc::clone(&state.semaphore)
            .acquire_owned()
            .await
            .map_err(|e| SuiteError::WorkerJoin(e.to_string()))?;
        let job = CaseJob {
            case,
            path: ctx.path.clone(),
            each: Arc::clone(&ctx.each),
            fixture: state.case_fixture(&ctx.fixture),
        };
        let mut worker = lifecycle.fork();
        let state = Arc::clone(state);
        slots.push(Slot::Running(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            execute_case(&job, &mut worker, &state)
        })));
    }

    for slot in slots {
        let result = match slot {
            Slot::Done(result) => result,
            Slot::Running(handle) => handle
                .await
                .map_err(|e| SuiteError::WorkerJoin(e.to_string()))??,
        };
        out.results.push(result);
    }
    Ok(())
}

fn skip_case<F>(case: &TestCase<F>, path: &[String]) -> TestResult {
    debug!(test = %case.name, "skipped");
    metrics::counter!(m::TESTS_TOTAL, m::LABEL_STATUS => "skipped").increment(1);
    TestResult::skipped(&case.name, path, case.concurrent)
}

// ─── 테스트 케이스 실행 ──────────────────────────────────────────────

fn execute_case<F>(
    job: &CaseJob<F>,
    lifecycle: &mut Lifecycle,
    state: &RunState,
) -> Result<TestResult, SuiteError> {
    let started = Instant::now();
    let test = job.case.name.as_str();
    let scope = job.path.last().map(String::as_str).unwrap_or_default();
    let mut failure: Option<AssertionFailure> = None;

    lifecycle.advance(Phase::BeforeEach)?;
    'outer: for hooks in job.each.iter() {
        if hooks.before.is_empty() {
            continue;
        }
        state
            .timeline
            .record(Phase::BeforeEach, &hooks.scope, Some(test));
        debug!(scope = %hooks.scope, test, "beforeEach");
        for hook in &hooks.before {
            if let Err(f) = run_hook(hook, Phase::BeforeEach, &job.fixture) {
                failure = Some(f.context("beforeEach hook failed"));
                break 'outer;
            }
        }
    }

    if failure.is_none() {
        lifecycle.advance(Phase::TestBody)?;
        state.timeline.record(Phase::TestBody, scope, Some(test));
        debug!(scope, test, concurrent = job.case.concurrent, "running test");
        if let Err(f) = guarded(job.case.body.as_ref(), &job.fixture) {
            failure = Some(f);
        }
    }

    lifecycle.advance(Phase::AfterEach)?;
    for hooks in job.each.iter().rev() {
        if hooks.after.is_empty() {
            continue;
        }
        state
            .timeline
            .record(Phase::AfterEach, &hooks.scope, Some(test));
        debug!(scope = %hooks.scope, test, "afterEach");
        for hook in &hooks.after {
            if let Err(f) = run_hook(hook, Phase::AfterEach, &job.fixture) {
                if failure.is_none() {
                    failure = Some(f.context("afterEach hook failed"));
                }
            }
        }
    }

    let (status, label) = match &failure {
        Some(f) => {
            warn!(scope, test, error = %f, "test failed");
            (TestStatus::Failed, "failed")
        }
        None => {
            debug!(scope, test, "test passed");
            (TestStatus::Passed, "passed")
        }
    };
    metrics::counter!(m::TESTS_TOTAL, m::LABEL_STATUS => label).increment(1);

    Ok(TestResult {
        name: job.case.name.clone(),
        path: job.path.clone(),
        status,
        concurrent: job.case.concurrent,
        failure,
        duration_ms: millis(started.elapsed()),
    })
}

/// before_all / after_all hook 목록을 blocking 풀에서 실행합니다.
///
/// `stop_on_failure`가 `true`면 첫 실패에서 멈춥니다 (before_all).
/// 아니면 남은 hook을 모두 실행하고 첫 실패만 돌려줍니다 (after_all).
async fn run_scope_hooks<F>(
    hooks: Vec<HookFn<F>>,
    phase: Phase,
    fixture: Arc<Mutex<F>>,
    stop_on_failure: bool,
) -> Result<Option<AssertionFailure>, SuiteError>
where
    F: Send + 'static,
{
    if hooks.is_empty() {
        return Ok(None);
    }
    tokio::task::spawn_blocking(move || {
        let mut first = None;
        for hook in &hooks {
            if let Err(f) = run_hook(hook, phase, &fixture) {
                if first.is_none() {
                    first = Some(f);
                }
                if stop_on_failure {
                    break;
                }
            }
        }
        first
    })
    .await
    .map_err(|e| SuiteError::WorkerJoin(e.to_string()))
}

fn run_hook<F>(hook: &HookFn<F>, phase: Phase, fixture: &Mutex<F>) -> Outcome {
    metrics::counter!(m::HOOKS_EXECUTED_TOTAL, m::LABEL_PHASE => phase.as_str()).increment(1);
    let outcome = guarded(hook.as_ref(), fixture);
    if outcome.is_err() {
        metrics::counter!(m::HOOK_FAILURES_TOTAL, m::LABEL_PHASE => phase.as_str()).increment(1);
    }
    outcome
}

/// fixture 잠금을 잡고 hook/본문을 실행합니다. 패닉은 실패로 변환됩니다.
fn guarded<F>(f: &(dyn Fn(&mut F) -> Outcome + Send + Sync), fixture: &Mutex<F>) -> Outcome {
    let mut guard = lock(fixture);
    match panic::catch_unwind(AssertUnwindSafe(|| f(&mut *guard))) {
        Ok(outcome) => outcome,
        Err(payload) => Err(AssertionFailure::from_panic(payload.as_ref())),
    }
}

fn lock<F>(fixture: &Mutex<F>) -> std::sync::MutexGuard<'_, F> {
    fixture.lock().unwrap_or_else(PoisonError::into_inner)
}

fn full_name(path: &[String], name: &str) -> String {
    let mut parts: Vec<&str> = path.iter().map(String::as_str).collect();
    parts.push(name);
    parts.join(" > ")
}

fn any_runnable<F>(entries: &[Entry<F>], path: &[String], state: &RunState) -> bool {
    entries.iter().any(|entry| match entry {
        Entry::Case(case) => !state.is_skipped(case, path),
        Entry::Scope(child) => {
            let mut child_path = path.to_vec();
            child_path.push(child.name.clone());
            any_runnable(&child.entries, &child_path, state)
        }
    })
}

fn mark_skipped<F>(entries: &[Entry<F>], path: &[String], out: &mut Collector) {
    for entry in entries {
        match entry {
            Entry::Case(case) => {
                metrics::counter!(m::TESTS_TOTAL, m::LABEL_STATUS => "skipped").increment(1);
                out.results
                    .push(TestResult::skipped(&case.name, path, case.concurrent));
            }
            Entry::Scope(child) => {
                let mut child_path = path.to_vec();
                child_path.push(child.name.clone());
                mark_skipped(&child.entries, &child_path, out);
            }
        }
    }
}

/// before_all 실패 시 스코프의 모든 실행 대상 케이스를 실패로 기록합니다.
fn mark_failed<F>(
    entries: &[Entry<F>],
    path: &[String],
    state: &RunState,
    failure: &AssertionFailure,
    out: &mut Collector,
) {
    for entry in entries {
        match entry {
            Entry::Case(case) if state.is_skipped(case, path) => {
                metrics::counter!(m::TESTS_TOTAL, m::LABEL_STATUS => "skipped").increment(1);
                out.results
                    .push(TestResult::skipped(&case.name, path, case.concurrent));
            }
            Entry::Case(case) => {
                metrics::counter!(m::TESTS_TOTAL, m::LABEL_STATUS => "failed").increment(1);
                out.results.push(TestResult {
                    name: case.name.clone(),
                    path: path.to_vec(),
                    status: TestStatus::Failed,
                    concurrent: case.concurrent,
                    failure: Some(failure.clone()),
                    duration_ms: 0,
                });
            }
            Entry::Scope(child) => {
                let mut child_path = path.to_vec();
                child_path.push(child.name.clone());
                mark_failed(&child.entries, &child_path, state, failure, out);
            }
        }
    }
}
