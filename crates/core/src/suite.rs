//! 스위트 정의: hook 등록, 테스트 케이스 등록, 중첩 스코프
//!
//! [`Suite`]는 실행 계획만 담습니다. 실제 실행은 [`Runner`](crate::runner::Runner)가 합니다.
//!
//! # 사용 예시
//! ```
//! use hookline_core::expect::expect;
//! use hookline_core::suite::Suite;
//! use hookline_core::user::User;
//!
//! let mut suite = Suite::new("user", User::new("test@test.com"));
//! suite
//!     .before_each(|user| {
//!         *user = User::new("test@test.com");
//!         Ok(())
//!     })
//!     .it_concurrent("should update the email", |user| {
//!         user.update_email("test2@test.com");
//!         expect(user.email()).to_be("test2@test.com")
//!     })
//!     .it("should store the provided email value", |user| {
//!         expect(user.email()).to_be("test@test.com")
//!     });
//! assert_eq!(suite.case_count(), 2);
//! ```

use std::collections::HashSet;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{AssertionFailure, SuiteError};

/// hook 또는 테스트 본문의 실행 결과
pub type Outcome = Result<(), AssertionFailure>;

/// fixture를 가변 참조로 받는 hook
pub type HookFn<F> = Arc<dyn Fn(&mut F) -> Outcome + Send + Sync>;

/// fixture를 가변 참조로 받는 테스트 본문
pub type TestFn<F> = Arc<dyn Fn(&mut F) -> Outcome + Send + Sync>;

/// 테스트 케이스 실행 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseMode {
    /// 일반 실행
    Run,
    /// 건너뜀 (hook도 실행하지 않음)
    Skip,
    /// 스위트 트리에 `Only`가 하나라도 있으면 `Only` 케이스만 실행
    Only,
}

impl fmt::Display for CaseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run => write!(f, "run"),
            Self::Skip => write!(f, "skip"),
            Self::Only => write!(f, "only"),
        }
    }
}

/// 등록된 테스트 케이스 디스크립터
///
/// `concurrent`는 스케줄러가 해석하는 메타데이터일 뿐입니다.
/// hook 격리 계약은 스케줄링 방식과 무관하게 유지됩니다.
pub struct TestCase<F> {
    pub(crate) name: String,
    pub(crate) body: TestFn<F>,
    pub(crate) concurrent: bool,
    pub(crate) mode: CaseMode,
}

impl<F> TestCase<F> {
    /// 테스트 이름
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 동시 실행 허용 여부
    pub fn is_concurrent(&self) -> bool {
        self.concurrent
    }
}

impl<F> fmt::Debug for TestCase<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("concurrent", &self.concurrent)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// 스코프 하나에 등록된 hook 묶음
///
/// 같은 종류의 hook이 여러 개면 등록 순서대로 실행됩니다.
pub(crate) struct Hooks<F> {
    pub(crate) before_all: Vec<HookFn<F>>,
    pub(crate) before_each: Vec<HookFn<F>>,
    pub(crate) after_each: Vec<HookFn<F>>,
    pub(crate) after_all: Vec<HookFn<F>>,
}

impl<F> Default for Hooks<F> {
    fn default() -> Self {
        Self {
            before_all: Vec::new(),
            before_each: Vec::new(),
            after_each: Vec::new(),
            after_all: Vec::new(),
        }
    }
}

/// 스코프 안의 항목 (등록 순서 보존)
pub(crate) enum Entry<F> {
    Case(TestCase<F>),
    Scope(Scope<F>),
}

/// 루트 테스트 스위트: 최상위 [`Scope`]와 그 스코프 트리가 공유할 fixture
///
/// 빌더 메서드는 [`Scope`]에 있으며 `Deref`로 그대로 호출할 수 있습니다.
pub struct Suite<F> {
    pub(crate) scope: Scope<F>,
    pub(crate) fixture: F,
}

impl<F> Suite<F> {
    /// 초기 fixture와 함께 루트 스위트를 생성합니다.
    pub fn new(name: impl Into<String>, fixture: F) -> Self {
        Self {
            scope: Scope::new(name, false),
            fixture,
        }
    }
}

impl<F> Deref for Suite<F> {
    type Target = Scope<F>;

    fn deref(&self) -> &Scope<F> {
        &self.scope
    }
}

impl<F> DerefMut for Suite<F> {
    fn deref_mut(&mut self) -> &mut Scope<F> {
        &mut self.scope
    }
}

impl<F> fmt::Debug for Suite<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// hook과 테스트 케이스를 담는 스코프 (루트 또는 `describe`로 만든 중첩 스코프)
///
/// fixture는 루트 [`Suite`]만 소유하며, 모든 스코프가 그것을 공유합니다.
pub struct Scope<F> {
    pub(crate) name: String,
    pub(crate) concurrent: bool,
    pub(crate) hooks: Hooks<F>,
    pub(crate) entries: Vec<Entry<F>>,
}

impl<F> Scope<F> {
    fn new(name: impl Into<String>, concurrent: bool) -> Self {
        Self {
            name: name.into(),
            concurrent,
            hooks: Hooks::default(),
            entries: Vec::new(),
        }
    }

    /// 스코프 이름
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 스코프 전체가 동시 실행으로 표시되었는지 여부
    pub fn is_concurrent(&self) -> bool {
        self.concurrent
    }

    /// 스코프에서 한 번, 모든 테스트보다 먼저 실행될 hook을 등록합니다.
    pub fn before_all<H>(&mut self, hook: H) -> &mut Self
    where
        H: Fn(&mut F) -> Outcome + Send + Sync + 'static,
    {
        self.hooks.before_all.push(Arc::new(hook));
        self
    }

    /// 각 테스트 케이스 직전에 실행될 hook을 등록합니다.
    pub fn before_each<H>(&mut self, hook: H) -> &mut Self
    where
        H: Fn(&mut F) -> Outcome + Send + Sync + 'static,
    {
        self.hooks.before_each.push(Arc::new(hook));
        self
    }

    /// 각 테스트 케이스 직후에 실행될 hook을 등록합니다. 테스트가 실패해도 실행됩니다.
    pub fn after_each<H>(&mut self, hook: H) -> &mut Self
    where
        H: Fn(&mut F) -> Outcome + Send + Sync + 'static,
    {
        self.hooks.after_each.push(Arc::new(hook));
        self
    }

    /// 스코프의 모든 테스트가 끝난 뒤 한 번 실행될 hook을 등록합니다.
    pub fn after_all<H>(&mut self, hook: H) -> &mut Self
    where
        H: Fn(&mut F) -> Outcome + Send + Sync + 'static,
    {
        self.hooks.after_all.push(Arc::new(hook));
        self
    }

    /// 순차 테스트 케이스를 등록합니다.
    pub fn it<T>(&mut self, name: impl Into<String>, body: T) -> &mut Self
    where
        T: Fn(&mut F) -> Outcome + Send + Sync + 'static,
    {
        self.push_case(name.into(), Arc::new(body), false, CaseMode::Run)
    }

    /// 동시 실행 가능한 테스트 케이스를 등록합니다.
    pub fn it_concurrent<T>(&mut self, name: impl Into<String>, body: T) -> &mut Self
    where
        T: Fn(&mut F) -> Outcome + Send + Sync + 'static,
    {
        self.push_case(name.into(), Arc::new(body), true, CaseMode::Run)
    }

    /// 건너뛸 테스트 케이스를 등록합니다.
    pub fn it_skip<T>(&mut self, name: impl Into<String>, body: T) -> &mut Self
    where
        T: Fn(&mut F) -> Outcome + Send + Sync + 'static,
    {
        self.push_case(name.into(), Arc::new(body), false, CaseMode::Skip)
    }

    /// 단독 실행 테스트 케이스를 등록합니다.
    pub fn it_only<T>(&mut self, name: impl Into<String>, body: T) -> &mut Self
    where
        T: Fn(&mut F) -> Outcome + Send + Sync + 'static,
    {
        self.push_case(name.into(), Arc::new(body), false, CaseMode::Only)
    }

    /// 중첩 스코프를 등록합니다. 등록 위치에서 실행됩니다.
    pub fn describe<B>(&mut self, name: impl Into<String>, build: B) -> &mut Self
    where
        B: FnOnce(&mut Scope<F>),
    {
        let mut child = Scope::new(name, self.concurrent);
        build(&mut child);
        self.entries.push(Entry::Scope(child));
        self
    }

    /// 모든 테스트 케이스가 동시 실행으로 표시되는 중첩 스코프를 등록합니다.
    pub fn describe_concurrent<B>(&mut self, name: impl Into<String>, build: B) -> &mut Self
    where
        B: FnOnce(&mut Scope<F>),
    {
        let mut child = Scope::new(name, true);
        build(&mut child);
        self.entries.push(Entry::Scope(child));
        self
    }

    fn push_case(
        &mut self,
        name: String,
        body: TestFn<F>,
        concurrent: bool,
        mode: CaseMode,
    ) -> &mut Self {
        self.entries.push(Entry::Case(TestCase {
            name,
            body,
            concurrent: concurrent || self.concurrent,
            mode,
        }));
        self
    }

    /// 이 스코프와 하위 스코프에 등록된 테스트 케이스 수
    pub fn case_count(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| match entry {
                Entry::Case(_) => 1,
                Entry::Scope(child) => child.case_count(),
            })
            .sum()
    }

    /// 트리 어딘가에 `Only` 케이스가 있는지 확인합니다.
    pub(crate) fn has_only(&self) -> bool {
        self.entries.iter().any(|entry| match entry {
            Entry::Case(case) => case.mode == CaseMode::Only,
            Entry::Scope(child) => child.has_only(),
        })
    }

    /// 실행 전 구조를 검증합니다.
    ///
    /// - 테스트 케이스가 하나 이상 있어야 합니다.
    /// - 같은 스코프 안에서 테스트 이름이 중복되면 안 됩니다.
    pub fn validate(&self) -> Result<(), SuiteError> {
        if self.case_count() == 0 {
            return Err(SuiteError::Empty(self.name.clone()));
        }
        self.validate_names()
    }

    fn validate_names(&self) -> Result<(), SuiteError> {
        let mut seen = HashSet::new();
        for entry in &self.entries {
            match entry {
                Entry::Case(case) => {
                    if !seen.insert(case.name.as_str()) {
                        return Err(SuiteError::DuplicateTest {
                            scope: self.name.clone(),
                            name: case.name.clone(),
                        });
                    }
                }
                Entry::Scope(child) => child.validate_names()?,
            }
        }
        Ok(())
    }
}

impl<F> fmt::Debug for Scope<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("name", &self.name)
            .field("concurrent", &self.concurrent)
            .field("cases", &self.case_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut u32) -> Outcome {
        Ok(())
    }

    #[test]
    fn registration_preserves_order() {
        let mut suite = Suite::new("root", 0_u32);
        suite.it("a", noop).it_concurrent("b", noop).it("c", noop);

        let names: Vec<&str> = suite
            .entries
            .iter()
            .filter_map(|entry| match entry {
                Entry::Case(case) => Some(case.name()),
                Entry::Scope(_) => None,
            })
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn concurrent_flag_is_metadata_on_case() {
        let mut suite = Suite::new("root", 0_u32);
        suite.it("seq", noop).it_concurrent("par", noop);

        let flags: Vec<bool> = suite
            .entries
            .iter()
            .filter_map(|entry| match entry {
                Entry::Case(case) => Some(case.is_concurrent()),
                Entry::Scope(_) => None,
            })
            .collect();
        assert_eq!(flags, vec![false, true]);
    }

    #[test]
    fn describe_concurrent_marks_all_children() {
        let mut suite = Suite::new("root", 0_u32);
        suite.describe_concurrent("group", |s| {
            s.it("x", noop).it("y", noop);
            s.describe("inner", |inner| {
                inner.it("z", noop);
            });
        });

        let Entry::Scope(group) = &suite.entries[0] else {
            panic!("expected nested scope");
        };
        assert!(group.is_concurrent());
        let Entry::Scope(inner) = &group.entries[2] else {
            panic!("expected inner scope");
        };
        assert!(inner.is_concurrent());
        let Entry::Case(z) = &inner.entries[0] else {
            panic!("expected case");
        };
        assert!(z.is_concurrent());
    }

    #[test]
    fn hooks_are_collected_per_kind() {
        let mut suite = Suite::new("root", 0_u32);
        suite
            .before_all(noop)
            .before_each(noop)
            .before_each(noop)
            .after_each(noop)
            .after_all(noop)
            .it("a", noop);

        assert_eq!(suite.hooks.before_all.len(), 1);
        assert_eq!(suite.hooks.before_each.len(), 2);
        assert_eq!(suite.hooks.after_each.len(), 1);
        assert_eq!(suite.hooks.after_all.len(), 1);
    }

    #[test]
    fn case_count_includes_nested_scopes() {
        let mut suite = Suite::new("root", 0_u32);
        suite.it("a", noop).describe("child", |s| {
            s.it("b", noop).it("c", noop);
        });
        assert_eq!(suite.case_count(), 3);
    }

    #[test]
    fn validate_rejects_empty_suite() {
        let suite = Suite::new("empty", 0_u32);
        let err = suite.validate().unwrap_err();
        assert!(matches!(err, SuiteError::Empty(name) if name == "empty"));
    }

    #[test]
    fn validate_rejects_duplicate_names_in_same_scope() {
        let mut suite = Suite::new("root", 0_u32);
        suite.it("dup", noop).it("dup", noop);
        let err = suite.validate().unwrap_err();
        assert!(err.to_string().contains("dup"));
    }

    #[test]
    fn validate_allows_same_name_in_different_scopes() {
        let mut suite = Suite::new("root", 0_u32);
        suite.it("same", noop).describe("child", |s| {
            s.it("same", noop);
        });
        suite.validate().unwrap();
    }

    #[test]
    fn has_only_finds_nested_only() {
        let mut suite = Suite::new("root", 0_u32);
        suite.it("a", noop);
        assert!(!suite.has_only());

        suite.describe("child", |s| {
            s.it_only("focus", noop);
        });
        assert!(suite.has_only());
    }

    #[test]
    fn root_suite_owns_fixture_and_scope_tree() {
        let mut suite = Suite::new("root", 7_u32);
        suite.it("a", noop).describe("child", |s: &mut Scope<u32>| {
            s.it("b", noop);
        });

        let Suite { scope, fixture } = suite;
        assert_eq!(fixture, 7);
        assert_eq!(scope.name(), "root");
        assert_eq!(scope.case_count(), 2);
    }

    #[test]
    fn case_mode_display() {
        assert_eq!(CaseMode::Run.to_string(), "run");
        assert_eq!(CaseMode::Skip.to_string(), "skip");
        assert_eq!(CaseMode::Only.to_string(), "only");
    }
}
