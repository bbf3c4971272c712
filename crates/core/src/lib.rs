//! # hookline-core
//!
//! 테스트 생명주기 시퀀서.
//!
//! 스위트에 `before_all` / `before_each` / `after_each` / `after_all` hook과
//! 테스트 케이스를 등록하면, [`Runner`]가 정해진 순서로 실행하고
//! 테스트별 결과를 [`SuiteReport`]로 돌려줍니다.
//!
//! ```
//! use hookline_core::{Runner, Suite, expect};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), hookline_core::HooklineError> {
//! let mut suite = Suite::new("counter", 0_u32);
//! suite
//!     .before_each(|n| {
//!         *n = 0;
//!         Ok(())
//!     })
//!     .it("starts at zero", |n| expect(*n).to_be(0))
//!     .it("increments", |n| {
//!         *n += 1;
//!         expect(*n).to_be(1)
//!     });
//!
//! let report = Runner::default().run(suite).await?;
//! assert!(report.is_success());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod expect;
pub mod lifecycle;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod scenarios;
pub mod suite;
pub mod user;

// --- 주요 타입 re-export ---

// 에러
pub use error::{AssertionFailure, ConfigError, HooklineError, SuiteError};

// 설정
pub use config::{FixtureMode, HooklineConfig, RunnerConfig};

// 스위트 / 실행
pub use expect::{HasProperties, expect};
pub use lifecycle::{Lifecycle, Phase};
pub use runner::Runner;
pub use suite::{CaseMode, Outcome, Scope, Suite};

// 결과
pub use report::{ScopeFailure, SuiteReport, TestResult, TestStatus, TimelineEvent};

// 도메인
pub use scenarios::Scenario;
pub use user::User;
