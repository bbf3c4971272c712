//! 내장 사용자 시나리오
//!
//! 같은 다섯 개의 테스트 케이스를 fixture 관리 방식만 바꿔 등록합니다.
//!
//! | 시나리오 | fixture 관리 | 기대 결과 |
//! |----------|--------------|-----------|
//! | [`Scenario::Stale`] | 등록 시 한 번만 생성 | "should store the provided email value" 실패 |
//! | [`Scenario::Fresh`] | `before_each`에서 매번 재생성 | 전부 통과 |
//! | [`Scenario::Reset`] | `after_each`에서 원래 값으로 복원 | 전부 통과 |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::expect::expect;
use crate::suite::Suite;
use crate::user::User;

/// 모든 시나리오가 기본값으로 사용하는 이메일
pub const TEST_EMAIL: &str = "test@test.com";

/// "should update the email"이 쓰는 새 이메일
pub const UPDATED_EMAIL: &str = "test2@test.com";

/// 루트 스위트 이름
pub const SUITE_NAME: &str = "user";

/// 내장 시나리오 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    /// fixture 재생성 hook 없음
    Stale,
    /// `before_each`가 사용자를 새로 생성
    #[default]
    Fresh,
    /// `after_each`가 사용자를 원래 값으로 복원
    Reset,
}

impl Scenario {
    /// 모든 시나리오 (표시 순서)
    pub const ALL: [Scenario; 3] = [Self::Stale, Self::Fresh, Self::Reset];

    /// 시나리오에 해당하는 스위트를 생성합니다.
    pub fn build(self) -> Suite<User> {
        match self {
            Self::Stale => stale_fixture_suite(),
            Self::Fresh => fresh_fixture_suite(),
            Self::Reset => reset_fixture_suite(),
        }
    }

    /// 시나리오 설명
    pub fn description(self) -> &'static str {
        match self {
            Self::Stale => "user created once, no reconstructing hook",
            Self::Fresh => "before_each reconstructs the user",
            Self::Reset => "after_each restores the user",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stale => write!(f, "stale"),
            Self::Fresh => write!(f, "fresh"),
            Self::Reset => write!(f, "reset"),
        }
    }
}

impl FromStr for Scenario {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stale" => Ok(Self::Stale),
            "fresh" => Ok(Self::Fresh),
            "reset" => Ok(Self::Reset),
            other => Err(ConfigError::InvalidValue {
                field: "scenario".to_owned(),
                reason: format!("unknown scenario '{other}', expected stale, fresh or reset"),
            }),
        }
    }
}

/// 사용자를 한 번만 만들고 재생성하지 않는 스위트
///
/// 첫 번째 테스트가 이메일을 바꾸므로 세 번째 테스트가 실패합니다.
pub fn stale_fixture_suite() -> Suite<User> {
    let mut suite = Suite::new(SUITE_NAME, User::new(TEST_EMAIL));
    register_logging_hooks(&mut suite);
    register_user_cases(&mut suite);
    suite
}

/// 매 테스트 직전에 사용자를 새로 만드는 스위트
pub fn fresh_fixture_suite() -> Suite<User> {
    let mut suite = Suite::new(SUITE_NAME, User::new(TEST_EMAIL));
    suite.before_each(|user| {
        *user = User::new(TEST_EMAIL);
        Ok(())
    });
    register_logging_hooks(&mut suite);
    register_user_cases(&mut suite);
    suite
}

/// 매 테스트 직후에 사용자를 원래 값으로 되돌리는 스위트
pub fn reset_fixture_suite() -> Suite<User> {
    let mut suite = Suite::new(SUITE_NAME, User::new(TEST_EMAIL));
    register_logging_hooks(&mut suite);
    suite.after_each(|user| {
        *user = User::new(TEST_EMAIL);
        Ok(())
    });
    register_user_cases(&mut suite);
    suite
}

fn register_logging_hooks(suite: &mut Suite<User>) {
    suite
        .before_all(|_| {
            debug!("beforeAll()");
            Ok(())
        })
        .before_each(|user| {
            debug!(email = user.email(), "beforeEach()");
            Ok(())
        })
        .after_each(|user| {
            debug!(email = user.email(), "afterEach()");
            Ok(())
        })
        .after_all(|_| {
            debug!("afterAll()");
            Ok(())
        });
}

fn register_user_cases(suite: &mut Suite<User>) {
    suite
        .it_concurrent("should update the email", |user| {
            user.update_email(UPDATED_EMAIL);
            expect(user.email()).to_be(UPDATED_EMAIL)
        })
        .it("should have an email property", |user| {
            expect(&*user).to_have_property("email")
        })
        .it("should store the provided email value", |user| {
            expect(user.email()).to_be(TEST_EMAIL)
        })
        .it("should clear the email", |user| {
            user.clear_email();
            expect(user.email()).to_be("")
        })
        .it(
            "should still have an email property after clearing the email",
            |user| {
                user.clear_email();
                expect(&*user).to_have_property("email")
            },
        );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_scenario_registers_five_cases() {
        for scenario in Scenario::ALL {
            let suite = scenario.build();
            assert_eq!(suite.case_count(), 5, "{scenario}");
            suite.validate().unwrap();
        }
    }

    #[test]
    fn scenario_from_str_roundtrip() {
        for scenario in Scenario::ALL {
            let parsed: Scenario = scenario.to_string().parse().unwrap();
            assert_eq!(parsed, scenario);
        }
        assert_eq!("FRESH".parse::<Scenario>().unwrap(), Scenario::Fresh);
    }

    #[test]
    fn unknown_scenario_is_rejected() {
        let err = "flaky".parse::<Scenario>().unwrap_err();
        assert!(err.to_string().contains("flaky"));
    }

    #[test]
    fn default_scenario_is_fresh() {
        assert_eq!(Scenario::default(), Scenario::Fresh);
    }
}
