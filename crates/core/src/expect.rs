//! 단언 기능: `expect(actual).to_be(expected)`
//!
//! 모든 단언은 `Result<(), AssertionFailure>`를 반환하므로
//! 테스트 본문과 hook에서 `?`로 바로 전파할 수 있습니다.
//!
//! # 사용 예시
//! ```
//! use hookline_core::expect::expect;
//! use hookline_core::user::User;
//!
//! # fn main() -> Result<(), hookline_core::error::AssertionFailure> {
//! let user = User::new("test@test.com");
//! expect(user.email()).to_be("test@test.com")?;
//! expect(&user).to_have_property("email")?;
//! expect(user.email()).not().to_be("")?;
//! # Ok(())
//! # }
//! ```

use std::fmt::Debug;

use crate::error::AssertionFailure;

/// 이름으로 조회 가능한 속성을 노출하는 타입
///
/// `to_have_property` 단언의 대상이 됩니다.
pub trait HasProperties {
    /// 노출하는 속성 이름 목록
    fn property_names(&self) -> &'static [&'static str];

    /// 주어진 이름의 속성이 있는지 확인합니다.
    fn has_property(&self, name: &str) -> bool {
        self.property_names().contains(&name)
    }
}

/// 실제값을 감싸는 단언 빌더
#[derive(Debug)]
pub struct Expectation<T> {
    actual: T,
    negated: bool,
}

/// 실제값에 대한 단언을 시작합니다.
pub fn expect<T>(actual: T) -> Expectation<T> {
    Expectation {
        actual,
        negated: false,
    }
}

impl<T: Debug> Expectation<T> {
    /// 이후 단언의 의미를 반전합니다.
    pub fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    /// 실제값이 기대값과 같은지 확인합니다.
    pub fn to_be<U>(&self, expected: U) -> Result<(), AssertionFailure>
    where
        T: PartialEq<U>,
        U: Debug,
    {
        let equal = self.actual == expected;
        if equal != self.negated {
            return Ok(());
        }
        let message = if self.negated {
            "expected values to differ"
        } else {
            "expected values to be equal"
        };
        Err(AssertionFailure::mismatch(
            message,
            format!("{expected:?}"),
            format!("{:?}", self.actual),
        ))
    }

    /// [`to_be`](Self::to_be)의 별칭
    pub fn to_equal<U>(&self, expected: U) -> Result<(), AssertionFailure>
    where
        T: PartialEq<U>,
        U: Debug,
    {
        self.to_be(expected)
    }
}

impl<T: HasProperties + Debug + ?Sized> Expectation<&T> {
    /// 대상이 주어진 이름의 속성을 가지고 있는지 확인합니다.
    pub fn to_have_property(&self, name: &str) -> Result<(), AssertionFailure> {
        let present = self.actual.has_property(name);
        if present != self.negated {
            return Ok(());
        }
        let message = if self.negated {
            format!("expected value not to have property '{name}'")
        } else {
            format!("expected value to have property '{name}'")
        };
        Err(AssertionFailure::mismatch(
            message,
            format!("{:?}", self.actual.property_names()),
            name,
        ))
    }
}
