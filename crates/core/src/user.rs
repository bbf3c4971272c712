//! 사용자 엔티티: 데모 스위트가 공유 fixture로 사용하는 단일 계정

use serde::{Deserialize, Serialize};

use crate::expect::HasProperties;

/// 이메일 하나를 가진 계정 보유자
///
/// 외부 리소스를 잡지 않으므로 명시적인 teardown이 필요 없습니다.
/// 스코프가 끝나면 그대로 drop 됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    email: String,
}

impl User {
    /// 주어진 이메일로 사용자를 생성합니다.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }

    /// 현재 이메일을 반환합니다.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// 저장된 이메일을 교체합니다.
    pub fn update_email(&mut self, new_email: impl Into<String>) {
        self.email = new_email.into();
    }

    /// 이메일을 빈 문자열로 비웁니다. 속성 자체는 유지됩니다.
    pub fn clear_email(&mut self) {
        self.email.clear();
    }
}

impl HasProperties for User {
    fn property_names(&self) -> &'static [&'static str] {
        &["email"]
    }
}
