//! User Status
//!
//! `active` accounts can sign in; `disabled` accounts are kept for audit
//! but every request they make is rejected, including ones carrying a
//! session issued before they were disabled.

use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    #[display("active")]
    Active,
    #[display("disabled")]
    Disabled,
}

impl UserStatus {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Disabled => "disabled",
        }
    }

    #[inline]
    pub const fn can_login(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// 保存値から復元（不明な値は None）
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "active" => Some(Self::Active),
            "disabled" => Some(Self::Disabled),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip() {
        for status in [UserStatus::Active, UserStatus::Disabled] {
            assert_eq!(UserStatus::from_code(status.code()), Some(status));
            assert_eq!(status.to_string(), status.code());
        }
        assert_eq!(UserStatus::from_code("memorial"), None);
    }

    #[test]
    fn test_only_active_can_login() {
        assert!(UserStatus::Active.can_login());
        assert!(!UserStatus::Disabled.can_login());
    }
}
