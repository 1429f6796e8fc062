//! Administrative Scope
//!
//! The four administrative tiers ([`Level`]), the authenticated caller
//! ([`Principal`]) and the data-visibility window resolved for that caller
//! ([`AccessScope`]).
//!
//! A tier is used both as a user's role and as the granularity of a stock
//! location. Visibility is decided on three location attributes: region,
//! district and health center. A record that lacks the attribute a scope
//! filters on is never visible to that scope.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::id::UserId;

/// スコープ関連のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("Unknown administrative level: {0}")]
    UnknownLevel(String),
}

// ============================================================================
// Level
// ============================================================================

/// 行政階層（national > regional > district > agent）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    National,
    Regional,
    District,
    Agent,
}

impl Level {
    pub const ALL: [Level; 4] = [
        Level::National,
        Level::Regional,
        Level::District,
        Level::Agent,
    ];

    /// 保存・API 用のコード
    pub const fn code(&self) -> &'static str {
        match self {
            Level::National => "national",
            Level::Regional => "regional",
            Level::District => "district",
            Level::Agent => "agent",
        }
    }

    pub fn from_code(code: &str) -> Result<Self, ScopeError> {
        match code.trim().to_ascii_lowercase().as_str() {
            "national" => Ok(Level::National),
            "regional" => Ok(Level::Regional),
            "district" => Ok(Level::District),
            "agent" => Ok(Level::Agent),
            other => Err(ScopeError::UnknownLevel(other.to_string())),
        }
    }

    /// 保存された (role, agent_level) の組から階層を決定
    ///
    /// 旧データでは `role = "agent"` かつ `agent_level = "district"` が
    /// district ユーザーを表していたため、読み込み時に 1 つの値へ畳み込みます。
    ///
    /// ```
    /// use kernel::scope::Level;
    /// assert_eq!(Level::from_stored("agent", Some("district")).unwrap(), Level::District);
    /// assert_eq!(Level::from_stored("agent", None).unwrap(), Level::Agent);
    /// ```
    pub fn from_stored(role: &str, agent_level: Option<&str>) -> Result<Self, ScopeError> {
        let level = Self::from_code(role)?;
        match (level, agent_level.map(str::trim)) {
            (Level::Agent, Some(al)) if al.eq_ignore_ascii_case("district") => Ok(Level::District),
            (level, _) => Ok(level),
        }
    }

    /// 1 つ下の階層（agent は None）
    pub const fn below(&self) -> Option<Level> {
        match self {
            Level::National => Some(Level::Regional),
            Level::Regional => Some(Level::District),
            Level::District => Some(Level::Agent),
            Level::Agent => None,
        }
    }

    /// `self` が `other` より上位か
    pub fn is_above(&self, other: Level) -> bool {
        *self < other
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Level {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s)
    }
}

// ============================================================================
// Location
// ============================================================================

/// レコードの所在地（region / district / health center）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub region: Option<String>,
    pub district: Option<String>,
    pub health_center: Option<String>,
}

impl Location {
    pub fn new(
        region: Option<String>,
        district: Option<String>,
        health_center: Option<String>,
    ) -> Self {
        Self {
            region,
            district,
            health_center,
        }
    }
}

// ============================================================================
// Principal
// ============================================================================

/// 認証済みの呼び出し元
///
/// セッション検証ミドルウェアがリクエスト拡張に格納します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub email: String,
    pub level: Level,
    pub region: Option<String>,
    pub health_center: Option<String>,
}

// ============================================================================
// AccessScope
// ============================================================================

/// 呼び出し元に許された参照範囲
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "level", rename_all = "lowercase")]
pub enum AccessScope {
    National,
    Regional {
        region: String,
    },
    District {
        district: String,
    },
    #[serde(rename_all = "camelCase")]
    Agent {
        health_center: String,
    },
}

impl AccessScope {
    pub fn level(&self) -> Level {
        match self {
            AccessScope::National => Level::National,
            AccessScope::Regional { .. } => Level::Regional,
            AccessScope::District { .. } => Level::District,
            AccessScope::Agent { .. } => Level::Agent,
        }
    }

    /// 所在地がこのスコープに含まれるか
    ///
    /// 絞り込みに使う属性が欠けているレコードは含まれません。
    pub fn covers(&self, location: &Location) -> bool {
        fn eq(attr: &Option<String>, expected: &str) -> bool {
            attr.as_deref() == Some(expected)
        }
        match self {
            AccessScope::National => true,
            AccessScope::Regional { region } => eq(&location.region, region),
            AccessScope::District { district } => eq(&location.district, district),
            AccessScope::Agent { health_center } => eq(&location.health_center, health_center),
        }
    }

    /// スコープ自身の所在地（移送元として使う）
    pub fn origin(&self, principal: &Principal) -> Location {
        match self {
            AccessScope::National => Location::default(),
            AccessScope::Regional { region } => Location::new(Some(region.clone()), None, None),
            AccessScope::District { district } => {
                Location::new(principal.region.clone(), Some(district.clone()), None)
            }
            AccessScope::Agent { health_center } => {
                Location::new(principal.region.clone(), None, Some(health_center.clone()))
            }
        }
    }
}
