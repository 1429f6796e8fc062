//! User Entity
//!
//! Account profile and administrative assignment. Credentials live in
//! [`Auth`](super::auth::Auth).

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use kernel::scope::{Level, Location, Principal};
use listing::{FieldValue, Filterable};

use crate::domain::value_object::{email::Email, user_status::UserStatus};

#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    pub email: Email,
    /// 表示名
    pub name: String,
    /// 階層（旧 `agent_level` 表現は読み込み時に畳み込み済み）
    pub level: Level,
    /// 所在地。region は regional 以下、health_center は district / agent が持つ
    pub location: Location,
    pub status: UserStatus,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: Email, name: String, level: Level, location: Location) -> Self {
        let now = Utc::now();
        Self {
            user_id: UserId::new(),
            email,
            name,
            level,
            location,
            status: UserStatus::Active,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn can_login(&self) -> bool {
        self.status.can_login()
    }

    pub fn record_login(&mut self) {
        let now = Utc::now();
        self.last_login_at = Some(now);
        self.updated_at = now;
    }

    pub fn set_status(&mut self, status: UserStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// リクエスト処理用のスナップショット
    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.user_id,
            email: self.email.as_str().to_string(),
            level: self.level,
            region: self.location.region.clone(),
            health_center: self.location.health_center.clone(),
        }
    }
}

impl Filterable for User {
    fn field(&self, column: &str) -> FieldValue<'_> {
        match column {
            "email" => FieldValue::text(self.email.as_str()),
            "name" => FieldValue::text(&self.name),
            "role" => FieldValue::text(self.level.code()),
            "region" => FieldValue::opt_text(self.location.region.as_deref()),
            "district" => FieldValue::opt_text(self.location.district.as_deref()),
            "health_center" => FieldValue::opt_text(self.location.health_center.as_deref()),
            "status" => FieldValue::text(self.status.code()),
            "created_at" => FieldValue::Timestamp(self.created_at),
            "last_login_at" => self
                .last_login_at
                .map_or(FieldValue::Missing, FieldValue::Timestamp),
            _ => FieldValue::Missing,
        }
    }
}
