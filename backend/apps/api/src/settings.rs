//! System settings
//!
//! A single row (`app_name`, `theme`) cached in a [`SettingsHandle`] that is
//! built at startup and shared through router state. Reads hit the cache;
//! writes go to the store first and then refresh the cache.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use kernel::error::app_error::{AppError, AppResult};
use kernel::scope::{Level, Principal};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tokio::sync::RwLock;

const DEFAULT_APP_NAME: &str = "VacXCare";
const DEFAULT_THEME: &str = "light";
const MAX_APP_NAME_LEN: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSettings {
    pub app_name: String,
    pub theme: String,
    pub updated_at: DateTime<Utc>,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            theme: DEFAULT_THEME.to_string(),
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    pub app_name: Option<String>,
    pub theme: Option<String>,
}

#[trait_variant::make(SettingsStore: Send)]
pub trait LocalSettingsStore {
    async fn load(&self) -> Result<Option<SystemSettings>, sqlx::Error>;

    async fn save(&self, settings: &SystemSettings) -> Result<(), sqlx::Error>;
}

#[derive(Clone)]
pub struct PgSettingsStore {
    pool: PgPool,
}

impl PgSettingsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SettingsStore for PgSettingsStore {
    async fn load(&self) -> Result<Option<SystemSettings>, sqlx::Error> {
        let row = sqlx::query_as::<_, (String, String, DateTime<Utc>)>(
            "SELECT app_name, theme, updated_at FROM system_settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(app_name, theme, updated_at)| SystemSettings {
            app_name,
            theme,
            updated_at,
        }))
    }

    async fn save(&self, settings: &SystemSettings) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO system_settings (id, app_name, theme, updated_at)
            VALUES (1, $1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET app_name = EXCLUDED.app_name, theme = EXCLUDED.theme, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&settings.app_name)
        .bind(&settings.theme)
        .bind(settings.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// 設定のキャッシュ（明示的な `refresh` でのみ再読込）
pub struct SettingsHandle<S>
where
    S: SettingsStore + Sync + 'static,
{
    store: S,
    current: RwLock<SystemSettings>,
}

impl<S> SettingsHandle<S>
where
    S: SettingsStore + Sync + 'static,
{
    /// 起動時に読み込む（行が無ければ既定値）
    pub async fn load(store: S) -> Result<Self, sqlx::Error> {
        let current = store.load().await?.unwrap_or_default();
        Ok(Self {
            store,
            current: RwLock::new(current),
        })
    }

    pub async fn current(&self) -> SystemSettings {
        self.current.read().await.clone()
    }

    pub async fn refresh(&self) -> Result<SystemSettings, sqlx::Error> {
        let fresh = self.store.load().await?.unwrap_or_default();
        *self.current.write().await = fresh.clone();
        Ok(fresh)
    }

    pub async fn update(&self, req: UpdateSettingsRequest) -> AppResult<SystemSettings> {
        let mut next = self.current().await;
        let mut errors = Vec::new();
        if let Some(name) = req.app_name {
            let name = name.trim().to_string();
            if name.is_empty() || name.chars().count() > MAX_APP_NAME_LEN {
                errors.push(format!(
                    "appName must be between 1 and {MAX_APP_NAME_LEN} characters"
                ));
            }
            next.app_name = name;
        }
        if let Some(theme) = req.theme {
            let theme = theme.trim().to_ascii_lowercase();
            if !matches!(theme.as_str(), "light" | "dark") {
                errors.push("theme must be one of: light, dark".to_string());
            }
            next.theme = theme;
        }
        if !errors.is_empty() {
            return Err(AppError::validation(errors));
        }

        next.updated_at = Utc::now();
        self.store.save(&next).await?;
        Ok(self.refresh().await?)
    }
}

fn require_national(principal: &Principal) -> AppResult<()> {
    if principal.level != Level::National {
        tracing::warn!(user_id = %principal.user_id, level = %principal.level, "Settings change refused");
        return Err(AppError::forbidden("Only national users can change system settings"));
    }
    Ok(())
}

/// GET /api/system-settings
async fn read_settings<S>(State(handle): State<Arc<SettingsHandle<S>>>) -> Json<SystemSettings>
where
    S: SettingsStore + Sync + 'static,
{
    Json(handle.current().await)
}

/// PUT /api/system-settings
async fn update_settings<S>(
    State(handle): State<Arc<SettingsHandle<S>>>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<UpdateSettingsRequest>,
) -> AppResult<Json<SystemSettings>>
where
    S: SettingsStore + Sync + 'static,
{
    require_national(&principal)?;
    let settings = handle.update(req).await?;
    tracing::info!(user_id = %principal.user_id, app_name = %settings.app_name, theme = %settings.theme, "System settings updated");
    Ok(Json(settings))
}

/// POST /api/system-settings/refresh
async fn refresh_settings<S>(
    State(handle): State<Arc<SettingsHandle<S>>>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Json<SystemSettings>>
where
    S: SettingsStore + Sync + 'static,
{
    require_national(&principal)?;
    Ok(Json(handle.refresh().await?))
}

/// Unauthenticated read
pub fn public_router<S>(handle: Arc<SettingsHandle<S>>) -> Router
where
    S: SettingsStore + Sync + 'static,
{
    Router::new()
        .route("/system-settings", get(read_settings::<S>))
        .with_state(handle)
}

/// Writes; expects `Principal` in the request extensions
pub fn admin_router<S>(handle: Arc<SettingsHandle<S>>) -> Router
where
    S: SettingsStore + Sync + 'static,
{
    Router::new()
        .route("/system-settings", put(update_settings::<S>))
        .route("/system-settings/refresh", post(refresh_settings::<S>))
        .with_state(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use kernel::id::UserId;
    use std::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Default)]
    struct MemoryStore(Mutex<Option<SystemSettings>>);

    impl SettingsStore for MemoryStore {
        async fn load(&self) -> Result<Option<SystemSettings>, sqlx::Error> {
            Ok(self.0.lock().unwrap().clone())
        }

        async fn save(&self, settings: &SystemSettings) -> Result<(), sqlx::Error> {
            *self.0.lock().unwrap() = Some(settings.clone());
            Ok(())
        }
    }

    fn principal(level: Level) -> Principal {
        Principal {
            user_id: UserId::new(),
            email: "admin@vacxcare.org".into(),
            level,
            region: None,
            health_center: None,
        }
    }

    fn put(body: serde_json::Value) -> Request<Body> {
        Request::put("/system-settings")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_defaults_when_no_row() {
        let handle = SettingsHandle::load(MemoryStore::default()).await.unwrap();
        let settings = handle.current().await;
        assert_eq!(settings.app_name, "VacXCare");
        assert_eq!(settings.theme, "light");
    }

    #[tokio::test]
    async fn test_update_persists_then_refreshes() {
        let handle = SettingsHandle::load(MemoryStore::default()).await.unwrap();
        let updated = handle
            .update(UpdateSettingsRequest {
                app_name: Some("  VacXCare Cameroun ".into()),
                theme: Some("Dark".into()),
            })
            .await
            .unwrap();
        assert_eq!(updated.app_name, "VacXCare Cameroun");
        assert_eq!(updated.theme, "dark");
        assert_eq!(
            SettingsStore::load(&handle.store).await.unwrap(),
            Some(updated.clone())
        );
        assert_eq!(handle.current().await, updated);
    }

    #[tokio::test]
    async fn test_invalid_update_lists_every_problem() {
        let handle = SettingsHandle::load(MemoryStore::default()).await.unwrap();
        let err = handle
            .update(UpdateSettingsRequest {
                app_name: Some("   ".into()),
                theme: Some("neon".into()),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.details().len(), 2);
        assert!(SettingsStore::load(&handle.store).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_only_national_may_write() {
        let handle = Arc::new(SettingsHandle::load(MemoryStore::default()).await.unwrap());
        let app = |level| admin_router(handle.clone()).layer(Extension(principal(level)));

        let refused = app(Level::Regional)
            .oneshot(put(serde_json::json!({ "theme": "dark" })))
            .await
            .unwrap();
        assert_eq!(refused.status(), StatusCode::FORBIDDEN);

        let accepted = app(Level::National)
            .oneshot(put(serde_json::json!({ "theme": "dark" })))
            .await
            .unwrap();
        assert_eq!(accepted.status(), StatusCode::OK);

        let read = public_router(handle.clone())
            .oneshot(Request::get("/system-settings").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(read.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["theme"], "dark");
        assert_eq!(body["appName"], "VacXCare");
    }
}
