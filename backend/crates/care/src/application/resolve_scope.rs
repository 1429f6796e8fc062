//! Resolve Scope Use Case
//!
//! Turns the authenticated caller into the window of records they may see.

use std::sync::Arc;

use kernel::scope::{AccessScope, Level, Principal};

use crate::domain::repository::HealthCenterRepository;
use crate::error::{CareError, CareResult};

pub struct ResolveScopeUseCase<H>
where
    H: HealthCenterRepository,
{
    centers: Arc<H>,
}

impl<H> ResolveScopeUseCase<H>
where
    H: HealthCenterRepository,
{
    pub fn new(centers: Arc<H>) -> Self {
        Self { centers }
    }

    /// 階層と所属から参照範囲を決定
    ///
    /// district ユーザーは所属施設の district。施設の対応が無い場合は
    /// 施設名そのものを district として扱います。
    pub async fn execute(&self, principal: &Principal) -> CareResult<AccessScope> {
        match principal.level {
            Level::National => Ok(AccessScope::National),
            Level::Regional => {
                let region = attached(principal.region.as_deref(), "region")?;
                Ok(AccessScope::Regional {
                    region: region.to_string(),
                })
            }
            Level::District => {
                let name = attached(principal.health_center.as_deref(), "health center")?;
                let district = match self.centers.find_by_name(name).await? {
                    Some(center) => center.district().to_string(),
                    None => {
                        tracing::warn!(
                            user_id = %principal.user_id,
                            health_center = %name,
                            "No health center mapping for district user, using the name as district"
                        );
                        name.to_string()
                    }
                };
                Ok(AccessScope::District { district })
            }
            Level::Agent => {
                let name = attached(principal.health_center.as_deref(), "health center")?;
                Ok(AccessScope::Agent {
                    health_center: name.to_string(),
                })
            }
        }
    }
}

fn attached<'a>(value: Option<&'a str>, what: &str) -> CareResult<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CareError::Forbidden(format!("Your account is not attached to a {what}")))
}
