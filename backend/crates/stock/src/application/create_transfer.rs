//! Create Transfer Use Case

use std::sync::Arc;

use auth::HealthCenterDirectory;
use kernel::scope::{AccessScope, Level, Location, Principal};
use listing::ValidationErrors;
use platform::events::{EventBus, LiveEvent};

use crate::domain::entities::{Endpoint, StockTransfer};
use crate::domain::repository::TransferRepository;
use crate::domain::services::authorize_creation;
use crate::error::{StockError, StockResult};

pub struct CreateTransferInput {
    pub vaccine: String,
    pub batch_number: String,
    pub quantity: i64,
    pub to_level: Level,
    pub to_region: Option<String>,
    pub to_district: Option<String>,
    pub to_health_center: Option<String>,
}

pub struct CreateTransferUseCase<T, D>
where
    T: TransferRepository,
    D: HealthCenterDirectory,
{
    transfers: Arc<T>,
    directory: Arc<D>,
    events: EventBus,
}

impl<T, D> CreateTransferUseCase<T, D>
where
    T: TransferRepository,
    D: HealthCenterDirectory,
{
    pub fn new(transfers: Arc<T>, directory: Arc<D>, events: EventBus) -> Self {
        Self {
            transfers,
            directory,
            events,
        }
    }

    pub async fn execute(
        &self,
        principal: &Principal,
        scope: &AccessScope,
        input: CreateTransferInput,
    ) -> StockResult<StockTransfer> {
        let mut errors = Vec::new();
        let vaccine = input.vaccine.trim().to_string();
        if vaccine.is_empty() {
            errors.push("vaccine is required".to_string());
        }
        let batch_number = input.batch_number.trim().to_string();
        if batch_number.is_empty() {
            errors.push("batchNumber is required".to_string());
        }
        let quantity = match i32::try_from(input.quantity) {
            Ok(q) if q >= 1 => q,
            _ => {
                errors.push(format!(
                    "quantity must be between 1 and {}",
                    i32::MAX
                ));
                0
            }
        };
        if !errors.is_empty() {
            return Err(ValidationErrors(errors).into());
        }

        let to = Endpoint {
            level: input.to_level,
            location: self.destination(principal, &input).await?,
        };
        authorize_creation(principal, scope, &to)?;

        let from = Endpoint {
            level: principal.level,
            location: scope.origin(principal),
        };
        let transfer = StockTransfer::new(
            vaccine,
            batch_number,
            quantity,
            from,
            to,
            principal.user_id,
        );
        self.transfers.create(&transfer).await?;

        tracing::info!(
            transfer_id = %transfer.id,
            vaccine = %transfer.vaccine,
            quantity = transfer.quantity,
            from_level = %transfer.from_level,
            to_level = %transfer.to_level,
            created_by = %principal.user_id,
            "Stock transfer created"
        );
        self.events.publish(
            LiveEvent::new("transfer.created", transfer.id)
                .at(transfer.from.clone())
                .at(transfer.to.clone())
                .with_payload(serde_json::json!({
                    "vaccine": transfer.vaccine,
                    "quantity": transfer.quantity,
                    "fromLevel": transfer.from_level,
                    "toLevel": transfer.to_level,
                })),
        );

        Ok(transfer)
    }

    /// 送り先の階層が必要とする所在地を組み立てる
    async fn destination(
        &self,
        principal: &Principal,
        input: &CreateTransferInput,
    ) -> StockResult<Location> {
        fn field(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }

        match input.to_level {
            Level::National => Err(StockError::InvalidInput(
                "Transfers cannot be sent to the national level".into(),
            )),
            Level::Regional => {
                let region = field(&input.to_region)
                    .ok_or_else(|| StockError::InvalidInput("toRegion is required".into()))?;
                Ok(Location::new(Some(region), None, None))
            }
            Level::District => {
                let district = field(&input.to_district)
                    .ok_or_else(|| StockError::InvalidInput("toDistrict is required".into()))?;
                let region = field(&input.to_region).or_else(|| principal.region.clone());
                Ok(Location::new(region, Some(district), None))
            }
            Level::Agent => {
                let health_center = field(&input.to_health_center).ok_or_else(|| {
                    StockError::InvalidInput("toHealthCenter is required".into())
                })?;
                self.directory
                    .locate(&health_center)
                    .await?
                    .ok_or_else(|| {
                        StockError::InvalidInput(format!("Unknown health center: {health_center}"))
                    })
            }
        }
    }
}
