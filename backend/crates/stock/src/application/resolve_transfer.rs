//! Resolve Transfer Use Case
//!
//! Accept, reject or cancel a pending transfer. Concurrent resolutions of
//! the same transfer are serialised by the repository's conditional update:
//! the first writer wins and every other one gets `AlreadyResolved`.

use std::sync::Arc;

use chrono::Utc;
use kernel::id::StockTransferId;
use kernel::scope::{AccessScope, Principal};
use platform::events::{EventBus, LiveEvent};

use crate::domain::entities::{Resolution, StockTransfer};
use crate::domain::repository::TransferRepository;
use crate::domain::services::{authorize_resolution, check_transition, is_visible};
use crate::domain::value_objects::{TransferAction, TransferStatus};
use crate::error::{StockError, StockResult};

pub struct ResolveTransferUseCase<T>
where
    T: TransferRepository,
{
    transfers: Arc<T>,
    events: EventBus,
}

impl<T> ResolveTransferUseCase<T>
where
    T: TransferRepository,
{
    pub fn new(transfers: Arc<T>, events: EventBus) -> Self {
        Self { transfers, events }
    }

    /// 状態を直接指定する形式（`PATCH`）
    pub async fn to_status(
        &self,
        principal: &Principal,
        scope: &AccessScope,
        id: &StockTransferId,
        target: TransferStatus,
        reason: Option<String>,
    ) -> StockResult<StockTransfer> {
        let action = TransferAction::for_target(target).ok_or_else(|| {
            StockError::InvalidTransition("A transfer cannot be moved back to pending".into())
        })?;
        self.execute(principal, scope, id, action, reason).await
    }

    pub async fn execute(
        &self,
        principal: &Principal,
        scope: &AccessScope,
        id: &StockTransferId,
        action: TransferAction,
        reason: Option<String>,
    ) -> StockResult<StockTransfer> {
        let current = self
            .transfers
            .find_by_id(id)
            .await?
            .filter(|t| is_visible(scope, t))
            .ok_or(StockError::NotFound)?;

        check_transition(current.status, action.target())?;
        authorize_resolution(principal, scope, &current, action)?;

        let resolution = Resolution {
            status: action.target(),
            reason: match action {
                TransferAction::Reject => reason
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty()),
                _ => None,
            },
            resolved_by: principal.user_id,
            resolved_at: Utc::now(),
        };

        let Some(transfer) = self.transfers.resolve_if_pending(id, &resolution).await? else {
            // Lost the race, or the row vanished in between.
            return Err(if self.transfers.exists(id).await? {
                StockError::AlreadyResolved
            } else {
                StockError::NotFound
            });
        };

        tracing::info!(
            transfer_id = %transfer.id,
            status = %transfer.status,
            resolved_by = %principal.user_id,
            "Stock transfer resolved"
        );
        self.events.publish(
            LiveEvent::new(action.event_type(), transfer.id)
                .at(transfer.from.clone())
                .at(transfer.to.clone())
                .with_payload(serde_json::json!({
                    "vaccine": transfer.vaccine,
                    "quantity": transfer.quantity,
                    "status": transfer.status,
                    "reason": transfer.reason,
                })),
        );

        Ok(transfer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{agent_user, district_user, national_user, regional_user};
    use crate::domain::entities::Endpoint;
    use crate::infra::memory::MemoryTransferRepository;
    use kernel::id::UserId;
    use kernel::scope::{Level, Location};

    /// Centre A district → CSI Mvog-Ada
    async fn pending(repo: &MemoryTransferRepository) -> StockTransfer {
        let transfer = StockTransfer::new(
            "VPO".into(),
            "LOT-7".into(),
            200,
            Endpoint {
                level: Level::District,
                location: Location::new(Some("Centre".into()), Some("Centre A".into()), None),
            },
            Endpoint {
                level: Level::Agent,
                location: Location::new(
                    Some("Centre".into()),
                    Some("Centre A".into()),
                    Some("CSI Mvog-Ada".into()),
                ),
            },
            UserId::new(),
        );
        TransferRepository::create(repo, &transfer).await.unwrap();
        transfer
    }

    #[tokio::test]
    async fn test_receiver_accepts_once() {
        let repo = Arc::new(MemoryTransferRepository::new());
        let transfer = pending(&repo).await;
        let events = EventBus::default();
        let mut rx = events.subscribe();
        let uc = ResolveTransferUseCase::new(repo.clone(), events);
        let (agent, scope) = agent_user("CSI Mvog-Ada");

        let accepted = uc
            .execute(&agent, &scope, &transfer.id, TransferAction::Accept, None)
            .await
            .unwrap();
        assert_eq!(accepted.status, TransferStatus::Accepted);
        assert_eq!(accepted.resolved_by, Some(agent.user_id));
        assert_eq!(rx.recv().await.unwrap().event_type, "transfer.accepted");

        let again = uc
            .execute(&agent, &scope, &transfer.id, TransferAction::Reject, None)
            .await;
        assert!(matches!(again, Err(StockError::AlreadyResolved)));
    }

    #[tokio::test]
    async fn test_reject_keeps_reason() {
        let repo = Arc::new(MemoryTransferRepository::new());
        let transfer = pending(&repo).await;
        let uc = ResolveTransferUseCase::new(repo, EventBus::default());
        let (agent, scope) = agent_user("CSI Mvog-Ada");

        let rejected = uc
            .execute(
                &agent,
                &scope,
                &transfer.id,
                TransferAction::Reject,
                Some(" cold chain broken ".into()),
            )
            .await
            .unwrap();
        assert_eq!(rejected.status, TransferStatus::Rejected);
        assert_eq!(rejected.reason.as_deref(), Some("cold chain broken"));
    }

    #[tokio::test]
    async fn test_only_the_right_side_may_act() {
        let repo = Arc::new(MemoryTransferRepository::new());
        let transfer = pending(&repo).await;
        let uc = ResolveTransferUseCase::new(repo, EventBus::default());

        // the sender cannot accept
        let (district, d_scope) = district_user("Centre A");
        assert!(matches!(
            uc.execute(&district, &d_scope, &transfer.id, TransferAction::Accept, None)
                .await,
            Err(StockError::Forbidden(_))
        ));

        // the receiver cannot cancel
        let (agent, a_scope) = agent_user("CSI Mvog-Ada");
        assert!(matches!(
            uc.execute(&agent, &a_scope, &transfer.id, TransferAction::Cancel, None)
                .await,
            Err(StockError::Forbidden(_))
        ));

        // a regional user sees it but is neither side
        let (regional, r_scope) = regional_user("Centre");
        assert!(matches!(
            uc.execute(&regional, &r_scope, &transfer.id, TransferAction::Cancel, None)
                .await,
            Err(StockError::Forbidden(_))
        ));

        let cancelled = uc
            .execute(&district, &d_scope, &transfer.id, TransferAction::Cancel, None)
            .await
            .unwrap();
        assert_eq!(cancelled.status, TransferStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_invisible_or_missing_is_not_found() {
        let repo = Arc::new(MemoryTransferRepository::new());
        let transfer = pending(&repo).await;
        let uc = ResolveTransferUseCase::new(repo, EventBus::default());

        let (other, scope) = agent_user("CSI Nlongkak");
        assert!(matches!(
            uc.execute(&other, &scope, &transfer.id, TransferAction::Accept, None)
                .await,
            Err(StockError::NotFound)
        ));

        let (national, scope) = national_user();
        assert!(matches!(
            uc.execute(&national, &scope, &StockTransferId::new(), TransferAction::Accept, None)
                .await,
            Err(StockError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_pending_is_not_a_target() {
        let repo = Arc::new(MemoryTransferRepository::new());
        let transfer = pending(&repo).await;
        let uc = ResolveTransferUseCase::new(repo, EventBus::default());
        let (agent, scope) = agent_user("CSI Mvog-Ada");

        assert!(matches!(
            uc.to_status(&agent, &scope, &transfer.id, TransferStatus::Pending, None)
                .await,
            Err(StockError::InvalidTransition(_))
        ));
        let accepted = uc
            .to_status(&agent, &scope, &transfer.id, TransferStatus::Accepted, None)
            .await
            .unwrap();
        assert_eq!(accepted.status, TransferStatus::Accepted);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_accept_and_reject_have_one_winner() {
        for _ in 0..25 {
            let repo = Arc::new(MemoryTransferRepository::new());
            let transfer = pending(&repo).await;
            let uc = Arc::new(ResolveTransferUseCase::new(repo.clone(), EventBus::default()));
            let (agent, scope) = agent_user("CSI Mvog-Ada");

            let handles: Vec<_> = [TransferAction::Accept, TransferAction::Reject]
                .into_iter()
                .map(|action| {
                    let uc = uc.clone();
                    let agent = agent.clone();
                    let scope = scope.clone();
                    let id = transfer.id;
                    tokio::spawn(async move { uc.execute(&agent, &scope, &id, action, None).await })
                })
                .collect();

            let mut winners = 0;
            let mut losers = 0;
            for handle in handles {
                match handle.await.unwrap() {
                    Ok(_) => winners += 1,
                    Err(StockError::AlreadyResolved) => losers += 1,
                    Err(other) => panic!("unexpected error: {other}"),
                }
            }
            assert_eq!((winners, losers), (1, 1));

            let stored = TransferRepository::find_by_id(repo.as_ref(), &transfer.id)
                .await
                .unwrap()
                .unwrap();
            assert!(stored.status.is_terminal());
        }
    }
}
