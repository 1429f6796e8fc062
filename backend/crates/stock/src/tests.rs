//! Unit tests for the transfer state machine and access rules

#[cfg(test)]
mod state_machine_tests {
    use crate::domain::services::check_transition;
    use crate::domain::value_objects::{TransferAction, TransferStatus};
    use crate::error::StockError;

    #[test]
    fn test_only_pending_moves() {
        for target in [
            TransferStatus::Accepted,
            TransferStatus::Rejected,
            TransferStatus::Cancelled,
        ] {
            assert!(TransferStatus::Pending.can_transition_to(target));
            assert!(check_transition(TransferStatus::Pending, target).is_ok());
        }

        for current in [
            TransferStatus::Accepted,
            TransferStatus::Rejected,
            TransferStatus::Cancelled,
        ] {
            assert!(current.is_terminal());
            for target in TransferStatus::ALL {
                assert!(!current.can_transition_to(target));
            }
            assert!(matches!(
                check_transition(current, TransferStatus::Accepted),
                Err(StockError::AlreadyResolved)
            ));
        }
    }

    #[test]
    fn test_pending_is_never_a_target() {
        assert!(!TransferStatus::Pending.can_transition_to(TransferStatus::Pending));
        assert!(matches!(
            check_transition(TransferStatus::Pending, TransferStatus::Pending),
            Err(StockError::InvalidTransition(_))
        ));
        assert!(matches!(
            check_transition(TransferStatus::Accepted, TransferStatus::Pending),
            Err(StockError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_actions_map_to_targets() {
        assert_eq!(
            TransferAction::for_target(TransferStatus::Rejected),
            Some(TransferAction::Reject)
        );
        assert_eq!(TransferAction::for_target(TransferStatus::Pending), None);
        assert!(TransferAction::Accept.is_receiver_side());
        assert!(!TransferAction::Cancel.is_receiver_side());
        assert_eq!(TransferAction::Cancel.event_type(), "transfer.cancelled");
    }

    #[test]
    fn test_status_codes() {
        for status in TransferStatus::ALL {
            assert_eq!(TransferStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(TransferStatus::from_code("done"), None);
        assert_eq!(
            serde_json::to_string(&TransferStatus::Cancelled).unwrap(),
            r#""cancelled""#
        );
    }
}

#[cfg(test)]
mod visibility_tests {
    use crate::domain::entities::{Endpoint, StockTransfer};
    use crate::domain::services::{is_visible, pending_in, transfer_visibility};
    use kernel::id::UserId;
    use kernel::scope::{AccessScope, Level, Location};

    fn regional_to_district() -> StockTransfer {
        StockTransfer::new(
            "Rougeole".into(),
            "LOT-R".into(),
            10,
            Endpoint {
                level: Level::Regional,
                location: Location::new(Some("Littoral".into()), None, None),
            },
            Endpoint {
                level: Level::District,
                location: Location::new(Some("Littoral".into()), Some("Douala 1".into()), None),
            },
            UserId::new(),
        )
    }

    #[test]
    fn test_either_endpoint_makes_it_visible() {
        let transfer = regional_to_district();
        let region = AccessScope::Regional {
            region: "Littoral".into(),
        };
        let district = AccessScope::District {
            district: "Douala 1".into(),
        };
        let elsewhere = AccessScope::District {
            district: "Centre A".into(),
        };

        for scope in [&region, &district, &AccessScope::National] {
            assert!(is_visible(scope, &transfer));
            assert!(transfer_visibility(scope).matches(&transfer));
        }
        assert!(!is_visible(&elsewhere, &transfer));
        assert!(!transfer_visibility(&elsewhere).matches(&transfer));
    }

    #[test]
    fn test_pending_filter_drops_resolved() {
        let mut transfer = regional_to_district();
        let scope = AccessScope::National;
        assert!(pending_in(&scope).matches(&transfer));

        transfer.status = crate::domain::value_objects::TransferStatus::Cancelled;
        assert!(!pending_in(&scope).matches(&transfer));
    }
}
