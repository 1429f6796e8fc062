//! In-process live event bus
//!
//! Domain crates publish [`LiveEvent`]s after a successful write; the
//! WebSocket endpoint subscribes and forwards the events each connection is
//! allowed to see. Events carry the [`Location`] they concern so subscribers
//! can filter them against an access scope.

use chrono::{DateTime, Utc};
use kernel::scope::Location;
use serde::Serialize;
use tokio::sync::broadcast;

/// ライブ更新イベント
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveEvent {
    /// ドット区切りのイベント名（例: `transfer.accepted`）
    pub event_type: String,
    /// 対象エンティティの ID
    pub entity_id: String,
    /// 対象の所在地（スコープ判定に使う）
    pub locations: Vec<Location>,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl LiveEvent {
    pub fn new(event_type: impl Into<String>, entity_id: impl ToString) -> Self {
        Self {
            event_type: event_type.into(),
            entity_id: entity_id.to_string(),
            locations: Vec::new(),
            payload: serde_json::Value::Null,
            timestamp: Utc::now(),
        }
    }

    /// 所在地を追加（移送は送り元と送り先の 2 つ）
    pub fn at(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// 受信側のバッファ容量
const DEFAULT_CAPACITY: usize = 256;

/// `tokio::sync::broadcast` を包んだ配信ハブ
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LiveEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// 購読者がいなければ破棄
    pub fn publish(&self, event: LiveEvent) {
        tracing::debug!(event_type = %event.event_type, entity_id = %event.entity_id, "Live event published");
        // SendError only means there are no subscribers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_every_subscriber() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(
            LiveEvent::new("child.registered", "42")
                .at(Location::new(Some("Littoral".into()), None, None)),
        );

        let e1 = rx1.recv().await.unwrap();
        let e2 = rx2.recv().await.unwrap();
        assert_eq!(e1.event_type, "child.registered");
        assert_eq!(e2.locations[0].region.as_deref(), Some("Littoral"));
    }

    #[test]
    fn publish_without_subscribers_is_dropped() {
        EventBus::default().publish(LiveEvent::new("orphan", "1"));
    }

    #[tokio::test]
    async fn slow_subscriber_observes_lag() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for i in 0..4 {
            bus.publish(LiveEvent::new("vaccination.recorded", i));
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(2))
        ));
        assert_eq!(rx.recv().await.unwrap().entity_id, "2");
    }

    #[test]
    fn event_serializes_camel_case() {
        let json = serde_json::to_value(LiveEvent::new("transfer.created", "t-1")).unwrap();
        assert_eq!(json["eventType"], "transfer.created");
        assert_eq!(json["entityId"], "t-1");
    }
}
