use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

/// Per-user channel capacity. A browser client that lags this far behind is
/// dropped by the broadcast channel and reconnects.
const CHANNEL_CAPACITY: usize = 64;

/// One event pushed to a live client.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundEvent {
    pub event: String,
    pub payload: Value,
}

impl OutboundEvent {
    pub fn new(event: impl Into<String>, payload: Value) -> Self {
        Self {
            event: event.into(),
            payload,
        }
    }
}

struct UserChannel {
    sender: broadcast::Sender<OutboundEvent>,
    connections: HashSet<Uuid>,
}

#[derive(Default)]
struct RegistryInner {
    users: HashMap<String, UserChannel>,
    rooms: HashMap<String, HashSet<String>>,
}

/// In-process registry tying live connections to employee ids and rooms.
///
/// Injected as shared state so connect/disconnect lifecycle stays explicit and
/// the whole thing is testable without any socket layer. An employee may hold
/// several simultaneous connections (multiple tabs); all of them share one
/// broadcast channel.
pub struct ConnectionRegistry {
    inner: RwLock<RegistryInner>,
}

pub type SharedRegistry = Arc<ConnectionRegistry>;

impl ConnectionRegistry {
    pub fn new() -> SharedRegistry {
        Arc::new(Self {
            inner: RwLock::new(RegistryInner::default()),
        })
    }

    /// Registers a connection for `employee` and returns its id together with
    /// the event stream to forward to the client.
    pub async fn register_user(
        &self,
        employee: &str,
    ) -> (Uuid, broadcast::Receiver<OutboundEvent>) {
        let connection_id = Uuid::new_v4();
        let mut inner = self.inner.write().await;
        let channel = inner
            .users
            .entry(employee.to_string())
            .or_insert_with(|| {
                let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
                UserChannel {
                    sender,
                    connections: HashSet::new(),
                }
            });
        channel.connections.insert(connection_id);
        let receiver = channel.sender.subscribe();
        (connection_id, receiver)
    }

    /// Drops one connection. When the employee's last connection goes away the
    /// channel is removed and the employee leaves every room.
    pub async fn unregister_user(&self, employee: &str, connection_id: Uuid) {
        let mut inner = self.inner.write().await;
        let last_connection = match inner.users.get_mut(employee) {
            Some(channel) => {
                channel.connections.remove(&connection_id);
                channel.connections.is_empty()
            }
            None => return,
        };
        if last_connection {
            inner.users.remove(employee);
            for members in inner.rooms.values_mut() {
                members.remove(employee);
            }
            inner.rooms.retain(|_, members| !members.is_empty());
        }
    }

    pub async fn join_room(&self, room: &str, employee: &str) {
        let mut inner = self.inner.write().await;
        inner
            .rooms
            .entry(room.to_string())
            .or_default()
            .insert(employee.to_string());
    }

    pub async fn leave_room(&self, room: &str, employee: &str) {
        let mut inner = self.inner.write().await;
        if let Some(members) = inner.rooms.get_mut(room) {
            members.remove(employee);
            if members.is_empty() {
                inner.rooms.remove(room);
            }
        }
    }

    /// Sends to every live connection of one employee. Returns `false` when
    /// the employee is offline; callers treat that as "persisted, will be seen
    /// on next fetch".
    pub async fn emit_to_user(&self, employee: &str, event: OutboundEvent) -> bool {
        let inner = self.inner.read().await;
        match inner.users.get(employee) {
            Some(channel) => channel.sender.send(event).is_ok(),
            None => false,
        }
    }

    /// Fans an event out to every member of a room. Returns how many members
    /// it reached.
    pub async fn emit_to_room(&self, room: &str, event: OutboundEvent) -> usize {
        let inner = self.inner.read().await;
        let Some(members) = inner.rooms.get(room) else {
            return 0;
        };
        let mut delivered = 0;
        for member in members {
            if let Some(channel) = inner.users.get(member) {
                if channel.sender.send(event.clone()).is_ok() {
                    delivered += 1;
                }
            }
        }
        delivered
    }

    /// True while the employee holds at least one live connection.
    pub async fn is_connected(&self, employee: &str) -> bool {
        self.inner.read().await.users.contains_key(employee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn registered_user_receives_events() {
        let registry = ConnectionRegistry::new();
        let (_, mut rx) = registry.register_user("E1").await;

        let delivered = registry
            .emit_to_user("E1", OutboundEvent::new("notification", json!({ "id": 1 })))
            .await;
        assert!(delivered);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event, "notification");
        assert_eq!(event.payload["id"], 1);
    }

    #[tokio::test]
    async fn offline_user_reports_not_delivered() {
        let registry = ConnectionRegistry::new();
        let delivered = registry
            .emit_to_user("ghost", OutboundEvent::new("notification", json!({})))
            .await;
        assert!(!delivered);
    }

    #[tokio::test]
    async fn unregister_last_connection_disconnects() {
        let registry = ConnectionRegistry::new();
        let (conn, _rx) = registry.register_user("E1").await;
        assert!(registry.is_connected("E1").await);

        registry.unregister_user("E1", conn).await;
        assert!(!registry.is_connected("E1").await);
    }

    #[tokio::test]
    async fn second_tab_keeps_user_connected() {
        let registry = ConnectionRegistry::new();
        let (first, _rx1) = registry.register_user("E1").await;
        let (_second, mut rx2) = registry.register_user("E1").await;

        registry.unregister_user("E1", first).await;
        assert!(registry.is_connected("E1").await);

        registry
            .emit_to_user("E1", OutboundEvent::new("ping", json!({})))
            .await;
        assert_eq!(rx2.recv().await.unwrap().event, "ping");
    }

    #[tokio::test]
    async fn room_emit_reaches_members_only() {
        let registry = ConnectionRegistry::new();
        let (_, mut in_room) = registry.register_user("E1").await;
        let (_, mut outside) = registry.register_user("E2").await;

        registry.join_room("task:7", "E1").await;
        let delivered = registry
            .emit_to_room("task:7", OutboundEvent::new("chat", json!({ "body": "hi" })))
            .await;

        assert_eq!(delivered, 1);
        assert_eq!(in_room.recv().await.unwrap().event, "chat");
        assert!(outside.try_recv().is_err());
    }

    #[tokio::test]
    async fn leaving_a_room_stops_delivery() {
        let registry = ConnectionRegistry::new();
        let (_, _rx) = registry.register_user("E1").await;
        registry.join_room("task:7", "E1").await;
        registry.leave_room("task:7", "E1").await;

        let delivered = registry
            .emit_to_room("task:7", OutboundEvent::new("chat", json!({})))
            .await;
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn disconnect_removes_room_membership() {
        let registry = ConnectionRegistry::new();
        let (conn, _rx) = registry.register_user("E1").await;
        registry.join_room("task:7", "E1").await;
        registry.unregister_user("E1", conn).await;

        let delivered = registry
            .emit_to_room("task:7", OutboundEvent::new("chat", json!({})))
            .await;
        assert_eq!(delivered, 0);
    }
}
