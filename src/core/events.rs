use crate::domain::model::{LecturerId, ModuleId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Assigned,
    Unassigned,
}

/// Broadcast after a committed operation so other screens can resync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeNotification {
    pub lecturer_id: LecturerId,
    pub action: ChangeAction,
    pub affected_module_ids: Vec<ModuleId>,
    pub at: DateTime<Utc>,
}

impl ChangeNotification {
    pub fn new(lecturer_id: LecturerId, action: ChangeAction, affected_module_ids: Vec<ModuleId>) -> Self {
        Self {
            lecturer_id,
            action,
            affected_module_ids,
            at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChangeBroadcaster {
    tx: broadcast::Sender<ChangeNotification>,
}

impl ChangeBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish to current subscribers; nobody listening is not an error.
    pub fn publish(&self, notification: ChangeNotification) {
        match self.tx.send(notification) {
            Ok(count) => tracing::debug!("Change notification delivered to {} subscribers", count),
            Err(_) => tracing::debug!("Change notification dropped, no subscribers"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeNotification> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
