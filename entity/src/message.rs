use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Chat message. Immutable once written; the store rejects updates and
/// deletes for every actor, so the thread doubles as an audit trail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}
