use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pairs exactly one client with one staff member.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub client_id: String,
    pub staff_id: String,
    pub created_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
}
