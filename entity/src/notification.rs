use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Created by trusted server-side writers only; the owner may flip `read`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub read: bool,
    pub metadata: Value,
}
