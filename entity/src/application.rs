use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Applied,
    Interview,
    Offer,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Offer => "offer",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "applied" => Some(ApplicationStatus::Applied),
            "interview" => Some(ApplicationStatus::Interview),
            "offer" => Some(ApplicationStatus::Offer),
            "rejected" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }
}

/// A job application filed on a client's behalf. Owned by the referenced
/// client, operated by the assigned staff member.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_staff_id: Option<String>,
    pub company: String,
    pub position: String,
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_wire_values() {
        assert_eq!(
            ApplicationStatus::parse("interview"),
            Some(ApplicationStatus::Interview)
        );
        assert_eq!(ApplicationStatus::parse("ghosted"), None);
    }

    #[test]
    fn serializes_foreign_keys_in_camel_case() {
        let app = Application {
            id: "app_123".into(),
            client_id: "client_789".into(),
            assigned_staff_id: Some("staff_456".into()),
            company: "ACME".into(),
            position: "Engineer".into(),
            status: ApplicationStatus::Applied,
            notes: None,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&app).unwrap();
        assert_eq!(value["clientId"], "client_789");
        assert_eq!(value["assignedStaffId"], "staff_456");
        assert_eq!(value["status"], "applied");
    }
}
