use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Primary axis of the access policy.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    Client,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::Client => "client",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Role::Admin),
            "staff" => Some(Role::Staff),
            "client" => Some(Role::Client),
            _ => None,
        }
    }

    /// Admin and staff are back-office roles.
    pub fn is_back_office(self) -> bool {
        matches!(self, Role::Admin | Role::Staff)
    }
}

/// Client lifecycle stage; distinct from role.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserStatus {
    PendingProfile,
    Waitlisted,
    Active,
}

impl UserStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UserStatus::PendingProfile => "pendingProfile",
            UserStatus::Waitlisted => "waitlisted",
            UserStatus::Active => "active",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pendingProfile" => Some(UserStatus::PendingProfile),
            "waitlisted" => Some(UserStatus::Waitlisted),
            "active" => Some(UserStatus::Active),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub status: UserStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
    /// Staff member responsible for this client, once assigned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_staff_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Fresh sign-up document: every account starts as a pending client.
    pub fn signup(id: impl Into<String>, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: name.into(),
            role: Role::Client,
            status: UserStatus::PendingProfile,
            headline: None,
            resume_url: None,
            assigned_staff_id: None,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_wire_names() {
        for role in [Role::Admin, Role::Staff, Role::Client] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn status_uses_camel_case_wire_names() {
        assert_eq!(UserStatus::PendingProfile.as_str(), "pendingProfile");
        assert_eq!(UserStatus::parse("waitlisted"), Some(UserStatus::Waitlisted));
        assert_eq!(UserStatus::parse("PENDING"), None);
    }

    #[test]
    fn signup_defaults_to_pending_client() {
        let user = User::signup("client_789", "c@example.com", "Casey");
        assert_eq!(user.role, Role::Client);
        assert_eq!(user.status, UserStatus::PendingProfile);
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["role"], "client");
        assert_eq!(value["status"], "pendingProfile");
        assert!(value.get("assignedStaffId").is_none());
    }
}
