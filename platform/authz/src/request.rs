use std::fmt;

use entity::Role;
use serde_json::Value;

/// Store-level operation being authorized. List requests are authorized per
/// document with [`Operation::Get`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Operation {
    Get,
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Get => "get",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Known collections. A closed set: requests against anything else never
/// reach the engine and are rejected upstream.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Users,
    Applications,
    Messages,
    Conversations,
    Notifications,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Collection::Users => entity::collections::USERS,
            Collection::Applications => entity::collections::APPLICATIONS,
            Collection::Messages => entity::collections::MESSAGES,
            Collection::Conversations => entity::collections::CONVERSATIONS,
            Collection::Notifications => entity::collections::NOTIFICATIONS,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            entity::collections::USERS => Some(Collection::Users),
            entity::collections::APPLICATIONS => Some(Collection::Applications),
            entity::collections::MESSAGES => Some(Collection::Messages),
            entity::collections::CONVERSATIONS => Some(Collection::Conversations),
            entity::collections::NOTIFICATIONS => Some(Collection::Notifications),
            _ => None,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Verified requester identity. `role` is resolved from the requester's own
/// `users` document; a freshly signed-up identity has no profile yet and
/// therefore no role.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Principal {
    pub uid: String,
    pub role: Option<Role>,
}

impl Principal {
    pub fn new(uid: impl Into<String>, role: Option<Role>) -> Self {
        Self {
            uid: uid.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }

    pub fn is_staff(&self) -> bool {
        self.role == Some(Role::Staff)
    }

    pub fn is_back_office(&self) -> bool {
        self.role.is_some_and(Role::is_back_office)
    }
}

/// One document access, fully described. `existing` carries the stored
/// document for get/update/delete; `proposed` carries the post-state for
/// create/update (updates are judged on the merged document, so a partial
/// patch cannot hide an untouched field from the policy).
#[derive(Clone, Copy, Debug)]
pub struct AccessRequest<'a> {
    pub principal: &'a Principal,
    pub operation: Operation,
    pub collection: Collection,
    pub document_id: &'a str,
    pub existing: Option<&'a Value>,
    pub proposed: Option<&'a Value>,
}

impl AccessRequest<'_> {
    pub(crate) fn is_self(&self) -> bool {
        self.principal.uid == self.document_id
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DenyReason {
    /// Matched a rule and failed it, or matched nothing at all.
    Forbidden,
    /// Proposed document failed a shape check; names the offending field.
    Malformed(&'static str),
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::Forbidden => f.write_str("forbidden"),
            DenyReason::Malformed(field) => write!(f, "malformed field `{field}`"),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allow(self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub(crate) fn forbidden() -> Self {
        Decision::Deny(DenyReason::Forbidden)
    }

    pub(crate) fn malformed(field: &'static str) -> Self {
        Decision::Deny(DenyReason::Malformed(field))
    }

    /// Allow when the condition holds, otherwise a plain Forbidden.
    pub(crate) fn allow_if(condition: bool) -> Self {
        if condition {
            Decision::Allow
        } else {
            Decision::forbidden()
        }
    }
}
