//! Per-collection decision rules.
//!
//! Each rule is a small predicate over the request; helpers keep the
//! decision table legible. Updates always see the merged post-state, so
//! "field unchanged" checks cover partial patches too.

use entity::{ApplicationStatus, Role, UserStatus};
use serde_json::Value;

use crate::request::{AccessRequest, Decision, Operation};
use crate::ProfileLookup;

fn str_field<'a>(doc: &'a Value, field: &str) -> Option<&'a str> {
    doc.get(field).and_then(Value::as_str)
}

fn field_unchanged(existing: &Value, proposed: &Value, field: &str) -> bool {
    existing.get(field) == proposed.get(field)
}

/// True when every field other than the listed ones carries the same value
/// in both documents.
fn unchanged_except(existing: &Value, proposed: &Value, allowed: &[&str]) -> bool {
    let (Some(before), Some(after)) = (existing.as_object(), proposed.as_object()) else {
        return false;
    };
    before
        .keys()
        .chain(after.keys())
        .all(|key| allowed.contains(&key.as_str()) || before.get(key) == after.get(key))
}

fn require_str(doc: &Value, fields: &[&'static str]) -> Option<Decision> {
    fields
        .iter()
        .find(|field| str_field(doc, field).is_none())
        .map(|field| Decision::malformed(field))
}

pub(crate) fn users(req: &AccessRequest<'_>) -> Decision {
    match req.operation {
        Operation::Get => Decision::allow_if(req.is_self() || req.principal.is_back_office()),
        Operation::Create => {
            let Some(proposed) = req.proposed else {
                return Decision::malformed("document");
            };
            if let Some(deny) = require_str(proposed, &["email", "name", "role", "status"]) {
                return deny;
            }
            let Some(role) = str_field(proposed, "role").and_then(Role::parse) else {
                return Decision::malformed("role");
            };
            let Some(status) = str_field(proposed, "status").and_then(UserStatus::parse) else {
                return Decision::malformed("status");
            };
            if req.principal.is_admin() {
                return Decision::Allow;
            }
            // Sign-up: an identity may create its own document, but only as
            // a pending client. Role is never self-assignable.
            Decision::allow_if(
                req.is_self() && role == Role::Client && status == UserStatus::PendingProfile,
            )
        }
        Operation::Update => {
            let (Some(existing), Some(proposed)) = (req.existing, req.proposed) else {
                return Decision::malformed("document");
            };
            if req.principal.is_admin() {
                return Decision::Allow;
            }
            if req.is_self() {
                // Profile fields only: role and status stay staff/admin
                // concerns even on the requester's own record.
                return Decision::allow_if(
                    field_unchanged(existing, proposed, "role")
                        && field_unchanged(existing, proposed, "status"),
                );
            }
            if req.principal.is_staff() {
                let target_role = str_field(existing, "role").and_then(Role::parse);
                // Staff manage client records but never touch another staff
                // or admin record, and never change a role.
                return Decision::allow_if(
                    target_role == Some(Role::Client)
                        && field_unchanged(existing, proposed, "role"),
                );
            }
            Decision::forbidden()
        }
        // Accounts are never deleted in-band; status transitions only.
        Operation::Delete => Decision::forbidden(),
    }
}

pub(crate) fn applications(profiles: &dyn ProfileLookup, req: &AccessRequest<'_>) -> Decision {
    match req.operation {
        Operation::Get => {
            let Some(existing) = req.existing else {
                return Decision::forbidden();
            };
            if req.principal.is_admin() {
                return Decision::Allow;
            }
            let uid = req.principal.uid.as_str();
            Decision::allow_if(
                str_field(existing, "clientId") == Some(uid)
                    || str_field(existing, "assignedStaffId") == Some(uid),
            )
        }
        Operation::Create => {
            // Applications are filed by the concierge team, never by the
            // client themselves.
            if !req.principal.is_back_office() {
                return Decision::forbidden();
            }
            let Some(proposed) = req.proposed else {
                return Decision::malformed("document");
            };
            if let Some(deny) = require_str(proposed, &["clientId", "company", "position"]) {
                return deny;
            }
            if str_field(proposed, "status")
                .and_then(ApplicationStatus::parse)
                .is_none()
            {
                return Decision::malformed("status");
            }
            let Some(client_id) = str_field(proposed, "clientId") else {
                return Decision::malformed("clientId");
            };
            // One-hop referential check: the owner must be an existing
            // client account.
            if profiles.role_of(client_id) != Some(Role::Client) {
                return Decision::malformed("clientId");
            }
            Decision::Allow
        }
        Operation::Update => {
            let (Some(existing), Some(proposed)) = (req.existing, req.proposed) else {
                return Decision::malformed("document");
            };
            if proposed.get("status").is_some()
                && str_field(proposed, "status")
                    .and_then(ApplicationStatus::parse)
                    .is_none()
            {
                return Decision::malformed("status");
            }
            if req.principal.is_admin() {
                return Decision::Allow;
            }
            let uid = req.principal.uid.as_str();
            Decision::allow_if(
                str_field(existing, "assignedStaffId") == Some(uid)
                    && field_unchanged(existing, proposed, "clientId"),
            )
        }
        Operation::Delete => Decision::forbidden(),
    }
}

pub(crate) fn messages(req: &AccessRequest<'_>) -> Decision {
    match req.operation {
        Operation::Get => {
            let Some(existing) = req.existing else {
                return Decision::forbidden();
            };
            let uid = req.principal.uid.as_str();
            Decision::allow_if(
                str_field(existing, "senderId") == Some(uid)
                    || str_field(existing, "recipientId") == Some(uid),
            )
        }
        Operation::Create => {
            let Some(proposed) = req.proposed else {
                return Decision::malformed("document");
            };
            if let Some(deny) = require_str(
                proposed,
                &["conversationId", "senderId", "recipientId", "content"],
            ) {
                return deny;
            }
            Decision::allow_if(str_field(proposed, "senderId") == Some(req.principal.uid.as_str()))
        }
        // Append-only: no actor, admin included, rewrites chat history.
        Operation::Update | Operation::Delete => Decision::forbidden(),
    }
}

pub(crate) fn conversations(req: &AccessRequest<'_>) -> Decision {
    let uid = req.principal.uid.as_str();
    let is_participant =
        |doc: &Value| str_field(doc, "clientId") == Some(uid) || str_field(doc, "staffId") == Some(uid);
    match req.operation {
        Operation::Get => {
            let Some(existing) = req.existing else {
                return Decision::forbidden();
            };
            Decision::allow_if(req.principal.is_admin() || is_participant(existing))
        }
        Operation::Create => {
            let Some(proposed) = req.proposed else {
                return Decision::malformed("document");
            };
            if let Some(deny) = require_str(proposed, &["clientId", "staffId"]) {
                return deny;
            }
            Decision::allow_if(is_participant(proposed))
        }
        Operation::Update => {
            let (Some(existing), Some(proposed)) = (req.existing, req.proposed) else {
                return Decision::malformed("document");
            };
            if req.principal.is_admin() {
                return Decision::Allow;
            }
            // Participants may bump lastMessageAt and the like, but the
            // pairing itself is fixed at creation.
            Decision::allow_if(
                is_participant(existing)
                    && field_unchanged(existing, proposed, "clientId")
                    && field_unchanged(existing, proposed, "staffId"),
            )
        }
        Operation::Delete => Decision::forbidden(),
    }
}

pub(crate) fn notifications(req: &AccessRequest<'_>) -> Decision {
    match req.operation {
        Operation::Get => {
            let Some(existing) = req.existing else {
                return Decision::forbidden();
            };
            Decision::allow_if(
                req.principal.is_admin()
                    || str_field(existing, "userId") == Some(req.principal.uid.as_str()),
            )
        }
        // Only trusted server-side writers create notifications; they
        // bypass the engine entirely.
        Operation::Create => Decision::forbidden(),
        Operation::Update => {
            let (Some(existing), Some(proposed)) = (req.existing, req.proposed) else {
                return Decision::malformed("document");
            };
            if req.principal.is_admin() {
                return Decision::Allow;
            }
            // Read receipt only: the owner may flip `read`, nothing else.
            Decision::allow_if(
                str_field(existing, "userId") == Some(req.principal.uid.as_str())
                    && unchanged_except(existing, proposed, &["read"]),
            )
        }
        Operation::Delete => Decision::forbidden(),
    }
}
