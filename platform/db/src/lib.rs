//! Document store with the policy engine wired in front of every operation.
//!
//! [`GuardedStore`] is the only data-access surface the HTTP layer sees.
//! Client-facing calls run as [`Actor::User`] and are judged by
//! `platform-authz` before any mutation is applied; [`Actor::Service`] is
//! the trusted path for server-side writers (notification fan-out, seeding)
//! and bypasses the engine the way an admin SDK bypasses platform rules.
//!
//! Decisions happen before storage is touched, so a denied request has no
//! partial effect to roll back.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use entity::Role;
use platform_authz::{
    AccessRequest, Collection, Decision, DenyReason, Operation, PolicyEngine, Principal,
    ProfileLookup,
};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The policy engine returned DENY for an existing document.
    #[error("permission denied")]
    PermissionDenied,
    /// No such document. Distinct from DENY: absence itself is not
    /// protected data in this model.
    #[error("document not found")]
    NotFound,
    /// Proposed document failed a shape check; treated as a denial.
    #[error("malformed document: field `{0}`")]
    Malformed(&'static str),
    #[error("document already exists: {0}")]
    AlreadyExists(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Who is performing a store operation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Actor {
    /// Trusted server-side writer; not subject to the policy engine.
    Service,
    /// Authenticated end user, identified by verified uid.
    User(String),
}

impl Actor {
    pub fn user(uid: impl Into<String>) -> Self {
        Actor::User(uid.into())
    }
}

#[derive(Default, Debug)]
struct Collections {
    docs: HashMap<Collection, BTreeMap<String, Value>>,
}

impl Collections {
    fn doc(&self, collection: Collection, id: &str) -> Option<&Value> {
        self.docs.get(&collection).and_then(|docs| docs.get(id))
    }
}

impl ProfileLookup for Collections {
    fn role_of(&self, uid: &str) -> Option<Role> {
        self.doc(Collection::Users, uid)
            .and_then(|doc| doc.get("role"))
            .and_then(Value::as_str)
            .and_then(Role::parse)
    }
}

/// In-memory collections behind an `RwLock`, every client-facing operation
/// checked by the policy engine under the same lock as the one-hop profile
/// lookup.
#[derive(Default, Debug)]
pub struct GuardedStore {
    engine: PolicyEngine,
    collections: RwLock<Collections>,
}

impl GuardedStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Collections> {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Collections> {
        self.collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn authorize(
        &self,
        cols: &Collections,
        uid: &str,
        operation: Operation,
        collection: Collection,
        document_id: &str,
        existing: Option<&Value>,
        proposed: Option<&Value>,
    ) -> StoreResult<()> {
        let principal = Principal::new(uid, cols.role_of(uid));
        let request = AccessRequest {
            principal: &principal,
            operation,
            collection,
            document_id,
            existing,
            proposed,
        };
        match self.engine.evaluate(cols, &request) {
            Decision::Allow => Ok(()),
            Decision::Deny(DenyReason::Forbidden) => Err(StoreError::PermissionDenied),
            Decision::Deny(DenyReason::Malformed(field)) => Err(StoreError::Malformed(field)),
        }
    }

    pub fn get(&self, actor: &Actor, collection: Collection, id: &str) -> StoreResult<Value> {
        let cols = self.read();
        let doc = cols.doc(collection, id).ok_or(StoreError::NotFound)?;
        if let Actor::User(uid) = actor {
            self.authorize(&cols, uid, Operation::Get, collection, id, Some(doc), None)?;
        }
        Ok(doc.clone())
    }

    /// Readable documents only: each candidate is judged as a get and
    /// silently omitted when denied.
    pub fn list(&self, actor: &Actor, collection: Collection) -> StoreResult<Vec<Value>> {
        let cols = self.read();
        let Some(docs) = cols.docs.get(&collection) else {
            return Ok(Vec::new());
        };
        match actor {
            Actor::Service => Ok(docs.values().cloned().collect()),
            Actor::User(uid) => {
                let principal = Principal::new(uid, cols.role_of(uid));
                let visible = docs
                    .iter()
                    .filter(|(id, doc)| {
                        let request = AccessRequest {
                            principal: &principal,
                            operation: Operation::Get,
                            collection,
                            document_id: id,
                            existing: Some(doc),
                            proposed: None,
                        };
                        self.engine.evaluate(&*cols, &request).is_allow()
                    })
                    .map(|(_, doc)| doc.clone())
                    .collect();
                Ok(visible)
            }
        }
    }

    pub fn create(
        &self,
        actor: &Actor,
        collection: Collection,
        id: &str,
        mut doc: Value,
    ) -> StoreResult<Value> {
        if !doc.is_object() {
            return Err(StoreError::Malformed("document"));
        }
        let mut cols = self.write();
        if cols.doc(collection, id).is_some() {
            return Err(StoreError::AlreadyExists(id.to_string()));
        }
        if let Actor::User(uid) = actor {
            self.authorize(&cols, uid, Operation::Create, collection, id, None, Some(&doc))?;
        }
        if let Some(map) = doc.as_object_mut() {
            map.entry("id")
                .or_insert_with(|| Value::String(id.to_string()));
        }
        cols.docs
            .entry(collection)
            .or_default()
            .insert(id.to_string(), doc.clone());
        Ok(doc)
    }

    /// Shallow-merges the patch over the stored document and authorizes the
    /// merged post-state, so a partial patch is judged with every untouched
    /// field still in view.
    pub fn update(
        &self,
        actor: &Actor,
        collection: Collection,
        id: &str,
        patch: Value,
    ) -> StoreResult<Value> {
        let Some(patch_fields) = patch.as_object() else {
            return Err(StoreError::Malformed("document"));
        };
        let mut cols = self.write();
        let existing = cols.doc(collection, id).ok_or(StoreError::NotFound)?.clone();
        let mut merged = existing.clone();
        if let Some(fields) = merged.as_object_mut() {
            for (key, value) in patch_fields {
                fields.insert(key.clone(), value.clone());
            }
        }
        if let Actor::User(uid) = actor {
            self.authorize(
                &cols,
                uid,
                Operation::Update,
                collection,
                id,
                Some(&existing),
                Some(&merged),
            )?;
        }
        cols.docs
            .entry(collection)
            .or_default()
            .insert(id.to_string(), merged.clone());
        Ok(merged)
    }

    pub fn delete(&self, actor: &Actor, collection: Collection, id: &str) -> StoreResult<()> {
        let mut cols = self.write();
        let existing = cols.doc(collection, id).ok_or(StoreError::NotFound)?.clone();
        if let Actor::User(uid) = actor {
            self.authorize(
                &cols,
                uid,
                Operation::Delete,
                collection,
                id,
                Some(&existing),
                None,
            )?;
        }
        if let Some(docs) = cols.docs.get_mut(&collection) {
            docs.remove(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn seeded() -> GuardedStore {
        let store = GuardedStore::new();
        let service = Actor::Service;
        for (id, role) in [
            ("admin_123", "admin"),
            ("staff_456", "staff"),
            ("client_789", "client"),
            ("client_901", "client"),
        ] {
            store
                .create(
                    &service,
                    Collection::Users,
                    id,
                    json!({
                        "id": id,
                        "email": format!("{id}@example.com"),
                        "name": id,
                        "role": role,
                        "status": "active",
                    }),
                )
                .unwrap();
        }
        store
            .create(
                &service,
                Collection::Applications,
                "app_123",
                json!({
                    "clientId": "client_789",
                    "assignedStaffId": "staff_456",
                    "company": "ACME",
                    "position": "Engineer",
                    "status": "applied",
                }),
            )
            .unwrap();
        store
            .create(
                &service,
                Collection::Notifications,
                "notif_1",
                json!({
                    "userId": "client_789",
                    "type": "applicationStatus",
                    "status": "delivered",
                    "read": false,
                    "metadata": {},
                }),
            )
            .unwrap();
        store
    }

    #[test]
    fn missing_document_is_not_found_denied_document_is_permission_denied() {
        let store = seeded();
        let client = Actor::user("client_789");
        assert_eq!(
            store.get(&client, Collection::Applications, "app_999"),
            Err(StoreError::NotFound)
        );
        let stranger = Actor::user("client_901");
        assert_eq!(
            store.get(&stranger, Collection::Applications, "app_123"),
            Err(StoreError::PermissionDenied)
        );
    }

    #[test]
    fn denied_update_leaves_document_untouched() {
        let store = seeded();
        let client = Actor::user("client_789");
        let before = store
            .get(&Actor::Service, Collection::Users, "admin_123")
            .unwrap();
        assert_eq!(
            store.update(
                &client,
                Collection::Users,
                "admin_123",
                json!({ "name": "Hacked Admin" }),
            ),
            Err(StoreError::PermissionDenied)
        );
        let after = store
            .get(&Actor::Service, Collection::Users, "admin_123")
            .unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn merge_patch_is_judged_on_post_state() {
        let store = seeded();
        let client = Actor::user("client_789");
        // Untouched fields stay visible to the policy: a partial patch
        // cannot smuggle a role change past the diff check.
        assert_eq!(
            store.update(
                &client,
                Collection::Users,
                "client_789",
                json!({ "role": "admin" }),
            ),
            Err(StoreError::PermissionDenied)
        );
        let updated = store
            .update(
                &client,
                Collection::Users,
                "client_789",
                json!({ "headline": "Open to work" }),
            )
            .unwrap();
        assert_eq!(updated["headline"], "Open to work");
        assert_eq!(updated["role"], "client");
    }

    #[test]
    fn list_filters_to_readable_documents() {
        let store = seeded();

        let staff_view = store
            .list(&Actor::user("staff_456"), Collection::Users)
            .unwrap();
        assert_eq!(staff_view.len(), 4);

        let client_view = store
            .list(&Actor::user("client_789"), Collection::Users)
            .unwrap();
        assert_eq!(client_view.len(), 1);
        assert_eq!(client_view[0]["id"], "client_789");

        let stranger_apps = store
            .list(&Actor::user("client_901"), Collection::Applications)
            .unwrap();
        assert!(stranger_apps.is_empty());
    }

    #[test]
    fn service_writes_bypass_the_policy() {
        let store = seeded();
        // No end user may create notifications, the service may.
        assert_eq!(
            store.create(
                &Actor::user("admin_123"),
                Collection::Notifications,
                "notif_2",
                json!({ "userId": "client_789", "type": "misc", "status": "delivered", "read": false, "metadata": {} }),
            ),
            Err(StoreError::PermissionDenied)
        );
        store
            .create(
                &Actor::Service,
                Collection::Notifications,
                "notif_2",
                json!({ "userId": "client_789", "type": "misc", "status": "delivered", "read": false, "metadata": {} }),
            )
            .unwrap();
    }

    #[test]
    fn fresh_identity_can_sign_up_once() {
        let store = seeded();
        let newcomer = Actor::user("newcomer_1");
        let doc = json!({
            "email": "new@example.com",
            "name": "New",
            "role": "client",
            "status": "pendingProfile",
        });
        let created = store
            .create(&newcomer, Collection::Users, "newcomer_1", doc.clone())
            .unwrap();
        assert_eq!(created["id"], "newcomer_1");
        assert_eq!(
            store.create(&newcomer, Collection::Users, "newcomer_1", doc),
            Err(StoreError::AlreadyExists("newcomer_1".into()))
        );
    }

    #[test]
    fn non_object_documents_are_rejected() {
        let store = seeded();
        assert_eq!(
            store.create(&Actor::Service, Collection::Messages, "msg_x", json!("nope")),
            Err(StoreError::Malformed("document"))
        );
        assert_eq!(
            store.update(&Actor::Service, Collection::Users, "client_789", json!(42)),
            Err(StoreError::Malformed("document"))
        );
    }
}
