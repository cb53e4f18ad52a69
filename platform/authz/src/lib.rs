//! Access-control policy engine for the concierge document store.
//!
//! Every client-facing read or write is described as an [`AccessRequest`]
//! and judged by [`PolicyEngine::evaluate`] before it touches storage. The
//! engine is a pure predicate: its only inputs are the requester's verified
//! identity, the requester's role (resolved through the injected
//! [`ProfileLookup`], one hop into the `users` collection), the target
//! document, and for writes the proposed post-state. Anything not
//! explicitly allowed is denied.

mod request;
mod rules;

use thiserror::Error;

pub use entity::Role;
pub use request::{AccessRequest, Collection, Decision, DenyReason, Operation, Principal};

/// Read-only capability for the one-hop role lookup. Implemented by the
/// store over its own `users` collection; tests supply fixed maps.
pub trait ProfileLookup {
    fn role_of(&self, uid: &str) -> Option<Role>;
}

#[derive(Debug, Error)]
#[error("{operation} on {collection}/{document_id} denied: {reason}")]
pub struct PolicyViolation {
    pub operation: Operation,
    pub collection: Collection,
    pub document_id: String,
    pub reason: DenyReason,
}

/// Stateless evaluator; one instance serves every request concurrently.
#[derive(Default, Debug, Clone, Copy)]
pub struct PolicyEngine;

impl PolicyEngine {
    pub fn new() -> Self {
        Self
    }

    /// Decide ALLOW/DENY for a single operation. Fail-closed: unmatched
    /// combinations and malformed proposed documents both deny.
    pub fn evaluate(&self, profiles: &dyn ProfileLookup, request: &AccessRequest<'_>) -> Decision {
        match request.collection {
            Collection::Users => rules::users(request),
            Collection::Applications => rules::applications(profiles, request),
            Collection::Messages => rules::messages(request),
            Collection::Conversations => rules::conversations(request),
            Collection::Notifications => rules::notifications(request),
        }
    }

    /// [`evaluate`](Self::evaluate) as a `Result`, for callers that want to
    /// propagate the denial with `?`.
    pub fn check(
        &self,
        profiles: &dyn ProfileLookup,
        request: &AccessRequest<'_>,
    ) -> Result<(), PolicyViolation> {
        match self.evaluate(profiles, request) {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(PolicyViolation {
                operation: request.operation,
                collection: request.collection,
                document_id: request.document_id.to_string(),
                reason,
            }),
        }
    }
}
