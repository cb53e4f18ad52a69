//! Trusted fan-out when an application changes status: write a notification
//! document for the owning client and, when mail is configured, send the
//! transactional email. Runs as the service actor, outside the policy
//! engine, and never fails the triggering request.

use platform_authz::Collection;
use platform_db::{Actor, GuardedStore};
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use crate::mail::Mailer;

fn str_field<'a>(doc: &'a Value, field: &str) -> Option<&'a str> {
    doc.get(field).and_then(Value::as_str)
}

pub async fn application_status_changed(store: &GuardedStore, mailer: Option<&Mailer>, app: &Value) {
    let Some(client_id) = str_field(app, "clientId") else {
        warn!("application document missing clientId; skipping notification");
        return;
    };
    let status = str_field(app, "status").unwrap_or("updated");
    let app_id = str_field(app, "id").unwrap_or_default();

    let notification_id = format!("notif_{}", Uuid::new_v4().simple());
    let result = store.create(
        &Actor::Service,
        Collection::Notifications,
        &notification_id,
        json!({
            "userId": client_id,
            "type": "applicationStatus",
            "status": "delivered",
            "read": false,
            "metadata": { "applicationId": app_id, "newStatus": status },
        }),
    );
    if let Err(err) = result {
        warn!(%client_id, error = %err, "failed to write status notification");
    }

    let Some(mailer) = mailer else { return };
    let client = match store.get(&Actor::Service, Collection::Users, client_id) {
        Ok(doc) => doc,
        Err(err) => {
            warn!(%client_id, error = %err, "client profile missing; skipping email");
            return;
        }
    };
    let (Some(email), Some(name)) = (str_field(&client, "email"), str_field(&client, "name"))
    else {
        warn!(%client_id, "client profile incomplete; skipping email");
        return;
    };
    let outbound = mailer.application_status_email(
        email,
        name,
        str_field(app, "company").unwrap_or("the company"),
        str_field(app, "position").unwrap_or("the role"),
        status,
    );
    if let Err(err) = mailer.send(&outbound).await {
        warn!(%client_id, error = %err, "transactional email failed");
    }
}
