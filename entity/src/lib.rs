//! Document-shaped domain types shared across the workspace.
//!
//! Field names serialize in camelCase; they are the wire contract consumed
//! by the web client and the trusted server-side writers, so renaming one is
//! a breaking change.

mod application;
mod conversation;
mod message;
mod notification;
mod user;

pub use application::{Application, ApplicationStatus};
pub use conversation::Conversation;
pub use message::Message;
pub use notification::Notification;
pub use user::{Role, User, UserStatus};

/// Collection names as the document store knows them.
pub mod collections {
    pub const USERS: &str = "users";
    pub const APPLICATIONS: &str = "applications";
    pub const MESSAGES: &str = "messages";
    pub const CONVERSATIONS: &str = "conversations";
    pub const NOTIFICATIONS: &str = "notifications";
}
