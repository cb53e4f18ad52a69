//! Concierge server: configuration, HTTP surface, and trusted collaborators.

pub mod config;
pub mod http;
pub mod mail;
pub mod notify;
