//! Transactional email collaborator.
//!
//! Template content stays deliberately minimal; the contract that matters is
//! the outbound payload shape the third-party email API expects.

use anyhow::{ensure, Context, Result};
use serde::Serialize;

#[derive(Clone, Debug)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: String,
    pub sender: String,
    pub reply_to: Option<String>,
}

impl MailConfig {
    /// `None` when mail is not configured; the server then skips dispatch
    /// and only writes notification documents.
    pub fn from_env() -> Result<Option<Self>> {
        let (Ok(api_url), Ok(api_key)) = (
            std::env::var("MAIL_API_URL"),
            std::env::var("MAIL_API_KEY"),
        ) else {
            return Ok(None);
        };
        let sender = std::env::var("MAIL_SENDER")
            .context("MAIL_SENDER required when MAIL_API_URL is set")?;
        Ok(Some(Self {
            api_url,
            api_key,
            sender,
            reply_to: std::env::var("MAIL_REPLY_TO").ok(),
        }))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundEmail {
    pub to: String,
    pub sender: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    pub subject: String,
    pub html_content: String,
    pub text_content: String,
}

#[derive(Clone, Debug)]
pub struct Mailer {
    http: reqwest::Client,
    config: MailConfig,
}

impl Mailer {
    pub fn new(config: MailConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// "Your application moved" notice for a status change.
    pub fn application_status_email(
        &self,
        to: &str,
        name: &str,
        company: &str,
        position: &str,
        status: &str,
    ) -> OutboundEmail {
        let subject = format!("Update on your application to {company}");
        let text_content = format!(
            "Hi {name},\n\nYour application for {position} at {company} is now: {status}.\n"
        );
        let html_content = format!(
            "<p>Hi {name},</p><p>Your application for <b>{position}</b> at <b>{company}</b> is now: <b>{status}</b>.</p>"
        );
        OutboundEmail {
            to: to.to_string(),
            sender: self.config.sender.clone(),
            reply_to: self.config.reply_to.clone(),
            subject,
            html_content,
            text_content,
        }
    }

    pub async fn send(&self, email: &OutboundEmail) -> Result<()> {
        let response = self
            .http
            .post(&self.config.api_url)
            .header("api-key", &self.config.api_key)
            .json(email)
            .send()
            .await
            .context("email API request failed")?;
        ensure!(
            response.status().is_success(),
            "email API returned {}",
            response.status()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbound_payload_matches_api_contract() {
        let mailer = Mailer::new(MailConfig {
            api_url: "https://mail.example.com/v3/send".into(),
            api_key: "key".into(),
            sender: "team@concierge.example".into(),
            reply_to: Some("support@concierge.example".into()),
        });
        let email =
            mailer.application_status_email("c@example.com", "Casey", "ACME", "Engineer", "interview");
        let value = serde_json::to_value(&email).unwrap();
        assert_eq!(value["to"], "c@example.com");
        assert_eq!(value["sender"], "team@concierge.example");
        assert_eq!(value["replyTo"], "support@concierge.example");
        assert!(value["subject"].as_str().unwrap().contains("ACME"));
        assert!(value["htmlContent"].as_str().unwrap().contains("interview"));
        assert!(value["textContent"].as_str().unwrap().contains("interview"));
    }
}
