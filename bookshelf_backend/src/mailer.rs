use anyhow::{bail, Context};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use serde::Serialize;

const RESEND_API_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Clone, Serialize, Eq, PartialEq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()>;
}

/// Sends transactional emails through the Resend HTTP api
pub struct ResendMailer {
    api_key: String,
    client: ClientWithMiddleware,
}

impl ResendMailer {
    pub fn new(api_key: String) -> anyhow::Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .build()
            .context("Failed to build reqwest client")?;
        let client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .build();
        Ok(Self { api_key, client })
    }
}

#[async_trait::async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()> {
        let response = self
            .client
            .post(RESEND_API_URL)
            .bearer_auth(&self.api_key)
            .json(&email)
            .send()
            .await
            .context("Failed to reach email api")?;

        if !response.status().is_success() {
            let error = response.text().await.unwrap_or_default();
            bail!("Failed to send email to {:?}: {}", email.to, error)
        }
        Ok(())
    }
}

/// Keeps sent emails in memory, used when no email api key is configured and in tests
#[derive(Default)]
pub struct InMemoryMailer {
    outbox: parking_lot::Mutex<Vec<OutgoingEmail>>,
}

impl InMemoryMailer {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.outbox.lock().clone()
    }

    /// Most recent email sent to the address
    pub fn last_sent_to(&self, address: &str) -> Option<OutgoingEmail> {
        self.outbox
            .lock()
            .iter()
            .rev()
            .find(|email| email.to.iter().any(|to| to == address))
            .cloned()
    }
}

#[async_trait::async_trait]
impl Mailer for InMemoryMailer {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()> {
        tracing::info!("Email '{}' to {:?} kept in outbox", email.subject, email.to);
        self.outbox.lock().push(email);
        Ok(())
    }
}

/// Builds the transactional emails of the application
#[derive(Debug, Clone)]
pub struct EmailTemplates {
    from: String,
    app_url: String,
}

impl EmailTemplates {
    pub fn new(from: &str, app_url: &str) -> Self {
        Self {
            from: from.to_string(),
            app_url: app_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn verification(&self, to: &str, token: &str) -> OutgoingEmail {
        let url = format!("{}/verify-email?token={}", self.app_url, token);
        OutgoingEmail {
            from: self.from.clone(),
            to: vec![to.to_string()],
            subject: "Sign up to Book Inventory".to_string(),
            html: format!(
                "<div><h1>Sign up to Book Inventory</h1><p>Click the link to verify your email: <a href=\"{url}\">{url}</a></p></div>"
            ),
        }
    }

    pub fn password_reset(&self, to: &str, token: &str) -> OutgoingEmail {
        let url = format!("{}/reset-password?token={}", self.app_url, token);
        OutgoingEmail {
            from: self.from.clone(),
            to: vec![to.to_string()],
            subject: "Reset your password".to_string(),
            html: format!(
                "<div><h1>Reset Password</h1><p>Click the link to reset your password: <a href=\"{url}\">{url}</a></p></div>"
            ),
        }
    }
}

/// Extracts the token of the link contained in an email built by [`EmailTemplates`]
pub fn token_from_email(email: &OutgoingEmail) -> Option<String> {
    let start = email.html.find("token=")? + "token=".len();
    let token: String = email.html[start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod mailer_tests {
    use super::*;

    #[tokio::test]
    async fn test_templates_carry_link_with_token() {
        let templates = EmailTemplates::new("Book Inventory <books@example.com>", "http://app/");
        let mailer = InMemoryMailer::default();

        mailer
            .send(templates.verification("reader@example.com", "abc123"))
            .await
            .unwrap();
        mailer
            .send(templates.password_reset("reader@example.com", "def456"))
            .await
            .unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[0]
            .html
            .contains("http://app/verify-email?token=abc123"));
        assert_eq!(sent[0].subject, "Sign up to Book Inventory");

        let last = mailer
            .last_sent_to("reader@example.com")
            .expect("No email sent");
        assert_eq!(last.subject, "Reset your password");
        assert_eq!(token_from_email(&last).as_deref(), Some("def456"));
        assert!(mailer.last_sent_to("other@example.com").is_none());
    }
}
