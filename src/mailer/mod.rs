use std::env;

use anyhow::{Context, Result, bail};
use reqwest::Client;

/// Outbound message handed to the mail-delivery API. SMTP mechanics stay
/// behind the provider.
#[derive(Debug, Clone)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl MailMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Client for the HTTP mail-delivery API used for password recovery.
#[derive(Clone)]
pub struct MailClient {
    http: Client,
    config: MailConfig,
}

#[derive(Clone, Default)]
struct MailConfig {
    api_url: Option<String>,
    api_key: Option<String>,
    sender: Option<String>,
}

impl MailClient {
    /// Build a client using environment variables. Missing configuration is
    /// only an error once a send is attempted.
    pub fn from_env() -> Result<Self> {
        let api_url = env::var("MAIL_API_URL").ok();
        let api_key = env::var("MAIL_API_KEY").ok();
        let sender = env::var("MAIL_SENDER").ok();

        Ok(Self {
            http: Client::new(),
            config: MailConfig {
                api_url,
                api_key,
                sender,
            },
        })
    }

    pub async fn send(&self, message: MailMessage) -> Result<()> {
        let Some(api_url) = self.config.api_url.as_ref() else {
            bail!("MAIL_API_URL is not configured but required for outbound mail");
        };
        let Some(sender) = self.config.sender.as_ref() else {
            bail!("MAIL_SENDER is not configured but required for outbound mail");
        };

        let payload = serde_json::json!({
            "from": sender,
            "to": [message.to],
            "subject": message.subject,
            "text": message.body,
        });

        let mut req_builder = self.http.post(api_url).json(&payload);
        if let Some(api_key) = &self.config.api_key {
            req_builder = req_builder.bearer_auth(api_key);
        }

        let response = req_builder
            .send()
            .await
            .context("failed to reach mail API")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("mail API call failed with status {}: {}", status, body);
        }

        Ok(())
    }
}
