use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use super::{EmailMessage, EmailProvider};

pub struct SendGridProvider {
    api_key: String,
    from_email: String,
    base_url: String,
    client: reqwest::Client,
}

impl SendGridProvider {
    pub fn new(api_key: String, from_email: String, base_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            api_key,
            from_email,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl EmailProvider for SendGridProvider {
    async fn send_email(&self, message: &EmailMessage) -> anyhow::Result<()> {
        anyhow::ensure!(!self.api_key.is_empty(), "SENDGRID_API_KEY is not configured");

        let body = json!({
            "personalizations": [{ "to": [{ "email": message.to }] }],
            "from": { "email": self.from_email },
            "subject": message.subject,
            "content": [{ "type": "text/html", "value": message.html }],
        });

        self.client
            .post(format!("{}/v3/mail/send", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("failed to call SendGrid API")?
            .error_for_status()
            .context("SendGrid API returned error")?;

        Ok(())
    }
}
