use async_trait::async_trait;
use serde::Serialize;

/// Outbound message channel (email relay, chat bot, ...)
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, recipient: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

/// Writes notifications to the log only
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, recipient: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        tracing::info!(recipient, subject, body, "Notification");
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    recipient: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Posts each notification as JSON to a relay endpoint
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, recipient: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        self.client
            .post(&self.url)
            .json(&WebhookPayload {
                recipient,
                subject,
                body,
            })
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

/// Sends and logs failures; delivery problems never reach the caller
pub async fn notify_best_effort(notifier: &dyn Notifier, recipient: &str, subject: &str, body: &str) {
    if let Err(e) = notifier.notify(recipient, subject, body).await {
        tracing::warn!(recipient, subject, error = %e, "Failed to deliver notification");
    }
}
