//! Outbound notifications.

use std::sync::Mutex;

use thiserror::Error;
use tracing::info;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotificationError {
    #[error("mail transport rejected the message: {0}")]
    Rejected(String),

    #[error("mail transport unavailable: {0}")]
    Transport(String),
}

/// A rendered HTML mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub from: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub html_body: String,
}

pub trait NotificationSender: Send + Sync {
    fn send(&self, message: &MailMessage) -> Result<(), NotificationError>;
}

/// Writes messages to the log instead of delivering them.
pub struct LogSender;

impl NotificationSender for LogSender {
    fn send(&self, message: &MailMessage) -> Result<(), NotificationError> {
        info!(
            from = message.from,
            recipients = message.recipients.join(", "),
            "{}",
            message.subject
        );
        Ok(())
    }
}

/// Keeps sent messages in memory.
#[derive(Default)]
pub struct MemorySender {
    sent: Mutex<Vec<MailMessage>>,
}

impl MemorySender {
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

impl NotificationSender for MemorySender {
    fn send(&self, message: &MailMessage) -> Result<(), NotificationError> {
        self.sent
            .lock()
            .map_err(|_| NotificationError::Transport("outbox lock poisoned".into()))?
            .push(message.clone());
        Ok(())
    }
}

/// Escapes text for inclusion in an HTML body.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
