use async_trait::async_trait;

use super::{EmailSender, NotificationError, SmsSender};

/// Writes outbound email to the log instead of a mail provider.
#[derive(Debug, Default, Clone)]
pub struct LogEmailSender {
    pub from: String,
}

impl LogEmailSender {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), NotificationError> {
        if to.trim().is_empty() {
            return Err(NotificationError::Email("empty recipient".to_string()));
        }
        log::info!("Email from {} to {}: {}", self.from, to, subject);
        log::debug!("{}", body);
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct LogSmsSender;

#[async_trait]
impl SmsSender for LogSmsSender {
    async fn send_sms(&self, to: &str, message: &str) -> Result<(), NotificationError> {
        if to.trim().is_empty() {
            return Err(NotificationError::Sms("empty phone number".to_string()));
        }
        log::info!("SMS to {}: {}", to, message);
        Ok(())
    }
}
