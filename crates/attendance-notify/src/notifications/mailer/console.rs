use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::{debug, info};

use super::{DeliveryError, MailMessage, MailSender};
use crate::notifications::domain::DeliveryReceipt;

/// Logs messages instead of delivering them. Useful for development and dry runs.
#[derive(Debug, Default)]
pub struct ConsoleMailer {
    verbose: bool,
    sequence: AtomicU64,
}

impl ConsoleMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also log the message body at debug level.
    pub fn verbose() -> Self {
        Self {
            verbose: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl MailSender for ConsoleMailer {
    async fn send(&self, message: MailMessage) -> Result<DeliveryReceipt, DeliveryError> {
        if !message.to.contains('@') {
            return Err(DeliveryError::InvalidAddress(message.to));
        }

        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            from = %message.from,
            to = %message.to,
            subject = %message.subject,
            sequence,
            "console mail accepted"
        );
        if self.verbose {
            debug!(body = %message.body, "console mail body");
        }

        Ok(DeliveryReceipt::new(format!("250 console queued #{sequence}")))
    }
}
