//! Mail Sender seam and its implementations.
//!
//! The dispatcher only sees [`MailSender`]; transports are picked at startup from
//! [`MailConfig`](crate::config::MailConfig).

mod console;
mod smtp;

use async_trait::async_trait;

use super::domain::DeliveryReceipt;

pub use console::ConsoleMailer;
pub use smtp::SmtpMailer;

/// Envelope handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Why a single delivery attempt failed. Terminal for the job that produced it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("invalid address '{0}'")]
    InvalidAddress(String),
    #[error("message rejected by relay: {0}")]
    Rejected(String),
    #[error("mail transport error: {0}")]
    Transport(String),
    #[error("mail transport timed out: {0}")]
    Timeout(String),
}

/// One asynchronous delivery attempt per call; no batching or retries inside.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<DeliveryReceipt, DeliveryError>;
}

