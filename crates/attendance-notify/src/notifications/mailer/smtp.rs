use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use super::{DeliveryError, MailMessage, MailSender};
use crate::config::SmtpSettings;
use crate::notifications::domain::DeliveryReceipt;

/// Delivers through an SMTP relay using a pooled `lettre` transport.
///
/// The transport is built once from the injected settings and shared by every send.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    relay: String,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self, DeliveryError> {
        let credentials = Credentials::new(settings.username.clone(), settings.password.clone());

        let builder = if settings.use_tls {
            let tls = TlsParameters::new(settings.host.clone())
                .map_err(|err| DeliveryError::Transport(format!("TLS parameters: {err}")))?;
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
                .map_err(|err| DeliveryError::Transport(err.to_string()))?
                .tls(Tls::Required(tls))
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
        };

        let transport = builder
            .credentials(credentials)
            .port(settings.port)
            .timeout(Some(settings.timeout))
            .build();

        Ok(Self {
            transport,
            relay: format!("{}:{}", settings.host, settings.port),
        })
    }

    fn build_message(message: &MailMessage) -> Result<Message, DeliveryError> {
        let from: Mailbox = message
            .from
            .parse()
            .map_err(|_| DeliveryError::InvalidAddress(message.from.clone()))?;
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|_| DeliveryError::InvalidAddress(message.to.clone()))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|err| DeliveryError::Rejected(err.to_string()))
    }
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("relay", &self.relay)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MailSender for SmtpMailer {
    async fn send(&self, message: MailMessage) -> Result<DeliveryReceipt, DeliveryError> {
        let email = Self::build_message(&message)?;

        let response = self.transport.send(email).await.map_err(|err| {
            if err.is_timeout() {
                DeliveryError::Timeout(err.to_string())
            } else if err.is_permanent() {
                DeliveryError::Rejected(err.to_string())
            } else {
                DeliveryError::Transport(err.to_string())
            }
        })?;

        let text = response.message().collect::<Vec<_>>().join(" ");
        debug!(relay = %self.relay, to = %message.to, code = %response.code(), "relay accepted message");

        Ok(DeliveryReceipt::new(format!("{} {}", response.code(), text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(to: &str) -> MailMessage {
        MailMessage {
            from: "attendance@example.edu".to_string(),
            to: to.to_string(),
            subject: "Attendance Notification: Missed Session".to_string(),
            body: "Dear Ada,\n\nYou were marked absent.".to_string(),
        }
    }

    #[test]
    fn build_message_accepts_plain_text_mail() {
        assert!(SmtpMailer::build_message(&message("ada@example.edu")).is_ok());
    }

    #[test]
    fn build_message_rejects_invalid_recipient() {
        assert_eq!(
            SmtpMailer::build_message(&message("ada at example")).err(),
            Some(DeliveryError::InvalidAddress("ada at example".to_string()))
        );
    }
}
