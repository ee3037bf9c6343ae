use std::sync::Arc;

use tracing::info;

use super::absence;
use super::dispatch::{BatchedDispatcher, DispatchAborted, DispatchSettings};
use super::domain::{DispatchReport, InvalidInput, JobOutcome, Student};
use super::mailer::MailSender;
use super::template::MessageTemplate;

/// Entry point used by the HTTP layer and the CLI.
pub struct NotificationService<M: ?Sized> {
    dispatcher: BatchedDispatcher<M>,
}

impl<M> NotificationService<M>
where
    M: MailSender + ?Sized + 'static,
{
    pub fn new(
        sender: Arc<M>,
        sender_address: impl Into<String>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            dispatcher: BatchedDispatcher::new(sender, sender_address, settings),
        }
    }

    /// Notify one student directly, without batching.
    pub async fn send_one(&self, student: &Student, template: &MessageTemplate) -> JobOutcome {
        self.dispatcher.deliver(template.render(student)).await
    }

    /// Work out who missed the session and e-mail each of them.
    pub async fn resolve_and_dispatch(
        &self,
        roster: &[Student],
        signed_in: &[Student],
        template: &MessageTemplate,
    ) -> Result<DispatchReport, NotificationServiceError> {
        let absent = absence::resolve(roster, signed_in)?;
        info!(
            roster = roster.len(),
            signed_in = signed_in.len(),
            absent = absent.len(),
            "resolved absence set"
        );

        let jobs = absent
            .iter()
            .map(|student| template.render(student))
            .collect();
        let report = self.dispatcher.dispatch(jobs).await?;
        Ok(report)
    }
}

/// Error raised by the notification service.
#[derive(Debug, thiserror::Error)]
pub enum NotificationServiceError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),
    #[error(transparent)]
    Aborted(#[from] DispatchAborted),
}
