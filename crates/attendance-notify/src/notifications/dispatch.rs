use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, warn};

use super::domain::{DispatchReport, JobOutcome, NotificationJob};
use super::mailer::{MailMessage, MailSender};

/// Back-pressure knobs for bulk delivery.
///
/// At most `batch_size` sends are in flight at once, and the driver pauses for
/// `inter_batch_delay` between consecutive batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    pub batch_size: usize,
    pub inter_batch_delay: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            inter_batch_delay: Duration::from_secs(10),
        }
    }
}

impl DispatchSettings {
    pub fn validate(&self) -> Result<(), DispatchAborted> {
        if self.batch_size == 0 {
            return Err(DispatchAborted::ZeroBatchSize);
        }
        Ok(())
    }

    /// Number of batches needed for `jobs` jobs.
    pub fn batch_count(&self, jobs: usize) -> usize {
        jobs.div_ceil(self.batch_size.max(1))
    }
}

/// Contract violation in the dispatcher's own arguments.
///
/// Nothing has been sent when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchAborted {
    #[error("batch size must be at least 1")]
    ZeroBatchSize,
    #[error("job {index} is malformed: {reason}")]
    MalformedJob { index: usize, reason: &'static str },
}

/// Sends notification jobs through a [`MailSender`] in sequential, bounded batches.
pub struct BatchedDispatcher<M: ?Sized> {
    sender: Arc<M>,
    sender_address: String,
    settings: DispatchSettings,
}

impl<M> BatchedDispatcher<M>
where
    M: MailSender + ?Sized,
{
    pub fn new(
        sender: Arc<M>,
        sender_address: impl Into<String>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            sender,
            sender_address: sender_address.into(),
            settings,
        }
    }

    /// Make a single delivery attempt. Transport errors become [`JobOutcome::Failed`].
    pub async fn deliver(&self, job: NotificationJob) -> JobOutcome {
        let NotificationJob {
            recipient,
            subject,
            body,
        } = job;

        let message = MailMessage {
            from: self.sender_address.clone(),
            to: recipient.email.clone(),
            subject,
            body,
        };

        match self.sender.send(message).await {
            Ok(receipt) => {
                debug!(to = %recipient.email, response = %receipt.response, "notification sent");
                JobOutcome::Sent { recipient, receipt }
            }
            Err(err) => {
                warn!(to = %recipient.email, error = %err, "notification failed");
                JobOutcome::Failed {
                    recipient,
                    error: err.to_string(),
                }
            }
        }
    }

    /// Deliver every job, `batch_size` at a time.
    ///
    /// Batch `k + 1` starts only after every send in batch `k` has settled and the
    /// inter-batch delay has elapsed. The report holds exactly one outcome per job;
    /// outcomes within a batch may complete in any order.
    pub async fn dispatch(
        &self,
        jobs: Vec<NotificationJob>,
    ) -> Result<DispatchReport, DispatchAborted> {
        self.settings.validate()?;
        validate_jobs(&jobs)?;

        let total = jobs.len();
        let batch_count = self.settings.batch_count(total);
        let mut report = DispatchReport {
            outcomes: Vec::with_capacity(total),
            ..DispatchReport::default()
        };

        let mut pending = jobs.into_iter();
        for batch_index in 0..batch_count {
            let batch: Vec<NotificationJob> =
                pending.by_ref().take(self.settings.batch_size).collect();
            debug!(
                batch = batch_index + 1,
                of = batch_count,
                size = batch.len(),
                "dispatching batch"
            );

            let outcomes = join_all(batch.into_iter().map(|job| self.deliver(job))).await;
            outcomes.into_iter().for_each(|outcome| report.record(outcome));
            report.batches += 1;

            if batch_index + 1 < batch_count {
                tokio::time::sleep(self.settings.inter_batch_delay).await;
            }
        }

        info!(
            total,
            sent = report.sent,
            failed = report.failed,
            batches = report.batches,
            "dispatch settled"
        );
        Ok(report)
    }
}

fn validate_jobs(jobs: &[NotificationJob]) -> Result<(), DispatchAborted> {
    for (index, job) in jobs.iter().enumerate() {
        if job.recipient.email.trim().is_empty() {
            return Err(DispatchAborted::MalformedJob {
                index,
                reason: "recipient has no e-mail address",
            });
        }
    }
    Ok(())
}
