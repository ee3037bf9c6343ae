use async_trait::async_trait;
use attendance_notify::config::{MailConfig, MailTransportKind};
use attendance_notify::notifications::{
    ConsoleMailer, DeliveryError, DeliveryReceipt, DispatchSettings, MailMessage, MailSender,
    SmtpMailer,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Mail Sender chosen from configuration at startup.
#[derive(Debug)]
pub(crate) enum ConfiguredMailer {
    Console(ConsoleMailer),
    Smtp(SmtpMailer),
}

impl ConfiguredMailer {
    pub(crate) fn from_config(config: &MailConfig) -> Result<Self, DeliveryError> {
        match config.transport {
            MailTransportKind::Console => Ok(Self::Console(ConsoleMailer::verbose())),
            MailTransportKind::Smtp => SmtpMailer::new(&config.smtp).map(Self::Smtp),
        }
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            ConfiguredMailer::Console(_) => "console",
            ConfiguredMailer::Smtp(_) => "smtp",
        }
    }
}

#[async_trait]
impl MailSender for ConfiguredMailer {
    async fn send(&self, message: MailMessage) -> Result<DeliveryReceipt, DeliveryError> {
        match self {
            ConfiguredMailer::Console(mailer) => mailer.send(message).await,
            ConfiguredMailer::Smtp(mailer) => mailer.send(message).await,
        }
    }
}

/// Apply command-line overrides on top of the configured batching settings.
pub(crate) fn override_dispatch(
    mut settings: DispatchSettings,
    batch_size: Option<usize>,
    batch_delay_ms: Option<u64>,
) -> DispatchSettings {
    if let Some(batch_size) = batch_size {
        settings.batch_size = batch_size;
    }
    if let Some(delay) = batch_delay_ms {
        settings.inter_batch_delay = Duration::from_millis(delay);
    }
    settings
}

pub(crate) fn parse_batch_size(raw: &str) -> Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(size) if size >= 1 => Ok(size),
        _ => Err(format!("batch size '{raw}' must be an integer >= 1")),
    }
}
