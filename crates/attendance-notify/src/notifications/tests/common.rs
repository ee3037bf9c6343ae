use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;
use tokio::time::Instant;

use crate::notifications::domain::{DeliveryReceipt, NotificationJob, Student, StudentId};
use crate::notifications::mailer::{DeliveryError, MailMessage, MailSender};
use crate::notifications::{DispatchSettings, MessageTemplate, NotificationService};

pub(super) const SENDER: &str = "attendance@example.edu";

pub(super) fn student(id: i64) -> Student {
    Student::new(
        StudentId::Number(id),
        format!("Student {id}"),
        format!("student{id}@example.edu"),
    )
}

pub(super) fn roster(count: i64) -> Vec<Student> {
    (1..=count).map(student).collect()
}

pub(super) fn jobs(count: i64) -> Vec<NotificationJob> {
    let template = MessageTemplate::absence();
    roster(count)
        .iter()
        .map(|student| template.render(student))
        .collect()
}

pub(super) fn settings(batch_size: usize, delay: Duration) -> DispatchSettings {
    DispatchSettings {
        batch_size,
        inter_batch_delay: delay,
    }
}

#[derive(Debug, Clone)]
pub(super) struct SendRecord {
    pub(super) message: MailMessage,
    pub(super) started_at: Instant,
}

/// Mail Sender double that records calls, tracks concurrency, and fails chosen recipients.
#[derive(Default)]
pub(super) struct RecordingMailer {
    failing: HashSet<String>,
    latency: Duration,
    calls: Mutex<Vec<SendRecord>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingMailer {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(super) fn failing_for<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failing = addresses.into_iter().map(Into::into).collect();
        self
    }

    pub(super) fn calls(&self) -> Vec<SendRecord> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }

    pub(super) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Sizes of groups of sends that started at the same instant.
    pub(super) fn start_groups(&self) -> Vec<usize> {
        let mut groups: Vec<(Instant, usize)> = Vec::new();
        for call in self.calls() {
            match groups.iter_mut().find(|(at, _)| *at == call.started_at) {
                Some((_, count)) => *count += 1,
                None => groups.push((call.started_at, 1)),
            }
        }
        groups.sort_by_key(|(at, _)| *at);
        groups.into_iter().map(|(_, count)| count).collect()
    }
}

#[async_trait]
impl MailSender for RecordingMailer {
    async fn send(&self, message: MailMessage) -> Result<DeliveryReceipt, DeliveryError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(SendRecord {
                message: message.clone(),
                started_at: Instant::now(),
            });

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&message.to) {
            Err(DeliveryError::Rejected(format!(
                "550 mailbox unavailable: {}",
                message.to
            )))
        } else {
            Ok(DeliveryReceipt::new(format!("250 OK queued for {}", message.to)))
        }
    }
}

pub(super) fn build_service(
    mailer: RecordingMailer,
    settings: DispatchSettings,
) -> (NotificationService<RecordingMailer>, Arc<RecordingMailer>) {
    let mailer = Arc::new(mailer);
    let service = NotificationService::new(mailer.clone(), SENDER, settings);
    (service, mailer)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
