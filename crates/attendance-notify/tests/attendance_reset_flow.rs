use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use attendance_notify::notifications::{
    AttendanceSnapshot, ConsoleMailer, DeliveryError, DeliveryReceipt, DispatchSettings,
    JobOutcome, MailMessage, MailSender, MessageTemplate, NotificationService, StudentId,
};
use serde_json::json;

/// Relay double that bounces a fixed domain.
struct BouncingRelay {
    bounced_domain: &'static str,
}

#[async_trait]
impl MailSender for BouncingRelay {
    async fn send(&self, message: MailMessage) -> Result<DeliveryReceipt, DeliveryError> {
        if message.to.ends_with(self.bounced_domain) {
            Err(DeliveryError::Rejected(format!("550 no such domain for {}", message.to)))
        } else {
            Ok(DeliveryReceipt::new("250 2.0.0 OK"))
        }
    }
}

fn reset_payload(count: usize) -> serde_json::Value {
    let students: Vec<_> = (1..=count)
        .map(|id| {
            let domain = if id % 5 == 0 { "bounce.test" } else { "example.edu" };
            json!({ "id": id, "name": format!("Student {id}"), "email": format!("s{id}@{domain}") })
        })
        .collect();
    let signed_in: Vec<_> = students.iter().step_by(4).cloned().collect();
    json!({ "students": students, "signedInStudents": signed_in })
}

#[tokio::test(start_paused = true)]
async fn reset_flow_accounts_for_every_absent_student() {
    let payload = reset_payload(40);
    let snapshot = AttendanceSnapshot::from_value(&payload).expect("payload is valid");
    let absent = snapshot.absent().expect("roster is non-empty");
    assert_eq!(absent.len(), 30);

    let service = NotificationService::new(
        Arc::new(BouncingRelay {
            bounced_domain: "bounce.test",
        }),
        "attendance@example.edu",
        DispatchSettings {
            batch_size: 10,
            inter_batch_delay: Duration::from_secs(10),
        },
    );

    let started = tokio::time::Instant::now();
    let report = service
        .resolve_and_dispatch(&snapshot.roster, &snapshot.signed_in, &MessageTemplate::absence())
        .await
        .expect("dispatch settles");

    assert!(started.elapsed() >= Duration::from_secs(20));
    assert_eq!(report.total(), absent.len());
    assert_eq!(report.batches, 3);

    let reported: HashSet<StudentId> = report
        .outcomes
        .iter()
        .map(|outcome| outcome.recipient().id.clone())
        .collect();
    let expected: HashSet<StudentId> = absent.iter().map(|student| student.id.clone()).collect();
    assert_eq!(reported, expected);

    for outcome in &report.outcomes {
        let bounced = outcome.recipient().email.ends_with("bounce.test");
        match outcome {
            JobOutcome::Sent { .. } => assert!(!bounced),
            JobOutcome::Failed { .. } => assert!(bounced),
        }
    }
}

#[tokio::test]
async fn console_mailer_handles_direct_notifications() {
    let service = NotificationService::new(
        Arc::new(ConsoleMailer::new()),
        "attendance@example.edu",
        DispatchSettings::default(),
    );
    let student = serde_json::from_value(json!({
        "id": 9,
        "name": "Katherine",
        "email": "katherine@example.edu"
    }))
    .expect("student parses");

    let outcome = service.send_one(&student, &MessageTemplate::sign_in()).await;

    match outcome {
        JobOutcome::Sent { receipt, .. } => assert!(receipt.response.starts_with("250")),
        other => panic!("expected console delivery, got {other:?}"),
    }
}
