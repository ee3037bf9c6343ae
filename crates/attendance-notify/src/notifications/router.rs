use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info};

use super::absence::AttendanceSnapshot;
use super::domain::{JobOutcome, Student};
use super::mailer::MailSender;
use super::service::{NotificationService, NotificationServiceError};
use super::template::MessageTemplate;

/// Router builder exposing the attendance notification endpoints.
pub fn notification_router<M>(service: Arc<NotificationService<M>>) -> Router
where
    M: MailSender + 'static,
{
    Router::new()
        .route("/sign-in", post(sign_in_handler::<M>))
        .route("/sign-out", post(sign_out_handler::<M>))
        .route("/attendance-reset", post(attendance_reset_handler::<M>))
        .with_state(service)
}

#[derive(Debug, Clone, Copy)]
enum AttendanceEvent {
    SignIn,
    SignOut,
}

impl AttendanceEvent {
    fn template(self) -> MessageTemplate {
        match self {
            AttendanceEvent::SignIn => MessageTemplate::sign_in(),
            AttendanceEvent::SignOut => MessageTemplate::sign_out(),
        }
    }

    fn label(self) -> &'static str {
        match self {
            AttendanceEvent::SignIn => "sign-in",
            AttendanceEvent::SignOut => "sign-out",
        }
    }

    fn success_message(self) -> &'static str {
        match self {
            AttendanceEvent::SignIn => "Sign-in notification sent successfully.",
            AttendanceEvent::SignOut => "Sign-out notification sent successfully.",
        }
    }
}

pub(crate) async fn sign_in_handler<M>(
    State(service): State<Arc<NotificationService<M>>>,
    axum::Json(payload): axum::Json<Value>,
) -> Response
where
    M: MailSender + 'static,
{
    notify_single(&service, payload, AttendanceEvent::SignIn).await
}

pub(crate) async fn sign_out_handler<M>(
    State(service): State<Arc<NotificationService<M>>>,
    axum::Json(payload): axum::Json<Value>,
) -> Response
where
    M: MailSender + 'static,
{
    notify_single(&service, payload, AttendanceEvent::SignOut).await
}

async fn notify_single<M>(
    service: &NotificationService<M>,
    payload: Value,
    event: AttendanceEvent,
) -> Response
where
    M: MailSender + 'static,
{
    info!(event = event.label(), "received attendance notification");

    let student = match serde_json::from_value::<Student>(payload) {
        Ok(student) if student.validate_contact().is_ok() => student,
        _ => {
            let payload = json!({ "error": "Invalid student data." });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    match service.send_one(&student, &event.template()).await {
        JobOutcome::Sent { .. } => {
            let payload = json!({ "message": event.success_message() });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        JobOutcome::Failed { .. } => {
            let payload = json!({
                "error": format!("Failed to send {} email.", event.label()),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

#[derive(Debug, Serialize)]
struct AttendanceResetResponse {
    message: &'static str,
    absent: usize,
    sent: usize,
    failed: usize,
    batches: usize,
    outcomes: Vec<JobOutcome>,
}

pub(crate) async fn attendance_reset_handler<M>(
    State(service): State<Arc<NotificationService<M>>>,
    axum::Json(payload): axum::Json<Value>,
) -> Response
where
    M: MailSender + 'static,
{
    info!("received attendance reset request");

    let snapshot = match AttendanceSnapshot::from_value(&payload) {
        Ok(snapshot) => snapshot,
        Err(_) => {
            let payload = json!({ "error": "Invalid student list." });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    let result = service
        .resolve_and_dispatch(
            &snapshot.roster,
            &snapshot.signed_in,
            &MessageTemplate::absence(),
        )
        .await;

    match result {
        Ok(report) => {
            let message = if report.failed == 0 {
                "Attendance reset notification sent to absent students."
            } else {
                "Attendance reset notification sent; some e-mails failed."
            };
            let body = AttendanceResetResponse {
                message,
                absent: report.total(),
                sent: report.sent,
                failed: report.failed,
                batches: report.batches,
                outcomes: report.outcomes,
            };
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        Err(NotificationServiceError::InvalidInput(_)) => {
            let payload = json!({ "error": "Invalid student list." });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        Err(NotificationServiceError::Aborted(err)) => {
            error!(error = %err, "attendance reset dispatch aborted");
            let payload = json!({ "error": err.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
