//! Attendance notifications: absence resolution, batched delivery, and the HTTP surface.

pub mod absence;
pub mod dispatch;
pub mod domain;
pub mod mailer;
pub mod roster;
pub mod router;
pub mod service;
pub mod template;

#[cfg(test)]
mod tests;

pub use absence::{resolve, AttendanceSnapshot};
pub use dispatch::{BatchedDispatcher, DispatchAborted, DispatchSettings};
pub use domain::{
    DeliveryReceipt, DispatchReport, InvalidInput, JobOutcome, NotificationJob, Student, StudentId,
};
pub use mailer::{ConsoleMailer, DeliveryError, MailMessage, MailSender, SmtpMailer};
pub use roster::{load_students, RosterLoadError};
pub use router::notification_router;
pub use service::{NotificationService, NotificationServiceError};
pub use template::MessageTemplate;
