use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque student identity as supplied by the caller.
///
/// Numeric and textual ids are kept distinct, so `7` and `"7"` never match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StudentId {
    Number(i64),
    Text(String),
}

impl StudentId {
    /// Interpret a textual field (CSV cell, CLI argument), preferring the numeric form.
    pub fn parse_field(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<i64>() {
            Ok(number) => Self::Number(number),
            Err(_) => Self::Text(trimmed.to_string()),
        }
    }
}

impl Default for StudentId {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudentId::Number(number) => write!(f, "{number}"),
            StudentId::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    #[serde(default)]
    pub id: StudentId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

impl Student {
    pub fn new(id: StudentId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
        }
    }

    /// A student can only be notified when both a name and an address are present.
    pub fn validate_contact(&self) -> Result<(), InvalidInput> {
        if self.name.trim().is_empty() || self.email.trim().is_empty() {
            return Err(InvalidInput::MissingStudentFields);
        }
        Ok(())
    }
}

/// One e-mail to one student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationJob {
    pub recipient: Student,
    pub subject: String,
    pub body: String,
}

/// Transport acknowledgement returned by the Mail Sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReceipt {
    pub response: String,
    pub accepted_at: DateTime<Utc>,
}

impl DeliveryReceipt {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            accepted_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    Sent {
        recipient: Student,
        receipt: DeliveryReceipt,
    },
    Failed {
        recipient: Student,
        error: String,
    },
}

impl JobOutcome {
    pub fn recipient(&self) -> &Student {
        match self {
            JobOutcome::Sent { recipient, .. } | JobOutcome::Failed { recipient, .. } => recipient,
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, JobOutcome::Sent { .. })
    }
}

/// Aggregate of every job outcome for one dispatch call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub sent: usize,
    pub failed: usize,
    pub batches: usize,
    pub outcomes: Vec<JobOutcome>,
}

impl DispatchReport {
    pub(crate) fn record(&mut self, outcome: JobOutcome) {
        if outcome.is_sent() {
            self.sent += 1;
        } else {
            self.failed += 1;
        }
        self.outcomes.push(outcome);
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failures(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.is_sent())
    }
}

/// Malformed caller input, rejected before any mail is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidInput {
    #[error("student roster must be a non-empty list")]
    EmptyRoster,
    #[error("`{field}` must be a list of students")]
    NotAList { field: &'static str },
    #[error("`{field}` entry {index} is not a valid student: {reason}")]
    MalformedStudent {
        field: &'static str,
        index: usize,
        reason: String,
    },
    #[error("student name and email are required")]
    MissingStudentFields,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_and_text_ids_stay_distinct() {
        let numeric: Student =
            serde_json::from_value(json!({ "id": 7, "name": "Ada", "email": "ada@example.edu" }))
                .expect("numeric id");
        let text: Student =
            serde_json::from_value(json!({ "id": "7", "name": "Ada", "email": "ada@example.edu" }))
                .expect("text id");

        assert_eq!(numeric.id, StudentId::Number(7));
        assert_eq!(text.id, StudentId::Text("7".to_string()));
        assert_ne!(numeric.id, text.id);
    }

    #[test]
    fn parse_field_prefers_numbers() {
        assert_eq!(StudentId::parse_field(" 42 "), StudentId::Number(42));
        assert_eq!(
            StudentId::parse_field("s-42"),
            StudentId::Text("s-42".to_string())
        );
    }

    #[test]
    fn validate_contact_requires_name_and_email() {
        let missing_email = Student::new(StudentId::Number(1), "Ada", "  ");
        assert_eq!(
            missing_email.validate_contact(),
            Err(InvalidInput::MissingStudentFields)
        );

        let complete = Student::new(StudentId::Number(1), "Ada", "ada@example.edu");
        assert!(complete.validate_contact().is_ok());
    }

    #[test]
    fn outcomes_serialize_with_status_tag() {
        let outcome = JobOutcome::Failed {
            recipient: Student::new(StudentId::Number(3), "Cy", "cy@example.edu"),
            error: "mailbox unavailable".to_string(),
        };
        let value = serde_json::to_value(&outcome).expect("serializes");
        assert_eq!(value["status"], "failed");
        assert_eq!(value["recipient"]["email"], "cy@example.edu");
        assert_eq!(value["error"], "mailbox unavailable");
    }
}
