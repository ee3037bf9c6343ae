use super::domain::{NotificationJob, Student};

const NAME_PLACEHOLDER: &str = "{name}";

/// Fixed subject and body text; `{name}` in the body is replaced by the student's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    pub subject: String,
    pub body: String,
}

impl MessageTemplate {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }

    pub fn sign_in() -> Self {
        Self::new(
            "Attendance Notification: Signed In",
            "Dear {name},\n\nYou have successfully signed in for the attendance session.\n\nBest regards,\nAttendance System",
        )
    }

    pub fn sign_out() -> Self {
        Self::new(
            "Attendance Notification: Signed Out",
            "Dear {name},\n\nYou have successfully signed out for the attendance session.\n\nBest regards,\nAttendance System",
        )
    }

    pub fn absence() -> Self {
        Self::new(
            "Attendance Notification: Missed Session",
            "Dear {name},\n\nYou were marked absent during the last attendance session. Please ensure to sign in for future sessions.\n\nBest regards,\nAttendance System",
        )
    }

    pub fn render(&self, student: &Student) -> NotificationJob {
        NotificationJob {
            recipient: student.clone(),
            subject: self.subject.clone(),
            body: self.body.replace(NAME_PLACEHOLDER, &student.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::domain::StudentId;

    #[test]
    fn render_substitutes_student_name() {
        let student = Student::new(StudentId::Number(1), "Grace", "grace@example.edu");
        let job = MessageTemplate::absence().render(&student);

        assert_eq!(job.recipient, student);
        assert_eq!(job.subject, "Attendance Notification: Missed Session");
        assert!(job.body.starts_with("Dear Grace,\n\nYou were marked absent"));
        assert!(!job.body.contains(NAME_PLACEHOLDER));
    }

    #[test]
    fn sign_in_and_sign_out_differ_only_in_wording() {
        let student = Student::new(StudentId::Number(2), "Alan", "alan@example.edu");
        let sign_in = MessageTemplate::sign_in().render(&student);
        let sign_out = MessageTemplate::sign_out().render(&student);

        assert!(sign_in.body.contains("signed in for the attendance session"));
        assert!(sign_out.body.contains("signed out for the attendance session"));
        assert_ne!(sign_in.subject, sign_out.subject);
    }
}
