use std::collections::HashSet;

use serde_json::Value;

use super::domain::{InvalidInput, Student, StudentId};

/// Students from `roster` whose id is not in `signed_in`, in roster order.
///
/// Identity is by id only; name or email drift between the two lists is ignored.
pub fn resolve(roster: &[Student], signed_in: &[Student]) -> Result<Vec<Student>, InvalidInput> {
    if roster.is_empty() {
        return Err(InvalidInput::EmptyRoster);
    }

    let present: HashSet<&StudentId> = signed_in.iter().map(|student| &student.id).collect();

    Ok(roster
        .iter()
        .filter(|student| !present.contains(&student.id))
        .cloned()
        .collect())
}

/// Roster and sign-in lists taken from an `/attendance-reset` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceSnapshot {
    pub roster: Vec<Student>,
    pub signed_in: Vec<Student>,
}

impl AttendanceSnapshot {
    /// Validate the raw `{ "students": [...], "signedInStudents": [...] }` body.
    pub fn from_value(payload: &Value) -> Result<Self, InvalidInput> {
        let roster = students_field(payload, "students")?;
        if roster.is_empty() {
            return Err(InvalidInput::EmptyRoster);
        }
        // Sign-in entries only need an id; roster entries are the ones mailed.
        if let Some(index) = roster
            .iter()
            .position(|student| student.email.trim().is_empty())
        {
            return Err(InvalidInput::MalformedStudent {
                field: "students",
                index,
                reason: "missing e-mail address".to_string(),
            });
        }
        let signed_in = students_field(payload, "signedInStudents")?;

        Ok(Self { roster, signed_in })
    }

    pub fn absent(&self) -> Result<Vec<Student>, InvalidInput> {
        resolve(&self.roster, &self.signed_in)
    }
}

fn students_field(payload: &Value, field: &'static str) -> Result<Vec<Student>, InvalidInput> {
    let entries = payload
        .get(field)
        .and_then(Value::as_array)
        .ok_or(InvalidInput::NotAList { field })?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            if !entry.is_object() {
                return Err(InvalidInput::MalformedStudent {
                    field,
                    index,
                    reason: "expected an object".to_string(),
                });
            }
            serde_json::from_value(entry.clone()).map_err(|err| InvalidInput::MalformedStudent {
                field,
                index,
                reason: err.to_string(),
            })
        })
        .collect()
}
