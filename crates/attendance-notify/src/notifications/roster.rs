use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::domain::{Student, StudentId};

#[derive(Debug)]
pub enum RosterLoadError {
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for RosterLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterLoadError::Io(err) => write!(f, "failed to read roster file: {}", err),
            RosterLoadError::Csv(err) => write!(f, "invalid roster CSV data: {}", err),
            RosterLoadError::Json(err) => write!(f, "invalid roster JSON data: {}", err),
        }
    }
}

impl std::error::Error for RosterLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RosterLoadError::Io(err) => Some(err),
            RosterLoadError::Csv(err) => Some(err),
            RosterLoadError::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for RosterLoadError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RosterLoadError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<serde_json::Error> for RosterLoadError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(alias = "ID", alias = "Id", alias = "student_id")]
    id: String,
    #[serde(alias = "Name")]
    name: String,
    #[serde(alias = "Email", alias = "E-mail")]
    email: String,
}

impl From<RosterRow> for Student {
    fn from(row: RosterRow) -> Self {
        Student::new(
            StudentId::parse_field(&row.id),
            row.name.trim(),
            row.email.trim(),
        )
    }
}

/// Load students from a `.json` array or an `id,name,email` CSV file.
pub fn load_students<P: AsRef<Path>>(path: P) -> Result<Vec<Student>, RosterLoadError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        students_from_json(file)
    } else {
        students_from_csv(file)
    }
}

pub fn students_from_csv<R: Read>(reader: R) -> Result<Vec<Student>, RosterLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut students = Vec::new();
    for row in reader.deserialize::<RosterRow>() {
        students.push(row?.into());
    }
    Ok(students)
}

pub fn students_from_json<R: Read>(reader: R) -> Result<Vec<Student>, RosterLoadError> {
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_csv_with_numeric_and_text_ids() {
        let data = "id,name,email\n1,Ada Lovelace,ada@example.edu\ns-2, Alan Turing ,alan@example.edu\n";
        let students = students_from_csv(Cursor::new(data)).expect("csv parses");

        assert_eq!(students.len(), 2);
        assert_eq!(students[0].id, StudentId::Number(1));
        assert_eq!(students[1].id, StudentId::Text("s-2".to_string()));
        assert_eq!(students[1].name, "Alan Turing");
    }

    #[test]
    fn accepts_capitalised_headers() {
        let data = "ID,Name,Email\n7,Grace,grace@example.edu\n";
        let students = students_from_csv(Cursor::new(data)).expect("csv parses");
        assert_eq!(students[0].email, "grace@example.edu");
    }

    #[test]
    fn reports_missing_columns() {
        let data = "id,name\n1,Ada\n";
        match students_from_csv(Cursor::new(data)) {
            Err(RosterLoadError::Csv(_)) => {}
            other => panic!("expected csv error, got {other:?}"),
        }
    }

    #[test]
    fn parses_json_arrays() {
        let data = r#"[{"id": 1, "name": "Ada", "email": "ada@example.edu"}]"#;
        let students = students_from_json(Cursor::new(data)).expect("json parses");
        assert_eq!(students[0].id, StudentId::Number(1));
    }
}
