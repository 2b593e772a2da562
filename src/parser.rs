//! CSV parser for survey exports.
//!
//! A survey export has one row per student. The demographic columns
//! (`school`, `grade`, `studentGender`, `studentAge`) are pulled into typed
//! fields; every other column is kept as a raw response keyed by its
//! question id.

use anyhow::Result;
use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::clean::Grade;
use crate::error::SurveyError;

pub const SCHOOL_COLUMN: &str = "school";
pub const GRADE_COLUMN: &str = "grade";
pub const GENDER_COLUMN: &str = "studentGender";
pub const AGE_COLUMN: &str = "studentAge";
pub const ELAPSED_COLUMN: &str = "elapsedTime";

/// Response code for a correctly answered item.
pub const CORRECT: &str = "Correct";

/// One student's row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SurveyRecord {
    pub school: String,
    pub grade: Grade,
    pub gender: String,
    pub age: u32,
    pub elapsed_minutes: Option<f64>,
    pub responses: HashMap<String, String>,
}

impl SurveyRecord {
    pub fn new(school: &str, grade: &str, gender: &str, age: u32) -> Self {
        SurveyRecord {
            school: school.to_string(),
            grade: Grade::new(grade),
            gender: gender.to_string(),
            age,
            ..Default::default()
        }
    }

    /// Set a raw response value for a question id
    pub fn with_response(mut self, id: &str, value: &str) -> Self {
        self.responses.insert(id.to_string(), value.to_string());
        self
    }

    pub fn response(&self, id: &str) -> Option<&str> {
        self.responses.get(id).map(String::as_str)
    }

    /// `true` only when the response is exactly [`CORRECT`]; missing answers fail.
    pub fn is_correct(&self, id: &str) -> bool {
        self.response(id) == Some(CORRECT)
    }

    /// Numeric value of a response, if it parses as a finite number.
    pub fn numeric(&self, id: &str) -> Option<f64> {
        self.response(id)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }
}

/// Parsed and filtered survey data.
#[derive(Debug, Clone, Default)]
pub struct SurveyTable {
    pub records: Vec<SurveyRecord>,
    pub columns: Vec<String>,
    /// Question text per column id, when the export carries a second header row.
    pub question_text: HashMap<String, String>,
    /// Rows removed because a required demographic value was missing.
    pub dropped: usize,
}

impl SurveyTable {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Human-readable label for a question id, falling back to the id itself.
    pub fn question_label<'a>(&'a self, id: &'a str) -> &'a str {
        self.question_text
            .get(id)
            .map(String::as_str)
            .filter(|t| !t.is_empty())
            .unwrap_or(id)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// The second row holds question text rather than a student record.
    pub question_row: bool,
}

/// Parses survey CSV bytes, dropping rows without a numeric age or with an
/// empty school, grade or gender.
///
/// # Errors
///
/// Returns an error if the CSV is malformed or has no `studentAge` column.
pub fn parse_survey(bytes: &[u8], options: ParseOptions) -> Result<SurveyTable> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(bytes);

    let columns: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let index_of = |name: &str| columns.iter().position(|c| c == name);

    let age_idx = index_of(AGE_COLUMN).ok_or(SurveyError::MissingColumn(AGE_COLUMN.into()))?;
    let school_idx = index_of(SCHOOL_COLUMN);
    let grade_idx = index_of(GRADE_COLUMN);
    let gender_idx = index_of(GENDER_COLUMN);
    let elapsed_idx = index_of(ELAPSED_COLUMN);

    let mut table = SurveyTable {
        columns: columns.clone(),
        ..Default::default()
    };

    let mut rows = rdr.records();

    if options.question_row {
        if let Some(row) = rows.next() {
            let row = row?;
            for (col, text) in columns.iter().zip(row.iter()) {
                table.question_text.insert(col.clone(), text.trim().to_string());
            }
        }
    }

    for row in rows {
        let row = row?;
        match record_from_row(&row, &columns, age_idx, school_idx, grade_idx, gender_idx, elapsed_idx) {
            Some(record) => table.records.push(record),
            None => table.dropped += 1,
        }
    }

    if table.dropped > 0 {
        info!(dropped = table.dropped, "Dropped records missing demographic values");
    }
    debug!(
        records = table.records.len(),
        columns = table.columns.len(),
        "Survey parsed"
    );

    Ok(table)
}

fn record_from_row(
    row: &StringRecord,
    columns: &[String],
    age_idx: usize,
    school_idx: Option<usize>,
    grade_idx: Option<usize>,
    gender_idx: Option<usize>,
    elapsed_idx: Option<usize>,
) -> Option<SurveyRecord> {
    let cell = |idx: usize| row.get(idx).map(str::trim).unwrap_or("");

    let age = parse_age(cell(age_idx))?;

    // Absent columns are tolerated; present-but-empty values drop the row.
    let required = |idx: Option<usize>| -> Option<String> {
        match idx {
            Some(i) if cell(i).is_empty() => None,
            Some(i) => Some(cell(i).to_string()),
            None => Some(String::new()),
        }
    };

    let school = required(school_idx)?;
    let grade = required(grade_idx)?;
    let gender = required(gender_idx)?;

    let responses = columns
        .iter()
        .enumerate()
        .filter(|(i, _)| !cell(*i).is_empty())
        .map(|(i, col)| (col.clone(), cell(i).to_string()))
        .collect();

    Some(SurveyRecord {
        school,
        grade: Grade::new(grade),
        gender,
        age,
        elapsed_minutes: elapsed_idx.and_then(|i| parse_elapsed_minutes(cell(i))),
        responses,
    })
}

/// Ages are coerced to numbers and truncated to whole years.
fn parse_age(raw: &str) -> Option<u32> {
    let age: f64 = raw.parse().ok()?;
    if !age.is_finite() || age < 0.0 {
        return None;
    }
    Some(age.trunc() as u32)
}

/// Converts the survey app's `"M:S:ms"` elapsed time to minutes.
pub fn parse_elapsed_minutes(raw: &str) -> Option<f64> {
    let mut parts = raw.split(':').map(|p| p.trim().parse::<u32>());
    let minutes = parts.next()?.ok()?;
    let seconds = parts.next()?.ok()?;
    let millis = parts.next()?.ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(minutes as f64 + seconds as f64 / 60.0 + millis as f64 / 3600.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
school,grade,studentGender,studentAge,FL23_cleaned1,elapsedTime
School A,3,Female,8,Correct,12:30:0
School A,Grade 2,Male,7.0,Incorrect,
School B,,Male,9,Correct,
School B,4,Female,n/a,Correct,
School B,4,Female,10,,
";

    #[test]
    fn test_parse_drops_incomplete_rows() {
        let table = parse_survey(SAMPLE.as_bytes(), ParseOptions::default()).unwrap();

        assert_eq!(table.records.len(), 3);
        assert_eq!(table.dropped, 2);
        assert_eq!(table.records[1].age, 7);
        assert_eq!(table.records[1].grade.as_str(), "Grade 2");
    }

    #[test]
    fn test_parse_keeps_responses_and_skips_empty_cells() {
        let table = parse_survey(SAMPLE.as_bytes(), ParseOptions::default()).unwrap();

        assert!(table.records[0].is_correct("FL23_cleaned1"));
        assert!(!table.records[1].is_correct("FL23_cleaned1"));
        assert_eq!(table.records[2].response("FL23_cleaned1"), None);
        assert_eq!(table.records[0].elapsed_minutes, Some(12.5));
    }

    #[test]
    fn test_parse_missing_age_column_is_an_error() {
        let err = parse_survey(b"school,grade\nA,1\n", ParseOptions::default()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<SurveyError>(),
            Some(&SurveyError::MissingColumn("studentAge".into()))
        );
    }

    #[test]
    fn test_parse_question_row() {
        let csv = "school,studentAge,FL15\n,Age of student,How old is Sanu?\nA,8,Correct\n";
        let table = parse_survey(csv.as_bytes(), ParseOptions { question_row: true }).unwrap();

        assert_eq!(table.records.len(), 1);
        assert_eq!(table.question_label("FL15"), "How old is Sanu?");
        assert_eq!(table.question_label("school"), "school");
    }

    #[test]
    fn test_absent_demographic_columns_are_tolerated() {
        let table = parse_survey(b"studentAge\n8\n", ParseOptions::default()).unwrap();
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0].school, "");
    }

    #[test]
    fn test_parse_elapsed_minutes() {
        assert_eq!(parse_elapsed_minutes("10:30:0"), Some(10.5));
        assert_eq!(parse_elapsed_minutes("bogus"), None);
        assert_eq!(parse_elapsed_minutes("1:2"), None);
    }

    #[test]
    fn test_numeric_response() {
        let record = SurveyRecord::new("A", "3", "Male", 8)
            .with_response("FL19_cleaned", "55.0")
            .with_response("FL15", "Correct");
        assert_eq!(record.numeric("FL19_cleaned"), Some(55.0));
        assert_eq!(record.numeric("FL15"), None);
    }
}
