//! Numeracy scoring.
//!
//! The numeracy section has 23 items. Each task group passes only when every
//! one of its items is answered `Correct`:
//!
//! | Task                  | Item indices             |
//! |-----------------------|--------------------------|
//! | Number Reading        | 0–5                      |
//! | Number Discrimination | 6–10                     |
//! | Addition              | 11–15                    |
//! | Pattern Recognition   | 18–21, plus 22 (see below) |
//!
//! Items 16 and 17 are not scored. Item 22 was recorded incorrectly by the
//! survey app at the old-story schools and is skipped for their students.

use tracing::debug;

use crate::analyzers::aggregate::task_result;
use crate::analyzers::types::{AssessmentResult, Subject, Task};
use crate::error::SurveyError;
use crate::parser::SurveyRecord;

pub const NUMERACY_ID_COUNT: usize = 23;

/// Per-record pass flags for the five numeracy tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NumeracyFlags {
    pub number_reading: bool,
    pub number_discrimination: bool,
    pub addition: bool,
    pub pattern_recognition: bool,
}

impl NumeracyFlags {
    pub fn foundational(&self) -> bool {
        self.number_reading && self.number_discrimination && self.addition && self.pattern_recognition
    }

    fn get(&self, task: Task) -> bool {
        match task {
            Task::NumberReading => self.number_reading,
            Task::NumberDiscrimination => self.number_discrimination,
            Task::Addition => self.addition,
            Task::PatternRecognition => self.pattern_recognition,
            _ => self.foundational(),
        }
    }
}

fn all_correct(record: &SurveyRecord, ids: &[String]) -> bool {
    ids.iter().all(|id| record.is_correct(id))
}

/// Scores one record. `ids` must hold at least [`NUMERACY_ID_COUNT`] entries.
pub fn score_record(record: &SurveyRecord, ids: &[String], old_story_schools: &[String]) -> NumeracyFlags {
    let skip_last_pattern = old_story_schools.iter().any(|s| *s == record.school);

    NumeracyFlags {
        number_reading: all_correct(record, &ids[0..6]),
        number_discrimination: all_correct(record, &ids[6..11]),
        addition: all_correct(record, &ids[11..16]),
        pattern_recognition: all_correct(record, &ids[18..22])
            && (skip_last_pattern || record.is_correct(&ids[22])),
    }
}

/// Scores every record and rolls each numeracy task up by gender, age and grade.
///
/// # Errors
///
/// Returns [`SurveyError::InvalidIds`] if fewer than 23 ids are given.
pub fn numeracy_analysis(
    records: &[SurveyRecord],
    ids: &[String],
    old_story_schools: &[String],
) -> Result<AssessmentResult, SurveyError> {
    if ids.len() < NUMERACY_ID_COUNT {
        return Err(SurveyError::InvalidIds {
            subject: "numeracy",
            expected: NUMERACY_ID_COUNT,
            actual: ids.len(),
        });
    }

    let flags: Vec<NumeracyFlags> = records
        .iter()
        .map(|r| score_record(r, ids, old_story_schools))
        .collect();

    let tasks = Task::NUMERACY
        .iter()
        .map(|&task| {
            let passes: Vec<bool> = flags.iter().map(|f| f.get(task)).collect();
            task_result(task, records, &passes)
        })
        .collect();

    debug!(students = records.len(), "Numeracy analysis complete");

    Ok(AssessmentResult {
        subject: Subject::Numeracy,
        total_students: records.len(),
        unscored: 0,
        tasks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssessmentIds;

    fn ids() -> Vec<String> {
        AssessmentIds::default().numeracy
    }

    /// A record answering every numeracy item with `value`.
    fn answering(school: &str, gender: &str, age: u32, value: &str) -> SurveyRecord {
        ids().iter().fold(SurveyRecord::new(school, "3", gender, age), |r, id| {
            r.with_response(id, value)
        })
    }

    #[test]
    fn test_all_correct_passes_everything() {
        let record = answering("A", "Female", 8, "Correct");
        let flags = score_record(&record, &ids(), &[]);
        assert!(flags.foundational());
    }

    #[test]
    fn test_single_wrong_item_fails_only_its_group() {
        let record = answering("A", "Female", 8, "Correct").with_response("FL24_cleaned3", "Incorrect");
        let flags = score_record(&record, &ids(), &[]);

        assert!(flags.number_reading);
        assert!(!flags.number_discrimination);
        assert!(flags.addition);
        assert!(flags.pattern_recognition);
        assert!(!flags.foundational());
    }

    #[test]
    fn test_unscored_items_are_ignored() {
        let record = answering("A", "Male", 9, "Correct")
            .with_response("FL26", "Incorrect")
            .with_response("FL26C", "No answer");
        assert!(score_record(&record, &ids(), &[]).foundational());
    }

    #[test]
    fn test_last_pattern_item_skipped_for_old_story_schools() {
        let old = vec!["Siddhartha Kula Basic School".to_string()];
        let mut record = answering("Siddhartha Kula Basic School", "Male", 9, "Correct");
        record.responses.remove("FL27_cleaned5");

        assert!(score_record(&record, &ids(), &old).pattern_recognition);

        record.school = "Other School".into();
        assert!(!score_record(&record, &ids(), &old).pattern_recognition);
    }

    #[test]
    fn test_numeracy_analysis_rollup() {
        let records = vec![
            answering("A", "Female", 8, "Correct"),
            answering("A", "Male", 8, "Correct").with_response("FL25_cleaned1", "Incorrect"),
            answering("A", "Male", 9, "Incorrect"),
            SurveyRecord::new("A", "2", "Female", 7),
        ];

        let result = numeracy_analysis(&records, &ids(), &[]).unwrap();
        assert_eq!(result.total_students, 4);

        let reading = result.task(Task::NumberReading).unwrap();
        assert_eq!(reading.overall.count, 2);
        assert_eq!(reading.overall.percentage, 50.0);

        let addition = result.task(Task::Addition).unwrap();
        assert_eq!(addition.overall.count, 1);
        assert_eq!(addition.by_gender["Male"].count, 0);
        assert_eq!(addition.by_gender["Female"].count, 1);

        assert_eq!(result.foundational().count, 1);
        assert_eq!(result.foundational().percentage, 25.0);
        assert_eq!(result.foundational_task().unwrap().by_age[&8].percentage, 50.0);
    }

    #[test]
    fn test_numeracy_analysis_rejects_short_id_list() {
        let err = numeracy_analysis(&[], &ids()[..10], &[]).unwrap_err();
        assert_eq!(
            err,
            SurveyError::InvalidIds {
                subject: "numeracy",
                expected: 23,
                actual: 10
            }
        );
    }

    #[test]
    fn test_empty_records() {
        let result = numeracy_analysis(&[], &ids(), &[]).unwrap();
        assert_eq!(result.foundational().percentage, 0.0);
        assert!(result.tasks.iter().all(|t| t.by_age.is_empty()));
    }
}
