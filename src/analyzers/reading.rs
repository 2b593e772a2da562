//! Reading scoring.
//!
//! A reading task uses six ids. The first holds the number of words of the
//! passage the student read correctly; the rest are comprehension questions.
//! A student is *fluent* when they read at least 90% of the passage words
//! (rounded down). Comprehension only counts for fluent students.
//!
//! The Nepali passage changed between survey rounds. The newer story has four
//! literal questions and one inferential; the older story (still used at a
//! couple of schools) and the English story have three literal and two
//! inferential.

use tracing::debug;

use crate::analyzers::aggregate::task_result;
use crate::analyzers::types::{AssessmentResult, Language, Subject, Task};
use crate::config::AssessmentIds;
use crate::error::SurveyError;
use crate::parser::SurveyRecord;

pub const READING_ID_COUNT: usize = 6;

/// Passage lengths for each story version.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadingRules {
    pub language: Language,
    pub english_words: u32,
    pub nepali_new_words: u32,
    pub nepali_old_words: u32,
    /// Replaces the passage length for every record when set.
    pub words_override: Option<u32>,
}

impl ReadingRules {
    pub fn new(language: Language, assessment: &AssessmentIds) -> Self {
        ReadingRules {
            language,
            english_words: assessment.english_long_words,
            nepali_new_words: assessment.nepali_new_words,
            nepali_old_words: assessment.nepali_old_words,
            words_override: None,
        }
    }

    pub fn with_total_words(mut self, total: Option<u32>) -> Self {
        self.words_override = total;
        self
    }

    /// The story layout a record was assessed with.
    pub fn story(&self, old_story: bool) -> Story {
        let (default_words, literal) = match (self.language, old_story) {
            (Language::English, _) => (self.english_words, 1..4),
            (Language::Nepali, true) => (self.nepali_old_words, 1..4),
            (Language::Nepali, false) => (self.nepali_new_words, 1..5),
        };

        Story {
            total_words: self.words_override.unwrap_or(default_words),
            literal,
        }
    }
}

/// Passage length and which question indices are literal; the remaining
/// indices up to 5 are inferential.
#[derive(Debug, Clone, PartialEq)]
pub struct Story {
    pub total_words: u32,
    pub literal: std::ops::Range<usize>,
}

impl Story {
    pub fn threshold(&self) -> u32 {
        threshold(self.total_words)
    }

    fn inferential(&self) -> std::ops::Range<usize> {
        self.literal.end..READING_ID_COUNT
    }
}

/// Words needed for fluency: 90% of the passage, rounded down.
pub fn threshold(total_words: u32) -> u32 {
    total_words * 9 / 10
}

/// Per-record reading flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadingFlags {
    pub scored: bool,
    pub fluent: bool,
    pub literal: bool,
    pub inferential: bool,
}

impl ReadingFlags {
    pub fn foundational(&self) -> bool {
        self.fluent && self.literal && self.inferential
    }

    fn get(&self, task: Task) -> bool {
        match task {
            Task::ReadWords => self.fluent,
            Task::LiteralComprehension => self.literal,
            Task::InferentialComprehension => self.inferential,
            _ => self.foundational(),
        }
    }
}

/// Scores one record. `ids` must hold at least [`READING_ID_COUNT`] entries.
pub fn score_record(
    record: &SurveyRecord,
    ids: &[String],
    rules: &ReadingRules,
    old_story_schools: &[String],
) -> ReadingFlags {
    let old_story = old_story_schools.iter().any(|s| *s == record.school);
    let story = rules.story(old_story);

    let Some(words) = record.numeric(&ids[0]) else {
        return ReadingFlags::default();
    };

    let fluent = words >= story.threshold() as f64;
    let correct = |range: std::ops::Range<usize>| ids[range].iter().all(|id| record.is_correct(id));

    ReadingFlags {
        scored: true,
        fluent,
        literal: fluent && correct(story.literal.clone()),
        inferential: fluent && correct(story.inferential()),
    }
}

/// Scores every record for one language and rolls the four reading tasks up
/// by gender, age and grade.
///
/// Records without a numeric words-read value stay in every denominator and
/// fail every task.
///
/// # Errors
///
/// Returns [`SurveyError::InvalidIds`] if fewer than six ids are given.
pub fn reading_analysis(
    records: &[SurveyRecord],
    ids: &[String],
    rules: &ReadingRules,
    old_story_schools: &[String],
) -> Result<AssessmentResult, SurveyError> {
    if ids.len() < READING_ID_COUNT {
        return Err(SurveyError::InvalidIds {
            subject: "reading",
            expected: READING_ID_COUNT,
            actual: ids.len(),
        });
    }

    let flags: Vec<ReadingFlags> = records
        .iter()
        .map(|r| score_record(r, ids, rules, old_story_schools))
        .collect();
    let unscored = flags.iter().filter(|f| !f.scored).count();

    let tasks = Task::READING
        .iter()
        .map(|&task| {
            let passes: Vec<bool> = flags.iter().map(|f| f.get(task)).collect();
            task_result(task, records, &passes)
        })
        .collect();

    debug!(
        language = %rules.language,
        students = records.len(),
        unscored,
        "Reading analysis complete"
    );

    Ok(AssessmentResult {
        subject: Subject::Reading(rules.language),
        total_students: records.len(),
        unscored,
        tasks,
    })
}
