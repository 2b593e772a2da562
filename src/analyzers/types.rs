//! Data types produced by the scoring pipeline.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::analyzers::utility::pct;
use crate::clean::Grade;
use crate::error::SurveyError;

/// Language of a reading passage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Language {
    English,
    Nepali,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::English => f.write_str("English"),
            Language::Nepali => f.write_str("Nepali"),
        }
    }
}

impl FromStr for Language {
    type Err = SurveyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "english" | "en" => Ok(Language::English),
            "nepali" | "ne" => Ok(Language::Nepali),
            _ => Err(SurveyError::UnknownLanguage(s.to_string())),
        }
    }
}

/// The subject an [`AssessmentResult`] covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Subject {
    Numeracy,
    Reading(Language),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Numeracy => f.write_str("Numeracy"),
            Subject::Reading(lang) => write!(f, "{lang} Reading"),
        }
    }
}

/// A single pass/fail competency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    NumberReading,
    NumberDiscrimination,
    Addition,
    PatternRecognition,
    FoundationalNumeracy,
    ReadWords,
    LiteralComprehension,
    InferentialComprehension,
    FoundationalReading,
}

impl Task {
    pub const NUMERACY: [Task; 5] = [
        Task::NumberReading,
        Task::NumberDiscrimination,
        Task::Addition,
        Task::PatternRecognition,
        Task::FoundationalNumeracy,
    ];

    pub const READING: [Task; 4] = [
        Task::ReadWords,
        Task::LiteralComprehension,
        Task::InferentialComprehension,
        Task::FoundationalReading,
    ];

    /// Chart and table label.
    pub fn label(self) -> &'static str {
        match self {
            Task::NumberReading => "Number Reading",
            Task::NumberDiscrimination => "Number Discrimination",
            Task::Addition => "Addition",
            Task::PatternRecognition => "Pattern Recognition",
            Task::FoundationalNumeracy => "Foundational Numeracy",
            Task::ReadWords => "Reading (Words)",
            Task::LiteralComprehension => "Literal Comprehension",
            Task::InferentialComprehension => "Inferential Comprehension",
            Task::FoundationalReading => "Foundational Reading",
        }
    }
}

/// Pass count out of a group total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GroupStat {
    pub total: usize,
    pub count: usize,
    pub percentage: f64,
}

impl GroupStat {
    pub fn new(count: usize, total: usize) -> Self {
        GroupStat {
            total,
            count,
            percentage: pct(count, total),
        }
    }

    /// Students in the group that did not meet the task.
    pub fn missed(&self) -> usize {
        self.total - self.count
    }
}

/// One task rolled up overall and by gender, age and grade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskResult {
    pub task: Task,
    pub overall: GroupStat,
    pub by_gender: BTreeMap<String, GroupStat>,
    pub by_age: BTreeMap<u32, GroupStat>,
    pub by_grade: BTreeMap<Grade, GroupStat>,
}

/// All task results for one subject over a set of records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentResult {
    pub subject: Subject,
    pub total_students: usize,
    /// Records with no usable words-read count (reading only).
    pub unscored: usize,
    pub tasks: Vec<TaskResult>,
}

impl AssessmentResult {
    pub fn task(&self, task: Task) -> Option<&TaskResult> {
        self.tasks.iter().find(|t| t.task == task)
    }

    /// The conjunction of every task, which is always the last one.
    pub fn foundational_task(&self) -> Option<&TaskResult> {
        self.tasks.last()
    }

    pub fn foundational(&self) -> GroupStat {
        self.foundational_task()
            .map(|t| t.overall)
            .unwrap_or_default()
    }
}

/// Numeracy plus both reading languages over the same records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectResults {
    pub numeracy: AssessmentResult,
    pub english: AssessmentResult,
    pub nepali: AssessmentResult,
}

impl SubjectResults {
    pub fn iter(&self) -> impl Iterator<Item = &AssessmentResult> {
        [&self.numeracy, &self.english, &self.nepali].into_iter()
    }
}
