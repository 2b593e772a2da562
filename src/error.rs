//! Domain errors raised while loading and scoring survey data.

use thiserror::Error;

/// Errors that can occur while reading or scoring survey records.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurveyError {
    #[error("required column '{0}' not found in survey data")]
    MissingColumn(String),
    #[error("unknown dataset '{0}'")]
    UnknownDataset(String),
    #[error("{subject} needs at least {expected} question ids, got {actual}")]
    InvalidIds {
        subject: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("unknown language '{0}' (expected English or Nepali)")]
    UnknownLanguage(String),
}
