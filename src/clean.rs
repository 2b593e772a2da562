//! Normalization of free-text school and grade values.
//!
//! Survey exports spell the same school several ways ("Chhabi Basic School-
//! Kalagaun 4 Surkhet", "Chhabi Basic School - Kalagaun 4 Surkhet", ...) and
//! grades as "3", "Grade 3" or "class 3". Everything downstream groups on
//! these values, so they are canonicalized right after parsing.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use crate::parser::SurveyTable;

/// A grade label such as `"2"` or `"kg"`.
///
/// Numeric labels compare as numbers (so `"10"` sorts after `"9"`) and sort
/// before any non-numeric label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grade(pub String);

impl Grade {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn number(&self) -> Option<u32> {
        self.0.parse().ok()
    }
}

impl Ord for Grade {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.number(), other.number()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for Grade {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trims a school name and maps known spelling variants onto the canonical name.
pub fn normalize_school(raw: &str, aliases: &HashMap<String, String>) -> String {
    let trimmed = raw.trim();
    match aliases.get(trimmed) {
        Some(canonical) => canonical.clone(),
        None => trimmed.to_string(),
    }
}

/// Reduces "Grade 3", "class 3" and " 3 " to `"3"`.
pub fn normalize_grade(raw: &str) -> Grade {
    let mut label = raw.trim().to_lowercase();

    if let Some(rest) = label.strip_prefix("grade ") {
        label = rest.trim().to_string();
    }

    if let Some(rest) = label.strip_prefix("class ") {
        let rest = rest.trim();
        if matches!(rest, "1" | "2" | "3" | "4" | "5" | "6" | "7" | "8") {
            label = rest.to_string();
        }
    }

    Grade(label.trim().to_string())
}

/// Applies school and grade normalization to every record in place.
pub fn clean_table(table: &mut SurveyTable, aliases: &HashMap<String, String>) {
    for record in &mut table.records {
        record.school = normalize_school(&record.school, aliases);
        record.grade = normalize_grade(record.grade.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_school_strips_and_maps_aliases() {
        let mut aliases = HashMap::new();
        aliases.insert(
            "Minnath Adarsha Basic School LMC".to_string(),
            "Minnath Adarsha Basic School".to_string(),
        );

        assert_eq!(
            normalize_school("  Minnath Adarsha Basic School LMC ", &aliases),
            "Minnath Adarsha Basic School"
        );
        assert_eq!(normalize_school(" Other School", &aliases), "Other School");
    }

    #[test]
    fn test_normalize_grade_variants() {
        assert_eq!(normalize_grade("3").as_str(), "3");
        assert_eq!(normalize_grade("Grade 3").as_str(), "3");
        assert_eq!(normalize_grade("grade 4 ").as_str(), "4");
        assert_eq!(normalize_grade("Class 2").as_str(), "2");
        assert_eq!(normalize_grade("class 9").as_str(), "class 9");
        assert_eq!(normalize_grade(" KG ").as_str(), "kg");
    }

    #[test]
    fn test_grade_ordering_is_numeric_first() {
        let mut grades = vec![
            Grade::new("10"),
            Grade::new("kg"),
            Grade::new("2"),
            Grade::new("9"),
        ];
        grades.sort();
        let labels: Vec<_> = grades.iter().map(Grade::as_str).collect();
        assert_eq!(labels, vec!["2", "9", "10", "kg"]);
    }
}
