//! Item-level response breakdowns and cross-tabulations.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::analyzers::aggregate::grade_key;
use crate::config::HomeQuestions;
use crate::parser::{CORRECT, SurveyRecord};

pub const INCORRECT: &str = "Incorrect";
pub const NO_ANSWER: &str = "No answer";

/// How students answered a single question.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemBreakdown {
    pub id: String,
    pub question: String,
    pub correct: usize,
    pub incorrect: usize,
    pub no_answer: usize,
    pub skipped: usize,
    pub other: usize,
}

impl ItemBreakdown {
    pub fn total(&self) -> usize {
        self.correct + self.incorrect + self.no_answer + self.skipped + self.other
    }
}

/// Counts response codes for each id, labelled with its question text when known.
pub fn item_breakdown(
    records: &[SurveyRecord],
    ids: &[String],
    question_text: &HashMap<String, String>,
) -> Vec<ItemBreakdown> {
    ids.iter()
        .map(|id| {
            let mut item = ItemBreakdown {
                id: id.clone(),
                question: question_text
                    .get(id)
                    .filter(|t| !t.is_empty())
                    .cloned()
                    .unwrap_or_else(|| id.clone()),
                ..Default::default()
            };

            for record in records {
                match record.response(id) {
                    None => item.skipped += 1,
                    Some(CORRECT) => item.correct += 1,
                    Some(INCORRECT) => item.incorrect += 1,
                    Some(NO_ANSWER) => item.no_answer += 1,
                    Some(_) => item.other += 1,
                }
            }

            item
        })
        .collect()
}

/// Students who read every word of a passage.
pub fn perfect_scores(records: &[SurveyRecord], words_id: &str, total_words: u32) -> usize {
    perfect_scores_by(records, words_id, |_| total_words)
}

/// Like [`perfect_scores`], with the passage length chosen per record.
pub fn perfect_scores_by<F>(records: &[SurveyRecord], words_id: &str, total_words: F) -> usize
where
    F: Fn(&SurveyRecord) -> u32,
{
    records
        .iter()
        .filter(|r| r.numeric(words_id) == Some(total_words(r) as f64))
        .count()
}

/// Counts of answer pairs for two questions.
///
/// Answers are trimmed and lowercased. Every combination of observed values
/// is present, with zero where no student gave that pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrossTab {
    pub row_question: String,
    pub column_question: String,
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    /// `counts[row][column]`
    pub counts: Vec<Vec<usize>>,
}

impl CrossTab {
    pub fn get(&self, row: &str, column: &str) -> Option<usize> {
        let r = self.rows.iter().position(|v| v == row)?;
        let c = self.columns.iter().position(|v| v == column)?;
        Some(self.counts[r][c])
    }
}

fn clean_response(record: &SurveyRecord, id: &str) -> Option<String> {
    record
        .response(id)
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

/// Counts `(row, column)` pairs over every observed row and column value.
fn tabulate<K: Ord + Clone>(pairs: &[(K, String)]) -> (Vec<K>, Vec<String>, Vec<Vec<usize>>) {
    let rows: BTreeSet<&K> = pairs.iter().map(|(k, _)| k).collect();
    let columns: BTreeSet<&str> = pairs.iter().map(|(_, v)| v.as_str()).collect();
    let row_index: BTreeMap<&K, usize> = rows.iter().enumerate().map(|(i, k)| (*k, i)).collect();
    let column_index: BTreeMap<&str, usize> =
        columns.iter().enumerate().map(|(i, v)| (*v, i)).collect();

    let mut counts = vec![vec![0; columns.len()]; rows.len()];
    for (k, v) in pairs {
        counts[row_index[&k]][column_index[v.as_str()]] += 1;
    }

    (
        rows.into_iter().cloned().collect(),
        columns.into_iter().map(str::to_string).collect(),
        counts,
    )
}

fn grouped<K, F>(records: &[SurveyRecord], label: &str, question: &str, key: F) -> CrossTab
where
    K: Ord + Clone + ToString,
    F: Fn(&SurveyRecord) -> Option<K>,
{
    let pairs: Vec<(K, String)> = records
        .iter()
        .filter_map(|r| Some((key(r)?, clean_response(r, question)?)))
        .collect();
    let (rows, columns, counts) = tabulate(&pairs);

    CrossTab {
        row_question: label.to_string(),
        column_question: question.to_string(),
        rows: rows.iter().map(K::to_string).collect(),
        columns,
        counts,
    }
}

/// Cross-tabulates two questions; records missing either answer are skipped.
pub fn crosstab(records: &[SurveyRecord], row_question: &str, column_question: &str) -> CrossTab {
    grouped(records, row_question, column_question, |r| {
        clean_response(r, row_question)
    })
}

/// Answers to `question` per student age, youngest first.
pub fn distribution_by_age(records: &[SurveyRecord], question: &str) -> CrossTab {
    grouped(records, "Age", question, |r| Some(r.age))
}

/// Answers to `question` per grade, in grade order. Records without a grade are skipped.
pub fn distribution_by_grade(records: &[SurveyRecord], question: &str) -> CrossTab {
    grouped(records, "Grade", question, grade_key)
}

/// How many students gave each (cleaned) answer to `question`.
pub fn response_counts(records: &[SurveyRecord], question: &str) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for answer in records.iter().filter_map(|r| clean_response(r, question)) {
        *counts.entry(answer).or_default() += 1;
    }
    counts
}

/// Answer counts for one question, in answer order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseCounts {
    pub question: String,
    pub counts: BTreeMap<String, usize>,
}

/// Home reading and language questions: how the paired answers overlap, and
/// how each reading answer spreads over age and grade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeSurvey {
    pub reading: CrossTab,
    pub reading_by_age: Vec<CrossTab>,
    pub reading_by_grade: Vec<CrossTab>,
    pub language: CrossTab,
    pub languages: Vec<ResponseCounts>,
    /// Question text for every id above, falling back to the id.
    pub labels: BTreeMap<String, String>,
}

impl HomeSurvey {
    pub fn label<'a>(&'a self, id: &'a str) -> &'a str {
        self.labels.get(id).map_or(id, String::as_str)
    }

    /// True when none of the questions has any answers in the records.
    pub fn is_empty(&self) -> bool {
        self.reading_by_age.iter().all(|t| t.rows.is_empty())
            && self.languages.iter().all(|c| c.counts.is_empty())
    }
}

pub fn home_survey(
    records: &[SurveyRecord],
    questions: &HomeQuestions,
    question_text: &HashMap<String, String>,
) -> HomeSurvey {
    let (read_a, read_b) = (&questions.reading.0, &questions.reading.1);
    let (home, school) = (&questions.language.0, &questions.language.1);

    let labels = [read_a, read_b, home, school]
        .into_iter()
        .map(|id| {
            let text = question_text
                .get(id)
                .filter(|t| !t.is_empty())
                .unwrap_or(id);
            (id.clone(), text.clone())
        })
        .collect();

    HomeSurvey {
        reading: crosstab(records, read_a, read_b),
        reading_by_age: [read_a, read_b]
            .iter()
            .map(|q| distribution_by_age(records, q))
            .collect(),
        reading_by_grade: [read_a, read_b]
            .iter()
            .map(|q| distribution_by_grade(records, q))
            .collect(),
        language: crosstab(records, home, school),
        languages: [home, school]
            .iter()
            .map(|q| ResponseCounts {
                question: q.to_string(),
                counts: response_counts(records, q),
            })
            .collect(),
        labels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> SurveyRecord {
        SurveyRecord::new("A", "3", "Female", 9)
    }

    #[test]
    fn test_item_breakdown_categories() {
        let ids = vec!["FL15".to_string()];
        let records = vec![
            record().with_response("FL15", "Correct"),
            record().with_response("FL15", "Correct"),
            record().with_response("FL15", "Incorrect"),
            record().with_response("FL15", "No answer"),
            record().with_response("FL15", "7 years"),
            record(),
        ];
        let mut text = HashMap::new();
        text.insert("FL15".to_string(), "How old is Sanu?".to_string());

        let items = item_breakdown(&records, &ids, &text);
        let item = &items[0];
        assert_eq!(item.question, "How old is Sanu?");
        assert_eq!(item.correct, 2);
        assert_eq!(item.incorrect, 1);
        assert_eq!(item.no_answer, 1);
        assert_eq!(item.other, 1);
        assert_eq!(item.skipped, 1);
        assert_eq!(item.total(), 6);
    }

    #[test]
    fn test_perfect_scores() {
        let records = vec![
            record().with_response("FL13_cleaned", "14"),
            record().with_response("FL13_cleaned", "14.0"),
            record().with_response("FL13_cleaned", "13"),
            record(),
        ];
        assert_eq!(perfect_scores(&records, "FL13_cleaned", 14), 2);
    }

    #[test]
    fn test_crosstab_fills_missing_pairs() {
        let records = vec![
            record().with_response("readTo", "Yes").with_response("readAt", "yes "),
            record().with_response("readTo", "yes").with_response("readAt", "No"),
            record().with_response("readTo", "No").with_response("readAt", "no"),
            record().with_response("readTo", "No"),
        ];

        let table = crosstab(&records, "readTo", "readAt");
        assert_eq!(table.rows, vec!["no", "yes"]);
        assert_eq!(table.columns, vec!["no", "yes"]);
        assert_eq!(table.get("yes", "yes"), Some(1));
        assert_eq!(table.get("yes", "no"), Some(1));
        assert_eq!(table.get("no", "no"), Some(1));
        assert_eq!(table.get("no", "yes"), Some(0));
        assert_eq!(table.get("maybe", "yes"), None);
    }

    #[test]
    fn test_distribution_by_age_sorts_numerically() {
        let records = vec![
            SurveyRecord::new("A", "3", "Female", 10).with_response("FL6", "Yes"),
            SurveyRecord::new("A", "3", "Male", 9).with_response("FL6", "no"),
            SurveyRecord::new("A", "3", "Male", 9).with_response("FL6", "yes"),
            SurveyRecord::new("A", "3", "Male", 9),
        ];

        let table = distribution_by_age(&records, "FL6");
        assert_eq!(table.row_question, "Age");
        assert_eq!(table.column_question, "FL6");
        assert_eq!(table.rows, vec!["9", "10"]);
        assert_eq!(table.get("9", "yes"), Some(1));
        assert_eq!(table.get("9", "no"), Some(1));
        assert_eq!(table.get("10", "no"), Some(0));
    }

    #[test]
    fn test_distribution_by_grade_skips_missing_grade() {
        let records = vec![
            SurveyRecord::new("A", "10", "Female", 15).with_response("FL6", "Yes"),
            SurveyRecord::new("A", "2", "Male", 7).with_response("FL6", "Yes"),
            SurveyRecord::new("A", "", "Male", 7).with_response("FL6", "No"),
        ];

        let table = distribution_by_grade(&records, "FL6");
        assert_eq!(table.rows, vec!["2", "10"]);
        assert_eq!(table.columns, vec!["yes"]);
        assert_eq!(table.counts, vec![vec![1], vec![1]]);
    }

    #[test]
    fn test_response_counts() {
        let records = vec![
            record().with_response("FL7", "Nepali"),
            record().with_response("FL7", " nepali"),
            record().with_response("FL7", "Magar"),
            record().with_response("FL7", ""),
            record(),
        ];

        let counts = response_counts(&records, "FL7");
        assert_eq!(counts.len(), 2);
        assert_eq!(counts["nepali"], 2);
        assert_eq!(counts["magar"], 1);
    }

    #[test]
    fn test_home_survey() {
        let questions = HomeQuestions::default();
        let records = vec![
            SurveyRecord::new("A", "2", "Female", 7)
                .with_response("FL6_cleaned1", "Yes")
                .with_response("FL6_cleaned2", "No")
                .with_response("FL7", "Nepali")
                .with_response("FL9A", "Nepali"),
            SurveyRecord::new("A", "3", "Male", 9)
                .with_response("FL6_cleaned1", "yes")
                .with_response("FL6_cleaned2", "yes")
                .with_response("FL7", "Tharu")
                .with_response("FL9A", "Nepali"),
        ];
        let mut text = HashMap::new();
        text.insert("FL7".to_string(), "Language spoken at home".to_string());

        let home = home_survey(&records, &questions, &text);
        assert_eq!(home.reading.get("yes", "no"), Some(1));
        assert_eq!(home.reading_by_age[0].get("9", "yes"), Some(1));
        assert_eq!(home.reading_by_grade[1].rows, vec!["2", "3"]);
        assert_eq!(home.language.get("tharu", "nepali"), Some(1));
        assert_eq!(home.languages[1].counts["nepali"], 2);
        assert_eq!(home.label("FL7"), "Language spoken at home");
        assert_eq!(home.label("FL9A"), "FL9A");
        assert!(!home.is_empty());
        assert!(home_survey(&[], &questions, &text).is_empty());
    }
}
