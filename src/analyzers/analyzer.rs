use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

use crate::analyzers::numeracy::numeracy_analysis;
use crate::analyzers::overview::{CompetencySummary, Demographics, SchoolComparison};
use crate::analyzers::reading::{ReadingRules, reading_analysis};
use crate::analyzers::responses::{
    HomeSurvey, ItemBreakdown, home_survey, item_breakdown, perfect_scores, perfect_scores_by,
};
use crate::analyzers::types::{AssessmentResult, Language, SubjectResults};
use crate::config::{AssessmentIds, DashboardConfig, HomeQuestions};
use crate::error::SurveyError;
use crate::parser::SurveyRecord;

/// Question ids and school exceptions needed to score records and build views.
#[derive(Debug, Clone)]
pub struct Scoring {
    pub assessment: AssessmentIds,
    pub old_story_schools: Vec<String>,
    pub home_questions: HomeQuestions,
}

impl Scoring {
    pub fn from_config(config: &DashboardConfig) -> Self {
        Scoring {
            assessment: config.assessment.clone(),
            old_story_schools: config.old_story_set(),
            home_questions: config.home_questions.clone(),
        }
    }

    pub fn numeracy(&self, records: &[SurveyRecord]) -> Result<AssessmentResult, SurveyError> {
        numeracy_analysis(records, &self.assessment.numeracy, &self.old_story_schools)
    }

    pub fn reading(
        &self,
        records: &[SurveyRecord],
        language: Language,
        words_override: Option<u32>,
    ) -> Result<AssessmentResult, SurveyError> {
        let ids = match language {
            Language::English => &self.assessment.english_long,
            Language::Nepali => &self.assessment.nepali_long,
        };
        let rules = ReadingRules::new(language, &self.assessment).with_total_words(words_override);
        reading_analysis(records, ids, &rules, &self.old_story_schools)
    }

    /// Numeracy, English and Nepali reading over the same records.
    pub fn all(&self, records: &[SurveyRecord]) -> Result<SubjectResults, SurveyError> {
        Ok(SubjectResults {
            numeracy: self.numeracy(records)?,
            english: self.reading(records, Language::English, None)?,
            nepali: self.reading(records, Language::Nepali, None)?,
        })
    }
}

/// Students who read every word of a passage correctly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PerfectScores {
    pub english_short: usize,
    pub english_long: usize,
    pub nepali_short: usize,
    pub nepali_long: usize,
}

impl PerfectScores {
    fn count(records: &[SurveyRecord], ids: &[String], total_words: u32) -> usize {
        ids.first()
            .map(|id| perfect_scores(records, id, total_words))
            .unwrap_or(0)
    }

    /// Old-story schools are measured against the shorter Nepali passage.
    pub fn from_records(
        records: &[SurveyRecord],
        ids: &AssessmentIds,
        old_story_schools: &[String],
    ) -> Self {
        let nepali_words = |r: &SurveyRecord| {
            if old_story_schools.contains(&r.school) {
                ids.nepali_old_words
            } else {
                ids.nepali_new_words
            }
        };
        PerfectScores {
            english_short: Self::count(records, &ids.english_short, ids.english_short_words),
            english_long: Self::count(records, &ids.english_long, ids.english_long_words),
            nepali_short: Self::count(records, &ids.nepali_short, ids.nepali_short_words),
            nepali_long: ids
                .nepali_long
                .first()
                .map(|id| perfect_scores_by(records, id, nepali_words))
                .unwrap_or(0),
        }
    }
}

/// Per-item response counts for each subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemTables {
    pub numeracy: Vec<ItemBreakdown>,
    pub english: Vec<ItemBreakdown>,
    pub nepali: Vec<ItemBreakdown>,
    pub perfect: PerfectScores,
}

/// Everything the dashboard shows for one set of schools.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub name: String,
    pub demographics: Demographics,
    pub results: SubjectResults,
    pub competency: CompetencySummary,
    /// Present when the view spans more than one school.
    pub comparison: Option<SchoolComparison>,
    pub items: ItemTables,
    pub home: HomeSurvey,
}

impl DashboardView {
    pub fn is_single_school(&self) -> bool {
        self.demographics.schools == 1
    }
}

/// A complete dashboard: the combined view followed by one view per school.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub dataset: String,
    pub generated_at: DateTime<Utc>,
    pub views: Vec<DashboardView>,
}

pub const COMBINED_VIEW: &str = "All selected schools";

/// Builds one dashboard view over `records`.
pub fn build_view(
    name: &str,
    records: &[SurveyRecord],
    scoring: &Scoring,
    question_text: &HashMap<String, String>,
) -> Result<DashboardView, SurveyError> {
    let demographics = Demographics::from_records(records);
    let results = scoring.all(records)?;
    let comparison = if demographics.schools > 1 {
        Some(SchoolComparison::build(records, scoring)?)
    } else {
        None
    };

    let ids = &scoring.assessment;
    let items = ItemTables {
        numeracy: item_breakdown(records, &ids.numeracy, question_text),
        english: item_breakdown(records, &ids.english_long[1..], question_text),
        nepali: item_breakdown(records, &ids.nepali_long[1..], question_text),
        perfect: PerfectScores::from_records(records, ids, &scoring.old_story_schools),
    };

    debug!(view = name, students = records.len(), "Dashboard view built");

    Ok(DashboardView {
        name: name.to_string(),
        competency: CompetencySummary::from_results(&results),
        demographics,
        results,
        comparison,
        items,
        home: home_survey(records, &scoring.home_questions, question_text),
    })
}

/// Builds the combined view plus a view per school (when there is more than one).
#[tracing::instrument(skip_all, fields(dataset = %dataset, records = records.len()))]
pub fn build_dashboard(
    dataset: &str,
    records: &[SurveyRecord],
    scoring: &Scoring,
    question_text: &HashMap<String, String>,
) -> Result<Dashboard, SurveyError> {
    let mut views = vec![build_view(COMBINED_VIEW, records, scoring, question_text)?];

    let schools: BTreeSet<&str> = records.iter().map(|r| r.school.as_str()).collect();
    if schools.len() > 1 {
        for school in schools {
            let subset: Vec<SurveyRecord> = records
                .iter()
                .filter(|r| r.school == school)
                .cloned()
                .collect();
            views.push(build_view(school, &subset, scoring, question_text)?);
        }
    }

    info!(views = views.len(), "Dashboard assembled");

    Ok(Dashboard {
        dataset: dataset.to_string(),
        generated_at: Utc::now(),
        views,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<SurveyRecord> {
        vec![
            SurveyRecord::new("A", "2", "Female", 7),
            SurveyRecord::new("B", "3", "Male", 8),
            SurveyRecord::new("B", "3", "Female", 9),
        ]
    }

    #[test]
    fn test_dashboard_has_view_per_school() {
        let config = DashboardConfig::default();
        let scoring = Scoring::from_config(&config);
        let dashboard = build_dashboard("Test", &records(), &scoring, &HashMap::new()).unwrap();

        let names: Vec<_> = dashboard.views.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec![COMBINED_VIEW, "A", "B"]);
        assert!(dashboard.views[0].comparison.is_some());
        assert!(dashboard.views[1].comparison.is_none());
        assert!(dashboard.views[1].is_single_school());
        assert_eq!(dashboard.views[2].demographics.students, 2);
    }

    #[test]
    fn test_single_school_dashboard_has_one_view() {
        let config = DashboardConfig::default();
        let scoring = Scoring::from_config(&config);
        let records = vec![SurveyRecord::new("A", "2", "Female", 7)];
        let dashboard = build_dashboard("Test", &records, &scoring, &HashMap::new()).unwrap();

        assert_eq!(dashboard.views.len(), 1);
        assert!(dashboard.views[0].is_single_school());
        assert_eq!(dashboard.views[0].items.numeracy.len(), 23);
        assert_eq!(dashboard.views[0].items.english.len(), 5);
    }

    #[test]
    fn test_perfect_scores_per_passage() {
        let ids = AssessmentIds::default();
        let records = vec![
            SurveyRecord::new("A", "2", "Female", 7)
                .with_response("FL13_cleaned", "14")
                .with_response("FL19_cleaned", "61"),
            SurveyRecord::new("A", "3", "Male", 8)
                .with_response("FL13_cleaned", "12")
                .with_response("FL21O_cleaned", "60"),
        ];
        let perfect = PerfectScores::from_records(&records, &ids, &[]);

        assert_eq!(
            perfect,
            PerfectScores {
                english_short: 1,
                english_long: 1,
                nepali_short: 0,
                nepali_long: 1,
            }
        );
    }

    #[test]
    fn test_perfect_nepali_score_uses_old_story_length() {
        let config = DashboardConfig::default();
        let scoring = Scoring::from_config(&config);
        let records = vec![
            SurveyRecord::new("Ghami Basic Solar School", "3", "Female", 9)
                .with_response("FL21O_cleaned", "48"),
            SurveyRecord::new("Ghami Basic Solar School", "3", "Male", 9)
                .with_response("FL21O_cleaned", "60"),
            SurveyRecord::new("Kalika", "3", "Male", 9).with_response("FL21O_cleaned", "48"),
        ];
        let perfect =
            PerfectScores::from_records(&records, &scoring.assessment, &scoring.old_story_schools);

        assert_eq!(perfect.nepali_long, 1);

        let view = build_view("Ghami", &records[..2], &scoring, &HashMap::new()).unwrap();
        assert_eq!(view.items.perfect.nepali_long, 1);
    }

    #[test]
    fn test_scoring_rejects_bad_config() {
        let mut config = DashboardConfig::default();
        config.assessment.nepali_long.truncate(2);
        let scoring = Scoring::from_config(&config);
        assert!(scoring.all(&records()).is_err());
    }
}
