//! Dashboard summaries: demographics, school comparison and the foundational
//! skills summary for the 7–14 age band and grades 2/3.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::analyzers::aggregate::{gender_key, grade_key};
use crate::analyzers::analyzer::Scoring;
use crate::analyzers::types::{GroupStat, Language, SubjectResults};
use crate::analyzers::utility::mean;
use crate::clean::Grade;
use crate::config::DashboardConfig;
use crate::error::SurveyError;
use crate::parser::SurveyRecord;

pub const FEMALE: &str = "Female";
pub const MALE: &str = "Male";

/// Head counts and distributions shown at the top of the overview tab.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Demographics {
    pub students: usize,
    pub schools: usize,
    pub by_gender: BTreeMap<String, usize>,
    pub by_school: BTreeMap<String, usize>,
    pub age_range: Option<(u32, u32)>,
    /// Count and share of students per grade.
    pub by_grade: BTreeMap<Grade, GroupStat>,
    pub by_age: BTreeMap<u32, usize>,
    /// Students per gender within each grade.
    pub gender_by_grade: BTreeMap<Grade, BTreeMap<String, usize>>,
    /// Mean survey completion time, when the export records it.
    pub average_minutes: Option<f64>,
    pub completion_times: Option<TimeHistogram>,
}

impl Demographics {
    pub fn from_records(records: &[SurveyRecord]) -> Self {
        let mut by_gender: BTreeMap<String, usize> = BTreeMap::new();
        let mut by_school: BTreeMap<String, usize> = BTreeMap::new();
        let mut grade_counts: BTreeMap<Grade, usize> = BTreeMap::new();
        let mut by_age: BTreeMap<u32, usize> = BTreeMap::new();
        let mut gender_by_grade: BTreeMap<Grade, BTreeMap<String, usize>> = BTreeMap::new();
        let mut minutes = Vec::new();

        for record in records {
            if let Some(g) = gender_key(record) {
                *by_gender.entry(g).or_default() += 1;
            }
            *by_school.entry(record.school.clone()).or_default() += 1;
            if let Some(g) = grade_key(record) {
                if let Some(gender) = gender_key(record) {
                    *gender_by_grade
                        .entry(g.clone())
                        .or_default()
                        .entry(gender)
                        .or_default() += 1;
                }
                *grade_counts.entry(g).or_default() += 1;
            }
            *by_age.entry(record.age).or_default() += 1;
            minutes.extend(record.elapsed_minutes);
        }

        let age_range = match (by_age.keys().next(), by_age.keys().next_back()) {
            (Some(min), Some(max)) => Some((*min, *max)),
            _ => None,
        };

        let by_grade = grade_counts
            .into_iter()
            .map(|(g, n)| (g, GroupStat::new(n, records.len())))
            .collect();

        Demographics {
            students: records.len(),
            schools: by_school.len(),
            by_gender,
            by_school,
            age_range,
            by_grade,
            by_age,
            gender_by_grade,
            average_minutes: (!minutes.is_empty()).then(|| mean(&minutes)),
            completion_times: TimeHistogram::from_records(records, COMPLETION_TIME_BINS),
        }
    }

    pub fn gender_count(&self, gender: &str) -> usize {
        self.by_gender.get(gender).copied().unwrap_or(0)
    }
}

pub const COMPLETION_TIME_BINS: usize = 20;

/// Survey completion times in equal whole-minute bins, counted per school.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeHistogram {
    /// Lower edge of the first bin.
    pub start: f64,
    pub bin_minutes: f64,
    pub bins: usize,
    pub by_school: BTreeMap<String, Vec<usize>>,
}

impl TimeHistogram {
    /// `None` when no record has a completion time. The last bin also holds
    /// the longest time.
    pub fn from_records(records: &[SurveyRecord], max_bins: usize) -> Option<Self> {
        let times: Vec<(&str, f64)> = records
            .iter()
            .filter_map(|r| Some((r.school.as_str(), r.elapsed_minutes?)))
            .filter(|(_, m)| m.is_finite())
            .collect();
        if times.is_empty() {
            return None;
        }

        let min = times.iter().map(|(_, m)| *m).fold(f64::INFINITY, f64::min);
        let max = times.iter().map(|(_, m)| *m).fold(f64::NEG_INFINITY, f64::max);
        let max_bins = max_bins.max(1);
        let start = min.floor();
        let bin_minutes = ((max - start) / max_bins as f64).ceil().max(1.0);
        let bins = (((max - start) / bin_minutes).floor() as usize + 1).min(max_bins);

        let mut by_school: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (school, m) in times {
            let bin = (((m - start) / bin_minutes).floor() as usize).min(bins - 1);
            by_school
                .entry(school.to_string())
                .or_insert_with(|| vec![0; bins])[bin] += 1;
        }

        Some(TimeHistogram {
            start,
            bin_minutes,
            bins,
            by_school,
        })
    }

    /// Bin ranges such as `"10-15"`.
    pub fn labels(&self) -> Vec<String> {
        (0..self.bins)
            .map(|i| {
                let lo = self.start + i as f64 * self.bin_minutes;
                format!("{lo:.0}-{:.0}", lo + self.bin_minutes)
            })
            .collect()
    }

    pub fn totals(&self) -> Vec<usize> {
        let mut totals = vec![0; self.bins];
        for counts in self.by_school.values() {
            for (total, n) in totals.iter_mut().zip(counts) {
                *total += n;
            }
        }
        totals
    }
}

/// Pooled foundational results across all selected records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompetencySummary {
    pub numeracy: GroupStat,
    pub english: GroupStat,
    pub nepali: GroupStat,
}

impl CompetencySummary {
    pub fn from_results(results: &SubjectResults) -> Self {
        CompetencySummary {
            numeracy: results.numeracy.foundational(),
            english: results.english.foundational(),
            nepali: results.nepali.foundational(),
        }
    }
}

/// Foundational percentages for one school.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchoolRow {
    pub school: String,
    pub students: usize,
    pub numeracy: f64,
    pub english: f64,
    pub nepali: f64,
}

/// Foundational percentages for every selected school, sorted by name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchoolComparison {
    pub rows: Vec<SchoolRow>,
}

impl SchoolComparison {
    pub fn build(records: &[SurveyRecord], scoring: &Scoring) -> Result<Self, SurveyError> {
        let schools: BTreeSet<&str> = records.iter().map(|r| r.school.as_str()).collect();

        let mut rows = Vec::with_capacity(schools.len());
        for school in schools {
            let subset: Vec<SurveyRecord> = records
                .iter()
                .filter(|r| r.school == school)
                .cloned()
                .collect();
            let results = scoring.all(&subset)?;
            rows.push(SchoolRow {
                school: school.to_string(),
                students: subset.len(),
                numeracy: results.numeracy.foundational().percentage,
                english: results.english.foundational().percentage,
                nepali: results.nepali.foundational().percentage,
            });
        }

        Ok(SchoolComparison { rows })
    }

    /// Unweighted mean over schools, as `[numeracy, english, nepali]`.
    pub fn averages(&self) -> [f64; 3] {
        let column = |f: fn(&SchoolRow) -> f64| mean(&self.rows.iter().map(f).collect::<Vec<_>>());
        [
            column(|r| r.numeracy),
            column(|r| r.english),
            column(|r| r.nepali),
        ]
    }
}

/// Which schools a dashboard covers. Empty lists on both sides select everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchoolSelection {
    pub schools: Vec<String>,
    pub projects: Vec<String>,
}

impl SchoolSelection {
    pub fn is_all(&self) -> bool {
        self.schools.is_empty() && self.projects.is_empty()
    }

    pub fn includes(&self, school: &str, config: &DashboardConfig) -> bool {
        if self.is_all() || self.schools.iter().any(|s| s == school) {
            return true;
        }
        config
            .meta(school)
            .is_some_and(|m| self.projects.iter().any(|p| p.eq_ignore_ascii_case(&m.project)))
    }
}

/// Keeps the records whose school is part of `selection`.
pub fn select_schools(
    records: &[SurveyRecord],
    selection: &SchoolSelection,
    config: &DashboardConfig,
) -> Vec<SurveyRecord> {
    records
        .iter()
        .filter(|r| selection.includes(&r.school, config))
        .cloned()
        .collect()
}

/// Foundational skills for one slice of students.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillsSnapshot {
    pub records: usize,
    pub reading_foundational: f64,
    pub numeracy_foundational: f64,
    /// Fluency (words read) by gender.
    pub reading_by_gender: BTreeMap<String, GroupStat>,
    /// Number reading by gender.
    pub numeracy_by_gender: BTreeMap<String, GroupStat>,
    pub reading_parity: Option<f64>,
    pub numeracy_parity: Option<f64>,
}

/// Foundational skills for children aged 7–14 and for grades 2/3.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoundationalSummary {
    pub language: Language,
    pub ages_7_to_14: SkillsSnapshot,
    pub grades_2_3: SkillsSnapshot,
}

/// Gender parity index: the female rate over the male rate.
///
/// `None` when either group is absent or the male rate is zero.
pub fn gender_parity(by_gender: &BTreeMap<String, GroupStat>) -> Option<f64> {
    let female = by_gender.get(FEMALE)?;
    let male = by_gender.get(MALE)?;
    if male.percentage == 0.0 {
        return None;
    }
    Some(female.percentage / male.percentage)
}

fn snapshot(
    records: &[SurveyRecord],
    scoring: &Scoring,
    language: Language,
    words_override: Option<u32>,
) -> Result<SkillsSnapshot, SurveyError> {
    let reading = scoring.reading(records, language, words_override)?;
    let numeracy = scoring.numeracy(records)?;

    let reading_by_gender = reading
        .tasks
        .first()
        .map(|t| t.by_gender.clone())
        .unwrap_or_default();
    let numeracy_by_gender = numeracy
        .tasks
        .first()
        .map(|t| t.by_gender.clone())
        .unwrap_or_default();

    Ok(SkillsSnapshot {
        records: records.len(),
        reading_foundational: reading.foundational().percentage,
        numeracy_foundational: numeracy.foundational().percentage,
        reading_parity: gender_parity(&reading_by_gender),
        numeracy_parity: gender_parity(&numeracy_by_gender),
        reading_by_gender,
        numeracy_by_gender,
    })
}

pub fn foundational_skills_summary(
    records: &[SurveyRecord],
    scoring: &Scoring,
    language: Language,
    words_override: Option<u32>,
) -> Result<FoundationalSummary, SurveyError> {
    let by_age: Vec<SurveyRecord> = records
        .iter()
        .filter(|r| (7..=14).contains(&r.age))
        .cloned()
        .collect();
    let by_grade: Vec<SurveyRecord> = records
        .iter()
        .filter(|r| matches!(r.grade.as_str(), "2" | "3"))
        .cloned()
        .collect();

    Ok(FoundationalSummary {
        language,
        ages_7_to_14: snapshot(&by_age, scoring, language, words_override)?,
        grades_2_3: snapshot(&by_grade, scoring, language, words_override)?,
    })
}
