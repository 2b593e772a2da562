//! Dashboard configuration: datasets, school metadata and question ids.
//!
//! Stored as a JSON file on disk. Every section is optional and falls back to
//! the built-in values of the EAST/LLEST deployment:
//! ```json
//! {
//!   "datasets": { "EAST School Records": { "file": "east.csv", "description": "..." } },
//!   "schools": { "Chhabi Basic School": { "address": "Kalagaun 4", "district": "Surkhet", "project": "EAST" } },
//!   "school_aliases": { "Chhabi Basic School- Kalagaun 4 Surkhet": "Chhabi Basic School" },
//!   "old_story_schools": ["Siddhartha Kula Basic School"],
//!   "home_questions": { "reading": ["FL6_cleaned1", "FL6_cleaned2"], "language": ["FL7", "FL9A"] }
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::SurveyError;
use crate::parser::SurveyTable;

/// A named survey export the dashboard can load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dataset {
    pub file: String,
    #[serde(default)]
    pub description: String,
}

/// Location and project of a school.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SchoolMeta {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub project: String,
}

/// Question ids and passage lengths used by the scoring rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssessmentIds {
    pub numeracy: Vec<String>,
    pub english_long: Vec<String>,
    pub nepali_long: Vec<String>,
    pub english_short: Vec<String>,
    pub nepali_short: Vec<String>,
    pub english_long_words: u32,
    pub nepali_new_words: u32,
    pub nepali_old_words: u32,
    pub english_short_words: u32,
    pub nepali_short_words: u32,
}

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for AssessmentIds {
    fn default() -> Self {
        AssessmentIds {
            numeracy: ids(&[
                "FL23_cleaned1",
                "FL23_cleaned2",
                "FL23_cleaned3",
                "FL23_cleaned4",
                "FL23_cleaned5",
                "FL23_cleaned6",
                "FL24_cleaned1",
                "FL24_cleaned2",
                "FL24_cleaned3",
                "FL24_cleaned4",
                "FL24_cleaned5",
                "FL25_cleaned1",
                "FL25_cleaned2",
                "FL25_cleaned3",
                "FL25_cleaned4",
                "FL25_cleaned5",
                "FL26",
                "FL26C",
                "FL27_cleaned1",
                "FL27_cleaned2",
                "FL27_cleaned3",
                "FL27_cleaned4",
                "FL27_cleaned5",
            ]),
            english_long: ids(&[
                "FL19_cleaned",
                "FL21B_cleaned1",
                "FL21B_cleaned2",
                "FL21B_cleaned3",
                "FL21B_cleaned4",
                "FL21B_cleaned5",
            ]),
            nepali_long: ids(&[
                "FL21O_cleaned",
                "FL22_cleaned1",
                "FL22_cleaned2",
                "FL22_cleaned3",
                "FL22_cleaned4",
                "FL22_cleaned5",
            ]),
            english_short: ids(&["FL13_cleaned", "FL15", "FL17"]),
            nepali_short: ids(&["FL21G_cleaned", "FL21I", "FL21K"]),
            english_long_words: 61,
            nepali_new_words: 60,
            nepali_old_words: 48,
            english_short_words: 14,
            nepali_short_words: 16,
        }
    }
}

/// Background questions shown on the home survey tab, as `(first, second)` pairs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HomeQuestions {
    /// Reading at home and being read to at home.
    pub reading: (String, String),
    /// Language spoken at home and at school.
    pub language: (String, String),
}

impl Default for HomeQuestions {
    fn default() -> Self {
        HomeQuestions {
            reading: ("FL6_cleaned1".into(), "FL6_cleaned2".into()),
            language: ("FL7".into(), "FL9A".into()),
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub datasets: BTreeMap<String, Dataset>,
    pub schools: BTreeMap<String, SchoolMeta>,
    pub school_aliases: HashMap<String, String>,
    /// Schools that still use the 48-word Nepali story and whose last
    /// pattern-recognition item was entered incorrectly by the survey app.
    pub old_story_schools: Vec<String>,
    pub assessment: AssessmentIds,
    pub home_questions: HomeQuestions,
}

fn school(address: &str, district: &str, project: &str) -> SchoolMeta {
    SchoolMeta {
        address: address.into(),
        district: district.into(),
        project: project.into(),
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let datasets = [
            (
                "All Records",
                "combined_cleaned_survey_records_Dec2025_withEAST.csv",
                "Complete dataset including all schools from EAST and LLEST projects",
            ),
            (
                "EAST School Records",
                "cleaned_surkhet_dailekh_combined_east_all_Dec2025.csv",
                "Schools from the EAST project (Surkhet & Dailekh regions)",
            ),
            (
                "LLEST School Records",
                "combined_LLEST_first_survey_records.csv",
                "Schools from the LLEST project",
            ),
        ]
        .into_iter()
        .map(|(name, file, description)| {
            (
                name.to_string(),
                Dataset {
                    file: file.into(),
                    description: description.into(),
                },
            )
        })
        .collect();

        let schools = [
            ("Nepal Rastriya Secondary School", school("Khajura 8", "Surkhet", "EAST")),
            ("Chhabi Basic School", school("Kalagaun 4", "Surkhet", "EAST")),
            ("Janajagrit Basic School", school("Padampur 12", "Surkhet", "EAST")),
            ("Janajagriti Basic School - Pyusey", school("Narayan 3, Pyusey", "Dailekh", "EAST")),
            ("Navadurga Basic School", school("Narayan 5, Chhatikot", "Dailekh", "EAST")),
            ("Raina Devi Basic School", school("Narayan 11, Kanda", "Dailekh", "EAST")),
            ("Ghami Basic Solar School", school("Ghami", "Mustang", "LLEST")),
            ("Siddhartha Kula Basic School", school("Nilung, Tinje, Dolpo", "Dolpo", "LLEST")),
            ("Minnath Adarsha Basic School", school("Tangal", "Lalitpur", "LLEST")),
            ("Janta Basic School", school("Santanagar, Dhangadimai", "Dhangadimai", "LLEST")),
            ("Secondary School", school("Basabitti 22, Janakpurdham", "Janakpurdham", "LLEST")),
        ]
        .into_iter()
        .map(|(name, meta)| (name.to_string(), meta))
        .collect();

        let school_aliases = [
            ("Chhabi Basic School- Kalagaun 4 Surkhet", "Chhabi Basic School"),
            ("Chhabi Basic School - Kalagaun 4 Surkhet", "Chhabi Basic School"),
            ("Ghami Solar Basic School", "Ghami Basic Solar School"),
            ("Janajagrit Basic School - Padampur 12 Surkhet", "Janajagrit Basic School"),
            ("Janajagrit Basic School- Padampur 12 Surkhet", "Janajagrit Basic School"),
            (
                "JANAJAGRITI BASIC SCHOOL, NARAYAN 3, PYUSEY, DAILEKH",
                "Janajagriti Basic School - Pyusey",
            ),
            (
                "Janajagriti Basic School, Narayan 3, Pyusey, Dailekh",
                "Janajagriti Basic School - Pyusey",
            ),
            ("Janta Aa Vi Santanagar Dhangadimai", "Janta Basic School"),
            ("Janta Basic School, Santanagar, Dhangadimai", "Janta Basic School"),
            ("Minnath Adarsha Basic School LMC", "Minnath Adarsha Basic School"),
            ("NAVADURGA BASIC SCHOOL, NARAYAN 5, CHHATIKOT, DAILEKH", "Navadurga Basic School"),
            (
                "Nepal Rastriya Secondary School - Khajura 8 Surkhet",
                "Nepal Rastriya Secondary School",
            ),
            (
                "Nepal Rastriya Secondary School- Khajura 8 Surkhet",
                "Nepal Rastriya Secondary School",
            ),
            (
                "Nepal Rastriya Secondary School-Khajura 8 Surkhet",
                "Nepal Rastriya Secondary School",
            ),
            ("RAINA DEVI BASIC SCHOOL, NARAYAN 11, KANDA, DAILEKH", "Raina Devi Basic School"),
            ("Ma vi Basabitti janakpurdham - 22", "Secondary School"),
        ]
        .into_iter()
        .map(|(raw, canonical)| (raw.to_string(), canonical.to_string()))
        .collect();

        DashboardConfig {
            datasets,
            schools,
            school_aliases,
            old_story_schools: vec![
                "Ghami Basic Solar School".to_string(),
                "Siddhartha Kula Basic School".to_string(),
            ],
            assessment: AssessmentIds::default(),
            home_questions: HomeQuestions::default(),
        }
    }
}

impl DashboardConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{path}'"))?;
        let config: DashboardConfig = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config file '{path}'"))?;
        Ok(config)
    }

    /// Returns the file behind a configured dataset name.
    pub fn resolve_dataset(&self, name: &str) -> Result<&Dataset, SurveyError> {
        self.datasets
            .get(name)
            .ok_or_else(|| SurveyError::UnknownDataset(name.to_string()))
    }

    /// Old-story school names, canonicalized through the alias table so that
    /// either spelling in the config matches cleaned records.
    pub fn old_story_set(&self) -> Vec<String> {
        self.old_story_schools
            .iter()
            .map(|s| crate::clean::normalize_school(s, &self.school_aliases))
            .collect()
    }

    pub fn meta(&self, school: &str) -> Option<&SchoolMeta> {
        self.schools.get(school)
    }
}

/// A school as listed in the project/district tree.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SchoolEntry {
    pub name: String,
    pub address: String,
    pub records: usize,
}

/// Schools present in the data, grouped project → district.
pub type SchoolTree = BTreeMap<String, BTreeMap<String, Vec<SchoolEntry>>>;

/// Organizes the schools present in `table` by project and district.
///
/// Schools without metadata land under `Unknown` / `Unknown`.
pub fn school_info(table: &SurveyTable, config: &DashboardConfig) -> SchoolTree {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in &table.records {
        *counts.entry(record.school.as_str()).or_default() += 1;
    }

    let mut tree = SchoolTree::new();
    for (name, records) in counts {
        let (project, district, address) = match config.meta(name) {
            Some(meta) => (
                non_empty_or_unknown(&meta.project),
                non_empty_or_unknown(&meta.district),
                meta.address.clone(),
            ),
            None => ("Unknown".to_string(), "Unknown".to_string(), String::new()),
        };

        tree.entry(project)
            .or_default()
            .entry(district)
            .or_default()
            .push(SchoolEntry {
                name: name.to_string(),
                address,
                records,
            });
    }

    tree
}

fn non_empty_or_unknown(value: &str) -> String {
    if value.is_empty() {
        "Unknown".to_string()
    } else {
        value.to_string()
    }
}
