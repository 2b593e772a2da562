use survey_dashboard::analyzers::analyzer::{COMBINED_VIEW, Scoring, build_dashboard};
use survey_dashboard::analyzers::overview::{SchoolSelection, select_schools};
use survey_dashboard::analyzers::responses::{crosstab, distribution_by_grade};
use survey_dashboard::analyzers::types::Task;
use survey_dashboard::clean::clean_table;
use survey_dashboard::config::{DashboardConfig, school_info};
use survey_dashboard::parser::{ParseOptions, SurveyTable, parse_survey};
use survey_dashboard::report::write_html_report;

fn load() -> (SurveyTable, DashboardConfig) {
    let config = DashboardConfig::default();
    let bytes = include_bytes!("fixtures/survey_sample.csv");
    let mut table =
        parse_survey(bytes, ParseOptions { question_row: true }).expect("Failed to parse survey");
    clean_table(&mut table, &config.school_aliases);
    (table, config)
}

#[test]
fn test_parse_and_clean() {
    let (table, _) = load();

    assert_eq!(table.records.len(), 4);
    assert_eq!(table.dropped, 2);
    assert_eq!(table.question_label("FL5"), "Does anyone read to you at home?");

    let schools: Vec<_> = table.records.iter().map(|r| r.school.as_str()).collect();
    assert_eq!(
        schools,
        vec![
            "Chhabi Basic School",
            "Chhabi Basic School",
            "Siddhartha Kula Basic School",
            "Siddhartha Kula Basic School",
        ]
    );
    let grades: Vec<_> = table.records.iter().map(|r| r.grade.as_str()).collect();
    assert_eq!(grades, vec!["2", "3", "3", "4"]);
    assert_eq!(table.records[3].age, 12);
}

#[test]
fn test_full_pipeline() {
    let (table, config) = load();
    let scoring = Scoring::from_config(&config);
    let results = scoring.all(&table.records).unwrap();

    let numeracy = &results.numeracy;
    assert_eq!(numeracy.task(Task::NumberReading).unwrap().overall.count, 3);
    // The old-story student passes pattern recognition without the last item.
    assert_eq!(numeracy.foundational().count, 2);
    assert_eq!(numeracy.foundational().percentage, 50.0);

    assert_eq!(results.english.task(Task::ReadWords).unwrap().overall.count, 2);
    assert_eq!(results.english.foundational().count, 2);
    assert_eq!(results.english.unscored, 0);

    // The old-story student reads 44 of 48 words, enough for fluency.
    assert_eq!(results.nepali.task(Task::ReadWords).unwrap().overall.count, 2);
    assert_eq!(results.nepali.foundational().total, 4);
    assert_eq!(results.nepali.unscored, 2);

    let dashboard = build_dashboard("Fixture", &table.records, &scoring, &table.question_text).unwrap();
    let names: Vec<_> = dashboard.views.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(
        names,
        vec![COMBINED_VIEW, "Chhabi Basic School", "Siddhartha Kula Basic School"]
    );

    let combined = &dashboard.views[0];
    assert_eq!(combined.demographics.average_minutes, Some(15.25));
    assert_eq!(combined.items.perfect.english_long, 1);
    assert_eq!(combined.items.perfect.english_short, 1);
    let times = combined.demographics.completion_times.as_ref().unwrap();
    assert_eq!(times.totals().iter().sum::<usize>(), 2);
    assert!(combined.home.is_empty());
    let comparison = combined.comparison.as_ref().unwrap();
    assert_eq!(comparison.rows.len(), 2);
    assert_eq!(comparison.rows[0].numeracy, 50.0);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dashboard.html");
    write_html_report(&dashboard, &path).unwrap();
    let html = std::fs::read_to_string(&path).unwrap();
    assert!(html.contains("Siddhartha Kula Basic School"));
    assert!(html.contains("** English Reading Analysis Results **"));
    assert!(html.contains("2 of 4 records had no words-read score."));
}

#[test]
fn test_school_selection_and_info() {
    let (table, config) = load();

    let selection = SchoolSelection {
        schools: vec![],
        projects: vec!["llest".to_string()],
    };
    let records = select_schools(&table.records, &selection, &config);
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.school == "Siddhartha Kula Basic School"));

    let tree = school_info(&table, &config);
    assert_eq!(tree["EAST"]["Surkhet"][0].records, 2);
    assert_eq!(tree["LLEST"]["Dolpo"][0].name, "Siddhartha Kula Basic School");
}

#[test]
fn test_crosstab_from_fixture() {
    let (table, _) = load();
    let tab = crosstab(&table.records, "FL5", "FL6");

    assert_eq!(tab.rows, vec!["no", "yes"]);
    assert_eq!(tab.columns, vec!["no", "yes"]);
    assert_eq!(tab.get("yes", "yes"), Some(1));
    assert_eq!(tab.get("yes", "no"), Some(1));
    assert_eq!(tab.get("no", "yes"), Some(0));

    let by_grade = distribution_by_grade(&table.records, "FL5");
    assert_eq!(by_grade.rows, vec!["2", "3"]);
    assert_eq!(by_grade.get("3", "yes"), Some(1));
    assert_eq!(by_grade.get("3", "no"), Some(1));
    assert_eq!(by_grade.counts.iter().flatten().sum::<usize>(), 3);
}
