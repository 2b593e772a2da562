use crate::analyzers::analyzer::DashboardView;
use crate::analyzers::overview::{Demographics, SchoolRow, TimeHistogram};
use crate::analyzers::responses::CrossTab;
use crate::analyzers::types::GroupStat;
use crate::charts::palette::{ENGLISH_PIE, NEPALI_PIE, NUMERACY_PIE, PASTEL, Palette, SET1, SET2, SET3};
use crate::charts::{ChartKind, Figure, Point, Series, Unit};

fn achievement_pie(title: &str, stat: GroupStat, palette: Palette) -> Figure {
    Figure::new(
        ChartKind::Pie { hole: 0.0 },
        format!("{title} {:.1}%", stat.percentage),
    )
    .unit(Unit::Count)
    .palette(palette)
    .series(Series::new(
        title,
        vec![
            Point::new("Achieved", stat.count as f64),
            Point::new("Not Achieved", stat.missed() as f64),
        ],
    ))
}

/// Demographic figures, then either the multi-school comparison or the
/// single-school achievement pies.
pub fn overview_figures(view: &DashboardView) -> Vec<Figure> {
    let demo = &view.demographics;
    let mut figures = Vec::new();

    figures.push(
        Figure::new(ChartKind::Pie { hole: 0.4 }, "Gender Distribution")
            .unit(Unit::Count)
            .palette(SET1)
            .series(Series::new(
                "Gender",
                demo.by_gender
                    .iter()
                    .map(|(g, n)| Point::new(g.as_str(), *n as f64))
                    .collect(),
            )),
    );

    let grades: Vec<String> = demo.by_grade.keys().map(|g| g.to_string()).collect();
    figures.push(
        Figure::new(ChartKind::Bar, "Grade Distribution")
            .axes("Grade", "Number of Students")
            .unit(Unit::Count)
            .y_range(0.0, demo.students.max(1) as f64 * 1.2)
            .palette(PASTEL)
            .color_by_category()
            .categories(grades)
            .series(Series::new(
                "Students",
                demo.by_grade
                    .iter()
                    .map(|(g, stat)| Point::new(g.to_string(), stat.count as f64))
                    .collect(),
            )),
    );

    let max_age_count = demo.by_age.values().copied().max().unwrap_or(1);
    figures.push(
        Figure::new(ChartKind::Bar, "Age Distribution")
            .axes("Age (years)", "Number of Students")
            .unit(Unit::Count)
            .y_range(0.0, max_age_count as f64 * 1.2)
            .palette(SET3)
            .categories(demo.by_age.keys().map(u32::to_string).collect())
            .series(Series::new(
                "Students",
                demo.by_age
                    .iter()
                    .map(|(age, n)| Point::new(age.to_string(), *n as f64))
                    .collect(),
            )),
    );

    let competency = &view.competency;
    match &view.comparison {
        Some(comparison) => {
            let labels = ["Numeracy", "English Reading", "Nepali Reading"];
            let stats = [competency.numeracy, competency.english, competency.nepali];
            figures.push(
                Figure::new(ChartKind::Bar, "Average Performance Across Selected Schools")
                    .axes("Competency", "Percentage")
                    .y_range(0.0, 100.0)
                    .palette(SET2)
                    .color_by_category()
                    .categories(labels.iter().map(|l| l.to_string()).collect())
                    .series(Series::new(
                        "Average",
                        labels
                            .iter()
                            .zip(stats)
                            .map(|(l, s)| Point::new(*l, s.percentage).with_count(s.count))
                            .collect(),
                    )),
            );

            let schools: Vec<String> = comparison.rows.iter().map(|r| r.school.clone()).collect();
            let column = |name: &str, f: fn(&SchoolRow) -> f64| {
                Series::new(
                    name,
                    comparison
                        .rows
                        .iter()
                        .map(|r| Point::new(r.school.as_str(), f(r)))
                        .collect(),
                )
            };
            figures.push(
                Figure::new(ChartKind::Bar, "School Performance Comparison")
                    .axes("School", "Percentage")
                    .y_range(0.0, 100.0)
                    .palette(SET2)
                    .categories(schools)
                    .series(column("Numeracy", |r| r.numeracy))
                    .series(column("English Reading", |r| r.english))
                    .series(column("Nepali Reading", |r| r.nepali)),
            );

            figures.push(
                Figure::new(ChartKind::Pie { hole: 0.0 }, "Distribution of Students by School")
                    .unit(Unit::Count)
                    .palette(SET3)
                    .series(Series::new(
                        "Schools",
                        demo.by_school
                            .iter()
                            .map(|(s, n)| Point::new(s.as_str(), *n as f64))
                            .collect(),
                    )),
            );
        }
        None => {
            figures.push(achievement_pie("Foundational Numeracy", competency.numeracy, NUMERACY_PIE));
            figures.push(achievement_pie("English Reading", competency.english, ENGLISH_PIE));
            figures.push(achievement_pie("Nepali Reading", competency.nepali, NEPALI_PIE));
        }
    }

    figures.push(gender_by_grade_figure(demo));
    if let Some(times) = &demo.completion_times {
        figures.push(completion_time_figure(times));
    }

    figures
}

/// Students per grade, one bar per gender.
pub fn gender_by_grade_figure(demo: &Demographics) -> Figure {
    let genders: Vec<&String> = demo.by_gender.keys().collect();
    let max = demo
        .gender_by_grade
        .values()
        .flat_map(|g| g.values().copied())
        .max()
        .unwrap_or(1);

    let mut fig = Figure::new(ChartKind::Bar, "Gender Distribution by Grade")
        .axes("Grade", "Number of Students")
        .unit(Unit::Count)
        .y_range(0.0, max as f64 * 1.2)
        .palette(SET1)
        .categories(demo.gender_by_grade.keys().map(|g| g.to_string()).collect());

    for gender in genders {
        let points = demo
            .gender_by_grade
            .iter()
            .filter_map(|(grade, counts)| {
                let n = counts.get(gender)?;
                Some(Point::new(grade.to_string(), *n as f64))
            })
            .collect();
        fig = fig.series(Series::new(gender.as_str(), points));
    }

    fig
}

/// Completion time histogram with a bar per school in each bin.
pub fn completion_time_figure(times: &TimeHistogram) -> Figure {
    let labels = times.labels();
    let max = times.by_school.values().flatten().copied().max().unwrap_or(1);

    let mut fig = Figure::new(ChartKind::Bar, "Distribution of Survey Completion Times")
        .axes("Time Taken (minutes)", "Number of Students")
        .unit(Unit::Count)
        .y_range(0.0, max as f64 * 1.2)
        .palette(SET3)
        .categories(labels.clone());

    for (school, counts) in &times.by_school {
        let points = labels
            .iter()
            .zip(counts)
            .filter(|(_, n)| **n > 0)
            .map(|(label, n)| Point::new(label.as_str(), *n as f64))
            .collect();
        fig = fig.series(Series::new(school.as_str(), points));
    }

    fig
}

/// Heatmap of a response cross-tabulation; rows are the first question.
pub fn heatmap_figure(table: &CrossTab, row_label: &str, column_label: &str) -> Figure {
    let mut fig = Figure::new(ChartKind::Heatmap, format!("{row_label} vs {column_label}"))
        .axes(column_label, row_label)
        .unit(Unit::Count)
        .categories(table.columns.clone());

    for (row, counts) in table.rows.iter().zip(&table.counts) {
        let points = table
            .columns
            .iter()
            .zip(counts)
            .map(|(c, n)| Point::new(c.as_str(), *n as f64))
            .collect();
        fig = fig.series(Series::new(row.as_str(), points));
    }

    fig
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::analyzer::{Scoring, build_view};
    use crate::analyzers::responses::crosstab;
    use crate::config::DashboardConfig;
    use crate::parser::SurveyRecord;
    use std::collections::HashMap;

    fn view(records: &[SurveyRecord]) -> DashboardView {
        let scoring = Scoring::from_config(&DashboardConfig::default());
        build_view("Test", records, &scoring, &HashMap::new()).unwrap()
    }

    #[test]
    fn test_single_school_gets_achievement_pies() {
        let records = vec![
            SurveyRecord::new("A", "2", "Female", 7),
            SurveyRecord::new("A", "3", "Male", 8),
        ];
        let figures = overview_figures(&view(&records));
        let titles: Vec<_> = figures.iter().map(|f| f.title.as_str()).collect();

        assert_eq!(figures.len(), 7);
        assert!(titles.contains(&"Foundational Numeracy 0.0%"));
        let pie = &figures[3];
        assert_eq!(pie.series[0].point("Not Achieved").unwrap().value, 2.0);
        assert_eq!(figures[6].title, "Gender Distribution by Grade");
    }

    #[test]
    fn test_gender_by_grade_figure() {
        let records = vec![
            SurveyRecord::new("A", "2", "Female", 7),
            SurveyRecord::new("A", "2", "Female", 7),
            SurveyRecord::new("A", "3", "Male", 8),
        ];
        let fig = gender_by_grade_figure(&view(&records).demographics);

        assert_eq!(fig.categories, vec!["2", "3"]);
        let names: Vec<_> = fig.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Female", "Male"]);
        assert_eq!(fig.series[0].point("2").unwrap().value, 2.0);
        assert!(fig.series[0].point("3").is_none());
        assert_eq!(fig.series[1].point("3").unwrap().value, 1.0);
    }

    #[test]
    fn test_completion_time_figure_added_when_timed() {
        let mut a = SurveyRecord::new("A", "2", "Female", 7);
        a.elapsed_minutes = Some(12.5);
        let mut b = SurveyRecord::new("B", "2", "Male", 7);
        b.elapsed_minutes = Some(14.0);
        let figures = overview_figures(&view(&[a, b]));
        let fig = figures.last().unwrap();

        assert_eq!(fig.title, "Distribution of Survey Completion Times");
        assert_eq!(fig.categories, vec!["12-13", "13-14", "14-15"]);
        assert_eq!(fig.series.len(), 2);
        assert_eq!(fig.series[0].point("12-13").unwrap().value, 1.0);
        assert_eq!(fig.series[1].point("14-15").unwrap().value, 1.0);
    }

    #[test]
    fn test_multi_school_gets_comparison() {
        let records = vec![
            SurveyRecord::new("A", "2", "Female", 7),
            SurveyRecord::new("B", "3", "Male", 8),
        ];
        let figures = overview_figures(&view(&records));
        let comparison = figures
            .iter()
            .find(|f| f.title == "School Performance Comparison")
            .unwrap();

        assert_eq!(comparison.categories, vec!["A", "B"]);
        assert_eq!(comparison.series.len(), 3);
    }

    #[test]
    fn test_heatmap_figure() {
        let records = vec![
            SurveyRecord::new("A", "2", "Female", 7)
                .with_response("q1", "yes")
                .with_response("q2", "no"),
        ];
        let table = crosstab(&records, "q1", "q2");
        let fig = heatmap_figure(&table, "Read to", "Read at");

        assert_eq!(fig.kind, ChartKind::Heatmap);
        assert_eq!(fig.series[0].name, "yes");
        assert_eq!(fig.series[0].point("no").unwrap().value, 1.0);
    }
}
