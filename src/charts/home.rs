use crate::analyzers::responses::{CrossTab, HomeSurvey, ResponseCounts};
use crate::charts::overview::heatmap_figure;
use crate::charts::palette::{PASTEL, SET2};
use crate::charts::{ChartKind, Figure, Point, Series, Unit};

/// Grouped bars of a distribution table: rows along the axis, one series per answer.
pub fn distribution_figure(table: &CrossTab, title: &str, x_label: &str) -> Figure {
    let max = table.counts.iter().flatten().copied().max().unwrap_or(1);
    let mut fig = Figure::new(ChartKind::Bar, title)
        .axes(x_label, "Number of Students")
        .unit(Unit::Count)
        .y_range(0.0, max as f64 * 1.2)
        .palette(SET2)
        .categories(table.rows.clone());

    for (c, answer) in table.columns.iter().enumerate() {
        let points = table
            .rows
            .iter()
            .zip(&table.counts)
            .filter(|(_, counts)| counts[c] > 0)
            .map(|(row, counts)| Point::new(row.as_str(), counts[c] as f64))
            .collect();
        fig = fig.series(Series::new(answer.as_str(), points));
    }

    fig
}

/// One colored bar per answer.
pub fn response_counts_figure(counts: &ResponseCounts, title: &str) -> Figure {
    let max = counts.counts.values().copied().max().unwrap_or(1);
    Figure::new(ChartKind::Bar, title)
        .axes("Language", "Number of Students")
        .unit(Unit::Count)
        .y_range(0.0, max as f64 * 1.2)
        .palette(PASTEL)
        .color_by_category()
        .categories(counts.counts.keys().cloned().collect())
        .series(Series::new(
            "Students",
            counts
                .counts
                .iter()
                .map(|(answer, n)| Point::new(answer.as_str(), *n as f64))
                .collect(),
        ))
}

/// Figures for the home survey tab: reading heatmap and its age and grade
/// breakdowns, then the language heatmap and language counts.
pub fn home_figures(home: &HomeSurvey) -> Vec<Figure> {
    let mut figures = vec![heatmap_figure(
        &home.reading,
        home.label(&home.reading.row_question),
        home.label(&home.reading.column_question),
    )];

    for table in &home.reading_by_age {
        let title = format!(
            "Response Distribution by Age: {}",
            home.label(&table.column_question)
        );
        figures.push(distribution_figure(table, &title, "Age"));
    }
    for table in &home.reading_by_grade {
        let title = format!(
            "Response Distribution by Grade: {}",
            home.label(&table.column_question)
        );
        figures.push(distribution_figure(table, &title, "Grade"));
    }

    figures.push(heatmap_figure(
        &home.language,
        home.label(&home.language.row_question),
        home.label(&home.language.column_question),
    ));
    for counts in &home.languages {
        let title = format!("Distribution of Languages: {}", home.label(&counts.question));
        figures.push(response_counts_figure(counts, &title));
    }

    figures
}
