use std::collections::BTreeSet;

use crate::analyzers::types::{AssessmentResult, Subject};
use crate::charts::palette::{PASTEL, SET1, SET2};
use crate::charts::{ChartKind, Figure, Point, Series, Unit};

fn unit_for(subject: Subject) -> Unit {
    match subject {
        Subject::Numeracy => Unit::Percent { decimals: 2 },
        Subject::Reading(_) => Unit::Percent { decimals: 1 },
    }
}

/// Overall, gender, age and grade figures for one subject.
///
/// The age and grade figures are left out when there is nothing to group.
pub fn assessment_figures(result: &AssessmentResult) -> Vec<Figure> {
    let subject = result.subject;
    let unit = unit_for(subject);
    let tasks: Vec<String> = result.tasks.iter().map(|t| t.task.label().to_string()).collect();

    let mut figures = Vec::with_capacity(4);

    // Overall
    let overall = Series::new(
        "Overall",
        result
            .tasks
            .iter()
            .map(|t| Point::new(t.task.label(), t.overall.percentage).with_count(t.overall.count))
            .collect(),
    );
    figures.push(
        Figure::new(ChartKind::Bar, format!("Overall {subject} Task Completion"))
            .axes("Task", "Percentage")
            .unit(unit)
            .palette(SET2)
            .color_by_category()
            .categories(tasks.clone())
            .series(overall),
    );

    // By gender
    let genders: BTreeSet<&String> = result.tasks.iter().flat_map(|t| t.by_gender.keys()).collect();
    let mut gender_fig = Figure::new(ChartKind::Bar, format!("{subject} Task Completion by Gender"))
        .axes("Task", "Percentage")
        .unit(unit)
        .palette(SET1)
        .categories(tasks.clone());
    for gender in genders {
        let points = result
            .tasks
            .iter()
            .filter_map(|t| {
                let stat = t.by_gender.get(gender)?;
                Some(Point::new(t.task.label(), stat.percentage).with_count(stat.count))
            })
            .collect();
        gender_fig = gender_fig.series(Series::new(gender.as_str(), points));
    }
    figures.push(gender_fig);

    // By age
    let ages: BTreeSet<u32> = result.tasks.iter().flat_map(|t| t.by_age.keys().copied()).collect();
    if !ages.is_empty() {
        let mut age_fig = Figure::new(ChartKind::Line, format!("{subject} Task Completion by Age"))
            .axes("Age (years)", "Percentage of Students")
            .y_range(0.0, 140.0)
            .unit(unit)
            .palette(SET2)
            .categories(ages.iter().map(u32::to_string).collect());
        for task in &result.tasks {
            let points = task
                .by_age
                .iter()
                .map(|(age, stat)| Point::new(age.to_string(), stat.percentage).with_count(stat.count))
                .collect();
            age_fig = age_fig.series(Series::new(task.task.label(), points));
        }
        figures.push(age_fig);
    }

    // By grade
    let grades: BTreeSet<_> = result.tasks.iter().flat_map(|t| t.by_grade.keys()).collect();
    if !grades.is_empty() {
        let mut grade_fig = Figure::new(ChartKind::Bar, format!("{subject} Task Completion by Grade"))
            .axes("Task", "Percentage")
            .unit(unit)
            .palette(PASTEL)
            .categories(tasks);
        for grade in grades {
            let points = result
                .tasks
                .iter()
                .filter_map(|t| {
                    let stat = t.by_grade.get(grade)?;
                    Some(Point::new(t.task.label(), stat.percentage).with_count(stat.count))
                })
                .collect();
            grade_fig = grade_fig.series(Series::new(format!("Grade {grade}"), points));
        }
        figures.push(grade_fig);
    }

    figures
}
