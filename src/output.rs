//! Output formatting and persistence for assessment results.
//!
//! Supports fixed-layout text summaries, JSON logging, and CSV append.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write;
use tracing::{debug, info};

use crate::analyzers::overview::{FoundationalSummary, SkillsSnapshot};
use crate::analyzers::responses::CrossTab;
use crate::analyzers::types::{AssessmentResult, GroupStat, Language};
use crate::config::SchoolTree;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

const RULE: &str = "----------------------------------------";

fn push_line(out: &mut String, n: usize, label: &str, stat: GroupStat) {
    let _ = writeln!(
        out,
        "{n}. {label}: {:.2}% ({}/{})",
        stat.percentage, stat.count, stat.total
    );
}

fn block(title: &str, labels: &[&str], result: &AssessmentResult) -> String {
    let mut out = format!("** {title} **\n{RULE}\n");
    for (i, (label, task)) in labels.iter().zip(&result.tasks).enumerate() {
        push_line(&mut out, i + 1, label, task.overall);
    }
    out.push_str(RULE);
    out
}

/// The numeracy results block, one line per task.
pub fn format_numeracy(result: &AssessmentResult) -> String {
    block(
        "Numeracy Analysis Results",
        &[
            "Number Reading Completed",
            "Number Discrimination Completed",
            "Addition Completed",
            "Pattern Recognition Completed",
            "Foundational Numeracy Skills Demonstrated",
        ],
        result,
    )
}

/// The reading results block for `language`, one line per task.
pub fn format_reading(result: &AssessmentResult, language: Language) -> String {
    block(
        &format!("{language} Reading Analysis Results"),
        &[
            "Read 90%+ Words Correctly",
            "Literal Comprehension Correct",
            "Inferential Comprehension Correct",
            "Foundational Reading Skills Demonstrated",
        ],
        result,
    )
}

fn parity(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

fn push_snapshot(out: &mut String, heading: &str, snapshot: &SkillsSnapshot, language: Language) {
    let _ = writeln!(out, "{heading} ({} students)", snapshot.records);
    let _ = writeln!(
        out,
        "  Foundational {language} reading: {:.2}%",
        snapshot.reading_foundational
    );
    let _ = writeln!(
        out,
        "  Foundational numeracy: {:.2}%",
        snapshot.numeracy_foundational
    );
    for (gender, stat) in &snapshot.reading_by_gender {
        let _ = writeln!(out, "  Reading, {gender}: {:.2}%", stat.percentage);
    }
    for (gender, stat) in &snapshot.numeracy_by_gender {
        let _ = writeln!(out, "  Numeracy, {gender}: {:.2}%", stat.percentage);
    }
    let _ = writeln!(out, "  Reading gender parity index: {}", parity(snapshot.reading_parity));
    let _ = writeln!(
        out,
        "  Numeracy gender parity index: {}",
        parity(snapshot.numeracy_parity)
    );
}

/// Foundational skills summary for ages 7-14 and grades 2/3.
pub fn format_summary(summary: &FoundationalSummary) -> String {
    let mut out = format!("** Foundational Skills Summary ({}) **\n{RULE}\n", summary.language);
    push_snapshot(&mut out, "Children aged 7-14", &summary.ages_7_to_14, summary.language);
    push_snapshot(&mut out, "Children in grade 2/3", &summary.grades_2_3, summary.language);
    out.push_str(RULE);
    out
}

/// Schools indented under their project and district, with record counts.
pub fn format_school_tree(tree: &SchoolTree) -> String {
    let mut out = String::new();
    for (project, districts) in tree {
        let _ = writeln!(out, "{project}");
        for (district, schools) in districts {
            let _ = writeln!(out, "  {district}");
            for school in schools {
                let _ = write!(out, "    {} ({} records)", school.name, school.records);
                if !school.address.is_empty() {
                    let _ = write!(out, " - {}", school.address);
                }
                out.push('\n');
            }
        }
    }
    out
}

/// A cross-tabulation as an aligned text grid, rows down the left.
pub fn format_crosstab(table: &CrossTab) -> String {
    let first = table
        .rows
        .iter()
        .map(String::len)
        .chain([table.row_question.len()])
        .max()
        .unwrap_or(0);
    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(c, name)| {
            table
                .counts
                .iter()
                .map(|row| row[c].to_string().len())
                .chain([name.len()])
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = format!("{:<first$}", table.row_question);
    for (name, width) in table.columns.iter().zip(&widths) {
        let _ = write!(out, "  {name:>width$}");
    }
    out.push('\n');

    for (row, counts) in table.rows.iter().zip(&table.counts) {
        let _ = write!(out, "{row:<first$}");
        for (n, width) in counts.iter().zip(&widths) {
            let _ = write!(out, "  {n:>width$}");
        }
        out.push('\n');
    }
    out
}

/// Logs any serializable value as pretty-printed JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Appends a serializable row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record<T: Serialize>(path: &Path, row: &T) -> Result<()> {
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, "Appending CSV record");

    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(row)?;
    writer.flush()?;

    Ok(())
}
