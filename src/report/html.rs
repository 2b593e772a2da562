//! HTML dashboard generator.
//!
//! Produces a single file with all CSS, JS, charts and data inlined. Each
//! dashboard view is a hidden block switched by the view selector; inside a
//! view the Overview / Numeracy / Reading tabs are switched the same way.

use anyhow::{Context, Result};
use std::fmt::Write;
use std::path::Path;

use crate::analyzers::analyzer::{Dashboard, DashboardView};
use crate::analyzers::responses::ItemBreakdown;
use crate::analyzers::types::{AssessmentResult, Language};
use crate::charts::{Figure, assessment_figures, home_figures, overview_figures};
use crate::output::{format_numeracy, format_reading};
use crate::report::{html_escape, svg};

/// Generate the dashboard page.
pub fn generate_html(dashboard: &Dashboard) -> Result<String> {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    let _ = writeln!(
        html,
        "<title>Educational Survey Dashboard | {}</title>",
        html_escape(&dashboard.dataset)
    );
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>Educational Survey Dashboard</h1>\n");
    if let Some(combined) = dashboard.views.first() {
        let _ = writeln!(
            html,
            "<p class=\"meta\">Dataset: <strong>{}</strong> | {} students | {} schools | {}</p>",
            html_escape(&dashboard.dataset),
            combined.demographics.students,
            combined.demographics.schools,
            dashboard.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }

    html.push_str("<label for=\"view-select\">School view:</label>\n");
    html.push_str("<select id=\"view-select\">\n");
    for (i, view) in dashboard.views.iter().enumerate() {
        let _ = writeln!(
            html,
            "<option value=\"{i}\">{}</option>",
            html_escape(&view.name)
        );
    }
    html.push_str("</select>\n</header>\n");

    for (i, view) in dashboard.views.iter().enumerate() {
        render_view(&mut html, i, view);
    }

    // Raw JSON
    html.push_str("<script type=\"application/json\" id=\"dashboard-data\">\n");
    let data = serde_json::to_string(dashboard).context("serializing dashboard data")?;
    html.push_str(&data.replace('<', "\\u003c"));
    html.push_str("\n</script>\n");

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    Ok(html)
}

/// Write the dashboard page to a file.
pub fn write_html_report(dashboard: &Dashboard, path: &Path) -> Result<()> {
    let html = generate_html(dashboard)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(path, html).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn render_view(html: &mut String, index: usize, view: &DashboardView) {
    let hidden = if index == 0 { "" } else { " hidden" };
    let _ = writeln!(html, "<main class=\"view\" data-view=\"{index}\"{hidden}>");
    let _ = writeln!(html, "<h2>{}</h2>", html_escape(&view.name));

    html.push_str("<nav class=\"tabs\">\n");
    for (tab, label) in TABS {
        let active = if tab == "overview" { " active" } else { "" };
        let _ = writeln!(
            html,
            "<button class=\"tab-button{active}\" data-tab=\"{tab}\" onclick=\"showTab(this)\">{label}</button>"
        );
    }
    html.push_str("</nav>\n");

    // Overview
    html.push_str("<section class=\"tab\" data-tab=\"overview\">\n");
    render_metrics(html, view);
    push_figures(html, &overview_figures(view));
    if let Some(comparison) = &view.comparison {
        html.push_str("<h3>School Comparison</h3>\n");
        html.push_str("<table class=\"summary\">\n");
        html.push_str("<thead><tr><th>School</th><th>Students</th><th>Numeracy</th><th>English Reading</th><th>Nepali Reading</th></tr></thead>\n<tbody>\n");
        for row in &comparison.rows {
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td>{}</td><td>{:.1}%</td><td>{:.1}%</td><td>{:.1}%</td></tr>",
                html_escape(&row.school),
                row.students,
                row.numeracy,
                row.english,
                row.nepali
            );
        }
        let [numeracy, english, nepali] = comparison.averages();
        let _ = writeln!(
            html,
            "<tr class=\"average\"><td>Mean over schools</td><td></td><td>{numeracy:.1}%</td><td>{english:.1}%</td><td>{nepali:.1}%</td></tr>"
        );
        html.push_str("</tbody></table>\n");
    }
    html.push_str("</section>\n");

    // Numeracy
    html.push_str("<section class=\"tab\" data-tab=\"numeracy\" hidden>\n");
    render_subject(
        html,
        &view.results.numeracy,
        &format_numeracy(&view.results.numeracy),
        &view.items.numeracy,
    );
    html.push_str("</section>\n");

    // Reading
    html.push_str("<section class=\"tab\" data-tab=\"reading\" hidden>\n");
    let perfect = &view.items.perfect;
    let _ = writeln!(
        html,
        "<p class=\"meta\">Perfect word scores (of {} students): English short {} | English long {} | Nepali short {} | Nepali long {}</p>",
        view.demographics.students,
        perfect.english_short,
        perfect.english_long,
        perfect.nepali_short,
        perfect.nepali_long
    );
    for (result, language, items) in [
        (&view.results.english, Language::English, &view.items.english),
        (&view.results.nepali, Language::Nepali, &view.items.nepali),
    ] {
        let _ = writeln!(html, "<h3>{language} Reading</h3>");
        render_subject(html, result, &format_reading(result, language), items);
    }
    html.push_str("</section>\n");

    // Home survey
    html.push_str("<section class=\"tab\" data-tab=\"home\" hidden>\n");
    if view.home.is_empty() {
        html.push_str("<p class=\"meta\">No answers to the home reading or language questions.</p>\n");
    } else {
        push_figures(html, &home_figures(&view.home));
    }
    html.push_str("</section>\n");

    html.push_str("</main>\n");
}

fn render_metrics(html: &mut String, view: &DashboardView) {
    let demo = &view.demographics;
    let ages = match demo.age_range {
        Some((min, max)) => format!("{min} - {max}"),
        None => "-".to_string(),
    };
    let minutes = demo
        .average_minutes
        .map(|m| format!("{m:.1} min"))
        .unwrap_or_else(|| "-".to_string());

    html.push_str("<div class=\"metrics\">\n");
    for (label, value) in [
        ("Total Students", demo.students.to_string()),
        ("Schools", demo.schools.to_string()),
        ("Age Range", ages),
        ("Average Survey Time", minutes),
    ] {
        let _ = writeln!(
            html,
            "<div class=\"metric\"><span class=\"metric-label\">{label}</span><span class=\"metric-value\">{}</span></div>",
            html_escape(&value)
        );
    }
    html.push_str("</div>\n");
}

fn render_subject(html: &mut String, result: &AssessmentResult, text: &str, items: &[ItemBreakdown]) {
    let _ = writeln!(html, "<pre>{}</pre>", html_escape(text));
    if result.unscored > 0 {
        let _ = writeln!(
            html,
            "<p class=\"meta\">{} of {} records had no words-read score.</p>",
            result.unscored, result.total_students
        );
    }
    push_figures(html, &assessment_figures(result));
    render_items(html, items);
}

fn render_items(html: &mut String, items: &[ItemBreakdown]) {
    if items.is_empty() {
        return;
    }
    html.push_str("<details>\n<summary>Responses by question</summary>\n");
    html.push_str("<table class=\"items\">\n");
    html.push_str("<thead><tr><th>Id</th><th>Question</th><th>Correct</th><th>Incorrect</th><th>No answer</th><th>Skipped</th><th>Other</th><th>% Correct</th></tr></thead>\n<tbody>\n");
    for item in items {
        let answered = item.total() - item.skipped;
        let pct = if answered == 0 {
            0.0
        } else {
            item.correct as f64 * 100.0 / answered as f64
        };
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{pct:.1}%</td></tr>",
            html_escape(&item.id),
            html_escape(&item.question),
            item.correct,
            item.incorrect,
            item.no_answer,
            item.skipped,
            item.other
        );
    }
    html.push_str("</tbody></table>\n</details>\n");
}

fn push_figures(html: &mut String, figures: &[Figure]) {
    html.push_str("<div class=\"charts\">\n");
    for figure in figures {
        html.push_str(&svg::render(figure));
    }
    html.push_str("</div>\n");
}

const TABS: [(&str, &str); 4] = [
    ("overview", "Overview"),
    ("numeracy", "Numeracy Analysis"),
    ("reading", "Reading Analysis"),
    ("home", "Home Reading and Language"),
];

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --accent: #377eb8; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --accent: #80b1d3; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 1rem; }
.meta { color: #6b7280; }
select { font-size: 1rem; padding: 0.25rem 0.5rem; margin-left: 0.5rem; }
.tabs { display: flex; gap: 0.5rem; border-bottom: 2px solid var(--border); margin: 1rem 0; }
.tab-button { background: none; border: none; padding: 0.5rem 1rem; font-size: 1rem; cursor: pointer; color: var(--fg); }
.tab-button.active { border-bottom: 3px solid var(--accent); font-weight: bold; }
.metrics { display: flex; gap: 1rem; flex-wrap: wrap; }
.metric { border: 1px solid var(--border); border-radius: 8px; padding: 0.75rem 1.25rem; min-width: 10rem; }
.metric-label { display: block; color: #6b7280; font-size: 0.85rem; }
.metric-value { display: block; font-size: 1.5rem; font-weight: bold; }
.charts { display: flex; flex-wrap: wrap; gap: 1rem; }
svg.chart { max-width: 100%; height: auto; }
svg text { fill: currentColor; }
.mark:hover { opacity: 0.8; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
tr.average { font-weight: bold; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
"#;

const JS: &str = r#"
function showView(index) {
  document.querySelectorAll('.view').forEach(v => { v.hidden = v.dataset.view !== index; });
}
function showTab(button) {
  const view = button.closest('.view');
  view.querySelectorAll('.tab-button').forEach(b => b.classList.toggle('active', b === button));
  view.querySelectorAll('.tab').forEach(t => { t.hidden = t.dataset.tab !== button.dataset.tab; });
}
document.getElementById('view-select').addEventListener('change', e => showView(e.target.value));
"#;
