//! CLI entry point for the survey dashboard.
//!
//! Loads a survey export, cleans it and prints competency results, builds the
//! HTML dashboard (optionally publishing it to S3), or lists schools and
//! datasets from the configuration.

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use survey_dashboard::analyzers::analyzer::{Scoring, build_dashboard};
use survey_dashboard::analyzers::overview::{
    SchoolComparison, SchoolSelection, foundational_skills_summary, select_schools,
};
use survey_dashboard::analyzers::publish::{write_json_to_s3, write_to_s3};
use survey_dashboard::analyzers::responses::crosstab;
use survey_dashboard::analyzers::types::Language;
use survey_dashboard::{
    charts::heatmap_figure,
    clean::clean_table,
    config::{DashboardConfig, school_info},
    fetch::load_source,
    output::{
        append_record, format_crosstab, format_numeracy, format_reading, format_school_tree,
        format_summary, print_json,
    },
    parser::{ParseOptions, SurveyRecord, SurveyTable, parse_survey},
    report::{svg, write_html_report},
};
use tracing::{debug, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "survey_dashboard")]
#[command(about = "Foundational literacy and numeracy survey dashboard", long_about = None)]
struct Cli {
    /// Dashboard configuration file (JSON); falls back to $SURVEY_CONFIG, then built-in defaults
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Path to a survey CSV or a URL to fetch
    #[arg(value_name = "FILE_OR_URL", required_unless_present = "dataset")]
    source: Option<String>,

    /// Name of a dataset from the configuration
    #[arg(short, long, conflicts_with = "source")]
    dataset: Option<String>,

    /// The row after the header holds question text
    #[arg(long, default_value_t = false)]
    question_row: bool,
}

#[derive(Args)]
struct SelectionArgs {
    /// Only include this school (repeatable)
    #[arg(long = "school")]
    schools: Vec<String>,

    /// Only include schools of this project, e.g. EAST (repeatable)
    #[arg(long = "project")]
    projects: Vec<String>,
}

impl From<SelectionArgs> for SchoolSelection {
    fn from(args: SelectionArgs) -> Self {
        SchoolSelection {
            schools: args.schools,
            projects: args.projects,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print numeracy, English and Nepali reading results
    Analyze {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Log results as JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write the HTML dashboard and optionally upload it to S3
    Report {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Output HTML file
        #[arg(short, long, default_value = "dashboard.html")]
        output: PathBuf,

        /// Optional: S3 bucket to upload the dashboard and its JSON data to
        #[arg(long)]
        s3_bucket: Option<String>,

        /// Optional: Gzip compress uploads
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// Foundational skills summary for ages 7-14 and grades 2/3
    Summary {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Reading language: English or Nepali
        #[arg(short, long, default_value = "English")]
        language: Language,

        /// Override the passage length in words
        #[arg(short, long)]
        words: Option<u32>,
    },
    /// List schools by project and district
    Schools {
        #[command(flatten)]
        source: SourceArgs,

        /// CSV file to append per-school competency rows to
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// List configured datasets
    Datasets,
    /// Cross-tabulate the answers to two questions
    Crosstab {
        #[command(flatten)]
        source: SourceArgs,

        /// Question id for the rows
        #[arg(long)]
        row: String,

        /// Question id for the columns
        #[arg(long)]
        column: String,

        /// Also write the table as an SVG heatmap
        #[arg(long)]
        svg: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/survey_dashboard.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("survey_dashboard.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config)?;

    match cli.command {
        Commands::Analyze {
            source,
            selection,
            json,
        } => {
            let (_, table) = load_table(&source, &config).await?;
            let records = select(&table.records, selection.into(), &config);
            analyze(&records, &config, json)?;
        }
        Commands::Report {
            source,
            selection,
            output,
            s3_bucket,
            gzip,
        } => {
            let (name, table) = load_table(&source, &config).await?;
            let records = select(&table.records, selection.into(), &config);
            report(&name, &table, &records, &config, &output, s3_bucket, gzip).await?;
        }
        Commands::Summary {
            source,
            selection,
            language,
            words,
        } => {
            let (_, table) = load_table(&source, &config).await?;
            let records = select(&table.records, selection.into(), &config);
            let scoring = Scoring::from_config(&config);
            let summary = foundational_skills_summary(&records, &scoring, language, words)?;
            println!("{}", format_summary(&summary));
        }
        Commands::Schools { source, csv } => {
            let (_, table) = load_table(&source, &config).await?;
            schools(&table, &config, csv.as_deref())?;
        }
        Commands::Datasets => {
            for (name, dataset) in &config.datasets {
                println!("{name}: {} ({})", dataset.file, dataset.description);
            }
            info!(total = config.datasets.len(), "Datasets listed");
        }
        Commands::Crosstab {
            source,
            row,
            column,
            svg: svg_path,
        } => {
            let (_, table) = load_table(&source, &config).await?;
            for question in [&row, &column] {
                if !table.has_column(question) {
                    warn!(question = %question, "Question not found in survey columns");
                }
            }

            let tab = crosstab(&table.records, &row, &column);
            print!("{}", format_crosstab(&tab));

            if let Some(path) = svg_path {
                let figure = heatmap_figure(
                    &tab,
                    table.question_label(&row),
                    table.question_label(&column),
                );
                std::fs::write(&path, svg::render(&figure))?;
                info!(path = %path.display(), "Heatmap written");
            }
        }
    }

    Ok(())
}

/// Reads the config from `--config` or `$SURVEY_CONFIG`, else uses the built-in one.
fn load_config(path: Option<String>) -> Result<DashboardConfig> {
    match path.or_else(|| std::env::var("SURVEY_CONFIG").ok()) {
        Some(path) => {
            info!(path = %path, "Loading dashboard config");
            DashboardConfig::load(&path)
        }
        None => {
            debug!("Using built-in dashboard config");
            Ok(DashboardConfig::default())
        }
    }
}

/// Loads, parses and cleans a survey export from a path, URL or configured dataset.
#[tracing::instrument(skip_all, fields(source = ?source.source, dataset = ?source.dataset))]
async fn load_table(source: &SourceArgs, config: &DashboardConfig) -> Result<(String, SurveyTable)> {
    let (name, location) = match (&source.dataset, &source.source) {
        (Some(name), _) => (name.clone(), config.resolve_dataset(name)?.file.clone()),
        (None, Some(path)) => (path.clone(), path.clone()),
        (None, None) => bail!("either FILE_OR_URL or --dataset is required"),
    };

    let bytes = load_source(&location).await?;
    let mut table = parse_survey(
        &bytes,
        ParseOptions {
            question_row: source.question_row,
        },
    )?;
    clean_table(&mut table, &config.school_aliases);

    info!(
        dataset = %name,
        records = table.records.len(),
        dropped = table.dropped,
        "Survey loaded"
    );
    Ok((name, table))
}

fn select(
    records: &[SurveyRecord],
    selection: SchoolSelection,
    config: &DashboardConfig,
) -> Vec<SurveyRecord> {
    let selected = select_schools(records, &selection, config);
    if !selection.is_all() {
        info!(
            schools = ?selection.schools,
            projects = ?selection.projects,
            selected = selected.len(),
            "Records filtered by school"
        );
    }
    if selected.is_empty() {
        warn!("No records match the school selection");
    }
    selected
}

#[tracing::instrument(skip(records, config), fields(records = records.len()))]
fn analyze(records: &[SurveyRecord], config: &DashboardConfig, json: bool) -> Result<()> {
    let scoring = Scoring::from_config(config);
    let results = scoring.all(records)?;

    if json {
        print_json(&results)?;
    } else {
        println!("{}", format_numeracy(&results.numeracy));
        println!("{}", format_reading(&results.english, Language::English));
        println!("{}", format_reading(&results.nepali, Language::Nepali));
    }

    for result in results.iter() {
        if result.unscored > 0 {
            warn!(
                subject = %result.subject,
                unscored = result.unscored,
                "Records without a words-read score count as not meeting any reading task"
            );
        }
    }
    Ok(())
}

#[tracing::instrument(skip(table, records, config), fields(records = records.len()))]
async fn report(
    name: &str,
    table: &SurveyTable,
    records: &[SurveyRecord],
    config: &DashboardConfig,
    output: &Path,
    s3_bucket: Option<String>,
    gzip: bool,
) -> Result<()> {
    let scoring = Scoring::from_config(config);
    let dashboard = build_dashboard(name, records, &scoring, &table.question_text)?;

    write_html_report(&dashboard, output)?;
    info!(path = %output.display(), views = dashboard.views.len(), "Dashboard written");

    let Some(bucket) = s3_bucket else {
        debug!("S3 bucket not specified, skipping upload");
        return Ok(());
    };

    let aws = aws_config::load_from_env().await;
    let s3 = aws_sdk_s3::Client::new(&aws);
    info!(bucket = %bucket, gzip, "S3 upload enabled");

    let stem = output
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or("dashboard");
    let prefix = dashboard.generated_at.format("%Y-%m-%d");

    let html = std::fs::read(output)?;
    write_to_s3(
        &s3,
        &bucket,
        &format!("date={prefix}/{stem}.html"),
        html,
        "text/html; charset=utf-8",
        gzip,
    )
    .await?;
    write_json_to_s3(&s3, &bucket, &format!("date={prefix}/{stem}.json"), &dashboard, gzip).await?;

    Ok(())
}

#[tracing::instrument(skip_all)]
fn schools(table: &SurveyTable, config: &DashboardConfig, csv: Option<&Path>) -> Result<()> {
    let tree = school_info(table, config);
    print!("{}", format_school_tree(&tree));

    if let Some(path) = csv {
        let scoring = Scoring::from_config(config);
        let comparison = SchoolComparison::build(&table.records, &scoring)?;
        for row in &comparison.rows {
            append_record(path, row)?;
        }
        info!(path = %path.display(), rows = comparison.rows.len(), "School rows appended");
    }
    Ok(())
}
