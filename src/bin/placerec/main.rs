//! Binary entry point for the placerec CLI.
#![forbid(unsafe_code)]

mod config;
mod ui;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use placerec::{
    cli::import_export::{run_export, run_import, ExportConfig, ImportConfig},
    eval::{evaluate, GroundTruth, Metrics},
    logging::init_logging,
    persist::SavedRecords,
    store::{GraphStore, SqliteStore},
    EngineConfig, NeighbourhoodPolicy, RecError, RunSummary, StoreConfig,
};
use serde::Serialize;

use crate::config::CliConfig;
use crate::ui::{format_duration, Theme, Ui};

#[derive(Parser, Debug)]
#[command(
    name = "placerec",
    version,
    about = "Collaborative-filtering place recommendations from check-in history",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[arg(long, global = true, value_name = "FILE", help = "TOML config file")]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_name = "FILTER",
        help = "Log filter directive (falls back to RUST_LOG, then warn)"
    )]
    log_level: Option<String>,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = Theme::Auto,
        help = "Colour theme for text output"
    )]
    theme: Theme,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct StoreArgs {
    #[arg(
        long,
        env = "PLACEREC_STORE",
        value_name = "PATH",
        help = "SQLite check-in store"
    )]
    store: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RunCmd {
    #[arg(value_name = "SAVED_RECORDS_FILE")]
    saved_records_file: PathBuf,

    #[arg(value_name = "TEST_FILE")]
    test_file: PathBuf,

    #[arg(long, value_name = "K", help = "Neighbours kept per user [default: 100]")]
    neighbourhood_size: Option<usize>,

    #[arg(long, value_name = "N", help = "Recommendations kept per user [default: 10]")]
    num_records: Option<usize>,

    #[arg(long, value_enum, help = "Handling of users with fewer than K neighbours")]
    policy: Option<PolicyArg>,

    #[arg(long, value_name = "SECS", help = "Abort the run after this many seconds")]
    timeout_secs: Option<u64>,

    #[arg(long, value_name = "N", help = "Dedicated worker thread count")]
    threads: Option<usize>,

    #[arg(
        long,
        value_name = "USERS",
        help = "Minimum user count before work runs in parallel"
    )]
    parallel_threshold: Option<usize>,

    #[command(flatten)]
    store: StoreArgs,
}

#[derive(Args, Debug)]
struct ImportCmd {
    #[arg(value_name = "CHECKINS_TSV")]
    input: PathBuf,

    #[command(flatten)]
    store: StoreArgs,

    #[arg(long, help = "Create the store if it does not exist")]
    create: bool,

    #[arg(long, default_value = "userID", help = "User id column name")]
    user_column: String,

    #[arg(long, default_value = "placeID", help = "Place id column name")]
    place_column: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recompute recommendations, persist them and evaluate against a test file
    Run(RunCmd),
    /// Evaluate previously persisted recommendations
    Evaluate {
        #[arg(value_name = "SAVED_RECORDS_FILE")]
        saved_records_file: PathBuf,
        #[arg(value_name = "TEST_FILE")]
        test_file: PathBuf,
    },
    /// Load raw check-ins from a TSV file into the store
    Import(ImportCmd),
    /// Write user, place and check-in tables as CSV
    Export {
        #[command(flatten)]
        store: StoreArgs,
        #[arg(long, value_name = "DIR")]
        out_dir: PathBuf,
    },
    /// Print user, place and check-in counts
    Stats {
        #[command(flatten)]
        store: StoreArgs,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyArg {
    Strict,
    UpTo,
}

impl From<PolicyArg> for NeighbourhoodPolicy {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::Strict => NeighbourhoodPolicy::Strict,
            PolicyArg::UpTo => NeighbourhoodPolicy::UpTo,
        }
    }
}

#[derive(Serialize)]
struct RunReport<'a> {
    saved_records_file: &'a Path,
    neighbourhood_size: usize,
    num_records: usize,
    policy: NeighbourhoodPolicy,
    summary: &'a RunSummary,
    metrics: &'a Metrics,
}

#[derive(Serialize)]
struct EvaluateReport<'a> {
    saved_records_file: &'a Path,
    users: usize,
    metrics: &'a Metrics,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let file_config = CliConfig::load(cli.config.clone())?;
    let level = cli
        .log_level
        .clone()
        .or_else(|| file_config.log_level.clone())
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "warn".to_string());
    init_logging(&level)?;

    let ui = Ui::new(cli.theme, matches!(cli.format, OutputFormat::Json));

    match cli.command {
        Command::Run(cmd) => {
            let engine = engine_config(&cmd, &file_config);
            let store = resolve_store(cmd.store.store, &file_config)?;
            let recommender = placerec::Recommender::new(engine)?;

            let task = ui.task("computing recommendations");
            let store = SqliteStore::open_read_only(&store.path)?;
            let outcome = recommender.run(&store)?;
            task.finish();

            let saved = SavedRecords::new(recommender.config(), outcome.recommendations);
            saved.save(&cmd.saved_records_file)?;

            let truth = GroundTruth::load_tsv(&cmd.test_file)?;
            let metrics = evaluate(&saved.records, &truth)?;
            let config = recommender.config();
            let report = RunReport {
                saved_records_file: &cmd.saved_records_file,
                neighbourhood_size: config.neighbourhood_size,
                num_records: config.num_records,
                policy: config.policy,
                summary: &outcome.summary,
                metrics: &metrics,
            };
            emit(&cli.format, &report, || print_run_text(&ui, &report))?;
        }
        Command::Evaluate {
            saved_records_file,
            test_file,
        } => {
            let saved = SavedRecords::load(&saved_records_file)?;
            let truth = GroundTruth::load_tsv(&test_file)?;
            let metrics = evaluate(&saved.records, &truth)?;
            let report = EvaluateReport {
                saved_records_file: &saved_records_file,
                users: saved.records.len(),
                metrics: &metrics,
            };
            emit(&cli.format, &report, || {
                ui.section(
                    "Evaluation",
                    [("records", report.users.to_string())]
                        .into_iter()
                        .chain(metric_rows(&metrics)),
                )
            })?;
        }
        Command::Import(cmd) => {
            let store = resolve_store(cmd.store.store, &file_config)?;
            let cfg = ImportConfig {
                input: cmd.input,
                store_path: store.path,
                create_if_missing: cmd.create,
                user_column: cmd.user_column,
                place_column: cmd.place_column,
            };
            let task = ui.task("importing check-ins");
            let summary = run_import(&cfg)?;
            let elapsed = task.finish();
            emit(&cli.format, &summary, || {
                ui.success(&format!(
                    "imported {} check-ins from {} rows in {}",
                    summary.checkins_imported,
                    summary.rows_read,
                    format_duration(elapsed)
                ))
            })?;
        }
        Command::Export { store, out_dir } => {
            let store = resolve_store(store.store, &file_config)?;
            let cfg = ExportConfig {
                store_path: store.path,
                out_dir,
            };
            let summary = run_export(&cfg)?;
            emit(&cli.format, &summary, || {
                ui.section(
                    "Export",
                    [
                        ("users", summary.users_exported),
                        ("places", summary.places_exported),
                        ("checkins", summary.checkins_exported),
                    ],
                )
            })?;
        }
        Command::Stats { store } => {
            let store = resolve_store(store.store, &file_config)?;
            let counts = SqliteStore::open_read_only(&store.path)?.counts()?;
            emit(&cli.format, &counts, || {
                ui.section(
                    "Store",
                    [
                        ("users", counts.users),
                        ("places", counts.places),
                        ("checkins", counts.checkins),
                    ],
                )
            })?;
        }
    }
    Ok(())
}

fn engine_config(cmd: &RunCmd, file: &CliConfig) -> EngineConfig {
    let defaults = EngineConfig::default();
    let section = &file.engine;
    EngineConfig {
        neighbourhood_size: cmd
            .neighbourhood_size
            .or(section.neighbourhood_size)
            .unwrap_or(defaults.neighbourhood_size),
        num_records: cmd
            .num_records
            .or(section.num_records)
            .unwrap_or(defaults.num_records),
        policy: cmd
            .policy
            .map(NeighbourhoodPolicy::from)
            .or(section.policy)
            .unwrap_or(defaults.policy),
        parallel_threshold: cmd
            .parallel_threshold
            .or(section.parallel_threshold)
            .unwrap_or(defaults.parallel_threshold),
        thread_pool_size: cmd.threads.or(section.threads),
        timeout: cmd
            .timeout_secs
            .or(section.timeout_secs)
            .map(Duration::from_secs),
    }
}

fn resolve_store(flag: Option<PathBuf>, file: &CliConfig) -> Result<StoreConfig, RecError> {
    flag.or_else(|| file.store.path.clone())
        .map(StoreConfig::new)
        .ok_or_else(|| {
            RecError::Configuration(
                "no store path given (use --store, PLACEREC_STORE or [store] path)".into(),
            )
        })
}

fn metric_rows(metrics: &Metrics) -> Vec<(&'static str, String)> {
    vec![
        ("hits", metrics.hit_count.to_string()),
        ("predicted", metrics.pred_count.to_string()),
        ("actual", metrics.actual_count.to_string()),
        ("precision", format!("{:.4}", metrics.precision)),
        ("recall", format!("{:.4}", metrics.recall)),
        ("f1", format!("{:.4}", metrics.f1)),
    ]
}

fn print_run_text(ui: &Ui, report: &RunReport<'_>) {
    let summary = report.summary;
    ui.section(
        "Run",
        [
            ("neighbourhood size", report.neighbourhood_size.to_string()),
            ("records per user", report.num_records.to_string()),
            ("policy", report.policy.as_str().to_string()),
            ("users", summary.users.to_string()),
            ("places", summary.places.to_string()),
            ("checkins", summary.checkins.to_string()),
            ("with neighbourhood", summary.users_with_neighbourhood.to_string()),
            ("recommended", summary.users_recommended.to_string()),
            (
                "elapsed",
                format_duration(Duration::from_millis(summary.elapsed_ms)),
            ),
            ("saved to", report.saved_records_file.display().to_string()),
        ],
    );
    ui.section("Evaluation", metric_rows(report.metrics));
}

fn emit<T, F>(format: &OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: Serialize,
    F: FnOnce(),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(),
    }
    Ok(())
}
