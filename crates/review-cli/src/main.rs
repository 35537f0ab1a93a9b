//! review-cli: operator tooling over `review_core`
//!
//! Results go to stdout as JSON; logs go to stderr.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use review_core::escalation::EscalationState;
use review_core::identity::{
    CaseIdentity, FileKeyValueStore, HttpIdGenerator, IdentityAllocator, IntakeForm,
};
use review_core::projection::RowProjection;
use review_core::quality::{QualityAnalyzer, QualityIssue, QualityStatus};
use review_core::ReviewConfig;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML config file. `REVIEW_*` variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score a document image given as a JSON matrix of numbers
    Analyze { matrix: PathBuf },

    /// Manage the active case id
    Case {
        #[command(subcommand)]
        action: CaseAction,
    },

    /// Build a dashboard row from an escalation document and an image matrix
    Project { state: PathBuf, matrix: PathBuf },
}

#[derive(Subcommand, Debug)]
enum CaseAction {
    /// Allocate a new id from the generator service
    Generate {
        #[command(flatten)]
        intake: IntakeArgs,

        /// Reference date (YYYY-MM-DD), defaults to today in UTC
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Print the active id
    Show,

    /// Clear the active id
    Reset,

    /// Adopt an id entered by hand
    Set { id: String },

    /// Build a canonical id locally and adopt it
    Compose {
        #[arg(long)]
        last_name: String,

        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(clap::Args, Debug)]
struct IntakeArgs {
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    poi_id: Option<String>,
    #[arg(long)]
    bsb: Option<String>,
    #[arg(long)]
    account: Option<String>,
}

impl From<IntakeArgs> for IntakeForm {
    fn from(args: IntakeArgs) -> Self {
        IntakeForm {
            last_name: args.last_name,
            first_name: args.first_name,
            poi_id: args.poi_id,
            bsb: args.bsb,
            account: args.account,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeReport {
    #[serde(flatten)]
    result: review_core::QualityAnalysisResult,
    quality_score: u8,
    primary_quality_issue: QualityIssue,
    quality_status: QualityStatus,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CaseReport {
    active: Option<CaseIdentity>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    debug!(?config, "Configuration loaded");

    match args.command {
        Command::Analyze { matrix } => analyze(&config, &matrix).await,
        Command::Case { action } => case(&config, action).await,
        Command::Project { state, matrix } => project(&config, &state, &matrix).await,
    }
}

fn load_config(path: Option<&Path>) -> Result<ReviewConfig> {
    let mut config = match path {
        Some(path) => ReviewConfig::load(path)?,
        None => ReviewConfig::default(),
    };
    config.apply_env();
    config.validate()?;
    Ok(config)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn analyze(config: &ReviewConfig, path: &Path) -> Result<()> {
    let matrix: Vec<Vec<f64>> = read_json(path)?;
    let analyzer = QualityAnalyzer::with_thresholds(config.quality);
    let result = analyzer.analyze_deferred(&matrix).await?;

    print_json(&AnalyzeReport {
        result,
        quality_score: QualityAnalyzer::compute_quality_score(&result),
        primary_quality_issue: QualityIssue::classify(&result, &config.quality),
        quality_status: QualityStatus::classify(&result, &config.quality),
    })
}

async fn project(config: &ReviewConfig, state_path: &Path, matrix_path: &Path) -> Result<()> {
    let state: EscalationState = read_json(state_path)?;
    let matrix: Vec<Vec<f64>> = read_json(matrix_path)?;

    let quality = QualityAnalyzer::with_thresholds(config.quality)
        .analyze_deferred(&matrix)
        .await?;
    print_json(&RowProjection::new(config.quality).project(&state, &quality))
}

async fn case(config: &ReviewConfig, action: CaseAction) -> Result<()> {
    let identity = &config.identity;
    let generator = HttpIdGenerator::new(&identity.generator_url, identity.request_timeout())
        .context("Failed to build id generator client")?;
    let store = FileKeyValueStore::new(&identity.storage_path);

    let allocator = IdentityAllocator::global_or_init(|| {
        IdentityAllocator::new(Arc::new(store), Arc::new(generator), identity)
    });
    allocator.ready().await;

    match action {
        CaseAction::Generate { intake, date } => {
            let form = IntakeForm::from(intake);
            let outcome = match date {
                Some(date) => allocator.generate_on(&form, date).await,
                None => allocator.generate(&form).await,
            };
            if let Err(e) = outcome {
                if e.is_allocation_failure() {
                    bail!("{e}. Enter the id manually with `case set` or `case compose`.");
                }
                return Err(e.into());
            }
        }
        CaseAction::Show => {}
        CaseAction::Reset => allocator.reset(),
        CaseAction::Set { id } => {
            let id = CaseIdentity::parse(&id)?;
            if !id.is_canonical() {
                info!(case_id = %id, "Adopting non-canonical case id");
            }
            allocator.set_active(id);
        }
        CaseAction::Compose { last_name, date } => {
            let date = date.unwrap_or_else(|| chrono::Utc::now().date_naive());
            allocator.set_active(CaseIdentity::compose(&last_name, date)?);
        }
    }

    allocator.flush().await;
    print_json(&CaseReport {
        active: allocator.current(),
    })
}
