//! # Command Line Interface
//!
//! CLI for appraising a trade corpus and publishing the resulting values.

use crate::config::AppraiserConfig;
use crate::display::ValueSheet;
use crate::models::OfferBook;
use crate::solver::AnchorLayeredSolver;
use crate::source::open_source;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use persistence::{create_local_store_with_config, PersistenceConfig, Uuid, ValuesStore};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Barter valuation CLI
#[derive(Parser, Debug)]
#[command(name = "appraiser")]
#[command(about = "Estimate item values from observed barter trades")]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Output format for the value sheet
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Run a single untrimmed pass and print the value sheet
    Appraise {
        /// JSON corpus file or directory of per-item documents
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Appraise with outlier trimming and store the result
    Solve {
        /// JSON corpus file or directory of per-item documents
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Number of passes (overrides the configured value)
        #[arg(long)]
        passes: Option<u32>,

        /// Directory for stored value snapshots
        #[arg(long, default_value = "./data")]
        store_dir: PathBuf,

        /// Print the values without storing them
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl Cli {
    /// Resolve configuration: file (or defaults), then environment, then flags
    pub fn load_config(&self) -> Result<AppraiserConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let mut config = AppraiserConfig::load_from_file(path)?;
                config.apply_env_overrides();
                config
            }
            None => AppraiserConfig::from_env(),
        };

        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.json_logs {
            config.logging.json = true;
        }

        Ok(config)
    }
}

/// Result of a `solve` run
#[derive(Debug)]
pub struct SolveOutcome {
    pub sheet: ValueSheet,
    pub snapshot_id: Option<Uuid>,
}

/// CLI handler
pub struct CliHandler {
    config: AppraiserConfig,
    format: OutputFormat,
}

impl CliHandler {
    /// Create new CLI handler
    pub fn new(config: AppraiserConfig, format: OutputFormat) -> Self {
        Self { config, format }
    }

    /// Handle CLI commands
    pub async fn handle_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Appraise { input } => {
                let sheet = self.appraise(input.as_deref()).await?;
                self.print_sheet(&sheet)?;
            }
            Commands::Solve { input, passes, store_dir, dry_run } => {
                let store_dir = (!dry_run).then_some(store_dir.as_path());
                let outcome = self.solve(input.as_deref(), passes, store_dir).await?;
                self.print_sheet(&outcome.sheet)?;
                if let Some(id) = outcome.snapshot_id {
                    info!("Stored value snapshot {}", id);
                }
            }
        }

        Ok(())
    }

    /// Load the corpus and run one untrimmed pass
    pub async fn appraise(&self, input: Option<&Path>) -> Result<ValueSheet> {
        let book = self.load_book(input).await?;
        Ok(self.solver().appraise(&book))
    }

    /// Load the corpus, solve with trimming and store the sheet unless `store_dir` is `None`
    pub async fn solve(
        &self,
        input: Option<&Path>,
        passes: Option<u32>,
        store_dir: Option<&Path>,
    ) -> Result<SolveOutcome> {
        let book = self.load_book(input).await?;
        let solver = self.solver();
        let passes = passes.unwrap_or_else(|| solver.parameters().passes());
        let sheet = solver.solve_with_trimming(&book, passes);

        let snapshot_id = match store_dir {
            Some(dir) => Some(store_sheet(&sheet, &book, dir).await?),
            None => None,
        };

        Ok(SolveOutcome { sheet, snapshot_id })
    }

    fn solver(&self) -> AnchorLayeredSolver {
        AnchorLayeredSolver::new(self.config.solver.clone())
    }

    async fn load_book(&self, input: Option<&Path>) -> Result<OfferBook> {
        let path = input
            .map(Path::to_path_buf)
            .or_else(|| self.config.source.trades_path.clone())
            .context("No trade input given; pass --input or set source.trades_path")?;

        let source = open_source(path)?;
        info!("Reading trades from {}", source.describe());
        Ok(source.fetch_trades().await?)
    }

    fn print_sheet(&self, sheet: &ValueSheet) -> Result<()> {
        match self.format {
            OutputFormat::Table => print!("{}", sheet.to_table_string()),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(sheet)?),
        }
        Ok(())
    }
}

/// Store `sheet` with each item's trade list from `book`.
///
/// Items on the sheet without trades in the book (the anchor, when it was
/// never traded) are stored with an empty list so both maps share keys.
pub async fn store_sheet(sheet: &ValueSheet, book: &OfferBook, store_dir: &Path) -> Result<Uuid> {
    let values: BTreeMap<String, f64> =
        sheet.iter().map(|(item, value)| (item.to_string(), value.as_f64())).collect();
    let trades = values
        .keys()
        .map(|item| Ok((item.clone(), serde_json::to_value(book.trades(item))?)))
        .collect::<Result<BTreeMap<String, serde_json::Value>>>()?;

    let mut store = create_local_store_with_config(PersistenceConfig::new(store_dir))?;
    store.initialize().await?;
    let id = store.put_values(&values, &trades).await?;
    Ok(id)
}
