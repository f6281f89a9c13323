//! # Configuration Management
//!
//! Tunables for the valuation solver plus the collaborators around it.
//! Every field has a default and out-of-range values are clamped at the
//! point of use rather than rejected.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_ANCHOR_ITEM: &str = "Perfect Amethyst";
pub const DEFAULT_MAX_ROUNDS: u32 = 50;
pub const DEFAULT_RETAIL_COUNT_MAX: i64 = 5;
pub const DEFAULT_AGG_QUANTILE: f64 = 0.5;
pub const DEFAULT_TRIM_ALPHA: f64 = 0.10;
pub const DEFAULT_TRIM_MIN_TRADES: usize = 10;
pub const DEFAULT_PASSES: u32 = 2;

/// Main configuration for the appraiser binary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppraiserConfig {
    /// Solver parameters
    pub solver: SolverParameters,
    /// Trade data source
    pub source: SourceConfig,
    /// Logging output
    pub logging: LoggingConfig,
}

/// Parameters of the anchor-layered solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverParameters {
    /// Item pinned at value 1
    pub anchor_item: String,

    /// Safety bound on propagation rounds (at least 1)
    pub max_rounds: u32,

    /// Trades with at most this many subject units count as retail
    pub retail_count_max: i64,

    /// Nearest-rank quantile used to aggregate unit prices (0.5 = median)
    pub agg_quantile: f64,

    /// Fraction trimmed from each tail; active only when `0 < alpha < 0.5`
    pub trim_alpha: f64,

    /// Minimum number of priced trades before an item is trimmed
    pub trim_min_trades: usize,

    /// Number of appraise passes; every pass after the first trims first
    pub passes: u32,
}

impl Default for SolverParameters {
    fn default() -> Self {
        Self {
            anchor_item: DEFAULT_ANCHOR_ITEM.to_string(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            retail_count_max: DEFAULT_RETAIL_COUNT_MAX,
            agg_quantile: DEFAULT_AGG_QUANTILE,
            trim_alpha: DEFAULT_TRIM_ALPHA,
            trim_min_trades: DEFAULT_TRIM_MIN_TRADES,
            passes: DEFAULT_PASSES,
        }
    }
}

impl SolverParameters {
    pub fn max_rounds(&self) -> u32 {
        self.max_rounds.max(1)
    }

    pub fn retail_count_max(&self) -> i64 {
        self.retail_count_max.max(0)
    }

    /// Aggregation quantile clamped to `[0, 1]`; NaN falls back to the median
    pub fn agg_quantile(&self) -> f64 {
        if self.agg_quantile.is_nan() {
            return DEFAULT_AGG_QUANTILE;
        }
        self.agg_quantile.clamp(0.0, 1.0)
    }

    pub fn passes(&self) -> u32 {
        self.passes.max(1)
    }
}

/// Where trade documents are read from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// JSON corpus file or a directory of per-item JSON documents
    pub trades_path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON log lines
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

impl AppraiserConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppraiserConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Override fields from `APPRAISER_*` environment variables.
    ///
    /// Unparsable values leave the current setting untouched.
    pub fn apply_env_overrides(&mut self) {
        let solver = &mut self.solver;

        if let Ok(anchor) = std::env::var("APPRAISER_ANCHOR") {
            solver.anchor_item = anchor;
        }

        if let Ok(rounds) = std::env::var("APPRAISER_MAX_ROUNDS") {
            solver.max_rounds = rounds.parse().unwrap_or(solver.max_rounds);
        }

        if let Ok(retail) = std::env::var("APPRAISER_RETAIL_MAX") {
            solver.retail_count_max = retail.parse().unwrap_or(solver.retail_count_max);
        }

        if let Ok(quantile) = std::env::var("APPRAISER_QUANTILE") {
            solver.agg_quantile = quantile.parse().unwrap_or(solver.agg_quantile);
        }

        if let Ok(alpha) = std::env::var("APPRAISER_TRIM_ALPHA") {
            solver.trim_alpha = alpha.parse().unwrap_or(solver.trim_alpha);
        }

        if let Ok(min_trades) = std::env::var("APPRAISER_TRIM_MIN_TRADES") {
            solver.trim_min_trades = min_trades.parse().unwrap_or(solver.trim_min_trades);
        }

        if let Ok(passes) = std::env::var("APPRAISER_PASSES") {
            solver.passes = passes.parse().unwrap_or(solver.passes);
        }

        if let Ok(path) = std::env::var("APPRAISER_TRADES_PATH") {
            self.source.trades_path = Some(PathBuf::from(path));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_parameters() {
        let params = SolverParameters::default();
        assert_eq!(params.anchor_item, "Perfect Amethyst");
        assert_eq!(params.max_rounds(), 50);
        assert_eq!(params.retail_count_max(), 5);
        assert_eq!(params.agg_quantile(), 0.5);
        assert_eq!(params.trim_alpha, 0.10);
        assert_eq!(params.trim_min_trades, 10);
        assert_eq!(params.passes(), 2);
    }

    #[test]
    fn test_parameters_are_clamped() {
        let params = SolverParameters {
            max_rounds: 0,
            retail_count_max: -3,
            agg_quantile: 1.7,
            passes: 0,
            ..Default::default()
        };
        assert_eq!(params.max_rounds(), 1);
        assert_eq!(params.retail_count_max(), 0);
        assert_eq!(params.agg_quantile(), 1.0);
        assert_eq!(params.passes(), 1);

        let params = SolverParameters { agg_quantile: -0.2, ..Default::default() };
        assert_eq!(params.agg_quantile(), 0.0);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: AppraiserConfig = toml::from_str(
            r#"
            [solver]
            anchor_item = "Ist Rune"
            passes = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.solver.anchor_item, "Ist Rune");
        assert_eq!(config.solver.passes, 3);
        assert_eq!(config.solver.max_rounds, DEFAULT_MAX_ROUNDS);
        assert_eq!(config.logging.level, "info");
        assert!(config.source.trades_path.is_none());
    }

    #[test]
    fn test_config_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("appraiser.toml");

        let mut config = AppraiserConfig::default();
        config.solver.trim_alpha = 0.2;
        config.source.trades_path = Some(PathBuf::from("trades.json"));
        config.save_to_file(&path).unwrap();

        let loaded = AppraiserConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.solver, config.solver);
        assert_eq!(loaded.source.trades_path, Some(PathBuf::from("trades.json")));
    }

    #[test]
    fn test_env_overrides_and_bad_values() {
        let vars = [
            ("APPRAISER_ANCHOR", "Ist Rune"),
            ("APPRAISER_MAX_ROUNDS", "7"),
            ("APPRAISER_RETAIL_MAX", "3"),
            ("APPRAISER_QUANTILE", "0.25"),
            ("APPRAISER_TRIM_ALPHA", "not-a-number"),
            ("APPRAISER_TRIM_MIN_TRADES", "12"),
            ("APPRAISER_PASSES", "abc"),
            ("APPRAISER_TRADES_PATH", "/data/trades.json"),
        ];
        for (key, value) in vars {
            std::env::set_var(key, value);
        }

        let config = AppraiserConfig::from_env();

        let mut from_file = AppraiserConfig::default();
        from_file.solver.passes = 5;
        from_file.solver.trim_alpha = 0.2;
        from_file.apply_env_overrides();

        for (key, _) in vars {
            std::env::remove_var(key);
        }

        assert_eq!(config.solver.anchor_item, "Ist Rune");
        assert_eq!(config.solver.max_rounds, 7);
        assert_eq!(config.solver.retail_count_max, 3);
        assert_eq!(config.solver.agg_quantile, 0.25);
        assert_eq!(config.solver.trim_min_trades, 12);
        assert_eq!(config.source.trades_path, Some(PathBuf::from("/data/trades.json")));
        // unparsable values keep the current setting
        assert_eq!(config.solver.trim_alpha, DEFAULT_TRIM_ALPHA);
        assert_eq!(config.solver.passes, DEFAULT_PASSES);
        assert_eq!(from_file.solver.passes, 5);
        assert_eq!(from_file.solver.trim_alpha, 0.2);
        assert_eq!(from_file.solver.max_rounds, 7);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(AppraiserConfig::load_from_file(temp_dir.path().join("missing.toml")).is_err());
    }
}
