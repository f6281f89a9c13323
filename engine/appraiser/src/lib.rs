//! # Appraiser
//!
//! Estimates the relative value of traded game items from observed barter offers.
//! One item (the anchor) is pinned at value 1; every other item is priced by
//! propagating known values through chains of multi-item trades, then the
//! estimate is refined by discarding outlier trades and re-running the solve.
//!
//! ## Pipeline
//!
//! - **Seeder**: single-item offers against the anchor bootstrap the known set
//! - **Propagation**: layered fixed-point pricing of items whose offers are resolvable
//! - **Aggregation**: retail-preferring nearest-rank quantile over unit prices
//! - **Trimming**: central-band outlier filter driven by a previous pass
//! - **Solver**: `appraise` and `solve_with_trimming` orchestration
//!
//! ## Usage
//!
//! ```rust
//! use appraiser::{AnchorLayeredSolver, OfferBook, SolverParameters, TradeRecord};
//!
//! let mut book = OfferBook::new();
//! book.insert(
//!     "Perfect Amethyst",
//!     vec![TradeRecord::new(3, vec![vec![(1.0, "Ist Rune")]])],
//! );
//! book.insert("Ist Rune", vec![]);
//!
//! let solver = AnchorLayeredSolver::new(SolverParameters::default());
//! let sheet = solver.appraise(&book);
//! assert_eq!(sheet.get("Ist Rune").map(|v| v.as_f64()), Some(3.0));
//! ```

pub mod aggregation;
pub mod cli;
pub mod config;
pub mod display;
pub mod logging;
pub mod models;
pub mod propagation;
pub mod seeder;
pub mod solver;
pub mod source;
pub mod trimming;

pub use aggregation::{nearest_rank, Aggregator};
pub use config::{AppraiserConfig, LoggingConfig, SolverParameters, SourceConfig};
pub use display::{DisplayValue, ValueSheet};
pub use models::{Bundle, OfferBook, TradeRecord, UnitObservation, ValueTable};
pub use propagation::PropagationEngine;
pub use seeder::AnchorSeeder;
pub use solver::AnchorLayeredSolver;
pub use source::{open_source, InMemorySource, JsonDirectorySource, JsonFileSource, SourceError, TradeSource};
pub use trimming::Trimmer;
