use crate::config::SolverParameters;
use crate::display::{freeze_displayed, ValueSheet};
use crate::models::{OfferBook, ValueTable};
use crate::propagation::PropagationEngine;
use crate::seeder::AnchorSeeder;
use crate::trimming::Trimmer;
use tracing::info;

/// Anchor-seeded, layered, trimmed valuation solver.
///
/// Holds only parameters; every call builds its own tables.
#[derive(Debug, Clone)]
pub struct AnchorLayeredSolver {
    params: SolverParameters,
    seeder: AnchorSeeder,
    engine: PropagationEngine,
    trimmer: Trimmer,
}

impl AnchorLayeredSolver {
    pub fn new(params: SolverParameters) -> Self {
        Self {
            seeder: AnchorSeeder::new(params.anchor_item.clone()),
            engine: PropagationEngine::from_parameters(&params),
            trimmer: Trimmer::from_parameters(&params),
            params,
        }
    }

    pub fn parameters(&self) -> &SolverParameters {
        &self.params
    }

    pub fn anchor(&self) -> &str {
        &self.params.anchor_item
    }

    /// Seed from the anchor and propagate to a fixed point, returning raw values
    pub fn value_table(&self, book: &OfferBook) -> ValueTable {
        let seeded = self.seeder.seed(book);
        self.engine.propagate(book, seeded)
    }

    /// One untrimmed pass: seed, propagate, publish
    pub fn appraise(&self, book: &OfferBook) -> ValueSheet {
        let table = self.value_table(book);
        self.publish(book, &table)
    }

    /// Appraise, then `passes - 1` times trim against the latest table and re-appraise.
    ///
    /// Each trim prices trades against the previous pass's full table at
    /// published precision, seeded items that are not book keys included.
    /// `passes` below 1 is treated as 1, which is exactly `appraise`.
    pub fn solve_with_trimming(&self, book: &OfferBook, passes: u32) -> ValueSheet {
        let passes = passes.max(1);
        let mut table = self.value_table(book);
        let mut sheet = self.publish(book, &table);
        let mut filtered = book.clone();

        for pass in 2..=passes {
            let frozen = freeze_displayed(&table, self.anchor());
            filtered = self.trimmer.trim_against(&filtered, &frozen);
            table = self.value_table(&filtered);
            sheet = self.publish(&filtered, &table);
            info!("Pass {}/{}: {} trades remain after trimming", pass, passes, filtered.trade_count());
        }

        sheet
    }

    fn publish(&self, book: &OfferBook, table: &ValueTable) -> ValueSheet {
        let sheet = ValueSheet::build(book.item_names(), table, self.anchor());
        info!(
            "Appraised {} items ({} unpriced) from {} trades",
            sheet.len(),
            sheet.unpriced_count(),
            book.trade_count()
        );
        sheet
    }

    /// `solve_with_trimming` with the configured number of passes
    pub fn solve(&self, book: &OfferBook) -> ValueSheet {
        self.solve_with_trimming(book, self.params.passes())
    }
}

impl Default for AnchorLayeredSolver {
    fn default() -> Self {
        Self::new(SolverParameters::default())
    }
}
