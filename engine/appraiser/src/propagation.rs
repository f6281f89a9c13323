//! # Layered Propagation
//!
//! Fixed-point relaxation over the trade graph. Items are nodes and every
//! bundle is a hyperedge from the items it references to the subject item.
//! Each round prices the unknown items whose trades have at least one bundle
//! made entirely of known items; a newly priced item joins the known set and
//! may unblock others in the same or the next round.
//!
//! Two rules keep the relaxation stable: a trade is priced by its cheapest
//! feasible bundle, and an estimate is only replaced by one that is strictly
//! lower (by more than [`IMPROVEMENT_EPSILON`]).

use crate::aggregation::Aggregator;
use crate::config::SolverParameters;
use crate::models::{OfferBook, TradeRecord, UnitObservation, ValueTable};
use tracing::debug;

/// Minimum decrease for a new estimate to replace the current one
pub const IMPROVEMENT_EPSILON: f64 = 1e-12;

/// Round-based fixed-point pricing of unknown items
#[derive(Debug, Clone)]
pub struct PropagationEngine {
    aggregator: Aggregator,
    max_rounds: u32,
}

impl PropagationEngine {
    pub fn new(aggregator: Aggregator, max_rounds: u32) -> Self {
        Self { aggregator, max_rounds: max_rounds.max(1) }
    }

    pub fn from_parameters(params: &SolverParameters) -> Self {
        Self::new(Aggregator::from_parameters(params), params.max_rounds())
    }

    /// Extend `table` to every item inferable from `book`.
    ///
    /// Stops after a round with no change or after `max_rounds`. Hitting the
    /// round cap is not an error; the table is returned as it stands.
    pub fn propagate(&self, book: &OfferBook, mut table: ValueTable) -> ValueTable {
        let mut rounds = 0;
        let mut changed = true;

        while changed && rounds < self.max_rounds {
            changed = false;
            rounds += 1;
            let mut priced = 0usize;

            for (item, trades) in book.iter() {
                if table.is_known(item) {
                    continue;
                }

                let observations = collect_observations(trades, &table);
                let Some(estimate) = self.aggregator.aggregate(&observations) else {
                    continue;
                };

                if improves(table.value(item), estimate) && table.resolve(item.clone(), estimate) {
                    priced += 1;
                    changed = true;
                }
            }

            debug!("Propagation round {}: priced {} items", rounds, priced);
        }

        if changed {
            debug!("Propagation stopped at the round cap ({}) before reaching a fixed point", self.max_rounds);
        }

        table
    }
}

/// Feasible unit observations of `trades` against the current table
pub fn collect_observations(trades: &[TradeRecord], table: &ValueTable) -> Vec<UnitObservation> {
    trades.iter().filter_map(|record| record.observe(table)).collect()
}

fn improves(current: Option<f64>, estimate: f64) -> bool {
    match current {
        None => true,
        Some(current) => estimate < current - IMPROVEMENT_EPSILON,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeder::AnchorSeeder;

    const ANCHOR: &str = "Perfect Amethyst";

    fn engine() -> PropagationEngine {
        PropagationEngine::from_parameters(&SolverParameters::default())
    }

    fn chain_book() -> OfferBook {
        let mut book = OfferBook::new();
        book.insert(ANCHOR, vec![TradeRecord::new(2, vec![vec![(1.0, "Ist Rune")]])]);
        // Ist = 2; one Gul for 3 Ist; one Vex for 2 Gul + 1 Ist
        book.insert("Ist Rune", vec![]);
        book.insert("Gul Rune", vec![TradeRecord::new(1, vec![vec![(3.0, "Ist Rune")]])]);
        book.insert(
            "Vex Rune",
            vec![TradeRecord::new(1, vec![vec![(2.0, "Gul Rune"), (1.0, "Ist Rune")]])],
        );
        book
    }

    #[test]
    fn test_values_propagate_through_chains() {
        let book = chain_book();
        let table = engine().propagate(&book, AnchorSeeder::new(ANCHOR).seed(&book));

        assert_eq!(table.known_value("Ist Rune"), Some(2.0));
        assert_eq!(table.known_value("Gul Rune"), Some(6.0));
        assert_eq!(table.known_value("Vex Rune"), Some(14.0));
    }

    #[test]
    fn test_unit_cost_divides_by_subject_count() {
        let mut book = OfferBook::new();
        book.insert("Tal Rune", vec![TradeRecord::new(4, vec![vec![(2.0, ANCHOR)]])]);

        let table = engine().propagate(&book, ValueTable::anchored(ANCHOR));
        assert_eq!(table.known_value("Tal Rune"), Some(0.5));
    }

    #[test]
    fn test_unresolvable_items_stay_unknown() {
        let mut book = chain_book();
        book.insert("Zod Rune", vec![TradeRecord::new(1, vec![vec![(1.0, "Jah Rune")]])]);

        let table = engine().propagate(&book, AnchorSeeder::new(ANCHOR).seed(&book));
        assert!(!table.is_known("Zod Rune"));
        assert!(!table.is_known("Jah Rune"));
    }

    #[test]
    fn test_known_items_are_not_revisited() {
        let mut book = chain_book();
        // a much cheaper Ist trade must not override the seeded value
        book.insert("Ist Rune", vec![TradeRecord::new(1, vec![vec![(0.1, ANCHOR)]])]);

        let table = engine().propagate(&book, AnchorSeeder::new(ANCHOR).seed(&book));
        assert_eq!(table.known_value("Ist Rune"), Some(2.0));
    }

    #[test]
    fn test_round_cap_returns_partial_table() {
        let mut book = OfferBook::new();
        // items are visited in name order, so each round can only price the tail of the chain
        book.insert("A", vec![TradeRecord::new(1, vec![vec![(1.0, "B")]])]);
        book.insert("B", vec![TradeRecord::new(1, vec![vec![(1.0, "C")]])]);
        book.insert("C", vec![TradeRecord::new(1, vec![vec![(1.0, ANCHOR)]])]);

        let capped = PropagationEngine::new(Aggregator::default(), 2);
        let table = capped.propagate(&book, ValueTable::anchored(ANCHOR));
        assert!(table.is_known("C"));
        assert!(table.is_known("B"));
        assert!(!table.is_known("A"));

        let table = engine().propagate(&book, ValueTable::anchored(ANCHOR));
        assert_eq!(table.known_value("A"), Some(1.0));
    }

    #[test]
    fn test_improvement_requires_strict_decrease() {
        assert!(improves(None, 5.0));
        assert!(improves(Some(5.0), 4.0));
        assert!(!improves(Some(5.0), 5.0));
        assert!(!improves(Some(5.0), 5.0 - 1e-13));
        assert!(!improves(Some(5.0), 6.0));
    }

    #[test]
    fn test_converged_table_is_a_fixed_point() {
        let book = chain_book();
        let engine = engine();
        let table = engine.propagate(&book, AnchorSeeder::new(ANCHOR).seed(&book));
        let again = engine.propagate(&book, table.clone());
        assert_eq!(table, again);
    }
}
