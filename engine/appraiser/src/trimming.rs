//! # Outlier Trimming
//!
//! Re-prices every trade once against a frozen value table and drops, per
//! item, the trades whose unit cost falls outside the central
//! `[alpha, 1 - alpha]` nearest-rank band.

use crate::aggregation::nearest_rank;
use crate::config::SolverParameters;
use crate::models::{OfferBook, TradeRecord, ValueTable};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

/// Unit cost of one trade, tagged with its position in the item's trade list
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricedTrade {
    pub subject_count: i64,
    pub unit_cost: f64,
    pub index: usize,
}

/// Central-band outlier filter
#[derive(Debug, Clone)]
pub struct Trimmer {
    alpha: f64,
    min_trades: usize,
}

impl Trimmer {
    pub fn new(alpha: f64, min_trades: usize) -> Self {
        Self { alpha, min_trades }
    }

    pub fn from_parameters(params: &SolverParameters) -> Self {
        Self::new(params.trim_alpha, params.trim_min_trades)
    }

    pub fn enabled(&self) -> bool {
        self.alpha > 0.0 && self.alpha < 0.5
    }

    /// Price every trade of every item against `values`, treated as a frozen table.
    ///
    /// This is a single evaluation, not a fixed point: the known set is exactly
    /// the items with a positive finite value in `values`.
    pub fn price_trades(&self, book: &OfferBook, values: &ValueTable) -> BTreeMap<String, Vec<PricedTrade>> {
        book.iter()
            .map(|(item, trades)| (item.clone(), price_item_trades(trades, values)))
            .collect()
    }

    /// Build a filtered copy of `book`, keeping each item's central band of trades.
    ///
    /// Items with fewer than `min_trades` priced trades, or all items when
    /// trimming is disabled, keep their full trade list. Otherwise trades that
    /// could not be priced are dropped along with the outliers.
    pub fn trim(&self, book: &OfferBook, priced: &BTreeMap<String, Vec<PricedTrade>>) -> OfferBook {
        let mut dropped = 0usize;
        let mut trimmed_items = 0usize;

        let trimmed: OfferBook = book
            .iter()
            .map(|(item, trades)| {
                let units = priced.get(item).map(Vec::as_slice).unwrap_or(&[]);
                let kept = match self.keep_indices(units) {
                    Some(keep) => {
                        let kept: Vec<TradeRecord> = trades
                            .iter()
                            .enumerate()
                            .filter(|(idx, _)| keep.contains(idx))
                            .map(|(_, record)| record.clone())
                            .collect();
                        trimmed_items += 1;
                        dropped += trades.len() - kept.len();
                        debug!("Trimmed {}: kept {} of {} trades", item, kept.len(), trades.len());
                        kept
                    }
                    None => trades.clone(),
                };
                (item.clone(), kept)
            })
            .collect();

        info!("Trimming dropped {} trades across {} items", dropped, trimmed_items);
        trimmed
    }

    /// Convenience for `trim(book, &price_trades(book, values))`
    pub fn trim_against(&self, book: &OfferBook, values: &ValueTable) -> OfferBook {
        let priced = self.price_trades(book, values);
        self.trim(book, &priced)
    }

    fn keep_indices(&self, units: &[PricedTrade]) -> Option<HashSet<usize>> {
        if !self.enabled() || units.len() < self.min_trades {
            return None;
        }

        let costs: Vec<f64> = units.iter().map(|trade| trade.unit_cost).collect();
        let lo = nearest_rank(&costs, self.alpha)?;
        let hi = nearest_rank(&costs, 1.0 - self.alpha)?;

        Some(
            units
                .iter()
                .filter(|trade| lo <= trade.unit_cost && trade.unit_cost <= hi)
                .map(|trade| trade.index)
                .collect(),
        )
    }
}

impl Default for Trimmer {
    fn default() -> Self {
        Self::from_parameters(&SolverParameters::default())
    }
}

fn price_item_trades(trades: &[TradeRecord], values: &ValueTable) -> Vec<PricedTrade> {
    trades
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            record.observe(values).map(|obs| PricedTrade {
                subject_count: obs.subject_count,
                unit_cost: obs.unit_cost,
                index,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANCHOR: &str = "Perfect Amethyst";

    fn anchor_only() -> ValueTable {
        ValueTable::from_values([(ANCHOR, 1.0)])
    }

    /// One trade per unit cost, each paid in anchors
    fn item_with_unit_costs(costs: &[f64]) -> OfferBook {
        let trades = costs.iter().map(|cost| TradeRecord::new(1, vec![vec![(*cost, ANCHOR)]])).collect();
        let mut book = OfferBook::new();
        book.insert("Jah Rune", trades);
        book
    }

    fn kept_costs(book: &OfferBook) -> Vec<f64> {
        book.trades("Jah Rune")
            .iter()
            .map(|record| record.offers[0].terms()[0].multiplier)
            .collect()
    }

    #[test]
    fn test_extreme_trades_are_dropped() {
        let mut costs: Vec<f64> = (1..=10).map(f64::from).collect();
        costs.push(100.0);
        costs.push(1000.0);
        let book = item_with_unit_costs(&costs);

        let trimmed = Trimmer::new(0.10, 10).trim_against(&book, &anchor_only());

        // bounds sit at sorted indices round(1.1) = 1 and round(9.9) = 10
        assert_eq!(kept_costs(&trimmed), vec![2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 100.0]);
        assert!(!kept_costs(&trimmed).contains(&1000.0));
    }

    #[test]
    fn test_small_items_are_left_alone() {
        let costs: Vec<f64> = (1..=9).map(f64::from).collect();
        let book = item_with_unit_costs(&costs);

        let trimmed = Trimmer::new(0.10, 10).trim_against(&book, &anchor_only());
        assert_eq!(trimmed, book);
    }

    #[test]
    fn test_disabled_alpha_keeps_everything() {
        let costs: Vec<f64> = (1..=20).map(f64::from).collect();
        let book = item_with_unit_costs(&costs);

        for alpha in [0.0, 0.5, 0.7, -0.1] {
            let trimmed = Trimmer::new(alpha, 0).trim_against(&book, &anchor_only());
            assert_eq!(trimmed, book, "alpha = {alpha}");
        }
    }

    #[test]
    fn test_trimming_window_from_parameters() {
        for (alpha, enabled) in [(0.0, false), (0.1, true), (0.49, true), (0.5, false), (-0.1, false)] {
            let params = SolverParameters { trim_alpha: alpha, ..Default::default() };
            assert_eq!(Trimmer::from_parameters(&params).enabled(), enabled, "alpha = {alpha}");
        }
    }

    #[test]
    fn test_unpriceable_trades_dropped_only_when_trimming() {
        let mut trades: Vec<TradeRecord> =
            (1..=10).map(|cost| TradeRecord::new(1, vec![vec![(f64::from(cost), ANCHOR)]])).collect();
        trades.push(TradeRecord::new(1, vec![vec![(1.0, "Zod Rune")]]));
        let mut book = OfferBook::new();
        book.insert("Jah Rune", trades);

        let trimmed = Trimmer::new(0.10, 10).trim_against(&book, &anchor_only());
        assert!(trimmed.trades("Jah Rune").iter().all(|record| record.offers[0].terms()[0].item == ANCHOR));

        let untouched = Trimmer::new(0.10, 11).trim_against(&book, &anchor_only());
        assert_eq!(untouched.trades("Jah Rune").len(), 11);
    }

    #[test]
    fn test_pricing_uses_frozen_table() {
        let mut book = OfferBook::new();
        book.insert("Ist Rune", vec![TradeRecord::new(1, vec![vec![(2.0, ANCHOR)]])]);
        book.insert("Gul Rune", vec![TradeRecord::new(1, vec![vec![(1.0, "Ist Rune")]])]);

        let priced = Trimmer::default().price_trades(&book, &anchor_only());
        assert_eq!(priced["Ist Rune"], vec![PricedTrade { subject_count: 1, unit_cost: 2.0, index: 0 }]);
        // Ist is not in the frozen table, so Gul cannot be priced
        assert!(priced["Gul Rune"].is_empty());
    }

    #[test]
    fn test_zero_values_are_not_known() {
        let values = ValueTable::from_values([(ANCHOR, 1.0), ("Ist Rune", 0.0)]);
        let mut book = OfferBook::new();
        book.insert("Gul Rune", vec![TradeRecord::new(1, vec![vec![(1.0, "Ist Rune")]])]);

        let priced = Trimmer::default().price_trades(&book, &values);
        assert!(priced["Gul Rune"].is_empty());
    }

    #[test]
    fn test_input_book_is_not_mutated() {
        let costs: Vec<f64> = (1..=12).map(f64::from).collect();
        let book = item_with_unit_costs(&costs);
        let before = book.clone();

        let trimmed = Trimmer::new(0.2, 10).trim_against(&book, &anchor_only());
        assert_eq!(book, before);
        assert!(trimmed.trades("Jah Rune").len() < book.trades("Jah Rune").len());
    }
}
