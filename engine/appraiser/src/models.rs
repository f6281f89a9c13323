use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// One `(multiplier, item)` pair of a bundle. On the wire this is `[multiplier, "item"]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, String)", into = "(f64, String)")]
pub struct BundleTerm {
    /// How many units of `item` were given
    pub multiplier: f64,

    /// Name of the item given
    pub item: String,
}

impl From<(f64, String)> for BundleTerm {
    fn from((multiplier, item): (f64, String)) -> Self {
        Self { multiplier, item }
    }
}

impl From<BundleTerm> for (f64, String) {
    fn from(term: BundleTerm) -> Self {
        (term.multiplier, term.item)
    }
}

/// One alternative set of items offered in exchange for a subject item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bundle {
    terms: Vec<BundleTerm>,
}

impl Bundle {
    /// Create a bundle from its terms
    pub fn new(terms: Vec<BundleTerm>) -> Self {
        Self { terms }
    }

    /// All terms in offer order
    pub fn terms(&self) -> &[BundleTerm] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// The bundle's only term, when it has exactly one with a positive multiplier
    pub fn single_term(&self) -> Option<&BundleTerm> {
        match self.terms.as_slice() {
            [term] if term.multiplier.is_finite() && term.multiplier > 0.0 => Some(term),
            _ => None,
        }
    }

    /// Total value of the bundle, or `None` when it is infeasible against `table`.
    ///
    /// Every referenced item must be in the known set with a positive finite
    /// value, and every multiplier must be positive.
    pub fn cost(&self, table: &ValueTable) -> Option<f64> {
        let mut total = 0.0;
        for term in &self.terms {
            if !term.multiplier.is_finite() || term.multiplier <= 0.0 {
                return None;
            }
            let value = table.known_value(&term.item)?;
            total += term.multiplier * value;
        }
        Some(total)
    }
}

impl<S: Into<String>> From<Vec<(f64, S)>> for Bundle {
    fn from(terms: Vec<(f64, S)>) -> Self {
        Self::new(
            terms
                .into_iter()
                .map(|(multiplier, item)| BundleTerm { multiplier, item: item.into() })
                .collect(),
        )
    }
}

/// One observed trade: `subject_count` units of the owning item against any one of `offers`.
///
/// On the wire this is `[subject_count, [bundle, ...]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(i64, Vec<Bundle>)", into = "(i64, Vec<Bundle>)")]
pub struct TradeRecord {
    /// Units of the subject item given; records with a non-positive count are ignored
    pub subject_count: i64,

    /// OR-alternatives, any one of which settles the trade
    pub offers: Vec<Bundle>,
}

impl From<(i64, Vec<Bundle>)> for TradeRecord {
    fn from((subject_count, offers): (i64, Vec<Bundle>)) -> Self {
        Self { subject_count, offers }
    }
}

impl From<TradeRecord> for (i64, Vec<Bundle>) {
    fn from(record: TradeRecord) -> Self {
        (record.subject_count, record.offers)
    }
}

impl TradeRecord {
    /// Create a trade record from anything convertible into bundles
    pub fn new<B, I>(subject_count: i64, offers: I) -> Self
    where
        B: Into<Bundle>,
        I: IntoIterator<Item = B>,
    {
        Self { subject_count, offers: offers.into_iter().map(Into::into).collect() }
    }

    pub fn is_valid(&self) -> bool {
        self.subject_count > 0
    }

    /// Cheapest unit cost across the feasible alternatives, if any alternative is feasible
    pub fn best_unit_cost(&self, table: &ValueTable) -> Option<f64> {
        if !self.is_valid() {
            return None;
        }
        let count = self.subject_count as f64;
        self.offers
            .iter()
            .filter_map(|bundle| bundle.cost(table))
            .map(|cost| cost / count)
            .filter(|unit| unit.is_finite())
            .min_by(f64::total_cmp)
    }

    /// Unit observation for this record against `table`, if feasible
    pub fn observe(&self, table: &ValueTable) -> Option<UnitObservation> {
        self.best_unit_cost(table)
            .map(|unit_cost| UnitObservation { subject_count: self.subject_count, unit_cost })
    }
}

/// `(subject_count, unit_cost)` for one feasible trade record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitObservation {
    pub subject_count: i64,
    pub unit_cost: f64,
}

impl UnitObservation {
    pub fn new(subject_count: i64, unit_cost: f64) -> Self {
        Self { subject_count, unit_cost }
    }
}

/// The immutable input corpus: item name to its observed trades.
///
/// Backed by a `BTreeMap` so every pass visits items in the same order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OfferBook {
    items: BTreeMap<String, Vec<TradeRecord>>,
}

impl OfferBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the trades of one item
    pub fn insert(&mut self, item: impl Into<String>, trades: Vec<TradeRecord>) {
        self.items.insert(item.into(), trades);
    }

    /// Trades of `item`; empty when the item is unknown
    pub fn trades(&self, item: &str) -> &[TradeRecord] {
        self.items.get(item).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.contains_key(item)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<TradeRecord>)> {
        self.items.iter()
    }

    pub fn item_names(&self) -> impl Iterator<Item = &String> {
        self.items.keys()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of trade records across all items
    pub fn trade_count(&self) -> usize {
        self.items.values().map(Vec::len).sum()
    }
}

impl FromIterator<(String, Vec<TradeRecord>)> for OfferBook {
    fn from_iter<T: IntoIterator<Item = (String, Vec<TradeRecord>)>>(iter: T) -> Self {
        Self { items: iter.into_iter().collect() }
    }
}

/// Estimated unit values plus the set of items whose value is resolved.
///
/// Only positive finite values are ever stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueTable {
    values: HashMap<String, f64>,
    known: HashSet<String>,
}

impl ValueTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding only the anchor at value 1
    pub fn anchored(anchor: &str) -> Self {
        let mut table = Self::new();
        table.resolve(anchor, 1.0);
        table
    }

    /// A frozen table: every positive finite entry counts as known
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (item, value) in values {
            table.resolve(item, value);
        }
        table
    }

    /// Set `item` to `value` and mark it known. Non-positive or non-finite values are ignored.
    pub fn resolve(&mut self, item: impl Into<String>, value: f64) -> bool {
        if !value.is_finite() || value <= 0.0 {
            return false;
        }
        let item = item.into();
        self.known.insert(item.clone());
        self.values.insert(item, value);
        true
    }

    /// Current estimate for `item`, known or not
    pub fn value(&self, item: &str) -> Option<f64> {
        self.values.get(item).copied()
    }

    /// Value of `item` if it is known and positive finite
    pub fn known_value(&self, item: &str) -> Option<f64> {
        if !self.known.contains(item) {
            return None;
        }
        self.value(item).filter(|value| value.is_finite() && *value > 0.0)
    }

    pub fn is_known(&self, item: &str) -> bool {
        self.known.contains(item)
    }

    pub fn known_count(&self) -> usize {
        self.known.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
