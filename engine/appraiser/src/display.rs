//! # Value Sheet Formatting
//!
//! Turns a raw value table into the published sheet: one rounded value per
//! item, sorted from most to least valuable.

use crate::models::ValueTable;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// Values below this keep one decimal; values at or above it are whole numbers
pub const COARSE_THRESHOLD: f64 = 10.0;

/// A published value: one decimal below 10, an integer from 10 up
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DisplayValue {
    Fine(f64),
    Coarse(i64),
}

impl DisplayValue {
    /// Apply the display rounding rule to a raw value.
    ///
    /// Non-positive and non-finite values publish as `0`. Exact halves round
    /// away from zero (`10.5` publishes as `11`), matching the nearest-rank index.
    pub fn from_raw(value: f64) -> Self {
        if !value.is_finite() || value <= 0.0 {
            return DisplayValue::Coarse(0);
        }
        if value < COARSE_THRESHOLD {
            DisplayValue::Fine((value * 10.0).round() / 10.0)
        } else {
            DisplayValue::Coarse(value.round() as i64)
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            DisplayValue::Fine(value) => value,
            DisplayValue::Coarse(value) => value as f64,
        }
    }
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayValue::Fine(value) => write!(f, "{value:.1}"),
            DisplayValue::Coarse(value) => write!(f, "{value}"),
        }
    }
}

/// The published result of one appraisal, ordered by descending value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueSheet {
    entries: Vec<(String, DisplayValue)>,
}

impl ValueSheet {
    /// Build a sheet for `items` from `table`.
    ///
    /// Items missing from the table publish as `0`. The anchor is always
    /// present and always exactly `1`.
    pub fn build<'a, I>(items: I, table: &ValueTable, anchor: &str) -> Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut entries: Vec<(String, DisplayValue)> = items
            .into_iter()
            .filter(|item| item.as_str() != anchor)
            .map(|item| {
                let raw = table.known_value(item).unwrap_or(0.0);
                (item.clone(), DisplayValue::from_raw(raw))
            })
            .collect();
        entries.push((anchor.to_string(), DisplayValue::Coarse(1)));

        entries.sort_by(|(a_name, a_value), (b_name, b_value)| {
            b_value
                .as_f64()
                .partial_cmp(&a_value.as_f64())
                .unwrap_or(Ordering::Equal)
                .then_with(|| a_name.cmp(b_name))
        });

        Self { entries }
    }

    pub fn get(&self, item: &str) -> Option<DisplayValue> {
        self.entries.iter().find(|(name, _)| name == item).map(|(_, value)| *value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, DisplayValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn item_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of items that could not be priced
    pub fn unpriced_count(&self) -> usize {
        self.entries.iter().filter(|(_, value)| value.as_f64() <= 0.0).count()
    }

    /// Render as an aligned two-column text table
    pub fn to_table_string(&self) -> String {
        let width = self.entries.iter().map(|(name, _)| name.chars().count()).max().unwrap_or(0);
        let mut out = String::new();
        for (name, value) in &self.entries {
            out.push_str(&format!("{name:<width$}  {value}\n"));
        }
        out
    }
}

/// Freeze `table` at its published precision for the next trimming pass.
///
/// Every positive entry is kept, including items that were only seeded from
/// anchor offers and never appear as a key of the book. The anchor is `1`.
pub fn freeze_displayed(table: &ValueTable, anchor: &str) -> ValueTable {
    let mut frozen = ValueTable::from_values(
        table
            .iter()
            .filter(|(item, _)| item.as_str() != anchor)
            .filter_map(|(item, _)| table.known_value(item).map(|raw| (item.as_str(), raw)))
            .map(|(item, raw)| (item, DisplayValue::from_raw(raw).as_f64())),
    );
    frozen.resolve(anchor, 1.0);
    frozen
}

impl Serialize for ValueSheet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
