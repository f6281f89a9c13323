use crate::models::{OfferBook, ValueTable};
use tracing::info;

/// Bootstraps the known set from single-item offers made against the anchor
#[derive(Debug, Clone)]
pub struct AnchorSeeder {
    anchor: String,
}

impl AnchorSeeder {
    pub fn new(anchor: impl Into<String>) -> Self {
        Self { anchor: anchor.into() }
    }

    /// Build the initial table: the anchor at 1 plus every item seen alone against it.
    ///
    /// `count` anchors traded for `m` units of an item price one unit at `count / m`.
    /// Multi-item bundles carry no seed. When an item is seen several times the
    /// cheapest price wins.
    pub fn seed(&self, book: &OfferBook) -> ValueTable {
        let mut table = ValueTable::anchored(&self.anchor);

        for record in book.trades(&self.anchor) {
            if !record.is_valid() {
                continue;
            }
            let count = record.subject_count as f64;

            for bundle in &record.offers {
                let Some(term) = bundle.single_term() else {
                    continue;
                };
                if term.item == self.anchor {
                    continue;
                }

                let candidate = count / term.multiplier;
                let cheaper = table.value(&term.item).map_or(true, |current| candidate < current);
                if cheaper {
                    table.resolve(term.item.clone(), candidate);
                }
            }
        }

        info!("Seeded {} items from anchor '{}'", table.known_count() - 1, self.anchor);
        table
    }
}
