use serde::Serialize;

use super::item::Item;

/// One transaction: a non-empty set of distinct items, stored sorted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Basket {
    items: Vec<Item>,
}

impl Basket {
    /// Builds a basket from already-normalized items, collapsing duplicates.
    /// Returns `None` for an empty basket, which is never valid input to mining.
    pub fn new(items: impl IntoIterator<Item = Item>) -> Option<Self> {
        let mut items: Vec<Item> = items.into_iter().collect();
        items.sort();
        items.dedup();
        if items.is_empty() {
            None
        } else {
            Some(Self { items })
        }
    }

    /// Normalizes raw labels, dropping blanks, then builds the basket.
    pub fn from_labels<I, S>(labels: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(labels.into_iter().filter_map(|label| Item::parse(label.as_ref())))
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: &Item) -> bool {
        self.items.binary_search(item).is_ok()
    }
}
