use std::fmt;

use serde::Serialize;

use super::item::Item;

/// A canonical itemset: items sorted ascending with no duplicates.
///
/// Equality and hashing depend only on content, never on the order in which
/// the items were supplied, so an itemset can key an antecedent index directly.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Itemset {
    items: Vec<Item>,
}

impl Itemset {
    pub fn new(items: impl IntoIterator<Item = Item>) -> Self {
        let mut items: Vec<Item> = items.into_iter().collect();
        items.sort();
        items.dedup();
        Self { items }
    }

    pub fn singleton(item: Item) -> Self {
        Self { items: vec![item] }
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

    /// Smallest item in canonical order.
    pub fn first(&self) -> Option<&Item> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&Item> {
        self.items.last()
    }

    pub fn contains(&self, item: &Item) -> bool {
        self.items.binary_search(item).is_ok()
    }

    pub fn is_subset_of(&self, other: &Itemset) -> bool {
        self.items.iter().all(|item| other.contains(item))
    }

    /// Copy of this itemset with the item at `index` removed.
    pub fn without(&self, index: usize) -> Itemset {
        let mut items = self.items.clone();
        if index < items.len() {
            items.remove(index);
        }
        Self { items }
    }

    /// Copy of this itemset extended by `item`. Keeps the canonical order.
    pub fn with(&self, item: Item) -> Itemset {
        let mut items = self.items.clone();
        if let Err(position) = items.binary_search(&item) {
            items.insert(position, item);
        }
        Self { items }
    }

    /// Items of `self` that are not in `other`.
    pub fn difference(&self, other: &Itemset) -> Itemset {
        Self { items: self.items.iter().filter(|item| !other.contains(item)).cloned().collect() }
    }

    /// Items selected by the set bits of `mask`, bit `i` picking the `i`-th item.
    pub(crate) fn select(&self, mask: u64) -> Itemset {
        Self {
            items: self
                .items
                .iter()
                .enumerate()
                .filter(|(index, _)| mask & (1u64 << index) != 0)
                .map(|(_, item)| item.clone())
                .collect(),
        }
    }
}

impl FromIterator<Item> for Itemset {
    fn from_iter<T: IntoIterator<Item = Item>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl fmt::Display for Itemset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (index, item) in self.items.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            f.write_str(item.as_str())?;
        }
        f.write_str("}")
    }
}
