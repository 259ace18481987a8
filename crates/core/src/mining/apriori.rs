use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use super::encoder::EncodedTransactions;
use super::escalation::PassResult;
use crate::domain::itemset::Itemset;

/// An itemset that met the support threshold, with its exact basket count.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrequentItemset {
    pub itemset: Itemset,
    pub count: usize,
    pub support: f64,
}

/// Every itemset found frequent in one mining pass.
///
/// Entries are ordered by size, then canonically within a size. Equality is by
/// content only, so two passes over the same data compare equal regardless of
/// how the entries were discovered.
#[derive(Clone, Debug, Default)]
pub struct FrequentItemsets {
    threshold: f64,
    basket_count: usize,
    entries: Vec<FrequentItemset>,
    counts: HashMap<Itemset, usize>,
}

impl FrequentItemsets {
    /// Support threshold this collection was mined at.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn basket_count(&self) -> usize {
        self.basket_count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrequentItemset> {
        self.entries.iter()
    }

    /// Frequent itemsets with exactly `size` items.
    pub fn of_size(&self, size: usize) -> impl Iterator<Item = &FrequentItemset> {
        self.entries.iter().filter(move |entry| entry.itemset.len() == size)
    }

    /// Size of the largest frequent itemset, `0` when empty.
    pub fn max_size(&self) -> usize {
        self.entries.last().map(|entry| entry.itemset.len()).unwrap_or(0)
    }

    pub fn contains(&self, itemset: &Itemset) -> bool {
        self.counts.contains_key(itemset)
    }

    pub fn count_of(&self, itemset: &Itemset) -> Option<usize> {
        self.counts.get(itemset).copied()
    }

    pub fn support_of(&self, itemset: &Itemset) -> Option<f64> {
        self.count_of(itemset).map(|count| count as f64 / self.basket_count as f64)
    }

    fn extend(&mut self, level: Vec<FrequentItemset>) {
        for entry in level {
            self.counts.insert(entry.itemset.clone(), entry.count);
            self.entries.push(entry);
        }
    }
}

impl PartialEq for FrequentItemsets {
    fn eq(&self, other: &Self) -> bool {
        self.basket_count == other.basket_count && self.counts == other.counts
    }
}

impl PassResult for FrequentItemsets {
    fn result_len(&self) -> usize {
        self.len()
    }
}

/// Level-wise Apriori miner.
///
/// 1. Find frequent 1-itemsets.
/// 2. Join frequent (k-1)-itemsets sharing their first k-2 items into
///    k-candidates.
/// 3. Drop any candidate with an infrequent (k-1)-subset before counting.
/// 4. Count the survivors against basket membership and keep those meeting
///    the threshold.
/// 5. Repeat until a level comes back empty.
#[derive(Clone, Debug, Default)]
pub struct AprioriMiner {
    max_len: Option<usize>,
}

impl AprioriMiner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop after itemsets of `max_len` items. `None` mines every level.
    #[must_use]
    pub fn with_max_len(mut self, max_len: Option<usize>) -> Self {
        self.max_len = max_len;
        self
    }

    pub fn mine(&self, encoded: &EncodedTransactions, min_support: f64) -> FrequentItemsets {
        let mut frequent = FrequentItemsets {
            threshold: min_support,
            basket_count: encoded.basket_count(),
            ..FrequentItemsets::default()
        };
        if encoded.is_empty() {
            return frequent;
        }

        let mut level = frequent_singletons(encoded, min_support);
        let mut size = 1;
        while !level.is_empty() {
            debug!(
                event_name = "mining.apriori.level",
                size,
                frequent = level.len(),
                min_support,
                "apriori level counted"
            );

            if self.max_len.is_some_and(|max_len| size >= max_len) {
                frequent.extend(level);
                break;
            }

            let candidates = generate_candidates(&level);
            frequent.extend(level);
            level = count_candidates(encoded, candidates, min_support);
            size += 1;
        }

        frequent
    }
}

fn frequent_singletons(encoded: &EncodedTransactions, min_support: f64) -> Vec<FrequentItemset> {
    encoded
        .vocabulary()
        .filter_map(|item| {
            let count = encoded.baskets_with(item).len();
            let support = encoded.ratio(count);
            (support >= min_support).then(|| FrequentItemset {
                itemset: Itemset::singleton(item.clone()),
                count,
                support,
            })
        })
        .collect()
}

/// Joins canonically ordered (k-1)-itemsets that share their first k-2 items.
/// Candidates come out in canonical order as well.
fn generate_candidates(level: &[FrequentItemset]) -> Vec<Itemset> {
    let known: HashSet<&Itemset> = level.iter().map(|entry| &entry.itemset).collect();
    let mut candidates = Vec::new();

    for (index, left) in level.iter().enumerate() {
        let left_items = left.itemset.items();
        let prefix = &left_items[..left_items.len().saturating_sub(1)];

        for right in &level[index + 1..] {
            let right_items = right.itemset.items();
            if right_items[..right_items.len().saturating_sub(1)] != *prefix {
                break;
            }
            let Some(tail) = right.itemset.last() else {
                continue;
            };

            let candidate = left.itemset.with(tail.clone());
            if has_infrequent_subset(&candidate, &known) {
                continue;
            }
            candidates.push(candidate);
        }
    }

    candidates
}

fn has_infrequent_subset(candidate: &Itemset, known: &HashSet<&Itemset>) -> bool {
    (0..candidate.len()).any(|index| !known.contains(&candidate.without(index)))
}

fn count_candidates(
    encoded: &EncodedTransactions,
    candidates: Vec<Itemset>,
    min_support: f64,
) -> Vec<FrequentItemset> {
    candidates
        .into_iter()
        .filter_map(|itemset| {
            let count = encoded.support_count(&itemset);
            let support = encoded.ratio(count);
            (support >= min_support).then_some(FrequentItemset { itemset, count, support })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::AprioriMiner;
    use crate::domain::basket::Basket;
    use crate::domain::item::Item;
    use crate::domain::itemset::Itemset;
    use crate::mining::encoder::encode;
    use crate::mining::RATIO_EPSILON;

    fn baskets(rows: &[&[&str]]) -> Vec<Basket> {
        rows.iter().filter_map(|row| Basket::from_labels(row.iter())).collect()
    }

    fn set(labels: &[&str]) -> Itemset {
        labels.iter().filter_map(|label| Item::parse(label)).collect()
    }

    fn reference_baskets() -> Vec<Basket> {
        baskets(&[&["a", "b"], &["a", "b"], &["a", "c"], &["a", "b", "c"], &["b", "c"]])
    }

    #[test]
    fn reference_scenario_supports_are_exact() {
        let encoded = encode(&reference_baskets());
        let frequent = AprioriMiner::new().mine(&encoded, 0.4);

        let expected = [
            (set(&["a"]), 0.8),
            (set(&["b"]), 0.8),
            (set(&["c"]), 0.6),
            (set(&["a", "b"]), 0.6),
            (set(&["a", "c"]), 0.4),
            (set(&["b", "c"]), 0.4),
        ];
        for (itemset, support) in &expected {
            let found = frequent.support_of(itemset).expect("itemset should be frequent");
            assert!((found - support).abs() < RATIO_EPSILON, "{itemset} support {found}");
        }
        assert!(!frequent.contains(&set(&["a", "b", "c"])), "{{a, b, c}} has support 0.2");
        assert_eq!(frequent.len(), expected.len());
    }

    #[test]
    fn every_subset_of_a_frequent_itemset_is_frequent() {
        let encoded = encode(&baskets(&[
            &["milk", "bread", "butter"],
            &["milk", "bread"],
            &["milk", "butter"],
            &["bread", "butter"],
            &["milk", "bread", "butter", "eggs"],
            &["milk", "bread", "eggs"],
        ]));
        let frequent = AprioriMiner::new().mine(&encoded, 0.3);
        assert!(frequent.max_size() >= 3);

        for entry in frequent.iter() {
            let size = entry.itemset.len();
            for mask in 1..(1u64 << size) {
                let subset = entry.itemset.select(mask);
                assert!(frequent.contains(&subset), "{subset} missing under {}", entry.itemset);
            }
        }
    }

    #[test]
    fn infrequent_items_are_pruned() {
        let encoded = encode(&baskets(&[&["1", "2"], &["1", "2"], &["1", "2"], &["3", "4"]]));
        let frequent = AprioriMiner::new().mine(&encoded, 0.5);

        assert_eq!(frequent.len(), 3);
        for entry in frequent.iter() {
            assert!(entry.support >= 0.5);
            assert!(!entry.itemset.contains(&Item::parse("3").expect("item")));
        }
    }

    #[test]
    fn single_item_baskets_produce_only_singletons() {
        let encoded = encode(&baskets(&[&["1"], &["2"], &["3"], &["4"]]));
        let frequent = AprioriMiner::new().mine(&encoded, 0.25);

        assert_eq!(frequent.len(), 4);
        assert_eq!(frequent.max_size(), 1);
    }

    #[test]
    fn max_len_caps_the_levels() {
        let encoded = encode(&reference_baskets());
        let frequent = AprioriMiner::new().with_max_len(Some(1)).mine(&encoded, 0.4);

        assert_eq!(frequent.len(), 3);
        assert_eq!(frequent.of_size(2).count(), 0);
    }

    #[test]
    fn empty_input_yields_empty_collection() {
        let frequent = AprioriMiner::new().mine(&encode(&[]), 0.1);
        assert!(frequent.is_empty());
        assert_eq!(frequent.basket_count(), 0);
    }

    #[test]
    fn mining_is_deterministic() {
        let encoded = encode(&reference_baskets());
        let first = AprioriMiner::new().mine(&encoded, 0.2);
        let second = AprioriMiner::new().mine(&encode(&reference_baskets()), 0.2);
        assert_eq!(first, second);
        assert_eq!(
            first.iter().map(|entry| entry.itemset.clone()).collect::<Vec<_>>(),
            second.iter().map(|entry| entry.itemset.clone()).collect::<Vec<_>>()
        );
    }
}
