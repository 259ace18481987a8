use std::collections::BTreeMap;

use crate::domain::basket::Basket;
use crate::domain::item::Item;
use crate::domain::itemset::Itemset;

/// Sparse basket membership: for every item, the ascending indices of the
/// baskets that contain it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EncodedTransactions {
    basket_count: usize,
    membership: BTreeMap<Item, Vec<usize>>,
}

/// Encodes baskets into item membership lists. Pure, never fails; zero
/// baskets yields an empty vocabulary.
pub fn encode(baskets: &[Basket]) -> EncodedTransactions {
    let mut membership: BTreeMap<Item, Vec<usize>> = BTreeMap::new();
    for (index, basket) in baskets.iter().enumerate() {
        for item in basket.items() {
            membership.entry(item.clone()).or_default().push(index);
        }
    }

    EncodedTransactions { basket_count: baskets.len(), membership }
}

impl EncodedTransactions {
    pub fn basket_count(&self) -> usize {
        self.basket_count
    }

    pub fn is_empty(&self) -> bool {
        self.basket_count == 0
    }

    /// Distinct items in ascending order.
    pub fn vocabulary(&self) -> impl Iterator<Item = &Item> {
        self.membership.keys()
    }

    pub fn vocabulary_len(&self) -> usize {
        self.membership.len()
    }

    pub fn contains(&self, item: &Item) -> bool {
        self.membership.contains_key(item)
    }

    /// Baskets containing `item`, ascending.
    pub fn baskets_with(&self, item: &Item) -> &[usize] {
        self.membership.get(item).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of baskets containing every item of `itemset`.
    ///
    /// Intersects the membership lists starting from the rarest item. The empty
    /// itemset is contained in every basket.
    pub fn support_count(&self, itemset: &Itemset) -> usize {
        let mut lists: Vec<&[usize]> =
            itemset.items().iter().map(|item| self.baskets_with(item)).collect();
        if lists.is_empty() {
            return self.basket_count;
        }
        lists.sort_by_key(|list| list.len());

        let (rarest, rest) = lists.split_at(1);
        rarest[0]
            .iter()
            .filter(|&&basket| rest.iter().all(|list| list.binary_search(&basket).is_ok()))
            .count()
    }

    /// Fraction of baskets containing `itemset`; `0.0` when there are no baskets.
    pub fn support(&self, itemset: &Itemset) -> f64 {
        self.ratio(self.support_count(itemset))
    }

    pub(crate) fn ratio(&self, count: usize) -> f64 {
        if self.basket_count == 0 {
            0.0
        } else {
            count as f64 / self.basket_count as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::encode;
    use crate::domain::basket::Basket;
    use crate::domain::item::Item;
    use crate::domain::itemset::Itemset;

    fn baskets(rows: &[&[&str]]) -> Vec<Basket> {
        rows.iter().filter_map(|row| Basket::from_labels(row.iter())).collect()
    }

    fn set(labels: &[&str]) -> Itemset {
        labels.iter().filter_map(|label| Item::parse(label)).collect()
    }

    #[test]
    fn vocabulary_and_membership_are_exact() {
        let encoded = encode(&baskets(&[&["a", "b"], &["b", "c"], &["a", "b", "c"]]));

        assert_eq!(encoded.basket_count(), 3);
        let vocabulary: Vec<&str> = encoded.vocabulary().map(|item| item.as_str()).collect();
        assert_eq!(vocabulary, vec!["a", "b", "c"]);
        assert_eq!(encoded.baskets_with(&Item::parse("b").expect("item")), &[0, 1, 2]);
    }

    #[test]
    fn support_count_intersects_membership() {
        let encoded = encode(&baskets(&[&["a", "b"], &["b", "c"], &["a", "b", "c"], &["a"]]));

        assert_eq!(encoded.support_count(&set(&["a", "b"])), 2);
        assert_eq!(encoded.support_count(&set(&["a", "b", "c"])), 1);
        assert_eq!(encoded.support_count(&set(&["a", "z"])), 0);
        assert!((encoded.support(&set(&["a"])) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn zero_baskets_encode_to_empty_vocabulary() {
        let encoded = encode(&[]);
        assert!(encoded.is_empty());
        assert_eq!(encoded.vocabulary_len(), 0);
        assert_eq!(encoded.support(&set(&["a"])), 0.0);
    }
}
