use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use super::apriori::FrequentItemsets;
use super::escalation::PassResult;
use crate::domain::itemset::Itemset;

/// Directional rule `antecedent => consequent`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssociationRule {
    pub antecedent: Itemset,
    pub consequent: Itemset,
    /// Support of `antecedent ∪ consequent`.
    pub support: f64,
    /// `support(antecedent ∪ consequent) / support(antecedent)`.
    pub confidence: f64,
    /// `confidence / support(consequent)`. Diagnostic only, never filters.
    pub lift: f64,
}

/// Rules that survived one confidence threshold, indexed by antecedent.
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    threshold: f64,
    rules: Vec<AssociationRule>,
    by_antecedent: HashMap<Itemset, Vec<usize>>,
}

impl RuleSet {
    /// Splits every frequent itemset of two or more items into all
    /// antecedent/consequent pairs and keeps those with
    /// `confidence >= min_confidence`.
    ///
    /// Rule order is fixed by the collection's order and the subset
    /// enumeration, which makes tie-breaking downstream deterministic.
    pub fn generate(frequent: &FrequentItemsets, min_confidence: f64) -> Self {
        let mut rule_set = Self { threshold: min_confidence, ..Self::default() };
        if frequent.is_empty() {
            return rule_set;
        }
        let basket_count = frequent.basket_count() as f64;

        for entry in frequent.iter().filter(|entry| entry.itemset.len() >= 2) {
            let size = entry.itemset.len();
            if size >= u64::BITS as usize {
                warn!(
                    event_name = "mining.rules.itemset_too_large",
                    size, "skipping rule enumeration for oversized itemset"
                );
                continue;
            }

            for mask in 1..(1u64 << size) - 1 {
                let antecedent = entry.itemset.select(mask);
                let Some(antecedent_count) = frequent.count_of(&antecedent) else {
                    debug!(
                        event_name = "mining.rules.missing_subset",
                        antecedent = %antecedent,
                        "antecedent not in frequent collection"
                    );
                    continue;
                };
                let confidence = entry.count as f64 / antecedent_count as f64;
                if confidence < min_confidence {
                    continue;
                }

                let consequent = entry.itemset.difference(&antecedent);
                let consequent_support = frequent
                    .count_of(&consequent)
                    .map(|count| count as f64 / basket_count)
                    .unwrap_or(0.0);
                let lift = if consequent_support > 0.0 {
                    confidence / consequent_support
                } else {
                    0.0
                };

                rule_set.push(AssociationRule {
                    antecedent,
                    consequent,
                    support: entry.support,
                    confidence,
                    lift,
                });
            }
        }

        debug!(
            event_name = "mining.rules.generated",
            rules = rule_set.len(),
            min_confidence,
            "rule generation pass finished"
        );
        rule_set
    }

    pub(crate) fn push(&mut self, rule: AssociationRule) {
        self.by_antecedent.entry(rule.antecedent.clone()).or_default().push(self.rules.len());
        self.rules.push(rule);
    }

    /// Confidence threshold the rules were generated at.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssociationRule> {
        self.rules.iter()
    }

    /// Rules whose antecedent equals `antecedent` exactly, in rule order.
    pub fn with_antecedent<'a>(
        &'a self,
        antecedent: &Itemset,
    ) -> impl Iterator<Item = &'a AssociationRule> + 'a {
        self.by_antecedent
            .get(antecedent)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .map(move |&index| &self.rules[index])
    }

    /// Highest-confidence rule for an exact antecedent. Ties keep the rule
    /// that comes first in rule order.
    pub fn strongest_for(&self, antecedent: &Itemset) -> Option<&AssociationRule> {
        self.with_antecedent(antecedent).fold(None, |best, rule| match best {
            Some(current) if rule.confidence <= current.confidence => Some(current),
            _ => Some(rule),
        })
    }

    /// The `limit` strongest rules by confidence, then lift, for display.
    pub fn top_by_confidence(&self, limit: usize) -> Vec<&AssociationRule> {
        let mut ranked: Vec<&AssociationRule> = self.rules.iter().collect();
        ranked.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.lift.partial_cmp(&a.lift).unwrap_or(Ordering::Equal))
        });
        ranked.truncate(limit);
        ranked
    }
}

impl PartialEq for RuleSet {
    /// Content equality, independent of rule order.
    fn eq(&self, other: &Self) -> bool {
        if self.rules.len() != other.rules.len() {
            return false;
        }
        self.rules.iter().all(|rule| {
            other.with_antecedent(&rule.antecedent).any(|candidate| candidate == rule)
        })
    }
}

impl PassResult for RuleSet {
    fn result_len(&self) -> usize {
        self.len()
    }
}
