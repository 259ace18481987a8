use serde::Serialize;

use crate::domain::item::Item;
use crate::domain::itemset::Itemset;
use crate::mining::{AssociationRule, RuleSet};

/// How the winning rule's antecedent related to the query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Antecedent equals the whole query set.
    ExactAntecedent,
    /// Antecedent is the first query item alone.
    FirstItemFallback,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Recommendation {
    pub item: Item,
    pub match_kind: MatchKind,
    pub antecedent: Itemset,
    pub confidence: f64,
    pub lift: f64,
}

impl Recommendation {
    fn from_rule(rule: &AssociationRule, match_kind: MatchKind) -> Option<Self> {
        // Multi-item consequents yield their canonically first item.
        let item = rule.consequent.first()?.clone();
        Some(Self {
            item,
            match_kind,
            antecedent: rule.antecedent.clone(),
            confidence: rule.confidence,
            lift: rule.lift,
        })
    }
}

/// Resolves a query to the single best recommended item.
///
/// 1. The query as a set; if some rule has exactly that antecedent, the
///    highest-confidence one wins.
/// 2. Otherwise the first query item alone, same selection.
/// 3. Otherwise `None`.
///
/// Unknown items and empty queries simply find no rule. The rule set is never
/// modified.
pub fn resolve(query: &[Item], rules: &RuleSet) -> Option<Recommendation> {
    let first = query.first()?;

    let query_set: Itemset = query.iter().cloned().collect();
    if let Some(rule) = rules.strongest_for(&query_set) {
        return Recommendation::from_rule(rule, MatchKind::ExactAntecedent);
    }

    let singleton = Itemset::singleton(first.clone());
    if singleton == query_set {
        return None;
    }
    rules
        .strongest_for(&singleton)
        .and_then(|rule| Recommendation::from_rule(rule, MatchKind::FirstItemFallback))
}
