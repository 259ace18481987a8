use serde::Serialize;
use tracing::info;

use super::apriori::{AprioriMiner, FrequentItemsets};
use super::encoder::{encode, EncodedTransactions};
use super::escalation::{escalate, Attempt, Escalated, EscalationSchedule};
use super::rules::{AssociationRule, RuleSet};
use crate::domain::basket::Basket;
use crate::domain::item::Item;
use crate::recommend::{resolve, Recommendation};

/// Encoder, miner and rule generator wired to one escalation schedule.
#[derive(Clone, Debug, Default)]
pub struct MiningPipeline {
    schedule: EscalationSchedule,
    miner: AprioriMiner,
}

impl MiningPipeline {
    pub fn new(schedule: EscalationSchedule) -> Self {
        Self { schedule, miner: AprioriMiner::new() }
    }

    #[must_use]
    pub fn with_max_itemset_len(mut self, max_len: Option<usize>) -> Self {
        self.miner = self.miner.with_max_len(max_len);
        self
    }

    /// Runs the whole batch to completion. Never fails: sparse data degrades to
    /// empty collections, which resolve to "no recommendation".
    pub fn run(&self, baskets: &[Basket]) -> MiningOutcome {
        let encoded = encode(baskets);
        info!(
            event_name = "mining.run.started",
            baskets = encoded.basket_count(),
            vocabulary = encoded.vocabulary_len(),
            "mining frequent itemsets"
        );

        let frequent =
            escalate(self.schedule.support(), |threshold| self.miner.mine(&encoded, threshold));

        // Nothing to split; the confidence ladder is not walked.
        let rules = if frequent.value.is_empty() {
            Escalated::skipped(RuleSet::default())
        } else {
            escalate(self.schedule.confidence(), |threshold| {
                RuleSet::generate(&frequent.value, threshold)
            })
        };

        info!(
            event_name = "mining.run.finished",
            frequent_itemsets = frequent.value.len(),
            support_threshold = frequent.settled_at,
            rules = rules.value.len(),
            confidence_threshold = rules.settled_at,
            "mining run finished"
        );

        MiningOutcome { encoded, frequent, rules }
    }
}

/// Everything one mining run produced. Read-only once built; a reload builds a
/// new outcome and replaces the old one whole.
#[derive(Clone, Debug)]
pub struct MiningOutcome {
    encoded: EncodedTransactions,
    frequent: Escalated<FrequentItemsets>,
    rules: Escalated<RuleSet>,
}

impl MiningOutcome {
    pub fn transactions(&self) -> &EncodedTransactions {
        &self.encoded
    }

    pub fn frequent_itemsets(&self) -> &FrequentItemsets {
        &self.frequent.value
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules.value
    }

    pub fn support_escalation(&self) -> &Escalated<FrequentItemsets> {
        &self.frequent
    }

    pub fn confidence_escalation(&self) -> &Escalated<RuleSet> {
        &self.rules
    }

    pub fn knows(&self, item: &Item) -> bool {
        self.encoded.contains(item)
    }

    /// Splits query items into those seen in the data and those that were not,
    /// keeping the query order in both.
    pub fn partition_known(&self, items: &[Item]) -> (Vec<Item>, Vec<Item>) {
        items.iter().cloned().partition(|item| self.knows(item))
    }

    pub fn recommend(&self, query: &[Item]) -> Option<Recommendation> {
        resolve(query, self.rules())
    }

    pub fn summary(&self, top_rules: usize) -> MiningSummary {
        MiningSummary {
            baskets: self.encoded.basket_count(),
            vocabulary: self.encoded.vocabulary_len(),
            frequent_itemsets: self.frequent.value.len(),
            largest_itemset: self.frequent.value.max_size(),
            support_threshold: self.frequent.settled_at,
            support_attempts: self.frequent.attempts.clone(),
            rules: self.rules.value.len(),
            confidence_threshold: self.rules.settled_at,
            confidence_attempts: self.rules.attempts.clone(),
            top_rules: self
                .rules
                .value
                .top_by_confidence(top_rules)
                .into_iter()
                .map(RuleSummary::from)
                .collect(),
        }
    }
}

/// Serializable digest of a mining run for operator output.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MiningSummary {
    pub baskets: usize,
    pub vocabulary: usize,
    pub frequent_itemsets: usize,
    pub largest_itemset: usize,
    pub support_threshold: Option<f64>,
    pub support_attempts: Vec<Attempt>,
    pub rules: usize,
    pub confidence_threshold: Option<f64>,
    pub confidence_attempts: Vec<Attempt>,
    pub top_rules: Vec<RuleSummary>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RuleSummary {
    pub antecedent: Vec<String>,
    pub consequent: Vec<String>,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
}

impl From<&AssociationRule> for RuleSummary {
    fn from(rule: &AssociationRule) -> Self {
        Self {
            antecedent: rule.antecedent.items().iter().map(ToString::to_string).collect(),
            consequent: rule.consequent.items().iter().map(ToString::to_string).collect(),
            support: rule.support,
            confidence: rule.confidence,
            lift: rule.lift,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MiningPipeline;
    use crate::domain::basket::Basket;
    use crate::domain::item::Item;
    use crate::mining::EscalationSchedule;

    fn baskets(rows: &[&[&str]]) -> Vec<Basket> {
        rows.iter().filter_map(|row| Basket::from_labels(row.iter())).collect()
    }

    fn item(label: &str) -> Item {
        Item::parse(label).expect("valid label")
    }

    fn reference_baskets() -> Vec<Basket> {
        baskets(&[&["a", "b"], &["a", "b"], &["a", "c"], &["a", "b", "c"], &["b", "c"]])
    }

    #[test]
    fn support_ladder_loosens_until_patterns_appear() {
        let schedule =
            EscalationSchedule::new(vec![0.9, 0.7, 0.5], vec![0.5]).expect("valid schedule");
        let outcome = MiningPipeline::new(schedule).run(&reference_baskets());

        let support = outcome.support_escalation();
        assert_eq!(support.settled_at, Some(0.7));
        assert_eq!(support.attempts.len(), 2);
        assert_eq!(outcome.frequent_itemsets().len(), 2, "only {{a}} and {{b}} reach 0.7");
        assert!(outcome.rules().is_empty(), "singletons cannot form rules");
        assert_eq!(outcome.confidence_escalation().attempts.len(), 1);
    }

    #[test]
    fn confidence_ladder_loosens_until_rules_appear() {
        let schedule =
            EscalationSchedule::new(vec![0.4], vec![0.95, 0.8, 0.7]).expect("valid schedule");
        let outcome = MiningPipeline::new(schedule).run(&reference_baskets());

        let confidence = outcome.confidence_escalation();
        assert_eq!(confidence.settled_at, Some(0.7));
        assert!(confidence.escalated());
        assert!(outcome.rules().iter().all(|rule| rule.confidence >= 0.7));
    }

    #[test]
    fn empty_frequent_collection_skips_rule_escalation() {
        let schedule = EscalationSchedule::new(vec![0.9], vec![0.5, 0.1]).expect("valid schedule");
        let outcome = MiningPipeline::new(schedule).run(&baskets(&[&["a"], &["b"]]));

        assert!(outcome.frequent_itemsets().is_empty());
        assert_eq!(outcome.support_escalation().settled_at, None);
        assert!(outcome.confidence_escalation().attempts.is_empty());
        assert_eq!(outcome.recommend(&[item("a")]), None);
    }

    #[test]
    fn zero_baskets_report_no_patterns() {
        let outcome = MiningPipeline::default().run(&[]);
        let summary = outcome.summary(5);

        assert_eq!(summary.baskets, 0);
        assert_eq!(summary.frequent_itemsets, 0);
        assert_eq!(summary.rules, 0);
        assert_eq!(summary.support_attempts.len(), 3);
        assert!(summary.top_rules.is_empty());
    }

    #[test]
    fn partition_known_keeps_query_order() {
        let schedule = EscalationSchedule::new(vec![0.4], vec![0.5]).expect("valid schedule");
        let outcome = MiningPipeline::new(schedule).run(&reference_baskets());

        let (known, unknown) = outcome.partition_known(&[item("c"), item("zz"), item("a")]);
        assert_eq!(known, vec![item("c"), item("a")]);
        assert_eq!(unknown, vec![item("zz")]);
    }

    #[test]
    fn repeated_runs_are_content_equal() {
        let pipeline = MiningPipeline::new(
            EscalationSchedule::new(vec![0.95, 0.4], vec![0.9, 0.5]).expect("valid schedule"),
        );
        let first = pipeline.run(&reference_baskets());
        let second = pipeline.run(&reference_baskets());

        assert_eq!(first.frequent_itemsets(), second.frequent_itemsets());
        assert_eq!(first.rules(), second.rules());
        assert_eq!(first.summary(10), second.summary(10));
    }
}
