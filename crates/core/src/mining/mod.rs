//! Frequent-pattern mining over transaction baskets.
//!
//! The pipeline runs leaves first: baskets are encoded into per-item basket
//! membership, the Apriori miner enumerates every itemset meeting a support
//! threshold, and the rule generator splits each frequent itemset into
//! directional rules meeting a confidence threshold. Both stages share one
//! escalation policy that retries with looser thresholds when a pass comes back
//! empty.

mod apriori;
mod encoder;
mod escalation;
mod pipeline;
mod rules;

pub use apriori::{AprioriMiner, FrequentItemset, FrequentItemsets};
pub use encoder::{encode, EncodedTransactions};
pub use escalation::{escalate, Attempt, Escalated, EscalationSchedule, PassResult, Stage, ThresholdLadder};
pub use pipeline::{MiningOutcome, MiningPipeline, MiningSummary, RuleSummary};
pub use rules::{AssociationRule, RuleSet};

/// Default support ladder: 0.5%, then 0.2%, then 0.1% of baskets.
pub const DEFAULT_SUPPORT_THRESHOLDS: [f64; 3] = [0.005, 0.002, 0.001];

/// Default confidence ladder: 1%, then 0.5%, then 0.1%.
pub const DEFAULT_CONFIDENCE_THRESHOLDS: [f64; 3] = [0.01, 0.005, 0.001];

/// Tolerance used when comparing derived ratios in tests and diagnostics.
pub const RATIO_EPSILON: f64 = 1e-9;
