//! Association-rule mining and point recommendations over purchase baskets.
//!
//! Baskets are mined for frequent itemsets with Apriori, split into
//! directional rules, and queried with one to three items for the single
//! most likely companion purchase.

pub mod config;
pub mod domain;
pub mod errors;
pub mod ingest;
pub mod mining;
pub mod recommend;

pub use domain::basket::Basket;
pub use domain::item::Item;
pub use domain::itemset::Itemset;
pub use errors::{ApplicationError, DomainError};
pub use ingest::{DatasetColumns, IngestError, TransactionLog};
pub use mining::{
    AprioriMiner, AssociationRule, EscalationSchedule, FrequentItemsets, MiningOutcome,
    MiningPipeline, MiningSummary, RuleSet, Stage,
};
pub use recommend::{parse_query, resolve, MatchKind, ParsedQuery, QueryError, Recommendation};
