use basketry_core::mining::RATIO_EPSILON;
use basketry_core::{
    DatasetColumns, EscalationSchedule, Item, Itemset, MatchKind, MiningPipeline, TransactionLog,
};

const TRANSACTIONS: &str = "\
Member_number,Date,itemDescription
1,01-01-2015,a
1,01-01-2015,b
2,01-01-2015,a
2,01-01-2015,b
3,02-01-2015,a
3,02-01-2015,c
4,02-01-2015,a
4,02-01-2015,b
4,02-01-2015,c
5,03-01-2015,b
5,03-01-2015,c
6,03-01-2015,
";

fn item(label: &str) -> Item {
    Item::parse(label).expect("valid label")
}

fn itemset(labels: &[&str]) -> Itemset {
    labels.iter().map(|label| item(label)).collect()
}

fn mined() -> basketry_core::MiningOutcome {
    let log = TransactionLog::from_reader(TRANSACTIONS.as_bytes(), &DatasetColumns::default())
        .expect("transactions parse");
    assert_eq!(log.baskets().len(), 5, "the blank-item row forms an empty basket");
    assert_eq!(log.dropped_empty(), 1);

    let schedule = EscalationSchedule::new(vec![0.4], vec![0.5]).expect("valid schedule");
    MiningPipeline::new(schedule).run(log.baskets())
}

#[test]
fn csv_transactions_yield_reference_supports() {
    let outcome = mined();
    let frequent = outcome.frequent_itemsets();

    let expected = [
        (&["a"][..], 0.8),
        (&["b"][..], 0.8),
        (&["c"][..], 0.6),
        (&["a", "b"][..], 0.6),
        (&["a", "c"][..], 0.4),
        (&["b", "c"][..], 0.4),
    ];
    assert_eq!(frequent.len(), expected.len());
    for (labels, support) in expected {
        let found = frequent.support_of(&itemset(labels)).expect("itemset is frequent");
        assert!((found - support).abs() < RATIO_EPSILON, "{labels:?} support {found}");
    }
    assert!(!frequent.contains(&itemset(&["a", "b", "c"])));
}

#[test]
fn every_rule_confidence_matches_its_supports() {
    let outcome = mined();
    let frequent = outcome.frequent_itemsets();

    assert!(!outcome.rules().is_empty());
    for rule in outcome.rules().iter() {
        let union: Itemset =
            rule.antecedent.items().iter().chain(rule.consequent.items()).cloned().collect();
        let union_support = frequent.support_of(&union).expect("union is frequent");
        let antecedent_support =
            frequent.support_of(&rule.antecedent).expect("antecedent is frequent");

        assert!((rule.confidence - union_support / antecedent_support).abs() < RATIO_EPSILON);
        assert!(rule.confidence >= 0.5);
    }
}

#[test]
fn recommendations_prefer_exact_antecedents() {
    let outcome = mined();

    let exact = outcome.recommend(&[item("a")]).expect("a has rules");
    assert_eq!(exact.item, item("b"));
    assert_eq!(exact.match_kind, MatchKind::ExactAntecedent);

    let fallback = outcome.recommend(&[item("a"), item("b")]).expect("fallback to a");
    assert_eq!(fallback.match_kind, MatchKind::FirstItemFallback);
    assert_eq!(fallback.antecedent, itemset(&["a"]));

    assert_eq!(outcome.recommend(&[]), None);
    assert_eq!(outcome.recommend(&[item("caviar")]), None);
}
