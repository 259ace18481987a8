use basketry_core::MiningSummary;
use serde::Serialize;

use crate::commands::{format_percent, load_and_mine, CommandContext, CommandResult};

#[derive(Debug, Serialize)]
struct MineReport<'a> {
    command: &'static str,
    status: &'static str,
    rows: usize,
    keyless_rows: usize,
    dropped_empty_baskets: usize,
    summary: &'a MiningSummary,
}

pub fn run(context: &CommandContext, top: usize, json_output: bool) -> CommandResult {
    let mined = match load_and_mine(context) {
        Ok(mined) => mined,
        Err(error) => return CommandResult::from_error("mine", &error),
    };
    let summary = mined.outcome.summary(top);

    if json_output {
        let report = MineReport {
            command: "mine",
            status: "ok",
            rows: mined.log.row_count(),
            keyless_rows: mined.log.keyless_rows(),
            dropped_empty_baskets: mined.log.dropped_empty(),
            summary: &summary,
        };
        return match serde_json::to_string_pretty(&report) {
            Ok(output) => CommandResult { exit_code: 0, output },
            Err(error) => CommandResult::failure(
                "mine",
                "serialization",
                format!("mine report serialization failed: {error}"),
                1,
            ),
        };
    }

    let mut lines = vec![
        format!(
            "loaded {} transactions from {} rows ({} empty dropped, {} rows without member or date)",
            summary.baskets,
            mined.log.row_count(),
            mined.log.dropped_empty(),
            mined.log.keyless_rows()
        ),
        format!("vocabulary: {} distinct items", summary.vocabulary),
        format!(
            "frequent itemsets: {} (largest {}, support threshold {}, {} attempt(s))",
            summary.frequent_itemsets,
            summary.largest_itemset,
            threshold_label(summary.support_threshold),
            summary.support_attempts.len()
        ),
        format!(
            "association rules: {} (confidence threshold {}, {} attempt(s))",
            summary.rules,
            threshold_label(summary.confidence_threshold),
            summary.confidence_attempts.len()
        ),
    ];

    if summary.rules == 0 {
        lines.push(
            "no association rules generated; the dataset is too sparse for the configured thresholds"
                .to_string(),
        );
    } else {
        lines.push(format!("top {} rules by confidence:", summary.top_rules.len()));
        for rule in &summary.top_rules {
            lines.push(format!(
                "  {} -> {} (confidence: {}, lift: {:.2})",
                rule.antecedent.join(", "),
                rule.consequent.join(", "),
                format_percent(rule.confidence),
                rule.lift
            ));
        }
    }

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn threshold_label(threshold: Option<f64>) -> String {
    threshold.map(format_percent).unwrap_or_else(|| "exhausted".to_string())
}
