use basketry_core::{parse_query, ApplicationError};
use serde_json::json;

use crate::commands::{format_percent, load_and_mine, CommandContext, CommandResult};

pub fn run(context: &CommandContext, items: &str) -> CommandResult {
    let mined = match load_and_mine(context) {
        Ok(mined) => mined,
        Err(error) => return CommandResult::from_error("recommend", &error),
    };

    let parsed = match parse_query(items, mined.config.query.delimiter, mined.config.query.max_items)
    {
        Ok(parsed) => parsed,
        Err(error) => return CommandResult::from_error("recommend", &ApplicationError::from(error)),
    };

    let mut notes = Vec::new();
    if parsed.was_truncated() {
        notes.push(format!(
            "only the first {} items were considered: {}",
            parsed.items.len(),
            join_items(&parsed.items)
        ));
    }

    let (known, unknown) = mined.outcome.partition_known(&parsed.items);
    if known.is_empty() {
        return CommandResult::failure(
            "recommend",
            "unknown_items",
            format!("none of the items were found in the dataset: {}", join_items(&unknown)),
            4,
        );
    }
    if !unknown.is_empty() {
        notes.push(format!("items not found in dataset: {}", join_items(&unknown)));
    }

    let recommendation = mined.outcome.recommend(&known);
    tracing::info!(
        event_name = "recommend.query.resolved",
        query = %join_items(&known),
        recommended = recommendation.as_ref().map(|found| found.item.as_str()),
        "recommendation query resolved"
    );

    let headline = match &recommendation {
        Some(found) => format!(
            "Maybe you would also like to purchase {} (confidence: {})",
            found.item,
            format_percent(found.confidence)
        ),
        None => "No recommendation available for the given item set.".to_string(),
    };
    let message = notes.into_iter().chain(std::iter::once(headline)).collect::<Vec<_>>().join("\n");

    let data = json!({
        "query": known,
        "unknown": unknown,
        "truncated": parsed.truncated,
        "recommendation": recommendation,
    });
    CommandResult::success_with_data("recommend", message, Some(data))
}

fn join_items(items: &[basketry_core::Item]) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}
