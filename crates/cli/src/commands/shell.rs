use std::io::{self, BufRead, Write};

use basketry_core::config::QueryConfig;
use basketry_core::{parse_query, Item, MiningOutcome, QueryError};

use crate::commands::{format_percent, load_and_mine, CommandContext, CommandResult};

const EXIT_WORDS: [&str; 3] = ["quit", "exit", "q"];
const SAMPLE_ITEMS: usize = 10;
const BANNER_RULES: usize = 5;

/// Counters for one interactive session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub queries: usize,
    pub recommendations: usize,
}

pub fn run(context: &CommandContext) -> CommandResult {
    let mined = match load_and_mine(context) {
        Ok(mined) => mined,
        Err(error) => return CommandResult::from_error("shell", &error),
    };
    if mined.outcome.rules().is_empty() {
        return CommandResult::failure(
            "shell",
            "no_rules",
            "no association rules generated; please check the dataset",
            6,
        );
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut output = stdout.lock();
    let session = write_banner(&mined.outcome, &mut output)
        .and_then(|()| run_session(&mined.outcome, &mined.config.query, stdin.lock(), &mut output));

    match session {
        Ok(stats) => CommandResult::success(
            "shell",
            format!(
                "session ended after {} queries ({} recommendations)",
                stats.queries, stats.recommendations
            ),
        ),
        Err(error) => CommandResult::failure("shell", "terminal_io", error.to_string(), 7),
    }
}

fn write_banner<W: Write>(outcome: &MiningOutcome, output: &mut W) -> io::Result<()> {
    let transactions = outcome.transactions();
    writeln!(
        output,
        "{} transactions, {} unique items, {} association rules",
        transactions.basket_count(),
        transactions.vocabulary_len(),
        outcome.rules().len()
    )?;
    writeln!(output, "top {BANNER_RULES} association rules (by confidence):")?;
    for rule in outcome.rules().top_by_confidence(BANNER_RULES) {
        writeln!(
            output,
            "  {} -> {} (confidence: {})",
            rule.antecedent,
            rule.consequent,
            format_percent(rule.confidence)
        )?;
    }
    let vocabulary: Vec<&str> = transactions.vocabulary().map(Item::as_str).collect();
    writeln!(output, "Available items: {}", vocabulary.join(", "))?;
    writeln!(output)?;
    writeln!(output, "enter items (comma-separated, 1-3 items max); type 'quit' to exit")?;
    Ok(())
}

/// Reads queries line by line until an exit word or end of input, answering
/// each with at most one recommended item.
pub fn run_session<R, W>(
    outcome: &MiningOutcome,
    query: &QueryConfig,
    input: R,
    mut output: W,
) -> io::Result<SessionStats>
where
    R: BufRead,
    W: Write,
{
    let mut stats = SessionStats::default();
    let mut lines = input.lines();

    loop {
        write!(output, "Enter items: ")?;
        output.flush()?;

        let Some(line) = lines.next() else {
            writeln!(output)?;
            break;
        };
        let line = line?;
        let trimmed = line.trim();

        if EXIT_WORDS.iter().any(|word| trimmed.eq_ignore_ascii_case(word)) {
            writeln!(output, "Thank you for using basketry. See you!")?;
            break;
        }

        let parsed = match parse_query(trimmed, query.delimiter, query.max_items) {
            Ok(parsed) => parsed,
            Err(QueryError::Empty) => {
                writeln!(output, "Please enter at least one item.")?;
                continue;
            }
        };
        stats.queries += 1;

        if parsed.was_truncated() {
            writeln!(
                output,
                "Warning: only the first {} items will be considered: {}",
                parsed.items.len(),
                join_items(&parsed.items)
            )?;
        }

        let (known, unknown) = outcome.partition_known(&parsed.items);
        if known.is_empty() {
            writeln!(output, "None of the items were found in the dataset.")?;
            let sample: Vec<&Item> = outcome.transactions().vocabulary().take(SAMPLE_ITEMS).collect();
            writeln!(
                output,
                "Available items include: {}...",
                sample.iter().map(|item| item.as_str()).collect::<Vec<_>>().join(", ")
            )?;
            continue;
        }
        if !unknown.is_empty() {
            writeln!(output, "Note: items not found in dataset: {}", join_items(&unknown))?;
        }

        match outcome.recommend(&known) {
            Some(found) => {
                stats.recommendations += 1;
                writeln!(output, "Maybe you would also like to purchase {}", found.item)?;
            }
            None => writeln!(output, "No recommendation available for the given item set.")?,
        }
        writeln!(output)?;
    }

    Ok(stats)
}

fn join_items(items: &[Item]) -> String {
    items.iter().map(Item::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use basketry_core::{EscalationSchedule, MiningPipeline, TransactionLog};

    use super::write_banner;

    #[test]
    fn banner_lists_the_whole_sorted_vocabulary() {
        let log = TransactionLog::from_label_lists([
            vec!["Yogurt", "bread"],
            vec!["bread", "yogurt"],
            vec!["apples"],
        ]);
        let schedule = EscalationSchedule::new(vec![0.5], vec![0.5]).expect("valid schedule");
        let outcome = MiningPipeline::new(schedule).run(log.baskets());

        let mut output = Vec::new();
        write_banner(&outcome, &mut output).expect("banner writes");
        let banner = String::from_utf8(output).expect("utf-8 banner");

        assert!(banner.starts_with("3 transactions, 3 unique items, 2 association rules"));
        assert!(banner.contains("\nAvailable items: apples, bread, yogurt\n"));
    }
}
