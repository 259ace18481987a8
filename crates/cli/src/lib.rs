pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::anyhow;
use basketry_core::config::{AppConfig, LogFormat};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::CommandContext;

#[derive(Debug, Parser)]
#[command(
    name = "basketry",
    about = "Basketry association-rule recommender",
    long_about = "Mine frequent itemsets and association rules from a transaction log, then recommend the next item for a partial basket.",
    after_help = "Examples:\n  basketry mine --top 10\n  basketry recommend --items \"whole milk, rolls/buns\"\n  basketry shell --dataset Groceries_dataset.csv"
)]
pub struct Cli {
    #[arg(long, global = true, value_name = "PATH", help = "Load configuration from this TOML file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, value_name = "PATH", help = "Read transactions from this CSV file")]
    dataset: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Mine the dataset and print a summary with the strongest rules")]
    Mine {
        #[arg(long, default_value_t = 5, help = "Number of rules to list by confidence")]
        top: usize,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Recommend one item for a comma-separated list of 1-3 items")]
    Recommend {
        #[arg(long, help = "Items already in the basket, e.g. \"whole milk, yogurt\"")]
        items: String,
    },
    #[command(about = "Interactive recommendation loop; type quit, exit or q to leave")]
    Shell,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let context = CommandContext { config_path: cli.config, dataset_path: cli.dataset };

    // Config errors are reported by the command itself.
    if let Ok(config) = AppConfig::load(context.load_options()) {
        if let Err(error) = init_logging(&config) {
            eprintln!("basketry: logging disabled: {error}");
        }
    }

    let result = match cli.command {
        Command::Mine { top, json } => commands::mine::run(&context, top, json),
        Command::Recommend { items } => commands::recommend::run(&context, &items),
        Command::Shell => commands::shell::run(&context),
        Command::Config => commands::config::run(&context),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn init_logging(config: &AppConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .map_err(|error| anyhow!("invalid log filter: {error}"))?;
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|error| anyhow!("subscriber already installed: {error}"))
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn global_dataset_flag_is_accepted_after_subcommand() {
        let cli = Cli::try_parse_from(["basketry", "recommend", "--items", "a, b", "--dataset", "x.csv"])
            .expect("arguments parse");
        assert_eq!(cli.dataset.as_deref().and_then(|path| path.to_str()), Some("x.csv"));
        assert!(matches!(cli.command, Command::Recommend { ref items } if items == "a, b"));
    }

    #[test]
    fn mine_defaults_to_five_rules() {
        let cli = Cli::try_parse_from(["basketry", "mine"]).expect("arguments parse");
        assert!(matches!(cli.command, Command::Mine { top: 5, json: false }));
    }

    #[test]
    fn recommend_requires_items() {
        assert!(Cli::try_parse_from(["basketry", "recommend"]).is_err());
    }
}
