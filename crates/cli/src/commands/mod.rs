pub mod config;
pub mod mine;
pub mod recommend;
pub mod shell;

use std::path::PathBuf;

use basketry_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use basketry_core::{ApplicationError, MiningOutcome, MiningPipeline, TransactionLog};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_data(command, message, None)
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn from_error(command: &str, error: &ApplicationError) -> Self {
        Self::failure(
            command,
            error.error_class(),
            format!("{} ({error})", error.user_message()),
            error.exit_code(),
        )
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Options shared by every command that touches configuration or data.
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    pub config_path: Option<PathBuf>,
    pub dataset_path: Option<PathBuf>,
}

impl CommandContext {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config_path.clone(),
            require_file: self.config_path.is_some(),
            overrides: ConfigOverrides {
                dataset_path: self.dataset_path.clone(),
                ..ConfigOverrides::default()
            },
        }
    }
}

/// A loaded dataset and the rules mined from it.
pub(crate) struct MinedDataset {
    pub config: AppConfig,
    pub log: TransactionLog,
    pub outcome: MiningOutcome,
}

pub(crate) fn load_and_mine(context: &CommandContext) -> Result<MinedDataset, ApplicationError> {
    let config = AppConfig::load(context.load_options())?;
    let schedule = config.escalation_schedule()?;
    let log = TransactionLog::from_path(&config.dataset.path, &config.dataset.columns)?;
    let outcome = MiningPipeline::new(schedule)
        .with_max_itemset_len(config.mining.max_itemset_len)
        .run(log.baskets());

    Ok(MinedDataset { config, log, outcome })
}

pub(crate) fn format_percent(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}
