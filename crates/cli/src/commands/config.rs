use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use basketry_core::config::AppConfig;
use toml::Value;

use crate::commands::{CommandContext, CommandResult};

pub fn run(context: &CommandContext) -> CommandResult {
    let config = match AppConfig::load(context.load_options()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            );
        }
    };

    let config_file_path = context.config_path.clone().or_else(detect_config_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_key: &str| {
        field_source(key_path, &[env_key], config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines =
        vec!["effective config (source precedence: flag > env > file > default):".to_string()];

    lines.push(render_line(
        "mining.support_thresholds",
        &render_list(&config.mining.support_thresholds),
        source("mining.support_thresholds", "BASKETRY_MINING_SUPPORT_THRESHOLDS"),
    ));
    lines.push(render_line(
        "mining.confidence_thresholds",
        &render_list(&config.mining.confidence_thresholds),
        source("mining.confidence_thresholds", "BASKETRY_MINING_CONFIDENCE_THRESHOLDS"),
    ));
    lines.push(render_line(
        "mining.max_itemset_len",
        &config
            .mining
            .max_itemset_len
            .map(|len| len.to_string())
            .unwrap_or_else(|| "<unbounded>".to_string()),
        source("mining.max_itemset_len", "BASKETRY_MINING_MAX_ITEMSET_LEN"),
    ));

    let dataset_source = if context.dataset_path.is_some() {
        "flag (--dataset)".to_string()
    } else {
        source("dataset.path", "BASKETRY_DATASET_PATH")
    };
    lines.push(render_line(
        "dataset.path",
        &config.dataset.path.display().to_string(),
        dataset_source,
    ));
    lines.push(render_line(
        "dataset.member_column",
        &config.dataset.columns.member,
        source("dataset.member_column", "BASKETRY_DATASET_MEMBER_COLUMN"),
    ));
    lines.push(render_line(
        "dataset.date_column",
        &config.dataset.columns.date,
        source("dataset.date_column", "BASKETRY_DATASET_DATE_COLUMN"),
    ));
    lines.push(render_line(
        "dataset.item_column",
        &config.dataset.columns.item,
        source("dataset.item_column", "BASKETRY_DATASET_ITEM_COLUMN"),
    ));

    lines.push(render_line(
        "query.max_items",
        &config.query.max_items.to_string(),
        source("query.max_items", "BASKETRY_QUERY_MAX_ITEMS"),
    ));
    lines.push(render_line(
        "query.delimiter",
        &format!("{:?}", config.query.delimiter),
        source("query.delimiter", "BASKETRY_QUERY_DELIMITER"),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        field_source(
            "logging.level",
            &["BASKETRY_LOGGING_LEVEL", "BASKETRY_LOG_LEVEL"],
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        field_source(
            "logging.format",
            &["BASKETRY_LOGGING_FORMAT", "BASKETRY_LOG_FORMAT"],
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("basketry.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/basketry.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_list(values: &[f64]) -> String {
    let rendered = values.iter().map(f64::to_string).collect::<Vec<_>>().join(", ");
    format!("[{rendered}]")
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
