use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::DomainError;
use crate::ingest::DatasetColumns;
use crate::mining::{
    EscalationSchedule, DEFAULT_CONFIDENCE_THRESHOLDS, DEFAULT_SUPPORT_THRESHOLDS,
};
use crate::recommend::{DEFAULT_QUERY_DELIMITER, MAX_QUERY_ITEMS};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub mining: MiningConfig,
    pub dataset: DatasetConfig,
    pub query: QueryConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct MiningConfig {
    pub support_thresholds: Vec<f64>,
    pub confidence_thresholds: Vec<f64>,
    pub max_itemset_len: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct DatasetConfig {
    pub path: PathBuf,
    pub columns: DatasetColumns,
}

#[derive(Clone, Debug)]
pub struct QueryConfig {
    pub max_items: usize,
    pub delimiter: char,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub dataset_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub support_thresholds: Option<Vec<f64>>,
    pub confidence_thresholds: Option<Vec<f64>>,
    pub max_itemset_len: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mining: MiningConfig {
                support_thresholds: DEFAULT_SUPPORT_THRESHOLDS.to_vec(),
                confidence_thresholds: DEFAULT_CONFIDENCE_THRESHOLDS.to_vec(),
                max_itemset_len: None,
            },
            dataset: DatasetConfig {
                path: PathBuf::from("Groceries_dataset.csv"),
                columns: DatasetColumns::default(),
            },
            query: QueryConfig { max_items: MAX_QUERY_ITEMS, delimiter: DEFAULT_QUERY_DELIMITER },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("basketry.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// The validated threshold ladders for a mining run.
    pub fn escalation_schedule(&self) -> Result<EscalationSchedule, DomainError> {
        EscalationSchedule::new(
            self.mining.support_thresholds.clone(),
            self.mining.confidence_thresholds.clone(),
        )
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(mining) = patch.mining {
            if let Some(support_thresholds) = mining.support_thresholds {
                self.mining.support_thresholds = support_thresholds;
            }
            if let Some(confidence_thresholds) = mining.confidence_thresholds {
                self.mining.confidence_thresholds = confidence_thresholds;
            }
            if let Some(max_itemset_len) = mining.max_itemset_len {
                self.mining.max_itemset_len = Some(max_itemset_len);
            }
        }

        if let Some(dataset) = patch.dataset {
            if let Some(path) = dataset.path {
                self.dataset.path = path;
            }
            if let Some(member_column) = dataset.member_column {
                self.dataset.columns.member = member_column;
            }
            if let Some(date_column) = dataset.date_column {
                self.dataset.columns.date = date_column;
            }
            if let Some(item_column) = dataset.item_column {
                self.dataset.columns.item = item_column;
            }
        }

        if let Some(query) = patch.query {
            if let Some(max_items) = query.max_items {
                self.query.max_items = max_items;
            }
            if let Some(delimiter) = query.delimiter {
                self.query.delimiter = delimiter;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("BASKETRY_MINING_SUPPORT_THRESHOLDS") {
            self.mining.support_thresholds =
                parse_f64_list("BASKETRY_MINING_SUPPORT_THRESHOLDS", &value)?;
        }
        if let Some(value) = read_env("BASKETRY_MINING_CONFIDENCE_THRESHOLDS") {
            self.mining.confidence_thresholds =
                parse_f64_list("BASKETRY_MINING_CONFIDENCE_THRESHOLDS", &value)?;
        }
        if let Some(value) = read_env("BASKETRY_MINING_MAX_ITEMSET_LEN") {
            self.mining.max_itemset_len =
                Some(parse_usize("BASKETRY_MINING_MAX_ITEMSET_LEN", &value)?);
        }

        if let Some(value) = read_env("BASKETRY_DATASET_PATH") {
            self.dataset.path = PathBuf::from(value);
        }
        if let Some(value) = read_env("BASKETRY_DATASET_MEMBER_COLUMN") {
            self.dataset.columns.member = value;
        }
        if let Some(value) = read_env("BASKETRY_DATASET_DATE_COLUMN") {
            self.dataset.columns.date = value;
        }
        if let Some(value) = read_env("BASKETRY_DATASET_ITEM_COLUMN") {
            self.dataset.columns.item = value;
        }

        if let Some(value) = read_env("BASKETRY_QUERY_MAX_ITEMS") {
            self.query.max_items = parse_usize("BASKETRY_QUERY_MAX_ITEMS", &value)?;
        }
        if let Some(value) = read_env("BASKETRY_QUERY_DELIMITER") {
            self.query.delimiter = parse_char("BASKETRY_QUERY_DELIMITER", &value)?;
        }

        let log_level =
            read_env("BASKETRY_LOGGING_LEVEL").or_else(|| read_env("BASKETRY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("BASKETRY_LOGGING_FORMAT").or_else(|| read_env("BASKETRY_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(dataset_path) = overrides.dataset_path {
            self.dataset.path = dataset_path;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(support_thresholds) = overrides.support_thresholds {
            self.mining.support_thresholds = support_thresholds;
        }
        if let Some(confidence_thresholds) = overrides.confidence_thresholds {
            self.mining.confidence_thresholds = confidence_thresholds;
        }
        if let Some(max_itemset_len) = overrides.max_itemset_len {
            self.mining.max_itemset_len = Some(max_itemset_len);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_mining(&self.mining)?;
        validate_dataset(&self.dataset)?;
        validate_query(&self.query)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("basketry.toml"), PathBuf::from("config/basketry.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_mining(mining: &MiningConfig) -> Result<(), ConfigError> {
    EscalationSchedule::new(
        mining.support_thresholds.clone(),
        mining.confidence_thresholds.clone(),
    )
    .map_err(|error| ConfigError::Validation(format!("mining: {error}")))?;

    if let Some(max_itemset_len) = mining.max_itemset_len {
        if max_itemset_len < 2 {
            return Err(ConfigError::Validation(
                "mining.max_itemset_len must be at least 2 for rules to exist".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_dataset(dataset: &DatasetConfig) -> Result<(), ConfigError> {
    if dataset.path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("dataset.path must not be empty".to_string()));
    }

    let columns = [
        ("dataset.member_column", &dataset.columns.member),
        ("dataset.date_column", &dataset.columns.date),
        ("dataset.item_column", &dataset.columns.item),
    ];
    for (key, value) in columns {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{key} must not be empty")));
        }
    }

    Ok(())
}

fn validate_query(query: &QueryConfig) -> Result<(), ConfigError> {
    if query.max_items == 0 || query.max_items > MAX_QUERY_ITEMS {
        return Err(ConfigError::Validation(format!(
            "query.max_items must be in range 1..={MAX_QUERY_ITEMS}"
        )));
    }

    if query.delimiter.is_alphanumeric() || query.delimiter.is_whitespace() {
        return Err(ConfigError::Validation(
            "query.delimiter must be a punctuation character such as `,` or `;`".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_char(key: &str, value: &str) -> Result<char, ConfigError> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => Err(ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }),
    }
}

/// Comma-separated floats, e.g. `0.01,0.005`.
fn parse_f64_list(key: &str, value: &str) -> Result<Vec<f64>, ConfigError> {
    value
        .split(',')
        .map(|part| {
            part.trim().parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
                key: key.to_string(),
                value: value.to_string(),
            })
        })
        .collect()
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    mining: Option<MiningPatch>,
    dataset: Option<DatasetPatch>,
    query: Option<QueryPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct MiningPatch {
    support_thresholds: Option<Vec<f64>>,
    confidence_thresholds: Option<Vec<f64>>,
    max_itemset_len: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct DatasetPatch {
    path: Option<PathBuf>,
    member_column: Option<String>,
    date_column: Option<String>,
    item_column: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct QueryPatch {
    max_items: Option<usize>,
    delimiter: Option<char>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
