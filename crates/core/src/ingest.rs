//! Transaction log ingestion: CSV rows grouped into baskets.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::domain::basket::Basket;

/// Column names of the transaction log. Rows sharing a (member, date) pair
/// form one basket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetColumns {
    pub member: String,
    pub date: String,
    pub item: String,
}

impl Default for DatasetColumns {
    fn default() -> Self {
        Self {
            member: "Member_number".to_string(),
            date: "Date".to_string(),
            item: "itemDescription".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("could not open dataset `{path}`: {source}")]
    Open { path: PathBuf, source: csv::Error },
    #[error("could not read dataset header: {0}")]
    Header(#[source] csv::Error),
    #[error("dataset is missing column `{column}` (available: {available})")]
    MissingColumn { column: String, available: String },
    #[error("malformed record at line {line}: {source}")]
    Record { line: usize, source: csv::Error },
}

/// Cleaned baskets plus the counts an operator needs to sanity-check a load.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransactionLog {
    baskets: Vec<Basket>,
    row_count: usize,
    keyless_rows: usize,
    group_count: usize,
}

impl TransactionLog {
    pub fn from_path(path: &Path, columns: &DatasetColumns) -> Result<Self, IngestError> {
        let reader = csv::Reader::from_path(path)
            .map_err(|source| IngestError::Open { path: path.to_path_buf(), source })?;
        let log = Self::from_csv(reader, columns)?;
        info!(
            event_name = "ingest.dataset.loaded",
            path = %path.display(),
            rows = log.row_count,
            keyless_rows = log.keyless_rows,
            groups = log.group_count,
            baskets = log.baskets.len(),
            "transaction log loaded"
        );
        Ok(log)
    }

    pub fn from_reader<R: io::Read>(reader: R, columns: &DatasetColumns) -> Result<Self, IngestError> {
        Self::from_csv(csv::Reader::from_reader(reader), columns)
    }

    fn from_csv<R: io::Read>(
        mut reader: csv::Reader<R>,
        columns: &DatasetColumns,
    ) -> Result<Self, IngestError> {
        let headers = reader.headers().map_err(IngestError::Header)?.clone();
        let position = |column: &str| {
            headers.iter().position(|header| header.trim() == column).ok_or_else(|| {
                IngestError::MissingColumn {
                    column: column.to_string(),
                    available: headers.iter().collect::<Vec<_>>().join(", "),
                }
            })
        };
        let member_at = position(&columns.member)?;
        let date_at = position(&columns.date)?;
        let item_at = position(&columns.item)?;

        let mut group_index: HashMap<(String, String), usize> = HashMap::new();
        let mut groups: Vec<Vec<String>> = Vec::new();
        let mut row_count = 0;
        let mut keyless_rows = 0;

        for (offset, record) in reader.records().enumerate() {
            // Line 1 is the header.
            let record = record.map_err(|source| IngestError::Record { line: offset + 2, source })?;
            row_count += 1;

            let field = |at: usize| record.get(at).unwrap_or("").trim().to_string();
            let key = (field(member_at), field(date_at));
            if key.0.is_empty() || key.1.is_empty() {
                keyless_rows += 1;
                continue;
            }
            let slot = *group_index.entry(key).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(field(item_at));
        }

        let group_count = groups.len();
        let baskets = groups.into_iter().filter_map(Basket::from_labels).collect();

        Ok(Self { baskets, row_count, keyless_rows, group_count })
    }

    /// Builds a log directly from label lists, one basket per list.
    pub fn from_label_lists<I, B, S>(lists: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut row_count = 0;
        let mut group_count = 0;
        let baskets = lists
            .into_iter()
            .filter_map(|labels| {
                group_count += 1;
                let labels: Vec<S> = labels.into_iter().collect();
                row_count += labels.len();
                Basket::from_labels(labels)
            })
            .collect();

        Self { baskets, row_count, keyless_rows: 0, group_count }
    }

    pub fn baskets(&self) -> &[Basket] {
        &self.baskets
    }

    /// Source rows read, including rows with blank items.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Rows skipped because the member or date was blank.
    pub fn keyless_rows(&self) -> usize {
        self.keyless_rows
    }

    /// Distinct (member, date) groups before empty baskets were dropped.
    pub fn group_count(&self) -> usize {
        self.group_count
    }

    /// Groups that had no usable item left after normalization.
    pub fn dropped_empty(&self) -> usize {
        self.group_count - self.baskets.len()
    }
}
