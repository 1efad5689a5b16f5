use crate::query::{QueryError, QueryProvider, QueryRange, QueryValue};
use anyhow::Context;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Recorded {kind:?} query {query:?} found in both {first:?} and {second:?}")]
    DuplicateRecording {
        kind: QueryKind,
        query: String,
        first: PathBuf,
        second: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    Instant,
    Range,
}

/// A recorded answer to one query.
///
/// Holds either the `data` object of a Prometheus HTTP API response or an error message to replay
/// as a backend failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordedQuery {
    pub kind: QueryKind,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecordedQuery {
    fn replay(&self) -> Result<QueryValue, QueryError> {
        if let Some(error) = &self.error {
            return Err(QueryError::Backend(error.clone()));
        }
        match &self.data {
            Some(data) => QueryValue::from_api_data(data),
            None => Err(QueryError::Malformed(format!(
                "Recording for {:?} has neither data nor error",
                self.query
            ))),
        }
    }
}

/// A [QueryProvider] that answers from recorded query results.
///
/// Instant recordings are returned as they are. Range recordings are trimmed to the requested
/// window, so one recording spanning several days can answer a query for each of them. Queries
/// without a recording fail with [QueryError::NotFound].
#[derive(Debug, Default)]
pub struct ReplayProvider {
    recordings: HashMap<(QueryKind, String), RecordedQuery>,
}

impl ReplayProvider {
    pub fn from_recordings(recordings: impl IntoIterator<Item = RecordedQuery>) -> Self {
        Self {
            recordings: recordings
                .into_iter()
                .map(|recording| ((recording.kind, recording.query.clone()), recording))
                .collect(),
        }
    }

    /// Load every `.json` recording below a directory.
    pub fn load(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = dir.as_ref();
        let mut recordings = HashMap::new();
        let mut sources = HashMap::<(QueryKind, String), PathBuf>::new();

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry =
                entry.with_context(|| format!("Failed to read recordings in {}", dir.display()))?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some("json")
            {
                continue;
            }

            let file = std::fs::File::open(path)
                .with_context(|| format!("Failed to open recording {}", path.display()))?;
            let recording: RecordedQuery =
                serde_json::from_reader(std::io::BufReader::new(file))
                    .with_context(|| format!("Failed to parse recording {}", path.display()))?;
            log::debug!(
                "Loaded {:?} recording for {:?} from {}",
                recording.kind,
                recording.query,
                path.display()
            );

            let key = (recording.kind, recording.query.clone());
            if let Some(first) = sources.insert(key.clone(), path.to_path_buf()) {
                return Err(LoadError::DuplicateRecording {
                    kind: recording.kind,
                    query: recording.query,
                    first,
                    second: path.to_path_buf(),
                }
                .into());
            }
            recordings.insert(key, recording);
        }

        log::info!("Loaded {} recordings from {}", recordings.len(), dir.display());

        Ok(Self { recordings })
    }

    pub fn len(&self) -> usize {
        self.recordings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recordings.is_empty()
    }

    fn lookup(&self, kind: QueryKind, expression: &str) -> Result<QueryValue, QueryError> {
        self.recordings
            .get(&(kind, expression.to_string()))
            .ok_or_else(|| QueryError::NotFound(expression.to_string()))?
            .replay()
    }
}

impl QueryProvider for ReplayProvider {
    async fn instant_query(
        &self,
        expression: &str,
        _at: DateTime<Local>,
    ) -> Result<QueryValue, QueryError> {
        self.lookup(QueryKind::Instant, expression)
    }

    async fn range_query(
        &self,
        expression: &str,
        range: QueryRange,
    ) -> Result<QueryValue, QueryError> {
        let value = self.lookup(QueryKind::Range, expression)?;

        Ok(match value {
            QueryValue::Matrix(series) => QueryValue::Matrix(
                series
                    .into_iter()
                    .filter_map(|mut series| {
                        series.points.retain(|(timestamp, _)| range.contains(*timestamp));
                        (!series.points.is_empty()).then_some(series)
                    })
                    .collect(),
            ),
            other => other,
        })
    }
}
