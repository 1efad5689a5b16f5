use chrono::{DateTime, Duration, Local};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use thiserror::Error;

/// A failure to answer a single query.
///
/// Failures are isolated to the query that produced them and never abort a sweep.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("No result available for query: {0}")]
    NotFound(String),
    #[error("Malformed query result: {0}")]
    Malformed(String),
}

/// The time window of a range query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryRange {
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
    pub step: Duration,
}

impl QueryRange {
    pub fn contains(&self, timestamp: f64) -> bool {
        let start = self.start.timestamp() as f64;
        let end = self.end.timestamp() as f64;
        timestamp >= start && timestamp <= end
    }
}

/// Upper bound on the queries a sweep keeps in flight against one provider.
pub const MAX_CONCURRENT_QUERIES: usize = 16;

/// Access to a time-series monitoring backend.
///
/// Timeouts and cancellation are the provider's responsibility.
pub trait QueryProvider: Send + Sync {
    /// Evaluate an expression at a single point in time.
    fn instant_query(
        &self,
        expression: &str,
        at: DateTime<Local>,
    ) -> impl Future<Output = Result<QueryValue, QueryError>> + Send;

    /// Evaluate an expression over a window at a fixed resolution.
    fn range_query(
        &self,
        expression: &str,
        range: QueryRange,
    ) -> impl Future<Output = Result<QueryValue, QueryError>> + Send;
}

/// One labelled value at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub labels: BTreeMap<String, String>,
    /// Unix timestamp in seconds.
    pub timestamp: f64,
    pub value: f64,
}

/// One labelled series of `(timestamp, value)` points.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub labels: BTreeMap<String, String>,
    pub points: Vec<(f64, f64)>,
}

/// The result shapes a query can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Vector(Vec<Sample>),
    Scalar { timestamp: f64, value: f64 },
    Matrix(Vec<Series>),
    /// Any result type that is not understood. Carries the result type name.
    Other(String),
}

impl QueryValue {
    pub fn result_type(&self) -> &str {
        match self {
            QueryValue::Vector(_) => "vector",
            QueryValue::Scalar { .. } => "scalar",
            QueryValue::Matrix(_) => "matrix",
            QueryValue::Other(name) => name,
        }
    }

    /// Parse the `data` object of a Prometheus HTTP API query response.
    ///
    /// Expects `{"resultType": ..., "result": ...}`, with sample values encoded as strings.
    pub fn from_api_data(data: &Value) -> Result<Self, QueryError> {
        let result_type = data
            .get("resultType")
            .and_then(Value::as_str)
            .ok_or_else(|| QueryError::Malformed(format!("No resultType in {data}")))?;
        let result = data
            .get("result")
            .cloned()
            .ok_or_else(|| QueryError::Malformed(format!("No result in {data}")))?;

        match result_type {
            "vector" => {
                let raw: Vec<RawSample> = from_result(result)?;
                raw.into_iter()
                    .map(|sample| {
                        Ok(Sample {
                            labels: sample.metric,
                            timestamp: sample.value.0,
                            value: parse_sample_value(&sample.value.1)?,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(QueryValue::Vector)
            }
            "scalar" => {
                let RawPoint(timestamp, value) = from_result(result)?;
                Ok(QueryValue::Scalar {
                    timestamp,
                    value: parse_sample_value(&value)?,
                })
            }
            "matrix" => {
                let raw: Vec<RawSeries> = from_result(result)?;
                raw.into_iter()
                    .map(|series| {
                        let points = series
                            .values
                            .iter()
                            .map(|RawPoint(timestamp, value)| {
                                Ok((*timestamp, parse_sample_value(value)?))
                            })
                            .collect::<Result<Vec<_>, QueryError>>()?;
                        Ok(Series {
                            labels: series.metric,
                            points,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(QueryValue::Matrix)
            }
            other => Ok(QueryValue::Other(other.to_string())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawPoint(f64, String);

#[derive(Debug, Deserialize)]
struct RawSample {
    #[serde(default)]
    metric: BTreeMap<String, String>,
    value: RawPoint,
}

#[derive(Debug, Deserialize)]
struct RawSeries {
    #[serde(default)]
    metric: BTreeMap<String, String>,
    #[serde(default)]
    values: Vec<RawPoint>,
}

fn from_result<T: DeserializeOwned>(result: Value) -> Result<T, QueryError> {
    serde_json::from_value(result).map_err(|e| QueryError::Malformed(e.to_string()))
}

/// Sample values arrive as strings, including `NaN`, `+Inf` and `-Inf`.
fn parse_sample_value(value: &str) -> Result<f64, QueryError> {
    value
        .parse::<f64>()
        .map_err(|e| QueryError::Malformed(format!("Sample value '{value}': {e}")))
}
