use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Value substituted for a configured label that is missing from a sample.
///
/// A record carrying this value is never kept.
pub const PLACEHOLDER_LABEL_VALUE: &str = "-";

/// Outcome of comparing one measured value against its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Normal,
    Warning,
    Critical,
}

impl Status {
    /// Human readable status text for display next to a record.
    pub fn text(&self) -> &'static str {
        match self {
            Status::Normal => "Normal",
            Status::Warning => "Warning",
            Status::Critical => "Critical",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// A configured label resolved against one sample.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabelRecord {
    /// The raw label name on the backend
    pub name: String,
    /// The configured display alias
    pub alias: String,
    pub value: String,
}

/// One validated, classified sample of a metric.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricRecord {
    pub name: String,
    pub description: String,
    pub value: f64,
    pub threshold: f64,
    pub unit: String,
    pub status: Status,
    pub status_text: String,
    pub timestamp: DateTime<Local>,
    /// One entry per configured label, in configuration order.
    pub labels: Vec<LabelRecord>,
}

/// Summary statistics over every record of a [MetricGroup].
///
/// When [GroupStats::total_count] is zero, `min` and `max` hold their starting sentinels
/// (positive and negative infinity) and carry no information. The sentinels are written as `null`
/// and read back from `null`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GroupStats {
    #[serde(
        serialize_with = "bound::serialize",
        deserialize_with = "bound::deserialize_max"
    )]
    pub max: f64,
    #[serde(
        serialize_with = "bound::serialize",
        deserialize_with = "bound::deserialize_min"
    )]
    pub min: f64,
    pub total_count: usize,
    pub warning_count: usize,
    pub critical_count: usize,
}

impl GroupStats {
    /// Whether any record contributed to these stats.
    pub fn has_data(&self) -> bool {
        self.total_count > 0
    }

    /// Records that were neither warning nor critical.
    pub fn normal_count(&self) -> usize {
        self.total_count
            .saturating_sub(self.warning_count)
            .saturating_sub(self.critical_count)
    }
}

/// Serde helpers for the `min`/`max` bounds of [GroupStats].
mod bound {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_some(value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize_max<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NEG_INFINITY))
    }

    pub fn deserialize_min<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}

impl Default for GroupStats {
    fn default() -> Self {
        Self {
            max: f64::NEG_INFINITY,
            min: f64::INFINITY,
            total_count: 0,
            warning_count: 0,
            critical_count: 0,
        }
    }
}

/// The records collected for one metric type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricGroup {
    #[serde(rename = "type")]
    pub metric_type: String,
    /// Records keyed by metric name.
    ///
    /// A metric whose query failed during collection has no entry here, whereas a metric whose
    /// samples were all rejected maps to an empty list.
    pub metrics: BTreeMap<String, Vec<MetricRecord>>,
    pub stats: GroupStats,
}

impl MetricGroup {
    pub fn new(metric_type: impl Into<String>) -> Self {
        Self {
            metric_type: metric_type.into(),
            metrics: BTreeMap::new(),
            stats: GroupStats::default(),
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &MetricRecord> {
        self.metrics.values().flatten()
    }
}

/// Chart-ready series aligned on a shared category axis.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChartData {
    /// Sorted, deduplicated label values seen across the whole report.
    pub labels: Vec<String>,
    /// One series per `{type}_{metric}` key, each exactly as long as [ChartData::labels].
    pub series: BTreeMap<String, Vec<f64>>,
}

/// Everything collected in a single inspection sweep.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportModel {
    pub project: String,
    /// When the sweep started.
    pub timestamp: DateTime<Local>,
    pub groups: BTreeMap<String, MetricGroup>,
    pub chart: ChartData,
}
