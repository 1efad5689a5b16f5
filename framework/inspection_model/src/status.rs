use crate::{ComparisonMode, Status};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Verdict for one metric on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    Normal,
    Warning,
    Abnormal,
}

impl From<Status> for DayStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Normal => DayStatus::Normal,
            Status::Warning => DayStatus::Warning,
            Status::Critical => DayStatus::Abnormal,
        }
    }
}

/// The per-day verdicts for a single metric.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricStatusRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub metric_type: String,
    /// Verdict keyed by `MM-DD` date label. Has one entry per date of the [StatusModel].
    pub daily_status: BTreeMap<String, DayStatus>,
    pub threshold: f64,
    pub unit: String,
    pub threshold_type: ComparisonMode,
}

/// Day verdict totals across every metric.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatusSummary {
    pub normal: usize,
    pub warning: usize,
    pub abnormal: usize,
    pub total_metrics: usize,
    /// Number of configured metrics per type.
    pub type_counts: BTreeMap<String, usize>,
}

impl StatusSummary {
    pub fn record(&mut self, status: DayStatus) {
        match status {
            DayStatus::Normal => self.normal += 1,
            DayStatus::Warning => self.warning += 1,
            DayStatus::Abnormal => self.abnormal += 1,
        }
    }
}

/// The multi-day health matrix.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatusModel {
    pub summary: StatusSummary,
    pub metrics: Vec<MetricStatusRecord>,
    /// Date labels, oldest first.
    pub dates: Vec<String>,
}
