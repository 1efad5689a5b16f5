use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::Path;

/// The inspection configuration.
///
/// Unknown keys are ignored so that a configuration file can also carry settings for the
/// scheduling, rendering and notification collaborators.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InspectionConfig {
    /// Name of the project, copied into every report.
    #[serde(default)]
    pub project_name: String,
    /// Metric definitions, grouped by type.
    #[serde(default)]
    pub metric_types: Vec<MetricType>,
}

impl InspectionConfig {
    /// Iterate over every metric definition along with the type it was configured under.
    pub fn metrics(&self) -> impl Iterator<Item = (&str, &MetricDefinition)> {
        self.metric_types.iter().flat_map(|metric_type| {
            metric_type
                .metrics
                .iter()
                .map(move |metric| (metric_type.metric_type.as_str(), metric))
        })
    }
}

/// A named group of metric definitions that share a report section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricType {
    #[serde(rename = "type")]
    pub metric_type: String,
    #[serde(default)]
    pub metrics: Vec<MetricDefinition>,
}

/// A single metric to query and judge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// The query expression sent to the monitoring backend.
    pub query: String,
    pub threshold: f64,
    #[serde(default)]
    pub unit: String,
    /// Raw backend label name to display alias.
    ///
    /// Every configured label must be present and non-empty on a sample for it to be kept.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// How the measured value is compared against [MetricDefinition::threshold].
    #[serde(default)]
    pub threshold_type: ComparisonMode,
}

/// How a measured value is compared to its threshold.
///
/// Deserialization is lenient. A missing, empty or unrecognised mode becomes
/// [ComparisonMode::Greater].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "Option<String>")]
pub enum ComparisonMode {
    #[default]
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Equal,
    NotEqual,
}

impl ComparisonMode {
    pub const ALL: [ComparisonMode; 6] = [
        ComparisonMode::Greater,
        ComparisonMode::GreaterEqual,
        ComparisonMode::Less,
        ComparisonMode::LessEqual,
        ComparisonMode::Equal,
        ComparisonMode::NotEqual,
    ];

    /// Parse a mode name, returning [None] for anything unrecognised.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "greater" => Some(ComparisonMode::Greater),
            "greater_equal" => Some(ComparisonMode::GreaterEqual),
            "less" => Some(ComparisonMode::Less),
            "less_equal" => Some(ComparisonMode::LessEqual),
            "equal" => Some(ComparisonMode::Equal),
            "not_equal" => Some(ComparisonMode::NotEqual),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonMode::Greater => "greater",
            ComparisonMode::GreaterEqual => "greater_equal",
            ComparisonMode::Less => "less",
            ComparisonMode::LessEqual => "less_equal",
            ComparisonMode::Equal => "equal",
            ComparisonMode::NotEqual => "not_equal",
        }
    }
}

impl From<Option<String>> for ComparisonMode {
    fn from(value: Option<String>) -> Self {
        match value.as_deref() {
            None | Some("") => ComparisonMode::default(),
            Some(name) => ComparisonMode::parse(name).unwrap_or_else(|| {
                log::warn!("Unknown threshold type '{name}', falling back to 'greater'");
                ComparisonMode::default()
            }),
        }
    }
}

impl fmt::Display for ComparisonMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Load the inspection configuration from a YAML file.
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<InspectionConfig> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open config file {}", path.display()))?;
    load_config_from_reader(file)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

/// Load the inspection configuration from any YAML reader.
pub fn load_config_from_reader<R: Read>(reader: R) -> anyhow::Result<InspectionConfig> {
    let config: InspectionConfig = serde_yaml::from_reader(reader)?;
    Ok(config)
}
