use crate::classify::{classify, WarningPolicy};
use crate::labels::reconcile_labels;
use crate::query::{QueryError, QueryValue};
use chrono::{DateTime, Local};
use inspection_model::{ComparisonMode, MetricDefinition, MetricRecord};
use std::collections::BTreeMap;

/// Turn the instant query result for one metric into validated, classified records.
///
/// Returns [None] when the metric should be left out of this cycle, either because the query
/// failed or because the result is not a vector or scalar. Otherwise returns the records of every
/// sample whose labels could be reconciled, which may be none.
pub fn process_instant_result(
    metric: &MetricDefinition,
    result: Result<QueryValue, QueryError>,
    processed_at: DateTime<Local>,
) -> Option<Vec<MetricRecord>> {
    let value = match result {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Query for metric [{}] failed: {e}", metric.name);
            return None;
        }
    };
    log::trace!("Metric [{}] query result: {value:?}", metric.name);

    if metric.threshold_type == ComparisonMode::NotEqual {
        log::warn!(
            "Metric [{}] uses 'not_equal', which instant evaluation judges as 'greater'",
            metric.name
        );
    }

    match value {
        QueryValue::Vector(samples) => Some(
            samples
                .iter()
                .filter_map(|sample| {
                    build_record(metric, &sample.labels, sample.value, processed_at)
                })
                .collect(),
        ),
        QueryValue::Scalar { value, .. } => Some(
            build_record(metric, &BTreeMap::new(), value, processed_at)
                .into_iter()
                .collect(),
        ),
        other => {
            log::debug!(
                "Ignoring {} result for metric [{}]",
                other.result_type(),
                metric.name
            );
            None
        }
    }
}

/// Build the record for a single sample, or [None] if its labels are incomplete.
pub fn build_record(
    metric: &MetricDefinition,
    raw_labels: &BTreeMap<String, String>,
    value: f64,
    processed_at: DateTime<Local>,
) -> Option<MetricRecord> {
    let labels = match reconcile_labels(&metric.labels, raw_labels) {
        Ok(labels) => labels,
        Err(e) => {
            log::warn!(
                "Dropping sample of metric [{}] with labels {raw_labels:?}: {e}",
                metric.name
            );
            return None;
        }
    };

    let status = classify(
        value,
        metric.threshold,
        metric.threshold_type,
        WarningPolicy::Instant,
    );

    Some(MetricRecord {
        name: metric.name.clone(),
        description: metric.description.clone(),
        value,
        threshold: metric.threshold,
        unit: metric.unit.clone(),
        status,
        status_text: status.text().to_string(),
        timestamp: processed_at,
        labels,
    })
}
