use inspection_model::{ChartData, MetricGroup};
use std::collections::{BTreeMap, BTreeSet};

/// The chart series key for a metric within a group.
pub fn series_key(metric_type: &str, metric_name: &str) -> String {
    format!("{metric_type}_{metric_name}")
}

/// Align the records of every metric onto one shared, sorted category axis.
///
/// The axis is the sorted union of every label value in the report. Each metric contributes a
/// series keyed by [series_key] with one entry per axis value. A metric is plotted against the
/// value of its first label only, so an axis entry holds the metric's value when some record's
/// first label took that value (the last such record wins) and `0` otherwise.
pub fn build_chart_series<'a>(groups: impl IntoIterator<Item = &'a MetricGroup>) -> ChartData {
    let mut axis = BTreeSet::new();
    let mut observed = BTreeMap::<String, BTreeMap<&str, f64>>::new();

    for group in groups {
        for (metric_name, records) in &group.metrics {
            let by_first_label = observed
                .entry(series_key(&group.metric_type, metric_name))
                .or_default();

            for record in records {
                for label in &record.labels {
                    axis.insert(label.value.as_str());
                }
                if let Some(first) = record.labels.first() {
                    by_first_label.insert(first.value.as_str(), record.value);
                }
            }
        }
    }

    let series = observed
        .into_iter()
        .map(|(key, values)| {
            let aligned = axis
                .iter()
                .map(|label| values.get(label).copied().unwrap_or(0.0))
                .collect::<Vec<_>>();
            log::trace!("Chart series {key}: {aligned:?}");
            (key, aligned)
        })
        .collect();

    ChartData {
        labels: axis.into_iter().map(str::to_string).collect(),
        series,
    }
}
