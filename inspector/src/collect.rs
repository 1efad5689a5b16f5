use crate::aggregate::GroupAggregator;
use crate::chart::build_chart_series;
use crate::process::process_instant_result;
use crate::query::{QueryProvider, MAX_CONCURRENT_QUERIES};
use chrono::{DateTime, Local};
use futures::stream::{self, StreamExt};
use inspection_model::{InspectionConfig, MetricGroup, ReportModel};
use itertools::Itertools;
use std::collections::BTreeMap;

/// Runs a collection sweep over every configured metric.
///
/// Instant queries are issued concurrently, at most [MAX_CONCURRENT_QUERIES] at a time. Results
/// are merged only once every query has finished, so the produced [ReportModel] does not depend on completion order.
pub struct ReportCollector<'a, P> {
    provider: &'a P,
    config: &'a InspectionConfig,
}

impl<'a, P: QueryProvider> ReportCollector<'a, P> {
    pub fn new(provider: &'a P, config: &'a InspectionConfig) -> Self {
        Self { provider, config }
    }

    /// Collect a report as of `now`.
    ///
    /// Every record of the sweep is stamped with `now`. Metrics whose query fails are left out of
    /// their group, every configured type still gets a group.
    pub async fn collect(&self, now: DateTime<Local>) -> ReportModel {
        log::info!(
            "Collecting {} metrics for project '{}'",
            self.config.metrics().count(),
            self.config.project_name
        );

        let processed = stream::iter(self.config.metrics().map(|(metric_type, metric)| async move {
            let result = self.provider.instant_query(&metric.query, now).await;
            let records = process_instant_result(metric, result, now);
            (metric_type, metric, records)
        }))
        .buffered(MAX_CONCURRENT_QUERIES)
        .collect::<Vec<_>>()
        .await;

        let mut groups = self
            .config
            .metric_types
            .iter()
            .map(|metric_type| {
                (
                    metric_type.metric_type.clone(),
                    MetricGroup::new(metric_type.metric_type.clone()),
                )
            })
            .collect::<BTreeMap<_, _>>();

        let by_type = processed
            .into_iter()
            .filter_map(|(metric_type, metric, records)| {
                records.map(|records| (metric_type, (metric, records)))
            })
            .into_group_map();

        for (metric_type, metrics) in by_type {
            let Some(group) = groups.get_mut(metric_type) else {
                continue;
            };
            for (metric, records) in metrics {
                log::debug!(
                    "Metric [{}] of type [{metric_type}] has {} records",
                    metric.name,
                    records.len()
                );
                if group.metrics.insert(metric.name.clone(), records).is_some() {
                    log::warn!(
                        "Metric [{}] is configured more than once for type [{metric_type}], keeping the last",
                        metric.name
                    );
                }
            }
        }

        for group in groups.values_mut() {
            group.stats = GroupAggregator::aggregate(group.records());
            log::debug!("Group [{}] stats: {:?}", group.metric_type, group.stats);
        }

        let chart = build_chart_series(groups.values());

        ReportModel {
            project: self.config.project_name.clone(),
            timestamp: now,
            groups,
            chart,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{QueryError, QueryRange, QueryValue, Sample};
    use inspection_model::{ComparisonMode, GroupStats, MetricDefinition, MetricType, Status};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[derive(Default)]
    struct StaticProvider {
        instant: HashMap<String, Result<QueryValue, QueryError>>,
    }

    impl StaticProvider {
        fn with(mut self, query: &str, result: Result<QueryValue, QueryError>) -> Self {
            self.instant.insert(query.to_string(), result);
            self
        }
    }

    impl QueryProvider for StaticProvider {
        async fn instant_query(
            &self,
            expression: &str,
            _at: DateTime<Local>,
        ) -> Result<QueryValue, QueryError> {
            self.instant
                .get(expression)
                .cloned()
                .unwrap_or_else(|| Err(QueryError::NotFound(expression.to_string())))
        }

        async fn range_query(
            &self,
            expression: &str,
            _range: QueryRange,
        ) -> Result<QueryValue, QueryError> {
            Err(QueryError::NotFound(expression.to_string()))
        }
    }

    fn metric(name: &str, threshold: f64) -> MetricDefinition {
        MetricDefinition {
            name: name.to_string(),
            description: String::new(),
            query: format!("{name}_query"),
            threshold,
            unit: "%".to_string(),
            labels: [("host".to_string(), "Host".to_string())].into(),
            threshold_type: ComparisonMode::Greater,
        }
    }

    fn host_sample(host: &str, value: f64) -> Sample {
        Sample {
            labels: [("host".to_string(), host.to_string())].into(),
            timestamp: 0.0,
            value,
        }
    }

    fn config(metric_types: Vec<(&str, Vec<MetricDefinition>)>) -> InspectionConfig {
        InspectionConfig {
            project_name: "test".to_string(),
            metric_types: metric_types
                .into_iter()
                .map(|(metric_type, metrics)| MetricType {
                    metric_type: metric_type.to_string(),
                    metrics,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn end_to_end_single_metric() {
        let config = config(vec![("host", vec![metric("cpu", 80.0)])]);
        let provider = StaticProvider::default().with(
            "cpu_query",
            Ok(QueryValue::Vector(vec![
                host_sample("a", 85.0),
                host_sample("b", 50.0),
            ])),
        );
        let now = Local::now();

        let report = ReportCollector::new(&provider, &config).collect(now).await;

        assert_eq!(report.project, "test");
        assert_eq!(report.timestamp, now);

        let group = &report.groups["host"];
        let records = &group.metrics["cpu"];
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].labels[0].value, "a");
        assert_eq!(records[0].status, Status::Critical);
        assert_eq!(records[1].labels[0].value, "b");
        assert_eq!(records[1].status, Status::Normal);

        assert_eq!(
            group.stats,
            GroupStats {
                max: 85.0,
                min: 50.0,
                total_count: 2,
                warning_count: 0,
                critical_count: 1,
            }
        );

        assert_eq!(report.chart.labels, vec!["a", "b"]);
        assert_eq!(report.chart.series["host_cpu"], vec![85.0, 50.0]);
    }

    #[tokio::test]
    async fn failed_metric_does_not_fail_the_sweep() {
        let config = config(vec![
            ("host", vec![metric("cpu", 80.0), metric("mem", 90.0)]),
            ("storage", vec![metric("disk", 90.0)]),
            ("empty", vec![]),
        ]);
        let provider = StaticProvider::default()
            .with(
                "cpu_query",
                Err(QueryError::Backend("timeout".to_string())),
            )
            .with(
                "mem_query",
                Ok(QueryValue::Vector(vec![host_sample("a", 91.0)])),
            )
            .with("disk_query", Ok(QueryValue::Other("string".to_string())));

        let report = ReportCollector::new(&provider, &config)
            .collect(Local::now())
            .await;

        assert_eq!(
            report.groups.keys().collect::<Vec<_>>(),
            vec!["empty", "host", "storage"]
        );

        let host = &report.groups["host"];
        assert!(!host.metrics.contains_key("cpu"));
        assert_eq!(host.metrics["mem"].len(), 1);
        assert_eq!(host.stats.critical_count, 1);

        let storage = &report.groups["storage"];
        assert!(storage.metrics.is_empty());
        assert!(!storage.stats.has_data());

        assert!(!report.groups["empty"].stats.has_data());
        assert_eq!(
            report.chart.series.keys().collect::<Vec<_>>(),
            vec!["host_mem"]
        );
    }

    #[tokio::test]
    async fn chart_covers_every_group() {
        let config = config(vec![
            ("host", vec![metric("cpu", 80.0)]),
            ("storage", vec![metric("disk", 90.0)]),
        ]);
        let provider = StaticProvider::default()
            .with(
                "cpu_query",
                Ok(QueryValue::Vector(vec![
                    host_sample("web-2", 10.0),
                    host_sample("web-1", 20.0),
                ])),
            )
            .with(
                "disk_query",
                Ok(QueryValue::Vector(vec![host_sample("db-1", 30.0)])),
            );

        let report = ReportCollector::new(&provider, &config)
            .collect(Local::now())
            .await;

        assert_eq!(report.chart.labels, vec!["db-1", "web-1", "web-2"]);
        assert_eq!(report.chart.series["host_cpu"], vec![0.0, 20.0, 10.0]);
        assert_eq!(report.chart.series["storage_disk"], vec![30.0, 0.0, 0.0]);
    }
}
