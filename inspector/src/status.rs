use crate::classify::{classify, WarningPolicy};
use crate::query::{QueryError, QueryProvider, QueryRange, QueryValue, MAX_CONCURRENT_QUERIES};
use chrono::{DateTime, Datelike, Days, Duration, Local, NaiveDate, NaiveTime, TimeZone};
use futures::stream::{self, StreamExt};
use inspection_model::{
    DayStatus, InspectionConfig, MetricDefinition, MetricStatusRecord, StatusModel, StatusSummary,
};
use std::collections::BTreeMap;
use thiserror::Error;

/// Default length of the trailing window, in days.
pub const DEFAULT_STATUS_DAYS: usize = 7;

/// Longest supported window, in days. Date labels carry no year, so a longer window would repeat
/// labels.
pub const MAX_STATUS_DAYS: usize = 365;

/// Format of the date labels in a [StatusModel].
const DATE_LABEL_FORMAT: &str = "%m-%d";

/// A date label that cannot be turned into a local day window.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DayParseError {
    #[error("Invalid date label '{0}'")]
    InvalidLabel(String),
    #[error("Local midnight does not exist on {0}")]
    NoLocalMidnight(NaiveDate),
}

#[derive(Error, Debug)]
enum DayError {
    #[error(transparent)]
    Parse(#[from] DayParseError),
    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Date labels for the `days` days ending with `today`, oldest first.
pub fn date_labels(today: NaiveDate, days: usize) -> Vec<String> {
    (0..days)
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(offset as u64)))
        .map(|date| date.format(DATE_LABEL_FORMAT).to_string())
        .collect()
}

/// The local `[00:00:00, 23:59:59]` window of the day a date label refers to.
///
/// Labels carry no year. The label is taken to mean its most recent occurrence on or before
/// `now`, so early January labels for late December resolve to the previous year.
pub fn day_bounds(
    label: &str,
    now: DateTime<Local>,
) -> Result<(DateTime<Local>, DateTime<Local>), DayParseError> {
    let today = now.date_naive();
    let format = format!("%Y-{DATE_LABEL_FORMAT}");
    let date = [today.year(), today.year() - 1]
        .into_iter()
        .filter_map(|year| NaiveDate::parse_from_str(&format!("{year}-{label}"), &format).ok())
        .find(|date| *date <= today)
        .ok_or_else(|| DayParseError::InvalidLabel(label.to_string()))?;

    let start = Local
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .ok_or(DayParseError::NoLocalMidnight(date))?;
    let end = start + Duration::hours(24) - Duration::seconds(1);

    Ok((start, end))
}

/// The largest value in a range result, or `0` when it holds no values.
pub fn max_value(value: &QueryValue) -> f64 {
    let values: Box<dyn Iterator<Item = f64> + '_> = match value {
        QueryValue::Matrix(series) => Box::new(
            series
                .iter()
                .flat_map(|series| series.points.iter().map(|(_, value)| *value)),
        ),
        QueryValue::Vector(samples) => Box::new(samples.iter().map(|sample| sample.value)),
        QueryValue::Scalar { value, .. } => Box::new(std::iter::once(*value)),
        QueryValue::Other(result_type) => {
            log::debug!("Ignoring {result_type} result of range query");
            Box::new(std::iter::empty())
        }
    };

    values
        .filter(|value| !value.is_nan())
        .reduce(f64::max)
        .unwrap_or(0.0)
}

/// Judge one metric on the day a date label refers to.
///
/// Any failure to work out the window or to query it marks the day as abnormal.
pub async fn evaluate_day<P: QueryProvider>(
    provider: &P,
    metric: &MetricDefinition,
    label: &str,
    now: DateTime<Local>,
) -> DayStatus {
    match query_day_max(provider, metric, label, now).await {
        Ok(max) => {
            let status: DayStatus = classify(
                max,
                metric.threshold,
                metric.threshold_type,
                WarningPolicy::Daily,
            )
            .into();
            log::debug!(
                "Metric [{}] on {label}: max {max}, threshold {} ({}), status {status:?}",
                metric.name,
                metric.threshold,
                metric.threshold_type
            );
            status
        }
        Err(e) => {
            log::warn!("Failed to evaluate metric [{}] on {label}: {e}", metric.name);
            DayStatus::Abnormal
        }
    }
}

async fn query_day_max<P: QueryProvider>(
    provider: &P,
    metric: &MetricDefinition,
    label: &str,
    now: DateTime<Local>,
) -> Result<f64, DayError> {
    let (start, end) = day_bounds(label, now)?;
    log::trace!(
        "Querying metric [{}] from {start} to {end}: {}",
        metric.name,
        metric.query
    );

    let range = QueryRange {
        start,
        end,
        step: Duration::hours(1),
    };
    let value = provider.range_query(&metric.query, range).await?;

    Ok(max_value(&value))
}

/// Judge every configured metric on each of the `days` days ending today.
///
/// Always produces one verdict per metric per day, however many queries fail. Windows longer than
/// [MAX_STATUS_DAYS] are shortened to it. At most [MAX_CONCURRENT_QUERIES] range queries are in
/// flight at once.
pub async fn collect_status<P: QueryProvider>(
    provider: &P,
    config: &InspectionConfig,
    days: usize,
    now: DateTime<Local>,
) -> StatusModel {
    let days = if days > MAX_STATUS_DAYS {
        log::warn!("Status window of {days} days is longer than {MAX_STATUS_DAYS}, shortening it");
        MAX_STATUS_DAYS
    } else {
        days
    };
    let dates = date_labels(now.date_naive(), days);
    log::info!("Collecting metric status for {dates:?}");

    let metrics = config.metrics().collect::<Vec<_>>();
    let mut verdicts = stream::iter(metrics.iter().flat_map(|(_, metric)| {
        dates
            .iter()
            .map(move |label| evaluate_day(provider, metric, label, now))
    }))
    .buffered(MAX_CONCURRENT_QUERIES)
    .collect::<Vec<_>>()
    .await
    .into_iter();

    let mut summary = StatusSummary::default();
    for metric_type in &config.metric_types {
        *summary
            .type_counts
            .entry(metric_type.metric_type.clone())
            .or_default() += metric_type.metrics.len();
        summary.total_metrics += metric_type.metrics.len();
    }

    let records = metrics
        .iter()
        .map(|(metric_type, metric)| {
            let daily_status = dates
                .iter()
                .cloned()
                .zip(verdicts.by_ref())
                .collect::<BTreeMap<_, _>>();
            for status in daily_status.values() {
                summary.record(*status);
            }

            MetricStatusRecord {
                name: metric.name.clone(),
                metric_type: metric_type.to_string(),
                daily_status,
                threshold: metric.threshold,
                unit: metric.unit.clone(),
                threshold_type: metric.threshold_type,
            }
        })
        .collect::<Vec<_>>();

    log::info!(
        "Metric status collected. Metrics: {}, normal: {}, warning: {}, abnormal: {}",
        summary.total_metrics,
        summary.normal,
        summary.warning,
        summary.abnormal
    );

    StatusModel {
        summary,
        metrics: records,
        dates,
    }
}
