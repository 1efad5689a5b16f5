//! Models shared between the inspector and the collaborators that render its output.
//!
//! The configuration types describe what to query and how to judge it. The report and status
//! types are produced fresh on every run and handed off as JSON.

mod config;
mod report;
mod status;

pub use config::{
    load_config, load_config_from_reader, ComparisonMode, InspectionConfig, MetricDefinition,
    MetricType,
};
pub use report::{
    ChartData, GroupStats, LabelRecord, MetricGroup, MetricRecord, ReportModel, Status,
    PLACEHOLDER_LABEL_VALUE,
};
pub use status::{DayStatus, MetricStatusRecord, StatusModel, StatusSummary};

use serde::Serialize;
use std::io::Write;

/// Serialize a report or status model to a writer as pretty printed JSON.
pub fn store_model<M, W>(model: &M, writer: &mut W) -> anyhow::Result<()>
where
    M: Serialize,
    W: Write,
{
    serde_json::to_writer_pretty(&mut *writer, model)?;
    writer.write_all(b"\n")?;
    Ok(())
}
