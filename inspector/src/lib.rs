//! Threshold inspection of monitoring metrics.
//!
//! A [collect::ReportCollector] sweep queries every configured metric once, classifies each sample
//! and folds the results into a [inspection_model::ReportModel]. [status::collect_status] judges
//! each metric's daily maximum over a trailing window of days into a
//! [inspection_model::StatusModel]. Both read from a [query::QueryProvider] and perform no other
//! I/O.

pub mod aggregate;
pub mod chart;
pub mod classify;
pub mod collect;
pub mod labels;
pub mod process;
pub mod query;
pub mod replay;
pub mod status;

pub use collect::ReportCollector;
pub use query::{QueryError, QueryProvider, QueryRange, QueryValue, MAX_CONCURRENT_QUERIES};
pub use replay::ReplayProvider;
pub use status::{collect_status, DEFAULT_STATUS_DAYS, MAX_STATUS_DAYS};
