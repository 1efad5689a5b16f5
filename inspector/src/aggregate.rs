use inspection_model::{GroupStats, MetricRecord, Status};

/// Folds metric records into [GroupStats].
///
/// The fold is order independent and partial aggregates can be merged, so records may be pushed
/// in any order and from any number of partial sweeps.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupAggregator {
    stats: GroupStats,
}

impl GroupAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate every record of an iterator.
    pub fn aggregate<'a>(records: impl IntoIterator<Item = &'a MetricRecord>) -> GroupStats {
        records
            .into_iter()
            .fold(Self::new(), |mut aggregator, record| {
                aggregator.push(record);
                aggregator
            })
            .finish()
    }

    pub fn push(&mut self, record: &MetricRecord) {
        self.stats.max = self.stats.max.max(record.value);
        self.stats.min = self.stats.min.min(record.value);
        self.stats.total_count += 1;

        match record.status {
            Status::Warning => self.stats.warning_count += 1,
            Status::Critical => self.stats.critical_count += 1,
            Status::Normal => {}
        }
    }

    /// Combine with another partial aggregate.
    pub fn merge(mut self, other: GroupAggregator) -> Self {
        self.stats.max = self.stats.max.max(other.stats.max);
        self.stats.min = self.stats.min.min(other.stats.min);
        self.stats.total_count += other.stats.total_count;
        self.stats.warning_count += other.stats.warning_count;
        self.stats.critical_count += other.stats.critical_count;
        self
    }

    pub fn finish(self) -> GroupStats {
        self.stats
    }
}
