use inspection_model::{ComparisonMode, Status};

/// Which warning band to apply around a threshold.
///
/// Instant evaluation of live samples and daily evaluation of a day's maximum use different bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningPolicy {
    /// Warn from 80% of the threshold upwards, or up to 120% of it for the `less` modes.
    ///
    /// `not_equal` is not evaluated by this policy and is judged as `greater`.
    Instant,
    /// Warn from 90% of the threshold upwards, or below `threshold / 0.9` for the `less` modes.
    Daily,
}

impl WarningPolicy {
    pub const INSTANT_WARNING_FACTOR: f64 = 0.8;
    pub const INSTANT_UPPER_MARGIN: f64 = 1.2;
    pub const DAILY_WARNING_FACTOR: f64 = 0.9;

    /// The mode this policy actually evaluates for a configured mode.
    pub fn effective_mode(self, mode: ComparisonMode) -> ComparisonMode {
        match (self, mode) {
            (WarningPolicy::Instant, ComparisonMode::NotEqual) => ComparisonMode::Greater,
            (_, mode) => mode,
        }
    }

    /// Lower edge of the warning band for the `greater` modes.
    fn lower_warning_edge(self, threshold: f64) -> f64 {
        match self {
            WarningPolicy::Instant => threshold * Self::INSTANT_WARNING_FACTOR,
            WarningPolicy::Daily => threshold * Self::DAILY_WARNING_FACTOR,
        }
    }

    /// Whether a value at or above the threshold is still inside the warning band of the `less`
    /// modes.
    fn within_upper_band(self, value: f64, threshold: f64, inclusive: bool) -> bool {
        match self {
            WarningPolicy::Instant => value <= threshold * Self::INSTANT_UPPER_MARGIN,
            WarningPolicy::Daily if inclusive => value <= threshold / Self::DAILY_WARNING_FACTOR,
            WarningPolicy::Daily => value < threshold / Self::DAILY_WARNING_FACTOR,
        }
    }
}

/// Classify a measured value against a threshold.
///
/// Never fails, every combination of inputs maps to a [Status].
pub fn classify(value: f64, threshold: f64, mode: ComparisonMode, policy: WarningPolicy) -> Status {
    match policy.effective_mode(mode) {
        ComparisonMode::Greater => {
            if value > threshold {
                Status::Critical
            } else if value >= policy.lower_warning_edge(threshold) {
                Status::Warning
            } else {
                Status::Normal
            }
        }
        ComparisonMode::GreaterEqual => {
            if value >= threshold {
                Status::Critical
            } else if value >= policy.lower_warning_edge(threshold) {
                Status::Warning
            } else {
                Status::Normal
            }
        }
        ComparisonMode::Less => {
            if value < threshold {
                Status::Normal
            } else if policy.within_upper_band(value, threshold, false) {
                Status::Warning
            } else {
                Status::Critical
            }
        }
        ComparisonMode::LessEqual => {
            if value <= threshold {
                Status::Normal
            } else if policy.within_upper_band(value, threshold, true) {
                Status::Warning
            } else {
                Status::Critical
            }
        }
        ComparisonMode::Equal => {
            if value == threshold {
                Status::Normal
            } else {
                Status::Critical
            }
        }
        ComparisonMode::NotEqual => {
            if value != threshold {
                Status::Normal
            } else {
                Status::Critical
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICIES: [WarningPolicy; 2] = [WarningPolicy::Instant, WarningPolicy::Daily];

    fn values() -> Vec<f64> {
        (-300..=300).map(|v| v as f64 * 0.5).collect()
    }

    #[test]
    fn greater_instant_bands() {
        let policy = WarningPolicy::Instant;
        let mode = ComparisonMode::Greater;
        assert_eq!(classify(10.0, 80.0, mode, policy), Status::Normal);
        assert_eq!(classify(63.9, 80.0, mode, policy), Status::Normal);
        assert_eq!(classify(64.0, 80.0, mode, policy), Status::Warning);
        assert_eq!(classify(75.0, 80.0, mode, policy), Status::Warning);
        assert_eq!(classify(80.0, 80.0, mode, policy), Status::Warning);
        assert_eq!(classify(80.1, 80.0, mode, policy), Status::Critical);
    }

    #[test]
    fn greater_daily_bands() {
        let policy = WarningPolicy::Daily;
        let mode = ComparisonMode::Greater;
        assert_eq!(classify(71.9, 80.0, mode, policy), Status::Normal);
        assert_eq!(classify(72.0, 80.0, mode, policy), Status::Warning);
        assert_eq!(classify(81.0, 80.0, mode, policy), Status::Critical);
    }

    #[test]
    fn greater_equal_is_critical_at_threshold() {
        for policy in POLICIES {
            assert_eq!(
                classify(80.0, 80.0, ComparisonMode::GreaterEqual, policy),
                Status::Critical
            );
        }
        assert_eq!(
            classify(70.0, 80.0, ComparisonMode::GreaterEqual, WarningPolicy::Instant),
            Status::Warning
        );
        assert_eq!(
            classify(70.0, 80.0, ComparisonMode::GreaterEqual, WarningPolicy::Daily),
            Status::Normal
        );
    }

    #[test]
    fn less_bands() {
        let mode = ComparisonMode::Less;
        assert_eq!(classify(2.0, 3.0, mode, WarningPolicy::Instant), Status::Normal);
        assert_eq!(classify(3.0, 3.0, mode, WarningPolicy::Instant), Status::Warning);
        assert_eq!(classify(3.5, 3.0, mode, WarningPolicy::Instant), Status::Warning);
        assert_eq!(classify(3.7, 3.0, mode, WarningPolicy::Instant), Status::Critical);

        // Warning below 90 / 0.9
        assert_eq!(classify(99.0, 90.0, mode, WarningPolicy::Daily), Status::Warning);
        assert_eq!(classify(101.0, 90.0, mode, WarningPolicy::Daily), Status::Critical);
    }

    #[test]
    fn less_equal_bands() {
        let mode = ComparisonMode::LessEqual;
        assert_eq!(classify(60.0, 60.0, mode, WarningPolicy::Instant), Status::Normal);
        assert_eq!(classify(71.5, 60.0, mode, WarningPolicy::Instant), Status::Warning);
        assert_eq!(classify(72.5, 60.0, mode, WarningPolicy::Instant), Status::Critical);

        assert_eq!(classify(99.5, 90.0, mode, WarningPolicy::Daily), Status::Warning);
        assert_eq!(classify(101.0, 90.0, mode, WarningPolicy::Daily), Status::Critical);
    }

    #[test]
    fn equal_is_exact() {
        for policy in POLICIES {
            for threshold in [-5.0, 0.0, 1.0, 1e9] {
                assert_eq!(
                    classify(threshold, threshold, ComparisonMode::Equal, policy),
                    Status::Normal
                );
                for epsilon in [0.25, 0.5, 1000.0] {
                    assert_eq!(
                        classify(threshold + epsilon, threshold, ComparisonMode::Equal, policy),
                        Status::Critical
                    );
                }
            }
        }
    }

    #[test]
    fn not_equal_only_on_daily_policy() {
        let mode = ComparisonMode::NotEqual;
        assert_eq!(classify(1.0, 0.0, mode, WarningPolicy::Daily), Status::Normal);
        assert_eq!(classify(0.0, 0.0, mode, WarningPolicy::Daily), Status::Critical);

        // Judged as `greater` on the instant path
        assert_eq!(classify(1.0, 0.0, mode, WarningPolicy::Instant), Status::Critical);
        assert_eq!(classify(0.0, 0.0, mode, WarningPolicy::Instant), Status::Warning);
        assert_eq!(classify(-1.0, 0.0, mode, WarningPolicy::Instant), Status::Normal);
    }

    #[test]
    fn severity_never_improves_moving_in_bad_direction() {
        for policy in POLICIES {
            for threshold in [-40.0, 0.0, 3.0, 80.0] {
                let ascending = values();
                for mode in [
                    ComparisonMode::Greater,
                    ComparisonMode::GreaterEqual,
                    ComparisonMode::Less,
                    ComparisonMode::LessEqual,
                ] {
                    let statuses = ascending
                        .iter()
                        .map(|value| classify(*value, threshold, mode, policy))
                        .collect::<Vec<_>>();
                    assert!(
                        statuses.windows(2).all(|w| w[0] <= w[1]),
                        "{mode} with threshold {threshold} under {policy:?} is not monotonic"
                    );
                }

                // For equality the bad direction is away from the threshold on either side
                for value in ascending {
                    let status = classify(value, threshold, ComparisonMode::Equal, policy);
                    if value == threshold {
                        assert_eq!(status, Status::Normal);
                    } else {
                        assert_eq!(status, Status::Critical);
                    }
                }
            }
        }
    }

    #[test]
    fn classify_is_total() {
        for policy in POLICIES {
            for mode in ComparisonMode::ALL {
                for value in [f64::MIN, -1.0, 0.0, 1.0, f64::MAX, f64::NAN, f64::INFINITY] {
                    let status = classify(value, 1.0, mode, policy);
                    assert!(
                        matches!(status, Status::Normal | Status::Warning | Status::Critical),
                        "{value} against 1 ({mode}, {policy:?}) gave {status:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn nan_verdicts() {
        for policy in POLICIES {
            let nan = |mode| classify(f64::NAN, 80.0, mode, policy);

            // Every comparison with NaN is false
            assert_eq!(nan(ComparisonMode::Greater), Status::Normal);
            assert_eq!(nan(ComparisonMode::GreaterEqual), Status::Normal);
            assert_eq!(nan(ComparisonMode::Less), Status::Critical);
            assert_eq!(nan(ComparisonMode::LessEqual), Status::Critical);
            assert_eq!(nan(ComparisonMode::Equal), Status::Critical);
        }
        assert_eq!(
            classify(f64::NAN, 80.0, ComparisonMode::NotEqual, WarningPolicy::Daily),
            Status::Normal
        );
        assert_eq!(
            classify(f64::NAN, 80.0, ComparisonMode::NotEqual, WarningPolicy::Instant),
            Status::Normal
        );
    }
}
