//! Stage reports and the observer that receives them.
//!
//! Components never print or keep global counters; whoever builds them can
//! hand in a [`StageObserver`] and decide what to do with each report.

use std::time::Duration;

/// Outcome of one suppression pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuppressionReport {
    pub rows: usize,
    pub cols: usize,
    /// Cells above the response threshold
    pub candidates: usize,
    /// Candidates that took the place of a weaker overlapping keypoint
    pub replaced: usize,
    /// Candidates discarded because they overlapped a stronger keypoint
    pub dropped: usize,
    pub kept: usize,
    pub elapsed: Duration,
}

/// Outcome of one matching pass.
///
/// `emitted + rejected_by_ratio + insufficient_neighbors + rejected_by_cross_check`
/// always equals `sources` when both sides are non-empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchReport {
    pub sources: usize,
    pub references: usize,
    pub emitted: usize,
    pub rejected_by_ratio: usize,
    pub insufficient_neighbors: usize,
    pub rejected_by_cross_check: usize,
    /// Queries the approximate index answered by exhaustive scan
    pub exhaustive_fallbacks: usize,
    pub elapsed: Duration,
}

impl MatchReport {
    pub fn unmatched(&self) -> usize {
        self.rejected_by_ratio + self.insufficient_neighbors + self.rejected_by_cross_check
    }
}

/// Receiver for stage reports. All methods default to doing nothing.
pub trait StageObserver: Send + Sync {
    fn suppression_finished(&self, _report: &SuppressionReport) {}

    fn matching_finished(&self, _report: &MatchReport) {}
}

/// Discards every report
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl StageObserver for NoopObserver {}

/// Forwards reports to the `log` facade at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl StageObserver for LogObserver {
    fn suppression_finished(&self, report: &SuppressionReport) {
        log::info!(
            "suppression on {}x{}: {} candidates -> {} keypoints ({} replaced, {} dropped) in {:.2?}",
            report.rows,
            report.cols,
            report.candidates,
            report.kept,
            report.replaced,
            report.dropped,
            report.elapsed
        );
    }

    fn matching_finished(&self, report: &MatchReport) {
        log::info!(
            "matching {} against {}: {} matches, {} ratio-rejected, {} short of neighbours, {} cross-check rejected in {:.2?}",
            report.sources,
            report.references,
            report.emitted,
            report.rejected_by_ratio,
            report.insufficient_neighbors,
            report.rejected_by_cross_check,
            report.elapsed
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_sum() {
        let report = MatchReport {
            sources: 10,
            references: 12,
            emitted: 6,
            rejected_by_ratio: 3,
            insufficient_neighbors: 1,
            ..Default::default()
        };
        assert_eq!(report.unmatched(), 4);
        assert_eq!(report.emitted + report.unmatched(), report.sources);
    }

    #[test]
    fn test_log_observer_does_not_panic() {
        let _ = env_logger::builder().is_test(true).try_init();
        let observer = LogObserver;
        observer.suppression_finished(&SuppressionReport::default());
        observer.matching_finished(&MatchReport::default());
        NoopObserver.matching_finished(&MatchReport::default());
    }
}
