use std::sync::Arc;
use std::time::Instant;

use log::debug;
use track_core::{Keypoint, NoopObserver, ResponseGrid, StageObserver, SuppressionReport, TrackResult};

use crate::candidates::{collect_candidates, merge_candidates};
use crate::config::SuppressionConfig;

/// Turns a dense corner-response grid into sparse keypoints
#[derive(Clone)]
pub struct CornerSuppressor {
    cfg: SuppressionConfig,
    observer: Arc<dyn StageObserver>,
}

impl std::fmt::Debug for CornerSuppressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CornerSuppressor").field("cfg", &self.cfg).finish_non_exhaustive()
    }
}

impl CornerSuppressor {
    /// Creates a suppressor with validation
    pub fn new(cfg: SuppressionConfig) -> TrackResult<Self> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            observer: Arc::new(NoopObserver),
        })
    }

    /// Report every pass to `observer`
    pub fn with_observer(mut self, observer: Arc<dyn StageObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn suppress(&self, grid: &ResponseGrid) -> TrackResult<Vec<Keypoint>> {
        self.suppress_with_report(grid).map(|(keypoints, _)| keypoints)
    }

    /// Suppress and also return the counters sent to the observer
    pub fn suppress_with_report(&self, grid: &ResponseGrid) -> TrackResult<(Vec<Keypoint>, SuppressionReport)> {
        let start = Instant::now();
        let candidates = collect_candidates(grid, self.cfg.min_response);
        let n_candidates = candidates.len();
        let (keypoints, stats) = merge_candidates(candidates, self.cfg.max_overlap, self.cfg.size);

        let report = SuppressionReport {
            rows: grid.rows(),
            cols: grid.cols(),
            candidates: n_candidates,
            replaced: stats.replaced,
            dropped: stats.dropped,
            kept: keypoints.len(),
            elapsed: start.elapsed(),
        };
        debug!(
            "suppressed {} candidates to {} keypoints on {}x{}",
            report.candidates, report.kept, report.rows, report.cols
        );
        self.observer.suppression_finished(&report);

        Ok((keypoints, report))
    }

    /// Get suppression configuration
    pub fn config(&self) -> &SuppressionConfig {
        &self.cfg
    }
}

/// One-shot suppression with explicit parameters
pub fn suppress(grid: &ResponseGrid, min_response: f32, max_overlap: f32, size: f32) -> TrackResult<Vec<Keypoint>> {
    CornerSuppressor::new(SuppressionConfig::new(min_response, max_overlap, size))?.suppress(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use track_core::{ErrorKind, Pixel};

    #[derive(Default)]
    struct RecordingObserver {
        reports: Mutex<Vec<SuppressionReport>>,
    }

    impl StageObserver for RecordingObserver {
        fn suppression_finished(&self, report: &SuppressionReport) {
            self.reports.lock().unwrap().push(report.clone());
        }
    }

    fn grid_with(rows: usize, cols: usize, cells: &[(usize, usize, f32)]) -> ResponseGrid {
        let mut grid = ResponseGrid::filled(rows, cols, 0.0).unwrap();
        for &(r, c, v) in cells {
            grid.set(Pixel::new(r, c), v).unwrap();
        }
        grid
    }

    #[test]
    fn test_single_centre_peak() {
        let grid = grid_with(3, 3, &[(1, 1, 200.0)]);
        let kps = suppress(&grid, 100.0, 0.0, 4.0).unwrap();
        assert_eq!(kps, vec![Keypoint::new(1.0, 1.0, 4.0, 200.0)]);
    }

    #[test]
    fn test_stronger_neighbour_survives() {
        let grid = grid_with(5, 5, &[(2, 2, 150.0), (2, 3, 200.0)]);
        let kps = suppress(&grid, 100.0, 0.0, 6.0).unwrap();
        assert_eq!(kps.len(), 1);
        assert_eq!(kps[0].response, 200.0);
        assert_eq!((kps[0].x, kps[0].y), (3.0, 2.0));

        // Same pair in the opposite scan order
        let grid = grid_with(5, 5, &[(2, 2, 200.0), (2, 3, 150.0)]);
        let kps = suppress(&grid, 100.0, 0.0, 6.0).unwrap();
        assert_eq!(kps.len(), 1);
        assert_eq!((kps[0].x, kps[0].response), (2.0, 200.0));
    }

    #[test]
    fn test_all_below_threshold() {
        let grid = ResponseGrid::filled(10, 10, 100.0).unwrap();
        assert!(suppress(&grid, 100.0, 0.0, 6.0).unwrap().is_empty());
    }

    #[test]
    fn test_separated_peaks_all_kept() {
        let grid = grid_with(40, 40, &[(5, 5, 150.0), (5, 30, 180.0), (30, 5, 210.0), (30, 30, 240.0)]);
        let kps = suppress(&grid, 100.0, 0.0, 6.0).unwrap();
        let positions: Vec<_> = kps.iter().map(|k| (k.y as usize, k.x as usize)).collect();
        assert_eq!(positions, vec![(5, 5), (5, 30), (30, 5), (30, 30)]);
    }

    #[test]
    fn test_full_overlap_tolerance_keeps_everything() {
        let grid = ResponseGrid::filled(4, 4, 150.0).unwrap();
        let kps = suppress(&grid, 100.0, 1.0, 6.0).unwrap();
        assert_eq!(kps.len(), 16);
    }

    #[test]
    fn test_partial_overlap_tolerance() {
        // size 6: neighbours one pixel apart overlap by about 0.65
        let grid = grid_with(1, 20, &[(0, 0, 150.0), (0, 1, 140.0), (0, 5, 130.0)]);
        let strict = suppress(&grid, 100.0, 0.0, 6.0).unwrap();
        assert_eq!(strict.len(), 1);
        let loose = suppress(&grid, 100.0, 0.7, 6.0).unwrap();
        assert_eq!(loose.len(), 3);
    }

    #[test]
    fn test_deterministic() {
        let cells: Vec<_> = (0..30).map(|i| ((i * 7) % 25, (i * 11) % 25, 100.0 + ((i * 13) % 50) as f32)).collect();
        let grid = grid_with(25, 25, &cells);
        let first = suppress(&grid, 100.0, 0.0, 6.0).unwrap();
        let second = suppress(&grid, 100.0, 0.0, 6.0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_parameters() {
        let grid = ResponseGrid::filled(3, 3, 0.0).unwrap();
        let err = suppress(&grid, 100.0, 0.0, -1.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn test_observer_receives_report() {
        let observer = Arc::new(RecordingObserver::default());
        let suppressor = CornerSuppressor::new(SuppressionConfig::new(100.0, 0.0, 6.0))
            .unwrap()
            .with_observer(observer.clone());
        let grid = grid_with(5, 5, &[(2, 2, 150.0), (2, 3, 200.0), (0, 0, 50.0)]);
        suppressor.suppress(&grid).unwrap();

        let reports = observer.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].candidates, 2);
        assert_eq!(reports[0].replaced, 1);
        assert_eq!(reports[0].kept, 1);
        assert_eq!((reports[0].rows, reports[0].cols), (5, 5));
    }

    #[test]
    fn test_normalized_response_pipeline() {
        // Raw responses on an arbitrary scale, normalized to 0..255 first
        let grid = grid_with(9, 9, &[(4, 4, 0.02), (1, 1, 0.001)]);
        let norm = grid.normalize_min_max(0.0, 255.0);
        let kps = CornerSuppressor::new(SuppressionConfig::harris_preset())
            .unwrap()
            .suppress(&norm)
            .unwrap();
        assert_eq!(kps.len(), 1);
        assert_eq!((kps[0].x, kps[0].y, kps[0].size), (4.0, 4.0, 6.0));
    }
}
