use std::sync::Arc;
use std::time::Instant;

use log::{debug, warn};
use rayon::prelude::*;
use track_core::{
    build_thread_pool, DescriptorRows, Descriptors, FeatureSet, Match, MatchReport, MatchSet, NoopObserver,
    StageObserver, TrackError, TrackResult,
};

use crate::brute_force::BruteForce;
use crate::config::{IndexParams, MatcherConfig, SearchStrategy, SelectionPolicy};
use crate::distance::{Euclidean, Hamming};
use crate::kdtree::KdForest;
use crate::lsh::LshIndex;
use crate::neighbors::{NeighborSearch, SearchOutcome};

/// Why a source descriptor did or did not produce a match
#[derive(Debug, Clone, Copy, PartialEq)]
enum QueryOutcome {
    Matched(Match),
    RatioRejected,
    InsufficientNeighbors,
    CrossCheckRejected,
}

/// Pairs source descriptors with their nearest reference descriptors
#[derive(Clone)]
pub struct DescriptorMatcher {
    cfg: MatcherConfig,
    pool: Arc<rayon::ThreadPool>,
    observer: Arc<dyn StageObserver>,
}

impl std::fmt::Debug for DescriptorMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorMatcher").field("cfg", &self.cfg).finish_non_exhaustive()
    }
}

impl DescriptorMatcher {
    /// Validates the configuration and builds the worker pool
    pub fn new(cfg: MatcherConfig) -> TrackResult<Self> {
        cfg.validate()?;
        let pool = build_thread_pool(cfg.n_threads)?;
        Ok(Self {
            cfg,
            pool: Arc::new(pool),
            observer: Arc::new(NoopObserver),
        })
    }

    /// Report every pass to `observer`
    pub fn with_observer(mut self, observer: Arc<dyn StageObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.cfg
    }

    pub fn match_descriptors(&self, source: &Descriptors, reference: &Descriptors) -> TrackResult<MatchSet> {
        self.match_with_report(source, reference).map(|(matches, _)| matches)
    }

    /// Match keypoint sets; match indices refer to each set's keypoints
    pub fn match_features(&self, source: &FeatureSet, reference: &FeatureSet) -> TrackResult<MatchSet> {
        self.match_descriptors(source.descriptors(), reference.descriptors())
    }

    /// Match and also return the counters sent to the observer
    pub fn match_with_report(&self, source: &Descriptors, reference: &Descriptors) -> TrackResult<(MatchSet, MatchReport)> {
        let start = Instant::now();
        self.check_inputs(source, reference)?;

        let mut report = MatchReport {
            sources: source.len(),
            references: reference.len(),
            ..MatchReport::default()
        };
        let outcomes = if source.is_empty() || reference.is_empty() {
            Vec::new()
        } else {
            self.run_queries(source, reference)?
        };

        let mut matches = MatchSet::with_capacity(outcomes.len());
        for (outcome, fell_back) in outcomes {
            if fell_back {
                report.exhaustive_fallbacks += 1;
            }
            match outcome {
                QueryOutcome::Matched(m) => matches.push(m),
                QueryOutcome::RatioRejected => report.rejected_by_ratio += 1,
                QueryOutcome::InsufficientNeighbors => report.insufficient_neighbors += 1,
                QueryOutcome::CrossCheckRejected => report.rejected_by_cross_check += 1,
            }
        }
        report.emitted = matches.len();
        report.elapsed = start.elapsed();

        if report.exhaustive_fallbacks > 0 {
            warn!(
                "approximate index fell back to exhaustive search for {} of {} queries",
                report.exhaustive_fallbacks, report.sources
            );
        }
        debug!(
            "matched {} of {} source descriptors against {} references",
            report.emitted, report.sources, report.references
        );
        self.observer.matching_finished(&report);

        Ok((matches, report))
    }

    /// Up to `k` nearest references for every source descriptor, best first
    pub fn knn_match(&self, source: &Descriptors, reference: &Descriptors, k: usize) -> TrackResult<Vec<Vec<Match>>> {
        if k == 0 {
            return Err(TrackError::invalid_option("k", k));
        }
        self.check_inputs(source, reference)?;
        if reference.is_empty() {
            return Ok(vec![Vec::new(); source.len()]);
        }

        let lists = match (source, reference) {
            (Descriptors::Binary(s), Descriptors::Binary(r)) => match self.cfg.strategy {
                SearchStrategy::Approximate(IndexParams::Lsh {
                    table_number,
                    key_size,
                    multi_probe_level,
                }) => {
                    let index = LshIndex::build(r.rows(), table_number, key_size, multi_probe_level, self.cfg.seed);
                    self.knn_lists(s.rows(), &index, k)
                }
                _ => self.knn_lists(s.rows(), &BruteForce::<Hamming>::new(r.rows()), k),
            },
            (Descriptors::Float(s), Descriptors::Float(r)) => match self.cfg.strategy {
                SearchStrategy::Approximate(IndexParams::KdTree { trees, checks }) => {
                    let index = KdForest::build(r.rows(), trees, checks, self.cfg.seed);
                    self.knn_lists(s.rows(), &index, k)
                }
                _ => self.knn_lists(s.rows(), &BruteForce::<Euclidean>::new(r.rows()), k),
            },
            _ => return Err(self.mixed_encodings()),
        };
        Ok(lists)
    }

    fn check_inputs(&self, source: &Descriptors, reference: &Descriptors) -> TrackResult<()> {
        self.cfg.check_encoding(source.encoding())?;
        self.cfg.check_encoding(reference.encoding())?;
        if !source.is_empty() && !reference.is_empty() && source.width() != reference.width() {
            return Err(TrackError::DescriptorWidthMismatch {
                source_width: source.width(),
                reference_width: reference.width(),
            });
        }
        Ok(())
    }

    fn run_queries(&self, source: &Descriptors, reference: &Descriptors) -> TrackResult<Vec<(QueryOutcome, bool)>> {
        let outcomes = match (source, reference) {
            (Descriptors::Binary(s), Descriptors::Binary(r)) => match self.cfg.strategy {
                SearchStrategy::Approximate(IndexParams::Lsh {
                    table_number,
                    key_size,
                    multi_probe_level,
                }) => {
                    let index = LshIndex::build(r.rows(), table_number, key_size, multi_probe_level, self.cfg.seed);
                    self.select(s.rows(), &index, None)
                }
                _ => {
                    let forward = BruteForce::<Hamming>::new(r.rows());
                    let reverse = BruteForce::<Hamming>::new(s.rows());
                    let cross = self.cfg.cross_check.then_some((&reverse as &dyn NeighborSearch<u8>, r.rows()));
                    self.select(s.rows(), &forward, cross)
                }
            },
            (Descriptors::Float(s), Descriptors::Float(r)) => match self.cfg.strategy {
                SearchStrategy::Approximate(IndexParams::KdTree { trees, checks }) => {
                    let index = KdForest::build(r.rows(), trees, checks, self.cfg.seed);
                    self.select(s.rows(), &index, None)
                }
                _ => {
                    let forward = BruteForce::<Euclidean>::new(r.rows());
                    let reverse = BruteForce::<Euclidean>::new(s.rows());
                    let cross = self.cfg.cross_check.then_some((&reverse as &dyn NeighborSearch<f32>, r.rows()));
                    self.select(s.rows(), &forward, cross)
                }
            },
            _ => return Err(self.mixed_encodings()),
        };
        Ok(outcomes)
    }

    fn mixed_encodings(&self) -> TrackError {
        TrackError::IncompatibleOptions {
            option: "metric",
            value: self.cfg.metric.to_string(),
            reason: "source and reference encodings differ".to_string(),
        }
    }

    /// Query every source row on the owned pool and apply the selection policy
    fn select<T, I>(
        &self,
        source: DescriptorRows<'_, T>,
        index: &I,
        cross_check: Option<(&dyn NeighborSearch<T>, DescriptorRows<'_, T>)>,
    ) -> Vec<(QueryOutcome, bool)>
    where
        T: Copy + Sync,
        I: NeighborSearch<T>,
    {
        let selection = self.cfg.selection;
        let ratio = self.cfg.ratio_threshold;

        self.pool.install(|| {
            (0..source.len())
                .into_par_iter()
                .map(|source_idx| {
                    let SearchOutcome {
                        neighbors,
                        exhaustive_fallback,
                    } = index.search(source.row(source_idx), selection.k());

                    let outcome = match (selection, neighbors.as_slice()) {
                        (SelectionPolicy::NearestOnly, [best, ..]) => {
                            let mutual = cross_check.map_or(true, |(reverse, reference)| {
                                reverse
                                    .search(reference.row(best.index), 1)
                                    .neighbors
                                    .first()
                                    .is_some_and(|back| back.index == source_idx)
                            });
                            if mutual {
                                QueryOutcome::Matched(Match {
                                    source_idx,
                                    reference_idx: best.index,
                                    distance: best.distance,
                                })
                            } else {
                                QueryOutcome::CrossCheckRejected
                            }
                        }
                        (SelectionPolicy::RatioTest, [best, second, ..]) => {
                            if best.distance < ratio * second.distance {
                                QueryOutcome::Matched(Match {
                                    source_idx,
                                    reference_idx: best.index,
                                    distance: best.distance,
                                })
                            } else {
                                QueryOutcome::RatioRejected
                            }
                        }
                        _ => QueryOutcome::InsufficientNeighbors,
                    };
                    (outcome, exhaustive_fallback)
                })
                .collect()
        })
    }

    fn knn_lists<T, I>(&self, source: DescriptorRows<'_, T>, index: &I, k: usize) -> Vec<Vec<Match>>
    where
        T: Copy + Sync,
        I: NeighborSearch<T>,
    {
        self.pool.install(|| {
            (0..source.len())
                .into_par_iter()
                .map(|source_idx| {
                    index
                        .search(source.row(source_idx), k)
                        .neighbors
                        .into_iter()
                        .map(|n| Match {
                            source_idx,
                            reference_idx: n.index,
                            distance: n.distance,
                        })
                        .collect()
                })
                .collect()
        })
    }
}

/// One-shot matching with an explicit configuration.
///
/// Builds a fresh thread pool on every call; callers matching repeatedly
/// should build a [`DescriptorMatcher`] once and reuse it.
pub fn match_descriptors(source: &Descriptors, reference: &Descriptors, cfg: &MatcherConfig) -> TrackResult<MatchSet> {
    DescriptorMatcher::new(cfg.clone())?.match_descriptors(source, reference)
}
