use std::sync::Arc;

use track_core::{StageObserver, TrackResult};

use crate::config::{IndexParams, MatcherConfig, MetricFamily, SearchStrategy, SelectionPolicy};
use crate::matcher::DescriptorMatcher;

/// Builder for creating a `DescriptorMatcher`
#[derive(Clone)]
pub struct MatcherBuilder {
    config: MatcherConfig,
    default_index: bool,
    observer: Option<Arc<dyn StageObserver>>,
}

impl Default for MatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MatcherBuilder {
    /// Binary brute-force nearest-only matching
    pub fn new() -> Self {
        Self {
            config: MatcherConfig::default(),
            default_index: false,
            observer: None,
        }
    }

    pub fn metric(mut self, metric: MetricFamily) -> Self {
        self.config.metric = metric;
        self
    }

    pub fn brute_force(mut self) -> Self {
        self.config.strategy = SearchStrategy::BruteForce;
        self.default_index = false;
        self
    }

    /// Approximate search with the default index for the final metric
    pub fn approximate(mut self) -> Self {
        self.default_index = true;
        self
    }

    /// Approximate search with explicit index parameters
    pub fn index(mut self, params: IndexParams) -> Self {
        self.config.strategy = SearchStrategy::Approximate(params);
        self.default_index = false;
        self
    }

    pub fn selection(mut self, selection: SelectionPolicy) -> Self {
        self.config.selection = selection;
        self
    }

    /// Ratio-test selection with the given threshold
    pub fn ratio_test(mut self, ratio_threshold: f32) -> Self {
        self.config.selection = SelectionPolicy::RatioTest;
        self.config.ratio_threshold = ratio_threshold;
        self
    }

    pub fn cross_check(mut self, enabled: bool) -> Self {
        self.config.cross_check = enabled;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn n_threads(mut self, n_threads: usize) -> Self {
        self.config.n_threads = n_threads;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn StageObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Build the `DescriptorMatcher`
    pub fn build(self) -> TrackResult<DescriptorMatcher> {
        let observer = self.observer.clone();
        let matcher = DescriptorMatcher::new(self.to_config())?;
        Ok(match observer {
            Some(observer) => matcher.with_observer(observer),
            None => matcher,
        })
    }

    pub fn summary(&self) -> String {
        self.clone().to_config().summary()
    }

    /// Create a builder from an existing `MatcherConfig`
    pub fn from_config(config: MatcherConfig) -> Self {
        Self {
            config,
            default_index: false,
            observer: None,
        }
    }

    pub fn to_config(self) -> MatcherConfig {
        let mut config = self.config;
        if self.default_index {
            config.strategy = SearchStrategy::Approximate(IndexParams::for_metric(config.metric));
        }
        config
    }
}
