use std::sync::Arc;

use track_core::{StageObserver, TrackResult};

use crate::config::SuppressionConfig;
use crate::suppressor::CornerSuppressor;

/// Builder for creating a `CornerSuppressor`
#[derive(Clone)]
pub struct SuppressorBuilder {
    config: SuppressionConfig,
    observer: Option<Arc<dyn StageObserver>>,
}

impl Default for SuppressorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SuppressorBuilder {
    /// Create a new builder with the Harris defaults
    pub fn new() -> Self {
        Self {
            config: SuppressionConfig::default(),
            observer: None,
        }
    }

    /// Set the response threshold (exclusive)
    pub fn min_response(mut self, min_response: f32) -> Self {
        self.config.min_response = min_response;
        self
    }

    /// Set the tolerated overlap fraction
    pub fn max_overlap(mut self, max_overlap: f32) -> Self {
        self.config.max_overlap = max_overlap;
        self
    }

    /// Set the keypoint diameter directly
    pub fn size(mut self, size: f32) -> Self {
        self.config.size = size;
        self
    }

    /// Derive the keypoint diameter from the detector aperture
    pub fn aperture(mut self, aperture: usize) -> Self {
        self.config.size = (2 * aperture) as f32;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn StageObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Apply the Harris preset, keeping any observer
    pub fn preset_harris(mut self) -> Self {
        self.config = SuppressionConfig::harris_preset();
        self
    }

    /// Build the `CornerSuppressor`
    pub fn build(self) -> TrackResult<CornerSuppressor> {
        let suppressor = CornerSuppressor::new(self.config)?;
        Ok(match self.observer {
            Some(observer) => suppressor.with_observer(observer),
            None => suppressor,
        })
    }

    pub fn summary(&self) -> String {
        self.config.summary()
    }

    /// Create a builder from an existing `SuppressionConfig`
    pub fn from_config(config: SuppressionConfig) -> Self {
        Self { config, observer: None }
    }

    pub fn to_config(self) -> SuppressionConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use track_core::{ErrorKind, LogObserver, ResponseGrid};

    #[test]
    fn test_builder_defaults_to_harris() {
        let cfg = SuppressorBuilder::new().to_config();
        assert_eq!(cfg, SuppressionConfig::harris_preset());
    }

    #[test]
    fn test_fluent_setters() {
        let cfg = SuppressorBuilder::new()
            .min_response(20.0)
            .max_overlap(0.25)
            .aperture(2)
            .to_config();
        assert_eq!((cfg.min_response, cfg.max_overlap, cfg.size), (20.0, 0.25, 4.0));
    }

    #[test]
    fn test_build_rejects_invalid() {
        let err = SuppressorBuilder::new().max_overlap(2.0).build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn test_build_with_observer() {
        let _ = env_logger::builder().is_test(true).try_init();
        let suppressor = SuppressorBuilder::new()
            .min_response(0.5)
            .size(4.0)
            .observer(Arc::new(LogObserver))
            .build()
            .unwrap();
        let grid = ResponseGrid::from_rows(vec![vec![0.0, 1.0, 0.0]]).unwrap();
        assert_eq!(suppressor.suppress(&grid).unwrap().len(), 1);
        assert!(SuppressorBuilder::from_config(suppressor.config().clone()).summary().contains("size=4"));
    }
}
