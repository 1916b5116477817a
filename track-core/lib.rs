//! Shared types for the keypoint tracking workspace.
//!
//! `track-nms` turns a dense [`ResponseGrid`] into sparse [`Keypoint`]s and
//! `track-match` pairs up [`Descriptors`] from two images into a [`MatchSet`].
//! Both report to an injected [`StageObserver`] instead of global state.

pub mod descriptors;
pub mod error;
pub mod grid;
pub mod keypoint;
pub mod observe;

pub use descriptors::{BinaryDescriptors, DescriptorRows, Descriptors, Encoding, FeatureSet, FloatDescriptors};
pub use error::{ErrorKind, TrackError, TrackResult};
pub use grid::{Pixel, ResponseGrid};
pub use keypoint::Keypoint;
pub use observe::{LogObserver, MatchReport, NoopObserver, StageObserver, SuppressionReport};

/// Correspondence between a source descriptor and a reference descriptor
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Match {
    pub source_idx: usize,
    pub reference_idx: usize,
    pub distance: f32,
}

/// Matches in source order
pub type MatchSet = Vec<Match>;

/// Default worker count for parallel stages
pub fn default_threads() -> usize {
    num_cpus::get().max(1)
}

/// Build a rayon pool owned by the caller rather than the global one
pub fn build_thread_pool(n_threads: usize) -> TrackResult<rayon::ThreadPool> {
    if n_threads == 0 {
        return Err(TrackError::invalid_option("n_threads", n_threads));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build()
        .map_err(TrackError::from)
}
