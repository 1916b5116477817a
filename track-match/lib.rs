//! Descriptor matching between two images.
//!
//! Supports Hamming and Euclidean metrics, brute-force or approximate search
//! (multi-probe LSH for binary codes, a randomized kd-forest for float
//! vectors) and nearest-only or ratio-test selection.
//!
//! ```
//! use track_core::{Descriptors, FloatDescriptors};
//! use track_match::{match_descriptors, MatcherConfig};
//!
//! let source: Descriptors = FloatDescriptors::from_rows(&[vec![0.0, 0.0], vec![100.0, 0.0]]).unwrap().into();
//! let reference: Descriptors =
//!     FloatDescriptors::from_rows(&[vec![0.0, 0.0], vec![105.0, 0.0], vec![100.0, 5.01]]).unwrap().into();
//!
//! let cfg = MatcherConfig::from_tags("DES_HOG", "MAT_BF", "SEL_KNN").unwrap();
//! let matches = match_descriptors(&source, &reference, &cfg).unwrap();
//! assert_eq!(matches.len(), 1);
//! assert_eq!(matches[0].reference_idx, 0);
//! ```

pub mod brute_force;
pub mod builder;
pub mod config;
pub mod distance;
pub mod kdtree;
pub mod lsh;
pub mod matcher;
pub mod neighbors;

pub use brute_force::BruteForce;
pub use builder::MatcherBuilder;
pub use config::{
    IndexParams, MatcherConfig, MetricFamily, SearchStrategy, SelectionPolicy, StrategyKind, DEFAULT_RATIO_THRESHOLD,
    DEFAULT_SEED, MAX_MULTI_PROBE_LEVEL,
};
pub use distance::{euclidean, hamming, Euclidean, Hamming, Metric};
pub use kdtree::KdForest;
pub use lsh::LshIndex;
pub use matcher::{match_descriptors, DescriptorMatcher};
pub use neighbors::{knn_exhaustive, Neighbor, NeighborSearch, SearchOutcome};
