//! Non-maximum suppression over dense corner-response grids.
//!
//! ```
//! use track_core::{Pixel, ResponseGrid};
//! use track_nms::suppress;
//!
//! let mut grid = ResponseGrid::filled(3, 3, 0.0).unwrap();
//! grid.set(Pixel::new(1, 1), 200.0).unwrap();
//! let keypoints = suppress(&grid, 100.0, 0.0, 4.0).unwrap();
//! assert_eq!(keypoints.len(), 1);
//! ```

pub mod builder;
pub mod candidates;
pub mod config;
pub mod suppressor;

pub use builder::SuppressorBuilder;
pub use candidates::{collect_candidates, merge_candidates, MergeStats};
pub use config::{SuppressionConfig, DEFAULT_APERTURE, DEFAULT_MIN_RESPONSE};
pub use suppressor::{suppress, CornerSuppressor};
