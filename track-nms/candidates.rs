use log::trace;
use rayon::prelude::*;
use track_core::{Keypoint, Pixel, ResponseGrid};

/// Grids smaller than this are scanned on the calling thread
const PARALLEL_MIN_CELLS: usize = 64 * 64;

/// Cells above `min_response` in row-major order.
///
/// Rows are scanned in parallel on large grids; the indexed collect keeps
/// row order so the result is identical to a sequential scan.
pub fn collect_candidates(grid: &ResponseGrid, min_response: f32) -> Vec<(Pixel, f32)> {
    let cols = grid.cols();
    if grid.rows() * cols < PARALLEL_MIN_CELLS {
        return grid.cells_above(min_response).collect();
    }

    grid.as_slice()
        .par_chunks(cols)
        .enumerate()
        .flat_map_iter(|(row, values)| {
            values
                .iter()
                .enumerate()
                .filter(move |&(_, &v)| v > min_response)
                .map(move |(col, &v)| (Pixel::new(row, col), v))
        })
        .collect()
}

/// Counters from [`merge_candidates`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub replaced: usize,
    pub dropped: usize,
}

/// Order-dependent greedy merge of candidates into a keypoint list.
///
/// Each candidate walks the accepted list in order. The first overlapping
/// keypoint it strictly outscores is overwritten in place and the walk stops.
/// A candidate that overlaps something but outscores nothing is dropped; one
/// that overlaps nothing is appended.
pub fn merge_candidates<I>(candidates: I, max_overlap: f32, size: f32) -> (Vec<Keypoint>, MergeStats)
where
    I: IntoIterator<Item = (Pixel, f32)>,
{
    let mut keypoints: Vec<Keypoint> = Vec::new();
    let mut stats = MergeStats::default();

    for (pixel, response) in candidates {
        let candidate = Keypoint::at_pixel(pixel, size, response);
        let mut overlapped = false;
        let mut replaced = false;

        for existing in keypoints.iter_mut() {
            if candidate.overlap(existing) > max_overlap {
                overlapped = true;
                if candidate.response > existing.response {
                    trace!(
                        "({}, {}) r={} replaces ({}, {}) r={}",
                        candidate.x, candidate.y, candidate.response,
                        existing.x, existing.y, existing.response
                    );
                    *existing = candidate;
                    replaced = true;
                    break;
                }
            }
        }

        match (overlapped, replaced) {
            (false, _) => keypoints.push(candidate),
            (true, true) => stats.replaced += 1,
            (true, false) => stats.dropped += 1,
        }
    }

    (keypoints, stats)
}
