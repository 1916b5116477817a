use std::marker::PhantomData;

use track_core::DescriptorRows;

use crate::distance::Metric;
use crate::neighbors::{knn_exhaustive, NeighborSearch, SearchOutcome};

/// Exact search comparing the query against every reference row
pub struct BruteForce<'a, M: Metric> {
    rows: DescriptorRows<'a, M::Elem>,
    _metric: PhantomData<M>,
}

impl<'a, M: Metric> BruteForce<'a, M> {
    pub fn new(rows: DescriptorRows<'a, M::Elem>) -> Self {
        Self {
            rows,
            _metric: PhantomData,
        }
    }
}

impl<M: Metric> NeighborSearch<M::Elem> for BruteForce<'_, M> {
    fn search(&self, query: &[M::Elem], k: usize) -> SearchOutcome {
        SearchOutcome {
            neighbors: knn_exhaustive::<M>(query, self.rows, k),
            exhaustive_fallback: false,
        }
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}
