use std::cmp::Ordering;

use track_core::DescriptorRows;

use crate::distance::Metric;

/// One reference descriptor found for a query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f32,
}

impl Neighbor {
    /// Closer first; equal distances go to the lower index
    pub fn cmp_rank(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.index.cmp(&other.index))
    }
}

/// The `k` best neighbours seen so far, kept sorted by rank
#[derive(Debug, Clone)]
pub(crate) struct KnnList {
    k: usize,
    items: Vec<Neighbor>,
}

impl KnnList {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            items: Vec::with_capacity(k + 1),
        }
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.k
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Distance a newcomer has to beat once the list is full
    pub fn worst_distance(&self) -> Option<f32> {
        if self.is_full() {
            self.items.last().map(|n| n.distance)
        } else {
            None
        }
    }

    pub fn push(&mut self, candidate: Neighbor) {
        if self.k == 0 {
            return;
        }
        if self.is_full() {
            match self.items.last() {
                Some(last) if candidate.cmp_rank(last) == Ordering::Less => {}
                _ => return,
            }
        }
        let pos = self
            .items
            .partition_point(|n| n.cmp_rank(&candidate) == Ordering::Less);
        self.items.insert(pos, candidate);
        self.items.truncate(self.k);
    }

    pub fn into_vec(self) -> Vec<Neighbor> {
        self.items
    }
}

/// Result of one k-nearest query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOutcome {
    /// Up to `k` neighbours, best first
    pub neighbors: Vec<Neighbor>,
    /// The index had to scan every reference to answer
    pub exhaustive_fallback: bool,
}

/// k-nearest search over a fixed reference set
pub trait NeighborSearch<T>: Send + Sync {
    fn search(&self, query: &[T], k: usize) -> SearchOutcome;

    /// Number of indexed reference descriptors
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Scan every reference row in index order
pub fn knn_exhaustive<M: Metric>(query: &[M::Elem], reference: DescriptorRows<'_, M::Elem>, k: usize) -> Vec<Neighbor> {
    let mut best = KnnList::new(k);
    for (index, row) in reference.iter().enumerate() {
        let distance = M::distance(query, row);
        if best.worst_distance().is_some_and(|worst| distance > worst) {
            continue;
        }
        best.push(Neighbor { index, distance });
    }
    best.into_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::Euclidean;

    fn n(index: usize, distance: f32) -> Neighbor {
        Neighbor { index, distance }
    }

    #[test]
    fn test_keeps_k_best_sorted() {
        let mut list = KnnList::new(2);
        for c in [n(0, 5.0), n(1, 1.0), n(2, 3.0), n(3, 0.5)] {
            list.push(c);
        }
        assert_eq!(list.into_vec(), vec![n(3, 0.5), n(1, 1.0)]);
    }

    #[test]
    fn test_ties_prefer_lower_index() {
        let mut list = KnnList::new(1);
        list.push(n(4, 2.0));
        list.push(n(2, 2.0));
        list.push(n(7, 2.0));
        assert_eq!(list.into_vec(), vec![n(2, 2.0)]);
    }

    #[test]
    fn test_worst_distance_only_when_full() {
        let mut list = KnnList::new(2);
        list.push(n(0, 1.0));
        assert_eq!(list.worst_distance(), None);
        list.push(n(1, 4.0));
        assert_eq!(list.worst_distance(), Some(4.0));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_exhaustive_scan() {
        let data = [0.0, 0.0, 3.0, 4.0, 1.0, 0.0, 1.0, 0.0];
        let rows = DescriptorRows::new(&data, 2);
        let found = knn_exhaustive::<Euclidean>(&[0.0, 0.0], rows, 3);
        assert_eq!(found, vec![n(0, 0.0), n(2, 1.0), n(3, 1.0)]);
    }

    #[test]
    fn test_exhaustive_fewer_rows_than_k() {
        let data = [1.0f32, 2.0];
        let rows = DescriptorRows::new(&data, 2);
        assert_eq!(knn_exhaustive::<Euclidean>(&[1.0, 2.0], rows, 2).len(), 1);
    }
}
