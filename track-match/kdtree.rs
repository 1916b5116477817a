//! Randomized kd-tree forest for float descriptors.
//!
//! Each tree splits on a dimension drawn at random from the few with the
//! highest variance, at the mean value. Queries descend all trees together
//! best-bin-first from one priority queue and stop once `checks` leaf points
//! have been compared and enough neighbours were found, or when no pending
//! branch can beat the current k-th distance.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use track_core::DescriptorRows;

use crate::distance::{euclidean, Euclidean};
use crate::neighbors::{knn_exhaustive, KnnList, Neighbor, NeighborSearch, SearchOutcome};

const LEAF_SIZE: usize = 4;
/// Split dimension is drawn from this many highest-variance dimensions
const RAND_DIM: usize = 5;
/// Points used to estimate mean and variance at each node
const SAMPLE_MEAN: usize = 100;

#[derive(Debug)]
enum KdNode {
    Leaf(Vec<usize>),
    Split {
        dim: usize,
        value: f32,
        left: usize,
        right: usize,
    },
}

#[derive(Debug)]
struct KdTree {
    nodes: Vec<KdNode>,
    root: usize,
}

impl KdTree {
    fn build(rows: DescriptorRows<'_, f32>, rng: &mut ChaCha8Rng) -> Self {
        let mut nodes = Vec::new();
        let indices: Vec<usize> = (0..rows.len()).collect();
        let root = Self::build_node(&mut nodes, rows, indices, rng);
        Self { nodes, root }
    }

    fn build_node(nodes: &mut Vec<KdNode>, rows: DescriptorRows<'_, f32>, mut indices: Vec<usize>, rng: &mut ChaCha8Rng) -> usize {
        if indices.len() <= LEAF_SIZE {
            nodes.push(KdNode::Leaf(indices));
            return nodes.len() - 1;
        }

        let (dim, mean) = choose_split(rows, &indices, rng);
        let (mut left, mut right): (Vec<usize>, Vec<usize>) =
            indices.iter().partition(|&&i| rows.row(i)[dim] < mean);
        let mut value = mean;

        if left.is_empty() || right.is_empty() {
            // Mean split degenerated; halve at the median instead
            indices.sort_by(|&a, &b| rows.row(a)[dim].total_cmp(&rows.row(b)[dim]).then(a.cmp(&b)));
            right = indices.split_off(indices.len() / 2);
            left = indices;
            value = rows.row(right[0])[dim];
        }

        let left = Self::build_node(nodes, rows, left, rng);
        let right = Self::build_node(nodes, rows, right, rng);
        nodes.push(KdNode::Split { dim, value, left, right });
        nodes.len() - 1
    }
}

/// Random high-variance dimension and its mean over a sample of `indices`
fn choose_split(rows: DescriptorRows<'_, f32>, indices: &[usize], rng: &mut ChaCha8Rng) -> (usize, f32) {
    let dims = rows.width();
    let sample = &indices[..indices.len().min(SAMPLE_MEAN)];
    let n = sample.len() as f32;

    let mut mean = vec![0.0f32; dims];
    for &i in sample {
        for (m, v) in mean.iter_mut().zip(rows.row(i)) {
            *m += v;
        }
    }
    mean.iter_mut().for_each(|m| *m /= n);

    let mut variance = vec![0.0f32; dims];
    for &i in sample {
        for ((var, v), m) in variance.iter_mut().zip(rows.row(i)).zip(&mean) {
            let d = v - m;
            *var += d * d;
        }
    }

    let mut order: Vec<usize> = (0..dims).collect();
    order.sort_by(|&a, &b| variance[b].total_cmp(&variance[a]).then(a.cmp(&b)));
    let top = RAND_DIM.min(dims);
    let dim = order[rng.gen_range(0..top)];
    (dim, mean[dim])
}

/// Pending subtree with a lower bound on its distance to the query
#[derive(Debug, Clone, Copy)]
struct Branch {
    bound: f32,
    tree: usize,
    node: usize,
}

impl PartialEq for Branch {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Branch {}

impl PartialOrd for Branch {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Branch {
    // Reversed so the max-heap pops the closest branch first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .bound
            .total_cmp(&self.bound)
            .then(other.tree.cmp(&self.tree))
            .then(other.node.cmp(&self.node))
    }
}

/// Forest of randomized kd-trees over one reference set
pub struct KdForest<'a> {
    rows: DescriptorRows<'a, f32>,
    trees: Vec<KdTree>,
    checks: usize,
}

impl<'a> KdForest<'a> {
    pub fn build(rows: DescriptorRows<'a, f32>, trees: usize, checks: usize, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let trees = if rows.is_empty() {
            Vec::new()
        } else {
            (0..trees).map(|_| KdTree::build(rows, &mut rng)).collect()
        };
        Self { rows, trees, checks }
    }
}

impl NeighborSearch<f32> for KdForest<'_> {
    fn search(&self, query: &[f32], k: usize) -> SearchOutcome {
        let wanted = k.min(self.rows.len());
        let mut best = KnnList::new(k);
        let mut seen = HashSet::new();
        let mut checked = 0usize;
        let mut heap: BinaryHeap<Branch> = (0..self.trees.len())
            .map(|tree| Branch {
                bound: 0.0,
                tree,
                node: self.trees[tree].root,
            })
            .collect();

        while let Some(branch) = heap.pop() {
            if best.worst_distance().is_some_and(|worst| branch.bound > worst) {
                break;
            }
            if checked >= self.checks && best.len() >= wanted {
                break;
            }

            let nodes = &self.trees[branch.tree].nodes;
            let mut node = branch.node;
            while let KdNode::Split { dim, value, left, right } = nodes[node] {
                let diff = query[dim] - value;
                let (near, far) = if diff < 0.0 { (left, right) } else { (right, left) };
                heap.push(Branch {
                    bound: branch.bound.max(diff.abs()),
                    tree: branch.tree,
                    node: far,
                });
                node = near;
            }

            if let KdNode::Leaf(points) = &nodes[node] {
                for &index in points {
                    if seen.insert(index) {
                        let distance = euclidean(query, self.rows.row(index));
                        best.push(Neighbor { index, distance });
                        checked += 1;
                    }
                }
            }
        }

        if best.len() < wanted {
            return SearchOutcome {
                neighbors: knn_exhaustive::<Euclidean>(query, self.rows, k),
                exhaustive_fallback: true,
            };
        }
        SearchOutcome {
            neighbors: best.into_vec(),
            exhaustive_fallback: false,
        }
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}
