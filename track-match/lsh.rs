//! Multi-probe locality-sensitive hashing for binary descriptors.
//!
//! Every table hashes a code by `key_size` randomly sampled bit positions.
//! A query probes its own bucket and every bucket whose key differs from it
//! in at most `multi_probe_level` bits, in every table.

use std::collections::{HashMap, HashSet};

use log::trace;
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use track_core::DescriptorRows;

use crate::config::MAX_MULTI_PROBE_LEVEL;
use crate::distance::{hamming, Hamming};
use crate::neighbors::{knn_exhaustive, KnnList, Neighbor, NeighborSearch, SearchOutcome};

struct LshTable {
    bits: Vec<usize>,
    buckets: HashMap<u32, Vec<usize>>,
}

impl LshTable {
    fn key(&self, code: &[u8]) -> u32 {
        self.bits.iter().enumerate().fold(0u32, |key, (slot, &bit)| {
            if (code[bit / 8] >> (bit % 8)) & 1 == 1 {
                key | (1 << slot)
            } else {
                key
            }
        })
    }
}

/// Hash tables over one reference set
pub struct LshIndex<'a> {
    rows: DescriptorRows<'a, u8>,
    tables: Vec<LshTable>,
    probes: Vec<u32>,
}

impl<'a> LshIndex<'a> {
    /// Build `table_number` tables; the key size is capped at the code length
    /// and the probe level at [`MAX_MULTI_PROBE_LEVEL`]
    pub fn build(
        rows: DescriptorRows<'a, u8>,
        table_number: usize,
        key_size: usize,
        multi_probe_level: usize,
        seed: u64,
    ) -> Self {
        let code_bits = rows.width() * 8;
        let key_size = key_size.min(code_bits).min(32);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let tables = (0..table_number)
            .map(|_| {
                let bits = if key_size == 0 {
                    Vec::new()
                } else {
                    sample(&mut rng, code_bits, key_size).into_vec()
                };
                let mut table = LshTable {
                    bits,
                    buckets: HashMap::new(),
                };
                for (index, code) in rows.iter().enumerate() {
                    let key = table.key(code);
                    table.buckets.entry(key).or_default().push(index);
                }
                table
            })
            .collect::<Vec<_>>();

        let probes = probe_masks(key_size, multi_probe_level.min(key_size).min(MAX_MULTI_PROBE_LEVEL));
        trace!(
            "lsh index: {} codes, {} tables, {}-bit keys, {} probes per table",
            rows.len(),
            tables.len(),
            key_size,
            probes.len()
        );

        Self { rows, tables, probes }
    }
}

/// XOR masks with at most `level` bits set among the low `key_size` bits,
/// ordered by number of flipped bits
fn probe_masks(key_size: usize, level: usize) -> Vec<u32> {
    let mut masks = vec![0u32];
    let mut frontier = vec![(0u32, 0usize)];
    for _ in 0..level {
        let mut next = Vec::new();
        for &(mask, lowest_free) in &frontier {
            for bit in lowest_free..key_size {
                let flipped = mask | (1 << bit);
                masks.push(flipped);
                next.push((flipped, bit + 1));
            }
        }
        frontier = next;
    }
    masks
}

impl NeighborSearch<u8> for LshIndex<'_> {
    fn search(&self, query: &[u8], k: usize) -> SearchOutcome {
        let mut best = KnnList::new(k);
        let mut seen = HashSet::new();

        for table in &self.tables {
            let key = table.key(query);
            for mask in &self.probes {
                let Some(bucket) = table.buckets.get(&(key ^ mask)) else {
                    continue;
                };
                for &index in bucket {
                    if seen.insert(index) {
                        let distance = hamming(query, self.rows.row(index)) as f32;
                        best.push(Neighbor { index, distance });
                    }
                }
            }
        }

        if best.len() < k.min(self.rows.len()) {
            return SearchOutcome {
                neighbors: knn_exhaustive::<Hamming>(query, self.rows, k),
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
