use proptest::prelude::*;
use track_core::{BinaryDescriptors, Descriptors, FloatDescriptors};
use track_match::{
    euclidean, hamming, DescriptorMatcher, IndexParams, MatcherConfig, MetricFamily, SearchStrategy, SelectionPolicy,
};

fn float_set(max_rows: usize, dim: usize) -> impl Strategy<Value = Vec<Vec<f32>>> {
    prop::collection::vec(prop::collection::vec(-50.0f32..50.0, dim), 0..max_rows)
}

fn binary_set(max_rows: usize) -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 8), 0..max_rows)
}

fn float_descriptors(rows: &[Vec<f32>], dim: usize) -> Descriptors {
    let data = rows.iter().flatten().copied().collect();
    FloatDescriptors::new(data, dim).unwrap().into()
}

fn binary_descriptors(rows: &[Vec<u8>]) -> Descriptors {
    let data = rows.iter().flatten().copied().collect();
    BinaryDescriptors::new(data, 8).unwrap().into()
}

fn matcher(metric: MetricFamily, strategy: SearchStrategy, selection: SelectionPolicy) -> DescriptorMatcher {
    DescriptorMatcher::new(MatcherConfig {
        n_threads: 2,
        ..MatcherConfig::new(metric, strategy, selection)
    })
    .unwrap()
}

proptest! {
    #[test]
    fn nearest_only_matches_every_source(source in float_set(20, 4), reference in float_set(20, 4)) {
        let m = matcher(MetricFamily::Float, SearchStrategy::BruteForce, SelectionPolicy::NearestOnly);
        let matches = m.match_descriptors(&float_descriptors(&source, 4), &float_descriptors(&reference, 4)).unwrap();

        let expected = if reference.is_empty() { 0 } else { source.len() };
        prop_assert_eq!(matches.len(), expected);
        for (i, mt) in matches.iter().enumerate() {
            prop_assert_eq!(mt.source_idx, i);
            let best = reference.iter().map(|r| euclidean(&source[i], r)).fold(f32::INFINITY, f32::min);
            prop_assert_eq!(mt.distance, best);
        }
    }

    #[test]
    fn ratio_test_matches_are_unambiguous(source in float_set(20, 3), reference in float_set(20, 3)) {
        let m = matcher(MetricFamily::Float, SearchStrategy::BruteForce, SelectionPolicy::RatioTest);
        let (matches, report) = m
            .match_with_report(&float_descriptors(&source, 3), &float_descriptors(&reference, 3))
            .unwrap();

        for mt in &matches {
            let mut distances: Vec<f32> = reference.iter().map(|r| euclidean(&source[mt.source_idx], r)).collect();
            distances.sort_by(f32::total_cmp);
            prop_assert!(distances.len() >= 2);
            prop_assert_eq!(mt.distance, distances[0]);
            prop_assert!(distances[0] < 0.8 * distances[1]);
        }
        if reference.len() < 2 {
            prop_assert!(matches.is_empty());
        }
        if !source.is_empty() && !reference.is_empty() {
            prop_assert_eq!(report.emitted + report.unmatched(), report.sources);
        }
    }

    #[test]
    fn lsh_never_drops_a_source(source in binary_set(24), reference in binary_set(24)) {
        let m = matcher(
            MetricFamily::Binary,
            SearchStrategy::Approximate(IndexParams::lsh()),
            SelectionPolicy::NearestOnly,
        );
        let matches = m.match_descriptors(&binary_descriptors(&source), &binary_descriptors(&reference)).unwrap();

        let expected = if reference.is_empty() { 0 } else { source.len() };
        prop_assert_eq!(matches.len(), expected);
        for mt in &matches {
            let exact = reference.iter().map(|r| hamming(&source[mt.source_idx], r)).min().unwrap();
            prop_assert!(mt.distance >= exact as f32);
        }
    }

    #[test]
    fn kd_forest_is_never_closer_than_exact(source in float_set(30, 6), reference in float_set(30, 6)) {
        let m = matcher(
            MetricFamily::Float,
            SearchStrategy::Approximate(IndexParams::KdTree { trees: 2, checks: 8 }),
            SelectionPolicy::NearestOnly,
        );
        let matches = m.match_descriptors(&float_descriptors(&source, 6), &float_descriptors(&reference, 6)).unwrap();

        let expected = if reference.is_empty() { 0 } else { source.len() };
        prop_assert_eq!(matches.len(), expected);
        for mt in &matches {
            let exact = reference.iter().map(|r| euclidean(&source[mt.source_idx], r)).fold(f32::INFINITY, f32::min);
            prop_assert!(mt.distance >= exact);
        }
    }

    #[test]
    fn approximate_search_is_deterministic(source in binary_set(16), reference in binary_set(16)) {
        let m = matcher(
            MetricFamily::Binary,
            SearchStrategy::Approximate(IndexParams::lsh()),
            SelectionPolicy::RatioTest,
        );
        let s = binary_descriptors(&source);
        let r = binary_descriptors(&reference);
        prop_assert_eq!(m.match_descriptors(&s, &r).unwrap(), m.match_descriptors(&s, &r).unwrap());
    }
}
