//! End-to-end scenarios against the public [`arena_hnsw::Index`] facade,
//! exercising the walkthrough scenarios and testable properties this
//! crate's design is checked against rather than any one module's
//! internals. Grounded in the teacher's own `tests/` convention (see
//! `examples/deven96-ahnlich/ahnlich/server/tests/server_test.rs`) of
//! keeping cross-module scenarios out of the `src/` unit test modules.

use arena_hnsw::distance::SquaredEuclidean;
use arena_hnsw::params::IndexParams;
use arena_hnsw::{Error, Index};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

fn random_points(seed: u64, count: usize, dim: usize) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| (0..dim).map(|_| rng.gen_range(0.0..1.0)).collect())
        .collect()
}

fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Greedy nearest-walk at layer 0 starting from `start`, following
/// whichever neighbor is closer to `target` until none improves — the
/// same descent `descend_to_nearest` performs internally, driven here
/// through the public API to check scenario S3.
fn walk_to_nearest(index: &Index<SquaredEuclidean>, start: arena_hnsw::ElementId, target: &[f32]) -> arena_hnsw::ElementId {
    let mut current = start;
    let mut current_distance = squared_euclidean(&index.payload_of(current).unwrap(), target);
    loop {
        let mut moved = false;
        for neighbor in index.neighbors(current, 0).unwrap() {
            let d = squared_euclidean(&index.payload_of(neighbor).unwrap(), target);
            if d < current_distance {
                current = neighbor;
                current_distance = d;
                moved = true;
            }
        }
        if !moved {
            return current;
        }
    }
}

#[test]
fn scenario_s3_nearest_walk_from_entrypoint_reaches_the_exact_match() {
    let params = IndexParams::new(2, 16, 8).with_ef_construction(200);
    let mut index = Index::create_with_defaults(params, SquaredEuclidean).unwrap();
    index.insert(&[0.0, 0.0], 10).unwrap();
    index.insert(&[1.0, 0.0], 20).unwrap();
    index.insert(&[0.0, 1.0], 30).unwrap();
    let target = index.insert(&[10.0, 10.0], 40).unwrap();

    let landed = walk_to_nearest(&index, index.entrypoint(), &[10.0, 10.0]);
    assert_eq!(landed, target);
    assert_eq!(
        squared_euclidean(&index.payload_of(landed).unwrap(), &[10.0, 10.0]),
        0.0
    );
}

#[test]
fn scenario_s4_recall_against_brute_force_is_high() {
    let dim = 8;
    let params = IndexParams::new(dim as u32, 1100, 16)
        .with_m0(32)
        .with_ef_construction(200);
    let mut index = Index::create_with_defaults(params, SquaredEuclidean).unwrap();

    let dataset = random_points(1, 1000, dim);
    let mut ids = Vec::with_capacity(dataset.len());
    for (i, point) in dataset.iter().enumerate() {
        ids.push(index.insert(point, i as u32).unwrap());
    }

    let queries = random_points(2, 50, dim);
    let mut hits = 0usize;
    let mut total = 0usize;

    for query in &queries {
        let mut brute_force: Vec<(usize, f32)> = dataset
            .iter()
            .enumerate()
            .map(|(i, p)| (i, squared_euclidean(p, query)))
            .collect();
        brute_force.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
        let truth: std::collections::HashSet<usize> =
            brute_force.iter().take(10).map(|(i, _)| *i).collect();

        // Approximate top-10 via a beam search rooted at the entrypoint,
        // expanding layer 0 neighbors greedily (the same frontier the
        // graph builder maintains during insertion, reused here purely
        // as a read-only query since this crate's Non-goals exclude a
        // dedicated KNN search API).
        let mut frontier: Vec<(arena_hnsw::ElementId, f32)> = vec![(
            index.entrypoint(),
            squared_euclidean(&index.payload_of(index.entrypoint()).unwrap(), query),
        )];
        let mut visited = std::collections::HashSet::new();
        visited.insert(index.entrypoint());
        let mut i = 0;
        while i < frontier.len() {
            let (id, _) = frontier[i];
            for neighbor in index.neighbors(id, 0).unwrap() {
                if visited.insert(neighbor) {
                    let d = squared_euclidean(&index.payload_of(neighbor).unwrap(), query);
                    frontier.push((neighbor, d));
                }
            }
            i += 1;
        }
        frontier.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
        let found: std::collections::HashSet<usize> = frontier
            .iter()
            .take(10)
            .map(|(id, _)| index.external_id_of(*id).unwrap() as usize)
            .collect();

        hits += truth.intersection(&found).count();
        total += 10;
    }

    let recall = hits as f64 / total as f64;
    assert!(recall >= 0.80, "recall was {recall}");
    let _ = ids;
}

#[test]
fn scenario_s6_layer_zero_degree_never_exceeds_m0() {
    let params = IndexParams::new(4, 250, 2).with_m0(4).with_ef_construction(100);
    let mut index = Index::create_with_defaults(params, SquaredEuclidean).unwrap();
    let dataset = random_points(3, 200, 4);

    let mut ids = Vec::with_capacity(dataset.len());
    for (i, point) in dataset.iter().enumerate() {
        ids.push(index.insert(point, i as u32).unwrap());
    }

    for &id in &ids {
        let neighbors = index.neighbors(id, 0).unwrap();
        assert!(neighbors.len() <= 4, "element {id:?} had {} neighbors", neighbors.len());
    }
}

#[test]
fn out_of_memory_leaves_prior_elements_intact_and_queryable() {
    let params = IndexParams::new(2, 4, 2).with_ef_construction(50);
    let mut index = Index::create(params, SquaredEuclidean, 256).unwrap();

    let mut last_ok_id = None;
    for i in 0..10_000u32 {
        match index.insert(&[i as f32, 0.0], i) {
            Ok(id) => last_ok_id = Some(id),
            Err(Error::OutOfMemory) => break,
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    }

    let id = last_ok_id.expect("at least one insert should have succeeded before exhaustion");
    assert!(index.payload_of(id).is_ok());
}

#[test]
fn construction_is_deterministic_across_fresh_indices() {
    let build = || {
        let params = IndexParams::new(3, 64, 4).with_ef_construction(100);
        let mut index = Index::create_with_defaults(params, SquaredEuclidean).unwrap();
        let points = random_points(99, 30, 3);
        for (i, point) in points.iter().enumerate() {
            index.insert(point, i as u32).unwrap();
        }
        index
    };

    let a = build();
    let b = build();

    assert_eq!(a.entrypoint(), b.entrypoint());
    for i in 1..=30u32 {
        let id = arena_hnsw::ElementId(i);
        assert_eq!(a.level_of(id).unwrap(), b.level_of(id).unwrap());
        assert_eq!(a.neighbors(id, 0).unwrap(), b.neighbors(id, 0).unwrap());
    }
}
