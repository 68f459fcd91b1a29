use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sift_core::{CancelToken, Descriptor, Keypoint, KeypointSet, MatchedPair, DESCRIPTOR_LEN};
use sift_match::{BruteForceIndex, ConsistencyFilter, DescriptorMatcher, MatcherBuilder, NearestNeighbors};

fn random_descriptor(rng: &mut StdRng) -> Descriptor {
    let mut d = [0.0f32; DESCRIPTOR_LEN];
    for v in d.iter_mut() {
        *v = rng.gen_range(0.0..1.0);
    }
    let norm = d.iter().map(|v| v * v).sum::<f32>().sqrt();
    for v in d.iter_mut() {
        *v /= norm;
    }
    d
}

/// Image B repeats image A's features with small descriptor noise and a
/// shared rotation, so most queries pass the ratio test
fn create_benchmark_sets(n: usize, m: usize) -> (KeypointSet, KeypointSet) {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut kps_a = Vec::with_capacity(n);
    let mut descs_a = Vec::with_capacity(n);
    for i in 0..n {
        kps_a.push(Keypoint::new(
            (i * 7 % 480) as f32,
            (i * 13 % 640) as f32,
            rng.gen_range(1.0..8.0),
            rng.gen_range(-3.1..3.1),
        ));
        descs_a.push(random_descriptor(&mut rng));
    }

    let mut kps_b = Vec::with_capacity(m);
    let mut descs_b = Vec::with_capacity(m);
    for j in 0..m {
        if j < n {
            let k = kps_a[j];
            kps_b.push(Keypoint::new(k.row + 4.0, k.col - 2.0, k.scale * 1.1, k.orientation + 0.2));
            let mut d = descs_a[j];
            for v in d.iter_mut() {
                *v += rng.gen_range(-0.01..0.01);
            }
            let norm = d.iter().map(|v| v * v).sum::<f32>().sqrt();
            for v in d.iter_mut() {
                *v /= norm;
            }
            descs_b.push(d);
        } else {
            kps_b.push(Keypoint::new(0.0, 0.0, 2.0, 0.0));
            descs_b.push(random_descriptor(&mut rng));
        }
    }

    (
        KeypointSet::new("bench_a", kps_a, descs_a),
        KeypointSet::new("bench_b", kps_b, descs_b),
    )
}

/// Benchmark brute-force ratio-test matching
fn bench_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("matching");
    let cancel = CancelToken::new();

    for &(n, m) in &[(100, 100), (500, 500), (1000, 1500)] {
        let (a, b) = create_benchmark_sets(n, m);

        for (mode, parallel) in [("sequential", false), ("parallel", true)] {
            let matcher = DescriptorMatcher::new(0.82, Default::default(), parallel);
            group.bench_with_input(
                BenchmarkId::new(mode, format!("{}x{}", n, m)),
                &(&a, &b),
                |bench, (a, b)| {
                    bench.iter(|| black_box(matcher.match_sets(black_box(a), black_box(b), &cancel).unwrap()))
                },
            );
        }
    }

    group.finish();
}

/// Benchmark a single two-nearest-neighbour query
fn bench_nearest_two(c: &mut Criterion) {
    let (a, b) = create_benchmark_sets(1, 2000);
    let index = BruteForceIndex::new(b.descriptors());
    let query = a.descriptors()[0];

    c.bench_function("nearest_two_2000", |bench| {
        bench.iter(|| black_box(index.nearest_two(black_box(&query)).unwrap()))
    });
}

/// Benchmark the consistency filter on precomputed raw matches
fn bench_consistency_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("consistency_filter");
    let cancel = CancelToken::new();

    for &n in &[100usize, 1000, 5000] {
        let (a, b) = create_benchmark_sets(n, n);
        let pairs: Vec<MatchedPair> = a
            .keypoints()
            .iter()
            .zip(b.keypoints())
            .map(|(ka, kb)| MatchedPair::new(*ka, *kb))
            .collect();

        for (mode, parallel) in [("sequential", false), ("parallel", true)] {
            let filter = ConsistencyFilter::new(
                10,
                std::f32::consts::PI / 8.0,
                0.4,
                Default::default(),
                parallel,
            );
            group.bench_with_input(BenchmarkId::new(mode, n), &pairs, |bench, pairs| {
                bench.iter(|| {
                    let mut rng = StdRng::seed_from_u64(1);
                    black_box(filter.filter(black_box(pairs), &mut rng, &cancel).unwrap())
                })
            });
        }
    }

    group.finish();
}

/// Benchmark the full pass through a configured matcher
fn bench_pipeline_presets(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_presets");
    let (a, b) = create_benchmark_sets(500, 600);
    let cancel = CancelToken::new();

    let presets = [
        ("default", MatcherBuilder::new().seed(7)),
        ("strict", MatcherBuilder::new().preset_strict().seed(7)),
        ("permissive", MatcherBuilder::new().preset_permissive().seed(7)),
    ];

    for (name, builder) in presets {
        let configured = builder.build().unwrap();
        group.bench_function(name, |bench| {
            bench.iter(|| {
                let mut rng = configured.rng();
                black_box(configured.run(black_box(&a), black_box(&b), &mut rng, &cancel).unwrap())
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_matching,
    bench_nearest_two,
    bench_consistency_filter,
    bench_pipeline_presets
);
criterion_main!(benches);
