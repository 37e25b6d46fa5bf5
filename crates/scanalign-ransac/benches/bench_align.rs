use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

use scanalign_ransac::{align_parallel, align_with_params, RansacParams};

fn create_clouds(rng: &mut StdRng, num_points: usize) -> (Vec<[f64; 3]>, Vec<[f64; 3]>) {
    let points_a = (0..num_points)
        .map(|_| std::array::from_fn(|_| rng.random_range(-10.0..10.0)))
        .collect::<Vec<[f64; 3]>>();
    // a quarter rotation about z plus a shift, with every fifth point an outlier
    let points_b = points_a
        .iter()
        .enumerate()
        .map(|(i, p)| match i % 5 {
            0 => std::array::from_fn(|_| rng.random_range(-10.0..10.0)),
            _ => [p[1] + 2.0, -p[0], p[2] - 1.0],
        })
        .collect::<Vec<[f64; 3]>>();
    (points_a, points_b)
}

fn bench_align(c: &mut Criterion) {
    let mut group = c.benchmark_group("align");
    let mut rng = StdRng::seed_from_u64(0);

    // no early stop so every run spends the full budget
    let params = RansacParams {
        max_iterations: 1000,
        inlier_threshold: 0.01,
        early_stop_ratio: 2.0,
        random_seed: Some(42),
    };

    for num_points in [100, 1000, 10000].iter() {
        group.throughput(criterion::Throughput::Elements(*num_points as u64));
        let parameter_string = format!("{}", num_points);
        let (points_a, points_b) = create_clouds(&mut rng, *num_points);

        group.bench_with_input(
            BenchmarkId::new("align_with_params", &parameter_string),
            &(&points_a, &points_b),
            |b, i| {
                let (points_a, points_b) = (i.0, i.1);
                b.iter(|| black_box(align_with_params(points_a, points_b, &params)));
            },
        );

        group.bench_with_input(
            BenchmarkId::new("align_parallel", &parameter_string),
            &(&points_a, &points_b),
            |b, i| {
                let (points_a, points_b) = (i.0, i.1);
                b.iter(|| black_box(align_parallel(points_a, points_b, &params, 8)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_align);
criterion_main!(benches);
