//! Construction benchmarks for hulls and the diagrams built on them
//!
//! 1. **`ConvexHull::generate`** in 2D, 3D and 4D
//! 2. **`Delaunay::process`** in 2D and 3D (lifted hull plus cell assembly)
//! 3. **`Voronoi::from_delaunay`** and **`Urquhart::from_delaunay_with_options`**
//!    on a prebuilt triangulation

#![allow(missing_docs)] // Criterion macros generate undocumented functions

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use hull_diagrams::core::algorithms::quickhull::ConvexHull;
use hull_diagrams::core::algorithms::urquhart::{Urquhart, UrquhartOptions, UrquhartSiteMerge};
use hull_diagrams::core::delaunay_triangulation::{Delaunay, Delaunay2};
use hull_diagrams::core::voronoi::{CellCenter, Voronoi, VoronoiOptions};
use hull_diagrams::geometry::util::generate_random_points_seeded;
use std::hint::black_box;
use std::sync::OnceLock;

/// Get the deterministic seed for random point generation.
/// Reads `HULL_DIAGRAMS_BENCH_SEED` (decimal or 0x-hex). Defaults to 0xC0FE.
fn get_benchmark_seed() -> u64 {
    static SEED: OnceLock<u64> = OnceLock::new();
    *SEED.get_or_init(|| {
        let seed = std::env::var("HULL_DIAGRAMS_BENCH_SEED")
            .ok()
            .and_then(|s| {
                let s = s.trim();
                s.strip_prefix("0x")
                    .or_else(|| s.strip_prefix("0X"))
                    .map_or_else(|| s.parse().ok(), |hex| u64::from_str_radix(hex, 16).ok())
            })
            .unwrap_or(0xC0FE);
        if std::env::var("PRINT_BENCH_SEED").is_ok() {
            eprintln!("Benchmark seed: 0x{seed:X} ({seed})");
        }
        seed
    })
}

macro_rules! generate_hull_benchmarks {
    ($dim:literal, $counts:expr) => {
        pastey::paste! {
            fn [<benchmark_convex_hull_ $dim d>](c: &mut Criterion) {
                let seed = get_benchmark_seed();
                let mut group = c.benchmark_group(concat!("convex_hull_", stringify!($dim), "d"));
                for &n_points in &$counts {
                    group.throughput(Throughput::Elements(n_points as u64));
                    group.bench_with_input(
                        BenchmarkId::new("generate", n_points),
                        &n_points,
                        |b, &n_points| {
                            b.iter_batched(
                                || generate_random_points_seeded::<f64, $dim>(n_points, (-100.0, 100.0), seed).unwrap(),
                                |points| black_box(ConvexHull::<$dim>::generate(&points).unwrap()),
                                BatchSize::LargeInput,
                            );
                        },
                    );
                }
                group.finish();
            }
        }
    };
}

macro_rules! generate_delaunay_benchmarks {
    ($dim:literal, $lifted:literal, $counts:expr) => {
        pastey::paste! {
            fn [<benchmark_delaunay_ $dim d>](c: &mut Criterion) {
                let seed = get_benchmark_seed();
                let mut group = c.benchmark_group(concat!("delaunay_", stringify!($dim), "d"));
                for &n_points in &$counts {
                    group.throughput(Throughput::Elements(n_points as u64));
                    group.bench_with_input(
                        BenchmarkId::new("process", n_points),
                        &n_points,
                        |b, &n_points| {
                            b.iter_batched(
                                || generate_random_points_seeded::<f64, $dim>(n_points, (-100.0, 100.0), seed).unwrap(),
                                |points| black_box(Delaunay::<$dim, $lifted>::process(&points).unwrap()),
                                BatchSize::LargeInput,
                            );
                        },
                    );
                }
                group.finish();
            }
        }
    };
}

generate_hull_benchmarks!(2, [100, 1_000, 10_000]);
generate_hull_benchmarks!(3, [100, 1_000, 10_000]);
generate_hull_benchmarks!(4, [100, 1_000]);
generate_delaunay_benchmarks!(2, 3, [100, 1_000, 5_000]);
generate_delaunay_benchmarks!(3, 4, [100, 1_000]);

fn benchmark_diagrams_2d(c: &mut Criterion) {
    let seed = get_benchmark_seed();
    let mut group = c.benchmark_group("diagrams_2d");
    for n_points in [100usize, 1_000, 5_000] {
        let points =
            generate_random_points_seeded::<f64, 2>(n_points, (-100.0, 100.0), seed).unwrap();
        let dt = Delaunay2::process(&points).unwrap();
        group.throughput(Throughput::Elements(n_points as u64));

        for mode in [CellCenter::Circumcenter, CellCenter::Balanced] {
            let options = VoronoiOptions {
                cell_center: mode,
                bounds_expansion: 10.0,
                ..VoronoiOptions::default()
            };
            group.bench_with_input(
                BenchmarkId::new(format!("voronoi_{mode:?}"), n_points),
                &dt,
                |b, dt| b.iter(|| black_box(Voronoi::from_delaunay(dt, &options).unwrap())),
            );
        }

        for mode in [UrquhartSiteMerge::None, UrquhartSiteMerge::MergeSites] {
            let options = UrquhartOptions { site_merge: mode };
            group.bench_with_input(
                BenchmarkId::new(format!("urquhart_{mode:?}"), n_points),
                &dt,
                |b, dt| b.iter(|| black_box(Urquhart::from_delaunay_with_options(dt, &options))),
            );
        }
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_convex_hull_2d,
    benchmark_convex_hull_3d,
    benchmark_convex_hull_4d,
    benchmark_delaunay_2d,
    benchmark_delaunay_3d,
    benchmark_diagrams_2d
);
criterion_main!(benches);
