// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::Matrix6;
use rgbd_odometry_rs::math::accumulator::NormalEquations;
use rgbd_odometry_rs::misc::type_aliases::Vec6;

// Functions.

fn normal_sum(nb_iter: u32, vec: &Vec6) -> Matrix6<f64> {
    let vec = vec.cast::<f64>();
    let mut mat = Matrix6::zeros();
    for _ in 0..nb_iter {
        mat += vec * vec.transpose();
    }
    mat
}

fn accum_sum(nb_iter: u32, vec: &Vec6) -> Matrix6<f64> {
    let mut accum = NormalEquations::new();
    for _ in 0..nb_iter {
        accum.add_residual(vec, 0.5);
    }
    accum.jtj()
}

// Benches.

fn criterion_benchmark(c: &mut Criterion) {
    let vec = Vec6::new(0.1, -0.2, 0.3, 1.0, -1.0, 0.5);
    let mut group = c.benchmark_group("Accumulator");
    for nb_iter in [1000_u32, 100_000].iter() {
        group.bench_with_input(BenchmarkId::new("Normal", nb_iter), nb_iter, |b, n| {
            b.iter(|| black_box(normal_sum(*n, &vec)))
        });
        group.bench_with_input(BenchmarkId::new("Packed", nb_iter), nb_iter, |b, n| {
            b.iter(|| black_box(accum_sum(*n, &vec)))
        });
    }
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
