// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! k-NN graph construction at the intended request sizes
//!
//! Run with: cargo bench -p groupwise-index --bench knn_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use groupwise_index::KnnGraphBuilder;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_embeddings(n: usize, dim: usize, seed: u64) -> Array2<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((n, dim), |_| rng.gen_range(-1.0..1.0))
}

fn bench_knn(c: &mut Criterion) {
    let mut group = c.benchmark_group("knn_graph");
    let builder = KnnGraphBuilder::new(10);

    for &n in &[25usize, 100, 300] {
        let embeddings = random_embeddings(n, 768, 7);
        group.bench_with_input(BenchmarkId::from_parameter(n), &embeddings, |b, e| {
            b.iter(|| builder.build(black_box(e.view())).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_knn);
criterion_main!(benches);
