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

//! Fitness evaluation and full genetic runs
//!
//! Run with: cargo bench -p groupwise-optimizer --bench evolution_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use groupwise_core::{EvolutionConfig, GroupSizeConfig, SimilarityMatrix};
use groupwise_optimizer::{CohesionFitness, GeneticOptimizer};
use ndarray::Array2;

fn similarity(n: usize) -> SimilarityMatrix {
    let rows = Array2::from_shape_fn((n, 64), |(i, j)| ((i * 64 + j) as f32 * 0.37).sin());
    SimilarityMatrix::from_rows(rows.view())
}

fn bench_fitness(c: &mut Criterion) {
    let mut group = c.benchmark_group("fitness");
    let sizes = GroupSizeConfig::default();

    for &n in &[25usize, 100, 300] {
        let sim = similarity(n);
        let g = sizes.group_count(n);
        let fitness = CohesionFitness::new(&sim, sizes, g);
        let genes: Vec<usize> = (0..n).map(|i| i % g).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &genes, |b, genes| {
            b.iter(|| fitness.evaluate(black_box(genes)))
        });
    }

    group.finish();
}

fn bench_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("genetic_run");
    group.sample_size(10);
    let optimizer = GeneticOptimizer::new(EvolutionConfig::default().with_seed(42), GroupSizeConfig::default());

    for &n in &[25usize, 100] {
        let sim = similarity(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &sim, |b, sim| {
            b.iter(|| optimizer.run(black_box(sim)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fitness, bench_run);
criterion_main!(benches);
