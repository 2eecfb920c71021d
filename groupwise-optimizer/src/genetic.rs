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

//! Generational Genetic Partition Search
//!
//! Evolves group-assignment vectors toward maximum cohesion under soft
//! group-size constraints.
//!
//! ## Algorithm Overview
//!
//! 1. **Initialise**: `population_size` individuals, genes uniform in `[0, G)`,
//!    all evaluated
//! 2. **Select**: `population_size` parents by tournament (with replacement)
//! 3. **Crossover**: pairs (0,1), (2,3), ... each crossed with `crossover_prob`
//! 4. **Mutate**: each offspring mutated with `mutation_prob`
//! 5. **Evaluate**: only offspring whose genes changed; the offspring fully
//!    replace the population
//! 6. **Repeat** for `generations` generations
//!
//! G = ceil(N / mean(min, max)) is fixed for the run. There is no elitism in
//! the population; the best individual ever evaluated is tracked on the side
//! and returned. Termination is by generation count, wall-clock budget or
//! cancellation, all checked between generations.
//!
//! ## Reproducibility
//!
//! The run draws from one `StdRng`. With `seed` set, identical inputs give
//! identical results. Without it a seed is drawn from OS entropy and reported
//! in [`OptimizerRun::seed`], so any run can be replayed after the fact.
//! Fitness evaluation is parallel but consumes no randomness.

use crate::fitness::CohesionFitness;
use crate::operators::{fittest, tournament_select, uniform_crossover, uniform_mutation, Individual};
use crate::stats::GenerationStats;
use groupwise_core::{
    CancellationToken, EvolutionConfig, GroupSizeConfig, GroupingError, GroupingResult,
    SimilarityMatrix,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// All configured generations ran
    Completed,
    /// The caller's cancellation token fired
    Cancelled,
    /// The wall-clock budget ran out
    BudgetExhausted,
}

/// Result of one optimizer run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerRun {
    /// Best assignment seen across all generations
    pub best: Vec<usize>,
    pub best_fitness: f64,
    /// G for this run
    pub group_count: usize,
    /// Generations completed after the initial population
    pub generations: usize,
    pub stop_reason: StopReason,
    /// Seed the run's RNG was built from
    pub seed: u64,
    pub history: Vec<GenerationStats>,
}

/// Genetic search over user-to-group assignments.
#[derive(Debug, Clone)]
pub struct GeneticOptimizer {
    config: EvolutionConfig,
    sizes: GroupSizeConfig,
}

impl GeneticOptimizer {
    pub fn new(config: EvolutionConfig, sizes: GroupSizeConfig) -> Self {
        Self { config, sizes }
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    /// Run to completion (or until the configured time budget expires).
    pub fn run(&self, similarity: &SimilarityMatrix) -> GroupingResult<OptimizerRun> {
        self.run_with_cancel(similarity, &CancellationToken::new())
    }

    /// Run, stopping early if `cancel` fires. The token is polled before
    /// each generation, never mid-generation.
    pub fn run_with_cancel(
        &self,
        similarity: &SimilarityMatrix,
        cancel: &CancellationToken,
    ) -> GroupingResult<OptimizerRun> {
        self.sizes.validate()?;
        self.config.validate()?;

        let n = similarity.len();
        if n == 0 {
            return Err(GroupingError::InvalidInput(
                "cannot partition zero users".into(),
            ));
        }

        let cfg = &self.config;
        let group_count = self.sizes.group_count(n);
        let fitness = CohesionFitness::new(similarity, self.sizes, group_count);
        let seed = cfg.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let deadline = cfg.time_budget().map(|budget| Instant::now() + budget);

        debug!(
            users = n,
            groups = group_count,
            population = cfg.population_size,
            generations = cfg.generations,
            seed,
            "Starting genetic partition search"
        );

        let mut population: Vec<Individual> = (0..cfg.population_size)
            .map(|_| Individual::random(n, group_count, &mut rng))
            .collect();
        let evaluations = evaluate(&mut population, &fitness);

        let mut best = fittest(&population)
            .map(|i| population[i].clone())
            .ok_or_else(|| GroupingError::Config("population_size must be at least 1".into()))?;
        let mut history = vec![GenerationStats::collect(0, evaluations, &population)];

        let mut stop_reason = StopReason::Completed;
        let mut completed = 0;

        for generation in 1..=cfg.generations {
            if cancel.is_cancelled() {
                stop_reason = StopReason::Cancelled;
                break;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                stop_reason = StopReason::BudgetExhausted;
                break;
            }

            let mut offspring =
                tournament_select(&population, cfg.population_size, cfg.tournament_size, &mut rng);

            for i in (1..offspring.len()).step_by(2) {
                if rng.gen::<f64>() < cfg.crossover_prob {
                    let (left, right) = offspring.split_at_mut(i);
                    uniform_crossover(&mut left[i - 1], &mut right[0], cfg.gene_prob, &mut rng);
                }
            }
            for individual in offspring.iter_mut() {
                if rng.gen::<f64>() < cfg.mutation_prob {
                    uniform_mutation(individual, group_count, cfg.gene_prob, &mut rng);
                }
            }

            let evaluations = evaluate(&mut offspring, &fitness);
            population = offspring;

            if let Some(i) = fittest(&population) {
                if population[i].score() > best.score() {
                    best = population[i].clone();
                }
            }

            let stats = GenerationStats::collect(generation, evaluations, &population);
            debug!(
                generation,
                evaluations,
                avg = stats.avg,
                max = stats.max,
                best = best.score(),
                "Generation complete"
            );
            history.push(stats);
            completed = generation;
        }

        if stop_reason != StopReason::Completed {
            warn!(
                ?stop_reason,
                completed,
                requested = cfg.generations,
                "Genetic search stopped early"
            );
        }

        let best_fitness = best.score();
        Ok(OptimizerRun {
            best: best.into_genes(),
            best_fitness,
            group_count,
            generations: completed,
            stop_reason,
            seed,
            history,
        })
    }
}

/// Score every unevaluated individual in parallel; returns how many.
fn evaluate(population: &mut [Individual], fitness: &CohesionFitness<'_>) -> usize {
    population
        .par_iter_mut()
        .filter(|ind| !ind.is_evaluated())
        .map(|ind| {
            let score = fitness.evaluate(ind.genes());
            ind.set_fitness(score);
        })
        .count()
}
