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

//! Four-stage grouping pipeline
//!
//! ```text
//! users ─▶ validate ─▶ k-NN graph ─▶ attention refiner ─▶ similarity matrix
//!                                                              │
//!              GroupAssignment ◀─ format ◀─ genetic search ◀───┘
//! ```
//!
//! One call runs synchronously on the caller's thread (rayon parallelises
//! inside the stages). The only state shared between concurrent calls is the
//! read-only [`ParameterStore`].

use groupwise_core::{
    CancellationToken, EmbeddingSet, GroupAssignment, GroupingConfig, GroupingError,
    GroupingResult, SimilarityMatrix, UserEmbedding,
};
use groupwise_gnn::{GraphAttentionRefiner, ParameterStore};
use groupwise_index::KnnGraphBuilder;
use groupwise_optimizer::{GenerationStats, GeneticOptimizer, StopReason};
use ndarray::Array2;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Per-call overrides.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Overrides `evolution.seed` from the configuration
    pub seed: Option<u64>,
    /// Polled between stages and between generations
    pub cancel: Option<CancellationToken>,
    /// Return the refined embedding matrix alongside the groups
    pub include_refined: bool,
}

impl RunOptions {
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }
}

/// Everything one grouping call produced.
#[derive(Debug, Clone)]
pub struct GroupingOutcome {
    pub assignment: GroupAssignment,
    pub fitness: f64,
    pub stop_reason: StopReason,
    pub generations: usize,
    /// Seed the genetic search ran with
    pub seed: u64,
    pub history: Vec<GenerationStats>,
    /// N x D' refined embeddings, only when requested
    pub refined: Option<Array2<f32>>,
}

/// Configured pipeline over a shared parameter store.
#[derive(Debug, Clone)]
pub struct GroupingPipeline {
    config: GroupingConfig,
    graph: KnnGraphBuilder,
    refiner: GraphAttentionRefiner,
}

impl GroupingPipeline {
    pub fn new(config: GroupingConfig, store: Arc<ParameterStore>) -> GroupingResult<Self> {
        config.validate()?;
        Ok(Self {
            graph: KnnGraphBuilder::from_config(&config.graph),
            refiner: GraphAttentionRefiner::new(store, config.refiner.clone()),
            config,
        })
    }

    pub fn config(&self) -> &GroupingConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<ParameterStore> {
        self.refiner.store()
    }

    /// Group `users` into cohesive groups.
    ///
    /// Input is validated before any graph work. A missing parameter handle
    /// fails the call with `ServiceUnavailable`. Cancellation returns
    /// `Cancelled`; an exhausted time budget still returns the best grouping
    /// found so far.
    pub fn group(&self, users: &[UserEmbedding], options: RunOptions) -> GroupingResult<GroupingOutcome> {
        let started = Instant::now();
        let cancel = options.cancel.unwrap_or_default();

        let set = EmbeddingSet::new(users)?;
        debug!(users = set.len(), dimension = set.dimension(), "Validated grouping request");

        let graph = self.graph.build(set.matrix().view())?;
        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            k = graph.k(),
            "Built similarity graph"
        );
        if cancel.is_cancelled() {
            return Err(GroupingError::Cancelled { generations: 0 });
        }

        let refined = self.refiner.refine(set.matrix().view(), &graph)?;
        if cancel.is_cancelled() {
            return Err(GroupingError::Cancelled { generations: 0 });
        }

        let similarity = SimilarityMatrix::from_rows(refined.view());
        let mut evolution = self.config.evolution.clone();
        if let Some(seed) = options.seed {
            evolution.seed = Some(seed);
        }
        let run = GeneticOptimizer::new(evolution, self.config.groups).run_with_cancel(&similarity, &cancel)?;

        match run.stop_reason {
            StopReason::Cancelled => {
                return Err(GroupingError::Cancelled {
                    generations: run.generations,
                })
            }
            StopReason::BudgetExhausted => warn!(
                generations = run.generations,
                fitness = run.best_fitness,
                "Time budget exhausted, returning best grouping so far"
            ),
            StopReason::Completed => {}
        }

        let assignment = GroupAssignment::from_genes(set.ids(), &run.best)?;
        info!(
            users = set.len(),
            groups = assignment.len(),
            fitness = run.best_fitness,
            generations = run.generations,
            seed = run.seed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Grouping complete"
        );

        Ok(GroupingOutcome {
            assignment,
            fitness: run.best_fitness,
            stop_reason: run.stop_reason,
            generations: run.generations,
            seed: run.seed,
            history: run.history,
            refined: options.include_refined.then_some(refined),
        })
    }
}
