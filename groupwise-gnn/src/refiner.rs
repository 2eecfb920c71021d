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

//! Graph attention refiner: stateless inference over a shared parameter store.

use crate::store::ParameterStore;
use groupwise_core::{AggregationDirection, GroupingError, GroupingResult, RefinerConfig};
use groupwise_index::{CsrAdjacency, SimilarityGraph};
use ndarray::{Array2, ArrayView2};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Refines embeddings by attention over the similarity graph.
#[derive(Debug, Clone)]
pub struct GraphAttentionRefiner {
    store: Arc<ParameterStore>,
    config: RefinerConfig,
}

impl GraphAttentionRefiner {
    pub fn new(store: Arc<ParameterStore>, config: RefinerConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<ParameterStore> {
        &self.store
    }

    /// Output dimension of the deployed parameters.
    pub fn output_dim(&self) -> GroupingResult<usize> {
        Ok(self.store.snapshot()?.output_dim())
    }

    /// Refine N input embeddings (N x D) into N x D' embeddings.
    ///
    /// Fails with `ServiceUnavailable` when nothing is deployed, before any
    /// work is done. Output that overflows f32 is rejected, never passed on.
    pub fn refine(
        &self,
        embeddings: ArrayView2<'_, f32>,
        graph: &SimilarityGraph,
    ) -> GroupingResult<Array2<f32>> {
        let params = self.store.snapshot()?;

        if graph.node_count() != embeddings.nrows() {
            return Err(GroupingError::InvalidInput(format!(
                "graph has {} nodes but {} embeddings were supplied",
                graph.node_count(),
                embeddings.nrows()
            )));
        }
        if embeddings.ncols() != params.input_dim {
            return Err(GroupingError::InvalidInput(format!(
                "embeddings have dimension {}, deployed parameters ({}) expect {}",
                embeddings.ncols(),
                params.version,
                params.input_dim
            )));
        }

        let started = Instant::now();
        let incoming: CsrAdjacency;
        let adjacency = match self.config.direction {
            AggregationDirection::Outgoing => graph.outgoing(),
            AggregationDirection::Incoming => {
                incoming = graph.incoming();
                &incoming
            }
        };

        let refined = params.forward(embeddings, adjacency, self.config.add_self_loops);
        if let Some(row) = refined.outer_iter().position(|r| r.iter().any(|v| !v.is_finite())) {
            return Err(GroupingError::InvalidInput(format!(
                "refined embedding of user {row} is not finite; input magnitudes overflow the model"
            )));
        }

        debug!(
            nodes = refined.nrows(),
            output_dim = refined.ncols(),
            layers = params.layers.len(),
            version = %params.version,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Refined embeddings"
        );
        Ok(refined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{Architecture, AttentionParameters, LayerParameters};
    use groupwise_index::KnnGraphBuilder;
    use ndarray::Array1;

    fn arch() -> Architecture {
        Architecture {
            input_dim: 5,
            hidden_channels: 4,
            heads: 2,
            layers: 3,
            output_dim: 3,
        }
    }

    fn refiner(config: RefinerConfig) -> GraphAttentionRefiner {
        let store = ParameterStore::with_parameters(AttentionParameters::glorot(&arch(), 21)).unwrap();
        GraphAttentionRefiner::new(Arc::new(store), config)
    }

    fn inputs(n: usize) -> Array2<f32> {
        Array2::from_shape_fn((n, 5), |(i, j)| ((i * 5 + j) as f32 * 0.61).cos())
    }

    #[test]
    fn test_output_dimension_for_any_n() {
        let refiner = refiner(RefinerConfig::default());
        for n in [1usize, 2, 5, 12] {
            let x = inputs(n);
            let graph = KnnGraphBuilder::new(3).build(x.view()).unwrap();
            let out = refiner.refine(x.view(), &graph).unwrap();
            assert_eq!(out.shape(), &[n, 3]);
        }
    }

    #[test]
    fn test_single_node_without_self_loops() {
        let refiner = refiner(RefinerConfig {
            add_self_loops: false,
            ..RefinerConfig::default()
        });
        let x = inputs(1);
        let graph = KnnGraphBuilder::new(10).build(x.view()).unwrap();
        let out = refiner.refine(x.view(), &graph).unwrap();
        assert_eq!(out.shape(), &[1, 3]);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_refinement_is_bit_identical_across_calls() {
        for direction in [AggregationDirection::Outgoing, AggregationDirection::Incoming] {
            let refiner = refiner(RefinerConfig {
                direction,
                ..RefinerConfig::default()
            });
            let x = inputs(9);
            let graph = KnnGraphBuilder::new(3).build(x.view()).unwrap();
            let a = refiner.refine(x.view(), &graph).unwrap();
            let b = refiner.refine(x.view(), &graph).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_missing_parameters_fail_every_call() {
        let refiner = GraphAttentionRefiner::new(Arc::new(ParameterStore::empty()), RefinerConfig::default());
        let x = inputs(3);
        let graph = KnnGraphBuilder::new(2).build(x.view()).unwrap();
        for _ in 0..2 {
            let err = refiner.refine(x.view(), &graph).unwrap_err();
            assert!(err.is_unavailable());
        }
        assert!(refiner.output_dim().is_err());
    }

    #[test]
    fn test_overflowing_inputs_rejected() {
        // identity layer scaled by 4: any input above f32::MAX / 4 overflows
        let params = AttentionParameters {
            version: "amplifier".into(),
            input_dim: 5,
            negative_slope: 0.2,
            layers: vec![LayerParameters {
                heads: 1,
                out_channels: 5,
                concat: true,
                w_neighbor: Array2::eye(5) * 4.0,
                b_neighbor: Array1::zeros(5),
                w_center: Array2::zeros((5, 5)),
                b_center: Array1::zeros(5),
                attention: Array2::zeros((1, 5)),
                bias: Array1::zeros(5),
            }],
        };
        let store = ParameterStore::with_parameters(params).unwrap();
        let refiner = GraphAttentionRefiner::new(Arc::new(store), RefinerConfig::default());
        let x = Array2::from_shape_fn((6, 5), |(i, j)| if (i + j) % 2 == 0 { 3e38f32 } else { -3e38 });
        let graph = KnnGraphBuilder::new(3).build(x.view()).unwrap();
        let err = refiner.refine(x.view(), &graph).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_input_dimension_checked() {
        let refiner = refiner(RefinerConfig::default());
        let x = Array2::<f32>::ones((4, 7));
        let graph = KnnGraphBuilder::new(2).build(x.view()).unwrap();
        let err = refiner.refine(x.view(), &graph).unwrap_err();
        assert!(err.is_client_error());
    }
}
