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

//! Exact k-nearest-neighbor similarity graph
//!
//! Every node gets a directed edge to each of its `min(k, N - 1)` most
//! cosine-similar other nodes. Selection is exhaustive (O(N²·D)), which is
//! the intended trade-off at tens to low hundreds of users.
//!
//! ## Ordering
//!
//! Candidates are ranked by similarity descending, ties broken by ascending
//! node index. Duplicate embeddings therefore always resolve the same way,
//! and a node never selects itself even when another node is identical to it.
//!
//! ## Symmetry
//!
//! The graph is not symmetric: j in knn(i) does not imply i in knn(j). Both
//! directions are exposed so the refiner can pick which one it aggregates.

use crate::csr::CsrAdjacency;
use groupwise_core::{GraphConfig, GroupingError, GroupingResult, SimilarityMatrix};
use ndarray::ArrayView2;
use rayon::prelude::*;
use std::cmp::Ordering;
use tracing::debug;

/// Directed k-NN graph over N nodes, without self-loops.
#[derive(Debug, Clone)]
pub struct SimilarityGraph {
    k: usize,
    outgoing: CsrAdjacency,
}

impl SimilarityGraph {
    /// Effective neighbor count after capping at N - 1.
    pub fn k(&self) -> usize {
        self.k
    }

    pub fn node_count(&self) -> usize {
        self.outgoing.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.outgoing.edge_count()
    }

    /// Node i's neighbors, most similar first.
    pub fn neighbors(&self, node: usize) -> &[usize] {
        self.outgoing.neighbors(node)
    }

    /// `(source, target)` edges, grouped by source in rank order.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        self.outgoing.iter_edges().collect()
    }

    /// Adjacency where node i lists its own neighbors.
    pub fn outgoing(&self) -> &CsrAdjacency {
        &self.outgoing
    }

    /// Adjacency where node i lists the nodes that selected it.
    pub fn incoming(&self) -> CsrAdjacency {
        self.outgoing.transpose()
    }
}

/// Builds [`SimilarityGraph`]s by exhaustive pairwise comparison.
#[derive(Debug, Clone)]
pub struct KnnGraphBuilder {
    k: usize,
}

impl Default for KnnGraphBuilder {
    fn default() -> Self {
        Self::from_config(&GraphConfig::default())
    }
}

impl KnnGraphBuilder {
    pub fn new(k: usize) -> Self {
        Self { k }
    }

    pub fn from_config(config: &GraphConfig) -> Self {
        Self::new(config.k)
    }

    /// Build the graph over the rows of `embeddings` (N x D).
    pub fn build(&self, embeddings: ArrayView2<'_, f32>) -> GroupingResult<SimilarityGraph> {
        let n = embeddings.nrows();
        if n == 0 {
            return Err(GroupingError::InvalidInput(
                "cannot build a similarity graph over zero users".into(),
            ));
        }
        let similarity = SimilarityMatrix::from_rows(embeddings);
        Ok(self.build_from_similarity(&similarity))
    }

    /// Build the graph from an already computed similarity matrix.
    pub fn build_from_similarity(&self, similarity: &SimilarityMatrix) -> SimilarityGraph {
        let n = similarity.len();
        let k = self.k.min(n.saturating_sub(1));

        let ranked: Vec<Vec<usize>> = (0..n)
            .into_par_iter()
            .map(|i| top_k(similarity, i, k))
            .collect();

        let edges: Vec<(usize, usize)> = ranked
            .iter()
            .enumerate()
            .flat_map(|(i, nbrs)| nbrs.iter().map(move |&j| (i, j)))
            .collect();

        debug!(
            nodes = n,
            k_requested = self.k,
            k_effective = k,
            edges = edges.len(),
            "Built k-NN similarity graph"
        );

        SimilarityGraph {
            k,
            outgoing: CsrAdjacency::from_edges(n, &edges),
        }
    }
}

/// The `k` best candidates for node `i`, excluding `i` itself.
fn top_k(similarity: &SimilarityMatrix, i: usize, k: usize) -> Vec<usize> {
    if k == 0 {
        return Vec::new();
    }
    let row = similarity.row(i);
    let mut candidates: Vec<usize> = (0..similarity.len()).filter(|&j| j != i).collect();
    let rank = |a: &usize, b: &usize| -> Ordering {
        row[*b].total_cmp(&row[*a]).then_with(|| a.cmp(b))
    };

    if k < candidates.len() {
        candidates.select_nth_unstable_by(k - 1, rank);
        candidates.truncate(k);
    }
    candidates.sort_unstable_by(rank);
    candidates
}
