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

//! Compressed Sparse Row (CSR) adjacency over dense node indices
//!
//! CSR stores the graph as two flat arrays:
//! - `targets`: all neighbor indices, grouped by source node
//! - `offsets`: `offsets[i]..offsets[i + 1]` is node i's slice of `targets`
//!
//! Nodes are `0..n`, so offsets is a plain `Vec` of length `n + 1` and a
//! neighbor lookup is two array reads. Within one source node, neighbors keep
//! the order in which their edges were supplied (the k-NN rank order).

use serde::{Deserialize, Serialize};

/// Read-only adjacency in CSR layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsrAdjacency {
    /// offsets[i] = start index in targets for node i
    offsets: Vec<usize>,
    /// Flat array of all neighbor indices
    targets: Vec<usize>,
}

impl CsrAdjacency {
    /// Adjacency with `n` nodes and no edges.
    pub fn empty(n: usize) -> Self {
        Self {
            offsets: vec![0; n + 1],
            targets: Vec::new(),
        }
    }

    /// Build from `(source, target)` pairs over nodes `0..n`.
    ///
    /// Counting sort on the source index: O(n + E), stable per source.
    /// Pairs referencing a node `>= n` are a caller bug and panic.
    pub fn from_edges(n: usize, edges: &[(usize, usize)]) -> Self {
        let mut offsets = vec![0usize; n + 1];
        for &(src, dst) in edges {
            assert!(src < n && dst < n, "edge ({src}, {dst}) outside 0..{n}");
            offsets[src + 1] += 1;
        }
        for i in 0..n {
            offsets[i + 1] += offsets[i];
        }

        let mut cursor = offsets.clone();
        let mut targets = vec![0usize; edges.len()];
        for &(src, dst) in edges {
            targets[cursor[src]] = dst;
            cursor[src] += 1;
        }

        Self { offsets, targets }
    }

    /// Same graph with every edge reversed.
    pub fn transpose(&self) -> Self {
        let n = self.node_count();
        let reversed: Vec<(usize, usize)> = self
            .iter_edges()
            .map(|(src, dst)| (dst, src))
            .collect();
        Self::from_edges(n, &reversed)
    }

    /// Neighbors of `node` in insertion order - O(1) lookup, no copy
    #[inline]
    pub fn neighbors(&self, node: usize) -> &[usize] {
        &self.targets[self.offsets[node]..self.offsets[node + 1]]
    }

    #[inline]
    pub fn degree(&self, node: usize) -> usize {
        self.offsets[node + 1] - self.offsets[node]
    }

    pub fn node_count(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn edge_count(&self) -> usize {
        self.targets.len()
    }

    /// All `(source, target)` pairs, grouped by source.
    pub fn iter_edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.node_count())
            .flat_map(move |src| self.neighbors(src).iter().map(move |&dst| (src, dst)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csr_basic() {
        // 0 -> [2, 1], 1 -> [], 2 -> [0], 3 -> [2]
        let adj = CsrAdjacency::from_edges(4, &[(0, 2), (2, 0), (0, 1), (3, 2)]);

        assert_eq!(adj.node_count(), 4);
        assert_eq!(adj.edge_count(), 4);
        assert_eq!(adj.neighbors(0), &[2, 1]);
        assert!(adj.neighbors(1).is_empty());
        assert_eq!(adj.neighbors(2), &[0]);
        assert_eq!(adj.neighbors(3), &[2]);
        assert_eq!(adj.degree(0), 2);
    }

    #[test]
    fn test_transpose() {
        let adj = CsrAdjacency::from_edges(3, &[(0, 1), (0, 2), (1, 2)]);
        let rev = adj.transpose();

        assert!(rev.neighbors(0).is_empty());
        assert_eq!(rev.neighbors(1), &[0]);
        assert_eq!(rev.neighbors(2), &[0, 1]);
        assert_eq!(rev.transpose(), adj);
    }

    #[test]
    fn test_empty() {
        let adj = CsrAdjacency::empty(1);
        assert_eq!(adj.node_count(), 1);
        assert_eq!(adj.edge_count(), 0);
        assert!(adj.neighbors(0).is_empty());
        assert_eq!(adj.iter_edges().count(), 0);
    }
}
