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

//! Cohesion-minus-penalty fitness
//!
//! For each non-empty group g of size s:
//!
//! ```text
//! penalty(g)  = 0.1 · max(0, min - s) + 0.1 · max(0, s - max)
//! cohesion(g) = mean of S[i][j] over ordered pairs i != j in g   (0 if s <= 1)
//! fitness     = Σ cohesion(g) - Σ penalty(g)
//! ```
//!
//! Group ids with no members contribute nothing. The function is pure in
//! (genes, similarity matrix, size bounds).

use groupwise_core::{GroupSizeConfig, SimilarityMatrix};
use serde::{Deserialize, Serialize};

/// Penalty per member outside the size bounds
pub const SIZE_PENALTY: f64 = 0.1;

/// Fitness split into its two terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessBreakdown {
    pub cohesion: f64,
    pub penalty: f64,
}

impl FitnessBreakdown {
    pub fn total(&self) -> f64 {
        self.cohesion - self.penalty
    }
}

/// Fitness over a fixed similarity matrix, size bounds and group count.
#[derive(Debug, Clone, Copy)]
pub struct CohesionFitness<'a> {
    similarity: &'a SimilarityMatrix,
    sizes: GroupSizeConfig,
    group_count: usize,
}

impl<'a> CohesionFitness<'a> {
    pub fn new(similarity: &'a SimilarityMatrix, sizes: GroupSizeConfig, group_count: usize) -> Self {
        Self {
            similarity,
            sizes,
            group_count,
        }
    }

    pub fn group_count(&self) -> usize {
        self.group_count
    }

    pub fn evaluate(&self, genes: &[usize]) -> f64 {
        self.breakdown(genes).total()
    }

    pub fn breakdown(&self, genes: &[usize]) -> FitnessBreakdown {
        debug_assert_eq!(genes.len(), self.similarity.len());

        let mut members: Vec<Vec<usize>> = vec![Vec::new(); self.group_count];
        for (user, &group) in genes.iter().enumerate() {
            members[group].push(user);
        }

        let mut cohesion = 0.0;
        let mut penalty = 0.0;
        for group in members.iter().filter(|m| !m.is_empty()) {
            let size = group.len();
            penalty += SIZE_PENALTY * self.sizes.min_size.saturating_sub(size) as f64;
            penalty += SIZE_PENALTY * size.saturating_sub(self.sizes.max_size) as f64;

            if size > 1 {
                let mut pair_sum = 0.0;
                for &a in group {
                    for &b in group {
                        if a != b {
                            pair_sum += self.similarity.get(a, b);
                        }
                    }
                }
                cohesion += pair_sum / (size * (size - 1)) as f64;
            }
        }

        FitnessBreakdown { cohesion, penalty }
    }
}
