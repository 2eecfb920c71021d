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

//! Cosine similarity and the dense N x N similarity matrix.
//!
//! ## Scale boundary
//!
//! The matrix is computed eagerly and kept resident for a whole optimizer run:
//! O(N²·D) time to build and O(N²) memory to hold. At the intended scale of
//! tens to low hundreds of users this is a few hundred kilobytes. Past that
//! an approximate-neighbor index and a sparse cohesion model are needed; this
//! type deliberately does not try to be one.

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;

/// Euclidean norm, accumulated in f64.
#[inline]
pub fn l2_norm(v: ArrayView1<'_, f32>) -> f64 {
    v.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>().sqrt()
}

/// Cosine similarity of two equally sized vectors.
///
/// A zero vector has similarity 0 with everything, including itself.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let na = l2_norm(ArrayView1::from(a));
    let nb = l2_norm(ArrayView1::from(b));
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| x as f64 * y as f64)
        .sum();
    dot / (na * nb)
}

/// Pairwise cosine similarities of the rows of an N x D matrix.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    values: Array2<f64>,
}

impl SimilarityMatrix {
    /// Compute all N² similarities. Rows are filled in parallel.
    pub fn from_rows(rows: ArrayView2<'_, f32>) -> Self {
        let n = rows.nrows();
        let norms: Vec<f64> = rows.outer_iter().map(l2_norm).collect();

        let mut values = Array2::<f64>::zeros((n, n));
        values
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(i, mut out)| {
                let row_i = rows.row(i);
                for (j, slot) in out.iter_mut().enumerate() {
                    let denom = norms[i] * norms[j];
                    if denom == 0.0 {
                        continue;
                    }
                    let dot: f64 = row_i
                        .iter()
                        .zip(rows.row(j).iter())
                        .map(|(&x, &y)| x as f64 * y as f64)
                        .sum();
                    *slot = dot / denom;
                }
            });

        Self { values }
    }

    /// Number of rows (users).
    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[[i, j]]
    }

    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.values.row(i)
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.values
    }
}
