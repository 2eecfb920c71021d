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

//! Multi-head graph attention forward pass
//!
//! ## Scoring
//!
//! For aggregating node i, neighbor j and head h:
//!
//! ```text
//! e_ij   = a_h · LeakyReLU(W_n x_j + b_n + W_c x_i + b_c)
//! α_ij   = softmax_j(e_ij)
//! out_ih = Σ_j α_ij (W_n x_j + b_n)
//! ```
//!
//! The nonlinearity sits inside the score, before the attention vector, so
//! the ranking of neighbors depends on the aggregating node (dynamic
//! attention). Heads are concatenated or averaged, then the layer bias is
//! added.
//!
//! ## Empty neighborhoods
//!
//! A node with no neighbors (N = 1 without self-loops) aggregates nothing:
//! its output is the layer bias. No normalisation runs over an empty set.

use crate::params::{AttentionParameters, LayerParameters};
use groupwise_index::CsrAdjacency;
use ndarray::{Array2, ArrayView2, Axis};
use rayon::prelude::*;

#[inline]
fn leaky_relu(x: f32, slope: f32) -> f32 {
    if x >= 0.0 {
        x
    } else {
        x * slope
    }
}

#[inline]
fn elu(x: f32) -> f32 {
    if x > 0.0 {
        x
    } else {
        x.exp_m1()
    }
}

/// Max-subtracted softmax in place. No-op on an empty slice.
fn softmax_in_place(scores: &mut [f32]) {
    let Some(max) = scores.iter().copied().reduce(f32::max) else {
        return;
    };
    let mut sum = 0.0f32;
    for s in scores.iter_mut() {
        *s = (*s - max).exp();
        sum += *s;
    }
    // sum >= 1 because the max element contributes exp(0)
    for s in scores.iter_mut() {
        *s /= sum;
    }
}

impl LayerParameters {
    /// One attention layer over every node. Nodes are processed in parallel;
    /// each node's arithmetic is sequential, so output is deterministic.
    pub fn forward(
        &self,
        x: ArrayView2<'_, f32>,
        adjacency: &CsrAdjacency,
        add_self_loops: bool,
        negative_slope: f32,
    ) -> Array2<f32> {
        let n = x.nrows();
        let heads = self.heads;
        let channels = self.out_channels;

        let neighbor_proj = x.dot(&self.w_neighbor) + &self.b_neighbor;
        let center_proj = x.dot(&self.w_center) + &self.b_center;

        let mut out = Array2::<f32>::zeros((n, self.output_dim()));
        out.axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(i, mut row)| {
                let mut sources: Vec<usize> = adjacency.neighbors(i).to_vec();
                if add_self_loops && !sources.contains(&i) {
                    sources.push(i);
                }
                if !sources.is_empty() {
                    let center = center_proj.row(i);
                    let mut alpha = vec![0.0f32; sources.len()];

                    for h in 0..heads {
                        let offset = h * channels;
                        let att = self.attention.row(h);

                        for (score, &j) in alpha.iter_mut().zip(&sources) {
                            let nj = neighbor_proj.row(j);
                            *score = (0..channels)
                                .map(|c| {
                                    let z = nj[offset + c] + center[offset + c];
                                    att[c] * leaky_relu(z, negative_slope)
                                })
                                .sum();
                        }
                        softmax_in_place(&mut alpha);

                        for (&weight, &j) in alpha.iter().zip(&sources) {
                            let nj = neighbor_proj.row(j);
                            for c in 0..channels {
                                let message = weight * nj[offset + c];
                                if self.concat {
                                    row[offset + c] += message;
                                } else {
                                    row[c] += message / heads as f32;
                                }
                            }
                        }
                    }
                }
                row += &self.bias;
            });
        out
    }
}

impl AttentionParameters {
    /// Run the full layer stack. ELU between layers, none after the last;
    /// dropout is a training-time concern and never applied here.
    pub fn forward(
        &self,
        x: ArrayView2<'_, f32>,
        adjacency: &CsrAdjacency,
        add_self_loops: bool,
    ) -> Array2<f32> {
        let last = self.layers.len().saturating_sub(1);
        let mut h = x.to_owned();
        for (index, layer) in self.layers.iter().enumerate() {
            h = layer.forward(h.view(), adjacency, add_self_loops, self.negative_slope);
            if index < last {
                h.mapv_inplace(elu);
            }
        }
        h
    }
}
