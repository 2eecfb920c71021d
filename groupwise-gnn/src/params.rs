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

//! Trained attention parameters
//!
//! The artifact is produced offline and is immutable at request time. It is
//! stored either as JSON (`.json`) or bincode (any other extension); both
//! encode the same [`AttentionParameters`] structure.
//!
//! ## Layer shapes
//!
//! For a layer with `H` heads of `C` channels reading `F` input features:
//!
//! | field        | shape      |
//! |--------------|------------|
//! | `w_neighbor` | F x (H·C)  |
//! | `b_neighbor` | H·C        |
//! | `w_center`   | F x (H·C)  |
//! | `b_center`   | H·C        |
//! | `attention`  | H x C      |
//! | `bias`       | H·C if `concat`, else C |

use groupwise_core::{GroupingError, GroupingResult};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// LeakyReLU slope used inside the attention score
pub const DEFAULT_NEGATIVE_SLOPE: f32 = 0.2;

/// Weights of one multi-head attention layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerParameters {
    pub heads: usize,
    pub out_channels: usize,
    /// Concatenate head outputs (true) or average them (false)
    pub concat: bool,
    /// Projection of neighbor features; also the aggregated message
    pub w_neighbor: Array2<f32>,
    pub b_neighbor: Array1<f32>,
    /// Projection of the aggregating node's own features
    pub w_center: Array2<f32>,
    pub b_center: Array1<f32>,
    /// Per-head attention vector
    pub attention: Array2<f32>,
    /// Output bias added after aggregation
    pub bias: Array1<f32>,
}

impl LayerParameters {
    pub fn input_dim(&self) -> usize {
        self.w_neighbor.nrows()
    }

    pub fn output_dim(&self) -> usize {
        if self.concat {
            self.heads * self.out_channels
        } else {
            self.out_channels
        }
    }

    fn validate(&self, index: usize, expected_input: usize) -> GroupingResult<()> {
        let malformed = |msg: String| GroupingError::MalformedParameters(format!("layer {index}: {msg}"));

        if self.heads == 0 || self.out_channels == 0 {
            return Err(malformed("heads and out_channels must be non-zero".into()));
        }
        let width = self.heads * self.out_channels;
        let expect = |name: &str, found: &[usize], wanted: &[usize]| -> GroupingResult<()> {
            if found != wanted {
                return Err(malformed(format!(
                    "{name} has shape {found:?}, expected {wanted:?}"
                )));
            }
            Ok(())
        };

        expect("w_neighbor", self.w_neighbor.shape(), &[expected_input, width])?;
        expect("b_neighbor", self.b_neighbor.shape(), &[width])?;
        expect("w_center", self.w_center.shape(), &[expected_input, width])?;
        expect("b_center", self.b_center.shape(), &[width])?;
        expect("attention", self.attention.shape(), &[self.heads, self.out_channels])?;
        expect("bias", self.bias.shape(), &[self.output_dim()])?;

        let all_finite = self.w_neighbor.iter().all(|v| v.is_finite())
            && self.b_neighbor.iter().all(|v| v.is_finite())
            && self.w_center.iter().all(|v| v.is_finite())
            && self.b_center.iter().all(|v| v.is_finite())
            && self.attention.iter().all(|v| v.is_finite())
            && self.bias.iter().all(|v| v.is_finite());
        if !all_finite {
            return Err(malformed("contains non-finite values".into()));
        }
        Ok(())
    }
}

/// Shape of a layer stack, used to synthesise parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Architecture {
    pub input_dim: usize,
    pub hidden_channels: usize,
    pub heads: usize,
    /// Total number of layers, including the single-head output layer
    pub layers: usize,
    pub output_dim: usize,
}

impl Default for Architecture {
    /// The deployed model: 768 -> 3 x (4 heads x 512) -> 768.
    fn default() -> Self {
        Self {
            input_dim: 768,
            hidden_channels: 512,
            heads: 4,
            layers: 4,
            output_dim: 768,
        }
    }
}

/// The full refiner parameter artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttentionParameters {
    /// Free-form version label of the deployed artifact
    pub version: String,
    pub input_dim: usize,
    pub negative_slope: f32,
    pub layers: Vec<LayerParameters>,
}

impl AttentionParameters {
    /// Dimension of the refined embeddings.
    pub fn output_dim(&self) -> usize {
        self.layers.last().map_or(self.input_dim, LayerParameters::output_dim)
    }

    /// Reject anything the refiner cannot run: empty stacks, broken shape
    /// chains, a multi-head output layer, non-finite weights.
    pub fn validate(&self) -> GroupingResult<()> {
        if self.layers.is_empty() {
            return Err(GroupingError::MalformedParameters("no layers".into()));
        }
        if self.input_dim == 0 {
            return Err(GroupingError::MalformedParameters("input_dim is 0".into()));
        }
        if !self.negative_slope.is_finite() {
            return Err(GroupingError::MalformedParameters(
                "negative_slope is not finite".into(),
            ));
        }

        let mut features = self.input_dim;
        for (index, layer) in self.layers.iter().enumerate() {
            layer.validate(index, features)?;
            features = layer.output_dim();
        }

        if let Some(last) = self.layers.last() {
            if last.heads != 1 {
                return Err(GroupingError::MalformedParameters(format!(
                    "output layer must have a single head, found {}",
                    last.heads
                )));
            }
        }
        Ok(())
    }

    pub fn from_json_slice(bytes: &[u8]) -> GroupingResult<Self> {
        let params: Self = serde_json::from_slice(bytes)
            .map_err(|e| GroupingError::MalformedParameters(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_bincode_slice(bytes: &[u8]) -> GroupingResult<Self> {
        let params: Self = bincode::deserialize(bytes)
            .map_err(|e| GroupingError::MalformedParameters(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    /// Load and validate an artifact; the format follows the file extension.
    pub fn load(path: impl AsRef<Path>) -> GroupingResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            GroupingError::ServiceUnavailable(format!(
                "cannot read attention parameters at {}: {}",
                path.display(),
                e
            ))
        })?;
        if is_json(path) {
            Self::from_json_slice(&bytes)
        } else {
            Self::from_bincode_slice(&bytes)
        }
    }

    /// Write the artifact; the format follows the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> GroupingResult<()> {
        let path = path.as_ref();
        let bytes = if is_json(path) {
            serde_json::to_vec(self)?
        } else {
            bincode::serialize(self)?
        };
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// blake3 digest of the bincode encoding, hex encoded.
    pub fn fingerprint(&self) -> GroupingResult<String> {
        let bytes = bincode::serialize(self)?;
        Ok(blake3::hash(&bytes).to_hex().to_string())
    }

    /// Glorot-uniform parameters for an architecture.
    ///
    /// For tests, benchmarks and smoke runs only: these weights carry no
    /// trained signal.
    pub fn glorot(arch: &Architecture, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let layer_count = arch.layers.max(1);
        let mut layers = Vec::with_capacity(layer_count);
        let mut features = arch.input_dim;

        for index in 0..layer_count {
            let last = index + 1 == layer_count;
            let (heads, channels) = if last {
                (1, arch.output_dim)
            } else {
                (arch.heads, arch.hidden_channels)
            };
            let layer = glorot_layer(&mut rng, features, heads, channels);
            features = layer.output_dim();
            layers.push(layer);
        }

        Self {
            version: format!("synthetic-{seed}"),
            input_dim: arch.input_dim,
            negative_slope: DEFAULT_NEGATIVE_SLOPE,
            layers,
        }
    }
}

fn glorot_layer(rng: &mut StdRng, input: usize, heads: usize, channels: usize) -> LayerParameters {
    let width = heads * channels;
    let mut uniform = |rows: usize, cols: usize| {
        let limit = (6.0 / (rows + cols) as f32).sqrt();
        Array2::from_shape_fn((rows, cols), |_| rng.gen_range(-limit..=limit))
    };

    let w_neighbor = uniform(input, width);
    let w_center = uniform(input, width);
    let attention = uniform(heads, channels);

    LayerParameters {
        heads,
        out_channels: channels,
        concat: true,
        w_neighbor,
        b_neighbor: Array1::zeros(width),
        w_center,
        b_center: Array1::zeros(width),
        attention,
        bias: Array1::zeros(width),
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}
