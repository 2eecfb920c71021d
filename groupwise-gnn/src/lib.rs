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

//! Groupwise Graph Attention
//!
//! Refines user embeddings by propagating information along the k-NN
//! similarity graph through stacked multi-head attention layers.
//!
//! - **Parameters** (`params`): the immutable trained artifact, its
//!   validation, fingerprint and on-disk formats
//! - **Store** (`store`): the shared read-only handle with explicit reload
//! - **Attention** (`attention`): the per-layer forward pass
//! - **Refiner** (`refiner`): request-time inference entry point
//!
//! Inference is a pure function of (graph, embeddings, parameters): dropout
//! and every other stochastic regulariser are absent, so repeated calls give
//! bit-identical output.

pub mod attention;
pub mod params;
pub mod refiner;
pub mod store;

pub use params::{Architecture, AttentionParameters, LayerParameters, DEFAULT_NEGATIVE_SLOPE};
pub use refiner::GraphAttentionRefiner;
pub use store::ParameterStore;
