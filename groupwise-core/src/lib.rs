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

//! Groupwise Core
//!
//! Shared types for the grouping pipeline:
//! - **Embeddings**: validated per-user vectors packed into an N x D matrix
//! - **Similarity**: cosine similarity and the dense N x N similarity matrix
//! - **Assignment**: the final group id -> user ids mapping
//! - **Config**: every externally settable knob, loadable from TOML
//! - **Errors**: one error type for the whole workspace
//!
//! Runs are cancelled cooperatively through `tokio_util`'s
//! [`CancellationToken`]; only its synchronous flag is used, no runtime.

pub mod assignment;
pub mod config;
pub mod embedding;
pub mod error;
pub mod similarity;

pub use assignment::GroupAssignment;
pub use config::{
    AggregationDirection, EvolutionConfig, GraphConfig, GroupSizeConfig, GroupingConfig,
    RefinerConfig,
};
pub use embedding::{EmbeddingSet, UserEmbedding, UserId};
pub use error::{GroupingError, GroupingResult};
pub use similarity::{cosine_similarity, SimilarityMatrix};
pub use tokio_util::sync::CancellationToken;
