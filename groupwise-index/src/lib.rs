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

//! Groupwise Index Layer
//!
//! Graph structures over user embeddings:
//!
//! - **k-NN graph** (`knn`): exact cosine k-nearest-neighbor graph with a
//!   deterministic index-based tie-break
//! - **CSR adjacency** (`csr`): flat neighbor arrays consumed by the refiner

pub mod csr;
pub mod knn;

pub use csr::CsrAdjacency;
pub use knn::{KnnGraphBuilder, SimilarityGraph};
