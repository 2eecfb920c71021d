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

//! Groupwise Engine
//!
//! Wires the graph builder, attention refiner and genetic optimizer into one
//! grouping call, and defines the JSON request/response contract.

pub mod pipeline;
pub mod request;

pub use pipeline::{GroupingOutcome, GroupingPipeline, RunOptions};
pub use request::{GroupingRequest, GroupingResponse};
