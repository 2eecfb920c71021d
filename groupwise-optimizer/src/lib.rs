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

//! Groupwise Partition Optimizer
//!
//! Seeded genetic search for a user-to-group assignment:
//!
//! - **Fitness** (`fitness`): summed within-group cosine cohesion minus soft
//!   size penalties
//! - **Operators** (`operators`): tournament selection, uniform crossover and
//!   uniform integer mutation
//! - **Search** (`genetic`): the generational loop with cancellation and a
//!   wall-clock budget
//! - **Logbook** (`stats`): per-generation fitness summary

pub mod fitness;
pub mod genetic;
pub mod operators;
pub mod stats;

pub use fitness::{CohesionFitness, FitnessBreakdown, SIZE_PENALTY};
pub use genetic::{GeneticOptimizer, OptimizerRun, StopReason};
pub use operators::{fittest, tournament_select, uniform_crossover, uniform_mutation, Individual};
pub use stats::GenerationStats;
