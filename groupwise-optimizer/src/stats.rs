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

//! Per-generation fitness statistics (the run's logbook).

use crate::operators::Individual;
use serde::{Deserialize, Serialize};

/// Fitness summary of one evaluated generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// 0 is the initial population
    pub generation: usize,
    /// Individuals whose fitness had to be computed this generation
    pub evaluations: usize,
    pub avg: f64,
    pub max: f64,
    pub min: f64,
}

impl GenerationStats {
    pub fn collect(generation: usize, evaluations: usize, population: &[Individual]) -> Self {
        let scores: Vec<f64> = population.iter().filter_map(Individual::fitness).collect();
        if scores.is_empty() {
            return Self {
                generation,
                evaluations,
                avg: 0.0,
                max: 0.0,
                min: 0.0,
            };
        }
        Self {
            generation,
            evaluations,
            avg: scores.iter().sum::<f64>() / scores.len() as f64,
            max: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            min: scores.iter().copied().fold(f64::INFINITY, f64::min),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect() {
        let pop: Vec<Individual> = [0.5, -0.5, 1.5]
            .iter()
            .map(|&f| {
                let mut ind = Individual::new(vec![0]);
                ind.set_fitness(f);
                ind
            })
            .collect();
        let stats = GenerationStats::collect(4, 2, &pop);
        assert_eq!(stats.generation, 4);
        assert_eq!(stats.evaluations, 2);
        assert_eq!(stats.max, 1.5);
        assert_eq!(stats.min, -0.5);
        assert!((stats.avg - 0.5).abs() < 1e-12);
    }
}
