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

//! Grouping configuration
//!
//! Every knob of the pipeline is externally settable. A TOML file may set any
//! subset of them; omitted sections and fields keep their defaults:
//!
//! ```toml
//! [graph]
//! k = 10
//!
//! [groups]
//! min_size = 3
//! max_size = 5
//!
//! [evolution]
//! population_size = 50
//! generations = 40
//! seed = 42
//! ```

use crate::error::{GroupingError, GroupingResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Default neighbor count for the similarity graph
pub const DEFAULT_NEIGHBORS: usize = 10;

/// Default lower bound for group sizes
pub const DEFAULT_MIN_GROUP_SIZE: usize = 3;

/// Default upper bound for group sizes
pub const DEFAULT_MAX_GROUP_SIZE: usize = 5;

/// Top-level configuration for one grouping pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    /// Similarity graph construction
    pub graph: GraphConfig,
    /// Soft group-size constraints
    pub groups: GroupSizeConfig,
    /// Genetic search parameters
    pub evolution: EvolutionConfig,
    /// Attention refiner behavior
    pub refiner: RefinerConfig,
}

impl GroupingConfig {
    /// Parse a configuration from TOML text and validate it.
    pub fn from_toml_str(text: &str) -> GroupingResult<Self> {
        let config: GroupingConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file from disk.
    pub fn load(path: impl AsRef<Path>) -> GroupingResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), ?config, "Loaded grouping configuration");
        Ok(config)
    }

    /// Check every section for values the pipeline cannot run with.
    pub fn validate(&self) -> GroupingResult<()> {
        self.graph.validate()?;
        self.groups.validate()?;
        self.evolution.validate()?;
        Ok(())
    }
}

/// k-nearest-neighbor graph settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Neighbors kept per node (capped at N-1)
    pub k: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_NEIGHBORS,
        }
    }
}

impl GraphConfig {
    fn validate(&self) -> GroupingResult<()> {
        if self.k == 0 {
            return Err(GroupingError::Config("graph.k must be at least 1".into()));
        }
        Ok(())
    }
}

/// Soft bounds on group sizes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupSizeConfig {
    pub min_size: usize,
    pub max_size: usize,
}

impl Default for GroupSizeConfig {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_MIN_GROUP_SIZE,
            max_size: DEFAULT_MAX_GROUP_SIZE,
        }
    }
}

impl GroupSizeConfig {
    pub fn new(min_size: usize, max_size: usize) -> Self {
        Self { min_size, max_size }
    }

    /// Number of groups for `n_users`: ceil(N / mean(min, max)), at least 1.
    pub fn group_count(&self, n_users: usize) -> usize {
        let mean = (self.min_size as f64 + self.max_size as f64) / 2.0;
        ((n_users as f64 / mean).ceil() as usize).max(1)
    }

    pub fn validate(&self) -> GroupingResult<()> {
        if self.min_size == 0 {
            return Err(GroupingError::Config(
                "groups.min_size must be at least 1".into(),
            ));
        }
        if self.max_size < self.min_size {
            return Err(GroupingError::Config(format!(
                "groups.max_size ({}) is smaller than groups.min_size ({})",
                self.max_size, self.min_size
            )));
        }
        Ok(())
    }
}

/// Genetic search parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Individuals per generation
    pub population_size: usize,
    /// Generations to run
    pub generations: usize,
    /// Probability that a consecutive pair is crossed over
    pub crossover_prob: f64,
    /// Probability that an individual is mutated
    pub mutation_prob: f64,
    /// Per-gene swap/replace probability inside crossover and mutation
    pub gene_prob: f64,
    /// Aspirants per tournament
    pub tournament_size: usize,
    /// Fixed seed; `None` draws one from OS entropy
    pub seed: Option<u64>,
    /// Wall-clock budget in milliseconds, checked between generations
    pub time_budget_ms: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 40,
            crossover_prob: 0.5,
            mutation_prob: 0.2,
            gene_prob: 0.1,
            tournament_size: 3,
            seed: None,
            time_budget_ms: None,
        }
    }
}

impl EvolutionConfig {
    /// Same configuration with a fixed seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> GroupingResult<()> {
        if self.population_size == 0 {
            return Err(GroupingError::Config(
                "evolution.population_size must be at least 1".into(),
            ));
        }
        if self.tournament_size == 0 {
            return Err(GroupingError::Config(
                "evolution.tournament_size must be at least 1".into(),
            ));
        }
        for (name, p) in [
            ("crossover_prob", self.crossover_prob),
            ("mutation_prob", self.mutation_prob),
            ("gene_prob", self.gene_prob),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(GroupingError::Config(format!(
                    "evolution.{} must be within [0, 1], got {}",
                    name, p
                )));
            }
        }
        Ok(())
    }
}

/// Which side of a k-NN edge a node aggregates over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationDirection {
    /// Node i attends over its own neighbor list
    #[default]
    Outgoing,
    /// Node i attends over the nodes whose neighbor list contains i
    Incoming,
}

/// Graph attention refiner settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinerConfig {
    /// Include every node in its own neighbor set
    pub add_self_loops: bool,
    pub direction: AggregationDirection,
}

impl Default for RefinerConfig {
    fn default() -> Self {
        Self {
            add_self_loops: true,
            direction: AggregationDirection::Outgoing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GroupingConfig::default();
        assert_eq!(config.graph.k, 10);
        assert_eq!(config.groups, GroupSizeConfig::new(3, 5));
        assert_eq!(config.evolution.population_size, 50);
        assert_eq!(config.evolution.generations, 40);
        assert_eq!(config.evolution.crossover_prob, 0.5);
        assert_eq!(config.evolution.mutation_prob, 0.2);
        assert_eq!(config.evolution.gene_prob, 0.1);
        assert_eq!(config.evolution.tournament_size, 3);
        assert!(config.evolution.seed.is_none());
        assert!(config.refiner.add_self_loops);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_group_count() {
        let sizes = GroupSizeConfig::default();
        assert_eq!(sizes.group_count(1), 1);
        assert_eq!(sizes.group_count(4), 1);
        assert_eq!(sizes.group_count(5), 2);
        assert_eq!(sizes.group_count(6), 2);
        assert_eq!(sizes.group_count(100), 25);
        assert_eq!(GroupSizeConfig::new(2, 3).group_count(7), 3);
    }

    #[test]
    fn test_group_count_extreme_bounds() {
        let huge = GroupSizeConfig::new(usize::MAX, usize::MAX);
        assert_eq!(huge.group_count(10), 1);
        assert!(huge.validate().is_ok());
        assert!(GroupSizeConfig::new(0, 0).validate().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let config = GroupingConfig::from_toml_str(
            r#"
            [groups]
            max_size = 8

            [evolution]
            seed = 7
            generations = 10

            [refiner]
            direction = "incoming"
            "#,
        )
        .unwrap();
        assert_eq!(config.groups.min_size, 3);
        assert_eq!(config.groups.max_size, 8);
        assert_eq!(config.evolution.seed, Some(7));
        assert_eq!(config.evolution.generations, 10);
        assert_eq!(config.evolution.population_size, 50);
        assert_eq!(config.refiner.direction, AggregationDirection::Incoming);
        assert_eq!(config.graph.k, 10);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(GroupingConfig::from_toml_str("[graph]\nk = 0").is_err());
        assert!(GroupingConfig::from_toml_str("[groups]\nmin_size = 6\nmax_size = 5").is_err());
        assert!(GroupingConfig::from_toml_str("[evolution]\nmutation_prob = 1.5").is_err());
        assert!(GroupingConfig::from_toml_str("[evolution]\npopulation_size = 0").is_err());
        assert!(GroupingConfig::from_toml_str("[evolution]\ntournament_size = 0").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("groupwise.toml");
        std::fs::write(&path, "[graph]\nk = 4\n").unwrap();

        let config = GroupingConfig::load(&path).unwrap();
        assert_eq!(config.graph.k, 4);
    }
}
