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

//! Individuals and the selection / variation operators.
//!
//! Every operator draws from the caller's RNG in a fixed order regardless of
//! outcome (one draw per gene, per pair, per individual), so a seeded run is
//! reproducible end to end.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// One candidate partition: `genes[user] = group id` in `[0, G)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    genes: Vec<usize>,
    /// `None` until evaluated, and again after any gene changes
    fitness: Option<f64>,
}

impl Individual {
    pub fn new(genes: Vec<usize>) -> Self {
        Self {
            genes,
            fitness: None,
        }
    }

    /// Each gene drawn independently and uniformly from `[0, group_count)`.
    pub fn random<R: Rng>(len: usize, group_count: usize, rng: &mut R) -> Self {
        Self::new((0..len).map(|_| rng.gen_range(0..group_count)).collect())
    }

    pub fn genes(&self) -> &[usize] {
        &self.genes
    }

    pub fn into_genes(self) -> Vec<usize> {
        self.genes
    }

    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }

    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = Some(fitness);
    }

    fn invalidate(&mut self) {
        self.fitness = None;
    }

    /// Ordering key; unevaluated individuals rank below everything.
    pub(crate) fn score(&self) -> f64 {
        self.fitness.unwrap_or(f64::NEG_INFINITY)
    }
}

/// Index of the fittest individual; the earliest wins ties.
pub fn fittest(population: &[Individual]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, ind) in population.iter().enumerate() {
        match best {
            Some(b) if population[b].score() >= ind.score() => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Draw `count` parents, each the fittest of `tournament_size` individuals
/// sampled uniformly with replacement.
pub fn tournament_select<R: Rng>(
    population: &[Individual],
    count: usize,
    tournament_size: usize,
    rng: &mut R,
) -> Vec<Individual> {
    if population.is_empty() {
        return Vec::new();
    }
    (0..count)
        .map(|_| {
            let mut winner = rng.gen_range(0..population.len());
            for _ in 1..tournament_size {
                let challenger = rng.gen_range(0..population.len());
                if population[challenger].score() > population[winner].score() {
                    winner = challenger;
                }
            }
            population[winner].clone()
        })
        .collect()
}

/// Swap each gene position between `a` and `b` with probability `gene_prob`.
/// Returns true if either individual's genes changed.
pub fn uniform_crossover<R: Rng>(
    a: &mut Individual,
    b: &mut Individual,
    gene_prob: f64,
    rng: &mut R,
) -> bool {
    let mut changed = false;
    for (x, y) in a.genes.iter_mut().zip(b.genes.iter_mut()) {
        if rng.gen::<f64>() < gene_prob && x != y {
            std::mem::swap(x, y);
            changed = true;
        }
    }
    if changed {
        a.invalidate();
        b.invalidate();
    }
    changed
}

/// Replace each gene with a fresh draw from `[0, group_count)` with
/// probability `gene_prob`. Returns true if any gene changed.
pub fn uniform_mutation<R: Rng>(
    individual: &mut Individual,
    group_count: usize,
    gene_prob: f64,
    rng: &mut R,
) -> bool {
    let mut changed = false;
    for gene in individual.genes.iter_mut() {
        if rng.gen::<f64>() < gene_prob {
            let fresh = rng.gen_range(0..group_count);
            if fresh != *gene {
                *gene = fresh;
                changed = true;
            }
        }
    }
    if changed {
        individual.invalidate();
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scored(genes: Vec<usize>, fitness: f64) -> Individual {
        let mut ind = Individual::new(genes);
        ind.set_fitness(fitness);
        ind
    }

    #[test]
    fn test_random_genes_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let ind = Individual::random(200, 7, &mut rng);
        assert_eq!(ind.genes().len(), 200);
        assert!(ind.genes().iter().all(|&g| g < 7));
        assert!(!ind.is_evaluated());
    }

    #[test]
    fn test_fittest_prefers_earliest_on_ties() {
        let pop = vec![
            scored(vec![0], 0.5),
            scored(vec![1], 0.9),
            scored(vec![2], 0.9),
            Individual::new(vec![3]),
        ];
        assert_eq!(fittest(&pop), Some(1));
        assert_eq!(fittest(&[]), None);
    }

    #[test]
    fn test_tournament_returns_requested_count() {
        let mut rng = StdRng::seed_from_u64(1);
        let pop: Vec<Individual> = (0..10).map(|i| scored(vec![i], i as f64)).collect();
        let parents = tournament_select(&pop, 25, 3, &mut rng);
        assert_eq!(parents.len(), 25);
        assert!(parents.iter().all(Individual::is_evaluated));
    }

    #[test]
    fn test_large_tournament_always_finds_the_best() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut pop: Vec<Individual> = (0..4).map(|i| scored(vec![i], 0.0)).collect();
        pop[2].set_fitness(1.0);
        // 200 draws with replacement over 4 individuals
        let parents = tournament_select(&pop, 5, 200, &mut rng);
        assert!(parents.iter().all(|p| p.genes() == [2]));
    }

    #[test]
    fn test_crossover_probability_extremes() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut a = scored(vec![0, 0, 0, 0], 1.0);
        let mut b = scored(vec![1, 1, 1, 1], 1.0);

        assert!(!uniform_crossover(&mut a, &mut b, 0.0, &mut rng));
        assert!(a.is_evaluated());

        assert!(uniform_crossover(&mut a, &mut b, 1.0, &mut rng));
        assert_eq!(a.genes(), [1, 1, 1, 1]);
        assert_eq!(b.genes(), [0, 0, 0, 0]);
        assert!(!a.is_evaluated() && !b.is_evaluated());
    }

    #[test]
    fn test_crossover_preserves_gene_multiset() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut a = Individual::new(vec![0, 1, 2, 3, 4, 5]);
        let mut b = Individual::new(vec![5, 4, 3, 2, 1, 0]);
        uniform_crossover(&mut a, &mut b, 0.5, &mut rng);
        for i in 0..6 {
            let mut pair = [a.genes()[i], b.genes()[i]];
            pair.sort_unstable();
            assert_eq!(pair, [i.min(5 - i), i.max(5 - i)]);
        }
    }

    #[test]
    fn test_mutation_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut ind = scored(vec![0; 50], 0.3);
        uniform_mutation(&mut ind, 4, 1.0, &mut rng);
        assert!(ind.genes().iter().all(|&g| g < 4));
        assert!(ind.genes().iter().any(|&g| g != 0));
        assert!(!ind.is_evaluated());

        let mut untouched = scored(vec![1; 10], 0.3);
        assert!(!uniform_mutation(&mut untouched, 4, 0.0, &mut rng));
        assert!(untouched.is_evaluated());
    }

    #[test]
    fn test_single_group_mutation_never_changes() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut ind = scored(vec![0; 8], 0.3);
        assert!(!uniform_mutation(&mut ind, 1, 1.0, &mut rng));
        assert!(ind.is_evaluated());
    }
}
