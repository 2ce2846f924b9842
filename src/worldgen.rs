//! World-gen energy strategies (spec.md §4.9). Both variants only ever place
//! molecules into cells that pass `Environment::is_area_unowned` *at
//! placement time* — the safety radius is never re-checked retroactively.
//! The RNG is injected (seeded from `config::SimulationConfig::seed`) so
//! tests can pin behavior exactly, per spec.md's "RNG is injected" note.

use num_traits::float::FloatCore;
use rand::rngs::StdRng;
use rand::Rng;

use crate::coord::Coord;
use crate::environment::Environment;
use crate::molecule::{Molecule, MoleculeType};

/// Clamps a config-supplied probability into `[0, 1]` before it ever reaches
/// `Rng::random_bool`, which panics outside that range.
fn clamp_unit<T: FloatCore>(v: T) -> T {
    v.max(T::zero()).min(T::one())
}

/// Places an ENERGY molecule of `amount` at each qualifying cell with
/// probability `probability`, optionally only testing a sampled subset of
/// cells per tick (`sample_fraction`) rather than sweeping the whole world.
#[derive(Debug, Clone)]
pub struct SolarStrategy {
    pub probability: f64,
    pub amount: i32,
    pub safety_radius: i32,
    pub sample_fraction: Option<f64>,
}

impl SolarStrategy {
    pub fn new(probability: f64, amount: i32, safety_radius: i32) -> Self {
        Self {
            probability: clamp_unit(probability),
            amount,
            safety_radius,
            sample_fraction: None,
        }
    }

    pub fn apply(&self, env: &mut Environment, rng: &mut StdRng) {
        let total = env.len() as i64;
        for index in 0..total {
            if let Some(fraction) = self.sample_fraction {
                if !rng.random_bool(clamp_unit(fraction)) {
                    continue;
                }
            }
            if !rng.random_bool(self.probability) {
                continue;
            }
            let coord = env
                .flat_index_to_coord(index)
                .expect("index within env.len() always maps to a coordinate");
            if env.is_area_unowned(&coord, self.safety_radius) {
                let _ = env.write_owned(&coord, Molecule::new(MoleculeType::Energy, self.amount), 0);
            }
        }
    }
}

/// Chooses `count` source locations on its first tick (marking them
/// STRUCTURE), then every `interval`th tick thereafter places ENERGY of
/// `amount` in each axis-adjacent cell of each source that still qualifies.
#[derive(Debug, Clone)]
pub struct GeyserStrategy {
    pub count: usize,
    pub interval: u64,
    pub amount: i32,
    pub safety_radius: i32,
    sources: Option<Vec<Coord>>,
}

impl GeyserStrategy {
    pub fn new(count: usize, interval: u64, amount: i32, safety_radius: i32) -> Self {
        Self {
            count,
            interval,
            amount,
            safety_radius,
            sources: None,
        }
    }

    pub fn apply(&mut self, env: &mut Environment, tick: u64, rng: &mut StdRng) {
        if self.sources.is_none() {
            let chosen = self.choose_sources(env, rng);
            for source in &chosen {
                let _ = env.write_owned(source, Molecule::new(MoleculeType::Structure, 0), 0);
            }
            self.sources = Some(chosen);
        }

        if tick == 0 || tick % self.interval != 0 {
            return;
        }
        let Some(sources) = &self.sources else {
            return;
        };
        for source in sources {
            for neighbor in env.axis_neighbors(source) {
                if env.is_area_unowned(&neighbor, self.safety_radius) {
                    let _ =
                        env.write_owned(&neighbor, Molecule::new(MoleculeType::Energy, self.amount), 0);
                }
            }
        }
    }

    fn choose_sources(&self, env: &Environment, rng: &mut StdRng) -> Vec<Coord> {
        let mut sources = Vec::with_capacity(self.count);
        let max_attempts = self.count.saturating_mul(10_000).max(10_000);
        let mut attempts = 0;
        while sources.len() < self.count && attempts < max_attempts {
            attempts += 1;
            let coord = Coord::new(
                env.shape()
                    .iter()
                    .map(|&size| rng.random_range(0..size))
                    .collect(),
            );
            if !sources.contains(&coord) && env.is_area_unowned(&coord, self.safety_radius) {
                sources.push(coord);
            }
        }
        sources
    }
}

/// One configured world-gen variant, applied in the scheduler's configured
/// order after all organisms have acted (spec.md §4.8).
#[derive(Debug, Clone)]
pub enum EnergyStrategy {
    Solar(SolarStrategy),
    Geyser(GeyserStrategy),
}

impl EnergyStrategy {
    pub fn apply(&mut self, env: &mut Environment, tick: u64, rng: &mut StdRng) {
        match self {
            EnergyStrategy::Solar(s) => s.apply(env, rng),
            EnergyStrategy::Geyser(g) => g.apply(env, tick, rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn solar_never_places_within_safety_radius_of_an_owned_cell() {
        let mut env = Environment::new(vec![5, 5], false);
        env.set_owner(&Coord::new(vec![2, 2]), 99).unwrap();
        let solar = SolarStrategy::new(1.0, 11, 1);
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..50 {
            solar.apply(&mut env, &mut rng);
            for x in 1..=3 {
                for y in 1..=3 {
                    let coord = Coord::new(vec![x, y]);
                    if coord == Coord::new(vec![2, 2]) {
                        continue;
                    }
                    assert!(
                        env.get(&coord).unwrap().ty != MoleculeType::Energy,
                        "no energy should appear at {coord} within the safety radius"
                    );
                }
            }
        }
    }

    #[test]
    fn geyser_places_sources_once_and_energy_on_interval_ticks() {
        let mut env = Environment::new(vec![20, 20], true);
        let mut geyser = GeyserStrategy::new(3, 5, 4, 0);
        let mut rng = StdRng::seed_from_u64(7);

        geyser.apply(&mut env, 0, &mut rng);
        let sources = geyser.sources.clone().unwrap();
        assert_eq!(sources.len(), 3);
        for s in &sources {
            assert_eq!(env.get(s).unwrap().ty, MoleculeType::Structure);
        }

        geyser.apply(&mut env, 5, &mut rng);
        let mut any_energy = false;
        for s in &sources {
            for n in env.axis_neighbors(s) {
                if env.get(&n).unwrap().ty == MoleculeType::Energy {
                    any_energy = true;
                }
            }
        }
        assert!(any_energy);
    }
}
