//! The simulation scheduler (spec.md §4.8): single-threaded, cooperative
//! within one tick, with exactly one public operation, [`Simulation::tick`].
//! Construction is fallible (`ConfigError`, spec.md §7); once built, a
//! simulation never raises — every per-instruction failure is absorbed into
//! the acting organism's own state.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, trace};

use crate::artifact::ProgramArtifact;
use crate::config::{EnergyStrategyConfig, SimulationConfig};
use crate::coord::Coord;
use crate::environment::Environment;
use crate::error::{ArtifactError, ConfigError};
use crate::isa::IsaHandle;
use crate::organism::Organism;
use crate::snapshot::{capture_tick, RawTickState};
use crate::vm;
use crate::worldgen::{EnergyStrategy, GeyserStrategy, SolarStrategy};

/// Share of a parent's energy debited to a newly forked child (spec.md §9,
/// "Fork/spawn semantics" open question — resolved here as a fixed 0.5).
pub const DEFAULT_FORK_ENERGY_SHARE: f64 = 0.5;

pub struct Simulation {
    env: Environment,
    organisms: Vec<Organism>,
    next_id: u64,
    current_tick: u64,
    energy_strategies: Vec<EnergyStrategy>,
    rng: StdRng,
    isa: IsaHandle,
    max_ticks: Option<u64>,
    auto_pause_ticks: Vec<u64>,
    fork_energy_share: f64,
}

impl Simulation {
    pub fn from_config(config: &SimulationConfig) -> Result<Self, ConfigError> {
        if config.world_shape.is_empty() {
            return Err(ConfigError::EmptyWorldShape);
        }
        for (axis, &size) in config.world_shape.iter().enumerate() {
            if size <= 0 {
                return Err(ConfigError::NonPositiveAxis { axis, size });
            }
        }
        let mut env = Environment::new(config.world_shape.clone(), config.toroidal);

        for (index, object) in config.initial_world_objects.iter().enumerate() {
            let molecule = object.resolve()?;
            let position = object.position_coord();
            if position.dim() != env.dim() {
                return Err(ConfigError::BadInitialWorldObject { index });
            }
            let Some(position) = env.normalize(&position) else {
                return Err(ConfigError::BadInitialWorldObject { index });
            };
            env.set(&position, molecule)
                .map_err(|_| ConfigError::BadInitialWorldObject { index })?;
        }

        let mut energy_strategies = Vec::with_capacity(config.energy_strategies.len());
        for raw in &config.energy_strategies {
            let resolved = raw.resolve()?;
            energy_strategies.push(match resolved {
                EnergyStrategyConfig::Solar {
                    probability,
                    amount,
                    safety_radius,
                    sample_fraction,
                } => {
                    let mut solar = SolarStrategy::new(probability, amount, safety_radius);
                    solar.sample_fraction = sample_fraction;
                    EnergyStrategy::Solar(solar)
                }
                EnergyStrategyConfig::Geyser {
                    count,
                    interval,
                    amount,
                    safety_radius,
                } => EnergyStrategy::Geyser(GeyserStrategy::new(count, interval, amount, safety_radius)),
            });
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut organisms = Vec::with_capacity(config.initial_organisms.len());
        let mut next_id = 1u64;
        for (index, init) in config.initial_organisms.iter().enumerate() {
            let position = init.position_coord();
            if position.dim() != env.dim() {
                return Err(ConfigError::BadInitialOrganismPosition { index });
            }
            if env.normalize(&position).is_none() {
                return Err(ConfigError::InitialOrganismOutOfBounds { index });
            }
            let dv = init.dv_coord(env.dim());
            organisms.push(Organism::new(
                next_id,
                init.program_id.clone(),
                None,
                0,
                position,
                dv,
                init.initial_energy,
            ));
            next_id += 1;
        }

        Ok(Self {
            env,
            organisms,
            next_id,
            current_tick: 0,
            energy_strategies,
            rng,
            isa: crate::isa::init(),
            max_ticks: config.max_ticks,
            auto_pause_ticks: config.auto_pause_ticks.clone().unwrap_or_default(),
            fork_energy_share: DEFAULT_FORK_ENERGY_SHARE,
        })
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn organisms(&self) -> &[Organism] {
        &self.organisms
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    /// Places `artifact` relative to the spawn position of every live
    /// organism whose `program_id` matches it. A config may list several
    /// initial organisms sharing one program; each gets its own copy.
    pub fn place_artifact(&mut self, artifact: &ProgramArtifact) -> Result<(), ArtifactError> {
        let origins: Vec<Coord> = self
            .organisms
            .iter()
            .filter(|o| o.program_id.as_deref() == Some(artifact.program_id.as_str()))
            .map(|o| o.ip.clone())
            .collect();
        for origin in origins {
            artifact.place(&mut self.env, &origin)?;
        }
        Ok(())
    }

    /// Advances the simulation by exactly one unit of time (spec.md §4.8):
    /// snapshot the roster, let each live organism act in order, spawn any
    /// forks it requested, run energy strategies, then increment the tick
    /// counter and emit a raw snapshot.
    pub fn tick(&mut self) -> RawTickState {
        let roster_len = self.organisms.len();
        let mut forks = Vec::new();

        for index in 0..roster_len {
            if self.organisms[index].is_dead {
                continue;
            }
            let decided = vm::plan(&self.organisms[index], &self.env, self.isa);
            vm::execute(&mut self.organisms[index], &mut self.env, decided);
            if let Some(fork) = self.organisms[index].pending_fork.take() {
                forks.push((self.organisms[index].id, fork.delta));
            }
        }

        for (parent_id, delta) in forks {
            self.spawn_fork(parent_id, delta);
        }

        for strategy in &mut self.energy_strategies {
            strategy.apply(&mut self.env, self.current_tick, &mut self.rng);
        }

        self.current_tick += 1;
        trace!(tick = self.current_tick, organisms = self.organisms.len(), "tick complete");
        capture_tick(self.current_tick as i64, &self.env, &self.organisms)
    }

    /// Allocates a child id, debits the parent's energy, and places the
    /// child at `parent.ip + delta` (spec.md §9, "Fork/spawn semantics" open
    /// question). Silently declines the fork if the target cell is
    /// foreign-owned, out of bounds, or the parent can't afford the share —
    /// the parent keeps running either way.
    fn spawn_fork(&mut self, parent_id: u64, delta: Coord) {
        let Some(parent_index) = self.organisms.iter().position(|o| o.id == parent_id) else {
            return;
        };
        let (parent_ip, parent_dv, parent_program, parent_er) = {
            let parent = &self.organisms[parent_index];
            (
                parent.ip.clone(),
                parent.dv.clone(),
                parent.program_id.clone(),
                parent.er,
            )
        };

        let Some(target) = self.env.target_coordinate(&parent_ip, &delta) else {
            debug!(parent_id, "fork target left the world, declined");
            return;
        };
        if let Ok(existing) = self.env.get(&target) {
            if !existing.is_empty() {
                let owner = self.env.owner(&target).unwrap_or(0);
                if owner != 0 && owner != parent_id {
                    debug!(parent_id, "fork target is foreign-owned, declined");
                    return;
                }
            }
        }

        let share = ((parent_er as f64) * self.fork_energy_share).floor() as i64;
        if share <= 0 || share > parent_er {
            debug!(parent_id, share, "fork declined, insufficient energy");
            return;
        }

        self.organisms[parent_index].er -= share;
        let child_id = self.next_id;
        self.next_id += 1;
        // current_tick hasn't been incremented yet this tick; the child is
        // first visible in the snapshot tagged with current_tick + 1.
        let child_birth_tick = self.current_tick + 1;
        let child = Organism::new(child_id, parent_program, Some(parent_id), child_birth_tick, target, parent_dv, share);
        debug!(parent_id, child_id, share, "organism forked");
        self.organisms.push(child);
    }

    /// Runs ticks until `maxTicks` is reached or an `autoPauseTicks` entry is
    /// hit, collecting every produced snapshot (spec.md §6).
    pub fn run(&mut self) -> Vec<RawTickState> {
        let mut snapshots = Vec::new();
        loop {
            if let Some(max) = self.max_ticks {
                if self.current_tick >= max {
                    break;
                }
            }
            let snapshot = self.tick();
            let should_pause = self.auto_pause_ticks.contains(&self.current_tick);
            snapshots.push(snapshot);
            if should_pause {
                break;
            }
        }
        snapshots
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::InitialOrganismConfig;
    use crate::molecule::{Molecule, MoleculeType};

    #[test]
    fn rejects_empty_world_shape() {
        let config = SimulationConfig {
            world_shape: vec![],
            toroidal: false,
            seed: None,
            energy_strategies: vec![],
            auto_pause_ticks: None,
            max_ticks: None,
            initial_world_objects: vec![],
            initial_organisms: vec![],
        };
        assert!(matches!(
            Simulation::from_config(&config),
            Err(ConfigError::EmptyWorldShape)
        ));
    }

    #[test]
    fn rejects_out_of_bounds_initial_organism() {
        let config = SimulationConfig {
            world_shape: vec![4, 4],
            toroidal: false,
            seed: Some(1),
            energy_strategies: vec![],
            auto_pause_ticks: None,
            max_ticks: None,
            initial_world_objects: vec![],
            initial_organisms: vec![InitialOrganismConfig {
                program_id: None,
                position: vec![10, 10],
                initial_energy: 10,
                dv: None,
            }],
        };
        assert!(matches!(
            Simulation::from_config(&config),
            Err(ConfigError::InitialOrganismOutOfBounds { index: 0 })
        ));
    }

    #[test]
    fn seeds_initial_world_objects_before_the_first_tick() {
        let config = SimulationConfig {
            world_shape: vec![5, 5],
            toroidal: false,
            seed: Some(1),
            energy_strategies: vec![],
            auto_pause_ticks: None,
            max_ticks: None,
            initial_world_objects: vec![crate::config::InitialWorldObjectConfig {
                position: vec![2, 2],
                molecule_type: "STRUCTURE".into(),
                value: 9,
            }],
            initial_organisms: vec![],
        };
        let sim = Simulation::from_config(&config).unwrap();
        assert_eq!(
            sim.environment().get(&Coord::new(vec![2, 2])).unwrap(),
            Molecule::new(MoleculeType::Structure, 9)
        );
    }

    #[test]
    fn rejects_unknown_molecule_type_in_initial_world_objects() {
        let config = SimulationConfig {
            world_shape: vec![5, 5],
            toroidal: false,
            seed: Some(1),
            energy_strategies: vec![],
            auto_pause_ticks: None,
            max_ticks: None,
            initial_world_objects: vec![crate::config::InitialWorldObjectConfig {
                position: vec![2, 2],
                molecule_type: "PLASMA".into(),
                value: 9,
            }],
            initial_organisms: vec![],
        };
        assert!(matches!(
            Simulation::from_config(&config),
            Err(ConfigError::UnknownMoleculeType(name)) if name == "PLASMA"
        ));
    }

    #[test]
    fn tick_advances_organism_and_reports_snapshot() {
        let config = SimulationConfig {
            world_shape: vec![10, 10],
            toroidal: false,
            seed: Some(1),
            energy_strategies: vec![],
            auto_pause_ticks: None,
            max_ticks: None,
            initial_world_objects: vec![],
            initial_organisms: vec![InitialOrganismConfig {
                program_id: None,
                position: vec![0, 0],
                initial_energy: 10,
                dv: Some(vec![1, 0]),
            }],
        };
        let mut sim = Simulation::from_config(&config).unwrap();
        let nop = sim.isa.by_name("NOP").unwrap().id;
        sim.env
            .set(&Coord::new(vec![0, 0]), Molecule::new(MoleculeType::Code, nop as i32))
            .unwrap();
        sim.env
            .set(&Coord::new(vec![1, 0]), Molecule::new(MoleculeType::Code, nop as i32))
            .unwrap();

        let snapshot = sim.tick();
        assert_eq!(snapshot.tick_number, 1);
        assert_eq!(snapshot.organisms[0].er, 9);
    }
}
