//! An N-dimensional artificial-life simulation core: organisms execute a
//! small instruction set directly out of a shared toroidal grid, competing
//! for energy and cell ownership. This crate owns the simulation itself —
//! loading code into the world, advancing it tick by tick, and reporting raw
//! state — not visualization, persistence, or compilation from source text.

pub mod artifact;
pub mod config;
pub mod coord;
pub mod disassembler;
pub mod environment;
pub mod error;
pub mod isa;
pub mod limits;
pub mod memory;
pub mod molecule;
pub mod organism;
pub mod scheduler;
pub mod snapshot;
pub mod vm;
pub mod worldgen;

pub use artifact::ProgramArtifact;
pub use config::SimulationConfig;
pub use coord::Coord;
pub use environment::Environment;
pub use error::{ArtifactError, ConfigError, EnvironmentError};
pub use isa::{init as init_isa, IsaHandle};
pub use molecule::{Molecule, MoleculeType};
pub use organism::Organism;
pub use scheduler::Simulation;
pub use snapshot::RawTickState;
