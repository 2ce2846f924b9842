//! Error taxonomy (spec.md §7). Per-instruction failures never escape as
//! `Result`s — they're surfaced through `Organism::instruction_failed` /
//! `failure_reason`. Only `ConfigError` and `ArtifactError` are true `Result`
//! error types, mirroring the teacher's `VMLoadError` (`thiserror`-derived,
//! aborting construction rather than a running simulation).

use thiserror::Error;

/// Internal environment failure, converted at the VM boundary into an
/// organism failure string (spec.md §7: "Converted to an OrganismFailure for
/// the acting organism; the simulation continues.").
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvironmentError {
    #[error("coordinate out of bounds on a non-toroidal axis")]
    OutOfBounds,
    #[error("coordinate dimensionality does not match world shape")]
    InvalidShape,
}

/// Fatal at simulation-construction time (spec.md §7).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown molecule type name in config: {0}")]
    UnknownMoleculeType(String),
    #[error("world shape must have at least one axis")]
    EmptyWorldShape,
    #[error("world shape axis {axis} has non-positive size {size}")]
    NonPositiveAxis { axis: usize, size: i32 },
    #[error("unknown energy strategy: {0}")]
    UnknownEnergyStrategy(String),
    #[error("initial organism {index} has a position of the wrong dimensionality")]
    BadInitialOrganismPosition { index: usize },
    #[error("initial organism {index} position is out of bounds and not toroidal")]
    InitialOrganismOutOfBounds { index: usize },
    #[error("initial world object {index} has a position of the wrong dimensionality or is out of bounds")]
    BadInitialWorldObject { index: usize },
}

/// Raised when a [`crate::artifact::ProgramArtifact`] can't be placed into a
/// world (coordinates outside the world's shape, wrong dimensionality, etc).
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact layout coordinate has {got} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("artifact layout coordinate is out of bounds for a non-toroidal world")]
    OutOfBounds,
}
