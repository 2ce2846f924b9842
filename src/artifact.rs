//! Program artifacts consumed from an external compiler (spec.md §6). Only
//! `machine_code_layout` and `initial_world_objects` are required for
//! execution; everything else is opaque to the core and forwarded verbatim
//! to downstream consumers.
//!
//! Coordinate-keyed fields are lists of pairs rather than maps: `Coord`
//! doesn't serialize to a string, and most wire formats require string map
//! keys.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::coord::Coord;
use crate::environment::Environment;
use crate::error::ArtifactError;
use crate::molecule::Molecule;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramArtifact {
    pub program_id: String,
    /// Relative coordinate -> machine word, placed relative to an
    /// organism's spawn position.
    pub machine_code_layout: Vec<(Coord, i32)>,
    /// Relative coordinate -> molecule, for non-code initial world contents
    /// (e.g. pre-seeded STRUCTURE or ENERGY molecules).
    pub initial_world_objects: Vec<(Coord, Molecule)>,
    #[serde(default)]
    pub source_map: Vec<(Coord, String)>,
    #[serde(default)]
    pub label_address_to_name: Vec<(Coord, String)>,
    #[serde(default)]
    pub call_site_bindings: Vec<(Coord, Vec<String>)>,
    #[serde(default)]
    pub proc_name_to_param_names: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub register_alias_map: HashMap<String, i32>,
}

impl ProgramArtifact {
    /// Writes this artifact's code and initial objects into `env`, anchored
    /// at `origin` (an organism's spawn position). Every coordinate in the
    /// artifact is relative to `origin`; `origin + relative` is normalized
    /// through the environment's own toroidal policy.
    pub fn place(&self, env: &mut Environment, origin: &Coord) -> Result<(), ArtifactError> {
        for (relative, word) in &self.machine_code_layout {
            let absolute = self.resolve(env, origin, relative)?;
            env.set(&absolute, Molecule::decode(*word))
                .map_err(|_| ArtifactError::OutOfBounds)?;
        }
        for (relative, molecule) in &self.initial_world_objects {
            let absolute = self.resolve(env, origin, relative)?;
            env.set(&absolute, *molecule)
                .map_err(|_| ArtifactError::OutOfBounds)?;
        }
        Ok(())
    }

    fn resolve(
        &self,
        env: &Environment,
        origin: &Coord,
        relative: &Coord,
    ) -> Result<Coord, ArtifactError> {
        if relative.dim() != origin.dim() {
            return Err(ArtifactError::DimensionMismatch {
                expected: origin.dim(),
                got: relative.dim(),
            });
        }
        env.target_coordinate(origin, relative)
            .ok_or(ArtifactError::OutOfBounds)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::molecule::MoleculeType;

    fn empty_artifact() -> ProgramArtifact {
        ProgramArtifact {
            program_id: "p".into(),
            machine_code_layout: Vec::new(),
            initial_world_objects: Vec::new(),
            source_map: Vec::new(),
            label_address_to_name: Vec::new(),
            call_site_bindings: Vec::new(),
            proc_name_to_param_names: HashMap::new(),
            register_alias_map: HashMap::new(),
        }
    }

    #[test]
    fn place_writes_code_and_objects_relative_to_origin() {
        let mut env = Environment::new(vec![10, 10], false);
        let mut artifact = empty_artifact();
        artifact
            .machine_code_layout
            .push((Coord::new(vec![0, 0]), 7));
        artifact.initial_world_objects.push((
            Coord::new(vec![1, 0]),
            Molecule::new(MoleculeType::Structure, 3),
        ));

        artifact.place(&mut env, &Coord::new(vec![2, 2])).unwrap();
        assert_eq!(env.get(&Coord::new(vec![2, 2])).unwrap(), Molecule::decode(7));
        assert_eq!(
            env.get(&Coord::new(vec![3, 2])).unwrap(),
            Molecule::new(MoleculeType::Structure, 3)
        );
    }

    #[test]
    fn place_rejects_dimension_mismatch() {
        let mut env = Environment::new(vec![10, 10], false);
        let mut artifact = empty_artifact();
        artifact
            .machine_code_layout
            .push((Coord::new(vec![0, 0, 0]), 1));
        let err = artifact.place(&mut env, &Coord::new(vec![0, 0])).unwrap_err();
        assert!(matches!(err, ArtifactError::DimensionMismatch { .. }));
    }
}
