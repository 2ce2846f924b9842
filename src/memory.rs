//! Memory reader abstraction (spec.md §4.4): a uniform way to read a molecule
//! at a coordinate, backed either by a live [`Environment`] or a frozen raw
//! tick snapshot. The disassembler is written entirely against this trait so
//! the runtime and an offline indexer share the exact same decode logic
//! (spec.md §9, "Duplicated interpretation in runtime vs. debug indexer").

use hashbrown::HashMap;

use crate::coord::Coord;
use crate::environment::Environment;
use crate::molecule::Molecule;
use crate::snapshot::RawCellState;

pub trait MemoryReader {
    fn get(&self, coord: &Coord) -> Molecule;
    fn shape(&self) -> &[i32];
    fn toroidal(&self) -> &[bool];

    fn dim(&self) -> usize {
        self.shape().len()
    }

    /// Wraps each axis modulo its size if toroidal, otherwise rejects
    /// out-of-range coordinates — the same policy as `Environment::normalize`,
    /// but usable against either backing store.
    fn normalize(&self, coord: &Coord) -> Option<Coord> {
        if coord.dim() != self.dim() {
            return None;
        }
        let mut out = vec![0i32; self.dim()];
        for axis in 0..self.dim() {
            let size = self.shape()[axis];
            let c = coord.get(axis);
            if self.toroidal()[axis] {
                out[axis] = c.rem_euclid(size);
            } else if c < 0 || c >= size {
                return None;
            } else {
                out[axis] = c;
            }
        }
        Some(Coord::new(out))
    }

    /// Advances one cell along `dv` from `coord`, normalizing the result.
    fn step(&self, coord: &Coord, dv: &Coord) -> Option<Coord> {
        self.normalize(&coord.added(dv))
    }
}

/// Reads directly from a live, mutable-elsewhere [`Environment`].
pub struct EnvironmentReader<'a> {
    env: &'a Environment,
}

impl<'a> EnvironmentReader<'a> {
    pub fn new(env: &'a Environment) -> Self {
        Self { env }
    }
}

impl MemoryReader for EnvironmentReader<'_> {
    fn get(&self, coord: &Coord) -> Molecule {
        self.env.get(coord).unwrap_or(Molecule::EMPTY)
    }

    fn shape(&self) -> &[i32] {
        self.env.shape()
    }

    fn toroidal(&self) -> &[bool] {
        self.env.toroidal()
    }
}

/// Reads from a frozen set of `(coord -> molecule)` cells taken from a raw
/// tick (spec.md §4.4). Coordinates absent from the snapshot are empty.
pub struct SnapshotReader {
    shape: Vec<i32>,
    toroidal: Vec<bool>,
    cells: HashMap<Coord, Molecule>,
}

impl SnapshotReader {
    pub fn new(shape: Vec<i32>, toroidal: Vec<bool>, cells: &[RawCellState]) -> Self {
        let map = cells
            .iter()
            .map(|c| (c.coord.clone(), Molecule::decode(c.molecule_word)))
            .collect();
        Self {
            shape,
            toroidal,
            cells: map,
        }
    }

    /// Builds a reader that inherits its shape/toroidal policy from the
    /// environment the snapshot originated from (spec.md §4.4: "snapshot
    /// inherits its origin shape").
    pub fn from_environment_origin(env: &Environment, cells: &[RawCellState]) -> Self {
        Self::new(env.shape().to_vec(), env.toroidal().to_vec(), cells)
    }
}

impl MemoryReader for SnapshotReader {
    fn get(&self, coord: &Coord) -> Molecule {
        self.cells.get(coord).copied().unwrap_or(Molecule::EMPTY)
    }

    fn shape(&self) -> &[i32] {
        &self.shape
    }

    fn toroidal(&self) -> &[bool] {
        &self.toroidal
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::molecule::MoleculeType;

    #[test]
    fn snapshot_reader_defaults_missing_cells_to_empty() {
        let reader = SnapshotReader::new(vec![4, 4], vec![false, false], &[]);
        assert!(reader.get(&Coord::new(vec![0, 0])).is_empty());
    }

    #[test]
    fn snapshot_reader_matches_inserted_cells() {
        let word = Molecule::encode(MoleculeType::Data, 5).unwrap();
        let cells = vec![RawCellState {
            coord: Coord::new(vec![1, 1]),
            molecule_word: word,
            owner_id: 3,
        }];
        let reader = SnapshotReader::new(vec![4, 4], vec![false, false], &cells);
        assert_eq!(reader.get(&Coord::new(vec![1, 1])).value, 5);
    }
}
