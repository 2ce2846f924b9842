//! The N-dimensional, optionally toroidal world (spec.md §4.2).

use itertools::Itertools;

use crate::coord::Coord;
use crate::error::EnvironmentError;
use crate::molecule::Molecule;

/// A single addressable location: its molecule payload plus the id of the
/// organism that last wrote a non-empty molecule there (0 = unowned).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cell {
    pub molecule: Molecule,
    pub owner_id: u64,
}

/// The world grid. Shape and per-axis toroidal policy are fixed at
/// construction; cells are stored flat, row-major (last axis fastest).
#[derive(Debug, Clone)]
pub struct Environment {
    shape: Vec<i32>,
    toroidal: Vec<bool>,
    strides: Vec<i64>,
    cells: Vec<Cell>,
}

impl Environment {
    /// Builds an empty (all-`CODE:0`, unowned) world of the given shape, with
    /// a uniform toroidal policy across all axes.
    pub fn new(shape: Vec<i32>, toroidal: bool) -> Self {
        let toroidal = vec![toroidal; shape.len()];
        Self::with_per_axis_toroidal(shape, toroidal)
    }

    /// As [`Self::new`], but with an explicit per-axis toroidal policy
    /// (spec.md §4.2: "toroidal flag per axis or global").
    pub fn with_per_axis_toroidal(shape: Vec<i32>, toroidal: Vec<bool>) -> Self {
        assert_eq!(shape.len(), toroidal.len());
        assert!(shape.iter().all(|&s| s > 0), "axis sizes must be positive");
        let strides = Self::row_major_strides(&shape);
        let total: i64 = shape.iter().map(|&s| s as i64).product();
        Self {
            shape,
            toroidal,
            strides,
            cells: vec![Cell::default(); total as usize],
        }
    }

    fn row_major_strides(shape: &[i32]) -> Vec<i64> {
        let mut strides = vec![1i64; shape.len()];
        for i in (0..shape.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * shape[i + 1] as i64;
        }
        strides
    }

    pub fn shape(&self) -> &[i32] {
        &self.shape
    }

    pub fn dim(&self) -> usize {
        self.shape.len()
    }

    pub fn toroidal(&self) -> &[bool] {
        &self.toroidal
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Row-major, dimension-agnostic: `flatIndexToCoord ∘ coordToFlatIndex = id`.
    pub fn coord_to_flat_index(&self, coord: &Coord) -> Option<i64> {
        self.checked_flat_index(coord).ok()
    }

    /// Same as [`Self::coord_to_flat_index`], but distinguishes a wrong-dimension
    /// coordinate (`InvalidShape`) from one that is merely out of range on a
    /// non-toroidal axis (`OutOfBounds`) — callers that need to report that
    /// distinction to the caller (rather than collapse it) use this directly.
    fn checked_flat_index(&self, coord: &Coord) -> Result<i64, EnvironmentError> {
        if coord.dim() != self.dim() {
            return Err(EnvironmentError::InvalidShape);
        }
        let mut index = 0i64;
        for (axis, &c) in coord.as_slice().iter().enumerate() {
            if c < 0 || c >= self.shape[axis] {
                return Err(EnvironmentError::OutOfBounds);
            }
            index += c as i64 * self.strides[axis];
        }
        Ok(index)
    }

    pub fn flat_index_to_coord(&self, index: i64) -> Option<Coord> {
        if index < 0 || index as usize >= self.cells.len() {
            return None;
        }
        let mut remaining = index;
        let mut components = vec![0i32; self.dim()];
        for axis in 0..self.dim() {
            components[axis] = (remaining / self.strides[axis]) as i32;
            remaining %= self.strides[axis];
        }
        Some(Coord::new(components))
    }

    /// Wraps each axis modulo its size if toroidal, otherwise rejects
    /// out-of-range coordinates outright (spec.md §4.2).
    pub fn normalize(&self, coord: &Coord) -> Option<Coord> {
        if coord.dim() != self.dim() {
            return None;
        }
        let mut out = vec![0i32; self.dim()];
        for axis in 0..self.dim() {
            let size = self.shape[axis];
            let c = coord.get(axis);
            if self.toroidal[axis] {
                out[axis] = c.rem_euclid(size);
            } else if c < 0 || c >= size {
                return None;
            } else {
                out[axis] = c;
            }
        }
        Some(Coord::new(out))
    }

    /// `normalize(base + delta)` (spec.md §4.6).
    pub fn target_coordinate(&self, base: &Coord, delta: &Coord) -> Option<Coord> {
        self.normalize(&base.added(delta))
    }

    /// `normalize(pos + dv)` (spec.md §4.6).
    pub fn next_instruction_position(&self, pos: &Coord, dv: &Coord) -> Option<Coord> {
        self.target_coordinate(pos, dv)
    }

    pub fn get(&self, coord: &Coord) -> Result<Molecule, EnvironmentError> {
        let index = self.checked_flat_index(coord)?;
        Ok(self.cells[index as usize].molecule)
    }

    pub fn owner(&self, coord: &Coord) -> Result<u64, EnvironmentError> {
        let index = self.checked_flat_index(coord)?;
        Ok(self.cells[index as usize].owner_id)
    }

    pub fn set(&mut self, coord: &Coord, molecule: Molecule) -> Result<(), EnvironmentError> {
        let index = self.checked_flat_index(coord)?;
        self.cells[index as usize].molecule = molecule;
        Ok(())
    }

    pub fn set_owner(&mut self, coord: &Coord, owner_id: u64) -> Result<(), EnvironmentError> {
        let index = self.checked_flat_index(coord)?;
        self.cells[index as usize].owner_id = owner_id;
        Ok(())
    }

    /// Writes `molecule` at `coord` under the ownership rule (spec.md §4.7):
    /// a non-empty write requires the cell to be unowned or owned by
    /// `writer_id`; on success the cell becomes owned by `writer_id`. An
    /// empty write is always allowed and never touches ownership.
    pub fn write_owned(
        &mut self,
        coord: &Coord,
        molecule: Molecule,
        writer_id: u64,
    ) -> Result<bool, EnvironmentError> {
        let index = self.checked_flat_index(coord)?;
        if molecule.is_empty() {
            self.cells[index as usize].molecule = molecule;
            return Ok(true);
        }
        let cell = &mut self.cells[index as usize];
        if cell.owner_id != 0 && cell.owner_id != writer_id {
            return Ok(false);
        }
        cell.molecule = molecule;
        cell.owner_id = writer_id;
        Ok(true)
    }

    /// True iff every cell within Chebyshev distance `radius` of `center` is
    /// within the world and unowned (spec.md §4.2, §4.9). A cell that falls
    /// outside a non-toroidal axis counts as "not within the world", which
    /// makes the whole area fail the predicate rather than being skipped.
    pub fn is_area_unowned(&self, center: &Coord, radius: i32) -> bool {
        for delta in Self::offsets(self.dim(), radius) {
            match self.normalize(&center.added(&Coord::new(delta))) {
                None => return false,
                Some(coord) => {
                    if self.owner(&coord) != Ok(0) {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Every integer offset vector in `[-radius, radius]^dim`.
    fn offsets(dim: usize, radius: i32) -> Vec<Vec<i32>> {
        (0..dim)
            .map(|_| -radius..=radius)
            .multi_cartesian_product()
            .collect()
    }

    /// Axis-adjacent neighbors of `center` (used by the geyser strategy),
    /// i.e. the `2 * dim` cells at Chebyshev distance exactly 1 along a single
    /// axis, normalized per the toroidal policy.
    pub fn axis_neighbors(&self, center: &Coord) -> Vec<Coord> {
        let dim = self.dim();
        let mut out = Vec::with_capacity(2 * dim);
        for axis in 0..dim {
            for &d in &[-1, 1] {
                let mut delta = vec![0i32; dim];
                delta[axis] = d;
                if let Some(c) = self.normalize(&center.added(&Coord::new(delta))) {
                    out.push(c);
                }
            }
        }
        out
    }
}
