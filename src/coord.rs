//! N-dimensional integer coordinates, used for IP/DV/DP/LR and everywhere else
//! the world's dimensionality shows up. Kept dimension-agnostic per spec.md §9
//! ("avoid dimension-specific fast paths... use fixed-size arrays sized to
//! worldDim") — here a `Vec<i32>` plays that role since `worldDim` is only
//! known at simulation-construction time, not at compile time.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A point (or delta) in the world's N-dimensional integer lattice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord(Vec<i32>);

impl Coord {
    pub fn new(components: Vec<i32>) -> Self {
        Self(components)
    }

    pub fn zeros(dim: usize) -> Self {
        Self(vec![0; dim])
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.0
    }

    pub fn get(&self, axis: usize) -> i32 {
        self.0[axis]
    }

    /// Component-wise sum. Panics (debug-only) on dimension mismatch; callers
    /// within this crate never mix coordinates of different dimensionality.
    pub fn added(&self, delta: &Coord) -> Coord {
        debug_assert_eq!(self.dim(), delta.dim(), "coordinate dimension mismatch");
        Coord(self.0.iter().zip(&delta.0).map(|(a, b)| a + b).collect())
    }

    pub fn scaled(&self, factor: i32) -> Coord {
        Coord(self.0.iter().map(|c| c * factor).collect())
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&c| c == 0)
    }

    /// Chebyshev (L-infinity) distance, used by `Environment::is_area_unowned`.
    pub fn chebyshev_distance(&self, other: &Coord) -> i32 {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| (a - b).abs())
            .max()
            .unwrap_or(0)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{c}")?;
        }
        write!(f, ")")
    }
}

impl From<Vec<i32>> for Coord {
    fn from(v: Vec<i32>) -> Self {
        Coord(v)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn added_is_componentwise() {
        let a = Coord::new(vec![1, 2, 3]);
        let b = Coord::new(vec![10, -2, 0]);
        assert_eq!(a.added(&b), Coord::new(vec![11, 0, 3]));
    }

    #[test]
    fn chebyshev_distance_is_max_axis_delta() {
        let a = Coord::new(vec![0, 0]);
        let b = Coord::new(vec![2, -5]);
        assert_eq!(a.chebyshev_distance(&b), 5);
    }

    #[test]
    fn display_matches_tuple_notation() {
        assert_eq!(Coord::new(vec![1, -2]).to_string(), "(1, -2)");
    }
}
