//! The molecule codec (spec.md §4.1, §6). Packs a `(type, scalar)` pair into a
//! single 32-bit machine word: a 4-bit type tag in the high bits and a signed
//! 28-bit two's-complement scalar in the low bits.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const TYPE_CODE: u8 = 0;
pub const TYPE_DATA: u8 = 1;
pub const TYPE_ENERGY: u8 = 2;
pub const TYPE_STRUCTURE: u8 = 3;

const TAG_SHIFT: u32 = 28;
const VALUE_BITS: u32 = 28;
const VALUE_MASK: u32 = (1 << VALUE_BITS) - 1;
const SIGN_BIT: u32 = 1 << (VALUE_BITS - 1);
const VALUE_MIN: i32 = -(1 << (VALUE_BITS - 1));
const VALUE_MAX: i32 = (1 << (VALUE_BITS - 1)) - 1;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoleculeError {
    #[error("unknown molecule type name: {0}")]
    InvalidArgument(String),
    #[error("value {0} does not fit in a 28-bit signed scalar")]
    ValueOutOfRange(i32),
}

/// The type tag of a molecule. `Unknown` carries the raw tag so a round-trip
/// through `decode`/`encode` is still possible for reserved tag values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoleculeType {
    Code,
    Data,
    Energy,
    Structure,
    Unknown(u8),
}

impl Default for MoleculeType {
    fn default() -> Self {
        MoleculeType::Code
    }
}

impl MoleculeType {
    pub fn tag(self) -> u8 {
        match self {
            MoleculeType::Code => TYPE_CODE,
            MoleculeType::Data => TYPE_DATA,
            MoleculeType::Energy => TYPE_ENERGY,
            MoleculeType::Structure => TYPE_STRUCTURE,
            MoleculeType::Unknown(tag) => tag,
        }
    }

    pub fn from_tag(tag: u8) -> Self {
        match tag {
            TYPE_CODE => MoleculeType::Code,
            TYPE_DATA => MoleculeType::Data,
            TYPE_ENERGY => MoleculeType::Energy,
            TYPE_STRUCTURE => MoleculeType::Structure,
            other => MoleculeType::Unknown(other),
        }
    }

    /// Case-insensitive name, e.g. `"CODE"`, `"DATA"`, `"ENERGY"`, `"STRUCTURE"`.
    /// Reserved tags that aren't one of the four known types report `"UNKNOWN"`.
    pub fn name(self) -> &'static str {
        match self {
            MoleculeType::Code => "CODE",
            MoleculeType::Data => "DATA",
            MoleculeType::Energy => "ENERGY",
            MoleculeType::Structure => "STRUCTURE",
            MoleculeType::Unknown(_) => "UNKNOWN",
        }
    }

    /// Inverse of [`Self::name`]; case-insensitive. Fails for anything other
    /// than the four known type names (never produces `Unknown`).
    pub fn from_name(name: &str) -> Result<Self, MoleculeError> {
        match name.to_ascii_uppercase().as_str() {
            "CODE" => Ok(MoleculeType::Code),
            "DATA" => Ok(MoleculeType::Data),
            "ENERGY" => Ok(MoleculeType::Energy),
            "STRUCTURE" => Ok(MoleculeType::Structure),
            other => Err(MoleculeError::InvalidArgument(other.to_string())),
        }
    }
}

impl fmt::Display for MoleculeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A cell's payload: a typed scalar. `is_empty` iff `type == CODE && value == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Molecule {
    pub ty: MoleculeType,
    pub value: i32,
}

impl Molecule {
    pub const EMPTY: Molecule = Molecule {
        ty: MoleculeType::Code,
        value: 0,
    };

    pub fn new(ty: MoleculeType, value: i32) -> Self {
        Self { ty, value }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.ty, MoleculeType::Code) && self.value == 0
    }

    /// Packs this molecule into its 32-bit wire word. Fails if `value` doesn't
    /// fit in the 28-bit signed scalar range.
    pub fn encode(ty: MoleculeType, value: i32) -> Result<i32, MoleculeError> {
        if !(VALUE_MIN..=VALUE_MAX).contains(&value) {
            return Err(MoleculeError::ValueOutOfRange(value));
        }
        let word = ((ty.tag() as u32) << TAG_SHIFT) | (value as u32 & VALUE_MASK);
        Ok(word as i32)
    }

    /// Same as [`Self::encode`] but resolves the type from its name first,
    /// failing with `InvalidArgument` for unknown names (spec.md §4.1).
    pub fn encode_named(name: &str, value: i32) -> Result<i32, MoleculeError> {
        let ty = MoleculeType::from_name(name)?;
        Self::encode(ty, value)
    }

    /// Unpacks a 32-bit wire word. Always succeeds: unrecognized tag bits
    /// decode to `MoleculeType::Unknown`.
    pub fn decode(word: i32) -> Molecule {
        let bits = word as u32;
        let tag = (bits >> TAG_SHIFT) as u8 & 0xF;
        let raw = bits & VALUE_MASK;
        let value = if raw & SIGN_BIT != 0 {
            (raw as i64 - (1i64 << VALUE_BITS)) as i32
        } else {
            raw as i32
        };
        Molecule {
            ty: MoleculeType::from_tag(tag),
            value,
        }
    }

    pub fn to_word(self) -> i32 {
        // `self.value` was only ever produced by `decode` or validated by
        // `encode`, so it always fits; an out-of-range value here would be a
        // bug upstream, not a user error, hence the unwrap.
        Self::encode(self.ty, self.value)
            .unwrap_or_else(|_| Self::encode(MoleculeType::Unknown(self.ty.tag()), 0).unwrap())
    }
}
