//! The ISA registry (spec.md §4.3): a static, process-wide, write-once table
//! mapping opcode id -> `{mnemonic, operand signature, length, handler,
//! negated-counterpart}`. Initialized once via [`init`] (an idempotent handle
//! constructor, per spec.md §9's "Global ISA table" design note) and read
//! lock-free afterwards.

pub mod instructions;

use hashbrown::HashMap;
use lazy_static::lazy_static;
use rapidhash::fast::RapidBuildHasher;

/// The registry is built once and read lock-free for the rest of the
/// process's life, so a fast, non-DOS-hardened hasher (no per-process
/// randomization) is the right tradeoff here (spec.md §9, "Global ISA
/// table" design note).
type RapidHashMap<K, V> = HashMap<K, V, RapidBuildHasher>;

use crate::coord::Coord;
use crate::environment::Environment;
use crate::organism::{Organism, RegisterId};

/// The shape of one opcode's operand list (spec.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgSignature {
    Register,
    LocationRegister,
    Literal,
    Vector,
    Label,
}

impl ArgSignature {
    /// Number of cells this argument occupies, given the world's
    /// dimensionality (REGISTER/LOCATION_REGISTER/LITERAL are always one
    /// cell; VECTOR/LABEL occupy `world_dim` cells, spec.md §4.3/§4.5).
    pub fn length(self, world_dim: usize) -> usize {
        match self {
            ArgSignature::Register | ArgSignature::LocationRegister | ArgSignature::Literal => 1,
            ArgSignature::Vector | ArgSignature::Label => world_dim,
        }
    }
}

/// A resolved operand, ready for a handler to consume (spec.md §4.7's "plan"
/// phase: "resolve each argument to an *operand*").
#[derive(Debug, Clone)]
pub enum Operand {
    Register(RegisterId),
    LocationRegister(usize),
    Literal(crate::molecule::Molecule),
    Vector(Coord),
    Label(Coord),
}

/// Outcome of one instruction handler's execution — a handler mutates the
/// organism/environment directly and communicates nothing back except via
/// `Organism::instruction_failed`/`skip_*`/`pending_fork`/`is_dead`, so this
/// type only needs to exist as the handler's function signature; there is no
/// payload.
pub type HandlerFn = fn(&mut Organism, &mut Environment, &[Operand]);

#[derive(Clone)]
pub struct OpcodeEntry {
    pub id: u16,
    pub mnemonic: &'static str,
    pub arg_signatures: &'static [ArgSignature],
    pub cost: i64,
    pub handler: HandlerFn,
    pub negated_opcode_id: Option<u16>,
}

impl std::fmt::Debug for OpcodeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpcodeEntry")
            .field("id", &self.id)
            .field("mnemonic", &self.mnemonic)
            .field("arg_signatures", &self.arg_signatures)
            .field("cost", &self.cost)
            .field("negated_opcode_id", &self.negated_opcode_id)
            .finish()
    }
}

impl OpcodeEntry {
    pub fn length(&self, world_dim: usize) -> usize {
        1 + self
            .arg_signatures
            .iter()
            .map(|a| a.length(world_dim))
            .sum::<usize>()
    }
}

pub struct IsaRegistry {
    by_id: RapidHashMap<u16, OpcodeEntry>,
    by_name: RapidHashMap<&'static str, u16>,
}

impl IsaRegistry {
    pub fn by_id(&self, id: u16) -> Option<&OpcodeEntry> {
        self.by_id.get(&id)
    }

    pub fn by_name(&self, name: &str) -> Option<&OpcodeEntry> {
        self.by_name.get(name).and_then(|id| self.by_id(*id))
    }

    fn build() -> Self {
        let entries = instructions::opcode_table();
        let mut by_id = RapidHashMap::default();
        let mut by_name = RapidHashMap::default();
        for entry in entries {
            by_name.insert(entry.mnemonic, entry.id);
            by_id.insert(entry.id, entry);
        }
        Self { by_id, by_name }
    }
}

lazy_static! {
    static ref REGISTRY: IsaRegistry = IsaRegistry::build();
}

/// An opaque, copyable handle to the process-wide registry. Calling this
/// repeatedly is cheap and always yields the same table (spec.md §9: "expose
/// it as an opaque handle returned from an `init()` call that is idempotent").
#[derive(Clone, Copy)]
pub struct IsaHandle(&'static IsaRegistry);

impl IsaHandle {
    pub fn registry(self) -> &'static IsaRegistry {
        self.0
    }
}

pub fn init() -> IsaHandle {
    IsaHandle(&REGISTRY)
}

impl std::ops::Deref for IsaHandle {
    type Target = IsaRegistry;
    fn deref(&self) -> &Self::Target {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn negated_pairs_are_mutual() {
        let isa = init();
        for entry in isa.registry().by_id.values() {
            if let Some(neg_id) = entry.negated_opcode_id {
                let neg = isa.by_id(neg_id).expect("negated opcode must exist");
                assert_eq!(
                    neg.negated_opcode_id,
                    Some(entry.id),
                    "{} <-> {} negation must be mutual",
                    entry.mnemonic,
                    neg.mnemonic
                );
            }
        }
    }

    #[test]
    fn by_name_and_by_id_agree() {
        let isa = init();
        let nop = isa.by_name("NOP").unwrap();
        assert_eq!(isa.by_id(nop.id).unwrap().mnemonic, "NOP");
    }
}
