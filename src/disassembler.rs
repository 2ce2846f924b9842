//! The disassembler (spec.md §4.5): the single source of truth for "how many
//! cells does instruction X occupy" and "what is argument K raw". Performs no
//! interpretation — it never reads a register file, resolves a label to a
//! name, or touches energy. Both the live VM and an offline indexer compose
//! this with a [`crate::memory::MemoryReader`] and nothing else
//! (spec.md §9, "Duplicated interpretation in runtime vs. debug indexer").

use thiserror::Error;

use crate::coord::Coord;
use crate::isa::{ArgSignature, IsaHandle};
use crate::memory::MemoryReader;
use crate::molecule::{Molecule, MoleculeType};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DisassembleError {
    #[error("illegal cell type at instruction pointer: {0}")]
    IllegalCellType(MoleculeType),
    #[error("instruction argument cursor left a non-toroidal world")]
    CursorOutOfBounds,
}

/// One resolved argument's raw payload, still uninterpreted (spec.md §4.5,
/// step 4): a single molecule for `REGISTER`/`LOCATION_REGISTER`/`LITERAL`, or
/// an assembled vector of each cell's scalar for `VECTOR`/`LABEL`.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgRaw {
    Scalar(Molecule),
    Vector(Coord),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstructionArg {
    pub sig: ArgSignature,
    pub raw: ArgRaw,
}

/// A neutral, uninterpreted decode of one cell's worth of machine code.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub opcode_id: Option<u16>,
    pub mnemonic: &'static str,
    pub args: Vec<InstructionArg>,
    /// Cells occupied, including the opcode cell itself.
    pub length: usize,
    pub known: bool,
}

/// Decodes the instruction at `ip`, advancing the read cursor along `dv`
/// (spec.md §4.5). Fails only if the cell at `ip` isn't `CODE`, or if
/// assembling an argument would walk the cursor off a non-toroidal world —
/// an unknown opcode is not an error here, it's `Instruction::known == false`.
pub fn disassemble(
    reader: &dyn MemoryReader,
    ip: &Coord,
    dv: &Coord,
    isa: IsaHandle,
) -> Result<Instruction, DisassembleError> {
    let opcode_molecule = reader.get(ip);
    if opcode_molecule.ty != MoleculeType::Code {
        return Err(DisassembleError::IllegalCellType(opcode_molecule.ty));
    }

    let opcode_id = opcode_molecule.value as u16;
    let Some(entry) = isa.by_id(opcode_id) else {
        return Ok(Instruction {
            opcode_id: None,
            mnemonic: "UNKNOWN",
            args: Vec::new(),
            length: 1,
            known: false,
        });
    };

    let world_dim = reader.dim();
    let mut cursor = ip.clone();
    let mut args = Vec::with_capacity(entry.arg_signatures.len());
    for &sig in entry.arg_signatures {
        match sig {
            ArgSignature::Register | ArgSignature::LocationRegister | ArgSignature::Literal => {
                cursor = reader
                    .step(&cursor, dv)
                    .ok_or(DisassembleError::CursorOutOfBounds)?;
                args.push(InstructionArg {
                    sig,
                    raw: ArgRaw::Scalar(reader.get(&cursor)),
                });
            }
            ArgSignature::Vector | ArgSignature::Label => {
                let mut components = Vec::with_capacity(world_dim);
                for _ in 0..world_dim {
                    cursor = reader
                        .step(&cursor, dv)
                        .ok_or(DisassembleError::CursorOutOfBounds)?;
                    components.push(reader.get(&cursor).value);
                }
                args.push(InstructionArg {
                    sig,
                    raw: ArgRaw::Vector(Coord::new(components)),
                });
            }
        }
    }

    Ok(Instruction {
        opcode_id: Some(entry.id),
        mnemonic: entry.mnemonic,
        args,
        length: entry.length(world_dim),
        known: true,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::environment::Environment;
    use crate::memory::EnvironmentReader;
    use crate::molecule::MoleculeType;

    fn place(env: &mut Environment, coord: Vec<i32>, ty: MoleculeType, value: i32) {
        env.set(&Coord::new(coord), Molecule::new(ty, value))
            .unwrap();
    }

    #[test]
    fn decodes_two_register_conditional() {
        let isa = crate::isa::init();
        let mut env = Environment::new(vec![10, 10], false);
        let ifr = isa.by_name("IFR").unwrap().id as i32;
        place(&mut env, vec![0, 0], MoleculeType::Code, ifr);
        place(&mut env, vec![1, 0], MoleculeType::Code, 0);
        place(&mut env, vec![2, 0], MoleculeType::Code, 1);

        let reader = EnvironmentReader::new(&env);
        let instr = disassemble(&reader, &Coord::new(vec![0, 0]), &Coord::new(vec![1, 0]), isa)
            .unwrap();
        assert_eq!(instr.mnemonic, "IFR");
        assert_eq!(instr.length, 3);
        assert_eq!(instr.args.len(), 2);
    }

    #[test]
    fn unknown_opcode_yields_unknown_instruction() {
        let isa = crate::isa::init();
        let mut env = Environment::new(vec![4, 4], false);
        place(&mut env, vec![0, 0], MoleculeType::Code, 9999);
        let reader = EnvironmentReader::new(&env);
        let instr = disassemble(&reader, &Coord::new(vec![0, 0]), &Coord::new(vec![1, 0]), isa)
            .unwrap();
        assert!(!instr.known);
        assert_eq!(instr.mnemonic, "UNKNOWN");
        assert_eq!(instr.length, 1);
    }

    #[test]
    fn illegal_cell_type_fails() {
        let isa = crate::isa::init();
        let mut env = Environment::new(vec![4, 4], false);
        place(&mut env, vec![0, 0], MoleculeType::Data, 5);
        let reader = EnvironmentReader::new(&env);
        let err = disassemble(&reader, &Coord::new(vec![0, 0]), &Coord::new(vec![1, 0]), isa)
            .unwrap_err();
        assert_eq!(err, DisassembleError::IllegalCellType(MoleculeType::Data));
    }

    #[test]
    fn vector_argument_assembles_from_successive_cells() {
        let isa = crate::isa::init();
        let mut env = Environment::new(vec![10, 10], false);
        let setv = isa.by_name("SETV").unwrap().id as i32;
        place(&mut env, vec![0, 0], MoleculeType::Code, setv);
        place(&mut env, vec![1, 0], MoleculeType::Code, 0); // register DR0
        place(&mut env, vec![2, 0], MoleculeType::Code, 3); // vector.x
        place(&mut env, vec![3, 0], MoleculeType::Code, -2); // vector.y
        let reader = EnvironmentReader::new(&env);
        let instr = disassemble(&reader, &Coord::new(vec![0, 0]), &Coord::new(vec![1, 0]), isa)
            .unwrap();
        assert_eq!(instr.length, 4);
        match &instr.args[1].raw {
            ArgRaw::Vector(v) => assert_eq!(v, &Coord::new(vec![3, -2])),
            _ => panic!("expected vector arg"),
        }
    }
}
