//! The two-phase virtual machine (spec.md §4.7): `plan` decodes the next
//! instruction and resolves its operands against live organism/environment
//! state; `execute` charges energy, dispatches the handler, and advances the
//! instruction pointer. Splitting the phases keeps the disassembler itself
//! free of any interpretation, per spec.md §9's "duplicated interpretation in
//! runtime vs. debug indexer" note.

use tracing::trace;

use crate::coord::Coord;
use crate::disassembler::{disassemble, ArgRaw, DisassembleError, Instruction};
use crate::environment::Environment;
use crate::isa::{ArgSignature, HandlerFn, IsaHandle, Operand};
use crate::memory::EnvironmentReader;
use crate::organism::{Organism, RegisterId};

/// What the plan phase decided to do with the organism's next instruction.
pub enum Plan {
    IllegalCell,
    UnknownOpcode,
    SkippedNoop { length: usize },
    Execute {
        mnemonic: &'static str,
        operands: Vec<Operand>,
        length: usize,
        cost: i64,
        handler: HandlerFn,
    },
}

/// Decodes the organism's next instruction and resolves its operands
/// (spec.md §4.7, "Plan"). Never mutates `organism` or `env`.
pub fn plan(organism: &Organism, env: &Environment, isa: IsaHandle) -> Plan {
    let reader = EnvironmentReader::new(env);
    match disassemble(&reader, &organism.ip, &organism.dv, isa) {
        Err(DisassembleError::IllegalCellType(_)) => Plan::IllegalCell,
        Err(DisassembleError::CursorOutOfBounds) => Plan::IllegalCell,
        Ok(instr) if !instr.known => Plan::UnknownOpcode,
        Ok(instr) if organism.skip_next_instruction => Plan::SkippedNoop {
            length: instr.length,
        },
        Ok(instr) => {
            let entry = isa
                .by_id(instr.opcode_id.expect("known instruction carries an opcode id"))
                .expect("decoded opcode id exists in the registry it was decoded from");
            Plan::Execute {
                mnemonic: entry.mnemonic,
                operands: resolve_operands(&instr),
                length: instr.length,
                cost: entry.cost,
                handler: entry.handler,
            }
        }
    }
}

/// Turns a neutral, uninterpreted decode into operands a handler can consume
/// (spec.md §4.7: "REGISTER -> register slot, LOCATION_REGISTER -> LR slot,
/// LITERAL -> typed immediate, VECTOR -> vector, LABEL -> relative
/// coordinate"). Kept out of the disassembler itself, which must not
/// interpret anything (spec.md §4.5).
fn resolve_operands(instr: &Instruction) -> Vec<Operand> {
    instr
        .args
        .iter()
        .map(|arg| match (arg.sig, &arg.raw) {
            (ArgSignature::Register, ArgRaw::Scalar(m)) => Operand::Register(
                RegisterId::from_raw(m.value).expect("every raw value maps to a register id"),
            ),
            (ArgSignature::LocationRegister, ArgRaw::Scalar(m)) => {
                Operand::LocationRegister(m.value.max(0) as usize)
            }
            (ArgSignature::Literal, ArgRaw::Scalar(m)) => Operand::Literal(*m),
            (ArgSignature::Vector, ArgRaw::Vector(v)) => Operand::Vector(v.clone()),
            (ArgSignature::Label, ArgRaw::Vector(v)) => Operand::Label(v.clone()),
            _ => unreachable!("disassembler guarantees raw payload matches its own arg signature"),
        })
        .collect()
}

/// Runs the resolved plan against the organism/environment (spec.md §4.7,
/// "Execute"). Resets the transient per-instruction flags first, so a
/// handler only ever needs to *set* failure, never clear it.
pub fn execute(organism: &mut Organism, env: &mut Environment, decided: Plan) {
    organism.instruction_failed = false;
    organism.failure_reason = None;
    organism.skip_ip_advance = false;
    organism.ip_before_fetch = organism.ip.clone();
    organism.dv_before_fetch = organism.dv.clone();

    match decided {
        Plan::IllegalCell => {
            organism.fail("Illegal cell type");
            advance_by(organism, env, 1);
        }
        Plan::UnknownOpcode => {
            organism.fail("Unknown opcode");
            advance_by(organism, env, 1);
        }
        Plan::SkippedNoop { length } => {
            organism.skip_next_instruction = false;
            advance_by(organism, env, length);
        }
        Plan::Execute {
            mnemonic,
            operands,
            length,
            cost,
            handler,
        } => {
            organism.er -= cost;
            if organism.er <= 0 {
                organism.is_dead = true;
                organism.fail("Ran out of energy");
                trace!(organism = organism.id, "organism ran out of energy");
            } else {
                (handler)(organism, env, &operands);
                if organism.instruction_failed {
                    trace!(
                        organism = organism.id,
                        mnemonic,
                        reason = organism.failure_reason.as_deref().unwrap_or(""),
                        "instruction failed"
                    );
                }
            }
            if !organism.skip_ip_advance {
                advance_by(organism, env, length);
            }
        }
    }
}

fn advance_by(organism: &mut Organism, env: &Environment, length: usize) {
    let delta: Coord = organism.dv.scaled(length as i32);
    if let Some(next) = env.target_coordinate(&organism.ip, &delta) {
        organism.ip = next;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::coord::Coord;
    use crate::molecule::{Molecule, MoleculeType};
    use crate::organism::RegValue;

    fn place(env: &mut Environment, coord: Vec<i32>, ty: MoleculeType, value: i32) {
        env.set(&Coord::new(coord), Molecule::new(ty, value))
            .unwrap();
    }

    #[test]
    fn nop_walk_advances_ip_and_charges_one_energy() {
        let isa = crate::isa::init();
        let mut env = Environment::new(vec![10, 10], false);
        let nop = isa.by_name("NOP").unwrap().id as i32;
        place(&mut env, vec![0, 0], MoleculeType::Code, nop);
        place(&mut env, vec![1, 0], MoleculeType::Code, nop);

        let mut organism = Organism::new(
            1,
            None,
            None,
            0,
            Coord::new(vec![0, 0]),
            Coord::new(vec![1, 0]),
            10,
        );

        let p = plan(&organism, &env, isa);
        execute(&mut organism, &mut env, p);
        assert_eq!(organism.ip, Coord::new(vec![1, 0]));
        assert_eq!(organism.er, 9);

        let p = plan(&organism, &env, isa);
        execute(&mut organism, &mut env, p);
        assert_eq!(organism.ip, Coord::new(vec![2, 0]));
        assert_eq!(organism.er, 8);
    }

    #[test]
    fn energy_exhaustion_kills_organism() {
        let isa = crate::isa::init();
        let mut env = Environment::new(vec![10, 10], false);
        let nop = isa.by_name("NOP").unwrap().id as i32;
        for x in 0..10 {
            place(&mut env, vec![x, 0], MoleculeType::Code, nop);
        }
        let mut organism = Organism::new(
            1,
            None,
            None,
            0,
            Coord::new(vec![0, 0]),
            Coord::new(vec![1, 0]),
            2,
        );

        let p = plan(&organism, &env, isa);
        execute(&mut organism, &mut env, p);
        assert!(!organism.is_dead);

        let p = plan(&organism, &env, isa);
        execute(&mut organism, &mut env, p);
        assert!(organism.is_dead);
        assert!(organism
            .failure_reason
            .as_deref()
            .unwrap()
            .contains("Ran out of energy"));
    }

    #[test]
    fn conditional_skip_matches_scenario() {
        let isa = crate::isa::init();
        let mut env = Environment::new(vec![10, 10], false);
        let ifr = isa.by_name("IFR").unwrap().id as i32;
        let seti = isa.by_name("SETI").unwrap().id as i32;
        place(&mut env, vec![0, 0], MoleculeType::Code, ifr);
        place(&mut env, vec![1, 0], MoleculeType::Code, 0);
        place(&mut env, vec![2, 0], MoleculeType::Code, 1);
        place(&mut env, vec![3, 0], MoleculeType::Code, seti);
        place(&mut env, vec![4, 0], MoleculeType::Code, 0);
        place(&mut env, vec![5, 0], MoleculeType::Data, 1);
        place(&mut env, vec![6, 0], MoleculeType::Code, seti);
        place(&mut env, vec![7, 0], MoleculeType::Code, 0);
        place(&mut env, vec![8, 0], MoleculeType::Data, 2);

        let mut organism = Organism::new(
            1,
            None,
            None,
            0,
            Coord::new(vec![0, 0]),
            Coord::new(vec![1, 0]),
            1000,
        );
        organism.drs[0] = RegValue::Scalar(Molecule::new(MoleculeType::Data, 5));
        organism.drs[1] = RegValue::Scalar(Molecule::new(MoleculeType::Data, 5));

        // tick 1: IFR, registers equal -> skip_next_instruction = true
        let p = plan(&organism, &env, isa);
        execute(&mut organism, &mut env, p);
        assert!(organism.skip_next_instruction);
        assert_eq!(organism.ip, Coord::new(vec![3, 0]));

        // tick 2: SETI DATA:1 is skipped, not executed
        let p = plan(&organism, &env, isa);
        execute(&mut organism, &mut env, p);
        assert!(!organism.skip_next_instruction);
        assert_eq!(organism.ip, Coord::new(vec![6, 0]));
        assert_eq!(
            organism.drs[0],
            RegValue::Scalar(Molecule::new(MoleculeType::Data, 5))
        );

        // tick 3: SETI DATA:2 executes
        let p = plan(&organism, &env, isa);
        execute(&mut organism, &mut env, p);
        assert_eq!(
            organism.drs[0],
            RegValue::Scalar(Molecule::new(MoleculeType::Data, 2))
        );
    }

    #[test]
    fn seek_on_foreign_owned_cell_fails_without_moving_dp() {
        let isa = crate::isa::init();
        let mut env = Environment::new(vec![50, 50], false);
        let seek = isa.by_name("SEEK").unwrap().id as i32;
        place(&mut env, vec![40, 10], MoleculeType::Code, seek);
        place(&mut env, vec![41, 10], MoleculeType::Code, 0);
        env.set(
            &Coord::new(vec![40, 11]),
            Molecule::new(MoleculeType::Data, 77),
        )
        .unwrap();
        env.set_owner(&Coord::new(vec![40, 11]), 2).unwrap();

        let mut organism = Organism::new(
            1,
            None,
            None,
            0,
            Coord::new(vec![40, 10]),
            Coord::new(vec![1, 0]),
            2000,
        );
        organism.drs[1] = RegValue::Vector(Coord::new(vec![0, 1]));

        let p = plan(&organism, &env, isa);
        execute(&mut organism, &mut env, p);
        assert!(organism.instruction_failed);
        assert_eq!(*organism.active_dp(), Coord::new(vec![40, 10]));
    }

    #[test]
    fn scan_reads_a_neighbor_without_moving_the_data_pointer() {
        let isa = crate::isa::init();
        let mut env = Environment::new(vec![10, 10], false);
        let scan = isa.by_name("SCAN").unwrap().id as i32;
        place(&mut env, vec![0, 0], MoleculeType::Code, scan);
        place(&mut env, vec![1, 0], MoleculeType::Code, 0); // DR0
        place(&mut env, vec![2, 0], MoleculeType::Code, 0); // vector x
        place(&mut env, vec![3, 0], MoleculeType::Code, 1); // vector y
        env.set(&Coord::new(vec![0, 1]), Molecule::new(MoleculeType::Data, 99))
            .unwrap();

        let mut organism = Organism::new(
            1,
            None,
            None,
            0,
            Coord::new(vec![0, 0]),
            Coord::new(vec![1, 0]),
            1000,
        );

        let p = plan(&organism, &env, isa);
        execute(&mut organism, &mut env, p);
        assert!(!organism.instruction_failed);
        assert_eq!(*organism.active_dp(), Coord::new(vec![0, 0]));
        assert_eq!(
            organism.drs[0],
            RegValue::Scalar(Molecule::new(MoleculeType::Data, 99))
        );
    }

    #[test]
    fn sync_resets_the_active_data_pointer_to_the_instruction_pointer() {
        let isa = crate::isa::init();
        let mut env = Environment::new(vec![10, 10], false);
        let sync = isa.by_name("SYNC").unwrap().id as i32;
        place(&mut env, vec![5, 0], MoleculeType::Code, sync);

        let mut organism = Organism::new(
            1,
            None,
            None,
            0,
            Coord::new(vec![5, 0]),
            Coord::new(vec![1, 0]),
            1000,
        );
        *organism.active_dp_mut() = Coord::new(vec![9, 9]);

        let p = plan(&organism, &env, isa);
        execute(&mut organism, &mut env, p);
        assert!(!organism.instruction_failed);
        assert_eq!(*organism.active_dp(), Coord::new(vec![5, 0]));
    }

    #[test]
    fn jmp_reads_its_delta_from_a_register() {
        let isa = crate::isa::init();
        let mut env = Environment::new(vec![10, 10], false);
        let jmp = isa.by_name("JMP").unwrap().id as i32;
        place(&mut env, vec![0, 0], MoleculeType::Code, jmp);
        place(&mut env, vec![1, 0], MoleculeType::Code, 0); // DR0

        let mut organism = Organism::new(
            1,
            None,
            None,
            0,
            Coord::new(vec![0, 0]),
            Coord::new(vec![1, 0]),
            1000,
        );
        organism.drs[0] = RegValue::Vector(Coord::new(vec![5, 5]));

        let p = plan(&organism, &env, isa);
        execute(&mut organism, &mut env, p);
        assert!(!organism.instruction_failed);
        assert_eq!(organism.ip, Coord::new(vec![5, 5]));
    }
}
