//! The concrete opcode table (spec.md §4.3, §4.6, §9 "Supplemented
//! Features"): every mnemonic's argument signature, cost, and handler.
//!
//! Handlers communicate failure only through `Organism::fail` — never by
//! returning a `Result` — and must leave every organism field but the
//! failure flags, `ip`, and `er` untouched when they do (spec.md §8,
//! "Isolation of failures"). That discipline means a handler validates
//! everything it needs *before* mutating anything.

use crate::coord::Coord;
use crate::environment::Environment;
use crate::limits::{
    CALL_STACK_MAX_DEPTH, DATA_STACK_MAX_DEPTH, LOCATION_STACK_MAX_DEPTH,
    NUM_DATA_POINTERS, NUM_FORMAL_PARAM_REGISTERS,
};
use crate::molecule::{Molecule, MoleculeType};
use crate::organism::{ForkRequest, Organism, ProcFrame, RegValue, RegisterId};

use super::{ArgSignature, OpcodeEntry, Operand};

const TOLERANCE_EPSILON: i32 = 1;

// ---------------------------------------------------------------------
// Operand extraction. The registry guarantees `args` matches an opcode's
// declared `arg_signatures` one-for-one, so the "wrong variant" arm here is
// an internal invariant violation, not a reachable runtime error.
// ---------------------------------------------------------------------

fn as_register(op: &Operand) -> RegisterId {
    match op {
        Operand::Register(id) => *id,
        _ => unreachable!("arg signature guarantees a Register operand"),
    }
}

fn as_location_register(op: &Operand) -> usize {
    match op {
        Operand::LocationRegister(i) => *i,
        _ => unreachable!("arg signature guarantees a LocationRegister operand"),
    }
}

fn as_literal(op: &Operand) -> Molecule {
    match op {
        Operand::Literal(m) => *m,
        _ => unreachable!("arg signature guarantees a Literal operand"),
    }
}

fn as_vector(op: &Operand) -> &Coord {
    match op {
        Operand::Vector(v) => v,
        _ => unreachable!("arg signature guarantees a Vector operand"),
    }
}

fn as_label(op: &Operand) -> &Coord {
    match op {
        Operand::Label(v) => v,
        _ => unreachable!("arg signature guarantees a Label operand"),
    }
}

fn reg_scalar(organism: &Organism, id: RegisterId) -> Result<Molecule, &'static str> {
    organism
        .get_register(id)
        .map_err(|_| "register index out of bounds")?
        .as_scalar()
        .ok_or("vector/scalar mismatch")
}

fn reg_vector(organism: &Organism, id: RegisterId) -> Result<Coord, &'static str> {
    let value = organism
        .get_register(id)
        .map_err(|_| "register index out of bounds")?;
    value.as_vector().cloned().ok_or("vector/scalar mismatch")
}

fn set_reg(organism: &mut Organism, id: RegisterId, value: RegValue) -> Result<(), &'static str> {
    organism
        .set_register(id, value)
        .map_err(|_| "register index out of bounds")
}

/// Peeks before popping, so a type mismatch never mutates the stack
/// (spec.md §8, "Isolation of failures").
fn pop_scalar(organism: &mut Organism) -> Result<Molecule, &'static str> {
    match organism.data_stack.last() {
        None => Err("data stack underflow"),
        Some(RegValue::Vector(_)) => Err("vector/scalar mismatch"),
        Some(RegValue::Scalar(_)) => match organism.data_stack.pop() {
            Some(RegValue::Scalar(m)) => Ok(m),
            _ => unreachable!(),
        },
    }
}

fn pop_vector(organism: &mut Organism) -> Result<Coord, &'static str> {
    match organism.data_stack.last() {
        None => Err("data stack underflow"),
        Some(RegValue::Scalar(_)) => Err("vector/scalar mismatch"),
        Some(RegValue::Vector(_)) => match organism.data_stack.pop() {
            Some(RegValue::Vector(v)) => Ok(v),
            _ => unreachable!(),
        },
    }
}

fn push_value(organism: &mut Organism, value: RegValue) -> Result<(), &'static str> {
    if organism.data_stack.len() >= DATA_STACK_MAX_DEPTH {
        return Err("data stack overflow");
    }
    organism.data_stack.push(value);
    Ok(())
}

// ---------------------------------------------------------------------
// Conditional family: compare two values, set `skip_next_instruction`.
// ---------------------------------------------------------------------

fn cmp_eq(a: i32, b: i32) -> bool {
    a == b
}
fn cmp_ne(a: i32, b: i32) -> bool {
    a != b
}
fn cmp_lt(a: i32, b: i32) -> bool {
    a < b
}
fn cmp_ge(a: i32, b: i32) -> bool {
    a >= b
}
fn cmp_gt(a: i32, b: i32) -> bool {
    a > b
}
fn cmp_le(a: i32, b: i32) -> bool {
    a <= b
}
fn cmp_tol(a: i32, b: i32) -> bool {
    (a - b).abs() <= TOLERANCE_EPSILON
}
fn cmp_not_tol(a: i32, b: i32) -> bool {
    !cmp_tol(a, b)
}
fn cmp_mag_ge(a: i32, b: i32) -> bool {
    a.unsigned_abs() >= b.unsigned_abs()
}
fn cmp_mag_lt(a: i32, b: i32) -> bool {
    !cmp_mag_ge(a, b)
}

fn eval_rr(organism: &mut Organism, args: &[Operand], pred: fn(i32, i32) -> bool) {
    let a = as_register(&args[0]);
    let b = as_register(&args[1]);
    let av = match reg_scalar(organism, a) {
        Ok(v) => v,
        Err(e) => return organism.fail(e),
    };
    let bv = match reg_scalar(organism, b) {
        Ok(v) => v,
        Err(e) => return organism.fail(e),
    };
    organism.skip_next_instruction = pred(av.value, bv.value);
}

fn eval_ri(organism: &mut Organism, args: &[Operand], pred: fn(i32, i32) -> bool) {
    let a = as_register(&args[0]);
    let imm = as_literal(&args[1]);
    let av = match reg_scalar(organism, a) {
        Ok(v) => v,
        Err(e) => return organism.fail(e),
    };
    organism.skip_next_instruction = pred(av.value, imm.value);
}

fn eval_rs(organism: &mut Organism, args: &[Operand], pred: fn(i32, i32) -> bool) {
    let a = as_register(&args[0]);
    let av = match reg_scalar(organism, a) {
        Ok(v) => v,
        Err(e) => return organism.fail(e),
    };
    let bv = match pop_scalar(organism) {
        Ok(v) => v,
        Err(e) => return organism.fail(e),
    };
    organism.skip_next_instruction = pred(av.value, bv.value);
}

macro_rules! cond_handlers {
    ($shape:ident, $pos_name:ident, $neg_name:ident, $pos_pred:expr, $neg_pred:expr) => {
        fn $pos_name(o: &mut Organism, _e: &mut Environment, a: &[Operand]) {
            $shape(o, a, $pos_pred)
        }
        fn $neg_name(o: &mut Organism, _e: &mut Environment, a: &[Operand]) {
            $shape(o, a, $neg_pred)
        }
    };
}

cond_handlers!(eval_rr, h_ifr, h_inr, cmp_eq, cmp_ne);
cond_handlers!(eval_rs, h_ifs, h_ins, cmp_eq, cmp_ne);
cond_handlers!(eval_rr, h_ltr, h_getr, cmp_lt, cmp_ge);
cond_handlers!(eval_ri, h_lti, h_geti, cmp_lt, cmp_ge);
cond_handlers!(eval_rs, h_lts, h_gets, cmp_lt, cmp_ge);
cond_handlers!(eval_rr, h_gtr, h_letr, cmp_gt, cmp_le);
cond_handlers!(eval_ri, h_gti, h_leti, cmp_gt, cmp_le);
cond_handlers!(eval_rs, h_gts, h_lets, cmp_gt, cmp_le);
cond_handlers!(eval_rr, h_iftr, h_intr, cmp_tol, cmp_not_tol);
cond_handlers!(eval_ri, h_ifti, h_inti, cmp_tol, cmp_not_tol);
cond_handlers!(eval_rs, h_ifts, h_ints, cmp_tol, cmp_not_tol);
cond_handlers!(eval_rr, h_ifmr, h_inmr, cmp_mag_ge, cmp_mag_lt);
cond_handlers!(eval_ri, h_ifmi, h_inmi, cmp_mag_ge, cmp_mag_lt);
cond_handlers!(eval_rs, h_ifms, h_inms, cmp_mag_ge, cmp_mag_lt);

fn h_nop(_o: &mut Organism, _e: &mut Environment, _a: &[Operand]) {}

// ---------------------------------------------------------------------
// Data movement.
// ---------------------------------------------------------------------

fn h_setr(o: &mut Organism, _e: &mut Environment, a: &[Operand]) {
    let dst = as_register(&a[0]);
    let src = as_register(&a[1]);
    let v = match o.get_register(src) {
        Ok(v) => v,
        Err(_) => return o.fail("register index out of bounds"),
    };
    if let Err(e) = set_reg(o, dst, v) {
        o.fail(e);
    }
}

fn h_seti(o: &mut Organism, _e: &mut Environment, a: &[Operand]) {
    let dst = as_register(&a[0]);
    let imm = as_literal(&a[1]);
    if let Err(e) = set_reg(o, dst, RegValue::Scalar(imm)) {
        o.fail(e);
    }
}

fn h_setv(o: &mut Organism, _e: &mut Environment, a: &[Operand]) {
    let dst = as_register(&a[0]);
    let v = as_vector(&a[1]).clone();
    if let Err(e) = set_reg(o, dst, RegValue::Vector(v)) {
        o.fail(e);
    }
}

fn h_push(o: &mut Organism, _e: &mut Environment, a: &[Operand]) {
    let src = as_register(&a[0]);
    let v = match o.get_register(src) {
        Ok(v) => v,
        Err(_) => return o.fail("register index out of bounds"),
    };
    if let Err(e) = push_value(o, v) {
        o.fail(e);
    }
}

fn h_pop(o: &mut Organism, _e: &mut Environment, a: &[Operand]) {
    let dst = as_register(&a[0]);
    let v = match o.data_stack.last() {
        Some(_) => o.data_stack.pop().unwrap(),
        None => return o.fail("data stack underflow"),
    };
    if let Err(e) = set_reg(o, dst, v) {
        o.fail(e);
    }
}

fn h_pushl(o: &mut Organism, _e: &mut Environment, a: &[Operand]) {
    let idx = as_location_register(&a[0]);
    let v = match o.lr(idx) {
        Ok(v) => v.clone(),
        Err(_) => return o.fail("location register index out of bounds"),
    };
    if o.location_stack.len() >= LOCATION_STACK_MAX_DEPTH {
        return o.fail("location stack overflow");
    }
    o.location_stack.push(v);
}

fn h_popl(o: &mut Organism, _e: &mut Environment, a: &[Operand]) {
    let idx = as_location_register(&a[0]);
    let v = match o.location_stack.pop() {
        Some(v) => v,
        None => return o.fail("location stack underflow"),
    };
    if o.set_lr(idx, v).is_err() {
        o.fail("location register index out of bounds");
    }
}

// ---------------------------------------------------------------------
// Arithmetic/bitwise. All preserve the first operand's molecule type and
// use wrapping arithmetic; division family fails on a zero divisor.
// ---------------------------------------------------------------------

fn binop(
    o: &mut Organism,
    a: &[Operand],
    f: fn(i32, i32) -> Result<i32, &'static str>,
) {
    let dst = as_register(&a[0]);
    let ra = as_register(&a[1]);
    let rb = as_register(&a[2]);
    let av = match reg_scalar(o, ra) {
        Ok(v) => v,
        Err(e) => return o.fail(e),
    };
    let bv = match reg_scalar(o, rb) {
        Ok(v) => v,
        Err(e) => return o.fail(e),
    };
    let result = match f(av.value, bv.value) {
        Ok(v) => v,
        Err(e) => return o.fail(e),
    };
    let out = Molecule::new(av.ty, result);
    if let Err(e) = set_reg(o, dst, RegValue::Scalar(out)) {
        o.fail(e);
    }
}

fn h_add(o: &mut Organism, _e: &mut Environment, a: &[Operand]) {
    binop(o, a, |x, y| Ok(x.wrapping_add(y)))
}
fn h_sub(o: &mut Organism, _e: &mut Environment, a: &[Operand]) {
    binop(o, a, |x, y| Ok(x.wrapping_sub(y)))
}
fn h_mul(o: &mut Organism, _e: &mut Environment, a: &[Operand]) {
    binop(o, a, |x, y| Ok(x.wrapping_mul(y)))
}
fn h_div(o: &mut Organism, _e: &mut Environment, a: &[Operand]) {
    binop(o, a, |x, y| {
        if y == 0 {
            Err("divide by zero")
        } else {
            Ok(x.wrapping_div(y))
        }
    })
}
fn h_mod(o: &mut Organism, _e: &mut Environment, a: &[Operand]) {
    binop(o, a, |x, y| {
        if y == 0 {
            Err("divide by zero")
        } else {
            Ok(x.wrapping_rem(y))
        }
    })
}
fn h_and(o: &mut Organism, _e: &mut Environment, a: &[Operand]) {
    binop(o, a, |x, y| Ok(x & y))
}
fn h_or(o: &mut Organism, _e: &mut Environment, a: &[Operand]) {
    binop(o, a, |x, y| Ok(x | y))
}
fn h_xor(o: &mut Organism, _e: &mut Environment, a: &[Operand]) {
    binop(o, a, |x, y| Ok(x ^ y))
}
fn h_shl(o: &mut Organism, _e: &mut Environment, a: &[Operand]) {
    binop(o, a, |x, y| Ok(x.wrapping_shl(y as u32 & 31)))
}
fn h_shr(o: &mut Organism, _e: &mut Environment, a: &[Operand]) {
    binop(o, a, |x, y| Ok(x.wrapping_shr(y as u32 & 31)))
}

fn h_not(o: &mut Organism, _e: &mut Environment, a: &[Operand]) {
    let dst = as_register(&a[0]);
    let ra = as_register(&a[1]);
    let av = match reg_scalar(o, ra) {
        Ok(v) => v,
        Err(e) => return o.fail(e),
    };
    let out = Molecule::new(av.ty, !av.value);
    if let Err(e) = set_reg(o, dst, RegValue::Scalar(out)) {
        o.fail(e);
    }
}

// ---------------------------------------------------------------------
// Environment access via the active data pointer.
// ---------------------------------------------------------------------

fn h_peek(o: &mut Organism, env: &mut Environment, a: &[Operand]) {
    let dst = as_register(&a[0]);
    let dp = o.active_dp().clone();
    let mol = match env.get(&dp) {
        Ok(m) => m,
        Err(_) => return o.fail("coordinate out of bounds"),
    };
    if let Err(e) = set_reg(o, dst, RegValue::Scalar(mol)) {
        o.fail(e);
    }
}

fn h_poke(o: &mut Organism, env: &mut Environment, a: &[Operand]) {
    let src = as_register(&a[0]);
    let mol = match reg_scalar(o, src) {
        Ok(m) => m,
        Err(e) => return o.fail(e),
    };
    let dp = o.active_dp().clone();
    match env.write_owned(&dp, mol, o.id) {
        Ok(true) => {}
        Ok(false) => o.fail("target cell is foreign-owned"),
        Err(_) => o.fail("coordinate out of bounds"),
    }
}

fn h_dpadd(o: &mut Organism, env: &mut Environment, a: &[Operand]) {
    let delta = as_vector(&a[0]);
    match env.target_coordinate(o.active_dp(), delta) {
        Some(c) => *o.active_dp_mut() = c,
        None => o.fail("coordinate out of bounds"),
    }
}

fn h_setdp(o: &mut Organism, _e: &mut Environment, a: &[Operand]) {
    let imm = as_literal(&a[0]);
    if imm.value < 0 || imm.value as usize >= NUM_DATA_POINTERS {
        return o.fail("data pointer index out of bounds");
    }
    o.active_dp_index = imm.value as usize;
}

fn try_seek(o: &mut Organism, env: &mut Environment, delta: Coord) {
    let target = match env.target_coordinate(o.active_dp(), &delta) {
        Some(c) => c,
        None => return o.fail("coordinate out of bounds"),
    };
    let mol = match env.get(&target) {
        Ok(m) => m,
        Err(_) => return o.fail("coordinate out of bounds"),
    };
    if mol.is_empty() {
        return o.fail("seek target is empty");
    }
    let owner = env.owner(&target).unwrap_or(0);
    if owner != o.id {
        return o.fail("seek target is foreign-owned");
    }
    *o.active_dp_mut() = target;
}

fn h_seek(o: &mut Organism, env: &mut Environment, a: &[Operand]) {
    let src = as_register(&a[0]);
    let delta = match reg_vector(o, src) {
        Ok(v) => v,
        Err(e) => return o.fail(e),
    };
    try_seek(o, env, delta)
}

fn h_seki(o: &mut Organism, env: &mut Environment, a: &[Operand]) {
    let delta = as_vector(&a[0]).clone();
    try_seek(o, env, delta)
}

fn h_seks(o: &mut Organism, env: &mut Environment, _a: &[Operand]) {
    let delta = match pop_vector(o) {
        Ok(v) => v,
        Err(e) => return o.fail(e),
    };
    try_seek(o, env, delta)
}

/// Resets the active data pointer back to the instruction pointer, without
/// touching any other data pointer.
fn h_sync(o: &mut Organism, _e: &mut Environment, _a: &[Operand]) {
    *o.active_dp_mut() = o.ip.clone();
}

/// Reads the cell at `active_dp + delta` into a register without moving the
/// data pointer there (unlike `PEEK`, which reads the active DP in place).
fn h_scan(o: &mut Organism, env: &mut Environment, a: &[Operand]) {
    let dst = as_register(&a[0]);
    let delta = as_vector(&a[1]);
    let target = match env.target_coordinate(o.active_dp(), delta) {
        Some(c) => c,
        None => return o.fail("coordinate out of bounds"),
    };
    let mol = match env.get(&target) {
        Ok(m) => m,
        Err(_) => return o.fail("coordinate out of bounds"),
    };
    if let Err(e) = set_reg(o, dst, RegValue::Scalar(mol)) {
        o.fail(e);
    }
}

// ---------------------------------------------------------------------
// Control flow: CALL/RET/BINDFPR/JMPI.
// ---------------------------------------------------------------------

fn h_call(o: &mut Organism, env: &mut Environment, a: &[Operand]) {
    let delta = as_label(&a[0]);
    if o.call_stack.len() >= CALL_STACK_MAX_DEPTH {
        return o.fail("call stack overflow");
    }
    let target = match env.target_coordinate(&o.ip, delta) {
        Some(c) => c,
        None => return o.fail("coordinate out of bounds"),
    };
    let instr_len = 1 + delta.dim() as i32;
    let return_ip = match env.target_coordinate(&o.ip, &o.dv.scaled(instr_len)) {
        Some(c) => c,
        None => return o.fail("coordinate out of bounds"),
    };
    o.call_stack.push(ProcFrame {
        proc_name: format!("proc@{target}"),
        return_ip,
        saved_prs: o.prs.clone(),
        saved_fprs: o.fprs.clone(),
        fpr_bindings: [None; NUM_FORMAL_PARAM_REGISTERS],
    });
    o.ip = target;
    o.skip_ip_advance = true;
}

fn h_ret(o: &mut Organism, _e: &mut Environment, _a: &[Operand]) {
    match o.call_stack.pop() {
        None => o.fail("call stack underflow"),
        Some(frame) => {
            o.prs = frame.saved_prs;
            o.fprs = frame.saved_fprs;
            o.ip = frame.return_ip;
            o.skip_ip_advance = true;
        }
    }
}

fn h_bindfpr(o: &mut Organism, _e: &mut Environment, a: &[Operand]) {
    let imm = as_literal(&a[0]);
    let src = as_register(&a[1]);
    if imm.value < 0 || imm.value as usize >= NUM_FORMAL_PARAM_REGISTERS {
        return o.fail("formal parameter register index out of bounds");
    }
    let idx = imm.value as usize;
    let resolved = o.flatten_binding(src);
    match o.call_stack.last_mut() {
        None => o.fail("no active procedure frame"),
        Some(frame) => frame.fpr_bindings[idx] = Some(resolved),
    }
}

fn h_jmpi(o: &mut Organism, env: &mut Environment, a: &[Operand]) {
    let delta = as_label(&a[0]);
    match env.target_coordinate(&o.ip, delta) {
        Some(c) => {
            o.ip = c;
            o.skip_ip_advance = true;
        }
        None => o.fail("coordinate out of bounds"),
    }
}

/// `JMPI`'s register-sourced counterpart, same relation as `SEEK` to `SEKI`:
/// the jump delta is read from a register instead of assembled inline.
fn h_jmp(o: &mut Organism, env: &mut Environment, a: &[Operand]) {
    let src = as_register(&a[0]);
    let delta = match reg_vector(o, src) {
        Ok(v) => v,
        Err(e) => return o.fail(e),
    };
    match env.target_coordinate(&o.ip, &delta) {
        Some(c) => {
            o.ip = c;
            o.skip_ip_advance = true;
        }
        None => o.fail("coordinate out of bounds"),
    }
}

// ---------------------------------------------------------------------
// Energy, reproduction, death.
// ---------------------------------------------------------------------

fn h_enrg(o: &mut Organism, env: &mut Environment, _a: &[Operand]) {
    let dp = o.active_dp().clone();
    let mol = match env.get(&dp) {
        Ok(m) => m,
        Err(_) => return o.fail("coordinate out of bounds"),
    };
    if mol.ty != MoleculeType::Energy {
        return o.fail("active data pointer does not hold energy");
    }
    let owner = env.owner(&dp).unwrap_or(0);
    if owner != 0 && owner != o.id {
        return o.fail("energy cell is foreign-owned");
    }
    match env.write_owned(&dp, Molecule::EMPTY, o.id) {
        Ok(true) => o.er += mol.value as i64,
        Ok(false) => o.fail("energy cell is foreign-owned"),
        Err(_) => o.fail("coordinate out of bounds"),
    }
}

fn h_fork(o: &mut Organism, _e: &mut Environment, a: &[Operand]) {
    let delta = as_vector(&a[0]).clone();
    o.pending_fork = Some(ForkRequest { delta });
}

fn h_kill(o: &mut Organism, _e: &mut Environment, _a: &[Operand]) {
    o.is_dead = true;
}

// ---------------------------------------------------------------------
// Table assembly.
// ---------------------------------------------------------------------

use ArgSignature::{Label, Literal, LocationRegister as LR, Register as R, Vector as V};

pub fn opcode_table() -> Vec<OpcodeEntry> {
    let mut id = 0u16;
    let mut next_id = move || {
        let this = id;
        id += 1;
        this
    };

    macro_rules! entry {
        ($mnemonic:expr, [$($sig:expr),*], $cost:expr, $handler:expr) => {
            OpcodeEntry {
                id: next_id(),
                mnemonic: $mnemonic,
                arg_signatures: &[$($sig),*],
                cost: $cost,
                handler: $handler,
                negated_opcode_id: None,
            }
        };
    }

    let mut entries = vec![
        entry!("NOP", [], 1, h_nop),
        entry!("IFR", [R, R], 1, h_ifr),
        entry!("INR", [R, R], 1, h_inr),
        entry!("IFS", [R], 1, h_ifs),
        entry!("INS", [R], 1, h_ins),
        entry!("LTR", [R, R], 1, h_ltr),
        entry!("GETR", [R, R], 1, h_getr),
        entry!("LTI", [R, Literal], 1, h_lti),
        entry!("GETI", [R, Literal], 1, h_geti),
        entry!("LTS", [R], 1, h_lts),
        entry!("GETS", [R], 1, h_gets),
        entry!("GTR", [R, R], 1, h_gtr),
        entry!("LETR", [R, R], 1, h_letr),
        entry!("GTI", [R, Literal], 1, h_gti),
        entry!("LETI", [R, Literal], 1, h_leti),
        entry!("GTS", [R], 1, h_gts),
        entry!("LETS", [R], 1, h_lets),
        entry!("IFTR", [R, R], 1, h_iftr),
        entry!("INTR", [R, R], 1, h_intr),
        entry!("IFTI", [R, Literal], 1, h_ifti),
        entry!("INTI", [R, Literal], 1, h_inti),
        entry!("IFTS", [R], 1, h_ifts),
        entry!("INTS", [R], 1, h_ints),
        entry!("IFMR", [R, R], 1, h_ifmr),
        entry!("INMR", [R, R], 1, h_inmr),
        entry!("IFMI", [R, Literal], 1, h_ifmi),
        entry!("INMI", [R, Literal], 1, h_inmi),
        entry!("IFMS", [R], 1, h_ifms),
        entry!("INMS", [R], 1, h_inms),
        entry!("SETR", [R, R], 1, h_setr),
        entry!("SETI", [R, Literal], 1, h_seti),
        entry!("SETV", [R, V], 1, h_setv),
        entry!("PUSH", [R], 1, h_push),
        entry!("POP", [R], 1, h_pop),
        entry!("PUSHL", [LR], 1, h_pushl),
        entry!("POPL", [LR], 1, h_popl),
        entry!("ADD", [R, R, R], 1, h_add),
        entry!("SUB", [R, R, R], 1, h_sub),
        entry!("MUL", [R, R, R], 1, h_mul),
        entry!("DIV", [R, R, R], 1, h_div),
        entry!("MOD", [R, R, R], 1, h_mod),
        entry!("AND", [R, R, R], 1, h_and),
        entry!("OR", [R, R, R], 1, h_or),
        entry!("XOR", [R, R, R], 1, h_xor),
        entry!("NOT", [R, R], 1, h_not),
        entry!("SHL", [R, R, R], 1, h_shl),
        entry!("SHR", [R, R, R], 1, h_shr),
        entry!("PEEK", [R], 1, h_peek),
        entry!("POKE", [R], 1, h_poke),
        entry!("SCAN", [R, V], 1, h_scan),
        entry!("DPADD", [V], 1, h_dpadd),
        entry!("SETDP", [Literal], 1, h_setdp),
        entry!("SEEK", [R], 1, h_seek),
        entry!("SEKI", [V], 1, h_seki),
        entry!("SEKS", [], 1, h_seks),
        entry!("SYNC", [], 1, h_sync),
        entry!("CALL", [Label], 1, h_call),
        entry!("RET", [], 1, h_ret),
        entry!("BINDFPR", [Literal, R], 1, h_bindfpr),
        entry!("JMPI", [Label], 1, h_jmpi),
        entry!("JMP", [R], 1, h_jmp),
        entry!("ENRG", [], 1, h_enrg),
        entry!("FORK", [V], 1, h_fork),
        entry!("KILL", [], 1, h_kill),
    ];

    let by_mnemonic: hashbrown::HashMap<&'static str, u16> =
        entries.iter().map(|e| (e.mnemonic, e.id)).collect();

    let pairs: &[(&str, &str)] = &[
        ("IFR", "INR"),
        ("IFS", "INS"),
        ("LTR", "GETR"),
        ("LTI", "GETI"),
        ("LTS", "GETS"),
        ("GTR", "LETR"),
        ("GTI", "LETI"),
        ("GTS", "LETS"),
        ("IFTR", "INTR"),
        ("IFTI", "INTI"),
        ("IFTS", "INTS"),
        ("IFMR", "INMR"),
        ("IFMI", "INMI"),
        ("IFMS", "INMS"),
    ];
    for (pos, neg) in pairs {
        let pos_id = by_mnemonic[pos];
        let neg_id = by_mnemonic[neg];
        for entry in entries.iter_mut() {
            if entry.id == pos_id {
                entry.negated_opcode_id = Some(neg_id);
            } else if entry.id == neg_id {
                entry.negated_opcode_id = Some(pos_id);
            }
        }
    }

    entries
}
