//! Per-organism state (spec.md §3, §4.6).

use std::borrow::Cow;

use crate::coord::Coord;
use crate::limits::{
    FPR_BASE, NUM_DATA_POINTERS, NUM_DATA_REGISTERS, NUM_FORMAL_PARAM_REGISTERS,
    NUM_LOCATION_REGISTERS, NUM_PROC_REGISTERS, PR_BASE,
};
use crate::molecule::Molecule;

/// A register slot may hold either a scalar (molecule-encoded integer) or a
/// coordinate-valued vector (spec.md §9, "Heterogeneous stack entries"). DR,
/// PR, and FPR slots, and the data stack, are all typed this way; LR slots and
/// the location stack are always coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum RegValue {
    Scalar(Molecule),
    Vector(Coord),
}

impl RegValue {
    pub fn as_scalar(&self) -> Option<Molecule> {
        match self {
            RegValue::Scalar(m) => Some(*m),
            RegValue::Vector(_) => None,
        }
    }

    pub fn as_vector(&self) -> Option<&Coord> {
        match self {
            RegValue::Vector(v) => Some(v),
            RegValue::Scalar(_) => None,
        }
    }
}

impl Default for RegValue {
    fn default() -> Self {
        RegValue::Scalar(Molecule::EMPTY)
    }
}

/// A register reference anywhere in the combined DR/PR/FPR id space
/// (spec.md §6): DR ids `0..NUM_DATA_REGISTERS`, PR ids start at `PR_BASE`,
/// FPR ids start at `FPR_BASE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterId {
    Dr(usize),
    Pr(usize),
    Fpr(usize),
}

impl RegisterId {
    pub fn from_raw(raw: i32) -> Option<Self> {
        let raw = raw as u32;
        if raw >= FPR_BASE {
            Some(RegisterId::Fpr((raw - FPR_BASE) as usize))
        } else if raw >= PR_BASE {
            Some(RegisterId::Pr((raw - PR_BASE) as usize))
        } else {
            Some(RegisterId::Dr(raw as usize))
        }
    }

    pub fn to_raw(self) -> i32 {
        match self {
            RegisterId::Dr(i) => i as i32,
            RegisterId::Pr(i) => PR_BASE as i32 + i as i32,
            RegisterId::Fpr(i) => FPR_BASE as i32 + i as i32,
        }
    }
}

/// Saved state pushed by `CALL`, popped by `RET` (spec.md §3, §9).
#[derive(Debug, Clone)]
pub struct ProcFrame {
    pub proc_name: String,
    pub return_ip: Coord,
    pub saved_prs: [RegValue; NUM_PROC_REGISTERS],
    pub saved_fprs: [RegValue; NUM_FORMAL_PARAM_REGISTERS],
    /// FPR id -> the concrete (non-FPR) register it resolves to in an outer
    /// frame, flattened eagerly so a read never needs to walk the chain
    /// (spec.md §9, "ProcFrame chains for FPR resolution").
    pub fpr_bindings: [Option<RegisterId>; NUM_FORMAL_PARAM_REGISTERS],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfBounds;

/// A live organism. Mutated only by its own VM step (plus energy effects from
/// world-gen strategies); never holds a back-reference to its simulation
/// (spec.md §9, "Cyclic references") — environment, ISA registry, and the
/// organism roster are all passed in per call instead.
#[derive(Debug, Clone)]
pub struct Organism {
    pub id: u64,
    pub program_id: Option<String>,
    pub parent_id: Option<u64>,
    pub birth_tick: u64,

    pub ip: Coord,
    pub dv: Coord,

    pub dps: [Coord; NUM_DATA_POINTERS],
    pub active_dp_index: usize,

    pub lrs: [Coord; NUM_LOCATION_REGISTERS],

    pub drs: [RegValue; NUM_DATA_REGISTERS],
    pub prs: [RegValue; NUM_PROC_REGISTERS],
    pub fprs: [RegValue; NUM_FORMAL_PARAM_REGISTERS],

    pub data_stack: Vec<RegValue>,
    pub location_stack: Vec<Coord>,
    pub call_stack: Vec<ProcFrame>,

    pub er: i64,

    pub ip_before_fetch: Coord,
    pub dv_before_fetch: Coord,

    pub instruction_failed: bool,
    pub failure_reason: Option<Cow<'static, str>>,
    pub skip_next_instruction: bool,
    pub skip_ip_advance: bool,
    pub is_dead: bool,

    /// Set by the `FORK` handler; consumed by the scheduler after `execute`
    /// returns, since only the scheduler owns the next-id counter and the
    /// organism roster (spec.md §9, "Cyclic references").
    pub pending_fork: Option<ForkRequest>,
}

#[derive(Debug, Clone)]
pub struct ForkRequest {
    pub delta: Coord,
}

impl Organism {
    pub fn new(
        id: u64,
        program_id: Option<String>,
        parent_id: Option<u64>,
        birth_tick: u64,
        ip: Coord,
        dv: Coord,
        er: i64,
    ) -> Self {
        let dim = ip.dim();
        Self {
            id,
            program_id,
            parent_id,
            birth_tick,
            ip: ip.clone(),
            dv,
            dps: std::array::from_fn(|_| ip.clone()),
            active_dp_index: 0,
            lrs: std::array::from_fn(|_| Coord::zeros(dim)),
            drs: std::array::from_fn(|_| RegValue::default()),
            prs: std::array::from_fn(|_| RegValue::default()),
            fprs: std::array::from_fn(|_| RegValue::default()),
            data_stack: Vec::new(),
            location_stack: Vec::new(),
            call_stack: Vec::new(),
            er,
            ip_before_fetch: ip.clone(),
            dv_before_fetch: Coord::zeros(dim),
            instruction_failed: false,
            failure_reason: None,
            skip_next_instruction: false,
            skip_ip_advance: false,
            is_dead: false,
            pending_fork: None,
        }
    }

    /// Marks this instruction as failed, leaving every other field untouched
    /// (spec.md §7, §8 "Isolation of failures"). Idempotent-ish: the first
    /// failure of an instruction wins.
    pub fn fail(&mut self, reason: impl Into<Cow<'static, str>>) {
        if !self.instruction_failed {
            self.instruction_failed = true;
            self.failure_reason = Some(reason.into());
        }
    }

    pub fn active_dp(&self) -> &Coord {
        &self.dps[self.active_dp_index]
    }

    pub fn active_dp_mut(&mut self) -> &mut Coord {
        &mut self.dps[self.active_dp_index]
    }

    pub fn dp(&self, index: usize) -> Result<&Coord, OutOfBounds> {
        self.dps.get(index).ok_or(OutOfBounds)
    }

    pub fn lr(&self, index: usize) -> Result<&Coord, OutOfBounds> {
        self.lrs.get(index).ok_or(OutOfBounds)
    }

    pub fn set_lr(&mut self, index: usize, value: Coord) -> Result<(), OutOfBounds> {
        *self.lrs.get_mut(index).ok_or(OutOfBounds)? = value;
        Ok(())
    }

    pub fn get_register(&self, id: RegisterId) -> Result<RegValue, OutOfBounds> {
        match id {
            RegisterId::Dr(i) => self.drs.get(i).cloned().ok_or(OutOfBounds),
            RegisterId::Pr(i) => self.prs.get(i).cloned().ok_or(OutOfBounds),
            RegisterId::Fpr(i) => self.resolve_fpr(i),
        }
    }

    pub fn set_register(&mut self, id: RegisterId, value: RegValue) -> Result<(), OutOfBounds> {
        match id {
            RegisterId::Dr(i) => *self.drs.get_mut(i).ok_or(OutOfBounds)? = value,
            RegisterId::Pr(i) => *self.prs.get_mut(i).ok_or(OutOfBounds)? = value,
            RegisterId::Fpr(i) => return self.set_fpr(i, value),
        }
        Ok(())
    }

    /// Reads an FPR by resolving its binding in the current call frame.
    /// Bindings are already flattened at `CALL`/`BINDFPR` time, so this never
    /// needs to walk more than one frame (spec.md §9).
    fn resolve_fpr(&self, index: usize) -> Result<RegValue, OutOfBounds> {
        let frame = self.call_stack.last().ok_or(OutOfBounds)?;
        let bound = frame.fpr_bindings.get(index).copied().flatten();
        match bound {
            Some(target) => self.get_register(target),
            None => self.fprs.get(index).cloned().ok_or(OutOfBounds),
        }
    }

    fn set_fpr(&mut self, index: usize, value: RegValue) -> Result<(), OutOfBounds> {
        let bound = self
            .call_stack
            .last()
            .and_then(|f| f.fpr_bindings.get(index).copied().flatten());
        match bound {
            Some(target) => self.set_register(target, value),
            None => {
                *self.fprs.get_mut(index).ok_or(OutOfBounds)? = value;
                Ok(())
            }
        }
    }

    /// Resolves `source` to a concrete (non-FPR-in-the-current-frame) target,
    /// by following the caller's own (already-flattened) bindings one step if
    /// `source` is itself an FPR (spec.md §9, "ProcFrame chains").
    pub fn flatten_binding(&self, source: RegisterId) -> RegisterId {
        match source {
            RegisterId::Fpr(i) => self
                .call_stack
                .last()
                .and_then(|f| f.fpr_bindings.get(i).copied().flatten())
                .unwrap_or(source),
            other => other,
        }
    }
}
