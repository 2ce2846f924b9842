//! The raw tick serializer (spec.md §4.10, §6): the *only* surface the core
//! offers to a persistence/indexer layer. Produces an un-annotated, fully
//! owned snapshot — the serializer never disassembles; a downstream indexer
//! re-runs the disassembler (spec.md §4.5) against a [`crate::memory::SnapshotReader`]
//! built from `RawTickState::cells`.

use serde::{Deserialize, Serialize};

use crate::coord::Coord;
use crate::environment::Environment;
use crate::organism::{Organism, RegValue, RegisterId};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "space", rename_all = "camelCase")]
pub enum RawRegisterId {
    Dr { index: usize },
    Pr { index: usize },
    Fpr { index: usize },
}

impl From<RegisterId> for RawRegisterId {
    fn from(id: RegisterId) -> Self {
        match id {
            RegisterId::Dr(index) => RawRegisterId::Dr { index },
            RegisterId::Pr(index) => RawRegisterId::Pr { index },
            RegisterId::Fpr(index) => RawRegisterId::Fpr { index },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RawRegValue {
    Scalar { word: i32 },
    Vector { coord: Coord },
}

impl From<&RegValue> for RawRegValue {
    fn from(v: &RegValue) -> Self {
        match v {
            RegValue::Scalar(m) => RawRegValue::Scalar { word: m.to_word() },
            RegValue::Vector(c) => RawRegValue::Vector { coord: c.clone() },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawProcFrame {
    pub proc_name: String,
    pub return_ip: Coord,
    pub saved_prs: Vec<RawRegValue>,
    pub saved_fprs: Vec<RawRegValue>,
    pub fpr_bindings: Vec<Option<RawRegisterId>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawCellState {
    pub coord: Coord,
    pub molecule_word: i32,
    pub owner_id: u64,
}

/// Full per-organism state snapshot: every register, pointer, stack, flag,
/// plus `ipBeforeFetch`/`dvBeforeFetch` (spec.md §4.10).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawOrganismState {
    pub id: u64,
    pub program_id: Option<String>,
    pub parent_id: Option<u64>,
    pub birth_tick: u64,
    pub ip: Coord,
    pub dv: Coord,
    pub dps: Vec<Coord>,
    pub active_dp_index: usize,
    pub lrs: Vec<Coord>,
    pub drs: Vec<RawRegValue>,
    pub prs: Vec<RawRegValue>,
    pub fprs: Vec<RawRegValue>,
    pub data_stack: Vec<RawRegValue>,
    pub location_stack: Vec<Coord>,
    pub call_stack: Vec<RawProcFrame>,
    pub er: i64,
    pub ip_before_fetch: Coord,
    pub dv_before_fetch: Coord,
    pub instruction_failed: bool,
    pub failure_reason: Option<String>,
    pub skip_next_instruction: bool,
    pub skip_ip_advance: bool,
    pub is_dead: bool,
}

impl From<&Organism> for RawOrganismState {
    fn from(o: &Organism) -> Self {
        Self {
            id: o.id,
            program_id: o.program_id.clone(),
            parent_id: o.parent_id,
            birth_tick: o.birth_tick,
            ip: o.ip.clone(),
            dv: o.dv.clone(),
            dps: o.dps.to_vec(),
            active_dp_index: o.active_dp_index,
            lrs: o.lrs.to_vec(),
            drs: o.drs.iter().map(RawRegValue::from).collect(),
            prs: o.prs.iter().map(RawRegValue::from).collect(),
            fprs: o.fprs.iter().map(RawRegValue::from).collect(),
            data_stack: o.data_stack.iter().map(RawRegValue::from).collect(),
            location_stack: o.location_stack.clone(),
            call_stack: o
                .call_stack
                .iter()
                .map(|f| RawProcFrame {
                    proc_name: f.proc_name.clone(),
                    return_ip: f.return_ip.clone(),
                    saved_prs: f.saved_prs.iter().map(RawRegValue::from).collect(),
                    saved_fprs: f.saved_fprs.iter().map(RawRegValue::from).collect(),
                    fpr_bindings: f
                        .fpr_bindings
                        .iter()
                        .map(|b| b.map(RawRegisterId::from))
                        .collect(),
                })
                .collect(),
            er: o.er,
            ip_before_fetch: o.ip_before_fetch.clone(),
            dv_before_fetch: o.dv_before_fetch.clone(),
            instruction_failed: o.instruction_failed,
            failure_reason: o.failure_reason.as_ref().map(|r| r.to_string()),
            skip_next_instruction: o.skip_next_instruction,
            skip_ip_advance: o.skip_ip_advance,
            is_dead: o.is_dead,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawTickState {
    pub tick_number: i64,
    pub organisms: Vec<RawOrganismState>,
    pub cells: Vec<RawCellState>,
}

/// Builds a [`RawTickState`] from live simulation state (spec.md §4.10). Only
/// non-empty or owned cells are included — a cell absent from `cells` is
/// understood by a [`crate::memory::SnapshotReader`] to be empty and unowned.
pub fn capture_tick(tick_number: i64, env: &Environment, organisms: &[Organism]) -> RawTickState {
    let mut cells = Vec::new();
    for index in 0..env.len() as i64 {
        let coord = env
            .flat_index_to_coord(index)
            .expect("index within env.len() always maps to a coordinate");
        let molecule = env.get(&coord).expect("coordinate from this env is always in range");
        let owner_id = env
            .owner(&coord)
            .expect("coordinate from this env is always in range");
        if !molecule.is_empty() || owner_id != 0 {
            cells.push(RawCellState {
                coord,
                molecule_word: molecule.to_word(),
                owner_id,
            });
        }
    }
    RawTickState {
        tick_number,
        organisms: organisms.iter().map(RawOrganismState::from).collect(),
        cells,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::coord::Coord as C;
    use crate::molecule::{Molecule, MoleculeType};

    #[test]
    fn capture_tick_only_includes_non_default_cells() {
        let mut env = Environment::new(vec![3, 3], false);
        env.set(&C::new(vec![1, 1]), Molecule::new(MoleculeType::Data, 5))
            .unwrap();
        let snapshot = capture_tick(7, &env, &[]);
        assert_eq!(snapshot.tick_number, 7);
        assert_eq!(snapshot.cells.len(), 1);
        assert_eq!(snapshot.cells[0].coord, C::new(vec![1, 1]));
    }

    #[test]
    fn capture_tick_snapshots_full_organism_state() {
        let env = Environment::new(vec![3, 3], false);
        let organism = Organism::new(5, Some("prog".into()), None, 0, C::new(vec![0, 0]), C::new(vec![1, 0]), 10);
        let snapshot = capture_tick(0, &env, std::slice::from_ref(&organism));
        assert_eq!(snapshot.organisms.len(), 1);
        assert_eq!(snapshot.organisms[0].id, 5);
        assert_eq!(snapshot.organisms[0].er, 10);
    }
}
