//! Fixed per-organism register/stack limits and the register id ABI (spec.md §6).

/// Number of general-purpose data registers (DR0..DR{N-1}).
pub const NUM_DATA_REGISTERS: usize = 8;
/// Number of procedure registers (PR0..PR{N-1}), saved/restored across CALL/RET.
pub const NUM_PROC_REGISTERS: usize = 4;
/// Number of formal parameter registers available inside a procedure body.
pub const NUM_FORMAL_PARAM_REGISTERS: usize = 4;
/// Number of data pointers (DP0..DP{N-1}); `active_dp_index` selects the default target.
pub const NUM_DATA_POINTERS: usize = 4;
/// Number of location registers (LR0..LR{N-1}), coordinate-valued.
pub const NUM_LOCATION_REGISTERS: usize = 4;

/// Maximum depth of the call stack before a `CALL` fails with an overflow.
pub const CALL_STACK_MAX_DEPTH: usize = 64;
/// Maximum depth of the data stack.
pub const DATA_STACK_MAX_DEPTH: usize = 256;
/// Maximum depth of the location stack.
pub const LOCATION_STACK_MAX_DEPTH: usize = 256;

/// Numeric base of the PR id namespace within the combined register id space (spec.md §6).
pub const PR_BASE: u32 = 1000;
/// Numeric base of the FPR id namespace within the combined register id space (spec.md §6).
pub const FPR_BASE: u32 = 2000;
