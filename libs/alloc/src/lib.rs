//! # labplan-alloc
//!
//! Per-well volume allocation.
//!
//! Each input row names the volumes of two reagents for one well. Given a
//! target total volume per well, the allocator computes the third component
//! (the diluent) needed to reach the target:
//!
//! ```text
//! total     = component_a + component_b
//! remaining = max(0, target - total)
//! ```
//!
//! ## Invariants
//!
//! - Output maps 1:1 to input rows, in order (row `i` is well `i`)
//! - `remaining` is never negative
//! - A row whose total exceeds the target is not an error; its `remaining`
//!   saturates at zero and [`Allocation::overfilled`] reports it
//! - Conversion is fail-fast: one bad cell aborts the whole batch and no
//!   partial result is returned
//! - Allocation is pure and deterministic

mod allocate;
mod error;
mod types;

pub use allocate::{allocate, allocate_table, rows_from_table, Allocation, ReagentTotals};
pub use error::AllocError;
pub use types::{
    AllocationResult, ColumnNames, ReagentRow, TargetVolume, DEFAULT_COMPONENT_A_COLUMN,
    DEFAULT_COMPONENT_B_COLUMN,
};
