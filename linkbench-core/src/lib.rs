//! Measurement library for the linkbench harness.
//!
//! Provides the four stages of a benchmark run: condensed distance-matrix
//! acquisition, linkage-variant dispatch onto the external clustering
//! collaborator, best-of-R timed execution, and single-line reporting. The
//! CLI crate wires these together; nothing here touches process-global
//! state, so a run's data lives entirely on its own stack.

mod dispatch;
mod measure;
mod report;
mod source;

pub use crate::{
    dispatch::{BoundLinkage, DispatchError, InvocationError, LinkageRule, Variant},
    measure::{MeasureError, best_of},
    report::{best_time_millis, render_best_time},
    source::{CondensedMatrix, SourceError, condensed_len},
};
