//! Sandboxed execution via IOI isolate.
//!
//! Low-level driver only: box lifecycle, staging, resource limits and
//! outcome reporting. Verdict interpretation and output comparison live
//! with the worker.

mod isolate_box;
mod meta;

pub use isolate_box::{run_submission, IsolateBox, RunSpec};
pub use meta::{outcome_from_meta, RunOutcome};
