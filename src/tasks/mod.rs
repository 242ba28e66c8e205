//! Operational tasks that run outside the judging hot path.

pub mod admin;
pub mod bake;
pub mod reaper;
