//! Diff engine - Comparison logic and plan generation

mod compare;
mod engine;
mod plan;

pub use compare::compare_files;
pub use engine::generate_sync_plan;
pub use plan::{DiffPlan, PlanStats};
