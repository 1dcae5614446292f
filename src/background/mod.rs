//! Background tasks
//!
//! Currently one: the plan backfill loop that retries the planning
//! collaborator for complaints committed with `PlanPending`.

mod plan_backfill;

pub use plan_backfill::run_plan_backfill;
