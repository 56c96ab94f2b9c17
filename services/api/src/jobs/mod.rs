//! Background task planning and dispatch.
//!
//! Write handlers never enqueue tasks directly. The planner turns a state
//! transition into a list of side effects, the dispatcher submits them
//! through the domain ports, and the sweeper prunes finished job rows.

mod dispatcher;
mod planner;
mod sweeper;

pub use dispatcher::{Dispatcher, SubmittedJob};
pub use planner::{plan_create, plan_update, SideEffect};
pub use sweeper::{JobSweeper, JobSweeperConfig};
