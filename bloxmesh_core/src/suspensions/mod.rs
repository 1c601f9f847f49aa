mod role;
mod scheduler;
mod suspend;
mod sweep;
mod unsuspend;

pub use role::{clear_suspended_role, set_suspended_role, SetSuspendedRoleError};
pub use scheduler::{Sweeper, SweeperHandle};
pub use suspend::{suspend, Suspend, SuspendArguments};
pub use sweep::{sweep_all, sweep_document, sweep_group, FailurePolicy, SweepReport};
pub use unsuspend::{unsuspend, Unsuspend};
