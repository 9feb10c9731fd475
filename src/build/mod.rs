//! Rebuild scheduling: jobs, execution modes and thread dispatch

pub mod dispatch;
pub mod job;
pub mod scheduler;

pub use dispatch::{QueueHandle, WorkQueue};
pub use job::{BuildJob, JobProgress};
pub use scheduler::{
    BuildComplete, BuildOptions, BuildPoll, ExecutionMode, MeshBuilder, StartOutcome,
};
