mod job;
mod state;
mod status;

pub use job::{Job, JobConfig, JobReport, StageTiming};
pub use state::{Stage, StateMachine, Transition};
pub use status::ResultStatus;
