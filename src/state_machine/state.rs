use std::fmt;

use serde::{Deserialize, Serialize};

use super::job::Job;
use super::status::ResultStatus;

/// Stages of a mesh job.
///
/// Each job flows through: INIT → PARSE_ARGS → LOAD_INPUTS → PARSE_LOCAL_PARAMS →
/// (DEFAULT_OPTION | ADAPT → SAVE_OUTPUTS) → CLEANUP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Init,
    ParseArgs,
    LoadInputs,
    ParseLocalParams,
    DefaultOption,
    Adapt,
    SaveOutputs,
    Cleanup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Init => write!(f, "INIT"),
            Stage::ParseArgs => write!(f, "PARSE_ARGS"),
            Stage::LoadInputs => write!(f, "LOAD_INPUTS"),
            Stage::ParseLocalParams => write!(f, "PARSE_LOCAL_PARAMS"),
            Stage::DefaultOption => write!(f, "DEFAULT_OPTION"),
            Stage::Adapt => write!(f, "ADAPT"),
            Stage::SaveOutputs => write!(f, "SAVE_OUTPUTS"),
            Stage::Cleanup => write!(f, "CLEANUP"),
        }
    }
}

/// The result of evaluating a stage transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Advance to the next stage.
    Next(Stage),
    /// Cleanup has run; the job is over with this final status.
    Complete(ResultStatus),
}

/// Drives a `Job` through its stages.
pub struct StateMachine;

impl StateMachine {
    /// Compute and apply the transition out of the job's current stage given
    /// the status that stage produced.
    ///
    /// - A strong failure anywhere jumps straight to `Cleanup`.
    /// - A low failure while reading the side-car file ends the job without
    ///   adapting; a low failure from `Adapt` still proceeds to `SaveOutputs`.
    /// - `DefaultOption` never saves the mesh: the side-car file is its output.
    /// - `Cleanup` is terminal and always returns `Complete`.
    pub fn next(job: &mut Job, status: ResultStatus) -> Transition {
        job.status = job.status.worst(status);

        let transition = match (job.stage, status) {
            (Stage::Cleanup, _) => Transition::Complete(job.status),
            (_, ResultStatus::StrongFailure) => Transition::Next(Stage::Cleanup),
            (Stage::Init, _) => Transition::Next(Stage::ParseArgs),
            (Stage::ParseArgs, _) => Transition::Next(Stage::LoadInputs),
            (Stage::LoadInputs, _) => Transition::Next(Stage::ParseLocalParams),
            (Stage::ParseLocalParams, ResultStatus::Success) => {
                if job.config.mark {
                    Transition::Next(Stage::DefaultOption)
                } else {
                    Transition::Next(Stage::Adapt)
                }
            }
            (Stage::ParseLocalParams, ResultStatus::LowFailure) => Transition::Next(Stage::Cleanup),
            (Stage::DefaultOption, _) => Transition::Next(Stage::Cleanup),
            (Stage::Adapt, _) => Transition::Next(Stage::SaveOutputs),
            (Stage::SaveOutputs, _) => Transition::Next(Stage::Cleanup),
        };

        job.stage_history.push(job.stage);
        if let Transition::Next(next) = transition {
            job.stage = next;
        }

        transition
    }
}
