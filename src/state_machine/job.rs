use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::Stage;
use super::status::ResultStatus;
use crate::error::{AdaptError, AdaptResult};
use crate::local_params::LocalParameters;
use crate::mesh::{SizeBounds, SolutionField, SurfaceMesh};

/// Everything the user asked for, owned by a single job.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub mesh_in: PathBuf,
    pub mesh_out: Option<PathBuf>,
    pub metric_in: Option<PathBuf>,
    pub metric_out: Option<PathBuf>,
    pub level_set_in: Option<PathBuf>,
    pub verbosity: i32,
    /// Level-set discretization instead of metric-driven adaptation.
    pub iso: bool,
    /// Derive sizes from the input mesh edge lengths.
    pub optim: bool,
    /// Save a side-car with default values instead of adapting.
    pub mark: bool,
    pub bounds: SizeBounds,
    pub local_params: LocalParameters,
    /// Directory searched for `DEFAULT.mmgs`.
    pub side_car_dir: PathBuf,
}

impl JobConfig {
    pub fn new(mesh_in: impl Into<PathBuf>) -> Self {
        Self {
            mesh_in: mesh_in.into(),
            mesh_out: None,
            metric_in: None,
            metric_out: None,
            level_set_in: None,
            verbosity: 1,
            iso: false,
            optim: false,
            mark: false,
            bounds: SizeBounds::default(),
            local_params: LocalParameters::default(),
            side_car_dir: PathBuf::from("."),
        }
    }

    /// Validate option combinations and fill in derived output paths.
    pub fn resolve(&mut self) -> AdaptResult<()> {
        if self.mesh_in.as_os_str().is_empty() {
            return Err(AdaptError::ConfigurationConflict("no input mesh given".into()));
        }

        let b = &self.bounds;
        if self.optim && b.hsiz.is_some() {
            return Err(AdaptError::ConfigurationConflict(
                "the optim and hsiz options are mutually exclusive".into(),
            ));
        }
        for (name, value) in [
            ("hmin", b.hmin),
            ("hmax", b.hmax),
            ("hsiz", b.hsiz),
            ("hausd", Some(b.hausd)),
        ] {
            if let Some(v) = value.filter(|v| !(*v > 0.0)) {
                return Err(AdaptError::ConfigurationConflict(format!(
                    "{name} must be positive, got {v}"
                )));
            }
        }
        if let Some((hmin, hmax)) = b.resolved().filter(|(lo, hi)| lo > hi) {
            return Err(AdaptError::ConfigurationConflict(format!(
                "hmin {hmin} is greater than hmax {hmax}"
            )));
        }

        let mesh_out = self
            .mesh_out
            .get_or_insert_with(|| default_output_path(&self.mesh_in))
            .clone();
        self.metric_out
            .get_or_insert_with(|| mesh_out.with_extension("sol"));
        Ok(())
    }

    /// `<mesh base>.sol`, looked up when no solution file is given.
    pub fn default_solution_path(&self) -> PathBuf {
        self.mesh_in.with_extension("sol")
    }
}

/// `<base>.o.<ext>`, keeping the input extension (`mesh` when there is none).
fn default_output_path(mesh_in: &Path) -> PathBuf {
    let ext = mesh_in
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("mesh");
    mesh_in.with_extension(format!("o.{ext}"))
}

/// Time spent in one stage and what it produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageTiming {
    pub stage: Stage,
    pub status: ResultStatus,
    pub elapsed_ms: f64,
}

/// A single mesh job: configuration plus the data loaded for it.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub config: JobConfig,
    pub mesh: Option<SurfaceMesh>,
    pub metric: Option<SolutionField>,
    pub level_set: Option<SolutionField>,
    pub stage: Stage,
    pub stage_history: Vec<Stage>,
    pub stage_timings: Vec<StageTiming>,
    /// Worst status produced so far.
    pub status: ResultStatus,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn new(config: JobConfig) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            config,
            mesh: None,
            metric: None,
            level_set: None,
            stage: Stage::Init,
            stage_history: Vec::new(),
            stage_timings: Vec::new(),
            status: ResultStatus::Success,
            created_at: Utc::now(),
        }
    }

    /// Drop every loaded mesh and field.
    pub fn release(&mut self) {
        self.mesh = None;
        self.metric = None;
        self.level_set = None;
    }
}

/// Structured record produced at job completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub job_id: String,
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub status: ResultStatus,
    pub stage_transitions: Vec<Stage>,
    pub stage_timings: Vec<StageTiming>,
    pub local_params: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: i64,
}

impl JobReport {
    /// Generate a report from a finished (or aborted) job.
    pub fn from_job(job: &Job) -> Self {
        let now = Utc::now();
        let duration = now - job.created_at;

        Self {
            job_id: job.id.clone(),
            input: job.config.mesh_in.clone(),
            output: job.config.mesh_out.clone(),
            status: job.status,
            stage_transitions: job.stage_history.clone(),
            stage_timings: job.stage_timings.clone(),
            local_params: job.config.local_params.len(),
            started_at: job.created_at,
            completed_at: now,
            duration_ms: duration.num_milliseconds(),
        }
    }
}
