use std::path::Path;

use crate::default_option::run_default_option;
use crate::error::{AdaptError, AdaptResult};
use crate::local_params::read_local_params;
use crate::mesh::{FieldRole, MeshFormat, SolutionField};
use crate::services::{AdaptInput, Backend};
use crate::state_machine::{
    Job, JobConfig, JobReport, ResultStatus, Stage, StageTiming, StateMachine, Transition,
};
use crate::timer::Timer;

/// Drives mesh jobs through the full stage lifecycle.
pub struct JobOrchestrator<B> {
    backend: B,
}

impl<B: Backend> JobOrchestrator<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Run a job to completion, returning its report.
    pub fn run_job(&self, config: JobConfig) -> JobReport {
        self.run_job_with(config, |_| {})
    }

    /// Like [`run_job`](Self::run_job), calling `on_stage` as each stage starts.
    pub fn run_job_with(&self, config: JobConfig, mut on_stage: impl FnMut(Stage)) -> JobReport {
        let mut job = Job::new(config);

        loop {
            on_stage(job.stage);
            let mut timer = Timer::started();
            let status = self.run_stage(&mut job);
            let elapsed = timer.stop();

            job.stage_timings.push(StageTiming {
                stage: job.stage,
                status,
                elapsed_ms: elapsed.as_secs_f64() * 1e3,
            });
            tracing::debug!(stage = %job.stage, %status, "stage finished");

            if let Transition::Complete(final_status) = StateMachine::next(&mut job, status) {
                tracing::debug!(job_id = %job.id, status = %final_status, "job complete");
                break;
            }
        }

        JobReport::from_job(&job)
    }

    fn run_stage(&self, job: &mut Job) -> ResultStatus {
        match job.stage {
            Stage::Init => {
                tracing::debug!(
                    job_id = %job.id,
                    input = %job.config.mesh_in.display(),
                    verbosity = job.config.verbosity,
                    "job started"
                );
                ResultStatus::Success
            }
            Stage::ParseArgs => match job.config.resolve() {
                Ok(()) => ResultStatus::Success,
                Err(e) => {
                    tracing::error!("{e}");
                    ResultStatus::StrongFailure
                }
            },
            Stage::LoadInputs => self.load_inputs(job),
            Stage::ParseLocalParams => parse_local_params(job),
            Stage::DefaultOption => run_default_option(&self.backend, job),
            Stage::Adapt => self.adapt(job),
            Stage::SaveOutputs => self.save_outputs(job),
            Stage::Cleanup => {
                job.release();
                tracing::debug!("job resources released");
                ResultStatus::Success
            }
        }
    }

    fn load_inputs(&self, job: &mut Job) -> ResultStatus {
        let config = &job.config;
        let format = MeshFormat::from_path_or(&config.mesh_in, MeshFormat::Medit);
        let role = if config.iso {
            FieldRole::LevelSet
        } else {
            FieldRole::Metric
        };

        tracing::info!(path = %config.mesh_in.display(), ?format, "-- INPUT DATA");
        let (mesh, embedded) = match self.backend.load_mesh(&config.mesh_in, format, role) {
            Ok(loaded) => loaded,
            Err(e) => return load_failure(&e, "UNABLE TO OPEN INPUT FILE"),
        };

        let mut metric = None;
        let mut level_set = None;

        if format.is_gmsh() {
            // the solution travels inside the mesh file
            match (config.iso, embedded) {
                (true, Some(field)) => level_set = Some(field),
                (true, None) => {
                    tracing::error!("NO ISOVALUE DATA");
                    return ResultStatus::StrongFailure;
                }
                (false, field) => metric = field,
            }
        } else if config.iso {
            level_set = match &config.level_set_in {
                Some(path) => match self.backend.load_solution(path, FieldRole::LevelSet) {
                    Ok(field) => Some(field),
                    Err(e) => return load_failure(&e, "UNABLE TO LOAD LEVEL-SET"),
                },
                None => {
                    let path = config.default_solution_path();
                    match self.backend.load_solution(&path, FieldRole::LevelSet) {
                        Ok(field) => Some(field),
                        Err(AdaptError::FileNotFound { .. }) => {
                            tracing::error!("NO ISOVALUE DATA");
                            return ResultStatus::StrongFailure;
                        }
                        Err(e) => return load_failure(&e, "UNABLE TO LOAD LEVEL-SET"),
                    }
                }
            };
            if let Some(path) = &config.metric_in {
                match load_explicit_metric(&self.backend, path) {
                    Ok(field) => metric = field,
                    Err(e) => return load_failure(&e, "UNABLE TO LOAD METRIC"),
                }
            }
        } else {
            let loaded = match &config.metric_in {
                Some(path) => load_explicit_metric(&self.backend, path),
                None => load_optional(&self.backend, &config.default_solution_path()),
            };
            metric = match loaded {
                Ok(field) => field,
                Err(e) => return load_failure(&e, "UNABLE TO LOAD METRIC"),
            };
            if config.mark {
                if let Some(path) = &config.level_set_in {
                    match self.backend.load_solution(path, FieldRole::LevelSet) {
                        Ok(field) => level_set = Some(field),
                        Err(e) => return load_failure(&e, "UNABLE TO LOAD LEVEL-SET"),
                    }
                }
            }
        }

        // the default-option pass drops mismatched fields on its own
        if !config.mark {
            let np = mesh.point_count();
            let mismatched = [&metric, &level_set]
                .into_iter()
                .flatten()
                .any(|f| f.has_data() && f.point_count() != np);
            if mismatched {
                tracing::error!("WRONG DATA TYPE OR WRONG SOLUTION NUMBER");
                return ResultStatus::StrongFailure;
            }
        }

        tracing::info!(
            points = mesh.point_count(),
            triangles = mesh.triangles.len(),
            "mesh loaded"
        );
        job.mesh = Some(mesh);
        job.metric = metric;
        job.level_set = level_set;
        ResultStatus::Success
    }

    fn adapt(&self, job: &mut Job) -> ResultStatus {
        let Job {
            config,
            mesh,
            metric,
            level_set,
            ..
        } = job;
        let Some(mesh) = mesh.as_mut() else {
            tracing::error!("no mesh loaded");
            return ResultStatus::StrongFailure;
        };

        if config.iso {
            let Some(level_set) = level_set.as_ref() else {
                tracing::error!("NO ISOVALUE DATA");
                return ResultStatus::StrongFailure;
            };
            tracing::info!("-- LEVEL-SET DISCRETIZATION");
            let input = AdaptInput {
                mesh,
                metric,
                bounds: &mut config.bounds,
                params: &mut config.local_params,
                optim: config.optim,
            };
            return self.backend.adapt_by_level_set(input, level_set);
        }

        if config.metric_in.is_some() && config.level_set_in.is_some() {
            let e = AdaptError::ConfigurationConflict(
                "IMPOSSIBLE TO PROVIDE BOTH A METRIC AND A SOLUTION IN ADAPTATION MODE".into(),
            );
            tracing::error!("{e}");
            return ResultStatus::StrongFailure;
        }
        if config.level_set_in.is_some() {
            tracing::warn!("level-set given without level-set mode, ignored");
        }

        tracing::info!(optim = config.optim, hsiz = ?config.bounds.hsiz, "-- MESH ADAPTATION");
        let input = AdaptInput {
            mesh,
            metric,
            bounds: &mut config.bounds,
            params: &mut config.local_params,
            optim: config.optim,
        };
        self.backend.adapt_by_metric(input)
    }

    fn save_outputs(&self, job: &mut Job) -> ResultStatus {
        if !job.status.allows_save() {
            return ResultStatus::StrongFailure;
        }
        let config = &job.config;
        let (Some(mesh), Some(out)) = (job.mesh.as_ref(), config.mesh_out.as_deref()) else {
            tracing::error!("nothing to save");
            return ResultStatus::StrongFailure;
        };
        if mesh.is_scaled() {
            tracing::error!("mesh is still in normalized coordinates, not saved");
            return ResultStatus::StrongFailure;
        }

        let input_format = MeshFormat::from_path_or(&config.mesh_in, MeshFormat::Medit);
        let format = MeshFormat::from_path_or(out, input_format);
        let field = job.metric.as_ref().filter(|m| m.has_data());

        tracing::info!(path = %out.display(), ?format, "-- WRITING DATA FILE");
        if format.is_gmsh() || format.is_vtk() {
            // field stored inside the mesh file
            return match self.backend.save_mesh(out, format, mesh, field) {
                Ok(()) => ResultStatus::Success,
                Err(e) => save_failure(&e),
            };
        }

        if let Err(e) = self.backend.save_mesh(out, format, mesh, None) {
            return save_failure(&e);
        }
        if let (Some(field), Some(sol_out)) = (field, config.metric_out.as_deref()) {
            if let Err(e) = self.backend.save_solution(sol_out, field) {
                return save_failure(&e);
            }
        }
        ResultStatus::Success
    }
}

/// Read the side-car; a bad file degrades the job but leaves the mesh usable.
fn parse_local_params(job: &mut Job) -> ResultStatus {
    match read_local_params(&job.config.mesh_in, &job.config.side_car_dir) {
        Ok(params) => {
            if !params.is_empty() {
                tracing::info!(count = params.len(), "local parameters registered");
            }
            job.config.local_params = params;
            ResultStatus::Success
        }
        Err(e) => {
            tracing::error!("{e}");
            ResultStatus::LowFailure
        }
    }
}

/// Load the implicit `<base>.sol`; its absence is not an error.
fn load_optional<B: Backend>(backend: &B, path: &Path) -> AdaptResult<Option<SolutionField>> {
    match backend.load_solution(path, FieldRole::Metric) {
        Ok(field) => Ok(Some(field)),
        Err(AdaptError::FileNotFound { .. }) => {
            tracing::debug!(path = %path.display(), "no metric file, default sizing is used");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// A named metric that does not exist is reported, then default sizing takes over.
fn load_explicit_metric<B: Backend>(
    backend: &B,
    path: &Path,
) -> AdaptResult<Option<SolutionField>> {
    let field = load_optional(backend, path)?;
    if field.is_none() {
        tracing::warn!("  %% {} NOT FOUND, default sizing is used", path.display());
    }
    Ok(field)
}

/// Missing and unreadable files get distinct messages; both are fatal.
fn load_failure(e: &AdaptError, diagnostic: &str) -> ResultStatus {
    match e {
        AdaptError::FileNotFound { .. } => tracing::error!("  ** {e}"),
        _ => tracing::error!("  ** READ ERROR: {e}"),
    }
    tracing::error!("  ** {diagnostic}");
    ResultStatus::StrongFailure
}

fn save_failure(e: &AdaptError) -> ResultStatus {
    tracing::error!("  ** {e}");
    ResultStatus::StrongFailure
}
