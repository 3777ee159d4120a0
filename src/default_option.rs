//! Default-option mode: compute default size bounds without adapting and
//! save them as the side-car file of the input mesh.

use crate::error::AdaptResult;
use crate::local_params::{LocalParameters, write_local_params};
use crate::mesh::{FieldRole, SizeBounds, SolutionField, SurfaceMesh};
use crate::services::{MeshScaler, SizingEngine};
use crate::state_machine::{Job, ResultStatus};
use crate::timer::Timer;

/// Scale, compute sizes, unscale and write the side-car.
///
/// Refuses to run (low failure) when local parameters are already
/// registered. A field whose size does not match the mesh is dropped with a
/// warning. Any failure after scaling unscales first.
pub fn run_default_option<B: MeshScaler + SizingEngine>(
    backend: &B,
    job: &mut Job,
) -> ResultStatus {
    let mut timer = Timer::started();

    if !job.config.local_params.is_empty() {
        tracing::error!(
            "unable to save a local parameter file with the default parameter values \
             because local parameters are provided"
        );
        return ResultStatus::LowFailure;
    }

    let Job {
        config,
        mesh,
        metric,
        level_set,
        ..
    } = job;
    let Some(mesh) = mesh.as_mut() else {
        tracing::error!("no mesh loaded, default parameters cannot be computed");
        return ResultStatus::StrongFailure;
    };

    discard_mismatched(metric, mesh.point_count());
    discard_mismatched(level_set, mesh.point_count());

    tracing::info!("-- DEFAULT PARAMETERS COMPUTATION");

    let mut scaled = Scaled {
        backend,
        mesh: &mut *mesh,
        metric: &mut *metric,
        level_set: &mut *level_set,
        bounds: &mut config.bounds,
        params: &mut config.local_params,
    };
    if let Err(e) = scaled.scale() {
        tracing::error!("{e}");
        return ResultStatus::StrongFailure;
    }

    if config.optim {
        let sizes = backend
            .compute_default_sizing(scaled.mesh, scaled.bounds)
            .and_then(|mut sizes| {
                backend.truncate_sizes(&mut sizes, scaled.bounds)?;
                Ok(sizes)
            });
        match sizes {
            Ok(sizes) => *scaled.metric = Some(sizes),
            Err(e) => {
                tracing::error!("{e}");
                return scaled.unscale_then(ResultStatus::LowFailure);
            }
        }
    }

    if let Some(hsiz) = scaled.bounds.hsiz {
        let sizes = scaled
            .metric
            .get_or_insert_with(|| SolutionField::new(FieldRole::Metric, Vec::new()));
        if let Err(e) = backend.compute_constant_size(scaled.mesh, sizes, scaled.bounds, hsiz) {
            tracing::error!("{e}");
            return scaled.unscale_then(ResultStatus::StrongFailure);
        }
    }

    if let Err(e) = scaled.unscale() {
        tracing::error!("{e}");
        return ResultStatus::StrongFailure;
    }

    config.mark = false;
    if let Err(e) = write_local_params(&config.mesh_in, mesh, &config.bounds, &config.local_params)
    {
        tracing::error!("{e}");
        tracing::error!("unable to save the local parameters file");
        return ResultStatus::LowFailure;
    }

    timer.stop();
    tracing::info!(elapsed = %timer.formatted(), "-- DEFAULT PARAMETERS COMPLETED");
    ResultStatus::Success
}

fn discard_mismatched(field: &mut Option<SolutionField>, np: usize) {
    if field
        .as_ref()
        .is_some_and(|f| f.has_data() && f.point_count() != np)
    {
        tracing::warn!("## WARNING: WRONG SOLUTION NUMBER. IGNORED");
        *field = None;
    }
}

/// Borrowed view of everything moved in and out of normalized coordinates.
struct Scaled<'a, B> {
    backend: &'a B,
    mesh: &'a mut SurfaceMesh,
    metric: &'a mut Option<SolutionField>,
    level_set: &'a mut Option<SolutionField>,
    bounds: &'a mut SizeBounds,
    params: &'a mut LocalParameters,
}

impl<B: MeshScaler> Scaled<'_, B> {
    fn scale(&mut self) -> AdaptResult<()> {
        let mut fields: Vec<&mut SolutionField> =
            self.metric.iter_mut().chain(self.level_set.iter_mut()).collect();
        self.backend
            .scale(self.mesh, &mut fields, self.bounds, self.params)
    }

    fn unscale(&mut self) -> AdaptResult<()> {
        let mut fields: Vec<&mut SolutionField> =
            self.metric.iter_mut().chain(self.level_set.iter_mut()).collect();
        self.backend
            .unscale(self.mesh, &mut fields, self.bounds, self.params)
    }

    /// Unscale before reporting `status`; an unscale failure is always strong.
    fn unscale_then(&mut self, status: ResultStatus) -> ResultStatus {
        match self.unscale() {
            Ok(()) => status,
            Err(e) => {
                tracing::error!("{e}");
                ResultStatus::StrongFailure
            }
        }
    }
}
