//! Reference implementation of the collaborator services.
//!
//! Handles Medit ASCII files, scales meshes into the unit box and derives
//! isotropic size fields from edge lengths. Its remesher runs the full
//! scale/size/unscale protocol but leaves connectivity unchanged, which makes
//! it suitable for preparing metrics and exercising the job pipeline.

mod geometry;
mod medit;

use std::path::Path;

use crate::error::{AdaptError, AdaptResult};
use crate::local_params::LocalParameters;
use crate::mesh::{FieldRole, MeshFormat, SizeBounds, SolutionField, SurfaceMesh};
use crate::services::{AdaptInput, MeshCodec, MeshScaler, Remesher, SizingEngine};
use crate::state_machine::ResultStatus;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceBackend;

impl MeshCodec for ReferenceBackend {
    fn load_mesh(
        &self,
        path: &Path,
        format: MeshFormat,
        _role: FieldRole,
    ) -> AdaptResult<(SurfaceMesh, Option<SolutionField>)> {
        match format {
            MeshFormat::Medit => Ok((medit::load_mesh(path)?, None)),
            other => {
                if !path.exists() {
                    return Err(AdaptError::FileNotFound {
                        path: path.to_path_buf(),
                    });
                }
                Err(AdaptError::read(
                    path,
                    format!(".{} input is not supported by the reference codec", other.extension()),
                ))
            }
        }
    }

    fn load_solution(&self, path: &Path, role: FieldRole) -> AdaptResult<SolutionField> {
        medit::load_solution(path, role)
    }

    fn save_mesh(
        &self,
        path: &Path,
        format: MeshFormat,
        mesh: &SurfaceMesh,
        _field: Option<&SolutionField>,
    ) -> AdaptResult<()> {
        match format {
            MeshFormat::Medit => medit::save_mesh(path, mesh),
            other => Err(AdaptError::write(
                path,
                format!(".{} output is not supported by the reference codec", other.extension()),
            )),
        }
    }

    fn save_solution(&self, path: &Path, field: &SolutionField) -> AdaptResult<()> {
        medit::save_solution(path, field)
    }
}

impl MeshScaler for ReferenceBackend {
    fn scale(
        &self,
        mesh: &mut SurfaceMesh,
        fields: &mut [&mut SolutionField],
        bounds: &mut SizeBounds,
        params: &mut LocalParameters,
    ) -> AdaptResult<()> {
        geometry::scale(mesh, fields, bounds, params)
    }

    fn unscale(
        &self,
        mesh: &mut SurfaceMesh,
        fields: &mut [&mut SolutionField],
        bounds: &mut SizeBounds,
        params: &mut LocalParameters,
    ) -> AdaptResult<()> {
        geometry::unscale(mesh, fields, bounds, params)
    }
}

impl SizingEngine for ReferenceBackend {
    fn compute_default_sizing(
        &self,
        mesh: &SurfaceMesh,
        bounds: &SizeBounds,
    ) -> AdaptResult<SolutionField> {
        geometry::mean_edge_sizes(mesh, bounds)
    }

    fn truncate_sizes(
        &self,
        metric: &mut SolutionField,
        bounds: &mut SizeBounds,
    ) -> AdaptResult<()> {
        geometry::truncate(metric, bounds)
    }

    fn compute_constant_size(
        &self,
        mesh: &SurfaceMesh,
        metric: &mut SolutionField,
        bounds: &mut SizeBounds,
        hsiz: f64,
    ) -> AdaptResult<f64> {
        geometry::constant_size(mesh, metric, bounds, hsiz)
    }
}

impl ReferenceBackend {
    /// Build or clamp the metric while the mesh is scaled.
    fn prepare_metric(&self, input: &mut AdaptInput<'_>) -> AdaptResult<()> {
        let mut metric = match input.metric.take() {
            Some(mut metric) if metric.has_data() => {
                self.truncate_sizes(&mut metric, input.bounds)?;
                metric
            }
            _ => match input.bounds.hsiz {
                Some(hsiz) => {
                    let mut metric = SolutionField::new(FieldRole::Metric, Vec::new());
                    self.compute_constant_size(input.mesh, &mut metric, input.bounds, hsiz)?;
                    metric
                }
                None => {
                    let mut metric = self.compute_default_sizing(input.mesh, input.bounds)?;
                    self.truncate_sizes(&mut metric, input.bounds)?;
                    metric
                }
            },
        };
        geometry::gradate(input.mesh, &mut metric, input.bounds.hgrad);
        geometry::apply_local_params(input.mesh, &mut metric, input.params);
        *input.metric = Some(metric);
        Ok(())
    }

    fn scaled_pass(&self, mut input: AdaptInput<'_>) -> ResultStatus {
        {
            let mut fields: Vec<&mut SolutionField> = input.metric.iter_mut().collect();
            if let Err(e) = self.scale(input.mesh, &mut fields, input.bounds, input.params) {
                tracing::error!("{e}");
                return ResultStatus::StrongFailure;
            }
        }

        let mut status = ResultStatus::Success;
        if let Err(e) = self.prepare_metric(&mut input) {
            tracing::error!("{e}");
            status = ResultStatus::LowFailure;
        }

        let mut fields: Vec<&mut SolutionField> = input.metric.iter_mut().collect();
        if let Err(e) = self.unscale(input.mesh, &mut fields, input.bounds, input.params) {
            tracing::error!("{e}");
            return ResultStatus::StrongFailure;
        }

        tracing::info!(
            points = input.mesh.point_count(),
            triangles = input.mesh.triangles.len(),
            optim = input.optim,
            "reference remesher: size field prepared, connectivity unchanged"
        );
        status
    }
}

impl Remesher for ReferenceBackend {
    fn adapt_by_level_set(&self, input: AdaptInput<'_>, level_set: &SolutionField) -> ResultStatus {
        if level_set.point_count() != input.mesh.point_count() {
            tracing::error!("level-set size does not match the mesh");
            return ResultStatus::StrongFailure;
        }
        let crosses = level_set.values.iter().any(|&v| v < 0.0)
            && level_set.values.iter().any(|&v| v > 0.0);
        if !crosses {
            tracing::warn!("level-set has no zero crossing, nothing to discretize");
            return ResultStatus::LowFailure;
        }

        if input.metric.as_ref().is_some_and(SolutionField::has_data) {
            return self.scaled_pass(input);
        }
        ResultStatus::Success
    }

    fn adapt_by_metric(&self, input: AdaptInput<'_>) -> ResultStatus {
        self.scaled_pass(input)
    }
}
