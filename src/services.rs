//! Contracts of the services the job pipeline drives but does not implement:
//! mesh codecs, coordinate scaling, size-field computation and remeshing.

use std::path::Path;

use crate::error::AdaptResult;
use crate::local_params::LocalParameters;
use crate::mesh::{FieldRole, MeshFormat, SizeBounds, SolutionField, SurfaceMesh};
use crate::state_machine::ResultStatus;

/// Reads and writes meshes and solution fields.
///
/// Loaders report a missing file as `AdaptError::FileNotFound` and any other
/// problem as `AdaptError::ReadError`.
pub trait MeshCodec {
    /// Load a mesh. Formats that embed a solution (Gmsh) return it alongside.
    fn load_mesh(
        &self,
        path: &Path,
        format: MeshFormat,
        role: FieldRole,
    ) -> AdaptResult<(SurfaceMesh, Option<SolutionField>)>;

    fn load_solution(&self, path: &Path, role: FieldRole) -> AdaptResult<SolutionField>;

    /// Save a mesh; Gmsh formats also store `field` in the same file.
    fn save_mesh(
        &self,
        path: &Path,
        format: MeshFormat,
        mesh: &SurfaceMesh,
        field: Option<&SolutionField>,
    ) -> AdaptResult<()>;

    fn save_solution(&self, path: &Path, field: &SolutionField) -> AdaptResult<()>;
}

/// Moves a mesh, its fields and every size quantity into normalized
/// coordinates and back. Calls must be paired; a scaled mesh is never saved.
pub trait MeshScaler {
    fn scale(
        &self,
        mesh: &mut SurfaceMesh,
        fields: &mut [&mut SolutionField],
        bounds: &mut SizeBounds,
        params: &mut LocalParameters,
    ) -> AdaptResult<()>;

    fn unscale(
        &self,
        mesh: &mut SurfaceMesh,
        fields: &mut [&mut SolutionField],
        bounds: &mut SizeBounds,
        params: &mut LocalParameters,
    ) -> AdaptResult<()>;
}

/// Size-field computations on a scaled mesh.
pub trait SizingEngine {
    /// Derive an isotropic metric from the mesh itself.
    fn compute_default_sizing(
        &self,
        mesh: &SurfaceMesh,
        bounds: &SizeBounds,
    ) -> AdaptResult<SolutionField>;

    /// Clamp `metric` into representable bounds, resolving unset `hmin`/`hmax` from it.
    /// Fails when the resolved bounds are inverted.
    fn truncate_sizes(&self, metric: &mut SolutionField, bounds: &mut SizeBounds)
    -> AdaptResult<()>;

    /// Fill `metric` with the constant size `hsiz`, returning the size actually used.
    fn compute_constant_size(
        &self,
        mesh: &SurfaceMesh,
        metric: &mut SolutionField,
        bounds: &mut SizeBounds,
        hsiz: f64,
    ) -> AdaptResult<f64>;
}

/// Everything an adaptation engine gets to see.
pub struct AdaptInput<'a> {
    pub mesh: &'a mut SurfaceMesh,
    pub metric: &'a mut Option<SolutionField>,
    pub bounds: &'a mut SizeBounds,
    pub params: &'a mut LocalParameters,
    pub optim: bool,
}

/// Adaptation engines. Both return a tiered status: `LowFailure` still leaves
/// a conform mesh behind that may be saved.
pub trait Remesher {
    fn adapt_by_level_set(&self, input: AdaptInput<'_>, level_set: &SolutionField) -> ResultStatus;

    fn adapt_by_metric(&self, input: AdaptInput<'_>) -> ResultStatus;
}

/// The full set of collaborators a job needs.
pub trait Backend: MeshCodec + MeshScaler + SizingEngine + Remesher {}

impl<T: MeshCodec + MeshScaler + SizingEngine + Remesher> Backend for T {}
