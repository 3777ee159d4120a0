//! Surface mesh and solution data handed between the job stages and the
//! collaborator services.
//!
//! The pipeline only ever inspects point counts, triangle references and the
//! scaling frame; everything else is owned by the codecs and the remesher.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Mesh file format families, detected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeshFormat {
    /// Medit ASCII (`.mesh`).
    Medit,
    /// Medit binary (`.meshb`).
    MeditBinary,
    /// Gmsh ASCII (`.msh`), carries its solution inside the mesh file.
    GmshAscii,
    /// Gmsh binary (`.mshb`).
    GmshBinary,
    VtkVtu,
    VtkVtp,
    VtkPvtu,
    VtkPvtp,
}

impl MeshFormat {
    /// Detect format from file extension, `None` when there is none or it is unknown.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "mesh" => Some(Self::Medit),
            "meshb" => Some(Self::MeditBinary),
            "msh" => Some(Self::GmshAscii),
            "mshb" => Some(Self::GmshBinary),
            "vtu" => Some(Self::VtkVtu),
            "vtp" => Some(Self::VtkVtp),
            "pvtu" => Some(Self::VtkPvtu),
            "pvtp" => Some(Self::VtkPvtp),
            _ => None,
        }
    }

    /// Detect format from `path`, falling back to `fallback` when unresolved.
    pub fn from_path_or<P: AsRef<Path>>(path: P, fallback: MeshFormat) -> Self {
        Self::from_path(path).unwrap_or(fallback)
    }

    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Medit => "mesh",
            Self::MeditBinary => "meshb",
            Self::GmshAscii => "msh",
            Self::GmshBinary => "mshb",
            Self::VtkVtu => "vtu",
            Self::VtkVtp => "vtp",
            Self::VtkPvtu => "pvtu",
            Self::VtkPvtp => "pvtp",
        }
    }

    pub const fn is_gmsh(&self) -> bool {
        matches!(self, Self::GmshAscii | Self::GmshBinary)
    }

    pub const fn is_vtk(&self) -> bool {
        matches!(
            self,
            Self::VtkVtu | Self::VtkVtp | Self::VtkPvtu | Self::VtkPvtp
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub coords: [f64; 3],
    pub reference: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    pub vertices: [usize; 3],
    pub reference: i32,
}

/// Affine frame applied by the scaler: `scaled = (p - origin) / delta`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFrame {
    pub origin: [f64; 3],
    pub delta: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceMesh {
    pub points: Vec<Point>,
    pub triangles: Vec<Triangle>,
    /// Set while the mesh lives in normalized coordinates.
    pub frame: Option<ScaleFrame>,
}

impl SurfaceMesh {
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn is_scaled(&self) -> bool {
        self.frame.is_some()
    }

    /// Distinct triangle references, in ascending order.
    pub fn triangle_refs(&self) -> BTreeSet<i32> {
        self.triangles.iter().map(|t| t.reference).collect()
    }

    /// Undirected edges, each listed once.
    pub fn edges(&self) -> BTreeSet<(usize, usize)> {
        let mut edges = BTreeSet::new();
        for tria in &self.triangles {
            for i in 0..3 {
                let a = tria.vertices[i];
                let b = tria.vertices[(i + 1) % 3];
                edges.insert((a.min(b), a.max(b)));
            }
        }
        edges
    }

    pub fn edge_length(&self, a: usize, b: usize) -> f64 {
        let pa = self.points[a].coords;
        let pb = self.points[b].coords;
        pa.iter()
            .zip(pb.iter())
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f64>()
            .sqrt()
    }
}

/// What a solution field is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldRole {
    /// Isotropic size prescribed at each point.
    Metric,
    /// Signed distance whose zero isoline is discretized.
    LevelSet,
}

/// Scalar field with one value per mesh point.
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionField {
    pub role: FieldRole,
    pub values: Vec<f64>,
}

impl SolutionField {
    pub fn new(role: FieldRole, values: Vec<f64>) -> Self {
        Self { role, values }
    }

    pub fn point_count(&self) -> usize {
        self.values.len()
    }

    pub fn has_data(&self) -> bool {
        !self.values.is_empty()
    }
}

/// Global size bounds for the job.
///
/// `hmin`/`hmax` stay unset until the user gives them or the scaler resolves
/// defaults for them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeBounds {
    pub hmin: Option<f64>,
    pub hmax: Option<f64>,
    pub hausd: f64,
    pub hgrad: f64,
    /// Constant target size, when requested.
    pub hsiz: Option<f64>,
}

impl Default for SizeBounds {
    fn default() -> Self {
        Self {
            hmin: None,
            hmax: None,
            hausd: 0.01,
            hgrad: 1.3,
            hsiz: None,
        }
    }
}

impl SizeBounds {
    /// `(hmin, hmax)` once both are known.
    pub fn resolved(&self) -> Option<(f64, f64)> {
        Some((self.hmin?, self.hmax?))
    }
}
