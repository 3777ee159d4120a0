//! Per-region size constraints and the `.mmgs` side-car file carrying them.
//!
//! A side-car lives next to the input mesh (`<mesh base name>.mmgs`) or, as a
//! fallback, in the working directory as `DEFAULT.mmgs`:
//!
//! ```text
//! parameters
//! 2
//! 4 triangle 0.1 0.5 0.01
//! 9 triangles 0.05 0.2 0.001
//! ```

mod parser;
mod writer;

pub use parser::read_local_params;
pub use writer::write_local_params;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Extension of the side-car file.
pub const SIDE_CAR_EXTENSION: &str = "mmgs";

/// Side-car looked up in the working directory when the mesh has none.
pub const DEFAULT_SIDE_CAR: &str = "DEFAULT.mmgs";

/// `<mesh path without extension>.mmgs`
pub fn side_car_path(mesh_path: &Path) -> PathBuf {
    mesh_path.with_extension(SIDE_CAR_EXTENSION)
}

/// Mesh entity kinds a local parameter can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Vertex,
    Edge,
    Triangle,
}

impl EntityType {
    /// Case-insensitive keyword lookup, singular or plural.
    pub fn from_keyword(token: &str) -> Option<Self> {
        match token.to_lowercase().as_str() {
            "vertex" | "vertices" => Some(Self::Vertex),
            "edge" | "edges" => Some(Self::Edge),
            "triangle" | "triangles" => Some(Self::Triangle),
            _ => None,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityType::Vertex => write!(f, "Vertex"),
            EntityType::Edge => write!(f, "Edge"),
            EntityType::Triangle => write!(f, "Triangle"),
        }
    }
}

/// Size and geometric tolerance override for one mesh region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalParameter {
    pub entity: EntityType,
    pub reference: i32,
    pub hmin: f64,
    pub hmax: f64,
    pub hausd: f64,
}

/// Why an entry was refused by [`LocalParameters::register`].
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterError {
    UnsupportedEntity(EntityType),
    InvalidSizes(String),
    TooMany { declared: usize },
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterError::UnsupportedEntity(entity) => {
                write!(f, "local parameters on {entity} are not supported")
            }
            RegisterError::InvalidSizes(msg) => write!(f, "{msg}"),
            RegisterError::TooMany { declared } => {
                write!(f, "more entries than the {declared} declared")
            }
        }
    }
}

/// Declared count plus the registered entries, unique per `(entity, reference)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalParameters {
    declared: usize,
    entries: Vec<LocalParameter>,
}

impl LocalParameters {
    /// Empty set announcing `declared` upcoming entries.
    pub fn with_declared(declared: usize) -> Self {
        Self {
            declared,
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LocalParameter] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [LocalParameter] {
        &mut self.entries
    }

    pub fn get(&self, entity: EntityType, reference: i32) -> Option<&LocalParameter> {
        self.entries
            .iter()
            .find(|e| e.entity == entity && e.reference == reference)
    }

    /// Register an entry, replacing the values of an existing one for the same
    /// `(entity, reference)`.
    pub fn register(&mut self, param: LocalParameter) -> Result<(), RegisterError> {
        if param.entity != EntityType::Triangle {
            return Err(RegisterError::UnsupportedEntity(param.entity));
        }
        if !(param.hmin > 0.0 && param.hmax > 0.0 && param.hausd > 0.0) {
            return Err(RegisterError::InvalidSizes(format!(
                "non-positive size for ref {}",
                param.reference
            )));
        }
        if param.hmin > param.hmax {
            return Err(RegisterError::InvalidSizes(format!(
                "hmin {} exceeds hmax {} for ref {}",
                param.hmin, param.hmax, param.reference
            )));
        }

        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|e| e.entity == param.entity && e.reference == param.reference)
        {
            tracing::warn!(
                reference = param.reference,
                "new parameters for an already described reference replace the previous values"
            );
            *existing = param;
            return Ok(());
        }

        if self.entries.len() >= self.declared {
            return Err(RegisterError::TooMany {
                declared: self.declared,
            });
        }
        self.entries.push(param);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri(reference: i32, hmin: f64, hmax: f64, hausd: f64) -> LocalParameter {
        LocalParameter {
            entity: EntityType::Triangle,
            reference,
            hmin,
            hmax,
            hausd,
        }
    }

    #[test]
    fn side_car_path_replaces_extension() {
        assert_eq!(
            side_car_path(Path::new("data/bunny.mesh")),
            PathBuf::from("data/bunny.mmgs")
        );
        assert_eq!(side_car_path(Path::new("bunny")), PathBuf::from("bunny.mmgs"));
    }

    #[test]
    fn entity_keywords() {
        assert_eq!(EntityType::from_keyword("TRIANGLES"), Some(EntityType::Triangle));
        assert_eq!(EntityType::from_keyword("Triangle"), Some(EntityType::Triangle));
        assert_eq!(EntityType::from_keyword("edges"), Some(EntityType::Edge));
        assert_eq!(EntityType::from_keyword("tetra"), None);
    }

    #[test]
    fn register_rejects_non_triangle() {
        let mut params = LocalParameters::with_declared(1);
        let mut p = tri(1, 0.1, 1.0, 0.01);
        p.entity = EntityType::Edge;
        assert_eq!(
            params.register(p),
            Err(RegisterError::UnsupportedEntity(EntityType::Edge))
        );
        assert!(params.is_empty());
    }

    #[test]
    fn register_rejects_bad_sizes() {
        let mut params = LocalParameters::with_declared(2);
        assert!(matches!(
            params.register(tri(1, 0.0, 1.0, 0.01)),
            Err(RegisterError::InvalidSizes(_))
        ));
        assert!(matches!(
            params.register(tri(1, 2.0, 1.0, 0.01)),
            Err(RegisterError::InvalidSizes(_))
        ));
    }

    #[test]
    fn duplicate_reference_replaces_values() {
        let mut params = LocalParameters::with_declared(2);
        params.register(tri(4, 0.1, 1.0, 0.01)).unwrap();
        params.register(tri(4, 0.2, 2.0, 0.02)).unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params.get(EntityType::Triangle, 4).unwrap().hmax, 2.0);
    }

    #[test]
    fn register_beyond_declared_count_fails() {
        let mut params = LocalParameters::with_declared(1);
        params.register(tri(1, 0.1, 1.0, 0.01)).unwrap();
        assert_eq!(
            params.register(tri(2, 0.1, 1.0, 0.01)),
            Err(RegisterError::TooMany { declared: 1 })
        );
    }
}
