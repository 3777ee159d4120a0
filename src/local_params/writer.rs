use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{EntityType, LocalParameters, side_car_path};
use crate::error::{AdaptError, AdaptResult};
use crate::mesh::{SizeBounds, SurfaceMesh};

/// Write the side-car of `mesh_path` describing every triangle reference of `mesh`.
///
/// Each reference carries its registered local values when there are some,
/// the global bounds otherwise. Returns the path written.
pub fn write_local_params(
    mesh_path: &Path,
    mesh: &SurfaceMesh,
    bounds: &SizeBounds,
    params: &LocalParameters,
) -> AdaptResult<PathBuf> {
    let path = side_car_path(mesh_path);

    let refs = mesh.triangle_refs();
    if refs.is_empty() {
        return Err(AdaptError::NothingToWrite { path });
    }
    let (hmin, hmax) = bounds
        .resolved()
        .ok_or_else(|| AdaptError::write(&path, "global hmin/hmax are not resolved"))?;

    let file = File::create(&path).map_err(|source| AdaptError::CannotOpenOutput {
        path: path.clone(),
        source,
    })?;
    tracing::info!(path = %path.display(), "%% side-car OPENED");

    let mut out = BufWriter::new(file);
    write_records(&mut out, &refs, |reference| {
        match params.get(EntityType::Triangle, reference) {
            Some(p) => (p.hmin, p.hmax, p.hausd),
            None => (hmin, hmax, bounds.hausd),
        }
    })
    .and_then(|()| out.flush())
    .map_err(|e| AdaptError::write(&path, e.to_string()))?;

    tracing::info!(records = refs.len(), "-- WRITING COMPLETED");
    Ok(path)
}

fn write_records(
    out: &mut impl Write,
    refs: &BTreeSet<i32>,
    values: impl Fn(i32) -> (f64, f64, f64),
) -> io::Result<()> {
    writeln!(out, "parameters")?;
    writeln!(out, "{}", refs.len())?;
    for &reference in refs {
        let (hmin, hmax, hausd) = values(reference);
        writeln!(
            out,
            "{reference} {} {hmin:e} {hmax:e} {hausd:e}",
            EntityType::Triangle
        )?;
    }
    Ok(())
}
