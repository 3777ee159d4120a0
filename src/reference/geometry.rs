//! Bounding-box scaling and edge-length based size fields.

use crate::error::{AdaptError, AdaptResult};
use crate::local_params::LocalParameters;
use crate::mesh::{FieldRole, ScaleFrame, SizeBounds, SolutionField, SurfaceMesh};

/// Below this extent the bounding box is considered degenerate.
const EPSD: f64 = 1e-30;

/// Default truncature sizes, in scaled (unit box) coordinates.
pub const DEFAULT_HMIN: f64 = 0.001;
pub const DEFAULT_HMAX: f64 = 2.0;

const MAX_GRADATION_PASSES: usize = 100;

fn bounding_frame(mesh: &SurfaceMesh) -> AdaptResult<ScaleFrame> {
    let first = mesh
        .points
        .first()
        .ok_or_else(|| AdaptError::ScalingFailure("mesh has no points".into()))?;

    let mut lo = first.coords;
    let mut hi = first.coords;
    for p in &mesh.points {
        for i in 0..3 {
            lo[i] = lo[i].min(p.coords[i]);
            hi[i] = hi[i].max(p.coords[i]);
        }
    }

    let delta = (0..3).map(|i| hi[i] - lo[i]).fold(0.0, f64::max);
    if !(delta > EPSD) {
        return Err(AdaptError::ScalingFailure(format!(
            "degenerate bounding box (extent {delta:e})"
        )));
    }
    Ok(ScaleFrame { origin: lo, delta })
}

/// Multiply every length-like quantity by `factor`.
fn rescale_sizes(
    factor: f64,
    fields: &mut [&mut SolutionField],
    bounds: &mut SizeBounds,
    params: &mut LocalParameters,
) {
    for field in fields.iter_mut() {
        if field.role == FieldRole::Metric {
            field.values.iter_mut().for_each(|v| *v *= factor);
        }
    }
    bounds.hmin = bounds.hmin.map(|h| h * factor);
    bounds.hmax = bounds.hmax.map(|h| h * factor);
    bounds.hsiz = bounds.hsiz.map(|h| h * factor);
    bounds.hausd *= factor;
    for p in params.entries_mut() {
        p.hmin *= factor;
        p.hmax *= factor;
        p.hausd *= factor;
    }
}

pub fn scale(
    mesh: &mut SurfaceMesh,
    fields: &mut [&mut SolutionField],
    bounds: &mut SizeBounds,
    params: &mut LocalParameters,
) -> AdaptResult<()> {
    if mesh.is_scaled() {
        return Err(AdaptError::ScalingFailure("mesh is already scaled".into()));
    }
    let frame = bounding_frame(mesh)?;
    let dd = 1.0 / frame.delta;

    for p in &mut mesh.points {
        for i in 0..3 {
            p.coords[i] = dd * (p.coords[i] - frame.origin[i]);
        }
    }
    rescale_sizes(dd, fields, bounds, params);
    complete_bounds(bounds);
    mesh.frame = Some(frame);
    Ok(())
}

/// Fill a missing truncature size from the one that is set, keeping `hmin <= hmax`.
fn complete_bounds(bounds: &mut SizeBounds) {
    match (bounds.hmin, bounds.hmax) {
        (None, None) => {
            bounds.hmin = Some(DEFAULT_HMIN);
            bounds.hmax = Some(DEFAULT_HMAX);
        }
        (Some(hmin), None) => bounds.hmax = Some(DEFAULT_HMAX.max(10.0 * hmin)),
        (None, Some(hmax)) => bounds.hmin = Some(DEFAULT_HMIN.min(0.1 * hmax)),
        (Some(_), Some(_)) => {}
    }
}

pub fn unscale(
    mesh: &mut SurfaceMesh,
    fields: &mut [&mut SolutionField],
    bounds: &mut SizeBounds,
    params: &mut LocalParameters,
) -> AdaptResult<()> {
    let frame = mesh
        .frame
        .take()
        .ok_or_else(|| AdaptError::ScalingFailure("mesh is not scaled".into()))?;

    for p in &mut mesh.points {
        for i in 0..3 {
            p.coords[i] = frame.delta * p.coords[i] + frame.origin[i];
        }
    }
    rescale_sizes(frame.delta, fields, bounds, params);
    Ok(())
}

/// Mean length of the edges incident to each point.
pub fn mean_edge_sizes(mesh: &SurfaceMesh, bounds: &SizeBounds) -> AdaptResult<SolutionField> {
    let edges = mesh.edges();
    if edges.is_empty() {
        return Err(AdaptError::SizingFailure("mesh has no edges".into()));
    }

    let np = mesh.point_count();
    let mut sum = vec![0.0; np];
    let mut count = vec![0u32; np];
    for &(a, b) in &edges {
        let len = mesh.edge_length(a, b);
        sum[a] += len;
        sum[b] += len;
        count[a] += 1;
        count[b] += 1;
    }

    let isolated = bounds.hmax.unwrap_or(DEFAULT_HMAX);
    let values = sum
        .iter()
        .zip(&count)
        .map(|(s, &c)| if c > 0 { s / f64::from(c) } else { isolated })
        .collect();
    Ok(SolutionField::new(FieldRole::Metric, values))
}

pub fn truncate(metric: &mut SolutionField, bounds: &mut SizeBounds) -> AdaptResult<()> {
    let lo = metric.values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = metric.values.iter().copied().fold(0.0, f64::max);
    let hmin = *bounds.hmin.get_or_insert(lo.min(hi));
    let hmax = *bounds.hmax.get_or_insert(hi.max(hmin));

    if !(hmin <= hmax) {
        return Err(AdaptError::SizingFailure(format!(
            "cannot truncate sizes: hmin {hmin} exceeds hmax {hmax}"
        )));
    }
    for v in &mut metric.values {
        *v = v.clamp(hmin, hmax);
    }
    Ok(())
}

pub fn constant_size(
    mesh: &SurfaceMesh,
    metric: &mut SolutionField,
    bounds: &mut SizeBounds,
    hsiz: f64,
) -> AdaptResult<f64> {
    if !(hsiz.is_finite() && hsiz > 0.0) {
        return Err(AdaptError::SizingFailure(format!("invalid constant size {hsiz}")));
    }

    let mut h = hsiz;
    if let Some(hmin) = bounds.hmin.filter(|&hmin| h < hmin) {
        tracing::warn!(hsiz, hmin, "constant size below hmin, hmin is used");
        h = hmin;
    }
    if let Some(hmax) = bounds.hmax.filter(|&hmax| h > hmax) {
        tracing::warn!(hsiz, hmax, "constant size above hmax, hmax is used");
        h = hmax;
    }
    bounds.hmin = Some(bounds.hmin.map_or(h, |hmin| hmin.min(h)));
    bounds.hmax = Some(bounds.hmax.map_or(h, |hmax| hmax.max(h)));

    metric.role = FieldRole::Metric;
    metric.values = vec![h; mesh.point_count()];
    Ok(h)
}

/// Limit size growth along edges to `ln(hgrad)` times the edge length.
///
/// A `hgrad` of 1 or below disables gradation.
pub fn gradate(mesh: &SurfaceMesh, metric: &mut SolutionField, hgrad: f64) {
    if !(hgrad > 1.0) || metric.point_count() != mesh.point_count() {
        return;
    }
    let slope = hgrad.ln();
    let edges = mesh.edges();

    for _ in 0..MAX_GRADATION_PASSES {
        let mut changed = false;
        for &(a, b) in &edges {
            let step = slope * mesh.edge_length(a, b);
            let (ha, hb) = (metric.values[a], metric.values[b]);
            if hb > ha + step {
                metric.values[b] = ha + step;
                changed = true;
            } else if ha > hb + step {
                metric.values[a] = hb + step;
                changed = true;
            }
        }
        if !changed {
            return;
        }
    }
    tracing::debug!("gradation stopped before convergence");
}

/// Restrict sizes around triangles carrying a local parameter.
pub fn apply_local_params(mesh: &SurfaceMesh, metric: &mut SolutionField, params: &LocalParameters) {
    for tria in &mesh.triangles {
        let Some(p) = params
            .entries()
            .iter()
            .find(|p| p.reference == tria.reference)
        else {
            continue;
        };
        for &v in &tria.vertices {
            if let Some(h) = metric.values.get_mut(v) {
                *h = h.clamp(p.hmin, p.hmax);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local_params::{EntityType, LocalParameter};
    use crate::mesh::{Point, Triangle};

    fn strip(scale: f64) -> SurfaceMesh {
        let p = |x: f64, y: f64| Point {
            coords: [10.0 + x * scale, -5.0 + y * scale, 2.0],
            reference: 0,
        };
        SurfaceMesh {
            points: vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)],
            triangles: vec![
                Triangle {
                    vertices: [0, 1, 2],
                    reference: 1,
                },
                Triangle {
                    vertices: [0, 2, 3],
                    reference: 2,
                },
            ],
            frame: None,
        }
    }

    #[test]
    fn scale_then_unscale_restores_everything() {
        let original = strip(4.0);
        let mut mesh = original.clone();
        let mut metric = SolutionField::new(FieldRole::Metric, vec![0.4; 4]);
        let mut bounds = SizeBounds {
            hmin: Some(0.04),
            hausd: 0.4,
            ..SizeBounds::default()
        };
        let mut params = LocalParameters::default();

        scale(&mut mesh, &mut [&mut metric], &mut bounds, &mut params).unwrap();
        assert!(mesh.is_scaled());
        assert!((mesh.points[2].coords[0] - 1.0).abs() < 1e-12);
        assert!((metric.values[0] - 0.1).abs() < 1e-12);
        assert!((bounds.hausd - 0.1).abs() < 1e-12);
        assert_eq!(bounds.hmax, Some(DEFAULT_HMAX));

        unscale(&mut mesh, &mut [&mut metric], &mut bounds, &mut params).unwrap();
        assert!(!mesh.is_scaled());
        for (a, b) in mesh.points.iter().zip(&original.points) {
            for i in 0..3 {
                assert!((a.coords[i] - b.coords[i]).abs() < 1e-12);
            }
        }
        assert!((metric.values[3] - 0.4).abs() < 1e-12);
        assert!((bounds.hmin.unwrap() - 0.04).abs() < 1e-12);
        assert!((bounds.hmax.unwrap() - 8.0).abs() < 1e-12);
    }

    #[test]
    fn small_hmax_alone_derives_a_smaller_hmin() {
        let mut mesh = strip(4.0);
        let mut bounds = SizeBounds {
            hmax: Some(0.001),
            ..SizeBounds::default()
        };
        scale(&mut mesh, &mut [], &mut bounds, &mut LocalParameters::default()).unwrap();

        let (hmin, hmax) = bounds.resolved().unwrap();
        assert!((hmax - 0.00025).abs() < 1e-15);
        assert!((hmin - 0.000025).abs() < 1e-15);

        let mut metric = SolutionField::new(FieldRole::Metric, vec![0.3; 4]);
        truncate(&mut metric, &mut bounds).unwrap();
        assert!(metric.values.iter().all(|&v| (v - hmax).abs() < 1e-15));
    }

    #[test]
    fn large_hmin_alone_derives_a_larger_hmax() {
        let mut mesh = strip(1.0);
        let mut bounds = SizeBounds {
            hmin: Some(0.5),
            ..SizeBounds::default()
        };
        scale(&mut mesh, &mut [], &mut bounds, &mut LocalParameters::default()).unwrap();
        assert_eq!(bounds.resolved(), Some((0.5, 5.0)));
    }

    #[test]
    fn level_set_values_are_not_rescaled() {
        let mut mesh = strip(4.0);
        let mut ls = SolutionField::new(FieldRole::LevelSet, vec![-1.0, 1.0, 1.0, -1.0]);
        scale(
            &mut mesh,
            &mut [&mut ls],
            &mut SizeBounds::default(),
            &mut LocalParameters::default(),
        )
        .unwrap();
        assert_eq!(ls.values, vec![-1.0, 1.0, 1.0, -1.0]);
    }

    #[test]
    fn degenerate_mesh_cannot_be_scaled() {
        let mut mesh = strip(0.0);
        let err = scale(
            &mut mesh,
            &mut [],
            &mut SizeBounds::default(),
            &mut LocalParameters::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AdaptError::ScalingFailure(_)));
        assert!(!mesh.is_scaled());
    }

    #[test]
    fn unscale_requires_a_scaled_mesh() {
        let err = unscale(
            &mut strip(1.0),
            &mut [],
            &mut SizeBounds::default(),
            &mut LocalParameters::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AdaptError::ScalingFailure(_)));
    }

    #[test]
    fn mean_edge_sizes_average_incident_edges() {
        let mesh = strip(1.0);
        let metric = mean_edge_sizes(&mesh, &SizeBounds::default()).unwrap();
        // point 1 touches two unit edges and the diagonal is not incident
        assert!((metric.values[1] - 1.0).abs() < 1e-12);
        let expected0 = (1.0 + 1.0 + 2f64.sqrt()) / 3.0;
        assert!((metric.values[0] - expected0).abs() < 1e-12);
    }

    #[test]
    fn sizing_needs_edges() {
        let err = mean_edge_sizes(&SurfaceMesh::default(), &SizeBounds::default()).unwrap_err();
        assert!(matches!(err, AdaptError::SizingFailure(_)));
    }

    #[test]
    fn truncate_clamps_into_bounds() {
        let mut metric = SolutionField::new(FieldRole::Metric, vec![0.01, 0.5, 9.0]);
        let mut bounds = SizeBounds {
            hmin: Some(0.1),
            hmax: Some(2.0),
            ..SizeBounds::default()
        };
        truncate(&mut metric, &mut bounds).unwrap();
        assert_eq!(metric.values, vec![0.1, 0.5, 2.0]);
    }

    #[test]
    fn truncate_rejects_inverted_bounds() {
        let mut metric = SolutionField::new(FieldRole::Metric, vec![0.5; 3]);
        let mut bounds = SizeBounds {
            hmin: Some(0.3),
            hmax: Some(0.1),
            ..SizeBounds::default()
        };
        let err = truncate(&mut metric, &mut bounds).unwrap_err();
        assert!(matches!(err, AdaptError::SizingFailure(_)));
        assert_eq!(metric.values, vec![0.5; 3]);
    }

    #[test]
    fn truncate_resolves_missing_bounds_from_the_field() {
        let mut metric = SolutionField::new(FieldRole::Metric, vec![0.3, 0.5, 0.9]);
        let mut bounds = SizeBounds::default();
        truncate(&mut metric, &mut bounds).unwrap();
        assert_eq!(bounds.resolved(), Some((0.3, 0.9)));
    }

    #[test]
    fn constant_size_is_clamped() {
        let mesh = strip(1.0);
        let mut metric = SolutionField::new(FieldRole::Metric, Vec::new());
        let mut bounds = SizeBounds {
            hmin: Some(0.2),
            hmax: Some(0.6),
            ..SizeBounds::default()
        };
        let h = constant_size(&mesh, &mut metric, &mut bounds, 0.9).unwrap();
        assert_eq!(h, 0.6);
        assert_eq!(metric.values, vec![0.6; 4]);
        assert_eq!(bounds.resolved(), Some((0.2, 0.6)));
    }

    #[test]
    fn gradation_limits_size_jumps() {
        let mesh = strip(1.0);
        let mut metric = SolutionField::new(FieldRole::Metric, vec![0.1, 5.0, 5.0, 5.0]);
        gradate(&mesh, &mut metric, 2.0);

        let slope = 2f64.ln();
        // unit edges from point 0, the diagonal to point 2
        assert!((metric.values[1] - (0.1 + slope)).abs() < 1e-12);
        assert!((metric.values[3] - (0.1 + slope)).abs() < 1e-12);
        assert!(metric.values[2] <= 0.1 + slope * 2f64.sqrt() + 1e-12);
        assert_eq!(metric.values[0], 0.1);
    }

    #[test]
    fn gradation_disabled_below_one() {
        let mesh = strip(1.0);
        let mut metric = SolutionField::new(FieldRole::Metric, vec![0.1, 5.0, 5.0, 5.0]);
        gradate(&mesh, &mut metric, 1.0);
        assert_eq!(metric.values, vec![0.1, 5.0, 5.0, 5.0]);
    }

    #[test]
    fn local_params_restrict_region_sizes() {
        let mesh = strip(1.0);
        let mut metric = SolutionField::new(FieldRole::Metric, vec![1.0; 4]);
        let mut params = LocalParameters::with_declared(1);
        params
            .register(LocalParameter {
                entity: EntityType::Triangle,
                reference: 2,
                hmin: 0.1,
                hmax: 0.25,
                hausd: 0.01,
            })
            .unwrap();

        apply_local_params(&mesh, &mut metric, &params);
        assert_eq!(metric.values, vec![0.25, 1.0, 0.25, 0.25]);
    }
}
