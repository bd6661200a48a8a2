//! Organic polygon generation: noise-deformed closed contours that render
//! as ragged, ink-bleed silhouettes instead of smooth geometric shapes.
//!
//! The generator starts from a regular polygon (optionally squashed
//! vertically to break circular symmetry) and applies iterative midpoint
//! subdivision: each edge gains a midpoint displaced along the edge normal
//! by smooth noise plus a small Gaussian jitter, with the displacement
//! scale decaying geometrically each iteration. Displacement is clamped to
//! a fraction of the local edge length, which keeps high-displacement
//! configurations ragged without folding edges over each other.

use crate::error::EngineError;
use crate::noise_field::NoiseField;
use crate::prng::Xorshift64;
use glam::DVec2;

/// Geometric decay of the displacement scale per subdivision iteration.
const DISPLACEMENT_DECAY: f64 = 0.55;
/// Gaussian jitter added on top of the noise displacement, as a fraction
/// of the current displacement scale.
const JITTER_FRACTION: f64 = 0.08;
/// Upper bound on |displacement| relative to the local edge length.
const MAX_EDGE_DISPLACEMENT: f64 = 0.45;
/// Decorrelation step between subdivision iterations in the noise z axis.
const ITERATION_Z_STEP: f64 = 0.12;

/// An ordered, implicitly closed sequence of vertices (last connects back
/// to first). Produced fresh per render call and not retained.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    verts: Vec<DVec2>,
}

impl Polygon {
    /// Wraps a vertex list. Callers guarantee at least 3 vertices.
    pub fn new(verts: Vec<DVec2>) -> Self {
        Self { verts }
    }

    /// The vertices, in order.
    pub fn verts(&self) -> &[DVec2] {
        &self.verts
    }

    pub fn vertex_count(&self) -> usize {
        self.verts.len()
    }

    /// Axis-aligned bounding box as `(min, max)`.
    ///
    /// Returns `None` for an empty polygon (which the generator never
    /// produces).
    pub fn bounds(&self) -> Option<(DVec2, DVec2)> {
        let first = *self.verts.first()?;
        let mut min = first;
        let mut max = first;
        for v in &self.verts[1..] {
            min = min.min(*v);
            max = max.max(*v);
        }
        Some((min, max))
    }
}

/// Parameters for [`organic_polygon`].
#[derive(Debug, Clone, Copy)]
pub struct ShapeSpec {
    /// Vertices of the initial regular polygon (before subdivision).
    pub vertex_count: usize,
    /// Midpoint subdivision iterations; the final polygon has
    /// `vertex_count * 2^iterations` vertices.
    pub iterations: usize,
    /// Initial displacement scale as a fraction of the base radius.
    pub displacement_factor: f64,
    /// Vertical squash: y radius = x radius * squash.
    pub squash: f64,
}

impl Default for ShapeSpec {
    fn default() -> Self {
        Self {
            vertex_count: 18,
            iterations: 3,
            displacement_factor: 0.28,
            squash: 0.75,
        }
    }
}

/// Builds a noise-deformed closed polygon around `center`.
///
/// `layer_index` offsets the noise z axis so stacked shapes at the same
/// center do not share identical silhouettes.
///
/// Returns `EngineError::InvalidGeometry` for non-positive or non-finite
/// `base_radius` and for fewer than 3 vertices; the caller must skip the
/// render pass rather than substitute a fallback shape.
pub fn organic_polygon(
    center: DVec2,
    base_radius: f64,
    spec: &ShapeSpec,
    layer_index: usize,
    noise: &NoiseField,
    rng: &mut Xorshift64,
) -> Result<Polygon, EngineError> {
    if !base_radius.is_finite() || base_radius <= 0.0 {
        return Err(EngineError::InvalidGeometry(format!(
            "radius {base_radius} is not positive"
        )));
    }
    if spec.vertex_count < 3 {
        return Err(EngineError::InvalidGeometry(format!(
            "{} vertices cannot form a closed contour",
            spec.vertex_count
        )));
    }

    let mut verts = Vec::with_capacity(spec.vertex_count << spec.iterations);
    for i in 0..spec.vertex_count {
        let ang = std::f64::consts::TAU * i as f64 / spec.vertex_count as f64;
        verts.push(DVec2::new(
            center.x + ang.cos() * base_radius,
            center.y + ang.sin() * base_radius * spec.squash,
        ));
    }

    let mut disp_scale = base_radius * spec.displacement_factor;
    for it in 0..spec.iterations {
        let z = layer_index as f64 * 10.0 + it as f64 * ITERATION_Z_STEP;
        verts = subdivide_once(&verts, disp_scale, z, noise, rng);
        disp_scale *= DISPLACEMENT_DECAY;
    }

    Ok(Polygon::new(verts))
}

/// One round of midpoint subdivision with normal displacement.
///
/// Every edge `(a, b)` is replaced by `a`, then a midpoint pushed along the
/// edge normal by `noise in [-scale, scale]` plus Gaussian jitter, with the
/// total clamped to [`MAX_EDGE_DISPLACEMENT`] of the edge length.
fn subdivide_once(
    verts: &[DVec2],
    disp_scale: f64,
    z: f64,
    noise: &NoiseField,
    rng: &mut Xorshift64,
) -> Vec<DVec2> {
    let mut out = Vec::with_capacity(verts.len() * 2);
    for (i, &a) in verts.iter().enumerate() {
        let b = verts[(i + 1) % verts.len()];
        out.push(a);

        let mid = (a + b) * 0.5;
        let edge = b - a;
        let len = edge.length().max(1e-9);
        let normal = DVec2::new(-edge.y, edge.x) / len;

        let n = noise.sample(mid.x, mid.y, z);
        let mut disp = (n * 2.0 - 1.0) * disp_scale;
        disp += rng.next_gaussian() * disp_scale * JITTER_FRACTION;
        let cap = len * MAX_EDGE_DISPLACEMENT;
        disp = disp.clamp(-cap, cap);

        out.push(mid + normal * disp);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> NoiseField {
        NoiseField::new(7, 0.02)
    }

    #[test]
    fn vertex_count_is_initial_times_two_to_the_iterations() {
        let mut rng = Xorshift64::new(42);
        for iterations in 0..5 {
            let spec = ShapeSpec {
                vertex_count: 12,
                iterations,
                ..ShapeSpec::default()
            };
            let poly = organic_polygon(
                DVec2::new(100.0, 100.0),
                30.0,
                &spec,
                0,
                &field(),
                &mut rng,
            )
            .unwrap();
            assert_eq!(
                poly.vertex_count(),
                12 << iterations,
                "iterations={iterations}"
            );
        }
    }

    #[test]
    fn zero_radius_is_invalid_geometry() {
        let mut rng = Xorshift64::new(1);
        let result = organic_polygon(
            DVec2::ZERO,
            0.0,
            &ShapeSpec::default(),
            0,
            &field(),
            &mut rng,
        );
        assert!(matches!(result, Err(EngineError::InvalidGeometry(_))));
    }

    #[test]
    fn negative_radius_is_invalid_geometry() {
        let mut rng = Xorshift64::new(1);
        let result = organic_polygon(
            DVec2::ZERO,
            -5.0,
            &ShapeSpec::default(),
            0,
            &field(),
            &mut rng,
        );
        assert!(matches!(result, Err(EngineError::InvalidGeometry(_))));
    }

    #[test]
    fn nan_radius_is_invalid_geometry() {
        let mut rng = Xorshift64::new(1);
        let result = organic_polygon(
            DVec2::ZERO,
            f64::NAN,
            &ShapeSpec::default(),
            0,
            &field(),
            &mut rng,
        );
        assert!(matches!(result, Err(EngineError::InvalidGeometry(_))));
    }

    #[test]
    fn two_vertices_are_invalid_geometry() {
        let mut rng = Xorshift64::new(1);
        let spec = ShapeSpec {
            vertex_count: 2,
            ..ShapeSpec::default()
        };
        let result = organic_polygon(DVec2::ZERO, 10.0, &spec, 0, &field(), &mut rng);
        assert!(matches!(result, Err(EngineError::InvalidGeometry(_))));
    }

    #[test]
    fn vertices_stay_within_inflated_radius() {
        // Displacement is bounded, so no vertex can escape far beyond the
        // base radius even after several iterations.
        let mut rng = Xorshift64::new(9);
        let center = DVec2::new(200.0, 200.0);
        let radius = 50.0;
        let poly = organic_polygon(center, radius, &ShapeSpec::default(), 0, &field(), &mut rng)
            .unwrap();
        for v in poly.verts() {
            let d = v.distance(center);
            assert!(
                d < radius * 2.0,
                "vertex at distance {d} escaped radius {radius}"
            );
        }
    }

    #[test]
    fn squash_compresses_vertical_extent() {
        let mut rng = Xorshift64::new(4);
        let spec = ShapeSpec {
            displacement_factor: 0.0,
            squash: 0.5,
            ..ShapeSpec::default()
        };
        let poly =
            organic_polygon(DVec2::ZERO, 100.0, &spec, 0, &field(), &mut rng).unwrap();
        let (min, max) = poly.bounds().unwrap();
        let width = max.x - min.x;
        let height = max.y - min.y;
        assert!(
            height < width * 0.7,
            "squash 0.5 produced width {width} height {height}"
        );
    }

    #[test]
    fn layer_index_changes_the_silhouette() {
        let mut rng_a = Xorshift64::new(11);
        let mut rng_b = Xorshift64::new(11);
        let center = DVec2::new(50.0, 50.0);
        let spec = ShapeSpec::default();
        let a = organic_polygon(center, 20.0, &spec, 0, &field(), &mut rng_a).unwrap();
        let b = organic_polygon(center, 20.0, &spec, 1, &field(), &mut rng_b).unwrap();
        assert_ne!(a, b, "layer index had no effect on deformation");
    }

    #[test]
    fn bounds_of_empty_polygon_is_none() {
        assert!(Polygon::new(Vec::new()).bounds().is_none());
    }

    // -- Property-based tests --

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn generated_polygons_always_close(
                seed: u64,
                radius in 0.5_f64..200.0,
                vertex_count in 3_usize..24,
                iterations in 0_usize..4,
            ) {
                let mut rng = Xorshift64::new(seed);
                let spec = ShapeSpec {
                    vertex_count,
                    iterations,
                    ..ShapeSpec::default()
                };
                let poly = organic_polygon(
                    DVec2::new(0.0, 0.0),
                    radius,
                    &spec,
                    0,
                    &field(),
                    &mut rng,
                ).unwrap();
                prop_assert_eq!(poly.vertex_count(), vertex_count << iterations);
                for v in poly.verts() {
                    prop_assert!(v.x.is_finite() && v.y.is_finite());
                }
            }

            #[test]
            fn non_positive_radius_always_rejected(
                seed: u64,
                radius in -100.0_f64..=0.0,
            ) {
                let mut rng = Xorshift64::new(seed);
                let result = organic_polygon(
                    DVec2::ZERO,
                    radius,
                    &ShapeSpec::default(),
                    0,
                    &field(),
                    &mut rng,
                );
                prop_assert!(result.is_err());
            }
        }
    }
}
