use std::f32::consts::PI;

use rand::RngCore;

use crate::config::{Augmentation, LandscapeRecord, PositionSpec};
use crate::geometry::{Aabb, Vec3};
use crate::mesh::TriMesh;

use super::ground::ground_height;
use super::registry::{AugmentContext, AugmentError, AugmentOutcome, Augmenter};

/// Falloff weight at normalized distance `t` from the peak.
///
/// Smoothness 0 is a sharp linear cone, smoothness 1 a cosine bell, and
/// values between blend the two. Weight 1 at the peak, 0 at the rim.
pub fn falloff_weight(t: f32, smoothness: f32) -> f32 {
    let linear = (1.0 - t).max(0.0);
    let smooth = if t <= 1.0 {
        0.5 * (1.0 + (PI * t).cos())
    } else {
        0.0
    };

    linear * (1.0 - smoothness) + smooth * smoothness
}

/// One sculpt application: displace vertices around the peak, then drop
/// any faces the displacement degenerated.
///
/// The affected footprint is a disc of radius |peak.y| * radius around
/// the peak in the horizontal plane. A positive peak height pulls
/// vertices up toward it, a negative one pushes them down below the
/// local ground; either way a vertex never crosses its ground level in
/// the opposite direction, and ground heights are read from the mesh as
/// it was before this application.
pub fn sculpt(mesh: &TriMesh, peak: &Vec3, radius: f32, smoothness: f32) -> TriMesh {
    let max_radius = peak.y.abs() * radius;
    let mut result = mesh.clone();

    if max_radius > 0.0 {
        for i in 0..result.vertices.len() {
            let vertex = mesh.vertices[i];
            let distance = vertex.planar_distance_to(peak);
            if distance > max_radius {
                continue;
            }

            let weight = falloff_weight(distance / max_radius, smoothness);
            let ground = ground_height(mesh, &vertex);

            if peak.y >= 0.0 {
                let target = ground + (peak.y - ground) * weight;
                if target > ground && target > result.vertices[i].y {
                    result.vertices[i].y = target;
                }
            } else {
                let target = ground - peak.y.abs() * weight;
                if target < ground && target < result.vertices[i].y {
                    result.vertices[i].y = target;
                }
            }
        }
    }

    result.cleaned()
}

/// Handler for `landscape` directives. `count` applications run in
/// sequence, each sculpting the previous application's output, and each
/// resolved peak is recorded for deterministic replay.
pub struct LandscapeSculptor;

impl Augmenter for LandscapeSculptor {
    fn generate(
        &self,
        ctx: &mut AugmentContext<'_>,
        directive: &Augmentation,
    ) -> Result<AugmentOutcome, AugmentError> {
        let land = match directive {
            Augmentation::Landscape(land) => land,
            other => {
                return Err(AugmentError::InvalidDirective {
                    reason: format!("landscape sculptor cannot handle {} directives", other.kind()),
                })
            }
        };

        let mut working = ctx.mesh.clone();
        let mut records = Vec::with_capacity(land.count as usize);

        for _ in 0..land.count {
            let peak = resolve_peak(&land.position, ctx.bounds, &mut *ctx.rng);
            working = sculpt(&working, &peak, land.radius, land.smoothness);
            records.push(LandscapeRecord {
                position: peak.to_array(),
                radius: land.radius,
                smoothness: land.smoothness,
            });
        }

        Ok(AugmentOutcome::Sculpted {
            mesh: working,
            records,
        })
    }
}

fn resolve_peak(position: &PositionSpec, bounds: &Aabb, rng: &mut dyn RngCore) -> Vec3 {
    match position {
        PositionSpec::Fixed(p) => Vec3::from_array(*p),
        // Validation only lets the `random` keyword through. The sampled
        // y is the peak height, so hills and hollows vary with it.
        PositionSpec::Keyword(_) => bounds.random_point(&mut *rng),
    }
}
