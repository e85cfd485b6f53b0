use rand::Rng;

use crate::config::{AddModelDirective, Augmentation, PlacedModel, PositionSpec};
use crate::geometry::Vec3;

use super::ground::ground_height;
use super::registry::{AugmentContext, AugmentError, AugmentOutcome, Augmenter};

/// Retry budget per object. A saturated area fails the directive with
/// `PlacementExhausted` instead of spinning forever.
pub const MAX_PLACEMENT_ATTEMPTS: u32 = 1000;

/// Sphere-overlap test against every already accepted placement. Objects
/// are treated as spheres of diameter equal to their scale.
pub fn collides(candidate: &Vec3, scale: f32, placed: &[PlacedModel]) -> bool {
    placed.iter().any(|existing| {
        let center = Vec3::from_array(existing.position());
        candidate.distance_to(&center) < (scale + existing.scale()) / 2.0
    })
}

/// Handler for `add_model` directives: places exactly `count` objects,
/// snapping random candidates to the ground and rejecting overlaps.
pub struct ModelPlacer;

impl Augmenter for ModelPlacer {
    fn generate(
        &self,
        ctx: &mut AugmentContext<'_>,
        directive: &Augmentation,
    ) -> Result<AugmentOutcome, AugmentError> {
        let add = match directive {
            Augmentation::AddModel(add) => add,
            other => {
                return Err(AugmentError::InvalidDirective {
                    reason: format!("model placer cannot handle {} directives", other.kind()),
                })
            }
        };

        let mut placed: Vec<PlacedModel> = Vec::with_capacity(add.count as usize);

        for _ in 0..add.count {
            let position = match &add.position {
                // Explicit positions are caller-trusted: no snapping, no
                // collision check.
                PositionSpec::Fixed(p) => *p,
                PositionSpec::Keyword(_) => find_open_position(ctx, add, &placed)?,
            };

            placed.push(build_placed(add, position));
        }

        Ok(AugmentOutcome::Placed(placed))
    }
}

/// Random search for a collision-free, ground-snapped position. The
/// sampled y only decides the cast direction; the final height is the
/// ground plus half the object's scale.
fn find_open_position(
    ctx: &mut AugmentContext<'_>,
    add: &AddModelDirective,
    placed: &[PlacedModel],
) -> Result<[f32; 3], AugmentError> {
    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let candidate = ctx.bounds.random_point(&mut *ctx.rng);
        let ground = ground_height(ctx.mesh, &candidate);
        let snapped = Vec3::new(candidate.x, ground + add.scale / 2.0, candidate.z);

        if !collides(&snapped, add.scale, placed) {
            return Ok(snapped.to_array());
        }
    }

    Err(AugmentError::PlacementExhausted {
        attempts: MAX_PLACEMENT_ATTEMPTS,
    })
}

fn build_placed(add: &AddModelDirective, position: [f32; 3]) -> PlacedModel {
    match (add.model.as_str(), &add.custom_path) {
        ("custom", Some(path)) => PlacedModel::custom(&add.model, position, add.scale, path.clone()),
        _ => PlacedModel::standard(&add.model, position, add.scale, add.color),
    }
}
