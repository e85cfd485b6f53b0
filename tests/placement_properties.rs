//! Property tests for the placement and sculpting invariants.

use mapforge::augment::{
    collides, falloff_weight, sculpt, AugmentContext, AugmentOutcome, Augmenter, ModelPlacer,
};
use mapforge::config::{AddModelDirective, Augmentation, PlacedModel, PositionSpec};
use mapforge::geometry::{Aabb, Vec3};
use mapforge::mesh::TriMesh;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn flat_ground(half_extent: f32) -> TriMesh {
    let h = half_extent;
    TriMesh::new(
        vec![
            Vec3::new(-h, 0.0, -h),
            Vec3::new(h, 0.0, -h),
            Vec3::new(h, 0.0, h),
            Vec3::new(-h, 0.0, h),
        ],
        vec![[0, 2, 1], [0, 3, 2]],
    )
}

fn grid_plane(half_extent: f32, cells: u32) -> TriMesh {
    let mut vertices = Vec::new();
    let mut faces = Vec::new();
    let step = 2.0 * half_extent / cells as f32;

    for row in 0..=cells {
        for col in 0..=cells {
            vertices.push(Vec3::new(
                -half_extent + col as f32 * step,
                0.0,
                -half_extent + row as f32 * step,
            ));
        }
    }

    let stride = cells + 1;
    for row in 0..cells {
        for col in 0..cells {
            let v0 = row * stride + col;
            faces.push([v0, v0 + stride + 1, v0 + 1]);
            faces.push([v0, v0 + stride, v0 + stride + 1]);
        }
    }

    TriMesh::new(vertices, faces)
}

fn place_random(count: u32, scale: f32, seed: u64) -> Vec<PlacedModel> {
    let bounds = Aabb::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 10.0, 10.0));
    let ground = flat_ground(20.0);
    let directive = Augmentation::AddModel(AddModelDirective {
        model: "cube".to_string(),
        custom_path: None,
        scale,
        count,
        position: PositionSpec::Keyword("random".to_string()),
        color: [0, 0, 255],
    });

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut ctx = AugmentContext {
        bounds: &bounds,
        mesh: &ground,
        rng: &mut rng,
    };

    match ModelPlacer.generate(&mut ctx, &directive).unwrap() {
        AugmentOutcome::Placed(placed) => placed,
        other => panic!("expected placement outcome, got {:?}", other),
    }
}

proptest! {
    #[test]
    fn placement_yields_exact_count_with_separation(
        count in 1u32..6,
        scale in 0.3f32..1.5,
        seed in 0u64..500,
    ) {
        let placed = place_random(count, scale, seed);
        prop_assert_eq!(placed.len(), count as usize);

        for i in 0..placed.len() {
            for j in (i + 1)..placed.len() {
                let a = Vec3::from_array(placed[i].position());
                let b = Vec3::from_array(placed[j].position());
                prop_assert!(a.distance_to(&b) >= scale - 1e-4);
            }
        }
    }

    #[test]
    fn placement_snaps_to_half_scale_above_flat_ground(
        scale in 0.3f32..1.5,
        seed in 0u64..500,
    ) {
        let placed = place_random(3, scale, seed);
        for object in &placed {
            let [_, y, _] = object.position();
            prop_assert!((y - scale / 2.0).abs() < 1e-3);
        }
    }

    #[test]
    fn same_seed_reproduces_placements(count in 1u32..6, seed in 0u64..500) {
        let first: Vec<[f32; 3]> = place_random(count, 0.5, seed)
            .iter()
            .map(|p| p.position())
            .collect();
        let second: Vec<[f32; 3]> = place_random(count, 0.5, seed)
            .iter()
            .map(|p| p.position())
            .collect();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn collision_test_is_symmetric(
        ax in -10.0f32..10.0, ay in -10.0f32..10.0, az in -10.0f32..10.0,
        bx in -10.0f32..10.0, by in -10.0f32..10.0, bz in -10.0f32..10.0,
        sa in 0.1f32..5.0, sb in 0.1f32..5.0,
    ) {
        let a = PlacedModel::standard("cube", [ax, ay, az], sa, [0, 0, 255]);
        let b = PlacedModel::standard("cube", [bx, by, bz], sb, [0, 0, 255]);

        let forward = collides(&Vec3::new(ax, ay, az), sa, std::slice::from_ref(&b));
        let backward = collides(&Vec3::new(bx, by, bz), sb, std::slice::from_ref(&a));
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn raising_never_lowers_and_lowering_never_raises(
        px in -4.0f32..4.0,
        pz in -4.0f32..4.0,
        height in 0.5f32..4.0,
        radius in 0.2f32..2.0,
        smoothness in 0.0f32..1.0,
    ) {
        let plane = grid_plane(5.0, 8);

        let raised = sculpt(&plane, &Vec3::new(px, height, pz), radius, smoothness);
        for (before, after) in plane.vertices.iter().zip(&raised.vertices) {
            prop_assert!(after.y >= before.y - 1e-5);
        }

        let lowered = sculpt(&plane, &Vec3::new(px, -height, pz), radius, smoothness);
        for (before, after) in plane.vertices.iter().zip(&lowered.vertices) {
            prop_assert!(after.y <= before.y + 1e-5);
        }
    }

    #[test]
    fn sculpted_heights_stay_within_peak_magnitude(
        height in 0.5f32..4.0,
        radius in 0.2f32..2.0,
        smoothness in 0.0f32..1.0,
    ) {
        let plane = grid_plane(5.0, 8);
        let sculpted = sculpt(&plane, &Vec3::new(0.0, height, 0.0), radius, smoothness);

        for vertex in &sculpted.vertices {
            prop_assert!(vertex.y <= height + 1e-4);
        }
    }

    #[test]
    fn falloff_weight_stays_normalized(t in 0.0f32..1.0, smoothness in 0.0f32..1.0) {
        let w = falloff_weight(t, smoothness);
        prop_assert!((0.0..=1.0 + 1e-6).contains(&w));
    }

    #[test]
    fn explicit_positions_are_never_touched(
        x in -50.0f32..50.0, y in -50.0f32..50.0, z in -50.0f32..50.0,
        count in 1u32..4,
    ) {
        let bounds = Aabb::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 10.0, 10.0));
        let ground = flat_ground(20.0);
        let directive = Augmentation::AddModel(AddModelDirective {
            model: "cube".to_string(),
            custom_path: None,
            scale: 1.0,
            count,
            position: PositionSpec::Fixed([x, y, z]),
            color: [0, 0, 255],
        });

        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut ctx = AugmentContext {
            bounds: &bounds,
            mesh: &ground,
            rng: &mut rng,
        };

        match ModelPlacer.generate(&mut ctx, &directive).unwrap() {
            AugmentOutcome::Placed(placed) => {
                prop_assert_eq!(placed.len(), count as usize);
                for object in &placed {
                    prop_assert_eq!(object.position(), [x, y, z]);
                }
            }
            other => panic!("expected placement outcome, got {:?}", other),
        }
    }
}
