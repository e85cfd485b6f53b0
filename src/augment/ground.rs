use crate::geometry::Vec3;
use crate::mesh::TriMesh;

/// Vertical clearance added to the probe before casting, so a probe that
/// is already on the surface still finds it.
pub const SURFACE_OFFSET: f32 = 0.01;

/// Scene center height the probe's y is compared against to pick the
/// casting direction.
const SCENE_CENTER_HEIGHT: f32 = 0.0;

/// Height of the terrain surface at a probe point.
///
/// Probes below the scene center cast upward from slightly below
/// themselves; probes at or above it cast downward from slightly above.
/// The nearest intersection wins. When the ray misses entirely the probe
/// is off the edge of the terrain, and the nearest point on the surface
/// supplies the height instead, so the query always produces an answer.
/// An empty mesh yields the scene center height.
pub fn ground_height(mesh: &TriMesh, probe: &Vec3) -> f32 {
    let (origin, direction) = if probe.y < SCENE_CENTER_HEIGHT {
        (
            Vec3::new(probe.x, probe.y - SURFACE_OFFSET, probe.z),
            Vec3::new(0.0, 1.0, 0.0),
        )
    } else {
        (
            Vec3::new(probe.x, probe.y + SURFACE_OFFSET, probe.z),
            Vec3::new(0.0, -1.0, 0.0),
        )
    };

    let hits = mesh.ray_intersections(&origin, &direction);
    let nearest = hits.into_iter().min_by(|a, b| {
        let da = a.distance_to(&origin);
        let db = b.distance_to(&origin);
        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
    });

    match nearest {
        Some(hit) => hit.y,
        None => mesh
            .nearest_point_on_surface(&origin)
            .map(|p| p.y)
            .unwrap_or(SCENE_CENTER_HEIGHT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_plane_at(height: f32, half_extent: f32) -> TriMesh {
        let h = half_extent;
        TriMesh::new(
            vec![
                Vec3::new(-h, height, -h),
                Vec3::new(h, height, -h),
                Vec3::new(h, height, h),
                Vec3::new(-h, height, h),
            ],
            vec![[0, 2, 1], [0, 3, 2]],
        )
    }

    #[test]
    fn test_probe_above_casts_down() {
        let plane = flat_plane_at(0.0, 10.0);
        let height = ground_height(&plane, &Vec3::new(1.0, 5.0, 2.0));
        assert!((height - 0.0).abs() < 1e-5);
    }

    #[test]
    fn test_probe_below_casts_up() {
        let plane = flat_plane_at(0.0, 10.0);
        let height = ground_height(&plane, &Vec3::new(1.0, -5.0, 2.0));
        assert!((height - 0.0).abs() < 1e-5);
    }

    #[test]
    fn test_probe_on_surface_still_finds_it() {
        let plane = flat_plane_at(0.0, 10.0);
        let height = ground_height(&plane, &Vec3::new(0.0, 0.0, 0.0));
        assert!((height - 0.0).abs() < 1e-5);
    }

    #[test]
    fn test_raised_platform() {
        let plane = flat_plane_at(2.0, 10.0);

        let from_above = ground_height(&plane, &Vec3::new(0.0, 5.0, 0.0));
        assert!((from_above - 2.0).abs() < 1e-5);

        // A probe below zero casts upward and still reaches the platform.
        let from_below = ground_height(&plane, &Vec3::new(0.0, -1.0, 0.0));
        assert!((from_below - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_nearest_hit_wins_with_layered_surfaces() {
        let mut mesh = flat_plane_at(0.0, 10.0);
        mesh.merge(&flat_plane_at(4.0, 10.0));

        // From y=5 the upper layer is closer.
        let high = ground_height(&mesh, &Vec3::new(0.0, 5.0, 0.0));
        assert!((high - 4.0).abs() < 1e-5);

        // From y=3 the cast goes down and only the lower layer is ahead.
        let low = ground_height(&mesh, &Vec3::new(0.0, 3.0, 0.0));
        assert!((low - 0.0).abs() < 1e-5);
    }

    #[test]
    fn test_miss_falls_back_to_nearest_surface_point() {
        let plane = flat_plane_at(0.0, 1.0);
        let height = ground_height(&plane, &Vec3::new(5.0, 3.0, 0.0));
        assert!((height - 0.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_mesh_yields_center_height() {
        let mesh = TriMesh::default();
        assert_eq!(ground_height(&mesh, &Vec3::new(1.0, 2.0, 3.0)), 0.0);
    }
}
