use std::collections::HashSet;

use crate::geometry::{Aabb, Vec3};

const RAY_EPSILON: f32 = 1e-7;
const AREA_EPSILON: f32 = 1e-10;

/// Indexed triangle mesh. Faces are index triples into `vertices`,
/// counter-clockwise winding for outward normals.
#[derive(Debug, Clone, Default)]
pub struct TriMesh {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<[u32; 3]>,
}

impl TriMesh {
    pub fn new(vertices: Vec<Vec3>, faces: Vec<[u32; 3]>) -> Self {
        Self { vertices, faces }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(&self.vertices)
    }

    pub fn translate(&mut self, offset: &Vec3) {
        for v in &mut self.vertices {
            *v = v.add(offset);
        }
    }

    pub fn scale_uniform(&mut self, factor: f32) {
        for v in &mut self.vertices {
            *v = v.scale(factor);
        }
    }

    /// Appends another mesh, rebasing its face indices.
    pub fn merge(&mut self, other: &TriMesh) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        for face in &other.faces {
            self.faces
                .push([face[0] + offset, face[1] + offset, face[2] + offset]);
        }
    }

    /// All intersection points of a ray with the mesh (Moller-Trumbore per
    /// triangle, t >= 0). `direction` does not need to be normalized.
    pub fn ray_intersections(&self, origin: &Vec3, direction: &Vec3) -> Vec<Vec3> {
        let mut hits = Vec::new();

        for face in &self.faces {
            let v0 = &self.vertices[face[0] as usize];
            let v1 = &self.vertices[face[1] as usize];
            let v2 = &self.vertices[face[2] as usize];

            let edge1 = v1.sub(v0);
            let edge2 = v2.sub(v0);

            let pvec = direction.cross(&edge2);
            let det = edge1.dot(&pvec);
            if det.abs() < RAY_EPSILON {
                continue;
            }

            let inv_det = 1.0 / det;
            let tvec = origin.sub(v0);
            let u = tvec.dot(&pvec) * inv_det;
            if u < 0.0 || u > 1.0 {
                continue;
            }

            let qvec = tvec.cross(&edge1);
            let v = direction.dot(&qvec) * inv_det;
            if v < 0.0 || u + v > 1.0 {
                continue;
            }

            let t = edge2.dot(&qvec) * inv_det;
            if t >= 0.0 {
                hits.push(origin.add(&direction.scale(t)));
            }
        }

        hits
    }

    /// Closest point on any triangle of the mesh. None for an empty mesh.
    pub fn nearest_point_on_surface(&self, point: &Vec3) -> Option<Vec3> {
        let mut best: Option<(f32, Vec3)> = None;

        for face in &self.faces {
            let a = &self.vertices[face[0] as usize];
            let b = &self.vertices[face[1] as usize];
            let c = &self.vertices[face[2] as usize];

            let candidate = closest_point_on_triangle(point, a, b, c);
            let dist = candidate.distance_to(point);

            match best {
                Some((best_dist, _)) if best_dist <= dist => {}
                _ => best = Some((dist, candidate)),
            }
        }

        best.map(|(_, p)| p)
    }

    /// Copy of the mesh with degenerate faces (repeated index or near-zero
    /// area) and duplicate faces (same index set, any winding) removed.
    pub fn cleaned(&self) -> TriMesh {
        let mut seen: HashSet<[u32; 3]> = HashSet::with_capacity(self.faces.len());
        let mut faces = Vec::with_capacity(self.faces.len());

        for face in &self.faces {
            let [i0, i1, i2] = *face;
            if i0 == i1 || i1 == i2 || i0 == i2 {
                continue;
            }

            let v0 = &self.vertices[i0 as usize];
            let v1 = &self.vertices[i1 as usize];
            let v2 = &self.vertices[i2 as usize];
            let area = v1.sub(v0).cross(&v2.sub(v0)).length() * 0.5;
            if area < AREA_EPSILON {
                continue;
            }

            let mut key = [i0, i1, i2];
            key.sort_unstable();
            if !seen.insert(key) {
                continue;
            }

            faces.push(*face);
        }

        TriMesh {
            vertices: self.vertices.clone(),
            faces,
        }
    }

    /// Smooth per-vertex normals by accumulating face normals.
    pub fn vertex_normals(&self) -> Vec<Vec3> {
        let mut accumulators = vec![Vec3::ZERO; self.vertices.len()];

        for face in &self.faces {
            let i0 = face[0] as usize;
            let i1 = face[1] as usize;
            let i2 = face[2] as usize;

            let edge1 = self.vertices[i1].sub(&self.vertices[i0]);
            let edge2 = self.vertices[i2].sub(&self.vertices[i0]);
            let face_normal = edge1.cross(&edge2).normalize();

            accumulators[i0] = accumulators[i0].add(&face_normal);
            accumulators[i1] = accumulators[i1].add(&face_normal);
            accumulators[i2] = accumulators[i2].add(&face_normal);
        }

        accumulators.iter().map(|a| a.normalize()).collect()
    }
}

// Closest point on triangle abc to p, by barycentric region classification.
fn closest_point_on_triangle(p: &Vec3, a: &Vec3, b: &Vec3, c: &Vec3) -> Vec3 {
    let ab = b.sub(a);
    let ac = c.sub(a);
    let ap = p.sub(a);

    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return *a;
    }

    let bp = p.sub(b);
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return *b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a.add(&ab.scale(v));
    }

    let cp = p.sub(c);
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return *c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a.add(&ac.scale(w));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b.add(&c.sub(b).scale(w));
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a.add(&ab.scale(v)).add(&ac.scale(w))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Two-triangle square plane at y=0, normals facing +Y.
    fn flat_plane(half_extent: f32) -> TriMesh {
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

    #[test]
    fn test_ray_hits_plane_from_above() {
        let plane = flat_plane(10.0);
        let hits = plane.ray_intersections(&Vec3::new(1.0, 5.0, 2.0), &Vec3::new(0.0, -1.0, 0.0));

        assert_eq!(hits.len(), 1);
        assert!((hits[0].y - 0.0).abs() < 1e-5);
        assert!((hits[0].x - 1.0).abs() < 1e-5);
        assert!((hits[0].z - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_ray_hits_plane_from_below() {
        let plane = flat_plane(10.0);
        let hits = plane.ray_intersections(&Vec3::new(-3.0, -2.0, 4.0), &Vec3::new(0.0, 1.0, 0.0));

        assert_eq!(hits.len(), 1);
        assert!((hits[0].y - 0.0).abs() < 1e-5);
    }

    #[test]
    fn test_ray_misses_outside_plane() {
        let plane = flat_plane(10.0);
        let hits = plane.ray_intersections(&Vec3::new(50.0, 5.0, 0.0), &Vec3::new(0.0, -1.0, 0.0));

        assert!(hits.is_empty());
    }

    #[test]
    fn test_ray_ignores_hits_behind_origin() {
        let plane = flat_plane(10.0);
        // Pointing up from above the plane: the plane is behind the ray.
        let hits = plane.ray_intersections(&Vec3::new(0.0, 5.0, 0.0), &Vec3::new(0.0, 1.0, 0.0));

        assert!(hits.is_empty());
    }

    #[test]
    fn test_nearest_point_directly_below_query() {
        let plane = flat_plane(10.0);
        let nearest = plane
            .nearest_point_on_surface(&Vec3::new(2.0, 3.0, -1.0))
            .unwrap();

        assert!((nearest.x - 2.0).abs() < 1e-5);
        assert!((nearest.y - 0.0).abs() < 1e-5);
        assert!((nearest.z + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_nearest_point_clamps_to_edge() {
        let plane = flat_plane(1.0);
        let nearest = plane
            .nearest_point_on_surface(&Vec3::new(5.0, 0.0, 0.0))
            .unwrap();

        assert!((nearest.x - 1.0).abs() < 1e-5);
        assert!((nearest.z - 0.0).abs() < 1e-5);
    }

    #[test]
    fn test_nearest_point_empty_mesh() {
        let mesh = TriMesh::default();
        assert!(mesh.nearest_point_on_surface(&Vec3::ZERO).is_none());
    }

    #[test]
    fn test_merge_rebases_indices() {
        let mut a = flat_plane(1.0);
        let b = flat_plane(2.0);
        let verts_before = a.vertices.len();

        a.merge(&b);

        assert_eq!(a.vertices.len(), verts_before + 4);
        assert_eq!(a.faces.len(), 4);
        assert_eq!(a.faces[2], [4, 6, 5]);
    }

    #[test]
    fn test_cleaned_drops_degenerate_faces() {
        let mut mesh = flat_plane(1.0);
        mesh.faces.push([0, 0, 1]);
        mesh.faces.push([1, 2, 2]);

        let cleaned = mesh.cleaned();
        assert_eq!(cleaned.faces.len(), 2);
    }

    #[test]
    fn test_cleaned_drops_zero_area_faces() {
        let mesh = TriMesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );

        assert!(mesh.cleaned().faces.is_empty());
    }

    #[test]
    fn test_cleaned_drops_duplicate_faces() {
        let mut mesh = flat_plane(1.0);
        mesh.faces.push([0, 2, 1]);
        mesh.faces.push([1, 0, 2]);

        let cleaned = mesh.cleaned();
        assert_eq!(cleaned.faces.len(), 2);
    }

    #[test]
    fn test_vertex_normals_flat_plane_point_up() {
        let plane = flat_plane(1.0);
        let normals = plane.vertex_normals();

        assert_eq!(normals.len(), 4);
        for n in normals {
            assert!((n.y - 1.0).abs() < 1e-5);
            assert!(n.x.abs() < 1e-5);
            assert!(n.z.abs() < 1e-5);
        }
    }

    #[test]
    fn test_translate_and_scale() {
        let mut mesh = flat_plane(1.0);
        mesh.scale_uniform(2.0);
        mesh.translate(&Vec3::new(0.0, 5.0, 0.0));

        let bounds = mesh.bounds();
        assert_eq!(bounds.min.to_array(), [-2.0, 5.0, -2.0]);
        assert_eq!(bounds.max.to_array(), [2.0, 5.0, 2.0]);
    }
}
