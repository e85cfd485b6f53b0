use std::collections::HashMap;
use std::f32::consts::PI;

use crate::config::PlacedModel;
use crate::geometry::Vec3;
use crate::mesh::TriMesh;
use crate::scene::{load_mesh, SceneError};

const SPHERE_RINGS: u32 = 16;
const SPHERE_SEGMENTS: u32 = 32;
const RADIAL_SEGMENTS: u32 = 32;

/// Unit cube centered at the origin.
pub fn unit_cube() -> TriMesh {
    let h = 0.5;
    let vertices = vec![
        Vec3::new(-h, -h, -h),
        Vec3::new(h, -h, -h),
        Vec3::new(h, h, -h),
        Vec3::new(-h, h, -h),
        Vec3::new(-h, -h, h),
        Vec3::new(h, -h, h),
        Vec3::new(h, h, h),
        Vec3::new(-h, h, h),
    ];

    let faces = vec![
        [0, 3, 2],
        [0, 2, 1],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [3, 7, 6],
        [3, 6, 2],
        [0, 4, 7],
        [0, 7, 3],
        [1, 2, 6],
        [1, 6, 5],
    ];

    TriMesh::new(vertices, faces)
}

/// UV sphere centered at the origin, poles on the y axis.
pub fn uv_sphere(radius: f32, rings: u32, segments: u32) -> TriMesh {
    let mut vertices = Vec::new();
    let mut faces = Vec::new();

    vertices.push(Vec3::new(0.0, radius, 0.0));

    for ring in 1..rings {
        let theta = PI * ring as f32 / rings as f32;
        let ring_y = radius * theta.cos();
        let ring_radius = radius * theta.sin();

        for segment in 0..segments {
            let phi = 2.0 * PI * segment as f32 / segments as f32;
            vertices.push(Vec3::new(
                ring_radius * phi.cos(),
                ring_y,
                ring_radius * phi.sin(),
            ));
        }
    }

    let south_pole = vertices.len() as u32;
    vertices.push(Vec3::new(0.0, -radius, 0.0));

    let ring_base = |ring: u32| 1 + (ring - 1) * segments;

    for segment in 0..segments {
        let next = (segment + 1) % segments;
        faces.push([0, ring_base(1) + next, ring_base(1) + segment]);
    }

    for ring in 1..rings - 1 {
        let upper = ring_base(ring);
        let lower = ring_base(ring + 1);
        for segment in 0..segments {
            let next = (segment + 1) % segments;
            faces.push([upper + segment, upper + next, lower + next]);
            faces.push([upper + segment, lower + next, lower + segment]);
        }
    }

    let last_ring = ring_base(rings - 1);
    for segment in 0..segments {
        let next = (segment + 1) % segments;
        faces.push([south_pole, last_ring + segment, last_ring + next]);
    }

    TriMesh::new(vertices, faces)
}

/// Cylinder centered at the origin, axis along y.
pub fn cylinder(radius: f32, height: f32, segments: u32) -> TriMesh {
    let h = height / 2.0;
    let mut vertices = Vec::new();
    let mut faces = Vec::new();

    vertices.push(Vec3::new(0.0, h, 0.0));
    vertices.push(Vec3::new(0.0, -h, 0.0));

    for segment in 0..segments {
        let phi = 2.0 * PI * segment as f32 / segments as f32;
        vertices.push(Vec3::new(radius * phi.cos(), h, radius * phi.sin()));
    }
    for segment in 0..segments {
        let phi = 2.0 * PI * segment as f32 / segments as f32;
        vertices.push(Vec3::new(radius * phi.cos(), -h, radius * phi.sin()));
    }

    let top = |s: u32| 2 + s;
    let bottom = |s: u32| 2 + segments + s;

    for segment in 0..segments {
        let next = (segment + 1) % segments;
        faces.push([0, top(next), top(segment)]);
        faces.push([1, bottom(segment), bottom(next)]);
        faces.push([top(segment), top(next), bottom(next)]);
        faces.push([top(segment), bottom(next), bottom(segment)]);
    }

    TriMesh::new(vertices, faces)
}

/// Cone centered at the origin, apex up, base at y = -height/2.
pub fn cone(radius: f32, height: f32, segments: u32) -> TriMesh {
    let h = height / 2.0;
    let mut vertices = Vec::new();
    let mut faces = Vec::new();

    vertices.push(Vec3::new(0.0, h, 0.0));
    vertices.push(Vec3::new(0.0, -h, 0.0));

    for segment in 0..segments {
        let phi = 2.0 * PI * segment as f32 / segments as f32;
        vertices.push(Vec3::new(radius * phi.cos(), -h, radius * phi.sin()));
    }

    let ring = |s: u32| 2 + s;

    for segment in 0..segments {
        let next = (segment + 1) % segments;
        faces.push([0, ring(next), ring(segment)]);
        faces.push([1, ring(segment), ring(next)]);
    }

    TriMesh::new(vertices, faces)
}

type ShapeBuilder = Box<dyn Fn(&PlacedModel) -> Result<TriMesh, SceneError> + Send + Sync>;

/// Model-name to mesh-builder registry. Registering a name that already
/// exists replaces the builder, so callers can override the defaults.
pub struct ShapeCatalog {
    builders: HashMap<String, ShapeBuilder>,
}

impl ShapeCatalog {
    pub fn with_defaults() -> Self {
        let mut catalog = Self {
            builders: HashMap::new(),
        };

        catalog.register("cube", |_| Ok(unit_cube()));
        catalog.register("sphere", |_| Ok(uv_sphere(0.5, SPHERE_RINGS, SPHERE_SEGMENTS)));
        catalog.register("cylinder", |_| Ok(cylinder(0.5, 1.0, RADIAL_SEGMENTS)));
        catalog.register("cone", |_| Ok(cone(0.5, 1.0, RADIAL_SEGMENTS)));
        catalog.register("custom", |placed| match placed.model_path() {
            Some(path) => load_mesh(path),
            None => Err(SceneError::InvalidModel(
                "custom model requires model_path".to_string(),
            )),
        });

        catalog
    }

    pub fn register<F>(&mut self, name: &str, builder: F)
    where
        F: Fn(&PlacedModel) -> Result<TriMesh, SceneError> + Send + Sync + 'static,
    {
        self.builders.insert(name.to_string(), Box::new(builder));
    }

    pub fn build(&self, placed: &PlacedModel) -> Result<TriMesh, SceneError> {
        match self.builders.get(placed.model()) {
            Some(builder) => builder(placed),
            None => Err(SceneError::UnsupportedModel(placed.model().to_string())),
        }
    }
}
