use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::geometry::{Aabb, Vec3};
use crate::mesh::TriMesh;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("OBJ parse error at line {line}: {reason}")]
    ObjParse { line: usize, reason: String },
    #[error("scene has no geometry")]
    EmptyScene,
    #[error("unsupported model type: {0}")]
    UnsupportedModel(String),
    #[error("invalid model: {0}")]
    InvalidModel(String),
}

/// One named mesh in a scene. Standard placed models carry a flat RGB
/// color; terrain and custom models have none.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub mesh: TriMesh,
    pub color: Option<[u8; 3]>,
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub nodes: Vec<SceneNode>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(name: &str, mesh: TriMesh) -> Self {
        Self {
            nodes: vec![SceneNode {
                name: name.to_string(),
                mesh,
                color: None,
            }],
        }
    }

    pub fn push(&mut self, node: SceneNode) {
        self.nodes.push(node);
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.iter().all(|n| n.mesh.is_empty())
    }

    /// All node meshes merged into one, for bounds and surface queries.
    pub fn concat_mesh(&self) -> TriMesh {
        let mut merged = TriMesh::default();
        for node in &self.nodes {
            merged.merge(&node.mesh);
        }
        merged
    }

    pub fn bounds(&self) -> Aabb {
        self.concat_mesh().bounds()
    }

    /// Wavefront OBJ text plus the companion MTL text. The MTL is empty
    /// when no node carries a color, and the mtllib reference is omitted.
    pub fn to_obj(&self, name: &str) -> (String, String) {
        let mut obj = String::new();
        let mut mtl = String::new();

        obj.push_str(&format!("# {}\n", name));
        obj.push_str("# Generated by mapforge\n\n");

        let has_materials = self.nodes.iter().any(|n| n.color.is_some());
        if has_materials {
            obj.push_str(&format!("mtllib {}.mtl\n\n", name));
        }

        let mut written_materials: Vec<[u8; 3]> = Vec::new();
        let mut vertex_base = 1usize;

        for node in &self.nodes {
            obj.push_str(&format!("o {}\n", node.name));

            if let Some(color) = node.color {
                let material = material_name(color);
                if !written_materials.contains(&color) {
                    written_materials.push(color);
                    mtl.push_str(&format!("newmtl {}\n", material));
                    mtl.push_str(&format!(
                        "Kd {} {} {}\n\n",
                        color[0] as f32 / 255.0,
                        color[1] as f32 / 255.0,
                        color[2] as f32 / 255.0
                    ));
                }
                obj.push_str(&format!("usemtl {}\n", material));
            }

            for vertex in &node.mesh.vertices {
                obj.push_str(&format!("v {} {} {}\n", vertex.x, vertex.y, vertex.z));
            }

            for normal in node.mesh.vertex_normals() {
                obj.push_str(&format!("vn {} {} {}\n", normal.x, normal.y, normal.z));
            }

            for face in &node.mesh.faces {
                let i0 = face[0] as usize + vertex_base;
                let i1 = face[1] as usize + vertex_base;
                let i2 = face[2] as usize + vertex_base;
                obj.push_str(&format!("f {}//{} {}//{} {}//{}\n", i0, i0, i1, i1, i2, i2));
            }

            obj.push('\n');
            vertex_base += node.mesh.vertices.len();
        }

        (obj, mtl)
    }

    /// glTF 2.0 JSON for the merged scene geometry. Accessor layout
    /// mirrors the OBJ export: positions, normals, then indices.
    pub fn to_gltf_json(&self, name: &str) -> String {
        let mesh = self.concat_mesh();
        let normals = mesh.vertex_normals();
        let bounds = mesh.bounds();
        let index_count = mesh.faces.len() * 3;

        serde_json::json!({
            "asset": {
                "version": "2.0",
                "generator": "mapforge"
            },
            "scene": 0,
            "scenes": [{"nodes": [0]}],
            "nodes": [{
                "mesh": 0,
                "name": name
            }],
            "meshes": [{
                "primitives": [{
                    "attributes": {
                        "POSITION": 0,
                        "NORMAL": 1
                    },
                    "indices": 2
                }]
            }],
            "accessors": [
                {
                    "bufferView": 0,
                    "componentType": 5126,
                    "count": mesh.vertices.len(),
                    "type": "VEC3",
                    "max": [bounds.max.x, bounds.max.y, bounds.max.z],
                    "min": [bounds.min.x, bounds.min.y, bounds.min.z]
                },
                {
                    "bufferView": 1,
                    "componentType": 5126,
                    "count": normals.len(),
                    "type": "VEC3"
                },
                {
                    "bufferView": 2,
                    "componentType": 5125,
                    "count": index_count,
                    "type": "SCALAR"
                }
            ],
            "bufferViews": [
                {"buffer": 0, "byteOffset": 0, "byteLength": mesh.vertices.len() * 12},
                {"buffer": 0, "byteOffset": mesh.vertices.len() * 12, "byteLength": normals.len() * 12},
                {"buffer": 0, "byteOffset": mesh.vertices.len() * 12 + normals.len() * 12, "byteLength": index_count * 4}
            ],
            "buffers": [{
                "byteLength": mesh.vertices.len() * 12 + normals.len() * 12 + index_count * 4
            }]
        })
        .to_string()
    }
}

fn material_name(color: [u8; 3]) -> String {
    format!("mat_{}_{}_{}", color[0], color[1], color[2])
}

/// Loads an OBJ file as a single-node scene named after the file stem.
pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<Scene, SceneError> {
    let mesh = load_mesh(&path)?;
    let name = path
        .as_ref()
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("terrain")
        .to_string();

    Ok(Scene {
        nodes: vec![SceneNode {
            name,
            mesh,
            color: None,
        }],
    })
}

pub fn load_mesh<P: AsRef<Path>>(path: P) -> Result<TriMesh, SceneError> {
    let content = fs::read_to_string(path)?;
    parse_obj(&content)
}

/// Minimal Wavefront OBJ reader: `v` and `f` records, 1-based and negative
/// indices, polygons fan-triangulated. Texture and normal references are
/// accepted on faces but ignored.
pub fn parse_obj(content: &str) -> Result<TriMesh, SceneError> {
    let mut vertices: Vec<Vec3> = Vec::new();
    let mut faces: Vec<[u32; 3]> = Vec::new();

    for (line_idx, raw_line) in content.lines().enumerate() {
        let line_no = line_idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        let record = match parts.next() {
            Some(r) => r,
            None => continue,
        };

        match record {
            "v" => {
                let mut coords = [0.0f32; 3];
                for coord in &mut coords {
                    let token = parts.next().ok_or(SceneError::ObjParse {
                        line: line_no,
                        reason: "vertex needs 3 coordinates".to_string(),
                    })?;
                    *coord = token.parse().map_err(|_| SceneError::ObjParse {
                        line: line_no,
                        reason: format!("bad coordinate: {}", token),
                    })?;
                }
                vertices.push(Vec3::from_array(coords));
            }
            "f" => {
                let mut indices = Vec::new();
                for token in parts {
                    indices.push(parse_face_index(token, vertices.len(), line_no)?);
                }
                if indices.len() < 3 {
                    return Err(SceneError::ObjParse {
                        line: line_no,
                        reason: "face needs at least 3 vertices".to_string(),
                    });
                }
                for i in 1..indices.len() - 1 {
                    faces.push([indices[0], indices[i], indices[i + 1]]);
                }
            }
            _ => {}
        }
    }

    if vertices.is_empty() || faces.is_empty() {
        return Err(SceneError::EmptyScene);
    }

    Ok(TriMesh::new(vertices, faces))
}

fn parse_face_index(token: &str, vertex_count: usize, line_no: usize) -> Result<u32, SceneError> {
    // Face references look like "7", "7/1", "7//3" or "7/1/3".
    let vertex_ref = token.split('/').next().unwrap_or(token);
    let index: i64 = vertex_ref.parse().map_err(|_| SceneError::ObjParse {
        line: line_no,
        reason: format!("bad face index: {}", token),
    })?;

    let resolved = if index > 0 {
        index - 1
    } else if index < 0 {
        vertex_count as i64 + index
    } else {
        -1
    };

    if resolved < 0 || resolved >= vertex_count as i64 {
        return Err(SceneError::ObjParse {
            line: line_no,
            reason: format!("face index out of range: {}", token),
        });
    }

    Ok(resolved as u32)
}
