//! Procedural map generation: populate a base terrain mesh with placed
//! objects and terrain-shape edits, driven by a declarative YAML config.
//!
//! The pipeline runs in two phases. `plan` executes the augmentation
//! engine (random placement with collision avoidance, landscape
//! sculpting) and writes one resolved map config per requested map;
//! `build` replays those configs into exported scenes. See
//! [`generator::MapGenerator`] for the entry points.

pub mod augment;
pub mod config;
pub mod generator;
pub mod geometry;
pub mod mesh;
pub mod scene;
pub mod shapes;

pub use augment::{AugmentError, AugmentOutcome, Augmenter, AugmenterRegistry};
pub use config::{Augmentation, ConfigLoader, GenerationConfig, MapConfig, OutputFormat};
pub use generator::{GeneratorError, MapGenerator, ProgressEvent, ProgressReporter};
pub use geometry::{Aabb, Vec3};
pub use mesh::TriMesh;
pub use scene::{load_scene, Scene, SceneError, SceneNode};
pub use shapes::ShapeCatalog;
