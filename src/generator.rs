use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use rand::RngCore;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::augment::{sculpt, AugmentContext, AugmentError, AugmentOutcome, AugmenterRegistry};
use crate::config::{
    ConfigError, ConfigLoader, GenerationConfig, MapConfig, OutputFormat, PlacedModel,
};
use crate::geometry::Vec3;
use crate::scene::{Scene, SceneError, SceneNode};
use crate::shapes::ShapeCatalog;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),
    #[error("augmentation failed: {0}")]
    Augment(#[from] AugmentError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Milestones of one generation run, sent over the caller's channel.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    RunStarted { map: String },
    DirectiveApplied { map: String, kind: String },
    RunFinished { map: String },
    MapExported { map: String, path: PathBuf },
}

/// Progress sink owned by the caller. A dropped receiver never fails the
/// run; events are simply discarded.
#[derive(Clone, Default)]
pub struct ProgressReporter {
    sender: Option<Sender<ProgressEvent>>,
}

impl ProgressReporter {
    pub fn new(sender: Sender<ProgressEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    fn send(&self, event: ProgressEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }
}

/// Orchestrates the two generation phases.
///
/// `plan` runs the augmentation engine against the base scene and writes
/// one resolved map config per requested map. `build` replays those
/// configs into exported scenes. Splitting the phases keeps the random
/// work in plan; build is fully deterministic from the configs.
pub struct MapGenerator {
    registry: AugmenterRegistry,
    catalog: ShapeCatalog,
}

impl Default for MapGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MapGenerator {
    pub fn new() -> Self {
        Self {
            registry: AugmenterRegistry::with_defaults(),
            catalog: ShapeCatalog::with_defaults(),
        }
    }

    pub fn with_parts(registry: AugmenterRegistry, catalog: ShapeCatalog) -> Self {
        Self { registry, catalog }
    }

    /// Plans every map the config asks for, writing one map config YAML
    /// per map into `configs_dir`. Returns the written paths in
    /// generation order. A directive failure aborts the whole plan.
    pub fn plan_maps<P: AsRef<Path>>(
        &self,
        config: &GenerationConfig,
        base_scene: &Scene,
        configs_dir: P,
        rng: &mut dyn RngCore,
        progress: &ProgressReporter,
    ) -> Result<Vec<PathBuf>, GeneratorError> {
        let mut written = Vec::with_capacity(config.map_count as usize);

        for _ in 0..config.map_count {
            let map_config = self.plan_map(config, base_scene, rng, progress)?;
            let path = ConfigLoader::write_map_config(&configs_dir, &map_config)?;
            info!(map = %map_config.map, path = %path.display(), "map planned");
            written.push(path);
        }

        Ok(written)
    }

    /// Plans a single map: folds the directive list through the
    /// dispatcher, accumulating placed objects and landscape records.
    /// Bounds come from the base scene once; sculpted meshes replace the
    /// working mesh so later directives ground-snap against them.
    pub fn plan_map(
        &self,
        config: &GenerationConfig,
        base_scene: &Scene,
        rng: &mut dyn RngCore,
        progress: &ProgressReporter,
    ) -> Result<MapConfig, GeneratorError> {
        let map_name = fresh_map_name();
        progress.send(ProgressEvent::RunStarted {
            map: map_name.clone(),
        });

        let bounds = base_scene.bounds();
        let mut working_mesh = base_scene.concat_mesh();
        let mut objects = Vec::new();
        let mut landscapes = Vec::new();

        for directive in &config.augmentations {
            let outcome = {
                let mut ctx = AugmentContext {
                    bounds: &bounds,
                    mesh: &working_mesh,
                    rng: &mut *rng,
                };
                self.registry.dispatch(&mut ctx, directive)?
            };

            match outcome {
                AugmentOutcome::Placed(placed) => {
                    debug!(map = %map_name, kind = directive.kind(), count = placed.len(), "directive applied");
                    objects.extend(placed);
                }
                AugmentOutcome::Sculpted { mesh, records } => {
                    debug!(map = %map_name, kind = directive.kind(), edits = records.len(), "directive applied");
                    working_mesh = mesh;
                    landscapes.extend(records);
                }
            }

            progress.send(ProgressEvent::DirectiveApplied {
                map: map_name.clone(),
                kind: directive.kind().to_string(),
            });
        }

        progress.send(ProgressEvent::RunFinished {
            map: map_name.clone(),
        });

        Ok(MapConfig {
            map: map_name,
            objects,
            landscapes,
        })
    }

    /// Builds every map config found in `configs_dir` against the base
    /// scene and exports the results into `output_dir`.
    pub fn build_maps<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        configs_dir: P,
        base_scene: &Scene,
        output_dir: Q,
        format: OutputFormat,
        progress: &ProgressReporter,
    ) -> Result<Vec<PathBuf>, GeneratorError> {
        let mut config_paths: Vec<PathBuf> = fs::read_dir(&configs_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "yaml"))
            .collect();
        config_paths.sort();

        let mut exported = Vec::with_capacity(config_paths.len());
        for path in config_paths {
            let map_config = ConfigLoader::load_map_config(&path)?;
            let output = self.build_map(&map_config, base_scene, &output_dir, format)?;
            info!(map = %map_config.map, path = %output.display(), "map exported");
            progress.send(ProgressEvent::MapExported {
                map: map_config.map.clone(),
                path: output.clone(),
            });
            exported.push(output);
        }

        Ok(exported)
    }

    /// Rebuilds one map's scene and writes it to `output_dir`, returning
    /// the exported file path. The sculpt chain replays the landscape
    /// records in order before any objects are realized.
    pub fn build_map<P: AsRef<Path>>(
        &self,
        map_config: &MapConfig,
        base_scene: &Scene,
        output_dir: P,
        format: OutputFormat,
    ) -> Result<PathBuf, GeneratorError> {
        let mut terrain = base_scene.concat_mesh();
        for record in &map_config.landscapes {
            let peak = Vec3::from_array(record.position);
            terrain = sculpt(&terrain, &peak, record.radius, record.smoothness);
        }

        let mut scene = Scene::single("terrain", terrain);
        for (index, placed) in map_config.objects.iter().enumerate() {
            scene.push(realize_object(&self.catalog, placed, index)?);
        }

        let dir = output_dir.as_ref();
        fs::create_dir_all(dir)?;

        let path = match format {
            OutputFormat::Obj => {
                let (obj, mtl) = scene.to_obj(&map_config.map);
                let obj_path = dir.join(format!("{}.obj", map_config.map));
                fs::write(&obj_path, obj)?;
                if !mtl.is_empty() {
                    fs::write(dir.join(format!("{}.mtl", map_config.map)), mtl)?;
                }
                obj_path
            }
            OutputFormat::Gltf => {
                let gltf_path = dir.join(format!("{}.gltf", map_config.map));
                fs::write(&gltf_path, scene.to_gltf_json(&map_config.map))?;
                gltf_path
            }
        };

        Ok(path)
    }
}

fn realize_object(
    catalog: &ShapeCatalog,
    placed: &PlacedModel,
    index: usize,
) -> Result<SceneNode, GeneratorError> {
    let mut mesh = catalog.build(placed)?;
    mesh.scale_uniform(placed.scale());
    mesh.translate(&Vec3::from_array(placed.position()));

    Ok(SceneNode {
        name: format!("{}_{}", placed.model(), index),
        mesh,
        color: placed.color(),
    })
}

fn fresh_map_name() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("map_{}", &id[..8])
}
