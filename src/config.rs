use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// --- Generation config (input) ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub map_count: u32,
    pub output_type: OutputFormat,
    #[serde(default)]
    pub augmentations: Vec<Augmentation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Obj,
    Gltf,
}

/// One declarative augmentation step, tagged by `type` in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Augmentation {
    #[serde(rename = "add_model")]
    AddModel(AddModelDirective),
    #[serde(rename = "landscape")]
    Landscape(LandscapeDirective),
}

impl Augmentation {
    pub fn kind(&self) -> &str {
        match self {
            Augmentation::AddModel(_) => "add_model",
            Augmentation::Landscape(_) => "landscape",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddModelDirective {
    pub model: String,
    #[serde(default)]
    pub custom_path: Option<PathBuf>,
    pub scale: f32,
    pub count: u32,
    pub position: PositionSpec,
    #[serde(default = "default_color")]
    pub color: [u8; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandscapeDirective {
    pub position: PositionSpec,
    pub radius: f32,
    pub smoothness: f32,
    pub count: u32,
}

fn default_color() -> [u8; 3] {
    [0, 0, 255]
}

/// Either an explicit coordinate or the keyword `random`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PositionSpec {
    Fixed([f32; 3]),
    Keyword(String),
}

impl PositionSpec {
    pub fn is_random(&self) -> bool {
        matches!(self, PositionSpec::Keyword(k) if k == "random")
    }

    pub fn as_fixed(&self) -> Option<[f32; 3]> {
        match self {
            PositionSpec::Fixed(p) => Some(*p),
            PositionSpec::Keyword(_) => None,
        }
    }
}

// --- Map config (output of the plan phase, input of the build phase) ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    pub map: String,
    #[serde(default)]
    pub objects: Vec<PlacedModel>,
    #[serde(default)]
    pub landscapes: Vec<LandscapeRecord>,
}

/// A resolved object placement. Custom models reference a mesh file and
/// keep their own look; standard models carry a flat color.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlacedModel {
    Custom(CustomModel),
    Standard(StandardModel),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardModel {
    pub model: String,
    pub position: [f32; 3],
    pub scale: f32,
    pub color: [u8; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomModel {
    pub model: String,
    pub position: [f32; 3],
    pub scale: f32,
    pub model_path: PathBuf,
}

impl PlacedModel {
    pub fn standard(model: &str, position: [f32; 3], scale: f32, color: [u8; 3]) -> Self {
        PlacedModel::Standard(StandardModel {
            model: model.to_string(),
            position,
            scale,
            color,
        })
    }

    pub fn custom(model: &str, position: [f32; 3], scale: f32, model_path: PathBuf) -> Self {
        PlacedModel::Custom(CustomModel {
            model: model.to_string(),
            position,
            scale,
            model_path,
        })
    }

    pub fn model(&self) -> &str {
        match self {
            PlacedModel::Custom(m) => &m.model,
            PlacedModel::Standard(m) => &m.model,
        }
    }

    pub fn position(&self) -> [f32; 3] {
        match self {
            PlacedModel::Custom(m) => m.position,
            PlacedModel::Standard(m) => m.position,
        }
    }

    pub fn scale(&self) -> f32 {
        match self {
            PlacedModel::Custom(m) => m.scale,
            PlacedModel::Standard(m) => m.scale,
        }
    }

    pub fn color(&self) -> Option<[u8; 3]> {
        match self {
            PlacedModel::Custom(_) => None,
            PlacedModel::Standard(m) => Some(m.color),
        }
    }

    pub fn model_path(&self) -> Option<&Path> {
        match self {
            PlacedModel::Custom(m) => Some(&m.model_path),
            PlacedModel::Standard(_) => None,
        }
    }
}

/// A resolved landscape edit, replayable by the build phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandscapeRecord {
    pub position: [f32; 3],
    pub radius: f32,
    pub smoothness: f32,
}

// --- Loading and writing ---

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load_generation_config<P: AsRef<Path>>(path: P) -> Result<GenerationConfig, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::generation_config_from_string(&content)
    }

    pub fn generation_config_from_string(content: &str) -> Result<GenerationConfig, ConfigError> {
        let config: GenerationConfig = if content.trim_start().starts_with('{') {
            serde_json::from_str(content)?
        } else {
            serde_yaml::from_str(content)?
        };

        Self::validate(&config)?;
        Ok(config)
    }

    fn validate(config: &GenerationConfig) -> Result<(), ConfigError> {
        if config.map_count == 0 {
            return Err(ConfigError::Invalid(
                "map_count must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn load_map_config<P: AsRef<Path>>(path: P) -> Result<MapConfig, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: MapConfig = if content.trim_start().starts_with('{') {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        Ok(config)
    }

    /// Writes the map config as `<map>.yaml` into `dir`, creating the
    /// directory if needed. Returns the written path.
    pub fn write_map_config<P: AsRef<Path>>(dir: P, config: &MapConfig) -> Result<PathBuf, ConfigError> {
        fs::create_dir_all(&dir)?;
        let path = dir.as_ref().join(format!("{}.yaml", config.map));
        let file = fs::File::create(&path)?;
        serde_yaml::to_writer(file, config)?;
        Ok(path)
    }
}
