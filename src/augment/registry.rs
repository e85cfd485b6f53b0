use std::collections::HashMap;

use rand::RngCore;
use thiserror::Error;

use crate::config::{Augmentation, LandscapeRecord, PlacedModel, PositionSpec};
use crate::geometry::Aabb;
use crate::mesh::TriMesh;

use super::placer::ModelPlacer;
use super::sculptor::LandscapeSculptor;

#[derive(Debug, Error)]
pub enum AugmentError {
    #[error("unknown augmentation kind: {kind}")]
    UnknownKind { kind: String },
    #[error("invalid directive: {reason}")]
    InvalidDirective { reason: String },
    #[error("no open position found after {attempts} attempts")]
    PlacementExhausted { attempts: u32 },
}

/// Everything a handler may read while generating: the run bounds, the
/// current working mesh, and the run's random source.
pub struct AugmentContext<'a> {
    pub bounds: &'a Aabb,
    pub mesh: &'a TriMesh,
    pub rng: &'a mut dyn RngCore,
}

/// Result of one directive. Placement and sculpting produce disjoint
/// streams; a sculpt replaces the run's working mesh.
#[derive(Debug)]
pub enum AugmentOutcome {
    Placed(Vec<PlacedModel>),
    Sculpted {
        mesh: TriMesh,
        records: Vec<LandscapeRecord>,
    },
}

pub trait Augmenter: Send + Sync {
    fn generate(
        &self,
        ctx: &mut AugmentContext<'_>,
        directive: &Augmentation,
    ) -> Result<AugmentOutcome, AugmentError>;
}

/// Kind-string to handler mapping, built at startup and passed into runs
/// explicitly. Registering an existing kind replaces the handler.
pub struct AugmenterRegistry {
    handlers: HashMap<String, Box<dyn Augmenter>>,
}

impl AugmenterRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("add_model", Box::new(ModelPlacer));
        registry.register("landscape", Box::new(LandscapeSculptor));
        registry
    }

    pub fn register(&mut self, kind: &str, handler: Box<dyn Augmenter>) {
        self.handlers.insert(kind.to_string(), handler);
    }

    pub fn dispatch(
        &self,
        ctx: &mut AugmentContext<'_>,
        directive: &Augmentation,
    ) -> Result<AugmentOutcome, AugmentError> {
        validate_directive(directive)?;

        match self.handlers.get(directive.kind()) {
            Some(handler) => handler.generate(ctx, directive),
            None => Err(AugmentError::UnknownKind {
                kind: directive.kind().to_string(),
            }),
        }
    }
}

/// Shape checks that fail a directive before any generation work starts.
pub fn validate_directive(directive: &Augmentation) -> Result<(), AugmentError> {
    match directive {
        Augmentation::AddModel(add) => {
            if !add.scale.is_finite() || add.scale <= 0.0 {
                return Err(invalid(format!("scale must be positive, got {}", add.scale)));
            }
            if add.model == "custom" && add.custom_path.is_none() {
                return Err(invalid("custom model requires custom_path".to_string()));
            }
            validate_position(&add.position)
        }
        Augmentation::Landscape(land) => {
            if !land.radius.is_finite() || land.radius <= 0.0 {
                return Err(invalid(format!(
                    "radius must be positive, got {}",
                    land.radius
                )));
            }
            if !land.smoothness.is_finite() || !(0.0..=1.0).contains(&land.smoothness) {
                return Err(invalid(format!(
                    "smoothness must be within [0, 1], got {}",
                    land.smoothness
                )));
            }
            validate_position(&land.position)
        }
    }
}

fn validate_position(position: &PositionSpec) -> Result<(), AugmentError> {
    match position {
        PositionSpec::Fixed(p) => {
            if p.iter().any(|c| !c.is_finite()) {
                Err(invalid(format!("position must be finite, got {:?}", p)))
            } else {
                Ok(())
            }
        }
        PositionSpec::Keyword(k) if k == "random" => Ok(()),
        PositionSpec::Keyword(k) => Err(invalid(format!("unknown position keyword: {}", k))),
    }
}

fn invalid(reason: String) -> AugmentError {
    AugmentError::InvalidDirective { reason }
}
