pub mod ground;
pub mod placer;
pub mod registry;
pub mod sculptor;

pub use ground::ground_height;
pub use placer::{collides, ModelPlacer, MAX_PLACEMENT_ATTEMPTS};
pub use registry::{
    validate_directive, AugmentContext, AugmentError, AugmentOutcome, Augmenter, AugmenterRegistry,
};
pub use sculptor::{falloff_weight, sculpt, LandscapeSculptor};
