//! Deterministic particle simulation
//!
//! All field logic lives here. This module must stay free of rendering and
//! platform dependencies:
//! - Seeded RNG only
//! - Stable iteration order (pool order)
//! - One step per displayed frame

pub mod field;
pub mod font;
pub mod mask;
pub mod pool;
pub mod state;
pub mod step;

pub use field::{FieldParams, InputMode, PointerState, force_at};
pub use font::EmbeddedFont;
pub use mask::{MaskError, MaskSource, TextLayout, TextMask, Viewport};
pub use pool::{Expiry, Particle, ParticlePool, spawn_one, spawn_success_rate, target_count};
pub use state::{Rebuild, Scene, SceneParams};
pub use step::{Motion, StepContext, StepStats, relax, step};
