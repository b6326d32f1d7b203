//! Pointer repulsion field
//!
//! Reduces the latest pointer/touch point into a displacement per particle.
//! Displacement is measured from the fixed anchor, so a stationary pointer
//! produces a stable offset instead of pushing particles further each frame.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{INTERACTION_RADIUS, REPULSION_STRENGTH};
use crate::{distance, polar_to_cartesian};

/// How the device reports interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InputMode {
    /// Mouse/pen: the hover position always counts
    #[default]
    Pointer,
    /// Touch-capable: only counts while a finger is down
    Touch,
}

/// Most recent interaction point; no history is kept
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerState {
    pub position: Option<Vec2>,
    pub touch_active: bool,
    pub mode: InputMode,
}

impl PointerState {
    pub fn new(mode: InputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Pointer position if it currently exerts force
    pub fn engaged_position(&self) -> Option<Vec2> {
        match self.mode {
            InputMode::Touch if !self.touch_active => None,
            _ => self.position,
        }
    }
}

/// Repulsion tunables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldParams {
    /// Distance at and beyond which the pointer has no effect
    pub radius: f32,
    /// Displacement magnitude at zero distance
    pub strength: f32,
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            radius: INTERACTION_RADIUS,
            strength: REPULSION_STRENGTH,
        }
    }
}

/// Displacement pushing `anchor` away from the pointer, or `None` if the
/// particle should relax home.
///
/// The returned vector points from the anchor toward the pointer; the
/// displaced position is `anchor - displacement`. Magnitude falls linearly
/// from `strength` at distance 0 to nothing at `radius`. At distance 0 the
/// direction is `atan2(0, 0) = 0`.
pub fn force_at(anchor: Vec2, pointer: &PointerState, params: &FieldParams) -> Option<Vec2> {
    let target = pointer.engaged_position()?;
    let dist = distance(anchor, target);
    if dist >= params.radius {
        return None;
    }

    let delta = target - anchor;
    let force = (params.radius - dist) / params.radius;
    let angle = delta.y.atan2(delta.x);
    Some(polar_to_cartesian(force * params.strength, angle))
}
