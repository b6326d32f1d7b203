//! Input event reduction
//!
//! Browser events are reduced to `InputEvent`s carrying only what the field
//! needs, then folded into the single `PointerState`.

use glam::Vec2;

use crate::sim::{InputMode, PointerState, Viewport};

/// Everything the field consumes from the page
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Mouse/pen moved over the surface
    PointerMove(Vec2),
    /// Pointer left the surface
    PointerLeave,
    /// Finger down, with its position if known
    TouchStart(Option<Vec2>),
    /// Finger moved
    TouchMove(Vec2),
    /// Last finger lifted or touch cancelled
    TouchEnd,
    /// Viewport changed size (logical pixels)
    Resize(Viewport),
}

/// Fold one event into the pointer state.
///
/// Returns true if the state changed. `Resize` never touches the pointer.
pub fn apply(pointer: &mut PointerState, event: &InputEvent) -> bool {
    let before = *pointer;
    match *event {
        InputEvent::PointerMove(p) | InputEvent::TouchMove(p) => {
            pointer.position = Some(p);
        }
        InputEvent::PointerLeave => {
            // Touch devices report leave on lift; TouchEnd handles those
            if pointer.mode == InputMode::Pointer {
                pointer.position = None;
            }
        }
        InputEvent::TouchStart(p) => {
            pointer.touch_active = true;
            if p.is_some() {
                pointer.position = p;
            }
        }
        InputEvent::TouchEnd => {
            pointer.touch_active = false;
            pointer.position = None;
        }
        InputEvent::Resize(_) => {}
    }
    *pointer != before
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_position_wins() {
        let mut pointer = PointerState::default();
        apply(&mut pointer, &InputEvent::PointerMove(Vec2::new(1.0, 2.0)));
        apply(&mut pointer, &InputEvent::PointerMove(Vec2::new(3.0, 4.0)));
        assert_eq!(pointer.position, Some(Vec2::new(3.0, 4.0)));
        assert_eq!(pointer.engaged_position(), Some(Vec2::new(3.0, 4.0)));
    }

    #[test]
    fn test_leave_clears_pointer() {
        let mut pointer = PointerState::default();
        apply(&mut pointer, &InputEvent::PointerMove(Vec2::new(1.0, 2.0)));
        assert!(apply(&mut pointer, &InputEvent::PointerLeave));
        assert_eq!(pointer.position, None);
        assert!(!apply(&mut pointer, &InputEvent::PointerLeave));
    }

    #[test]
    fn test_touch_lifecycle() {
        let mut pointer = PointerState::new(InputMode::Touch);
        apply(&mut pointer, &InputEvent::TouchStart(Some(Vec2::new(5.0, 5.0))));
        assert_eq!(pointer.engaged_position(), Some(Vec2::new(5.0, 5.0)));

        apply(&mut pointer, &InputEvent::TouchMove(Vec2::new(6.0, 7.0)));
        assert_eq!(pointer.engaged_position(), Some(Vec2::new(6.0, 7.0)));

        // Leave is ignored on touch devices
        apply(&mut pointer, &InputEvent::PointerLeave);
        assert!(pointer.position.is_some());

        apply(&mut pointer, &InputEvent::TouchEnd);
        assert!(!pointer.touch_active);
        assert_eq!(pointer.engaged_position(), None);
    }

    #[test]
    fn test_hover_on_touch_device_is_inert() {
        let mut pointer = PointerState::new(InputMode::Touch);
        apply(&mut pointer, &InputEvent::PointerMove(Vec2::new(5.0, 5.0)));
        assert_eq!(pointer.engaged_position(), None);
    }

    #[test]
    fn test_resize_leaves_pointer_alone() {
        let mut pointer = PointerState::default();
        assert!(!apply(&mut pointer, &InputEvent::Resize(Viewport::new(10, 10))));
    }
}
