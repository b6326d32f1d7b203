//! Platform layer
//!
//! - `input`: browser events reduced to pointer state
//! - `lifecycle`: mount, frame loop, resize and teardown sequencing
//! - `web`: `web_sys` glue (wasm32 only)

pub mod input;
pub mod lifecycle;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use input::InputEvent;
pub use lifecycle::{Controller, FpsCounter, FrameHandle, Host, Phase};
