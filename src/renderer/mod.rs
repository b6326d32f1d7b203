//! WebGPU rendering module
//!
//! The frame is built on the CPU as pixel-space triangles (`shapes`) and
//! drawn in a single pass (`pipeline`).

pub mod pipeline;
pub mod shapes;
pub mod vertex;

pub use pipeline::RenderState;
pub use shapes::build_frame;
pub use vertex::Vertex;
