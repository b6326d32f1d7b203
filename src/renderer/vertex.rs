//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// 2D vertex in viewport pixels with straight-alpha color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Scene colors (sRGB, 0-1)
pub mod colors {
    /// Gradient start, top-left (#3a0ca3, deep purple)
    pub const BACKGROUND_START: [f32; 4] = [58.0 / 255.0, 12.0 / 255.0, 163.0 / 255.0, 1.0];
    /// Gradient end, bottom-right (#4361ee, royal blue)
    pub const BACKGROUND_END: [f32; 4] = [67.0 / 255.0, 97.0 / 255.0, 238.0 / 255.0, 1.0];
    pub const PARTICLE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    /// Particle opacity while displaced
    pub const DISPLACED_ALPHA: f32 = 0.9;
    /// Soft halo behind displaced particles
    pub const GLOW: [f32; 4] = [1.0, 1.0, 1.0, 0.2];
    pub const CLEAR: [f32; 4] = BACKGROUND_START;

    /// Linear blend between two colors
    pub fn mix(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
        [
            a[0] + (b[0] - a[0]) * t,
            a[1] + (b[1] - a[1]) * t,
            a[2] + (b[2] - a[2]) * t,
            a[3] + (b[3] - a[3]) * t,
        ]
    }
}
