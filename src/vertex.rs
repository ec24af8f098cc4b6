use bytemuck::{Pod, Zeroable};

use crate::geometry::Position;

/// A single mesh vertex as consumed by the GPU upload stage.
///
/// `(x, y)` is the device-space position. `(u, v)` drive the 1D
/// antialiasing ramp in the fragment stage: fully covered vertices carry
/// `v == 1.0` and the coverage fades to zero toward the feather boundary.
/// The struct is `repr(C)` and [`Pod`] so a `&[Vertex]` slice can be
/// uploaded to a vertex buffer as raw bytes.
#[repr(C)]
#[derive(Copy, Clone, Default, Debug, PartialEq, PartialOrd, Pod, Zeroable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub u: f32,
    pub v: f32,
}

impl Vertex {
    pub fn new(x: f32, y: f32, u: f32, v: f32) -> Self {
        Self { x, y, u, v }
    }

    pub(crate) fn pos(position: Position, u: f32, v: f32) -> Self {
        Self::new(position.x, position.y, u, v)
    }
}
