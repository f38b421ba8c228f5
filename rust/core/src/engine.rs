// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry engine capability
//!
//! The engine parses IFC data and tessellates it into buffers living in its
//! own heap. Everything the viewer needs from it is described by
//! [`GeometryEngine`]; the browser bindings implement it over the web-ifc
//! module, tests implement it over a [`SharedHeap`](crate::SharedHeap).

use crate::error::Result;
use crate::memory::{BufferHandle, ForeignBuffers};
use std::fmt;

/// Opaque model identifier issued by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelHandle(pub u32);

impl fmt::Display for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// RGBA color with components in 0..1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }
}

/// One occurrence of a base geometry with its own transform and color
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedGeometry {
    /// Express ID of the geometry, resolved with [`GeometryEngine::get_geometry`]
    pub geometry_express_id: u32,
    /// 4x4 transform as emitted by the engine, translation at 12..15
    pub flat_transformation: [f64; 16],
    pub color: Color,
}

/// Placed geometries of one element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatMesh {
    /// Express ID of the element
    pub express_id: u32,
    pub geometries: Vec<PlacedGeometry>,
}

/// Where a geometry's buffers live in the engine heap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryData {
    pub vertex_data: BufferHandle,
    pub index_data: BufferHandle,
}

/// Capability set required from the external geometry engine
pub trait GeometryEngine: ForeignBuffers {
    /// Open a complete model file
    fn open_model(&mut self, name: &str, data: &[u8]) -> Result<ModelHandle>;

    /// Open a single streamed fragment ("tape data")
    fn open_model_from_tape(&mut self, data: &[u8]) -> Result<ModelHandle>;

    /// Release a model; each open must be matched by exactly one close
    fn close_model(&mut self, model: ModelHandle) -> Result<()>;

    /// All flattened meshes of a model, in engine order
    fn load_all_geometry(&mut self, model: ModelHandle) -> Result<Vec<FlatMesh>>;

    /// Resolve a geometry reference to its buffers
    fn get_geometry(&mut self, model: ModelHandle, geometry_express_id: u32)
        -> Result<GeometryData>;

    /// Monotonic clock in milliseconds
    fn now_ms(&self) -> f64;
}
