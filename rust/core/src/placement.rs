// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-instance placement and material

use crate::engine::{Color, ModelHandle};
use crate::geometry::MeshBuffer;

/// Engine translations are in millimeters, the scene is in meters
pub const UNIT_SCALE: f64 = 0.001;

/// Indices of the translation components in the flat transform
const TRANSLATION: [usize; 3] = [12, 13, 14];

/// Phong-style material derived from an instance color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: [f32; 3],
    pub transparent: bool,
    pub opacity: f32,
}

impl Material {
    /// Any alpha other than exactly 1 makes the material transparent
    pub fn from_color(color: Color) -> Self {
        #[allow(clippy::float_cmp)]
        let opaque = color.a == 1.0;
        if opaque {
            Self {
                color: color.rgb(),
                transparent: false,
                opacity: 1.0,
            }
        } else {
            Self {
                color: color.rgb(),
                transparent: true,
                opacity: color.a,
            }
        }
    }
}

/// Positioned, colored mesh ready for the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    /// Model that produced the node
    pub model: ModelHandle,
    /// Element express ID (flat mesh)
    pub express_id: u32,
    /// Geometry express ID of the placed instance
    pub geometry_express_id: u32,
    pub mesh: MeshBuffer,
    pub material: Material,
    /// Flat 4x4 matrix, translation already in scene units
    pub matrix: [f64; 16],
    /// Engine bounding volumes are unreliable; always false
    pub frustum_culled: bool,
    /// The explicit matrix is authoritative; always false
    pub matrix_auto_update: bool,
}

impl SceneNode {
    /// Translation in scene units
    pub fn translation(&self) -> [f64; 3] {
        TRANSLATION.map(|i| self.matrix[i])
    }
}

/// Scale the translation of a flat transform into scene units
pub fn scale_translation(mut transform: [f64; 16]) -> [f64; 16] {
    for i in TRANSLATION {
        transform[i] *= UNIT_SCALE;
    }
    transform
}

/// Apply an instance transform and color to a mesh.
///
/// The caller inserts the node into the scene.
pub fn apply_placement(
    model: ModelHandle,
    express_id: u32,
    geometry_express_id: u32,
    mesh: MeshBuffer,
    transform: [f64; 16],
    color: Color,
) -> SceneNode {
    SceneNode {
        model,
        express_id,
        geometry_express_id,
        mesh,
        material: Material::from_color(color),
        matrix: scale_translation(transform),
        frustum_culled: false,
        matrix_auto_update: false,
    }
}
