// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scene nodes handed to the JavaScript renderer
//!
//! Each node carries everything a three.js `Mesh` needs: the interleaved
//! vertex buffer (stride 6, position at 0, normal at 3), the index buffer,
//! the placement matrix and the material settings.

use ifc_stream_core::{NodeId, SceneNode};
use wasm_bindgen::prelude::*;

/// One placed mesh (copied out of the scene)
#[wasm_bindgen]
pub struct SceneNodeJs {
    id: NodeId,
    model_id: u32,
    express_id: u32,
    geometry_express_id: u32,
    vertices: Vec<f32>,
    indices: Vec<u32>,
    matrix: [f64; 16],
    color: [f32; 3],
    transparent: bool,
    opacity: f32,
    frustum_culled: bool,
    matrix_auto_update: bool,
}

#[wasm_bindgen]
impl SceneNodeJs {
    /// Node id; pass `id + 1` to `nodesFrom` to continue after this node
    #[wasm_bindgen(getter)]
    pub fn id(&self) -> f64 {
        self.id as f64
    }

    #[wasm_bindgen(getter, js_name = modelId)]
    pub fn model_id(&self) -> u32 {
        self.model_id
    }

    #[wasm_bindgen(getter, js_name = expressId)]
    pub fn express_id(&self) -> u32 {
        self.express_id
    }

    #[wasm_bindgen(getter, js_name = geometryExpressId)]
    pub fn geometry_express_id(&self) -> u32 {
        self.geometry_express_id
    }

    /// Interleaved position/normal records as Float32Array (copy to JS)
    #[wasm_bindgen(getter)]
    pub fn vertices(&self) -> js_sys::Float32Array {
        js_sys::Float32Array::from(&self.vertices[..])
    }

    /// Floats per vertex record
    #[wasm_bindgen(getter)]
    pub fn stride(&self) -> usize {
        ifc_stream_core::geometry::VERTEX_STRIDE
    }

    /// Triangle indices as Uint32Array (copy to JS)
    #[wasm_bindgen(getter)]
    pub fn indices(&self) -> js_sys::Uint32Array {
        js_sys::Uint32Array::from(&self.indices[..])
    }

    /// Placement matrix, translation in meters, for `Matrix4.fromArray`
    #[wasm_bindgen(getter)]
    pub fn matrix(&self) -> js_sys::Float64Array {
        js_sys::Float64Array::from(&self.matrix[..])
    }

    /// Material color as [r, g, b]
    #[wasm_bindgen(getter)]
    pub fn color(&self) -> Vec<f32> {
        self.color.to_vec()
    }

    #[wasm_bindgen(getter)]
    pub fn transparent(&self) -> bool {
        self.transparent
    }

    #[wasm_bindgen(getter)]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    #[wasm_bindgen(getter, js_name = frustumCulled)]
    pub fn frustum_culled(&self) -> bool {
        self.frustum_culled
    }

    #[wasm_bindgen(getter, js_name = matrixAutoUpdate)]
    pub fn matrix_auto_update(&self) -> bool {
        self.matrix_auto_update
    }

    #[wasm_bindgen(getter, js_name = vertexCount)]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / ifc_stream_core::geometry::VERTEX_STRIDE
    }

    #[wasm_bindgen(getter, js_name = triangleCount)]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

impl SceneNodeJs {
    pub fn new(id: NodeId, node: &SceneNode) -> Self {
        Self {
            id,
            model_id: node.model.0,
            express_id: node.express_id,
            geometry_express_id: node.geometry_express_id,
            vertices: node.mesh.vertices().to_vec(),
            indices: node.mesh.indices().to_vec(),
            matrix: node.matrix,
            color: node.material.color,
            transparent: node.material.transparent,
            opacity: node.material.opacity,
            frustum_culled: node.frustum_culled,
            matrix_auto_update: node.matrix_auto_update,
        }
    }
}

/// Node ids as plain JS numbers
pub(crate) fn ids_to_js(ids: &[NodeId]) -> Vec<f64> {
    ids.iter().map(|&id| id as f64).collect()
}
