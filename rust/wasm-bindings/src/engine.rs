// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! web-ifc as the geometry engine
//!
//! Model lifetime, flattened mesh loading and the clock go through the
//! `IfcAPI` object; tape loading, geometry lookup and the heaps are only
//! exposed on the Emscripten `Module` it wraps.
//!
//! Geometry buffers live in the module's heap and are addressed by byte
//! offsets. They are copied out through `HEAPF32` / `HEAPU32` right after the
//! geometry is resolved, before any other engine call can reuse the memory.

use ifc_stream_core::{
    BufferHandle, Color, Error, FlatMesh, ForeignBuffers, GeometryData, GeometryEngine,
    ModelHandle, PlacedGeometry, Result,
};
use js_sys::{Float32Array, Float64Array, Uint32Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

#[wasm_bindgen]
extern "C" {
    /// The web-ifc `IfcAPI` object, already bound to its module
    pub type IfcApi;

    #[wasm_bindgen(method, catch, js_name = OpenModel)]
    fn open_model(this: &IfcApi, name: &str, data: &[u8]) -> std::result::Result<u32, JsValue>;

    #[wasm_bindgen(method, catch, js_name = CloseModel)]
    fn close_model(this: &IfcApi, model_id: u32) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = LoadAllGeometry)]
    fn load_all_geometry(this: &IfcApi, model_id: u32) -> std::result::Result<EmVector, JsValue>;

    #[wasm_bindgen(method)]
    fn ms(this: &IfcApi) -> f64;

    /// The web-ifc Emscripten `Module`
    pub type WebIfcModule;

    #[wasm_bindgen(method, catch, js_name = OpenModelFromTapeData)]
    fn open_model_from_tape_data(this: &WebIfcModule, data: &[u8]) -> std::result::Result<u32, JsValue>;

    #[wasm_bindgen(method, catch, js_name = GetGeometry)]
    fn get_geometry(
        this: &WebIfcModule,
        model_id: u32,
        geometry_express_id: u32,
    ) -> std::result::Result<IfcGeometry, JsValue>;

    #[wasm_bindgen(method, getter, js_name = HEAPF32)]
    fn heap_f32(this: &WebIfcModule) -> Float32Array;

    #[wasm_bindgen(method, getter, js_name = HEAPU32)]
    fn heap_u32(this: &WebIfcModule) -> Uint32Array;

    /// Embind `std::vector` wrapper
    pub type EmVector;

    #[wasm_bindgen(method)]
    fn size(this: &EmVector) -> u32;

    #[wasm_bindgen(method)]
    fn get(this: &EmVector, index: u32) -> JsValue;

    pub type FlatMeshJs;

    #[wasm_bindgen(method, getter, js_name = expressID)]
    fn express_id(this: &FlatMeshJs) -> u32;

    #[wasm_bindgen(method, getter)]
    fn geometries(this: &FlatMeshJs) -> EmVector;

    pub type PlacedGeometryJs;

    #[wasm_bindgen(method, getter, js_name = geometryExpressID)]
    fn geometry_express_id(this: &PlacedGeometryJs) -> u32;

    #[wasm_bindgen(method, getter, js_name = flatTransformation)]
    fn flat_transformation(this: &PlacedGeometryJs) -> JsValue;

    #[wasm_bindgen(method, getter)]
    fn color(this: &PlacedGeometryJs) -> ColorJs;

    pub type ColorJs;

    #[wasm_bindgen(method, getter)]
    fn x(this: &ColorJs) -> f64;
    #[wasm_bindgen(method, getter)]
    fn y(this: &ColorJs) -> f64;
    #[wasm_bindgen(method, getter)]
    fn z(this: &ColorJs) -> f64;
    #[wasm_bindgen(method, getter)]
    fn w(this: &ColorJs) -> f64;

    pub type IfcGeometry;

    #[wasm_bindgen(method, js_name = GetVertexData)]
    fn vertex_data(this: &IfcGeometry) -> u32;

    #[wasm_bindgen(method, js_name = GetVertexDataSize)]
    fn vertex_data_size(this: &IfcGeometry) -> u32;

    #[wasm_bindgen(method, js_name = GetIndexData)]
    fn index_data(this: &IfcGeometry) -> u32;

    #[wasm_bindgen(method, js_name = GetIndexDataSize)]
    fn index_data_size(this: &IfcGeometry) -> u32;
}

/// Best-effort message from a thrown JS value
pub(crate) fn js_message(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    format!("{:?}", value)
}

fn engine_error(value: JsValue) -> Error {
    Error::Engine(js_message(&value))
}

/// Copy a float range out of a heap view
pub fn copy_out_f32(heap: &Float32Array, handle: BufferHandle) -> Result<Vec<f32>> {
    let range = handle.element_range(heap.length() as usize)?;
    Ok(heap.subarray(range.start as u32, range.end as u32).to_vec())
}

/// Copy an unsigned range out of a heap view
pub fn copy_out_u32(heap: &Uint32Array, handle: BufferHandle) -> Result<Vec<u32>> {
    let range = handle.element_range(heap.length() as usize)?;
    Ok(heap.subarray(range.start as u32, range.end as u32).to_vec())
}

/// Read a 16-element transform from a JS array, typed array or embind vector
pub fn read_transform(value: &JsValue) -> Result<[f64; 16]> {
    let values: Vec<f64> = if js_sys::Array::is_array(value) || value.is_instance_of::<Float64Array>()
    {
        Float64Array::new(value).to_vec()
    } else {
        let vector: &EmVector = value.unchecked_ref();
        (0..vector.size())
            .map(|i| vector.get(i).as_f64())
            .collect::<Option<Vec<f64>>>()
            .ok_or_else(|| Error::Engine("transform contains a non-number".into()))?
    };

    <[f64; 16]>::try_from(values.as_slice())
        .map_err(|_| Error::Engine(format!("transform has {} elements, expected 16", values.len())))
}

fn read_color(color: &ColorJs) -> Color {
    Color::new(
        color.x() as f32,
        color.y() as f32,
        color.z() as f32,
        color.w() as f32,
    )
}

/// [`GeometryEngine`] over web-ifc
pub struct WebIfcEngine {
    api: IfcApi,
    module: WebIfcModule,
}

impl WebIfcEngine {
    pub fn new(api: IfcApi, module: WebIfcModule) -> Self {
        Self { api, module }
    }
}

impl ForeignBuffers for WebIfcEngine {
    fn copy_f32(&self, handle: BufferHandle) -> Result<Vec<f32>> {
        copy_out_f32(&self.module.heap_f32(), handle)
    }

    fn copy_u32(&self, handle: BufferHandle) -> Result<Vec<u32>> {
        copy_out_u32(&self.module.heap_u32(), handle)
    }
}

impl GeometryEngine for WebIfcEngine {
    fn open_model(&mut self, name: &str, data: &[u8]) -> Result<ModelHandle> {
        self.api
            .open_model(name, data)
            .map(ModelHandle)
            .map_err(|e| Error::ModelOpen(js_message(&e)))
    }

    fn open_model_from_tape(&mut self, data: &[u8]) -> Result<ModelHandle> {
        self.module
            .open_model_from_tape_data(data)
            .map(ModelHandle)
            .map_err(|e| Error::ModelOpen(js_message(&e)))
    }

    fn close_model(&mut self, model: ModelHandle) -> Result<()> {
        self.api.close_model(model.0).map_err(engine_error)
    }

    fn load_all_geometry(&mut self, model: ModelHandle) -> Result<Vec<FlatMesh>> {
        let meshes = self.api.load_all_geometry(model.0).map_err(engine_error)?;
        let mut flat_meshes = Vec::with_capacity(meshes.size() as usize);

        for i in 0..meshes.size() {
            let mesh: FlatMeshJs = meshes.get(i).unchecked_into();
            let placed = mesh.geometries();
            let mut geometries = Vec::with_capacity(placed.size() as usize);

            for j in 0..placed.size() {
                let geometry: PlacedGeometryJs = placed.get(j).unchecked_into();
                geometries.push(PlacedGeometry {
                    geometry_express_id: geometry.geometry_express_id(),
                    flat_transformation: read_transform(&geometry.flat_transformation())?,
                    color: read_color(&geometry.color()),
                });
            }

            flat_meshes.push(FlatMesh {
                express_id: mesh.express_id(),
                geometries,
            });
        }

        Ok(flat_meshes)
    }

    fn get_geometry(&mut self, model: ModelHandle, geometry_express_id: u32) -> Result<GeometryData> {
        let geometry = self
            .module
            .get_geometry(model.0, geometry_express_id)
            .map_err(|_| Error::GeometryNotFound {
                model: model.0,
                geometry: geometry_express_id,
            })?;

        Ok(GeometryData {
            vertex_data: BufferHandle::new(
                geometry.vertex_data() as usize,
                geometry.vertex_data_size() as usize,
            ),
            index_data: BufferHandle::new(
                geometry.index_data() as usize,
                geometry.index_data_size() as usize,
            ),
        })
    }

    fn now_ms(&self) -> f64 {
        self.api.ms()
    }
}
