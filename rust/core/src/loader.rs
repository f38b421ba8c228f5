// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model loading: engine meshes to scene nodes

use crate::engine::{GeometryEngine, ModelHandle};
use crate::error::Result;
use crate::geometry::build_mesh;
use crate::placement::apply_placement;
use crate::scene::Scene;

/// Counters and timings for one model load
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoadStats {
    pub flat_meshes: usize,
    pub placed_geometries: usize,
    pub vertices: usize,
    pub triangles: usize,
    /// Time spent in the engine producing flat meshes
    pub geometry_ms: f64,
    /// Time spent extracting, assembling and placing
    pub upload_ms: f64,
}

/// Turn every placed geometry of `model` into a scene node.
///
/// Instances are processed in engine order. Each instance extracts and
/// assembles its geometry again, even when the reference was seen before.
/// On error, nodes inserted so far stay in the scene.
pub fn load_all_geometry<E: GeometryEngine + ?Sized>(
    engine: &mut E,
    scene: &mut Scene,
    model: ModelHandle,
) -> Result<LoadStats> {
    let start_geom = engine.now_ms();
    let flat_meshes = engine.load_all_geometry(model)?;
    let end_geom = engine.now_ms();
    tracing::debug!(model = %model, count = flat_meshes.len(), "Loaded flat meshes");

    let mut stats = LoadStats {
        flat_meshes: flat_meshes.len(),
        ..Default::default()
    };

    for flat_mesh in &flat_meshes {
        for placed in &flat_mesh.geometries {
            let geometry = engine.get_geometry(model, placed.geometry_express_id)?;
            let vertices = engine.copy_f32(geometry.vertex_data)?;
            let indices = engine.copy_u32(geometry.index_data)?;
            let mesh = build_mesh(vertices.into(), indices.into());

            stats.placed_geometries += 1;
            stats.vertices += mesh.vertex_count();
            stats.triangles += mesh.triangle_count();

            let node = apply_placement(
                model,
                flat_mesh.express_id,
                placed.geometry_express_id,
                mesh,
                placed.flat_transformation,
                placed.color,
            );
            scene.insert(node);
        }
    }

    let end_upload = engine.now_ms();
    stats.geometry_ms = end_geom - start_geom;
    stats.upload_ms = end_upload - end_geom;

    tracing::info!(
        model = %model,
        flat_meshes = stats.flat_meshes,
        placed_geometries = stats.placed_geometries,
        geometry_ms = stats.geometry_ms,
        upload_ms = stats.upload_ms,
        "Loaded model geometry"
    );

    Ok(stats)
}
