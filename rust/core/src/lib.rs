// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC-Stream Core
//!
//! Incremental assembly of IFC geometry produced by an external geometry
//! engine. The engine parses the model and tessellates it; this crate copies
//! the resulting buffers out of the engine's heap, builds renderable meshes,
//! places them, and streams model fragments one at a time from a server.
//!
//! ## Overview
//!
//! - **Buffer extraction** ([`memory`]): copy typed ranges out of a foreign heap
//! - **Mesh assembly** ([`geometry`]): interleaved position/normal buffers
//! - **Placement** ([`placement`]): per-instance transform and material
//! - **Scene** ([`scene`]): node container with a per-model registry
//! - **Loading** ([`loader`]): drive the pipeline for one open model
//! - **Streaming** ([`streaming`]): fetch, open, load and close fragments
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ifc_stream_core::{StreamingController, ViewerConfig, CancellationToken};
//!
//! let config = ViewerConfig::from_env();
//! let controller = StreamingController::new(engine, fetcher, pacer, config);
//!
//! controller.stream_one(563782).await?;
//! let summary = controller.stream_all(&[100, 200], &CancellationToken::new()).await;
//! println!("{} bytes downloaded", controller.total_downloaded());
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
#[cfg(feature = "native")]
pub mod http;
pub mod loader;
pub mod memory;
pub mod placement;
pub mod scene;
pub mod streaming;

pub use config::ViewerConfig;
pub use engine::{Color, FlatMesh, GeometryData, GeometryEngine, ModelHandle, PlacedGeometry};
pub use error::{Error, Result};
pub use geometry::{build_mesh, IndexBuffer, InterleavedAttribute, MeshBuffer, VertexBuffer};
#[cfg(feature = "native")]
pub use http::{HttpFetcher, TokioPacer};
pub use loader::{load_all_geometry, LoadStats};
pub use memory::{extract, BufferHandle, ForeignBuffers, SharedHeap};
pub use placement::{apply_placement, Material, SceneNode, UNIT_SCALE};
pub use scene::{NodeId, Scene};
pub use streaming::{
    parse_express_id, CancellationToken, DownloadCounter, Fetcher, FragmentReport, Pacer,
    StreamSummary, StreamToggle, StreamingController, Toggle,
};
