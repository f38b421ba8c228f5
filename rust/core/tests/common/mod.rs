// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Test doubles for the geometry engine, the fetcher and the pacer

#![allow(dead_code)]

use ifc_stream_core::{
    BufferHandle, CancellationToken, Color, Error, Fetcher, FlatMesh, ForeignBuffers,
    GeometryData, GeometryEngine, ModelHandle, Pacer, PlacedGeometry, Result, SharedHeap,
};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::time::Duration;

/// Engine over a [`SharedHeap`] returning canned flat meshes
#[derive(Default)]
pub struct MockEngine {
    pub heap: SharedHeap,
    pub geometries: HashMap<u32, GeometryData>,
    /// Meshes returned for models opened with `open_model`
    pub file_meshes: Vec<FlatMesh>,
    /// Meshes returned for models opened from tape data
    pub tape_meshes: Vec<FlatMesh>,
    tape_models: HashSet<u32>,
    pub open_models: HashSet<u32>,
    pub opens: usize,
    pub closes: usize,
    pub copies: Cell<usize>,
    next_handle: u32,
    clock: Cell<f64>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a geometry whose buffers live in the heap
    pub fn add_geometry(&mut self, express_id: u32, vertices: &[f32], indices: &[u32]) {
        let vertex_data = self.heap.push_f32(vertices);
        let index_data = self.heap.push_u32(indices);
        self.geometries.insert(
            express_id,
            GeometryData {
                vertex_data,
                index_data,
            },
        );
    }

    fn open(&mut self, tape: bool) -> ModelHandle {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.opens += 1;
        self.open_models.insert(handle);
        if tape {
            self.tape_models.insert(handle);
        }
        ModelHandle(handle)
    }
}

impl ForeignBuffers for MockEngine {
    fn copy_f32(&self, handle: BufferHandle) -> Result<Vec<f32>> {
        self.copies.set(self.copies.get() + 1);
        self.heap.copy_f32(handle)
    }

    fn copy_u32(&self, handle: BufferHandle) -> Result<Vec<u32>> {
        self.copies.set(self.copies.get() + 1);
        self.heap.copy_u32(handle)
    }
}

impl GeometryEngine for MockEngine {
    fn open_model(&mut self, _name: &str, data: &[u8]) -> Result<ModelHandle> {
        if data.is_empty() {
            return Err(Error::ModelOpen("empty file".into()));
        }
        Ok(self.open(false))
    }

    fn open_model_from_tape(&mut self, _data: &[u8]) -> Result<ModelHandle> {
        Ok(self.open(true))
    }

    fn close_model(&mut self, model: ModelHandle) -> Result<()> {
        if !self.open_models.remove(&model.0) {
            return Err(Error::InvalidModelHandle(model.0));
        }
        self.tape_models.remove(&model.0);
        self.closes += 1;
        Ok(())
    }

    fn load_all_geometry(&mut self, model: ModelHandle) -> Result<Vec<FlatMesh>> {
        if !self.open_models.contains(&model.0) {
            return Err(Error::InvalidModelHandle(model.0));
        }
        if self.tape_models.contains(&model.0) {
            Ok(self.tape_meshes.clone())
        } else {
            Ok(self.file_meshes.clone())
        }
    }

    fn get_geometry(&mut self, model: ModelHandle, geometry_express_id: u32) -> Result<GeometryData> {
        self.geometries
            .get(&geometry_express_id)
            .copied()
            .ok_or(Error::GeometryNotFound {
                model: model.0,
                geometry: geometry_express_id,
            })
    }

    fn now_ms(&self) -> f64 {
        let t = self.clock.get() + 1.0;
        self.clock.set(t);
        t
    }
}

pub fn identity_with_translation(x: f64, y: f64, z: f64) -> [f64; 16] {
    [
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        x, y, z, 1.0,
    ]
}

pub fn placed(geometry_express_id: u32, translation: [f64; 3], color: Color) -> PlacedGeometry {
    PlacedGeometry {
        geometry_express_id,
        flat_transformation: identity_with_translation(
            translation[0],
            translation[1],
            translation[2],
        ),
        color,
    }
}

/// One triangle with +Z normals, interleaved
pub fn triangle() -> (Vec<f32>, Vec<u32>) {
    #[rustfmt::skip]
    let vertices = vec![
        0.0, 0.0, 0.0,  0.0, 0.0, 1.0,
        1.0, 0.0, 0.0,  0.0, 0.0, 1.0,
        0.0, 1.0, 0.0,  0.0, 0.0, 1.0,
    ];
    (vertices, vec![0, 1, 2])
}

/// What happened, in order, across fetcher and pacer
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    FetchStart(u32),
    FetchEnd(u32),
    Pause(Duration),
}

pub type EventLog = Rc<RefCell<Vec<Event>>>;

/// Fetcher serving canned bodies, tracking in-flight requests
pub struct MockFetcher {
    pub bodies: HashMap<u32, Vec<u8>>,
    pub default_len: usize,
    pub failing: HashSet<u32>,
    pub log: EventLog,
    in_flight: Rc<Cell<usize>>,
    pub max_in_flight: Rc<Cell<usize>>,
}

impl MockFetcher {
    pub fn new(default_len: usize, log: EventLog) -> Self {
        Self {
            bodies: HashMap::new(),
            default_len,
            failing: HashSet::new(),
            log,
            in_flight: Rc::new(Cell::new(0)),
            max_in_flight: Rc::new(Cell::new(0)),
        }
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, express_id: u32) -> Result<Vec<u8>> {
        self.log.borrow_mut().push(Event::FetchStart(express_id));
        self.in_flight.set(self.in_flight.get() + 1);
        self.max_in_flight
            .set(self.max_in_flight.get().max(self.in_flight.get()));

        tokio::task::yield_now().await;

        self.in_flight.set(self.in_flight.get() - 1);
        self.log.borrow_mut().push(Event::FetchEnd(express_id));

        if self.failing.contains(&express_id) {
            return Err(Error::Network {
                express_id,
                message: "connection refused".into(),
            });
        }
        Ok(self
            .bodies
            .get(&express_id)
            .cloned()
            .unwrap_or_else(|| vec![0xAB; self.default_len]))
    }
}

/// Pacer that records pauses and can cancel a token on the first one
pub struct RecordingPacer {
    pub log: EventLog,
    pub cancel_on_pause: Option<CancellationToken>,
}

impl RecordingPacer {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            cancel_on_pause: None,
        }
    }
}

impl Pacer for RecordingPacer {
    async fn pause(&self, delay: Duration) {
        self.log.borrow_mut().push(Event::Pause(delay));
        if let Some(token) = &self.cancel_on_pause {
            token.cancel();
        }
    }
}
