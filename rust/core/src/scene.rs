// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scene node container
//!
//! Loads only ever append. Nodes are registered under the model handle that
//! produced them so a model can be evicted explicitly; nothing is replaced or
//! deduplicated implicitly. Node ids grow monotonically, which lets a renderer
//! pull "everything after the last id I saw".

use crate::engine::ModelHandle;
use crate::placement::SceneNode;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Identifier of a node in the scene
pub type NodeId = u64;

#[derive(Debug, Default)]
pub struct Scene {
    nodes: BTreeMap<NodeId, SceneNode>,
    by_model: FxHashMap<ModelHandle, Vec<NodeId>>,
    next_id: NodeId,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node and return its id
    pub fn insert(&mut self, node: SceneNode) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        self.by_model.entry(node.model).or_default().push(id);
        self.nodes.insert(id, node);
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    /// Nodes with an id of at least `cursor`, in insertion order
    pub fn nodes_from(&self, cursor: NodeId) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.range(cursor..).map(|(id, node)| (*id, node))
    }

    /// Id the next inserted node will receive
    pub fn next_id(&self) -> NodeId {
        self.next_id
    }

    /// Ids of the nodes produced by `model`
    pub fn model_nodes(&self, model: ModelHandle) -> &[NodeId] {
        self.by_model.get(&model).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Evict every node produced by `model`, returning the removed ids
    pub fn remove_model(&mut self, model: ModelHandle) -> Vec<NodeId> {
        let ids = self.by_model.remove(&model).unwrap_or_default();
        for id in &ids {
            self.nodes.remove(id);
        }
        ids
    }

    /// Remove all nodes, returning the removed ids. Ids are not reused.
    pub fn clear(&mut self) -> Vec<NodeId> {
        self.by_model.clear();
        let ids = self.nodes.keys().copied().collect();
        self.nodes.clear();
        ids
    }
}
