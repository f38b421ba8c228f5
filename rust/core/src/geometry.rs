// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh buffer assembly
//!
//! The engine emits vertices as interleaved records of six floats:
//! position (x, y, z) followed by normal (nx, ny, nz). Indices form a plain
//! triangle list.

/// Floats per interleaved vertex record
pub const VERTEX_STRIDE: usize = 6;

/// Owned interleaved vertex data copied out of the engine heap
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexBuffer(pub Vec<f32>);

/// Owned triangle-list indices copied out of the engine heap
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexBuffer(pub Vec<u32>);

impl From<Vec<f32>> for VertexBuffer {
    fn from(data: Vec<f32>) -> Self {
        Self(data)
    }
}

impl From<Vec<u32>> for IndexBuffer {
    fn from(data: Vec<u32>) -> Self {
        Self(data)
    }
}

/// View of one attribute inside the interleaved record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterleavedAttribute {
    pub name: &'static str,
    /// Components per vertex
    pub item_size: usize,
    /// Offset in floats from the start of the record
    pub offset: usize,
}

pub const POSITION: InterleavedAttribute = InterleavedAttribute {
    name: "position",
    item_size: 3,
    offset: 0,
};

pub const NORMAL: InterleavedAttribute = InterleavedAttribute {
    name: "normal",
    item_size: 3,
    offset: 3,
};

/// Renderable mesh: interleaved vertex records plus an index list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffer {
    vertices: Vec<f32>,
    indices: Vec<u32>,
}

/// Build a mesh from an interleaved vertex buffer and a triangle-list index buffer.
///
/// Indices are taken verbatim; they are not checked against the vertex count.
pub fn build_mesh(vertices: VertexBuffer, indices: IndexBuffer) -> MeshBuffer {
    MeshBuffer {
        vertices: vertices.0,
        indices: indices.0,
    }
}

impl MeshBuffer {
    /// Attributes laid out in each record
    pub fn attributes(&self) -> [InterleavedAttribute; 2] {
        [POSITION, NORMAL]
    }

    #[inline]
    pub fn stride(&self) -> usize {
        VERTEX_STRIDE
    }

    /// Raw interleaved data
    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of complete vertex records
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_STRIDE
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    /// Read one attribute of vertex `index`
    pub fn attribute(&self, attr: InterleavedAttribute, index: usize) -> Option<[f32; 3]> {
        let base = index.checked_mul(VERTEX_STRIDE)?.checked_add(attr.offset)?;
        let end = base.checked_add(attr.item_size)?;
        let slice = self.vertices.get(base..end)?;
        Some([slice[0], slice[1], slice[2]])
    }

    pub fn position(&self, index: usize) -> Option<[f32; 3]> {
        self.attribute(POSITION, index)
    }

    pub fn normal(&self, index: usize) -> Option<[f32; 3]> {
        self.attribute(NORMAL, index)
    }

    /// Iterate positions of all complete records
    pub fn positions(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.vertices
            .chunks_exact(VERTEX_STRIDE)
            .map(|r| [r[0], r[1], r[2]])
    }

    /// Iterate normals of all complete records
    pub fn normals(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.vertices
            .chunks_exact(VERTEX_STRIDE)
            .map(|r| [r[3], r[4], r[5]])
    }

    /// Consume into the interleaved data and indices
    pub fn into_parts(self) -> (Vec<f32>, Vec<u32>) {
        (self.vertices, self.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> MeshBuffer {
        #[rustfmt::skip]
        let vertices = vec![
            0.0, 0.0, 0.0,  0.0, 0.0, 1.0,
            1.0, 0.0, 0.0,  0.0, 0.0, 1.0,
            1.0, 1.0, 0.0,  0.0, 0.0, 1.0,
            0.0, 1.0, 0.0,  0.0, 0.0, 1.0,
        ];
        build_mesh(vertices.into(), vec![0, 1, 2, 0, 2, 3].into())
    }

    #[test]
    fn test_interleaved_layout() {
        let mesh = quad();
        assert_eq!(mesh.stride(), 6);
        assert_eq!(mesh.attributes()[0].offset, 0);
        assert_eq!(mesh.attributes()[1].offset, 3);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_position_and_normal_accessors() {
        let mesh = quad();
        assert_eq!(mesh.position(2), Some([1.0, 1.0, 0.0]));
        assert_eq!(mesh.normal(2), Some([0.0, 0.0, 1.0]));
        assert_eq!(mesh.position(4), None);

        let xs: Vec<f32> = mesh.positions().map(|p| p[0]).collect();
        assert_eq!(xs, vec![0.0, 1.0, 1.0, 0.0]);
        assert!(mesh.normals().all(|n| n == [0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_huge_vertex_index_returns_none() {
        let mesh = build_mesh(vec![0.0; 6].into(), vec![0, 0, 0].into());
        assert_eq!(mesh.normal(usize::MAX / 6), None);
        assert_eq!(mesh.position(usize::MAX / 6), None);
        assert_eq!(mesh.normal(usize::MAX), None);
    }

    #[test]
    fn test_indices_taken_verbatim() {
        // Out-of-range indices are the renderer's concern
        let mesh = build_mesh(vec![0.0; 6].into(), vec![0, 7, 42].into());
        assert_eq!(mesh.indices(), &[0, 7, 42]);
        assert_eq!(mesh.vertex_count(), 1);
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = build_mesh(VertexBuffer::default(), IndexBuffer::default());
        assert!(mesh.is_empty());
        assert_eq!(mesh.positions().count(), 0);
    }
}
