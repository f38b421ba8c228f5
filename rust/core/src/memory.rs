// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Buffer extraction from a foreign heap
//!
//! The geometry engine reports vertex and index data as byte offsets into its
//! own linear memory. That memory is reused by later engine calls, so data is
//! copied out immediately into owned buffers. Callers never see raw
//! addresses: they pass a [`BufferHandle`] to a [`ForeignBuffers`]
//! implementation and get an owned `Vec` back.

use crate::error::{Error, Result};
use std::ops::Range;

/// Width in bytes of every element the engine exposes (f32 and u32)
pub const ELEMENT_BYTES: usize = 4;

/// Location of a typed buffer inside the engine heap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle {
    /// Byte offset reported by the engine
    pub offset_bytes: usize,
    /// Number of 4-byte elements
    pub len: usize,
}

impl BufferHandle {
    #[inline]
    pub fn new(offset_bytes: usize, len: usize) -> Self {
        Self { offset_bytes, len }
    }

    /// Element range addressed by this handle in a view of `available` elements
    pub fn element_range(&self, available: usize) -> Result<Range<usize>> {
        if self.offset_bytes % ELEMENT_BYTES != 0 {
            return Err(Error::MisalignedOffset(self.offset_bytes));
        }
        let start = self.offset_bytes / ELEMENT_BYTES;
        let end = start.checked_add(self.len).ok_or(Error::BufferOutOfRange {
            start,
            end: usize::MAX,
            available,
        })?;
        if end > available {
            return Err(Error::BufferOutOfRange {
                start,
                end,
                available,
            });
        }
        Ok(start..end)
    }
}

/// Copy `handle.len` elements starting at `handle.offset_bytes / 4` out of `view`.
///
/// The returned buffer is independent of `view`.
pub fn extract<T: Copy>(view: &[T], handle: BufferHandle) -> Result<Vec<T>> {
    let range = handle.element_range(view.len())?;
    Ok(view[range].to_vec())
}

/// Copy-out capability over an engine's heap
pub trait ForeignBuffers {
    /// Copy a float range (vertex data)
    fn copy_f32(&self, handle: BufferHandle) -> Result<Vec<f32>>;

    /// Copy an unsigned range (index data)
    fn copy_u32(&self, handle: BufferHandle) -> Result<Vec<u32>>;
}

/// Linear memory with float and unsigned views over the same words.
///
/// Native stand-in for an Emscripten heap (`HEAPF32` / `HEAPU32`).
#[derive(Debug, Clone, Default)]
pub struct SharedHeap {
    words: Vec<u32>,
}

impl SharedHeap {
    /// Allocate a zeroed heap of `len` words
    pub fn with_len(len: usize) -> Self {
        Self {
            words: vec![0; len],
        }
    }

    /// Size in bytes
    pub fn byte_len(&self) -> usize {
        self.words.len() * ELEMENT_BYTES
    }

    pub fn as_f32(&self) -> &[f32] {
        bytemuck::cast_slice(&self.words[..])
    }

    pub fn as_u32(&self) -> &[u32] {
        &self.words
    }

    pub fn as_f32_mut(&mut self) -> &mut [f32] {
        bytemuck::cast_slice_mut(&mut self.words[..])
    }

    pub fn as_u32_mut(&mut self) -> &mut [u32] {
        &mut self.words
    }

    /// Append floats and return the handle addressing them
    pub fn push_f32(&mut self, values: &[f32]) -> BufferHandle {
        let handle = BufferHandle::new(self.byte_len(), values.len());
        self.words.extend(values.iter().map(|v| v.to_bits()));
        handle
    }

    /// Append unsigned values and return the handle addressing them
    pub fn push_u32(&mut self, values: &[u32]) -> BufferHandle {
        let handle = BufferHandle::new(self.byte_len(), values.len());
        self.words.extend_from_slice(values);
        handle
    }
}

impl ForeignBuffers for SharedHeap {
    fn copy_f32(&self, handle: BufferHandle) -> Result<Vec<f32>> {
        extract(self.as_f32(), handle)
    }

    fn copy_u32(&self, handle: BufferHandle) -> Result<Vec<u32>> {
        extract(self.as_u32(), handle)
    }
}
