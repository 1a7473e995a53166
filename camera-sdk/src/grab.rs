// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::pixel::PixelType;
use kanal::{Receiver, Sender};
use std::ops::{Deref, DerefMut};

/// Recycling pool of frame buffers owned by a device.
///
/// Buffers travel back to the pool through a bounded channel when their
/// [`PooledBuffer`] is dropped. A full pool simply frees the allocation.
#[derive(Clone)]
pub struct BufferPool {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
}

impl BufferPool {
    pub fn new(depth: usize) -> Self {
        let (tx, rx) = kanal::bounded(depth.max(1));
        Self { tx, rx }
    }

    /// Takes a zeroed buffer of `len` bytes, reusing a returned allocation
    /// when one is available.
    pub fn acquire(&self, len: usize) -> PooledBuffer {
        let mut data = match self.rx.try_recv() {
            Ok(Some(buf)) => buf,
            _ => Vec::with_capacity(len),
        };
        data.clear();
        data.resize(len, 0);
        PooledBuffer {
            data,
            home: self.tx.clone(),
        }
    }

    /// Number of idle buffers waiting for reuse.
    pub fn idle(&self) -> usize {
        self.rx.len()
    }
}

/// Frame memory on loan from a [`BufferPool`].
pub struct PooledBuffer {
    data: Vec<u8>,
    home: Sender<Vec<u8>>,
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        let data = std::mem::take(&mut self.data);
        // Full or closed pool: the allocation is freed here instead.
        let _ = self.home.try_send(data);
    }
}

/// Outcome of one grab.
///
/// The pixel data belongs to the device's buffer pool and is reused as soon
/// as the result is dropped.
pub struct GrabResult {
    block_id: u64,
    width: u32,
    height: u32,
    pixel_type: PixelType,
    buffer: Option<PooledBuffer>,
    error: Option<String>,
}

impl GrabResult {
    pub fn succeeded(
        block_id: u64,
        width: u32,
        height: u32,
        pixel_type: PixelType,
        buffer: PooledBuffer,
    ) -> Self {
        Self {
            block_id,
            width,
            height,
            pixel_type,
            buffer: Some(buffer),
            error: None,
        }
    }

    pub fn failed(block_id: u64, pixel_type: PixelType, description: impl Into<String>) -> Self {
        Self {
            block_id,
            width: 0,
            height: 0,
            pixel_type,
            buffer: None,
            error: Some(description.into()),
        }
    }

    pub fn grab_succeeded(&self) -> bool {
        self.error.is_none()
    }

    pub fn error_description(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn block_id(&self) -> u64 {
        self.block_id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    /// Raw pixel bytes, empty for a failed grab.
    pub fn buffer(&self) -> &[u8] {
        self.buffer.as_deref().unwrap_or(&[])
    }
}
