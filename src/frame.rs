// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::image::Image;
use core::fmt;
use std::{
    collections::HashMap,
    num::NonZeroU64,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};
use tracing::debug;

/// Single-slot cache holding the most recent frame of a camera.
///
/// Publishing swaps the `Arc` in the slot under the lock; the image bytes are
/// never touched after construction. A reader that cloned the previous `Arc`
/// keeps a complete frame for as long as it wants, regardless of how many
/// frames are published after it.
#[derive(Default)]
pub struct FrameCache {
    slot: Mutex<Option<Arc<Image>>>,
    published: AtomicU64,
}

impl FrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<Image>>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the cached frame and returns the one it displaced.
    pub fn publish(&self, frame: Arc<Image>) -> Option<Arc<Image>> {
        let previous = self.lock().replace(frame);
        self.published.fetch_add(1, Ordering::Release);
        previous
    }

    /// The cached frame, if any frame was ever published.
    pub fn read_current(&self) -> Option<Arc<Image>> {
        self.lock().clone()
    }

    /// Drops the cached frame. Readers holding it are unaffected.
    pub fn clear(&self) {
        self.lock().take();
    }

    /// Number of frames published since the cache was created.
    pub fn publish_count(&self) -> u64 {
        self.published.load(Ordering::Acquire)
    }
}

/// Identifier of a frame handed across the bridge boundary. Never 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(NonZeroU64);

impl FrameHandle {
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(FrameHandle)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for FrameHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "frame#{}", self.0)
    }
}

/// Frames taken across the boundary, owned until released.
///
/// Handles come from a monotonic counter so a released handle is never
/// handed out again.
pub struct FrameTable {
    next: AtomicU64,
    frames: Mutex<HashMap<FrameHandle, Arc<Image>>>,
}

impl Default for FrameTable {
    fn default() -> Self {
        Self {
            next: AtomicU64::new(1),
            frames: Mutex::new(HashMap::new()),
        }
    }
}

impl FrameTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<FrameHandle, Arc<Image>>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert(&self, frame: Arc<Image>) -> FrameHandle {
        let raw = self.next.fetch_add(1, Ordering::Relaxed);
        let handle = FrameHandle(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN));
        debug!(%handle, %frame, "frame taken");
        self.lock().insert(handle, frame);
        handle
    }

    pub fn get(&self, handle: FrameHandle) -> Option<Arc<Image>> {
        self.lock().get(&handle).cloned()
    }

    /// Returns `false` if `handle` was unknown or already released.
    pub fn release(&self, handle: FrameHandle) -> bool {
        let released = self.lock().remove(&handle).is_some();
        if released {
            debug!(%handle, "frame released");
        }
        released
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
