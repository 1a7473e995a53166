// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

static RUNTIME_REFS: AtomicUsize = AtomicUsize::new(0);

/// Number of live SDK runtime initializations in this process.
pub fn runtime_refcount() -> usize {
    RUNTIME_REFS.load(Ordering::SeqCst)
}

/// One reference on the process-wide SDK runtime, released on drop.
///
/// Vendor runtimes pair a process-scoped initialize with a terminate; SDK
/// implementations hold one guard for as long as they are initialized.
#[derive(Debug)]
pub struct RuntimeGuard(());

impl RuntimeGuard {
    pub fn acquire() -> Self {
        let refs = RUNTIME_REFS.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(refs, "SDK runtime acquired");
        RuntimeGuard(())
    }
}

impl Drop for RuntimeGuard {
    fn drop(&mut self) {
        let refs = RUNTIME_REFS.fetch_sub(1, Ordering::SeqCst) - 1;
        debug!(refs, "SDK runtime released");
    }
}
