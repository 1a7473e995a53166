// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    config::{AcquisitionPolicy, BridgeConfig},
    error::{Error, Result},
    session::CameraSession,
};
use camera_sdk::{DeviceInfo, Sdk};
use core::fmt;
use std::{
    collections::HashMap,
    num::NonZeroU64,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};
use tracing::{debug, info, warn};

/// Identifier of a camera session. Never 0, never reused within a registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CameraHandle(NonZeroU64);

impl CameraHandle {
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(CameraHandle)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for CameraHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "camera#{}", self.0)
    }
}

/// Table of open camera sessions.
///
/// The registry owns the SDK runtime for as long as it is alive and hands out
/// sessions by handle. Handles come from a counter, so a destroyed handle can
/// never alias a newer session.
///
/// Its lock only ever covers map mutations. Opening a device is serialized by
/// a separate lock, and closing one happens after the session has left the
/// map, so a slow device never blocks lookups of other cameras.
pub struct Registry {
    sdk: Arc<dyn Sdk>,
    policy: AcquisitionPolicy,
    next: AtomicU64,
    sessions: Mutex<HashMap<CameraHandle, Arc<CameraSession>>>,
    opening: Mutex<()>,
}

impl Registry {
    pub fn new(sdk: Arc<dyn Sdk>, config: BridgeConfig) -> Self {
        Self {
            sdk,
            policy: config.acquisition,
            next: AtomicU64::new(1),
            sessions: Mutex::new(HashMap::new()),
            opening: Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CameraHandle, Arc<CameraSession>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn sdk(&self) -> &Arc<dyn Sdk> {
        &self.sdk
    }

    /// Initializes the SDK runtime unless it already is.
    pub fn ensure_runtime(&self) -> Result<()> {
        if !self.sdk.is_initialized() {
            self.sdk.initialize()?;
            info!("camera SDK runtime initialized");
        }
        Ok(())
    }

    pub fn devices(&self) -> Result<Vec<DeviceInfo>> {
        self.ensure_runtime()?;
        Ok(self.sdk.enumerate_devices()?)
    }

    /// Finds an attached device by exact serial number.
    pub fn find_device(&self, serial: &str) -> Result<DeviceInfo> {
        self.devices()?
            .into_iter()
            .find(|info| info.serial == serial)
            .ok_or_else(|| Error::DeviceNotFound(serial.to_string()))
    }

    /// Opens the device with serial number `serial` and registers a session
    /// for it.
    ///
    /// # Errors
    ///
    /// - [`Error::DeviceNotFound`] if no attached device has that serial.
    /// - [`Error::Driver`] if the runtime fails to start or the device cannot
    ///   be opened, including when another session holds it.
    pub fn create(&self, serial: &str) -> Result<CameraHandle> {
        let _opening = self.opening.lock().unwrap_or_else(PoisonError::into_inner);

        let info = self.find_device(serial)?;
        let device = self.sdk.create_device(&info)?;
        let handle = self.next_handle();
        let session = Arc::new(CameraSession::open(handle, device, self.policy)?);

        self.lock().insert(handle, session);
        info!(%handle, serial, "camera created");
        Ok(handle)
    }

    fn next_handle(&self) -> CameraHandle {
        let raw = self.next.fetch_add(1, Ordering::Relaxed);
        CameraHandle(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN))
    }

    /// The session behind `handle`, or `None` if it was never created or has
    /// been destroyed.
    pub fn lookup(&self, handle: CameraHandle) -> Option<Arc<CameraSession>> {
        self.lock().get(&handle).cloned()
    }

    /// Like [`Registry::lookup`] but reports a missing session as
    /// [`Error::UnknownHandle`].
    pub fn get(&self, handle: CameraHandle) -> Result<Arc<CameraSession>> {
        self.lookup(handle).ok_or(Error::UnknownHandle(handle))
    }

    /// Removes the session and closes its device. Unknown handles are
    /// ignored.
    ///
    /// A call blocked in an await on this session returns once the device
    /// stops grabbing; the session itself is freed when the last such call
    /// lets go of it.
    pub fn destroy(&self, handle: CameraHandle) {
        let Some(session) = self.lock().remove(&handle) else {
            debug!(%handle, "destroy of unknown handle ignored");
            return;
        };
        close(&session);
        info!(%handle, "camera destroyed");
    }

    /// Destroys every session, then terminates the SDK runtime.
    pub fn shutdown_all(&self) {
        let sessions: Vec<_> = self.lock().drain().collect();
        for (handle, session) in &sessions {
            close(session);
            debug!(%handle, "camera destroyed on shutdown");
        }
        drop(sessions);

        if self.sdk.is_initialized() {
            self.sdk.terminate();
            info!("camera SDK runtime terminated");
        }
    }

    pub fn handles(&self) -> Vec<CameraHandle> {
        let mut handles: Vec<_> = self.lock().keys().copied().collect();
        handles.sort();
        handles
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

fn close(session: &CameraSession) {
    if let Err(err) = session.close() {
        warn!(handle = %session.handle(), "closing camera failed: {err}");
    }
}
