// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    binning::Binning,
    config::AcquisitionPolicy,
    convert,
    error::{Error, Result},
    frame::FrameCache,
    image::Image,
    registry::CameraHandle,
};
use camera_sdk::{Device, DeviceInfo, GrabResult};
use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Instant,
};
use tracing::{debug, info, instrument, warn};

/// Live state of one open camera.
///
/// Sessions are shared as `Arc<CameraSession>` between the registry and any
/// call in flight, so a session destroyed while another thread is blocked in
/// [`CameraSession::await_next`] stays valid until that call returns.
///
/// Control operations live in [`control`](crate::control).
pub struct CameraSession {
    handle: CameraHandle,
    pub(crate) device: Box<dyn Device>,
    cache: FrameCache,
    pub(crate) binning: Mutex<Binning>,
    policy: AcquisitionPolicy,
}

impl CameraSession {
    /// Opens `device` and wraps it in a session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Driver`] if the device refuses to open, for example
    /// because another session already holds it.
    pub fn open(
        handle: CameraHandle,
        device: Box<dyn Device>,
        policy: AcquisitionPolicy,
    ) -> Result<Self> {
        device.open()?;
        info!(%handle, serial = %device.info().serial, model = %device.info().model, "camera opened");
        Ok(Self {
            handle,
            device,
            cache: FrameCache::new(),
            binning: Mutex::new(Binning::NONE),
            policy,
        })
    }

    pub fn handle(&self) -> CameraHandle {
        self.handle
    }

    pub fn info(&self) -> &DeviceInfo {
        self.device.info()
    }

    pub fn policy(&self) -> AcquisitionPolicy {
        self.policy
    }

    pub fn cache(&self) -> &FrameCache {
        &self.cache
    }

    /// Starts grabbing with the latest-image-only strategy, reopening the
    /// device first if it was closed.
    pub fn start(&self) -> Result<()> {
        if !self.device.is_open() {
            self.device.open()?;
        }
        self.device.start_grabbing()?;
        debug!(handle = %self.handle, "acquisition started");
        Ok(())
    }

    /// Stops grabbing. Stopping an idle camera succeeds.
    pub fn stop(&self) -> Result<()> {
        if self.device.is_grabbing() {
            self.device.stop_grabbing()?;
            debug!(handle = %self.handle, "acquisition stopped");
        }
        Ok(())
    }

    pub fn is_grabbing(&self) -> bool {
        self.device.is_grabbing()
    }

    /// Stops acquisition and closes the device. Safe to call repeatedly.
    pub fn close(&self) -> Result<()> {
        let stopped = self.stop();
        if self.device.is_open() {
            self.device.close()?;
            info!(handle = %self.handle, serial = %self.info().serial, "camera closed");
        }
        stopped
    }

    /// Whatever frame is cached, possibly stale. Never blocks on acquisition.
    pub fn read_current(&self) -> Option<Arc<Image>> {
        self.cache.read_current()
    }

    /// Blocks for the next grabbed frame using the session's policy.
    pub fn await_next(&self) -> Result<Arc<Image>> {
        self.await_next_with(self.policy)
    }

    /// Blocks for the next grabbed frame, converts it, publishes it to the
    /// cache and returns it.
    ///
    /// Failed grabs are skipped. Each retrieve waits at most
    /// `policy.retrieve_timeout`, and the whole call gives up after
    /// `policy.deadline`.
    ///
    /// # Errors
    ///
    /// - [`Error::DeviceNotGrabbing`] if the camera is not grabbing when
    ///   called, or stops grabbing while waiting. Nothing is published.
    /// - [`Error::Timeout`] once the deadline passes without a frame.
    /// - [`Error::UnsupportedEncoding`] or [`Error::MalformedFrame`] if the
    ///   grabbed frame cannot be converted. Nothing is published.
    /// - [`Error::Driver`] if the retrieve itself fails.
    #[instrument(skip_all, fields(handle = %self.handle))]
    pub fn await_next_with(&self, policy: AcquisitionPolicy) -> Result<Arc<Image>> {
        if !self.device.is_grabbing() {
            warn!("await called while the camera is not grabbing, start acquisition first");
            return Err(Error::DeviceNotGrabbing);
        }

        let started = Instant::now();
        while self.device.is_grabbing() {
            let elapsed = started.elapsed();
            if elapsed >= policy.deadline {
                return Err(Error::Timeout(policy.deadline));
            }
            let attempt = policy.retrieve_timeout.min(policy.deadline - elapsed);

            match self.device.retrieve_result(attempt)? {
                Some(grab) if grab.grab_succeeded() => {
                    let frame = Arc::new(self.decode(&grab)?);
                    drop(grab);
                    self.cache.publish(frame.clone());
                    return Ok(frame);
                }
                Some(grab) => {
                    warn!(
                        block_id = grab.block_id(),
                        error = grab.error_description().unwrap_or_default(),
                        "grab failed"
                    );
                }
                None => debug!(?attempt, "retrieve returned without a frame"),
            }
        }

        Err(Error::DeviceNotGrabbing)
    }

    /// Copies the grab out of driver memory and applies software binning.
    fn decode(&self, grab: &GrabResult) -> Result<Image> {
        let img = convert::convert_grab(grab)?;
        let binning = *self.binning.lock().unwrap_or_else(PoisonError::into_inner);
        if binning.is_identity() {
            Ok(img)
        } else {
            binning.apply(&img)
        }
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(handle = %self.handle, "closing camera on drop failed: {err}");
        }
    }
}
