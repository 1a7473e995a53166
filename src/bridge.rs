// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Boundary operations.
//!
//! [`CameraBridge`] is the surface a foreign caller binds to. Camera and frame
//! handles are plain `u64` values, and failures come back as sentinels rather
//! than errors:
//!
//! | result type | failure sentinel |
//! |---|---|
//! | handle | `0` |
//! | `bool` | `false` |
//! | `f64` | `-1.0` |
//! | format code | `-1` |
//! | collections | empty |
//! | optional values | `None` |
//!
//! Each operation runs inside `catch_unwind`, so a panicking driver degrades
//! to the operation's sentinel instead of unwinding into the caller. Every
//! contained error and panic is logged.

use crate::{
    binning::{Binning, BinningMode},
    config::BridgeConfig,
    error::{Error, Result},
    frame::{FrameHandle, FrameTable},
    image::{Image, UNKNOWN},
    registry::{CameraHandle, Registry},
    session::CameraSession,
};
use camera_sdk::{Bounds, Sdk};
use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};
use tracing::{debug, error, warn};

const UNAVAILABLE: f64 = -1.0;

/// Sentinel-returning facade over a [`Registry`] and the frames taken from
/// it.
///
/// # Example
///
/// ```
/// use camera_sdk::emulator::{DeviceProfile, EmulatedSdk};
/// use edgefirst_camera_bridge::{bridge::CameraBridge, config::BridgeConfig};
/// use std::sync::Arc;
///
/// let sdk = Arc::new(EmulatedSdk::new([DeviceProfile::new("DEVICE123", "daA1280-54uc")]));
/// let bridge = CameraBridge::new(sdk, BridgeConfig::default());
///
/// let camera = bridge.create_camera("DEVICE123");
/// assert_ne!(camera, 0);
/// assert!(bridge.start_acquisition(camera));
/// assert!(bridge.await_next_frame(camera));
///
/// let frame = bridge.take_frame(camera);
/// let (width, height) = bridge.frame_dimensions(frame).unwrap_or_default();
/// assert!(width > 0 && height > 0);
///
/// assert!(bridge.destroy_camera(camera));
/// assert_eq!(bridge.take_frame(camera), 0);
/// bridge.shutdown();
/// ```
pub struct CameraBridge {
    registry: Registry,
    frames: FrameTable,
}

impl CameraBridge {
    pub fn new(sdk: Arc<dyn Sdk>, config: BridgeConfig) -> Self {
        Self {
            registry: Registry::new(sdk, config),
            frames: FrameTable::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn frames(&self) -> &FrameTable {
        &self.frames
    }

    fn contain<T>(&self, op: &'static str, sentinel: T, f: impl FnOnce() -> Result<T>) -> T {
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(value)) => value,
            Ok(Err(err)) => {
                warn!(op, "{err}");
                sentinel
            }
            Err(payload) => {
                error!(op, panic = panic_message(payload.as_ref()), "driver fault contained");
                sentinel
            }
        }
    }

    fn with_camera<T>(
        &self,
        op: &'static str,
        handle: u64,
        sentinel: T,
        f: impl FnOnce(&CameraSession) -> Result<T>,
    ) -> T {
        self.contain(op, sentinel, || {
            let handle = CameraHandle::from_raw(handle)
                .ok_or_else(|| Error::InvalidArgument("camera handle 0".to_string()))?;
            let session = self.registry.get(handle)?;
            f(&session)
        })
    }

    fn with_frame<T>(
        &self,
        op: &'static str,
        handle: u64,
        sentinel: T,
        f: impl FnOnce(&Image) -> T,
    ) -> T {
        self.contain(op, sentinel, || {
            let frame = FrameHandle::from_raw(handle)
                .and_then(|handle| self.frames.get(handle))
                .ok_or_else(|| Error::InvalidArgument(format!("unknown frame handle {handle}")))?;
            Ok(f(frame.as_ref()))
        })
    }

    /// Initializes the SDK runtime if needed and reports whether it is up.
    pub fn is_runtime_ready(&self) -> bool {
        self.contain("is_runtime_ready", false, || {
            self.registry.ensure_runtime()?;
            Ok(true)
        })
    }

    /// Serial numbers of the attached cameras.
    pub fn connected_devices(&self) -> Vec<String> {
        self.contain("connected_devices", Vec::new(), || {
            Ok(self
                .registry
                .devices()?
                .into_iter()
                .map(|info| info.serial)
                .collect())
        })
    }

    pub fn model_name(&self, serial: &str) -> Option<String> {
        self.contain("model_name", None, || {
            Ok(Some(self.registry.find_device(serial)?.model))
        })
    }

    /// Opens the camera with serial number `serial`. Returns 0 on failure.
    pub fn create_camera(&self, serial: &str) -> u64 {
        self.contain("create_camera", 0, || {
            Ok(self.registry.create(serial)?.get())
        })
    }

    pub fn start_acquisition(&self, camera: u64) -> bool {
        self.with_camera("start_acquisition", camera, false, |s| {
            s.start()?;
            Ok(true)
        })
    }

    pub fn stop_acquisition(&self, camera: u64) -> bool {
        self.with_camera("stop_acquisition", camera, false, |s| {
            s.stop()?;
            Ok(true)
        })
    }

    /// Destroys the camera. Always succeeds, including for unknown handles.
    pub fn destroy_camera(&self, camera: u64) -> bool {
        self.contain("destroy_camera", true, || {
            if let Some(handle) = CameraHandle::from_raw(camera) {
                self.registry.destroy(handle);
            }
            Ok(true)
        })
    }

    pub fn exposure(&self, camera: u64) -> f64 {
        self.with_camera("exposure", camera, UNAVAILABLE, |s| s.exposure())
    }

    pub fn set_exposure(&self, camera: u64, micros: f64) -> bool {
        self.with_camera("set_exposure", camera, false, |s| {
            s.set_exposure(micros).map(|_| true)
        })
    }

    pub fn min_exposure(&self, camera: u64) -> f64 {
        self.with_camera("min_exposure", camera, UNAVAILABLE, |s| {
            s.exposure_range().map(|b| b.min)
        })
    }

    pub fn max_exposure(&self, camera: u64) -> f64 {
        self.with_camera("max_exposure", camera, UNAVAILABLE, |s| {
            s.exposure_range().map(|b| b.max)
        })
    }

    pub fn auto_exposure(&self, camera: u64) -> bool {
        self.with_camera("auto_exposure", camera, false, |s| s.auto_exposure())
    }

    pub fn set_auto_exposure(&self, camera: u64, enable: bool) -> bool {
        self.with_camera("set_auto_exposure", camera, false, |s| {
            s.set_auto_exposure(enable).map(|_| true)
        })
    }

    pub fn gain(&self, camera: u64) -> f64 {
        self.with_camera("gain", camera, UNAVAILABLE, |s| s.gain())
    }

    pub fn set_gain(&self, camera: u64, gain: f64) -> bool {
        self.with_camera("set_gain", camera, false, |s| s.set_gain(gain).map(|_| true))
    }

    pub fn min_gain(&self, camera: u64) -> f64 {
        self.with_camera("min_gain", camera, UNAVAILABLE, |s| {
            s.gain_range().map(|b| b.min)
        })
    }

    pub fn max_gain(&self, camera: u64) -> f64 {
        self.with_camera("max_gain", camera, UNAVAILABLE, |s| {
            s.gain_range().map(|b| b.max)
        })
    }

    pub fn frame_rate(&self, camera: u64) -> f64 {
        self.with_camera("frame_rate", camera, UNAVAILABLE, |s| s.frame_rate())
    }

    pub fn set_frame_rate(&self, camera: u64, fps: f64) -> bool {
        self.with_camera("set_frame_rate", camera, false, |s| {
            s.set_frame_rate(fps).map(|_| true)
        })
    }

    /// Red, green and blue ratios, all `-1.0` when unavailable.
    pub fn white_balance(&self, camera: u64) -> [f64; 3] {
        self.with_camera("white_balance", camera, [UNAVAILABLE; 3], |s| {
            s.white_balance()
        })
    }

    pub fn set_white_balance(&self, camera: u64, ratios: [f64; 3]) -> bool {
        self.with_camera("set_white_balance", camera, false, |s| {
            s.set_white_balance(ratios).map(|_| true)
        })
    }

    pub fn min_white_balance(&self, camera: u64) -> f64 {
        self.with_camera("min_white_balance", camera, UNAVAILABLE, |s| {
            s.white_balance_range().map(|b: Bounds<f64>| b.min)
        })
    }

    pub fn max_white_balance(&self, camera: u64) -> f64 {
        self.with_camera("max_white_balance", camera, UNAVAILABLE, |s| {
            s.white_balance_range().map(|b: Bounds<f64>| b.max)
        })
    }

    pub fn auto_white_balance(&self, camera: u64) -> bool {
        self.with_camera("auto_white_balance", camera, false, |s| {
            s.auto_white_balance()
        })
    }

    pub fn set_auto_white_balance(&self, camera: u64, enable: bool) -> bool {
        self.with_camera("set_auto_white_balance", camera, false, |s| {
            s.set_auto_white_balance(enable).map(|_| true)
        })
    }

    pub fn pixel_format(&self, camera: u64) -> i32 {
        self.with_camera("pixel_format", camera, UNKNOWN, |s| s.pixel_format())
    }

    pub fn set_pixel_format(&self, camera: u64, code: i32) -> bool {
        self.with_camera("set_pixel_format", camera, false, |s| {
            s.set_pixel_format(code).map(|_| true)
        })
    }

    pub fn supported_pixel_formats(&self, camera: u64) -> Vec<i32> {
        self.with_camera("supported_pixel_formats", camera, Vec::new(), |s| {
            s.supported_pixel_formats()
        })
    }

    pub fn brightness(&self, camera: u64) -> f64 {
        self.with_camera("brightness", camera, UNAVAILABLE, |s| s.brightness())
    }

    pub fn set_brightness(&self, camera: u64, brightness: f64) -> bool {
        self.with_camera("set_brightness", camera, false, |s| {
            s.set_brightness(brightness).map(|_| true)
        })
    }

    /// `mode` is 0 for average and 1 for sum binning.
    pub fn set_pixel_binning(&self, camera: u64, mode: i32, horizontal: i32, vertical: i32) -> bool {
        self.with_camera("set_pixel_binning", camera, false, |s| {
            let mode = BinningMode::from_code(mode)
                .ok_or_else(|| Error::InvalidArgument(format!("binning mode {mode}")))?;
            let factor = |value: i32| {
                u32::try_from(value)
                    .map_err(|_| Error::InvalidArgument(format!("binning factor {value}")))
            };
            let binning = Binning::new(mode, factor(horizontal)?, factor(vertical)?)?;
            s.set_pixel_binning(binning).map(|_| true)
        })
    }

    /// Blocks until the camera delivers a new frame and caches it. Returns
    /// `false` on timeout, when the camera is not grabbing, or on any other
    /// failure.
    pub fn await_next_frame(&self, camera: u64) -> bool {
        self.with_camera("await_next_frame", camera, false, |s| {
            s.await_next().map(|_| true)
        })
    }

    /// Takes the cached frame of `camera` as an owned frame handle, 0 when no
    /// frame has been cached or the camera is gone.
    pub fn take_frame(&self, camera: u64) -> u64 {
        self.with_camera("take_frame", camera, 0, |s| {
            Ok(match s.read_current() {
                Some(frame) => self.frames.insert(frame).get(),
                None => {
                    debug!(handle = %s.handle(), "no frame cached yet");
                    0
                }
            })
        })
    }

    pub fn frame_dimensions(&self, frame: u64) -> Option<(u32, u32)> {
        self.with_frame("frame_dimensions", frame, None, |img| {
            Some((img.width(), img.height()))
        })
    }

    pub fn frame_pixel_format(&self, frame: u64) -> i32 {
        self.with_frame("frame_pixel_format", frame, UNKNOWN, Image::format_code)
    }

    /// Copy of the frame's pixel bytes.
    pub fn frame_data(&self, frame: u64) -> Vec<u8> {
        self.with_frame("frame_data", frame, Vec::new(), |img| img.data().to_vec())
    }

    /// The frame encoded as PNG, empty on failure.
    pub fn frame_png(&self, frame: u64) -> Vec<u8> {
        self.contain("frame_png", Vec::new(), || {
            let img = FrameHandle::from_raw(frame)
                .and_then(|handle| self.frames.get(handle))
                .ok_or_else(|| Error::InvalidArgument(format!("unknown frame handle {frame}")))?;
            img.encode_png()
        })
    }

    /// Releases a frame handle. Returns `false` for unknown handles.
    pub fn release_frame(&self, frame: u64) -> bool {
        self.contain("release_frame", false, || {
            Ok(FrameHandle::from_raw(frame).is_some_and(|handle| self.frames.release(handle)))
        })
    }

    /// Destroys every camera, drops all taken frames and terminates the SDK
    /// runtime.
    pub fn shutdown(&self) {
        self.contain("shutdown", (), || {
            self.registry.shutdown_all();
            self.frames.clear();
            Ok(())
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}
