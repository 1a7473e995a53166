// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! # Camera SDK Seam
//!
//! This crate describes the surface of a GenICam-style machine-vision camera
//! SDK as a pair of object-safe traits, [`Sdk`] and [`Device`], so that the
//! camera bridge can be written once and driven by any vendor runtime.
//!
//! It also ships [`emulator::EmulatedSdk`], a software camera that implements
//! the traits with a moving test pattern, realistic feature access rules and
//! fault injection hooks. The emulator is what the bridge tests and the
//! `camera-bridge` tool run against when no hardware is attached.
//!
//! ## Buffer ownership
//!
//! Grab results hand out bytes that live in a driver-owned buffer pool. The
//! pool reclaims the allocation as soon as the [`GrabResult`] is dropped, so
//! callers must copy pixel data out before letting the result go.
//!
//! ## Threading
//!
//! Devices are shared between a control thread and an acquisition thread.
//! Every [`Device`] method takes `&self` and implementations must be
//! `Send + Sync`; configuration calls are single-writer-at-a-time safe, the
//! same contract vendor runtimes document.

pub mod emulator;
mod error;
mod feature;
mod grab;
mod pattern;
mod pixel;
mod runtime;

pub use error::SdkError;
pub use feature::{Access, Bounds, Feature, FeatureKind};
pub use grab::{BufferPool, GrabResult, PooledBuffer};
pub use pixel::PixelType;
pub use runtime::{runtime_refcount, RuntimeGuard};

use std::time::Duration;

/// Identity of a camera as reported by device enumeration.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct DeviceInfo {
    /// Factory serial number, unique per physical camera.
    pub serial: String,
    /// Model name, e.g. `daA1280-54uc`.
    pub model: String,
    /// Vendor name.
    pub vendor: String,
}

/// Process-level entry point of a camera SDK.
pub trait Sdk: Send + Sync {
    /// Initializes the SDK runtime. Calling it again while initialized is a
    /// no-op.
    fn initialize(&self) -> Result<(), SdkError>;

    /// Releases the SDK runtime. Devices created from this SDK must be closed
    /// before calling this.
    fn terminate(&self);

    fn is_initialized(&self) -> bool;

    /// Lists the devices currently attached.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::NotInitialized`] before [`Sdk::initialize`].
    fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>, SdkError>;

    /// Creates a device object for an enumerated camera. The device is not
    /// opened.
    fn create_device(&self, info: &DeviceInfo) -> Result<Box<dyn Device>, SdkError>;
}

/// An attached camera.
///
/// Grabbing always follows a latest-image-only strategy: when the consumer
/// falls behind, older frames are dropped by the driver rather than queued.
pub trait Device: Send + Sync {
    fn info(&self) -> &DeviceInfo;

    /// Opens the device for exclusive use.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::DeviceBusy`] if another device object holds the
    /// camera open.
    fn open(&self) -> Result<(), SdkError>;

    /// Closes the device, stopping any grab in progress.
    fn close(&self) -> Result<(), SdkError>;

    fn is_open(&self) -> bool;

    fn start_grabbing(&self) -> Result<(), SdkError>;

    /// Stops grabbing. A thread blocked in [`Device::retrieve_result`] wakes
    /// up and returns `Ok(None)`.
    fn stop_grabbing(&self) -> Result<(), SdkError>;

    fn is_grabbing(&self) -> bool;

    /// Waits up to `timeout` for the next grab result.
    ///
    /// Returns `Ok(None)` when the timeout expires or when grabbing is stopped
    /// while waiting.
    fn retrieve_result(&self, timeout: Duration) -> Result<Option<GrabResult>, SdkError>;

    /// Whether `feature` exists and may be read right now.
    fn is_readable(&self, feature: Feature) -> bool;

    /// Whether `feature` exists and may be written right now.
    fn is_writable(&self, feature: Feature) -> bool;

    fn float(&self, feature: Feature) -> Result<f64, SdkError>;
    fn set_float(&self, feature: Feature, value: f64) -> Result<(), SdkError>;
    fn float_bounds(&self, feature: Feature) -> Result<Bounds<f64>, SdkError>;

    fn integer(&self, feature: Feature) -> Result<i64, SdkError>;
    fn set_integer(&self, feature: Feature, value: i64) -> Result<(), SdkError>;
    fn integer_bounds(&self, feature: Feature) -> Result<Bounds<i64>, SdkError>;

    fn boolean(&self, feature: Feature) -> Result<bool, SdkError>;
    fn set_boolean(&self, feature: Feature, value: bool) -> Result<(), SdkError>;

    /// Symbolic name of the current enumeration entry.
    fn enumeration(&self, feature: Feature) -> Result<String, SdkError>;
    fn set_enumeration(&self, feature: Feature, entry: &str) -> Result<(), SdkError>;

    /// Enumeration entries that may currently be written.
    fn settable_entries(&self, feature: Feature) -> Result<Vec<String>, SdkError>;
}
