// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! # EdgeFirst Camera Bridge Library
//!
//! This library bridges a GenICam-style machine-vision camera SDK to a caller
//! on the other side of a foreign-function boundary. It owns camera sessions,
//! pulls frames out of driver-owned buffers into independently owned images,
//! and forwards camera parameters with capability checks and clamping.
//!
//! ## Features
//!
//! - **Device Registry**: Handle-keyed table of open cameras with monotonic
//!   handles and idempotent destroy.
//! - **Frame Cache**: Per-camera single-slot cache; publishing swaps an
//!   `Arc<Image>` so readers never observe a partial frame.
//! - **Pixel Conversion**: Mono8, RGB8, BGR8 and YUV 4:2:2 sensor encodings
//!   normalized to BGR or mono images, with optional software binning.
//! - **Camera Controls**: Exposure, gain, frame rate, white balance, pixel
//!   format, brightness and binning.
//! - **Fault Containment**: [`bridge::CameraBridge`] turns every error and
//!   driver panic into a sentinel value.
//!
//! ## Example
//!
//! ```
//! use camera_sdk::emulator::{DeviceProfile, EmulatedSdk};
//! use edgefirst_camera_bridge::{config::BridgeConfig, image::GRAY, registry::Registry};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let sdk = Arc::new(EmulatedSdk::new([DeviceProfile::new("DEVICE123", "daA1280-54uc")]));
//! let registry = Registry::new(sdk, BridgeConfig::default());
//!
//! let handle = registry.create("DEVICE123")?;
//! let camera = registry.get(handle)?;
//! camera.set_pixel_format(GRAY)?;
//! camera.start()?;
//!
//! let frame = camera.await_next()?;
//! assert_eq!(frame.format_code(), GRAY);
//!
//! registry.shutdown_all();
//! # Ok(())
//! # }
//! ```
//!
//! ## Threading
//!
//! All operations are synchronous. A camera is typically driven by one
//! control thread and one acquisition thread blocked in
//! [`session::CameraSession::await_next`], with any number of readers of the
//! cached frame.

pub mod binning;
pub mod bridge;
pub mod config;
pub mod control;
pub mod convert;
pub mod error;
pub mod frame;
pub mod image;
pub mod registry;
pub mod session;

pub use error::{Error, Result};
