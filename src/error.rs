// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::registry::CameraHandle;
use camera_sdk::{Access, Feature, PixelType, SdkError};
use std::time::Duration;
use thiserror::Error;

/// Errors raised inside the bridge.
///
/// Everything below the boundary reports failures through this type. The
/// [`CameraBridge`](crate::bridge::CameraBridge) collapses each variant to the
/// sentinel of the operation that failed.
#[derive(Error, Debug)]
pub enum Error {
    #[error("no connected device with serial number `{0}`")]
    DeviceNotFound(String),

    #[error("unknown camera handle {0}")]
    UnknownHandle(CameraHandle),

    #[error("{feature} is not {access} on this device")]
    CapabilityUnavailable { feature: Feature, access: Access },

    #[error("driver error: {0}")]
    Driver(#[from] SdkError),

    #[error("no frame within {0:?}")]
    Timeout(Duration),

    #[error("camera is not grabbing")]
    DeviceNotGrabbing,

    #[error("unsupported pixel encoding {0}")]
    UnsupportedEncoding(PixelType),

    #[error("{pixel_type} frame {width}x{height} cannot be read from {len} bytes")]
    MalformedFrame {
        pixel_type: PixelType,
        width: u32,
        height: u32,
        len: usize,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("image encoding failed: {0}")]
    Encode(#[from] ::image::ImageError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn unreadable(feature: Feature) -> Self {
        Error::CapabilityUnavailable {
            feature,
            access: Access::Read,
        }
    }

    pub(crate) fn unwritable(feature: Feature) -> Self {
        Error::CapabilityUnavailable {
            feature,
            access: Access::Write,
        }
    }
}
