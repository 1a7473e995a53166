// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::feature::{Access, Feature};
use thiserror::Error;

/// Faults raised by an SDK or device call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SdkError {
    #[error("SDK runtime failed to initialize: {0}")]
    Runtime(String),

    #[error("SDK runtime is not initialized")]
    NotInitialized,

    #[error("no device with serial number `{0}`")]
    DeviceNotFound(String),

    #[error("device `{0}` is already open")]
    DeviceBusy(String),

    #[error("device is not open")]
    NotOpen,

    #[error("{feature} is not {access}")]
    AccessDenied { feature: Feature, access: Access },

    #[error("{feature} value {value} is outside [{min}, {max}]")]
    OutOfRange {
        feature: Feature,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{feature} has no settable entry `{entry}`")]
    InvalidEntry { feature: Feature, entry: String },

    #[error("{feature} is not a {expected} feature")]
    TypeMismatch {
        feature: Feature,
        expected: &'static str,
    },

    #[error("transport error: {0}")]
    Transport(String),
}
