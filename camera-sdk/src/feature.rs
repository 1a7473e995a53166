// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Camera features addressed by the bridge, named after the GenICam Standard
/// Features Naming Convention (plus `BslBrightness`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Feature {
    ExposureTime,
    ExposureAuto,
    ExposureMode,
    ExposureTimeMode,
    Gain,
    GainAuto,
    GainSelector,
    AcquisitionFrameRate,
    AcquisitionFrameRateEnable,
    BalanceRatio,
    BalanceRatioSelector,
    BalanceWhiteAuto,
    PixelFormat,
    BslBrightness,
    BinningHorizontal,
    BinningVertical,
    BinningHorizontalMode,
    BinningVerticalMode,
    Width,
    Height,
}

/// Value type of a feature node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeatureKind {
    Float,
    Integer,
    Boolean,
    Enumeration,
}

impl Feature {
    pub const ALL: [Feature; 20] = [
        Feature::ExposureTime,
        Feature::ExposureAuto,
        Feature::ExposureMode,
        Feature::ExposureTimeMode,
        Feature::Gain,
        Feature::GainAuto,
        Feature::GainSelector,
        Feature::AcquisitionFrameRate,
        Feature::AcquisitionFrameRateEnable,
        Feature::BalanceRatio,
        Feature::BalanceRatioSelector,
        Feature::BalanceWhiteAuto,
        Feature::PixelFormat,
        Feature::BslBrightness,
        Feature::BinningHorizontal,
        Feature::BinningVertical,
        Feature::BinningHorizontalMode,
        Feature::BinningVerticalMode,
        Feature::Width,
        Feature::Height,
    ];

    pub const fn kind(self) -> FeatureKind {
        match self {
            Feature::ExposureTime
            | Feature::Gain
            | Feature::AcquisitionFrameRate
            | Feature::BalanceRatio
            | Feature::BslBrightness => FeatureKind::Float,
            Feature::BinningHorizontal
            | Feature::BinningVertical
            | Feature::Width
            | Feature::Height => FeatureKind::Integer,
            Feature::AcquisitionFrameRateEnable => FeatureKind::Boolean,
            Feature::ExposureAuto
            | Feature::ExposureMode
            | Feature::ExposureTimeMode
            | Feature::GainAuto
            | Feature::GainSelector
            | Feature::BalanceRatioSelector
            | Feature::BalanceWhiteAuto
            | Feature::PixelFormat
            | Feature::BinningHorizontalMode
            | Feature::BinningVerticalMode => FeatureKind::Enumeration,
        }
    }

    /// GenICam node name.
    pub const fn name(self) -> &'static str {
        match self {
            Feature::ExposureTime => "ExposureTime",
            Feature::ExposureAuto => "ExposureAuto",
            Feature::ExposureMode => "ExposureMode",
            Feature::ExposureTimeMode => "ExposureTimeMode",
            Feature::Gain => "Gain",
            Feature::GainAuto => "GainAuto",
            Feature::GainSelector => "GainSelector",
            Feature::AcquisitionFrameRate => "AcquisitionFrameRate",
            Feature::AcquisitionFrameRateEnable => "AcquisitionFrameRateEnable",
            Feature::BalanceRatio => "BalanceRatio",
            Feature::BalanceRatioSelector => "BalanceRatioSelector",
            Feature::BalanceWhiteAuto => "BalanceWhiteAuto",
            Feature::PixelFormat => "PixelFormat",
            Feature::BslBrightness => "BslBrightness",
            Feature::BinningHorizontal => "BinningHorizontal",
            Feature::BinningVertical => "BinningVertical",
            Feature::BinningHorizontalMode => "BinningHorizontalMode",
            Feature::BinningVerticalMode => "BinningVerticalMode",
            Feature::Width => "Width",
            Feature::Height => "Height",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Direction of a feature access, used when reporting a missing capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Access::Read => f.write_str("readable"),
            Access::Write => f.write_str("writable"),
        }
    }
}

/// Inclusive range reported by a numeric feature.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> Bounds<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamps `value` into the range. Unordered values such as NaN map to
    /// `min`; callers that must not write them check first.
    pub fn clamp(&self, value: T) -> T {
        if value > self.max {
            self.max
        } else if value >= self.min {
            value
        } else {
            self.min
        }
    }
}
