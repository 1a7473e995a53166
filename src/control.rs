// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Typed camera parameters.
//!
//! Every accessor checks that the features it touches are readable or
//! writable before calling into the device, and every numeric setter rejects
//! non-finite input and clamps the rest to the bounds the device reports. Setters return the value that
//! was actually applied.

use crate::{
    binning::{Binning, BinningMode},
    error::{Error, Result},
    image::{BGR, GRAY, UNKNOWN, UYVY, YUYV},
    session::CameraSession,
};
use camera_sdk::{Bounds, Feature, PixelType};
use std::sync::PoisonError;
use tracing::{debug, warn};

const CHANNELS: [&str; 3] = ["Red", "Green", "Blue"];

/// Boundary format code of a device pixel encoding.
///
/// RGB8 and BGR8 both report [`BGR`] since frames from either are delivered
/// as BGR.
pub const fn format_code(pixel_type: PixelType) -> i32 {
    match pixel_type {
        PixelType::Rgb8Packed | PixelType::Bgr8Packed => BGR,
        PixelType::Mono8 => GRAY,
        PixelType::Yuv422Yuyv => YUYV,
        PixelType::Yuv422Uyvy => UYVY,
        _ => UNKNOWN,
    }
}

/// `PixelFormat` entries that select `code`, in order of preference.
pub const fn format_entries(code: i32) -> &'static [&'static str] {
    match code {
        BGR => &["RGB8", "BGR8", "RGB8Packed", "BGR8Packed"],
        GRAY => &["Mono8"],
        YUYV => &["YUV422_8", "YUV422_YUYV_Packed"],
        UYVY => &["YCbCr422_8", "YUV422_8_UYVY", "YUV422Packed"],
        _ => &[],
    }
}

impl CameraSession {
    fn require_readable(&self, feature: Feature) -> Result<()> {
        if self.device.is_readable(feature) {
            Ok(())
        } else {
            warn!(handle = %self.handle(), "{feature} not readable");
            Err(Error::unreadable(feature))
        }
    }

    fn require_writable(&self, feature: Feature) -> Result<()> {
        if self.device.is_writable(feature) {
            Ok(())
        } else {
            warn!(handle = %self.handle(), "{feature} not writable");
            Err(Error::unwritable(feature))
        }
    }

    fn read_float(&self, feature: Feature) -> Result<f64> {
        self.require_readable(feature)?;
        Ok(self.device.float(feature)?)
    }

    fn float_range(&self, feature: Feature) -> Result<Bounds<f64>> {
        self.require_readable(feature)?;
        Ok(self.device.float_bounds(feature)?)
    }

    fn require_finite(&self, feature: Feature, value: f64) -> Result<()> {
        if value.is_finite() {
            Ok(())
        } else {
            warn!(handle = %self.handle(), value, "{feature} rejected");
            Err(Error::InvalidArgument(format!("{feature} must be finite, got {value}")))
        }
    }

    /// Clamps `value` into the bounds of `feature` and writes it.
    fn write_clamped(&self, feature: Feature, value: f64) -> Result<f64> {
        let applied = self.device.float_bounds(feature)?.clamp(value);
        if applied != value {
            debug!(handle = %self.handle(), requested = value, applied, "{feature} clamped");
        }
        self.device.set_float(feature, applied)?;
        Ok(applied)
    }

    fn set_if_writable(&self, feature: Feature, entry: &str) -> Result<()> {
        if self.device.is_writable(feature) {
            self.device.set_enumeration(feature, entry)?;
        }
        Ok(())
    }

    /// Runs `op` once every feature in `features` is writable, stopping
    /// acquisition around it if grabbing is what locks them.
    fn with_grabbing_paused<T>(
        &self,
        features: &[Feature],
        op: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let locked = || features.iter().copied().find(|f| !self.device.is_writable(*f));
        let Some(feature) = locked() else {
            return op();
        };
        if !self.device.is_grabbing() {
            warn!(handle = %self.handle(), "{feature} not writable");
            return Err(Error::unwritable(feature));
        }

        debug!(handle = %self.handle(), "pausing acquisition to write {feature}");
        self.device.stop_grabbing()?;
        let result = match locked() {
            Some(feature) => Err(Error::unwritable(feature)),
            None => op(),
        };
        let resumed = self.device.start_grabbing();
        let value = result?;
        resumed?;
        Ok(value)
    }

    /// Exposure time in microseconds.
    pub fn exposure(&self) -> Result<f64> {
        self.read_float(Feature::ExposureTime)
    }

    pub fn exposure_range(&self) -> Result<Bounds<f64>> {
        self.float_range(Feature::ExposureTime)
    }

    /// Switches to manual timed exposure and applies `micros`, clamped to the
    /// device range.
    pub fn set_exposure(&self, micros: f64) -> Result<f64> {
        self.require_finite(Feature::ExposureTime, micros)?;
        self.require_writable(Feature::ExposureTime)?;
        self.require_writable(Feature::ExposureAuto)?;
        self.require_writable(Feature::ExposureMode)?;

        self.device.set_enumeration(Feature::ExposureAuto, "Off")?;
        self.device.set_enumeration(Feature::ExposureMode, "Timed")?;
        let applied = self.write_clamped(Feature::ExposureTime, micros)?;
        self.set_if_writable(Feature::ExposureTimeMode, "Standard")?;
        Ok(applied)
    }

    pub fn auto_exposure(&self) -> Result<bool> {
        self.require_readable(Feature::ExposureAuto)?;
        Ok(self.device.enumeration(Feature::ExposureAuto)? != "Off")
    }

    pub fn set_auto_exposure(&self, enable: bool) -> Result<()> {
        self.require_writable(Feature::ExposureAuto)?;
        let entry = if enable { "Continuous" } else { "Off" };
        Ok(self.device.set_enumeration(Feature::ExposureAuto, entry)?)
    }

    /// Gain in dB.
    pub fn gain(&self) -> Result<f64> {
        self.read_float(Feature::Gain)
    }

    pub fn gain_range(&self) -> Result<Bounds<f64>> {
        self.float_range(Feature::Gain)
    }

    /// Selects all gain taps, disables auto gain and applies `gain`, clamped
    /// to the device range.
    pub fn set_gain(&self, gain: f64) -> Result<f64> {
        self.require_finite(Feature::Gain, gain)?;
        self.require_writable(Feature::Gain)?;
        self.require_writable(Feature::GainSelector)?;

        self.device.set_enumeration(Feature::GainSelector, "All")?;
        self.set_if_writable(Feature::GainAuto, "Off")?;
        self.write_clamped(Feature::Gain, gain)
    }

    /// Acquisition frame rate in Hz.
    pub fn frame_rate(&self) -> Result<f64> {
        self.read_float(Feature::AcquisitionFrameRate)
    }

    pub fn frame_rate_range(&self) -> Result<Bounds<f64>> {
        self.float_range(Feature::AcquisitionFrameRate)
    }

    /// Enables the frame rate limit, where the device has one, and applies
    /// `fps`, clamped to the device range.
    pub fn set_frame_rate(&self, fps: f64) -> Result<f64> {
        self.require_finite(Feature::AcquisitionFrameRate, fps)?;
        self.require_writable(Feature::AcquisitionFrameRate)?;
        if self.device.is_writable(Feature::AcquisitionFrameRateEnable) {
            self.device
                .set_boolean(Feature::AcquisitionFrameRateEnable, true)?;
        }
        self.write_clamped(Feature::AcquisitionFrameRate, fps)
    }

    /// Red, green and blue balance ratios.
    pub fn white_balance(&self) -> Result<[f64; 3]> {
        self.require_readable(Feature::BalanceRatio)?;
        self.require_writable(Feature::BalanceRatioSelector)?;

        let mut ratios = [0.0; 3];
        for (ratio, channel) in ratios.iter_mut().zip(CHANNELS) {
            self.device
                .set_enumeration(Feature::BalanceRatioSelector, channel)?;
            *ratio = self.device.float(Feature::BalanceRatio)?;
        }
        Ok(ratios)
    }

    pub fn white_balance_range(&self) -> Result<Bounds<f64>> {
        self.float_range(Feature::BalanceRatio)
    }

    /// Disables auto white balance and writes the red, green and blue ratios,
    /// each clamped to the device range.
    ///
    /// The three channels are written one after another. If a channel write
    /// fails, the channels already written are restored to their previous
    /// ratios before the error is returned. Restoring is best effort and
    /// skipped when the ratios could not be read beforehand.
    pub fn set_white_balance(&self, ratios: [f64; 3]) -> Result<[f64; 3]> {
        for ratio in ratios {
            self.require_finite(Feature::BalanceRatio, ratio)?;
        }
        self.require_writable(Feature::BalanceRatio)?;
        self.require_writable(Feature::BalanceRatioSelector)?;

        if let Err(err) = self.set_auto_white_balance(false) {
            debug!(handle = %self.handle(), "auto white balance left unchanged: {err}");
        }

        let snapshot = if self.device.is_readable(Feature::BalanceRatio) {
            self.white_balance().ok()
        } else {
            None
        };
        let bounds = self.device.float_bounds(Feature::BalanceRatio)?;

        let mut applied = [0.0; 3];
        for (i, channel) in CHANNELS.iter().enumerate() {
            applied[i] = bounds.clamp(ratios[i]);
            let written = self
                .device
                .set_enumeration(Feature::BalanceRatioSelector, channel)
                .and_then(|_| self.device.set_float(Feature::BalanceRatio, applied[i]));

            if let Err(err) = written {
                warn!(handle = %self.handle(), "white balance failed on {channel}: {err}");
                if let Some(previous) = snapshot {
                    self.restore_white_balance(&previous[..i]);
                }
                return Err(err.into());
            }
        }
        Ok(applied)
    }

    fn restore_white_balance(&self, previous: &[f64]) {
        for (channel, &ratio) in CHANNELS.iter().zip(previous) {
            let restored = self
                .device
                .set_enumeration(Feature::BalanceRatioSelector, channel)
                .and_then(|_| self.device.set_float(Feature::BalanceRatio, ratio));
            if let Err(err) = restored {
                warn!(handle = %self.handle(), "could not restore {channel} balance: {err}");
            }
        }
    }

    pub fn auto_white_balance(&self) -> Result<bool> {
        self.require_readable(Feature::BalanceWhiteAuto)?;
        Ok(self.device.enumeration(Feature::BalanceWhiteAuto)? != "Off")
    }

    pub fn set_auto_white_balance(&self, enable: bool) -> Result<()> {
        self.require_writable(Feature::BalanceWhiteAuto)?;
        let entry = if enable { "Continuous" } else { "Off" };
        Ok(self.device.set_enumeration(Feature::BalanceWhiteAuto, entry)?)
    }

    /// Format code of the current device pixel format, [`UNKNOWN`] for
    /// formats without one.
    pub fn pixel_format(&self) -> Result<i32> {
        self.require_readable(Feature::PixelFormat)?;
        let entry = self.device.enumeration(Feature::PixelFormat)?;
        Ok(PixelType::from_symbolic(&entry).map_or(UNKNOWN, format_code))
    }

    /// Format codes the device can currently be switched to, without
    /// duplicates.
    pub fn supported_pixel_formats(&self) -> Result<Vec<i32>> {
        self.require_readable(Feature::PixelFormat)?;
        let mut codes = Vec::new();
        for entry in self.device.settable_entries(Feature::PixelFormat)? {
            let code = PixelType::from_symbolic(&entry).map_or(UNKNOWN, format_code);
            if code != UNKNOWN && !codes.contains(&code) {
                codes.push(code);
            }
        }
        Ok(codes)
    }

    /// Switches the device to the pixel format selected by `code`. A camera
    /// that is grabbing is paused for the switch and resumed afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `code` is unknown or the device
    /// offers no matching `PixelFormat` entry.
    pub fn set_pixel_format(&self, code: i32) -> Result<()> {
        self.require_readable(Feature::PixelFormat)?;
        let settable = self.device.settable_entries(Feature::PixelFormat)?;
        let entry = format_entries(code)
            .iter()
            .find(|entry| settable.iter().any(|s| s == *entry))
            .ok_or_else(|| {
                Error::InvalidArgument(format!("pixel format code {code} is not supported"))
            })?;

        self.with_grabbing_paused(&[Feature::PixelFormat], || {
            self.device.set_enumeration(Feature::PixelFormat, entry)?;
            debug!(handle = %self.handle(), code, entry, "pixel format set");
            Ok(())
        })
    }

    pub fn brightness(&self) -> Result<f64> {
        self.read_float(Feature::BslBrightness)
    }

    /// Applies `brightness`, clamped to the device range.
    pub fn set_brightness(&self, brightness: f64) -> Result<f64> {
        self.require_finite(Feature::BslBrightness, brightness)?;
        self.require_writable(Feature::BslBrightness)?;
        self.write_clamped(Feature::BslBrightness, brightness)
    }

    fn has_hardware_binning(&self) -> bool {
        self.device.is_readable(Feature::BinningHorizontal)
            && self.device.is_readable(Feature::BinningVertical)
    }

    /// Rejects software factors larger than the frames the device delivers.
    fn check_frame_fits(&self, binning: Binning) -> Result<()> {
        if binning.horizontal == 0 || binning.vertical == 0 {
            return Err(Error::InvalidArgument(format!(
                "binning factors must be at least 1, got {}x{}",
                binning.horizontal, binning.vertical
            )));
        }
        if !self.device.is_readable(Feature::Width) || !self.device.is_readable(Feature::Height) {
            return Ok(());
        }
        let width = self.device.integer(Feature::Width)?;
        let height = self.device.integer(Feature::Height)?;
        if i64::from(binning.horizontal) > width || i64::from(binning.vertical) > height {
            warn!(handle = %self.handle(), ?binning, width, height, "binning exceeds frame");
            return Err(Error::InvalidArgument(format!(
                "cannot bin {width}x{height} frames by {}x{}",
                binning.horizontal, binning.vertical
            )));
        }
        Ok(())
    }

    /// Configures pixel binning.
    ///
    /// Cameras with binning features bin in hardware: the factors are clamped
    /// to the device bounds and acquisition is paused if grabbing locks them.
    /// Other cameras bin every converted frame in software, provided the
    /// factors fit within the device's current frame size.
    pub fn set_pixel_binning(&self, binning: Binning) -> Result<Binning> {
        let mut software = self.binning.lock().unwrap_or_else(PoisonError::into_inner);

        if !self.has_hardware_binning() {
            self.check_frame_fits(binning)?;
            *software = binning;
            debug!(handle = %self.handle(), ?binning, "software binning set");
            return Ok(binning);
        }

        let h_bounds = self.device.integer_bounds(Feature::BinningHorizontal)?;
        let v_bounds = self.device.integer_bounds(Feature::BinningVertical)?;
        let applied = Binning {
            mode: binning.mode,
            horizontal: h_bounds.clamp(i64::from(binning.horizontal)) as u32,
            vertical: v_bounds.clamp(i64::from(binning.vertical)) as u32,
        };

        self.with_grabbing_paused(
            &[Feature::BinningHorizontal, Feature::BinningVertical],
            || {
                for mode in [Feature::BinningHorizontalMode, Feature::BinningVerticalMode] {
                    self.set_if_writable(mode, applied.mode.entry())?;
                }
                self.device
                    .set_integer(Feature::BinningHorizontal, i64::from(applied.horizontal))?;
                self.device
                    .set_integer(Feature::BinningVertical, i64::from(applied.vertical))?;
                Ok(())
            },
        )?;

        *software = Binning::NONE;
        debug!(handle = %self.handle(), binning = ?applied, "hardware binning set");
        Ok(applied)
    }

    /// Active binning, software configuration first.
    pub fn pixel_binning(&self) -> Result<Binning> {
        let software = *self.binning.lock().unwrap_or_else(PoisonError::into_inner);
        if !software.is_identity() || !self.has_hardware_binning() {
            return Ok(software);
        }

        let mode = if self.device.is_readable(Feature::BinningHorizontalMode) {
            match self.device.enumeration(Feature::BinningHorizontalMode)?.as_str() {
                "Sum" => BinningMode::Sum,
                _ => BinningMode::Average,
            }
        } else {
            BinningMode::Average
        };
        let horizontal = self.device.integer(Feature::BinningHorizontal)?;
        let vertical = self.device.integer(Feature::BinningVertical)?;
        Binning::new(
            mode,
            u32::try_from(horizontal).unwrap_or(1),
            u32::try_from(vertical).unwrap_or(1),
        )
    }
}
