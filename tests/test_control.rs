// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use camera_sdk::{
    emulator::{DeviceProfile, EmulatedSdk, EmulatorControl},
    Access, Feature,
};
use edgefirst_camera_bridge::{
    binning::{Binning, BinningMode},
    config::BridgeConfig,
    control::{format_code, format_entries},
    image::{PixelLayout, BGR, GRAY, UNKNOWN, UYVY, YUYV},
    registry::Registry,
    session::CameraSession,
    Error as BridgeError,
};
use std::{error::Error, sync::Arc};

struct Fixture {
    registry: Registry,
    camera: Arc<CameraSession>,
    control: EmulatorControl,
}

impl Drop for Fixture {
    fn drop(&mut self) {
        self.registry.shutdown_all();
    }
}

fn open(profile: DeviceProfile) -> Result<Fixture, Box<dyn Error>> {
    let serial = profile.serial.clone();
    let sdk = Arc::new(EmulatedSdk::new([profile]));
    let control = sdk.control(&serial).ok_or("no control")?;
    let registry = Registry::new(sdk, BridgeConfig::default());
    let camera = registry.get(registry.create(&serial)?)?;
    Ok(Fixture {
        registry,
        camera,
        control,
    })
}

fn color_camera() -> Result<Fixture, Box<dyn Error>> {
    open(DeviceProfile::new("DEVICE123", "daA1280-54uc").with_resolution(64, 48))
}

fn is_unavailable(err: &BridgeError, feature: Feature, access: Access) -> bool {
    matches!(
        err,
        BridgeError::CapabilityUnavailable { feature: f, access: a } if *f == feature && *a == access
    )
}

#[test]
fn test_exposure() -> Result<(), Box<dyn Error>> {
    let fx = color_camera()?;

    assert_eq!(fx.camera.exposure()?, 5000.0);
    let range = fx.camera.exposure_range()?;
    assert_eq!((range.min, range.max), (20.0, 1_000_000.0));

    assert_eq!(fx.camera.set_exposure(12_500.0)?, 12_500.0);
    assert_eq!(fx.control.float(Feature::ExposureTime), Some(12_500.0));
    assert_eq!(fx.control.enumeration(Feature::ExposureMode).as_deref(), Some("Timed"));

    assert_eq!(fx.camera.set_exposure(5_000_000.0)?, 1_000_000.0);
    assert_eq!(fx.camera.exposure()?, 1_000_000.0);
    assert_eq!(fx.camera.set_exposure(1.0)?, 20.0);
    Ok(())
}

#[test]
fn test_non_finite_values_rejected() -> Result<(), Box<dyn Error>> {
    let fx = color_camera()?;
    fx.camera.set_auto_exposure(true)?;

    for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        assert!(matches!(
            fx.camera.set_exposure(value),
            Err(BridgeError::InvalidArgument(_))
        ));
        assert!(fx.camera.set_gain(value).is_err());
        assert!(fx.camera.set_frame_rate(value).is_err());
        assert!(fx.camera.set_brightness(value).is_err());
        assert!(fx.camera.set_white_balance([1.0, value, 1.0]).is_err());
    }

    assert_eq!(fx.control.float(Feature::ExposureTime), Some(5000.0));
    assert!(fx.camera.auto_exposure()?);
    assert_eq!(fx.control.balance(), [1.0; 3]);
    Ok(())
}

#[test]
fn test_set_exposure_disables_auto() -> Result<(), Box<dyn Error>> {
    let fx = color_camera()?;

    fx.camera.set_auto_exposure(true)?;
    assert!(fx.camera.auto_exposure()?);
    assert_eq!(
        fx.control.enumeration(Feature::ExposureAuto).as_deref(),
        Some("Continuous")
    );

    fx.camera.set_exposure(1000.0)?;
    assert!(!fx.camera.auto_exposure()?);
    assert_eq!(fx.control.enumeration(Feature::ExposureAuto).as_deref(), Some("Off"));
    Ok(())
}

#[test]
fn test_gain() -> Result<(), Box<dyn Error>> {
    let fx = color_camera()?;

    assert_eq!(fx.camera.set_gain(12.0)?, 12.0);
    assert_eq!(fx.camera.gain()?, 12.0);
    assert_eq!(fx.control.enumeration(Feature::GainSelector).as_deref(), Some("All"));
    assert_eq!(fx.control.enumeration(Feature::GainAuto).as_deref(), Some("Off"));

    assert_eq!(fx.camera.set_gain(-3.0)?, 0.0);
    assert_eq!(fx.camera.set_gain(99.0)?, 24.0);
    let range = fx.camera.gain_range()?;
    assert_eq!((range.min, range.max), (0.0, 24.0));
    Ok(())
}

#[test]
fn test_gain_read_only() -> Result<(), Box<dyn Error>> {
    let fx = open(DeviceProfile::new("RO", "daA1280-54uc").read_only(Feature::Gain))?;

    assert_eq!(fx.camera.gain()?, 0.0);
    let err = fx.camera.set_gain(3.0).err().ok_or("write accepted")?;
    assert!(is_unavailable(&err, Feature::Gain, Access::Write), "{err}");
    assert_eq!(fx.control.float(Feature::Gain), Some(0.0));
    Ok(())
}

#[test]
fn test_frame_rate() -> Result<(), Box<dyn Error>> {
    let fx = color_camera()?;

    assert_eq!(fx.camera.frame_rate()?, 60.0);
    assert_eq!(fx.camera.set_frame_rate(500.0)?, 120.0);
    assert_eq!(fx.control.boolean(Feature::AcquisitionFrameRateEnable), Some(true));
    assert_eq!(fx.camera.set_frame_rate(25.0)?, 25.0);
    assert_eq!(fx.camera.frame_rate_range()?.max, 120.0);
    Ok(())
}

#[test]
fn test_white_balance() -> Result<(), Box<dyn Error>> {
    let fx = color_camera()?;
    fx.camera.set_auto_white_balance(true)?;
    assert!(fx.camera.auto_white_balance()?);

    assert_eq!(fx.camera.white_balance()?, [1.0; 3]);
    assert_eq!(fx.camera.set_white_balance([2.0, 3.0, 4.0])?, [2.0, 3.0, 4.0]);
    assert_eq!(fx.camera.white_balance()?, [2.0, 3.0, 4.0]);
    assert_eq!(fx.control.balance(), [2.0, 3.0, 4.0]);
    assert!(!fx.camera.auto_white_balance()?);

    let applied = fx.camera.set_white_balance([0.5, 100.0, 8.0])?;
    assert_eq!(applied, [1.0, 15.984375, 8.0]);

    let range = fx.camera.white_balance_range()?;
    assert_eq!((range.min, range.max), (1.0, 15.984375));
    Ok(())
}

#[test]
fn test_white_balance_rollback() -> Result<(), Box<dyn Error>> {
    let fx = color_camera()?;
    fx.camera.set_white_balance([2.0, 3.0, 4.0])?;

    fx.control.fail_writes_when(Feature::BalanceRatio, "Blue");
    let result = fx.camera.set_white_balance([5.0, 6.0, 7.0]);
    assert!(matches!(result, Err(BridgeError::Driver(_))));
    assert_eq!(fx.control.balance(), [2.0, 3.0, 4.0]);

    fx.control.clear_faults();
    fx.camera.set_white_balance([5.0, 6.0, 7.0])?;
    assert_eq!(fx.control.balance(), [5.0, 6.0, 7.0]);
    Ok(())
}

#[test]
fn test_white_balance_unavailable() -> Result<(), Box<dyn Error>> {
    let fx = open(
        DeviceProfile::new("MONO001", "daA1280-54um")
            .with_pixel_format("Mono8")
            .without(Feature::BalanceRatio),
    )?;

    let err = fx.camera.white_balance().err().ok_or("read accepted")?;
    assert!(is_unavailable(&err, Feature::BalanceRatio, Access::Read), "{err}");
    let err = fx.camera.set_white_balance([1.0; 3]).err().ok_or("write accepted")?;
    assert!(is_unavailable(&err, Feature::BalanceRatio, Access::Write), "{err}");
    assert!(fx.camera.white_balance_range().is_err());
    Ok(())
}

#[test]
fn test_format_codes() {
    use camera_sdk::PixelType;

    assert_eq!(format_code(PixelType::Rgb8Packed), BGR);
    assert_eq!(format_code(PixelType::Bgr8Packed), BGR);
    assert_eq!(format_code(PixelType::Mono8), GRAY);
    assert_eq!(format_code(PixelType::Yuv422Yuyv), YUYV);
    assert_eq!(format_code(PixelType::Yuv422Uyvy), UYVY);
    assert_eq!(format_code(PixelType::Mono12), UNKNOWN);

    assert_eq!(format_entries(GRAY), ["Mono8"]);
    assert!(format_entries(UNKNOWN).is_empty());
    assert!(format_entries(3).is_empty());
}

#[test]
fn test_pixel_format() -> Result<(), Box<dyn Error>> {
    let fx = color_camera()?;

    assert_eq!(fx.camera.pixel_format()?, BGR);
    assert_eq!(fx.camera.supported_pixel_formats()?, [GRAY, BGR, YUYV, UYVY]);

    fx.camera.set_pixel_format(GRAY)?;
    assert_eq!(fx.camera.pixel_format()?, GRAY);
    assert_eq!(fx.control.enumeration(Feature::PixelFormat).as_deref(), Some("Mono8"));

    fx.camera.set_pixel_format(BGR)?;
    assert_eq!(fx.control.enumeration(Feature::PixelFormat).as_deref(), Some("RGB8"));

    assert!(matches!(
        fx.camera.set_pixel_format(99),
        Err(BridgeError::InvalidArgument(_))
    ));
    assert_eq!(fx.camera.pixel_format()?, BGR);
    Ok(())
}

#[test]
fn test_pixel_format_not_offered() -> Result<(), Box<dyn Error>> {
    let mut profile = DeviceProfile::new("MONO001", "daA1280-54um").with_pixel_format("Mono8");
    profile.pixel_formats = vec!["Mono8".to_string()];
    let fx = open(profile)?;

    assert_eq!(fx.camera.supported_pixel_formats()?, [GRAY]);
    assert!(matches!(
        fx.camera.set_pixel_format(UYVY),
        Err(BridgeError::InvalidArgument(_))
    ));
    Ok(())
}

#[test]
fn test_pixel_format_while_grabbing() -> Result<(), Box<dyn Error>> {
    let fx = color_camera()?;
    fx.camera.start()?;
    fx.camera.await_next()?;

    fx.camera.set_pixel_format(YUYV)?;
    assert!(fx.camera.is_grabbing());
    assert_eq!(fx.camera.pixel_format()?, YUYV);

    let frame = fx.camera.await_next()?;
    assert_eq!(frame.layout(), PixelLayout::Bgr8);
    assert_eq!((frame.width(), frame.height()), (64, 48));

    fx.camera.set_pixel_format(GRAY)?;
    let frame = fx.camera.await_next()?;
    assert_eq!(frame.format_code(), GRAY);
    assert_eq!(frame.size(), 64 * 48);
    Ok(())
}

#[test]
fn test_brightness() -> Result<(), Box<dyn Error>> {
    let fx = color_camera()?;

    assert_eq!(fx.camera.brightness()?, 0.0);
    assert_eq!(fx.camera.set_brightness(0.25)?, 0.25);
    assert_eq!(fx.camera.set_brightness(5.0)?, 1.0);
    assert_eq!(fx.control.float(Feature::BslBrightness), Some(1.0));

    let fx = open(DeviceProfile::new("NB", "acA1920-40um").without(Feature::BslBrightness))?;
    let err = fx.camera.set_brightness(0.5).err().ok_or("write accepted")?;
    assert!(is_unavailable(&err, Feature::BslBrightness, Access::Write), "{err}");
    Ok(())
}

#[test]
fn test_hardware_binning() -> Result<(), Box<dyn Error>> {
    let fx = color_camera()?;
    fx.camera.start()?;

    let applied = fx
        .camera
        .set_pixel_binning(Binning::new(BinningMode::Average, 2, 2)?)?;
    assert_eq!(applied, Binning::new(BinningMode::Average, 2, 2)?);
    assert!(fx.camera.is_grabbing());
    assert_eq!(fx.control.integer(Feature::BinningHorizontal), Some(2));
    assert_eq!(
        fx.control.enumeration(Feature::BinningVerticalMode).as_deref(),
        Some("Average")
    );
    assert_eq!(fx.camera.pixel_binning()?, applied);

    let frame = fx.camera.await_next()?;
    assert_eq!((frame.width(), frame.height()), (32, 24));

    let clamped = fx
        .camera
        .set_pixel_binning(Binning::new(BinningMode::Sum, 8, 3)?)?;
    assert_eq!((clamped.horizontal, clamped.vertical), (4, 3));
    assert_eq!(fx.camera.pixel_binning()?.mode, BinningMode::Sum);

    let frame = fx.camera.await_next()?;
    assert_eq!((frame.width(), frame.height()), (16, 16));
    assert_eq!(fx.control.integer(Feature::Width), Some(16));
    assert_eq!(fx.control.integer(Feature::Height), Some(16));
    Ok(())
}

#[test]
fn test_software_binning() -> Result<(), Box<dyn Error>> {
    let fx = open(
        DeviceProfile::new("NOBIN", "daA1280-54um")
            .with_resolution(64, 48)
            .with_pixel_format("Mono8")
            .with_max_binning(1),
    )?;
    assert_eq!(fx.camera.pixel_binning()?, Binning::NONE);

    let binning = Binning::new(BinningMode::Average, 2, 4)?;
    assert_eq!(fx.camera.set_pixel_binning(binning)?, binning);
    assert_eq!(fx.camera.pixel_binning()?, binning);
    assert_eq!(fx.control.integer(Feature::BinningHorizontal), None);

    fx.camera.start()?;
    let frame = fx.camera.await_next()?;
    assert_eq!((frame.width(), frame.height()), (32, 12));
    assert_eq!(frame.format_code(), GRAY);

    fx.camera.set_pixel_binning(Binning::NONE)?;
    let frame = fx.camera.await_next()?;
    assert_eq!((frame.width(), frame.height()), (64, 48));
    Ok(())
}

#[test]
fn test_software_binning_larger_than_frame() -> Result<(), Box<dyn Error>> {
    let fx = open(
        DeviceProfile::new("NOBIN", "daA1280-54um")
            .with_resolution(32, 16)
            .with_pixel_format("Mono8")
            .with_max_binning(1),
    )?;
    let binning = Binning::new(BinningMode::Average, 2, 2)?;
    fx.camera.set_pixel_binning(binning)?;

    for (h, v) in [(1000, 1), (1, 17), (33, 16)] {
        assert!(matches!(
            fx.camera.set_pixel_binning(Binning::new(BinningMode::Average, h, v)?),
            Err(BridgeError::InvalidArgument(_))
        ));
    }
    assert_eq!(fx.camera.pixel_binning()?, binning);

    fx.camera.start()?;
    let frame = fx.camera.await_next()?;
    assert_eq!((frame.width(), frame.height()), (16, 8));

    let whole = Binning::new(BinningMode::Average, 32, 16)?;
    fx.camera.set_pixel_binning(whole)?;
    let frame = fx.camera.await_next()?;
    assert_eq!((frame.width(), frame.height()), (1, 1));
    Ok(())
}

#[test]
fn test_controls_need_open_device() -> Result<(), Box<dyn Error>> {
    let fx = color_camera()?;
    fx.camera.close()?;

    let err = fx.camera.exposure().err().ok_or("read accepted")?;
    assert!(is_unavailable(&err, Feature::ExposureTime, Access::Read), "{err}");
    assert!(fx.camera.set_gain(1.0).is_err());
    assert!(fx.camera.pixel_format().is_err());
    Ok(())
}
