// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use camera_sdk::{
    emulator::{DeviceProfile, EmulatedSdk},
    Feature, Sdk,
};
use edgefirst_camera_bridge::{
    bridge::CameraBridge,
    config::BridgeConfig,
    image::{BGR, GRAY, UNKNOWN, UYVY, YUYV},
};
use std::{error::Error, sync::Arc, thread, time::Duration};

fn emulator() -> Arc<EmulatedSdk> {
    Arc::new(EmulatedSdk::new([
        DeviceProfile::new("DEVICE123", "daA1280-54uc").with_resolution(64, 48),
        DeviceProfile::new("MONO001", "daA1280-54um")
            .with_resolution(32, 16)
            .with_pixel_format("Mono8")
            .without(Feature::BalanceRatio),
    ]))
}

#[test]
fn test_camera_lifecycle() -> Result<(), Box<dyn Error>> {
    let bridge = CameraBridge::new(emulator(), BridgeConfig::default());
    assert!(bridge.is_runtime_ready());

    let camera = bridge.create_camera("DEVICE123");
    assert_ne!(camera, 0);
    assert!(bridge.start_acquisition(camera));
    assert!(bridge.await_next_frame(camera));

    let first = bridge.take_frame(camera);
    assert_ne!(first, 0);
    assert_eq!(bridge.frame_dimensions(first), Some((64, 48)));
    assert_eq!(bridge.frame_pixel_format(first), BGR);

    assert!(bridge.set_pixel_format(camera, GRAY));
    assert_eq!(bridge.pixel_format(camera), GRAY);
    assert!(bridge.await_next_frame(camera));
    let second = bridge.take_frame(camera);
    assert_ne!(second, first);
    assert_eq!(bridge.frame_pixel_format(second), GRAY);

    assert!(bridge.destroy_camera(camera));
    assert_eq!(bridge.take_frame(camera), 0);
    assert!(!bridge.start_acquisition(camera));

    // taken frames outlive their camera
    assert_eq!(bridge.frame_dimensions(first), Some((64, 48)));
    assert_eq!(bridge.frame_data(second).len(), 64 * 48);

    assert!(bridge.release_frame(first));
    assert!(!bridge.release_frame(first));
    assert_eq!(bridge.frame_dimensions(first), None);

    bridge.shutdown();
    assert_eq!(bridge.frame_dimensions(second), None);
    Ok(())
}

#[test]
fn test_device_listing() {
    let bridge = CameraBridge::new(emulator(), BridgeConfig::default());

    assert_eq!(bridge.connected_devices(), ["DEVICE123", "MONO001"]);
    assert_eq!(bridge.model_name("MONO001").as_deref(), Some("daA1280-54um"));
    assert_eq!(bridge.model_name("NOPE"), None);
    assert_eq!(bridge.create_camera("NOPE"), 0);
    bridge.shutdown();
}

#[test]
fn test_runtime_not_ready() {
    let sdk = emulator();
    sdk.fail_initialization(Some("no transport layer".to_string()));
    let bridge = CameraBridge::new(sdk, BridgeConfig::default());

    assert!(!bridge.is_runtime_ready());
    assert!(bridge.connected_devices().is_empty());
    assert_eq!(bridge.create_camera("DEVICE123"), 0);
}

#[test]
fn test_second_open_rejected() {
    let bridge = CameraBridge::new(emulator(), BridgeConfig::default());

    let camera = bridge.create_camera("DEVICE123");
    assert_ne!(camera, 0);
    assert_eq!(bridge.create_camera("DEVICE123"), 0);
    assert!(bridge.start_acquisition(camera));
    bridge.shutdown();
}

#[test]
fn test_unknown_camera_sentinels() {
    let bridge = CameraBridge::new(emulator(), BridgeConfig::default());

    for camera in [0, 12345] {
        assert!(!bridge.start_acquisition(camera));
        assert!(!bridge.stop_acquisition(camera));
        assert!(bridge.destroy_camera(camera));
        assert_eq!(bridge.exposure(camera), -1.0);
        assert!(!bridge.set_exposure(camera, 1000.0));
        assert_eq!(bridge.min_exposure(camera), -1.0);
        assert_eq!(bridge.max_gain(camera), -1.0);
        assert_eq!(bridge.frame_rate(camera), -1.0);
        assert_eq!(bridge.white_balance(camera), [-1.0; 3]);
        assert!(!bridge.set_white_balance(camera, [1.0; 3]));
        assert!(!bridge.auto_white_balance(camera));
        assert_eq!(bridge.pixel_format(camera), UNKNOWN);
        assert!(!bridge.set_pixel_format(camera, BGR));
        assert!(bridge.supported_pixel_formats(camera).is_empty());
        assert_eq!(bridge.brightness(camera), -1.0);
        assert!(!bridge.set_pixel_binning(camera, 0, 2, 2));
        assert!(!bridge.await_next_frame(camera));
        assert_eq!(bridge.take_frame(camera), 0);
    }
}

#[test]
fn test_unknown_frame_sentinels() {
    let bridge = CameraBridge::new(emulator(), BridgeConfig::default());

    for frame in [0, 77] {
        assert_eq!(bridge.frame_dimensions(frame), None);
        assert_eq!(bridge.frame_pixel_format(frame), UNKNOWN);
        assert!(bridge.frame_data(frame).is_empty());
        assert!(bridge.frame_png(frame).is_empty());
        assert!(!bridge.release_frame(frame));
    }
}

#[test]
fn test_await_without_acquisition() {
    let bridge = CameraBridge::new(emulator(), BridgeConfig::default());
    let camera = bridge.create_camera("DEVICE123");

    assert!(!bridge.await_next_frame(camera));
    assert_eq!(bridge.take_frame(camera), 0);

    assert!(bridge.stop_acquisition(camera));
    bridge.shutdown();
}

#[test]
fn test_parameters() {
    let bridge = CameraBridge::new(emulator(), BridgeConfig::default());
    let camera = bridge.create_camera("DEVICE123");

    assert!(bridge.set_exposure(camera, 5_000_000.0));
    assert_eq!(bridge.exposure(camera), bridge.max_exposure(camera));
    assert_eq!(bridge.min_exposure(camera), 20.0);

    assert!(bridge.set_gain(camera, 6.0));
    assert_eq!(bridge.gain(camera), 6.0);
    assert_eq!(bridge.min_gain(camera), 0.0);

    assert!(bridge.set_frame_rate(camera, 30.0));
    assert_eq!(bridge.frame_rate(camera), 30.0);

    assert!(bridge.set_auto_exposure(camera, true));
    assert!(bridge.auto_exposure(camera));

    assert!(bridge.set_white_balance(camera, [1.5, 1.0, 2.5]));
    assert_eq!(bridge.white_balance(camera), [1.5, 1.0, 2.5]);
    assert_eq!(bridge.min_white_balance(camera), 1.0);
    assert_eq!(bridge.max_white_balance(camera), 15.984375);
    assert!(bridge.set_auto_white_balance(camera, true));
    assert!(bridge.auto_white_balance(camera));

    assert_eq!(bridge.supported_pixel_formats(camera), [GRAY, BGR, YUYV, UYVY]);
    assert!(!bridge.set_pixel_format(camera, 42));

    assert!(bridge.set_brightness(camera, -0.5));
    assert_eq!(bridge.brightness(camera), -0.5);

    bridge.shutdown();
}

#[test]
fn test_missing_capability() {
    let bridge = CameraBridge::new(emulator(), BridgeConfig::default());
    let camera = bridge.create_camera("MONO001");

    assert_eq!(bridge.white_balance(camera), [-1.0; 3]);
    assert!(!bridge.set_white_balance(camera, [2.0; 3]));
    assert_eq!(bridge.max_white_balance(camera), -1.0);
    assert_eq!(bridge.pixel_format(camera), GRAY);

    bridge.shutdown();
}

#[test]
fn test_pixel_binning() {
    let bridge = CameraBridge::new(emulator(), BridgeConfig::default());
    let camera = bridge.create_camera("DEVICE123");
    assert!(bridge.start_acquisition(camera));

    assert!(!bridge.set_pixel_binning(camera, 5, 2, 2));
    assert!(!bridge.set_pixel_binning(camera, 0, -2, 2));
    assert!(!bridge.set_pixel_binning(camera, 0, 0, 2));

    assert!(bridge.set_pixel_binning(camera, 1, 2, 2));
    assert!(bridge.await_next_frame(camera));
    let frame = bridge.take_frame(camera);
    assert_eq!(bridge.frame_dimensions(frame), Some((32, 24)));

    bridge.shutdown();
}

#[test]
fn test_frame_export() -> Result<(), Box<dyn Error>> {
    let bridge = CameraBridge::new(emulator(), BridgeConfig::default());
    let camera = bridge.create_camera("DEVICE123");
    assert!(bridge.start_acquisition(camera));
    assert!(bridge.await_next_frame(camera));

    let frame = bridge.take_frame(camera);
    let data = bridge.frame_data(frame);
    assert_eq!(data.len(), 64 * 48 * 3);

    let png = bridge.frame_png(frame);
    let decoded = image::load_from_memory(&png)?;
    assert_eq!((decoded.width(), decoded.height()), (64, 48));

    // the cached frame is shared, so taking it twice gives equal pixels
    let again = bridge.take_frame(camera);
    assert_ne!(again, frame);
    assert_eq!(bridge.frame_data(again), data);

    bridge.shutdown();
    Ok(())
}

#[test]
fn test_driver_panic_contained() {
    let sdk = emulator();
    let bridge = CameraBridge::new(sdk.clone(), BridgeConfig::default());
    let camera = bridge.create_camera("DEVICE123");
    let control = sdk.control("DEVICE123");

    if let Some(control) = &control {
        control.panic_on(Some(Feature::Gain));
    }
    assert_eq!(bridge.gain(camera), -1.0);
    assert!(!bridge.set_gain(camera, 3.0));
    assert_eq!(bridge.exposure(camera), 5000.0);

    if let Some(control) = &control {
        control.panic_on(Some(Feature::PixelFormat));
    }
    assert_eq!(bridge.pixel_format(camera), UNKNOWN);
    assert!(bridge.supported_pixel_formats(camera).is_empty());

    if let Some(control) = &control {
        control.panic_on(None);
    }
    assert_eq!(bridge.gain(camera), 0.0);
    assert_eq!(bridge.pixel_format(camera), BGR);

    bridge.shutdown();
}

#[test]
fn test_destroy_unblocks_await() -> Result<(), Box<dyn Error>> {
    let sdk = emulator();
    let bridge = Arc::new(CameraBridge::new(sdk.clone(), BridgeConfig::default()));
    let camera = bridge.create_camera("DEVICE123");
    assert!(bridge.start_acquisition(camera));
    sdk.control("DEVICE123").ok_or("no control")?.set_stalled(true);

    let waiter = {
        let bridge = bridge.clone();
        thread::spawn(move || bridge.await_next_frame(camera))
    };
    thread::sleep(Duration::from_millis(100));
    assert!(bridge.destroy_camera(camera));

    let delivered = waiter.join().map_err(|_| "waiter panicked")?;
    assert!(!delivered);
    assert!(!sdk.control("DEVICE123").ok_or("no control")?.is_open());

    bridge.shutdown();
    assert!(!sdk.is_initialized());
    Ok(())
}
