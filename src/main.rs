// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use args::Args;
use camera_sdk::emulator::{DeviceProfile, EmulatedSdk};
use clap::Parser;
use edgefirst_camera_bridge::{binning::BinningMode, bridge::CameraBridge};
use std::{error::Error, fs, sync::Arc, thread, time::Instant};
use tracing::{debug, info, warn};
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, Layer};

mod args;

fn update_fps(prev: &mut Instant, history: &mut [i64], index: &mut usize) -> i64 {
    let now = Instant::now();

    let elapsed = now.duration_since(*prev);
    *prev = now;

    history[*index] = 1e9 as i64 / (elapsed.as_nanos() as i64).max(1);
    *index = (*index + 1) % history.len();

    (history.iter().sum::<i64>() as f64 / history.len() as f64).round() as i64
}

fn init_logging(args: &Args) -> Result<(), Box<dyn Error>> {
    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let stdout = tracing_subscriber::fmt::layer().with_filter(level);

    let journald = if args.journald {
        match tracing_journald::layer() {
            Ok(layer) => Some(layer.with_filter(level)),
            Err(err) => {
                eprintln!("journald unavailable: {err}");
                None
            }
        }
    } else {
        None
    };

    let tracy = if args.tracy {
        tracy_client::Client::start();
        Some(tracing_tracy::TracyLayer::default().with_filter(level))
    } else {
        None
    };

    let subscriber = tracing_subscriber::registry()
        .with(stdout)
        .with(journald)
        .with(tracy);
    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(&args)?;

    let profiles = match &args.profile {
        Some(path) => DeviceProfile::load(path)?,
        None => vec![DeviceProfile::default()],
    };
    let sdk = Arc::new(EmulatedSdk::new(profiles));
    let bridge = Arc::new(CameraBridge::new(sdk, args.bridge_config()?));

    if !bridge.is_runtime_ready() {
        return Err("camera SDK runtime failed to initialize".into());
    }

    let devices = bridge.connected_devices();
    for serial in &devices {
        let model = bridge.model_name(serial).unwrap_or_default();
        if args.list {
            println!("{serial}\t{model}");
        } else {
            info!(serial = %serial, model = %model, "camera connected");
        }
    }
    if args.list {
        bridge.shutdown();
        return Ok(());
    }

    let serial = args
        .serial
        .clone()
        .or_else(|| devices.first().cloned())
        .ok_or("no camera connected")?;

    let camera = bridge.create_camera(&serial);
    if camera == 0 {
        bridge.shutdown();
        return Err(format!("could not open camera {serial}").into());
    }

    apply_controls(&bridge, camera, &args);
    let result = stream(&bridge, camera, &args);

    bridge.destroy_camera(camera);
    bridge.shutdown();
    result
}

fn apply_controls(bridge: &CameraBridge, camera: u64, args: &Args) {
    if let Some(format) = args.pixel_format {
        if !bridge.set_pixel_format(camera, format.code()) {
            warn!(?format, "pixel format not applied");
        }
    }
    if let Some(exposure) = args.exposure {
        if !bridge.set_exposure(camera, exposure) {
            warn!(exposure, "exposure not applied");
        }
    }
    if let Some(gain) = args.gain {
        if !bridge.set_gain(camera, gain) {
            warn!(gain, "gain not applied");
        }
    }
    if let Some(fps) = args.frame_rate {
        if !bridge.set_frame_rate(camera, fps) {
            warn!(fps, "frame rate not applied");
        }
    }
    let white_balance = args
        .white_balance
        .as_deref()
        .and_then(|wb| <[f64; 3]>::try_from(wb).ok());
    if let Some([red, green, blue]) = white_balance {
        if !bridge.set_white_balance(camera, [red, green, blue]) {
            warn!(red, green, blue, "white balance not applied");
        }
    }
    if let Some(&[horizontal, vertical]) = args.binning.as_deref() {
        let mode = BinningMode::from(args.binning_mode);
        let applied = i32::try_from(horizontal)
            .ok()
            .zip(i32::try_from(vertical).ok())
            .is_some_and(|(h, v)| bridge.set_pixel_binning(camera, mode.code(), h, v));
        if !applied {
            warn!(horizontal, vertical, "binning not applied");
        }
    }

    info!(
        exposure = bridge.exposure(camera),
        gain = bridge.gain(camera),
        frame_rate = bridge.frame_rate(camera),
        pixel_format = bridge.pixel_format(camera),
        "camera configured"
    );
}

fn stream(bridge: &Arc<CameraBridge>, camera: u64, args: &Args) -> Result<(), Box<dyn Error>> {
    if !bridge.start_acquisition(camera) {
        return Err("could not start acquisition".into());
    }

    // Frame rate samples flow to the consumer; the frame itself is taken from
    // the cache.
    let (tx, rx) = kanal::bounded::<i64>(4);
    let frames = args.frames;
    let acquisition = {
        let bridge = bridge.clone();
        thread::Builder::new()
            .name("acquisition".to_string())
            .spawn(move || {
                let mut prev = Instant::now();
                let mut history = vec![0; 30];
                let mut index = 0;
                for _ in 0..frames {
                    if !bridge.await_next_frame(camera) {
                        warn!("acquisition ended without a frame");
                        break;
                    }
                    let fps = update_fps(&mut prev, &mut history, &mut index);
                    if tx.send(fps).is_err() {
                        break;
                    }
                }
            })?
    };

    let mut snapshot = args.snapshot.clone();
    let mut received = 0u64;
    while let Ok(fps) = rx.recv() {
        received += 1;
        let frame = bridge.take_frame(camera);
        if frame == 0 {
            continue;
        }

        let (width, height) = bridge.frame_dimensions(frame).unwrap_or_default();
        debug!(
            width,
            height,
            format = bridge.frame_pixel_format(frame),
            fps,
            "frame"
        );
        if received % 30 == 0 {
            info!(received, fps, "streaming");
        }

        if let Some(path) = snapshot.take() {
            let png = bridge.frame_png(frame);
            if png.is_empty() {
                warn!("snapshot encoding failed");
            } else {
                fs::write(&path, png)?;
                info!(path = %path.display(), width, height, "snapshot written");
            }
        }
        bridge.release_frame(frame);
    }

    if acquisition.join().is_err() {
        warn!("acquisition thread panicked");
    }
    bridge.stop_acquisition(camera);
    info!(received, "acquisition finished");
    Ok(())
}
