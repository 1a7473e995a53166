// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use clap::Parser;
use edgefirst_camera_bridge::{
    binning::BinningMode,
    config::BridgeConfig,
    image::{BGR, GRAY, UYVY, YUYV},
};
use std::{error::Error, path::PathBuf, time::Duration};

/// Pixel formats selectable from the command line.
#[derive(clap::ValueEnum, Clone, Debug, PartialEq, Copy)]
pub enum PixelFormatSetting {
    /// 3-channel BGR (device RGB8 or BGR8)
    Bgr,
    /// Single-channel 8-bit
    Mono,
    /// YUV 4:2:2 YUYV, delivered as BGR
    Yuyv,
    /// YUV 4:2:2 UYVY, delivered as BGR
    Uyvy,
}

impl PixelFormatSetting {
    pub fn code(self) -> i32 {
        match self {
            PixelFormatSetting::Bgr => BGR,
            PixelFormatSetting::Mono => GRAY,
            PixelFormatSetting::Yuyv => YUYV,
            PixelFormatSetting::Uyvy => UYVY,
        }
    }
}

/// Pixel binning modes.
#[derive(clap::ValueEnum, Clone, Debug, PartialEq, Copy)]
pub enum BinningSetting {
    /// Average each bin
    Average,
    /// Sum each bin and normalize to 8 bits
    Sum,
}

impl From<BinningSetting> for BinningMode {
    fn from(setting: BinningSetting) -> Self {
        match setting {
            BinningSetting::Average => BinningMode::Average,
            BinningSetting::Sum => BinningMode::Sum,
        }
    }
}

/// Command-line arguments for the EdgeFirst Camera Bridge tool.
///
/// The tool opens a camera through the bridge, applies the requested
/// controls, and streams frames from a dedicated acquisition thread.
/// Cameras are provided by the software emulator, described by a JSON
/// profile file.
///
/// # Example
///
/// ```bash
/// # Via command line
/// camera-bridge --serial 40012345 --pixel-format mono --frames 300
///
/// # Via environment variables
/// export SERIAL=40012345
/// export SNAPSHOT=/tmp/frame.png
/// camera-bridge
/// ```
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Serial number of the camera to open, defaults to the first one found
    #[arg(short, long, env = "SERIAL")]
    pub serial: Option<String>,

    /// List connected cameras and exit
    #[arg(short, long)]
    pub list: bool,

    /// Number of frames to acquire
    #[arg(short, long, env = "FRAMES", default_value = "100")]
    pub frames: u64,

    /// Camera pixel format
    #[arg(long, env = "PIXEL_FORMAT", value_enum)]
    pub pixel_format: Option<PixelFormatSetting>,

    /// Manual exposure time in microseconds
    #[arg(long, env = "EXPOSURE")]
    pub exposure: Option<f64>,

    /// Gain in dB
    #[arg(long, env = "GAIN")]
    pub gain: Option<f64>,

    /// Acquisition frame rate in Hz
    #[arg(long, env = "FRAME_RATE")]
    pub frame_rate: Option<f64>,

    /// White balance ratios (red green blue)
    #[arg(long, env = "WHITE_BALANCE", value_delimiter = ' ', num_args = 3)]
    pub white_balance: Option<Vec<f64>>,

    /// Pixel binning factors (horizontal vertical)
    #[arg(long, env = "BINNING", value_delimiter = ' ', num_args = 2)]
    pub binning: Option<Vec<u32>>,

    /// Pixel binning mode
    #[arg(long, env = "BINNING_MODE", default_value = "average", value_enum)]
    pub binning_mode: BinningSetting,

    /// Bridge configuration JSON file
    #[arg(long, env = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Per-attempt frame retrieve timeout in milliseconds
    #[arg(long, env = "RETRIEVE_TIMEOUT")]
    pub retrieve_timeout: Option<u64>,

    /// Overall frame await deadline in milliseconds
    #[arg(long, env = "DEADLINE")]
    pub deadline: Option<u64>,

    /// Emulated camera profiles JSON file
    #[arg(long, env = "PROFILE")]
    pub profile: Option<PathBuf>,

    /// Write the first frame to this PNG file
    #[arg(long, env = "SNAPSHOT")]
    pub snapshot: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Also log to the systemd journal
    #[arg(long, env = "JOURNALD")]
    pub journald: bool,

    /// Enable Tracy profiler for performance analysis
    #[arg(long, env = "TRACY")]
    pub tracy: bool,
}

impl Args {
    /// Bridge configuration from `--config`, with the timing arguments
    /// applied on top.
    pub fn bridge_config(&self) -> Result<BridgeConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => BridgeConfig::load(path)?,
            None => BridgeConfig::default(),
        };
        if let Some(ms) = self.retrieve_timeout {
            config.acquisition.retrieve_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.deadline {
            config.acquisition.deadline = Duration::from_millis(ms);
        }
        Ok(config)
    }
}
