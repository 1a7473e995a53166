// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sensor pixel encoding of a grab result buffer.
///
/// Buffers are tightly packed: row stride is `width * bytes_per_pixel`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelType {
    Mono8,
    /// 12 bits per pixel in a little-endian 16-bit container.
    Mono12,
    Mono16,
    Rgb8Packed,
    Bgr8Packed,
    Rgba8Packed,
    /// YUV 4:2:2, byte order Y0 U Y1 V.
    Yuv422Yuyv,
    /// YUV 4:2:2, byte order U Y0 V Y1.
    Yuv422Uyvy,
    BayerRg8,
    BayerBg8,
}

impl PixelType {
    /// Maps a `PixelFormat` enumeration entry to the encoding the device
    /// delivers for it.
    pub fn from_symbolic(entry: &str) -> Option<Self> {
        match entry {
            "Mono8" => Some(PixelType::Mono8),
            "Mono12" => Some(PixelType::Mono12),
            "Mono16" => Some(PixelType::Mono16),
            "RGB8" | "RGB8Packed" => Some(PixelType::Rgb8Packed),
            "BGR8" | "BGR8Packed" => Some(PixelType::Bgr8Packed),
            "RGBA8Packed" => Some(PixelType::Rgba8Packed),
            "YUV422_8" | "YUV422_YUYV_Packed" => Some(PixelType::Yuv422Yuyv),
            "YCbCr422_8" | "YUV422_8_UYVY" | "YUV422Packed" => Some(PixelType::Yuv422Uyvy),
            "BayerRG8" => Some(PixelType::BayerRg8),
            "BayerBG8" => Some(PixelType::BayerBg8),
            _ => None,
        }
    }

    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelType::Mono8 | PixelType::BayerRg8 | PixelType::BayerBg8 => 1,
            PixelType::Mono12
            | PixelType::Mono16
            | PixelType::Yuv422Yuyv
            | PixelType::Yuv422Uyvy => 2,
            PixelType::Rgb8Packed | PixelType::Bgr8Packed => 3,
            PixelType::Rgba8Packed => 4,
        }
    }

    /// Size in bytes of a tightly packed `width` x `height` buffer.
    pub const fn buffer_len(self, width: u32, height: u32) -> usize {
        self.bytes_per_pixel() * width as usize * height as usize
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            PixelType::Mono8 => "Mono8",
            PixelType::Mono12 => "Mono12",
            PixelType::Mono16 => "Mono16",
            PixelType::Rgb8Packed => "RGB8Packed",
            PixelType::Bgr8Packed => "BGR8Packed",
            PixelType::Rgba8Packed => "RGBA8Packed",
            PixelType::Yuv422Yuyv => "YUV422_YUYV",
            PixelType::Yuv422Uyvy => "YUV422_UYVY",
            PixelType::BayerRg8 => "BayerRG8",
            PixelType::BayerBg8 => "BayerBG8",
        };
        f.write_str(name)
    }
}
