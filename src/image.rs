// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::error::{Error, Result};
use ::image::{codecs::png::PngEncoder, ExtendedColorType, ImageEncoder};
use core::fmt;
use serde::{Deserialize, Serialize};

/// Format code reported when a layout or device format has no mapping.
pub const UNKNOWN: i32 = -1;

/// YUV 4:2:2 packed, byte order Y0 U Y1 V.
pub const YUYV: i32 = 2;

/// 3-channel 8-bit packed, byte order B G R.
pub const BGR: i32 = 4;

/// Single-channel 8-bit.
pub const GRAY: i32 = 5;

/// YUV 4:2:2 packed, byte order U Y0 V Y1.
pub const UYVY: i32 = 7;

/// Layout of the pixels held by an [`Image`].
///
/// Every frame published by a camera session is normalized to one of these,
/// whatever encoding the sensor delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelLayout {
    /// Interleaved B, G, R bytes.
    Bgr8,
    /// One luminance byte per pixel.
    Mono8,
}

impl PixelLayout {
    pub const fn channels(self) -> usize {
        match self {
            PixelLayout::Bgr8 => 3,
            PixelLayout::Mono8 => 1,
        }
    }

    /// Format code of the layout as seen across the bridge boundary.
    pub const fn code(self) -> i32 {
        match self {
            PixelLayout::Bgr8 => BGR,
            PixelLayout::Mono8 => GRAY,
        }
    }
}

impl fmt::Display for PixelLayout {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PixelLayout::Bgr8 => write!(f, "BGR3"),
            PixelLayout::Mono8 => write!(f, "GREY"),
        }
    }
}

const fn format_row_stride(layout: PixelLayout, width: u32) -> usize {
    layout.channels() * width as usize
}

const fn image_size(width: u32, height: u32, layout: PixelLayout) -> usize {
    format_row_stride(layout, width) * height as usize
}

/// Decoded frame owned by the bridge.
///
/// An `Image` never aliases driver memory. Once built it is immutable, so it
/// can be shared between the frame cache and any number of readers behind an
/// `Arc`.
///
/// # Example
///
/// ```
/// use edgefirst_camera_bridge::image::{Image, PixelLayout, GRAY};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = Image::from_vec(4, 2, PixelLayout::Mono8, vec![0; 8])?;
///
/// assert_eq!(img.width(), 4);
/// assert_eq!(img.height(), 2);
/// assert_eq!(img.format_code(), GRAY);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    layout: PixelLayout,
    block_id: u64,
    data: Vec<u8>,
}

impl Image {
    /// Allocates a zeroed image.
    pub fn new(width: u32, height: u32, layout: PixelLayout) -> Self {
        Self {
            width,
            height,
            layout,
            block_id: 0,
            data: vec![0; image_size(width, height, layout)],
        }
    }

    /// Wraps an owned pixel buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `data` is not exactly
    /// `width * height * channels` bytes long.
    pub fn from_vec(width: u32, height: u32, layout: PixelLayout, data: Vec<u8>) -> Result<Self> {
        let expected = image_size(width, height, layout);
        if data.len() != expected {
            return Err(Error::InvalidArgument(format!(
                "{width}x{height} {layout} image needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            layout,
            block_id: 0,
            data,
        })
    }

    /// Tags the image with the driver block id of the grab it came from.
    pub fn with_block_id(mut self, block_id: u64) -> Self {
        self.block_id = block_id;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn format_code(&self) -> i32 {
        self.layout.code()
    }

    /// Driver block id of the originating grab, 0 for images not built from
    /// a grab.
    pub fn block_id(&self) -> u64 {
        self.block_id
    }

    pub fn row_stride(&self) -> usize {
        format_row_stride(self.layout, self.width)
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Encodes the image as PNG.
    ///
    /// BGR images are reordered to RGB on the way out since PNG has no BGR
    /// color type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`] if the PNG encoder rejects the image.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut png = Vec::new();
        let encoder = PngEncoder::new(&mut png);
        match self.layout {
            PixelLayout::Mono8 => encoder.write_image(
                &self.data,
                self.width,
                self.height,
                ExtendedColorType::L8,
            )?,
            PixelLayout::Bgr8 => {
                let mut rgb = self.data.clone();
                for px in rgb.chunks_exact_mut(3) {
                    px.swap(0, 2);
                }
                encoder.write_image(&rgb, self.width, self.height, ExtendedColorType::Rgb8)?
            }
        }
        Ok(png)
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}x{} {} block:{}",
            self.width, self.height, self.layout, self.block_id
        )
    }
}
