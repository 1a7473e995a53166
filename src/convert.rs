// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Sensor encoding to normalized layout conversion.
//!
//! | sensor encoding | layout | transform |
//! |---|---|---|
//! | Mono8 | [`PixelLayout::Mono8`] | copy |
//! | RGB8 packed | [`PixelLayout::Bgr8`] | swap R and B |
//! | BGR8 packed | [`PixelLayout::Bgr8`] | copy |
//! | YUV 4:2:2 YUYV / UYVY | [`PixelLayout::Bgr8`] | BT.601 YUV to BGR |
//!
//! Any other encoding is rejected before a single byte is written. The output
//! is always a fresh allocation; the input typically belongs to a driver
//! buffer pool and is recycled once the grab result is dropped.

use crate::{
    error::{Error, Result},
    image::{Image, PixelLayout},
};
use camera_sdk::{GrabResult, PixelType};

// BT.601 limited range coefficients in 20-bit fixed point.
const CY: i32 = 1_220_542;
const CUB: i32 = 2_116_026;
const CUG: i32 = -409_993;
const CVG: i32 = -852_492;
const CVR: i32 = 1_673_527;
const SHIFT: i32 = 20;
const ROUND: i32 = 1 << (SHIFT - 1);

/// Layout a sensor encoding converts to, or `None` when it is not supported.
pub const fn target_layout(pixel_type: PixelType) -> Option<PixelLayout> {
    match pixel_type {
        PixelType::Mono8 => Some(PixelLayout::Mono8),
        PixelType::Rgb8Packed
        | PixelType::Bgr8Packed
        | PixelType::Yuv422Yuyv
        | PixelType::Yuv422Uyvy => Some(PixelLayout::Bgr8),
        _ => None,
    }
}

/// Converts a raw sensor buffer into an owned [`Image`].
///
/// Bytes past the end of the packed frame are ignored.
///
/// # Errors
///
/// - [`Error::UnsupportedEncoding`] for encodings without a conversion.
/// - [`Error::MalformedFrame`] if `raw` is shorter than the frame or a YUV
///   4:2:2 frame has an odd width.
pub fn convert(raw: &[u8], width: u32, height: u32, pixel_type: PixelType) -> Result<Image> {
    let layout = target_layout(pixel_type).ok_or(Error::UnsupportedEncoding(pixel_type))?;

    let malformed = || Error::MalformedFrame {
        pixel_type,
        width,
        height,
        len: raw.len(),
    };
    let yuv = matches!(pixel_type, PixelType::Yuv422Yuyv | PixelType::Yuv422Uyvy);
    if yuv && width % 2 != 0 {
        return Err(malformed());
    }
    let src = raw
        .get(..pixel_type.buffer_len(width, height))
        .ok_or_else(malformed)?;

    let data = match pixel_type {
        PixelType::Mono8 | PixelType::Bgr8Packed => src.to_vec(),
        PixelType::Rgb8Packed => {
            let mut bgr = src.to_vec();
            for px in bgr.chunks_exact_mut(3) {
                px.swap(0, 2);
            }
            bgr
        }
        PixelType::Yuv422Yuyv => yuv422_to_bgr(src, 0, 1, 3),
        PixelType::Yuv422Uyvy => yuv422_to_bgr(src, 1, 0, 2),
        other => return Err(Error::UnsupportedEncoding(other)),
    };

    Image::from_vec(width, height, layout, data)
}

/// Converts the pixels of a successful grab, tagging the image with the
/// grab's block id.
pub fn convert_grab(grab: &GrabResult) -> Result<Image> {
    let img = convert(grab.buffer(), grab.width(), grab.height(), grab.pixel_type())?;
    Ok(img.with_block_id(grab.block_id()))
}

/// `y` is the offset of the first luma byte in each 4-byte macropixel, `u`
/// and `v` the offsets of the chroma bytes.
fn yuv422_to_bgr(src: &[u8], y: usize, u: usize, v: usize) -> Vec<u8> {
    let mut dst = Vec::with_capacity(src.len() / 2 * 3);
    for mp in src.chunks_exact(4) {
        let cu = i32::from(mp[u]) - 128;
        let cv = i32::from(mp[v]) - 128;
        let ruv = ROUND + CVR * cv;
        let guv = ROUND + CVG * cv + CUG * cu;
        let buv = ROUND + CUB * cu;

        for luma in [mp[y], mp[y + 2]] {
            let yy = (i32::from(luma) - 16).max(0) * CY;
            dst.push(saturate(yy + buv));
            dst.push(saturate(yy + guv));
            dst.push(saturate(yy + ruv));
        }
    }
    dst
}

#[inline]
fn saturate(v: i32) -> u8 {
    (v >> SHIFT).clamp(0, 255) as u8
}
