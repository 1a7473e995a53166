// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Moving test pattern used by the emulator.

use crate::pixel::PixelType;

#[inline]
fn level(x: u32, y: u32, frame: u64) -> u8 {
    (x as u64 + y as u64 + frame * 4) as u8
}

/// Fills a tightly packed buffer with a diagonal gradient that scrolls by
/// four levels per frame. `buf` must be `pixel_type.buffer_len(width, height)`
/// bytes long.
pub(crate) fn fill(buf: &mut [u8], width: u32, height: u32, pixel_type: PixelType, frame: u64) {
    let bpp = pixel_type.bytes_per_pixel();
    let stride = width as usize * bpp;

    for (y, row) in buf.chunks_exact_mut(stride).take(height as usize).enumerate() {
        let y = y as u32;
        match pixel_type {
            PixelType::Mono8 | PixelType::BayerRg8 | PixelType::BayerBg8 => {
                for (x, px) in row.iter_mut().enumerate() {
                    *px = level(x as u32, y, frame);
                }
            }
            PixelType::Mono12 | PixelType::Mono16 => {
                let shift = if pixel_type == PixelType::Mono12 { 4 } else { 8 };
                for (x, px) in row.chunks_exact_mut(2).enumerate() {
                    let v = (level(x as u32, y, frame) as u16) << shift;
                    px.copy_from_slice(&v.to_le_bytes());
                }
            }
            PixelType::Rgb8Packed | PixelType::Bgr8Packed | PixelType::Rgba8Packed => {
                for (x, px) in row.chunks_exact_mut(bpp).enumerate() {
                    let r = level(x as u32, y, frame);
                    let g = (x as u32 * 255 / width.max(1)) as u8;
                    let b = (y * 255 / height.max(1)) as u8;
                    match pixel_type {
                        PixelType::Bgr8Packed => px.copy_from_slice(&[b, g, r]),
                        PixelType::Rgb8Packed => px.copy_from_slice(&[r, g, b]),
                        _ => px.copy_from_slice(&[r, g, b, 255]),
                    }
                }
            }
            PixelType::Yuv422Yuyv | PixelType::Yuv422Uyvy => {
                for (pair, px) in row.chunks_exact_mut(4).enumerate() {
                    let x = pair as u32 * 2;
                    let y0 = level(x, y, frame);
                    let y1 = level(x + 1, y, frame);
                    let u = (x * 255 / width.max(1)) as u8;
                    let v = (y * 255 / height.max(1)) as u8;
                    if pixel_type == PixelType::Yuv422Yuyv {
                        px.copy_from_slice(&[y0, u, y1, v]);
                    } else {
                        px.copy_from_slice(&[u, y0, v, y1]);
                    }
                }
            }
        }
    }
}
