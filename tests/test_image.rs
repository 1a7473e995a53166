// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use edgefirst_camera_bridge::{
    image::{Image, PixelLayout, BGR, GRAY, UNKNOWN, UYVY, YUYV},
    Error as BridgeError,
};
use std::error::Error;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

#[test]
fn test_formats() -> Result<(), Box<dyn Error>> {
    let img = Image::new(1920, 1080, PixelLayout::Bgr8);
    println!("{}", img);
    assert_eq!(img.size(), 6220800);
    assert_eq!(img.row_stride(), 5760);
    assert_eq!(img.format_code(), BGR);

    let img = Image::new(1920, 1080, PixelLayout::Mono8);
    println!("{}", img);
    assert_eq!(img.size(), 2073600);
    assert_eq!(img.row_stride(), 1920);
    assert_eq!(img.format_code(), GRAY);

    Ok(())
}

#[test]
fn test_format_codes() {
    assert_eq!(PixelLayout::Bgr8.code(), BGR);
    assert_eq!(PixelLayout::Mono8.code(), GRAY);
    for code in [UNKNOWN, YUYV, UYVY] {
        assert_ne!(PixelLayout::Bgr8.code(), code);
        assert_ne!(PixelLayout::Mono8.code(), code);
    }
    assert_eq!(PixelLayout::Bgr8.to_string(), "BGR3");
    assert_eq!(PixelLayout::Mono8.to_string(), "GREY");
}

#[test]
fn test_from_vec() -> Result<(), Box<dyn Error>> {
    let img = Image::from_vec(4, 2, PixelLayout::Bgr8, (0..24).collect())?.with_block_id(7);
    assert_eq!(img.width(), 4);
    assert_eq!(img.height(), 2);
    assert_eq!(img.block_id(), 7);
    assert_eq!(img.data()[23], 23);
    assert_eq!(img.to_string(), "4x2 BGR3 block:7");

    let short = Image::from_vec(4, 2, PixelLayout::Bgr8, vec![0; 23]);
    assert!(matches!(short, Err(BridgeError::InvalidArgument(_))));

    let long = Image::from_vec(4, 2, PixelLayout::Mono8, vec![0; 9]);
    assert!(matches!(long, Err(BridgeError::InvalidArgument(_))));

    Ok(())
}

#[test]
fn test_encode_png() -> Result<(), Box<dyn Error>> {
    let mono = Image::from_vec(8, 8, PixelLayout::Mono8, (0..64).collect())?;
    let png = mono.encode_png()?;
    assert_eq!(png[..8], PNG_SIGNATURE);

    let bgr = Image::new(16, 4, PixelLayout::Bgr8);
    let png = bgr.encode_png()?;
    assert_eq!(png[..8], PNG_SIGNATURE);

    let decoded = image::load_from_memory(&png)?;
    assert_eq!(decoded.width(), 16);
    assert_eq!(decoded.height(), 4);

    Ok(())
}

#[test]
fn test_encode_png_channel_order() -> Result<(), Box<dyn Error>> {
    // one blue pixel in BGR order
    let bgr = Image::from_vec(1, 1, PixelLayout::Bgr8, vec![255, 0, 0])?;
    let decoded = image::load_from_memory(&bgr.encode_png()?)?.to_rgb8();
    assert_eq!(decoded.get_pixel(0, 0).0, [0, 0, 255]);
    Ok(())
}
