// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use edgefirst_camera_bridge::{
    binning::{Binning, BinningMode},
    image::{Image, PixelLayout},
    Error as BridgeError,
};
use std::error::Error;

fn mono(width: u32, height: u32, data: Vec<u8>) -> Result<Image, BridgeError> {
    Image::from_vec(width, height, PixelLayout::Mono8, data)
}

#[test]
fn test_mode_codes() {
    assert_eq!(BinningMode::from_code(0), Some(BinningMode::Average));
    assert_eq!(BinningMode::from_code(1), Some(BinningMode::Sum));
    assert_eq!(BinningMode::from_code(2), None);
    assert_eq!(BinningMode::from_code(-1), None);
    assert_eq!(BinningMode::Sum.code(), 1);
    assert_eq!(BinningMode::Average.entry(), "Average");
}

#[test]
fn test_new_rejects_zero() {
    assert!(matches!(
        Binning::new(BinningMode::Average, 0, 2),
        Err(BridgeError::InvalidArgument(_))
    ));
    assert!(Binning::new(BinningMode::Sum, 2, 0).is_err());
    assert!(Binning::new(BinningMode::Sum, 1, 1).is_ok_and(|b| b.is_identity()));
    assert_eq!(Binning::default(), Binning::NONE);
}

#[test]
fn test_average() -> Result<(), Box<dyn Error>> {
    let img = mono(4, 2, vec![0, 2, 4, 6, 2, 4, 6, 8])?.with_block_id(9);
    let out = Binning::new(BinningMode::Average, 2, 2)?.apply(&img)?;

    assert_eq!((out.width(), out.height()), (2, 1));
    assert_eq!(out.data(), &[2, 6]);
    assert_eq!(out.block_id(), 9);
    Ok(())
}

#[test]
fn test_average_rounds() -> Result<(), Box<dyn Error>> {
    let img = mono(2, 1, vec![1, 2])?;
    let out = Binning::new(BinningMode::Average, 2, 1)?.apply(&img)?;
    assert_eq!(out.data(), &[2]);
    Ok(())
}

#[test]
fn test_average_large_bin() -> Result<(), Box<dyn Error>> {
    // 300 * 255 exceeds 16 bits
    let img = mono(300, 1, vec![255; 300])?;
    let out = Binning::new(BinningMode::Average, 300, 1)?.apply(&img)?;
    assert_eq!(out.data(), &[255]);

    let img = mono(17, 16, vec![250; 17 * 16])?;
    let out = Binning::new(BinningMode::Average, 17, 16)?.apply(&img)?;
    assert_eq!(out.data(), &[250]);
    Ok(())
}

#[test]
fn test_average_bgr_per_channel() -> Result<(), Box<dyn Error>> {
    let img = Image::from_vec(
        2,
        1,
        PixelLayout::Bgr8,
        vec![10, 100, 200, 20, 110, 210],
    )?;
    let out = Binning::new(BinningMode::Average, 2, 1)?.apply(&img)?;
    assert_eq!(out.layout(), PixelLayout::Bgr8);
    assert_eq!(out.data(), &[15, 105, 205]);
    Ok(())
}

#[test]
fn test_sum_normalized() -> Result<(), Box<dyn Error>> {
    let img = mono(4, 2, vec![0, 2, 4, 6, 2, 4, 6, 8])?;
    let out = Binning::new(BinningMode::Sum, 2, 2)?.apply(&img)?;
    assert_eq!(out.data(), &[0, 255]);

    let flat = mono(4, 4, vec![200; 16])?;
    let out = Binning::new(BinningMode::Sum, 2, 2)?.apply(&flat)?;
    assert_eq!(out.data(), &[0; 4]);
    Ok(())
}

#[test]
fn test_sum_saturates() -> Result<(), Box<dyn Error>> {
    let data = [255u8, 240, 0]
        .iter()
        .flat_map(|&v| std::iter::repeat(v).take(300))
        .collect();
    let img = mono(900, 1, data)?;
    let out = Binning::new(BinningMode::Sum, 300, 1)?.apply(&img)?;
    assert_eq!(out.data(), &[255, 255, 0]);
    Ok(())
}

#[test]
fn test_partial_bins_dropped() -> Result<(), Box<dyn Error>> {
    let img = mono(5, 3, (0..15).collect())?;
    let out = Binning::new(BinningMode::Average, 2, 2)?.apply(&img)?;

    assert_eq!((out.width(), out.height()), (2, 1));
    // rows 0-1, columns 0-1 and 2-3
    assert_eq!(out.data(), &[3, 5]);
    Ok(())
}

#[test]
fn test_identity_is_copy() -> Result<(), Box<dyn Error>> {
    let img = mono(3, 1, vec![1, 2, 3])?;
    assert_eq!(Binning::NONE.apply(&img)?, img);
    Ok(())
}

#[test]
fn test_factor_larger_than_image() -> Result<(), Box<dyn Error>> {
    let img = mono(2, 2, vec![0; 4])?;
    let result = Binning::new(BinningMode::Average, 4, 1)?.apply(&img);
    assert!(matches!(result, Err(BridgeError::InvalidArgument(_))));
    Ok(())
}
