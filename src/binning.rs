// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Software pixel binning for cameras without hardware binning.

use crate::{
    error::{Error, Result},
    image::Image,
};
use serde::{Deserialize, Serialize};

/// How the pixels of a bin are combined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinningMode {
    /// Box average of the bin, keeps brightness.
    Average,
    /// Sum of the bin, min-max normalized back to 8 bits.
    Sum,
}

impl BinningMode {
    /// Maps the boundary's mode code: 0 is average, 1 is sum.
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(BinningMode::Average),
            1 => Some(BinningMode::Sum),
            _ => None,
        }
    }

    pub const fn code(self) -> i32 {
        match self {
            BinningMode::Average => 0,
            BinningMode::Sum => 1,
        }
    }

    /// `BinningHorizontalMode` / `BinningVerticalMode` entry.
    pub const fn entry(self) -> &'static str {
        match self {
            BinningMode::Average => "Average",
            BinningMode::Sum => "Sum",
        }
    }
}

/// Binning factors and mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binning {
    pub mode: BinningMode,
    pub horizontal: u32,
    pub vertical: u32,
}

impl Default for Binning {
    fn default() -> Self {
        Self::NONE
    }
}

impl Binning {
    pub const NONE: Binning = Binning {
        mode: BinningMode::Average,
        horizontal: 1,
        vertical: 1,
    };

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if either factor is zero.
    pub fn new(mode: BinningMode, horizontal: u32, vertical: u32) -> Result<Self> {
        if horizontal == 0 || vertical == 0 {
            return Err(Error::InvalidArgument(format!(
                "binning factors must be at least 1, got {horizontal}x{vertical}"
            )));
        }
        Ok(Self {
            mode,
            horizontal,
            vertical,
        })
    }

    pub fn is_identity(&self) -> bool {
        self.horizontal == 1 && self.vertical == 1
    }

    /// Bins `img` into a new image of `width / horizontal` by
    /// `height / vertical` pixels. Trailing rows and columns that do not fill
    /// a whole bin are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if a factor is zero or larger than
    /// the matching image dimension.
    pub fn apply(&self, img: &Image) -> Result<Image> {
        if self.is_identity() {
            return Ok(img.clone());
        }
        if self.horizontal == 0
            || self.vertical == 0
            || self.horizontal > img.width()
            || self.vertical > img.height()
        {
            return Err(Error::InvalidArgument(format!(
                "cannot bin {}x{} image by {}x{}",
                img.width(),
                img.height(),
                self.horizontal,
                self.vertical
            )));
        }

        let sums = self.bin_sums(img);
        let data = match self.mode {
            BinningMode::Average => {
                let n = self.horizontal * self.vertical;
                sums.iter().map(|&s| ((s + n / 2) / n) as u8).collect()
            }
            BinningMode::Sum => {
                let sums: Vec<u32> = sums.iter().map(|&s| s.min(u32::from(u16::MAX))).collect();
                normalize(&sums)
            }
        };

        let out = Image::from_vec(
            img.width() / self.horizontal,
            img.height() / self.vertical,
            img.layout(),
            data,
        )?;
        Ok(out.with_block_id(img.block_id()))
    }

    /// Per-channel bin totals.
    fn bin_sums(&self, img: &Image) -> Vec<u32> {
        let channels = img.layout().channels();
        let (bh, bv) = (self.horizontal as usize, self.vertical as usize);
        let out_w = img.width() as usize / bh;
        let out_h = img.height() as usize / bv;
        let stride = img.row_stride();
        let src = img.data();

        let mut sums = vec![0u32; out_w * out_h * channels];
        for (y, row) in src.chunks_exact(stride).take(out_h * bv).enumerate() {
            let out_row = &mut sums[(y / bv) * out_w * channels..][..out_w * channels];
            for (x, px) in row.chunks_exact(channels).take(out_w * bh).enumerate() {
                let bin = &mut out_row[(x / bh) * channels..][..channels];
                for (acc, &v) in bin.iter_mut().zip(px) {
                    *acc += u32::from(v);
                }
            }
        }
        sums
    }
}

/// Stretches `values` so the smallest maps to 0 and the largest to 255. A
/// constant input maps to all zeros.
fn normalize(values: &[u32]) -> Vec<u8> {
    let min = values.iter().copied().min().unwrap_or(0);
    let max = values.iter().copied().max().unwrap_or(0);
    if max == min {
        return vec![0; values.len()];
    }
    let range = f64::from(max - min);
    values
        .iter()
        .map(|&v| (f64::from(v - min) * 255.0 / range).round() as u8)
        .collect()
}
