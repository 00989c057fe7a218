/**
 * Ordered Dithering
 *
 * Companion path to the DBS core: binarizes a grayscale image against a
 * tiled threshold matrix. The matrix comes from one of three places: the
 * classic 2/4/8 Bayer index maps, a void-and-cluster rank array (blue-noise
 * ordering), or an 8-bit threshold texture loaded from disk.
 *
 * A pixel turns on when its gray value strictly exceeds the threshold under
 * it, matching the rank semantics: lower-ranked cells fire first as the
 * image brightens.
 */

use std::path::Path;
use thiserror::Error;

use crate::field::{BinaryPattern, GrayField};
use crate::ranker::RankArray;

/// 2x2 Bayer index map
const BAYER_2: [u32; 4] = [0, 2, 3, 1];

/// 4x4 Bayer index map
const BAYER_4: [u32; 16] = [0, 8, 2, 10, 12, 4, 14, 6, 3, 11, 1, 9, 15, 7, 13, 5];

/// 8x8 Bayer index map
const BAYER_8: [u32; 64] = [
    0, 32, 8, 40, 2, 34, 10, 42, //
    48, 16, 56, 24, 50, 18, 58, 26, //
    12, 44, 4, 36, 14, 46, 6, 38, //
    60, 28, 52, 20, 62, 30, 54, 22, //
    3, 35, 11, 43, 1, 33, 9, 41, //
    51, 19, 59, 27, 49, 17, 57, 25, //
    15, 47, 7, 39, 13, 45, 5, 37, //
    63, 31, 55, 23, 61, 29, 53, 21,
];

/// Error types for ordered dithering
#[derive(Error, Debug)]
pub enum DitherError {
    /// Bayer matrices exist only for sizes 2, 4 and 8
    #[error("Dithering kernel size {0} is not supported (use 2, 4, or 8)")]
    UnsupportedKernelSize(usize),

    /// Threshold texture is empty
    #[error("Could not determine threshold texture dimensions")]
    InvalidDimensions,

    /// Failed to load or save an image
    #[error("Failed to load image: {0}")]
    ImageError(#[from] image::ImageError),
}

/// Result type for dithering operations
pub type Result<T> = std::result::Result<T, DitherError>;

/// Tiled threshold matrix with values in [0, 1)
pub struct ThresholdMatrix {
    data: Vec<f32>,
    width: usize,
    height: usize,
}

impl ThresholdMatrix {
    /// The classic Bayer matrix of the given size (2, 4 or 8), index / size^2
    pub fn bayer(size: usize) -> Result<Self> {
        let indices: &[u32] = match size {
            2 => &BAYER_2,
            4 => &BAYER_4,
            8 => &BAYER_8,
            other => return Err(DitherError::UnsupportedKernelSize(other)),
        };
        let levels = (size * size) as f32;
        Ok(Self {
            data: indices.iter().map(|&v| v as f32 / levels).collect(),
            width: size,
            height: size,
        })
    }

    /// Blue-noise thresholds from a void-and-cluster rank array, rank / area
    pub fn from_rank_array(rank: &RankArray) -> Self {
        let area = (rank.width() * rank.height()) as f32;
        Self {
            data: rank.data().iter().map(|&r| r as f32 / area).collect(),
            width: rank.width(),
            height: rank.height(),
        }
    }

    /// Thresholds from an 8-bit grayscale texture, value / 256
    pub fn from_luma8(img: &image::GrayImage) -> Result<Self> {
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(DitherError::InvalidDimensions);
        }
        Ok(Self {
            data: img.as_raw().iter().map(|&v| v as f32 / 256.0).collect(),
            width: width as usize,
            height: height as usize,
        })
    }

    /// Load a threshold texture from a grayscale image file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let img = image::open(path)?.to_luma8();
        Self::from_luma8(&img)
    }

    /// Matrix width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Matrix height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Threshold at `(x, y)` with tiling
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        let wrap_x = x % self.width;
        let wrap_y = y % self.height;
        self.data[wrap_y * self.width + wrap_x]
    }
}

/// Binarize `gray` against the tiled threshold matrix
pub fn ordered_dither(gray: &GrayField, matrix: &ThresholdMatrix) -> BinaryPattern {
    let width = gray.width();
    let height = gray.height();
    let mut data = vec![0u8; width * height];

    for y in 0..height {
        for x in 0..width {
            if gray.get(x, y) > matrix.get(x, y) {
                data[y * width + x] = 1;
            }
        }
    }

    BinaryPattern::from_raw(data, width, height)
}

/// Dither an image file against `matrix` and save the binary result
pub fn apply_dithering<P: AsRef<Path>>(
    input_path: P,
    output_path: P,
    matrix: &ThresholdMatrix,
) -> Result<()> {
    let gray = GrayField::from_luma8(&image::open(input_path)?.to_luma8());
    let halftone = ordered_dither(&gray, matrix);
    halftone.to_luma8().save(output_path)?;
    Ok(())
}
