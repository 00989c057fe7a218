/**
 * Void-and-Cluster Rank Generation
 *
 * Produces a bijective pixel ranking of one rectangular block from a seed
 * binary pattern: lower ranks are the pixels that turn on first as a
 * threshold rises. The ranking doubles as a blue-noise ordering for ordered
 * dithering and for the RTB-DBS traversal.
 *
 * All filtering is toroidal so ranked blocks tile seamlessly; this is
 * intentionally different from the zero-padded boundary DBS uses on whole
 * images.
 *
 * THREE PHASES
 * ============
 * With n = ones in the seed pattern and area = width * height:
 *
 * Phase 1: repeatedly remove the tightest cluster (highest filtered value
 *          among 1s), assigning ranks n-1 down to 0.
 * Phase 2: restore the seed prototype, then repeatedly fill the largest
 *          void (lowest filtered value among 0s), assigning ranks n upward
 *          until half the block is set.
 * Phase 3: invert the pattern so the remaining unranked pixels become the
 *          minority, then keep removing tightest clusters, assigning
 *          area/2 up to area-1.
 *
 * The filtered "energy" view of the pattern is maintained incrementally:
 * each insertion or removal folds one PSF window into the field instead of
 * re-filtering the whole block.
 *
 * REFERENCES
 * ==========
 * - Ulichney, R. (1993). "Void-and-cluster method for dither array generation"
 *   Proceedings of SPIE 1913, Human Vision, Visual Processing, and Digital
 *   Display IV.
 */

use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use thiserror::Error;

use crate::field::{BinaryPattern, Boundary, ErrorField, GrayField, Move};
use crate::kernel::{KernelCache, PsfKernel};
use crate::random::SeededRandom;

/// Configuration for rank generation
#[derive(Debug, Clone)]
pub struct RankerConfig {
    /// PSF side length, odd and at least 3
    pub kernel_size: usize,
    /// PSF sigma, must be positive
    pub sigma: f32,
    /// Seed pattern density when the pattern is generated, in (0, 0.5]
    pub initial_density: f32,
    /// Optional random seed for reproducible results
    pub seed: Option<u32>,
    /// Show progress indicators
    pub verbose: bool,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            kernel_size: 9,
            sigma: 1.9,
            initial_density: 0.1,
            seed: None,
            verbose: false,
        }
    }
}

/// Error types for rank generation
#[derive(Error, Debug)]
pub enum RankerError {
    /// Kernel side length is even or below 3
    #[error("Kernel size must be an odd integer >= 3, got {0}")]
    InvalidKernelSize(usize),

    /// Sigma is zero or negative
    #[error("Sigma must be positive, got {0}")]
    InvalidSigma(f32),

    /// Block has no pixels
    #[error("Block dimensions must be positive")]
    InvalidDimensions,

    /// Seed density outside (0, 0.5]
    #[error("Initial density must be in (0, 0.5], got {0}")]
    InvalidDensity(f32),

    /// Supplied seed pattern holds more 1s than half the block
    #[error("Seed pattern has {ones} ones but the block only supports {capacity}")]
    SeedTooDense {
        /// Ones in the supplied pattern
        ones: usize,
        /// Half the block's pixel count
        capacity: usize,
    },

    /// No extremal cell found while cells remained unranked
    #[error("Ranking failed to converge")]
    ConvergenceError,

    /// Failed to save the threshold map
    #[error("Failed to save image: {0}")]
    ImageSave(#[from] image::ImageError),
}

/// Result type for ranker operations
pub type Result<T> = std::result::Result<T, RankerError>;

/// Bijective pixel ranking of one block: a permutation of 0..area
#[derive(Debug, Clone)]
pub struct RankArray {
    data: Vec<u32>,
    width: usize,
    height: usize,
}

impl RankArray {
    /// Block width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Block height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Rank at `(x, y)`
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.data[y * self.width + x]
    }

    /// Raw row-major ranks
    pub fn data(&self) -> &[u32] {
        &self.data
    }

    /// Map ranks to 256 threshold levels (rank * 256 / area)
    pub fn to_threshold_map(&self) -> Vec<u8> {
        let area = self.width * self.height;
        self.data
            .iter()
            .map(|&r| ((r as usize * 256) / area) as u8)
            .collect()
    }

    /// Render the threshold map as an 8-bit grayscale image
    pub fn to_luma8(&self) -> image::GrayImage {
        let thresholds = self.to_threshold_map();
        image::GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            image::Luma([thresholds[y as usize * self.width + x as usize]])
        })
    }
}

/// Void-and-cluster ranker for one block
pub struct VoidClusterRanker {
    width: usize,
    height: usize,
    area: usize,
    psf: PsfKernel,
    pattern: BinaryPattern,
    prototype: BinaryPattern,
    ones: usize,
    energy: ErrorField,
    rank: Vec<u32>,
    verbose: bool,
    progress: Option<ProgressBar>,
}

fn validate_psf_params(kernel_size: usize, sigma: f32) -> Result<()> {
    if kernel_size < 3 || kernel_size % 2 == 0 {
        return Err(RankerError::InvalidKernelSize(kernel_size));
    }
    if sigma <= 0.0 {
        return Err(RankerError::InvalidSigma(sigma));
    }
    Ok(())
}

impl VoidClusterRanker {
    /// Create a ranker with a random seed pattern at the configured density
    pub fn new(
        width: usize,
        height: usize,
        config: RankerConfig,
        cache: &mut KernelCache,
    ) -> Result<Self> {
        if config.initial_density <= 0.0 || config.initial_density > 0.5 {
            return Err(RankerError::InvalidDensity(config.initial_density));
        }
        if width == 0 || height == 0 {
            return Err(RankerError::InvalidDimensions);
        }
        let mut rng = SeededRandom::new(config.seed);
        let pattern =
            BinaryPattern::random_with_density(width, height, config.initial_density, &mut rng);
        Self::with_seed_pattern(pattern, config, cache)
    }

    /// Create a ranker from a supplied seed pattern (ones <= half the block)
    pub fn with_seed_pattern(
        pattern: BinaryPattern,
        config: RankerConfig,
        cache: &mut KernelCache,
    ) -> Result<Self> {
        validate_psf_params(config.kernel_size, config.sigma)?;
        let width = pattern.width();
        let height = pattern.height();
        if width == 0 || height == 0 {
            return Err(RankerError::InvalidDimensions);
        }

        let area = width * height;
        let ones = pattern.ones();
        if ones * 2 > area {
            return Err(RankerError::SeedTooDense {
                ones,
                capacity: area / 2,
            });
        }

        let psf = cache.get(config.kernel_size, config.sigma).clone();
        let energy = ErrorField::build(
            &GrayField::zeros(width, height),
            &pattern,
            &psf,
            Boundary::Toroidal,
        );

        let progress = if config.verbose {
            let pb = ProgressBar::new(area as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ranked {msg}")
                    .unwrap()
                    .progress_chars("##-"),
            );
            Some(pb)
        } else {
            None
        };

        Ok(Self {
            width,
            height,
            area,
            psf,
            prototype: pattern.clone(),
            pattern,
            ones,
            energy,
            rank: vec![0; area],
            verbose: config.verbose,
            progress,
        })
    }

    /// Pixel with the highest filtered value among 1s (ties: lowest index)
    fn find_tightest_cluster(&self) -> Option<usize> {
        let mut max_energy = f32::NEG_INFINITY;
        let mut max_idx = None;

        for idx in 0..self.area {
            let (x, y) = (idx % self.width, idx / self.width);
            if self.pattern.get(x, y) == 1 && self.energy.get(x, y) > max_energy {
                max_energy = self.energy.get(x, y);
                max_idx = Some(idx);
            }
        }

        max_idx
    }

    /// Pixel with the lowest filtered value among 0s (ties: lowest index)
    fn find_largest_void(&self) -> Option<usize> {
        let mut min_energy = f32::INFINITY;
        let mut min_idx = None;

        for idx in 0..self.area {
            let (x, y) = (idx % self.width, idx / self.width);
            if self.pattern.get(x, y) == 0 && self.energy.get(x, y) < min_energy {
                min_energy = self.energy.get(x, y);
                min_idx = Some(idx);
            }
        }

        min_idx
    }

    /// Flip one cell, folding the change into the energy field
    fn set_cell(&mut self, idx: usize, value: u8) {
        let (x, y) = (idx % self.width, idx / self.width);
        let old = self.pattern.get(x, y);
        debug_assert_ne!(old, value);

        let mv = Move::toggle(x, y, old);
        self.pattern.set(x, y, value);
        self.energy.apply_move(&mv);
        if value == 1 {
            self.ones += 1;
        } else {
            self.ones -= 1;
        }
    }

    /// Re-filter the whole pattern (used at phase transitions)
    fn rebuild_energy(&mut self) {
        self.energy = ErrorField::build(
            &GrayField::zeros(self.width, self.height),
            &self.pattern,
            &self.psf,
            Boundary::Toroidal,
        );
    }

    fn tick_progress(&self) {
        if let Some(pb) = &self.progress {
            pb.inc(1);
        }
    }

    /// Phase 1: unrank the seed, tightest clusters first, ranks n-1 down to 0
    fn phase1_serialize_seed(&mut self) -> Result<()> {
        if let Some(pb) = &self.progress {
            pb.set_message("phase 1: serializing seed");
        }

        while self.ones > 0 {
            let idx = self
                .find_tightest_cluster()
                .ok_or(RankerError::ConvergenceError)?;
            self.rank[idx] = (self.ones - 1) as u32;
            self.set_cell(idx, 0);
            self.tick_progress();
        }

        Ok(())
    }

    /// Phase 2: restore the prototype and fill voids until half the block is set
    fn phase2_fill_to_half(&mut self, initial_ones: usize) -> Result<()> {
        if let Some(pb) = &self.progress {
            pb.set_message("phase 2: filling voids");
        }

        self.pattern = self.prototype.clone();
        self.ones = initial_ones;
        self.rebuild_energy();

        let mut rank_counter = initial_ones as u32;
        let half_area = self.area / 2;

        while self.ones < half_area {
            let idx = self
                .find_largest_void()
                .ok_or(RankerError::ConvergenceError)?;
            self.rank[idx] = rank_counter;
            rank_counter += 1;
            self.set_cell(idx, 1);
            self.tick_progress();
        }

        Ok(())
    }

    /// Phase 3: invert polarity and unrank the remaining cells upward
    fn phase3_fill_to_completion(&mut self) -> Result<()> {
        if let Some(pb) = &self.progress {
            pb.set_message("phase 3: completing ranks");
        }

        self.pattern.invert();
        self.ones = self.area - self.ones;
        self.rebuild_energy();

        let mut rank_counter = (self.area / 2) as u32;
        while (rank_counter as usize) < self.area {
            let idx = self
                .find_tightest_cluster()
                .ok_or(RankerError::ConvergenceError)?;
            self.rank[idx] = rank_counter;
            rank_counter += 1;
            self.set_cell(idx, 0);
            self.tick_progress();
        }

        Ok(())
    }

    /// Run all three phases and return the finished rank array
    pub fn rank(mut self) -> Result<RankArray> {
        if self.verbose {
            println!(
                "Ranking {}x{} block ({} seed points)...",
                self.width, self.height, self.ones
            );
        }

        let initial_ones = self.ones;
        self.phase1_serialize_seed()?;
        self.phase2_fill_to_half(initial_ones)?;
        self.phase3_fill_to_completion()?;

        if let Some(pb) = &self.progress {
            pb.finish_with_message("ranking complete");
        }

        Ok(RankArray {
            data: self.rank,
            width: self.width,
            height: self.height,
        })
    }
}

/// Convenience wrapper: rank a `width`x`height` block with defaults
pub fn generate_rank_array(width: usize, height: usize, seed: Option<u32>) -> Result<RankArray> {
    let config = RankerConfig {
        seed,
        ..Default::default()
    };
    let mut cache = KernelCache::new();
    VoidClusterRanker::new(width, height, config, &mut cache)?.rank()
}

/// Save a rank array's 256-level threshold map as a grayscale PNG
pub fn save_threshold_to_png<P: AsRef<Path>>(rank: &RankArray, filename: P) -> Result<()> {
    rank.to_luma8().save(&filename)?;
    println!("Saved threshold map to {}", filename.as_ref().display());
    Ok(())
}
