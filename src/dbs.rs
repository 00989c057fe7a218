/**
 * Direct Binary Search Halftoning
 *
 * Greedy local search over a binary pattern: every sweep visits each pixel,
 * prices a toggle of that pixel and a swap with each opposite-polarity
 * 8-neighbour against the low-pass error field, and accepts the best
 * candidate when it strictly lowers the squared error. Accepted moves
 * co-mutate the pattern and the field, so the very next evaluation already
 * sees them.
 *
 * ACCEPTANCE RULE
 * ===============
 * Candidates are enumerated in row-major offset order with the toggle at its
 * natural (0, 0) slot. Only a strictly negative delta is accepted, and ties
 * go to the first candidate found. This exact rule is what makes runs
 * bit-reproducible for a fixed seed; do not replace it with a
 * magnitude-stable criterion.
 *
 * TRAVERSAL
 * =========
 * The classic run shuffles all pixel coordinates once up front. The RTB
 * variant instead follows a void-and-cluster rank array tiled across the
 * image, visiting pixels rank by rank, which gives deterministic tiled
 * processing with the identical move evaluation.
 */

use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use thiserror::Error;

use crate::field::{BinaryPattern, Boundary, ErrorField, GrayField, Move};
use crate::kernel::KernelCache;
use crate::random::SeededRandom;
use crate::ranker::RankArray;

/// Configuration for a DBS run
#[derive(Debug, Clone)]
pub struct DbsConfig {
    /// PSF side length, odd and at least 3
    pub kernel_size: usize,
    /// PSF sigma, must be positive
    pub sigma: f32,
    /// Maximum number of full sweeps
    pub iterations: usize,
    /// Pixel visiting order
    pub traversal: Traversal,
    /// Optional random seed for reproducible results
    pub seed: Option<u32>,
    /// Show progress indicators
    pub verbose: bool,
}

impl Default for DbsConfig {
    fn default() -> Self {
        Self {
            kernel_size: 9,
            sigma: 1.0,
            iterations: 10,
            traversal: Traversal::Shuffled,
            seed: None,
            verbose: false,
        }
    }
}

/// Pixel visiting order for the sweep
#[derive(Debug, Clone)]
pub enum Traversal {
    /// Row-major scan
    Raster,
    /// One up-front Fisher-Yates shuffle of all coordinates
    Shuffled,
    /// Rank-driven tiled order (RTB variant): the rank block tiles the
    /// image and pixels are visited rank by rank across all tiles
    Ranked(RankArray),
}

/// Error types for DBS halftoning
#[derive(Error, Debug)]
pub enum DbsError {
    /// Kernel side length is even or below 3
    #[error("Kernel size must be an odd integer >= 3, got {0}")]
    InvalidKernelSize(usize),

    /// Sigma is zero or negative
    #[error("Sigma must be positive, got {0}")]
    InvalidSigma(f32),

    /// Input image has no pixels
    #[error("Image dimensions must be positive")]
    InvalidDimensions,

    /// Supplied initial pattern does not match the image
    #[error("Pattern is {pattern_width}x{pattern_height} but image is {width}x{height}")]
    DimensionMismatch {
        /// Image width
        width: usize,
        /// Image height
        height: usize,
        /// Pattern width
        pattern_width: usize,
        /// Pattern height
        pattern_height: usize,
    },

    /// Non-finite value surfaced in the error field
    #[error("Non-finite value detected in the error field")]
    NumericAnomaly,

    /// Failed to save the halftone
    #[error("Failed to save image: {0}")]
    ImageSave(#[from] image::ImageError),
}

/// Result type for DBS operations
pub type Result<T> = std::result::Result<T, DbsError>;

/// Per-sweep instrumentation record passed to the observer hook
#[derive(Debug, Clone, Copy)]
pub struct SweepReport {
    /// Zero-based sweep index
    pub iteration: usize,
    /// Mean absolute value of the error field after the sweep
    pub mean_abs_error: f32,
    /// Accepted moves divided by pixel count for this sweep
    pub swap_rate: f32,
}

/// Outcome of a DBS run
#[derive(Debug, Clone)]
pub struct DbsResult {
    /// The optimized binary pattern
    pub pattern: BinaryPattern,
    /// Number of sweeps actually performed
    pub iterations_run: usize,
    /// True when a full sweep found no improving move (local optimum)
    pub converged: bool,
    /// Total accepted moves across all sweeps
    pub swaps: usize,
}

/// DBS optimizer: owns one pattern/field pair for the duration of a run
pub struct DbsOptimizer {
    width: usize,
    height: usize,
    pattern: BinaryPattern,
    field: ErrorField,
    iterations: usize,
    order: Vec<(usize, usize)>,
    verbose: bool,
    observer: Option<Box<dyn FnMut(&SweepReport)>>,
    progress: Option<ProgressBar>,
}

fn validate_psf_params(kernel_size: usize, sigma: f32) -> Result<()> {
    if kernel_size < 3 || kernel_size % 2 == 0 {
        return Err(DbsError::InvalidKernelSize(kernel_size));
    }
    if sigma <= 0.0 {
        return Err(DbsError::InvalidSigma(sigma));
    }
    Ok(())
}

/// Visit order for a rank-driven (RTB) run: the block's rank permutation is
/// inverted once, then each rank position is emitted for every tile covering
/// the image, tiles in row-major order.
fn ranked_order(rank: &RankArray, width: usize, height: usize) -> Vec<(usize, usize)> {
    let block_width = rank.width();
    let block_height = rank.height();
    let block_area = block_width * block_height;

    let mut position_of_rank = vec![(0usize, 0usize); block_area];
    for y in 0..block_height {
        for x in 0..block_width {
            position_of_rank[rank.get(x, y) as usize] = (x, y);
        }
    }

    let tiles_x = (width + block_width - 1) / block_width;
    let tiles_y = (height + block_height - 1) / block_height;

    let mut order = Vec::with_capacity(width * height);
    for r in 0..block_area {
        let (px, py) = position_of_rank[r];
        for tile_y in 0..tiles_y {
            for tile_x in 0..tiles_x {
                let x = tile_x * block_width + px;
                let y = tile_y * block_height + py;
                if x < width && y < height {
                    order.push((x, y));
                }
            }
        }
    }
    order
}

/// Best candidate move at `(x, y)`: the toggle plus opposite-polarity swaps
/// with the 8-neighbours, first strictly-negative minimum wins.
fn best_move(pattern: &BinaryPattern, field: &ErrorField, x: usize, y: usize) -> Option<Move> {
    let width = pattern.width() as isize;
    let height = pattern.height() as isize;
    let current = pattern.get(x, y);

    let mut best_delta = 0.0f32;
    let mut best = None;

    for dy in -1isize..=1 {
        for dx in -1isize..=1 {
            let nx = x as isize + dx;
            let ny = y as isize + dy;
            if nx < 0 || nx >= width || ny < 0 || ny >= height {
                continue;
            }
            let mv = if dx == 0 && dy == 0 {
                Move::toggle(x, y, current)
            } else {
                let neighbour = pattern.get(nx as usize, ny as usize);
                if neighbour == current {
                    continue;
                }
                Move::swap(x, y, current, nx as usize, ny as usize, neighbour)
            };
            let delta = field.delta_cost(&mv);
            if delta < best_delta {
                best_delta = delta;
                best = Some(mv);
            }
        }
    }

    best
}

impl DbsOptimizer {
    /// Create an optimizer with a random initial pattern (fair coin per cell)
    pub fn new(gray: &GrayField, config: DbsConfig, cache: &mut KernelCache) -> Result<Self> {
        let mut rng = SeededRandom::new(config.seed);
        let pattern = BinaryPattern::random(gray.width(), gray.height(), &mut rng);
        Self::build(gray, pattern, config, cache, rng)
    }

    /// Create an optimizer starting from a supplied pattern
    pub fn with_pattern(
        gray: &GrayField,
        pattern: BinaryPattern,
        config: DbsConfig,
        cache: &mut KernelCache,
    ) -> Result<Self> {
        if pattern.width() != gray.width() || pattern.height() != gray.height() {
            return Err(DbsError::DimensionMismatch {
                width: gray.width(),
                height: gray.height(),
                pattern_width: pattern.width(),
                pattern_height: pattern.height(),
            });
        }
        let rng = SeededRandom::new(config.seed);
        Self::build(gray, pattern, config, cache, rng)
    }

    fn build(
        gray: &GrayField,
        pattern: BinaryPattern,
        config: DbsConfig,
        cache: &mut KernelCache,
        mut rng: SeededRandom,
    ) -> Result<Self> {
        validate_psf_params(config.kernel_size, config.sigma)?;
        if gray.width() == 0 || gray.height() == 0 {
            return Err(DbsError::InvalidDimensions);
        }

        let width = gray.width();
        let height = gray.height();

        let psf = cache.get(config.kernel_size, config.sigma);
        let field = ErrorField::build(gray, &pattern, psf, Boundary::Zero);

        let order = match &config.traversal {
            Traversal::Raster => raster_order(width, height),
            Traversal::Shuffled => {
                let mut order = raster_order(width, height);
                rng.shuffle(&mut order);
                order
            }
            Traversal::Ranked(rank) => ranked_order(rank, width, height),
        };

        let progress = if config.verbose {
            let pb = ProgressBar::new(config.iterations as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} sweeps {msg}")
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
            pattern,
            field,
            iterations: config.iterations,
            order,
            verbose: config.verbose,
            observer: None,
            progress,
        })
    }

    /// Register a per-sweep observer (instrumentation only, not correctness)
    pub fn observe_sweeps(&mut self, observer: impl FnMut(&SweepReport) + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// Run the search until the sweep budget is spent or a sweep accepts nothing
    pub fn run(mut self) -> Result<DbsResult> {
        let area = self.width * self.height;

        if self.verbose {
            println!(
                "DBS halftoning {}x{} image, up to {} sweeps...",
                self.width, self.height, self.iterations
            );
        }

        let mut converged = false;
        let mut iterations_run = 0;
        let mut total_swaps = 0;

        for iter in 0..self.iterations {
            let mut accepted = 0usize;

            for &(x, y) in &self.order {
                if let Some(mv) = best_move(&self.pattern, &self.field, x, y) {
                    mv.apply_to(&mut self.pattern);
                    self.field.apply_move(&mv);
                    accepted += 1;
                }
            }

            iterations_run = iter + 1;
            total_swaps += accepted;

            let report = SweepReport {
                iteration: iter,
                mean_abs_error: self.field.mean_abs(),
                swap_rate: accepted as f32 / area as f32,
            };
            if let Some(observer) = &mut self.observer {
                observer(&report);
            }
            if let Some(pb) = &self.progress {
                pb.set_message(format!("{:.2}% swapped", report.swap_rate * 100.0));
                pb.inc(1);
            }

            if accepted == 0 {
                converged = true;
                break;
            }
        }

        if let Some(pb) = &self.progress {
            pb.finish_with_message(if converged { "converged" } else { "budget spent" });
        }

        if !self.field.is_finite() {
            return Err(DbsError::NumericAnomaly);
        }

        Ok(DbsResult {
            pattern: self.pattern,
            iterations_run,
            converged,
            swaps: total_swaps,
        })
    }
}

fn raster_order(width: usize, height: usize) -> Vec<(usize, usize)> {
    let mut order = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            order.push((x, y));
        }
    }
    order
}

/// Convenience wrapper: halftone `gray` with a shuffled scan and defaults
pub fn halftone(
    gray: &GrayField,
    kernel_size: usize,
    sigma: f32,
    iterations: usize,
) -> Result<BinaryPattern> {
    let config = DbsConfig {
        kernel_size,
        sigma,
        iterations,
        ..Default::default()
    };
    let mut cache = KernelCache::new();
    let optimizer = DbsOptimizer::new(gray, config, &mut cache)?;
    Ok(optimizer.run()?.pattern)
}

/// Save a binary pattern to an 8-bit grayscale PNG
pub fn save_pattern_to_png<P: AsRef<Path>>(pattern: &BinaryPattern, filename: P) -> Result<()> {
    pattern.to_luma8().save(&filename)?;
    println!("Saved halftone to {}", filename.as_ref().display());
    Ok(())
}
