//! DBS Halftoning Library
//!
//! A Rust implementation of Direct Binary Search halftoning and of Robert
//! Ulichney's void-and-cluster method, sharing one perceptual cost model: a
//! Gaussian point spread function approximating how the human visual system
//! blurs a binary pattern.
//!
//! # Features
//!
//! - DBS halftoning with an incrementally maintained low-pass error field
//! - Toggle and swap moves priced exactly over their local windows
//! - Raster, shuffled, and rank-driven (RTB) pixel traversal
//! - Void-and-cluster rank arrays for blue-noise ordered dithering
//! - Ordered dithering with Bayer or blue-noise threshold matrices
//! - Reproducible results with seeded random number generation
//!
//! # Quick Start
//!
//! ## Halftoning an image
//!
//! ```no_run
//! use halftone_dbs::{DbsConfig, DbsOptimizer, GrayField, KernelCache};
//!
//! let img = image::open("input.jpg").unwrap().to_luma8();
//! let gray = GrayField::from_luma8(&img);
//!
//! let config = DbsConfig {
//!     kernel_size: 9,
//!     sigma: 1.0,
//!     iterations: 10,
//!     seed: Some(42),
//!     ..Default::default()
//! };
//!
//! let mut cache = KernelCache::new();
//! let result = DbsOptimizer::new(&gray, config, &mut cache)
//!     .unwrap()
//!     .run()
//!     .unwrap();
//! result.pattern.to_luma8().save("halftone.png").unwrap();
//! ```
//!
//! ## Generating a blue-noise threshold texture
//!
//! ```no_run
//! use halftone_dbs::{KernelCache, RankerConfig, VoidClusterRanker};
//!
//! let config = RankerConfig {
//!     seed: Some(42),
//!     ..Default::default()
//! };
//! let mut cache = KernelCache::new();
//! let rank = VoidClusterRanker::new(64, 64, config, &mut cache)
//!     .unwrap()
//!     .rank()
//!     .unwrap();
//! rank.to_luma8().save("blue-noise.png").unwrap();
//! ```
//!
//! # Algorithm
//!
//! DBS sweeps the image visiting one pixel at a time. At each pixel it
//! prices a toggle and a swap with every opposite-valued 8-neighbour against
//! the squared low-pass error, accepts the best strictly-improving candidate,
//! and folds the change into the error field by superposition. The run ends
//! when the sweep budget is spent or a full sweep improves nothing.
//!
//! The void-and-cluster ranker orders every pixel of a block by repeatedly
//! extracting the tightest cluster or filling the largest void under
//! toroidal PSF filtering, yielding a bijective rank array whose low ranks
//! are the pixels that turn on first.
//!
//! DBS filters with a zero-padded boundary; the ranker wraps toroidally so
//! its blocks tile seamlessly. Both run through the same field primitives.
//!
//! # References
//!
//! - Analoui, M. & Allebach, J. (1992). "Model-based halftoning using direct
//!   binary search"
//! - Ulichney, R. (1993). "Void-and-cluster method for dither array generation"

#![doc(html_root_url = "https://docs.rs/halftone-dbs/0.1.0")]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// DBS halftoning module
pub mod dbs;
/// Ordered dithering module
pub mod dither;
/// Error field and binary pattern module
pub mod field;
/// Gaussian PSF kernel module
pub mod kernel;
/// Seeded random number generation module
pub mod random;
/// Void-and-cluster ranking module
pub mod ranker;

// Re-export main types for convenience
pub use dbs::{
    halftone, save_pattern_to_png, DbsConfig, DbsError, DbsOptimizer, DbsResult, SweepReport,
    Traversal,
};
pub use dither::{apply_dithering, ordered_dither, DitherError, ThresholdMatrix};
pub use field::{BinaryPattern, Boundary, CellDelta, ErrorField, GrayField, Move};
pub use kernel::{KernelCache, PsfKernel};
pub use random::SeededRandom;
pub use ranker::{
    generate_rank_array, save_threshold_to_png, RankArray, RankerConfig, RankerError,
    VoidClusterRanker,
};
