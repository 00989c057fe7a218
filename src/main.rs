/**
 * Halftone CLI - command-line interface for DBS halftoning, blue noise rank
 * generation, and ordered dithering
 */

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use halftone_dbs::{
    apply_dithering, save_pattern_to_png, save_threshold_to_png, DbsConfig, DbsOptimizer,
    GrayField, KernelCache, RankerConfig, ThresholdMatrix, Traversal, VoidClusterRanker,
};

/// DBS halftoning and blue noise tools
#[derive(Parser)]
#[command(name = "halftone-dbs")]
#[command(version = "0.1.0")]
#[command(about = "DBS halftoning and blue noise rank generation tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScanOrder {
    /// One up-front shuffle of all pixel coordinates
    Shuffled,
    /// Plain row-major scan
    Raster,
}

#[derive(Subcommand)]
enum Commands {
    /// Halftone an image with direct binary search
    Halftone {
        /// Input image path
        #[arg(short, long)]
        input: PathBuf,

        /// Output image path
        #[arg(short, long)]
        output: PathBuf,

        /// PSF kernel size (odd, at least 3)
        #[arg(short = 'k', long, default_value = "9")]
        kernel_size: usize,

        /// PSF sigma
        #[arg(long, default_value = "1.0")]
        sigma: f32,

        /// Maximum number of sweeps
        #[arg(long, default_value = "10")]
        iterations: usize,

        /// Pixel scan order
        #[arg(long, value_enum, default_value = "shuffled")]
        scan: ScanOrder,

        /// Drive the scan with a void-and-cluster rank block of this size (RTB)
        #[arg(long)]
        block_size: Option<usize>,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u32>,

        /// Show sweep progress
        #[arg(short, long)]
        verbose: bool,
    },

    /// Generate a blue-noise threshold texture using void-and-cluster ranking
    Rank {
        /// Output file path
        #[arg(short, long, default_value = "blue-noise.png")]
        output: PathBuf,

        /// Texture size (width and height)
        #[arg(short, long, default_value = "128")]
        size: usize,

        /// PSF kernel size (odd, at least 3)
        #[arg(short = 'k', long, default_value = "9")]
        kernel_size: usize,

        /// PSF sigma
        #[arg(long, default_value = "1.9")]
        sigma: f32,

        /// Seed pattern density (0, 0.5]
        #[arg(long, default_value = "0.1")]
        density: f32,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u32>,

        /// Show ranking progress
        #[arg(short, long)]
        verbose: bool,
    },

    /// Ordered-dither an image with a Bayer or blue-noise threshold matrix
    Dither {
        /// Input image path
        #[arg(short, long)]
        input: PathBuf,

        /// Output image path
        #[arg(short, long)]
        output: PathBuf,

        /// Path to a threshold texture (e.g. produced by `rank`)
        #[arg(short, long)]
        noise: Option<PathBuf>,

        /// Bayer matrix size (2, 4, or 8) used when no texture is given
        #[arg(short, long, default_value = "8")]
        bayer: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Halftone {
            input,
            output,
            kernel_size,
            sigma,
            iterations,
            scan,
            block_size,
            seed,
            verbose,
        } => {
            if !input.exists() {
                anyhow::bail!("Input file does not exist: {}", input.display());
            }

            println!("Halftoning: {}", input.display());
            println!("Kernel: {}x{}, sigma {}", kernel_size, kernel_size, sigma);
            println!("Output: {}", output.display());
            println!();

            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent).context("Failed to create output directory")?;
            }

            let img = image::open(&input)
                .context("Failed to load input image")?
                .to_luma8();
            let gray = GrayField::from_luma8(&img);

            let mut cache = KernelCache::new();
            let traversal = match block_size {
                Some(block) => {
                    // RTB: rank a block with the same PSF and let it drive the scan
                    let rank_config = RankerConfig {
                        kernel_size,
                        sigma,
                        seed,
                        verbose,
                        ..Default::default()
                    };
                    let rank = VoidClusterRanker::new(block, block, rank_config, &mut cache)
                        .context("Failed to create ranker")?
                        .rank()
                        .context("Failed to rank traversal block")?;
                    Traversal::Ranked(rank)
                }
                None => match scan {
                    ScanOrder::Shuffled => Traversal::Shuffled,
                    ScanOrder::Raster => Traversal::Raster,
                },
            };

            let config = DbsConfig {
                kernel_size,
                sigma,
                iterations,
                traversal,
                seed,
                verbose,
            };

            let result = DbsOptimizer::new(&gray, config, &mut cache)
                .context("Failed to create optimizer")?
                .run()
                .context("Halftoning failed")?;

            println!(
                "{} sweeps, {} accepted moves{}",
                result.iterations_run,
                result.swaps,
                if result.converged { ", converged" } else { "" }
            );

            save_pattern_to_png(&result.pattern, &output)
                .context("Failed to save halftone")?;

            println!();
            println!("Done!");
        }

        Commands::Rank {
            output,
            size,
            kernel_size,
            sigma,
            density,
            seed,
            verbose,
        } => {
            if size < 4 || size > 512 {
                anyhow::bail!("Size must be between 4 and 512");
            }

            println!("Generating {}x{} blue-noise threshold texture", size, size);
            println!("Kernel: {}x{}, sigma {}", kernel_size, kernel_size, sigma);
            if let Some(s) = seed {
                println!("Seed: {}", s);
            }
            println!("Output: {}", output.display());
            println!();

            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent).context("Failed to create output directory")?;
            }

            let config = RankerConfig {
                kernel_size,
                sigma,
                initial_density: density,
                seed,
                verbose,
            };

            let mut cache = KernelCache::new();
            let rank = VoidClusterRanker::new(size, size, config, &mut cache)
                .context("Failed to create ranker")?
                .rank()
                .context("Failed to generate rank array")?;

            save_threshold_to_png(&rank, &output).context("Failed to save threshold texture")?;

            println!();
            println!("Done!");
        }

        Commands::Dither {
            input,
            output,
            noise,
            bayer,
        } => {
            if !input.exists() {
                anyhow::bail!("Input file does not exist: {}", input.display());
            }

            let matrix = match &noise {
                Some(path) => {
                    if !path.exists() {
                        anyhow::bail!("Noise texture does not exist: {}", path.display());
                    }
                    println!("Threshold texture: {}", path.display());
                    ThresholdMatrix::load(path).context("Failed to load threshold texture")?
                }
                None => {
                    println!("Bayer matrix: {}x{}", bayer, bayer);
                    ThresholdMatrix::bayer(bayer).context("Unsupported Bayer size")?
                }
            };

            println!("Processing: {}", input.display());
            println!("Output: {}", output.display());
            println!();

            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent).context("Failed to create output directory")?;
            }

            apply_dithering(&input, &output, &matrix).context("Failed to apply dithering")?;

            println!("Dithered image saved to: {}", output.display());
            println!();
            println!("Done!");
        }
    }

    Ok(())
}
