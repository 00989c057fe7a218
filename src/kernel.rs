/**
 * Gaussian Point Spread Function Kernels
 *
 * The PSF approximates how the human visual system blurs a binary pattern.
 * Both the DBS optimizer and the void-and-cluster ranker score patterns
 * through the same kernel, so a single cache object is injected into both
 * rather than hiding a process-wide memo.
 *
 * Kernels are deliberately NOT normalized: the error metric only needs a
 * consistent scale between field construction and delta evaluation. Callers
 * that want a probability-preserving filter must call `normalized()`.
 */

/// Square Gaussian PSF matrix of odd side length
#[derive(Debug, Clone)]
pub struct PsfKernel {
    size: usize,
    sigma: f32,
    weights: Vec<f32>,
}

impl PsfKernel {
    /// Build a `size`x`size` Gaussian, `w(dx, dy) = exp(-(dx^2+dy^2) / (2 sigma^2))`
    ///
    /// The center cell is `size / 2` and carries weight 1.0.
    pub fn gaussian(size: usize, sigma: f32) -> Self {
        let center = (size / 2) as isize;
        let divisor = 2.0 * sigma * sigma;
        let mut weights = vec![0.0f32; size * size];

        for ky in 0..size {
            for kx in 0..size {
                let dx = (kx as isize - center) as f32;
                let dy = (ky as isize - center) as f32;
                weights[ky * size + kx] = (-(dx * dx + dy * dy) / divisor).exp();
            }
        }

        Self { size, sigma, weights }
    }

    /// Side length of the kernel
    pub fn size(&self) -> usize {
        self.size
    }

    /// Sigma the kernel was built with
    pub fn sigma(&self) -> f32 {
        self.sigma
    }

    /// Half the side length, the reach of one move's influence
    pub fn radius(&self) -> usize {
        self.size / 2
    }

    /// Weight at a signed offset from the center; zero outside the kernel
    #[inline]
    pub fn weight(&self, dx: isize, dy: isize) -> f32 {
        let radius = (self.size / 2) as isize;
        if dx.abs() > radius || dy.abs() > radius {
            return 0.0;
        }
        let kx = (dx + radius) as usize;
        let ky = (dy + radius) as usize;
        self.weights[ky * self.size + kx]
    }

    /// Copy of this kernel scaled so its weights sum to 1
    pub fn normalized(&self) -> Self {
        let sum: f32 = self.weights.iter().sum();
        Self {
            size: self.size,
            sigma: self.sigma,
            weights: self.weights.iter().map(|w| w / sum).collect(),
        }
    }
}

/// Single-slot memo for Gaussian PSF matrices
///
/// Keyed on the last `(size, sigma)` pair; recomputes only when either
/// parameter changes. Parameter validation belongs to the consumer configs,
/// not here.
#[derive(Debug, Default)]
pub struct KernelCache {
    slot: Option<PsfKernel>,
}

impl KernelCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self { slot: None }
    }

    /// Fetch the kernel for `(size, sigma)`, reusing the memoized one if it matches
    pub fn get(&mut self, size: usize, sigma: f32) -> &PsfKernel {
        let stale = match &self.slot {
            Some(kernel) => kernel.size != size || kernel.sigma != sigma,
            None => true,
        };
        if stale {
            self.slot = None;
        }
        self.slot.get_or_insert_with(|| PsfKernel::gaussian(size, sigma))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaussian_center_is_one() {
        let kernel = PsfKernel::gaussian(5, 1.0);
        assert_eq!(kernel.weight(0, 0), 1.0);
    }

    #[test]
    fn test_gaussian_symmetry() {
        let kernel = PsfKernel::gaussian(7, 1.3);
        for dy in -3..=3isize {
            for dx in -3..=3isize {
                assert_eq!(kernel.weight(dx, dy), kernel.weight(-dx, -dy));
                assert_eq!(kernel.weight(dx, dy), kernel.weight(dy, dx));
            }
        }
    }

    #[test]
    fn test_gaussian_falls_off() {
        let kernel = PsfKernel::gaussian(5, 1.0);
        assert!(kernel.weight(1, 0) < kernel.weight(0, 0));
        assert!(kernel.weight(2, 2) < kernel.weight(1, 1));
        // exp(-1 / 2) at unit distance with sigma 1
        assert!((kernel.weight(1, 0) - (-0.5f32).exp()).abs() < 1e-6);
    }

    #[test]
    fn test_weight_outside_kernel_is_zero() {
        let kernel = PsfKernel::gaussian(3, 1.0);
        assert_eq!(kernel.weight(2, 0), 0.0);
        assert_eq!(kernel.weight(0, -2), 0.0);
    }

    #[test]
    fn test_normalized_sums_to_one() {
        let kernel = PsfKernel::gaussian(9, 1.5).normalized();
        let mut sum = 0.0;
        for dy in -4..=4isize {
            for dx in -4..=4isize {
                sum += kernel.weight(dx, dy);
            }
        }
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_cache_returns_requested_kernel() {
        let mut cache = KernelCache::new();

        let first = cache.get(3, 1.0).clone();
        assert_eq!(first.size(), 3);
        assert_eq!(first.sigma(), 1.0);

        // Same key again: identical weights
        let again = cache.get(3, 1.0);
        for dy in -1..=1isize {
            for dx in -1..=1isize {
                assert_eq!(again.weight(dx, dy), first.weight(dx, dy));
            }
        }

        // Changing either parameter recomputes
        assert_eq!(cache.get(5, 1.0).size(), 5);
        assert_eq!(cache.get(5, 2.0).sigma(), 2.0);
    }
}
