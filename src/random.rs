/**
 * Seeded Random Number Generation
 *
 * Mulberry32 PRNG used for initial binary patterns and shuffled scan orders.
 * Fast, high-quality, and reproducible: the same seed always yields the same
 * halftone or rank array. Runs without an explicit seed fall back to the
 * system clock.
 */

/// Mulberry32 seeded random number generator
#[derive(Debug, Clone)]
pub struct SeededRandom {
    seed: u32,
}

impl SeededRandom {
    /// Create a generator from an optional seed (clock-derived if `None`)
    pub fn new(seed: Option<u32>) -> Self {
        Self {
            seed: seed.unwrap_or_else(|| {
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_millis() as u32)
                    .unwrap_or(0)
            }),
        }
    }

    /// Next value in [0, 1)
    pub fn next(&mut self) -> f32 {
        self.seed = self.seed.wrapping_add(0x6D2B79F5);
        let mut t = self.seed ^ (self.seed >> 15);
        t = t.wrapping_mul(1 | self.seed);
        t ^= t.wrapping_add(t.wrapping_mul(t ^ (t >> 7)).wrapping_mul(61 | t));
        ((t ^ (t >> 14)) as f32) / 4294967296.0
    }

    /// Uniform index in [0, bound)
    pub fn next_index(&mut self, bound: usize) -> usize {
        let idx = (self.next() * bound as f32) as usize;
        idx.min(bound.saturating_sub(1))
    }

    /// Fair coin flip, 0 or 1
    pub fn next_bit(&mut self) -> u8 {
        u8::from(self.next() >= 0.5)
    }

    /// In-place Fisher-Yates shuffle
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_index(i + 1);
            items.swap(i, j);
        }
    }
}
