/**
 * Perceptual Error Field
 *
 * The quantity DBS minimizes is the squared magnitude of the low-pass error
 * field: the PSF convolution of (binary pattern - grayscale target). This
 * module owns that field and keeps it consistent under local mutation without
 * ever recomputing the full convolution:
 *
 * - `build` performs the one full convolution at run start
 * - `apply_move` folds a toggle or swap into the field in O(k^2) per cell,
 *   by superposition (the convolution is linear, so the contributions of
 *   several flipped cells simply add)
 * - `delta_cost` prices a candidate move over the union of the affected
 *   kernel windows, exactly matching apply-recompute-undo to floating
 *   tolerance
 *
 * BOUNDARY POLICY
 * ===============
 * DBS treats pixels outside the image as absent (zero-padded). The
 * void-and-cluster ranker filters toroidally so its blocks tile seamlessly.
 * Both policies run through the same primitives here, selected by a
 * `Boundary` value instead of duplicated loops.
 *
 * For toroidal power-of-two fields the full build goes through the frequency
 * domain: convolution becomes element-wise multiplication after an FFT of
 * the error and of the wrap-embedded kernel.
 */

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::kernel::PsfKernel;
use crate::random::SeededRandom;

/// How coordinates outside the field are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Out-of-bounds pixels contribute nothing (plain DBS)
    Zero,
    /// Coordinates wrap around both axes (void-and-cluster)
    Toroidal,
}

/// Immutable grayscale target, `f32` values in [0, 1], row-major
#[derive(Debug, Clone)]
pub struct GrayField {
    data: Vec<f32>,
    width: usize,
    height: usize,
}

impl GrayField {
    /// Wrap an existing row-major buffer
    pub fn from_raw(data: Vec<f32>, width: usize, height: usize) -> Self {
        assert_eq!(data.len(), width * height, "gray buffer length mismatch");
        Self { data, width, height }
    }

    /// All-zero field
    pub fn zeros(width: usize, height: usize) -> Self {
        Self::from_raw(vec![0.0; width * height], width, height)
    }

    /// Every pixel set to `value`
    pub fn constant(width: usize, height: usize, value: f32) -> Self {
        Self::from_raw(vec![value; width * height], width, height)
    }

    /// Convert an 8-bit grayscale image to [0, 1] floats
    pub fn from_luma8(img: &image::GrayImage) -> Self {
        let (width, height) = img.dimensions();
        let data = img.as_raw().iter().map(|&v| v as f32 / 255.0).collect();
        Self::from_raw(data, width as usize, height as usize)
    }

    /// Field width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Field height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Value at `(x, y)`
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    /// Raw row-major values
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

/// Mutable binary halftone pattern, `u8` values in {0, 1}, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryPattern {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl BinaryPattern {
    /// Wrap an existing row-major buffer of 0/1 values
    pub fn from_raw(data: Vec<u8>, width: usize, height: usize) -> Self {
        assert_eq!(data.len(), width * height, "pattern buffer length mismatch");
        assert!(data.iter().all(|&v| v <= 1), "pattern values must be 0 or 1");
        Self { data, width, height }
    }

    /// Fair-coin random pattern drawn from `rng`
    pub fn random(width: usize, height: usize, rng: &mut SeededRandom) -> Self {
        let data = (0..width * height).map(|_| rng.next_bit()).collect();
        Self { data, width, height }
    }

    /// Random pattern holding approximately `density * width * height` ones
    pub fn random_with_density(
        width: usize,
        height: usize,
        density: f32,
        rng: &mut SeededRandom,
    ) -> Self {
        let area = width * height;
        let target = (area as f32 * density) as usize;
        let mut pattern = Self::from_raw(vec![0; area], width, height);
        let mut ones = 0;
        while ones < target {
            let idx = rng.next_index(area);
            if pattern.data[idx] == 0 {
                pattern.data[idx] = 1;
                ones += 1;
            }
        }
        pattern
    }

    /// Pattern width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Pattern height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Value at `(x, y)`
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    /// Set `(x, y)` to 0 or 1
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        debug_assert!(value <= 1);
        self.data[y * self.width + x] = value;
    }

    /// Count of 1 cells
    pub fn ones(&self) -> usize {
        self.data.iter().map(|&v| v as usize).sum()
    }

    /// Fraction of 1 cells
    pub fn fraction_ones(&self) -> f32 {
        self.ones() as f32 / (self.width * self.height) as f32
    }

    /// Flip every cell, 0 <-> 1
    pub fn invert(&mut self) {
        for v in &mut self.data {
            *v = 1 - *v;
        }
    }

    /// Raw row-major values
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Render as an 8-bit grayscale image (0 -> black, 1 -> white)
    pub fn to_luma8(&self) -> image::GrayImage {
        image::GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            image::Luma([self.get(x as usize, y as usize) * 255])
        })
    }
}

/// One affected cell of a move: its position and signed polarity change
#[derive(Debug, Clone, Copy)]
pub struct CellDelta {
    /// Column of the affected cell
    pub x: usize,
    /// Row of the affected cell
    pub y: usize,
    /// +1.0 when the cell turns on, -1.0 when it turns off
    pub delta: f32,
}

impl CellDelta {
    fn flip(x: usize, y: usize, old_value: u8) -> Self {
        let delta = if old_value == 0 { 1.0 } else { -1.0 };
        Self { x, y, delta }
    }
}

/// A candidate mutation: a single-cell toggle or an opposite-polarity swap
#[derive(Debug, Clone, Copy)]
pub struct Move {
    primary: CellDelta,
    secondary: Option<CellDelta>,
}

impl Move {
    /// Flip the cell at `(x, y)` whose current value is `old_value`
    pub fn toggle(x: usize, y: usize, old_value: u8) -> Self {
        Self {
            primary: CellDelta::flip(x, y, old_value),
            secondary: None,
        }
    }

    /// Exchange two cells of opposite polarity (both flip)
    pub fn swap(
        x: usize,
        y: usize,
        old_value: u8,
        other_x: usize,
        other_y: usize,
        other_old_value: u8,
    ) -> Self {
        debug_assert_ne!(old_value, other_old_value, "swap cells must differ");
        Self {
            primary: CellDelta::flip(x, y, old_value),
            secondary: Some(CellDelta::flip(other_x, other_y, other_old_value)),
        }
    }

    /// The affected cells, one for a toggle, two for a swap
    pub fn cells(&self) -> impl Iterator<Item = &CellDelta> {
        std::iter::once(&self.primary).chain(self.secondary.iter())
    }

    /// Write the flips into `pattern`
    pub fn apply_to(&self, pattern: &mut BinaryPattern) {
        for cell in self.cells() {
            let flipped = 1 - pattern.get(cell.x, cell.y);
            pattern.set(cell.x, cell.y, flipped);
        }
    }
}

/// Low-pass error field: PSF convolution of (pattern - gray)
///
/// Holds its own copy of the kernel it was built with, so field construction
/// and delta evaluation can never disagree on the PSF.
#[derive(Debug, Clone)]
pub struct ErrorField {
    data: Vec<f32>,
    width: usize,
    height: usize,
    boundary: Boundary,
    psf: PsfKernel,
}

impl ErrorField {
    /// Full convolution of `pattern - gray` under `boundary`
    pub fn build(
        gray: &GrayField,
        pattern: &BinaryPattern,
        psf: &PsfKernel,
        boundary: Boundary,
    ) -> Self {
        assert_eq!(gray.width(), pattern.width(), "gray/pattern width mismatch");
        assert_eq!(gray.height(), pattern.height(), "gray/pattern height mismatch");

        let width = gray.width();
        let height = gray.height();
        let err: Vec<f32> = pattern
            .data()
            .iter()
            .zip(gray.data())
            .map(|(&p, &g)| p as f32 - g)
            .collect();

        let use_fft = boundary == Boundary::Toroidal
            && width.is_power_of_two()
            && height.is_power_of_two();
        let data = if use_fft {
            convolve_fft(&err, width, height, psf)
        } else {
            convolve_spatial(&err, width, height, psf, boundary)
        };

        Self {
            data,
            width,
            height,
            boundary,
            psf: psf.clone(),
        }
    }

    /// Field width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Field height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Boundary policy the field was built under
    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    /// Kernel the field was built with
    pub fn psf(&self) -> &PsfKernel {
        &self.psf
    }

    /// Field value at `(x, y)`
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    /// Resolve a signed coordinate to a buffer index under the boundary policy
    #[inline]
    fn resolve(&self, x: isize, y: isize) -> Option<usize> {
        match self.boundary {
            Boundary::Zero => {
                if x < 0 || x >= self.width as isize || y < 0 || y >= self.height as isize {
                    None
                } else {
                    Some(y as usize * self.width + x as usize)
                }
            }
            Boundary::Toroidal => {
                let wx = x.rem_euclid(self.width as isize) as usize;
                let wy = y.rem_euclid(self.height as isize) as usize;
                Some(wy * self.width + wx)
            }
        }
    }

    /// Per-pixel field contributions of a move, merged by pixel index
    ///
    /// Wrapped offsets of the same cell can land on one pixel when the kernel
    /// is wider than the field; merging keeps the superposition exact there
    /// and in the overlap of the two swap windows.
    fn gather_contributions(&self, mv: &Move) -> Vec<(usize, f32)> {
        let radius = self.psf.radius() as isize;
        let mut contributions = Vec::with_capacity(2 * self.psf.size() * self.psf.size());

        for cell in mv.cells() {
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    let target = self.resolve(cell.x as isize + dx, cell.y as isize + dy);
                    if let Some(idx) = target {
                        contributions.push((idx, self.psf.weight(dx, dy) * cell.delta));
                    }
                }
            }
        }

        contributions.sort_unstable_by_key(|&(idx, _)| idx);
        contributions
    }

    /// Fold an accepted move into the field, O(k^2) per affected cell
    pub fn apply_move(&mut self, mv: &Move) {
        let radius = self.psf.radius() as isize;
        for cell in mv.cells() {
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    let target = self.resolve(cell.x as isize + dx, cell.y as isize + dy);
                    if let Some(idx) = target {
                        self.data[idx] += self.psf.weight(dx, dy) * cell.delta;
                    }
                }
            }
        }
    }

    /// Change in the field's sum of squares if `mv` were applied
    ///
    /// Evaluated over the union of the affected kernel windows only; equal to
    /// apply-then-recompute-then-undo without doing either.
    pub fn delta_cost(&self, mv: &Move) -> f32 {
        let contributions = self.gather_contributions(mv);
        let mut acc = 0.0f64;

        let mut i = 0;
        while i < contributions.len() {
            let idx = contributions[i].0;
            let mut delta = 0.0f32;
            while i < contributions.len() && contributions[i].0 == idx {
                delta += contributions[i].1;
                i += 1;
            }
            let old = self.data[idx] as f64;
            let new = old + delta as f64;
            acc += new * new - old * old;
        }

        acc as f32
    }

    /// Sum of squared field values (the DBS objective)
    pub fn sum_squares(&self) -> f32 {
        self.data.iter().map(|&v| (v as f64) * (v as f64)).sum::<f64>() as f32
    }

    /// Mean absolute field value, reported per sweep
    pub fn mean_abs(&self) -> f32 {
        let sum: f64 = self.data.iter().map(|&v| v.abs() as f64).sum();
        (sum / self.data.len() as f64) as f32
    }

    /// True when every field value is finite (NaN/Inf detection pass)
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

/// Direct spatial convolution, the reference path for any size and boundary
fn convolve_spatial(
    values: &[f32],
    width: usize,
    height: usize,
    psf: &PsfKernel,
    boundary: Boundary,
) -> Vec<f32> {
    let radius = psf.radius() as isize;
    let mut out = vec![0.0f32; width * height];

    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0f32;
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    let nx = x as isize + dx;
                    let ny = y as isize + dy;
                    let idx = match boundary {
                        Boundary::Zero => {
                            if nx < 0 || nx >= width as isize || ny < 0 || ny >= height as isize {
                                continue;
                            }
                            ny as usize * width + nx as usize
                        }
                        Boundary::Toroidal => {
                            let wx = nx.rem_euclid(width as isize) as usize;
                            let wy = ny.rem_euclid(height as isize) as usize;
                            wy * width + wx
                        }
                    };
                    sum += psf.weight(dx, dy) * values[idx];
                }
            }
            out[y * width + x] = sum;
        }
    }

    out
}

/// Toroidal convolution through the frequency domain
///
/// The PSF is embedded into a full-size wrapped kernel (offsets that wrap
/// onto the same cell accumulate), both operands are transformed, multiplied
/// element-wise, and transformed back. Requires power-of-two dimensions.
fn convolve_fft(values: &[f32], width: usize, height: usize, psf: &PsfKernel) -> Vec<f32> {
    let area = width * height;
    let radius = psf.radius() as isize;

    let mut kernel_full = vec![0.0f32; area];
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let wx = dx.rem_euclid(width as isize) as usize;
            let wy = dy.rem_euclid(height as isize) as usize;
            kernel_full[wy * width + wx] += psf.weight(dx, dy);
        }
    }

    let values_freq = fft_2d_forward(values, width, height);
    let kernel_freq = fft_2d_forward(&kernel_full, width, height);

    let product: Vec<Complex<f32>> = values_freq
        .iter()
        .zip(kernel_freq.iter())
        .map(|(v, k)| v * k)
        .collect();

    fft_2d_inverse(&product, width, height)
}

/// 2D forward FFT on real-valued data
fn fft_2d_forward(data: &[f32], width: usize, height: usize) -> Vec<Complex<f32>> {
    let mut complex_data: Vec<Complex<f32>> =
        data.iter().map(|&x| Complex::new(x, 0.0)).collect();

    // FFT on rows
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(width);
    for y in 0..height {
        let start = y * width;
        fft.process(&mut complex_data[start..start + width]);
    }

    // FFT on columns
    let fft = planner.plan_fft_forward(height);
    let mut column = vec![Complex::new(0.0, 0.0); height];
    for x in 0..width {
        for y in 0..height {
            column[y] = complex_data[y * width + x];
        }
        fft.process(&mut column);
        for y in 0..height {
            complex_data[y * width + x] = column[y];
        }
    }

    complex_data
}

/// 2D inverse FFT, returning normalized real parts
fn fft_2d_inverse(complex_data: &[Complex<f32>], width: usize, height: usize) -> Vec<f32> {
    let mut data = complex_data.to_vec();
    let area = width * height;

    // Inverse FFT on columns
    let mut planner = FftPlanner::new();
    let ifft = planner.plan_fft_inverse(height);
    let mut column = vec![Complex::new(0.0, 0.0); height];
    for x in 0..width {
        for y in 0..height {
            column[y] = data[y * width + x];
        }
        ifft.process(&mut column);
        for y in 0..height {
            data[y * width + x] = column[y];
        }
    }

    // Inverse FFT on rows
    let ifft = planner.plan_fft_inverse(width);
    for y in 0..height {
        let start = y * width;
        ifft.process(&mut data[start..start + width]);
    }

    data.iter().map(|c| c.re / area as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::PsfKernel;

    fn random_inputs(
        width: usize,
        height: usize,
        rng: &mut SeededRandom,
    ) -> (GrayField, BinaryPattern) {
        let gray_data = (0..width * height).map(|_| rng.next()).collect();
        let gray = GrayField::from_raw(gray_data, width, height);
        let pattern = BinaryPattern::random(width, height, rng);
        (gray, pattern)
    }

    /// A legal random move against the current pattern: mostly toggles, with
    /// swaps whenever an opposite-polarity right neighbour exists.
    fn random_move(pattern: &BinaryPattern, rng: &mut SeededRandom) -> Move {
        let x = rng.next_index(pattern.width());
        let y = rng.next_index(pattern.height());
        if x + 1 < pattern.width() && pattern.get(x + 1, y) != pattern.get(x, y) && rng.next() < 0.5
        {
            Move::swap(x, y, pattern.get(x, y), x + 1, y, pattern.get(x + 1, y))
        } else {
            Move::toggle(x, y, pattern.get(x, y))
        }
    }

    #[test]
    fn test_build_matches_hand_convolution() {
        // 2x2 field, 3x3 kernel, zero boundary: corner sums are easy to do by hand
        let gray = GrayField::constant(2, 2, 0.0);
        let pattern = BinaryPattern::from_raw(vec![1, 0, 0, 0], 2, 2);
        let psf = PsfKernel::gaussian(3, 1.0);
        let field = ErrorField::build(&gray, &pattern, &psf, Boundary::Zero);

        // err = [1,0,0,0]; field(x,y) = psf weight from (x,y) to (0,0)
        assert!((field.get(0, 0) - psf.weight(0, 0)).abs() < 1e-6);
        assert!((field.get(1, 0) - psf.weight(1, 0)).abs() < 1e-6);
        assert!((field.get(0, 1) - psf.weight(0, 1)).abs() < 1e-6);
        assert!((field.get(1, 1) - psf.weight(1, 1)).abs() < 1e-6);
    }

    #[test]
    fn test_toroidal_wraps_at_edges() {
        // A single 1 in the corner of a 4x4 block must leak to the opposite edges
        let gray = GrayField::zeros(4, 4);
        let pattern = BinaryPattern::from_raw(
            vec![1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            4,
            4,
        );
        let psf = PsfKernel::gaussian(3, 1.0);
        let field = ErrorField::build(&gray, &pattern, &psf, Boundary::Toroidal);

        let unit = psf.weight(1, 0);
        assert!((field.get(3, 0) - unit).abs() < 1e-5);
        assert!((field.get(0, 3) - unit).abs() < 1e-5);
        assert!((field.get(3, 3) - psf.weight(1, 1)).abs() < 1e-5);

        // Zero boundary must not wrap
        let clipped = ErrorField::build(&gray, &pattern, &psf, Boundary::Zero);
        assert_eq!(clipped.get(3, 0), 0.0);
        assert_eq!(clipped.get(3, 3), 0.0);
    }

    #[test]
    fn test_fft_matches_spatial() {
        let mut rng = SeededRandom::new(Some(21));
        let (gray, pattern) = random_inputs(16, 8, &mut rng);
        let psf = PsfKernel::gaussian(5, 1.3);

        let err: Vec<f32> = pattern
            .data()
            .iter()
            .zip(gray.data())
            .map(|(&p, &g)| p as f32 - g)
            .collect();
        let spatial = convolve_spatial(&err, 16, 8, &psf, Boundary::Toroidal);
        let fft = convolve_fft(&err, 16, 8, &psf);

        for (a, b) in spatial.iter().zip(fft.iter()) {
            assert!((a - b).abs() < 1e-4, "spatial {} vs fft {}", a, b);
        }
    }

    #[test]
    fn test_delta_cost_matches_recompute() {
        for boundary in [Boundary::Zero, Boundary::Toroidal] {
            let mut rng = SeededRandom::new(Some(77));
            let (gray, pattern) = random_inputs(9, 7, &mut rng);
            let psf = PsfKernel::gaussian(3, 1.0);
            let field = ErrorField::build(&gray, &pattern, &psf, boundary);

            for _ in 0..50 {
                let mv = random_move(&pattern, &mut rng);
                let predicted = field.delta_cost(&mv);

                // Independent route: apply to a scratch pattern, rebuild, diff
                let mut scratch = pattern.clone();
                mv.apply_to(&mut scratch);
                let rebuilt = ErrorField::build(&gray, &scratch, &psf, boundary);
                let actual = rebuilt.sum_squares() - field.sum_squares();

                assert!(
                    (predicted - actual).abs() < 1e-3,
                    "{:?}: predicted {} actual {}",
                    boundary,
                    predicted,
                    actual
                );
            }
        }
    }

    #[test]
    fn test_delta_cost_with_kernel_wider_than_field() {
        // 2x2 field under a 5x5 kernel: wrapped offsets stack on each pixel
        let mut rng = SeededRandom::new(Some(3));
        let (gray, pattern) = random_inputs(2, 2, &mut rng);
        let psf = PsfKernel::gaussian(5, 1.5);
        let field = ErrorField::build(&gray, &pattern, &psf, Boundary::Toroidal);

        let mv = Move::toggle(1, 0, pattern.get(1, 0));
        let predicted = field.delta_cost(&mv);

        let mut scratch = pattern.clone();
        mv.apply_to(&mut scratch);
        let rebuilt = ErrorField::build(&gray, &scratch, &psf, Boundary::Toroidal);
        let actual = rebuilt.sum_squares() - field.sum_squares();
        assert!((predicted - actual).abs() < 1e-3);
    }

    #[test]
    fn test_incremental_consistency_under_random_moves() {
        for boundary in [Boundary::Zero, Boundary::Toroidal] {
            let mut rng = SeededRandom::new(Some(11));
            let (gray, mut pattern) = random_inputs(12, 10, &mut rng);
            let psf = PsfKernel::gaussian(5, 1.2);
            let mut field = ErrorField::build(&gray, &pattern, &psf, boundary);

            for step in 0..200 {
                let mv = random_move(&pattern, &mut rng);
                mv.apply_to(&mut pattern);
                field.apply_move(&mv);

                if step % 25 == 0 {
                    let reference = ErrorField::build(&gray, &pattern, &psf, boundary);
                    for y in 0..10 {
                        for x in 0..12 {
                            assert!(
                                (field.get(x, y) - reference.get(x, y)).abs() < 1e-4,
                                "{:?} drifted at ({}, {}) after {} moves",
                                boundary,
                                x,
                                y,
                                step + 1
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_move_polarity_deltas() {
        let mv = Move::toggle(2, 3, 0);
        let cells: Vec<_> = mv.cells().collect();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].delta, 1.0);

        let mv = Move::swap(0, 0, 1, 1, 0, 0);
        let cells: Vec<_> = mv.cells().collect();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].delta, -1.0);
        assert_eq!(cells[1].delta, 1.0);
    }

    #[test]
    fn test_apply_to_pattern_flips_cells() {
        let mut pattern = BinaryPattern::from_raw(vec![0, 1, 0, 1], 2, 2);
        Move::swap(0, 0, 0, 1, 0, 1).apply_to(&mut pattern);
        assert_eq!(pattern.data(), &[1, 0, 0, 1]);

        Move::toggle(0, 1, 0).apply_to(&mut pattern);
        assert_eq!(pattern.data(), &[1, 0, 1, 1]);
    }

    #[test]
    fn test_pattern_helpers() {
        let mut pattern = BinaryPattern::from_raw(vec![1, 0, 0, 0, 1, 1], 3, 2);
        assert_eq!(pattern.ones(), 3);
        assert!((pattern.fraction_ones() - 0.5).abs() < 1e-6);

        pattern.invert();
        assert_eq!(pattern.data(), &[0, 1, 1, 1, 0, 0]);
    }

    #[test]
    fn test_is_finite_flags_anomalies() {
        let gray = GrayField::zeros(2, 2);
        let pattern = BinaryPattern::from_raw(vec![0, 1, 1, 0], 2, 2);
        let psf = PsfKernel::gaussian(3, 1.0);
        let mut field = ErrorField::build(&gray, &pattern, &psf, Boundary::Zero);
        assert!(field.is_finite());

        field.data[2] = f32::NAN;
        assert!(!field.is_finite());
    }

    #[test]
    fn test_mean_abs_and_sum_squares() {
        let gray = GrayField::zeros(1, 2);
        let pattern = BinaryPattern::from_raw(vec![1, 0], 1, 2);
        let psf = PsfKernel::gaussian(3, 1.0);
        let field = ErrorField::build(&gray, &pattern, &psf, Boundary::Toroidal);

        let expected: Vec<f32> = vec![field.get(0, 0), field.get(0, 1)];
        let sum_sq: f32 = expected.iter().map(|v| v * v).sum();
        let mean_abs: f32 = expected.iter().map(|v| v.abs()).sum::<f32>() / 2.0;
        assert!((field.sum_squares() - sum_sq).abs() < 1e-5);
        assert!((field.mean_abs() - mean_abs).abs() < 1e-5);
    }
}
