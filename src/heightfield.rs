//! Fractal heightfield synthesis by midpoint displacement ("diamond-square").

use log::debug;
use rand::Rng;

use crate::error::TerrainError;

/// Row-major grid of elevations with exactly tracked bounds.
///
/// Once built the grid is read-only; synthesis produces a fresh grid instead of
/// editing one in place.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationGrid {
    width: usize,
    height: usize,
    cells: Vec<f32>,
    min_elevation: f32,
    max_elevation: f32,
}

impl ElevationGrid {
    pub fn from_samples(
        width: usize,
        height: usize,
        cells: Vec<f32>,
    ) -> Result<Self, TerrainError> {
        if width < 2 || height < 2 {
            return Err(TerrainError::InvalidDimensions { width, height });
        }
        let expected = width * height;
        if cells.len() != expected {
            return Err(TerrainError::SampleCountMismatch {
                expected,
                actual: cells.len(),
            });
        }
        if let Some(index) = cells.iter().position(|h| !h.is_finite()) {
            return Err(TerrainError::NonFiniteSample { index });
        }

        Ok(Self::with_scanned_bounds(width, height, cells))
    }

    pub fn flat(width: usize, height: usize, elevation: f32) -> Result<Self, TerrainError> {
        Self::from_samples(width, height, vec![elevation; width * height])
    }

    fn with_scanned_bounds(width: usize, height: usize, cells: Vec<f32>) -> Self {
        let (min_elevation, max_elevation) = scan_bounds(&cells);
        Self {
            width,
            height,
            cells,
            min_elevation,
            max_elevation,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Elevation of cell `(x, z)`. Panics when the cell is outside the grid.
    pub fn get(&self, x: usize, z: usize) -> f32 {
        assert!(x < self.width && z < self.height, "cell ({x}, {z}) outside grid");
        self.cells[z * self.width + x]
    }

    pub fn cells(&self) -> &[f32] {
        &self.cells
    }

    pub fn min_elevation(&self) -> f32 {
        self.min_elevation
    }

    pub fn max_elevation(&self) -> f32 {
        self.max_elevation
    }

    pub fn range(&self) -> f32 {
        self.max_elevation - self.min_elevation
    }
}

fn scan_bounds(cells: &[f32]) -> (f32, f32) {
    cells
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &h| (lo.min(h), hi.max(h)))
}

/// Noise amplitude and its per-pass decay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplacementParams {
    /// Half-width of the uniform offset drawn in the first pass.
    pub scale: f32,
    pub decay_base: f32,
    /// Exponent of the decay; larger values smooth the finer passes faster.
    pub roughness: f32,
}

impl DisplacementParams {
    /// Starting scale taken as a fraction of the seed grid's elevation range.
    pub fn for_grid(grid: &ElevationGrid, fraction: f32, decay_base: f32, roughness: f32) -> Self {
        Self {
            scale: grid.range() * fraction,
            decay_base,
            roughness,
        }
    }

    /// Factor applied to `scale` after every pass.
    pub fn decay(&self) -> f32 {
        self.decay_base.powf(-self.roughness)
    }

    fn validate(&self) -> Result<(), TerrainError> {
        if !self.scale.is_finite() || self.scale < 0.0 {
            return Err(TerrainError::InvalidParameter {
                name: "scale",
                value: self.scale,
            });
        }
        if !self.decay_base.is_finite() || self.decay_base <= 0.0 {
            return Err(TerrainError::InvalidParameter {
                name: "decay_base",
                value: self.decay_base,
            });
        }
        if !self.roughness.is_finite() {
            return Err(TerrainError::InvalidParameter {
                name: "roughness",
                value: self.roughness,
            });
        }
        Ok(())
    }
}

/// True for `2^k + 1` with `k >= 1`.
pub fn is_displacement_size(n: usize) -> bool {
    n >= 3 && (n - 1).is_power_of_two()
}

/// Refines `seed` by midpoint displacement and returns the new grid.
///
/// The seed must be square with a side of `2^k + 1`; callers pad or crop
/// beforehand (see [`crop_to_displacement_size`]).
pub fn synthesize<R: Rng + ?Sized>(
    seed: &ElevationGrid,
    params: DisplacementParams,
    rng: &mut R,
) -> Result<ElevationGrid, TerrainError> {
    if seed.width != seed.height || !is_displacement_size(seed.width) {
        return Err(TerrainError::InvalidDimensions {
            width: seed.width,
            height: seed.height,
        });
    }
    params.validate()?;

    let size = seed.width;
    let mut heights = seed.cells.clone();
    let mut step = (size - 1) / 2;
    let mut scale = params.scale;
    let decay = params.decay();
    let mut passes = 0;

    while step > 1 {
        diamond_step(&mut heights, size, step, scale, rng);
        square_step(&mut heights, size, step, scale, rng);
        step /= 2;
        scale *= decay;
        passes += 1;
    }

    let grid = ElevationGrid::with_scanned_bounds(size, size, heights);
    debug!(
        "synthesized {size}x{size} heightfield in {passes} passes, elevation {:.2}..{:.2}",
        grid.min_elevation, grid.max_elevation
    );
    Ok(grid)
}

// Corner indices on the far side wrap modulo the grid size.
fn diamond_step<R: Rng + ?Sized>(
    heights: &mut [f32],
    size: usize,
    step: usize,
    scale: f32,
    rng: &mut R,
) {
    let half = step / 2;

    for z in (half..size).step_by(step) {
        let (z0, z1) = (z - half, (z + half) % size);
        for x in (half..size).step_by(step) {
            let (x0, x1) = (x - half, (x + half) % size);
            let avg = (heights[z0 * size + x0]
                + heights[z0 * size + x1]
                + heights[z1 * size + x0]
                + heights[z1 * size + x1])
                / 4.0;
            heights[z * size + x] = avg + displacement(rng, scale);
        }
    }
}

// Out-of-bounds neighbours are skipped, not wrapped.
fn square_step<R: Rng + ?Sized>(
    heights: &mut [f32],
    size: usize,
    step: usize,
    scale: f32,
    rng: &mut R,
) {
    let half = step / 2;

    for z in (0..size).step_by(half) {
        let shift = if (z / half) % 2 == 0 { half } else { 0 };
        for x in (shift..size).step_by(step) {
            let mut sum = 0.0;
            let mut count = 0u32;

            if x >= half {
                sum += heights[z * size + x - half];
                count += 1;
            }
            if x + half < size {
                sum += heights[z * size + x + half];
                count += 1;
            }
            if z >= half {
                sum += heights[(z - half) * size + x];
                count += 1;
            }
            if z + half < size {
                sum += heights[(z + half) * size + x];
                count += 1;
            }

            if count > 0 {
                heights[z * size + x] = sum / count as f32 + displacement(rng, scale);
            }
        }
    }
}

fn displacement<R: Rng + ?Sized>(rng: &mut R, scale: f32) -> f32 {
    if scale > 0.0 {
        rng.gen_range(-scale..=scale)
    } else {
        0.0
    }
}

/// Adds uniform noise in `[-amount, amount]` to every cell.
pub fn jitter<R: Rng + ?Sized>(
    grid: &ElevationGrid,
    amount: f32,
    rng: &mut R,
) -> Result<ElevationGrid, TerrainError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(TerrainError::InvalidParameter {
            name: "sample_jitter",
            value: amount,
        });
    }

    let cells = grid
        .cells
        .iter()
        .map(|&h| h + displacement(rng, amount))
        .collect();
    Ok(ElevationGrid::with_scanned_bounds(grid.width, grid.height, cells))
}

/// Crops the top-left corner of `grid` to the largest `2^k + 1` square it contains.
pub fn crop_to_displacement_size(grid: &ElevationGrid) -> Result<ElevationGrid, TerrainError> {
    let limit = grid.width.min(grid.height);
    if limit < 3 {
        return Err(TerrainError::InvalidDimensions {
            width: grid.width,
            height: grid.height,
        });
    }

    let mut size = 3;
    while (size - 1) * 2 + 1 <= limit {
        size = (size - 1) * 2 + 1;
    }

    if size == grid.width && size == grid.height {
        return Ok(grid.clone());
    }

    let mut cells = Vec::with_capacity(size * size);
    for z in 0..size {
        let row = z * grid.width;
        cells.extend_from_slice(&grid.cells[row..row + size]);
    }
    debug!("cropped {}x{} grid to {size}x{size}", grid.width, grid.height);
    Ok(ElevationGrid::with_scanned_bounds(size, size, cells))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn params(scale: f32) -> DisplacementParams {
        DisplacementParams {
            scale,
            decay_base: 1.5,
            roughness: 1.2,
        }
    }

    fn ramp(size: usize) -> ElevationGrid {
        let cells = (0..size * size).map(|i| (i % 7) as f32 * 3.0).collect();
        ElevationGrid::from_samples(size, size, cells).unwrap()
    }

    #[test]
    fn from_samples_tracks_exact_bounds() {
        let grid = ElevationGrid::from_samples(2, 3, vec![4.0, -1.5, 2.0, 9.25, 0.0, 3.0]).unwrap();
        assert_eq!(grid.min_elevation(), -1.5);
        assert_eq!(grid.max_elevation(), 9.25);
        assert_eq!(grid.get(1, 1), 9.25);
        assert_eq!(grid.get(0, 2), 0.0);
    }

    #[test]
    fn from_samples_rejects_bad_input() {
        assert_eq!(
            ElevationGrid::from_samples(1, 4, vec![0.0; 4]),
            Err(TerrainError::InvalidDimensions { width: 1, height: 4 })
        );
        assert_eq!(
            ElevationGrid::from_samples(3, 3, vec![0.0; 8]),
            Err(TerrainError::SampleCountMismatch { expected: 9, actual: 8 })
        );
        let mut cells = vec![0.0; 4];
        cells[2] = f32::NAN;
        assert_eq!(
            ElevationGrid::from_samples(2, 2, cells),
            Err(TerrainError::NonFiniteSample { index: 2 })
        );
    }

    #[test]
    fn displacement_sizes() {
        for n in [3, 5, 9, 17, 33, 65, 129, 257, 513] {
            assert!(is_displacement_size(n), "{n}");
        }
        for n in [0, 1, 2, 4, 6, 10, 128, 256] {
            assert!(!is_displacement_size(n), "{n}");
        }
    }

    #[test]
    fn synthesize_rejects_invalid_dimensions() {
        let mut rng = StdRng::seed_from_u64(1);
        let wrong_side = ElevationGrid::flat(6, 6, 0.0).unwrap();
        assert_eq!(
            synthesize(&wrong_side, params(1.0), &mut rng),
            Err(TerrainError::InvalidDimensions { width: 6, height: 6 })
        );
        let not_square = ElevationGrid::flat(5, 9, 0.0).unwrap();
        assert_eq!(
            synthesize(&not_square, params(1.0), &mut rng),
            Err(TerrainError::InvalidDimensions { width: 5, height: 9 })
        );
    }

    #[test]
    fn synthesize_rejects_negative_scale() {
        let mut rng = StdRng::seed_from_u64(1);
        let seed = ElevationGrid::flat(5, 5, 0.0).unwrap();
        assert!(matches!(
            synthesize(&seed, params(-1.0), &mut rng),
            Err(TerrainError::InvalidParameter { name: "scale", .. })
        ));
    }

    #[test]
    fn flat_seed_without_noise_stays_flat() {
        let mut rng = StdRng::seed_from_u64(7);
        let seed = ElevationGrid::flat(5, 5, 0.0).unwrap();
        let grid = synthesize(&seed, params(0.0), &mut rng).unwrap();
        assert_eq!(grid.width(), 5);
        assert_eq!(grid.height(), 5);
        assert!(grid.cells().iter().all(|&h| h == 0.0));
        assert_eq!(grid.min_elevation(), 0.0);
        assert_eq!(grid.max_elevation(), 0.0);
    }

    #[test]
    fn same_seed_same_terrain() {
        let seed = ramp(17);
        let a = synthesize(&seed, params(6.0), &mut StdRng::seed_from_u64(42)).unwrap();
        let b = synthesize(&seed, params(6.0), &mut StdRng::seed_from_u64(42)).unwrap();
        let c = synthesize(&seed, params(6.0), &mut StdRng::seed_from_u64(43)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn bounds_match_a_fresh_scan() {
        let mut rng = StdRng::seed_from_u64(3);
        let grid = synthesize(&ramp(33), params(10.0), &mut rng).unwrap();
        let (lo, hi) = scan_bounds(grid.cells());
        assert_eq!(grid.min_elevation(), lo);
        assert_eq!(grid.max_elevation(), hi);
        assert!(grid.cells().iter().all(|&h| lo <= h && h <= hi));
    }

    #[test]
    fn corners_are_never_displaced() {
        let seed = ramp(17);
        let grid = synthesize(&seed, params(25.0), &mut StdRng::seed_from_u64(11)).unwrap();
        for (x, z) in [(0, 0), (16, 0), (0, 16), (16, 16)] {
            assert_eq!(grid.get(x, z), seed.get(x, z));
        }
    }

    #[test]
    fn decay_shrinks_scale_between_passes() {
        let p = params(1.0);
        assert!((p.decay() - 1.5f32.powf(-1.2)).abs() < 1e-6);
        assert!(p.decay() < 1.0);
    }

    // On `2^k + 1` grids the far corners of the last diamond sit on the last
    // row and column, so a wrapped index would read row or column 0 instead.
    #[test]
    fn diamond_step_reads_the_far_edge_without_wrapping() {
        const EDGE: f32 = 8.0;
        for size in [5usize, 9, 17, 33, 65] {
            let mut step = (size - 1) / 2;
            while step > 1 {
                let mut heights: Vec<f32> = (0..size * size)
                    .map(|i| if i % size == size - 1 || i / size == size - 1 { EDGE } else { 0.0 })
                    .collect();
                diamond_step(&mut heights, size, step, 0.0, &mut StdRng::seed_from_u64(0));

                let last = size - 1 - step / 2;
                assert_eq!(heights[last * size + last], 0.75 * EDGE, "size {size} step {step}");
                assert_eq!(heights[last * size + step / 2], 0.5 * EDGE, "size {size} step {step}");
                assert_eq!(heights[(step / 2) * size + step / 2], 0.0, "size {size} step {step}");
                step /= 2;
            }
        }
    }

    #[test]
    fn square_step_excludes_rather_than_wraps() {
        let mut cells = vec![0.0; 25];
        // (x = 1, z = 4) would be the wrapped upper neighbour of (1, 0).
        cells[4 * 5 + 1] = 12.0;
        let seed = ElevationGrid::from_samples(5, 5, cells).unwrap();
        let grid = synthesize(&seed, params(0.0), &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(grid.get(1, 0), 0.0);
    }

    #[test]
    fn jitter_stays_within_amount() {
        let seed = ElevationGrid::flat(9, 9, 10.0).unwrap();
        let noisy = jitter(&seed, 1.2, &mut StdRng::seed_from_u64(5)).unwrap();
        assert!(noisy.cells().iter().all(|&h| (h - 10.0).abs() <= 1.2 + 1e-5));
        assert!(noisy.range() > 0.0);
        assert!(jitter(&seed, -1.0, &mut StdRng::seed_from_u64(5)).is_err());
    }

    #[test]
    fn crop_picks_largest_displacement_square() {
        let cells = (0..240).map(|i| i as f32).collect();
        let grid = ElevationGrid::from_samples(20, 12, cells).unwrap();
        let cropped = crop_to_displacement_size(&grid).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (9, 9));
        assert_eq!(cropped.get(0, 0), 0.0);
        assert_eq!(cropped.get(8, 1), 28.0);
        assert_eq!(cropped.max_elevation(), 8.0 * 20.0 + 8.0);

        let small = ElevationGrid::flat(2, 5, 0.0).unwrap();
        assert!(crop_to_displacement_size(&small).is_err());
    }
}
