//! Separable Gaussian blur over `f64` grids.
//!
//! Kernel weights are `exp(-x² / 2σ²)` sampled at integer offsets out to
//! `TRUNCATE` standard deviations and normalized to sum to one. Samples that
//! fall outside the grid are mirrored back in (`d c b a | a b c d`), so the
//! total mass of the grid is preserved.

use crate::grid::Grid;

/// Kernel extent in standard deviations.
pub const TRUNCATE: f64 = 4.0;

/// Half-width of the kernel for a given sigma (48 for sigma 12).
pub fn kernel_radius(sigma: f64) -> usize {
    (TRUNCATE * sigma + 0.5) as usize
}

/// Generate a normalized 1D Gaussian kernel of length `2 * radius + 1`.
pub fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = kernel_radius(sigma) as i64;
    let sigma_sq = sigma * sigma;

    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|i| {
            let x = i as f64;
            (-0.5 * x * x / sigma_sq).exp()
        })
        .collect();

    let sum: f64 = kernel.iter().sum();
    for weight in &mut kernel {
        *weight /= sum;
    }

    kernel
}

/// Map any index onto `0..len` by mirroring about the grid edges.
fn reflect(i: i64, len: usize) -> usize {
    let len = len as i64;
    let period = 2 * len;
    let m = i.rem_euclid(period);
    if m >= len {
        (period - 1 - m) as usize
    } else {
        m as usize
    }
}

/// Apply an isotropic Gaussian blur with standard deviation `sigma` (in cells).
///
/// A non-positive or non-finite sigma leaves the grid unchanged.
pub fn gaussian_blur(grid: &Grid<f64>, sigma: f64) -> Grid<f64> {
    if !sigma.is_finite() || sigma <= 0.0 || grid.is_empty() {
        return grid.clone();
    }

    let kernel = gaussian_kernel(sigma);
    let half_kernel = (kernel.len() / 2) as i64;
    let (width, height) = (grid.width, grid.height);

    // Horizontal pass
    let mut horizontal = Grid::new_with(width, height, 0.0f64);
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0;
            for (ki, &weight) in kernel.iter().enumerate() {
                let sx = reflect(x as i64 + ki as i64 - half_kernel, width);
                sum += *grid.get(sx, y) * weight;
            }
            horizontal.set(x, y, sum);
        }
    }

    // Vertical pass
    let mut result = Grid::new_with(width, height, 0.0f64);
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0;
            for (ki, &weight) in kernel.iter().enumerate() {
                let sy = reflect(y as i64 + ki as i64 - half_kernel, height);
                sum += *horizontal.get(x, sy) * weight;
            }
            result.set(x, y, sum);
        }
    }

    result
}
