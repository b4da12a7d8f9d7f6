use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::blur::gaussian_blur;
use crate::catalog::{Catalog, Descriptor, Rgba};
use crate::error::{TerrainError, TerrainResult};
use crate::grid::Grid;

// =============================================================================
// TERRAIN PARAMETERS
// =============================================================================

pub const DEFAULT_WIDTH: usize = 100;
pub const DEFAULT_HEIGHT: usize = 100;
pub const DEFAULT_SEED: u64 = 42;

/// Blob spread in grid cells
pub const BLOB_SIGMA: f64 = 12.0;

// Blob centers are drawn from [PLACEMENT_MIN, PLACEMENT_MAX) on both axes
pub const PLACEMENT_MIN: usize = 20;
pub const PLACEMENT_MAX: usize = 80;

/// Accumulator channels (RGBA)
pub const CANVAS_CHANNELS: usize = 4;
/// Output channels (RGB)
pub const IMAGE_CHANNELS: usize = 3;

/// Parameters for terrain generation
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainParams {
    pub width: usize,
    pub height: usize,
    /// Seed for blob placement; every call starts a fresh stream from it
    pub seed: u64,
    /// Gaussian standard deviation of each blob, in cells
    pub sigma: f64,
    /// Inclusive lower bound for blob centers
    pub placement_min: usize,
    /// Exclusive upper bound for blob centers
    pub placement_max: usize,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            seed: DEFAULT_SEED,
            sigma: BLOB_SIGMA,
            placement_min: PLACEMENT_MIN,
            placement_max: PLACEMENT_MAX,
        }
    }
}

impl TerrainParams {
    pub fn validate(&self) -> TerrainResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(TerrainError::invalid_params(format!(
                "canvas must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        if !self.sigma.is_finite() || self.sigma <= 0.0 {
            return Err(TerrainError::invalid_params(format!(
                "blur sigma must be > 0, got {}",
                self.sigma
            )));
        }
        if self.placement_min >= self.placement_max {
            return Err(TerrainError::invalid_params(format!(
                "placement range [{}, {}) is empty",
                self.placement_min, self.placement_max
            )));
        }
        if self.placement_max > self.width || self.placement_max > self.height {
            return Err(TerrainError::invalid_params(format!(
                "placement range [{}, {}) does not fit a {}x{} canvas",
                self.placement_min, self.placement_max, self.width, self.height
            )));
        }
        Ok(())
    }
}

// =============================================================================
// CANVAS AND IMAGE
// =============================================================================

/// Un-normalized RGBA accumulator that blobs are summed into.
#[derive(Clone, Debug, PartialEq)]
pub struct Canvas {
    cells: Grid<[f64; CANVAS_CHANNELS]>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            cells: Grid::new_with(width, height, [0.0; CANVAS_CHANNELS]),
        }
    }

    pub fn width(&self) -> usize {
        self.cells.width
    }

    pub fn height(&self) -> usize {
        self.cells.height
    }

    pub fn get(&self, x: usize, y: usize) -> [f64; CANVAS_CHANNELS] {
        *self.cells.get(x, y)
    }

    /// Additively blend `weights * color` into every channel.
    pub fn add_blob(&mut self, weights: &Grid<f64>, color: &Rgba) {
        debug_assert_eq!((weights.width, weights.height), (self.width(), self.height()));
        for (x, y, cell) in self.cells.iter_mut() {
            let w = *weights.get(x, y);
            for (acc, c) in cell.iter_mut().zip(color) {
                *acc += w * c;
            }
        }
    }

    /// One channel as its own grid.
    pub fn channel(&self, channel: usize) -> Grid<f64> {
        self.cells.map(|cell| cell[channel])
    }

    pub fn channel_max(&self, channel: usize) -> f64 {
        self.cells
            .values()
            .map(|cell| cell[channel])
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Drop alpha and rescale each color channel so its peak is 1.0.
    ///
    /// Channels are normalized independently; a channel no blob touched
    /// stays at zero.
    pub fn into_rgb(self) -> TerrainImage {
        let mut scale = [1.0f64; IMAGE_CHANNELS];
        for (channel, s) in scale.iter_mut().enumerate() {
            let max = self.channel_max(channel);
            if max > 0.0 {
                *s = max;
            }
        }

        let pixels = self
            .cells
            .map(|cell| [cell[0] / scale[0], cell[1] / scale[1], cell[2] / scale[2]]);
        TerrainImage { pixels }
    }
}

/// Normalized RGB terrain map, height x width x 3 with values in [0, 1].
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainImage {
    pixels: Grid<[f64; IMAGE_CHANNELS]>,
}

impl TerrainImage {
    pub fn width(&self) -> usize {
        self.pixels.width
    }

    pub fn height(&self) -> usize {
        self.pixels.height
    }

    /// `(height, width, channels)`
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.height(), self.width(), IMAGE_CHANNELS)
    }

    pub fn get(&self, x: usize, y: usize) -> [f64; IMAGE_CHANNELS] {
        *self.pixels.get(x, y)
    }

    pub fn pixels(&self) -> &Grid<[f64; IMAGE_CHANNELS]> {
        &self.pixels
    }

    pub fn channel(&self, channel: usize) -> Grid<f64> {
        self.pixels.map(|px| px[channel])
    }

    pub fn channel_max(&self, channel: usize) -> f64 {
        self.pixels
            .values()
            .map(|px| px[channel])
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

// =============================================================================
// GENERATION
// =============================================================================

/// Sum one blurred blob per selected descriptor into a fresh canvas, drawing
/// blob centers from `rng`.
///
/// Names are resolved before any randomness is consumed, so an unknown name
/// fails without touching `rng`. Each occurrence of a name draws its own
/// `(x, y)`, in selection order.
pub fn generate_canvas_with_rng<S, R>(
    selected: &[S],
    catalog: &Catalog,
    params: &TerrainParams,
    rng: &mut R,
) -> TerrainResult<Canvas>
where
    S: AsRef<str>,
    R: Rng,
{
    params.validate()?;
    let descriptors = selected
        .iter()
        .map(|name| catalog.lookup(name.as_ref()))
        .collect::<TerrainResult<Vec<&Descriptor>>>()?;

    let mut canvas = Canvas::new(params.width, params.height);
    let mut impulse = Grid::new_with(params.width, params.height, 0.0f64);

    for descriptor in descriptors {
        let x = rng.gen_range(params.placement_min..params.placement_max);
        let y = rng.gen_range(params.placement_min..params.placement_max);

        impulse.set(x, y, 1.0);
        let blurred = gaussian_blur(&impulse, params.sigma);
        impulse.set(x, y, 0.0);

        debug!(
            descriptor = descriptor.name,
            category = descriptor.category,
            x,
            y,
            "placed blob"
        );
        canvas.add_blob(&blurred, &descriptor.color);
    }

    Ok(canvas)
}

/// Like [`generate_canvas_with_rng`], seeding a new generator from `params.seed`.
pub fn generate_canvas<S: AsRef<str>>(
    selected: &[S],
    catalog: &Catalog,
    params: &TerrainParams,
) -> TerrainResult<Canvas> {
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    generate_canvas_with_rng(selected, catalog, params, &mut rng)
}

/// Generate a normalized terrain map using a caller-supplied generator.
pub fn generate_with_rng<S, R>(
    selected: &[S],
    catalog: &Catalog,
    params: &TerrainParams,
    rng: &mut R,
) -> TerrainResult<TerrainImage>
where
    S: AsRef<str>,
    R: Rng,
{
    generate_canvas_with_rng(selected, catalog, params, rng).map(Canvas::into_rgb)
}

/// Generate a normalized terrain map for a selection.
///
/// Deterministic for a given selection order and seed; the same descriptors
/// in a different order land in different places.
pub fn generate<S: AsRef<str>>(
    selected: &[S],
    catalog: &Catalog,
    params: &TerrainParams,
) -> TerrainResult<TerrainImage> {
    info!(
        descriptors = selected.len(),
        width = params.width,
        height = params.height,
        seed = params.seed,
        "generating terrain"
    );
    generate_canvas(selected, catalog, params).map(Canvas::into_rgb)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> &'static Catalog {
        Catalog::builtin()
    }

    /// The first `n` blob centers the default seed produces.
    fn default_draws(n: usize) -> Vec<(usize, usize)> {
        let mut rng = ChaCha8Rng::seed_from_u64(DEFAULT_SEED);
        (0..n)
            .map(|_| {
                let x = rng.gen_range(PLACEMENT_MIN..PLACEMENT_MAX);
                let y = rng.gen_range(PLACEMENT_MIN..PLACEMENT_MAX);
                (x, y)
            })
            .collect()
    }

    #[test]
    fn test_params_default() {
        let params = TerrainParams::default();
        assert_eq!((params.width, params.height, params.seed), (100, 100, 42));
        assert_eq!(params.sigma, 12.0);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_params_validation() {
        let bad = [
            TerrainParams { width: 0, ..Default::default() },
            TerrainParams { sigma: 0.0, ..Default::default() },
            TerrainParams { sigma: f64::INFINITY, ..Default::default() },
            TerrainParams { placement_min: 50, placement_max: 50, ..Default::default() },
            TerrainParams { width: 60, ..Default::default() },
        ];
        for params in bad {
            assert!(matches!(params.validate(), Err(TerrainError::InvalidParams(_))));
        }
    }

    #[test]
    fn test_empty_selection_is_black() {
        let empty: [&str; 0] = [];
        let image = generate(&empty, catalog(), &TerrainParams::default()).unwrap();
        assert_eq!(image.shape(), (100, 100, 3));
        assert!(image.pixels().values().all(|px| *px == [0.0; 3]));
    }

    #[test]
    fn test_values_in_unit_range_and_peaks_at_one() {
        let selected = ["uneasy", "nostalgic", "still", "playful", "meta"];
        let image = generate(&selected, catalog(), &TerrainParams::default()).unwrap();
        assert_eq!(image.shape(), (100, 100, 3));
        for px in image.pixels().values() {
            assert!(px.iter().all(|v| (0.0..=1.0).contains(v)));
        }
        for channel in 0..IMAGE_CHANNELS {
            assert!((image.channel_max(channel) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_untouched_channel_stays_zero() {
        // "intense" has no green component.
        let image = generate(&["intense"], catalog(), &TerrainParams::default()).unwrap();
        assert_eq!(image.channel_max(1), 0.0);
        assert!((image.channel_max(0) - 1.0).abs() < 1e-12);
        assert!((image.channel_max(2) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_deterministic() {
        let selected = ["sublime", "tense", "light"];
        let params = TerrainParams::default();
        let a = generate(&selected, catalog(), &params).unwrap();
        let b = generate(&selected, catalog(), &params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_selection_order_changes_placement() {
        let params = TerrainParams::default();
        let forward = generate(&["uneasy", "nostalgic"], catalog(), &params).unwrap();
        let reverse = generate(&["nostalgic", "uneasy"], catalog(), &params).unwrap();

        let draws = default_draws(2);
        if draws[0] != draws[1] {
            assert_ne!(forward, reverse);
        } else {
            assert_eq!(forward, reverse);
        }
    }

    #[test]
    fn test_blob_centers_follow_draw_order() {
        let params = TerrainParams::default();
        let one = generate_canvas(&["sublime"], catalog(), &params).unwrap();
        let two = generate_canvas(&["sublime", "uneasy"], catalog(), &params).unwrap();

        // Blending is additive, so removing the first blob leaves the second,
        // centered on the second draw.
        let first = one.channel(3);
        let mut second = two.channel(3);
        for (x, y, v) in second.iter_mut() {
            *v -= *first.get(x, y);
        }
        assert!((second.sum() - 1.0).abs() < 1e-9);
        assert_eq!(second.argmax(), Some(default_draws(2)[1]));
    }

    #[test]
    fn test_sublime_scenario() {
        let params = TerrainParams::default();
        let canvas = generate_canvas(&["sublime"], catalog(), &params).unwrap();

        // Raw peaks follow the color weights 0.6 : 0.2 : 0.8.
        let (r, g, b) = (canvas.channel_max(0), canvas.channel_max(1), canvas.channel_max(2));
        assert!(b > 0.0 && b < 0.8);
        assert!((r / b - 0.75).abs() < 1e-12);
        assert!((g / b - 0.25).abs() < 1e-12);

        // The blob sits on the first draw of the seeded stream.
        let center = default_draws(1)[0];
        assert_eq!(canvas.channel(2).argmax(), Some(center));

        // Normalization is per channel, so each channel peaks at 1.0.
        let image = canvas.into_rgb();
        for channel in 0..IMAGE_CHANNELS {
            assert!((image.channel_max(channel) - 1.0).abs() < 1e-12);
        }
        assert_eq!(image, generate(&["sublime"], catalog(), &params).unwrap());
    }

    #[test]
    fn test_single_blob_is_radial() {
        let image = generate(&["sublime"], catalog(), &TerrainParams::default()).unwrap();
        let blue = image.channel(2);
        let (cx, cy) = blue.argmax().unwrap();
        assert_eq!(*blue.get(cx, cy), 1.0);

        let at = |dx: i64, dy: i64| *blue.get((cx as i64 + dx) as usize, (cy as i64 + dy) as usize);

        // Cells at the same distance from the center match, on and off the axes.
        // Mass mirrored back from the nearest canvas edge skews them slightly.
        let rings: [&[(i64, i64)]; 4] = [
            &[(1, 0), (-1, 0), (0, 1), (0, -1)],
            &[(2, 0), (-2, 0), (0, 2), (0, -2)],
            &[(3, 0), (-3, 0), (0, 3), (0, -3)],
            &[(5, 0), (-5, 0), (0, 5), (0, -5), (3, 4), (4, -3), (-3, -4), (-4, 3)],
        ];
        for ring in rings {
            let reference = at(ring[0].0, ring[0].1);
            for &(dx, dy) in ring {
                let v = at(dx, dy);
                assert!((v - reference).abs() < 5e-3, "({dx}, {dy}): {v} vs {reference}");
                assert!(v < 1.0);
            }
        }
        assert!(at(1, 0) > at(2, 0));
        assert!(at(3, 0) > at(3, 4));
    }

    #[test]
    fn test_duplicates_add_independent_blobs() {
        let canvas =
            generate_canvas(&["still", "still", "still"], catalog(), &TerrainParams::default())
                .unwrap();
        // Alpha is 1.0 for every descriptor and the blur preserves mass.
        assert!((canvas.channel(3).sum() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_descriptor_fails_fast() {
        let mut rng = ChaCha8Rng::seed_from_u64(DEFAULT_SEED);
        let err = generate_with_rng(&["uneasy", "gloomy"], catalog(), &TerrainParams::default(), &mut rng)
            .unwrap_err();
        assert!(matches!(err, TerrainError::UnknownDescriptor(ref n) if n == "gloomy"));
        // Nothing was drawn.
        let mut fresh = ChaCha8Rng::seed_from_u64(DEFAULT_SEED);
        assert_eq!(rng.gen::<u64>(), fresh.gen::<u64>());
    }

    #[test]
    fn test_explicit_rng_matches_seeded_call() {
        let params = TerrainParams { seed: 7, ..Default::default() };
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let a = generate_with_rng(&["ominous", "weighty"], catalog(), &params, &mut rng).unwrap();
        let b = generate(&["ominous", "weighty"], catalog(), &params).unwrap();
        assert_eq!(a, b);
    }
}
