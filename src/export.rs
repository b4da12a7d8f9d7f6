use std::io::Cursor;
use std::path::Path;

use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};
use tracing::debug;

use crate::error::{TerrainError, TerrainResult};
use crate::terrain::TerrainImage;

/// File name offered for the downloaded map.
pub const DEFAULT_FILE_NAME: &str = "affective_map.png";

/// Largest exported image side, in pixels.
pub const MAX_EXPORT_SIDE: u32 = 16_384;

/// Quantize a normalized channel value to a byte.
pub fn channel_to_u8(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl TerrainImage {
    /// Render to an 8-bit RGB image, one pixel per cell.
    ///
    /// Grid row 0 is the bottom of the picture, so rows are flipped on the way out.
    pub fn to_rgb_image(&self) -> TerrainResult<RgbImage> {
        render_scaled(self, 1)
    }
}

/// Pixel dimensions of a terrain drawn at `scale`, rejecting sizes past
/// `MAX_EXPORT_SIDE`.
pub fn scaled_dimensions(terrain: &TerrainImage, scale: u32) -> TerrainResult<(u32, u32)> {
    let scale = scale.max(1);
    let side = |cells: usize| {
        u32::try_from(cells)
            .ok()
            .and_then(|cells| cells.checked_mul(scale))
            .filter(|&px| px <= MAX_EXPORT_SIDE)
    };
    match (side(terrain.width()), side(terrain.height())) {
        (Some(width), Some(height)) => Ok((width, height)),
        _ => Err(TerrainError::invalid_params(format!(
            "{}x{} map at scale {} exceeds the {} pixel export limit",
            terrain.width(),
            terrain.height(),
            scale,
            MAX_EXPORT_SIDE
        ))),
    }
}

/// Render with each cell drawn as a `scale` x `scale` block.
pub fn render_scaled(terrain: &TerrainImage, scale: u32) -> TerrainResult<RgbImage> {
    let (img_width, img_height) = scaled_dimensions(terrain, scale)?;
    let scale = scale.max(1);
    let height = terrain.height() as u32;
    let mut img: RgbImage = ImageBuffer::new(img_width, img_height);

    for (x, y, px) in terrain.pixels().iter() {
        let color = Rgb(px.map(channel_to_u8));
        let top = (height - 1 - y as u32) * scale;
        let left = x as u32 * scale;
        for dy in 0..scale {
            for dx in 0..scale {
                img.put_pixel(left + dx, top + dy, color);
            }
        }
    }

    Ok(img)
}

/// Encode the terrain map as PNG bytes.
pub fn encode_png(terrain: &TerrainImage, scale: u32) -> TerrainResult<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    render_scaled(terrain, scale)?.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

/// Write the terrain map as a PNG file.
pub fn export_terrain(terrain: &TerrainImage, path: &Path, scale: u32) -> TerrainResult<()> {
    let img = render_scaled(terrain, scale)?;
    debug!(path = %path.display(), width = img.width(), height = img.height(), "writing png");
    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::terrain::{generate, TerrainParams};

    fn sample() -> TerrainImage {
        generate(&["uneasy", "nostalgic"], Catalog::builtin(), &TerrainParams::default()).unwrap()
    }

    #[test]
    fn test_channel_to_u8() {
        assert_eq!(channel_to_u8(0.0), 0);
        assert_eq!(channel_to_u8(1.0), 255);
        assert_eq!(channel_to_u8(0.5), 128);
        assert_eq!(channel_to_u8(1.5), 255);
        assert_eq!(channel_to_u8(-0.1), 0);
    }

    #[test]
    fn test_rows_are_flipped() {
        let terrain = sample();
        let img = terrain.to_rgb_image().unwrap();
        assert_eq!(img.dimensions(), (100, 100));

        for (x, y) in [(0, 0), (37, 12), (99, 99), (50, 80)] {
            let expected = terrain.get(x, y).map(channel_to_u8);
            let pixel = img.get_pixel(x as u32, 99 - y as u32);
            assert_eq!(pixel.0, expected);
        }
    }

    #[test]
    fn test_scaled_render_repeats_cells() {
        let terrain = sample();
        let img = render_scaled(&terrain, 3).unwrap();
        assert_eq!(img.dimensions(), (300, 300));
        let expected = terrain.get(10, 0).map(channel_to_u8);
        for dy in 0..3 {
            for dx in 0..3 {
                assert_eq!(img.get_pixel(30 + dx, 297 + dy).0, expected);
            }
        }
    }

    #[test]
    fn test_encode_png_roundtrip() {
        let terrain = sample();
        let bytes = encode_png(&terrain, 1).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(decoded, terrain.to_rgb_image().unwrap());
    }

    #[test]
    fn test_oversized_scale_is_rejected() {
        let terrain = sample();
        // 100 * 50_000_000 overflows u32.
        for scale in [50_000_000, u32::MAX] {
            let err = render_scaled(&terrain, scale).unwrap_err();
            assert!(matches!(err, TerrainError::InvalidParams(_)));
            assert!(encode_png(&terrain, scale).is_err());
        }
        // Fits in u32 but is past the export limit.
        assert!(render_scaled(&terrain, 200).is_err());
        assert_eq!(scaled_dimensions(&terrain, 163).unwrap(), (16_300, 16_300));

        let path = std::env::temp_dir().join("affective_terrain_oversized.png");
        let _ = std::fs::remove_file(&path);
        assert!(export_terrain(&terrain, &path, 50_000_000).is_err());
        assert!(!path.exists());
    }
}
