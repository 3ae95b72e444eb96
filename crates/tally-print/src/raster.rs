//! # Code Rasterization
//!
//! Text in, square code image out.
//!
//! ## QR Rendering
//! ```text
//!   "5b1e6a0c-..."
//!        │  QrCode::with_error_correction_level
//!        ▼
//!   N×N modules  +  `margin` light modules on every side
//!        │
//!        ▼  nearest-neighbour: pixel p → module p·(N+2m)/width
//!   width×width RGBA, black on white
//! ```

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use qrcode::{EcLevel, QrCode};
use tracing::debug;

use tally_core::layout::{CODE_MARGIN, CODE_SIZE};

use crate::error::{PrintError, PrintResult};

/// Size of a rendered code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Side length in pixels.
    pub width: u32,
    /// Quiet zone in modules.
    pub margin: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            width: CODE_SIZE,
            margin: CODE_MARGIN,
        }
    }
}

/// Turns a text into a scannable raster.
#[async_trait]
pub trait CodeRasterizer: Send + Sync {
    async fn render(&self, text: &str, options: RenderOptions) -> PrintResult<RgbaImage>;
}

const DARK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const LIGHT: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// QR code rasterizer.
#[derive(Debug, Clone, Copy)]
pub struct QrRasterizer {
    level: EcLevel,
}

impl QrRasterizer {
    pub fn new() -> Self {
        Self { level: EcLevel::M }
    }

    pub fn with_level(level: EcLevel) -> Self {
        Self { level }
    }

    /// Renders synchronously.
    pub fn render_sync(&self, text: &str, options: RenderOptions) -> PrintResult<RgbaImage> {
        if options.width == 0 {
            return Err(PrintError::Rasterize("width must be positive".into()));
        }

        let code = QrCode::with_error_correction_level(text.as_bytes(), self.level)?;
        let size = code.width();
        let colors = code.to_colors();

        let margin = options.margin as usize;
        let modules = size + 2 * margin;
        let width = options.width as usize;

        let is_dark = |module_x: usize, module_y: usize| -> bool {
            if module_x < margin || module_y < margin {
                return false;
            }
            let (x, y) = (module_x - margin, module_y - margin);
            x < size && y < size && colors[y * size + x] == qrcode::Color::Dark
        };

        let image = RgbaImage::from_fn(options.width, options.width, |px, py| {
            let module_x = px as usize * modules / width;
            let module_y = py as usize * modules / width;
            if is_dark(module_x, module_y) {
                DARK
            } else {
                LIGHT
            }
        });

        debug!(
            chars = text.len(),
            modules = size,
            width = options.width,
            "Code rasterized"
        );
        Ok(image)
    }
}

impl Default for QrRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CodeRasterizer for QrRasterizer {
    async fn render(&self, text: &str, options: RenderOptions) -> PrintResult<RgbaImage> {
        self.render_sync(text, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODE: &str = "5b1e6a0c-aaaa-4bbb-8ccc-123456789abc";

    #[tokio::test]
    async fn test_default_size_and_quiet_zone() {
        let image = QrRasterizer::new()
            .render(CODE, RenderOptions::default())
            .await
            .unwrap();
        assert_eq!(image.dimensions(), (280, 280));

        // margin module is light, the finder pattern right after it is dark
        assert_eq!(*image.get_pixel(2, 2), LIGHT);
        assert_eq!(*image.get_pixel(15, 15), DARK);
        assert_eq!(*image.get_pixel(277, 277), LIGHT);
    }

    #[test]
    fn test_deterministic() {
        let qr = QrRasterizer::new();
        let a = qr.render_sync(CODE, RenderOptions::default()).unwrap();
        let b = qr.render_sync(CODE, RenderOptions::default()).unwrap();
        assert_eq!(a.as_raw(), b.as_raw());

        let other = qr.render_sync("something else", RenderOptions::default()).unwrap();
        assert_ne!(a.as_raw(), other.as_raw());
    }

    #[test]
    fn test_rejects_oversized_payload() {
        let too_long = "x".repeat(4000);
        let err = QrRasterizer::new()
            .render_sync(&too_long, RenderOptions::default())
            .unwrap_err();
        assert!(matches!(err, PrintError::Rasterize(_)));
    }

    #[test]
    fn test_correction_level_limits_capacity() {
        // fits a version 40 symbol at level L (2953 bytes), not at H (1273)
        let payload = "x".repeat(2000);
        let options = RenderOptions::default();

        assert!(QrRasterizer::with_level(EcLevel::L)
            .render_sync(&payload, options)
            .is_ok());
        let err = QrRasterizer::with_level(EcLevel::H)
            .render_sync(&payload, options)
            .unwrap_err();
        assert!(matches!(err, PrintError::Rasterize(_)));
    }

    #[test]
    fn test_zero_width_rejected() {
        let err = QrRasterizer::new()
            .render_sync(CODE, RenderOptions { width: 0, margin: 1 })
            .unwrap_err();
        assert!(err.is_input_error());
    }
}
