//! # tally-print: Printable Code Sheets
//!
//! Composes one 1080×1080 PNG from either a single code (reprint) or a
//! batch of nine codes (3×3 grid with captions).
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   codes ──▶ tally_core::layout::plan_layout ──▶ LayoutPlan              │
//! │                                                    │                    │
//! │                                                    ▼                    │
//! │                                          LayoutCompositor               │
//! │                                          ├── Canvas (fills, text)       │
//! │                                          └── CodeRasterizer (QR)        │
//! │                                                    │                    │
//! │                                                    ▼                    │
//! │                                            ComposedImage (PNG)          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use std::sync::Arc;
//! use tally_print::{LayoutCompositor, QrRasterizer};
//!
//! let compositor = LayoutCompositor::new(Arc::new(QrRasterizer::new()));
//! let sheet = compositor.compose(&tally_core::minter::mint_batch()).await?;
//! sheet.write_to_dir(std::path::Path::new("."))?;
//! ```

pub mod canvas;
pub mod compositor;
pub mod error;
pub mod raster;

pub use canvas::Canvas;
pub use compositor::{ComposedImage, LayoutCompositor};
pub use error::{PrintError, PrintResult};
pub use raster::{CodeRasterizer, QrRasterizer, RenderOptions};
