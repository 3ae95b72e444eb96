//! # Layout Compositor
//!
//! Runs a layout plan against a canvas and a rasterizer.
//!
//! ## Draw Queue
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  plan_layout(codes) ──▶ VecDeque<DrawOp>                                │
//! │                                                                         │
//! │  loop pop_front():                                                      │
//! │    Fill  ──────────────▶ canvas.fill_rect                               │
//! │    Text  ──────────────▶ canvas.draw_text                               │
//! │    Code  ── render().await ──▶ canvas.draw_raster                       │
//! │             │                                                           │
//! │             └── Err ──▶ abort, no image                                 │
//! │                                                                         │
//! │  queue empty ──▶ canvas.into_png() ──▶ ComposedImage                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Exactly one render is in flight at any time and cells are drawn in plan
//! order, so the output is a pure function of the code list.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info};

use tally_core::layout::{self, DrawOp, LayoutMode, LayoutPlan};

use crate::canvas::Canvas;
use crate::error::{PrintError, PrintResult};
use crate::raster::{CodeRasterizer, RenderOptions};

/// A finished sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedImage {
    /// PNG bytes.
    pub png: Vec<u8>,
    pub mode: LayoutMode,
    pub width: u32,
    pub height: u32,
    /// Suggested file name (`qr-<caption>.png` or `qr-batch.png`).
    pub file_name: String,
}

impl ComposedImage {
    /// Writes the PNG into `dir` under [`file_name`](Self::file_name).
    pub fn write_to_dir(&self, dir: &Path) -> PrintResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.png)?;
        info!(path = %path.display(), bytes = self.png.len(), "Sheet written");
        Ok(path)
    }
}

/// Composes printable sheets.
#[derive(Clone)]
pub struct LayoutCompositor {
    rasterizer: Arc<dyn CodeRasterizer>,
    options: RenderOptions,
}

impl LayoutCompositor {
    pub fn new(rasterizer: Arc<dyn CodeRasterizer>) -> Self {
        Self {
            rasterizer,
            options: RenderOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Lays out 1 or 9 codes and renders them into one PNG.
    ///
    /// ## Errors
    /// - [`PrintError::Core`] if `codes` has any other length
    /// - [`PrintError::RenderFailed`] if any code fails to render; nothing
    ///   is produced in that case
    pub async fn compose(&self, codes: &[String]) -> PrintResult<ComposedImage> {
        let plan = layout::plan_layout(codes)?;
        let file_name = layout::file_name(codes)?;
        let (mode, width, height) = (plan.mode, plan.width, plan.height);

        let canvas = self.draw_plan(plan, codes).await?;
        let png = canvas.into_png()?;
        info!(%mode, bytes = png.len(), file = %file_name, "Sheet composed");

        Ok(ComposedImage {
            png,
            mode,
            width,
            height,
            file_name,
        })
    }

    /// Runs the plan's draw queue in order, one code render at a time.
    async fn draw_plan(&self, plan: LayoutPlan, codes: &[String]) -> PrintResult<Canvas> {
        let mut canvas = Canvas::new(plan.width, plan.height, plan.background);
        let mut queue: VecDeque<DrawOp> = plan.ops.into();

        debug!(mode = %plan.mode, steps = queue.len(), "Composing sheet");

        while let Some(op) = queue.pop_front() {
            match op {
                DrawOp::Fill { rect, color } => canvas.fill_rect(rect, color),
                DrawOp::Text(span) => canvas.draw_text(&span),
                DrawOp::Code { index, rect } => {
                    let code = codes.get(index).ok_or_else(|| PrintError::RenderFailed {
                        index,
                        code: String::new(),
                        reason: format!("no code at index {index} of {}", codes.len()),
                    })?;
                    let raster = self
                        .rasterizer
                        .render(code, self.options)
                        .await
                        .map_err(|e| {
                            error!(index, %code, error = %e, "Code render failed, sheet abandoned");
                            PrintError::RenderFailed {
                                index,
                                code: code.clone(),
                                reason: e.to_string(),
                            }
                        })?;
                    canvas.draw_raster(rect, &raster);
                    debug!(index, "Cell drawn");
                }
            }
        }

        Ok(canvas)
    }
}
