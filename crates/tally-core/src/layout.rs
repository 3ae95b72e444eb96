//! # Print Layout
//!
//! Pure geometry for the printable sheet: which code goes where, which text
//! is drawn at which baseline. Rendering the plan into pixels is the job of
//! `tally-print`; keeping the numbers here makes them testable without any
//! imaging code.
//!
//! ## Reprint Sheet (1 code)
//! ```text
//! ┌──────────────────────── 1080 ────────────────────────┐
//! │                    REIMPRESION            ← y=50     │
//! │                  ┌────────────┐           ← y=80     │
//! │                  │  280×280   │                      │
//! │                  │    QR      │  x=400               │
//! │                  └────────────┘                      │
//! │                     5b1e6a0c              ← y=395    │
//! │     ──────────────────────────────────    ← y=430    │
//! │           This code already exists        ← y=500    │
//! │       Cut out and stick over the old one  ← y=540    │
//! │                                                      │
//! │     5b1e6a0c-aaaa-4bbb-8ccc-123456789abc  ← y=1030   │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Batch Sheet (9 codes)
//! ```text
//! ┌──────────────────────── 1080 ────────────────────────┐
//! │  gap  ┌─────┐  gap  ┌─────┐  gap  ┌─────┐  gap       │
//! │  60   │ c0  │  60   │ c1  │  60   │ c2  │  60        │   cell = 280 raster
//! │       │label│       │label│       │label│            │        + 30 label
//! │       └─────┘       └─────┘       └─────┘            │
//! │       ┌─────┐       ┌─────┐       ┌─────┐            │   vertical gap =
//! │       │ c3  │       │ c4  │       │ c5  │            │   (1080 - 3·310)/4
//! │       └─────┘       └─────┘       └─────┘            │   = 37.5 → rows at
//! │       ┌─────┐       ┌─────┐       ┌─────┐            │   y = 38, 385, 733
//! │       │ c6  │       │ c7  │       │ c8  │            │
//! │       └─────┘       └─────┘       └─────┘            │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Operations are emitted in drawing order. For the batch sheet that is
//! row-major: c0 top-left through c8 bottom-right.

use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::minter::{caption, BATCH_SIZE};

// =============================================================================
// Constants
// =============================================================================

/// Width and height of the square canvas.
pub const CANVAS_SIZE: u32 = 1080;

/// Side of each rendered code.
pub const CODE_SIZE: u32 = 280;

/// Quiet zone, in modules, requested from the rasterizer.
pub const CODE_MARGIN: u32 = 1;

/// Height of the caption strip under each batch cell.
pub const LABEL_STRIP: u32 = 30;

/// Grid dimension of a batch sheet.
pub const GRID: u32 = 3;

/// Title printed on reprint sheets.
pub const REPRINT_TITLE: &str = "REIMPRESION";

/// Instruction lines printed on reprint sheets.
pub const REPRINT_HINTS: [&str; 2] = [
    "This code already exists",
    "Cut out and stick over the old one",
];

// =============================================================================
// Primitives
// =============================================================================

/// Opaque RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    /// Grey with all three channels equal.
    pub const fn grey(level: u8) -> Self {
        Color::rgb(level, level, level)
    }

    pub const WHITE: Color = Color::grey(0xff);
    pub const BLACK: Color = Color::grey(0x00);
}

/// Palette used by the sheets.
pub mod palette {
    use super::Color;

    pub const TITLE: Color = Color::grey(0x99);
    pub const CAPTION: Color = Color::grey(0x33);
    pub const RULE: Color = Color::grey(0xdd);
    pub const HINT: Color = Color::grey(0xbb);
    pub const FOOTER: Color = Color::grey(0xcc);
    pub const LABEL: Color = Color::grey(0x66);
}

/// Axis-aligned rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn square(x: u32, y: u32, side: u32) -> Self {
        Rect::new(x, y, side, side)
    }

    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// True if the two rectangles share at least one pixel.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// True if `other` lies entirely inside `self`.
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// A line of text horizontally centred on `center_x`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextSpan {
    pub text: String,
    pub center_x: u32,
    pub baseline: u32,
    pub size_px: u32,
    pub color: Color,
    pub bold: bool,
}

impl TextSpan {
    fn centered(text: impl Into<String>, baseline: u32, size_px: u32, color: Color) -> Self {
        TextSpan {
            text: text.into(),
            center_x: CANVAS_SIZE / 2,
            baseline,
            size_px,
            color,
            bold: false,
        }
    }

    fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// One step of the drawing queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DrawOp {
    /// Solid rectangle.
    Fill { rect: Rect, color: Color },
    /// Raster of `codes[index]`, scaled into `rect`.
    Code { index: usize, rect: Rect },
    /// Centred text.
    Text(TextSpan),
}

/// Which sheet a code list produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LayoutMode {
    /// One code, printed again to replace a damaged label.
    Reprint,
    /// Nine fresh codes in a 3×3 grid.
    Batch,
}

impl LayoutMode {
    /// Selects the mode from the number of codes.
    pub fn for_len(len: usize) -> CoreResult<Self> {
        match len {
            1 => Ok(LayoutMode::Reprint),
            BATCH_SIZE => Ok(LayoutMode::Batch),
            _ => Err(CoreError::InvalidBatchSize { len }),
        }
    }
}

impl std::fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutMode::Reprint => write!(f, "reprint"),
            LayoutMode::Batch => write!(f, "batch"),
        }
    }
}

/// Complete, ordered drawing plan for one sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutPlan {
    pub mode: LayoutMode,
    pub width: u32,
    pub height: u32,
    pub background: Color,
    pub ops: Vec<DrawOp>,
}

impl LayoutPlan {
    /// Code regions in drawing order.
    pub fn code_regions(&self) -> Vec<(usize, Rect)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Code { index, rect } => Some((*index, *rect)),
                _ => None,
            })
            .collect()
    }

    /// Text spans in drawing order.
    pub fn texts(&self) -> Vec<&TextSpan> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text(span) => Some(span),
                _ => None,
            })
            .collect()
    }

    /// Canvas bounds.
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }
}

// =============================================================================
// Planning
// =============================================================================

/// Builds the drawing plan for 1 or 9 codes.
///
/// ## Errors
/// [`CoreError::InvalidBatchSize`] for any other length.
pub fn plan_layout<S: AsRef<str>>(codes: &[S]) -> CoreResult<LayoutPlan> {
    let mode = LayoutMode::for_len(codes.len())?;
    let ops = match mode {
        LayoutMode::Reprint => reprint_ops(codes[0].as_ref()),
        LayoutMode::Batch => batch_ops(codes),
    };

    Ok(LayoutPlan {
        mode,
        width: CANVAS_SIZE,
        height: CANVAS_SIZE,
        background: Color::WHITE,
        ops,
    })
}

fn reprint_ops(code: &str) -> Vec<DrawOp> {
    let code_top = 80;
    let code_rect = Rect::square((CANVAS_SIZE - CODE_SIZE) / 2, code_top, CODE_SIZE);
    let rule_y = 430;

    vec![
        DrawOp::Text(TextSpan::centered(REPRINT_TITLE, 50, 32, palette::TITLE).bold()),
        DrawOp::Code {
            index: 0,
            rect: code_rect,
        },
        DrawOp::Text(TextSpan::centered(
            caption(code),
            code_rect.bottom() + 35,
            24,
            palette::CAPTION,
        )),
        DrawOp::Fill {
            rect: Rect::new(100, rule_y - 1, CANVAS_SIZE - 200, 2),
            color: palette::RULE,
        },
        DrawOp::Text(TextSpan::centered(REPRINT_HINTS[0], 500, 28, palette::HINT)),
        DrawOp::Text(TextSpan::centered(REPRINT_HINTS[1], 540, 28, palette::HINT)),
        DrawOp::Text(TextSpan::centered(code, 1030, 18, palette::FOOTER)),
    ]
}

/// Horizontal and vertical gaps of the batch grid, before rounding.
pub fn batch_gaps() -> (f64, f64) {
    let cells = GRID as f64;
    let h_gap = (CANVAS_SIZE as f64 - cells * CODE_SIZE as f64) / (cells + 1.0);
    let v_gap = (CANVAS_SIZE as f64 - cells * (CODE_SIZE + LABEL_STRIP) as f64) / (cells + 1.0);
    (h_gap, v_gap)
}

/// Top-left corner of batch cell `index` (row-major), rounded to pixels.
pub fn batch_cell_origin(index: usize) -> (u32, u32) {
    let (h_gap, v_gap) = batch_gaps();
    let col = (index as u32 % GRID) as f64;
    let row = (index as u32 / GRID) as f64;
    let x = h_gap * (col + 1.0) + col * CODE_SIZE as f64;
    let y = v_gap * (row + 1.0) + row * (CODE_SIZE + LABEL_STRIP) as f64;
    (x.round() as u32, y.round() as u32)
}

fn batch_ops<S: AsRef<str>>(codes: &[S]) -> Vec<DrawOp> {
    let mut ops = Vec::with_capacity(codes.len() * 2);
    for (index, code) in codes.iter().enumerate() {
        let (x, y) = batch_cell_origin(index);
        let rect = Rect::square(x, y, CODE_SIZE);
        ops.push(DrawOp::Code { index, rect });
        ops.push(DrawOp::Text(TextSpan {
            text: caption(code.as_ref()).to_string(),
            center_x: x + CODE_SIZE / 2,
            baseline: rect.bottom() + 20,
            size_px: 18,
            color: palette::LABEL,
            bold: false,
        }));
    }
    ops
}

/// Suggested download name for a sheet.
pub fn file_name<S: AsRef<str>>(codes: &[S]) -> CoreResult<String> {
    match LayoutMode::for_len(codes.len())? {
        LayoutMode::Reprint => Ok(format!("qr-{}.png", caption(codes[0].as_ref()))),
        LayoutMode::Batch => Ok("qr-batch.png".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::minter;

    #[test]
    fn test_rejects_other_lengths() {
        for len in [0, 2, 8, 10] {
            let codes = minter::mint(len);
            assert!(matches!(
                plan_layout(&codes),
                Err(CoreError::InvalidBatchSize { .. })
            ));
        }
    }

    #[test]
    fn test_batch_grid_positions() {
        let codes = minter::mint(9);
        let plan = plan_layout(&codes).unwrap();
        assert_eq!(plan.mode, LayoutMode::Batch);
        assert_eq!((plan.width, plan.height), (1080, 1080));

        let regions = plan.code_regions();
        assert_eq!(regions.len(), 9);
        let xs: Vec<u32> = regions.iter().take(3).map(|(_, r)| r.x).collect();
        let ys: Vec<u32> = regions.iter().step_by(3).map(|(_, r)| r.y).collect();
        assert_eq!(xs, vec![60, 400, 740]);
        assert_eq!(ys, vec![38, 385, 733]);

        for (i, (index, rect)) in regions.iter().enumerate() {
            assert_eq!(*index, i, "row-major order");
            assert_eq!((rect.width, rect.height), (280, 280));
            assert!(plan.bounds().contains(rect));
        }
    }

    #[test]
    fn test_batch_regions_do_not_overlap() {
        let plan = plan_layout(&minter::mint(9)).unwrap();
        let regions = plan.code_regions();
        for (i, (_, a)) in regions.iter().enumerate() {
            for (_, b) in regions.iter().skip(i + 1) {
                assert!(!a.intersects(b));
            }
        }
    }

    #[test]
    fn test_batch_labels_show_caption_under_each_cell() {
        let codes = minter::mint(9);
        let plan = plan_layout(&codes).unwrap();
        let labels = plan.texts();
        assert_eq!(labels.len(), 9);
        for ((label, code), (_, rect)) in labels.iter().zip(&codes).zip(plan.code_regions()) {
            assert_eq!(label.text, minter::caption(code));
            assert_eq!(label.center_x, rect.x + 140);
            assert_eq!(label.baseline, rect.bottom() + 20);
            assert!(label.baseline < rect.bottom() + LABEL_STRIP);
        }
    }

    #[test]
    fn test_reprint_layout() {
        let code = "5b1e6a0c-aaaa-4bbb-8ccc-123456789abc".to_string();
        let plan = plan_layout(&[code.clone()]).unwrap();
        assert_eq!(plan.mode, LayoutMode::Reprint);

        assert_eq!(plan.code_regions(), vec![(0, Rect::square(400, 80, 280))]);

        let texts = plan.texts();
        assert_eq!(texts.first().map(|t| t.text.as_str()), Some(REPRINT_TITLE));
        assert!(texts[0].bold);
        assert_eq!(texts[1].text, "5b1e6a0c");
        assert_eq!(texts[1].baseline, 395);
        let footer = texts.last().unwrap();
        assert_eq!(footer.text, code);
        assert_eq!(footer.baseline, 1030);
    }

    #[test]
    fn test_file_names() {
        assert_eq!(file_name(&["abcdef123456"]).unwrap(), "qr-abcdef12.png");
        assert_eq!(file_name(&minter::mint(9)).unwrap(), "qr-batch.png");
        assert!(file_name(&minter::mint(3)).is_err());
    }
}
