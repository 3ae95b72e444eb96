//! # Capture Engine Interface
//!
//! The camera side of a scan. An engine opens a camera with some
//! [`CaptureConstraints`] and hands back a stream of per-frame decode
//! outcomes plus a control handle.
//!
//! ```text
//!   CaptureEngine::start(constraints)
//!        │
//!        ▼
//!   CaptureStream ─┬─ frames:  mpsc::Receiver<DecodeOutcome>
//!                  └─ control: Arc<dyn CaptureControl>
//!                                 ├── capabilities()
//!                                 ├── apply_constraints(patch)
//!                                 └── stop()
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::ScanResult;

/// Which camera to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Rear camera.
    #[default]
    Environment,
    /// Front camera.
    User,
}

/// Constraints requested when opening the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConstraints {
    pub facing: FacingMode,
    /// Frames per second fed to the decoder.
    pub fps: u32,
    /// Side of the square region the decoder looks at, in pixels.
    pub scan_box: u32,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            facing: FacingMode::Environment,
            fps: 10,
            scan_box: 250,
        }
    }
}

/// Result of decoding one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    Decoded(String),
    /// No code found in the frame (the usual case).
    Failed(String),
}

/// Zoom range reported by the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ZoomRange {
    /// Clamps `value` into `[min, max]`. NaN maps to `min`.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.max(self.min).min(self.max)
    }
}

/// What the open camera can adjust.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CapabilityDescriptor {
    pub zoom: Option<ZoomRange>,
    pub torch: bool,
}

/// A typed constraint change. `None` leaves the setting alone.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConstraintPatch {
    pub zoom: Option<f64>,
    pub torch: Option<bool>,
}

/// Control handle for an open camera.
#[async_trait]
pub trait CaptureControl: Send + Sync {
    async fn capabilities(&self) -> ScanResult<CapabilityDescriptor>;

    async fn apply_constraints(&self, patch: ConstraintPatch) -> ScanResult<()>;

    /// Stops capture and releases the camera.
    async fn stop(&self) -> ScanResult<()>;
}

/// An open camera.
pub struct CaptureStream {
    pub frames: mpsc::Receiver<DecodeOutcome>,
    pub control: Arc<dyn CaptureControl>,
}

/// Opens cameras.
#[async_trait]
pub trait CaptureEngine: Send + Sync {
    /// ## Errors
    /// - `PermissionDenied` / `CaptureUnavailable` when the camera cannot
    ///   be acquired
    async fn start(&self, constraints: CaptureConstraints) -> ScanResult<CaptureStream>;
}
