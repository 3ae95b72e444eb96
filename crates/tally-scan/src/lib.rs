//! # tally-scan: Scan Session
//!
//! Wraps a camera decode loop so that a run yields at most one decoded
//! code and always gives the camera back.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ScanSession ── start() ──▶ CaptureEngine ──▶ CaptureStream            │
//! │       │                                          │         │            │
//! │       │                          frames (mpsc) ◀─┘         │            │
//! │       │                               │                    │            │
//! │       │                       decode loop task             │            │
//! │       │                               │                    │            │
//! │       │          first Decoded ──▶ latch ──▶ oneshot ──▶ caller         │
//! │       │                                                    │            │
//! │       └── set_zoom / set_torch / stop ──▶ CaptureControl ◀─┘            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Camera access itself lives behind [`CaptureEngine`]; this crate ships no
//! camera driver.

pub mod capture;
pub mod error;
pub mod session;

pub use capture::{
    CapabilityDescriptor, CaptureConstraints, CaptureControl, CaptureEngine, CaptureStream,
    ConstraintPatch, DecodeOutcome, FacingMode, ZoomRange,
};
pub use error::{ScanError, ScanResult};
pub use session::ScanSession;
