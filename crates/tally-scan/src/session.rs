//! # Scan Session
//!
//! One camera, one code. A session is idle until [`ScanSession::start`],
//! runs a decode loop over the engine's frames, and returns to idle on the
//! first decoded code or on [`ScanSession::stop`].
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Idle ── start() ──▶ Starting ── engine.start() ──┬──▶ Active          │
//! │    ▲                                               │      │             │
//! │    │                          Err (permission) ◀───┘      │             │
//! │    │                                                      │             │
//! │    ├──────────── first Decoded(text) ◀── decode loop ◀────┤             │
//! │    │               latch fires once, camera released      │             │
//! │    │                                                      │             │
//! │    └──────────── stop() / drop ◀──────────────────────────┘             │
//! │                    latch disarmed, camera released                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The latch is a compare-exchange flag plus a take-once sender, so a frame
//! that finishes decoding after the first one (or after `stop()`) is
//! dropped. The camera release is guarded the same way and happens at most
//! once per run no matter who gets there first.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::capture::{
    CapabilityDescriptor, CaptureConstraints, CaptureControl, CaptureEngine, ConstraintPatch,
    DecodeOutcome,
};
use crate::error::{ScanError, ScanResult};

// =============================================================================
// Latch
// =============================================================================

/// Lets exactly one decoded text through.
struct DecodeLatch {
    fired: AtomicBool,
    tx: Mutex<Option<oneshot::Sender<String>>>,
}

impl DecodeLatch {
    fn new() -> (Arc<Self>, oneshot::Receiver<String>) {
        let (tx, rx) = oneshot::channel();
        let latch = Arc::new(Self {
            fired: AtomicBool::new(false),
            tx: Mutex::new(Some(tx)),
        });
        (latch, rx)
    }

    /// Delivers `text` if nothing was delivered (or disarmed) before.
    /// Returns true only for the call that won.
    fn fire(&self, text: String) -> bool {
        if self
            .fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        if let Some(tx) = self.take_sender() {
            // the receiver may already be gone; the run still ends
            let _ = tx.send(text);
        }
        true
    }

    /// Closes the latch without delivering anything.
    fn disarm(&self) {
        self.fired.store(true, Ordering::Release);
        drop(self.take_sender());
    }

    fn take_sender(&self) -> Option<oneshot::Sender<String>> {
        self.tx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}

// =============================================================================
// Capture guard
// =============================================================================

/// An acquired camera, released at most once.
struct Capture {
    control: Arc<dyn CaptureControl>,
    released: AtomicBool,
}

impl Capture {
    async fn release(&self) -> ScanResult<()> {
        if self.released.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        debug!("Releasing camera");
        self.control.stop().await
    }
}

// =============================================================================
// Session
// =============================================================================

struct Run {
    id: u64,
    capture: Arc<Capture>,
    latch: Arc<DecodeLatch>,
    capabilities: CapabilityDescriptor,
    decode_loop: Option<JoinHandle<()>>,
}

enum Slot {
    Idle,
    /// Waiting on the camera for the start with this run id.
    Starting(u64),
    Active(Run),
}

struct SessionShared {
    slot: Mutex<Slot>,
    next_run: AtomicU64,
}

impl SessionShared {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Puts the session back to idle and hands back the run, if it is still
    /// the current one.
    fn take_run(&self, id: Option<u64>) -> Option<Run> {
        let mut slot = self.lock();
        let current = match &*slot {
            Slot::Active(run) => id.map_or(true, |id| run.id == id),
            _ => false,
        };
        if !current {
            return None;
        }
        match std::mem::replace(&mut *slot, Slot::Idle) {
            Slot::Active(run) => Some(run),
            _ => None,
        }
    }
}

/// Scans until the first code is decoded.
pub struct ScanSession {
    engine: Arc<dyn CaptureEngine>,
    constraints: CaptureConstraints,
    shared: Arc<SessionShared>,
}

impl ScanSession {
    /// Creates an idle session with the default constraints (rear camera,
    /// 10 fps, 250×250 scan box).
    pub fn new(engine: Arc<dyn CaptureEngine>) -> Self {
        Self::with_constraints(engine, CaptureConstraints::default())
    }

    pub fn with_constraints(engine: Arc<dyn CaptureEngine>, constraints: CaptureConstraints) -> Self {
        Self {
            engine,
            constraints,
            shared: Arc::new(SessionShared {
                slot: Mutex::new(Slot::Idle),
                next_run: AtomicU64::new(1),
            }),
        }
    }

    pub fn constraints(&self) -> CaptureConstraints {
        self.constraints
    }

    pub fn is_active(&self) -> bool {
        matches!(&*self.shared.lock(), Slot::Active(_))
    }

    /// Capabilities of the current run, discovered once at start.
    pub fn capabilities(&self) -> Option<CapabilityDescriptor> {
        match &*self.shared.lock() {
            Slot::Active(run) => Some(run.capabilities),
            _ => None,
        }
    }

    /// Opens the camera and starts decoding.
    ///
    /// The returned receiver yields the first decoded text. It errors if
    /// the run ends without one (stopped, dropped, or the camera went away).
    ///
    /// ## Errors
    /// - [`ScanError::AlreadyActive`] if a run is in progress
    /// - Whatever the engine reports when the camera cannot be acquired;
    ///   the session stays idle and `start()` may be retried
    /// - [`ScanError::NotActive`] if `stop()` was called while starting
    pub async fn start(&self) -> ScanResult<oneshot::Receiver<String>> {
        let id = {
            let mut slot = self.shared.lock();
            if !matches!(&*slot, Slot::Idle) {
                return Err(ScanError::AlreadyActive);
            }
            let id = self.shared.next_run.fetch_add(1, Ordering::Relaxed);
            *slot = Slot::Starting(id);
            id
        };

        let stream = match self.engine.start(self.constraints).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "Camera could not be acquired");
                let mut slot = self.shared.lock();
                if matches!(&*slot, Slot::Starting(ticket) if *ticket == id) {
                    *slot = Slot::Idle;
                }
                return Err(e);
            }
        };

        let capabilities = stream.control.capabilities().await.unwrap_or_else(|e| {
            warn!(error = %e, "Capability discovery failed, assuming none");
            CapabilityDescriptor::default()
        });

        let capture = Arc::new(Capture {
            control: stream.control,
            released: AtomicBool::new(false),
        });
        let (latch, decoded) = DecodeLatch::new();

        // a stop() followed by another start() leaves a different ticket here
        let activated = {
            let mut slot = self.shared.lock();
            if matches!(&*slot, Slot::Starting(ticket) if *ticket == id) {
                let decode_loop = tokio::spawn(decode_loop(
                    self.shared.clone(),
                    id,
                    stream.frames,
                    latch.clone(),
                    capture.clone(),
                ));
                *slot = Slot::Active(Run {
                    id,
                    capture: capture.clone(),
                    latch,
                    capabilities,
                    decode_loop: Some(decode_loop),
                });
                true
            } else {
                false
            }
        };

        if !activated {
            debug!("Stopped while starting, releasing camera");
            capture.release().await?;
            return Err(ScanError::NotActive);
        }

        info!(
            run = id,
            fps = self.constraints.fps,
            zoom = capabilities.zoom.is_some(),
            torch = capabilities.torch,
            "Scan started"
        );
        Ok(decoded)
    }

    /// Stops the current run. Safe to call at any time, any number of times.
    ///
    /// The session is idle when this returns, even if the engine reports an
    /// error while releasing the camera.
    pub async fn stop(&self) -> ScanResult<()> {
        let run = {
            let mut slot = self.shared.lock();
            match std::mem::replace(&mut *slot, Slot::Idle) {
                Slot::Active(run) => run,
                Slot::Starting(id) => {
                    debug!(run = id, "Stop requested while starting");
                    return Ok(());
                }
                Slot::Idle => {
                    trace!("Stop requested with no active scan");
                    return Ok(());
                }
            }
        };

        run.latch.disarm();
        if let Some(task) = &run.decode_loop {
            task.abort();
        }
        info!(run = run.id, "Scan stopped");
        run.capture.release().await
    }

    /// Sets the zoom, clamped into the camera's range. Returns the applied
    /// value.
    pub async fn set_zoom(&self, value: f64) -> ScanResult<f64> {
        let (capture, capabilities) = self.current()?;
        let range = capabilities
            .zoom
            .ok_or(ScanError::Unsupported { capability: "zoom" })?;

        let zoom = range.clamp(value);
        capture
            .control
            .apply_constraints(ConstraintPatch {
                zoom: Some(zoom),
                ..Default::default()
            })
            .await?;
        debug!(requested = value, applied = zoom, "Zoom set");
        Ok(zoom)
    }

    pub async fn set_torch(&self, on: bool) -> ScanResult<()> {
        let (capture, capabilities) = self.current()?;
        if !capabilities.torch {
            return Err(ScanError::Unsupported { capability: "torch" });
        }
        capture
            .control
            .apply_constraints(ConstraintPatch {
                torch: Some(on),
                ..Default::default()
            })
            .await?;
        debug!(on, "Torch set");
        Ok(())
    }

    fn current(&self) -> ScanResult<(Arc<Capture>, CapabilityDescriptor)> {
        match &*self.shared.lock() {
            Slot::Active(run) => Ok((run.capture.clone(), run.capabilities)),
            _ => Err(ScanError::NotActive),
        }
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        let Some(run) = self.shared.take_run(None) else {
            return;
        };
        run.latch.disarm();
        if let Some(task) = &run.decode_loop {
            task.abort();
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let capture = run.capture;
                handle.spawn(async move {
                    if let Err(e) = capture.release().await {
                        warn!(error = %e, "Camera release on drop failed");
                    }
                });
            }
            Err(_) => warn!(run = run.id, "Session dropped outside a runtime, camera not released"),
        }
    }
}

/// Reads frames until the first decode or the end of the stream.
async fn decode_loop(
    shared: Arc<SessionShared>,
    id: u64,
    mut frames: mpsc::Receiver<DecodeOutcome>,
    latch: Arc<DecodeLatch>,
    capture: Arc<Capture>,
) {
    while let Some(outcome) = frames.recv().await {
        match outcome {
            DecodeOutcome::Failed(reason) => trace!(%reason, "No code in frame"),
            DecodeOutcome::Decoded(text) => {
                if latch.fire(text) {
                    info!(run = id, "Code decoded");
                } else {
                    debug!(run = id, "Late decode suppressed");
                }
                break;
            }
        }
    }

    if shared.take_run(Some(id)).is_some() {
        debug!(run = id, "Decode loop finished");
    }
    latch.disarm();
    if let Err(e) = capture.release().await {
        warn!(error = %e, "Camera release failed");
    }
}
