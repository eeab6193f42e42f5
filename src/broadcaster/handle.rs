//! Session handles and stream variants
//!
//! A [`SessionHandle`] is the broadcaster's unit of demand: one live handle
//! equals one counted consumer. Dropping the handle unregisters it exactly
//! once, whatever path tore the session down.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;

use super::core::CameraBroadcaster;

/// One of the two derived output streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamVariant {
    /// Raw encoded camera frames
    Real,
    /// Foreground-mask frames from background subtraction
    Virtual,
}

impl std::fmt::Display for StreamVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamVariant::Real => write!(f, "real"),
            StreamVariant::Virtual => write!(f, "virtual"),
        }
    }
}

/// A registered consumer of one stream variant
///
/// Handles flagged unavailable (no device could be opened) still count
/// toward demand and must still be released; their snapshots are always
/// absent so callers fall back to placeholder frames.
pub struct SessionHandle {
    broadcaster: Arc<CameraBroadcaster>,
    variant: StreamVariant,
    available: bool,
    released: AtomicBool,
}

impl SessionHandle {
    pub(super) fn new(
        broadcaster: Arc<CameraBroadcaster>,
        variant: StreamVariant,
        available: bool,
    ) -> Self {
        Self {
            broadcaster,
            variant,
            available,
            released: AtomicBool::new(false),
        }
    }

    /// The variant this session consumes
    pub fn variant(&self) -> StreamVariant {
        self.variant
    }

    /// Whether a capture device was available when this session registered
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Latest encoded frame for this session's variant
    pub fn snapshot(&self) -> Option<Bytes> {
        if self.available {
            self.broadcaster.snapshot(self.variant)
        } else {
            None
        }
    }

    /// Release this session's demand
    ///
    /// Idempotent: the first call (or the implicit one on drop) decrements
    /// the demand counter; any further call is a no-op.
    ///
    /// On a tokio runtime thread the decrement runs on the blocking pool:
    /// the 1→0 transition joins the producer, which can wait out an
    /// in-flight device read, and that wait must not stall the executor.
    /// Outside a runtime the release is synchronous and the producer is
    /// already joined when this returns.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }

        let broadcaster = Arc::clone(&self.broadcaster);
        let variant = self.variant;
        match tokio::runtime::Handle::try_current() {
            Ok(rt) => {
                rt.spawn_blocking(move || broadcaster.unregister(variant));
            }
            Err(_) => broadcaster.unregister(variant),
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.release();
    }
}
