//! The broadcaster itself
//!
//! `CameraBroadcaster` owns the capture device (through its producer
//! thread), the latest-frame cache and the demand counter. It is an
//! explicitly constructed object: callers create one, share it behind an
//! `Arc` and hand it to the HTTP layer. No globals.

use std::sync::{Arc, Mutex};

use bytes::Bytes;

use crate::capture::DeviceOpener;

use super::cache::FrameCache;
use super::config::BroadcasterConfig;
use super::handle::{SessionHandle, StreamVariant};
use super::producer::{self, ModelSlot, ProducerHandle};

/// Point-in-time broadcaster state, for observability and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcasterStats {
    /// Number of registered sessions
    pub demand: usize,
    /// Whether the producer loop is live
    pub producer_running: bool,
    /// Whether a device was opened for the current demand cycle
    pub device_available: bool,
}

/// Demand counter plus producer lifecycle
///
/// These change together: the counter transition decides whether the
/// producer starts or stops, so they live under one lock.
struct ControlState {
    demand: usize,
    producer: Option<ProducerHandle>,
    device_available: bool,
}

/// Shared camera broadcaster
///
/// Capture runs only while demand is positive: the first registration opens
/// the device and starts the producer loop, the last release stops it and
/// lets the device go. Every registered session reads the same cache, so
/// consumer count never affects capture rate.
pub struct CameraBroadcaster {
    config: BroadcasterConfig,
    opener: Arc<dyn DeviceOpener>,
    cache: Arc<FrameCache>,
    model_slot: ModelSlot,
    control: Mutex<ControlState>,
}

impl CameraBroadcaster {
    /// Create a broadcaster over the given device opener
    pub fn new(config: BroadcasterConfig, opener: Arc<dyn DeviceOpener>) -> Self {
        Self {
            config,
            opener,
            cache: Arc::new(FrameCache::new()),
            model_slot: Arc::new(Mutex::new(None)),
            control: Mutex::new(ControlState {
                demand: 0,
                producer: None,
                device_available: false,
            }),
        }
    }

    /// The broadcaster's configuration
    pub fn config(&self) -> &BroadcasterConfig {
        &self.config
    }

    /// Register a consumer for one stream variant
    ///
    /// Increments demand. On the 0→1 transition the candidate device indices
    /// are tried in order and the producer loop is started; concurrent
    /// registrations serialize on the control lock, so the open happens at
    /// most once per transition. If no index opens, the returned handle is
    /// flagged unavailable but demand stays counted and the call still
    /// succeeds — callers degrade to placeholder frames.
    ///
    /// Device opens block, so async callers should wrap this in
    /// `spawn_blocking`.
    pub fn register(self: &Arc<Self>, variant: StreamVariant) -> SessionHandle {
        let mut ctl = self.control.lock().unwrap();
        ctl.demand += 1;

        if ctl.demand == 1 && ctl.producer.is_none() {
            match producer::spawn(
                &self.config,
                Arc::clone(&self.opener),
                Arc::clone(&self.cache),
                Arc::clone(&self.model_slot),
            ) {
                Ok(handle) => {
                    ctl.producer = Some(handle);
                    ctl.device_available = true;
                }
                Err(e) => {
                    ctl.device_available = false;
                    tracing::warn!(error = %e, "No capture device; serving placeholder streams");
                }
            }
        }

        let available = ctl.device_available;
        tracing::info!(
            variant = %variant,
            demand = ctl.demand,
            available = available,
            "Session registered"
        );

        SessionHandle::new(Arc::clone(self), variant, available)
    }

    /// Drop one unit of demand (driven by [`SessionHandle::release`])
    ///
    /// On the 1→0 transition the producer loop is signalled to exit and
    /// joined with a bounded wait; the device is released by the producer
    /// thread on its way out. The counter clamps at zero as a guard against
    /// unbalanced releases.
    pub(super) fn unregister(&self, variant: StreamVariant) {
        let mut ctl = self.control.lock().unwrap();

        if ctl.demand == 0 {
            tracing::warn!(variant = %variant, "Unregister with zero demand ignored");
            return;
        }
        ctl.demand -= 1;

        tracing::info!(variant = %variant, demand = ctl.demand, "Session unregistered");

        if ctl.demand == 0 {
            ctl.device_available = false;
            if let Some(producer) = ctl.producer.take() {
                producer.stop(self.config.stop_join_timeout);
            }
        }
    }

    /// Latest encoded frame for a variant, or `None` before the first
    /// completed producer iteration
    pub fn snapshot(&self, variant: StreamVariant) -> Option<Bytes> {
        self.cache.snapshot(variant)
    }

    /// Current demand and lifecycle state
    pub fn stats(&self) -> BroadcasterStats {
        let ctl = self.control.lock().unwrap();
        BroadcasterStats {
            demand: ctl.demand,
            producer_running: ctl.producer.is_some(),
            device_available: ctl.device_available,
        }
    }
}
