//! Producer capture loop
//!
//! Runs on a dedicated thread because capture devices are generally `!Send`;
//! the device is opened, read and released entirely on this thread. Each
//! iteration reads one raw frame, derives both encoded variants and
//! publishes them to the cache in a single critical section.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use bytes::Bytes;

use crate::capture::{CaptureDevice, DeviceOpener, RawFrame};
use crate::codec::{self, segment, BackgroundModel, CodecError};
use crate::error::Error;

use super::cache::FrameCache;
use super::config::BroadcasterConfig;

/// Slot the background model lives in between producer runs
pub(super) type ModelSlot = Arc<Mutex<Option<BackgroundModel>>>;

/// Control handle to a running producer thread
pub(super) struct ProducerHandle {
    running: Arc<AtomicBool>,
    done_rx: Receiver<()>,
    join: Option<JoinHandle<()>>,
}

impl ProducerHandle {
    /// Signal the loop to exit and wait for it, bounded by `timeout`
    ///
    /// A device read that hangs past the timeout leaves the thread detached;
    /// it will still exit on its own once the read returns.
    pub(super) fn stop(mut self, timeout: Duration) {
        self.running.store(false, Ordering::SeqCst);

        match self.done_rx.recv_timeout(timeout) {
            Ok(()) => {
                if let Some(join) = self.join.take() {
                    let _ = join.join();
                }
                tracing::info!("Producer loop stopped");
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                tracing::warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "Producer did not stop within the join window; detaching"
                );
            }
        }
    }
}

/// Spawn the producer thread and wait for its device-open report
///
/// Returns once the thread has either opened a device (the loop is then
/// live) or exhausted every candidate index.
pub(super) fn spawn(
    config: &BroadcasterConfig,
    opener: Arc<dyn DeviceOpener>,
    cache: Arc<FrameCache>,
    model_slot: ModelSlot,
) -> Result<ProducerHandle, Error> {
    let running = Arc::new(AtomicBool::new(true));
    let (open_tx, open_rx) = mpsc::channel::<Result<u32, Error>>();
    let (done_tx, done_rx) = mpsc::channel::<()>();

    let thread_running = Arc::clone(&running);
    let thread_config = config.clone();
    let join = std::thread::Builder::new()
        .name("camcast-producer".into())
        .spawn(move || {
            run(
                thread_config,
                opener,
                cache,
                model_slot,
                thread_running,
                open_tx,
                done_tx,
            )
        })
        .map_err(Error::Io)?;

    match open_rx.recv() {
        Ok(Ok(index)) => {
            tracing::info!(index = index, "Producer loop started");
            Ok(ProducerHandle {
                running,
                done_rx,
                join: Some(join),
            })
        }
        Ok(Err(e)) => {
            let _ = join.join();
            Err(e)
        }
        Err(_) => {
            let _ = join.join();
            Err(Error::DeviceUnavailable {
                tried: config.device_indices.clone(),
            })
        }
    }
}

fn run(
    config: BroadcasterConfig,
    opener: Arc<dyn DeviceOpener>,
    cache: Arc<FrameCache>,
    model_slot: ModelSlot,
    running: Arc<AtomicBool>,
    open_tx: mpsc::Sender<Result<u32, Error>>,
    done_tx: mpsc::Sender<()>,
) {
    let mut device: Option<Box<dyn CaptureDevice>> = None;
    for &index in &config.device_indices {
        match opener.open(index) {
            Ok(d) => {
                device = Some(d);
                let _ = open_tx.send(Ok(index));
                break;
            }
            Err(e) => {
                tracing::warn!(index = index, error = %e, "Device open failed");
            }
        }
    }
    let Some(mut device) = device else {
        let _ = open_tx.send(Err(Error::DeviceUnavailable {
            tried: config.device_indices.clone(),
        }));
        return;
    };

    // Adopt the persistent background model, or start fresh on first run.
    let mut model = model_slot
        .lock()
        .unwrap()
        .take()
        .unwrap_or_else(|| BackgroundModel::new(config.mog2_history, config.mog2_var_threshold));

    let interval = config.frame_interval();
    while running.load(Ordering::SeqCst) {
        let tick_start = Instant::now();

        match device.read_frame() {
            Ok(frame) => {
                match derive_pair(&frame, &mut model, &config) {
                    Ok((real, virt)) => {
                        cache.publish(real, virt);
                    }
                    Err(e) => {
                        // Cache keeps the previous pair; this frame is skipped.
                        tracing::warn!(error = %e, "Frame encode failed");
                    }
                }

                let elapsed = tick_start.elapsed();
                if elapsed < interval {
                    std::thread::sleep(interval - elapsed);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Frame read failed; publishing placeholder");
                let placeholder = codec::placeholder_jpeg();
                cache.publish(placeholder.clone(), placeholder);
                std::thread::sleep(config.read_backoff);
            }
        }
    }

    *model_slot.lock().unwrap() = Some(model);
    drop(device); // releases the capture device
    let _ = done_tx.send(());
}

/// Derive both encoded variants from one raw frame
fn derive_pair(
    frame: &RawFrame,
    model: &mut BackgroundModel,
    config: &BroadcasterConfig,
) -> Result<(Bytes, Bytes), CodecError> {
    let real = codec::encode_rgb(frame)?;

    let mut mask = model.apply(frame, config.learning_rate);
    segment::binarize(&mut mask, config.mask_threshold);
    let cleaned = segment::morph_open(&mask, frame.width, frame.height, config.morph_kernel_size);
    let virt = codec::encode_gray(frame.width, frame.height, &cleaned)?;

    Ok((real, virt))
}
