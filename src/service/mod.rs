mod loop_worker;

use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use log::info;
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    buffer::SessionBuffer, config::Config, db::Database, detect::Detector, models::Session,
    tracker::ActivityGauge,
};

use loop_worker::{flush_loop, sampling_loop};

/// Cadence of the flush loop. Not configurable; only the sampling cadence
/// comes from configuration.
pub const FLUSH_INTERVAL: Duration = Duration::from_secs(60);

/// Owns the sampling and flush loops and their shutdown ordering. The
/// detector and database are injected; the service holds the only handles
/// to the pending buffer and the current-session snapshot.
pub struct Service {
    check_interval: Duration,
    activity_window: Duration,
    db: Database,
    buffer: Arc<Mutex<SessionBuffer>>,
    snapshot: Arc<Mutex<Option<Session>>>,
    detector: Option<Box<dyn Detector>>,
    sampler: Option<JoinHandle<Box<dyn Detector>>>,
    flusher: Option<JoinHandle<()>>,
    cancel: Option<CancellationToken>,
}

impl Service {
    pub fn new(config: &Config, detector: Box<dyn Detector>, db: Database) -> Self {
        Self {
            check_interval: config.check_interval(),
            activity_window: config.activity_window(),
            db,
            buffer: Arc::new(Mutex::new(SessionBuffer::new())),
            snapshot: Arc::new(Mutex::new(None)),
            detector: Some(detector),
            sampler: None,
            flusher: None,
            cancel: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.cancel.is_some()
    }

    pub async fn start(&mut self) -> Result<()> {
        if self.cancel.is_some() {
            bail!("service is already running");
        }

        let detector = self
            .detector
            .take()
            .ok_or_else(|| anyhow!("detector is no longer available"))?;

        info!("starting service");
        let cancel = CancellationToken::new();

        self.sampler = Some(tokio::spawn(sampling_loop(
            detector,
            ActivityGauge::new(self.activity_window),
            Arc::clone(&self.buffer),
            Arc::clone(&self.snapshot),
            self.check_interval,
            cancel.clone(),
        )));
        self.flusher = Some(tokio::spawn(flush_loop(
            self.db.clone(),
            Arc::clone(&self.buffer),
            FLUSH_INTERVAL,
            cancel.clone(),
        )));
        self.cancel = Some(cancel);

        Ok(())
    }

    /// Signals both loops, waits for the sampling loop to finalize any open
    /// session into the buffer, flushes whatever is pending, then releases
    /// the detector. The final flush result is reported to the caller, but
    /// resource cleanup runs regardless.
    pub async fn stop(&mut self) -> Result<()> {
        let cancel = self
            .cancel
            .take()
            .ok_or_else(|| anyhow!("service is not running"))?;

        info!("stopping service");
        cancel.cancel();

        let sampler = self
            .sampler
            .take()
            .ok_or_else(|| anyhow!("sampling loop handle missing"))?;
        let mut detector = sampler
            .await
            .context("sampling loop task failed to join")?;

        if let Some(flusher) = self.flusher.take() {
            flusher.await.context("flush loop task failed to join")?;
        }

        let batch = self.buffer.lock().await.drain();
        let flush_result = self
            .db
            .flush_batch(batch)
            .await
            .context("final flush failed during shutdown");

        detector.close();
        self.detector = Some(detector);

        info!("service stopped");
        flush_result
    }

    /// Snapshot of the session currently accumulating time, if any.
    pub async fn current_session(&self) -> Option<Session> {
        self.snapshot.lock().await.clone()
    }
}
