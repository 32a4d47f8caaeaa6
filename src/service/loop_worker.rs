use std::{sync::Arc, time::Duration};

use chrono::Utc;
use log::{error, info};
use tokio::{
    sync::Mutex,
    time::{interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    buffer::SessionBuffer,
    db::Database,
    detect::Detector,
    models::Session,
    tracker::{ActivityGauge, Observation, SessionTracker, Verdict},
};

/// Drives the tracker once per tick until cancelled, then force-finalizes
/// the open session into the buffer. Returns the detector so the service
/// can release it after the loop has fully drained.
pub async fn sampling_loop(
    mut detector: Box<dyn Detector>,
    gauge: ActivityGauge,
    buffer: Arc<Mutex<SessionBuffer>>,
    snapshot: Arc<Mutex<Option<Session>>>,
    check_interval: Duration,
    cancel: CancellationToken,
) -> Box<dyn Detector> {
    let mut tracker = SessionTracker::new();
    let mut ticker = interval(check_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match sample(detector.as_mut(), &gauge) {
                    Ok(observation) => {
                        let emitted = tracker.observe(observation, Utc::now());
                        if !emitted.is_empty() {
                            let mut pending = buffer.lock().await;
                            for session in emitted {
                                pending.push(session);
                            }
                        }
                        *snapshot.lock().await = tracker.current().cloned();
                    }
                    Err(err) => {
                        // A failed probe skips the whole tick; the open
                        // session is neither extended nor finalized.
                        error!("probe failed, skipping tick: {err:#}");
                    }
                }
            }
            _ = cancel.cancelled() => break,
        }
    }

    if let Some(finished) = tracker.stop() {
        buffer.lock().await.push(finished);
    }
    *snapshot.lock().await = None;

    info!("sampling loop shut down");
    detector
}

/// Consults the probes in lock, idle, window order. Any probe error aborts
/// the tick before a transition can happen.
fn sample(detector: &mut dyn Detector, gauge: &ActivityGauge) -> anyhow::Result<Observation> {
    if detector.screen_locked()? {
        return Ok(Observation::Locked);
    }

    let idle = detector.idle_duration()?;
    if gauge.assess(idle) == Verdict::Idle {
        return Ok(Observation::Idle);
    }

    let window = detector.active_window()?;
    Ok(Observation::Active {
        app_name: window.app_name,
        window_title: window.window_title,
    })
}

pub async fn flush_loop(
    db: Database,
    buffer: Arc<Mutex<SessionBuffer>>,
    flush_interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = interval(flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                flush_once(&db, &buffer).await;
            }
            _ = cancel.cancelled() => break,
        }
    }

    info!("flush loop shut down");
}

/// One drain-and-persist cycle. A failed write puts the batch back into
/// the buffer so the next cycle retries it instead of dropping the time.
async fn flush_once(db: &Database, buffer: &Arc<Mutex<SessionBuffer>>) {
    let batch = buffer.lock().await.drain();
    if batch.is_empty() {
        return;
    }

    info!("flushing {} pending session(s)", batch.len());
    if let Err(err) = db.flush_batch(batch.clone()).await {
        error!("flush failed, batch retained for next attempt: {err:#}");
        buffer.lock().await.restore(batch);
    }
}
