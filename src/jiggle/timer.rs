//! The periodic task that drives jiggle pulses.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::controller::jiggle_pulse;
use super::{JiggleInterval, Radius};
use crate::cursor::SharedCursor;

/// Counts timer tasks whose body has not yet been dropped.
struct LiveGuard(Arc<AtomicUsize>);

impl LiveGuard {
    fn enter(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Handle to a running pulse loop bound to one interval.
pub(super) struct TimerTask {
    interval: JiggleInterval,
    stop_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TimerTask {
    /// Start pulsing every `interval`. The first pulse fires one full
    /// interval from now; ticks missed while a pulse runs are skipped.
    pub(super) fn spawn(
        interval: JiggleInterval,
        cursor: SharedCursor,
        radius_rx: watch::Receiver<Radius>,
        live: Arc<AtomicUsize>,
    ) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let period = interval.duration();
        let start = Instant::now() + period;
        let guard = LiveGuard::enter(live);

        let handle = tokio::spawn(async move {
            let _live = guard;
            let mut ticker = time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                // The stop signal is only observed between pulses, so a pulse
                // that has begun always restores the cursor before exit.
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let radius = *radius_rx.borrow();
                        match jiggle_pulse(&cursor, radius).await {
                            Ok(displaced) => debug!("Pulse via ({}, {})", displaced.x, displaced.y),
                            Err(e) => warn!("Jiggle pulse failed: {}", e),
                        }
                    }
                }
            }

            debug!("Jiggle timer ({}) stopped", interval);
        });

        debug!("Jiggle timer ({}) started", interval);

        Self {
            interval,
            stop_tx: Some(stop_tx),
            handle,
        }
    }

    pub(super) fn interval(&self) -> JiggleInterval {
        self.interval
    }

    /// Signal the task to stop and wait until it has exited. A task that
    /// does not finish within `timeout` is aborted.
    pub(super) async fn cancel(mut self, timeout: Duration) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        match time::timeout(timeout, &mut self.handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Jiggle timer task ended abnormally: {}", e),
            Err(_) => {
                warn!(
                    "Jiggle timer did not stop within {:?}, aborting it",
                    timeout
                );
                self.handle.abort();
                // Resolves once the aborted body has been dropped.
                let _ = (&mut self.handle).await;
            }
        }
    }
}

impl Drop for TimerTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::{self, fake::RecordingCursor};

    fn spawn_timer(
        interval: JiggleInterval,
        driver: &RecordingCursor,
        live: &Arc<AtomicUsize>,
    ) -> (TimerTask, watch::Sender<Radius>) {
        let (radius_tx, radius_rx) = watch::channel(Radius::Px5);
        let task = TimerTask::spawn(
            interval,
            cursor::shared(driver.clone()),
            radius_rx,
            live.clone(),
        );
        (task, radius_tx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_pulse_after_one_interval() {
        let driver = RecordingCursor::at(10, 10);
        let live = Arc::new(AtomicUsize::new(0));
        let (task, _radius) = spawn_timer(JiggleInterval::Secs1, &driver, &live);

        time::sleep(Duration::from_millis(950)).await;
        assert!(driver.moves().is_empty());

        time::sleep(Duration::from_millis(200)).await;
        assert_eq!(driver.moves().len(), 2);
        assert_eq!(driver.position_now(), cursor::Position::new(10, 10));

        task.cancel(Duration::from_secs(1)).await;
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_waits_for_in_flight_pulse() {
        let driver = RecordingCursor::at(0, 0);
        let live = Arc::new(AtomicUsize::new(0));
        let (task, _radius) = spawn_timer(JiggleInterval::Secs1, &driver, &live);

        // Mid-hold: cursor is displaced.
        time::sleep(Duration::from_millis(1050)).await;
        assert_eq!(driver.moves().len(), 1);

        task.cancel(Duration::from_secs(1)).await;
        assert_eq!(driver.moves().len(), 2);
        assert_eq!(driver.position_now(), cursor::Position::new(0, 0));
        assert_eq!(live.load(Ordering::SeqCst), 0);

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(driver.moves().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_aborts_after_timeout() {
        let driver = RecordingCursor::at(0, 0);
        let live = Arc::new(AtomicUsize::new(0));
        let (task, _radius) = spawn_timer(JiggleInterval::Secs1, &driver, &live);

        time::sleep(Duration::from_millis(1010)).await;
        assert_eq!(driver.moves().len(), 1);

        let bound = Duration::from_millis(50);
        let started = Instant::now();
        task.cancel(bound).await;

        // Returned at the bound, before the 100ms hold would have ended.
        let elapsed = started.elapsed();
        assert!(elapsed >= bound && elapsed < Duration::from_millis(90));
        assert_eq!(live.load(Ordering::SeqCst), 0);

        // The aborted pulse never ran its restore step.
        time::sleep(Duration::from_secs(3)).await;
        assert_eq!(driver.moves().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_counter_tracks_spawn_and_drop() {
        let driver = RecordingCursor::at(0, 0);
        let live = Arc::new(AtomicUsize::new(0));

        let (task, _radius) = spawn_timer(JiggleInterval::Secs3, &driver, &live);
        assert_eq!(live.load(Ordering::SeqCst), 1);
        assert_eq!(task.interval(), JiggleInterval::Secs3);

        drop(task);
        time::sleep(Duration::from_millis(1)).await;
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }
}
