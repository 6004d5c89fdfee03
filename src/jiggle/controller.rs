//! The jiggle state machine.
//!
//! A [`Controller`] is driven serially by [`Command`]s. It owns the jiggle
//! settings and the single authoritative [`TimerTask`] handle; every change
//! of timer goes through cancel, await, then restart.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::{mpsc, watch};
use tokio::time;
use tracing::{debug, info, warn};

use super::timer::TimerTask;
use super::{JiggleConfig, JiggleInterval, Radius, PULSE_HOLD};
use crate::cursor::{CursorError, Position, SharedCursor};
use crate::tray::{MenuSurface, MenuUpdate};

/// User and OS events understood by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ToggleActive,
    SetRadius(Radius),
    SetInterval(JiggleInterval),
    Quit,
}

/// Whether the event loop should keep going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Controller {
    config: JiggleConfig,
    cursor: SharedCursor,
    surface: Box<dyn MenuSurface>,
    radius_tx: watch::Sender<Radius>,
    timer: Option<TimerTask>,
    live_timers: Arc<AtomicUsize>,
    stop_timeout: Duration,
}

impl Controller {
    /// Create an inactive controller and push its initial state to the menu.
    pub fn new(
        config: JiggleConfig,
        cursor: SharedCursor,
        mut surface: Box<dyn MenuSurface>,
        stop_timeout: Duration,
    ) -> Self {
        let config = JiggleConfig {
            active: false,
            origin: None,
            ..config
        };
        let (radius_tx, _) = watch::channel(config.radius);

        surface.apply(MenuUpdate::Status { active: false });
        surface.apply(MenuUpdate::RadiusSelected(config.radius));
        surface.apply(MenuUpdate::IntervalSelected(config.interval));

        Self {
            config,
            cursor,
            surface,
            radius_tx,
            timer: None,
            live_timers: Arc::new(AtomicUsize::new(0)),
            stop_timeout,
        }
    }

    #[cfg(test)]
    pub fn config(&self) -> &JiggleConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.config.active
    }

    /// Number of timer tasks currently alive.
    pub fn live_timers(&self) -> usize {
        self.live_timers.load(Ordering::SeqCst)
    }

    /// Consume commands until a quit request or until every sender is gone.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        info!("Jiggle controller ready");

        loop {
            match commands.recv().await {
                Some(command) => {
                    if self.dispatch(command).await == Flow::Exit {
                        break;
                    }
                }
                None => {
                    debug!("Command channel closed");
                    self.shutdown().await;
                    break;
                }
            }
        }

        debug!("{} timer task(s) alive at exit", self.live_timers());
        self.surface.close();
    }

    pub async fn dispatch(&mut self, command: Command) -> Flow {
        match command {
            Command::ToggleActive => self.toggle_active().await,
            Command::SetRadius(radius) => self.set_radius(radius),
            Command::SetInterval(interval) => self.set_interval(interval).await,
            Command::Quit => {
                self.shutdown().await;
                return Flow::Exit;
            }
        }
        Flow::Continue
    }

    pub async fn toggle_active(&mut self) {
        if self.config.active {
            self.deactivate().await;
        } else {
            self.activate().await;
        }
    }

    pub fn set_radius(&mut self, radius: Radius) {
        self.config.radius = radius;
        self.radius_tx.send_replace(radius);
        self.surface.apply(MenuUpdate::RadiusSelected(radius));
        info!("Jiggle radius set to {}", radius);
    }

    pub async fn set_interval(&mut self, interval: JiggleInterval) {
        self.config.interval = interval;
        self.surface.apply(MenuUpdate::IntervalSelected(interval));
        info!("Jiggle interval set to {}", interval);

        if self.config.active {
            self.stop_timer().await;
            self.start_timer();
        }
    }

    /// Run a single pulse immediately, outside the timer.
    #[cfg(test)]
    pub async fn pulse(&self) -> Result<Position, CursorError> {
        jiggle_pulse(&self.cursor, self.config.radius).await
    }

    /// Stop jiggling (restoring the cursor) ahead of process exit.
    pub async fn shutdown(&mut self) {
        if self.config.active {
            self.deactivate().await;
        }
        info!("Jiggle controller shut down");
    }

    async fn activate(&mut self) {
        let origin = match self.cursor.lock().await.position() {
            Ok(pos) => Some(pos),
            Err(e) => {
                warn!("Could not capture cursor origin: {}", e);
                None
            }
        };

        self.config.active = true;
        self.config.origin = origin;
        self.start_timer();
        self.surface.apply(MenuUpdate::Status { active: true });

        match origin {
            Some(pos) => info!("Jiggling started at ({}, {})", pos.x, pos.y),
            None => info!("Jiggling started"),
        }
    }

    async fn deactivate(&mut self) {
        self.stop_timer().await;
        self.config.active = false;

        if let Some(origin) = self.config.origin.take() {
            if let Err(e) = self.cursor.lock().await.move_to(origin) {
                warn!("Could not restore cursor origin: {}", e);
            }
        }

        self.surface.apply(MenuUpdate::Status { active: false });
        info!("Jiggling stopped");
    }

    fn start_timer(&mut self) {
        debug_assert!(self.timer.is_none(), "timer already running");
        self.timer = Some(TimerTask::spawn(
            self.config.interval,
            self.cursor.clone(),
            self.radius_tx.subscribe(),
            self.live_timers.clone(),
        ));
    }

    async fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            debug!("Stopping {} timer", timer.interval());
            timer.cancel(self.stop_timeout).await;
        }
    }
}

/// Displace the cursor by a random offset within `radius` on each axis,
/// hold briefly, then put it back. Returns the displaced position.
pub(super) async fn jiggle_pulse(
    cursor: &SharedCursor,
    radius: Radius,
) -> Result<Position, CursorError> {
    let mut driver = cursor.lock().await;
    let home = driver.position()?;
    let (dx, dy) = random_offset(radius);
    let displaced = home.offset(dx, dy);

    driver.move_to(displaced)?;
    time::sleep(PULSE_HOLD).await;
    driver.move_to(home)?;

    Ok(displaced)
}

fn random_offset(radius: Radius) -> (i32, i32) {
    let r = radius.pixels();
    let mut rng = rand::thread_rng();
    (rng.gen_range(-r..=r), rng.gen_range(-r..=r))
}
