//! Tray hosting for Linux: tray-icon requires a running GTK main loop.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::time::Duration;

use anyhow::{Context, Result};
use gtk::glib;
use tokio::sync::mpsc as tokio_mpsc;
use tracing::{debug, info};

use super::{build_tray, forward_menu_events, TrayHandle, TrayMenu, TrayUpdate};
use crate::jiggle::{Command, JiggleConfig};

/// How often the GTK loop drains controller updates.
const UPDATE_POLL: Duration = Duration::from_millis(50);

pub struct UiLoop {
    updates: Receiver<TrayUpdate>,
}

impl UiLoop {
    pub fn new() -> Result<(Self, TrayHandle<Sender<TrayUpdate>>)> {
        let (tx, updates) = mpsc::channel();
        Ok((Self { updates }, TrayHandle::new(tx)))
    }

    /// Run the GTK main loop on the calling thread until the controller
    /// closes the surface.
    pub fn run(self, initial: &JiggleConfig, commands: tokio_mpsc::Sender<Command>) -> Result<()> {
        gtk::init().context("Failed to initialize GTK")?;

        let (menu, tray_menu) = TrayMenu::build(initial)?;
        let _tray = build_tray(menu)?;
        forward_menu_events(tray_menu.actions(), commands);

        let updates = self.updates;
        glib::timeout_add_local(UPDATE_POLL, move || loop {
            match updates.try_recv() {
                Ok(TrayUpdate::Apply(update)) => tray_menu.apply(update),
                Ok(TrayUpdate::Exit) | Err(TryRecvError::Disconnected) => {
                    debug!("Leaving GTK main loop");
                    gtk::main_quit();
                    return glib::ControlFlow::Break;
                }
                Err(TryRecvError::Empty) => return glib::ControlFlow::Continue,
            }
        });

        info!("Entering GTK main loop");
        gtk::main();
        Ok(())
    }
}
