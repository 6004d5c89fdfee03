//! System tray surface with platform-specific event loops.

mod icon;
mod menu;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(not(target_os = "linux"))]
mod event_loop;

use anyhow::{anyhow, Result};
use tokio::sync::mpsc;
use tray_icon::menu::{Menu, MenuEvent};
use tray_icon::{TrayIcon, TrayIconBuilder};
use tracing::{debug, info, warn};

use crate::jiggle::{Command, JiggleInterval, Radius};

pub use menu::{MenuActions, TrayMenu};

#[cfg(target_os = "linux")]
pub use linux::UiLoop;
#[cfg(not(target_os = "linux"))]
pub use event_loop::UiLoop;

pub const TOOLTIP: &str = "Mouse Jiggler - Keep your system active";

/// A change the controller asks the menu to display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuUpdate {
    Status { active: bool },
    RadiusSelected(Radius),
    IntervalSelected(JiggleInterval),
}

/// Messages delivered to the UI thread.
#[derive(Debug, Clone, Copy)]
pub enum TrayUpdate {
    Apply(MenuUpdate),
    Exit,
}

/// What the controller can do to the tray.
pub trait MenuSurface: Send {
    fn apply(&mut self, update: MenuUpdate);

    /// Ask the UI to shut down once pending updates are shown.
    fn close(&mut self);
}

/// Delivers updates to whatever thread runs the UI loop.
pub trait UpdateSink: Send {
    fn send_update(&self, update: TrayUpdate);
}

impl UpdateSink for std::sync::mpsc::Sender<TrayUpdate> {
    fn send_update(&self, update: TrayUpdate) {
        let _ = self.send(update);
    }
}

/// Controller-side end of the tray. The UI loop is told to exit when the
/// handle is closed or dropped, whichever comes first.
pub struct TrayHandle<S: UpdateSink> {
    sink: S,
    closed: bool,
}

impl<S: UpdateSink> TrayHandle<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            closed: false,
        }
    }
}

impl<S: UpdateSink> MenuSurface for TrayHandle<S> {
    fn apply(&mut self, update: MenuUpdate) {
        self.sink.send_update(TrayUpdate::Apply(update));
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.sink.send_update(TrayUpdate::Exit);
        }
    }
}

impl<S: UpdateSink> Drop for TrayHandle<S> {
    fn drop(&mut self) {
        if !self.closed {
            warn!("Tray handle dropped without close, stopping UI loop");
            self.close();
        }
    }
}

pub fn status_label(active: bool) -> &'static str {
    if active {
        "Status: Active"
    } else {
        "Status: Inactive"
    }
}

pub fn toggle_label(active: bool) -> &'static str {
    if active {
        "Stop Jiggling"
    } else {
        "Start Jiggling"
    }
}

fn build_tray(menu: Menu) -> Result<TrayIcon> {
    let icon = icon::tray_icon()?;
    let tray = TrayIconBuilder::new()
        .with_tooltip(TOOLTIP)
        .with_icon(icon)
        .with_menu(Box::new(menu))
        .build()
        .map_err(|e| anyhow!("Failed to create tray icon: {}", e))?;

    info!("Tray icon created");
    Ok(tray)
}

/// Route menu clicks to the controller through the dispatch table.
fn forward_menu_events(actions: MenuActions, commands: mpsc::Sender<Command>) {
    MenuEvent::set_event_handler(Some(move |event: MenuEvent| {
        let Some(command) = actions.command_for(&event.id) else {
            debug!("Ignoring click on menu item {:?}", event.id);
            return;
        };
        debug!("Menu command: {:?}", command);
        if let Err(e) = commands.blocking_send(command) {
            warn!("Controller is gone, dropping {:?}", e.0);
        }
    }));
}

#[cfg(test)]
pub mod fake {
    //! Menu surface that records what it was told to show.

    use super::{MenuSurface, MenuUpdate};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    pub struct RecordingSurface {
        updates: Arc<Mutex<Vec<MenuUpdate>>>,
        closed: Arc<Mutex<bool>>,
    }

    impl RecordingSurface {
        pub fn updates(&self) -> Vec<MenuUpdate> {
            self.updates.lock().unwrap().clone()
        }

        pub fn last(&self) -> Option<MenuUpdate> {
            self.updates.lock().unwrap().last().copied()
        }

        pub fn is_closed(&self) -> bool {
            *self.closed.lock().unwrap()
        }
    }

    impl MenuSurface for RecordingSurface {
        fn apply(&mut self, update: MenuUpdate) {
            self.updates.lock().unwrap().push(update);
        }

        fn close(&mut self) {
            *self.closed.lock().unwrap() = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::mpsc as std_mpsc;

    fn drain(rx: &std_mpsc::Receiver<TrayUpdate>) -> Vec<TrayUpdate> {
        rx.try_iter().collect()
    }

    #[test]
    fn test_dropped_handle_stops_ui_loop() {
        let (tx, rx) = std_mpsc::channel();
        let mut handle = TrayHandle::new(tx);
        handle.apply(MenuUpdate::Status { active: true });
        drop(handle);

        let updates = drain(&rx);
        assert_eq!(updates.len(), 2);
        assert!(matches!(
            updates[0],
            TrayUpdate::Apply(MenuUpdate::Status { active: true })
        ));
        assert!(matches!(updates[1], TrayUpdate::Exit));
    }

    #[test]
    fn test_dropped_handle_in_panicking_thread_stops_ui_loop() {
        let (tx, rx) = std_mpsc::channel();
        let worker = std::thread::spawn(move || {
            let _handle = TrayHandle::new(tx);
            panic!("controller failed");
        });
        assert!(worker.join().is_err());

        let updates = drain(&rx);
        assert_eq!(updates.len(), 1);
        assert!(matches!(updates[0], TrayUpdate::Exit));
    }

    #[test]
    fn test_close_then_drop_exits_once() {
        let (tx, rx) = std_mpsc::channel();
        let mut handle = TrayHandle::new(tx);
        handle.close();
        handle.close();
        drop(handle);

        let updates = drain(&rx);
        assert_eq!(updates.len(), 1);
        assert!(matches!(updates[0], TrayUpdate::Exit));
    }

    #[test]
    fn test_labels_follow_state() {
        assert_eq!(status_label(true), "Status: Active");
        assert_eq!(status_label(false), "Status: Inactive");
        assert_eq!(toggle_label(true), "Stop Jiggling");
        assert_eq!(toggle_label(false), "Start Jiggling");
    }
}
