//! Tray hosting for Windows and macOS on a winit event loop.

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use tray_icon::TrayIcon;
use winit::event::{Event, StartCause};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopBuilder, EventLoopProxy};

use super::{build_tray, forward_menu_events, TrayHandle, TrayMenu, TrayUpdate, UpdateSink};
use crate::jiggle::{Command, JiggleConfig};

impl UpdateSink for EventLoopProxy<TrayUpdate> {
    fn send_update(&self, update: TrayUpdate) {
        let _ = self.send_event(update);
    }
}

pub struct UiLoop {
    event_loop: EventLoop<TrayUpdate>,
}

impl UiLoop {
    pub fn new() -> Result<(Self, TrayHandle<EventLoopProxy<TrayUpdate>>)> {
        let event_loop = EventLoopBuilder::<TrayUpdate>::with_user_event()
            .build()
            .context("Failed to create event loop")?;
        let proxy = event_loop.create_proxy();
        Ok((Self { event_loop }, TrayHandle::new(proxy)))
    }

    /// Run the event loop on the calling (main) thread until the controller
    /// closes the surface.
    pub fn run(self, initial: &JiggleConfig, commands: mpsc::Sender<Command>) -> Result<()> {
        let mut tray: Option<(TrayIcon, TrayMenu)> = None;
        let mut failure: Option<anyhow::Error> = None;

        self.event_loop
            .run(|event, target| {
                target.set_control_flow(ControlFlow::Wait);

                match event {
                    // The tray must be created once the platform loop is running.
                    Event::NewEvents(StartCause::Init) => {
                        match create_tray(initial, commands.clone()) {
                            Ok(created) => {
                                info!("Tray ready");
                                tray = Some(created);
                            }
                            Err(e) => {
                                error!("Tray setup failed: {:#}", e);
                                failure = Some(e);
                                target.exit();
                            }
                        }
                    }
                    Event::UserEvent(TrayUpdate::Apply(update)) => {
                        if let Some((_, menu)) = &tray {
                            menu.apply(update);
                        }
                    }
                    Event::UserEvent(TrayUpdate::Exit) => {
                        debug!("Leaving event loop");
                        target.exit();
                    }
                    _ => {}
                }
            })
            .context("Event loop failed")?;

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn create_tray(
    initial: &JiggleConfig,
    commands: mpsc::Sender<Command>,
) -> Result<(TrayIcon, TrayMenu)> {
    let (menu, tray_menu) = TrayMenu::build(initial)?;
    let tray = build_tray(menu)?;
    forward_menu_events(tray_menu.actions(), commands);
    Ok((tray, tray_menu))
}
