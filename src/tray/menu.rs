//! Tray menu construction and the click dispatch table.

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use tray_icon::menu::{
    CheckMenuItem, IsMenuItem, Menu, MenuId, MenuItem, PredefinedMenuItem, Submenu,
};

use super::{status_label, toggle_label, MenuUpdate};
use crate::jiggle::{Command, JiggleConfig, JiggleInterval, Radius};

/// Maps menu item ids to controller commands.
#[derive(Debug, Clone, Default)]
pub struct MenuActions {
    commands: HashMap<MenuId, Command>,
}

impl MenuActions {
    pub fn insert(&mut self, id: MenuId, command: Command) {
        self.commands.insert(id, command);
    }

    pub fn command_for(&self, id: &MenuId) -> Option<Command> {
        self.commands.get(id).copied()
    }
}

/// Live handles to the menu items the controller updates.
pub struct TrayMenu {
    status: MenuItem,
    toggle: MenuItem,
    radius: Vec<(Radius, CheckMenuItem)>,
    interval: Vec<(JiggleInterval, CheckMenuItem)>,
    actions: MenuActions,
}

impl TrayMenu {
    /// Build the menu reflecting `initial`. Must run on the UI thread.
    pub fn build(initial: &JiggleConfig) -> Result<(Menu, Self)> {
        let mut actions = MenuActions::default();

        let status = MenuItem::new(status_label(initial.active), false, None);
        let toggle = MenuItem::new(toggle_label(initial.active), true, None);
        actions.insert(toggle.id().clone(), Command::ToggleActive);

        let radius: Vec<_> = Radius::ALL
            .into_iter()
            .map(|r| {
                let item = CheckMenuItem::new(r.label(), true, r == initial.radius, None);
                actions.insert(item.id().clone(), Command::SetRadius(r));
                (r, item)
            })
            .collect();

        let interval: Vec<_> = JiggleInterval::ALL
            .into_iter()
            .map(|i| {
                let item = CheckMenuItem::new(i.label(), true, i == initial.interval, None);
                actions.insert(item.id().clone(), Command::SetInterval(i));
                (i, item)
            })
            .collect();

        let radius_items: Vec<&dyn IsMenuItem> =
            radius.iter().map(|(_, item)| item as &dyn IsMenuItem).collect();
        let radius_menu = Submenu::with_items("Jiggling Radius", true, &radius_items)
            .map_err(|e| anyhow!("Failed to build radius submenu: {}", e))?;

        let interval_items: Vec<&dyn IsMenuItem> =
            interval.iter().map(|(_, item)| item as &dyn IsMenuItem).collect();
        let interval_menu = Submenu::with_items("Jiggling Interval", true, &interval_items)
            .map_err(|e| anyhow!("Failed to build interval submenu: {}", e))?;

        let quit = MenuItem::new("Quit", true, None);
        actions.insert(quit.id().clone(), Command::Quit);

        let menu = Menu::new();
        menu.append_items(&[
            &status,
            &toggle,
            &PredefinedMenuItem::separator(),
            &radius_menu,
            &interval_menu,
            &PredefinedMenuItem::separator(),
            &quit,
        ])
        .map_err(|e| anyhow!("Failed to build tray menu: {}", e))?;

        Ok((
            menu,
            Self {
                status,
                toggle,
                radius,
                interval,
                actions,
            },
        ))
    }

    pub fn actions(&self) -> MenuActions {
        self.actions.clone()
    }

    pub fn apply(&self, update: MenuUpdate) {
        match update {
            MenuUpdate::Status { active } => {
                self.status.set_text(status_label(active));
                self.toggle.set_text(toggle_label(active));
            }
            MenuUpdate::RadiusSelected(selected) => {
                for (r, item) in &self.radius {
                    item.set_checked(*r == selected);
                }
            }
            MenuUpdate::IntervalSelected(selected) => {
                for (i, item) in &self.interval {
                    item.set_checked(*i == selected);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_table_lookup() {
        let mut actions = MenuActions::default();
        actions.insert(MenuId::new("toggle"), Command::ToggleActive);
        actions.insert(MenuId::new("r10"), Command::SetRadius(Radius::Px10));
        actions.insert(
            MenuId::new("i1"),
            Command::SetInterval(JiggleInterval::Secs1),
        );
        actions.insert(MenuId::new("quit"), Command::Quit);

        assert_eq!(
            actions.command_for(&MenuId::new("r10")),
            Some(Command::SetRadius(Radius::Px10))
        );
        assert_eq!(
            actions.command_for(&MenuId::new("quit")),
            Some(Command::Quit)
        );
        assert_eq!(actions.command_for(&MenuId::new("status")), None);
    }
}
