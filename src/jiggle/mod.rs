//! Jiggle control: option types, the periodic timer task and the controller
//! state machine that ties them to the cursor driver and the tray menu.

mod controller;
mod timer;

use std::fmt;
use std::time::Duration;

use thiserror::Error;

pub use controller::{Command, Controller, Flow};

/// How long the cursor stays displaced during a single pulse.
pub const PULSE_HOLD: Duration = Duration::from_millis(100);

/// A value outside the selectable option sets.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionError {
    #[error("unsupported jiggle radius {0}px (expected one of 2, 5, 10, 20)")]
    Radius(u32),
    #[error("unsupported jiggle interval {0}s (expected one of 1, 3, 5, 10)")]
    Interval(u64),
}

/// Maximum per-axis displacement of a pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Radius {
    Px2,
    #[default]
    Px5,
    Px10,
    Px20,
}

impl Radius {
    pub const ALL: [Radius; 4] = [Radius::Px2, Radius::Px5, Radius::Px10, Radius::Px20];

    pub fn pixels(self) -> i32 {
        match self {
            Radius::Px2 => 2,
            Radius::Px5 => 5,
            Radius::Px10 => 10,
            Radius::Px20 => 20,
        }
    }

    /// Menu label for this option.
    pub fn label(self) -> String {
        format!("{} pixels", self.pixels())
    }
}

impl TryFrom<u32> for Radius {
    type Error = OptionError;

    fn try_from(px: u32) -> Result<Self, Self::Error> {
        Radius::ALL
            .into_iter()
            .find(|r| r.pixels() as u32 == px)
            .ok_or(OptionError::Radius(px))
    }
}

impl fmt::Display for Radius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}px", self.pixels())
    }
}

/// Time between two pulses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JiggleInterval {
    Secs1,
    #[default]
    Secs3,
    Secs5,
    Secs10,
}

impl JiggleInterval {
    pub const ALL: [JiggleInterval; 4] = [
        JiggleInterval::Secs1,
        JiggleInterval::Secs3,
        JiggleInterval::Secs5,
        JiggleInterval::Secs10,
    ];

    pub fn seconds(self) -> u64 {
        match self {
            JiggleInterval::Secs1 => 1,
            JiggleInterval::Secs3 => 3,
            JiggleInterval::Secs5 => 5,
            JiggleInterval::Secs10 => 10,
        }
    }

    pub fn duration(self) -> Duration {
        Duration::from_secs(self.seconds())
    }

    /// Menu label for this option.
    pub fn label(self) -> String {
        match self.seconds() {
            1 => "1 second".to_string(),
            n => format!("{} seconds", n),
        }
    }
}

impl TryFrom<u64> for JiggleInterval {
    type Error = OptionError;

    fn try_from(secs: u64) -> Result<Self, Self::Error> {
        JiggleInterval::ALL
            .into_iter()
            .find(|i| i.seconds() == secs)
            .ok_or(OptionError::Interval(secs))
    }
}

impl fmt::Display for JiggleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.seconds())
    }
}

/// Mutable jiggle settings, owned by a single [`Controller`].
#[derive(Debug, Clone, Default)]
pub struct JiggleConfig {
    pub active: bool,
    pub radius: Radius,
    pub interval: JiggleInterval,
    /// Cursor position captured at activation. `Some` only while active.
    pub origin: Option<crate::cursor::Position>,
}

impl JiggleConfig {
    pub fn new(radius: Radius, interval: JiggleInterval) -> Self {
        Self {
            active: false,
            radius,
            interval,
            origin: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius_conversion() {
        assert_eq!(Radius::try_from(2), Ok(Radius::Px2));
        assert_eq!(Radius::try_from(20), Ok(Radius::Px20));
        assert_eq!(Radius::try_from(7), Err(OptionError::Radius(7)));
        assert_eq!(Radius::try_from(0), Err(OptionError::Radius(0)));
    }

    #[test]
    fn test_interval_conversion() {
        assert_eq!(JiggleInterval::try_from(1), Ok(JiggleInterval::Secs1));
        assert_eq!(JiggleInterval::try_from(10), Ok(JiggleInterval::Secs10));
        assert_eq!(JiggleInterval::try_from(4), Err(OptionError::Interval(4)));
    }

    #[test]
    fn test_defaults() {
        let config = JiggleConfig::default();
        assert!(!config.active);
        assert_eq!(config.radius.pixels(), 5);
        assert_eq!(config.interval.duration(), Duration::from_secs(3));
        assert!(config.origin.is_none());
    }

    #[test]
    fn test_labels() {
        assert_eq!(Radius::Px10.label(), "10 pixels");
        assert_eq!(JiggleInterval::Secs1.label(), "1 second");
        assert_eq!(JiggleInterval::Secs5.label(), "5 seconds");
    }
}
