//! Cursor driver backed by the enigo input simulation library.

use enigo::{Coordinate, Enigo, Mouse, Settings};
use tracing::debug;

use super::{CursorDriver, CursorError, Position};

/// Enigo connection created per call so the driver can move between threads.
pub struct EnigoCursor {
    settings: Settings,
}

impl EnigoCursor {
    /// Check that the platform input backend (X11, Win32 or Quartz) is
    /// reachable before handing out a driver.
    pub fn new() -> Result<Self, CursorError> {
        let cursor = Self {
            settings: Settings::default(),
        };
        cursor.connect()?;
        debug!("Input simulation backend connected");
        Ok(cursor)
    }

    fn connect(&self) -> Result<Enigo, CursorError> {
        Enigo::new(&self.settings).map_err(|e| CursorError::Unavailable(e.to_string()))
    }
}

impl CursorDriver for EnigoCursor {
    fn position(&self) -> Result<Position, CursorError> {
        let (x, y) = self
            .connect()?
            .location()
            .map_err(|e| CursorError::Query(e.to_string()))?;
        Ok(Position::new(x, y))
    }

    fn move_to(&mut self, pos: Position) -> Result<(), CursorError> {
        self.connect()?
            .move_mouse(pos.x, pos.y, Coordinate::Abs)
            .map_err(|e| CursorError::Move(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send<T: Send>() {}

    #[test]
    fn test_driver_is_send() {
        assert_send::<EnigoCursor>();
        assert_send::<Box<dyn CursorDriver>>();
    }
}
