//! Cursor driver abstraction: read and set the absolute pointer position.

mod desktop;

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;

pub use desktop::EnigoCursor;

/// Absolute screen position in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Position shifted by the given per-axis offsets.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

#[derive(Debug, Error)]
pub enum CursorError {
    #[error("input simulation unavailable: {0}")]
    Unavailable(String),
    #[error("failed to read cursor position: {0}")]
    Query(String),
    #[error("failed to move cursor: {0}")]
    Move(String),
}

/// OS-level pointer access. Calls are not reentrant; callers serialize
/// through [`SharedCursor`].
pub trait CursorDriver: Send {
    fn position(&self) -> Result<Position, CursorError>;
    fn move_to(&mut self, pos: Position) -> Result<(), CursorError>;
}

pub type SharedCursor = Arc<Mutex<Box<dyn CursorDriver>>>;

pub fn shared(driver: impl CursorDriver + 'static) -> SharedCursor {
    Arc::new(Mutex::new(Box::new(driver)))
}
