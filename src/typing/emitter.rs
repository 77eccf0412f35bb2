//! Keystroke emission backed by the `enigo` crate.
//!
//! [`KeyEmitter`] is the abstract capability the engine types through; it is
//! object-safe so the engine can be driven by a recording stub in tests.
//! [`EnigoEmitter`] is the production implementation.
//!
//! `Enigo` is not `Send`, so an emitter cannot be created on one thread and
//! moved into the blocking emission task.  The session controller therefore
//! holds an [`EmitterFactory`] and constructs the emitter inside the task.

use std::sync::Arc;

use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use thiserror::Error;

// ---------------------------------------------------------------------------
// EmitError
// ---------------------------------------------------------------------------

/// All errors that can surface while sending synthetic keystrokes.
#[derive(Debug, Error)]
pub enum EmitError {
    /// The OS input backend could not be initialised (e.g. missing
    /// accessibility permission on macOS, no display on Linux).
    #[error("cannot initialise keyboard backend: {0}")]
    Backend(String),

    /// A single key event failed to be delivered.
    #[error("cannot send key event: {0}")]
    KeyEvent(String),
}

// ---------------------------------------------------------------------------
// KeyEmitter
// ---------------------------------------------------------------------------

/// The keystroke capability consumed by the emission engine.
///
/// Deliberately not `Send`: the production backend is thread-bound, so the
/// engine constructs its emitter inside the blocking task via
/// [`EmitterFactory`] and never moves it.
pub trait KeyEmitter {
    /// Emit a single literal character.
    fn emit_char(&mut self, ch: char) -> Result<(), EmitError>;

    /// Press the Tab key.
    fn press_tab(&mut self) -> Result<(), EmitError>;

    /// Press the Enter key.
    fn press_enter(&mut self) -> Result<(), EmitError>;
}

/// Constructor for a [`KeyEmitter`], invoked inside the blocking emission
/// task so non-`Send` backends work.
pub type EmitterFactory =
    Arc<dyn Fn() -> Result<Box<dyn KeyEmitter>, EmitError> + Send + Sync>;

/// The default factory: one fresh [`EnigoEmitter`] per typing run.
pub fn enigo_factory() -> EmitterFactory {
    Arc::new(|| Ok(Box::new(EnigoEmitter::new()?)))
}

// ---------------------------------------------------------------------------
// EnigoEmitter
// ---------------------------------------------------------------------------

/// Production emitter wrapping an [`Enigo`] handle.
pub struct EnigoEmitter {
    enigo: Enigo,
}

impl EnigoEmitter {
    /// Initialise the OS input backend.
    pub fn new() -> Result<Self, EmitError> {
        let enigo =
            Enigo::new(&Settings::default()).map_err(|e| EmitError::Backend(e.to_string()))?;
        Ok(Self { enigo })
    }

    fn click(&mut self, key: Key) -> Result<(), EmitError> {
        self.enigo
            .key(key, Direction::Click)
            .map_err(|e| EmitError::KeyEvent(e.to_string()))
    }
}

impl KeyEmitter for EnigoEmitter {
    fn emit_char(&mut self, ch: char) -> Result<(), EmitError> {
        // text() handles Unicode reliably across platforms; single characters
        // go through it rather than per-keycode mapping.
        let mut buf = [0u8; 4];
        self.enigo
            .text(ch.encode_utf8(&mut buf))
            .map_err(|e| EmitError::KeyEvent(e.to_string()))
    }

    fn press_tab(&mut self) -> Result<(), EmitError> {
        self.click(Key::Tab)
    }

    fn press_enter(&mut self) -> Result<(), EmitError> {
        self.click(Key::Return)
    }
}

// ---------------------------------------------------------------------------
// Recording test doubles
// ---------------------------------------------------------------------------

/// One recorded key event, used by the test emitters and assertions.
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPress {
    Char(char),
    Tab,
    Enter,
}

/// Test double that records every emission into a shared log.
#[cfg(test)]
pub struct RecordingEmitter {
    /// Shared log of emitted key events, inspected by tests.
    pub log: Arc<std::sync::Mutex<Vec<KeyPress>>>,
    /// When set, the corresponding [`CancelToken`](crate::typing::CancelToken)
    /// is cancelled after this many emissions — simulates a stop arriving
    /// mid-run at a deterministic point.
    pub cancel_after: Option<(usize, crate::typing::CancelToken)>,
    /// When `Some(n)`, the n-th emission (0-based) fails.
    pub fail_at: Option<usize>,
    count: usize,
}

#[cfg(test)]
impl RecordingEmitter {
    pub fn new(log: Arc<std::sync::Mutex<Vec<KeyPress>>>) -> Self {
        Self {
            log,
            cancel_after: None,
            fail_at: None,
            count: 0,
        }
    }

    fn record(&mut self, press: KeyPress) -> Result<(), EmitError> {
        if self.fail_at == Some(self.count) {
            return Err(EmitError::KeyEvent("synthetic input denied".into()));
        }
        self.log.lock().unwrap().push(press);
        self.count += 1;
        if let Some((after, token)) = &self.cancel_after {
            if self.count >= *after {
                token.cancel();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
impl KeyEmitter for RecordingEmitter {
    fn emit_char(&mut self, ch: char) -> Result<(), EmitError> {
        self.record(KeyPress::Char(ch))
    }

    fn press_tab(&mut self) -> Result<(), EmitError> {
        self.record(KeyPress::Tab)
    }

    fn press_enter(&mut self) -> Result<(), EmitError> {
        self.record(KeyPress::Enter)
    }
}
