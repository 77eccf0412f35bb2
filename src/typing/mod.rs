//! Typing module — turns a text buffer into a timed sequence of synthetic
//! keystrokes.
//!
//! # Overview
//!
//! * [`TypingRequest`] — immutable description of one typing run.
//! * [`emitter::KeyEmitter`] — the abstract keystroke capability ([`emitter::EnigoEmitter`]
//!   in production).
//! * [`engine`] — the blocking, cancellable emission loop.
//! * [`session`] — the controller that owns the one-run-at-a-time invariant
//!   and bridges background-task completion back to the UI.
//!
//! Cancellation is cooperative: [`CancelToken`] is the one piece of state
//! written from multiple threads (UI / hotkey side sets it, the emission task
//! polls it at every sleep slice and character boundary).

pub mod emitter;
pub mod engine;
pub mod session;

pub use emitter::{EmitError, EmitterFactory, KeyEmitter};
pub use session::{SessionCommand, SessionController, SessionEvent};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::format::Language;

// ---------------------------------------------------------------------------
// TypingRequest
// ---------------------------------------------------------------------------

/// Everything one emission run needs, captured at start time.
///
/// Created when a start action fires (button or hotkey) and consumed entirely
/// by a single engine run — never mutated afterwards.
#[derive(Debug, Clone)]
pub struct TypingRequest {
    /// The raw text buffer to replay.
    pub text: String,
    /// Seconds between keystrokes.  Negative input is clamped to zero.
    pub speed_secs: f64,
    /// Formatting profile applied before emission.
    pub language: Language,
    /// Seconds to wait before the first keystroke, so the user can focus the
    /// target window.  Negative input is clamped to zero.
    pub start_delay_secs: f64,
    /// Skip the informational foreground-window lookup.
    pub bypass_focus_check: bool,
}

impl TypingRequest {
    /// Build a request, clamping negative timings to zero.
    pub fn new(
        text: impl Into<String>,
        speed_secs: f64,
        language: Language,
        start_delay_secs: f64,
        bypass_focus_check: bool,
    ) -> Self {
        Self {
            text: text.into(),
            speed_secs: speed_secs.max(0.0),
            language,
            start_delay_secs: start_delay_secs.max(0.0),
            bypass_focus_check,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// How an emission run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every character was emitted.
    Completed,
    /// Stop was requested during the start-delay countdown; nothing was
    /// emitted.
    StoppedBeforeStart,
    /// Stop was requested mid-run; emission halted at a character boundary.
    StoppedDuringTyping,
    /// The keystroke capability failed.  The reason is surfaced to the user.
    Failed(String),
}

impl Outcome {
    /// Human-readable status line forwarded to the UI.
    pub fn message(&self) -> String {
        match self {
            Outcome::Completed => "Typing completed successfully.".into(),
            Outcome::StoppedBeforeStart => {
                "Stopped before typing (stop requested).".into()
            }
            Outcome::StoppedDuringTyping => "Stopped by user during typing.".into(),
            Outcome::Failed(reason) => format!("Typing error: {reason}"),
        }
    }
}

// ---------------------------------------------------------------------------
// CancelToken
// ---------------------------------------------------------------------------

/// Shared, thread-safe stop request.
///
/// Cheap to clone (`Arc` clone).  Set from the UI or hotkey dispatch side,
/// polled by the emission task.  Cleared by the session controller when a run
/// finishes so the next run starts fresh.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// A fresh, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.  Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// True once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Reset for the next run.  Only the session controller calls this.
    pub fn clear(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
