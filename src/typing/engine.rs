//! The emission engine — a blocking, cancellable, time-paced loop that
//! replays formatted text one keystroke at a time.
//!
//! # Design
//!
//! Each character gets its own sleep rather than one batch sleep at the end.
//! That throttles output for applications that drop fast synthetic input and,
//! more importantly, gives the stop action a cancellation checkpoint on every
//! character and every ≤10 ms sleep slice.  Stop latency is therefore bounded
//! at roughly one slice even when the per-keystroke delay is large.
//!
//! The engine runs on a blocking thread (`tokio::task::spawn_blocking` in
//! production); it owns no shared state beyond the [`CancelToken`] it polls.

use std::time::Duration;

use super::emitter::KeyEmitter;
use super::{CancelToken, Outcome, TypingRequest};
use crate::focus;
use crate::format::format_text;

// ---------------------------------------------------------------------------
// Pacing constants
// ---------------------------------------------------------------------------

/// Upper bound for one slice of the start-delay countdown.
const COUNTDOWN_SLICE: Duration = Duration::from_millis(50);

/// Upper bound for one slice of an inter-keystroke sleep.
const KEYSTROKE_SLICE: Duration = Duration::from_millis(10);

/// Tab presses pause for half the per-character delay.
pub const TAB_DELAY_FACTOR: f64 = 0.5;

/// Line breaks pause for 0.6× the per-character delay.
pub const NEWLINE_DELAY_FACTOR: f64 = 0.6;

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

/// Execute one typing run to completion, cancellation, or failure.
///
/// Steps:
/// 1. Format the text for the requested language.
/// 2. Wait out the start delay in ≤50 ms slices, polling `cancel`.
/// 3. Log the foreground window (informational, unless bypassed).
/// 4. Emit line by line, character by character, sleeping `speed_secs`
///    between characters (half for tabs) and 0.6× between lines, with every
///    sleep split into ≤10 ms cancellable slices.
///
/// Emitter errors are mapped to [`Outcome::Failed`]; this function never
/// panics on account of the keystroke backend.
pub fn run(request: &TypingRequest, emitter: &mut dyn KeyEmitter, cancel: &CancelToken) -> Outcome {
    let text = format_text(&request.text, request.language);

    if !countdown(request.start_delay_secs, cancel) {
        return Outcome::StoppedBeforeStart;
    }

    if !request.bypass_focus_check {
        // Informational only — never gates or aborts the run.
        match focus::foreground_window_title() {
            Some(title) => log::info!("typing into window: {title}"),
            None => log::debug!("foreground window unavailable on this platform"),
        }
    }

    let char_delay = Duration::from_secs_f64(request.speed_secs);
    let tab_delay = char_delay.mul_f64(TAB_DELAY_FACTOR);
    let newline_delay = char_delay.mul_f64(NEWLINE_DELAY_FACTOR);

    let lines: Vec<&str> = text.split('\n').collect();
    for (i, line) in lines.iter().enumerate() {
        if cancel.is_cancelled() {
            return Outcome::StoppedDuringTyping;
        }

        for ch in line.chars() {
            if cancel.is_cancelled() {
                return Outcome::StoppedDuringTyping;
            }

            let (result, delay) = if ch == '\t' {
                (emitter.press_tab(), tab_delay)
            } else {
                (emitter.emit_char(ch), char_delay)
            };

            if let Err(e) = result {
                log::error!("keystroke emission failed: {e}");
                return Outcome::Failed(e.to_string());
            }

            if !sleep_cancellable(delay, KEYSTROKE_SLICE, cancel) {
                return Outcome::StoppedDuringTyping;
            }
        }

        // Line break after every line except the last.
        if i < lines.len() - 1 {
            if let Err(e) = emitter.press_enter() {
                log::error!("keystroke emission failed: {e}");
                return Outcome::Failed(e.to_string());
            }
            if !sleep_cancellable(newline_delay, KEYSTROKE_SLICE, cancel) {
                return Outcome::StoppedDuringTyping;
            }
        }
    }

    Outcome::Completed
}

// ---------------------------------------------------------------------------
// Interruptible sleeps
// ---------------------------------------------------------------------------

/// Wait out the start delay.  Returns `false` if cancelled first.
fn countdown(delay_secs: f64, cancel: &CancelToken) -> bool {
    sleep_cancellable(Duration::from_secs_f64(delay_secs), COUNTDOWN_SLICE, cancel)
}

/// Sleep `total` in slices of at most `slice`, polling `cancel` before each
/// slice.  Returns `false` as soon as cancellation is observed.
fn sleep_cancellable(total: Duration, slice: Duration, cancel: &CancelToken) -> bool {
    let mut remaining = total;
    loop {
        if cancel.is_cancelled() {
            return false;
        }
        if remaining.is_zero() {
            return true;
        }
        let step = remaining.min(slice);
        std::thread::sleep(step);
        remaining -= step;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
