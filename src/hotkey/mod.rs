//! Global hotkey support: combo parsing, OS registration, event delivery.
//!
//! # Design
//!
//! A hotkey string like `ctrl+shift+s` is parsed into a [`HotkeyCombo`]
//! (lowercased modifier tokens plus one key token).  [`HotkeyRouter`] turns a
//! start/stop [`HotkeyBinding`] into a live OS registration through the
//! `global-hotkey` crate, and [`HotkeyListener`] runs a dedicated OS thread
//! that forwards triggered combos as [`HotkeyEvent`]s over a
//! `tokio::sync::mpsc` channel.  The listener thread never touches UI or
//! session state directly.
//!
//! Parsing is deliberately permissive about modifier names: `ctrl` and
//! `control` normalise to `ctrl`, while unrecognised modifier tokens are kept
//! verbatim so a combo written for another platform still round-trips through
//! config and display.  Such tokens only fail later, at registration time,
//! with an actionable message.
//!
//! # Usage
//!
//! ```no_run
//! use tokio::sync::mpsc;
//! use auto_typer::hotkey::{HotkeyBinding, HotkeyListener, HotkeyRouter, SystemBackend};
//!
//! let (tx, mut rx) = mpsc::channel(16);
//! let mut router = HotkeyRouter::new(Box::new(SystemBackend::new().unwrap()));
//! router.register(HotkeyBinding::new("ctrl+shift+s", "ctrl+shift+x")).unwrap();
//! let _listener = HotkeyListener::start(router.actions(), tx, || {});
//!
//! // In your async loop:
//! // while let Some(ev) = rx.recv().await { ... }
//! ```

pub mod router;

pub use router::{HotkeyListener, HotkeyRouter, SystemBackend};

use global_hotkey::hotkey::{Code, HotKey, Modifiers};
use thiserror::Error;

// ---------------------------------------------------------------------------
// HotkeyError
// ---------------------------------------------------------------------------

/// All errors that can surface while parsing or registering hotkeys.
#[derive(Debug, Error)]
pub enum HotkeyError {
    /// The combo string was empty.
    #[error("hotkey is empty")]
    Empty,

    /// The combo ended with `+` or otherwise has no key token.
    #[error("hotkey '{0}' is missing a key after the final '+'")]
    MissingKey(String),

    /// A modifier token has no mapping on this platform.
    #[error("unknown modifier '{0}' (supported: ctrl, alt, shift, super)")]
    UnknownModifier(String),

    /// The key token has no mapping on this platform.
    #[error("unknown key '{0}'")]
    UnknownKey(String),

    /// Start and stop combos resolved to the same hotkey.
    #[error("start and stop hotkeys must be different")]
    DuplicateCombo,

    /// The OS-level hotkey facility could not be created.
    #[error("hotkey facility unavailable: {0}")]
    Backend(String),

    /// The OS refused the registration, typically because the combo is owned
    /// by another application.
    #[error("the system rejected hotkey '{combo}': {reason}")]
    Rejected {
        /// Display form of the offending combo.
        combo: String,
        /// The OS error text.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// HotkeyEvent
// ---------------------------------------------------------------------------

/// Events forwarded by the listener thread when a registered combo fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyEvent {
    /// The start combo was pressed.
    StartTyping,
    /// The stop combo was pressed.
    StopTyping,
}

// ---------------------------------------------------------------------------
// HotkeyCombo
// ---------------------------------------------------------------------------

/// A normalised hotkey: zero or more modifier tokens plus one key token, all
/// lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyCombo {
    /// Modifier tokens in input order (`ctrl`, `alt`, `shift`, or verbatim).
    pub modifiers: Vec<String>,
    /// The terminal key token, never empty.
    pub key: String,
}

impl HotkeyCombo {
    /// Parse a user-entered combo like `ctrl+shift+s`.
    ///
    /// Splits on `+` and trims and lowercases each token.  All tokens except
    /// the last are modifiers (`control` → `ctrl`, unrecognised names kept
    /// verbatim, empty tokens dropped); the last token is the key.  A single
    /// token is a bare key, which is valid.
    ///
    /// # Errors
    ///
    /// [`HotkeyError::Empty`] for blank input; [`HotkeyError::MissingKey`]
    /// when the key token is empty, e.g. a trailing `+`.
    pub fn parse(raw: &str) -> Result<Self, HotkeyError> {
        if raw.trim().is_empty() {
            return Err(HotkeyError::Empty);
        }

        let tokens: Vec<String> = raw.split('+').map(|t| t.trim().to_lowercase()).collect();

        // split returns at least one item, so split_last always succeeds.
        let Some((key, modifier_tokens)) = tokens.split_last() else {
            return Err(HotkeyError::Empty);
        };
        if key.is_empty() {
            return Err(HotkeyError::MissingKey(raw.trim().to_string()));
        }

        let modifiers = modifier_tokens
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| normalize_modifier(t))
            .collect();

        Ok(Self {
            modifiers,
            key: key.clone(),
        })
    }

    /// Human display form: each token capitalised, rejoined with `+`
    /// (`ctrl+shift+s` → `Ctrl+Shift+S`).
    pub fn display(&self) -> String {
        self.modifiers
            .iter()
            .map(|m| capitalize(m))
            .chain(std::iter::once(capitalize(&self.key)))
            .collect::<Vec<_>>()
            .join("+")
    }

    /// Engine form for the `global-hotkey` crate: each modifier mapped to its
    /// flag, the key mapped to a key code.
    ///
    /// # Errors
    ///
    /// [`HotkeyError::UnknownModifier`] / [`HotkeyError::UnknownKey`] when a
    /// token has no platform mapping.  Parsing keeps such tokens; they only
    /// fail here.
    pub fn to_hotkey(&self) -> Result<HotKey, HotkeyError> {
        let mut mods = Modifiers::empty();
        for name in &self.modifiers {
            mods |= modifier_flag(name)?;
        }
        let code = key_code(&self.key)?;
        let mods = if mods.is_empty() { None } else { Some(mods) };
        Ok(HotKey::new(mods, code))
    }
}

// ---------------------------------------------------------------------------
// HotkeyBinding
// ---------------------------------------------------------------------------

/// A start/stop combo pair as configured by the user (raw strings).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyBinding {
    /// Combo that triggers a typing start.
    pub start: String,
    /// Combo that requests a stop.
    pub stop: String,
}

impl HotkeyBinding {
    pub fn new(start: impl Into<String>, stop: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            stop: stop.into(),
        }
    }

    /// Parse both combos and reject pairs that normalise to the same hotkey,
    /// so `ctrl+shift+s` vs `control+shift+S` counts as a duplicate.
    pub fn validate(&self) -> Result<(HotkeyCombo, HotkeyCombo), HotkeyError> {
        let start = HotkeyCombo::parse(&self.start)?;
        let stop = HotkeyCombo::parse(&self.stop)?;
        if start == stop {
            return Err(HotkeyError::DuplicateCombo);
        }
        Ok((start, stop))
    }

    /// Status-line form, e.g. `Start: Ctrl+Shift+S | Stop: Ctrl+Shift+X`.
    pub fn display(&self) -> String {
        let start = HotkeyCombo::parse(&self.start)
            .map(|c| c.display())
            .unwrap_or_else(|_| self.start.clone());
        let stop = HotkeyCombo::parse(&self.stop)
            .map(|c| c.display())
            .unwrap_or_else(|_| self.stop.clone());
        format!("Start: {start} | Stop: {stop}")
    }
}

// ---------------------------------------------------------------------------
// Token mapping
// ---------------------------------------------------------------------------

fn normalize_modifier(token: &str) -> String {
    match token {
        "control" => "ctrl".to_string(),
        other => other.to_string(),
    }
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn modifier_flag(name: &str) -> Result<Modifiers, HotkeyError> {
    match name {
        "ctrl" => Ok(Modifiers::CONTROL),
        "alt" => Ok(Modifiers::ALT),
        "shift" => Ok(Modifiers::SHIFT),
        "super" | "win" | "meta" | "cmd" => Ok(Modifiers::SUPER),
        other => Err(HotkeyError::UnknownModifier(other.to_string())),
    }
}

/// Map a lowercase key token to a `global-hotkey` key code.
fn key_code(key: &str) -> Result<Code, HotkeyError> {
    let code = match key {
        // Letter keys
        "a" => Code::KeyA,
        "b" => Code::KeyB,
        "c" => Code::KeyC,
        "d" => Code::KeyD,
        "e" => Code::KeyE,
        "f" => Code::KeyF,
        "g" => Code::KeyG,
        "h" => Code::KeyH,
        "i" => Code::KeyI,
        "j" => Code::KeyJ,
        "k" => Code::KeyK,
        "l" => Code::KeyL,
        "m" => Code::KeyM,
        "n" => Code::KeyN,
        "o" => Code::KeyO,
        "p" => Code::KeyP,
        "q" => Code::KeyQ,
        "r" => Code::KeyR,
        "s" => Code::KeyS,
        "t" => Code::KeyT,
        "u" => Code::KeyU,
        "v" => Code::KeyV,
        "w" => Code::KeyW,
        "x" => Code::KeyX,
        "y" => Code::KeyY,
        "z" => Code::KeyZ,

        // Digit row
        "0" => Code::Digit0,
        "1" => Code::Digit1,
        "2" => Code::Digit2,
        "3" => Code::Digit3,
        "4" => Code::Digit4,
        "5" => Code::Digit5,
        "6" => Code::Digit6,
        "7" => Code::Digit7,
        "8" => Code::Digit8,
        "9" => Code::Digit9,

        // Function keys
        "f1" => Code::F1,
        "f2" => Code::F2,
        "f3" => Code::F3,
        "f4" => Code::F4,
        "f5" => Code::F5,
        "f6" => Code::F6,
        "f7" => Code::F7,
        "f8" => Code::F8,
        "f9" => Code::F9,
        "f10" => Code::F10,
        "f11" => Code::F11,
        "f12" => Code::F12,

        // Navigation / control
        "space" => Code::Space,
        "enter" | "return" => Code::Enter,
        "tab" => Code::Tab,
        "backspace" => Code::Backspace,
        "delete" | "del" => Code::Delete,
        "escape" | "esc" => Code::Escape,
        "insert" => Code::Insert,
        "home" => Code::Home,
        "end" => Code::End,
        "pageup" => Code::PageUp,
        "pagedown" => Code::PageDown,
        "up" => Code::ArrowUp,
        "down" => Code::ArrowDown,
        "left" => Code::ArrowLeft,
        "right" => Code::ArrowRight,

        other => return Err(HotkeyError::UnknownKey(other.to_string())),
    };
    Ok(code)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- parsing ---

    #[test]
    fn parse_simple_combo() {
        let combo = HotkeyCombo::parse("ctrl+shift+s").unwrap();
        assert_eq!(combo.modifiers, vec!["ctrl", "shift"]);
        assert_eq!(combo.key, "s");
    }

    #[test]
    fn parse_normalizes_case_and_whitespace() {
        let combo = HotkeyCombo::parse(" Ctrl + Shift + S ").unwrap();
        assert_eq!(combo.modifiers, vec!["ctrl", "shift"]);
        assert_eq!(combo.key, "s");
    }

    #[test]
    fn control_aliases_to_ctrl() {
        let a = HotkeyCombo::parse("control+shift+s").unwrap();
        let b = HotkeyCombo::parse("ctrl+shift+s").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn bare_key_is_valid() {
        let combo = HotkeyCombo::parse("f9").unwrap();
        assert!(combo.modifiers.is_empty());
        assert_eq!(combo.key, "f9");
    }

    #[test]
    fn empty_modifier_tokens_are_dropped() {
        let combo = HotkeyCombo::parse("ctrl++s").unwrap();
        assert_eq!(combo.modifiers, vec!["ctrl"]);
        assert_eq!(combo.key, "s");
    }

    #[test]
    fn unknown_modifier_is_preserved_verbatim() {
        let combo = HotkeyCombo::parse("hyper+k").unwrap();
        assert_eq!(combo.modifiers, vec!["hyper"]);
        // ...but cannot be turned into an engine hotkey.
        assert!(matches!(
            combo.to_hotkey(),
            Err(HotkeyError::UnknownModifier(m)) if m == "hyper"
        ));
    }

    #[test]
    fn empty_input_fails() {
        assert!(matches!(HotkeyCombo::parse(""), Err(HotkeyError::Empty)));
        assert!(matches!(HotkeyCombo::parse("   "), Err(HotkeyError::Empty)));
    }

    #[test]
    fn missing_key_fails() {
        assert!(matches!(
            HotkeyCombo::parse("+"),
            Err(HotkeyError::MissingKey(_))
        ));
        assert!(matches!(
            HotkeyCombo::parse("ctrl+"),
            Err(HotkeyError::MissingKey(_))
        ));
    }

    // ---- display ---

    #[test]
    fn display_capitalizes_and_rejoins() {
        let combo = HotkeyCombo::parse("ctrl+shift+s").unwrap();
        assert_eq!(combo.display(), "Ctrl+Shift+S");
    }

    #[test]
    fn parse_display_round_trip_preserves_meaning() {
        for raw in ["ctrl+shift+s", "alt+f1", "shift+alt+q", "CTRL+ALT+T"] {
            let combo = HotkeyCombo::parse(raw).unwrap();
            let reparsed = HotkeyCombo::parse(&combo.display()).unwrap();
            assert_eq!(combo, reparsed);
        }
    }

    // ---- engine form ---

    #[test]
    fn to_hotkey_maps_aliases_to_the_same_registration() {
        let a = HotkeyCombo::parse("ctrl+shift+s")
            .unwrap()
            .to_hotkey()
            .unwrap();
        let b = HotkeyCombo::parse("control+shift+S")
            .unwrap()
            .to_hotkey()
            .unwrap();
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn to_hotkey_rejects_unknown_key() {
        let combo = HotkeyCombo::parse("ctrl+noskey").unwrap();
        assert!(matches!(
            combo.to_hotkey(),
            Err(HotkeyError::UnknownKey(k)) if k == "noskey"
        ));
    }

    #[test]
    fn bare_key_has_no_modifier_flags() {
        let hotkey = HotkeyCombo::parse("f9").unwrap().to_hotkey().unwrap();
        let expected = HotKey::new(None, Code::F9);
        assert_eq!(hotkey.id(), expected.id());
    }

    // ---- binding ---

    #[test]
    fn binding_validates_distinct_combos() {
        let binding = HotkeyBinding::new("ctrl+shift+s", "ctrl+shift+x");
        assert!(binding.validate().is_ok());
    }

    #[test]
    fn binding_rejects_equal_combos() {
        let binding = HotkeyBinding::new("ctrl+shift+s", "ctrl+shift+s");
        assert!(matches!(
            binding.validate(),
            Err(HotkeyError::DuplicateCombo)
        ));
    }

    #[test]
    fn binding_rejects_aliased_equal_combos() {
        let binding = HotkeyBinding::new("ctrl+shift+s", "control+shift+S");
        assert!(matches!(
            binding.validate(),
            Err(HotkeyError::DuplicateCombo)
        ));
    }

    #[test]
    fn binding_display_line() {
        let binding = HotkeyBinding::new("ctrl+shift+s", "ctrl+shift+x");
        assert_eq!(
            binding.display(),
            "Start: Ctrl+Shift+S | Stop: Ctrl+Shift+X"
        );
    }
}
