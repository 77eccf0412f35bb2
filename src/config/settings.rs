//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//!
//! Loading is forgiving: a missing file yields defaults, a malformed file is
//! logged and replaced by defaults, and missing fields in a valid file fall
//! back to their defaults individually (`#[serde(default)]` throughout).

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::format::Language;

// ---------------------------------------------------------------------------
// Speed presets
// ---------------------------------------------------------------------------

/// Named typing-speed presets shown in the UI, as (label, seconds per
/// keystroke).
pub const SPEED_PRESETS: [(&str, f64); 6] = [
    ("Ultra Fast", 0.001),
    ("Very Fast", 0.01),
    ("Fast", 0.03),
    ("Normal", 0.05),
    ("Slow", 0.1),
    ("Very Slow", 0.3),
];

// ---------------------------------------------------------------------------
// TypingConfig
// ---------------------------------------------------------------------------

/// Settings that shape one typing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypingConfig {
    /// Seconds between keystrokes.
    pub speed: f64,
    /// Formatting profile applied before emission.
    pub language: Language,
    /// Seconds to wait before the first keystroke so the user can focus the
    /// target window.
    pub start_delay: f64,
    /// Skip the foreground-window lookup and type wherever focus is.
    pub type_any_window: bool,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            speed: 0.05,
            language: Language::Text,
            start_delay: 3.0,
            type_any_window: true,
        }
    }
}

// ---------------------------------------------------------------------------
// HotkeyConfig
// ---------------------------------------------------------------------------

/// Global hotkey bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyConfig {
    /// Whether global hotkeys are registered at all.
    pub enabled: bool,
    /// Combo that starts typing (e.g. `"ctrl+shift+s"`).
    pub start: String,
    /// Combo that stops typing (e.g. `"ctrl+shift+x"`).
    pub stop: String,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            start: "ctrl+shift+s".into(),
            stop: "ctrl+shift+x".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use auto_typer::config::AppConfig;
///
/// // Load (returns Default when the file is missing or malformed)
/// let config = AppConfig::load();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Typing run settings.
    pub typing: TypingConfig,
    /// Global hotkey bindings.
    pub hotkey: HotkeyConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Never fails: a missing file is the first-run scenario and a malformed
    /// file must not brick the app, so both yield `Default` (the latter with
    /// a warning).
    pub fn load() -> Self {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("cannot read {}: {e}; using defaults", path.display());
                return Self::default();
            }
        };
        match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("malformed config {}: {e}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Verify default values.
    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.typing.speed, 0.05);
        assert_eq!(cfg.typing.language, Language::Text);
        assert_eq!(cfg.typing.start_delay, 3.0);
        assert!(cfg.typing.type_any_window);
        assert!(cfg.hotkey.enabled);
        assert_eq!(cfg.hotkey.start, "ctrl+shift+s");
        assert_eq!(cfg.hotkey.stop, "ctrl+shift+x");
    }

    /// Verify that modified non-default values survive a round trip.
    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.typing.speed = 0.001;
        cfg.typing.language = Language::Python;
        cfg.typing.start_delay = 5.0;
        cfg.typing.type_any_window = false;
        cfg.hotkey.enabled = false;
        cfg.hotkey.start = "alt+f1".into();
        cfg.hotkey.stop = "alt+f2".into();

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path);

        assert_eq!(loaded, cfg);
    }

    /// `load_from` on a non-existent path must return `Default`.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        assert_eq!(AppConfig::load_from(&path), AppConfig::default());
    }

    /// A malformed file must not brick startup.
    #[test]
    fn load_malformed_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "this is { not toml").expect("write");

        assert_eq!(AppConfig::load_from(&path), AppConfig::default());
    }

    /// Missing fields in a partial file fall back to defaults individually.
    #[test]
    fn partial_file_merges_with_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[typing]\nspeed = 0.3\n").expect("write");

        let cfg = AppConfig::load_from(&path);

        assert_eq!(cfg.typing.speed, 0.3);
        assert_eq!(cfg.typing.start_delay, 3.0);
        assert_eq!(cfg.hotkey, HotkeyConfig::default());
    }

    /// An unknown language string is treated as a malformed file.
    #[test]
    fn unknown_language_falls_back_to_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("lang.toml");
        std::fs::write(&path, "[typing]\nlanguage = \"cobol\"\n").expect("write");

        assert_eq!(AppConfig::load_from(&path), AppConfig::default());
    }

    #[test]
    fn speed_presets_are_sorted_fastest_first() {
        for pair in SPEED_PRESETS.windows(2) {
            assert!(pair[0].1 < pair[1].1);
        }
    }
}
