//! Configuration module.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for typing and
//! hotkeys, `AppPaths` for cross-platform directories, and TOML persistence
//! via `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, HotkeyConfig, TypingConfig, SPEED_PRESETS};
