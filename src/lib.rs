//! Auto Typer — replays a text buffer as simulated keystrokes into whichever
//! window currently has input focus.
//!
//! # Architecture
//!
//! ```text
//! egui UI (app) ──SessionCommand──▶ SessionController (tokio task)
//!      ▲                                 │ spawn_blocking
//!      │ SessionEvent                    ▼
//!      │                           typing::engine::run ──▶ KeyEmitter (enigo)
//!      │
//!  HotkeyEvent ◀── hotkey listener thread ◀── global-hotkey registration
//! ```
//!
//! The hotkey listener thread and the UI both funnel into the controller's
//! command channel; the controller is the only writer of session state, so no
//! locking is needed beyond the shared cancel flag.

pub mod app;
pub mod config;
pub mod focus;
pub mod format;
pub mod hotkey;
pub mod textio;
pub mod typing;
