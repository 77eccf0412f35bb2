//! Application entry point — Auto Typer.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (defaults on first run or a broken file).
//! 3. Create the [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Create channels (`command`, `event`, `hotkey`).
//! 5. Spawn the session controller on the tokio runtime.
//! 6. Build the [`HotkeyRouter`], register the configured combos, and start
//!    the listener thread.
//! 7. Run [`eframe::run_native`] — blocks the main thread until the window
//!    is closed.

use auto_typer::{
    app::AutoTyperApp,
    config::AppConfig,
    hotkey::{HotkeyBinding, HotkeyListener, HotkeyRouter, SystemBackend},
    typing::{emitter::enigo_factory, SessionCommand, SessionController, SessionEvent},
};
use eframe::egui;
use tokio::sync::mpsc;

fn native_options() -> eframe::NativeOptions {
    let vp = egui::ViewportBuilder::default()
        .with_inner_size([640.0, 560.0])
        .with_min_inner_size([520.0, 420.0]);

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Auto Typer starting up");

    // 2. Configuration
    let config = AppConfig::load();

    // 3. Tokio runtime (session controller + one blocking emission task)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    // 4. Channel setup
    let (command_tx, command_rx) = mpsc::channel::<SessionCommand>(16);
    let (event_tx, event_rx) = mpsc::channel::<SessionEvent>(32);
    let (hotkey_tx, hotkey_rx) = mpsc::channel::<auto_typer::hotkey::HotkeyEvent>(16);

    // 5. Session controller
    let controller = SessionController::new(enigo_factory(), event_tx);
    let session = controller.state();
    rt.spawn(controller.run(command_rx));

    // 6. Hotkeys — a failed registration must not stop the app; the UI can
    //    rebind later.
    let mut router = match SystemBackend::new() {
        Ok(backend) => HotkeyRouter::new(Box::new(backend)),
        Err(e) => {
            log::warn!("global hotkeys unavailable: {e}");
            HotkeyRouter::new(Box::new(NullBackend))
        }
    };
    if config.hotkey.enabled {
        let binding = HotkeyBinding::new(&config.hotkey.start, &config.hotkey.stop);
        if let Err(e) = router.register(binding) {
            log::warn!("startup hotkey registration failed: {e}");
        }
    }

    // 7. Build the egui app and run it (blocks until the window is closed).
    //    The listener starts inside the creator so it can wake the frame
    //    loop on every trigger; without that, a hotkey pressed while the
    //    window is unfocused would sit unread until the next user input.
    eframe::run_native(
        "Auto Typer",
        native_options(),
        Box::new(move |cc| {
            let wake = {
                let ctx = cc.egui_ctx.clone();
                move || ctx.request_repaint()
            };
            let listener = HotkeyListener::start(router.actions(), hotkey_tx, wake);
            Ok(Box::new(AutoTyperApp::new(
                config, router, listener, session, command_tx, event_rx, hotkey_rx,
            )))
        }),
    )
}

// ---------------------------------------------------------------------------
// NullBackend — keeps the router functional when the OS facility is missing
// ---------------------------------------------------------------------------

/// Backend that accepts nothing, used when the OS hotkey facility cannot be
/// created (e.g. headless session).  Every registration fails with a clear
/// message; the rest of the app works normally.
struct NullBackend;

impl auto_typer::hotkey::router::HotkeyBackend for NullBackend {
    fn register(
        &mut self,
        combo: &auto_typer::hotkey::HotkeyCombo,
    ) -> Result<u32, auto_typer::hotkey::HotkeyError> {
        Err(auto_typer::hotkey::HotkeyError::Rejected {
            combo: combo.display(),
            reason: "hotkey facility unavailable".into(),
        })
    }

    fn unregister(&mut self, _id: u32) -> Result<(), auto_typer::hotkey::HotkeyError> {
        Ok(())
    }
}
