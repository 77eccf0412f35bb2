//! Auto Typer main window — egui/eframe application.
//!
//! # Architecture
//!
//! [`AutoTyperApp`] is the top-level [`eframe::App`].  It owns the text
//! buffer, the editable settings, the [`HotkeyRouter`], and three channel
//! endpoints:
//!
//! * `command_tx` — sends [`SessionCommand`] to the session controller.
//! * `event_rx`   — receives [`SessionEvent`] progress for the status bar.
//! * `hotkey_rx`  — receives [`HotkeyEvent`] from the listener thread.
//!
//! Start/stop intent from buttons and hotkeys converges on the same command
//! channel, so the controller is the only place session state changes.  The
//! UI reads [`SharedSessionState`] purely for button enablement.

use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use crate::config::{AppConfig, AppPaths, SPEED_PRESETS};
use crate::format::Language;
use crate::hotkey::{HotkeyBinding, HotkeyEvent, HotkeyListener, HotkeyRouter};
use crate::textio;
use crate::typing::session::SharedSessionState;
use crate::typing::{SessionCommand, SessionEvent, TypingRequest};

// ---------------------------------------------------------------------------
// AutoTyperApp
// ---------------------------------------------------------------------------

/// eframe application — the Auto Typer window.
pub struct AutoTyperApp {
    // ── Text buffer ──────────────────────────────────────────────────────
    /// The text that will be replayed as keystrokes.
    text: String,
    /// Filename (under the documents directory) for Save Text / Load Text.
    file_name: String,

    // ── Settings ─────────────────────────────────────────────────────────
    /// Live configuration; persisted on exit.
    config: AppConfig,
    /// Start-combo text field, applied on "Apply Hotkeys".
    start_input: String,
    /// Stop-combo text field, applied on "Apply Hotkeys".
    stop_input: String,

    // ── Status ───────────────────────────────────────────────────────────
    /// Status-bar line, replaced by every session event.
    status: String,
    /// Summary of the live hotkey binding, shown under the hotkey fields.
    hotkey_line: String,

    // ── Session plumbing ─────────────────────────────────────────────────
    /// Send start/stop commands to the session controller.
    command_tx: mpsc::Sender<SessionCommand>,
    /// Receive progress events from the session controller.
    event_rx: mpsc::Receiver<SessionEvent>,
    /// Receive global hotkey triggers from the listener thread.
    hotkey_rx: mpsc::Receiver<HotkeyEvent>,
    /// Read-only view of the controller's state, for button enablement.
    session: SharedSessionState,

    // ── Hotkeys ──────────────────────────────────────────────────────────
    /// Owns the OS hotkey registration; lives on the UI thread.
    router: HotkeyRouter,
    /// Keeps the listener thread alive for the life of the window.
    _hotkey_listener: HotkeyListener,
}

impl AutoTyperApp {
    /// Create the app.  `router` should already hold the registration made
    /// at startup (or none, when hotkeys are disabled or were rejected).
    pub fn new(
        config: AppConfig,
        router: HotkeyRouter,
        hotkey_listener: HotkeyListener,
        session: SharedSessionState,
        command_tx: mpsc::Sender<SessionCommand>,
        event_rx: mpsc::Receiver<SessionEvent>,
        hotkey_rx: mpsc::Receiver<HotkeyEvent>,
    ) -> Self {
        let hotkey_line = Self::hotkey_summary(&config, &router);
        Self {
            text: String::new(),
            file_name: textio::default_save_name(),
            start_input: config.hotkey.start.clone(),
            stop_input: config.hotkey.stop.clone(),
            status: "Ready.".into(),
            hotkey_line,
            config,
            command_tx,
            event_rx,
            hotkey_rx,
            session,
            router,
            _hotkey_listener: hotkey_listener,
        }
    }

    fn hotkey_summary(config: &AppConfig, router: &HotkeyRouter) -> String {
        if !config.hotkey.enabled {
            "Hotkeys disabled".into()
        } else if router.is_registered() {
            HotkeyBinding::new(&config.hotkey.start, &config.hotkey.stop).display()
        } else {
            "Hotkeys not registered".into()
        }
    }

    // ── Channel polling ──────────────────────────────────────────────────

    /// Drain all pending hotkey triggers (non-blocking).
    fn poll_hotkeys(&mut self) {
        while let Ok(event) = self.hotkey_rx.try_recv() {
            match event {
                HotkeyEvent::StartTyping => self.request_start(),
                HotkeyEvent::StopTyping => self.request_stop(),
            }
        }
    }

    /// Drain all pending session events (non-blocking).
    fn poll_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            if let SessionEvent::Finished { ref outcome } = event {
                log::info!("typing run finished: {outcome:?}");
            }
            self.status = event.message();
        }
    }

    // ── Actions ──────────────────────────────────────────────────────────

    /// Send a start command built from the current buffer and settings.
    fn request_start(&mut self) {
        if self.text.trim().is_empty() {
            self.status = "No text to type.".into();
            return;
        }
        let request = TypingRequest::new(
            self.text.clone(),
            self.config.typing.speed,
            self.config.typing.language,
            self.config.typing.start_delay,
            self.config.typing.type_any_window,
        );
        if self
            .command_tx
            .try_send(SessionCommand::Start(request))
            .is_err()
        {
            self.status = "Session controller unavailable.".into();
        }
    }

    fn request_stop(&mut self) {
        if self.command_tx.try_send(SessionCommand::Stop).is_err() {
            self.status = "Session controller unavailable.".into();
        }
    }

    /// Re-register hotkeys from the two text fields.
    fn apply_hotkeys(&mut self) {
        let binding = HotkeyBinding::new(self.start_input.trim(), self.stop_input.trim());
        match self.router.register(binding.clone()) {
            Ok(()) => {
                self.config.hotkey.start = binding.start;
                self.config.hotkey.stop = binding.stop;
                if let Err(e) = self.config.save() {
                    log::warn!("could not save settings: {e}");
                }
                self.status = "Hotkeys updated.".into();
            }
            Err(e) => {
                self.status = format!("Hotkey error: {e}");
            }
        }
        self.hotkey_line = Self::hotkey_summary(&self.config, &self.router);
    }

    /// React to the enable checkbox being toggled.
    fn toggle_hotkeys(&mut self) {
        let result = if self.config.hotkey.enabled {
            // enable_with covers the started-disabled case, where the router
            // has no previous working binding to fall back on.
            self.router.enable_with(HotkeyBinding::new(
                &self.config.hotkey.start,
                &self.config.hotkey.stop,
            ))
        } else {
            self.router.set_enabled(false)
        };
        if let Err(e) = result {
            self.status = format!("Hotkey error: {e}");
        }
        self.hotkey_line = Self::hotkey_summary(&self.config, &self.router);
    }

    fn save_text(&mut self) {
        let path = AppPaths::new().text_dir.join(self.file_name.trim());
        match textio::save_text(&path, &self.text) {
            Ok(()) => self.status = format!("Saved {}", path.display()),
            Err(e) => self.status = format!("Save failed: {e}"),
        }
    }

    fn load_text(&mut self) {
        let path = AppPaths::new().text_dir.join(self.file_name.trim());
        match textio::load_text(&path) {
            Ok(text) => {
                self.text = text;
                self.status = format!("Loaded {}", path.display());
            }
            Err(e) => self.status = format!("Load failed: {e}"),
        }
    }

    // ── Panels ───────────────────────────────────────────────────────────

    fn draw_text_panel(&mut self, ui: &mut egui::Ui) {
        ui.label("Text to type:");
        egui::ScrollArea::vertical()
            .max_height(220.0)
            .show(ui, |ui| {
                ui.add(
                    egui::TextEdit::multiline(&mut self.text)
                        .desired_rows(10)
                        .desired_width(f32::INFINITY)
                        .hint_text("Paste or type the text to replay..."),
                );
            });
    }

    fn draw_speed_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Speed:");
            ui.add(
                egui::Slider::new(&mut self.config.typing.speed, 0.001..=2.0)
                    .logarithmic(true)
                    .suffix(" s/key"),
            );
        });
        ui.horizontal_wrapped(|ui| {
            for (label, seconds) in SPEED_PRESETS {
                if ui
                    .selectable_label(self.config.typing.speed == seconds, label)
                    .clicked()
                {
                    self.config.typing.speed = seconds;
                }
            }
        });
    }

    fn draw_run_settings(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Language:");
            egui::ComboBox::from_id_salt("language")
                .selected_text(self.config.typing.language.label())
                .show_ui(ui, |ui| {
                    for lang in Language::ALL {
                        ui.selectable_value(
                            &mut self.config.typing.language,
                            lang,
                            lang.label(),
                        );
                    }
                });

            ui.separator();
            ui.label("Start delay:");
            ui.add(
                egui::DragValue::new(&mut self.config.typing.start_delay)
                    .speed(0.1)
                    .range(0.0..=60.0)
                    .suffix(" s"),
            );

            ui.separator();
            ui.checkbox(
                &mut self.config.typing.type_any_window,
                "Type into any window",
            );
        });
    }

    fn draw_hotkey_settings(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui
                .checkbox(&mut self.config.hotkey.enabled, "Global hotkeys")
                .changed()
            {
                self.toggle_hotkeys();
            }

            ui.label("Start:");
            ui.add(
                egui::TextEdit::singleline(&mut self.start_input).desired_width(110.0),
            );
            ui.label("Stop:");
            ui.add(egui::TextEdit::singleline(&mut self.stop_input).desired_width(110.0));

            let can_apply = self.config.hotkey.enabled;
            if ui
                .add_enabled(can_apply, egui::Button::new("Apply Hotkeys"))
                .clicked()
            {
                self.apply_hotkeys();
            }
        });
        ui.label(
            egui::RichText::new(&self.hotkey_line)
                .color(egui::Color32::from_rgb(140, 140, 140))
                .size(11.0),
        );
    }

    fn draw_buttons(&mut self, ui: &mut egui::Ui, is_typing: bool) {
        ui.horizontal(|ui| {
            if ui
                .add_enabled(!is_typing, egui::Button::new("Start Typing"))
                .clicked()
            {
                self.request_start();
            }
            if ui
                .add_enabled(is_typing, egui::Button::new("Stop"))
                .clicked()
            {
                self.request_stop();
            }

            ui.separator();

            if ui
                .add_enabled(!is_typing, egui::Button::new("Clear"))
                .clicked()
            {
                self.text.clear();
                self.status = "Cleared.".into();
            }
            if ui.button("Save Text").clicked() {
                self.save_text();
            }
            if ui.button("Load Text").clicked() {
                self.load_text();
            }
            ui.label("File:");
            ui.add(egui::TextEdit::singleline(&mut self.file_name).desired_width(220.0));
        });
    }

    fn draw_status_bar(&self, ui: &mut egui::Ui, is_typing: bool) {
        ui.horizontal(|ui| {
            let color = if is_typing {
                egui::Color32::from_rgb(255, 180, 80)
            } else {
                egui::Color32::from_rgb(160, 160, 160)
            };
            ui.label(egui::RichText::new(&self.status).color(color));
        });
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for AutoTyperApp {
    /// Called every frame by eframe.  Polls channels, then renders.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_hotkeys();
        self.poll_events();

        let is_typing = self.session.lock().unwrap().is_typing;

        // Session and hotkey events arrive from background tasks while the
        // frame loop may be parked (window unfocused).  The listener wakes us
        // for hotkeys; this periodic repaint keeps the status line current
        // for everything else.
        ctx.request_repaint_after(Duration::from_millis(100));

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_text_panel(ui);
            ui.separator();
            self.draw_speed_controls(ui);
            ui.separator();
            self.draw_run_settings(ui);
            ui.separator();
            self.draw_hotkey_settings(ui);
            ui.separator();
            self.draw_buttons(ui, is_typing);
            ui.separator();
            self.draw_status_bar(ui, is_typing);
        });
    }

    /// Persist settings on exit (best-effort).
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Err(e) = self.config.save() {
            log::warn!("could not save settings: {e}");
        }
        log::info!("Auto Typer closing");
    }
}
