//! Typing session controller — owns the one-run-at-a-time invariant.
//!
//! [`SessionController`] consumes [`SessionCommand`]s from a
//! `tokio::sync::mpsc` channel and emits [`SessionEvent`]s for the UI.  Both
//! the UI thread and the hotkey listener (via the UI's dispatch) send into
//! the same command channel, so every session-state mutation funnels through
//! this one task and no locking discipline is needed beyond the shared
//! [`CancelToken`].
//!
//! # State machine
//!
//! ```text
//! Idle ──Start──▶ Starting/Typing (one background run, spawn_blocking)
//!                      │ run finishes with any Outcome
//!                      ▼
//!                    Idle            (the single place is_typing clears)
//! Idle ──Start while running──▶ rejected, in-flight run untouched
//! Stop while running  ──▶ cancel token set (idempotent)
//! Stop while idle     ──▶ "nothing to stop"
//! ```
//!
//! The countdown phase and the emission phase are one background run; the
//! engine reports how it ended through [`Outcome`].

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use super::emitter::EmitterFactory;
use super::{engine, CancelToken, Outcome, TypingRequest};

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Session flags read by the UI for button enablement.
///
/// Written only by [`SessionController`]'s own handlers.
#[derive(Debug, Default)]
pub struct SessionState {
    /// True while a typing run (countdown included) is in flight.
    pub is_typing: bool,
}

/// Thread-safe handle to [`SessionState`].
///
/// Cheap to clone.  Lock for a short critical section only.
pub type SharedSessionState = Arc<Mutex<SessionState>>;

// ---------------------------------------------------------------------------
// Commands and events
// ---------------------------------------------------------------------------

/// Commands accepted by the controller's channel.
#[derive(Debug)]
pub enum SessionCommand {
    /// Begin a typing run.  Rejected if one is already in flight.
    Start(TypingRequest),
    /// Request cooperative cancellation of the in-flight run.
    Stop,
}

/// Progress events delivered to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A run was accepted; the countdown is underway.
    Starting {
        /// Seconds until the first keystroke.
        start_delay_secs: f64,
    },
    /// Start was refused because a run is already in flight.
    AlreadyRunning,
    /// Stop was requested while idle.
    NothingToStop,
    /// The cancel signal was set; the run will halt at its next checkpoint.
    Stopping,
    /// The background run finished; the session is idle again.
    Finished {
        /// How the run ended.
        outcome: Outcome,
    },
}

impl SessionEvent {
    /// Status-bar text for this event.
    pub fn message(&self) -> String {
        match self {
            SessionEvent::Starting { start_delay_secs } => format!(
                "Starting in {start_delay_secs:.1} s. Click in the target window."
            ),
            SessionEvent::AlreadyRunning => "Typing is already in progress.".into(),
            SessionEvent::NothingToStop => "No typing in progress.".into(),
            SessionEvent::Stopping => "Stopping...".into(),
            SessionEvent::Finished { outcome } => outcome.message(),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionController
// ---------------------------------------------------------------------------

/// Owns session state and drives typing runs.
///
/// Create with [`SessionController::new`], hand [`state`](Self::state) to the
/// UI, then spawn [`run`](Self::run) on the tokio runtime.
pub struct SessionController {
    state: SharedSessionState,
    cancel: CancelToken,
    factory: EmitterFactory,
    event_tx: mpsc::Sender<SessionEvent>,
}

impl SessionController {
    /// Create a controller that builds emitters with `factory` and reports
    /// progress on `event_tx`.
    pub fn new(factory: EmitterFactory, event_tx: mpsc::Sender<SessionEvent>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::default())),
            cancel: CancelToken::new(),
            factory,
            event_tx,
        }
    }

    /// Shared session-state handle for the UI.
    pub fn state(&self) -> SharedSessionState {
        Arc::clone(&self.state)
    }

    /// Consume commands until the channel closes.
    ///
    /// Spawn as a tokio task from `main()`.
    pub async fn run(self, mut command_rx: mpsc::Receiver<SessionCommand>) {
        // Completions from the background run funnel back through this
        // private channel so is_typing is cleared in exactly one place.
        let (done_tx, mut done_rx) = mpsc::channel::<Outcome>(1);

        loop {
            tokio::select! {
                cmd = command_rx.recv() => match cmd {
                    Some(SessionCommand::Start(request)) => {
                        self.handle_start(request, done_tx.clone()).await;
                    }
                    Some(SessionCommand::Stop) => self.handle_stop().await,
                    None => break,
                },
                Some(outcome) = done_rx.recv() => self.handle_finished(outcome).await,
            }
        }

        log::info!("session: command channel closed, controller shutting down");
    }

    // -----------------------------------------------------------------------
    // Handlers
    // -----------------------------------------------------------------------

    /// Accept or reject a start, and spawn the emission run when accepted.
    async fn handle_start(&self, request: TypingRequest, done_tx: mpsc::Sender<Outcome>) {
        let accepted = {
            let mut st = self.state.lock().unwrap();
            if st.is_typing {
                false
            } else {
                st.is_typing = true;
                true
            }
        };
        if !accepted {
            log::debug!("session: start rejected, run already in flight");
            self.send_event(SessionEvent::AlreadyRunning).await;
            return;
        }

        self.cancel.clear();
        log::info!(
            "session: starting run ({} chars, {:.3} s/key, {:.1} s delay)",
            request.text.chars().count(),
            request.speed_secs,
            request.start_delay_secs
        );
        self.send_event(SessionEvent::Starting {
            start_delay_secs: request.start_delay_secs,
        })
        .await;

        let cancel = self.cancel.clone();
        let factory = Arc::clone(&self.factory);

        tokio::spawn(async move {
            let joined = tokio::task::spawn_blocking(move || {
                let mut emitter = match factory() {
                    Ok(emitter) => emitter,
                    Err(e) => return Outcome::Failed(e.to_string()),
                };
                engine::run(&request, emitter.as_mut(), &cancel)
            })
            .await;

            let outcome = joined
                .unwrap_or_else(|e| Outcome::Failed(format!("typing task panicked: {e}")));
            let _ = done_tx.send(outcome).await;
        });
    }

    /// Set the cancel signal.  Calling it again while stopping is a no-op.
    async fn handle_stop(&self) {
        let is_typing = self.state.lock().unwrap().is_typing;
        if !is_typing {
            self.send_event(SessionEvent::NothingToStop).await;
            return;
        }

        self.cancel.cancel();
        log::info!("session: stop requested");
        self.send_event(SessionEvent::Stopping).await;
    }

    /// The single exit path: clears is_typing and the cancel signal for every
    /// outcome, so the session can never be left stuck.
    async fn handle_finished(&self, outcome: Outcome) {
        self.state.lock().unwrap().is_typing = false;
        self.cancel.clear();

        match &outcome {
            Outcome::Failed(reason) => log::error!("session: run failed: {reason}"),
            other => log::info!("session: run finished: {other:?}"),
        }
        self.send_event(SessionEvent::Finished { outcome }).await;
    }

    async fn send_event(&self, event: SessionEvent) {
        if self.event_tx.send(event).await.is_err() {
            log::debug!("session: event receiver dropped");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
