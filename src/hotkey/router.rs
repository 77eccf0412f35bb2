//! Hotkey registration lifecycle and the listener thread.
//!
//! [`HotkeyRouter`] owns the start/stop registration as a unit: both combos
//! register or neither does.  A new binding is validated *before* the current
//! one is torn down, so a typo in the UI can never leave the user without
//! working hotkeys.  If the OS rejects a new binding the router re-registers
//! the last binding that worked.
//!
//! Registration goes through the [`HotkeyBackend`] trait; production uses
//! [`SystemBackend`] over `global_hotkey::GlobalHotKeyManager`, tests use a
//! recording mock.  Triggered combos arrive on a process-global channel that
//! [`HotkeyListener`] drains on a dedicated OS thread, resolving each event id
//! through the shared action map and forwarding a [`HotkeyEvent`] with
//! `blocking_send`.

use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use global_hotkey::hotkey::HotKey;
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use tokio::sync::mpsc;

use super::{HotkeyBinding, HotkeyCombo, HotkeyError, HotkeyEvent};

// ---------------------------------------------------------------------------
// HotkeyBackend
// ---------------------------------------------------------------------------

/// The OS registration capability the router drives.
///
/// Object-safe so tests can substitute a recording mock for the real
/// `global-hotkey` manager.
pub trait HotkeyBackend {
    /// Register one combo with the OS, returning its event id.
    fn register(&mut self, combo: &HotkeyCombo) -> Result<u32, HotkeyError>;

    /// Release one previously registered combo.
    fn unregister(&mut self, id: u32) -> Result<(), HotkeyError>;
}

/// Production backend over [`GlobalHotKeyManager`].
pub struct SystemBackend {
    manager: GlobalHotKeyManager,
    /// Live registrations by event id; `unregister` needs the original
    /// [`HotKey`] value back.
    live: HashMap<u32, HotKey>,
}

impl SystemBackend {
    /// Create the OS hotkey manager.
    ///
    /// # Errors
    ///
    /// [`HotkeyError::Backend`] when the platform facility is unavailable
    /// (e.g. no display server).
    pub fn new() -> Result<Self, HotkeyError> {
        let manager = GlobalHotKeyManager::new().map_err(|e| HotkeyError::Backend(e.to_string()))?;
        Ok(Self {
            manager,
            live: HashMap::new(),
        })
    }
}

impl HotkeyBackend for SystemBackend {
    fn register(&mut self, combo: &HotkeyCombo) -> Result<u32, HotkeyError> {
        let hotkey = combo.to_hotkey()?;
        self.manager
            .register(hotkey)
            .map_err(|e| HotkeyError::Rejected {
                combo: combo.display(),
                reason: e.to_string(),
            })?;
        self.live.insert(hotkey.id(), hotkey);
        Ok(hotkey.id())
    }

    fn unregister(&mut self, id: u32) -> Result<(), HotkeyError> {
        if let Some(hotkey) = self.live.remove(&id) {
            self.manager
                .unregister(hotkey)
                .map_err(|e| HotkeyError::Backend(e.to_string()))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// HotkeyRouter
// ---------------------------------------------------------------------------

/// Which session action a registered event id maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyAction {
    Start,
    Stop,
}

/// Shared id → action map, read by the listener thread on every trigger.
pub type ActionMap = Arc<Mutex<HashMap<u32, HotkeyAction>>>;

/// One live start/stop registration.
struct ActiveRegistration {
    start_id: u32,
    stop_id: u32,
}

/// Owns the start/stop hotkey registration as a unit.
///
/// Not `Send` (the OS manager is thread-bound on some platforms); lives on
/// the UI thread.  Only the [`ActionMap`] is shared with the listener thread.
pub struct HotkeyRouter {
    backend: Box<dyn HotkeyBackend>,
    actions: ActionMap,
    active: Option<ActiveRegistration>,
    /// Last binding the OS accepted; re-registered as a fallback when a new
    /// binding is rejected, and on re-enable.
    last_good: Option<HotkeyBinding>,
}

impl HotkeyRouter {
    pub fn new(backend: Box<dyn HotkeyBackend>) -> Self {
        Self {
            backend,
            actions: Arc::new(Mutex::new(HashMap::new())),
            active: None,
            last_good: None,
        }
    }

    /// Clone of the shared action map, for [`HotkeyListener::start`].
    pub fn actions(&self) -> ActionMap {
        Arc::clone(&self.actions)
    }

    /// True while a start/stop pair is registered with the OS.
    pub fn is_registered(&self) -> bool {
        self.active.is_some()
    }

    /// Register `binding` as the live start/stop pair, replacing any current
    /// registration.
    ///
    /// The binding is validated (both combos parse, start ≠ stop) *before*
    /// the current registration is torn down; an invalid binding leaves the
    /// current hotkeys untouched.  If the OS rejects the new pair the
    /// previous working binding is re-registered and the rejection is still
    /// returned so the UI can report it.
    pub fn register(&mut self, binding: HotkeyBinding) -> Result<(), HotkeyError> {
        let (start, stop) = binding.validate()?;
        // Combos with tokens that parse but have no platform mapping must
        // also fail before teardown.
        start.to_hotkey()?;
        stop.to_hotkey()?;

        self.unregister();

        match self.register_pair(&start, &stop) {
            Ok(()) => {
                log::info!("hotkeys registered: {}", binding.display());
                self.last_good = Some(binding);
                Ok(())
            }
            Err(e) => {
                log::warn!("hotkey registration failed: {e}");
                self.restore_last_good();
                Err(e)
            }
        }
    }

    /// Register both combos or neither: a failure on the stop combo rolls
    /// back the already-registered start combo.
    fn register_pair(
        &mut self,
        start: &HotkeyCombo,
        stop: &HotkeyCombo,
    ) -> Result<(), HotkeyError> {
        let start_id = self.backend.register(start)?;
        let stop_id = match self.backend.register(stop) {
            Ok(id) => id,
            Err(e) => {
                if let Err(e2) = self.backend.unregister(start_id) {
                    log::warn!("rollback of start hotkey failed: {e2}");
                }
                return Err(e);
            }
        };

        let mut map = self.actions.lock().unwrap();
        map.insert(start_id, HotkeyAction::Start);
        map.insert(stop_id, HotkeyAction::Stop);
        drop(map);

        self.active = Some(ActiveRegistration { start_id, stop_id });
        Ok(())
    }

    fn restore_last_good(&mut self) {
        let Some(previous) = self.last_good.clone() else {
            return;
        };
        match previous.validate() {
            Ok((start, stop)) => match self.register_pair(&start, &stop) {
                Ok(()) => log::info!("reverted to previous hotkeys: {}", previous.display()),
                Err(e) => {
                    log::error!("re-registering previous hotkeys failed: {e}");
                    self.last_good = None;
                }
            },
            Err(e) => {
                log::error!("previous hotkey binding no longer valid: {e}");
                self.last_good = None;
            }
        }
    }

    /// Tear down the current registration.  Idempotent; a no-op when nothing
    /// is registered.
    pub fn unregister(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        let mut map = self.actions.lock().unwrap();
        map.remove(&active.start_id);
        map.remove(&active.stop_id);
        drop(map);

        for id in [active.start_id, active.stop_id] {
            if let Err(e) = self.backend.unregister(id) {
                log::warn!("hotkey unregister failed: {e}");
            }
        }
    }

    /// Enable or disable hotkeys without forgetting the configured binding.
    ///
    /// Disabling tears down the OS registration; enabling re-registers the
    /// last working binding (a no-op when already live or when nothing has
    /// ever been registered — use [`enable_with`](Self::enable_with) to
    /// supply the configured binding for that case).
    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), HotkeyError> {
        if !enabled {
            self.unregister();
            return Ok(());
        }
        if self.active.is_some() {
            return Ok(());
        }
        match self.last_good.clone() {
            Some(binding) => self.register(binding),
            None => Ok(()),
        }
    }

    /// Enable hotkeys, registering `configured` when no binding has ever
    /// been accepted — the case where the app started with hotkeys disabled
    /// and the user ticks the checkbox.  Prefers the last working binding
    /// otherwise; a no-op while a pair is live.
    pub fn enable_with(&mut self, configured: HotkeyBinding) -> Result<(), HotkeyError> {
        if self.active.is_some() {
            return Ok(());
        }
        let binding = self.last_good.clone().unwrap_or(configured);
        self.register(binding)
    }
}

impl Drop for HotkeyRouter {
    fn drop(&mut self) {
        self.unregister();
    }
}

// ---------------------------------------------------------------------------
// HotkeyListener
// ---------------------------------------------------------------------------

/// Handle to the thread draining the process-global hotkey event channel.
///
/// Construct one with [`HotkeyListener::start`].  Dropping it stops the
/// thread at the next receive timeout.
pub struct HotkeyListener {
    /// Shared stop flag, set on [`Drop`].
    stop: Arc<AtomicBool>,
    _thread: std::thread::JoinHandle<()>,
}

impl HotkeyListener {
    /// Poll interval for the stop flag while waiting for events.
    const RECV_TIMEOUT: Duration = Duration::from_millis(200);

    /// Spawn the dedicated OS thread that forwards triggered combos.
    ///
    /// Each press event's id is resolved through `actions`; key releases and
    /// ids with no mapping (stale events from a torn-down registration) are
    /// discarded.  Forwarding uses `blocking_send`, which is correct from a
    /// non-async thread.
    ///
    /// `wake` is invoked after every forwarded event.  The UI drains the
    /// channel from its frame callback, and while the window sits unfocused
    /// the frame loop is parked in its event wait — the wake (in production
    /// an `egui::Context::request_repaint`) is what gets the event seen at
    /// all.
    ///
    /// # Panics
    ///
    /// Panics if the OS refuses to create the thread (extremely unlikely).
    pub fn start(
        actions: ActionMap,
        tx: mpsc::Sender<HotkeyEvent>,
        wake: impl Fn() + Send + 'static,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = Arc::clone(&stop);

        let thread = std::thread::Builder::new()
            .name("hotkey-listener".into())
            .spawn(move || {
                let receiver = GlobalHotKeyEvent::receiver();
                loop {
                    if stop_clone.load(Ordering::Relaxed) {
                        return;
                    }
                    let event = match receiver.recv_timeout(Self::RECV_TIMEOUT) {
                        Ok(event) => event,
                        Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
                        Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                            log::error!("hotkey-listener: event channel disconnected");
                            return;
                        }
                    };

                    if event.state != HotKeyState::Pressed {
                        continue;
                    }

                    if !forward_pressed(&actions, event.id, &tx, &wake) {
                        // Receiver gone means the app is shutting down.
                        return;
                    }
                }
            })
            .expect("failed to spawn hotkey-listener thread");

        Self {
            stop,
            _thread: thread,
        }
    }
}

/// Resolve a pressed event id, forward the matching [`HotkeyEvent`], and
/// wake the receiving side.  Stale ids (from a replaced registration) are
/// dropped silently.  Returns `false` when the receiver is gone.
fn forward_pressed(
    actions: &ActionMap,
    id: u32,
    tx: &mpsc::Sender<HotkeyEvent>,
    wake: &dyn Fn(),
) -> bool {
    let action = actions.lock().unwrap().get(&id).copied();
    let event = match action {
        Some(HotkeyAction::Start) => HotkeyEvent::StartTyping,
        Some(HotkeyAction::Stop) => HotkeyEvent::StopTyping,
        None => return true,
    };
    if tx.blocking_send(event).is_err() {
        return false;
    }
    wake();
    true
}

impl Drop for HotkeyListener {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// One recorded backend call, for ordering assertions.
    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Register(String),
        Unregister(u32),
    }

    /// Recording mock backend with scripted per-combo failures.
    struct MockBackend {
        calls: Arc<Mutex<Vec<Call>>>,
        /// Display forms of combos the fake OS refuses.
        reject: Vec<String>,
        next_id: u32,
    }

    impl MockBackend {
        fn new() -> (Self, Arc<Mutex<Vec<Call>>>) {
            let calls = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    calls: Arc::clone(&calls),
                    reject: Vec::new(),
                    next_id: 1,
                },
                calls,
            )
        }

        fn rejecting(combos: &[&str]) -> (Self, Arc<Mutex<Vec<Call>>>) {
            let (mut backend, calls) = Self::new();
            backend.reject = combos.iter().map(|c| c.to_string()).collect();
            (backend, calls)
        }
    }

    impl HotkeyBackend for MockBackend {
        fn register(&mut self, combo: &HotkeyCombo) -> Result<u32, HotkeyError> {
            let display = combo.display();
            if self.reject.contains(&display) {
                return Err(HotkeyError::Rejected {
                    combo: display,
                    reason: "already in use".into(),
                });
            }
            self.calls.lock().unwrap().push(Call::Register(display));
            let id = self.next_id;
            self.next_id += 1;
            Ok(id)
        }

        fn unregister(&mut self, id: u32) -> Result<(), HotkeyError> {
            self.calls.lock().unwrap().push(Call::Unregister(id));
            Ok(())
        }
    }

    fn binding(start: &str, stop: &str) -> HotkeyBinding {
        HotkeyBinding::new(start, stop)
    }

    fn action_for(router: &HotkeyRouter, id: u32) -> Option<HotkeyAction> {
        router.actions().lock().unwrap().get(&id).copied()
    }

    // ---- registration ---

    #[test]
    fn register_maps_both_combos() {
        let (backend, calls) = MockBackend::new();
        let mut router = HotkeyRouter::new(Box::new(backend));

        router
            .register(binding("ctrl+shift+s", "ctrl+shift+x"))
            .unwrap();

        assert!(router.is_registered());
        assert_eq!(action_for(&router, 1), Some(HotkeyAction::Start));
        assert_eq!(action_for(&router, 2), Some(HotkeyAction::Stop));
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                Call::Register("Ctrl+Shift+S".into()),
                Call::Register("Ctrl+Shift+X".into()),
            ]
        );
    }

    #[test]
    fn rebinding_tears_down_previous_pair() {
        let (backend, calls) = MockBackend::new();
        let mut router = HotkeyRouter::new(Box::new(backend));

        router
            .register(binding("ctrl+shift+s", "ctrl+shift+x"))
            .unwrap();
        router.register(binding("alt+f1", "alt+f2")).unwrap();

        assert_eq!(action_for(&router, 1), None);
        assert_eq!(action_for(&router, 2), None);
        assert_eq!(action_for(&router, 3), Some(HotkeyAction::Start));
        assert_eq!(action_for(&router, 4), Some(HotkeyAction::Stop));

        let recorded = calls.lock().unwrap().clone();
        assert!(recorded.contains(&Call::Unregister(1)));
        assert!(recorded.contains(&Call::Unregister(2)));
    }

    // ---- validation before teardown ---

    #[test]
    fn duplicate_combos_leave_current_registration_untouched() {
        let (backend, calls) = MockBackend::new();
        let mut router = HotkeyRouter::new(Box::new(backend));

        router
            .register(binding("ctrl+shift+s", "ctrl+shift+x"))
            .unwrap();
        calls.lock().unwrap().clear();

        let err = router
            .register(binding("ctrl+shift+a", "ctrl+shift+a"))
            .unwrap_err();

        assert!(matches!(err, HotkeyError::DuplicateCombo));
        // No backend traffic at all: the old pair stays live.
        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(action_for(&router, 1), Some(HotkeyAction::Start));
        assert_eq!(action_for(&router, 2), Some(HotkeyAction::Stop));
    }

    #[test]
    fn unparseable_combo_leaves_current_registration_untouched() {
        let (backend, calls) = MockBackend::new();
        let mut router = HotkeyRouter::new(Box::new(backend));

        router
            .register(binding("ctrl+shift+s", "ctrl+shift+x"))
            .unwrap();
        calls.lock().unwrap().clear();

        assert!(router.register(binding("ctrl+", "alt+f2")).is_err());
        assert!(router.register(binding("hyper+k", "alt+f2")).is_err());

        assert!(calls.lock().unwrap().is_empty());
        assert!(router.is_registered());
    }

    // ---- OS rejection ---

    #[test]
    fn rejected_stop_combo_rolls_back_start_combo() {
        let (backend, calls) = MockBackend::rejecting(&["Alt+F2"]);
        let mut router = HotkeyRouter::new(Box::new(backend));

        let err = router.register(binding("alt+f1", "alt+f2")).unwrap_err();

        assert!(matches!(err, HotkeyError::Rejected { .. }));
        assert!(!router.is_registered());
        // The start combo (id 1) was registered then rolled back.
        assert_eq!(
            *calls.lock().unwrap(),
            vec![Call::Register("Alt+F1".into()), Call::Unregister(1)]
        );
        assert!(router.actions().lock().unwrap().is_empty());
    }

    #[test]
    fn rejection_falls_back_to_last_working_binding() {
        let (backend, _calls) = MockBackend::rejecting(&["Alt+F1"]);
        let mut router = HotkeyRouter::new(Box::new(backend));

        router
            .register(binding("ctrl+shift+s", "ctrl+shift+x"))
            .unwrap();
        let err = router.register(binding("alt+f1", "alt+f2")).unwrap_err();

        assert!(matches!(err, HotkeyError::Rejected { .. }));
        // Previous pair is live again, under fresh ids.
        assert!(router.is_registered());
        let map = router.actions();
        let map = map.lock().unwrap();
        assert_eq!(map.len(), 2);
        assert!(map.values().any(|a| *a == HotkeyAction::Start));
        assert!(map.values().any(|a| *a == HotkeyAction::Stop));
    }

    // ---- unregister / enable toggle ---

    #[test]
    fn unregister_is_idempotent() {
        let (backend, calls) = MockBackend::new();
        let mut router = HotkeyRouter::new(Box::new(backend));

        router
            .register(binding("ctrl+shift+s", "ctrl+shift+x"))
            .unwrap();
        router.unregister();
        router.unregister();

        assert!(!router.is_registered());
        let unregisters = calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, Call::Unregister(_)))
            .count();
        assert_eq!(unregisters, 2); // one per combo, not per call
    }

    #[test]
    fn disable_preserves_binding_for_re_enable() {
        let (backend, _calls) = MockBackend::new();
        let mut router = HotkeyRouter::new(Box::new(backend));

        router
            .register(binding("ctrl+shift+s", "ctrl+shift+x"))
            .unwrap();

        router.set_enabled(false).unwrap();
        assert!(!router.is_registered());
        assert!(router.actions().lock().unwrap().is_empty());

        router.set_enabled(true).unwrap();
        assert!(router.is_registered());
        assert_eq!(router.actions().lock().unwrap().len(), 2);
    }

    #[test]
    fn enable_without_prior_binding_is_a_noop() {
        let (backend, calls) = MockBackend::new();
        let mut router = HotkeyRouter::new(Box::new(backend));

        router.set_enabled(true).unwrap();

        assert!(!router.is_registered());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn enable_with_registers_config_when_nothing_was_ever_registered() {
        let (backend, _calls) = MockBackend::new();
        let mut router = HotkeyRouter::new(Box::new(backend));

        // App started with hotkeys disabled; the checkbox alone must be
        // enough to go live.
        router
            .enable_with(binding("ctrl+shift+s", "ctrl+shift+x"))
            .unwrap();

        assert!(router.is_registered());
        assert_eq!(router.actions().lock().unwrap().len(), 2);
    }

    #[test]
    fn enable_with_prefers_last_working_binding() {
        let (backend, calls) = MockBackend::new();
        let mut router = HotkeyRouter::new(Box::new(backend));

        router
            .register(binding("ctrl+shift+s", "ctrl+shift+x"))
            .unwrap();
        router.set_enabled(false).unwrap();
        calls.lock().unwrap().clear();

        router.enable_with(binding("alt+f1", "alt+f2")).unwrap();

        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                Call::Register("Ctrl+Shift+S".into()),
                Call::Register("Ctrl+Shift+X".into()),
            ]
        );
    }

    // ---- listener dispatch ---

    fn action_map(entries: &[(u32, HotkeyAction)]) -> ActionMap {
        Arc::new(Mutex::new(entries.iter().copied().collect()))
    }

    #[test]
    fn pressed_ids_forward_and_wake_the_ui() {
        let actions = action_map(&[(7, HotkeyAction::Start), (9, HotkeyAction::Stop)]);
        let (tx, mut rx) = mpsc::channel(4);
        let wakes = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let wake = {
            let wakes = Arc::clone(&wakes);
            move || {
                wakes.fetch_add(1, Ordering::Relaxed);
            }
        };

        assert!(forward_pressed(&actions, 7, &tx, &wake));
        assert!(forward_pressed(&actions, 9, &tx, &wake));

        assert_eq!(rx.try_recv().unwrap(), HotkeyEvent::StartTyping);
        assert_eq!(rx.try_recv().unwrap(), HotkeyEvent::StopTyping);
        // One wake per forwarded event, so the UI drains even while its
        // frame loop is parked waiting for window events.
        assert_eq!(wakes.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn stale_ids_are_dropped_without_waking() {
        let actions = action_map(&[(7, HotkeyAction::Start)]);
        let (tx, mut rx) = mpsc::channel(4);
        let wakes = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let wake = {
            let wakes = Arc::clone(&wakes);
            move || {
                wakes.fetch_add(1, Ordering::Relaxed);
            }
        };

        assert!(forward_pressed(&actions, 42, &tx, &wake));

        assert!(rx.try_recv().is_err());
        assert_eq!(wakes.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn forwarding_stops_when_receiver_is_gone() {
        let actions = action_map(&[(7, HotkeyAction::Start)]);
        let (tx, rx) = mpsc::channel(4);
        drop(rx);

        assert!(!forward_pressed(&actions, 7, &tx, &|| {}));
    }

    #[test]
    fn enable_while_live_does_not_re_register() {
        let (backend, calls) = MockBackend::new();
        let mut router = HotkeyRouter::new(Box::new(backend));

        router
            .register(binding("ctrl+shift+s", "ctrl+shift+x"))
            .unwrap();
        calls.lock().unwrap().clear();

        router.set_enabled(true).unwrap();
        assert!(calls.lock().unwrap().is_empty());
    }
}
