//! Headless window system
//!
//! An in-memory stand-in for a native window manager. Windows are just
//! handles in a live set; events are injected through a
//! [`HeadlessController`] and delivered by [`HeadlessBackend::pump`] to
//! the router thread, exactly as a native message queue would deliver them.
//!
//! The controller is `Send + Sync` and can be cloned, so tests and tools can
//! script input from any thread.

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{
    BackendFactory, NativeBackend, NativeEvent, NativeEventKind, NativeHandle, NativeWindowDesc,
    PlatformError, PlatformResult, Waker,
};
use crate::foundation::sync;
use crate::input::{KeyCode, MouseButton, WHEEL_NOTCH};

/// How long [`HeadlessController::flush`] waits for the router
const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// First handle value; keeps headless handles visually distinct from ids
const FIRST_HANDLE: u64 = 0x1000;

enum Signal {
    Event(NativeEvent),
    Wake,
    Barrier(Sender<()>),
}

#[derive(Debug)]
struct World {
    next_handle: AtomicU64,
    live: Mutex<BTreeSet<NativeHandle>>,
    titles: Mutex<Vec<(NativeHandle, String)>>,
    failing_creates: AtomicUsize,
}

/// Scripting handle for a headless window system
#[derive(Clone)]
pub struct HeadlessController {
    signals: Sender<Signal>,
    receiver: Receiver<Signal>,
    world: Arc<World>,
}

impl HeadlessController {
    /// Create a new, empty headless window system
    pub fn new() -> Self {
        let (signals, receiver) = unbounded();
        Self {
            signals,
            receiver,
            world: Arc::new(World {
                next_handle: AtomicU64::new(FIRST_HANDLE),
                live: Mutex::new(BTreeSet::new()),
                titles: Mutex::new(Vec::new()),
                failing_creates: AtomicUsize::new(0),
            }),
        }
    }

    /// Factory producing backends bound to this controller
    pub fn factory(&self) -> BackendFactory {
        let controller = self.clone();
        Arc::new(move || Ok(Box::new(HeadlessBackend::new(&controller)) as Box<dyn NativeBackend>))
    }

    /// Queue a raw event
    pub fn send(&self, window: NativeHandle, kind: NativeEventKind) {
        let _ = self.signals.send(Signal::Event(NativeEvent::new(window, kind)));
    }

    /// Simulate the user clicking the close button
    pub fn click_close(&self, window: NativeHandle) {
        self.send(window, NativeEventKind::CloseRequested);
    }

    /// Simulate the window system destroying a window on its own
    pub fn destroy_externally(&self, window: NativeHandle) {
        sync::lock(&self.world.live).remove(&window);
        self.send(window, NativeEventKind::Destroyed);
    }

    /// Press a key
    pub fn key_down(&self, window: NativeHandle, key: KeyCode) {
        self.send(window, NativeEventKind::KeyDown { key, repeat: false });
    }

    /// Auto-repeat of a held key
    pub fn key_repeat(&self, window: NativeHandle, key: KeyCode) {
        self.send(window, NativeEventKind::KeyDown { key, repeat: true });
    }

    /// Release a key
    pub fn key_up(&self, window: NativeHandle, key: KeyCode) {
        self.send(window, NativeEventKind::KeyUp { key });
    }

    /// Type a string as character events
    pub fn type_text(&self, window: NativeHandle, text: &str) {
        for c in text.chars() {
            self.send(window, NativeEventKind::Character(c));
        }
    }

    /// Give or take keyboard focus
    pub fn focus(&self, window: NativeHandle, focused: bool) {
        self.send(window, NativeEventKind::Focus(focused));
    }

    /// Move the cursor inside a window
    pub fn mouse_move(&self, window: NativeHandle, x: i32, y: i32) {
        self.send(window, NativeEventKind::MouseMoved { x, y });
    }

    /// Press or release a mouse button
    pub fn mouse_button(&self, window: NativeHandle, button: MouseButton, pressed: bool) {
        self.send(window, NativeEventKind::MouseButton { button, pressed });
    }

    /// Rotate the wheel by whole notches
    pub fn scroll(&self, window: NativeHandle, notches: i32) {
        self.send(window, NativeEventKind::MouseWheel(notches * WHEEL_NOTCH));
    }

    /// Make the next `count` window creations fail
    pub fn fail_next_creates(&self, count: usize) {
        self.world.failing_creates.store(count, Ordering::SeqCst);
    }

    /// Native windows currently open
    pub fn live_windows(&self) -> Vec<NativeHandle> {
        sync::lock(&self.world.live).iter().copied().collect()
    }

    /// Title a native window was created with
    pub fn title_of(&self, window: NativeHandle) -> Option<String> {
        sync::lock(&self.world.titles)
            .iter()
            .find(|(handle, _)| *handle == window)
            .map(|(_, title)| title.clone())
    }

    /// Block until every event queued so far has been handled by the router
    ///
    /// Returns false if no router picked the barrier up in time. If the
    /// router shuts down while the barrier is pending this returns true,
    /// since everything queued before it was handled.
    pub fn flush(&self) -> bool {
        let (done, wait) = crossbeam_channel::bounded(1);
        if self.signals.send(Signal::Barrier(done)).is_err() {
            return false;
        }
        match wait.recv_timeout(FLUSH_TIMEOUT) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
            Err(RecvTimeoutError::Timeout) => false,
        }
    }
}

impl Default for HeadlessController {
    fn default() -> Self {
        Self::new()
    }
}

/// Router-side half of the headless window system
pub struct HeadlessBackend {
    signals: Sender<Signal>,
    receiver: Receiver<Signal>,
    world: Arc<World>,
    // Answered at the start of the next pump, once the router has handled
    // every event delivered alongside them. Dropped (and so answered) if
    // the router exits first.
    barriers: Vec<Sender<()>>,
}

impl HeadlessBackend {
    /// Create a backend bound to a controller
    pub fn new(controller: &HeadlessController) -> Self {
        Self {
            signals: controller.signals.clone(),
            receiver: controller.receiver.clone(),
            world: Arc::clone(&controller.world),
            barriers: Vec::new(),
        }
    }

    fn accept(&mut self, signal: Signal, sink: &mut Vec<NativeEvent>) {
        match signal {
            Signal::Event(event) => sink.push(event),
            Signal::Wake => {}
            Signal::Barrier(done) => self.barriers.push(done),
        }
    }
}

impl NativeBackend for HeadlessBackend {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn create_window(&mut self, desc: &NativeWindowDesc) -> PlatformResult<NativeHandle> {
        let failing = self
            .world
            .failing_creates
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(PlatformError::WindowCreationFailed(format!(
                "headless window '{}' rejected",
                desc.title
            )));
        }

        let handle = NativeHandle(self.world.next_handle.fetch_add(1, Ordering::Relaxed));
        sync::lock(&self.world.live).insert(handle);
        sync::lock(&self.world.titles).push((handle, desc.title.clone()));
        Ok(handle)
    }

    fn destroy_window(&mut self, window: NativeHandle) -> PlatformResult<()> {
        if sync::lock(&self.world.live).remove(&window) {
            Ok(())
        } else {
            Err(PlatformError::UnknownWindow(window))
        }
    }

    fn pump(&mut self, timeout: Duration, sink: &mut Vec<NativeEvent>) -> PlatformResult<()> {
        for done in self.barriers.drain(..) {
            let _ = done.send(());
        }

        let first = match self.receiver.recv_timeout(timeout) {
            Ok(signal) => signal,
            Err(RecvTimeoutError::Timeout) => return Ok(()),
            Err(RecvTimeoutError::Disconnected) => return Err(PlatformError::Disconnected),
        };
        self.accept(first, sink);

        while let Ok(signal) = self.receiver.try_recv() {
            self.accept(signal, sink);
        }
        Ok(())
    }

    fn waker(&self) -> Option<Waker> {
        let signals = self.signals.clone();
        Some(Arc::new(move || {
            let _ = signals.send(Signal::Wake);
        }))
    }
}
