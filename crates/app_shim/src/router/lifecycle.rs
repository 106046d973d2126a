//! Framework state shared between caller threads and the router thread

use crossbeam_channel::Sender;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::thread::{JoinHandle, ThreadId};

use super::command::RouterCommand;
use crate::config::FrameworkConfig;
use crate::foundation::sync;
use crate::input::InputState;
use crate::platform::{BackendFactory, PlatformError, Waker};
use crate::window::Registry;

/// Router thread lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RouterPhase {
    /// No router thread is running
    Idle,
    /// Thread spawned; waiting for it to enter its loop
    Starting,
    /// Loop running; commands are accepted
    Running,
    /// Loop finished; backend being torn down
    Stopping,
}

/// Lifecycle bookkeeping, guarded by [`Shared::lifecycle`]
///
/// The router only decides to exit while holding this lock, and callers only
/// post commands while holding it, so a command can never be sent to a
/// router that has already decided to stop.
pub(crate) struct Lifecycle {
    pub phase: RouterPhase,
    /// Native windows open, addressable or not
    pub open_windows: usize,
    /// Commands posted and not yet finished by the router
    pub in_flight: usize,
    /// The last window closed; the router exits once nothing is in flight
    pub quit_pending: bool,
    /// Shutdown requested; the router exits once nothing is in flight
    pub stop_requested: bool,
    /// No further commands are accepted
    pub shut_down: bool,
    pub commands: Option<Sender<RouterCommand>>,
    pub waker: Option<Waker>,
    pub router_thread: Option<ThreadId>,
    pub join: Option<JoinHandle<()>>,
    pub startup_error: Option<PlatformError>,
    /// The native pump failed; reported to waiters and the next command
    pub backend_error: Option<PlatformError>,
    /// Generation counter, bumped each time a router thread starts
    pub generation: u64,
}

impl Lifecycle {
    fn new() -> Self {
        Self {
            phase: RouterPhase::Idle,
            open_windows: 0,
            in_flight: 0,
            quit_pending: false,
            stop_requested: false,
            shut_down: false,
            commands: None,
            waker: None,
            router_thread: None,
            join: None,
            startup_error: None,
            backend_error: None,
            generation: 0,
        }
    }

    /// Wake a router blocked in the native pump
    pub fn wake_router(&self) {
        if let Some(waker) = &self.waker {
            waker();
        }
    }
}

/// State owned by one framework context
pub(crate) struct Shared {
    pub config: FrameworkConfig,
    pub factory: BackendFactory,
    pub registry: Mutex<Registry>,
    pub input: InputState,
    pub lifecycle: Mutex<Lifecycle>,
    pub lifecycle_changed: Condvar,
}

impl Shared {
    pub fn new(config: FrameworkConfig, factory: BackendFactory) -> Self {
        Self {
            input: InputState::new(config.input.text_buffer_capacity),
            config,
            factory,
            registry: Mutex::new(Registry::new()),
            lifecycle: Mutex::new(Lifecycle::new()),
            lifecycle_changed: Condvar::new(),
        }
    }

    pub fn registry(&self) -> MutexGuard<'_, Registry> {
        sync::lock(&self.registry)
    }

    pub fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        sync::lock(&self.lifecycle)
    }

    pub fn wait<'a>(&self, guard: MutexGuard<'a, Lifecycle>) -> MutexGuard<'a, Lifecycle> {
        sync::wait(&self.lifecycle_changed, guard)
    }

    pub fn notify(&self) {
        self.lifecycle_changed.notify_all();
    }

    /// Whether the current thread is this context's router thread
    pub fn on_router_thread(&self, lifecycle: &Lifecycle) -> bool {
        lifecycle.router_thread == Some(std::thread::current().id())
    }
}
