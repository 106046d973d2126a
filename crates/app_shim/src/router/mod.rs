//! Event router
//!
//! One router thread per framework context owns the native backend. Each
//! loop iteration drains the command channel, pumps the backend for up to
//! the configured poll interval and handles every native event it got.
//! All registry and input mutation happens here, so nothing else ever races
//! the router on window state.
//!
//! The thread exits when the last window is destroyed (or on shutdown) and
//! is started again by the next window creation.

mod command;
mod lifecycle;

pub(crate) use command::RouterCommand;
pub(crate) use lifecycle::{Lifecycle, RouterPhase, Shared};

use crossbeam_channel::{unbounded, Receiver};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::FatalPolicy;
use crate::error::{FrameworkError, FrameworkResult};
use crate::fatal;
use crate::platform::{NativeBackend, NativeEvent, NativeEventKind, NativeHandle, NativeWindowDesc, PlatformError};
use crate::window::{WindowDesc, WindowId, WindowRecord, WindowState};

/// Start a router thread; the caller holds the lifecycle lock
///
/// Returns once the thread is spawned, with the phase set to `Starting`.
/// The thread moves the phase to `Running` (or back to `Idle` with a
/// startup error) and signals the condition variable.
pub(crate) fn spawn(shared: &Arc<Shared>, life: &mut Lifecycle) -> Result<(), PlatformError> {
    let (sender, receiver) = unbounded();
    life.generation += 1;
    let generation = life.generation;

    let thread_shared = Arc::clone(shared);
    let handle = thread::Builder::new()
        .name(format!("event-router-{generation}"))
        .spawn(move || run(thread_shared, receiver, generation))
        .map_err(|e| PlatformError::ThreadSpawn(e.to_string()))?;

    life.phase = RouterPhase::Starting;
    life.commands = Some(sender);
    life.join = Some(handle);
    Ok(())
}

fn run(shared: Arc<Shared>, commands: Receiver<RouterCommand>, generation: u64) {
    let backend = match (shared.factory)() {
        Ok(backend) => backend,
        Err(error) => {
            log::error!("Event router {generation} failed to start: {error}");
            let mut life = shared.lifecycle();
            life.startup_error = Some(error);
            life.phase = RouterPhase::Idle;
            life.commands = None;
            shared.notify();
            return;
        }
    };

    {
        let mut life = shared.lifecycle();
        life.phase = RouterPhase::Running;
        life.waker = backend.waker();
        life.router_thread = Some(thread::current().id());
        shared.notify();
    }
    log::info!("Event router {generation} running ({} backend)", backend.name());

    let mut router = Router {
        poll_interval: shared.config.router.poll_interval(),
        policy: shared.config.fatal_policy,
        shared: Arc::clone(&shared),
        backend,
        commands,
        events: Vec::new(),
    };
    router.run();
    // Backend (and with it every native resource) goes away here, before Idle
    drop(router);

    let mut life = shared.lifecycle();
    life.phase = RouterPhase::Idle;
    life.router_thread = None;
    life.waker = None;
    shared.notify();
    log::info!("Event router {generation} stopped");
}

struct Router {
    shared: Arc<Shared>,
    backend: Box<dyn NativeBackend>,
    commands: Receiver<RouterCommand>,
    events: Vec<NativeEvent>,
    poll_interval: Duration,
    policy: FatalPolicy,
}

impl Router {
    fn run(&mut self) {
        loop {
            while let Ok(command) = self.commands.try_recv() {
                self.execute(command);
                let mut life = self.shared.lifecycle();
                life.in_flight = life.in_flight.saturating_sub(1);
            }
            if self.should_exit() {
                break;
            }

            let mut events = std::mem::take(&mut self.events);
            if let Err(error) = self.backend.pump(self.poll_interval, &mut events) {
                self.abandon(&error);
                // Callers read the failure from the lifecycle; Terminate exits here
                let _ = fatal::escalate::<()>(self.policy, error.into());
                break;
            }
            for event in events.drain(..) {
                self.handle_event(event);
            }
            self.events = events;

            if self.should_exit() {
                break;
            }
        }
    }

    /// Decide, under the lifecycle lock, whether the loop is done
    fn should_exit(&self) -> bool {
        let mut life = self.shared.lifecycle();
        if life.open_windows > 0 {
            life.quit_pending = false;
        }

        let done = life.in_flight == 0
            && (life.stop_requested || (life.quit_pending && life.open_windows == 0));
        if done {
            life.phase = RouterPhase::Stopping;
            life.commands = None;
            life.waker = None;
            life.quit_pending = false;
            life.stop_requested = false;
            self.shared.notify();
        }
        done
    }

    /// The native event source died; forget every window
    ///
    /// Close hooks still run, best effort. The failure is kept for callers
    /// blocked in `wait_until_no_windows` and for the next command.
    fn abandon(&mut self, error: &PlatformError) {
        let abandoned: Vec<WindowRecord> = {
            let mut registry = self.shared.registry();
            let natives = registry.native_handles();
            natives.into_iter().filter_map(|native| registry.erase(native)).collect()
        };
        log::error!("Event router abandoning {} windows: {error}", abandoned.len());

        for mut record in abandoned {
            record.state.valid = false;
            if let Some(on_close) = record.on_close.take() {
                let id = record.id();
                invoke_callback("close", id, || on_close(id));
            }
        }

        let mut life = self.shared.lifecycle();
        life.backend_error = Some(error.clone());
        life.open_windows = 0;
        life.in_flight = 0;
        life.phase = RouterPhase::Stopping;
        life.commands = None;
        life.waker = None;
        self.shared.notify();
    }

    fn execute(&mut self, command: RouterCommand) {
        log::trace!("Router executing {}", command.name());
        match command {
            RouterCommand::CreateWindow { desc, reply } => {
                let _ = reply.send(self.create_window(desc));
            }
            RouterCommand::DestroyWindow { id, reply } => {
                let result = self.native_of(id).and_then(|native| self.destroy(native));
                let _ = reply.send(result);
            }
            RouterCommand::RequestClose { id, reply } => {
                let result = self.native_of(id).map(|native| self.close_requested(native));
                let _ = reply.send(result);
            }
            RouterCommand::AddDependent { parent, child, reply } => {
                let _ = reply.send(self.add_dependent(parent, child));
            }
            RouterCommand::DestroyAll { reply } => {
                let _ = reply.send(Ok(self.destroy_all()));
            }
            RouterCommand::Shutdown => {
                let destroyed = self.destroy_all();
                log::debug!("Shutdown destroyed {destroyed} windows");
                self.shared.lifecycle().stop_requested = true;
            }
        }
    }

    fn native_of(&self, id: WindowId) -> FrameworkResult<NativeHandle> {
        self.shared
            .registry()
            .lookup(id)
            .filter(|record| record.state.valid)
            .map(WindowRecord::native)
            .ok_or(FrameworkError::InvalidHandle(id))
    }

    fn create_window(&mut self, desc: WindowDesc) -> FrameworkResult<WindowId> {
        let dependents = desc
            .dependents
            .iter()
            .map(|&id| self.native_of(id))
            .collect::<FrameworkResult<Vec<_>>>()?;

        let native_desc = NativeWindowDesc {
            title: desc.name.clone(),
            position: desc.position,
            size: desc.size,
            visible: desc.visible,
        };
        let native = match self.backend.create_window(&native_desc) {
            Ok(native) => native,
            Err(error) => return fatal::escalate(self.policy, error.into()),
        };

        let result = {
            let mut registry = self.shared.registry();
            let (id, result) = match registry.allocate_id() {
                Ok(id) => (id, Ok(id)),
                Err(_) => (WindowId::NONE, Err(FrameworkError::HandleSpaceExhausted)),
            };
            let record = WindowRecord::new(id, native, desc, dependents);
            if let Err(error) = registry.insert(record) {
                drop(registry);
                let _ = self.backend.destroy_window(native);
                return fatal::escalate(self.policy, error.into());
            }
            result
        };

        self.shared.lifecycle().open_windows += 1;
        match &result {
            Ok(id) => log::info!("Created {id} '{}' ({native})", native_desc.title),
            Err(_) => log::warn!(
                "Window '{}' ({native}) opened without a handle: handle space exhausted",
                native_desc.title
            ),
        }
        result
    }

    fn add_dependent(&mut self, parent: WindowId, child: WindowId) -> FrameworkResult<()> {
        if parent == child {
            return Err(FrameworkError::InvalidParameter(format!(
                "{parent} cannot depend on itself"
            )));
        }
        let child_native = self.native_of(child)?;

        let mut registry = self.shared.registry();
        let record = registry
            .lookup_mut(parent)
            .filter(|record| record.state.valid)
            .ok_or(FrameworkError::InvalidHandle(parent))?;
        if record.add_dependent(child_native) {
            log::debug!("{child} now depends on {parent}");
        }
        Ok(())
    }

    /// Close request from the window system or a caller
    ///
    /// Returns whether the window was destroyed.
    fn close_requested(&mut self, native: NativeHandle) -> bool {
        let (id, hook) = {
            let registry = self.shared.registry();
            match registry.lookup_native(native) {
                Some(record) if record.state.valid && !record.destroying => {
                    (record.id(), record.on_close_attempt.clone())
                }
                _ => return false,
            }
        };

        let allow = match hook {
            Some(hook) => invoke_callback("close-attempt", id, || hook(id)).unwrap_or(false),
            None => true,
        };
        if !allow {
            log::debug!("Close of {id} refused");
            self.backend.cancel_close(native);
            return false;
        }

        match self.destroy(native) {
            Ok(()) => true,
            Err(error) => {
                log::error!("Failed to destroy {id} after close request: {error}");
                false
            }
        }
    }

    /// Destroy a native window and run the destroy-confirmed path
    fn destroy(&mut self, native: NativeHandle) -> FrameworkResult<()> {
        {
            let mut registry = self.shared.registry();
            match registry.lookup_native_mut(native) {
                Some(record) if !record.destroying => record.destroying = true,
                // Unknown, or already being torn down further up a cascade
                _ => return Ok(()),
            }
        }

        if let Err(error) = self.backend.destroy_window(native) {
            if let Some(record) = self.shared.registry().lookup_native_mut(native) {
                record.destroying = false;
            }
            return fatal::escalate(self.policy, error.into());
        }

        self.destroy_confirmed(native);
        Ok(())
    }

    /// The native window is gone: close hook, cascade, erase, count
    fn destroy_confirmed(&mut self, native: NativeHandle) {
        let (id, on_close, dependents) = {
            let mut registry = self.shared.registry();
            let Some(record) = registry.lookup_native_mut(native) else {
                return;
            };
            if !record.state.valid {
                return;
            }
            record.state.valid = false;
            record.destroying = true;
            (record.id(), record.on_close.clone(), record.dependents.clone())
        };

        if let Some(on_close) = on_close {
            invoke_callback("close", id, || on_close(id));
        }

        for dependent in dependents {
            if let Err(error) = self.destroy(dependent) {
                log::error!("Failed to destroy dependent {dependent} of {id}: {error}");
            }
        }

        if self.shared.registry().erase(native).is_none() {
            return;
        }

        let mut life = self.shared.lifecycle();
        life.open_windows = life.open_windows.saturating_sub(1);
        if life.open_windows == 0 {
            life.quit_pending = true;
            log::info!("No windows remain");
        }
        self.shared.notify();
        log::debug!("Destroyed {id} ({native})");
    }

    fn destroy_all(&mut self) -> usize {
        let (before, natives) = {
            let registry = self.shared.registry();
            (registry.len(), registry.native_handles())
        };
        for native in natives {
            if let Err(error) = self.destroy(native) {
                log::error!("Failed to destroy {native}: {error}");
            }
        }
        before.saturating_sub(self.shared.registry().len())
    }

    fn update(&self, native: NativeHandle, apply: impl FnOnce(&mut WindowState)) {
        if let Some(record) = self.shared.registry().lookup_native_mut(native) {
            apply(&mut record.state);
        }
    }

    /// The cursor is over `native`, and so over no other window
    fn hover(&self, native: NativeHandle) {
        for record in self.shared.registry().iter_mut() {
            record.state.mouse_inside = record.native() == native;
        }
    }

    fn handle_event(&mut self, event: NativeEvent) {
        let NativeEvent { window, kind } = event;

        if kind != NativeEventKind::Destroyed && self.shared.registry().lookup_native(window).is_none() {
            log::trace!("Dropping {kind:?} for unknown {window}");
            return;
        }

        let shared = Arc::clone(&self.shared);
        let input = &shared.input;
        match kind {
            NativeEventKind::CloseRequested => {
                self.close_requested(window);
            }
            NativeEventKind::Destroyed => self.destroy_confirmed(window),
            NativeEventKind::KeyDown { key, repeat } => {
                if input.key_down(key, repeat) {
                    log::trace!("{key} down");
                }
            }
            NativeEventKind::KeyUp { key } => {
                input.key_up(key);
            }
            NativeEventKind::Character(c) => {
                input.character(c);
            }
            NativeEventKind::MouseMoved { x, y } => {
                input.mouse_moved(x, y);
                self.hover(window);
            }
            NativeEventKind::MouseButton { button, pressed } => input.mouse_button(button, pressed),
            NativeEventKind::MouseWheel(delta) => input.mouse_wheel(delta),
            NativeEventKind::MouseEntered => self.hover(window),
            NativeEventKind::MouseLeft => self.update(window, |state| state.mouse_inside = false),
            NativeEventKind::Focus(focused) => {
                self.update(window, |state| state.focused = focused);
                if !focused {
                    input.release_all();
                }
            }
            NativeEventKind::Visibility(visible) => self.update(window, |state| state.visible = visible),
            NativeEventKind::Minimized(minimized) => {
                self.update(window, |state| state.minimized = minimized);
            }
            NativeEventKind::Moved { x, y } => self.update(window, |state| state.position = (x, y)),
            NativeEventKind::Resized { width, height } => {
                self.update(window, |state| state.size = (width, height));
            }
        }
    }
}

/// Run a user callback, containing any panic it raises
fn invoke_callback<R>(what: &str, id: WindowId, callback: impl FnOnce() -> R) -> Option<R> {
    match panic::catch_unwind(AssertUnwindSafe(callback)) {
        Ok(value) => Some(value),
        Err(payload) => {
            log::error!("{what} callback for {id} panicked: {}", panic_message(payload.as_ref()));
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
