//! Window lifecycle controller
//!
//! [`Framework`] is the explicitly owned context every API call goes
//! through. It validates requests, starts the event router on demand,
//! marshals work to it as typed commands and waits for the answers.
//!
//! # Creation protocol
//! The first creation on an idle framework spawns the router thread and
//! blocks on a condition variable until the router reports that it entered
//! its loop. Every creation (first or not) then waits for the router's
//! reply, so a returned id is always immediately queryable.
//!
//! # Lifetime
//! When the last window is destroyed the router thread ends and
//! [`Framework::windows_remain`] turns false; the next creation starts a
//! fresh router. Ids keep increasing across restarts.

use crossbeam_channel::{bounded, Receiver};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::FrameworkConfig;
use crate::error::{FrameworkError, FrameworkResult};
use crate::fatal;
use crate::foundation::logging::{self, LoggingError};
use crate::foundation::sync;
use crate::input::{InputState, KeyCode};
use crate::platform::{BackendFactory, HeadlessController, NativeHandle, SystemInfo};
use crate::render::GpuContext;
use crate::router::{self, Lifecycle, RouterCommand, RouterPhase, Shared};
use crate::window::{WindowDesc, WindowId, WindowRecord, WindowState};

/// Application framework context
///
/// Owns one window registry, one input state and (while windows exist) one
/// event router thread. Share it between threads with `Arc<Framework>`;
/// dropping it shuts the router down.
pub struct Framework {
    shared: Arc<Shared>,
    renderer: Mutex<Option<Arc<GpuContext>>>,
}

impl Framework {
    /// Create a framework over a native backend
    pub fn new(config: FrameworkConfig, factory: BackendFactory) -> FrameworkResult<Self> {
        config.validate()?;
        match logging::init_with(&config.logging) {
            Ok(_) | Err(LoggingError::AlreadyInitialized) => {}
            Err(error) => return Err(error.into()),
        }
        log::debug!("Framework '{}' created", config.application_name);
        Ok(Self {
            shared: Arc::new(Shared::new(config, factory)),
            renderer: Mutex::new(None),
        })
    }

    /// Create a framework over the headless window system
    pub fn headless(config: FrameworkConfig) -> FrameworkResult<(Self, HeadlessController)> {
        let controller = HeadlessController::new();
        let framework = Self::new(config, controller.factory())?;
        Ok((framework, controller))
    }

    /// Create a framework over GLFW windows
    #[cfg(feature = "glfw-backend")]
    pub fn glfw(config: FrameworkConfig) -> FrameworkResult<Self> {
        Self::new(config, crate::platform::glfw_backend::GlfwBackend::factory())
    }

    /// Active configuration
    pub fn config(&self) -> &FrameworkConfig {
        &self.shared.config
    }

    // ----- lifecycle -------------------------------------------------------

    /// Create a window and return its handle
    ///
    /// # Errors
    /// - [`FrameworkError::InvalidParameter`] for an empty name or a
    ///   non-positive size
    /// - [`FrameworkError::InvalidHandle`] if a listed dependent is not live
    /// - [`FrameworkError::HandleSpaceExhausted`] once 32767 handles have
    ///   been issued; the window is still opened but cannot be addressed
    pub fn create_window(&self, desc: WindowDesc) -> FrameworkResult<WindowId> {
        if let Err(reason) = desc.validate() {
            log::warn!("Rejected window '{}': {reason}", desc.name);
            return Err(FrameworkError::InvalidParameter(reason));
        }
        for &dependent in &desc.dependents {
            self.expect_live(dependent)?;
        }

        let (reply, answer) = bounded(1);
        self.post(RouterCommand::CreateWindow { desc, reply })?;
        Self::await_reply(&answer)
    }

    /// Destroy a window (and, by cascade, its dependents)
    pub fn destroy_window(&self, id: WindowId) -> FrameworkResult<()> {
        self.expect_live(id)?;
        let (reply, answer) = bounded(1);
        self.post(RouterCommand::DestroyWindow { id, reply })?;
        Self::await_reply(&answer)
    }

    /// Ask a window to close, honouring its close-attempt hook
    ///
    /// Returns whether the window was destroyed.
    pub fn request_close(&self, id: WindowId) -> FrameworkResult<bool> {
        self.expect_live(id)?;
        let (reply, answer) = bounded(1);
        self.post(RouterCommand::RequestClose { id, reply })?;
        Self::await_reply(&answer)
    }

    /// Make `child` get destroyed whenever `parent` is
    pub fn add_dependent(&self, parent: WindowId, child: WindowId) -> FrameworkResult<()> {
        self.expect_live(parent)?;
        self.expect_live(child)?;
        let (reply, answer) = bounded(1);
        self.post(RouterCommand::AddDependent { parent, child, reply })?;
        Self::await_reply(&answer)
    }

    /// Destroy every window; returns how many were destroyed
    pub fn destroy_all(&self) -> FrameworkResult<usize> {
        if !self.windows_remain() {
            return Ok(0);
        }
        let (reply, answer) = bounded(1);
        self.post(RouterCommand::DestroyAll { reply })?;
        Self::await_reply(&answer)
    }

    /// Block until no windows remain
    ///
    /// # Errors
    /// [`FrameworkError::Platform`] if the windows went away because the
    /// native event pump failed rather than being closed.
    pub fn wait_until_no_windows(&self) -> FrameworkResult<()> {
        let mut life = self.shared.lifecycle();
        if self.shared.on_router_thread(&life) {
            return Err(FrameworkError::ReentrantCall);
        }
        while life.open_windows > 0 {
            life = self.shared.wait(life);
        }
        match &life.backend_error {
            Some(error) => Err(error.clone().into()),
            None => Ok(()),
        }
    }

    /// Destroy every window, stop the router and wait for it to finish
    ///
    /// Native resources are released by the router thread before this
    /// returns. Later calls that need the router fail with
    /// [`FrameworkError::ShutDown`]. Calling this twice is harmless.
    pub fn shutdown(&self) {
        let mut life = self.shared.lifecycle();
        if self.shared.on_router_thread(&life) {
            log::error!("Framework::shutdown called from the event router thread; ignored");
            return;
        }
        life.shut_down = true;

        while matches!(life.phase, RouterPhase::Starting | RouterPhase::Stopping) {
            life = self.shared.wait(life);
        }
        if life.phase == RouterPhase::Running {
            let sent = life
                .commands
                .as_ref()
                .map_or(false, |commands| commands.send(RouterCommand::Shutdown).is_ok());
            if sent {
                life.in_flight += 1;
            }
            life.wake_router();
            while life.phase != RouterPhase::Idle {
                life = self.shared.wait(life);
            }
        }

        let join = life.join.take();
        drop(life);
        if let Some(handle) = join {
            if handle.join().is_err() {
                log::error!("Event router thread panicked");
            }
        }
    }

    // ----- queries ---------------------------------------------------------

    /// Snapshot of a window's state
    pub fn window(&self, id: WindowId) -> Option<WindowState> {
        self.shared.registry().lookup(id).map(|record| record.state.clone())
    }

    /// Public handle of a native window
    pub fn find_native(&self, native: NativeHandle) -> Option<WindowId> {
        self.shared
            .registry()
            .lookup_native(native)
            .filter(|record| record.is_addressable())
            .map(WindowRecord::id)
    }

    /// Handles of all live addressable windows, ascending
    pub fn window_ids(&self) -> Vec<WindowId> {
        self.shared.registry().ids()
    }

    /// Whether the handle names a live window
    pub fn is_valid(&self, id: WindowId) -> bool {
        self.query(id, |state| state.valid)
    }

    /// Whether the window has keyboard focus
    pub fn has_focus(&self, id: WindowId) -> bool {
        self.query(id, |state| state.focused)
    }

    /// Whether the window is shown
    pub fn is_visible(&self, id: WindowId) -> bool {
        self.query(id, |state| state.visible)
    }

    /// Whether the cursor is inside the window's client area
    pub fn is_mouse_inside(&self, id: WindowId) -> bool {
        self.query(id, |state| state.mouse_inside)
    }

    /// Number of open native windows, including unaddressable ones
    pub fn open_windows(&self) -> usize {
        self.shared.lifecycle().open_windows
    }

    /// Whether any window is open
    pub fn windows_remain(&self) -> bool {
        self.open_windows() > 0
    }

    /// Whether a router thread is currently accepting commands
    pub fn is_router_running(&self) -> bool {
        self.shared.lifecycle().phase == RouterPhase::Running
    }

    // ----- input -----------------------------------------------------------

    /// Shared input state
    pub fn input(&self) -> &InputState {
        &self.shared.input
    }

    /// Whether a key is held
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.shared.input.is_key_pressed(key)
    }

    /// Start or stop collecting character events
    pub fn enable_text_input(&self, enabled: bool) {
        self.shared.input.set_text_input_enabled(enabled);
    }

    /// Clear collected text and reset the write cursor
    pub fn clear_text_input(&self) {
        self.shared.input.clear_text();
    }

    // ----- platform --------------------------------------------------------

    /// Bootstrap the GPU once; later calls return the same context
    pub fn bootstrap_renderer(&self) -> FrameworkResult<Arc<GpuContext>> {
        let mut renderer = sync::lock(&self.renderer);
        if let Some(context) = renderer.as_ref() {
            return Ok(Arc::clone(context));
        }

        let context = match GpuContext::bootstrap(&self.shared.config.renderer) {
            Ok(context) => Arc::new(context),
            Err(error) => return fatal::escalate(self.shared.config.fatal_policy, error.into()),
        };
        *renderer = Some(Arc::clone(&context));
        Ok(context)
    }

    /// The renderer context, if it was bootstrapped
    pub fn renderer(&self) -> Option<Arc<GpuContext>> {
        sync::lock(&self.renderer).clone()
    }

    /// Query host CPU and memory
    pub fn system_info(&self) -> SystemInfo {
        SystemInfo::query()
    }

    // ----- internals -------------------------------------------------------

    fn query(&self, id: WindowId, read: impl FnOnce(&WindowState) -> bool) -> bool {
        self.shared
            .registry()
            .lookup(id)
            .map_or(false, |record| read(&record.state))
    }

    fn expect_live(&self, id: WindowId) -> FrameworkResult<()> {
        if self.is_valid(id) {
            Ok(())
        } else {
            log::warn!("Invalid window handle {id}");
            Err(FrameworkError::InvalidHandle(id))
        }
    }

    fn await_reply<T>(answer: &Receiver<FrameworkResult<T>>) -> FrameworkResult<T> {
        answer.recv().map_err(|_| FrameworkError::RouterUnavailable)?
    }

    /// Send a command to the router, starting it if needed
    ///
    /// A pending pump failure is reported (once) instead of sending; the
    /// command after that starts a fresh router.
    fn post(&self, command: RouterCommand) -> FrameworkResult<()> {
        let mut life = self.shared.lifecycle();
        if life.shut_down {
            return Err(FrameworkError::ShutDown);
        }
        if self.shared.on_router_thread(&life) {
            return Err(FrameworkError::ReentrantCall);
        }
        if let Some(error) = life.backend_error.take() {
            return Err(error.into());
        }

        let mut life = self.ensure_router(life)?;
        let commands = life.commands.as_ref().ok_or(FrameworkError::RouterUnavailable)?;
        commands
            .send(command)
            .map_err(|_| FrameworkError::RouterUnavailable)?;
        life.in_flight += 1;
        life.wake_router();
        Ok(())
    }

    /// Return with the router in `Running`, spawning it if idle
    fn ensure_router<'a>(
        &'a self,
        mut life: MutexGuard<'a, Lifecycle>,
    ) -> FrameworkResult<MutexGuard<'a, Lifecycle>> {
        let policy = self.shared.config.fatal_policy;
        loop {
            match life.phase {
                RouterPhase::Running => return Ok(life),
                RouterPhase::Starting | RouterPhase::Stopping => life = self.shared.wait(life),
                RouterPhase::Idle => {
                    if let Some(previous) = life.join.take() {
                        // It already set Idle and released the lock; only the return is left
                        let _ = previous.join();
                    }
                    if let Err(error) = router::spawn(&self.shared, &mut life) {
                        return fatal::escalate(policy, error.into());
                    }
                    while life.phase == RouterPhase::Starting {
                        life = self.shared.wait(life);
                    }
                    if let Some(error) = life.startup_error.take() {
                        return fatal::escalate(policy, error.into());
                    }
                }
            }
        }
    }
}

impl Drop for Framework {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FatalPolicy;
    use crate::platform::{NativeBackend, PlatformError, PlatformResult};

    fn config() -> FrameworkConfig {
        FrameworkConfig::new("framework tests").with_fatal_policy(FatalPolicy::Propagate)
    }

    #[test]
    fn test_invalid_desc_never_starts_router() {
        let (framework, _controller) = Framework::headless(config()).unwrap();
        let result = framework.create_window(WindowDesc::new(""));
        assert!(matches!(result, Err(FrameworkError::InvalidParameter(_))));
        assert!(!framework.is_router_running());
    }

    #[test]
    fn test_bad_handle_is_rejected_without_router() {
        let (framework, _controller) = Framework::headless(config()).unwrap();
        let stale = WindowId::from_raw(9).unwrap();
        assert!(matches!(framework.destroy_window(stale), Err(FrameworkError::InvalidHandle(id)) if id == stale));
        assert!(matches!(framework.request_close(WindowId::NONE), Err(FrameworkError::InvalidHandle(_))));
        assert_eq!(framework.destroy_all().unwrap(), 0);
        assert!(!framework.is_router_running());
    }

    #[test]
    fn test_backend_startup_failure_propagates() {
        let factory: BackendFactory = Arc::new(|| -> PlatformResult<Box<dyn NativeBackend>> {
            Err(PlatformError::InitializationFailed("no display".into()))
        });
        let framework = Framework::new(config(), factory).unwrap();
        let result = framework.create_window(WindowDesc::new("main"));
        assert!(matches!(result, Err(FrameworkError::Platform(PlatformError::InitializationFailed(_)))));
        assert!(!framework.is_router_running());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = Framework::headless(config().with_poll_interval_ms(0));
        assert!(matches!(result, Err(FrameworkError::Config(_))));
    }

    #[test]
    fn test_calls_after_shutdown_fail() {
        let (framework, _controller) = Framework::headless(config()).unwrap();
        framework.create_window(WindowDesc::new("main")).unwrap();
        framework.shutdown();
        assert!(!framework.windows_remain());
        assert!(matches!(framework.create_window(WindowDesc::new("late")), Err(FrameworkError::ShutDown)));
        framework.shutdown();
    }
}
