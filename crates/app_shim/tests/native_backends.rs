//! Framework behaviour over a backend that reuses handles and can lose its
//! event source

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use app_shim::config::{FatalPolicy, FrameworkConfig, LogConfig};
use app_shim::platform::{
    BackendFactory, NativeBackend, NativeEvent, NativeHandle, NativeWindowDesc, PlatformError,
    PlatformResult,
};
use app_shim::window::WindowDesc;
use app_shim::{Framework, FrameworkError};

#[derive(Default)]
struct NativeState {
    free: Vec<NativeHandle>,
    next: u64,
    fail_pump: bool,
}

/// Window system that hands freed handles out again, most recent first
#[derive(Clone, Default)]
struct RecyclingSystem {
    state: Arc<Mutex<NativeState>>,
}

impl RecyclingSystem {
    fn factory(&self) -> BackendFactory {
        let system = self.clone();
        Arc::new(move || {
            Ok(Box::new(RecyclingBackend {
                system: system.clone(),
            }) as Box<dyn NativeBackend>)
        })
    }

    fn fail_pump(&self, fail: bool) {
        self.state.lock().unwrap().fail_pump = fail;
    }
}

struct RecyclingBackend {
    system: RecyclingSystem,
}

impl NativeBackend for RecyclingBackend {
    fn name(&self) -> &'static str {
        "recycling"
    }

    fn create_window(&mut self, _desc: &NativeWindowDesc) -> PlatformResult<NativeHandle> {
        let mut state = self.system.state.lock().unwrap();
        if let Some(handle) = state.free.pop() {
            return Ok(handle);
        }
        state.next += 1;
        Ok(NativeHandle(state.next))
    }

    fn destroy_window(&mut self, window: NativeHandle) -> PlatformResult<()> {
        self.system.state.lock().unwrap().free.push(window);
        Ok(())
    }

    fn pump(&mut self, timeout: Duration, _sink: &mut Vec<NativeEvent>) -> PlatformResult<()> {
        if self.system.state.lock().unwrap().fail_pump {
            return Err(PlatformError::Disconnected);
        }
        std::thread::sleep(timeout);
        Ok(())
    }
}

fn framework(system: &RecyclingSystem) -> Framework {
    let config = FrameworkConfig::new("backend tests")
        .with_fatal_policy(FatalPolicy::Propagate)
        .with_logging(LogConfig::default().with_enabled(false));
    Framework::new(config, system.factory()).unwrap()
}

#[test]
fn test_cascade_ignores_reused_handle_of_destroyed_dependent() {
    let system = RecyclingSystem::default();
    let framework = framework(&system);

    let tool = framework.create_window(WindowDesc::new("tool")).unwrap();
    let main = framework
        .create_window(WindowDesc::new("main").with_dependent(tool))
        .unwrap();
    let tool_native = framework.window(tool).unwrap().native;

    framework.destroy_window(tool).unwrap();
    let unrelated = framework.create_window(WindowDesc::new("unrelated")).unwrap();
    assert_eq!(framework.window(unrelated).unwrap().native, tool_native);

    framework.destroy_window(main).unwrap();

    assert!(framework.is_valid(unrelated));
    assert_eq!(framework.window_ids(), vec![unrelated]);
    assert_eq!(framework.open_windows(), 1);
}

#[test]
fn test_pump_failure_is_reported_to_callers() {
    let system = RecyclingSystem::default();
    let framework = framework(&system);
    let closed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&closed);

    let id = framework
        .create_window(WindowDesc::new("main").on_close(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }))
        .unwrap();
    system.fail_pump(true);

    let result = framework.wait_until_no_windows();
    assert!(matches!(result, Err(FrameworkError::Platform(PlatformError::Disconnected))));
    assert_eq!(closed.load(Ordering::SeqCst), 1);
    assert!(framework.window(id).is_none());

    let next = framework.create_window(WindowDesc::new("next"));
    assert!(matches!(next, Err(FrameworkError::Platform(PlatformError::Disconnected))));

    system.fail_pump(false);
    let again = framework.create_window(WindowDesc::new("again")).unwrap();
    assert!(again > id);
    assert!(framework.is_valid(again));
}
