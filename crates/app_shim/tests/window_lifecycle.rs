//! Window lifecycle through the public framework API, on the headless backend

use std::sync::{Arc, Mutex};

use app_shim::config::{FatalPolicy, FrameworkConfig, LogConfig};
use app_shim::platform::{HeadlessController, PlatformError};
use app_shim::window::{WindowDesc, WindowId};
use app_shim::{Framework, FrameworkError};

fn framework() -> (Framework, HeadlessController) {
    let config = FrameworkConfig::new("lifecycle tests")
        .with_fatal_policy(FatalPolicy::Propagate)
        .with_logging(LogConfig::default().with_enabled(false));
    Framework::headless(config).unwrap()
}

#[test]
fn test_ids_increase_and_lookups_agree() {
    let (framework, controller) = framework();

    let first = framework.create_window(WindowDesc::new("first")).unwrap();
    let second = framework.create_window(WindowDesc::new("second").with_size(320, 200)).unwrap();
    assert_eq!(first, WindowId::MIN);
    assert!(second > first);

    let state = framework.window(second).unwrap();
    assert_eq!(state.name, "second");
    assert_eq!(state.size, (320, 200));
    assert!(state.valid);
    assert_eq!(framework.find_native(state.native), Some(second));
    assert_eq!(controller.title_of(state.native).as_deref(), Some("second"));
    assert_eq!(framework.window_ids(), vec![first, second]);
    assert_eq!(framework.open_windows(), 2);
}

#[test]
fn test_destroyed_window_disappears_from_both_lookups() {
    let (framework, controller) = framework();
    let id = framework.create_window(WindowDesc::new("doomed")).unwrap();
    let native = framework.window(id).unwrap().native;

    framework.destroy_window(id).unwrap();

    assert!(framework.window(id).is_none());
    assert_eq!(framework.find_native(native), None);
    assert!(!framework.is_valid(id));
    assert!(controller.live_windows().is_empty());
    assert!(matches!(framework.destroy_window(id), Err(FrameworkError::InvalidHandle(_))));
}

#[test]
fn test_dependents_close_with_parent() {
    let (framework, _controller) = framework();
    let closed = Arc::new(Mutex::new(Vec::new()));
    let log = |closed: &Arc<Mutex<Vec<WindowId>>>| {
        let closed = Arc::clone(closed);
        move |id| closed.lock().unwrap().push(id)
    };

    let tool = framework.create_window(WindowDesc::new("tool").on_close(log(&closed))).unwrap();
    let palette = framework.create_window(WindowDesc::new("palette").on_close(log(&closed))).unwrap();
    let main = framework
        .create_window(WindowDesc::new("main").with_dependent(tool).on_close(log(&closed)))
        .unwrap();
    framework.add_dependent(main, palette).unwrap();
    let bystander = framework.create_window(WindowDesc::new("bystander")).unwrap();

    framework.destroy_window(main).unwrap();

    assert_eq!(*closed.lock().unwrap(), vec![main, tool, palette]);
    assert_eq!(framework.window_ids(), vec![bystander]);
    assert_eq!(framework.open_windows(), 1);
}

#[test]
fn test_refused_close_keeps_window() {
    let (framework, controller) = framework();
    let id = framework
        .create_window(WindowDesc::new("sticky").on_close_attempt(|_| false))
        .unwrap();
    let native = framework.window(id).unwrap().native;

    assert!(!framework.request_close(id).unwrap());
    controller.click_close(native);
    assert!(controller.flush());

    assert!(framework.is_valid(id));
    assert_eq!(framework.open_windows(), 1);
}

#[test]
fn test_panicking_close_hook_refuses() {
    let (framework, _controller) = framework();
    let id = framework
        .create_window(WindowDesc::new("fragile").on_close_attempt(|_| panic!("hook failure")))
        .unwrap();

    assert!(!framework.request_close(id).unwrap());
    assert!(framework.is_valid(id));
}

#[test]
fn test_last_close_ends_router_and_next_create_restarts_it() {
    let (framework, controller) = framework();
    let first = framework.create_window(WindowDesc::new("only")).unwrap();
    assert!(framework.windows_remain());

    controller.click_close(framework.window(first).unwrap().native);
    framework.wait_until_no_windows().unwrap();
    assert!(!framework.windows_remain());

    let second = framework.create_window(WindowDesc::new("again")).unwrap();
    assert!(second > first);
    assert!(framework.is_router_running());
    assert!(framework.windows_remain());
}

#[test]
fn test_external_destroy_is_confirmed() {
    let (framework, controller) = framework();
    let closed = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&closed);
    let id = framework
        .create_window(WindowDesc::new("external").on_close(move |_| *counter.lock().unwrap() += 1))
        .unwrap();

    controller.destroy_externally(framework.window(id).unwrap().native);
    framework.wait_until_no_windows().unwrap();

    assert_eq!(*closed.lock().unwrap(), 1);
    assert!(framework.window(id).is_none());
}

#[test]
fn test_native_create_failure_is_reported() {
    let (framework, controller) = framework();
    controller.fail_next_creates(1);

    let result = framework.create_window(WindowDesc::new("broken"));
    assert!(matches!(result, Err(FrameworkError::Platform(PlatformError::WindowCreationFailed(_)))));
    assert_eq!(framework.open_windows(), 0);

    let id = framework.create_window(WindowDesc::new("fine")).unwrap();
    assert!(framework.is_valid(id));
}

#[test]
fn test_invalid_parameters() {
    let (framework, _controller) = framework();
    assert!(matches!(
        framework.create_window(WindowDesc::new("flat").with_size(0, 10)),
        Err(FrameworkError::InvalidParameter(_))
    ));

    let stale = WindowId::from_raw(77).unwrap();
    assert!(matches!(
        framework.create_window(WindowDesc::new("orphan").with_dependent(stale)),
        Err(FrameworkError::InvalidHandle(id)) if id == stale
    ));

    let id = framework.create_window(WindowDesc::new("self")).unwrap();
    assert!(matches!(framework.add_dependent(id, id), Err(FrameworkError::InvalidParameter(_))));
}

#[test]
fn test_handle_space_exhaustion() {
    let (framework, _controller) = framework();
    for expected in 1..=i16::MAX {
        let id = framework.create_window(WindowDesc::new("w").with_visible(false)).unwrap();
        assert_eq!(id.raw(), expected);
    }

    let overflow = framework.create_window(WindowDesc::new("overflow"));
    assert!(matches!(overflow, Err(FrameworkError::HandleSpaceExhausted)));
    assert_eq!(framework.open_windows(), 32_768);
    assert_eq!(framework.window_ids().len(), 32_767);

    assert_eq!(framework.destroy_all().unwrap(), 32_768);
    assert!(!framework.windows_remain());
}

#[test]
fn test_shutdown_releases_native_windows() {
    let (framework, controller) = framework();
    framework.create_window(WindowDesc::new("a")).unwrap();
    framework.create_window(WindowDesc::new("b")).unwrap();

    framework.shutdown();

    assert!(controller.live_windows().is_empty());
    assert!(!framework.windows_remain());
    assert!(!framework.is_router_running());
}
