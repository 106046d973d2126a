//! Native input events routed into the shared input state

use app_shim::config::{FatalPolicy, FrameworkConfig, LogConfig};
use app_shim::input::{KeyCode, MouseButton, WHEEL_NOTCH};
use app_shim::platform::{HeadlessController, NativeHandle};
use app_shim::window::{WindowDesc, WindowId};
use app_shim::Framework;

fn open_window() -> (Framework, HeadlessController, WindowId, NativeHandle) {
    let config = FrameworkConfig::new("input tests")
        .with_fatal_policy(FatalPolicy::Propagate)
        .with_text_buffer_capacity(8)
        .with_logging(LogConfig::default().with_enabled(false));
    let (framework, controller) = Framework::headless(config).unwrap();
    let id = framework.create_window(WindowDesc::new("input")).unwrap();
    let native = framework.window(id).unwrap().native;
    (framework, controller, id, native)
}

#[test]
fn test_keys_track_presses_and_releases() {
    let (framework, controller, _id, native) = open_window();

    controller.key_down(native, KeyCode::SPACE);
    controller.key_down(native, KeyCode::LEFT);
    controller.key_up(native, KeyCode::LEFT);
    assert!(controller.flush());

    assert!(framework.is_key_pressed(KeyCode::SPACE));
    assert!(!framework.is_key_pressed(KeyCode::LEFT));
    assert_eq!(framework.input().keys().pressed(), vec![KeyCode::SPACE]);
}

#[test]
fn test_focus_loss_releases_everything() {
    let (framework, controller, id, native) = open_window();

    controller.focus(native, true);
    controller.key_down(native, KeyCode::SHIFT);
    controller.mouse_button(native, MouseButton::Left, true);
    assert!(controller.flush());
    assert!(framework.has_focus(id));
    assert!(framework.is_key_pressed(KeyCode::SHIFT));

    controller.focus(native, false);
    assert!(controller.flush());

    assert!(!framework.has_focus(id));
    assert_eq!(framework.input().keys().count(), 0);
    assert!(framework.input().mouse().buttons().is_empty());
}

#[test]
fn test_auto_repeat_does_not_press() {
    let (framework, controller, _id, native) = open_window();

    controller.key_repeat(native, KeyCode::ENTER);
    assert!(controller.flush());
    assert!(!framework.is_key_pressed(KeyCode::ENTER));
}

#[test]
fn test_text_collected_only_while_enabled() {
    let (framework, controller, _id, native) = open_window();

    controller.type_text(native, "no");
    assert!(controller.flush());
    assert_eq!(framework.input().text(), "");

    framework.enable_text_input(true);
    controller.type_text(native, "abx\u{8}c\t");
    assert!(controller.flush());
    assert_eq!(framework.input().text(), "abc");
    assert_eq!(framework.input().text_cursor(), 3);

    framework.enable_text_input(false);
    controller.type_text(native, "zz");
    assert!(controller.flush());
    assert_eq!(framework.input().text(), "abc");

    framework.enable_text_input(true);
    framework.clear_text_input();
    assert_eq!(framework.input().text(), "");
    assert_eq!(framework.input().text_cursor(), 0);
}

#[test]
fn test_text_buffer_is_bounded() {
    let (framework, controller, _id, native) = open_window();
    framework.enable_text_input(true);

    controller.type_text(native, "0123456789");
    assert!(controller.flush());
    assert_eq!(framework.input().text(), "01234567");
}

#[test]
fn test_mouse_position_and_wheel() {
    let (framework, controller, id, native) = open_window();

    controller.mouse_move(native, 40, 25);
    controller.mouse_button(native, MouseButton::Right, true);
    controller.scroll(native, 2);
    controller.scroll(native, -1);
    assert!(controller.flush());

    let mouse = framework.input().mouse();
    assert!(framework.is_mouse_inside(id));
    assert_eq!(mouse.position(), (40, 25));
    assert!(mouse.is_pressed(MouseButton::Right));
    assert!(!mouse.is_pressed(MouseButton::Left));
    assert_eq!(mouse.take_wheel_delta(), WHEEL_NOTCH);
    assert_eq!(mouse.wheel_delta(), 0);
}

#[test]
fn test_hover_moves_between_windows() {
    let (framework, controller, first, first_native) = open_window();
    let second = framework.create_window(WindowDesc::new("second")).unwrap();
    let second_native = framework.window(second).unwrap().native;

    controller.mouse_move(first_native, 5, 5);
    assert!(controller.flush());
    assert!(framework.is_mouse_inside(first));

    controller.mouse_move(second_native, 7, 9);
    assert!(controller.flush());
    assert!(framework.is_mouse_inside(second));
    assert!(!framework.is_mouse_inside(first));
}

#[test]
fn test_events_for_unknown_windows_are_dropped() {
    let (framework, controller, _id, _native) = open_window();

    controller.key_down(NativeHandle(0xdead), KeyCode::ESCAPE);
    assert!(controller.flush());
    assert!(!framework.is_key_pressed(KeyCode::ESCAPE));
}
