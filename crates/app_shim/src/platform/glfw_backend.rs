//! Native windows through GLFW
//!
//! GLFW is initialized on the router thread when the backend is built and
//! terminated when it is dropped there. GLFW's own thread-affinity rules
//! are satisfied because the backend never leaves that thread.
//!
//! There is no cross-thread waker: posting an empty event needs the `Glfw`
//! token, which is not `Send`. Commands are picked up within one pump
//! timeout instead.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use glfw::{Action, Context as _, Key, WindowEvent};

use super::{
    BackendFactory, NativeBackend, NativeEvent, NativeEventKind, NativeHandle, NativeWindowDesc,
    PlatformError, PlatformResult,
};
use crate::input::{KeyCode, MouseButton, WHEEL_NOTCH};

struct GlfwWindow {
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, WindowEvent)>,
}

/// GLFW window backend
pub struct GlfwBackend {
    glfw: glfw::Glfw,
    windows: HashMap<NativeHandle, GlfwWindow>,
}

impl GlfwBackend {
    /// Initialize GLFW for Vulkan-style (no client API) windows
    pub fn new() -> PlatformResult<Self> {
        let mut glfw = glfw::init(glfw::fail_on_errors)
            .map_err(|e| PlatformError::InitializationFailed(format!("GLFW: {e:?}")))?;

        // Configure for Vulkan (no OpenGL context)
        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(true));

        log::info!("GLFW {} initialized", glfw::get_version_string());
        Ok(Self {
            glfw,
            windows: HashMap::new(),
        })
    }

    /// Factory for [`crate::Framework::new`]
    pub fn factory() -> BackendFactory {
        Arc::new(|| Ok(Box::new(Self::new()?) as Box<dyn NativeBackend>))
    }
}

impl NativeBackend for GlfwBackend {
    fn name(&self) -> &'static str {
        "glfw"
    }

    fn create_window(&mut self, desc: &NativeWindowDesc) -> PlatformResult<NativeHandle> {
        self.glfw.window_hint(glfw::WindowHint::Visible(desc.visible));

        let (width, height) = desc.size;
        let (mut window, events) = self
            .glfw
            .create_window(
                width.unsigned_abs(),
                height.unsigned_abs(),
                &desc.title,
                glfw::WindowMode::Windowed,
            )
            .ok_or_else(|| PlatformError::WindowCreationFailed(desc.title.clone()))?;

        if let Some((x, y)) = desc.position {
            window.set_pos(x, y);
        }
        window.set_all_polling(true);

        let handle = NativeHandle(window.window_ptr() as u64);
        self.windows.insert(handle, GlfwWindow { window, events });
        Ok(handle)
    }

    fn destroy_window(&mut self, window: NativeHandle) -> PlatformResult<()> {
        // Dropping the PWindow destroys the native window
        self.windows
            .remove(&window)
            .map(drop)
            .ok_or(PlatformError::UnknownWindow(window))
    }

    fn cancel_close(&mut self, window: NativeHandle) {
        if let Some(entry) = self.windows.get_mut(&window) {
            entry.window.set_should_close(false);
        }
    }

    fn pump(&mut self, timeout: Duration, sink: &mut Vec<NativeEvent>) -> PlatformResult<()> {
        self.glfw.wait_events_timeout(timeout.as_secs_f64());

        for (&handle, entry) in &self.windows {
            for (_, event) in glfw::flush_messages(&entry.events) {
                sink.extend(
                    translate_event(event)
                        .into_iter()
                        .map(|kind| NativeEvent::new(handle, kind)),
                );
            }
        }
        Ok(())
    }
}

fn translate_event(event: WindowEvent) -> Vec<NativeEventKind> {
    match event {
        WindowEvent::Close => vec![NativeEventKind::CloseRequested],
        WindowEvent::Pos(x, y) => vec![NativeEventKind::Moved { x, y }],
        WindowEvent::Size(width, height) => vec![NativeEventKind::Resized { width, height }],
        WindowEvent::Focus(focused) => vec![NativeEventKind::Focus(focused)],
        WindowEvent::Iconify(minimized) => vec![
            NativeEventKind::Minimized(minimized),
            NativeEventKind::Visibility(!minimized),
        ],
        WindowEvent::CursorEnter(true) => vec![NativeEventKind::MouseEntered],
        WindowEvent::CursorEnter(false) => vec![NativeEventKind::MouseLeft],
        WindowEvent::CursorPos(x, y) => vec![NativeEventKind::MouseMoved {
            x: x.round() as i32,
            y: y.round() as i32,
        }],
        WindowEvent::MouseButton(button, action, _) => translate_mouse_button(button)
            .map(|button| NativeEventKind::MouseButton {
                button,
                pressed: action != Action::Release,
            })
            .into_iter()
            .collect(),
        WindowEvent::Scroll(_, y) => {
            vec![NativeEventKind::MouseWheel((y * f64::from(WHEEL_NOTCH)).round() as i32)]
        }
        WindowEvent::Char(c) => vec![NativeEventKind::Character(c)],
        WindowEvent::Key(key, _, action, _) => {
            let Some(key) = translate_key(key) else {
                return Vec::new();
            };
            match action {
                Action::Press => vec![NativeEventKind::KeyDown { key, repeat: false }],
                Action::Repeat => vec![NativeEventKind::KeyDown { key, repeat: true }],
                Action::Release => vec![NativeEventKind::KeyUp { key }],
            }
        }
        _ => Vec::new(),
    }
}

fn translate_mouse_button(button: glfw::MouseButton) -> Option<MouseButton> {
    match button {
        glfw::MouseButton::Button1 => Some(MouseButton::Left),
        glfw::MouseButton::Button2 => Some(MouseButton::Right),
        glfw::MouseButton::Button3 => Some(MouseButton::Middle),
        glfw::MouseButton::Button4 => Some(MouseButton::X1),
        glfw::MouseButton::Button5 => Some(MouseButton::X2),
        _ => None,
    }
}

/// Map GLFW key tokens onto virtual key codes
fn translate_key(key: Key) -> Option<KeyCode> {
    let raw = key as i32;
    // GLFW uses ASCII for space, digits and letters, like VK codes
    if raw == 32 || (48..=57).contains(&raw) || (65..=90).contains(&raw) {
        return u8::try_from(raw).ok().map(KeyCode);
    }
    if (Key::F1 as i32..=Key::F24 as i32).contains(&raw) {
        return u8::try_from(raw - Key::F1 as i32 + 1).ok().and_then(KeyCode::function);
    }

    let code = match key {
        Key::Escape => KeyCode::ESCAPE,
        Key::Enter | Key::KpEnter => KeyCode::ENTER,
        Key::Tab => KeyCode::TAB,
        Key::Backspace => KeyCode::BACKSPACE,
        Key::Insert => KeyCode::INSERT,
        Key::Delete => KeyCode::DELETE,
        Key::Right => KeyCode::RIGHT,
        Key::Left => KeyCode::LEFT,
        Key::Down => KeyCode::DOWN,
        Key::Up => KeyCode::UP,
        Key::PageUp => KeyCode::PAGE_UP,
        Key::PageDown => KeyCode::PAGE_DOWN,
        Key::Home => KeyCode::HOME,
        Key::End => KeyCode::END,
        Key::CapsLock => KeyCode::CAPS_LOCK,
        Key::Pause => KeyCode::PAUSE,
        Key::LeftShift | Key::RightShift => KeyCode::SHIFT,
        Key::LeftControl | Key::RightControl => KeyCode::CONTROL,
        Key::LeftAlt | Key::RightAlt => KeyCode::ALT,
        _ => return None,
    };
    Some(code)
}
