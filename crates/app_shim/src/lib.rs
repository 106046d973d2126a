//! # App Shim
//!
//! A thin application framework over native windows. It owns the window
//! lifecycle, routes native events on a dedicated thread, keeps input state
//! that any thread may read, and optionally bootstraps a Vulkan device.
//!
//! ## Features
//!
//! - **Window registry**: 16-bit public handles, by-handle and by-native
//!   lookup, dependent windows destroyed in cascade
//! - **Event router**: one thread owns the window system; it starts with
//!   the first window and exits when the last one closes
//! - **Input state**: keyboard bitset, mouse position/buttons/wheel and a
//!   bounded text buffer, readable from any thread
//! - **Renderer bootstrap**: one-shot Vulkan instance and device selection
//! - **Backends**: headless (always) and GLFW (feature `glfw-backend`)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use app_shim::prelude::*;
//!
//! fn main() -> Result<(), FrameworkError> {
//!     let (framework, controller) = Framework::headless(FrameworkConfig::new("demo"))?;
//!
//!     let main = framework.create_window(WindowDesc::new("main").with_size(1280, 720))?;
//!     if let Some(state) = framework.window(main) {
//!         controller.click_close(state.native);
//!     }
//!
//!     framework.wait_until_no_windows()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::missing_errors_doc)]

pub mod config;
pub mod error;
pub mod fatal;
pub mod foundation;
pub mod input;
pub mod platform;
pub mod render;
pub mod window;

mod framework;
mod router;

pub use error::{FrameworkError, FrameworkResult};
pub use framework::Framework;

/// Common imports for framework users
pub mod prelude {
    pub use crate::{
        config::{Config, FatalPolicy, FrameworkConfig, LogConfig},
        input::{InputState, KeyCode, MouseButton, MouseButtons},
        platform::{HeadlessController, NativeEventKind, NativeHandle, SystemInfo},
        render::GpuContext,
        window::{WindowDesc, WindowId, WindowState},
        Framework, FrameworkError, FrameworkResult,
    };
}
