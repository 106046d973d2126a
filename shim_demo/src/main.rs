//! App shim demo
//!
//! Opens a main window with a dependent tool window, reports input, and
//! exits once every window is closed. With the `glfw` feature real windows
//! are shown; otherwise a scripted headless session runs.
//!
//! Usage: `shim_demo [config.toml|config.ron]`

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use app_shim::prelude::*;

const DEFAULT_CONFIG: &str = "shim_demo.toml";

fn main() {
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG), PathBuf::from);

    if let Err(error) = run(&config_path) {
        log::error!("Demo failed: {error}");
        eprintln!("shim_demo: {error}");
        std::process::exit(1);
    }
}

fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = FrameworkConfig::load_or_default(config_path)?;
    if config.application_name.is_empty() {
        config.application_name = "shim_demo".to_string();
    }

    #[cfg(feature = "glfw")]
    {
        let framework = Arc::new(Framework::glfw(config)?);
        open_windows(&framework)?;
        // GPU failures are fatal under the default policy
        let gpu = framework.bootstrap_renderer()?;
        log::info!("Renderer on {}", gpu.device_name());
        report_input_until_closed(&framework);
        return Ok(());
    }

    #[cfg(not(feature = "glfw"))]
    {
        let (framework, controller) = Framework::headless(config)?;
        let framework = Arc::new(framework);
        let main = open_windows(&framework)?;
        script_session(&framework, &controller, main);
        report_input_until_closed(&framework);
        Ok(())
    }
}

fn open_windows(framework: &Arc<Framework>) -> FrameworkResult<WindowId> {
    framework.system_info().log_summary();

    let tool = framework.create_window(
        WindowDesc::new("Tools")
            .with_position(900, 100)
            .with_size(240, 480)
            .on_close(|id| log::info!("{id} closed")),
    )?;
    let main = framework.create_window(
        WindowDesc::new("App Shim Demo")
            .with_size(800, 600)
            .with_dependent(tool)
            .on_close_attempt(|id| {
                log::info!("Close requested for {id}");
                true
            })
            .on_close(|id| log::info!("{id} closed, tool window follows")),
    )?;

    framework.enable_text_input(true);
    Ok(main)
}

#[cfg(not(feature = "glfw"))]
fn script_session(framework: &Framework, controller: &HeadlessController, main: WindowId) {
    let Some(state) = framework.window(main) else {
        return;
    };
    let native = state.native;

    controller.focus(native, true);
    controller.mouse_move(native, 120, 80);
    controller.key_down(native, KeyCode::SPACE);
    controller.type_text(native, "hello shim");
    controller.scroll(native, 3);
    controller.flush();
    log::info!(
        "Typed '{}', space held: {}",
        framework.input().text(),
        framework.is_key_pressed(KeyCode::SPACE)
    );

    controller.key_up(native, KeyCode::SPACE);
    controller.click_close(native);
}

fn report_input_until_closed(framework: &Framework) {
    let mut last_text = String::new();
    while framework.windows_remain() {
        let text = framework.input().text();
        if text != last_text {
            log::info!("Text: {text}");
            last_text = text;
        }

        let wheel = framework.input().mouse().take_wheel_delta();
        if wheel != 0 {
            log::info!("Wheel moved {wheel}");
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    log::info!("All windows closed");
}
