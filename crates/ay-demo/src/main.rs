use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context as _, Result};
use clap::Parser;

use ay_engine::coords::{Mat4, Vec3};
use ay_engine::input::Key;
use ay_engine::logging::{LoggingConfig, init_logging};
use ay_engine::paint::Color;
use ay_engine::time::FrameClock;
use ay_engine::{HeadlessNative, LibraryConfig, RetainedColor, UiWindow, Window, WindowFlags};

const WIDTH: i32 = 1280;
const HEIGHT: i32 = 900;
const SHADER: &str = "demo";

#[derive(Debug, Parser)]
#[command(name = "ay-demo")]
#[command(about = "Opens a window with an FPS overlay and a clear-color editor", long_about = None)]
struct Args {
    /// Path to the native library (defaults to the platform name on the search path)
    #[arg(long, env = "AY_LIBRARY", value_name = "PATH")]
    library: Option<PathBuf>,

    /// Run against the in-process backend instead of the native library
    #[arg(long)]
    headless: bool,

    /// Stop after this many frames
    #[arg(long, value_name = "N")]
    frames: Option<u32>,

    /// Vertex shader source file
    #[arg(long, requires = "fragment", value_name = "FILE")]
    vertex: Option<PathBuf>,

    /// Fragment shader source file
    #[arg(long, requires = "vertex", value_name = "FILE")]
    fragment: Option<PathBuf>,

    /// Log filter, e.g. `ay_engine=trace`
    #[arg(long, value_name = "FILTER")]
    log: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut logging = LoggingConfig::default();
    if let Some(filter) = &args.log {
        logging = logging.with_filter(filter);
    }
    init_logging(logging);

    let mut window = open_window(&args)?;
    if let (Some(vertex), Some(fragment)) = (&args.vertex, &args.fragment) {
        window
            .context()
            .shader_from_file(SHADER, vertex, fragment)
            .with_context(|| format!("failed to build shader from {vertex:?} and {fragment:?}"))?;
        window.context().shader_use(SHADER)?;
    }

    run(&window, &args)?;

    window.dispose().context("failed to dispose window")?;
    Ok(())
}

fn open_window(args: &Args) -> Result<Window> {
    if args.headless {
        let native = Rc::new(HeadlessNative::new());
        // Report the window closed after the requested number of frames.
        native.close_after(args.frames.unwrap_or(60));
        return Window::new(native, WIDTH, HEIGHT).context("failed to create headless window");
    }

    let mut config = LibraryConfig::from_env();
    if let Some(path) = &args.library {
        config = config.with_path(path.clone());
    }
    Window::open(&config, WIDTH, HEIGHT).context("failed to open window")
}

fn run(window: &Window, args: &Args) -> Result<()> {
    let ctx = window.context();
    let clear_color = RetainedColor::new(Color::from_hex(0x1E1E2EFF));
    let overlay = UiWindow::from(WindowFlags::NO_SAVED_SETTINGS | WindowFlags::ALWAYS_AUTO_RESIZE);
    let has_shader = ctx.active_shader().is_some();

    let mut clock = FrameClock::new();
    let mut elapsed = 0.0f32;
    let mut rendered = 0u64;

    while window.is_open() {
        let time = clock.tick();
        elapsed += time.dt;

        if window.is_key_pressed(Key::Escape)? {
            window.close()?;
        }
        if args.frames.is_some_and(|limit| time.frame_index >= u64::from(limit)) {
            window.close()?;
            continue;
        }

        let (width, height) = window.size()?;
        ctx.clear(clear_color.get())?;
        ctx.viewport(0, 0, width, height)?;

        if has_shader {
            let aspect = width as f32 / height.max(1) as f32;
            let mvp = Mat4::perspective_rh(1.0, aspect, 0.1, 100.0)
                * Mat4::translation(Vec3::new(0.0, 0.0, -3.0));
            ctx.shader_uniform("u_time", elapsed)?;
            ctx.shader_uniform("u_mvp", mvp)?;
        }

        ctx.ui_begin()?;
        ctx.ui_create_window("info", overlay, || {
            ctx.ui_create_text(&format!("FPS: {:.2}", time.fps), Color::WHITE)?;
            ctx.ui_create_color_editor("clear color", &clear_color)
        })?;
        ctx.ui_end()?;
        rendered += 1;
    }

    log::info!("rendered {rendered} frames in {elapsed:.2}s");
    Ok(())
}
