use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Parser;
use glam::Vec2;
use log::{info, warn};
use pollster::block_on;
use winit::dpi::LogicalSize;
use winit::event::{
    ElementState, Event, KeyboardInput, MouseButton as WinitMouseButton, VirtualKeyCode,
    WindowEvent,
};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::platform::run_return::EventLoopExtRunReturn;
use winit::window::{CursorIcon, WindowBuilder};

use house_walkthrough::app::{self, SharedViewport};
use house_walkthrough::assets::{self, AssetSlot};
use house_walkthrough::{
    AssetKind, CursorStyle, MouseButton, PointerState, PopupView, Renderer,
    ScriptedEvent, Walkthrough, WalkthroughConfig,
};

#[derive(Parser, Debug)]
#[command(about = "Interactive walkthrough of the net-zero house model", version)]
struct Args {
    /// Scene description (XML) exported from the house model
    scene: PathBuf,

    /// Popup text document (JSON)
    #[arg(long)]
    text: Option<PathBuf>,

    /// Walkthrough configuration overriding the built-in defaults (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Replay the scripted events and print the final state without opening a window
    #[arg(long)]
    summary_only: bool,

    /// Viewport width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Viewport height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Event to replay: click:X,Y, move:X,Y, turn-on, turn-off, return, next, prev or close
    #[arg(long = "event", value_name = "EVENT")]
    events: Vec<ScriptedEvent>,
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

fn run() -> Result<()> {
    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => WalkthroughConfig::load(path)?,
        None => WalkthroughConfig::default(),
    };
    if let Some(width) = args.width {
        config.viewport.width = width;
    }
    if let Some(height) = args.height {
        config.viewport.height = height;
    }

    let scene = AssetSlot::new(AssetKind::Model);
    scene.fulfil(assets::load_scene(&args.scene));
    let text = AssetSlot::new(AssetKind::PopupText);
    match &args.text {
        Some(path) => {
            text.fulfil(assets::load_popup_text(path));
        }
        None => warn!("no popup text given; popups will show no content"),
    }

    let mut walkthrough = Walkthrough::new(config);
    if let Some(result) = scene.take() {
        walkthrough.on_scene_loaded(result);
    }
    if let Some(result) = text.take() {
        walkthrough.on_popup_text_loaded(result);
    }
    print_scene_overview(&walkthrough);

    if args.summary_only {
        run_headless(walkthrough, &args.events)
    } else {
        match run_interactive(walkthrough) {
            Ok(()) => Ok(()),
            Err(InteractiveError::Window(err, walkthrough)) => {
                eprintln!(
                    "{err}. Falling back to --summary-only mode (set DISPLAY or install X11 libs to enable rendering)."
                );
                run_headless(*walkthrough, &args.events)
            }
            Err(InteractiveError::Other(err)) => Err(err),
        }
    }
}

fn print_scene_overview(walkthrough: &Walkthrough) {
    if !walkthrough.scene_loaded() {
        println!("Scene unavailable; continuing without a model");
        return;
    }
    let index = walkthrough.index();
    let meshes = index.iter().filter(|(_, node)| node.is_mesh()).count();
    println!(
        "Loaded scene with {} nodes ({meshes} meshes, {} cameras)",
        index.len(),
        walkthrough.cameras().len()
    );
}

fn run_headless(mut walkthrough: Walkthrough, events: &[ScriptedEvent]) -> Result<()> {
    for event in events {
        let outcome = walkthrough.dispatch(*event);
        println!("> {event}: {outcome}");
    }
    app::print_summary(&walkthrough);
    Ok(())
}

enum InteractiveError {
    /// No window could be opened; the walkthrough is handed back untouched.
    Window(WindowInitError, Box<Walkthrough>),
    Other(anyhow::Error),
}

fn run_interactive(walkthrough: Walkthrough) -> Result<(), InteractiveError> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let mut event_loop = match event_loop {
        Ok(event_loop) => event_loop,
        Err(panic) => {
            return Err(InteractiveError::Window(
                WindowInitError::from_panic("event loop", panic),
                Box::new(walkthrough),
            ))
        }
    };
    let viewport = walkthrough.viewport();
    let window = match WindowBuilder::new()
        .with_title("House Walkthrough")
        .with_inner_size(LogicalSize::new(viewport.width as f64, viewport.height as f64))
        .build(&event_loop)
    {
        Ok(window) => Arc::new(window),
        Err(err) => {
            return Err(InteractiveError::Window(
                WindowInitError::from_error("window", err),
                Box::new(walkthrough),
            ))
        }
    };

    let renderer =
        block_on(Renderer::new(Arc::clone(&window))).map_err(InteractiveError::Other)?;
    let size = window.inner_size();
    let mut app = AppState {
        renderer,
        walkthrough,
        pointer: PointerState::new(),
        viewport: SharedViewport::new(size.width, size.height),
        last_title: String::new(),
        last_error: None,
    };
    app.sync_viewport();

    event_loop.run_return(|event, _, control_flow| {
        *control_flow = ControlFlow::Poll;
        if let Err(err) = app.process_event(&event, control_flow) {
            app.last_error = Some(err);
            control_flow.set_exit();
        }
    });

    app::print_summary(&app.walkthrough);
    match app.last_error {
        Some(err) => Err(InteractiveError::Other(err)),
        None => Ok(()),
    }
}

struct AppState {
    renderer: Renderer,
    walkthrough: Walkthrough,
    pointer: PointerState,
    viewport: SharedViewport,
    last_title: String,
    last_error: Option<anyhow::Error>,
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

impl AppState {
    fn process_event(&mut self, event: &Event<()>, control_flow: &mut ControlFlow) -> Result<()> {
        match event {
            Event::WindowEvent { event, window_id } if *window_id == self.renderer.window_id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        control_flow.set_exit();
                    }
                    WindowEvent::Resized(size) => {
                        self.renderer.resize(*size);
                        self.viewport.update(size.width, size.height);
                        self.sync_viewport();
                    }
                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        self.renderer.resize(**new_inner_size);
                        self.viewport
                            .update(new_inner_size.width, new_inner_size.height);
                        self.sync_viewport();
                    }
                    WindowEvent::KeyboardInput { input, .. } => {
                        self.handle_keyboard(input);
                    }
                    WindowEvent::MouseInput { state, button, .. } => {
                        self.handle_mouse_button(*state, *button);
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        let position = Vec2::new(position.x as f32, position.y as f32);
                        self.pointer.set_position(position);
                        self.walkthrough.pointer_move(position);
                        self.sync_cursor();
                    }
                    _ => {}
                }
            }
            Event::RedrawRequested(window_id) if *window_id == self.renderer.window_id() => {
                let frame = app::frame(&self.walkthrough);
                self.renderer.update_globals(&frame.camera, &frame.light);
                if let Err(err) = self.renderer.render(&frame.items) {
                    match err {
                        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                            let size = self.renderer.window().inner_size();
                            self.renderer.resize(size);
                        }
                        wgpu::SurfaceError::OutOfMemory => {
                            return Err(anyhow!("GPU is out of memory"));
                        }
                        wgpu::SurfaceError::Timeout => {
                            info!("Surface timeout; retrying next frame");
                        }
                    }
                }
            }
            Event::MainEventsCleared => {
                self.sync_title();
                self.renderer.window().request_redraw();
            }
            _ => {}
        }
        Ok(())
    }

    fn sync_viewport(&mut self) {
        let (width, height) = self.viewport.size();
        self.walkthrough.resize(width, height);
    }

    fn sync_cursor(&self) {
        let icon = match self.walkthrough.cursor() {
            CursorStyle::Default => CursorIcon::Default,
            CursorStyle::Pointer => CursorIcon::Hand,
        };
        self.renderer.window().set_cursor_icon(icon);
    }

    /// The window title doubles as the popup panel in the native viewer.
    fn sync_title(&mut self) {
        let popup = app::describe_popup(&self.walkthrough.popup_view());
        let mut title = format!(
            "House Walkthrough | {} | popup: {popup}",
            self.walkthrough.state().room
        );
        if self.walkthrough.intro_visible() {
            title.push_str(" | press O (turn on) or F (turn off)");
        }
        if self.walkthrough.return_visible() {
            title.push_str(" | R: return");
        }
        if title != self.last_title {
            if let PopupView::Page { text, .. } = self.walkthrough.popup_view() {
                println!("{text}");
            }
            self.renderer.window().set_title(&title);
            self.last_title = title;
        }
    }

    fn handle_keyboard(&mut self, input: &KeyboardInput) {
        if input.state != ElementState::Pressed {
            return;
        }
        let Some(key) = input.virtual_keycode else {
            return;
        };
        let event = match key {
            VirtualKeyCode::O => ScriptedEvent::TurnOn,
            VirtualKeyCode::F => ScriptedEvent::TurnOff,
            VirtualKeyCode::R => ScriptedEvent::Return,
            VirtualKeyCode::Right => ScriptedEvent::Next,
            VirtualKeyCode::Left => ScriptedEvent::Prev,
            VirtualKeyCode::Escape => ScriptedEvent::Close,
            _ => return,
        };
        let outcome = self.walkthrough.dispatch(event);
        info!("{event}: {outcome}");
    }

    fn handle_mouse_button(&mut self, state: ElementState, button: WinitMouseButton) {
        let index = match button {
            WinitMouseButton::Left => 0,
            WinitMouseButton::Right => 1,
            WinitMouseButton::Middle => 2,
            WinitMouseButton::Other(value) => value,
        } as u8;
        let button = MouseButton::new(index);
        match state {
            ElementState::Pressed => self.pointer.press(button),
            ElementState::Released => {
                if self.pointer.release(button) {
                    let outcome = self.walkthrough.pointer_click(self.pointer.position());
                    if !outcome.fired.is_empty() {
                        info!("click: {outcome:?}");
                    }
                }
            }
        }
    }
}
