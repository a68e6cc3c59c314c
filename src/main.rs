use std::env;
use std::f32::consts::PI;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use glam::{Vec2, Vec3};
use log::info;
use pollster::block_on;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode as WinitKey, PhysicalKey};
use winit::window::WindowId;

use umbra::{ArcballCamera, InputState, KeyCode, MouseButton, NamedKey, RenderState, Renderer};

/// The camera orbits a point slightly above the platform.
const LOOK_AT: Vec3 = Vec3::new(0.0, 2.5, 0.0);

const ROTATE_SENSITIVITY: f32 = 0.005;
const ZOOM_SENSITIVITY: f32 = 0.2;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        options,
        stage: None,
        error: None,
    };
    event_loop
        .run_app(&mut app)
        .context("event loop terminated with error")?;

    match app.error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct App {
    options: CliOptions,
    stage: Option<Stage>,
    error: Option<anyhow::Error>,
}

/// Everything that exists once the window and GPU are up.
struct Stage {
    renderer: Renderer,
    state: RenderState,
    camera: ArcballCamera,
    input: InputState,
    fps: FpsCounter,
}

impl App {
    fn initialize(&self, event_loop: &ActiveEventLoop) -> Result<Stage> {
        let attributes = winit::window::Window::default_attributes()
            .with_title("Shadows")
            .with_inner_size(LogicalSize::new(
                self.options.width as f64,
                self.options.height as f64,
            ));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .context("failed to create window")?,
        );

        let state = RenderState::new();
        let renderer = block_on(Renderer::new(Arc::clone(&window), &state))?;

        let mut camera = ArcballCamera::new(0.0, PI * 0.75, 5.0, LOOK_AT);
        camera.set_up(Vec3::Y);

        Ok(Stage {
            renderer,
            state,
            camera,
            input: InputState::new(),
            fps: FpsCounter::new(),
        })
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.stage.is_some() {
            return;
        }
        match self.initialize(event_loop) {
            Ok(stage) => self.stage = Some(stage),
            Err(err) => {
                self.error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(stage) = self.stage.as_mut() else {
            return;
        };
        if window_id != stage.renderer.window_id() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(size) => stage.renderer.resize(size),

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed {
                    return;
                }
                if let PhysicalKey::Code(code) = event.physical_key {
                    if matches!(code, WinitKey::Escape | WinitKey::KeyQ) {
                        event_loop.exit();
                        return;
                    }
                    if let Some(key) = map_keycode(code) {
                        let before = stage.state.technique;
                        stage.state.apply_key(key);
                        if stage.state.technique != before {
                            info!("shadow technique: {}", stage.state.technique.label());
                        }
                    }
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let button = match button {
                    WinitMouseButton::Left => MouseButton::LEFT,
                    WinitMouseButton::Right => MouseButton::new(1),
                    WinitMouseButton::Middle => MouseButton::new(2),
                    _ => return,
                };
                match state {
                    ElementState::Pressed => stage.input.set_mouse_button_down(button),
                    ElementState::Released => stage.input.set_mouse_button_up(button),
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                let delta = stage
                    .input
                    .update_mouse_position(Vec2::new(position.x as f32, position.y as f32));
                if stage.input.is_mouse_button_down(MouseButton::LEFT) {
                    stage
                        .camera
                        .rotate(delta.x * ROTATE_SENSITIVITY, -delta.y * ROTATE_SENSITIVITY);
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32 / 20.0,
                };
                stage.camera.zoom(amount * ZOOM_SENSITIVITY);
            }

            WindowEvent::RedrawRequested => {
                match stage.renderer.render(&stage.state, &stage.camera) {
                    Ok(()) => {
                        stage.state.advance();
                        stage.update_title();
                    }
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = stage.renderer.window().inner_size();
                        stage.renderer.resize(size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        self.error = Some(anyhow!("GPU is out of memory"));
                        event_loop.exit();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        info!("surface timeout; retrying next frame");
                    }
                    Err(wgpu::SurfaceError::Other) => {
                        info!("surface error; retrying next frame");
                    }
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(stage) = &self.stage {
            stage.renderer.window().request_redraw();
        }
    }
}

impl Stage {
    fn update_title(&mut self) {
        self.fps.frame();
        let title = format!(
            "Shadows [ Tessellation Level {} | {:.3} FPS ]",
            self.state.tess_level.floor(),
            self.fps.value()
        );
        self.renderer.window().set_title(&title);
    }
}

/// Frames-per-second over windows of at least one second.
struct FpsCounter {
    frames: u32,
    window_start: Instant,
    fps: f64,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            frames: 0,
            window_start: Instant::now(),
            fps: 0.0,
        }
    }

    fn frame(&mut self) {
        self.frames += 1;
        let elapsed = self.window_start.elapsed().as_secs_f64();
        if elapsed >= 1.0 {
            self.fps = f64::from(self.frames) / elapsed;
            self.frames = 0;
            self.window_start = Instant::now();
        }
    }

    fn value(&self) -> f64 {
        self.fps
    }
}

fn map_keycode(code: WinitKey) -> Option<KeyCode> {
    Some(match code {
        WinitKey::Digit0 => KeyCode::Digit(0),
        WinitKey::Digit1 => KeyCode::Digit(1),
        WinitKey::Digit2 => KeyCode::Digit(2),
        WinitKey::Digit3 => KeyCode::Digit(3),
        WinitKey::Digit4 => KeyCode::Digit(4),
        WinitKey::Digit5 => KeyCode::Digit(5),
        WinitKey::Digit6 => KeyCode::Digit(6),
        WinitKey::Digit7 => KeyCode::Digit(7),
        WinitKey::Digit8 => KeyCode::Digit(8),
        WinitKey::Digit9 => KeyCode::Digit(9),
        WinitKey::KeyB => KeyCode::Character('B'),
        WinitKey::KeyC => KeyCode::Character('C'),
        WinitKey::KeyF => KeyCode::Character('F'),
        WinitKey::KeyG => KeyCode::Character('G'),
        WinitKey::KeyH => KeyCode::Character('H'),
        WinitKey::KeyL => KeyCode::Character('L'),
        WinitKey::KeyN => KeyCode::Character('N'),
        WinitKey::KeyO => KeyCode::Character('O'),
        WinitKey::KeyS => KeyCode::Character('S'),
        WinitKey::KeyV => KeyCode::Character('V'),
        WinitKey::KeyW => KeyCode::Character('W'),
        WinitKey::KeyX => KeyCode::Character('X'),
        WinitKey::KeyZ => KeyCode::Character('Z'),
        WinitKey::ArrowUp => KeyCode::Named(NamedKey::Up),
        WinitKey::ArrowDown => KeyCode::Named(NamedKey::Down),
        WinitKey::ArrowLeft => KeyCode::Named(NamedKey::Left),
        WinitKey::ArrowRight => KeyCode::Named(NamedKey::Right),
        WinitKey::Escape => KeyCode::Named(NamedKey::Escape),
        _ => return None,
    })
}

struct CliOptions {
    width: u32,
    height: u32,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut width = 1920;
        let mut height = 1080;

        let mut args = env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--size" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--size expects WIDTHxHEIGHT"))?;
                    let (w, h) = value
                        .split_once('x')
                        .ok_or_else(|| anyhow!("--size expects WIDTHxHEIGHT"))?;
                    width = w.parse().context("invalid width")?;
                    height = h.parse().context("invalid height")?;
                }
                other => {
                    return Err(anyhow!("Unknown argument: {other}. Expected --size WxH"));
                }
            }
        }

        Ok(Self { width, height })
    }
}
