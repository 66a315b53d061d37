use std::sync::Arc;
use std::time::Instant;

use winit::{
    dpi::PhysicalSize,
    event::*,
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window},
};

// Import from the library crate
use monkecraft::{
    config::GameConfig,
    controller::{DeviceClass, InputController, InputEvent, Simulation, TouchLayout},
    error::AppError,
    logging, ui,
    view::{gpu_init, GpuContext, RenderState},
};

struct App {
    window: Arc<Window>,
    gpu: GpuContext,
    render_state: RenderState,

    sim: Simulation,
    input: InputController,

    // egui
    egui_state: egui_winit::State,
    egui_ctx: egui::Context,

    mouse_locked: bool,
    start: Instant,
}

impl App {
    async fn new(window: Arc<Window>, config: &GameConfig) -> Result<Self, AppError> {
        let size = window.inner_size();

        let instance = gpu_init::create_instance();
        let surface = instance.create_surface(window.clone())?;
        let gpu = GpuContext::new_native(&instance, surface, size.width, size.height).await?;

        let sim = Simulation::new(config, gpu.config.width, gpu.config.height);
        let render_state = RenderState::new(&gpu.device, &gpu.queue, &gpu.config, &sim.static_meshes());

        let input = InputController::new(
            DeviceClass::Keyboard,
            touch_layout(&window, size),
            config.movement.jump_duration_ms,
        );

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            None,
            None,
            None,
        );

        Ok(Self {
            window,
            gpu,
            render_state,
            sim,
            input,
            egui_state,
            egui_ctx,
            mouse_locked: false,
            start: Instant::now(),
        })
    }

    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    fn set_mouse_lock(&mut self, locked: bool) {
        if locked {
            let grabbed = self
                .window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
            if let Err(e) = grabbed {
                tracing::warn!("cursor grab unavailable: {e}");
                return;
            }
        } else {
            let _ = self.window.set_cursor_grab(CursorGrabMode::None);
        }
        self.window.set_cursor_visible(!locked);
        self.mouse_locked = locked;
        let now = self.now();
        self.input.handle_event(&InputEvent::PointerLockChanged { locked }, now);
    }

    fn input(&mut self, event: &WindowEvent) -> bool {
        // First let egui process the event, unless the mouse drives the camera
        if !self.mouse_locked {
            let egui_captured = self.egui_state.on_window_event(self.window.as_ref(), event).consumed;
            if egui_captured {
                return true;
            }
        }

        let now = self.now();
        match event {
            WindowEvent::KeyboardInput { event: KeyEvent { state, physical_key, .. }, .. } => {
                if let PhysicalKey::Code(code) = physical_key {
                    if *code == KeyCode::Escape && *state == ElementState::Pressed {
                        self.set_mouse_lock(false);
                    }
                    // winit key names match the browser's KeyboardEvent.code
                    let code = format!("{code:?}");
                    let event = match state {
                        ElementState::Pressed => InputEvent::KeyDown(code),
                        ElementState::Released => InputEvent::KeyUp(code),
                    };
                    self.input.handle_event(&event, now);
                }
                true
            }
            WindowEvent::MouseInput { state: ElementState::Pressed, button: MouseButton::Left, .. } => {
                if !self.mouse_locked {
                    self.set_mouse_lock(true);
                }
                true
            }
            WindowEvent::Touch(touch) => {
                let pos = touch.location.to_logical::<f32>(self.window.scale_factor());
                let id = touch.id;
                let event = match touch.phase {
                    TouchPhase::Started => InputEvent::TouchStart { id, x: pos.x, y: pos.y },
                    TouchPhase::Moved => InputEvent::TouchMove { id, x: pos.x, y: pos.y },
                    TouchPhase::Ended | TouchPhase::Cancelled => InputEvent::TouchEnd { id },
                };
                self.input.handle_event(&event, now);
                true
            }
            WindowEvent::Focused(false) => {
                self.input.handle_event(&InputEvent::FocusLost, now);
                self.set_mouse_lock(false);
                true
            }
            _ => false,
        }
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.render_state.resize(&self.gpu.device, &self.gpu.surface, new_size.width, new_size.height);
        self.sim.resize(new_size.width, new_size.height);
        let layout = touch_layout(&self.window, new_size);
        self.input.set_device_class(DeviceClass::Keyboard, layout);
    }

    fn handle_mouse_motion(&mut self, dx: f64, dy: f64) {
        if self.mouse_locked {
            let now = self.now();
            self.input.handle_event(&InputEvent::MouseMove { dx: dx as f32, dy: dy as f32 }, now);
        }
    }

    fn redraw(&mut self) {
        let now = self.now();
        let frame = self.sim.tick(&mut self.input, now);
        self.render_state.prepare(&self.gpu.queue, &frame);

        let raw_input = self.egui_state.take_egui_input(&self.window);
        let hud = ui::HudInfo {
            fps: self.sim.fps.fps,
            eye: self.sim.camera.eye,
            yaw: self.sim.camera.yaw,
            pitch: self.sim.camera.pitch,
            frame: &frame,
            input: &self.input,
        };
        let output = ui::build_ui(&self.egui_ctx, raw_input, &hud);
        self.egui_state.handle_platform_output(&self.window, output.platform_output);

        let dpr = self.window.scale_factor() as f32;
        let primitives = self.egui_ctx.tessellate(output.shapes, dpr);
        self.render_state.set_ui(primitives, output.textures_delta, dpr);

        self.render_state
            .draw_frame(&self.gpu.device, &self.gpu.queue, &self.gpu.surface, &self.sim.dynamic_mesh);
    }
}

/// Touch coordinates arrive in logical pixels, like CSS pixels on the web
fn touch_layout(window: &Window, size: PhysicalSize<u32>) -> TouchLayout {
    let logical = size.to_logical::<f32>(window.scale_factor());
    TouchLayout::new(logical.width, logical.height)
}

#[allow(deprecated)]
fn run() -> Result<(), AppError> {
    let config = GameConfig::from_env()?;

    let event_loop = EventLoop::new()?;
    let window_attributes = Window::default_attributes()
        .with_title("Monke Craft")
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
    let window = Arc::new(event_loop.create_window(window_attributes)?);

    let mut app = pollster::block_on(App::new(window, &config))?;
    tracing::info!("monkecraft running");

    event_loop.run(move |event, elwt| {
        match event {
            Event::WindowEvent { ref event, window_id } if window_id == app.window.id() => {
                if !app.input(event) {
                    match event {
                        WindowEvent::CloseRequested => elwt.exit(),
                        WindowEvent::Resized(physical_size) => app.resize(*physical_size),
                        WindowEvent::RedrawRequested => app.redraw(),
                        _ => {}
                    }
                }
            }
            Event::DeviceEvent { event: DeviceEvent::MouseMotion { delta }, .. } => {
                app.handle_mouse_motion(delta.0, delta.1);
            }
            Event::AboutToWait => {
                app.window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}

fn main() {
    logging::init();

    if let Err(err) = run() {
        tracing::error!(%err, "fatal error");
        eprintln!("monkecraft: {err}");
        std::process::exit(1);
    }
}
