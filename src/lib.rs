// Re-export all public modules so they can be used from main.rs
pub mod config;
pub mod error;
pub mod logging;
pub mod utils;
pub mod ui;

// MVC Architecture
pub mod model;
pub mod view;
pub mod controller;

#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(target_arch = "wasm32")]
pub use wasm_app::{shutdown, start};

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::{prelude::wasm_bindgen, JsCast, JsValue};
    use web_sys::{Document, HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent, Window};

    use crate::config::GameConfig;
    use crate::controller::{DeviceClass, InputController, InputEvent, Simulation, TouchLayout};
    use crate::error::AppError;
    use crate::view::{GpuContext, RenderState};
    use crate::web::{AnimationLoop, EventListeners};
    use crate::{logging, ui};

    /// Everything the running session owns. Dropping it unregisters all
    /// callbacks and releases the GPU resources held by the frame closure.
    struct WebApp {
        _animation: AnimationLoop,
        _listeners: EventListeners,
    }

    thread_local! {
        static APP: RefCell<Option<WebApp>> = const { RefCell::new(None) };
    }

    #[wasm_bindgen(start)]
    pub async fn start() -> Result<(), JsValue> {
        logging::init();

        match setup_app().await {
            Ok(app) => {
                APP.with(|cell| *cell.borrow_mut() = Some(app));
                tracing::info!("monkecraft running");
                Ok(())
            }
            Err(err) => {
                tracing::error!(%err, "startup failed");
                show_fatal_error(&err);
                Err(err.into())
            }
        }
    }

    /// Stop the animation loop and remove every event listener
    #[wasm_bindgen]
    pub fn shutdown() {
        let app = APP.with(|cell| cell.borrow_mut().take());
        if app.is_some() {
            drop(app);
            tracing::info!("monkecraft shut down");
        }
    }

    /// Main application setup for WASM
    async fn setup_app() -> Result<WebApp, AppError> {
        let (window, document, canvas) = init_canvas()?;
        let (css_width, css_height) = viewport_size(&window);
        let (width, height) = backing_size(&window, css_width, css_height);
        canvas.set_width(width);
        canvas.set_height(height);

        let config = GameConfig::default();
        let gpu = GpuContext::new(&canvas, width, height).await?;

        let mut sim = Simulation::new(&config, gpu.config.width, gpu.config.height);
        let mut render_state = RenderState::new(&gpu.device, &gpu.queue, &gpu.config, &sim.static_meshes());

        let device_class = detect_device(&window);
        tracing::debug!(?device_class, "detected device class");
        let input = Rc::new(RefCell::new(InputController::new(
            device_class,
            TouchLayout::new(css_width, css_height),
            config.movement.jump_duration_ms,
        )));

        let egui_ctx = egui::Context::default();
        let egui_events: Rc<RefCell<Vec<egui::Event>>> = Rc::new(RefCell::new(Vec::new()));

        let listeners = setup_input_listeners(&window, &document, &canvas, input.clone(), egui_events.clone())?;

        // Continuous redraw using requestAnimationFrame
        let window_for_loop = window.clone();
        let animation = AnimationLoop::start(window.clone(), move |timestamp| {
            let now = timestamp / 1000.0;
            let window = &window_for_loop;

            // Resize handling, also re-evaluates touch vs keyboard
            let (css_width, css_height) = viewport_size(window);
            let (width, height) = backing_size(window, css_width, css_height);
            if width != render_state.width || height != render_state.height {
                canvas.set_width(width);
                canvas.set_height(height);
                render_state.resize(&gpu.device, &gpu.surface, width, height);
                sim.resize(width, height);
                input
                    .borrow_mut()
                    .set_device_class(detect_device(window), TouchLayout::new(css_width, css_height));
            }

            let frame = sim.tick(&mut input.borrow_mut(), now);
            render_state.prepare(&gpu.queue, &frame);

            // Build egui input from queued events
            let dpr = window.device_pixel_ratio() as f32;
            let mut raw_input = egui::RawInput::default();
            raw_input.time = Some(now);
            raw_input.screen_rect = Some(egui::Rect::from_min_size(
                egui::Pos2::ZERO,
                egui::vec2(css_width, css_height),
            ));
            raw_input.events.extend(egui_events.borrow_mut().drain(..));
            egui_ctx.set_pixels_per_point(dpr);

            let full_output = {
                let input = input.borrow();
                let hud = ui::HudInfo {
                    fps: sim.fps.fps,
                    eye: sim.camera.eye,
                    yaw: sim.camera.yaw,
                    pitch: sim.camera.pitch,
                    frame: &frame,
                    input: &input,
                };
                ui::build_ui(&egui_ctx, raw_input, &hud)
            };
            let primitives = egui_ctx.tessellate(full_output.shapes, dpr);
            render_state.set_ui(primitives, full_output.textures_delta, dpr);

            render_state.draw_frame(&gpu.device, &gpu.queue, &gpu.surface, &sim.dynamic_mesh);
        })?;

        Ok(WebApp { _animation: animation, _listeners: listeners })
    }

    fn now_secs(window: &Window) -> f64 {
        window.performance().map(|p| p.now() / 1000.0).unwrap_or(0.0)
    }

    /// Setup all input event listeners with platform-agnostic abstractions
    fn setup_input_listeners(
        window: &Window,
        document: &Document,
        canvas: &HtmlCanvasElement,
        input: Rc<RefCell<InputController>>,
        egui_events: Rc<RefCell<Vec<egui::Event>>>,
    ) -> Result<EventListeners, AppError> {
        let mut listeners = EventListeners::new();

        // Keyboard down
        {
            let input = input.clone();
            let window = window.clone();
            let document_for_exit = document.clone();
            listeners.add(document, "keydown", move |e: KeyboardEvent| {
                let code = e.code();
                let mut input = input.borrow_mut();
                if input.bindings.is_escape(&code) {
                    document_for_exit.exit_pointer_lock();
                }
                // Prevent scrolling on navigation keys
                if input.bindings.is_navigation(&code) {
                    e.prevent_default();
                }
                input.handle_event(&InputEvent::KeyDown(code), now_secs(&window));
            })?;
        }

        // Keyboard up
        {
            let input = input.clone();
            let window = window.clone();
            listeners.add(document, "keyup", move |e: KeyboardEvent| {
                input.borrow_mut().handle_event(&InputEvent::KeyUp(e.code()), now_secs(&window));
            })?;
        }

        // Focus loss - clear all keys
        {
            let input = input.clone();
            let window_for_time = window.clone();
            listeners.add(window, "blur", move |_e: web_sys::Event| {
                input.borrow_mut().handle_event(&InputEvent::FocusLost, now_secs(&window_for_time));
            })?;
        }

        // Visibility change - clear all keys
        {
            let input = input.clone();
            let window = window.clone();
            let doc = document.clone();
            listeners.add(document, "visibilitychange", move |_e: web_sys::Event| {
                let visible = !doc.hidden();
                input.borrow_mut().handle_event(&InputEvent::VisibilityChanged { visible }, now_secs(&window));
            })?;
        }

        // Pointer lock change
        {
            let input = input.clone();
            let window = window.clone();
            let doc = document.clone();
            listeners.add(document, "pointerlockchange", move |_e: web_sys::Event| {
                let locked = doc.pointer_lock_element().is_some();
                input.borrow_mut().handle_event(&InputEvent::PointerLockChanged { locked }, now_secs(&window));
            })?;
        }

        // Canvas click to enter pointer lock (keyboard devices only)
        {
            let input = input.clone();
            let canvas_click = canvas.clone();
            listeners.add(canvas, "click", move |_e: MouseEvent| {
                if input.borrow().source.device_class() == DeviceClass::Keyboard {
                    canvas_click.request_pointer_lock();
                }
            })?;
        }

        // Mouse move: camera look under pointer lock, egui otherwise
        {
            let input = input.clone();
            let window = window.clone();
            let egui_events = egui_events.clone();
            listeners.add(document, "mousemove", move |e: MouseEvent| {
                let mut input = input.borrow_mut();
                if input.pointer_locked {
                    let event = InputEvent::MouseMove { dx: e.movement_x() as f32, dy: e.movement_y() as f32 };
                    input.handle_event(&event, now_secs(&window));
                } else {
                    let pos = egui::pos2(e.client_x() as f32, e.client_y() as f32);
                    egui_events.borrow_mut().push(egui::Event::PointerMoved(pos));
                }
            })?;
        }

        // Mouse buttons for the egui windows
        for (event, pressed) in [("mousedown", true), ("mouseup", false)] {
            let input = input.clone();
            let egui_events = egui_events.clone();
            listeners.add(document, event, move |e: MouseEvent| {
                if input.borrow().pointer_locked || e.button() != 0 {
                    return;
                }
                egui_events.borrow_mut().push(egui::Event::PointerButton {
                    pos: egui::pos2(e.client_x() as f32, e.client_y() as f32),
                    button: egui::PointerButton::Primary,
                    pressed,
                    modifiers: egui::Modifiers::default(),
                });
            })?;
        }

        // Touch: joystick, buttons and look drag
        for event in ["touchstart", "touchmove", "touchend", "touchcancel"] {
            let input = input.clone();
            let window = window.clone();
            listeners.add_active(canvas, event, move |e: TouchEvent| {
                e.prevent_default();
                let now = now_secs(&window);
                let touches = e.changed_touches();
                let mut input = input.borrow_mut();
                for i in 0..touches.length() {
                    let Some(t) = touches.get(i) else { continue };
                    let id = t.identifier() as u32 as u64;
                    let (x, y) = (t.client_x() as f32, t.client_y() as f32);
                    let event = match event {
                        "touchstart" => InputEvent::TouchStart { id, x, y },
                        "touchmove" => InputEvent::TouchMove { id, x, y },
                        _ => InputEvent::TouchEnd { id },
                    };
                    input.handle_event(&event, now);
                }
            })?;
        }

        tracing::debug!(count = listeners.len(), "input listeners registered");
        Ok(listeners)
    }

    fn detect_device(window: &Window) -> DeviceClass {
        let navigator = window.navigator();
        let user_agent = navigator.user_agent().unwrap_or_default();
        DeviceClass::detect(&user_agent, navigator.max_touch_points())
    }

    /// Window size in CSS pixels
    fn viewport_size(window: &Window) -> (f32, f32) {
        let w = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(800.0);
        let h = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(600.0);
        (w as f32, h as f32)
    }

    /// Canvas backing store size in device pixels
    fn backing_size(window: &Window, css_width: f32, css_height: f32) -> (u32, u32) {
        let dpr = window.device_pixel_ratio() as f32;
        ((css_width * dpr).max(1.0) as u32, (css_height * dpr).max(1.0) as u32)
    }

    fn init_canvas() -> Result<(Window, Document, HtmlCanvasElement), AppError> {
        let window = web_sys::window().ok_or(AppError::Dom("global `window`"))?;
        let document = window.document().ok_or(AppError::Dom("document on window"))?;
        let body = document.body().ok_or(AppError::Dom("body on document"))?;
        let canvas = document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| AppError::Dom("canvas element"))?;
        canvas.set_attribute(
            "style",
            "position: fixed; inset: 0; width: 100vw; height: 100vh; display: block; touch-action: none;",
        )?;
        body.append_child(&canvas)?;
        Ok((window, document, canvas))
    }

    /// Replace the page content with a readable startup error
    fn show_fatal_error(err: &AppError) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else { return };
        let Some(body) = document.body() else { return };
        let Ok(message) = document.create_element("div") else { return };
        let _ = message.set_attribute(
            "style",
            "position: fixed; inset: 0; display: flex; align-items: center; justify-content: center; \
             padding: 2em; background: #111; color: #eee; font: 16px sans-serif; text-align: center;",
        );
        message.set_text_content(Some(&format!("Monke Craft could not start: {err}")));
        let _ = body.append_child(&message);
    }
}
