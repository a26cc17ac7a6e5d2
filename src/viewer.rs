//! Windowed runner: winit event loop driving the engine and the GPU adapter.

use crate::control::ControlSurface;
use crate::engine::{Constellation, MorphEngine};
use crate::error::ViewerError;
use crate::formation::Formation;
use crate::gpu::{GpuState, WINDOW_TITLE};
use crate::time::FrameClock;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

/// Camera idle drift while scattered, in radians per second.
const AUTO_ROTATE_SPEED: f32 = 0.05;

pub(crate) fn run(builder: Constellation) -> Result<(), ViewerError> {
    let engine = builder.build()?;
    let backdrop = builder.build_backdrop()?;
    let Constellation { label, control, .. } = builder;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = Viewer::new(engine, backdrop, label, control);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

struct Viewer {
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    engine: Option<MorphEngine>,
    backdrop: Option<Formation>,
    label: String,
    control: ControlSurface,
    clock: FrameClock,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    error: Option<ViewerError>,
}

impl Viewer {
    fn new(
        engine: MorphEngine,
        backdrop: Option<Formation>,
        label: String,
        control: ControlSurface,
    ) -> Self {
        Self {
            window: None,
            gpu_state: None,
            engine: Some(engine),
            backdrop,
            label,
            control,
            clock: FrameClock::new(),
            mouse_pressed: false,
            last_mouse_pos: None,
            error: None,
        }
    }

    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), ViewerError> {
        let count = match &self.engine {
            Some(engine) => engine.count(),
            None => return Ok(()),
        };

        let window_attrs = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu_state = pollster::block_on(GpuState::new(
            window.clone(),
            count,
            self.backdrop.as_ref().map(|b| b.points()),
            self.label.clone(),
        ))?;

        self.window = Some(window);
        self.gpu_state = Some(gpu_state);
        // Don't report window creation time as the first frame's delta
        self.clock = FrameClock::new();
        Ok(())
    }

    fn toggle(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            self.control.toggle(engine);
        }
    }

    /// Drop GPU resources and particle buffers. Later redraws find nothing to do.
    fn teardown(&mut self) {
        if self.engine.is_some() {
            log::info!("Tearing down after {} frames", self.clock.frame());
        }
        self.gpu_state = None;
        self.engine = None;
        self.backdrop = None;
        self.window = None;
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: ViewerError) {
        log::error!("{}", error);
        self.error = Some(error);
        self.teardown();
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let delta = self.clock.tick();

        let (Some(engine), Some(gpu_state)) = (self.engine.as_mut(), self.gpu_state.as_mut()) else {
            return;
        };

        if !engine.is_aligned() && !self.mouse_pressed {
            gpu_state.camera.auto_rotate(delta, AUTO_ROTATE_SPEED);
        }

        if let Err(e) = engine.frame(delta, gpu_state) {
            self.fail(event_loop, e.into());
            return;
        }

        if gpu_state.is_out_of_memory() {
            self.teardown();
            event_loop.exit();
            return;
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init_window(event_loop) {
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.teardown();
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                match event.physical_key {
                    PhysicalKey::Code(KeyCode::Space) | PhysicalKey::Code(KeyCode::Enter) => {
                        self.toggle()
                    }
                    PhysicalKey::Code(KeyCode::KeyP) => self.clock.toggle_pause(),
                    PhysicalKey::Code(KeyCode::Escape) => {
                        self.teardown();
                        event_loop.exit();
                    }
                    _ => {}
                }
            }
            WindowEvent::MouseInput { state, button, .. } => match button {
                MouseButton::Left => {
                    self.mouse_pressed = state == ElementState::Pressed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
                MouseButton::Right if state == ElementState::Pressed => self.toggle(),
                _ => {}
            },
            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        let dx = (position.x - last_x) as f32;
                        let dy = (position.y - last_y) as f32;

                        if let Some(gpu_state) = &mut self.gpu_state {
                            gpu_state.camera.orbit(dx, dy);
                        }
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.camera.zoom(scroll);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.teardown();
    }
}
