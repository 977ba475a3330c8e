use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use glam::Vec2;
use pixelgrab_input::InputState;
use pixelgrab_kernel::{
    GrabPolicy, InteractionEvent, InteractionState, ObjectRegistry, StepInput, step,
};
use pixelgrab_render::{AppearancePolicy, CanvasLayout, FlatAppearance, HighlightAppearance};
use pixelgrab_render_wgpu::{FirstPersonCamera, WgpuRenderer};
use pixelgrab_tools::SceneInspector;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

#[derive(Parser)]
#[command(
    name = "pixelgrab-desktop",
    about = "Grab and carry boxes in a pixelated first-person scene"
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Window width in pixels
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u32).range(1..))]
    width: u32,

    /// Window height in pixels
    #[arg(long, default_value_t = 600, value_parser = clap::value_parser!(u32).range(1..))]
    height: u32,

    /// Display pixels per canvas pixel
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
    pixel_size: u32,

    /// Number of boxes to scatter
    #[arg(long, default_value_t = 5)]
    boxes: usize,

    /// Seed for box placement (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Frame rate cap
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
    target_fps: u32,

    /// Closest a held box may come to the viewer
    #[arg(long)]
    min_grab_distance: Option<f32>,

    /// Tint sighted and held boxes
    #[arg(long)]
    highlight: bool,
}

/// Application state.
struct AppState {
    registry: ObjectRegistry,
    interaction: InteractionState,
    policy: GrabPolicy,
    appearance: Box<dyn AppearancePolicy>,
    camera: FirstPersonCamera,
    input: InputState,
    seed: u64,
    show_inspector: bool,
    // Input state
    keys_held: HashSet<KeyCode>,
    focused: bool,
    last_frame: Instant,
    frame_interval: Duration,
}

impl AppState {
    fn new(cli: &Cli, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let registry = ObjectRegistry::scatter(cli.boxes, &mut rng);

        let appearance: Box<dyn AppearancePolicy> = if cli.highlight {
            Box::new(HighlightAppearance)
        } else {
            Box::new(FlatAppearance)
        };

        let mut camera = FirstPersonCamera::default();
        camera.set_viewport(glam::UVec2::new(cli.width, cli.height));

        Self {
            registry,
            interaction: InteractionState::new(),
            policy: GrabPolicy {
                min_distance: cli.min_grab_distance,
                ..GrabPolicy::default()
            },
            appearance,
            camera,
            input: InputState::new(),
            seed,
            show_inspector: false,
            keys_held: HashSet::new(),
            focused: true,
            last_frame: Instant::now(),
            frame_interval: Duration::from_secs_f64(1.0 / cli.target_fps as f64),
        }
    }

    /// Camera movement, pointer ray and one interaction step.
    fn update(&mut self, dt: f32, layout: &CanvasLayout) {
        let speed_mult = if self.keys_held.contains(&KeyCode::ShiftLeft) {
            2.0
        } else {
            1.0
        };
        let dt_scaled = dt * speed_mult;

        if self.keys_held.contains(&KeyCode::KeyW) {
            self.camera.move_forward(dt_scaled);
        }
        if self.keys_held.contains(&KeyCode::KeyS) {
            self.camera.move_backward(dt_scaled);
        }
        if self.keys_held.contains(&KeyCode::KeyA) {
            self.camera.move_left(dt_scaled);
        }
        if self.keys_held.contains(&KeyCode::KeyD) {
            self.camera.move_right(dt_scaled);
        }

        // The pointer is held at the center, so the ray is the view direction.
        self.input.set_pointer(layout.display_center());
        let frame = self.input.take_frame(dt);

        let input = StepInput {
            elapsed: frame.elapsed,
            ray: self.camera.pointer_ray(frame.pointer, layout.display_size()),
            grab_held: frame.grab_held,
            scroll_delta: frame.scroll_delta,
            viewer_position: self.camera.position,
        };
        let outcome = step(&mut self.registry, self.interaction, &input, &self.policy);
        self.interaction = outcome.state;

        for event in outcome.events {
            match event {
                InteractionEvent::GrabStarted { id, distance } => {
                    tracing::info!(%id, distance, "grabbed");
                }
                InteractionEvent::Released { id } => {
                    tracing::info!(%id, "released");
                }
                InteractionEvent::Moved { .. } => {}
            }
        }
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.keys_held.insert(key);
        } else {
            self.keys_held.remove(&key);
        }

        if pressed && key == KeyCode::F1 {
            self.show_inspector = !self.show_inspector;
        }
    }

    fn lose_focus(&mut self) {
        self.focused = false;
        self.keys_held.clear();
        self.input.release_all();
    }

    fn draw_ui(&self, ctx: &EguiContext) {
        if !self.show_inspector {
            return;
        }

        let summary = SceneInspector::summary(&self.registry, &self.interaction);

        egui::SidePanel::left("inspector")
            .default_width(320.0)
            .show(ctx, |ui| {
                ui.heading("pixelgrab");
                ui.separator();
                ui.label(format!("Seed: {}", self.seed));
                ui.label(format!(
                    "Boxes: {}  Sighted: {}",
                    summary.object_count, summary.looked_at
                ));
                match (summary.grabbed, summary.grab_distance) {
                    (Some(id), Some(distance)) => {
                        ui.label(format!("Holding {id} at {distance:.2}"));
                    }
                    _ => {
                        ui.label("Holding nothing");
                    }
                }
                ui.label(format!(
                    "Camera: ({:.1}, {:.1}, {:.1})",
                    self.camera.position.x, self.camera.position.y, self.camera.position.z
                ));
                ui.separator();

                ui.heading("Boxes");
                for info in SceneInspector::list_objects(&self.registry) {
                    ui.monospace(info.to_string());
                }

                ui.separator();
                ui.small("F1: Toggle Inspector | Mouse: Look | WASD: Move | LMB: Grab | Wheel: Distance");
            });
    }
}

/// Everything that exists only while a window is open.
///
/// Field order is drop order: GPU objects go before the window they render to.
struct Gpu {
    renderer: WgpuRenderer,
    egui_renderer: egui_wgpu::Renderer,
    egui_winit: egui_winit::State,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    queue: wgpu::Queue,
    device: wgpu::Device,
    window: Arc<Window>,
}

impl Gpu {
    fn init(event_loop: &ActiveEventLoop, egui_ctx: &EguiContext, cli: &Cli) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("pixelgrab")
            .with_inner_size(PhysicalSize::new(cli.width, cli.height))
            .with_resizable(false);
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("failed to create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("pixelgrab_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("failed to create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let layout = CanvasLayout::new(config.width, config.height, cli.pixel_size)?;
        let renderer = WgpuRenderer::new(
            &device,
            surface_format,
            layout,
            cli.boxes.try_into().context("too many boxes")?,
        );

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            canvas = ?layout.canvas_size(),
            "GPU initialized"
        );

        Ok(Self {
            renderer,
            egui_renderer,
            egui_winit,
            surface,
            config,
            queue,
            device,
            window,
        })
    }

    fn capture_pointer(&self) {
        let grabbed = self
            .window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
        if let Err(e) = grabbed {
            tracing::warn!("pointer capture unavailable: {e}");
        }
        self.window.set_cursor_visible(false);
    }

    fn release_pointer(&self) {
        if let Err(e) = self.window.set_cursor_grab(CursorGrabMode::None) {
            tracing::warn!("failed to release pointer: {e}");
        }
        self.window.set_cursor_visible(true);
    }

    fn recenter_pointer(&self, center: Vec2) {
        let position = PhysicalPosition::new(center.x as f64, center.y as f64);
        if let Err(e) = self.window.set_cursor_position(position) {
            tracing::trace!("pointer re-center skipped: {e}");
        }
    }

    fn resize(&mut self, size: PhysicalSize<u32>, pixel_size: u32) -> Result<()> {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        let layout = CanvasLayout::new(self.config.width, self.config.height, pixel_size)?;
        self.renderer.resize(&self.device, &self.queue, layout);
        Ok(())
    }

    fn draw_egui(&mut self, view: &wgpu::TextureView, egui_ctx: &EguiContext, state: &AppState) {
        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, |ctx| {
            state.draw_ui(ctx);
        });

        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

struct GpuApp {
    cli: Cli,
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
    init_error: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(cli: Cli, seed: u64) -> Self {
        Self {
            state: AppState::new(&cli, seed),
            cli,
            gpu: None,
            egui_ctx: EguiContext::default(),
            init_error: None,
        }
    }

    fn redraw(&mut self) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        let now = Instant::now();
        let dt = (now - self.state.last_frame).as_secs_f32();
        self.state.last_frame = now;
        gpu.window
            .set_title(&format!("pixelgrab - {:.2} ms", dt * 1000.0));

        let layout = *gpu.renderer.layout();
        self.state.update(dt.min(0.1), &layout);
        if self.state.focused {
            gpu.recenter_pointer(layout.display_center());
        }

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.renderer.render(
            &gpu.device,
            &gpu.queue,
            &view,
            &self.state.camera,
            &self.state.registry,
            self.state.appearance.as_ref(),
        );
        gpu.draw_egui(&view, &self.egui_ctx, &self.state);

        output.present();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        match Gpu::init(event_loop, &self.egui_ctx, &self.cli) {
            Ok(gpu) => {
                gpu.capture_pointer();
                self.state.last_frame = Instant::now();
                self.gpu = Some(gpu);
            }
            Err(e) => {
                tracing::error!("initialization failed: {e:#}");
                self.init_error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        if self.state.show_inspector {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if new_size.width == 0 || new_size.height == 0 {
                    return;
                }
                if let Err(e) = gpu.resize(new_size, self.cli.pixel_size) {
                    tracing::warn!("resize ignored: {e:#}");
                    return;
                }
                self.state
                    .camera
                    .set_viewport(gpu.renderer.layout().display_size());
            }
            WindowEvent::Focused(focused) => {
                if focused {
                    self.state.focused = true;
                    gpu.capture_pointer();
                } else {
                    self.state.lose_focus();
                    gpu.release_pointer();
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                let pressed = key_state == ElementState::Pressed;
                if pressed && key == KeyCode::Escape {
                    tracing::info!("escape pressed, exiting");
                    event_loop.exit();
                    return;
                }
                self.state.handle_key(key, pressed);
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: btn_state,
                ..
            } => {
                self.state
                    .input
                    .set_grab_button(btn_state == ElementState::Pressed);
            }
            WindowEvent::MouseWheel { delta, .. } => match delta {
                MouseScrollDelta::LineDelta(_, y) => self.state.input.scroll_lines(y),
                MouseScrollDelta::PixelDelta(pos) => {
                    self.state.input.scroll_pixels(pos.y as f32);
                }
            },
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.state.focused {
                self.state.camera.rotate(delta.0 as f32, delta.1 as f32);
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gpu) = &self.gpu else {
            return;
        };
        let next_frame = self.state.last_frame + self.state.frame_interval;
        if Instant::now() >= next_frame {
            gpu.window.request_redraw();
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(next_frame));
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if self.gpu.take().is_some() {
            tracing::info!("GPU resources released");
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let seed = cli.seed.unwrap_or_else(rand::random);
    tracing::info!(seed, boxes = cli.boxes, "pixelgrab-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(cli, seed);
    event_loop.run_app(&mut app)?;

    match app.init_error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
