use std::collections::HashSet;

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use scribe_engine::device::{Gpu, GpuInit, SurfaceErrorAction};
use scribe_engine::math::screen::{Projection, screen_to_world};
use scribe_engine::math::{Mat4, Vec2, to_radians};
use scribe_engine::render::{BatchRenderer, FrameStats, RenderBackend, WgpuBackend};
use scribe_engine::scene::{Circle, IdGenerator, Polyline, Rgb, Scene, joint_circles};
use scribe_engine::text::{FontAtlas, FontAtlasConfig};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::camera::Camera;
use crate::config::StudioConfig;
use crate::demo::demo_scene;

pub fn run(config: StudioConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    let mut studio = Studio::new(config);
    event_loop
        .run_app(&mut studio)
        .context("winit event loop terminated with error")?;
    Ok(())
}

#[self_referencing]
struct WindowSurface {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Tool {
    Select,
    Line,
    Brush,
}

struct Studio {
    config: StudioConfig,
    camera: Camera,
    keys_down: HashSet<KeyCode>,
    ids: &'static IdGenerator,
    scene: Scene,
    tool: Tool,
    polyline: Option<Polyline>,
    next_group: i32,
    /// Last cursor position in physical pixels.
    cursor: Option<Vec2>,
    painting: bool,

    surface: Option<WindowSurface>,
    renderer: Option<BatchRenderer<WgpuBackend>>,
    /// Counters shown in the title, refreshed when a frame's differ.
    shown_stats: Option<FrameStats>,
    exit_requested: bool,
}

impl Studio {
    fn new(config: StudioConfig) -> Self {
        let ids = IdGenerator::global();
        Self {
            camera: Camera::at(config.camera),
            config,
            keys_down: HashSet::new(),
            ids,
            scene: demo_scene(ids),
            tool: Tool::Select,
            polyline: None,
            next_group: 1,
            cursor: None,
            painting: false,
            surface: None,
            renderer: None,
            shown_stats: None,
            exit_requested: false,
        }
    }

    fn open_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);
        let window = event_loop.create_window(attrs).context("failed to create window")?;

        let surface = WindowSurfaceTryBuilder {
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, GpuInit::default())),
        }
        .try_build()?;

        let backend = surface.with_gpu(|gpu| {
            let size = gpu.size();
            WgpuBackend::new(gpu.device(), gpu.queue(), size.width, size.height, gpu.surface_format())
        })?;
        let mut renderer = BatchRenderer::new(backend, self.config.batch.clone());

        match &self.config.font_path {
            Some(path) => match load_font(path) {
                Ok(atlas) => renderer.set_font(atlas),
                Err(e) => log::warn!("text disabled: {e:#}"),
            },
            None => log::warn!("no font given (argument or {}); text uses placeholder quads", crate::config::FONT_ENV),
        }

        self.surface = Some(surface);
        self.renderer = Some(renderer);
        Ok(())
    }

    fn projection(&self) -> Option<Projection> {
        let size = self.surface.as_ref()?.with_gpu(|gpu| gpu.size());
        if size.width == 0 || size.height == 0 {
            return None;
        }
        Some(Projection {
            fov_y: to_radians(self.config.fov_y),
            aspect: size.width as f32 / size.height as f32,
            width: size.width as f32,
            height: size.height as f32,
        })
    }

    fn cursor_world(&self) -> Option<Vec2> {
        let cursor = self.cursor?;
        let proj = self.projection()?;
        Some(screen_to_world(cursor, self.camera.eye(), self.config.batch.painting_layer, proj))
    }

    fn redraw(&mut self) {
        let Some(proj) = self.projection() else { return };
        let projection = Mat4::perspective(proj.fov_y, proj.aspect, self.config.near, self.config.far);
        if self.camera.update(&self.keys_down, self.config.batch.painting_layer, self.config.near) {
            self.aim_polyline();
        }
        let view = self.camera.view();

        let Self { surface, renderer, scene, polyline, .. } = self;
        let (Some(surface), Some(renderer)) = (surface.as_mut(), renderer.as_mut()) else { return };

        let mut fatal = false;
        surface.with_gpu_mut(|gpu| {
            let frame = match gpu.acquire() {
                Ok(frame) => frame,
                Err(e) => {
                    log::debug!("surface error: {e}");
                    fatal = gpu.handle_surface_error(e) == SurfaceErrorAction::Fatal;
                    return;
                }
            };

            renderer.begin_scene(projection, view);
            scene.submit(renderer);
            if let Some(polyline) = polyline.as_ref() {
                let radius = renderer.config().line_thickness / 2.0;
                for line in polyline.segments() {
                    renderer.draw_line(line);
                }
                for joint in joint_circles(polyline.segments(), radius) {
                    renderer.draw_circle(&joint);
                }
            }
            renderer.end_scene(&frame.view);
            gpu.present(frame);
        });

        let stats = renderer.stats();
        if !fatal && self.shown_stats != Some(stats) {
            log::debug!("frame stats: {stats:?}");
            let title = format!(
                "{} | quads {} circles {} glyphs {} | batches {}",
                self.config.title,
                stats.quads.primitives,
                stats.circles.primitives,
                stats.glyphs.primitives,
                stats.total_batches()
            );
            surface.with_window(|w| w.set_title(&title));
            self.shown_stats = Some(stats);
        }

        if fatal {
            log::error!("surface out of memory; exiting");
            self.exit_requested = true;
        }
    }

    fn pick(&self) {
        let (Some(cursor), Some(renderer), Some(surface)) = (self.cursor, &self.renderer, &self.surface) else {
            return;
        };
        let window = surface.with_gpu(|gpu| gpu.size());
        let (tw, th) = renderer.backend().target_size();
        // The offscreen target keeps its initial size; rescale after resizes.
        let x = (cursor.x / window.width.max(1) as f32 * tw as f32) as u32;
        let y = (cursor.y / window.height.max(1) as f32 * th as f32) as u32;

        match renderer.id_reader().pick(x.min(tw - 1), y.min(th - 1)) {
            Ok(id) if id.is_none() => log::info!("pick ({x}, {y}): nothing"),
            Ok(id) => match self.scene.find(id) {
                Some(hit) => log::info!("pick ({x}, {y}): {id} {hit:?}"),
                None => log::info!("pick ({x}, {y}): {id} (not in scene)"),
            },
            Err(e) => log::warn!("pick failed: {e}"),
        }
    }

    fn press(&mut self) {
        match self.tool {
            Tool::Select => self.pick(),
            Tool::Line => {
                let Some(at) = self.cursor_world() else { return };
                match self.polyline.as_mut() {
                    Some(polyline) => polyline.commit(at, self.ids),
                    None => {
                        self.polyline = Some(Polyline::start(self.next_group, at, Rgb::WHITE, self.ids));
                        self.next_group += 1;
                    }
                }
            }
            Tool::Brush => {
                self.painting = true;
                self.paint();
            }
        }
    }

    fn paint(&mut self) {
        if !self.painting {
            return;
        }
        if let Some(at) = self.cursor_world() {
            let dab = Circle::new(at, self.config.brush_radius)
                .with_color(Rgb::new(0.85, 0.85, 0.9))
                .with_id(self.ids.next_id());
            self.scene.push(dab);
        }
    }

    fn aim_polyline(&mut self) {
        if let Some(at) = self.cursor_world() {
            if let Some(polyline) = self.polyline.as_mut() {
                polyline.aim(at);
            }
        }
    }

    fn finish_polyline(&mut self) {
        if let Some(polyline) = self.polyline.take() {
            let lines = polyline.finish();
            log::info!("polyline committed with {} segments", lines.len());
            self.scene.extend_lines(lines);
        }
    }

    fn select_tool(&mut self, tool: Tool) {
        if tool != Tool::Line {
            self.finish_polyline();
        }
        self.painting = false;
        self.tool = tool;
        log::info!("tool: {tool:?}");
    }

    fn key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Digit1 => self.select_tool(Tool::Select),
            KeyCode::Digit2 => self.select_tool(Tool::Line),
            KeyCode::Digit3 => self.select_tool(Tool::Brush),
            KeyCode::Enter | KeyCode::Escape => self.finish_polyline(),
            _ => {}
        }
    }
}

impl ApplicationHandler for Studio {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.surface.is_some() {
            return;
        }
        if let Err(e) = self.open_window(event_loop) {
            log::error!("failed to open the studio window: {e:#}");
            self.exit_requested = true;
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(surface) = &self.surface {
            surface.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.renderer = None;
                self.surface = None;
                self.exit_requested = true;
            }
            WindowEvent::Resized(size) => {
                if let Some(surface) = self.surface.as_mut() {
                    surface.with_gpu_mut(|gpu| gpu.resize(size));
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some(Vec2::new(position.x as f32, position.y as f32));
                self.aim_polyline();
                self.paint();
            }
            WindowEvent::MouseInput { state, button: MouseButton::Left, .. } => match state {
                ElementState::Pressed => self.press(),
                ElementState::Released => self.painting = false,
            },
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    match event.state {
                        ElementState::Pressed if Camera::is_navigation_key(code) => {
                            self.keys_down.insert(code);
                        }
                        ElementState::Pressed if !event.repeat => self.key(code),
                        ElementState::Pressed => {}
                        ElementState::Released => {
                            self.keys_down.remove(&code);
                        }
                    }
                }
            }
            WindowEvent::Focused(false) => self.keys_down.clear(),
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }
}

fn load_font(path: &std::path::Path) -> Result<FontAtlas> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read font {}", path.display()))?;
    let atlas = FontAtlas::from_bytes(&bytes, &FontAtlasConfig::default())
        .with_context(|| format!("failed to build atlas from {}", path.display()))?;
    Ok(atlas)
}
