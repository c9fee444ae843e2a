//! The machine room application.
//!
//! [`MachineRoom`] ties everything together: it owns the window and rendering
//! context, the texture cache, the loaded scene and the observer callbacks.
//! Scene loads are queued until the window exists; `run` drives the winit
//! event loop, rendering continuously and picking on every cursor move.

use std::{
    iter,
    path::{Path, PathBuf},
    sync::Arc,
};

#[cfg(feature = "integration-tests")]
use std::sync::atomic::{AtomicU32, Ordering};

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    context::Context,
    picking::{PickTransition, Ray},
    pipelines::unlit,
    resources::{self, cache::TextureCache},
    scene::{HIGHLIGHT_MAP, PLAIN_MAP, Scene, SceneObject},
};

type EnterCallback = Box<dyn FnMut(&SceneObject)>;
type MoveCallback = Box<dyn FnMut(f32, f32)>;
type ExitCallback = Box<dyn FnMut()>;

/// Observer callbacks fired synchronously during picking.
///
/// All three default to no-ops and can be replaced at any time.
#[derive(Default)]
struct PickEvents {
    on_enter: Option<EnterCallback>,
    on_move: Option<MoveCallback>,
    on_exit: Option<ExitCallback>,
}

pub struct MachineRoom {
    asset_dir: PathBuf,
    cache: TextureCache,
    scene: Scene,
    events: PickEvents,
    /// Scene files requested before the rendering context existed.
    pending_scenes: Vec<String>,
    ctx: Option<Context>,
    #[cfg(feature = "integration-tests")]
    frame_limit: Option<(u32, Arc<AtomicU32>)>,
}

impl Default for MachineRoom {
    fn default() -> Self {
        Self::new("./models/")
    }
}

impl MachineRoom {
    /// Create a visualization resolving assets against `asset_dir`.
    ///
    /// Nothing touches the GPU yet; the window and device are created when
    /// [`MachineRoom::run`] starts the event loop.
    pub fn new(asset_dir: impl Into<PathBuf>) -> Self {
        let asset_dir = asset_dir.into();
        Self {
            cache: TextureCache::new(&asset_dir),
            asset_dir,
            scene: Scene::new(),
            events: PickEvents::default(),
            pending_scenes: Vec::new(),
            ctx: None,
            #[cfg(feature = "integration-tests")]
            frame_limit: None,
        }
    }

    /// Stop the event loop after `max` presented frames.
    ///
    /// Rendering otherwise reschedules itself until the window closes, so
    /// integration tests cap the loop here and assert against the returned
    /// frame counter once `run` comes back.
    #[cfg(feature = "integration-tests")]
    pub fn limit_frames(&mut self, max: u32) -> Arc<AtomicU32> {
        let rendered = Arc::new(AtomicU32::new(0));
        self.frame_limit = Some((max, Arc::clone(&rendered)));
        rendered
    }

    /// Queue a scene file for loading.
    ///
    /// Fire-and-forget: the load happens once the rendering context exists,
    /// and a failure is logged rather than surfaced. Until the load finishes
    /// picking simply finds nothing.
    pub fn load_scene(&mut self, name: impl Into<String>) {
        let name = name.into();
        match &self.ctx {
            Some(ctx) => {
                let path = self.asset_dir.join(&name);
                load_into(&mut self.scene, &path, ctx, &mut self.cache);
            }
            None => self.pending_scenes.push(name),
        }
    }

    /// Replace the callback fired when the cursor enters a cabinet.
    pub fn on_enter(&mut self, callback: impl FnMut(&SceneObject) + 'static) {
        self.events.on_enter = Some(Box::new(callback));
    }

    /// Replace the callback fired on every cursor move over a cabinet.
    pub fn on_move(&mut self, callback: impl FnMut(f32, f32) + 'static) {
        self.events.on_move = Some(Box::new(callback));
    }

    /// Replace the callback fired when the cursor leaves a cabinet.
    pub fn on_exit(&mut self, callback: impl FnMut() + 'static) {
        self.events.on_exit = Some(Box::new(callback));
    }

    /// Pick at a cursor position in window pixels, origin top-left.
    ///
    /// Called internally on every cursor move; public so a host embedding
    /// the visualization can drive it directly. A no-op before the window
    /// exists or while no scene is loaded.
    pub fn select_at(&mut self, x: f32, y: f32) {
        let Some(ctx) = &self.ctx else { return };
        let view_proj = ctx.camera.camera.view_proj();
        let (width, height) = (ctx.config.width as f32, ctx.config.height as f32);

        let hit = Ray::from_screen(x, y, width, height, view_proj)
            .and_then(|ray| self.scene.pick(&ray));
        self.apply_hit(hit, x, y);
    }

    /// Apply a pick result to scene state and fire the matching callbacks.
    ///
    /// Move fires on every hit; enter additionally fires when the hovered
    /// object changed, after the previous one was reset.
    fn apply_hit(&mut self, hit: Option<usize>, x: f32, y: f32) {
        match self.scene.apply_pick(hit) {
            PickTransition::Moved { .. } => {
                if let Some(callback) = &mut self.events.on_move {
                    callback(x, y);
                }
            }
            PickTransition::Entered { hit, .. } => {
                if let Some(callback) = &mut self.events.on_move {
                    callback(x, y);
                }
                if let Some(callback) = &mut self.events.on_enter {
                    callback(&self.scene.objects[hit]);
                }
            }
            PickTransition::Left { .. } => {
                if let Some(callback) = &mut self.events.on_exit {
                    callback();
                }
            }
            PickTransition::Idle => {}
        }
    }

    /// Run the event loop until the window is closed.
    pub fn run(mut self) -> anyhow::Result<()> {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        }

        let event_loop = EventLoop::new()?;
        event_loop.run_app(&mut self)?;
        Ok(())
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let Some(ctx) = &self.ctx else {
            return Ok(());
        };

        let output = ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Build any GPU resources the scene still lacks before the pass
        // starts; bind groups go stale whenever a map was swapped.
        for object in &mut self.scene.objects {
            object.ensure_uploaded(&ctx.device);
            if object.material.bind_group.is_none() {
                let texture = match &object.material.map {
                    Some(name) => self.cache.get_or_load(name, &ctx.device, &ctx.queue),
                    None => self.cache.white(&ctx.device, &ctx.queue),
                };
                object.material.bind_group = Some(unlit::mk_material_bind_group(
                    &ctx.device,
                    &ctx.material_layout,
                    &texture,
                    object.material.colour,
                ));
            }
        }

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&ctx.pipeline);
            render_pass.set_bind_group(1, &ctx.camera.bind_group, &[]);

            for object in &self.scene.objects {
                let (Some(buffers), Some(bind_group)) =
                    (&object.buffers, &object.material.bind_group)
                else {
                    continue;
                };
                render_pass.set_bind_group(0, bind_group, &[]);
                render_pass.set_vertex_buffer(0, buffers.vertex_buffer.slice(..));
                render_pass.set_vertex_buffer(1, buffers.instance_buffer.slice(..));
                render_pass
                    .set_index_buffer(buffers.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..buffers.num_indices, 0, 0..1);
            }
        }

        ctx.queue.submit(iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

/// Load a scene file into the scene, logging instead of failing.
fn load_into(scene: &mut Scene, path: &Path, ctx: &Context, cache: &mut TextureCache) {
    match resources::load_objects(path, &ctx.device, &ctx.queue, cache) {
        Ok(objects) => scene.add_objects(objects),
        Err(e) => log::warn!("Failed to load scene {}: {}", path.display(), e),
    }
}

impl ApplicationHandler for MachineRoom {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.ctx.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes().with_title("Machine Room");
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let ctx = match pollster::block_on(Context::new(window)) {
            Ok(ctx) => ctx,
            Err(e) => {
                log::error!("Failed to initialize rendering context: {}", e);
                event_loop.exit();
                return;
            }
        };

        // Warm the cache with both cabinet maps so the first highlight swap
        // does not hit the filesystem mid-frame.
        self.cache.get_or_load(PLAIN_MAP, &ctx.device, &ctx.queue);
        self.cache.get_or_load(HIGHLIGHT_MAP, &ctx.device, &ctx.queue);

        for name in std::mem::take(&mut self.pending_scenes) {
            let path = self.asset_dir.join(&name);
            load_into(&mut self.scene, &path, &ctx, &mut self.cache);
        }

        ctx.window.request_redraw();
        self.ctx = Some(ctx);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        if let Some(ctx) = &mut self.ctx {
            if ctx
                .camera
                .controller
                .process_event(&event, &mut ctx.camera.camera)
            {
                ctx.upload_camera();
            }
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(ctx) = &mut self.ctx {
                    ctx.resize(size.width, size.height);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.select_at(position.x as f32, position.y as f32);
            }
            WindowEvent::RedrawRequested => {
                match self.render() {
                    Ok(()) => {
                        #[cfg(feature = "integration-tests")]
                        if let Some((max, rendered)) = &self.frame_limit {
                            if rendered.fetch_add(1, Ordering::SeqCst) + 1 >= *max {
                                event_loop.exit();
                                return;
                            }
                        }
                    }
                    // The surface needs reconfiguring; resize does that.
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        if let Some(ctx) = &mut self.ctx {
                            let (width, height) = (ctx.config.width, ctx.config.height);
                            ctx.resize(width, height);
                        }
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of GPU memory, exiting");
                        event_loop.exit();
                    }
                    Err(e) => log::warn!("Dropped frame: {}", e),
                }
                // Reschedule immediately; the surface's present mode paces
                // the loop to the display refresh.
                if let Some(ctx) = &self.ctx {
                    ctx.window.request_redraw();
                }
            }
            _ => {}
        }
    }
}
