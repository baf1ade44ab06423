//! Application main loop

use crate::Entry;
use anyhow::Result;
use app_core::{AppContext, Command, CommandId, FullscreenPlatform, ViewerCoordinator, ViewerMode, ViewportSession};
use app_ui::{
    components::{
        AssetImage, Calendar, ExplorerAction, FileExplorer, FlatView, SphericalView, StatusBar, StatusInfo,
        ViewerAction,
    },
    panorama::{PanoramaResources, SphereMesh},
    InputHandler, Renderer, Theme, WindowFullscreen, WINDOW_CONTAINER,
};
use egui_wgpu::ScreenDescriptor;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

/// The one viewer currently mounted
enum MountedViewer {
    Interactive(SphericalView),
    Static(FlatView),
}

impl MountedViewer {
    fn mount(ctx: &AppContext, platform: Arc<dyn FullscreenPlatform>, mode: &ViewerMode, renderer: &Renderer) -> Option<Self> {
        match mode {
            ViewerMode::Browsing => None,
            ViewerMode::Interactive(asset) => Some(MountedViewer::Interactive(SphericalView::mount(
                ctx,
                platform,
                asset.clone(),
                renderer.caps,
            ))),
            ViewerMode::Static(asset) => Some(MountedViewer::Static(FlatView::mount(
                ctx,
                platform,
                asset.clone(),
                renderer.caps,
            ))),
        }
    }

    fn session(&self) -> &ViewportSession {
        match self {
            MountedViewer::Interactive(view) => view.session(),
            MountedViewer::Static(view) => view.session(),
        }
    }

    fn image(&self) -> &AssetImage {
        match self {
            MountedViewer::Interactive(view) => view.image(),
            MountedViewer::Static(view) => view.image(),
        }
    }

    fn poll(&mut self) -> bool {
        match self {
            MountedViewer::Interactive(view) => view.poll(),
            MountedViewer::Static(view) => view.poll(),
        }
    }

    fn toggle_fullscreen(&self) {
        match self {
            MountedViewer::Interactive(view) => view.toggle_fullscreen(),
            MountedViewer::Static(view) => view.toggle_fullscreen(),
        }
    }

    fn ui(&mut self, ui: &mut egui::Ui) -> Option<ViewerAction> {
        match self {
            MountedViewer::Interactive(view) => view.ui(ui),
            MountedViewer::Static(view) => view.ui(ui),
        }
    }
}

/// Main application state for the event loop
struct App {
    ctx: AppContext,
    nav: ViewerCoordinator,

    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    egui_ctx: egui::Context,
    egui_state: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
    fullscreen: Option<Arc<WindowFullscreen>>,

    // Viewer slot, rebuilt whenever the coordinator's generation moves
    mounted: Option<MountedViewer>,
    mounted_generation: Option<u64>,

    // UI Components
    explorer: FileExplorer,
    calendar: Calendar,
    input_handler: Option<InputHandler>,
    theme: Theme,

    next_repaint: Option<Instant>,
    exit_requested: bool,
}

impl App {
    fn new(ctx: AppContext, entry: Entry) -> Self {
        let (default_image, theme) = {
            let config = ctx.config.read();
            (config.viewer.default_image_url.clone(), Theme::from_config(&config.general))
        };

        let mut nav = ViewerCoordinator::new(default_image);
        if entry.kind.is_some() {
            nav.enter(entry.kind, entry.payload);
        }

        Self {
            ctx,
            nav,

            window: None,
            renderer: None,
            egui_ctx: egui::Context::default(),
            egui_state: None,
            egui_renderer: None,
            fullscreen: None,

            mounted: None,
            mounted_generation: None,

            explorer: FileExplorer::new(),
            calendar: Calendar::new(),
            input_handler: None,
            theme,

            next_repaint: None,
            exit_requested: false,
        }
    }

    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_attrs = Window::default_attributes()
            .with_title("Site Survey Viewer")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 800));

        let window = Arc::new(event_loop.create_window(window_attrs)?);

        // Initialize renderer
        let renderer = pollster::block_on(Renderer::new(window.clone()))?;

        // Initialize egui
        let egui_state = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            None,
            None,
            None,
        );

        let mut egui_renderer = egui_wgpu::Renderer::new(&renderer.device, renderer.config.format, None, 1, false);

        let (mesh, keybindings) = {
            let config = self.ctx.config.read();
            let viewer = &config.viewer;
            (
                SphereMesh::new(viewer.sphere_radius, viewer.sphere_width_segments, viewer.sphere_height_segments),
                config.keybindings.clone(),
            )
        };
        egui_renderer.callback_resources.insert(PanoramaResources::new(
            &renderer.device,
            renderer.config.format,
            renderer.caps,
            &mesh,
        ));

        // Apply theme
        self.theme.apply(&self.egui_ctx);

        self.fullscreen = Some(Arc::new(WindowFullscreen::new(window.clone())));
        self.window = Some(window);
        self.renderer = Some(renderer);
        self.egui_state = Some(egui_state);
        self.egui_renderer = Some(egui_renderer);
        self.input_handler = Some(InputHandler::new(keybindings));

        Ok(())
    }

    /// Remount the viewer slot if the coordinator moved on
    fn sync_mounted_viewer(&mut self) {
        let generation = self.nav.generation();
        if self.mounted_generation == Some(generation) {
            return;
        }
        let (Some(platform), Some(renderer)) = (&self.fullscreen, &self.renderer) else {
            return;
        };

        if let Some(old) = self.mounted.take() {
            // The container is going away; it cannot stay fullscreen
            if old.session().owns_fullscreen() {
                old.session().exit_fullscreen();
            }
            if matches!(old, MountedViewer::Interactive(_)) {
                if let Some(resources) = self
                    .egui_renderer
                    .as_mut()
                    .and_then(|r| r.callback_resources.get_mut::<PanoramaResources>())
                {
                    resources.release_texture();
                }
            }
        }

        let platform: Arc<dyn FullscreenPlatform> = platform.clone();
        self.mounted = MountedViewer::mount(&self.ctx, platform, self.nav.mode(), renderer);
        self.mounted_generation = Some(generation);
    }

    fn render(&mut self) {
        self.sync_mounted_viewer();

        // Extract references we need, avoiding borrow conflicts
        let window = match &self.window {
            Some(w) => w.clone(),
            None => return,
        };

        let raw_input = match &mut self.egui_state {
            Some(s) => s.take_egui_input(&window),
            None => return,
        };

        let egui_ctx = self.egui_ctx.clone();
        let full_output = egui_ctx.run(raw_input, |ctx| self.ui(ctx));

        // Handle platform output
        if let Some(egui_state) = &mut self.egui_state {
            egui_state.handle_platform_output(&window, full_output.platform_output);
        }

        self.next_repaint = full_output
            .viewport_output
            .get(&egui::ViewportId::ROOT)
            .and_then(|v| Instant::now().checked_add(v.repaint_delay));

        let clipped_primitives = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);

        let (Some(renderer), Some(egui_renderer)) = (&self.renderer, &mut self.egui_renderer) else {
            return;
        };

        // Get surface texture
        let output = match renderer.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("Surface outdated, skipping frame");
                window.request_redraw();
                return;
            }
            Err(e) => {
                tracing::error!("Surface error: {:?}", e);
                return;
            }
        };

        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let screen_descriptor = ScreenDescriptor {
            size_in_pixels: [renderer.config.width, renderer.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        let mut encoder = renderer
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("egui encoder") });

        // Update egui textures
        for (id, delta) in &full_output.textures_delta.set {
            egui_renderer.update_texture(&renderer.device, &renderer.queue, *id, delta);
        }

        // Paint callbacks upload their panorama here
        let callback_buffers = egui_renderer.update_buffers(
            &renderer.device,
            &renderer.queue,
            &mut encoder,
            &clipped_primitives,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui render pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color {
                                r: 0.1,
                                g: 0.1,
                                b: 0.1,
                                a: 1.0,
                            }),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();

            egui_renderer.render(&mut render_pass, &clipped_primitives, &screen_descriptor);
        }

        // Free textures
        for id in &full_output.textures_delta.free {
            egui_renderer.free_texture(id);
        }

        renderer
            .queue
            .submit(callback_buffers.into_iter().chain(std::iter::once(encoder.finish())));
        output.present();
    }

    fn ui(&mut self, ctx: &egui::Context) {
        let viewer_fullscreen = self
            .mounted
            .as_ref()
            .is_some_and(|m| m.session().owns_fullscreen());

        if !viewer_fullscreen {
            self.chrome_panels(ctx);
        }

        let frame = if viewer_fullscreen {
            egui::Frame::none().fill(egui::Color32::BLACK)
        } else {
            egui::Frame::central_panel(&ctx.style()).inner_margin(16.0)
        };

        egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
            match &mut self.mounted {
                Some(viewer) => {
                    if let Some(action) = viewer.ui(ui) {
                        self.on_viewer_action(action);
                    }
                }
                None => {
                    if let Some(ExplorerAction::Open { payload, kind }) = self.explorer.ui(ui, &self.ctx) {
                        self.nav.open(payload, kind);
                    }
                }
            }
        });

        if self.mounted_generation != Some(self.nav.generation()) {
            ctx.request_repaint();
        }
    }

    /// Header, status bar and, while browsing, the calendar
    fn chrome_panels(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let back = ui.add_enabled(self.nav.can_go_back(), egui::Button::new("←"));
                if back.on_hover_text("Back").clicked() {
                    self.nav.go_back();
                }
                let forward = ui.add_enabled(self.nav.can_go_forward(), egui::Button::new("→"));
                if forward.on_hover_text("Forward").clicked() {
                    self.nav.go_forward();
                }
                ui.separator();
                ui.strong("Site Survey Viewer");
            });
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            StatusBar::ui(ui, &self.status());
        });

        if self.mounted.is_none() {
            egui::SidePanel::left("calendar_panel")
                .resizable(true)
                .default_width(320.0)
                .min_width(260.0)
                .show(ctx, |ui| {
                    ui.add_space(8.0);
                    self.calendar.ui(ui, &self.ctx.selected_date);
                });
        }
    }

    fn status(&self) -> StatusInfo {
        let mut info = StatusInfo::for_mode(self.nav.mode());
        if let Some(viewer) = &self.mounted {
            if let Some(image) = viewer.image().image() {
                info = info.with_dimensions(image.width, image.height);
            }
            if let Some(e) = viewer.image().error() {
                info.message = e.user_message();
            }
        }
        info.fullscreen = self
            .fullscreen
            .as_ref()
            .is_some_and(|p| p.fullscreen_element().is_some());
        info
    }

    fn on_viewer_action(&mut self, action: ViewerAction) {
        tracing::debug!(?action, "viewer action");
        match action {
            ViewerAction::SwitchViewer => {
                self.nav.open_in_other_viewer();
            }
            ViewerAction::BackToExplorer => {
                self.nav.back_to_explorer();
            }
            ViewerAction::ToggleFullscreen => {
                if let Some(viewer) = &self.mounted {
                    viewer.toggle_fullscreen();
                }
            }
        }
    }

    /// Execute a command. Returns true if it did anything.
    fn execute_command(&mut self, cmd: &Command) -> bool {
        tracing::debug!("Executing command: {}", cmd.id);

        match cmd.id.as_str() {
            CommandId::VIEW_TOGGLE_FULLSCREEN => {
                match &self.mounted {
                    Some(viewer) => viewer.toggle_fullscreen(),
                    None => self.toggle_window_fullscreen(),
                }
                true
            }
            // Leaves fullscreen at the window, like a browser's Escape
            CommandId::VIEW_EXIT_FULLSCREEN => match &self.fullscreen {
                Some(platform) if platform.fullscreen_element().is_some() => {
                    if let Err(e) = platform.exit_fullscreen() {
                        tracing::warn!("{}", e);
                    }
                    true
                }
                _ => false,
            },
            CommandId::VIEW_SWITCH_VIEWER => self.nav.open_in_other_viewer(),
            CommandId::NAV_BACK_TO_EXPLORER => self.nav.back_to_explorer(),
            CommandId::NAV_HISTORY_BACK => self.nav.go_back(),
            CommandId::NAV_HISTORY_FORWARD => self.nav.go_forward(),
            CommandId::APP_EXIT => {
                self.exit_requested = true;
                true
            }
            other => {
                tracing::debug!("Unhandled command: {}", other);
                false
            }
        }
    }

    /// Whole-window fullscreen while no viewer is mounted
    fn toggle_window_fullscreen(&self) {
        let Some(platform) = &self.fullscreen else {
            return;
        };
        let result = if platform.fullscreen_element().is_some() {
            platform.exit_fullscreen()
        } else {
            platform.request_fullscreen(WINDOW_CONTAINER)
        };
        if let Err(e) = result {
            tracing::warn!("{}", e);
        }
    }

    /// Pick up fullscreen changes and finished loads. Returns true if a redraw is due.
    fn poll_background(&mut self) -> bool {
        let mut changed = self.fullscreen.as_ref().is_some_and(|p| p.sync());
        if let Some(viewer) = &mut self.mounted {
            changed |= viewer.poll();
        }
        changed
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init_window(event_loop) {
                tracing::error!("Failed to initialize window: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        // Let egui handle the event first
        if let (Some(egui_state), Some(window)) = (&mut self.egui_state, &self.window) {
            let response = egui_state.on_window_event(window, &event);
            if response.repaint {
                window.request_redraw();
            }
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("Close requested");
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize((size.width, size.height));
                }
                self.poll_background();
                self.request_redraw();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                let cmd = self.input_handler.as_ref().and_then(|h| h.handle_key(&event));
                // Text fields keep their keys, apart from leaving fullscreen
                let typing = self.egui_ctx.wants_keyboard_input();
                if let Some(cmd) = cmd.filter(|c| !typing || c.is(CommandId::VIEW_EXIT_FULLSCREEN)) {
                    if self.execute_command(&cmd) {
                        self.request_redraw();
                    }
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let cmd = self
                    .input_handler
                    .as_ref()
                    .and_then(|h| h.handle_mouse_button(button, state));
                if let Some(cmd) = cmd {
                    if self.execute_command(&cmd) {
                        self.request_redraw();
                    }
                }
            }

            WindowEvent::ModifiersChanged(modifiers) => {
                if let Some(handler) = &mut self.input_handler {
                    handler.update_modifiers(modifiers.state());
                }
            }

            WindowEvent::RedrawRequested => {
                self.render();
            }

            _ => {}
        }

        if self.exit_requested {
            tracing::info!("Exit requested");
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.poll_background() {
            self.request_redraw();
        }

        let now = Instant::now();
        match self.next_repaint {
            Some(at) if at <= now => {
                self.next_repaint = None;
                self.request_redraw();
                event_loop.set_control_flow(ControlFlow::Wait);
            }
            // Keep polling fullscreen and loads at a low rate while idle
            Some(at) => event_loop.set_control_flow(ControlFlow::WaitUntil(at.min(now + IDLE_POLL))),
            None => event_loop.set_control_flow(ControlFlow::WaitUntil(now + IDLE_POLL)),
        }
    }
}

const IDLE_POLL: Duration = Duration::from_millis(100);

/// Run the application
pub fn run(ctx: AppContext, entry: Entry) -> Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(ctx, entry);
    event_loop.run_app(&mut app)?;

    Ok(())
}

