//! The windowed application
//!
//! [`StageApp`] owns the event loop; [`StageState`] owns everything else and
//! implements winit's [`ApplicationHandler`]. Every mutation of the scene
//! happens in these handlers, on the event-loop thread.

use cgmath::{Deg, Vector3};
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorIcon, Window},
};

use crate::{
    assets::{AssetEvent, AssetLoader, AssetSink, LoadedModel, TextureSlot},
    config::{ModelPlacement, StageConfig},
    error::StageError,
    gfx::{
        camera::{CameraController, CameraManager, OrbitCamera},
        geometry::primitives::generate_sphere,
        scene::{Mesh, Object, Scene, SceneNode, Shading},
        RenderEngine,
    },
    interaction::{Character, CursorHint, InteractionSession, Viewport},
    performance::PerformanceMonitor,
    ui::{stage_panel, PanelChanges, PanelState, UiManager},
};

/// Messages posted to the event loop from other threads
pub enum StageEvent {
    Asset(AssetEvent),
}

impl AssetSink for EventLoopProxy<StageEvent> {
    fn deliver(&self, event: AssetEvent) -> bool {
        self.send_event(StageEvent::Asset(event)).is_ok()
    }
}

pub struct StageApp {
    event_loop: EventLoop<StageEvent>,
    state: StageState,
}

pub struct StageState {
    config: StageConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    scene: Scene,
    session: InteractionSession,
    loader: AssetLoader<EventLoopProxy<StageEvent>>,
    panel: PanelState,
    performance: PerformanceMonitor,
    cursor: CursorHint,
    /// First unrecoverable error; ends the event loop
    fatal: Option<StageError>,
}

impl StageApp {
    pub fn new(config: StageConfig) -> Result<Self, StageError> {
        let event_loop = EventLoop::<StageEvent>::with_user_event().build()?;

        let (width, height) = config.window_size;
        let aspect = width as f32 / height.max(1) as f32;
        let camera = OrbitCamera::from_settings(&config.camera, aspect);
        let controller = CameraController::from_settings(&config.camera);
        let session = InteractionSession::new(&config, &camera, Viewport::new(width, height));
        let scene = Scene::new(CameraManager::new(camera, controller));

        let state = StageState {
            loader: AssetLoader::new(event_loop.create_proxy()),
            panel: PanelState::new(&config.light, config.toggle_armed),
            config,
            window: None,
            render_engine: None,
            ui_manager: None,
            scene,
            session,
            performance: PerformanceMonitor::new(),
            cursor: CursorHint::Default,
            fatal: None,
        };

        Ok(Self { event_loop, state })
    }

    /// Runs until the window closes or a fatal error occurs
    pub fn run(self) -> Result<(), StageError> {
        let StageApp {
            event_loop,
            mut state,
        } = self;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut state)?;
        state.loader.wait();

        match state.fatal.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl StageState {
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: StageError) {
        log::error!("{}", error);
        if self.fatal.is_none() {
            self.fatal = Some(error);
        }
        event_loop.exit();
    }

    fn placement(&self, character: Character) -> &ModelPlacement {
        match character {
            Character::Sarah => &self.config.sarah,
            Character::Spiderman => &self.config.spiderman,
        }
    }

    /// The flattened sphere under the characters, drawn with the decal pipeline
    fn build_floor(&self) -> Object {
        let floor = &self.config.floor;
        let geometry = generate_sphere(floor.longitude_segments, floor.latitude_segments);
        let mesh = Mesh::new(geometry.to_vertices(), geometry.indices);

        let mut root = SceneNode::mesh("floor", mesh);
        root.set_receive_shadow(true);

        let mut object = Object::new("floor", root).with_shading(Shading::Decal);
        object.set_transform_trs(
            Vector3::new(0.0, floor.offset_y, 0.0),
            Deg(floor.rotation_x_degrees),
            floor.scale,
        );
        object
    }

    fn attach_model(&mut self, character: Character, model: LoadedModel) {
        let placement = self.placement(character).clone();
        let Some(render_engine) = self.render_engine.as_mut() else {
            log::warn!("{:?} arrived before the renderer; dropped", character);
            return;
        };

        let transform = model.placed(&placement);
        let mut root = model.root;
        let casters = root.set_cast_shadow(true);
        let mut object = Object::new(model.name, root).with_materials(model.materials);
        object.transform = transform;
        render_engine.prepare_object(&mut object);

        let id = self.scene.add_object(object);
        self.session
            .attach_character(character, id, &mut self.scene);
        log::info!(
            "{:?} attached ({} shadow casters), visible: {}",
            character,
            casters,
            self.scene.is_visible(id)
        );
    }

    fn apply_asset(&mut self, event: AssetEvent) {
        match event {
            AssetEvent::Model {
                character,
                result: Ok(model),
                ..
            } => self.attach_model(character, model),
            AssetEvent::Model {
                character, path, ..
            } => {
                log::warn!("{:?} stays absent ({})", character, path.display());
            }
            AssetEvent::Texture {
                slot,
                result: Ok(image),
                ..
            } => {
                let Some(render_engine) = self.render_engine.as_mut() else {
                    return;
                };
                match slot {
                    TextureSlot::Environment => render_engine.set_environment(&image),
                    TextureSlot::Floor => render_engine.set_floor_texture(&image),
                }
            }
            AssetEvent::Texture { slot, .. } => {
                log::warn!("{:?} keeps the placeholder texture", slot);
            }
        }
    }

    fn set_cursor(&mut self, hint: CursorHint) {
        if hint == self.cursor {
            return;
        }
        self.cursor = hint;
        if let Some(window) = &self.window {
            window.set_cursor(match hint {
                CursorHint::Pointer => CursorIcon::Pointer,
                CursorHint::Default => CursorIcon::Default,
            });
        }
    }

    fn flush_decal(&mut self) {
        if let (Some(uniform), Some(render_engine)) =
            (self.session.take_decal_change(), self.render_engine.as_mut())
        {
            render_engine.update_decal(uniform);
        }
    }

    fn apply_panel(&mut self, changes: PanelChanges) {
        let Some(render_engine) = self.render_engine.as_mut() else {
            return;
        };
        if changes.light {
            let light = self.panel.apply_to(render_engine.get_light());
            render_engine.set_light(light);
        }
        if changes.light_helper {
            render_engine.set_light_helper_visible(self.panel.show_light_helper);
        }
        if changes.toggle_armed {
            self.session.set_armed(self.panel.toggle_armed);
            log::info!("toggle armed: {}", self.panel.toggle_armed);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.scene.update();
        self.session.camera_moved(&self.scene.camera_manager.camera);

        let statistics = self.scene.get_statistics();
        self.performance.frame();
        self.performance
            .update_render_stats(statistics.visible_count, statistics.total_triangles);

        let (Some(render_engine), Some(window)) = (self.render_engine.as_mut(), self.window.as_ref())
        else {
            return;
        };
        render_engine.update(self.scene.camera_manager.camera.uniform);

        let mut changes = PanelChanges::default();
        let result = match self.ui_manager.as_mut() {
            Some(ui_manager) => {
                let panel = &mut self.panel;
                let performance = &self.performance;
                render_engine.render_frame_with_ui(
                    &self.scene,
                    |device, queue, encoder, color_attachment| {
                        ui_manager.draw(device, queue, encoder, window, color_attachment, |ui| {
                            changes = stage_panel(ui, panel, &statistics);
                            performance.render_overlay(ui);
                        });
                    },
                )
            }
            None => render_engine.render_frame_simple(&self.scene),
        };

        if let Err(e) = result {
            self.fail(event_loop, e.into());
            return;
        }
        if changes.any() {
            self.apply_panel(changes);
        }
    }
}

impl ApplicationHandler<StageEvent> for StageState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let (width, height) = self.config.window_size;
        let attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(width, height));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };
        self.window = Some(window.clone());

        let PhysicalSize { width, height } = window.inner_size();
        let renderer = pollster::block_on(RenderEngine::new(
            window.clone(),
            width,
            height,
            self.config.light,
            *self.session.decal(),
        ));
        let mut renderer = match renderer {
            Ok(renderer) => renderer,
            Err(e) => return self.fail(event_loop, e),
        };

        self.session.on_resize(
            Viewport::new(width, height),
            &mut self.scene.camera_manager.camera,
        );

        let mut floor = self.build_floor();
        renderer.prepare_object(&mut floor);
        let floor_id = self.scene.add_object(floor);
        self.session.attach_floor(floor_id);

        let mut ui_manager = UiManager::new(
            renderer.device(),
            renderer.queue(),
            renderer.surface_format(),
            &window,
        );
        ui_manager.update_display_size(width, height);

        self.ui_manager = Some(ui_manager);
        self.render_engine = Some(renderer);
        self.flush_decal();

        log::info!(
            "loading assets from {}",
            self.config.asset_root.display()
        );
        self.loader.load_stage(&self.config);
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: StageEvent) {
        match event {
            StageEvent::Asset(asset) => self.apply_asset(asset),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };

        // UI sees input first
        if let Some(ui_manager) = self.ui_manager.as_mut() {
            if ui_manager.handle_window_event(&window, window_id, &event) {
                return;
            }
        }

        match event {
            WindowEvent::KeyboardInput { event: key, .. } => {
                if key.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                    event_loop.exit();
                    return;
                }
                self.scene.camera_manager.handle_key(&key);
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.update_display_size(width, height);
                }
                self.session.on_resize(
                    Viewport::new(width, height),
                    &mut self.scene.camera_manager.camera,
                );
            }
            WindowEvent::CursorMoved { position, .. } => {
                match self
                    .session
                    .on_pointer_move(position.x, position.y, &self.scene)
                {
                    Ok(hint) => self.set_cursor(hint),
                    Err(e) => return self.fail(event_loop, e.into()),
                }
                self.flush_decal();
            }
            WindowEvent::MouseInput {
                state: ElementState::Released,
                button: MouseButton::Left,
                ..
            } => match self.session.on_click(&mut self.scene) {
                Ok(Some(state)) => {
                    log::info!("characters swapped: {:?}", state);
                    self.panel.toggle_armed = self.session.is_armed();
                }
                Ok(None) => {}
                Err(e) => self.fail(event_loop, e.into()),
            },
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: winit::event::DeviceEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };

        // Don't orbit while the UI has the mouse
        if self.ui_manager.as_ref().is_some_and(UiManager::wants_mouse) {
            self.scene.camera_manager.controller.release();
            return;
        }

        if self.scene.camera_manager.handle_device_event(&event) {
            window.request_redraw();
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
