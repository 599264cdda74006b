//! WGPU-based rendering engine for the stage
//!
//! Owns the surface, the device and every GPU resource that is not tied to a
//! scene object: depth buffer, shadow map, global uniforms, the floor's decal
//! material and the light helper. A frame is three passes: shadow depth from
//! the light, the main colour pass and the optional UI overlay.

use std::sync::Arc;
use wgpu::{Device, TextureFormat};

use crate::{
    config::LightSettings,
    error::StageError,
    gfx::{
        camera::camera_utils::CameraUniform,
        resources::{
            global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO},
            material::{Material, MaterialBindings},
            texture_resource::{TextureResource, Wrapping},
            DecalMaterial,
        },
        scene::{
            object::{DrawObject, Object, Shading},
            scene::Scene,
        },
    },
    interaction::DecalUniform,
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
    },
};

use super::light_helper::LightHelper;
use super::pipeline_manager::{DepthConfig, PipelineConfig, PipelineManager, VertexInput};

/// Largest texture side requested from the device; decoded images are
/// downscaled to fit.
pub const MAX_TEXTURE_SIZE: u32 = 4096;

const LIT: &str = "Lit";
const LIT_SHADOWED: &str = "LitShadowed";
const FLOOR: &str = "Floor";
const SHADOW: &str = "Shadow";
const SKYBOX: &str = "Skybox";
const LIGHT_LINES: &str = "LightLines";

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: TextureFormat,
    pub pipeline_manager: PipelineManager,
    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,

    transform_layout: BindGroupLayoutWithDesc,
    material_layout: BindGroupLayoutWithDesc,

    shadow_map: TextureResource,
    shadow_bind_group: wgpu::BindGroup,

    /// Bound wherever a texture has not arrived yet
    placeholder: TextureResource,
    environment: TextureResource,
    fallback_material: Material,
    floor_material: DecalMaterial,

    light: LightSettings,
    light_helper: LightHelper,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// # Arguments
    /// * `window` - Window surface target for rendering
    /// * `width`, `height` - Initial surface size in pixels
    /// * `light` - Initial directional light; sizes the shadow map
    /// * `decal` - Initial floor decal state
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        light: LightSettings,
        decal: DecalUniform,
    ) -> Result<RenderEngine, StageError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: MAX_TEXTURE_SIZE,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        // Decoded textures are sRGB, so the swapchain must encode on write
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .unwrap_or(TextureFormat::Bgra8UnormSrgb);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");
        let shadow_map = TextureResource::create_shadow_map(&device, light.shadow_map_size);

        let shadow_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::depth_texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Comparison))
            .create(&device, "Shadow Bind Group");
        let shadow_bind_group = BindGroupBuilder::new(&shadow_layout)
            .texture(&shadow_map.view)
            .sampler(&shadow_map.sampler)
            .create(&device, "Shadow Bind Group");

        let transform_layout = BindGroupLayoutBuilder::new()
            .next_binding_vertex(binding_types::uniform())
            .create(&device, "Transform Bind Group");
        let material_layout = MaterialBindings::layout(&device);

        let placeholder = TextureResource::placeholder(&device, &queue, "Placeholder Texture");
        let environment = placeholder.clone();

        let global_ubo = GlobalUBO::new(&device, "Globals", bytemuck::Zeroable::zeroed());
        let global_bindings = GlobalBindings::new(&device, &global_ubo, &environment);

        let mut fallback_material = Material::default();
        fallback_material.update_gpu_resources(&device, &queue, &material_layout, &placeholder);
        let floor_material =
            DecalMaterial::new(&device, &material_layout, placeholder.clone(), decal);

        let light_helper = LightHelper::new(&device, &light);

        // Wrap device and queue in Arc for pipeline manager
        let device_handle: Arc<Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        pipeline_manager.load_shader(
            LIT,
            concat!(
                "const RECEIVE_SHADOWS: bool = false;\n",
                include_str!("common.wgsl"),
                include_str!("scene.wgsl")
            ),
        );
        pipeline_manager.load_shader(
            LIT_SHADOWED,
            concat!(
                "const RECEIVE_SHADOWS: bool = true;\n",
                include_str!("common.wgsl"),
                include_str!("scene.wgsl")
            ),
        );
        pipeline_manager.load_shader(
            FLOOR,
            concat!(include_str!("common.wgsl"), include_str!("floor.wgsl")),
        );
        pipeline_manager.load_shader(SHADOW, include_str!("shadow_pass.wgsl"));
        pipeline_manager.load_shader(SKYBOX, include_str!("skybox.wgsl"));
        pipeline_manager.load_shader(LIGHT_LINES, include_str!("frustum_lines.wgsl"));

        let globals_layout = global_bindings.bind_group_layouts().clone();
        let mesh_layouts = vec![
            globals_layout.clone(),
            transform_layout.layout.clone(),
            material_layout.layout.clone(),
            shadow_layout.layout.clone(),
        ];

        // No culling in the shadow pass: the floor is thin and the models are not closed
        pipeline_manager.register_pipeline(
            SHADOW,
            PipelineConfig::default()
                .with_label("SHADOW")
                .with_shader(SHADOW)
                .with_vertex_only()
                .with_depth(DepthConfig::opaque(TextureResource::DEPTH_FORMAT).with_bias(2, 2.0))
                .with_bind_group_layouts(vec![
                    globals_layout.clone(),
                    transform_layout.layout.clone(),
                ]),
        );

        pipeline_manager.register_pipeline(
            SKYBOX,
            PipelineConfig::default()
                .with_label("SKYBOX")
                .with_shader(SKYBOX)
                .with_color_format(format)
                .with_vertex_input(VertexInput::None)
                .with_depth(DepthConfig::background(TextureResource::DEPTH_FORMAT))
                .with_bind_group_layouts(vec![globals_layout.clone()]),
        );

        for (name, label) in [(LIT, "LIT"), (LIT_SHADOWED, "LIT SHADOWED"), (FLOOR, "FLOOR")] {
            pipeline_manager.register_pipeline(
                name,
                PipelineConfig::default()
                    .with_label(label)
                    .with_shader(name)
                    .with_color_format(format)
                    .with_depth(DepthConfig::opaque(TextureResource::DEPTH_FORMAT))
                    .with_bind_group_layouts(mesh_layouts.clone()),
            );
        }

        pipeline_manager.register_pipeline(
            LIGHT_LINES,
            PipelineConfig::default()
                .with_label("LIGHT LINES")
                .with_shader(LIGHT_LINES)
                .with_color_format(format)
                .with_vertex_input(VertexInput::Lines)
                .with_primitive_topology(wgpu::PrimitiveTopology::LineList)
                .with_depth(DepthConfig::opaque(TextureResource::DEPTH_FORMAT))
                .with_bind_group_layouts(vec![globals_layout]),
        );

        if let Err(errors) = pipeline_manager.create_all_pipelines() {
            for error in errors {
                log::error!("{}", error);
            }
        }

        Ok(RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            depth_texture,
            format,
            pipeline_manager,
            global_ubo,
            global_bindings,
            transform_layout,
            material_layout,
            shadow_map,
            shadow_bind_group,
            placeholder,
            environment,
            fallback_material,
            floor_material,
            light,
            light_helper,
        })
    }

    /// Renders a frame with an optional UI overlay
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped;
    /// only unrecoverable surface errors are returned.
    pub fn render_frame<F>(
        &mut self,
        scene: &Scene,
        ui_callback: Option<F>,
    ) -> Result<(), wgpu::SurfaceError>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface timeout, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // PASS 1: shadow depth from the light
        {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Depth Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_map.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(pipeline) = self.pipeline_manager.get_pipeline(SHADOW) {
                shadow_pass.set_pipeline(pipeline);
                shadow_pass.set_bind_group(0, self.global_bindings.bind_groups(), &[]);
                for (_, object) in scene.objects().filter(|(_, o)| o.visible) {
                    shadow_pass.draw_object_filtered(object, None, |node| node.cast_shadow);
                }
            }
        }

        // PASS 2: environment, characters, floor, helpers
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.1,
                            g: 0.2,
                            b: 0.3,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, self.global_bindings.bind_groups(), &[]);

            if let Some(pipeline) = self.pipeline_manager.get_pipeline(SKYBOX) {
                render_pass.set_pipeline(pipeline);
                render_pass.draw(0..3, 0..1);
            }

            render_pass.set_bind_group(3, &self.shadow_bind_group, &[]);

            let fallback = self.fallback_material.get_bind_group();
            let visible = |shading: Shading| {
                scene
                    .objects()
                    .map(|(_, object)| object)
                    .filter(move |o| o.visible && o.shading == shading)
            };

            for (name, receives) in [(LIT, false), (LIT_SHADOWED, true)] {
                if let Some(pipeline) = self.pipeline_manager.get_pipeline(name) {
                    render_pass.set_pipeline(pipeline);
                    for object in visible(Shading::Lit) {
                        render_pass.draw_object_filtered(object, fallback, |node| {
                            node.receive_shadow == receives
                        });
                    }
                }
            }

            if let Some(pipeline) = self.pipeline_manager.get_pipeline(FLOOR) {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(2, self.floor_material.bind_group(), &[]);
                for object in visible(Shading::Decal) {
                    render_pass.draw_object_filtered(object, None, |_| true);
                }
            }

            if self.light_helper.visible {
                if let Some(pipeline) = self.pipeline_manager.get_pipeline(LIGHT_LINES) {
                    render_pass.set_pipeline(pipeline);
                    self.light_helper.draw(&mut render_pass);
                }
            }
        }

        // PASS 3: UI overlay (if provided)
        if let Some(ui_callback) = ui_callback {
            ui_callback(
                &self.device,
                &self.queue,
                &mut encoder,
                &surface_texture_view,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    /// Convenience method for rendering without UI
    pub fn render_frame_simple(&mut self, scene: &Scene) -> Result<(), wgpu::SurfaceError> {
        self.render_frame(
            scene,
            None::<fn(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView)>,
        )
    }

    /// Convenience method for rendering with UI
    pub fn render_frame_with_ui<F>(
        &mut self,
        scene: &Scene,
        ui_callback: F,
    ) -> Result<(), wgpu::SurfaceError>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        self.render_frame(scene, Some(ui_callback))
    }

    /// Writes camera and light uniforms for the coming frame
    pub fn update(&mut self, camera_uniform: CameraUniform) {
        update_global_ubo(&mut self.global_ubo, &self.queue, camera_uniform, &self.light);
    }

    /// Changes the directional light; picked up by the next `update`
    pub fn set_light(&mut self, light: LightSettings) {
        self.light = light;
        self.light_helper.update(&self.queue, &self.light);
    }

    pub fn get_light(&self) -> LightSettings {
        self.light
    }

    pub fn set_light_helper_visible(&mut self, visible: bool) {
        self.light_helper.visible = visible;
    }

    /// Uploads mesh buffers, transform and materials of a freshly loaded object
    pub fn prepare_object(&mut self, object: &mut Object) {
        object.init_gpu_resources(&self.device, &self.transform_layout);
        for material in object.materials.iter_mut() {
            material.update_gpu_resources(
                &self.device,
                &self.queue,
                &self.material_layout,
                &self.placeholder,
            );
        }
    }

    /// Replaces the background and ambient environment map
    pub fn set_environment(&mut self, image: &image::RgbaImage) {
        self.environment = TextureResource::from_image(
            &self.device,
            &self.queue,
            image,
            "Environment Map",
            Wrapping::Panorama,
        );
        self.global_bindings
            .set_environment(&self.device, &self.global_ubo, &self.environment);
    }

    /// Replaces the floor's base texture, tiled across the mesh
    pub fn set_floor_texture(&mut self, image: &image::RgbaImage) {
        let texture = TextureResource::from_image(
            &self.device,
            &self.queue,
            image,
            "Floor Texture",
            Wrapping::Tiled,
        );
        self.floor_material
            .set_texture(&self.device, &self.material_layout, texture);
    }

    pub fn update_decal(&mut self, uniform: DecalUniform) {
        self.floor_material.update(&self.queue, uniform);
    }

    /// Resizes the surface and recreates the depth buffer.
    /// Zero sizes (minimised window) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);

        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Used for creating compatible render targets and UI systems.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}
