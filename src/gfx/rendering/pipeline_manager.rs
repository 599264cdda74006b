//! Named shaders and render pipelines
//!
//! Shaders are compiled by name up front. Pipelines are registered as
//! [`PipelineConfig`]s, built in one batch at startup and retried lazily on
//! first use if that failed.

use std::{collections::HashMap, sync::Arc};
use thiserror::Error;
use wgpu::*;

use crate::gfx::scene::vertex::{LineVertex, Vertex3D};

/// Vertex buffers a pipeline consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexInput {
    /// [`Vertex3D`] meshes
    Mesh,
    /// [`LineVertex`] debug geometry
    Lines,
    /// Generated in the vertex shader (fullscreen passes)
    None,
}

/// Depth attachment state of a pipeline
#[derive(Debug, Clone, Copy)]
pub struct DepthConfig {
    pub format: TextureFormat,
    pub write: bool,
    pub compare: CompareFunction,
    pub bias: DepthBiasState,
}

impl DepthConfig {
    /// Regular opaque geometry: test and write with `Less`
    pub fn opaque(format: TextureFormat) -> Self {
        Self {
            format,
            write: true,
            compare: CompareFunction::Less,
            bias: DepthBiasState::default(),
        }
    }

    /// Read-only test that also passes at the far plane
    pub fn background(format: TextureFormat) -> Self {
        Self {
            format,
            write: false,
            compare: CompareFunction::LessEqual,
            bias: DepthBiasState::default(),
        }
    }

    pub fn with_bias(mut self, constant: i32, slope_scale: f32) -> Self {
        self.bias = DepthBiasState {
            constant,
            slope_scale,
            clamp: 0.0,
        };
        self
    }
}

/// Configuration for creating a render pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub shader: String,
    pub bind_group_layouts: Vec<BindGroupLayout>,
    pub primitive_topology: PrimitiveTopology,
    pub cull_mode: Option<Face>,
    pub depth: Option<DepthConfig>,
    pub color_targets: Vec<Option<ColorTargetState>>,
    pub vertex_input: VertexInput,
    /// No fragment stage (depth-only passes)
    pub vertex_only: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            label: "Pipeline".to_string(),
            shader: String::new(),
            bind_group_layouts: Vec::new(),
            primitive_topology: PrimitiveTopology::TriangleList,
            cull_mode: None,
            depth: None,
            color_targets: vec![Some(ColorTargetState {
                format: TextureFormat::Bgra8UnormSrgb,
                blend: Some(BlendState::REPLACE),
                write_mask: ColorWrites::ALL,
            })],
            vertex_input: VertexInput::Mesh,
            vertex_only: false,
        }
    }
}

impl PipelineConfig {
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    pub fn with_shader(mut self, shader: &str) -> Self {
        self.shader = shader.to_string();
        self
    }

    pub fn with_vertex_only(mut self) -> Self {
        self.vertex_only = true;
        self.color_targets = Vec::new();
        self
    }

    pub fn with_bind_group_layouts(mut self, layouts: Vec<BindGroupLayout>) -> Self {
        self.bind_group_layouts = layouts;
        self
    }

    pub fn with_depth(mut self, depth: DepthConfig) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Single colour target of `format`, no blending
    pub fn with_color_format(mut self, format: TextureFormat) -> Self {
        self.color_targets = vec![Some(ColorTargetState {
            format,
            blend: Some(BlendState::REPLACE),
            write_mask: ColorWrites::ALL,
        })];
        self
    }

    pub fn with_primitive_topology(mut self, topology: PrimitiveTopology) -> Self {
        self.primitive_topology = topology;
        self
    }

    pub fn with_vertex_input(mut self, input: VertexInput) -> Self {
        self.vertex_input = input;
        self
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("pipeline '{0}' was never registered")]
    Unregistered(String),
    #[error("pipeline '{pipeline}' uses shader '{shader}', which was never loaded")]
    MissingShader { pipeline: String, shader: String },
}

/// Shader modules and the pipelines built from them, both by name
pub struct PipelineManager {
    device: Arc<Device>,
    shaders: HashMap<String, ShaderModule>,
    configs: HashMap<String, PipelineConfig>,
    pipelines: HashMap<String, RenderPipeline>,
}

impl PipelineManager {
    pub fn new(device: Arc<Device>) -> Self {
        Self {
            device,
            shaders: HashMap::new(),
            configs: HashMap::new(),
            pipelines: HashMap::new(),
        }
    }

    /// Compiles WGSL `source` under `name`
    pub fn load_shader(&mut self, name: &str, source: &str) {
        let module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        });
        self.shaders.insert(name.to_string(), module);
    }

    /// Registers (or replaces) a pipeline; it is built on the next
    /// `create_all_pipelines` or first `get_pipeline`
    pub fn register_pipeline(&mut self, name: &str, config: PipelineConfig) {
        self.pipelines.remove(name);
        self.configs.insert(name.to_string(), config);
    }

    /// Builds every registered pipeline that does not exist yet
    pub fn create_all_pipelines(&mut self) -> Result<(), Vec<PipelineError>> {
        let missing: Vec<String> = self
            .configs
            .keys()
            .filter(|name| !self.pipelines.contains_key(*name))
            .cloned()
            .collect();

        let errors: Vec<PipelineError> = missing
            .into_iter()
            .filter_map(|name| self.build(&name).err())
            .collect();

        if errors.is_empty() {
            log::debug!("{} pipelines ready", self.pipelines.len());
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// The pipeline called `name`, built now if necessary.
    ///
    /// Failures are logged and yield `None`, so a broken pipeline only
    /// drops its own draws.
    pub fn get_pipeline(&mut self, name: &str) -> Option<&RenderPipeline> {
        if !self.pipelines.contains_key(name) {
            if let Err(e) = self.build(name) {
                log::error!("{}", e);
                return None;
            }
        }
        self.pipelines.get(name)
    }

    fn build(&mut self, name: &str) -> Result<(), PipelineError> {
        let config = self
            .configs
            .get(name)
            .ok_or_else(|| PipelineError::Unregistered(name.to_string()))?;
        let shader = self
            .shaders
            .get(&config.shader)
            .ok_or_else(|| PipelineError::MissingShader {
                pipeline: name.to_string(),
                shader: config.shader.clone(),
            })?;

        let pipeline = create_render_pipeline(&self.device, shader, config);
        self.pipelines.insert(name.to_string(), pipeline);
        Ok(())
    }
}

fn create_render_pipeline(
    device: &Device,
    shader: &ShaderModule,
    config: &PipelineConfig,
) -> RenderPipeline {
    let layouts: Vec<&BindGroupLayout> = config.bind_group_layouts.iter().collect();
    let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some(&config.label),
        bind_group_layouts: &layouts,
        push_constant_ranges: &[],
    });

    let mesh_layout = [Vertex3D::desc()];
    let line_layout = [LineVertex::desc()];
    let buffers: &[VertexBufferLayout] = match config.vertex_input {
        VertexInput::Mesh => &mesh_layout,
        VertexInput::Lines => &line_layout,
        VertexInput::None => &[],
    };

    let fragment = (!config.vertex_only).then(|| FragmentState {
        module: shader,
        entry_point: Some("fs_main"),
        targets: &config.color_targets,
        compilation_options: PipelineCompilationOptions::default(),
    });

    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some(&config.label),
        layout: Some(&layout),
        vertex: VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers,
            compilation_options: PipelineCompilationOptions::default(),
        },
        fragment,
        primitive: PrimitiveState {
            topology: config.primitive_topology,
            cull_mode: config.cull_mode,
            ..Default::default()
        },
        depth_stencil: config.depth.map(|depth| DepthStencilState {
            format: depth.format,
            depth_write_enabled: depth.write,
            depth_compare: depth.compare,
            stencil: StencilState::default(),
            bias: depth.bias,
        }),
        multisample: MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
