mod camera;

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};
use wgpu::util::DeviceExt;
use winit::window::Window;

pub use camera::Camera;

use crate::error::GpuError;
use crate::render::RenderAdapter;

pub(crate) const SHADER_SOURCE: &str = include_str!("particles.wgsl");
pub(crate) const WINDOW_TITLE: &str = "Constellation - Our Universe";

/// Light pink, slightly transparent.
const PARTICLE_COLOR: Vec4 = Vec4::new(1.0, 0.714, 0.757, 0.9);
const PARTICLE_SIZE: f32 = 0.3;
const STAR_COLOR: Vec4 = Vec4::new(1.0, 1.0, 1.0, 0.7);
const STAR_SIZE: f32 = 0.4;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    color: [f32; 4],
    point_scale: [f32; 2],
    _padding: [f32; 2],
}

/// One instanced point-sprite draw: vertex buffer plus its own uniforms.
struct Layer {
    vertex_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    capacity: u32,
    count: u32,
    color: Vec4,
    size: f32,
}

impl Layer {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        label: &str,
        capacity: usize,
        contents: Option<&[Vec3]>,
        color: Vec4,
        size: f32,
    ) -> Self {
        let vertex_buffer = match contents {
            Some(points) => device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(points),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            None => device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: (capacity * std::mem::size_of::<Vec3>()) as wgpu::BufferAddress,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
        };

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Uniform Buffer"),
            size: std::mem::size_of::<Uniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let capacity = capacity as u32;
        Self {
            vertex_buffer,
            uniform_buffer,
            bind_group,
            capacity,
            // A static layer is fully populated; a dynamic one fills on first upload
            count: if contents.is_some() { capacity } else { 0 },
            color,
            size,
        }
    }

    fn upload(&mut self, queue: &wgpu::Queue, positions: &[Vec3]) {
        let n = positions.len().min(self.capacity as usize);
        queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&positions[..n]));
        self.count = n as u32;
    }

    fn write_uniforms(&self, queue: &wgpu::Queue, view_proj: Mat4, proj: Mat4, model: Mat4) {
        let uniforms = Uniforms {
            view_proj: view_proj.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            color: self.color.to_array(),
            point_scale: [self.size * proj.x_axis.x, self.size * proj.y_axis.y],
            _padding: [0.0; 2],
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        if self.count == 0 {
            return;
        }
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.draw(0..6, 0..self.count);
    }
}

/// wgpu-backed render adapter.
///
/// Draws the live particle buffer as additive soft sprites rotated about Y,
/// over an optional static starfield. The aligned label is shown in the
/// window title.
pub struct GpuState {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    render_pipeline: wgpu::RenderPipeline,
    particles: Layer,
    backdrop: Option<Layer>,
    pub camera: Camera,
    label: String,
    label_shown: bool,
    out_of_memory: bool,
}

impl GpuState {
    pub async fn new(
        window: Arc<Window>,
        particle_count: usize,
        backdrop: Option<&[Vec3]>,
        label: String,
    ) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        let info = adapter.get_info();
        log::info!("Using GPU adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Uniform Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let particles = Layer::new(
            &device,
            &uniform_bind_group_layout,
            "Particle Buffer",
            particle_count,
            None,
            PARTICLE_COLOR,
            PARTICLE_SIZE,
        );

        let backdrop = backdrop.map(|stars| {
            Layer::new(
                &device,
                &uniform_bind_group_layout,
                "Backdrop Buffer",
                stars.len(),
                Some(stars),
                STAR_COLOR,
                STAR_SIZE,
            )
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Render Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        let additive = wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        };

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vec3>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &[wgpu::VertexAttribute {
                        offset: 0,
                        shader_location: 0,
                        format: wgpu::VertexFormat::Float32x3,
                    }],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState {
                        color: additive,
                        alpha: additive,
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            // Additive sprites are order independent, no depth buffer
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            render_pipeline,
            particles,
            backdrop,
            camera: Camera::new(),
            label,
            label_shown: false,
            out_of_memory: false,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Whether drawing hit an unrecoverable out-of-memory error.
    pub fn is_out_of_memory(&self) -> bool {
        self.out_of_memory
    }

    fn show_label(&mut self, aligned: bool) {
        if aligned == self.label_shown {
            return;
        }
        if aligned {
            self.window.set_title(&format!("{} | {}", WINDOW_TITLE, self.label));
        } else {
            self.window.set_title(WINDOW_TITLE);
        }
        self.label_shown = aligned;
    }

    fn draw(&mut self, positions: &[Vec3], rotation: f32) -> Result<(), wgpu::SurfaceError> {
        self.particles.upload(&self.queue, positions);

        let aspect = self.config.width as f32 / self.config.height as f32;
        let proj = self.camera.projection(aspect);
        let view_proj = proj * self.camera.view_matrix();

        self.particles
            .write_uniforms(&self.queue, view_proj, proj, Mat4::from_rotation_y(rotation));
        if let Some(backdrop) = &self.backdrop {
            backdrop.write_uniforms(&self.queue, view_proj, proj, Mat4::IDENTITY);
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
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
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.01,
                            g: 0.0,
                            b: 0.02,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            if let Some(backdrop) = &self.backdrop {
                backdrop.draw(&mut render_pass);
            }
            self.particles.draw(&mut render_pass);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

impl RenderAdapter for GpuState {
    fn render(&mut self, positions: &[Vec3], rotation: f32, aligned: bool) {
        self.show_label(aligned);

        match self.draw(positions, rotation) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost) => {
                log::warn!("Surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.config);
            }
            Err(wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory");
                self.out_of_memory = true;
            }
            Err(e) => log::warn!("Render error: {:?}", e),
        }
    }
}
