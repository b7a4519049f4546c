use std::num::NonZeroUsize;
use std::ops::Range;

use lyon::math::{vector, Angle};
use lyon::path::Winding;
use lyon::tessellation::{BuffersBuilder, FillOptions, FillTessellator, FillVertex};
use smallvec::SmallVec;
use wgpu::util::DeviceExt;

use super::cache::{Cache, ShapeBuffers, ShapeKey};
use super::device::{WgpuDevice, WgpuTexture};
use super::pipeline::{create_solid_pipeline, SolidPipeline, SolidVertex, Uniforms};
use super::WgpuError;
use crate::color::Color;
use crate::driver::{DriverError, Renderer};
use crate::geometry::{intersect, rect, Rect};
use crate::ops::{DecodeError, Op, OpType, Ops, Reader};
use crate::pointer::AreaKind;

const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Draws the paint operations of a buffer.
///
/// A paint fills the shape of the innermost area with a solid color, clipped
/// to the bounds of every enclosing area. Outside any area it fills the whole
/// target.
pub struct WgpuRenderer {
    solid: SolidPipeline,
    shapes: Shapes,
    batch: Batch,
    clear_color: Color,
}

struct Shapes {
    tessellator: FillTessellator,
    cache: Cache,
}

#[derive(Debug, Clone, Copy)]
struct Layer {
    shape: Option<(AreaKind, Rect)>,
    clip: Rect,
}

#[derive(Debug, Clone, PartialEq)]
struct DrawCall {
    indices: Range<u32>,
    scissor: Rect,
}

#[derive(Debug, Default)]
struct Batch {
    vertices: Vec<SolidVertex>,
    indices: Vec<u32>,
    draws: Vec<DrawCall>,
}

fn tessellate(
    tessellator: &mut FillTessellator,
    kind: AreaKind,
    bounds: &Rect,
) -> Result<ShapeBuffers, WgpuError> {
    let mut buffers = ShapeBuffers::new();
    let mut builder =
        BuffersBuilder::new(&mut buffers, |vertex: FillVertex| vertex.position().to_array());
    let options = FillOptions::default();
    let bounds = bounds.to_f32();
    match kind {
        AreaKind::Rect => tessellator.tessellate_rectangle(&bounds, &options, &mut builder)?,
        AreaKind::Ellipse => tessellator.tessellate_ellipse(
            bounds.center(),
            vector(bounds.width() / 2.0, bounds.height() / 2.0),
            Angle::zero(),
            Winding::Positive,
            &options,
            &mut builder,
        )?,
    };
    Ok(buffers)
}

impl Shapes {
    fn new(capacity: NonZeroUsize) -> Self {
        Self {
            tessellator: FillTessellator::new(),
            cache: Cache::new(capacity),
        }
    }

    fn get(&mut self, kind: AreaKind, bounds: &Rect) -> Result<&ShapeBuffers, WgpuError> {
        let tessellator = &mut self.tessellator;
        self.cache
            .get_or_tessellate(ShapeKey::new(kind, bounds), || {
                tessellate(tessellator, kind, bounds)
            })
    }
}

impl Batch {
    fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.draws.clear();
    }

    fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    /// Collects the paint operations of `ops` for a `width` x `height` target.
    fn build(&mut self, ops: &Ops, (width, height): (u32, u32), shapes: &mut Shapes) -> Result<(), WgpuError> {
        self.clear();
        let root = Layer {
            shape: None,
            clip: rect(0, 0, width as i32, height as i32),
        };
        let mut layers: SmallVec<[Layer; 8]> = SmallVec::new();

        for op in Reader::new(ops) {
            match op? {
                Op::Area { kind, rect } => {
                    let parent = layers.last().copied().unwrap_or(root);
                    layers.push(Layer {
                        shape: Some((kind, rect)),
                        clip: intersect(&parent.clip, &rect),
                    });
                }
                Op::PopArea => {
                    layers
                        .pop()
                        .ok_or(DecodeError::Unbalanced { op: OpType::PopArea })?;
                }
                Op::Paint { color } => {
                    let layer = layers.last().copied().unwrap_or(root);
                    self.paint(layer, color, shapes)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn paint(&mut self, layer: Layer, color: Color, shapes: &mut Shapes) -> Result<(), WgpuError> {
        if layer.clip.is_empty() || color.is_transparent() {
            return Ok(());
        }
        let (kind, bounds) = layer.shape.unwrap_or((AreaKind::Rect, layer.clip));
        let shape = shapes.get(kind, &bounds)?;

        let base = self.vertices.len() as u32;
        let first = self.indices.len() as u32;
        let color = color.to_linear();
        self.vertices.extend(
            shape
                .vertices
                .iter()
                .map(|&position| SolidVertex { position, color }),
        );
        self.indices
            .extend(shape.indices.iter().map(|&index| base + index as u32));
        self.draws.push(DrawCall {
            indices: first..self.indices.len() as u32,
            scissor: layer.clip,
        });
        Ok(())
    }
}

impl WgpuRenderer {
    pub(super) fn new(device: &WgpuDevice, cache_capacity: NonZeroUsize) -> Result<Self, WgpuError> {
        let solid = device.validated(|device| create_solid_pipeline(device, TARGET_FORMAT))?;
        Ok(Self {
            solid,
            shapes: Shapes::new(cache_capacity),
            batch: Batch::default(),
            clear_color: Color::TRANSPARENT,
        })
    }

    /// Number of tessellated shapes currently cached.
    pub fn cached_shapes(&self) -> usize {
        self.shapes.cache.len()
    }

    fn render(
        &mut self,
        device: &WgpuDevice,
        ops: &Ops,
        target: &WgpuTexture,
        size: (u32, u32),
    ) -> Result<(), WgpuError> {
        if target.format() != TARGET_FORMAT {
            return Err(WgpuError::TargetFormat {
                expected: TARGET_FORMAT,
                actual: target.format(),
            });
        }
        self.batch.build(ops, size, &mut self.shapes)?;

        let uniforms = Uniforms::new(size.0 as f32, size.1 as f32);
        if uniforms != self.solid.uniforms {
            device
                .queue
                .write_buffer(&self.solid.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
            self.solid.uniforms = uniforms;
        }

        let [r, g, b, a] = self.clear_color.to_linear();
        let clear = wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: a as f64,
        };

        let solid = &self.solid;
        let batch = &self.batch;
        device.validated(|gpu| {
            let buffers = (!batch.is_empty()).then(|| {
                let vertices = gpu.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("opframe_vertex_buffer"),
                    contents: bytemuck::cast_slice(&batch.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let indices = gpu.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("opframe_index_buffer"),
                    contents: bytemuck::cast_slice(&batch.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
                (vertices, indices)
            });

            let mut encoder = gpu.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("opframe_frame_encoder"),
            });
            {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("opframe_frame_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: target.view(),
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(clear),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });

                if let Some((vertices, indices)) = &buffers {
                    pass.set_pipeline(&solid.pipeline);
                    pass.set_bind_group(0, &solid.bind_group, &[]);
                    pass.set_vertex_buffer(0, vertices.slice(..));
                    pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                    for draw in &batch.draws {
                        let scissor = draw.scissor;
                        pass.set_scissor_rect(
                            scissor.min.x as u32,
                            scissor.min.y as u32,
                            scissor.width() as u32,
                            scissor.height() as u32,
                        );
                        pass.draw_indexed(draw.indices.clone(), 0, 0..1);
                    }
                }
            }
            device.queue.submit(std::iter::once(encoder.finish()));
        })?;

        tracing::trace!("rendered frame with {} draws", self.batch.draws.len());
        Ok(())
    }
}

impl Renderer for WgpuRenderer {
    type Device = WgpuDevice;

    fn clear(&mut self, color: Color) {
        self.clear_color = color;
    }

    fn frame(
        &mut self,
        device: &mut WgpuDevice,
        ops: &Ops,
        target: &WgpuTexture,
        size: (u32, u32),
    ) -> Result<(), DriverError> {
        Ok(self.render(device, ops, target, size)?)
    }

    fn release(&mut self) {
        self.shapes.cache.clear();
        self.batch = Batch::default();
        self.solid.uniform_buffer.destroy();
    }
}
