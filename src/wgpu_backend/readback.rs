use std::sync::mpsc;

use image::RgbaImage;

use super::device::WgpuDevice;
use super::WgpuError;
use crate::geometry::Rect;

const BYTES_PER_PIXEL: u32 = 4;

/// Row sizes of a `width` pixels wide copy: the tight size and the size
/// padded to wgpu's row alignment.
fn compute_padded_bytes_per_row(width: u32, bytes_per_pixel: u32) -> (u32, u32) {
    let unpadded = width * bytes_per_pixel;
    let padded = unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
        * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (unpadded, padded)
}

fn copy_padded_readback_rows(
    data: &[u8],
    height: u32,
    unpadded_bytes_per_row: u32,
    padded_bytes_per_row: u32,
    output: &mut Vec<u8>,
) {
    let output_size = (unpadded_bytes_per_row * height) as usize;
    output.resize(output_size, 0);

    if padded_bytes_per_row == unpadded_bytes_per_row {
        output.copy_from_slice(&data[..output_size]);
        return;
    }

    for row in 0..height {
        let padded_offset = (row * padded_bytes_per_row) as usize;
        let unpadded_offset = (row * unpadded_bytes_per_row) as usize;
        let row_data = &data[padded_offset..padded_offset + unpadded_bytes_per_row as usize];
        output[unpadded_offset..unpadded_offset + unpadded_bytes_per_row as usize]
            .copy_from_slice(row_data);
    }
}

fn map_readback_buffer_into(
    device: &wgpu::Device,
    buffer: &wgpu::Buffer,
    mapped_bytes: &mut Vec<u8>,
) -> Result<(), WgpuError> {
    mapped_bytes.clear();

    let buffer_slice = buffer.slice(..);
    let (sender, receiver) = mpsc::channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        if sender.send(result).is_err() {
            tracing::warn!("readback finished after the caller stopped waiting");
        }
    });

    device.poll(wgpu::PollType::Wait)?;

    receiver
        .recv()
        .map_err(|_| WgpuError::MapCallbackDropped)??;

    let mapped_range = buffer_slice.get_mapped_range();
    mapped_bytes.extend_from_slice(&mapped_range);
    drop(mapped_range);
    buffer.unmap();
    Ok(())
}

/// Copies `region` of `texture` into host memory as tightly packed RGBA rows.
pub(super) fn download_region(
    device: &WgpuDevice,
    texture: &wgpu::Texture,
    region: Rect,
) -> Result<RgbaImage, WgpuError> {
    let (texture_width, texture_height) = (texture.width(), texture.height());
    let in_bounds = region.min.x >= 0
        && region.min.y >= 0
        && region.max.x as i64 <= texture_width as i64
        && region.max.y as i64 <= texture_height as i64;
    if !in_bounds {
        return Err(WgpuError::RegionOutOfBounds {
            region: [region.min.x, region.min.y, region.max.x, region.max.y],
            width: texture_width,
            height: texture_height,
        });
    }
    if region.is_empty() {
        let width = region.width().max(0) as u32;
        let height = region.height().max(0) as u32;
        return Ok(RgbaImage::new(width, height));
    }

    let width = region.width() as u32;
    let height = region.height() as u32;
    let (unpadded_bytes_per_row, padded_bytes_per_row) =
        compute_padded_bytes_per_row(width, BYTES_PER_PIXEL);

    let buffer = device.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("opframe_readback_buffer"),
        size: padded_bytes_per_row as u64 * height as u64,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = device
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("opframe_readback_encoder"),
        });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d {
                x: region.min.x as u32,
                y: region.min.y as u32,
                z: 0,
            },
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    device.queue.submit(std::iter::once(encoder.finish()));

    let mut readback_bytes = Vec::new();
    map_readback_buffer_into(&device.device, &buffer, &mut readback_bytes)?;
    buffer.destroy();

    let expected = padded_bytes_per_row as usize * height as usize;
    if readback_bytes.len() < expected {
        return Err(WgpuError::ShortReadback {
            expected,
            actual: readback_bytes.len(),
        });
    }

    let mut pixels = Vec::new();
    copy_padded_readback_rows(
        &readback_bytes,
        height,
        unpadded_bytes_per_row,
        padded_bytes_per_row,
        &mut pixels,
    );
    let actual = pixels.len();
    RgbaImage::from_raw(width, height, pixels).ok_or(WgpuError::ShortReadback {
        expected: unpadded_bytes_per_row as usize * height as usize,
        actual,
    })
}
