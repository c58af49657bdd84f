use anyhow::{Context, Result};

/// Maps the first `size` bytes of a `MAP_READ` buffer, copies them out and unmaps.
///
/// Blocks the calling thread until every submission touching `buffer` has
/// completed on the device.
pub fn map_read_blocking(device: &wgpu::Device, buffer: &wgpu::Buffer, size: u64) -> Result<Vec<u8>> {
    if size == 0 {
        return Ok(Vec::new());
    }

    let slice = buffer.slice(..size);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |res| {
        let _ = tx.send(res);
    });

    device
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        })
        .context("device poll failed while waiting for readback")?;

    rx.recv()
        .context("readback map callback was dropped")?
        .context("failed to map readback buffer")?;

    let bytes = slice.get_mapped_range().to_vec();
    buffer.unmap();
    Ok(bytes)
}

/// Copies `size` bytes of `src` starting at `offset` into a temporary staging
/// buffer and returns them.
///
/// `offset` and `size` must be multiples of `wgpu::COPY_BUFFER_ALIGNMENT`.
/// Allocates per call; meant for diagnostics and tests, not per-frame paths.
pub fn read_buffer(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    src: &wgpu::Buffer,
    offset: u64,
    size: u64,
) -> Result<Vec<u8>> {
    if size == 0 {
        return Ok(Vec::new());
    }

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("drawcull readback staging"),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("drawcull readback encoder"),
    });
    encoder.copy_buffer_to_buffer(src, offset, &staging, 0, size);
    queue.submit(std::iter::once(encoder.finish()));

    map_read_blocking(device, &staging, size)
}
