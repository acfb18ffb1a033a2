use crate::blurring::domain::blur_error::BlurError;
use crate::shared::source_image::CHANNELS;

/// Byte length of a `width x height` RGBA8 buffer, or an allocation error
/// when the size does not fit in `usize`.
pub fn pixel_len(width: u32, height: u32) -> Result<usize, BlurError> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(CHANNELS))
        .ok_or(BlurError::Allocation { bytes: usize::MAX })
}

/// Resizes `buf` to exactly `len` zeroed bytes, reporting allocation failure
/// instead of aborting.
pub fn resize_buffer(buf: &mut Vec<u8>, len: usize) -> Result<(), BlurError> {
    buf.clear();
    buf.try_reserve_exact(len)
        .map_err(|_| BlurError::Allocation { bytes: len })?;
    buf.resize(len, 0);
    Ok(())
}

pub fn alloc_buffer(len: usize) -> Result<Vec<u8>, BlurError> {
    let mut buf = Vec::new();
    resize_buffer(&mut buf, len)?;
    Ok(buf)
}
