use super::buffers::resize_buffer;
use crate::blurring::domain::blur_error::BlurError;
use crate::shared::cancel_token::CancelToken;
use crate::shared::source_image::CHANNELS;

/// Separable box blur over RGBA8 pixels, in place.
///
/// Each pass averages a `2 * radius + 1` window with edge-clamped sampling
/// using a running sum, so cost is independent of the radius. Results are
/// rounded half-up after every pass. `radius == 0` leaves `data` untouched.
///
/// `temp` holds the intermediate horizontal pass and is reused across calls.
/// The token is polled once per row and column.
pub fn box_blur_rgba(
    data: &mut [u8],
    width: u32,
    height: u32,
    radius: u32,
    temp: &mut Vec<u8>,
    cancel: &CancelToken,
) -> Result<(), BlurError> {
    cancel.check()?;
    if radius == 0 || width == 0 || height == 0 {
        return Ok(());
    }
    let (w, h, r) = (width as usize, height as usize, radius as usize);
    resize_buffer(temp, data.len())?;

    // Horizontal pass: data → temp
    for y in 0..h {
        cancel.check()?;
        blur_line(data, temp, y * w * CHANNELS, CHANNELS, w, r);
    }

    // Vertical pass: temp → data
    for x in 0..w {
        cancel.check()?;
        blur_line(temp, data, x * CHANNELS, w * CHANNELS, h, r);
    }

    Ok(())
}

/// Blurs one row or column of `len` pixels starting at byte `start`, stepping
/// `step` bytes per pixel.
fn blur_line(src: &[u8], dst: &mut [u8], start: usize, step: usize, len: usize, radius: usize) {
    let last = len - 1;
    let at = |i: usize| start + i.min(last) * step;
    let div = (2 * radius + 1) as u64;

    // Window for pixel 0 spans -radius..=radius; negative indices clamp to 0.
    let mut sum = [0u64; CHANNELS];
    let inside = radius.min(last);
    for (c, acc) in sum.iter_mut().enumerate() {
        let first = src[start + c] as u64;
        let mut total = first * (radius as u64 + 1);
        for i in 1..=inside {
            total += src[at(i) + c] as u64;
        }
        total += src[at(last) + c] as u64 * (radius - inside) as u64;
        *acc = total;
    }

    for i in 0..len {
        let out = start + i * step;
        for (c, acc) in sum.iter().enumerate() {
            dst[out + c] = ((acc + div / 2) / div) as u8;
        }
        let incoming = at(i + radius + 1);
        let outgoing = at(i.saturating_sub(radius));
        for (c, acc) in sum.iter_mut().enumerate() {
            *acc = *acc + src[incoming + c] as u64 - src[outgoing + c] as u64;
        }
    }
}
