use super::buffers::{alloc_buffer, pixel_len, resize_buffer};
use crate::blurring::domain::blur_error::BlurError;
use crate::shared::source_image::CHANNELS;

/// Dimensions after shrinking by an integer `factor` (floor division).
pub fn downsampled_size(width: u32, height: u32, factor: u32) -> (u32, u32) {
    let factor = factor.max(1);
    (width / factor, height / factor)
}

/// Downscale RGBA8 pixels by an integer factor using area averaging.
///
/// Each output pixel is the rounded mean of a `factor x factor` block;
/// trailing rows and columns that do not fill a whole block are dropped.
/// Writes into `out`, reusing its allocation.
pub fn downscale_into(
    data: &[u8],
    width: u32,
    height: u32,
    factor: u32,
    out: &mut Vec<u8>,
) -> Result<(u32, u32), BlurError> {
    let (new_w, new_h) = downsampled_size(width, height, factor);
    resize_buffer(out, pixel_len(new_w, new_h)?)?;

    if factor <= 1 {
        let len = out.len();
        out.copy_from_slice(&data[..len]);
        return Ok((new_w, new_h));
    }

    let (w, nw, nh, scale) = (width as usize, new_w as usize, new_h as usize, factor as usize);
    let count = (scale * scale) as u32;

    for y in 0..nh {
        for x in 0..nw {
            let mut sum = [0u32; CHANNELS];
            for dy in 0..scale {
                let row = (y * scale + dy) * w;
                for dx in 0..scale {
                    let idx = (row + x * scale + dx) * CHANNELS;
                    for (c, acc) in sum.iter_mut().enumerate() {
                        *acc += data[idx + c] as u32;
                    }
                }
            }
            let dst = (y * nw + x) * CHANNELS;
            for (c, acc) in sum.iter().enumerate() {
                out[dst + c] = ((acc + count / 2) / count) as u8;
            }
        }
    }

    Ok((new_w, new_h))
}

/// Fractional weights are stored in 1/256 steps.
const WEIGHT_ONE: u32 = 256;

/// Where one destination coordinate samples the source axis: the two
/// neighbouring source indices and the weight of the upper one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct AxisSample {
    lo: usize,
    hi: usize,
    weight: u32,
}

/// Corner-aligned sample positions for stretching `src` entries over `dst`.
fn axis_samples(src: usize, dst: usize) -> Vec<AxisSample> {
    let last = src.saturating_sub(1);
    let step = if dst > 1 {
        last as f64 / (dst - 1) as f64
    } else {
        0.0
    };
    (0..dst)
        .map(|i| {
            let pos = i as f64 * step;
            let lo = (pos as usize).min(last);
            let weight = ((pos - lo as f64) * WEIGHT_ONE as f64).round() as u32;
            AxisSample {
                lo,
                hi: (lo + 1).min(last),
                weight: weight.min(WEIGHT_ONE),
            }
        })
        .collect()
}

/// Stretch RGBA8 pixels to `target_w x target_h` with bilinear
/// interpolation. Corner pixels map onto corner pixels.
pub fn upscale(
    data: &[u8],
    width: u32,
    height: u32,
    target_w: u32,
    target_h: u32,
) -> Result<Vec<u8>, BlurError> {
    if width == 0 || height == 0 {
        return Err(BlurError::NullSource);
    }
    let mut out = alloc_buffer(pixel_len(target_w, target_h)?)?;
    if out.is_empty() {
        return Ok(out);
    }
    let stride = width as usize * CHANNELS;
    let columns = axis_samples(width as usize, target_w as usize);
    let rows = axis_samples(height as usize, target_h as usize);

    for (dst_row, row) in out.chunks_exact_mut(target_w as usize * CHANNELS).zip(&rows) {
        let upper = &data[row.lo * stride..][..stride];
        let lower = &data[row.hi * stride..][..stride];
        let (wy1, wy0) = (row.weight, WEIGHT_ONE - row.weight);

        for (dst, col) in dst_row.chunks_exact_mut(CHANNELS).zip(&columns) {
            let (wx1, wx0) = (col.weight, WEIGHT_ONE - col.weight);
            let (a, b) = (col.lo * CHANNELS, col.hi * CHANNELS);
            for c in 0..CHANNELS {
                let top = upper[a + c] as u32 * wx0 + upper[b + c] as u32 * wx1;
                let bottom = lower[a + c] as u32 * wx0 + lower[b + c] as u32 * wx1;
                let mixed = top * wy0 + bottom * wy1;
                dst[c] = ((mixed + WEIGHT_ONE * WEIGHT_ONE / 2) / (WEIGHT_ONE * WEIGHT_ONE)) as u8;
            }
        }
    }

    Ok(out)
}
