use crate::blurring::domain::blur_settings::Argb;
use crate::shared::source_image::CHANNELS;

/// Alpha-composites `color` over every RGBA8 pixel ("source over").
///
/// Pixels carry straight (unpremultiplied) alpha. With tint alpha `a` and
/// pixel alpha `d_a`, the result has alpha `a + d_a * (255 - a) / 255` and
/// each colour channel is the alpha-weighted mean of tint and pixel,
/// rounded. A fully transparent colour is a no-op.
pub fn composite_over(data: &mut [u8], color: Argb) {
    let a = color.alpha() as u32;
    if a == 0 {
        return;
    }
    let inv = 255 - a;
    // Tint contribution in 1/255² units.
    let tint = [
        color.red() as u32 * a * 255,
        color.green() as u32 * a * 255,
        color.blue() as u32 * a * 255,
    ];

    for px in data.chunks_exact_mut(CHANNELS) {
        let below = px[3] as u32 * inv;
        let total = a * 255 + below;
        for (c, weighted) in tint.iter().enumerate() {
            px[c] = ((weighted + px[c] as u32 * below + total / 2) / total) as u8;
        }
        px[3] = ((total + 127) / 255) as u8;
    }
}
