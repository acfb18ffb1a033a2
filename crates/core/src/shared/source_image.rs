/// A raster snapshot: contiguous RGBA8 bytes in row-major order.
///
/// Blurring a borrowed `SourceImage` never mutates it. Blurring an owned one
/// (a capture taken from a live view) may recycle its buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceImage {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

/// Bytes per RGBA8 pixel.
pub const CHANNELS: usize = 4;

impl SourceImage {
    /// Wraps `data` without copying. A buffer whose length is not
    /// `width * height * 4` is accepted here but never blurred; see
    /// [`is_consistent`](Self::is_consistent).
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
        }
    }

    /// Creates an image where every pixel has the same RGBA value.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * CHANNELS)
            .collect();
        Self::new(data, width, height)
    }

    /// Whether the buffer length matches the dimensions.
    pub fn is_consistent(&self) -> bool {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|n| n.checked_mul(CHANNELS))
            == Some(self.data.len())
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// True when the image has no pixels to blur.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * CHANNELS;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 16]; // 2x2x4
        let image = SourceImage::new(data.clone(), 2, 2);
        assert_eq!(image.width(), 2);
        assert_eq!(image.height(), 2);
        assert_eq!(image.data(), &data[..]);
        assert!(!image.is_empty());
    }

    #[test]
    fn test_filled_repeats_pixel() {
        let image = SourceImage::filled(3, 2, [1, 2, 3, 4]);
        assert_eq!(image.data().len(), 3 * 2 * 4);
        assert_eq!(image.pixel(2, 1), [1, 2, 3, 4]);
    }

    #[test]
    fn test_zero_area_is_empty() {
        assert!(SourceImage::new(Vec::new(), 0, 10).is_empty());
        assert!(SourceImage::new(Vec::new(), 10, 0).is_empty());
    }

    #[test]
    fn test_data_mut_allows_modification() {
        let mut image = SourceImage::filled(1, 1, [0, 0, 0, 0]);
        image.data_mut()[3] = 255;
        assert_eq!(image.pixel(0, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn test_mismatched_data_length_is_inconsistent() {
        assert!(!SourceImage::new(vec![0u8; 10], 2, 2).is_consistent());
        assert!(SourceImage::new(vec![0u8; 16], 2, 2).is_consistent());
        assert!(SourceImage::new(Vec::new(), 0, 7).is_consistent());
    }
}
