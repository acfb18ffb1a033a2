/// A blurred RGBA8 raster, tagged with the down-sampling factor it was
/// computed with so the rendering layer can rescale it when drawing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlurResult {
    data: Vec<u8>,
    width: u32,
    height: u32,
    down_sampling: u32,
}

impl BlurResult {
    pub fn new(data: Vec<u8>, width: u32, height: u32, down_sampling: u32) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize * 4);
        Self {
            data,
            width,
            height,
            down_sampling,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
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

    pub fn down_sampling(&self) -> u32 {
        self.down_sampling
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }
}
