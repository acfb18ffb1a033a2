pub mod blur_engine;
pub mod box_blur;
mod buffers;
pub mod overlay;
pub mod scaling;
