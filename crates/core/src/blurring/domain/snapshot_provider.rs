use crate::shared::source_image::SourceImage;

/// Produces a pixel snapshot of a live visual element.
///
/// How rasterization happens is up to the implementation. Returning `None`
/// means there is nothing to blur this frame.
pub trait SnapshotProvider: Send + Sync {
    fn capture(&self) -> Option<SourceImage>;
}
