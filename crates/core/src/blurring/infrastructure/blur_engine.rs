use std::borrow::Cow;

use super::box_blur::box_blur_rgba;
use super::buffers::{alloc_buffer, pixel_len};
use super::overlay::composite_over;
use super::scaling::{downsampled_size, downscale_into, upscale};
use crate::blurring::domain::blur_error::{BlurError, SettingsError};
use crate::blurring::domain::blur_result::BlurResult;
use crate::blurring::domain::blur_settings::{Argb, BlurSettings};
use crate::blurring::domain::snapshot_provider::SnapshotProvider;
use crate::shared::cancel_token::CancelToken;
use crate::shared::source_image::SourceImage;

/// Intermediate buffers reused between blur calls.
#[derive(Debug, Default)]
pub struct BlurScratch {
    work: Vec<u8>,
    temp: Vec<u8>,
}

/// Runs the full blur pipeline: downsample → box blur → optional upsample →
/// overlay.
///
/// A borrowed source is only read. An owned source (a live capture) may be
/// consumed: with `down_sampling == 1` its buffer becomes the working buffer
/// and, when no rescale is needed, the result itself.
pub fn compute_blur(
    source: Cow<'_, SourceImage>,
    settings: &BlurSettings,
    scratch: &mut BlurScratch,
    cancel: &CancelToken,
) -> Result<BlurResult, BlurError> {
    if source.is_empty() {
        return Err(BlurError::NullSource);
    }
    if !source.is_consistent() {
        log::debug!(
            "Source buffer of {} bytes does not match {}x{}",
            source.data().len(),
            source.width(),
            source.height()
        );
        return Err(BlurError::NullSource);
    }
    let factor = settings.down_sampling();
    let (src_w, src_h) = (source.width(), source.height());
    let (w, h) = downsampled_size(src_w, src_h, factor);
    if w == 0 || h == 0 {
        return Err(BlurError::NullSource);
    }
    cancel.check()?;

    let (mut work, recycled) = match source {
        Cow::Owned(image) if factor == 1 => (image.into_data(), true),
        source => {
            let mut buf = std::mem::take(&mut scratch.work);
            downscale_into(source.data(), src_w, src_h, factor, &mut buf)?;
            (buf, false)
        }
    };

    box_blur_rgba(&mut work, w, h, settings.radius(), &mut scratch.temp, cancel)?;
    cancel.check()?;

    let (out_w, out_h) = if settings.keep_down_sampling_size() {
        (w, h)
    } else {
        (src_w, src_h)
    };

    let mut pixels = if (out_w, out_h) != (w, h) {
        let upscaled = upscale(&work, w, h, out_w, out_h)?;
        if !recycled {
            scratch.work = work;
        }
        upscaled
    } else if recycled {
        work
    } else {
        let mut copy = alloc_buffer(pixel_len(w, h)?)?;
        copy.copy_from_slice(&work);
        scratch.work = work;
        copy
    };

    composite_over(&mut pixels, settings.overlay_color());
    Ok(BlurResult::new(pixels, out_w, out_h, factor))
}

/// Stateful CPU blur engine: holds the live settings and caches scratch
/// buffers between calls.
///
/// [`destroy`](Self::destroy) only drops the cache; the engine stays usable
/// and reallocates on the next blur.
#[derive(Debug)]
pub struct BlurEngine {
    settings: BlurSettings,
    destroy_after_blur: bool,
    scratch: Option<BlurScratch>,
}

impl Default for BlurEngine {
    fn default() -> Self {
        Self::new(BlurSettings::default())
    }
}

impl BlurEngine {
    pub fn new(settings: BlurSettings) -> Self {
        Self {
            settings,
            destroy_after_blur: true,
            scratch: None,
        }
    }

    pub fn settings(&self) -> BlurSettings {
        self.settings
    }

    pub fn down_sampling(&self) -> u32 {
        self.settings.down_sampling()
    }

    pub fn set_radius(&mut self, radius: i32) -> Result<(), SettingsError> {
        self.settings.set_radius(radius).map_err(log_rejected)
    }

    pub fn set_down_sampling(&mut self, down_sampling: i32) -> Result<(), SettingsError> {
        self.settings
            .set_down_sampling(down_sampling)
            .map_err(log_rejected)
    }

    pub fn set_overlay_color(&mut self, color: Argb) {
        self.settings.set_overlay_color(color);
    }

    pub fn set_keep_down_sampling_size(&mut self, keep: bool) {
        self.settings.set_keep_down_sampling_size(keep);
    }

    /// Whether scratch buffers are released automatically after each blur.
    pub fn set_destroy_after_blur(&mut self, destroy: bool) {
        self.destroy_after_blur = destroy;
    }

    pub fn destroy_after_blur(&self) -> bool {
        self.destroy_after_blur
    }

    /// Blurs a standalone image with the current settings. `source` is
    /// never modified.
    pub fn blur(&mut self, source: &SourceImage) -> Option<BlurResult> {
        let settings = self.settings;
        self.run(Cow::Borrowed(source), &settings, &CancelToken::new())
    }

    /// Captures a snapshot and blurs it. The capture is owned by the engine
    /// for this one computation.
    pub fn blur_snapshot(&mut self, provider: &dyn SnapshotProvider) -> Option<BlurResult> {
        let Some(capture) = provider.capture() else {
            log::debug!("Snapshot provider returned no image, skipping blur");
            return None;
        };
        let settings = self.settings;
        self.run(Cow::Owned(capture), &settings, &CancelToken::new())
    }

    /// Blurs with an explicit settings snapshot and cancellation token.
    /// Failures are logged and reported as `None`.
    pub fn run(
        &mut self,
        source: Cow<'_, SourceImage>,
        settings: &BlurSettings,
        cancel: &CancelToken,
    ) -> Option<BlurResult> {
        let scratch = self.scratch.get_or_insert_with(BlurScratch::default);
        let result = compute_blur(source, settings, scratch, cancel);
        if self.destroy_after_blur {
            self.destroy();
        }
        match result {
            Ok(blurred) => Some(blurred),
            Err(e) => {
                log::debug!("Blur produced no result: {e}");
                None
            }
        }
    }

    /// Releases cached intermediate buffers.
    pub fn destroy(&mut self) {
        self.scratch = None;
    }

    pub fn has_cached_buffers(&self) -> bool {
        self.scratch.is_some()
    }
}

fn log_rejected(e: SettingsError) -> SettingsError {
    log::warn!("Ignoring blur setting: {e}");
    e
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn settings(radius: i32, down_sampling: i32, keep: bool) -> BlurSettings {
        BlurSettings::default()
            .with_radius(radius)
            .unwrap()
            .with_down_sampling(down_sampling)
            .unwrap()
            .with_keep_down_sampling_size(keep)
    }

    fn checkerboard(width: u32, height: u32) -> SourceImage {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = if (x / 3 + y / 3) % 2 == 0 { 240 } else { 20 };
                data.extend_from_slice(&[v, v / 2, 255 - v, 255]);
            }
        }
        SourceImage::new(data, width, height)
    }

    struct StubProvider {
        image: Option<SourceImage>,
    }

    impl SnapshotProvider for StubProvider {
        fn capture(&self) -> Option<SourceImage> {
            self.image.clone()
        }
    }

    #[test]
    fn test_identical_inputs_give_identical_bytes() {
        let source = checkerboard(40, 30);
        let mut engine = BlurEngine::new(settings(5, 3, false));
        let first = engine.blur(&source).unwrap();
        let second = engine.blur(&source).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_down_sampling_one_keeps_dimensions() {
        let source = checkerboard(17, 11);
        let mut engine = BlurEngine::new(settings(2, 1, true));
        let result = engine.blur(&source).unwrap();
        assert_eq!((result.width(), result.height()), (17, 11));
    }

    #[rstest]
    #[case::keep_exact(100, 100, 4, true, (25, 25))]
    #[case::keep_floor(50, 21, 8, true, (6, 2))]
    #[case::restore_exact(100, 100, 4, false, (100, 100))]
    #[case::restore_floor(50, 21, 8, false, (50, 21))]
    fn test_size_policy(
        #[case] w: u32,
        #[case] h: u32,
        #[case] down_sampling: i32,
        #[case] keep: bool,
        #[case] expected: (u32, u32),
    ) {
        let mut engine = BlurEngine::new(settings(3, down_sampling, keep));
        let result = engine.blur(&checkerboard(w, h)).unwrap();
        assert_eq!((result.width(), result.height()), expected);
        assert_eq!(result.down_sampling(), down_sampling as u32);
    }

    #[test]
    fn test_zero_radius_is_downsample_plus_overlay_only() {
        let source = checkerboard(24, 24);
        let overlay = Argb(0x4000_0000);
        let mut engine = BlurEngine::new(settings(0, 2, true).with_overlay_color(overlay));
        let result = engine.blur(&source).unwrap();

        let mut expected = Vec::new();
        downscale_into(source.data(), 24, 24, 2, &mut expected).unwrap();
        composite_over(&mut expected, overlay);
        assert_eq!(result.data(), &expected[..]);
    }

    #[test]
    fn test_concrete_scenario_100x100() {
        let source = checkerboard(100, 100);
        let overlay = Argb(0x4000_0000);
        let mut engine = BlurEngine::new(settings(10, 4, true).with_overlay_color(overlay));
        let result = engine.blur(&source).unwrap();
        assert_eq!((result.width(), result.height()), (25, 25));

        let mut expected = Vec::new();
        downscale_into(source.data(), 100, 100, 4, &mut expected).unwrap();
        box_blur_rgba(&mut expected, 25, 25, 10, &mut Vec::new(), &CancelToken::new()).unwrap();
        composite_over(&mut expected, overlay);
        assert_eq!(result.data(), &expected[..]);
        assert!(result.data().chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn test_overlay_on_translucent_source_uses_straight_alpha() {
        let source = SourceImage::filled(8, 8, [255, 0, 0, 128]);
        let overlay = Argb(0x4000_0000);
        let mut engine = BlurEngine::new(settings(2, 2, false).with_overlay_color(overlay));
        let result = engine.blur(&source).unwrap();

        assert_eq!((result.width(), result.height()), (8, 8));
        assert!(result
            .data()
            .chunks_exact(4)
            .all(|px| px == [153, 0, 0, 160]));
    }

    #[test]
    fn test_borrowed_source_is_untouched() {
        let source = checkerboard(16, 16);
        let before = source.clone();
        let mut engine = BlurEngine::new(settings(4, 1, false).with_overlay_color(Argb(0x80FF_0000)));
        engine.blur(&source).unwrap();
        assert_eq!(source, before);
    }

    #[test]
    fn test_owned_capture_matches_borrowed_result() {
        let source = checkerboard(16, 12);
        let s = settings(3, 1, false);
        let borrowed = compute_blur(
            Cow::Borrowed(&source),
            &s,
            &mut BlurScratch::default(),
            &CancelToken::new(),
        )
        .unwrap();
        let owned = compute_blur(
            Cow::Owned(source.clone()),
            &s,
            &mut BlurScratch::default(),
            &CancelToken::new(),
        )
        .unwrap();
        assert_eq!(borrowed, owned);
    }

    #[rstest]
    #[case::zero_width(SourceImage::new(Vec::new(), 0, 5))]
    #[case::zero_height(SourceImage::new(Vec::new(), 5, 0))]
    #[case::smaller_than_factor(SourceImage::filled(3, 3, [1, 2, 3, 255]))]
    fn test_null_source_yields_none(#[case] source: SourceImage) {
        let mut engine = BlurEngine::new(settings(2, 8, false));
        assert!(engine.blur(&source).is_none());
    }

    #[rstest]
    #[case::short_buffer(vec![0u8; 10])]
    #[case::long_buffer(vec![0u8; 4 * 4 * 4 + 3])]
    fn test_mismatched_buffer_yields_none(#[case] data: Vec<u8>) {
        let source = SourceImage::new(data, 4, 4);
        let mut engine = BlurEngine::new(settings(1, 1, true));
        assert!(engine.blur(&source).is_none());
        let s = engine.settings();
        assert!(engine.run(Cow::Owned(source), &s, &CancelToken::new()).is_none());
    }

    #[test]
    fn test_snapshot_without_capture_yields_none() {
        let mut engine = BlurEngine::default();
        assert!(engine.blur_snapshot(&StubProvider { image: None }).is_none());
    }

    #[test]
    fn test_snapshot_is_blurred() {
        let provider = StubProvider {
            image: Some(checkerboard(32, 32)),
        };
        let mut engine = BlurEngine::new(settings(2, 4, true));
        let result = engine.blur_snapshot(&provider).unwrap();
        assert_eq!((result.width(), result.height()), (8, 8));
    }

    #[test]
    fn test_cancelled_computation_yields_none() {
        let token = CancelToken::new();
        token.cancel();
        let mut engine = BlurEngine::default();
        let source = checkerboard(64, 64);
        let s = engine.settings();
        assert!(engine.run(Cow::Borrowed(&source), &s, &token).is_none());
    }

    #[test]
    fn test_blur_after_destroy_reallocates() {
        let source = checkerboard(32, 32);
        let mut engine = BlurEngine::new(settings(3, 2, false));
        engine.set_destroy_after_blur(false);
        let before = engine.blur(&source).unwrap();
        assert!(engine.has_cached_buffers());

        engine.destroy();
        assert!(!engine.has_cached_buffers());

        let after = engine.blur(&source).unwrap();
        assert_eq!(before, after);
        assert!(engine.has_cached_buffers());
    }

    #[test]
    fn test_destroy_after_blur_releases_cache_by_default() {
        let mut engine = BlurEngine::default();
        assert!(engine.destroy_after_blur());
        engine.blur(&checkerboard(32, 32)).unwrap();
        assert!(!engine.has_cached_buffers());
    }

    #[test]
    fn test_invalid_configuration_keeps_previous_values() {
        let mut engine = BlurEngine::default();
        engine.set_radius(7).unwrap();
        engine.set_down_sampling(3).unwrap();
        assert!(engine.set_radius(-2).is_err());
        assert!(engine.set_down_sampling(0).is_err());
        assert_eq!(engine.settings().radius(), 7);
        assert_eq!(engine.down_sampling(), 3);
    }
}
