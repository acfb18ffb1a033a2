use std::fmt;
use std::sync::Arc;

use crate::blurring::domain::blur_result::BlurResult;
use crate::shared::submission_stamp::SubmissionStamp;

/// A completed blur, tagged with when its request was submitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlurDelivery {
    pub stamp: SubmissionStamp,
    pub result: BlurResult,
}

/// A display element that can show a blurred image.
///
/// Implementations are only ever called on the UI context.
pub trait BlurSurface: Send + Sync {
    /// Show the result as the element's own visual content.
    fn bind_content(&self, delivery: BlurDelivery);

    /// Show the result as a background layer, leaving foreground content
    /// untouched.
    fn bind_background(&self, delivery: BlurDelivery);
}

pub type DeliverFn = Box<dyn FnOnce(BlurDelivery) + Send>;

/// Where a finished blur goes.
pub enum BlurTarget {
    Display(Arc<dyn BlurSurface>),
    Background(Arc<dyn BlurSurface>),
    Custom(DeliverFn),
}

impl BlurTarget {
    pub fn custom<F>(deliver: F) -> Self
    where
        F: FnOnce(BlurDelivery) + Send + 'static,
    {
        BlurTarget::Custom(Box::new(deliver))
    }

    pub fn deliver(self, delivery: BlurDelivery) {
        match self {
            BlurTarget::Display(surface) => surface.bind_content(delivery),
            BlurTarget::Background(surface) => surface.bind_background(delivery),
            BlurTarget::Custom(deliver) => deliver(delivery),
        }
    }
}

impl fmt::Debug for BlurTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlurTarget::Display(_) => f.write_str("BlurTarget::Display"),
            BlurTarget::Background(_) => f.write_str("BlurTarget::Background"),
            BlurTarget::Custom(_) => f.write_str("BlurTarget::Custom"),
        }
    }
}
