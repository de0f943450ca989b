use std::fmt::Debug;

use image::GrayImage;
use crate::{
    error::Result,
    types::{CandidateImage, TargetImage},
};

/// Image primitives the preprocessing stage relies on.
///
/// Implementations are stateless so a single backend can be shared by every
/// ranking worker.
pub trait ImageBackend: Send + Sync + Debug {
    /// Short name used in logs and configuration
    fn name(&self) -> &'static str;

    /// Low-pass filter the image
    fn blur(&self, image: &GrayImage, sigma: f32) -> GrayImage;

    /// Resample the image to exactly `width` x `height`
    fn resize(&self, image: &GrayImage, width: u32, height: u32) -> GrayImage;

    /// Binarize: pixels strictly above `level` become 255, everything else 0
    fn threshold(&self, image: &GrayImage, level: u8) -> GrayImage;

    /// Produce a binary edge map
    fn detect_edges(&self, image: &GrayImage, low: f32, high: f32) -> GrayImage;
}

/// Trait for contour extraction algorithms
pub trait ContourExtractor: Send + Sync + Debug {
    /// Trace every closed boundary in a binary image, in raster scan order
    fn extract_contours(&self, image: &GrayImage) -> Result<Vec<Vec<[f32; 2]>>>;
}

/// Per-candidate scoring unit run by the ranking workers.
///
/// The target is prepared once into a `Reference` which every worker gets its
/// own copy of.
pub trait CandidateScorer: Send + Sync {
    type Reference: Clone + Send + Sync + 'static;

    /// Prepare the target once before fan-out
    fn reference(&self, target: &TargetImage) -> Result<Self::Reference>;

    /// Score one candidate against the prepared target
    fn score(&self, reference: &Self::Reference, candidate: &CandidateImage) -> Result<f64>;
}
