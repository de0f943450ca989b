use std::sync::Arc;

use image::{imageops::FilterType, GrayImage, Luma};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use crate::{
    error::{Result, SilhouetteError},
    traits::ImageBackend,
    types::{CandidateImage, PixelBuffer, TargetImage},
};

/// Full imageproc-backed implementation (Gaussian blur, Canny, bilinear resize)
#[derive(Debug, Clone, Default)]
pub struct ImageprocBackend;

impl ImageBackend for ImageprocBackend {
    fn name(&self) -> &'static str {
        "imageproc"
    }

    fn blur(&self, image: &GrayImage, sigma: f32) -> GrayImage {
        if sigma <= 0.0 {
            return image.clone();
        }
        imageproc::filter::gaussian_blur_f32(image, sigma)
    }

    fn resize(&self, image: &GrayImage, width: u32, height: u32) -> GrayImage {
        image::imageops::resize(image, width, height, FilterType::Triangle)
    }

    fn threshold(&self, image: &GrayImage, level: u8) -> GrayImage {
        imageproc::contrast::threshold(image, level)
    }

    fn detect_edges(&self, image: &GrayImage, low: f32, high: f32) -> GrayImage {
        imageproc::edges::canny(image, low, high)
    }
}

/// Lightweight stand-in backend: no filtering, nearest-neighbour resize, and
/// "edges" are simply the binarized silhouette. Cheap and fully deterministic.
#[derive(Debug, Clone, Default)]
pub struct ThresholdBackend;

impl ImageBackend for ThresholdBackend {
    fn name(&self) -> &'static str {
        "threshold"
    }

    fn blur(&self, image: &GrayImage, _sigma: f32) -> GrayImage {
        image.clone()
    }

    fn resize(&self, image: &GrayImage, width: u32, height: u32) -> GrayImage {
        image::imageops::resize(image, width, height, FilterType::Nearest)
    }

    fn threshold(&self, image: &GrayImage, level: u8) -> GrayImage {
        GrayImage::from_fn(image.width(), image.height(), |x, y| {
            if image.get_pixel(x, y)[0] > level {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        })
    }

    fn detect_edges(&self, image: &GrayImage, low: f32, _high: f32) -> GrayImage {
        self.threshold(image, low.clamp(0.0, 255.0) as u8)
    }
}

/// Tunables for turning raw buffers into edge maps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PreprocessSettings {
    /// Mask pixels strictly above this value are foreground
    pub mask_threshold: u8,
    /// Gaussian sigma applied before edge detection (0 disables)
    pub blur_sigma: f32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Images larger than this on their longest side are downscaled first
    pub max_dimension: Option<u32>,
}

impl Default for PreprocessSettings {
    fn default() -> Self {
        Self {
            mask_threshold: 127,
            blur_sigma: 1.0,
            canny_low: 50.0,
            canny_high: 100.0,
            max_dimension: Some(512),
        }
    }
}

/// Converts target and candidate buffers into the binary maps consumed by
/// contour extraction. All dimension checks happen here.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    backend: Arc<dyn ImageBackend>,
    settings: PreprocessSettings,
}

impl Preprocessor {
    pub fn new(backend: Arc<dyn ImageBackend>, settings: PreprocessSettings) -> Self {
        Self { backend, settings }
    }

    pub fn backend(&self) -> &dyn ImageBackend {
        self.backend.as_ref()
    }

    pub fn settings(&self) -> &PreprocessSettings {
        &self.settings
    }

    /// Binary silhouette of the target, taken from its segmentation mask.
    pub fn target_edges(&self, target: &TargetImage) -> Result<GrayImage> {
        target.pixels.validate()?;
        ensure_same_dimensions("target mask", &target.pixels, &target.mask)?;
        self.mask_edges(&target.mask)
    }

    /// Edge map of a candidate: its mask when present, otherwise the
    /// detected edges of its pixels.
    pub fn candidate_edges(&self, candidate: &CandidateImage) -> Result<GrayImage> {
        match &candidate.mask {
            Some(mask) => {
                candidate.pixels.validate()?;
                ensure_same_dimensions("candidate mask", &candidate.pixels, mask)?;
                self.mask_edges(mask)
            }
            None => self.pixel_edges(&candidate.pixels),
        }
    }

    fn mask_edges(&self, mask: &PixelBuffer) -> Result<GrayImage> {
        let luma = self.fit(mask.to_luma()?);
        Ok(self.backend.threshold(&luma, self.settings.mask_threshold))
    }

    fn pixel_edges(&self, pixels: &PixelBuffer) -> Result<GrayImage> {
        let luma = self.fit(pixels.to_luma()?);
        let blurred = self.backend.blur(&luma, self.settings.blur_sigma);
        Ok(self
            .backend
            .detect_edges(&blurred, self.settings.canny_low, self.settings.canny_high))
    }

    /// Downscale so the longest side does not exceed `max_dimension`.
    fn fit(&self, image: GrayImage) -> GrayImage {
        let Some(limit) = self.settings.max_dimension.filter(|&limit| limit > 0) else {
            return image;
        };
        let (width, height) = image.dimensions();
        let longest = width.max(height);
        if longest <= limit {
            return image;
        }

        let scale = limit as f64 / longest as f64;
        let new_width = ((width as f64 * scale).round() as u32).max(1);
        let new_height = ((height as f64 * scale).round() as u32).max(1);
        self.backend.resize(&image, new_width, new_height)
    }
}

fn ensure_same_dimensions(
    context: &'static str,
    pixels: &PixelBuffer,
    mask: &PixelBuffer,
) -> Result<()> {
    if pixels.dimensions() != mask.dimensions() {
        return Err(SilhouetteError::DimensionMismatch {
            context,
            expected: pixels.dimensions(),
            actual: mask.dimensions(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PixelFormat;

    fn square_mask(size: u32, from: u32, to: u32) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            if (from..to).contains(&x) && (from..to).contains(&y) {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        })
    }

    fn preprocessor(backend: impl ImageBackend + 'static) -> Preprocessor {
        Preprocessor::new(Arc::new(backend), PreprocessSettings::default())
    }

    #[test]
    fn target_mask_mismatch_fails_fast() {
        let target = TargetImage::new(GrayImage::new(100, 100), GrayImage::new(100, 80));
        let err = preprocessor(ImageprocBackend).target_edges(&target).unwrap_err();
        assert!(matches!(
            err,
            SilhouetteError::DimensionMismatch {
                expected: (100, 100),
                actual: (100, 80),
                ..
            }
        ));
    }

    #[test]
    fn candidate_mask_mismatch_fails_fast() {
        let candidate = CandidateImage::new(GrayImage::new(10, 10)).with_mask(GrayImage::new(12, 10));
        let err = preprocessor(ThresholdBackend).candidate_edges(&candidate).unwrap_err();
        assert!(matches!(err, SilhouetteError::DimensionMismatch { .. }));
    }

    #[test]
    fn malformed_candidate_pixels_are_reported() {
        let candidate = CandidateImage::new(PixelBuffer::new(8, 8, PixelFormat::Luma8, vec![0; 3]));
        let err = preprocessor(ThresholdBackend).candidate_edges(&candidate).unwrap_err();
        assert!(matches!(err, SilhouetteError::MalformedBuffer { .. }));
    }

    #[test]
    fn mask_is_binarized() {
        let mut mask = square_mask(20, 5, 15);
        mask.put_pixel(0, 0, Luma([100u8]));
        let target = TargetImage::new(GrayImage::new(20, 20), mask);
        let edges = preprocessor(ImageprocBackend).target_edges(&target).expect("valid target");
        assert_eq!(edges.get_pixel(0, 0)[0], 0);
        assert_eq!(edges.get_pixel(10, 10)[0], 255);
    }

    #[test]
    fn large_images_are_downscaled() {
        let settings = PreprocessSettings {
            max_dimension: Some(50),
            ..PreprocessSettings::default()
        };
        let pre = Preprocessor::new(Arc::new(ThresholdBackend), settings);
        let target = TargetImage::new(GrayImage::new(200, 100), GrayImage::new(200, 100));
        let edges = pre.target_edges(&target).expect("valid target");
        assert_eq!(edges.dimensions(), (50, 25));
    }

    #[test]
    fn backends_agree_on_threshold() {
        let image = GrayImage::from_fn(16, 1, |x, _| Luma([(x * 16) as u8]));
        assert_eq!(
            ImageprocBackend.threshold(&image, 100),
            ThresholdBackend.threshold(&image, 100)
        );
    }

    #[test]
    fn canny_finds_square_border() {
        let image = square_mask(40, 10, 30);
        let edges = ImageprocBackend.detect_edges(&image, 50.0, 100.0);
        assert!(edges.pixels().any(|p| p[0] == 255));
        assert_eq!(edges.get_pixel(20, 20)[0], 0);
    }
}
