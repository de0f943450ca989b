pub mod builder;

use std::sync::Arc;

use image::GrayImage;
use tracing::debug;
use crate::{
    algorithms::{compare, describe, extract_dominant_contour, Preprocessor, SimilarityBreakdown},
    config::RankingConfig,
    error::Result,
    traits::{CandidateScorer, ContourExtractor},
    types::{CandidateImage, ShapeSignature, TargetImage},
};

/// Preprocess → trace → describe → compare, for a single image at a time.
///
/// Holds configuration only, so cloning it into every ranking worker is cheap
/// and safe.
#[derive(Debug, Clone)]
pub struct ShapePipeline {
    preprocessor: Preprocessor,
    contour_extractor: Arc<dyn ContourExtractor>,
    harmonics: usize,
}

impl ShapePipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    /// Create a new pipeline with the given components
    pub fn new(
        preprocessor: Preprocessor,
        contour_extractor: Arc<dyn ContourExtractor>,
        harmonics: usize,
    ) -> Self {
        Self {
            preprocessor,
            contour_extractor,
            harmonics,
        }
    }

    /// Build the pipeline described by a validated configuration
    pub fn from_config(config: &RankingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::builder()
            .set_shared_backend(config.backend.build())
            .with_preprocess_settings(config.preprocess.clone())
            .with_harmonics(config.harmonics)
            .build())
    }

    pub fn harmonics(&self) -> usize {
        self.harmonics
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    /// Contour and descriptors of an already binarized edge map
    pub fn signature_from_edges(&self, edges: &GrayImage) -> Result<ShapeSignature> {
        let contour = extract_dominant_contour(self.contour_extractor.as_ref(), edges)?;
        let descriptor = describe(&contour, self.harmonics);
        Ok(ShapeSignature { contour, descriptor })
    }

    pub fn describe_target(&self, target: &TargetImage) -> Result<ShapeSignature> {
        let edges = self.preprocessor.target_edges(target)?;
        let signature = self.signature_from_edges(&edges)?;
        if !signature.has_shape() {
            debug!("target mask has no usable silhouette, every candidate will score 0");
        }
        Ok(signature)
    }

    pub fn describe_candidate(&self, candidate: &CandidateImage) -> Result<ShapeSignature> {
        let edges = self.preprocessor.candidate_edges(candidate)?;
        self.signature_from_edges(&edges)
    }

    /// Full comparison of one candidate against a prepared target signature
    pub fn compare_candidate(
        &self,
        target: &ShapeSignature,
        candidate: &CandidateImage,
    ) -> Result<SimilarityBreakdown> {
        let signature = self.describe_candidate(candidate)?;
        Ok(compare(target, &signature))
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        format!(
            "ShapePipeline: backend {}, max dimension {:?}, {:?} contour extractor, {} harmonics",
            self.preprocessor.backend().name(),
            self.preprocessor.settings().max_dimension,
            self.contour_extractor,
            self.harmonics
        )
    }
}

impl CandidateScorer for ShapePipeline {
    type Reference = ShapeSignature;

    fn reference(&self, target: &TargetImage) -> Result<ShapeSignature> {
        self.describe_target(target)
    }

    fn score(&self, reference: &ShapeSignature, candidate: &CandidateImage) -> Result<f64> {
        Ok(self.compare_candidate(reference, candidate)?.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::ThresholdBackend;
    use crate::types::CONTOUR_POINTS;
    use image::Luma;

    fn filled(width: u32, height: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        })
    }

    #[test]
    fn target_signature_has_fixed_shapes() {
        let pipeline = ShapePipeline::builder().with_harmonics(6).build();
        let target = TargetImage::new(GrayImage::new(64, 64), filled(64, 64, 10, 10, 50, 40));
        let signature = pipeline.describe_target(&target).expect("valid target");
        assert_eq!(signature.contour.len(), CONTOUR_POINTS);
        assert_eq!(signature.descriptor.hu.len(), 7);
        assert_eq!(signature.descriptor.efd.len(), 24);
    }

    #[test]
    fn blank_candidate_scores_zero() {
        let pipeline = ShapePipeline::builder().set_backend(ThresholdBackend).build();
        let target = TargetImage::new(GrayImage::new(32, 32), filled(32, 32, 4, 4, 28, 28));
        let reference = pipeline.reference(&target).expect("valid target");
        let blank = CandidateImage::new(GrayImage::new(32, 32));
        assert_eq!(pipeline.score(&reference, &blank).expect("no error"), 0.0);
    }

    #[test]
    fn unmasked_candidate_uses_edges() {
        let pipeline = ShapePipeline::builder().build();
        let target = TargetImage::new(GrayImage::new(80, 80), filled(80, 80, 20, 20, 60, 60));
        let reference = pipeline.reference(&target).expect("valid target");
        let candidate = CandidateImage::new(filled(80, 80, 15, 15, 65, 65));
        let signature = pipeline.describe_candidate(&candidate).expect("no error");
        assert!(signature.has_shape());
        let score = pipeline.score(&reference, &candidate).expect("no error");
        assert!(score > 0.0, "score {score}");
    }

    #[test]
    fn from_config_uses_configured_backend() {
        let config = RankingConfig {
            backend: crate::config::BackendKind::Threshold,
            harmonics: 4,
            ..RankingConfig::default()
        };
        let pipeline = ShapePipeline::from_config(&config).expect("valid config");
        assert_eq!(pipeline.harmonics(), 4);
        assert_eq!(pipeline.preprocessor().backend().name(), "threshold");

        let info = pipeline.info();
        assert!(info.contains("backend threshold"), "{info}");
        assert!(info.contains("max dimension Some(512)"), "{info}");
        assert!(info.contains("4 harmonics"), "{info}");
    }
}
