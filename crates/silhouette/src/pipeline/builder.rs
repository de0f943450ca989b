use std::sync::Arc;

use crate::{
    algorithms::{ImageprocBackend, ImageprocContourExtractor, PreprocessSettings, Preprocessor},
    pipeline::ShapePipeline,
    traits::{ContourExtractor, ImageBackend},
    types::DEFAULT_HARMONICS,
};

/// Builder for shape pipelines with a fluent API
pub struct PipelineBuilder {
    backend: Option<Arc<dyn ImageBackend>>,
    contour_extractor: Option<Arc<dyn ContourExtractor>>,
    settings: PreprocessSettings,
    harmonics: usize,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            backend: None,
            contour_extractor: None,
            settings: PreprocessSettings::default(),
            harmonics: DEFAULT_HARMONICS,
        }
    }

    /// Set the image backend (replaces any existing one)
    pub fn set_backend<B>(self, backend: B) -> Self
    where
        B: ImageBackend + 'static,
    {
        self.set_shared_backend(Arc::new(backend))
    }

    pub fn set_shared_backend(mut self, backend: Arc<dyn ImageBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set the contour extractor (replaces any existing one)
    pub fn set_contour_extractor<E>(mut self, extractor: E) -> Self
    where
        E: ContourExtractor + 'static,
    {
        self.contour_extractor = Some(Arc::new(extractor));
        self
    }

    pub fn with_preprocess_settings(mut self, settings: PreprocessSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Number of EFD harmonics; values below 1 are raised to 1
    pub fn with_harmonics(mut self, harmonics: usize) -> Self {
        self.harmonics = harmonics.max(1);
        self
    }

    /// Build the pipeline with default components if not specified
    pub fn build(self) -> ShapePipeline {
        let backend = self.backend
            .unwrap_or_else(|| Arc::new(ImageprocBackend));

        let contour_extractor = self.contour_extractor
            .unwrap_or_else(|| Arc::new(ImageprocContourExtractor));

        ShapePipeline::new(
            Preprocessor::new(backend, self.settings),
            contour_extractor,
            self.harmonics,
        )
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
