use std::{fs, path::Path, sync::Arc};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantNames};

use crate::{
    algorithms::{ImageprocBackend, PreprocessSettings, ThresholdBackend},
    error::{Result, SilhouetteError},
    traits::ImageBackend,
    types::DEFAULT_HARMONICS,
};

/// Upper bound on `harmonics`, mirrored in the schema range
pub const MAX_HARMONICS: usize = 64;

/// Which [`ImageBackend`] implementation to run preprocessing on
#[derive(
    Debug, Clone, Copy, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, VariantNames,
    PartialEq, Eq
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BackendKind {
    /// Gaussian blur + Canny edges via imageproc
    #[default]
    Imageproc,
    /// Plain thresholding, no filtering
    Threshold,
}

impl BackendKind {
    pub fn names() -> &'static [&'static str] {
        <Self as VariantNames>::VARIANTS
    }

    pub fn build(self) -> Arc<dyn ImageBackend> {
        match self {
            Self::Imageproc => Arc::new(ImageprocBackend),
            Self::Threshold => Arc::new(ThresholdBackend),
        }
    }
}

/// Everything a ranking request needs, passed explicitly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RankingConfig {
    /// Number of elliptic Fourier harmonics (H)
    #[schemars(range(min = 1, max = 64))]
    pub harmonics: usize,
    /// Worker count; hardware concurrency when unset
    pub workers: Option<usize>,
    pub backend: BackendKind,
    pub preprocess: PreprocessSettings,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            harmonics: DEFAULT_HARMONICS,
            workers: None,
            backend: BackendKind::default(),
            preprocess: PreprocessSettings::default(),
        }
    }
}

impl RankingConfig {
    /// JSON schema of the configuration file
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(RankingConfig)
    }

    pub fn validate(&self) -> Result<()> {
        if self.harmonics == 0 {
            return Err(SilhouetteError::InvalidConfig("harmonics must be at least 1".into()));
        }
        if self.harmonics > MAX_HARMONICS {
            return Err(SilhouetteError::InvalidConfig(format!(
                "harmonics must be at most {MAX_HARMONICS}, got {}",
                self.harmonics
            )));
        }
        if self.workers == Some(0) {
            return Err(SilhouetteError::InvalidConfig("workers must be at least 1".into()));
        }
        let p = &self.preprocess;
        if p.blur_sigma < 0.0 || !p.blur_sigma.is_finite() {
            return Err(SilhouetteError::InvalidConfig(format!(
                "blur_sigma must be a finite non-negative number, got {}",
                p.blur_sigma
            )));
        }
        if p.canny_low > p.canny_high {
            return Err(SilhouetteError::InvalidConfig(format!(
                "canny_low ({}) exceeds canny_high ({})",
                p.canny_low, p.canny_high
            )));
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: RankingConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        let config: RankingConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let content = fs::read_to_string(path_ref)?;
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&content),
            Some("json") => Self::from_json(&content),
            other => Err(SilhouetteError::InvalidConfig(format!(
                "unsupported config format {other:?}, use .toml or .json"
            ))),
        }
    }
}
