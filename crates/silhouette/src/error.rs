use thiserror::Error;

#[derive(Error, Debug)]
pub enum SilhouetteError {
    #[error("Dimension mismatch ({context}): expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        context: &'static str,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Malformed pixel buffer: {width}x{height} with {channels} channel(s) cannot hold {len} bytes")]
    MalformedBuffer {
        width: u32,
        height: u32,
        channels: u8,
        len: usize,
    },

    #[error("Candidate {index} failed: {source}")]
    CandidateFailed {
        index: usize,
        #[source]
        source: Box<SilhouetteError>,
    },

    #[error("Worker task failed: {0}")]
    WorkerExecution(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SilhouetteError>;
