//! # Silhouette Ranking Library
//!
//! Ranks candidate background images by how closely their dominant silhouette
//! matches the silhouette of a segmented foreground subject.
//!
//! ## Core Features
//!
//! - **Swappable Backends**: Preprocessing primitives sit behind [`ImageBackend`]
//! - **Fixed-size Contours**: The largest traced shape, resampled to 128 points
//! - **Invariant Descriptors**: Hu moments and normalized elliptic Fourier descriptors
//! - **Composite Score**: `0.7 * EFD cosine + 0.3 * Hu similarity`
//! - **Parallel Ranking**: Candidates scored on a bounded pool of blocking workers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use silhouette::{CandidateImage, Ranker, ShapePipeline, TargetImage};
//!
//! # async fn run() -> silhouette::Result<()> {
//! let subject = image::open("subject.png")?;
//! let mask = image::open("subject_mask.png")?;
//! let target = TargetImage::new(subject, mask);
//!
//! let candidates = vec![
//!     CandidateImage::new(image::open("beach.jpg")?),
//!     CandidateImage::new(image::open("forest.jpg")?),
//! ];
//!
//! let ranker = Ranker::new(ShapePipeline::builder().build());
//! let ranking = ranker.rank(&target, candidates).await?;
//! if let Some(best) = ranking.best() {
//!     println!("best background: #{} ({:.3})", best.index, best.score);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Lightweight Backend
//!
//! ```rust,no_run
//! use silhouette::{ShapePipeline, algorithms::ThresholdBackend};
//!
//! let pipeline = ShapePipeline::builder()
//!     .set_backend(ThresholdBackend)
//!     .with_harmonics(12)
//!     .build();
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod traits;
pub mod algorithms;
pub mod pipeline;
pub mod ranking;
pub mod config;

// Re-exports for convenience
pub use error::{SilhouetteError, Result};
pub use types::{
    CandidateImage, Contour, PixelBuffer, PixelFormat, RankedEntry, RankedResult, ShapeDescriptor,
    ShapeSignature, TargetImage, CONTOUR_POINTS, DEFAULT_HARMONICS,
};
pub use traits::*;
pub use algorithms::SimilarityBreakdown;
pub use pipeline::{ShapePipeline, builder::PipelineBuilder};
pub use ranking::Ranker;
pub use config::{BackendKind, RankingConfig};
