use serde::Serialize;
use silhouette::{CandidateImage, RankedResult, SilhouetteError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File extensions picked up when scanning a candidate directory
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff"];

#[derive(Error, Debug)]
pub enum RankCliError {
    #[error(transparent)]
    Silhouette(#[from] SilhouetteError),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Failed to load {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("No candidate images given")]
    NoCandidates,
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Explicit files first, in the given order, then the images of `dir` sorted by
/// file name. The position in the returned list is the candidate index.
pub fn collect_candidate_paths(
    files: &[PathBuf],
    dir: Option<&Path>,
) -> Result<Vec<PathBuf>, RankCliError> {
    let mut paths = files.to_vec();

    if let Some(dir) = dir {
        let mut found = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && is_image(&path) {
                found.push(path);
            }
        }
        found.sort();
        paths.extend(found);
    }

    if paths.is_empty() {
        return Err(RankCliError::NoCandidates);
    }
    Ok(paths)
}

pub fn load_image(path: &Path) -> Result<image::DynamicImage, RankCliError> {
    image::open(path).map_err(|source| RankCliError::Load {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_candidates(paths: &[PathBuf]) -> Result<Vec<CandidateImage>, RankCliError> {
    paths
        .iter()
        .map(|path| load_image(path).map(CandidateImage::new))
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReportEntry {
    pub rank: usize,
    pub index: usize,
    pub path: String,
    pub score: f64,
}

/// JSON document printed by `silhouette-rank rank`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RankingReport {
    pub target: String,
    pub candidates: usize,
    pub ranking: Vec<ReportEntry>,
}

impl RankingReport {
    pub fn new(
        target: &Path,
        paths: &[PathBuf],
        result: &RankedResult,
        top: Option<usize>,
    ) -> Self {
        let shown = top.map_or(result.entries.as_slice(), |k| result.top(k));
        let ranking = shown
            .iter()
            .enumerate()
            .map(|(rank, entry)| ReportEntry {
                rank: rank + 1,
                index: entry.index,
                path: paths
                    .get(entry.index)
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
                score: entry.score,
            })
            .collect();

        Self {
            target: target.display().to_string(),
            candidates: result.len(),
            ranking,
        }
    }
}
