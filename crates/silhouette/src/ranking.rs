use std::time::Instant;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::{
    config::RankingConfig,
    error::{Result, SilhouetteError},
    pipeline::ShapePipeline,
    traits::CandidateScorer,
    types::{CandidateImage, RankedEntry, RankedResult, TargetImage},
};

/// Worker count used when the platform cannot report its parallelism.
pub const FALLBACK_WORKERS: usize = 4;

/// Hardware concurrency, or [`FALLBACK_WORKERS`] when unavailable.
pub fn available_workers() -> usize {
    std::thread::available_parallelism()
        .map(|count| count.get())
        .unwrap_or(FALLBACK_WORKERS)
        .max(1)
}

/// Split `items` into contiguous chunks of `ceil(len / workers)`, each item
/// tagged with its original index.
pub fn partition<T>(items: Vec<T>, workers: usize) -> Vec<Vec<(usize, T)>> {
    if items.is_empty() {
        return Vec::new();
    }
    let chunk_size = items.len().div_ceil(workers.max(1));

    let mut chunks = Vec::new();
    let mut current = Vec::with_capacity(chunk_size);
    for (index, item) in items.into_iter().enumerate() {
        current.push((index, item));
        if current.len() == chunk_size {
            chunks.push(std::mem::replace(&mut current, Vec::with_capacity(chunk_size)));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

type ChunkOutcome = std::result::Result<Vec<(usize, f64)>, (usize, SilhouetteError)>;

/// Sequentially score one chunk; the first failing candidate aborts the chunk.
fn score_chunk<S: CandidateScorer>(
    scorer: &S,
    reference: &S::Reference,
    chunk: Vec<(usize, CandidateImage)>,
) -> ChunkOutcome {
    chunk
        .into_iter()
        .map(|(index, candidate)| {
            scorer
                .score(reference, &candidate)
                .map(|score| (index, score))
                .map_err(|err| (index, err))
        })
        .collect()
}

/// Fans candidate scoring out over a fixed-size pool of blocking tasks and
/// gathers a complete ranking.
///
/// Each task owns its chunk of candidates plus its own copy of the scorer and
/// the prepared target. Either every candidate is scored or the whole request
/// fails.
#[derive(Debug, Clone)]
pub struct Ranker<S> {
    scorer: S,
    workers: usize,
}

impl Ranker<ShapePipeline> {
    /// Shape ranker built from a configuration
    pub fn from_config(config: &RankingConfig) -> Result<Self> {
        let ranker = Self::new(ShapePipeline::from_config(config)?);
        Ok(match config.workers {
            Some(workers) => ranker.with_workers(workers),
            None => ranker,
        })
    }
}

impl<S> Ranker<S>
where
    S: CandidateScorer + Clone + 'static,
{
    /// Ranker sized to the hardware concurrency
    pub fn new(scorer: S) -> Self {
        Self {
            scorer,
            workers: available_workers(),
        }
    }

    /// Override the worker count (at least 1)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    /// Score every candidate against `target` and sort best first.
    ///
    /// All workers run to completion before any failure is reported; when
    /// several candidates fail, the one with the lowest index is returned.
    pub async fn rank(
        &self,
        target: &TargetImage,
        candidates: Vec<CandidateImage>,
    ) -> Result<RankedResult> {
        let started = Instant::now();
        let total = candidates.len();

        let reference = self.prepare_reference(target).await?;
        if candidates.is_empty() {
            debug!("no candidates to rank");
            return Ok(RankedResult::default());
        }

        let chunks = partition(candidates, self.workers);
        info!(
            candidates = total,
            workers = chunks.len(),
            chunk_size = chunks[0].len(),
            "ranking candidates"
        );

        let mut tasks = JoinSet::new();
        for chunk in chunks {
            let scorer = self.scorer.clone();
            let reference = reference.clone();
            tasks.spawn_blocking(move || score_chunk(&scorer, &reference, chunk));
        }

        let mut scores: Vec<Option<f64>> = vec![None; total];
        let mut candidate_failure: Option<(usize, SilhouetteError)> = None;
        let mut worker_failure: Option<String> = None;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(chunk_scores)) => {
                    for (index, score) in chunk_scores {
                        scores[index] = Some(score);
                    }
                }
                Ok(Err((index, err))) => {
                    warn!(index, error = %err, "candidate scoring failed");
                    let replace = candidate_failure
                        .as_ref()
                        .is_none_or(|(current, _)| index < *current);
                    if replace {
                        candidate_failure = Some((index, err));
                    }
                }
                Err(err) => {
                    warn!(error = %err, "ranking worker did not complete");
                    worker_failure.get_or_insert_with(|| err.to_string());
                }
            }
        }

        if let Some((index, source)) = candidate_failure {
            return Err(SilhouetteError::CandidateFailed {
                index,
                source: Box::new(source),
            });
        }
        if let Some(message) = worker_failure {
            return Err(SilhouetteError::WorkerExecution(message));
        }

        let entries = scores
            .into_iter()
            .enumerate()
            .map(|(index, score)| {
                score
                    .map(|score| RankedEntry { index, score })
                    .ok_or_else(|| {
                        SilhouetteError::WorkerExecution(format!(
                            "candidate {index} was never scored"
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let ranked = RankedResult::from_unsorted(entries);
        info!(
            candidates = total,
            elapsed_ms = started.elapsed().as_millis() as u64,
            best = ?ranked.best(),
            "ranking finished"
        );
        Ok(ranked)
    }

    async fn prepare_reference(&self, target: &TargetImage) -> Result<S::Reference> {
        let scorer = self.scorer.clone();
        let target = target.clone();
        tokio::task::spawn_blocking(move || scorer.reference(&target))
            .await
            .map_err(|err| SilhouetteError::WorkerExecution(err.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_uses_ceil_sized_chunks() {
        let chunks = partition((0..10).collect::<Vec<_>>(), 4);
        let sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 3, 3, 1]);
    }

    #[test]
    fn partition_keeps_original_indices_in_order() {
        let chunks = partition(vec!['a', 'b', 'c', 'd', 'e'], 2);
        let flattened: Vec<(usize, char)> = chunks.into_iter().flatten().collect();
        assert_eq!(flattened, vec![(0, 'a'), (1, 'b'), (2, 'c'), (3, 'd'), (4, 'e')]);
    }

    #[test]
    fn partition_never_exceeds_worker_count() {
        for len in 1..40 {
            for workers in 1..9 {
                let chunks = partition(vec![0u8; len], workers);
                assert!(chunks.len() <= workers);
                assert_eq!(chunks.iter().map(Vec::len).sum::<usize>(), len);
            }
        }
    }

    #[test]
    fn fewer_items_than_workers() {
        let chunks = partition(vec![1, 2], 8);
        assert_eq!(chunks.len(), 2);
        assert!(partition(Vec::<u8>::new(), 8).is_empty());
    }

    #[test]
    fn worker_count_is_positive() {
        assert!(available_workers() >= 1);
    }
}
