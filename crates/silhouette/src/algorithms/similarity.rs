use serde::{Deserialize, Serialize};
use crate::types::{ShapeDescriptor, ShapeSignature};

/// Weight of the EFD cosine similarity in the composite score.
pub const EFD_WEIGHT: f64 = 0.7;
/// Weight of the Hu-moment similarity in the composite score.
pub const HU_WEIGHT: f64 = 0.3;

/// Components of one target/candidate comparison.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SimilarityBreakdown {
    /// Cosine similarity of the EFD vectors, in `[-1, 1]`
    pub efd_similarity: f64,
    /// `1 / (1 + distance)` of the unit-normalized Hu vectors, in `(0, 1]`
    pub hu_similarity: f64,
    /// `0.7 * efd + 0.3 * hu`. Not clamped, may dip below zero.
    pub score: f64,
}

impl SimilarityBreakdown {
    /// Result for pairs where either side has no shape
    pub fn no_match() -> Self {
        Self::default()
    }
}

fn magnitude(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Cosine of the angle between `a` and `b`; 0 when either has zero magnitude.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let (ma, mb) = (magnitude(a), magnitude(b));
    if ma == 0.0 || mb == 0.0 {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    dot / (ma * mb)
}

pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Scale to unit length. Zero vectors are returned unchanged.
pub fn l2_normalize(v: &[f64]) -> Vec<f64> {
    let m = magnitude(v);
    if m == 0.0 {
        return v.to_vec();
    }
    v.iter().map(|x| x / m).collect()
}

/// Turn a Hu distance into a similarity in `(0, 1]`.
pub fn hu_similarity(distance: f64) -> f64 {
    1.0 / (1.0 + distance)
}

/// Compare two descriptor sets without the empty-shape short-circuit.
pub fn compare_descriptors(
    target: &ShapeDescriptor,
    candidate: &ShapeDescriptor,
) -> SimilarityBreakdown {
    let efd_similarity = cosine_similarity(&target.efd, &candidate.efd);
    let distance = euclidean_distance(&l2_normalize(&target.hu), &l2_normalize(&candidate.hu));
    let hu_similarity = hu_similarity(distance);

    SimilarityBreakdown {
        efd_similarity,
        hu_similarity,
        score: EFD_WEIGHT * efd_similarity + HU_WEIGHT * hu_similarity,
    }
}

/// Composite similarity of a candidate shape to the target shape.
///
/// An empty contour on either side scores exactly 0 and no descriptor math
/// runs.
pub fn compare(target: &ShapeSignature, candidate: &ShapeSignature) -> SimilarityBreakdown {
    if !target.has_shape() || !candidate.has_shape() {
        return SimilarityBreakdown::no_match();
    }
    compare_descriptors(&target.descriptor, &candidate.descriptor)
}
