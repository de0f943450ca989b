//! Invariant shape descriptors: Hu moments of the filled contour polygon and
//! normalized elliptic Fourier coefficients of its outline.

use std::f64::consts::PI;

use crate::types::{Contour, ShapeDescriptor, HU_INVARIANTS};

/// Raw spatial moments of a filled polygon up to third order.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PolygonMoments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
    pub m20: f64,
    pub m11: f64,
    pub m02: f64,
    pub m30: f64,
    pub m21: f64,
    pub m12: f64,
    pub m03: f64,
}

impl PolygonMoments {
    /// Green's theorem over the closed polygon. The result is always reported
    /// for counter-clockwise orientation, so `m00` is the non-negative area.
    pub fn from_points(points: &[[f32; 2]]) -> Self {
        let coords: Vec<[f64; 2]> = points.iter().map(|p| p.map(f64::from)).collect();
        Self::from_coords(&coords)
    }

    pub fn from_coords(coords: &[[f64; 2]]) -> Self {
        let mut m = Self::default();
        let n = coords.len();
        if n < 3 {
            return m;
        }

        for i in 0..n {
            let [xi, yi] = coords[i];
            let [xj, yj] = coords[(i + 1) % n];
            let a = xi * yj - xj * yi;
            let (xi2, xj2, yi2, yj2) = (xi * xi, xj * xj, yi * yi, yj * yj);

            m.m00 += a;
            m.m10 += a * (xi + xj);
            m.m01 += a * (yi + yj);
            m.m20 += a * (xi2 + xi * xj + xj2);
            m.m11 += a * (2.0 * xi * yi + xi * yj + xj * yi + 2.0 * xj * yj);
            m.m02 += a * (yi2 + yi * yj + yj2);
            m.m30 += a * (xi + xj) * (xi2 + xj2);
            m.m21 += a * (xi2 * (3.0 * yi + yj) + 2.0 * xi * xj * (yi + yj) + xj2 * (yi + 3.0 * yj));
            m.m12 += a * (yi2 * (3.0 * xi + xj) + 2.0 * yi * yj * (xi + xj) + yj2 * (xi + 3.0 * xj));
            m.m03 += a * (yi + yj) * (yi2 + yj2);
        }

        m.m00 /= 2.0;
        m.m10 /= 6.0;
        m.m01 /= 6.0;
        m.m20 /= 12.0;
        m.m11 /= 24.0;
        m.m02 /= 12.0;
        m.m30 /= 20.0;
        m.m21 /= 60.0;
        m.m12 /= 60.0;
        m.m03 /= 20.0;

        if m.m00 < 0.0 {
            m = m.negated();
        }
        m
    }

    fn negated(self) -> Self {
        Self {
            m00: -self.m00,
            m10: -self.m10,
            m01: -self.m01,
            m20: -self.m20,
            m11: -self.m11,
            m02: -self.m02,
            m30: -self.m30,
            m21: -self.m21,
            m12: -self.m12,
            m03: -self.m03,
        }
    }

    pub fn centroid(&self) -> Option<[f64; 2]> {
        if self.m00.abs() <= f64::EPSILON {
            return None;
        }
        Some([self.m10 / self.m00, self.m01 / self.m00])
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedMoments {
    pub nu20: f64,
    pub nu11: f64,
    pub nu02: f64,
    pub nu30: f64,
    pub nu21: f64,
    pub nu12: f64,
    pub nu03: f64,
}

impl NormalizedMoments {
    /// Scale-normalized central moments of the filled polygon, `None` for
    /// zero-area input.
    ///
    /// Central moments are integrated over the centroid-shifted polygon, not
    /// expanded from the raw ones.
    pub fn from_points(points: &[[f32; 2]]) -> Option<Self> {
        let coords: Vec<[f64; 2]> = points.iter().map(|p| p.map(f64::from)).collect();
        let [cx, cy] = PolygonMoments::from_coords(&coords).centroid()?;
        let centered: Vec<[f64; 2]> = coords.iter().map(|&[x, y]| [x - cx, y - cy]).collect();
        let mu = PolygonMoments::from_coords(&centered);
        if mu.m00 <= f64::EPSILON {
            return None;
        }

        let s2 = mu.m00 * mu.m00;
        let s3 = s2 * mu.m00.sqrt();

        Some(Self {
            nu20: mu.m20 / s2,
            nu11: mu.m11 / s2,
            nu02: mu.m02 / s2,
            nu30: mu.m30 / s3,
            nu21: mu.m21 / s3,
            nu12: mu.m12 / s3,
            nu03: mu.m03 / s3,
        })
    }

    /// The seven Hu invariants. The last one changes sign under reflection.
    pub fn hu(&self) -> [f64; HU_INVARIANTS] {
        let NormalizedMoments {
            nu20,
            nu11,
            nu02,
            nu30,
            nu21,
            nu12,
            nu03,
        } = *self;

        let t0 = nu30 + nu12;
        let t1 = nu21 + nu03;
        let q0 = t0 * t0;
        let q1 = t1 * t1;
        let n4 = 4.0 * nu11;
        let s = nu20 + nu02;
        let d = nu20 - nu02;
        let a = nu30 - 3.0 * nu12;
        let b = 3.0 * nu21 - nu03;

        [
            s,
            d * d + n4 * nu11,
            a * a + b * b,
            q0 + q1,
            a * t0 * (q0 - 3.0 * q1) + b * t1 * (3.0 * q0 - q1),
            d * (q0 - q1) + n4 * t0 * t1,
            b * t0 * (q0 - 3.0 * q1) - a * t1 * (3.0 * q0 - q1),
        ]
    }
}

/// Invariants smaller than this are rounding residue of an exact zero.
pub const HU_NOISE_FLOOR: f64 = 1e-24;

/// Hu invariants of the filled contour, log-compressed as
/// `-sign(I) * log10(|I|)`. Zero invariants (below [`HU_NOISE_FLOOR`]) and
/// non-finite ones map to 0.
pub fn hu_moments(contour: &Contour) -> [f64; HU_INVARIANTS] {
    let Some(normalized) = NormalizedMoments::from_points(contour.points()) else {
        return [0.0; HU_INVARIANTS];
    };
    normalized.hu().map(log_compress)
}

fn log_compress(value: f64) -> f64 {
    if value.abs() < HU_NOISE_FLOOR || !value.is_finite() {
        return 0.0;
    }
    -value.signum() * value.abs().log10()
}

/// Elliptic Fourier coefficients `(A, B, C, D)` for harmonics `1..=harmonics`,
/// exact for the closed piecewise-linear curve through `points`.
///
/// Zero-length segments contribute nothing. Returns `None` when the curve has
/// no length at all.
pub fn elliptic_fourier_coefficients(
    points: &[[f32; 2]],
    harmonics: usize,
) -> Option<Vec<[f64; 4]>> {
    let n = points.len();
    if n < 2 {
        return None;
    }

    // (dx, dy, dt) per segment, closing segment included
    let segments: Vec<(f64, f64, f64)> = (0..n)
        .map(|i| {
            let [x0, y0] = points[i].map(f64::from);
            let [x1, y1] = points[(i + 1) % n].map(f64::from);
            let (dx, dy) = (x1 - x0, y1 - y0);
            (dx, dy, dx.hypot(dy))
        })
        .collect();

    let total: f64 = segments.iter().map(|&(_, _, dt)| dt).sum();
    if total <= f64::EPSILON {
        return None;
    }

    let coefficients = (1..=harmonics)
        .map(|harmonic| {
            let h = harmonic as f64;
            let scale = total / (2.0 * h * h * PI * PI);
            let mut coeffs = [0.0f64; 4];
            let mut t_prev = 0.0;
            for &(dx, dy, dt) in &segments {
                let t = t_prev + dt;
                if dt > 0.0 {
                    let phi_prev = 2.0 * PI * h * t_prev / total;
                    let phi = 2.0 * PI * h * t / total;
                    let d_cos = phi.cos() - phi_prev.cos();
                    let d_sin = phi.sin() - phi_prev.sin();
                    coeffs[0] += dx / dt * d_cos;
                    coeffs[1] += dx / dt * d_sin;
                    coeffs[2] += dy / dt * d_cos;
                    coeffs[3] += dy / dt * d_sin;
                }
                t_prev = t;
            }
            coeffs.map(|c| c * scale)
        })
        .collect();

    Some(coefficients)
}

/// Normalized EFD vector of length `4 * harmonics`.
///
/// Every harmonic `k` (1-based) is rotated by `k * theta`, with
/// `theta = atan2(A1, B1)`, and scaled by `1 / hypot(A1, B1)`. This removes the
/// dependence on the tracing start point and on absolute size; translation
/// never enters because only point deltas are integrated.
pub fn elliptic_fourier_descriptors(contour: &Contour, harmonics: usize) -> Vec<f64> {
    let zeros = || vec![0.0; 4 * harmonics];
    if harmonics == 0 {
        return zeros();
    }
    let Some(coefficients) = elliptic_fourier_coefficients(contour.points(), harmonics) else {
        return zeros();
    };

    let [a1, b1, _, _] = coefficients[0];
    let l0 = a1.hypot(b1);
    if l0 <= f64::EPSILON || !l0.is_finite() {
        return zeros();
    }
    let theta = a1.atan2(b1);

    coefficients
        .iter()
        .enumerate()
        .flat_map(|(n, &[a, b, c, d])| {
            let (sin, cos) = ((n as f64 + 1.0) * theta).sin_cos();
            [
                (a * cos - b * sin) / l0,
                (a * sin + b * cos) / l0,
                (c * cos - d * sin) / l0,
                (c * sin + d * cos) / l0,
            ]
        })
        .collect()
}

/// Both descriptor families for one contour. Empty contours give all zeros.
pub fn describe(contour: &Contour, harmonics: usize) -> ShapeDescriptor {
    if contour.is_empty() {
        return ShapeDescriptor::zeroed(harmonics);
    }
    ShapeDescriptor {
        hu: hu_moments(contour),
        efd: elliptic_fourier_descriptors(contour, harmonics),
    }
}
