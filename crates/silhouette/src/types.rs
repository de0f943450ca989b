use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};
use geo_types::{Coord, LineString, Polygon};

use crate::error::{Result, SilhouetteError};

/// Number of points in every non-empty [`Contour`].
pub const CONTOUR_POINTS: usize = 128;

/// Number of Hu invariants in a [`ShapeDescriptor`].
pub const HU_INVARIANTS: usize = 7;

/// Default number of elliptic Fourier harmonics.
pub const DEFAULT_HARMONICS: usize = 10;

/// Memory layout of a [`PixelBuffer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    Luma8,
    Rgb8,
    Rgba8,
}

impl PixelFormat {
    pub fn channels(self) -> u8 {
        match self {
            Self::Luma8 => 1,
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }
}

/// Raw interleaved 8-bit pixels as handed over by the segmentation producer or
/// the candidate source. Nothing is checked until the buffer is converted.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            format,
            data,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Ensure `data` holds exactly `width * height * channels` bytes.
    pub fn validate(&self) -> Result<()> {
        let channels = self.format.channels();
        let expected = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|n| n.checked_mul(channels as usize));

        match expected {
            Some(expected) if expected > 0 && expected == self.data.len() => Ok(()),
            _ => Err(SilhouetteError::MalformedBuffer {
                width: self.width,
                height: self.height,
                channels,
                len: self.data.len(),
            }),
        }
    }

    /// Convert to a single-channel image.
    pub fn to_luma(&self) -> Result<GrayImage> {
        self.validate()?;
        let malformed = || SilhouetteError::MalformedBuffer {
            width: self.width,
            height: self.height,
            channels: self.format.channels(),
            len: self.data.len(),
        };

        let data = self.data.clone();
        let image = match self.format {
            PixelFormat::Luma8 => GrayImage::from_raw(self.width, self.height, data)
                .ok_or_else(malformed)?,
            PixelFormat::Rgb8 => {
                let rgb = RgbImage::from_raw(self.width, self.height, data).ok_or_else(malformed)?;
                DynamicImage::ImageRgb8(rgb).to_luma8()
            }
            PixelFormat::Rgba8 => {
                let rgba = RgbaImage::from_raw(self.width, self.height, data).ok_or_else(malformed)?;
                DynamicImage::ImageRgba8(rgba).to_luma8()
            }
        };
        Ok(image)
    }
}

impl From<GrayImage> for PixelBuffer {
    fn from(image: GrayImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new(width, height, PixelFormat::Luma8, image.into_raw())
    }
}

impl From<RgbImage> for PixelBuffer {
    fn from(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new(width, height, PixelFormat::Rgb8, image.into_raw())
    }
}

impl From<DynamicImage> for PixelBuffer {
    fn from(image: DynamicImage) -> Self {
        match image {
            DynamicImage::ImageLuma8(luma) => luma.into(),
            DynamicImage::ImageRgb8(rgb) => rgb.into(),
            other => {
                let rgba = other.to_rgba8();
                let (width, height) = rgba.dimensions();
                Self::new(width, height, PixelFormat::Rgba8, rgba.into_raw())
            }
        }
    }
}

/// The foreground subject: its pixels plus the alpha mask from segmentation.
#[derive(Debug, Clone)]
pub struct TargetImage {
    pub pixels: PixelBuffer,
    pub mask: PixelBuffer,
}

impl TargetImage {
    pub fn new(pixels: impl Into<PixelBuffer>, mask: impl Into<PixelBuffer>) -> Self {
        Self {
            pixels: pixels.into(),
            mask: mask.into(),
        }
    }
}

/// A background candidate. When a mask is supplied the silhouette is taken
/// from it, otherwise from the edges of the pixels.
#[derive(Debug, Clone)]
pub struct CandidateImage {
    pub pixels: PixelBuffer,
    pub mask: Option<PixelBuffer>,
}

impl CandidateImage {
    pub fn new(pixels: impl Into<PixelBuffer>) -> Self {
        Self {
            pixels: pixels.into(),
            mask: None,
        }
    }

    pub fn with_mask(mut self, mask: impl Into<PixelBuffer>) -> Self {
        self.mask = Some(mask.into());
        self
    }
}

/// Ordered, cyclic boundary of the dominant shape.
///
/// Either empty ("no shape found") or exactly [`CONTOUR_POINTS`] long.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Contour {
    points: Vec<[f32; 2]>,
}

impl Contour {
    pub(crate) fn from_points(points: Vec<[f32; 2]>) -> Self {
        debug_assert!(points.is_empty() || points.len() == CONTOUR_POINTS);
        Self { points }
    }

    /// The "no comparable shape" contour
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[[f32; 2]] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

pub(crate) fn points_to_polygon(points: &[[f32; 2]]) -> Polygon<f64> {
    let coords: Vec<Coord<f64>> = points
        .iter()
        .map(|&[x, y]| Coord {
            x: x as f64,
            y: y as f64,
        })
        .collect();
    Polygon::new(LineString::new(coords), vec![])
}

/// Invariant descriptors of one contour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeDescriptor {
    /// Log-scaled Hu invariants
    pub hu: [f64; HU_INVARIANTS],
    /// Normalized EFD coefficients, `(A, B, C, D)` per harmonic
    pub efd: Vec<f64>,
}

impl ShapeDescriptor {
    /// All-zero descriptor for `harmonics` harmonics
    pub fn zeroed(harmonics: usize) -> Self {
        Self {
            hu: [0.0; HU_INVARIANTS],
            efd: vec![0.0; 4 * harmonics],
        }
    }
}

/// A contour together with the descriptors derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeSignature {
    pub contour: Contour,
    pub descriptor: ShapeDescriptor,
}

impl ShapeSignature {
    pub fn has_shape(&self) -> bool {
        !self.contour.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    /// Position of the candidate in the input list
    pub index: usize,
    pub score: f64,
}

/// One entry per candidate, best first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub entries: Vec<RankedEntry>,
}

impl RankedResult {
    /// Sort `entries` by score descending, ties by ascending index.
    pub fn from_unsorted(mut entries: Vec<RankedEntry>) -> Self {
        entries.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.index.cmp(&b.index)));
        Self { entries }
    }

    pub fn best(&self) -> Option<&RankedEntry> {
        self.entries.first()
    }

    pub fn top(&self, k: usize) -> &[RankedEntry] {
        &self.entries[..k.min(self.entries.len())]
    }

    pub fn indices(&self) -> Vec<usize> {
        self.entries.iter().map(|entry| entry.index).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_buffer_is_rejected() {
        let buffer = PixelBuffer::new(4, 4, PixelFormat::Rgb8, vec![0; 10]);
        let err = buffer.to_luma().unwrap_err();
        assert!(matches!(err, SilhouetteError::MalformedBuffer { len: 10, channels: 3, .. }));
    }

    #[test]
    fn zero_sized_buffer_is_rejected() {
        let buffer = PixelBuffer::new(0, 4, PixelFormat::Luma8, vec![]);
        assert!(buffer.validate().is_err());
    }

    #[test]
    fn rgb_buffer_converts_to_luma() {
        let buffer = PixelBuffer::new(2, 1, PixelFormat::Rgb8, vec![255, 255, 255, 0, 0, 0]);
        let luma = buffer.to_luma().expect("valid buffer");
        assert_eq!(luma.dimensions(), (2, 1));
        assert_eq!(luma.get_pixel(0, 0)[0], 255);
        assert_eq!(luma.get_pixel(1, 0)[0], 0);
    }

    #[test]
    fn ranked_result_sorts_with_index_tie_break() {
        let result = RankedResult::from_unsorted(vec![
            RankedEntry { index: 0, score: 0.2 },
            RankedEntry { index: 1, score: 0.9 },
            RankedEntry { index: 2, score: 0.2 },
            RankedEntry { index: 3, score: -0.1 },
        ]);
        assert_eq!(result.indices(), vec![1, 0, 2, 3]);
        assert_eq!(result.best().map(|e| e.index), Some(1));
        assert_eq!(result.top(2).len(), 2);
        assert_eq!(result.top(10).len(), 4);
    }
}
