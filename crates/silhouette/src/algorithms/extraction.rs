use image::GrayImage;
use tracing::debug;
use crate::{
    error::Result,
    traits::ContourExtractor,
    types::{points_to_polygon, Contour, CONTOUR_POINTS},
};

/// Raw contours shorter than this are treated as "no shape".
pub const MIN_RAW_POINTS: usize = 4;

/// Imageproc-based contour extractor (Suzuki-Abe border following)
#[derive(Debug, Clone, Default)]
pub struct ImageprocContourExtractor;

impl ContourExtractor for ImageprocContourExtractor {
    fn extract_contours(&self, binary_image: &GrayImage) -> Result<Vec<Vec<[f32; 2]>>> {
        let contours = imageproc::contours::find_contours::<i32>(binary_image);

        let result = contours
            .into_iter()
            .map(|contour| {
                contour.points
                    .iter()
                    .map(|p| [p.x as f32, p.y as f32])
                    .collect()
            })
            .collect();

        Ok(result)
    }
}

/// Pick the contour enclosing the largest area. The first one in scan order
/// wins on ties.
pub fn dominant_contour(contours: &[Vec<[f32; 2]>]) -> Option<&[[f32; 2]]> {
    use geo::Area;

    let mut best: Option<(&[[f32; 2]], f64)> = None;
    for contour in contours {
        let area = points_to_polygon(contour).unsigned_area();
        match best {
            Some((_, best_area)) if area <= best_area => {}
            _ => best = Some((contour.as_slice(), area)),
        }
    }
    best.map(|(points, _)| points)
}

/// Index-proportional resampling to exactly [`CONTOUR_POINTS`] points.
///
/// Source index for output `i` is `floor(i * M / N) mod M`. Long straight
/// runs get the same share of samples as tight corners, so this is not an
/// arc-length parameterization.
pub fn resample_contour(raw: &[[f32; 2]]) -> Contour {
    let m = raw.len();
    if m < MIN_RAW_POINTS {
        return Contour::empty();
    }

    let points = (0..CONTOUR_POINTS)
        .map(|i| raw[(i * m / CONTOUR_POINTS) % m])
        .collect();
    Contour::from_points(points)
}

/// Trace, select and resample the dominant shape of a binary image.
pub fn extract_dominant_contour(
    extractor: &dyn ContourExtractor,
    edges: &GrayImage,
) -> Result<Contour> {
    let contours = extractor.extract_contours(edges)?;
    let Some(raw) = dominant_contour(&contours) else {
        debug!(contours = 0, "no contour found");
        return Ok(Contour::empty());
    };

    let contour = resample_contour(raw);
    if contour.is_empty() {
        debug!(raw_points = raw.len(), "dominant contour too short");
    }
    Ok(contour)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn filled_rect(width: u32, height: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        })
    }

    fn ring(len: usize) -> Vec<[f32; 2]> {
        (0..len)
            .map(|i| {
                let a = i as f32 / len as f32 * std::f32::consts::TAU;
                [a.cos() * 10.0, a.sin() * 10.0]
            })
            .collect()
    }

    #[test]
    fn resampling_always_yields_fixed_cardinality() {
        for len in [4, 5, 50, 127, 128, 129, 1000, 4097] {
            let contour = resample_contour(&ring(len));
            assert_eq!(contour.len(), CONTOUR_POINTS, "raw length {len}");
        }
    }

    #[test]
    fn resampling_is_index_proportional() {
        let raw = ring(256);
        let contour = resample_contour(&raw);
        assert_eq!(contour.points()[0], raw[0]);
        assert_eq!(contour.points()[1], raw[2]);
        assert_eq!(contour.points()[127], raw[254]);
    }

    #[test]
    fn short_contours_are_empty() {
        for len in 0..MIN_RAW_POINTS {
            assert!(resample_contour(&ring(len)).is_empty());
        }
    }

    #[test]
    fn largest_contour_wins() {
        let small = vec![[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]];
        let large = vec![[0.0, 0.0], [9.0, 0.0], [9.0, 9.0], [0.0, 9.0]];
        let contours = vec![small, large.clone()];
        assert_eq!(dominant_contour(&contours), Some(large.as_slice()));
    }

    #[test]
    fn equal_areas_keep_scan_order() {
        let first = vec![[0.0, 0.0], [3.0, 0.0], [3.0, 3.0], [0.0, 3.0]];
        let second = vec![[10.0, 10.0], [13.0, 10.0], [13.0, 13.0], [10.0, 13.0]];
        let contours = vec![first.clone(), second];
        assert_eq!(dominant_contour(&contours), Some(first.as_slice()));
    }

    #[test]
    fn blank_image_has_no_contour() {
        let image = GrayImage::new(32, 32);
        let contour = extract_dominant_contour(&ImageprocContourExtractor, &image).expect("no error");
        assert!(contour.is_empty());
    }

    #[test]
    fn picks_the_bigger_of_two_blobs() {
        let mut image = filled_rect(100, 100, 5, 5, 15, 15);
        for y in 40..90 {
            for x in 40..90 {
                image.put_pixel(x, y, Luma([255u8]));
            }
        }
        let contour = extract_dominant_contour(&ImageprocContourExtractor, &image).expect("no error");
        assert_eq!(contour.len(), CONTOUR_POINTS);
        assert!(contour.points().iter().all(|&[x, y]| x >= 40.0 && y >= 40.0));
    }
}
