//! Raw rectangular candidates from a photograph: grayscale, blur, Canny edges,
//! a small dilation to close gaps, then the bounding box of every traced contour.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::distance_transform::Norm;
use kornia::{
    image::{Image, ImageSize, allocator::CpuAllocator},
    imgproc,
};
use tracing::debug;

use crate::config::ExtractorConfig;
use crate::error::OverlayError;
use crate::geometry::RawRegion;

type CpuImage<T, const C: usize> = Image<T, C, CpuAllocator>;

/// Source of raw candidate regions for a raster image.
///
/// Implementations must be deterministic for a fixed image: the pipeline's
/// output is only reproducible if its input regions are.
pub trait CandidateExtractor {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<RawRegion>, OverlayError>;
}

/// Edge and contour based extractor used for the reference photograph.
#[derive(Debug, Clone, Default)]
pub struct EdgeContourExtractor {
    config: ExtractorConfig,
}

impl EdgeContourExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }
}

impl CandidateExtractor for EdgeContourExtractor {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<RawRegion>, OverlayError> {
        detect_candidates_from_image(image, &self.config)
    }
}

/// Detects blob-like features and returns one bounding box per traced contour,
/// outer and hole borders alike, in tracing order.
pub fn detect_candidates_from_image(
    source: &DynamicImage,
    config: &ExtractorConfig,
) -> Result<Vec<RawRegion>, OverlayError> {
    let rgb = source.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Ok(Vec::new());
    }

    let gray = grayscale(rgb.into_raw(), width, height)?;

    let blurred = if config.blur_sigma > 0.0 {
        imageproc::filter::gaussian_blur_f32(&gray, config.blur_sigma)
    } else {
        gray
    };
    let edges = imageproc::edges::canny(&blurred, config.canny_low, config.canny_high);
    let edges = if config.dilate_radius > 0 {
        imageproc::morphology::dilate(&edges, Norm::LInf, config.dilate_radius)
    } else {
        edges
    };

    let contours = imageproc::contours::find_contours::<u32>(&edges);
    let regions: Vec<RawRegion> = contours
        .iter()
        .filter_map(|contour| bounding_rect(contour.points.iter().map(|p| (p.x, p.y))))
        .collect();

    debug!(
        "extracted {} candidate regions from {} contours ({}x{})",
        regions.len(),
        contours.len(),
        width,
        height
    );
    Ok(regions)
}

fn grayscale(raw_pixels: Vec<u8>, width: u32, height: u32) -> Result<GrayImage, OverlayError> {
    let image = CpuImage::<u8, 3>::new(
        ImageSize {
            width: width as usize,
            height: height as usize,
        },
        raw_pixels,
        CpuAllocator,
    )?;
    let mut gray = CpuImage::<u8, 1>::from_size_val(image.size(), 0u8, CpuAllocator)?;
    imgproc::color::gray_from_rgb_u8(&image, &mut gray)?;

    let data = gray.as_slice();
    Ok(GrayImage::from_fn(width, height, |x, y| {
        Luma([data[y as usize * width as usize + x as usize]])
    }))
}

/// Smallest upright rectangle enclosing every point, inclusive of both ends.
fn bounding_rect(points: impl Iterator<Item = (u32, u32)>) -> Option<RawRegion> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y) in points {
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((min_x, min_y, max_x, max_y)) => {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            }
        });
    }
    let (min_x, min_y, max_x, max_y) = bounds?;
    Some(RawRegion::new(
        min_x,
        min_y,
        max_x - min_x + 1,
        max_y - min_y + 1,
    ))
}
