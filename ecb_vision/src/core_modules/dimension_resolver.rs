// THEORY:
// The `DimensionResolver` is the geometric half of the engine. The pixel stage
// produces a flat, 1-D run of palette indices; this module decides how that run is
// folded into rows. The caller can fix the shape (an aspect ratio, a width or a
// height), or leave it to the resolver to guess.
//
// Key architectural principles:
// 1.  **Priority order**: ratio, then width, then height, then the guess. The
//     configuration layer already guarantees at most one of them is present.
// 2.  **Autocorrelation guess**: in a correctly folded image, vertically adjacent
//     pixels sit exactly `width` positions apart in the flat buffer. Because equal
//     blocks produce vertical runs of equal color, the right row length is the one
//     whose pairs `(p[k], p[k + width])` agree most often. The resolver samples
//     those pairs every `sampling` positions for every candidate width between
//     `sqrt(L) / maxratio` and `sqrt(L) * maxratio` and keeps the first best score.
// 3.  **Fractional widths**: a width like 12.5 is treated as conceptual rows that
//     start at `floor(i * 12.5)`; each row keeps its first 12 pixels and the rest
//     of the conceptual row is dropped.
// 4.  **Truncate, never pad**: the final buffer holds exactly `width * height`
//     pixels; anything beyond the last full row is discarded.

use crate::config::LayoutRequest;
use crate::error::{VisionError, VisionResult};

/// Final image size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: usize,
    pub height: usize,
}

impl Dimensions {
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

/// Where the width came from. The output file name spells requested and guessed
/// widths the way they were obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WidthSource {
    Requested(f64),
    Guessed(usize),
    Derived,
}

/// A pixel buffer folded into rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLayout {
    pub dimensions: Dimensions,
    pub width_source: WidthSource,
    /// Exactly `dimensions.area()` palette indices, row-major.
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone, Copy)]
pub struct DimensionResolver {
    request: LayoutRequest,
}

impl DimensionResolver {
    pub fn new(request: LayoutRequest) -> Self {
        Self { request }
    }

    pub fn resolve(&self, mut pixels: Vec<u8>) -> VisionResult<ResolvedLayout> {
        let length = pixels.len();
        let (dimensions, width_source) = match self.request {
            LayoutRequest::Ratio { width, height } => {
                (ratio_dimensions(length, width, height), WidthSource::Derived)
            }
            LayoutRequest::Width(width) => {
                if width.fract() != 0.0 {
                    pixels = reshape_fractional(&pixels, width);
                    let rows = if width >= 1.0 { pixels.len() / width as usize } else { 0 };
                    (
                        Dimensions { width: width as usize, height: rows },
                        WidthSource::Requested(width),
                    )
                } else {
                    let width_px = width as usize;
                    (
                        Dimensions { width: width_px, height: length / width_px.max(1) },
                        WidthSource::Requested(width),
                    )
                }
            }
            LayoutRequest::Height(height) => (
                Dimensions { width: length / height.max(1), height },
                WidthSource::Derived,
            ),
            LayoutRequest::Guess { sampling, maxratio } => {
                let width = guess_width(&pixels, sampling, maxratio)?;
                (
                    Dimensions { width, height: length / width },
                    WidthSource::Guessed(width),
                )
            }
        };

        if dimensions.width == 0 || dimensions.height == 0 {
            return Err(VisionError::empty(format!(
                "Cannot lay out {} pixels as {}x{}",
                length, dimensions.width, dimensions.height
            )));
        }
        pixels.truncate(dimensions.area());
        log::debug!(
            "Folded {} pixels into {}x{}",
            length,
            dimensions.width,
            dimensions.height
        );
        Ok(ResolvedLayout {
            dimensions,
            width_source,
            pixels,
        })
    }
}

/// Integer size closest to a `width:height` aspect whose area is about `length`.
pub fn ratio_dimensions(length: usize, width: u32, height: u32) -> Dimensions {
    let x = (width as f64 / height as f64 * length as f64).sqrt();
    let y = x / width as f64 * height as f64;
    let width_px = x as usize;
    let height_px = y as usize;
    // Rounding in the square root must not push the area past the buffer.
    let height_px = match width_px {
        0 => height_px,
        w => height_px.min(length / w),
    };
    Dimensions { width: width_px, height: height_px }
}

/// Rows of `floor(width)` pixels starting at `floor(i * width)`.
pub fn reshape_fractional(pixels: &[u8], width: f64) -> Vec<u8> {
    let row_width = width as usize;
    if row_width == 0 {
        return Vec::new();
    }
    let rows = (pixels.len() as f64 / width) as usize;
    let mut reshaped = Vec::with_capacity(rows * row_width);
    for row in 0..rows {
        let start = (row as f64 * width) as usize;
        match pixels.get(start..start + row_width) {
            Some(slice) => reshaped.extend_from_slice(slice),
            None => break,
        }
    }
    reshaped
}

/// Fraction of sampled pairs `(p[k], p[k + offset])` that are equal.
pub fn autocorrelation(pixels: &[u8], offset: usize, sampling: usize) -> Option<f64> {
    if offset == 0 || offset >= pixels.len() || sampling == 0 {
        return None;
    }
    let span = pixels.len() - offset;
    let samples = span.div_ceil(sampling);
    let matches = (0..span)
        .step_by(sampling)
        .filter(|&k| pixels[k] == pixels[k + offset])
        .count();
    Some(matches as f64 / samples as f64)
}

/// Picks the row length in `[sqrt(L) / maxratio, sqrt(L) * maxratio)` with the
/// strongest vertical autocorrelation. Ties go to the narrowest width.
pub fn guess_width(pixels: &[u8], sampling: usize, maxratio: usize) -> VisionResult<usize> {
    log::info!(
        "Trying to guess ratio between 1:{} and {}:1 ...",
        maxratio,
        maxratio
    );
    let side = pixels.len().isqrt();
    let lowest = (side / maxratio.max(1)).max(1);
    // Offsets at or past the buffer length have no pairs to sample.
    let highest = side.saturating_mul(maxratio).min(pixels.len());

    let mut best: Option<(usize, f64)> = None;
    for candidate in lowest..highest {
        let Some(score) = autocorrelation(pixels, candidate, sampling) else {
            continue;
        };
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((candidate, score));
        }
    }

    match best {
        Some((width, score)) => {
            log::debug!("Best row length {} (match rate {:.3})", width, score);
            Ok(width)
        }
        None => Err(VisionError::empty(format!(
            "Cannot guess a width for {} pixels",
            pixels.len()
        ))),
    }
}
