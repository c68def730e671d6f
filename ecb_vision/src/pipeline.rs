// THEORY:
// The `pipeline` module is the top-level API of the engine. It takes one validated
// configuration and one input buffer and runs the whole stack in order, producing
// a finished `Rendering`: the indexed image, its legend and the layout it settled on.
//
// Stages:
// 1.  Histogram mode: count blocks (`BlockHistogram`), pick and color the retained
//     blocks (`PaletteBuilder`), then paint one index per pixel (`PixelBufferBuilder`).
//     Raw mode: stride over the bytes (`RawEncoder`).
// 2.  Fold the flat pixel run into rows (`DimensionResolver`).
// 3.  Wrap pixels and palette into an `IndexedImage`, flipping it if asked.
//
// Reading the input (with its header skipped) and naming the saved file also live
// here, since both depend on the same configuration.

use crate::config::{HistogramSettings, RenderConfig, RenderMode, ValidatedConfig};
use crate::core_modules::color::color::Palette;
use crate::core_modules::dimension_resolver::{DimensionResolver, Dimensions, WidthSource};
use crate::core_modules::histogram::BlockHistogram;
use crate::core_modules::palette_builder::PaletteBuilder;
use crate::core_modules::pixel_buffer::PixelBufferBuilder;
use crate::core_modules::raw_encoder::RawEncoder;
use crate::core_modules::utils::image_helper::image_helper::IndexedImage;
use crate::error::VisionResult;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

// Re-export key data structures for the public API.
pub use crate::core_modules::palette_builder::{ColorLegend, LegendLine};

/// The product of one run.
#[derive(Debug, Clone)]
pub struct Rendering {
    pub image: IndexedImage,
    /// Present in histogram mode only.
    pub legend: Option<ColorLegend>,
    pub dimensions: Dimensions,
    pub width_source: WidthSource,
}

/// The main, top-level struct of the engine.
#[derive(Debug, Clone)]
pub struct VisionPipeline {
    config: RenderConfig,
    validated: ValidatedConfig,
}

impl VisionPipeline {
    pub fn new(config: RenderConfig) -> VisionResult<Self> {
        let validated = config.validate()?;
        Ok(Self { config, validated })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn validated(&self) -> &ValidatedConfig {
        &self.validated
    }

    /// Reads the whole input file and drops the skipped header bytes.
    pub fn load(&self, path: &Path) -> VisionResult<Vec<u8>> {
        let mut data = std::fs::read(path)?;
        let skip = self.validated.skip_bytes.min(data.len());
        data.drain(..skip);
        log::debug!(
            "Read {} bytes from {} after skipping {}",
            data.len(),
            path.display(),
            skip
        );
        Ok(data)
    }

    pub fn render(&self, data: &[u8]) -> VisionResult<Rendering> {
        match &self.validated.mode {
            RenderMode::Histogram(settings) => {
                // Stage 1: Block frequency analysis
                let histogram = BlockHistogram::build(data, settings.blocksize)?;
                self.render_histogram(data, &histogram, settings)
            }
            RenderMode::Raw => {
                // Stage 1: Direct striding
                let encoder = RawEncoder::new(self.validated.pixelwidth)?;
                let pixels = encoder.encode(data);
                self.finish(pixels, encoder.palette(), None)
            }
        }
    }

    /// Histogram-mode stages after the histogram has been counted.
    pub(crate) fn render_histogram(
        &self,
        data: &[u8],
        histogram: &BlockHistogram<'_>,
        settings: &HistogramSettings,
    ) -> VisionResult<Rendering> {
        // Stage 1.5: Color assignment
        let assignment = PaletteBuilder::from_settings(settings).build(histogram)?;
        let palette = Palette::histogram();
        let legend = assignment.legend(&palette);

        // Stage 1.75: Index painting
        let pixels = PixelBufferBuilder::new(settings.blocksize, self.validated.pixelwidth)?
            .build(data, &assignment);
        self.finish(pixels, palette, Some(legend))
    }

    fn finish(
        &self,
        pixels: Vec<u8>,
        palette: Palette,
        legend: Option<ColorLegend>,
    ) -> VisionResult<Rendering> {
        // Stage 2: Layout
        let layout = DimensionResolver::new(self.validated.layout).resolve(pixels)?;
        let dimensions = layout.dimensions;

        // Stage 3: Image assembly
        let mut image = IndexedImage::new(dimensions.width, dimensions.height, layout.pixels, palette)?;
        if self.validated.flip {
            image.flip_vertical();
        }

        Ok(Rendering {
            image,
            legend,
            dimensions,
            width_source: layout.width_source,
        })
    }

    /// Encodes the run's parameters, e.g. `.b16_p1_c16_g2_o1.5_x64_y20`.
    pub fn file_suffix(&self, rendering: &Rendering) -> String {
        let config = &self.config;
        let mut suffix = match self.validated.mode {
            RenderMode::Raw => format!(".raw_p{}", config.pixelwidth),
            RenderMode::Histogram(_) => format!(
                ".b{}_p{}_c{}",
                config.blocksize, config.pixelwidth, config.colors
            ),
        };
        if config.groups != 1 {
            suffix.push_str(&format!("_g{}", config.groups));
        }
        if config.offset != 0.0 {
            suffix.push_str(&format!("_o{}", float_label(config.offset)));
        }
        let height = rendering.dimensions.height;
        match rendering.width_source {
            WidthSource::Requested(width) => {
                suffix.push_str(&format!("_x{}_y{}", float_label(width), height))
            }
            WidthSource::Guessed(width) => suffix.push_str(&format!("_x{}_y{}", width, height)),
            WidthSource::Derived => suffix.push_str(&format!(
                "_x{}_y{}",
                rendering.dimensions.width, height
            )),
        }
        suffix
    }

    /// `{prefix}{suffix}.png`; the prefix defaults to the input path.
    pub fn output_path(&self, input: &Path, rendering: &Rendering) -> PathBuf {
        let mut name: OsString = match &self.config.output {
            Some(prefix) => prefix.clone().into_os_string(),
            None => input.as_os_str().to_os_string(),
        };
        name.push(self.file_suffix(rendering));
        name.push(".png");
        PathBuf::from(name)
    }
}

/// Shortest round-trip decimal, e.g. `2.0`, `12.5`, `0.0001`, `1e-05`, `1e+16`.
///
/// Exponent form is used below `1e-4` and from `1e16` on, with a signed exponent
/// of at least two digits.
fn float_label(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    // `{:e}` gives the shortest digits that round-trip, e.g. `-1.25e-5`.
    let scientific = format!("{:e}", value);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    if !(-4..16).contains(&exponent) {
        let (lead, rest) = digits.split_at(1);
        let fraction = if rest.is_empty() { String::new() } else { format!(".{}", rest) };
        let exponent_sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}{}{}e{}{:02}", sign, lead, fraction, exponent_sign, exponent.abs());
    }

    if exponent < 0 {
        let zeros = "0".repeat((-exponent - 1) as usize);
        return format!("{}0.{}{}", sign, zeros, digits);
    }
    let integral_len = exponent as usize + 1;
    if digits.len() <= integral_len {
        let zeros = "0".repeat(integral_len - digits.len());
        format!("{}{}{}.0", sign, digits, zeros)
    } else {
        let (integral, fraction) = digits.split_at(integral_len);
        format!("{}{}.{}", sign, integral, fraction)
    }
}
