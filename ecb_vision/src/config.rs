// THEORY:
// `RenderConfig` is the single source of truth for one run. The binary builds it
// from command-line flags, and `validate` turns it into a `ValidatedConfig`: the
// same options reshaped into types that cannot express the invalid combinations
// (a raw run has no palette, a layout request is exactly one of ratio / width /
// height / guess). Everything downstream of `validate` takes the typed form and
// never re-parses strings.

use crate::error::{VisionError, VisionResult};
use std::path::PathBuf;

pub const DEFAULT_COLORS: usize = 16;
pub const DEFAULT_BLOCKSIZE: usize = 16;
pub const DEFAULT_GROUPS: usize = 1;
pub const DEFAULT_SAMPLING: usize = 1000;
pub const DEFAULT_MAXRATIO: usize = 3;
pub const DEFAULT_PIXELWIDTH: usize = 1;

/// Palette slots available to retained blocks; the last slot belongs to the tail.
const RETAINED_INDEX_CAPACITY: usize = 255;

/// User-facing options for a single rendering run.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Number of colors, counting the tail color. Must be at least 2.
    pub colors: usize,
    /// Explicit palette indices as a hex string, two characters per entry.
    pub palette: Option<String>,
    /// Block size in bytes.
    pub blocksize: usize,
    /// Retained blocks are colored in whole groups of this many blocks.
    pub groups: usize,
    /// Output aspect ratio, e.g. "4:3".
    pub ratio: Option<String>,
    /// Output width in pixels. A fractional width reshapes the buffer.
    pub width: Option<f64>,
    /// Output height in pixels.
    pub height: Option<usize>,
    /// Stride between sampled pairs when guessing the width.
    pub sampling: usize,
    /// Widths between `sqrt(L)/maxratio` and `sqrt(L)*maxratio` are tried.
    pub maxratio: usize,
    /// Number of blocks to skip at the start of the file (header).
    pub offset: f64,
    /// Flip the image top to bottom.
    pub flip: bool,
    /// Bytes per pixel in the plaintext image.
    pub pixelwidth: usize,
    /// Use every byte directly as a palette index.
    pub raw: bool,
    /// Save a copy of the produced image.
    pub save: bool,
    /// Output location prefix. Implies `save`.
    pub output: Option<PathBuf>,
    /// Do not display the image.
    pub dontshow: bool,
    /// Histogram workers. 1 keeps the pass sequential, 0 uses every core.
    pub workers: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            colors: DEFAULT_COLORS,
            palette: None,
            blocksize: DEFAULT_BLOCKSIZE,
            groups: DEFAULT_GROUPS,
            ratio: None,
            width: None,
            height: None,
            sampling: DEFAULT_SAMPLING,
            maxratio: DEFAULT_MAXRATIO,
            offset: 0.0,
            flip: false,
            pixelwidth: DEFAULT_PIXELWIDTH,
            raw: false,
            save: false,
            output: None,
            dontshow: false,
            workers: 1,
        }
    }
}

/// Settings of the block-histogram colorization.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSettings {
    pub colors: usize,
    pub blocksize: usize,
    pub groups: usize,
    /// Parsed explicit palette indices, if any.
    pub palette: Option<Vec<u8>>,
}

impl HistogramSettings {
    /// Upper bound on retained blocks before group truncation, `None` on overflow.
    pub fn max_retained(&self) -> Option<usize> {
        self.colors.checked_sub(1)?.checked_mul(self.groups)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderMode {
    Histogram(HistogramSettings),
    Raw,
}

/// How the final width and height are to be determined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayoutRequest {
    Ratio { width: u32, height: u32 },
    Width(f64),
    Height(usize),
    Guess { sampling: usize, maxratio: usize },
}

/// A configuration that has passed every check in `RenderConfig::validate`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConfig {
    pub mode: RenderMode,
    pub layout: LayoutRequest,
    pub pixelwidth: usize,
    /// Bytes to skip at the start of the input.
    pub skip_bytes: usize,
    pub flip: bool,
}

impl RenderConfig {
    /// Whether the run writes an image file.
    pub fn should_save(&self) -> bool {
        self.save || self.output.is_some()
    }

    pub fn validate(&self) -> VisionResult<ValidatedConfig> {
        // --- Mutually exclusive options, in the order users usually hit them ---
        if self.colors < 2 {
            return Err(VisionError::config("Please choose at least two colors"));
        }
        if self.width.is_some() && self.height.is_some() {
            return Err(VisionError::config(
                "Please indicate only a width or a height, not both!",
            ));
        }
        if self.ratio.is_some() && (self.width.is_some() || self.height.is_some()) {
            return Err(VisionError::config(
                "Please don't mix a ratio with a width or a height!",
            ));
        }
        if self.raw
            && (self.colors != DEFAULT_COLORS
                || self.blocksize != DEFAULT_BLOCKSIZE
                || self.groups != DEFAULT_GROUPS
                || self.palette.is_some())
        {
            return Err(VisionError::config(
                "Please don't mix raw mode with blocksize, colors, palette or groups!",
            ));
        }

        // --- Ranges ---
        if self.blocksize == 0 {
            return Err(VisionError::config("Blocksize must be at least 1 byte"));
        }
        if self.pixelwidth == 0 {
            return Err(VisionError::config("Pixel width must be at least 1 byte"));
        }
        if self.groups == 0 {
            return Err(VisionError::config("Groups must contain at least 1 block"));
        }
        if self.sampling == 0 {
            return Err(VisionError::config("Sampling stride must be at least 1"));
        }
        if self.maxratio == 0 {
            return Err(VisionError::config("Max ratio must be at least 1"));
        }
        if !self.offset.is_finite() || self.offset < 0.0 {
            return Err(VisionError::config(format!(
                "Offset must be a non-negative number of blocks, got {}",
                self.offset
            )));
        }

        let mode = if self.raw {
            RenderMode::Raw
        } else {
            RenderMode::Histogram(self.histogram_settings()?)
        };

        Ok(ValidatedConfig {
            mode,
            layout: self.layout_request()?,
            pixelwidth: self.pixelwidth,
            skip_bytes: (self.offset * self.blocksize as f64).round_ties_even() as usize,
            flip: self.flip,
        })
    }

    fn histogram_settings(&self) -> VisionResult<HistogramSettings> {
        if self.blocksize % self.pixelwidth != 0 {
            return Err(VisionError::config(format!(
                "Blocksize {} is not a multiple of the pixel width {}",
                self.blocksize, self.pixelwidth
            )));
        }
        let settings = HistogramSettings {
            colors: self.colors,
            blocksize: self.blocksize,
            groups: self.groups,
            palette: self.palette.as_deref().map(parse_palette).transpose()?,
        };
        if settings.max_retained().is_none_or(|retained| retained > RETAINED_INDEX_CAPACITY) {
            return Err(VisionError::config(format!(
                "{} colors in groups of {} need more than {} palette indices",
                self.colors, self.groups, RETAINED_INDEX_CAPACITY
            )));
        }
        Ok(settings)
    }

    fn layout_request(&self) -> VisionResult<LayoutRequest> {
        if let Some(ratio) = &self.ratio {
            let (width, height) = parse_ratio(ratio)?;
            return Ok(LayoutRequest::Ratio { width, height });
        }
        if let Some(width) = self.width {
            if !width.is_finite() || width < 1.0 {
                return Err(VisionError::config(format!(
                    "Width must be at least 1 pixel, got {}",
                    width
                )));
            }
            return Ok(LayoutRequest::Width(width));
        }
        if let Some(height) = self.height {
            if height == 0 {
                return Err(VisionError::config("Height must be at least 1 pixel"));
            }
            return Ok(LayoutRequest::Height(height));
        }
        Ok(LayoutRequest::Guess {
            sampling: self.sampling,
            maxratio: self.maxratio,
        })
    }
}

/// Parses a palette string, two hex characters per palette index.
pub fn parse_palette(hex: &str) -> VisionResult<Vec<u8>> {
    if hex.is_empty() || hex.len() % 2 != 0 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(VisionError::config(format!(
            "Palette must be a non-empty string of hex pairs, got {:?}",
            hex
        )));
    }
    Ok(hex
        .as_bytes()
        .chunks(2)
        .map(|pair| (hex_value(pair[0]) << 4) | hex_value(pair[1]))
        .collect())
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}

/// Parses a "W:H" aspect ratio.
pub fn parse_ratio(ratio: &str) -> VisionResult<(u32, u32)> {
    let invalid = || VisionError::config(format!("Ratio must look like 4:3, got {:?}", ratio));
    let (w, h) = ratio.split_once(':').ok_or_else(invalid)?;
    let w: u32 = w.trim().parse().map_err(|_| invalid())?;
    let h: u32 = h.trim().parse().map_err(|_| invalid())?;
    if w == 0 || h == 0 {
        return Err(invalid());
    }
    Ok((w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expect_invalid(config: RenderConfig) {
        match config.validate() {
            Err(VisionError::InvalidConfiguration(_)) => {}
            other => panic!("expected an invalid configuration, got {:?}", other),
        }
    }

    #[test]
    fn defaults_validate_to_histogram_with_guess() {
        let validated = RenderConfig::default().validate().unwrap();
        assert_eq!(
            validated.mode,
            RenderMode::Histogram(HistogramSettings {
                colors: 16,
                blocksize: 16,
                groups: 1,
                palette: None,
            })
        );
        assert_eq!(
            validated.layout,
            LayoutRequest::Guess { sampling: 1000, maxratio: 3 }
        );
        assert_eq!(validated.skip_bytes, 0);
    }

    #[test]
    fn rejects_single_color() {
        expect_invalid(RenderConfig { colors: 1, ..Default::default() });
    }

    #[test]
    fn rejects_width_with_height() {
        expect_invalid(RenderConfig {
            width: Some(10.0),
            height: Some(10),
            ..Default::default()
        });
    }

    #[test]
    fn rejects_ratio_with_width_or_height() {
        expect_invalid(RenderConfig {
            ratio: Some("4:3".into()),
            width: Some(10.0),
            ..Default::default()
        });
        expect_invalid(RenderConfig {
            ratio: Some("4:3".into()),
            height: Some(10),
            ..Default::default()
        });
    }

    #[test]
    fn rejects_raw_with_colorization_options() {
        expect_invalid(RenderConfig { raw: true, colors: 4, ..Default::default() });
        expect_invalid(RenderConfig { raw: true, blocksize: 8, ..Default::default() });
        expect_invalid(RenderConfig { raw: true, groups: 2, ..Default::default() });
        expect_invalid(RenderConfig {
            raw: true,
            palette: Some("00ff".into()),
            ..Default::default()
        });
    }

    #[test]
    fn raw_with_default_values_is_accepted() {
        let validated = RenderConfig { raw: true, pixelwidth: 3, ..Default::default() }
            .validate()
            .unwrap();
        assert_eq!(validated.mode, RenderMode::Raw);
        assert_eq!(validated.pixelwidth, 3);
    }

    #[test]
    fn rejects_blocksize_not_divisible_by_pixelwidth() {
        expect_invalid(RenderConfig { pixelwidth: 3, ..Default::default() });
    }

    #[test]
    fn rejects_more_retained_blocks_than_palette_slots() {
        expect_invalid(RenderConfig { colors: 257, ..Default::default() });
        expect_invalid(RenderConfig { colors: 129, groups: 3, ..Default::default() });
    }

    #[test]
    fn huge_colors_and_groups_are_rejected_not_wrapped() {
        expect_invalid(RenderConfig { colors: usize::MAX, groups: 2, ..Default::default() });
        // Wraps to 0 without overflow checks.
        expect_invalid(RenderConfig { colors: (1 << (usize::BITS - 1)) + 1, groups: 2, ..Default::default() });
        expect_invalid(RenderConfig { groups: usize::MAX, ..Default::default() });
    }

    #[test]
    fn offset_is_rounded_half_to_even() {
        let skip = |offset: f64, blocksize: usize| {
            RenderConfig { offset, blocksize, ..Default::default() }
                .validate()
                .unwrap()
                .skip_bytes
        };
        assert_eq!(skip(2.0, 16), 32);
        assert_eq!(skip(0.5, 5), 2);
        assert_eq!(skip(0.5, 7), 4);
        assert_eq!(skip(1.25, 16), 20);
    }

    #[test]
    fn layout_request_follows_the_given_option() {
        let layout = |config: RenderConfig| config.validate().unwrap().layout;
        assert_eq!(
            layout(RenderConfig { ratio: Some("16:9".into()), ..Default::default() }),
            LayoutRequest::Ratio { width: 16, height: 9 }
        );
        assert_eq!(
            layout(RenderConfig { width: Some(12.5), ..Default::default() }),
            LayoutRequest::Width(12.5)
        );
        assert_eq!(
            layout(RenderConfig { height: Some(40), ..Default::default() }),
            LayoutRequest::Height(40)
        );
    }

    #[test]
    fn palette_parsing() {
        assert_eq!(parse_palette("000aFF").unwrap(), vec![0x00, 0x0a, 0xff]);
        assert!(parse_palette("").is_err());
        assert!(parse_palette("abc").is_err());
        assert!(parse_palette("zz").is_err());
        assert!(parse_palette("+1").is_err());
    }

    #[test]
    fn ratio_parsing() {
        assert_eq!(parse_ratio("4:3").unwrap(), (4, 3));
        assert!(parse_ratio("4x3").is_err());
        assert!(parse_ratio("0:3").is_err());
        assert!(parse_ratio("4:").is_err());
    }

    #[test]
    fn output_implies_save() {
        let config = RenderConfig {
            output: Some(PathBuf::from("/tmp/mytest")),
            ..Default::default()
        };
        assert!(config.should_save());
        assert!(!RenderConfig::default().should_save());
    }
}
