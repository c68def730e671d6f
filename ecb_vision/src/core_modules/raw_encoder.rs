// THEORY:
// The raw path skips block analysis entirely: every `pixelwidth`-th byte of the
// input is used as a palette index as-is, and the palette is a full 256-step hue
// ramp. It shows the byte structure of the file rather than its repetitions, and
// is the quickest way to eyeball plaintext-like regions.

use crate::core_modules::color::color::Palette;
use crate::error::{VisionError, VisionResult};

/// Strided byte -> palette index encoder.
#[derive(Debug, Clone, Copy)]
pub struct RawEncoder {
    pixelwidth: usize,
}

impl RawEncoder {
    pub fn new(pixelwidth: usize) -> VisionResult<Self> {
        if pixelwidth == 0 {
            return Err(VisionError::config("Pixel width must be at least 1 byte"));
        }
        Ok(Self { pixelwidth })
    }

    /// Takes `data[i * pixelwidth]` for every `i`; no averaging.
    pub fn encode(&self, data: &[u8]) -> Vec<u8> {
        data.iter().step_by(self.pixelwidth).copied().collect()
    }

    pub fn palette(&self) -> Palette {
        Palette::raw()
    }
}
