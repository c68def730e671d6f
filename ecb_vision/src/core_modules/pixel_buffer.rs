// THEORY:
// The `PixelBufferBuilder` turns the input into an index image in histogram mode.
// It walks the buffer block by block, asks the `ColorAssignment` for each block's
// palette index and writes that index once per pixel the block covers. A block of
// `blocksize` bytes covers `blocksize / pixelwidth` pixels, so the block size must
// be a whole number of pixels.
//
// The output is sized for `len / pixelwidth + 1` pixels up front and cut down to
// `ceil(len / pixelwidth)` at the end. A trailing partial block has no content key;
// its pixels take the tail index.

use crate::core_modules::block::block::blocks;
use crate::core_modules::palette_builder::ColorAssignment;
use crate::error::{VisionError, VisionResult};

#[derive(Debug, Clone, Copy)]
pub struct PixelBufferBuilder {
    blocksize: usize,
    pixelwidth: usize,
}

impl PixelBufferBuilder {
    pub fn new(blocksize: usize, pixelwidth: usize) -> VisionResult<Self> {
        if blocksize == 0 || pixelwidth == 0 {
            return Err(VisionError::config(
                "Blocksize and pixel width must both be at least 1 byte",
            ));
        }
        if blocksize % pixelwidth != 0 {
            return Err(VisionError::config(format!(
                "Blocksize {} is not a multiple of the pixel width {}",
                blocksize, pixelwidth
            )));
        }
        Ok(Self { blocksize, pixelwidth })
    }

    pub fn pixels_per_block(&self) -> usize {
        self.blocksize / self.pixelwidth
    }

    pub fn build(&self, data: &[u8], assignment: &ColorAssignment<'_>) -> Vec<u8> {
        let pixels_per_block = self.pixels_per_block();
        let mut pixels = vec![0u8; data.len() / self.pixelwidth + 1];
        let mut filled = 0;

        for block in blocks(data, self.blocksize) {
            let index = assignment.index_of(&block);
            pixels[filled..filled + pixels_per_block].fill(index);
            filled += pixels_per_block;
        }

        let length = data.len().div_ceil(self.pixelwidth);
        pixels[filled..length].fill(assignment.tail_index());
        pixels.truncate(length);
        pixels
    }
}
