// THEORY:
// The boundary between the engine and the outside world. An `IndexedImage` is the
// finished product of a run: a plane of palette indices with its width and height,
// plus the 256-entry palette that colors it. It can flip itself top to bottom and
// write itself out as an 8-bit indexed PNG (PLTE chunk, one byte per pixel), which
// keeps the palette intact instead of expanding it to RGB.

pub mod image_helper {
    use crate::core_modules::color::color::Palette;
    use crate::error::{VisionError, VisionResult};
    use image::{imageops, GrayImage};
    use std::fs::File;
    use std::io::{BufWriter, Write};
    use std::path::Path;

    /// A finished palette-indexed image.
    #[derive(Debug, Clone)]
    pub struct IndexedImage {
        /// Palette indices, one luma sample per pixel.
        indices: GrayImage,
        palette: Palette,
    }

    impl IndexedImage {
        pub fn new(width: usize, height: usize, pixels: Vec<u8>, palette: Palette) -> VisionResult<Self> {
            let too_large = || VisionError::config(format!("Image {}x{} is too large", width, height));
            let width = u32::try_from(width).map_err(|_| too_large())?;
            let height = u32::try_from(height).map_err(|_| too_large())?;
            let available = pixels.len();
            let indices = GrayImage::from_raw(width, height, pixels).ok_or_else(|| {
                VisionError::empty(format!(
                    "{} pixels cannot fill a {}x{} image",
                    available, width, height
                ))
            })?;
            Ok(Self { indices, palette })
        }

        pub fn width(&self) -> u32 {
            self.indices.width()
        }

        pub fn height(&self) -> u32 {
            self.indices.height()
        }

        /// Row-major palette indices.
        pub fn indices(&self) -> &[u8] {
            self.indices.as_raw()
        }

        pub fn palette(&self) -> &Palette {
            &self.palette
        }

        pub fn flip_vertical(&mut self) {
            imageops::flip_vertical_in_place(&mut self.indices);
        }

        pub fn write_png<W: Write>(&self, writer: W) -> VisionResult<()> {
            let mut encoder = png::Encoder::new(writer, self.width(), self.height());
            encoder.set_color(png::ColorType::Indexed);
            encoder.set_depth(png::BitDepth::Eight);
            encoder.set_palette(self.palette.to_flat());

            let mut writer = encoder.write_header()?;
            writer.write_image_data(self.indices())?;
            writer.finish()?;
            Ok(())
        }

        pub fn save(&self, path: &Path) -> VisionResult<()> {
            let output = BufWriter::new(File::create(path)?);
            self.write_png(output)
        }
    }
}
