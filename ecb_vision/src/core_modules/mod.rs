pub mod block;
pub mod color;
pub mod dimension_resolver;
pub mod histogram;
pub mod palette_builder;
pub mod pixel_buffer;
pub mod raw_encoder;
pub mod utils;
