// THEORY:
// This file is the main entry point for the `ecb_vision` library crate. It exposes
// the engine that turns an arbitrary byte buffer (typically ciphertext) into an
// indexed-color picture in which repeated fixed-size blocks stand out, the way
// ECB-mode encryption leaks the structure of its plaintext.
//
// The public surface is small: a `RenderConfig` goes in, `VisionPipeline` (or its
// multi-threaded sibling `ParallelPipeline`) runs the stages, and a `Rendering`
// comes out. The building blocks in `core_modules` stay public for callers that
// want a single stage on its own.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use config::RenderConfig;
pub use error::{VisionError, VisionResult};
pub use parallel_pipeline::ParallelPipeline;
pub use pipeline::{Rendering, VisionPipeline};
