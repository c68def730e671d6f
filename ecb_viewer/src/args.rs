//! Command-line argument definitions and conversion into a `RenderConfig`

use clap::Parser;
use ecb_vision::config::{
    DEFAULT_BLOCKSIZE, DEFAULT_COLORS, DEFAULT_GROUPS, DEFAULT_MAXRATIO, DEFAULT_PIXELWIDTH,
    DEFAULT_SAMPLING,
};
use ecb_vision::RenderConfig;
use log::LevelFilter;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "ecb-viewer")]
#[command(
    author,
    version,
    about = "Colorize a data file according to repetitive chunks, typical in ECB encrypted data",
    long_about = None
)]
pub struct Args {
    /// Data file to render
    pub file: Option<PathBuf>,

    // ========================================================================
    // Histogram mode
    // ========================================================================
    /// Number of colors to use
    #[arg(short, long, default_value_t = DEFAULT_COLORS)]
    pub colors: usize,

    /// Palette indices as a hex string, two characters per color
    #[arg(short = 'P', long, value_name = "HEX")]
    pub palette: Option<String>,

    /// Blocksize in bytes
    #[arg(short, long, default_value_t = DEFAULT_BLOCKSIZE)]
    pub blocksize: usize,

    /// Groups of N blocks
    #[arg(short, long, default_value_t = DEFAULT_GROUPS)]
    pub groups: usize,

    // ========================================================================
    // Layout
    // ========================================================================
    /// Output image ratio, e.g. -r 4:3
    #[arg(short, long, value_name = "W:H")]
    pub ratio: Option<String>,

    /// Width of output image
    #[arg(short = 'x', long)]
    pub width: Option<f64>,

    /// Height of output image
    #[arg(short = 'y', long)]
    pub height: Option<usize>,

    /// Sampling when guessing image size
    #[arg(short, long, default_value_t = DEFAULT_SAMPLING)]
    pub sampling: usize,

    /// Max ratio to test when guessing image size
    #[arg(short, long, default_value_t = DEFAULT_MAXRATIO)]
    pub maxratio: usize,

    /// Offset to skip the file header, in number of blocks
    #[arg(short, long, default_value_t = 0.0)]
    pub offset: f64,

    /// Flip image top<>bottom
    #[arg(short, long)]
    pub flip: bool,

    /// Bytes per pixel in the plaintext image
    #[arg(short, long, default_value_t = DEFAULT_PIXELWIDTH)]
    pub pixelwidth: usize,

    /// Display raw image in 256 colors
    #[arg(short = 'R', long)]
    pub raw: bool,

    // ========================================================================
    // Output
    // ========================================================================
    /// Save a copy of the produced image
    #[arg(short = 'S', long)]
    pub save: bool,

    /// Change default output location prefix, e.g. -O /tmp/mytest. Implies -S
    #[arg(short = 'O', long, value_name = "PREFIX")]
    pub output: Option<PathBuf>,

    /// Don't display image
    #[arg(short = 'D', long)]
    pub dontshow: bool,

    /// Histogram workers (1 = sequential, 0 = one per core)
    #[arg(short, long, default_value_t = 1)]
    pub jobs: usize,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    pub fn to_config(&self) -> RenderConfig {
        RenderConfig {
            colors: self.colors,
            palette: self.palette.clone(),
            blocksize: self.blocksize,
            groups: self.groups,
            ratio: self.ratio.clone(),
            width: self.width,
            height: self.height,
            sampling: self.sampling,
            maxratio: self.maxratio,
            offset: self.offset,
            flip: self.flip,
            pixelwidth: self.pixelwidth,
            raw: self.raw,
            save: self.save,
            output: self.output.clone(),
            dontshow: self.dontshow,
            workers: self.jobs,
        }
    }
}
