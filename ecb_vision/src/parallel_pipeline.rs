// THEORY:
// The parallel pipeline splits the only expensive stage, block counting, across a
// pool of blocking workers and then hands the merged histogram to the ordinary
// `VisionPipeline` stages.
//
// Key architectural principles:
// 1.  **Contiguous Shards**: Each worker owns one contiguous range of block
//     indices and reports `(first index, count)` pairs in first-encounter order.
// 2.  **Ordered Merge**: Shards are merged in range order through the same
//     `Tally` the sequential path uses, so counts *and* tie order match a
//     single-threaded run exactly.
// 3.  **Shared Input**: The buffer lives in an `Arc<[u8]>`; workers only clone
//     the pointer.

use crate::config::{RenderConfig, RenderMode};
use crate::core_modules::block::block::Block;
use crate::core_modules::histogram::{check_blocksize, first_occurrences, BlockHistogram, Tally};
use crate::error::{VisionError, VisionResult};
use crate::pipeline::{Rendering, VisionPipeline};
use futures::future::try_join_all;
use std::ops::Range;
use std::sync::Arc;

pub struct ParallelPipeline {
    pipeline: VisionPipeline,
    workers: usize,
}

impl ParallelPipeline {
    /// `config.workers == 0` means one worker per logical CPU.
    pub fn new(config: RenderConfig) -> VisionResult<Self> {
        let workers = match config.workers {
            0 => num_cpus::get(),
            n => n,
        };
        let pipeline = VisionPipeline::new(config)?;
        log::debug!("Parallel pipeline with {} workers", workers);
        Ok(Self { pipeline, workers })
    }

    pub fn pipeline(&self) -> &VisionPipeline {
        &self.pipeline
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub async fn render(&self, data: Arc<[u8]>) -> VisionResult<Rendering> {
        match &self.pipeline.validated().mode {
            RenderMode::Histogram(settings) => {
                let histogram = parallel_histogram(&data, settings.blocksize, self.workers).await?;
                self.pipeline.render_histogram(&data, &histogram, settings)
            }
            // Striding is a single pass; nothing to shard.
            RenderMode::Raw => self.pipeline.render(&data),
        }
    }
}

/// Builds the same histogram as `BlockHistogram::build`, counting on `workers`
/// blocking threads.
pub async fn parallel_histogram(
    data: &Arc<[u8]>,
    blocksize: usize,
    workers: usize,
) -> VisionResult<BlockHistogram<'_>> {
    check_blocksize(blocksize)?;
    let ranges = shard_ranges(data.len() / blocksize, workers);

    let tasks = ranges.into_iter().map(|range| {
        let shared = Arc::clone(data);
        tokio::task::spawn_blocking(move || first_occurrences(&shared, blocksize, range))
    });
    let shards = try_join_all(tasks)
        .await
        .map_err(|e| VisionError::Worker(e.to_string()))?;

    let mut tally = Tally::default();
    for (index, count) in shards.into_iter().flatten() {
        let start = index * blocksize;
        tally.add(Block::new(&data[start..start + blocksize]), count);
    }
    Ok(tally.finish(blocksize))
}

/// Splits `0..total` into at most `workers` contiguous, non-empty ranges.
fn shard_ranges(total: usize, workers: usize) -> Vec<Range<usize>> {
    let size = total.div_ceil(workers.max(1)).max(1);
    (0..total)
        .step_by(size)
        .map(|start| start..(start + size).min(total))
        .collect()
}
