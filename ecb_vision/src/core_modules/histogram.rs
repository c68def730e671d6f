// THEORY:
// The `BlockHistogram` is the first analytical stage. It walks the input one whole
// block at a time and counts how often each distinct block content occurs. In
// ECB-style ciphertext equal plaintext blocks encrypt to equal ciphertext blocks,
// so the blocks at the top of this histogram are the ones worth a color.
//
// Key architectural principles:
// 1.  **Content keys**: blocks are keyed by their exact bytes (see `Block`).
// 2.  **Conservation**: every whole block is counted exactly once, so the counts
//     always sum to `len / blocksize`.
// 3.  **Deterministic order**: entries are sorted by count, descending. Entries
//     with equal counts keep the order in which their block was first seen. The
//     `Tally` accumulator records that order, and the parallel pipeline merges its
//     partial tallies through the same accumulator so both paths agree.

use crate::core_modules::block::block::{blocks, Block};
use crate::error::{VisionError, VisionResult};
use std::collections::HashMap;
use std::ops::Range;

/// One distinct block and the number of times it occurs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistogramEntry<'a> {
    pub block: Block<'a>,
    pub count: usize,
}

/// Occurrence counts of every distinct block, most frequent first.
#[derive(Debug, Clone)]
pub struct BlockHistogram<'a> {
    blocksize: usize,
    total_blocks: usize,
    entries: Vec<HistogramEntry<'a>>,
}

impl<'a> BlockHistogram<'a> {
    /// Counts the whole blocks of `data`.
    pub fn build(data: &'a [u8], blocksize: usize) -> VisionResult<Self> {
        check_blocksize(blocksize)?;
        let mut tally = Tally::default();
        for block in blocks(data, blocksize) {
            tally.add(block, 1);
        }
        Ok(tally.finish(blocksize))
    }

    pub fn blocksize(&self) -> usize {
        self.blocksize
    }

    /// Number of whole blocks in the input, i.e. the sum of all counts.
    pub fn total_blocks(&self) -> usize {
        self.total_blocks
    }

    pub fn entries(&self) -> &[HistogramEntry<'a>] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub(crate) fn check_blocksize(blocksize: usize) -> VisionResult<()> {
    if blocksize == 0 {
        return Err(VisionError::config("Blocksize must be at least 1 byte"));
    }
    Ok(())
}

/// Accumulates block counts in first-encounter order.
#[derive(Default)]
pub(crate) struct Tally<'a> {
    positions: HashMap<Block<'a>, usize>,
    entries: Vec<HistogramEntry<'a>>,
    total: usize,
}

impl<'a> Tally<'a> {
    pub(crate) fn add(&mut self, block: Block<'a>, count: usize) {
        self.total += count;
        match self.positions.get(&block) {
            Some(&position) => self.entries[position].count += count,
            None => {
                self.positions.insert(block, self.entries.len());
                self.entries.push(HistogramEntry { block, count });
            }
        }
    }

    pub(crate) fn finish(mut self, blocksize: usize) -> BlockHistogram<'a> {
        // `sort_by` is stable: equal counts stay in first-encounter order.
        self.entries.sort_by(|a, b| b.count.cmp(&a.count));
        BlockHistogram {
            blocksize,
            total_blocks: self.total,
            entries: self.entries,
        }
    }
}

/// Counts the blocks with indices in `range` without borrowing past the call.
///
/// Returns `(first block index, count)` pairs in first-encounter order, which is
/// what a worker hands back to be merged through a `Tally`.
pub(crate) fn first_occurrences(
    data: &[u8],
    blocksize: usize,
    range: Range<usize>,
) -> Vec<(usize, usize)> {
    let mut positions: HashMap<&[u8], usize> = HashMap::new();
    let mut occurrences: Vec<(usize, usize)> = Vec::new();
    for index in range {
        let bytes = &data[index * blocksize..(index + 1) * blocksize];
        match positions.get(bytes) {
            Some(&position) => occurrences[position].1 += 1,
            None => {
                positions.insert(bytes, occurrences.len());
                occurrences.push((index, 1));
            }
        }
    }
    occurrences
}
