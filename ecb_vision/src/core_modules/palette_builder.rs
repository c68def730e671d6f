// THEORY:
// The `PaletteBuilder` decides which blocks deserve a color of their own. It reads
// the sorted histogram from the top, keeps the most frequent blocks that actually
// repeat, and gives each of them a palette index; everything else shares one tail
// color. The result is a `ColorAssignment`, the lookup table the pixel stage uses.
//
// Key architectural principles:
// 1.  **Whole groups**: at most `(colors - 1) * groups` repeating blocks are kept,
//     and the list is cut down to a multiple of `groups`, so a partial group never
//     gets colored.
// 2.  **Explicit slots**: a block is the `Leader` (rank 0, always index 0), a
//     `Retained(rank)` block, or part of the `Tail`. Slots become palette bytes
//     only through `ColorAssignment::index`.
// 3.  **Index ownership**: no two retained blocks share an index and the tail
//     index is never a retained index. Without a palette string the rank is the
//     index and the tail is 255; with one, the string supplies the indices and its
//     last entry names the tail.
// 4.  **Legend**: the assignment can describe itself as one line per retained
//     block plus a tail summary, with the count and the RGB color behind each index.

use crate::config::HistogramSettings;
use crate::core_modules::block::block::Block;
use crate::core_modules::color::color::{Palette, Rgb};
use crate::core_modules::histogram::{BlockHistogram, HistogramEntry};
use crate::error::{VisionError, VisionResult};
use std::collections::HashMap;
use std::fmt;

const DEFAULT_TAIL_INDEX: u8 = 255;

/// The role a block plays in the coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSlot {
    /// The most frequent repeating block.
    Leader,
    /// A retained block, by rank in the retained list (rank >= 1).
    Retained(usize),
    /// Every block outside the retained list.
    Tail,
}

/// Block content -> slot -> palette index.
#[derive(Debug, Clone)]
pub struct ColorAssignment<'a> {
    retained: Vec<HistogramEntry<'a>>,
    slots: HashMap<&'a [u8], ColorSlot>,
    /// Palette index per retained rank.
    indices: Vec<u8>,
    tail_index: u8,
    tail_count: usize,
}

impl<'a> ColorAssignment<'a> {
    pub fn slot(&self, block: &Block<'_>) -> ColorSlot {
        self.slots.get(block.bytes()).copied().unwrap_or(ColorSlot::Tail)
    }

    pub fn index(&self, slot: ColorSlot) -> u8 {
        match slot {
            ColorSlot::Leader => self.indices[0],
            ColorSlot::Retained(rank) => self.indices[rank],
            ColorSlot::Tail => self.tail_index,
        }
    }

    /// Palette index of a block; blocks never seen map to the tail.
    pub fn index_of(&self, block: &Block<'_>) -> u8 {
        self.index(self.slot(block))
    }

    pub fn retained(&self) -> &[HistogramEntry<'a>] {
        &self.retained
    }

    pub fn tail_index(&self) -> u8 {
        self.tail_index
    }

    /// Number of blocks that fall into the tail.
    pub fn tail_count(&self) -> usize {
        self.tail_count
    }

    pub fn legend(&self, palette: &Palette) -> ColorLegend {
        let mut lines: Vec<LegendLine> = self
            .retained
            .iter()
            .enumerate()
            .map(|(rank, entry)| {
                let index = self.indices[rank];
                LegendLine {
                    label: entry.block.to_string(),
                    count: entry.count,
                    index,
                    color: palette.color(index),
                }
            })
            .collect();
        let hex_width = self.retained[0].block.hex_width();
        lines.push(LegendLine {
            label: "*".repeat(hex_width),
            count: self.tail_count,
            index: self.tail_index,
            color: palette.color(self.tail_index),
        });
        ColorLegend { lines }
    }
}

/// One row of the color legend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendLine {
    /// Block bytes in hex, or `*` padding for the tail.
    pub label: String,
    pub count: usize,
    pub index: u8,
    pub color: Rgb,
}

impl fmt::Display for LegendLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:10} #{:02X} -> #{:02X} #{:02X} #{:02X}",
            self.label, self.count, self.index, self.color.red, self.color.green, self.color.blue
        )
    }
}

/// Retained blocks first, tail summary last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorLegend {
    lines: Vec<LegendLine>,
}

impl ColorLegend {
    pub fn lines(&self) -> &[LegendLine] {
        &self.lines
    }
}

impl fmt::Display for ColorLegend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Selects the retained blocks and assigns their palette indices.
#[derive(Debug, Clone)]
pub struct PaletteBuilder<'s> {
    colors: usize,
    groups: usize,
    palette: Option<&'s [u8]>,
}

impl<'s> PaletteBuilder<'s> {
    pub fn new(colors: usize, groups: usize, palette: Option<&'s [u8]>) -> Self {
        Self { colors, groups, palette }
    }

    pub fn from_settings(settings: &'s HistogramSettings) -> Self {
        Self::new(settings.colors, settings.groups, settings.palette.as_deref())
    }

    pub fn build<'a>(&self, histogram: &BlockHistogram<'a>) -> VisionResult<ColorAssignment<'a>> {
        let max_retained = self
            .colors
            .checked_sub(1)
            .and_then(|colors| colors.checked_mul(self.groups))
            .filter(|&max| max > 0)
            .ok_or_else(|| {
                VisionError::config(format!(
                    "Cannot color with {} colors in groups of {}",
                    self.colors, self.groups
                ))
            })?;

        // --- 1. Retained list: repeating blocks, whole groups only ---
        let mut retained: Vec<HistogramEntry<'a>> = histogram
            .entries()
            .iter()
            .filter(|entry| entry.count > 1)
            .take(max_retained)
            .cloned()
            .collect();
        retained.truncate(retained.len() / self.groups * self.groups);
        if retained.is_empty() {
            return Err(VisionError::empty("Did not find any single match :-("));
        }

        // --- 2. Palette indices ---
        let (indices, tail_index) = match self.palette {
            Some(explicit) => explicit_indices(explicit, retained.len())?,
            None => implicit_indices(retained.len())?,
        };

        let slots = retained
            .iter()
            .enumerate()
            .map(|(rank, entry)| {
                let slot = if rank == 0 { ColorSlot::Leader } else { ColorSlot::Retained(rank) };
                (entry.block.bytes(), slot)
            })
            .collect();
        let tail_count =
            histogram.total_blocks() - retained.iter().map(|entry| entry.count).sum::<usize>();

        log::debug!(
            "Retained {} of {} distinct blocks; {} blocks fall into the tail (#{:02X})",
            retained.len(),
            histogram.entries().len(),
            tail_count,
            tail_index
        );

        Ok(ColorAssignment {
            retained,
            slots,
            indices,
            tail_index,
            tail_count,
        })
    }
}

/// Rank is the index; the tail keeps 255.
fn implicit_indices(retained: usize) -> VisionResult<(Vec<u8>, u8)> {
    if retained > DEFAULT_TAIL_INDEX as usize {
        return Err(VisionError::config(format!(
            "{} retained blocks do not fit below the tail index",
            retained
        )));
    }
    Ok(((0..retained).map(|rank| rank as u8).collect(), DEFAULT_TAIL_INDEX))
}

/// Leader stays at 0, rank `r` takes `palette[r]`, the tail takes the last entry.
fn explicit_indices(palette: &[u8], retained: usize) -> VisionResult<(Vec<u8>, u8)> {
    if palette.len() < retained {
        return Err(VisionError::config(format!(
            "Palette lists {} indices but {} blocks are retained",
            palette.len(),
            retained
        )));
    }
    let mut indices = Vec::with_capacity(retained);
    indices.push(0u8);
    for &index in &palette[1..retained] {
        if indices.contains(&index) {
            return Err(VisionError::config(format!(
                "Palette index #{:02X} is given to more than one retained block",
                index
            )));
        }
        indices.push(index);
    }

    let requested_tail = palette[palette.len() - 1];
    let tail_index = if !indices.contains(&requested_tail) {
        requested_tail
    } else if !indices.contains(&DEFAULT_TAIL_INDEX) {
        log::warn!(
            "Tail index #{:02X} is already used by a retained block, using #{:02X}",
            requested_tail,
            DEFAULT_TAIL_INDEX
        );
        DEFAULT_TAIL_INDEX
    } else {
        return Err(VisionError::config(format!(
            "No free tail index: #{:02X} and #{:02X} both belong to retained blocks",
            requested_tail, DEFAULT_TAIL_INDEX
        )));
    };
    Ok((indices, tail_index))
}
