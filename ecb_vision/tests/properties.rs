//! Property and scenario tests for the rendering stages.
//!
//! Inputs are drawn from tiny alphabets so blocks actually repeat.

use ecb_vision::config::LayoutRequest;
use ecb_vision::core_modules::dimension_resolver::{guess_width, DimensionResolver};
use ecb_vision::core_modules::histogram::BlockHistogram;
use ecb_vision::core_modules::palette_builder::PaletteBuilder;
use ecb_vision::core_modules::pixel_buffer::PixelBufferBuilder;
use ecb_vision::core_modules::raw_encoder::RawEncoder;
use ecb_vision::{RenderConfig, VisionPipeline};
use proptest::prelude::*;
use std::collections::HashSet;

fn repetitive_data() -> impl Strategy<Value = (Vec<u8>, usize)> {
    (prop::collection::vec(0u8..3, 0..600), 1usize..6)
}

/// Index of the first block equal to `bytes`.
fn first_seen(data: &[u8], blocksize: usize, bytes: &[u8]) -> usize {
    data.chunks_exact(blocksize)
        .position(|chunk| chunk == bytes)
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_counts_cover_every_full_block((data, blocksize) in repetitive_data()) {
        let histogram = BlockHistogram::build(&data, blocksize).unwrap();
        let total: usize = histogram.entries().iter().map(|entry| entry.count).sum();
        prop_assert_eq!(total, data.len() / blocksize);
        prop_assert_eq!(histogram.total_blocks(), data.len() / blocksize);
    }

    #[test]
    fn prop_histogram_is_sorted_and_stable((data, blocksize) in repetitive_data()) {
        let histogram = BlockHistogram::build(&data, blocksize).unwrap();
        for pair in histogram.entries().windows(2) {
            prop_assert!(pair[0].count >= pair[1].count);
            if pair[0].count == pair[1].count {
                prop_assert!(
                    first_seen(&data, blocksize, pair[0].block.bytes())
                        < first_seen(&data, blocksize, pair[1].block.bytes())
                );
            }
        }
    }

    #[test]
    fn prop_retained_indices_are_unique_and_avoid_the_tail(
        (data, blocksize) in repetitive_data(),
        colors in 2usize..20,
        groups in 1usize..4,
        palette in prop::option::of(prop::collection::vec(any::<u8>(), 1..24)),
    ) {
        let histogram = BlockHistogram::build(&data, blocksize).unwrap();
        let builder = PaletteBuilder::new(colors, groups, palette.as_deref());
        if let Ok(assignment) = builder.build(&histogram) {
            let retained = assignment.retained();
            prop_assert!(retained.len() <= (colors - 1) * groups);
            prop_assert_eq!(retained.len() % groups, 0);

            let mut seen = HashSet::new();
            for entry in retained {
                let index = assignment.index_of(&entry.block);
                prop_assert_ne!(index, assignment.tail_index());
                prop_assert!(seen.insert(index));
            }
        }
    }

    #[test]
    fn prop_raw_encoder_strides(
        data in prop::collection::vec(any::<u8>(), 0..300),
        pixelwidth in 1usize..8,
    ) {
        let pixels = RawEncoder::new(pixelwidth).unwrap().encode(&data);
        let floor = data.len() / pixelwidth;
        prop_assert!(pixels.len() == floor || pixels.len() == floor + 1);
        for (i, &pixel) in pixels.iter().enumerate() {
            prop_assert_eq!(pixel, data[i * pixelwidth]);
        }
    }

    #[test]
    fn prop_integral_width_fits_the_buffer(
        length in 1usize..2000,
        width in 1usize..64,
    ) {
        prop_assume!(width <= length);
        let layout = DimensionResolver::new(LayoutRequest::Width(width as f64))
            .resolve(vec![7u8; length])
            .unwrap();
        prop_assert_eq!(layout.dimensions.width, width);
        prop_assert_eq!(layout.dimensions.height, length / width);
        prop_assert!(layout.dimensions.area() <= length);
        prop_assert_eq!(layout.pixels.len(), layout.dimensions.area());
    }

    #[test]
    fn prop_guessed_width_stays_in_range(
        pixels in prop::collection::vec(0u8..4, 16..1500),
        sampling in 1usize..40,
        maxratio in 1usize..5,
    ) {
        let side = pixels.len().isqrt();
        if let Ok(width) = guess_width(&pixels, sampling, maxratio) {
            prop_assert!(width >= (side / maxratio).max(1));
            prop_assert!(width < side * maxratio);
        }
    }
}

#[test]
fn identical_blocks_paint_index_zero() {
    let data = [0x5Au8; 64];
    let histogram = BlockHistogram::build(&data, 16).unwrap();
    assert_eq!(histogram.entries().len(), 1);
    assert_eq!(histogram.entries()[0].count, 4);

    let assignment = PaletteBuilder::new(16, 1, None).build(&histogram).unwrap();
    let pixels = PixelBufferBuilder::new(16, 1).unwrap().build(&data, &assignment);
    assert_eq!(pixels.len(), 64);
    assert!(pixels.iter().all(|&index| index == 0));
}

#[test]
fn groups_drop_the_incomplete_group() {
    let mut data = Vec::new();
    for (value, repeats) in [(1u8, 5), (2, 4), (3, 3)] {
        for _ in 0..repeats {
            data.extend_from_slice(&[value; 4]);
        }
    }
    let histogram = BlockHistogram::build(&data, 4).unwrap();
    let assignment = PaletteBuilder::new(16, 2, None).build(&histogram).unwrap();
    assert_eq!(assignment.retained().len(), 2);
    assert_eq!(assignment.tail_count(), 3);
    assert_eq!(
        assignment.index_of(&histogram.entries()[2].block),
        assignment.tail_index()
    );
}

#[test]
fn raw_pixelwidth_two_takes_every_other_byte() {
    let data: Vec<u8> = (1..=8).collect();
    assert_eq!(RawEncoder::new(2).unwrap().encode(&data), vec![1, 3, 5, 7]);
}

#[test]
fn explicit_palette_keeps_leader_at_zero() {
    let data = [[9u8; 8], [9u8; 8], [4u8; 8]].concat();
    let histogram = BlockHistogram::build(&data, 8).unwrap();

    let leader_only = [0x00u8];
    let assignment = PaletteBuilder::new(2, 1, Some(&leader_only)).build(&histogram).unwrap();
    assert_eq!(assignment.index_of(&histogram.entries()[0].block), 0);
    assert_ne!(assignment.tail_index(), 0);

    let tail = [0x0Au8];
    let assignment = PaletteBuilder::new(2, 1, Some(&tail)).build(&histogram).unwrap();
    assert_eq!(assignment.index_of(&histogram.entries()[0].block), 0);
    assert_eq!(assignment.tail_index(), 0x0A);
}

#[test]
fn saved_png_decodes_to_the_rendered_size() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("cipher.bin");
    let mut data = Vec::new();
    for row in 0..32u8 {
        data.extend_from_slice(&[0xAA; 16]);
        data.extend_from_slice(&[row; 16]);
    }
    std::fs::write(&input, &data).unwrap();

    let pipeline = VisionPipeline::new(RenderConfig {
        width: Some(32.0),
        save: true,
        dontshow: true,
        ..Default::default()
    })
    .unwrap();
    let loaded = pipeline.load(&input).unwrap();
    let rendering = pipeline.render(&loaded).unwrap();
    let path = pipeline.output_path(&input, &rendering);
    assert!(path.to_string_lossy().ends_with("cipher.bin.b16_p1_c16_x32.0_y32.png"));

    rendering.image.save(&path).unwrap();
    let decoded = image::open(&path).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (32, 32));
}
