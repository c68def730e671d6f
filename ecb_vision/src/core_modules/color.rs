// THEORY (Palettes):
// Every image this engine produces is an indexed image: one byte per pixel, and a
// palette of exactly 256 RGB entries that gives each byte its color. This module
// owns those palettes and the single color transform they need, HSV -> RGB.
//
// What lives here:
// - `Rgb`: a "dumb" 8-bit color triple.
// - `hsv_to_rgb`: the classic six-sector HSV conversion on normalized channels.
//   Components are truncated (not rounded) to bytes when a ramp is built.
// - `Palette`: the two fixed palettes of the tool.
//   • Histogram palette: index 0 is near-black (1,1,1) for the leader block,
//     indices 1..=254 are a 254-step hue ramp, index 255 is black for the tail.
//   • Raw palette: a 256-step hue ramp, so every byte value has its own hue.
//   Both ramps sweep hue over [0, 1) with saturation and value fixed at 0.8.

pub mod color {
    pub type Channel = u8;
    pub type Hue = f64;
    pub type Saturation = f64;
    pub type Value = f64;

    pub const PALETTE_SIZE: usize = 256;
    const RAMP_SATURATION: Saturation = 0.8;
    const RAMP_VALUE: Value = 0.8;

    /// A "dumb" data container for one 8-bit RGB color.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Rgb {
        pub red: Channel,
        pub green: Channel,
        pub blue: Channel,
    }

    impl Rgb {
        pub const fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Self { red, green, blue }
        }
    }

    /// HSV (all components in [0, 1]) to normalized RGB.
    pub fn hsv_to_rgb(hue: Hue, saturation: Saturation, value: Value) -> (f64, f64, f64) {
        if saturation == 0.0 {
            return (value, value, value);
        }
        let sector = (hue * 6.0) as i64;
        let fraction = hue * 6.0 - sector as f64;
        let p = value * (1.0 - saturation);
        let q = value * (1.0 - saturation * fraction);
        let t = value * (1.0 - saturation * (1.0 - fraction));
        match sector.rem_euclid(6) {
            0 => (value, t, p),
            1 => (q, value, p),
            2 => (p, value, t),
            3 => (p, q, value),
            4 => (t, p, value),
            _ => (value, p, q),
        }
    }

    /// `steps` evenly spaced hues starting at red.
    pub fn hue_ramp(steps: usize) -> impl Iterator<Item = Rgb> {
        (0..steps).map(move |step| {
            let (r, g, b) = hsv_to_rgb(step as f64 / steps as f64, RAMP_SATURATION, RAMP_VALUE);
            Rgb::new(to_channel(r), to_channel(g), to_channel(b))
        })
    }

    fn to_channel(normalized: f64) -> Channel {
        (normalized * 255.0) as Channel
    }

    /// A 256-entry RGB palette.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Palette {
        entries: [Rgb; PALETTE_SIZE],
    }

    impl Palette {
        /// Leader (1,1,1), a 254-step ramp, tail (0,0,0).
        pub fn histogram() -> Self {
            let mut entries = [Rgb::default(); PALETTE_SIZE];
            entries[0] = Rgb::new(1, 1, 1);
            for (slot, color) in entries[1..PALETTE_SIZE - 1]
                .iter_mut()
                .zip(hue_ramp(PALETTE_SIZE - 2))
            {
                *slot = color;
            }
            entries[PALETTE_SIZE - 1] = Rgb::new(0, 0, 0);
            Self { entries }
        }

        /// A 256-step ramp, one hue per byte value.
        pub fn raw() -> Self {
            let mut entries = [Rgb::default(); PALETTE_SIZE];
            for (slot, color) in entries.iter_mut().zip(hue_ramp(PALETTE_SIZE)) {
                *slot = color;
            }
            Self { entries }
        }

        pub fn color(&self, index: u8) -> Rgb {
            self.entries[index as usize]
        }

        pub fn entries(&self) -> &[Rgb; PALETTE_SIZE] {
            &self.entries
        }

        /// Flattened `R, G, B, R, G, B, ...`, 768 bytes, as a PLTE chunk expects.
        pub fn to_flat(&self) -> Vec<u8> {
            self.entries
                .iter()
                .flat_map(|c| [c.red, c.green, c.blue])
                .collect()
        }
    }
}
