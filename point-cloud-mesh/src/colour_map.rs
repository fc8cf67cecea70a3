/// Quantised depth colour ramp built at compile time
use crate::constants::{COLOUR_BAND_STEPS, COLOUR_LUT_LEN};
use crate::mesh::Vec3f;

/// Five linear ramps: black to blue, blue to cyan, cyan to green,
/// green to yellow, yellow to red. Immutable and shared by every caller.
pub static COLOUR_LUT: [Vec3f; COLOUR_LUT_LEN] = build_lut();

/// Colour at `offset` steps into `band`
const fn band_colour(band: usize, offset: usize) -> Vec3f {
    let step = COLOUR_BAND_STEPS;
    let (r, g, b) = match band {
        0 => (0, 0, offset),
        1 => (0, offset, step),
        2 => (0, step, step - offset),
        3 => (offset, step, 0),
        _ => (step, step - offset, 0),
    };
    let scale = step as f32;
    Vec3f::new(r as f32 / scale, g as f32 / scale, b as f32 / scale)
}

const fn build_lut() -> [Vec3f; COLOUR_LUT_LEN] {
    let mut lut = [Vec3f::new(0.0, 0.0, 0.0); COLOUR_LUT_LEN];
    let mut i = 0;
    while i < COLOUR_LUT_LEN {
        lut[i] = band_colour(i / COLOUR_BAND_STEPS, i % COLOUR_BAND_STEPS);
        i += 1;
    }
    lut
}

/// Table step for a scalar in [0, 1]; out of range values are clamped.
pub fn lut_index(t: f32) -> usize {
    let t = t.clamp(0.0, 1.0);
    // NaN survives the clamp and saturates to 0 here.
    (t * (COLOUR_LUT_LEN - 1) as f32).round_ties_even() as usize
}

/// Map a normalised scalar to its nearest stored colour (no interpolation).
pub fn map_colour(t: f32) -> &'static Vec3f {
    &COLOUR_LUT[lut_index(t)]
}
