pub mod face;
pub mod thread;

use embedded_graphics::{mono_font::MonoTextStyle, pixelcolor::Rgb565, prelude::*};
use profont::{PROFONT_12_POINT, PROFONT_14_POINT, PROFONT_18_POINT, PROFONT_24_POINT};

use crate::schedule::Instant;

pub const COLOR_BG: Rgb565 = Rgb565::BLACK;
pub const COLOR_FG: Rgb565 = Rgb565::WHITE;
pub const COLOR_ACCENT: Rgb565 = Rgb565::GREEN;

// Desaturated palette for the low-power state.
pub const COLOR_AMBIENT_FG: Rgb565 = Rgb565::CSS_LIGHT_GRAY;
pub const COLOR_AMBIENT_DIM: Rgb565 = Rgb565::CSS_GRAY;

// The ambient face drops one font size, standing in for the slight
// scale-down applied in ambient mode.
pub const TIME_STYLE_ACTIVE: MonoTextStyle<'_, Rgb565> =
    MonoTextStyle::new(&PROFONT_24_POINT, COLOR_FG);
pub const TIME_STYLE_AMBIENT: MonoTextStyle<'_, Rgb565> =
    MonoTextStyle::new(&PROFONT_18_POINT, COLOR_AMBIENT_FG);
pub const INFO_STYLE_ACTIVE: MonoTextStyle<'_, Rgb565> =
    MonoTextStyle::new(&PROFONT_14_POINT, COLOR_FG);
pub const INFO_STYLE_AMBIENT: MonoTextStyle<'_, Rgb565> =
    MonoTextStyle::new(&PROFONT_12_POINT, COLOR_AMBIENT_DIM);
pub const ACCENT_STYLE: MonoTextStyle<'_, Rgb565> =
    MonoTextStyle::new(&PROFONT_14_POINT, COLOR_ACCENT);

/// Pixels of translation head-room reserved for burn-in protection.
pub const BURN_IN_OFFSET_PX: i32 = 10;

/// Jitter in `[-BURN_IN_OFFSET_PX, BURN_IN_OFFSET_PX]` per axis, derived
/// from the refresh instant so frames stay reproducible.
pub fn burn_in_translation(instant: Instant) -> Point {
    // xorshift64, seeded with the tick instant
    let mut seed = instant.as_millis() | 1;
    let range = (2 * BURN_IN_OFFSET_PX + 1) as u64;
    let mut axes = [0i32; 2];
    for axis in &mut axes {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        *axis = (seed % range) as i32 - BURN_IN_OFFSET_PX;
    }
    Point::new(axes[0], axes[1])
}
