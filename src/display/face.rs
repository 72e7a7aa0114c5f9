use core::convert::Infallible;

use embedded_canvas::Canvas;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Alignment, Text};

use crate::schedule::{DisplayMode, Interval, RefreshState};

use super::{
    ACCENT_STYLE, INFO_STYLE_ACTIVE, INFO_STYLE_AMBIENT, TIME_STYLE_ACTIVE, TIME_STYLE_AMBIENT,
};

/// The always-on watch face: big clock plus the diagnostic lines of the
/// original sample (timestamp, mode, update rate, draw count).
pub struct WatchFace {
    active_interval: Interval,
    ambient_interval: Interval,
}

impl WatchFace {
    pub fn new(active_interval: Interval, ambient_interval: Interval) -> Self {
        Self {
            active_interval,
            ambient_interval,
        }
    }

    /// Draws one frame into `canvas`; the caller places the canvas on the
    /// panel, shifted by the burn-in offset when one applies.
    pub fn draw(
        &self,
        canvas: &mut Canvas<Rgb565>,
        state: &RefreshState,
    ) -> Result<(), Infallible> {
        let ambient = state.mode.is_ambient();
        let time_style = if ambient {
            TIME_STYLE_AMBIENT
        } else {
            TIME_STYLE_ACTIVE
        };
        let info_style = if ambient {
            INFO_STYLE_AMBIENT
        } else {
            INFO_STYLE_ACTIVE
        };
        // Grayscale in ambient: the accent lines collapse into the dim style.
        let accent_style = if ambient { INFO_STYLE_AMBIENT } else { ACCENT_STYLE };

        let interval = match state.mode {
            DisplayMode::Active => self.active_interval,
            DisplayMode::Ambient { .. } => self.ambient_interval,
        };

        let size = canvas.bounding_box().size;
        let center_x = size.width as i32 / 2;
        let time_height = time_style.font.character_size.height as i32;
        let line_height = info_style.font.character_size.height as i32 + 6;

        let total = time_height + 4 * line_height;
        let mut y = (size.height as i32 - total) / 2 + time_height;

        let time_line = state.time_of_day.format("%H:%M:%S").to_string();
        Text::with_alignment(
            &time_line,
            Point::new(center_x, y),
            time_style,
            Alignment::Center,
        )
        .draw(canvas)?;

        let info_lines = [
            (
                format!("Timestamp: {}", state.instant.as_millis()),
                info_style,
            ),
            (format!("Mode: {}", state.mode.label()), accent_style),
            (
                format!("Update rate: {}s", interval.as_secs()),
                accent_style,
            ),
            (format!("Draw count: {}", state.draw_count), accent_style),
        ];
        for (line, style) in &info_lines {
            y += line_height;
            Text::with_alignment(line, Point::new(center_x, y), *style, Alignment::Center)
                .draw(canvas)?;
        }

        Ok(())
    }
}
