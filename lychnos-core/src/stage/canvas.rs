//! Drawing context handed to scenes
//!
//! Wraps the panel's drawing surface for the duration of one draw call
//! and carries the two ambient colors a scene may choose. The stage
//! resets colors to defaults before each draw and applies the final
//! values after the frame is flushed.

use crate::color::Rgb;
use crate::traits::surface::DrawSurface;

/// Default display accent color applied before every draw.
pub const DEFAULT_DISPLAY_COLOR: Rgb = Rgb::new(188, 0, 166);
/// Default knob color applied before every draw.
pub const DEFAULT_KNOB_COLOR: Rgb = Rgb::new(40, 40, 40);

/// Per-draw canvas: surface access plus ambient color selection.
pub struct Canvas<'a> {
    gfx: &'a mut dyn DrawSurface,
    display_color: Rgb,
    knob_color: Rgb,
}

impl<'a> Canvas<'a> {
    pub(crate) fn new(gfx: &'a mut dyn DrawSurface) -> Self {
        Self {
            gfx,
            display_color: DEFAULT_DISPLAY_COLOR,
            knob_color: DEFAULT_KNOB_COLOR,
        }
    }

    /// Draw text at the given row and column.
    pub fn text(&mut self, row: u8, col: u8, text: &str) {
        self.gfx.text(row, col, text);
    }

    /// Invert a column range of a row.
    pub fn invert(&mut self, row: u8, start_col: u8, end_col: u8) {
        self.gfx.invert(row, start_col, end_col);
    }

    /// Number of character columns.
    pub fn cols(&self) -> u8 {
        self.gfx.dimensions().0
    }

    /// Number of character rows.
    pub fn rows(&self) -> u8 {
        self.gfx.dimensions().1
    }

    /// Choose the display accent color for this frame.
    pub fn set_display_color(&mut self, color: Rgb) {
        self.display_color = color;
    }

    /// Choose the knob color for this frame.
    pub fn set_knob_color(&mut self, color: Rgb) {
        self.knob_color = color;
    }

    pub(crate) fn colors(&self) -> (Rgb, Rgb) {
        (self.display_color, self.knob_color)
    }
}
