//! Menu item hierarchy
//!
//! One row within a menu scene: a static or decorated label, a
//! navigation trigger, or an editable value. Value-backed items are
//! parameterized by a get/set pair over an externally persisted value;
//! the UI never stores the value itself, it only caches the last polled
//! copy to detect external changes.

use alloc::boxed::Box;
use core::fmt::Write;
use heapless::String;

use super::rollover::add_delta_with_rollover;
use crate::color::Rgb;
use crate::stage::{Canvas, Context, Scene};

/// Column where item values start.
pub const VALUE_COL: u8 = 13;

/// Capacity of a formatted value.
pub type ValueString = String<8>;

/// Formats a raw value for display.
pub type ValueFormatter = fn(i32, &mut ValueString);

/// Builds the scene a navigation item pushes.
pub type SceneFactory = fn() -> Box<dyn Scene>;

/// Geometry and highlight state for drawing one item row.
#[derive(Debug, Clone, Copy)]
pub struct RowLayout {
    /// Row on the canvas
    pub row: u8,
    /// Total columns available
    pub cols: u8,
    /// This row is the active (highlighted) one
    pub active: bool,
    /// This row's value is being edited
    pub editing: bool,
}

/// One row within a menu.
pub trait Item {
    /// The item's label text.
    fn label(&self) -> &str;

    /// Called periodically so value-backed items can detect external
    /// changes and request a redraw.
    fn poll(&mut self, _ctx: &mut Context) {}

    /// Called when the item is clicked while active. Returns true if
    /// the item should enter edit mode.
    fn click(&mut self, _ctx: &mut Context) -> bool {
        false
    }

    /// Apply a signed delta to the item's value while editing.
    fn edit(&mut self, _ctx: &mut Context, _delta: i32) {}

    /// Draw the item's row.
    fn draw(&mut self, ctx: &mut Context, canvas: &mut Canvas<'_>, layout: RowLayout) {
        let _ = ctx;
        draw_row(self.label(), None, canvas, layout);
    }
}

/// Shared row rendering: label, optional value, highlight. The active
/// row is inverted across its full width; while editing only the value
/// region is inverted.
pub(super) fn draw_row(
    label: &str,
    value: Option<&str>,
    canvas: &mut Canvas<'_>,
    layout: RowLayout,
) {
    canvas.text(layout.row, 0, label);
    if let Some(value) = value {
        canvas.text(layout.row, VALUE_COL, value);
    }
    if layout.editing {
        canvas.invert(layout.row, VALUE_COL, layout.cols);
    } else if layout.active {
        canvas.invert(layout.row, 0, layout.cols);
    }
}

fn format_decimal(value: i32, out: &mut ValueString) {
    let _ = write!(out, "{}", value);
}

/// Decorated menu header. Clicking it leaves the menu.
pub struct TitleItem {
    label: &'static str,
}

impl TitleItem {
    pub fn new(label: &'static str) -> Self {
        Self { label }
    }
}

impl Item for TitleItem {
    fn label(&self) -> &str {
        self.label
    }

    fn click(&mut self, ctx: &mut Context) -> bool {
        ctx.request_pop();
        false
    }

    fn draw(&mut self, _ctx: &mut Context, canvas: &mut Canvas<'_>, layout: RowLayout) {
        let mut line: String<24> = String::new();
        let _ = write!(line, "= {} =", self.label);
        canvas.text(layout.row, 0, &line);
        if layout.active {
            canvas.invert(layout.row, 0, layout.cols);
        }
    }
}

/// Plain "go back" row.
pub struct BackItem {
    label: &'static str,
}

impl BackItem {
    pub fn new(label: &'static str) -> Self {
        Self { label }
    }
}

impl Item for BackItem {
    fn label(&self) -> &str {
        self.label
    }

    fn click(&mut self, ctx: &mut Context) -> bool {
        ctx.request_pop();
        false
    }
}

/// Row that pushes a child scene when clicked.
pub struct NavigateItem {
    label: &'static str,
    factory: SceneFactory,
}

impl NavigateItem {
    pub fn new(label: &'static str, factory: SceneFactory) -> Self {
        Self { label, factory }
    }
}

impl Item for NavigateItem {
    fn label(&self) -> &str {
        self.label
    }

    fn click(&mut self, ctx: &mut Context) -> bool {
        ctx.request_push((self.factory)());
        false
    }
}

/// Editable numeric value bound to external storage through a get/set
/// pair, with clamp-then-rollover editing over `[min, max]`.
pub struct NumericItem<G, S>
where
    G: Fn() -> i32,
    S: FnMut(i32),
{
    label: &'static str,
    get: G,
    set: S,
    min: i32,
    max: i32,
    step: i32,
    polled: i32,
    format: ValueFormatter,
    knob_preview: Option<fn(i32) -> Rgb>,
}

impl<G, S> NumericItem<G, S>
where
    G: Fn() -> i32,
    S: FnMut(i32),
{
    pub fn new(label: &'static str, get: G, set: S, min: i32, max: i32, step: i32) -> Self {
        let polled = get();
        Self {
            label,
            get,
            set,
            min,
            max,
            step,
            polled,
            format: format_decimal,
            knob_preview: None,
        }
    }

    /// Use a custom value formatter (e.g. "Off" for zero).
    pub fn with_format(mut self, format: ValueFormatter) -> Self {
        self.format = format;
        self
    }

    /// Preview the value on the knob LEDs while this row is active.
    pub fn with_knob_preview(mut self, preview: fn(i32) -> Rgb) -> Self {
        self.knob_preview = Some(preview);
        self
    }

    fn refresh(&mut self, ctx: &mut Context) {
        let value = (self.get)();
        if value != self.polled {
            self.polled = value;
            ctx.request_draw();
        }
    }
}

impl<G, S> Item for NumericItem<G, S>
where
    G: Fn() -> i32,
    S: FnMut(i32),
{
    fn label(&self) -> &str {
        self.label
    }

    fn poll(&mut self, ctx: &mut Context) {
        self.refresh(ctx);
    }

    fn click(&mut self, _ctx: &mut Context) -> bool {
        true
    }

    fn edit(&mut self, ctx: &mut Context, delta: i32) {
        let old = (self.get)();
        let new = add_delta_with_rollover(old, self.min, self.max, self.step, delta);
        if new != old {
            (self.set)(new);
            // Re-poll so the display matches what the setter actually kept
            self.refresh(ctx);
        }
    }

    fn draw(&mut self, _ctx: &mut Context, canvas: &mut Canvas<'_>, layout: RowLayout) {
        let value = (self.get)();
        let mut text = ValueString::new();
        (self.format)(value, &mut text);
        draw_row(self.label, Some(&text), canvas, layout);
        if layout.active {
            if let Some(preview) = self.knob_preview {
                canvas.set_knob_color(preview(value));
            }
        }
    }
}

/// An enumerated value a choice item can edit.
///
/// Ordinals run `0..=MAX_ORDINAL` in display order.
pub trait Choice: Copy + PartialEq {
    /// Ordinal of the last variant.
    const MAX_ORDINAL: u8;

    /// Variant for an ordinal in `0..=MAX_ORDINAL`.
    fn from_ordinal(ordinal: u8) -> Self;

    /// This variant's ordinal.
    fn ordinal(self) -> u8;

    /// Display string for this variant.
    fn label(self) -> &'static str;
}

/// Editable enumerated value; same edit contract as [`NumericItem`]
/// with a degenerate step of 1 over the ordinal range.
pub struct ChoiceItem<C, G, S>
where
    C: Choice,
    G: Fn() -> C,
    S: FnMut(C),
{
    label: &'static str,
    get: G,
    set: S,
    polled: C,
}

impl<C, G, S> ChoiceItem<C, G, S>
where
    C: Choice,
    G: Fn() -> C,
    S: FnMut(C),
{
    pub fn new(label: &'static str, get: G, set: S) -> Self {
        let polled = get();
        Self {
            label,
            get,
            set,
            polled,
        }
    }

    fn refresh(&mut self, ctx: &mut Context) {
        let value = (self.get)();
        if value != self.polled {
            self.polled = value;
            ctx.request_draw();
        }
    }
}

impl<C, G, S> Item for ChoiceItem<C, G, S>
where
    C: Choice,
    G: Fn() -> C,
    S: FnMut(C),
{
    fn label(&self) -> &str {
        self.label
    }

    fn poll(&mut self, ctx: &mut Context) {
        self.refresh(ctx);
    }

    fn click(&mut self, _ctx: &mut Context) -> bool {
        true
    }

    fn edit(&mut self, ctx: &mut Context, delta: i32) {
        let old = (self.get)();
        let ordinal =
            add_delta_with_rollover(old.ordinal() as i32, 0, C::MAX_ORDINAL as i32, 1, delta);
        let new = C::from_ordinal(ordinal as u8);
        if new != old {
            (self.set)(new);
            self.refresh(ctx);
        }
    }

    fn draw(&mut self, _ctx: &mut Context, canvas: &mut Canvas<'_>, layout: RowLayout) {
        draw_row(self.label, Some((self.get)().label()), canvas, layout);
    }
}
