//! Scrollable, editable menu scene
//!
//! A menu is one scene kind: an ordered list of items with a highlighted
//! active row and an editing mode for value-backed items. The scroll
//! window is recomputed on every draw so the active row is always fully
//! visible.

mod item;
mod rollover;

pub use item::{
    BackItem, Choice, ChoiceItem, Item, NavigateItem, NumericItem, RowLayout, SceneFactory,
    TitleItem, ValueFormatter, ValueString, VALUE_COL,
};
pub use rollover::add_delta_with_rollover;

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::input::{InputEvent, InputKind};
use crate::stage::{Canvas, Context, Scene};

/// A scrollable list of items.
#[derive(Default)]
pub struct Menu {
    items: Vec<Box<dyn Item>>,
    scroll_top: usize,
    active_index: usize,
    editing: bool,
}

impl Menu {
    /// Create an empty menu.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            scroll_top: 0,
            active_index: 0,
            editing: false,
        }
    }

    /// Append an item; insertion order is display order.
    pub fn add_item(&mut self, item: Box<dyn Item>) {
        self.items.push(item);
    }

    /// Builder-style [`add_item`](Self::add_item).
    pub fn with(mut self, item: impl Item + 'static) -> Self {
        self.add_item(Box::new(item));
        self
    }

    /// Index of the currently active row.
    pub fn active_index(&self) -> usize {
        self.active_index
    }

    /// True while the active item's value is being edited.
    pub fn is_editing(&self) -> bool {
        self.editing
    }
}

impl Scene for Menu {
    fn poll(&mut self, ctx: &mut Context) {
        for item in &mut self.items {
            item.poll(ctx);
        }
    }

    fn input(&mut self, ctx: &mut Context, event: InputEvent) -> bool {
        if self.items.is_empty() {
            return false;
        }

        match event.kind {
            InputKind::SingleClick => {
                if self.editing {
                    self.editing = false;
                } else {
                    self.editing = self.items[self.active_index].click(ctx);
                }
                ctx.request_draw();
                true
            }
            InputKind::Rotate => {
                if self.editing {
                    self.items[self.active_index].edit(ctx, event.steps);
                    ctx.request_draw();
                } else {
                    let last = self.items.len() - 1;
                    let new_index = (self.active_index as i32)
                        .saturating_add(event.steps)
                        .clamp(0, last as i32) as usize;
                    if new_index != self.active_index {
                        self.active_index = new_index;
                        ctx.request_draw();
                    }
                }
                true
            }
            InputKind::Back | InputKind::LongPress => {
                if self.editing {
                    self.editing = false;
                    ctx.request_draw();
                    true
                } else {
                    false // bubbles up to the stage as a pop
                }
            }
            _ => false,
        }
    }

    fn draw(&mut self, ctx: &mut Context, canvas: &mut Canvas<'_>) {
        let rows = canvas.rows() as usize;
        let cols = canvas.cols();
        if rows == 0 {
            return;
        }

        // Scroll the active row into view: up immediately, down by the
        // minimum amount that keeps it fully visible.
        if self.active_index < self.scroll_top {
            self.scroll_top = self.active_index;
        } else {
            let scroll_bottom = self.scroll_top + rows - 1;
            if self.active_index > scroll_bottom {
                self.scroll_top = self.active_index + 1 - rows;
            }
        }

        let mut row = 0u8;
        for (index, item) in self.items.iter_mut().enumerate().skip(self.scroll_top) {
            if row as usize >= rows {
                break;
            }
            let active = index == self.active_index;
            item.draw(
                ctx,
                canvas,
                RowLayout {
                    row,
                    cols,
                    active,
                    editing: active && self.editing,
                },
            );
            row += 1;
        }
    }
}
