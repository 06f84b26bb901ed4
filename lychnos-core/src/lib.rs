//! Board-agnostic core logic for the Lychnos lamp panel firmware
//!
//! This crate contains all panel logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (drawing surface, panel binding)
//! - Scene stack scheduler (`Stage`) with its request mailbox (`Context`)
//! - Menu scene and the editable item hierarchy
//! - Color model for the knob and strip LEDs
//! - Persisted settings schema
//!
//! Scenes and items are heap-allocated (`alloc::boxed::Box`); the firmware
//! provides the allocator.

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod color;
pub mod config;
pub mod input;
pub mod menu;
pub mod stage;
pub mod traits;

/// Millisecond timestamps from a wrapping monotonic counter.
///
/// All interval comparisons use `wrapping_sub` so they stay correct
/// across counter overflow.
pub type Millis = u32;

pub use input::{InputEvent, InputKind};
pub use menu::{Item, Menu};
pub use stage::{Canvas, Context, Scene, Stage};
pub use traits::{DrawSurface, PanelBinding};
