//! Scene trait
//!
//! A scene is one navigable screen on the stage's stack. Every hook
//! defaults to a no-op so a minimal scene implements only what it uses.
//! Scenes never call the stage directly; they communicate intent by
//! writing requests into the [`Context`] they are handed.

use super::canvas::Canvas;
use super::context::Context;
use crate::input::InputEvent;

/// One navigable screen on the scene stack.
pub trait Scene {
    /// Called after the scene is pushed onto the stack.
    fn enter(&mut self, _ctx: &mut Context) {}

    /// Called before the scene is popped off the stack.
    fn exit(&mut self, _ctx: &mut Context) {}

    /// Handle an input event. Return true if handled; unhandled Back
    /// and Home events turn into pop and home requests.
    fn input(&mut self, _ctx: &mut Context, _event: InputEvent) -> bool {
        false
    }

    /// Called periodically to check for changes and make requests on
    /// the context.
    fn poll(&mut self, _ctx: &mut Context) {}

    /// Draw the scene's contents. Only called while awake; the canvas
    /// arrives cleared with default colors.
    fn draw(&mut self, _ctx: &mut Context, _canvas: &mut Canvas<'_>) {}
}
