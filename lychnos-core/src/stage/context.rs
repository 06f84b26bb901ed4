//! Request mailbox for scene callbacks
//!
//! Scenes and items record intents here during a callback; the stage
//! drains and interprets them between callbacks. This indirection is
//! load-bearing: it keeps scene code from mutating the stack reentrantly
//! mid-callback.

use alloc::boxed::Box;

use super::scene::Scene;
use crate::Millis;

/// Pending requests plus the current frame timestamp.
pub struct Context {
    pub(crate) requested_push: Option<Box<dyn Scene>>,
    pub(crate) requested_pop: bool,
    pub(crate) requested_home: bool,
    pub(crate) requested_draw: bool,
    pub(crate) requested_sleep: bool,
    pub(crate) requested_wake: bool,
    pub(crate) frame_time: Millis,
}

impl Context {
    pub(crate) fn new() -> Self {
        Self {
            requested_push: None,
            requested_pop: false,
            requested_home: false,
            requested_draw: false,
            requested_sleep: false,
            requested_wake: false,
            frame_time: 0,
        }
    }

    /// Request that a scene be pushed onto the stack. Takes ownership;
    /// a later push before the stage drains this one replaces it, and
    /// the replaced scene is dropped without ever being entered.
    pub fn request_push(&mut self, scene: Box<dyn Scene>) {
        self.requested_push = Some(scene);
    }

    /// Request that the current scene be popped. Popping the root is
    /// interpreted by the stage as a request to sleep.
    pub fn request_pop(&mut self) {
        self.requested_pop = true;
    }

    /// Request a return to the root scene.
    pub fn request_home(&mut self) {
        self.requested_home = true;
    }

    /// Request a redraw. Requests coalesce into a single draw.
    pub fn request_draw(&mut self) {
        self.requested_draw = true;
    }

    /// Request that the panel go to sleep. Cancels a pending wake.
    pub fn request_sleep(&mut self) {
        self.requested_sleep = true;
        self.requested_wake = false;
    }

    /// Request that the panel wake up. Cancels a pending sleep.
    pub fn request_wake(&mut self) {
        self.requested_wake = true;
        self.requested_sleep = false;
    }

    /// Timestamp captured once per scheduling step, visible to scenes
    /// during poll and draw.
    pub fn frame_time(&self) -> Millis {
        self.frame_time
    }

    /// True if any request is waiting to be drained.
    pub(crate) fn request_pending(&self) -> bool {
        self.requested_push.is_some()
            || self.requested_pop
            || self.requested_home
            || self.requested_draw
            || self.requested_sleep
            || self.requested_wake
    }
}
