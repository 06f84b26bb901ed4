//! Panel binding trait
//!
//! Binds the UI runtime to the available hardware: input events, the
//! drawing surface, the ambient LEDs, and the beeper.

use crate::color::Rgb;
use crate::input::InputEvent;
use crate::traits::surface::DrawSurface;
use crate::Millis;

/// Everything the stage needs from the panel hardware.
pub trait PanelBinding {
    /// Read the next input event. Non-blocking; returns a `None`-kind
    /// event if nothing happened. At most one event per call, with
    /// rotation reported in preference to button edges.
    fn read_event(&mut self) -> InputEvent;

    /// The display's drawing surface.
    fn surface(&mut self) -> &mut dyn DrawSurface;

    /// Set the panel's ambient colors (display accent, knob).
    fn set_colors(&mut self, display: Rgb, knob: Rgb);

    /// Play a tone of finite duration on the beeper.
    fn play_tone(&mut self, freq_hz: u32, duration_ms: u32);

    /// True if no input line is pressed and no event is latched.
    /// A pressed-but-unread button vetoes low-power stop.
    fn input_idle(&self) -> bool;

    /// Current idle timeout in milliseconds; 0 disables sleeping.
    /// Read once per check so settings changes apply live.
    fn activity_timeout_ms(&self) -> Millis;
}
