//! Color model for the panel and strip LEDs
//!
//! The lamp's light is described by a tint (a hue step, with 0 meaning
//! plain white) and a brightness (0 = off, 10 = full). Conversion to
//! LED colors goes through a 256-position color wheel.

use heapless::String;
use core::fmt::Write;

/// Linear RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// All channels off.
    pub const OFF: Rgb = Rgb::new(0, 0, 0);

    /// Create a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale all channels by a fraction in `0.0..=1.0`.
    pub fn scale(self, frac: f32) -> Self {
        Self {
            r: (self.r as f32 * frac) as u8,
            g: (self.g as f32 * frac) as u8,
            b: (self.b as f32 * frac) as u8,
        }
    }

    /// Widen to RGBW with the white channel off.
    pub const fn to_rgbw(self) -> Rgbw {
        Rgbw {
            r: self.r,
            g: self.g,
            b: self.b,
            w: 0,
        }
    }
}

/// Linear RGBW color for strips with a dedicated white emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rgbw {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub w: u8,
}

impl Rgbw {
    /// All channels off.
    pub const OFF: Rgbw = Rgbw::new(0, 0, 0, 0);

    /// Create a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8, w: u8) -> Self {
        Self { r, g, b, w }
    }

    /// Scale all channels by a fraction in `0.0..=1.0`.
    pub fn scale(self, frac: f32) -> Self {
        Self {
            r: (self.r as f32 * frac) as u8,
            g: (self.g as f32 * frac) as u8,
            b: (self.b as f32 * frac) as u8,
            w: (self.w as f32 * frac) as u8,
        }
    }
}

/// Map a 0..=255 position onto a red-blue-green color wheel.
pub fn color_wheel(pos: u8) -> Rgb {
    let pos = 255 - pos;
    if pos < 85 {
        Rgb::new(255 - pos * 3, 0, pos * 3)
    } else if pos < 170 {
        let pos = pos - 85;
        Rgb::new(0, pos * 3, 255 - pos * 3)
    } else {
        let pos = pos - 170;
        Rgb::new(pos * 3, 255 - pos * 3, 0)
    }
}

/// A color tint (hue step) to apply to white light. 0 is plain white.
pub type Tint = u8;
pub const TINT_WHITE: Tint = 0;
pub const TINT_MIN: Tint = 0;
pub const TINT_MAX: Tint = 36;

/// Brightness of a light source. 0 is off.
pub type Brightness = u8;
pub const BRIGHTNESS_OFF: Brightness = 0;
pub const BRIGHTNESS_MIN: Brightness = 0;
pub const BRIGHTNESS_MAX: Brightness = 10;

/// Generate a color suitable for the panel knob LEDs.
pub fn knob_color(tint: Tint, brightness: Brightness) -> Rgb {
    let scale = brightness as f32 * 0.1;
    if tint == TINT_WHITE {
        Rgb::new(255, 255, 255).scale(scale)
    } else {
        color_wheel(wheel_position(tint)).scale(scale)
    }
}

/// Generate a color suitable for the lamp's LED strip.
pub fn strip_color(tint: Tint, brightness: Brightness) -> Rgbw {
    let scale = brightness as f32 * 0.1;
    if tint == TINT_WHITE {
        Rgbw::new(0, 0, 0, 255).scale(scale)
    } else {
        let rgb = color_wheel(wheel_position(tint)).scale(scale);
        // A little white lifts the saturated wheel colors toward pastel
        Rgbw::new(rgb.r, rgb.g, rgb.b, (255.0 * scale * 0.4) as u8)
    }
}

fn wheel_position(tint: Tint) -> u8 {
    (tint as u32 * 255 / TINT_MAX as u32) as u8
}

/// Format a tint for display ("White" for the zero tint).
pub fn format_tint(value: i32, out: &mut String<8>) {
    if value == TINT_WHITE as i32 {
        let _ = out.push_str("White");
    } else {
        let _ = write!(out, "{}", value);
    }
}

/// Format a brightness for display ("Off" for zero).
pub fn format_brightness(value: i32, out: &mut String<8>) {
    if value == BRIGHTNESS_OFF as i32 {
        let _ = out.push_str("Off");
    } else {
        let _ = write!(out, "{}", value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_wheel_endpoints() {
        // Both ends of the wheel meet at pure red
        assert_eq!(color_wheel(0), Rgb::new(255, 0, 0));
        assert_eq!(color_wheel(255), Rgb::new(255, 0, 0));
        // A third of the way around, red has faded out entirely
        let c = color_wheel(85);
        assert_eq!(c.r, 0);
    }

    #[test]
    fn test_wheel_channels_sum_constant() {
        // Each wheel segment trades one channel for another
        for pos in 0..=255u8 {
            let c = color_wheel(pos);
            let sum = c.r as u16 + c.g as u16 + c.b as u16;
            assert_eq!(sum, 255, "pos {}", pos);
        }
    }

    #[test]
    fn test_knob_color_white_tint() {
        assert_eq!(knob_color(TINT_WHITE, BRIGHTNESS_MAX), Rgb::new(255, 255, 255));
        assert_eq!(knob_color(TINT_WHITE, BRIGHTNESS_OFF), Rgb::OFF);
    }

    #[test]
    fn test_strip_color_white_uses_white_channel() {
        let c = strip_color(TINT_WHITE, BRIGHTNESS_MAX);
        assert_eq!(c, Rgbw::new(0, 0, 0, 255));
        let dimmed = strip_color(TINT_WHITE, 5);
        assert_eq!(dimmed.w, 127);
        assert_eq!((dimmed.r, dimmed.g, dimmed.b), (0, 0, 0));
    }

    #[test]
    fn test_strip_color_tinted_adds_partial_white() {
        let c = strip_color(18, BRIGHTNESS_MAX);
        assert!(c.w > 0 && c.w < 255);
        assert!(c.r > 0 || c.g > 0 || c.b > 0);
    }

    #[test]
    fn test_scale_clamps_to_zero() {
        assert_eq!(Rgb::new(10, 20, 30).scale(0.0), Rgb::OFF);
        assert_eq!(Rgbw::new(10, 20, 30, 40).scale(0.0), Rgbw::OFF);
    }

    #[test]
    fn test_format_tint() {
        let mut out: String<8> = String::new();
        format_tint(0, &mut out);
        assert_eq!(out.as_str(), "White");
        out.clear();
        format_tint(12, &mut out);
        assert_eq!(out.as_str(), "12");
    }

    #[test]
    fn test_format_brightness() {
        let mut out: String<8> = String::new();
        format_brightness(0, &mut out);
        assert_eq!(out.as_str(), "Off");
        out.clear();
        format_brightness(7, &mut out);
        assert_eq!(out.as_str(), "7");
    }
}
