//! Button press classification
//!
//! Classifies a debounced button line into single clicks, double
//! clicks, and long presses. Fed raw sampled levels with timestamps;
//! a single click is only reported once the double-click window has
//! closed without a second press.

use lychnos_core::Millis;

/// Debounce time for level changes.
pub const DEBOUNCE_MS: Millis = 20;

/// Window after a release in which a second press becomes a double click.
pub const DOUBLE_CLICK_MS: Millis = 250;

/// Hold time that turns a press into a long press.
pub const LONG_PRESS_MS: Millis = 500;

/// Classified button events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonEvent {
    SingleClick,
    DoubleClick,
    LongPress,
}

#[derive(Clone, Copy, PartialEq)]
enum State {
    Idle,
    /// First press in progress
    FirstPress { since: Millis },
    /// Long press reported; waiting for release
    HeldLong,
    /// Released after a short press; a second press may arrive
    AwaitSecond { released_at: Millis },
    /// Second press in progress (double click already reported)
    SecondPress,
}

/// Time-based press classifier for one button line.
pub struct ButtonClassifier {
    raw: bool,
    raw_since: Millis,
    stable: bool,
    state: State,
}

impl ButtonClassifier {
    /// Create a classifier; the line is assumed released.
    pub fn new() -> Self {
        Self {
            raw: false,
            raw_since: 0,
            stable: false,
            state: State::Idle,
        }
    }

    /// Feed one sample of the line level (true = pressed). Should be
    /// called every few milliseconds.
    pub fn update(&mut self, pressed: bool, now: Millis) -> Option<ButtonEvent> {
        if pressed != self.raw {
            self.raw = pressed;
            self.raw_since = now;
        }
        let mut changed = false;
        if self.raw != self.stable && now.wrapping_sub(self.raw_since) >= DEBOUNCE_MS {
            self.stable = self.raw;
            changed = true;
        }

        match self.state {
            State::Idle => {
                if changed && self.stable {
                    self.state = State::FirstPress { since: now };
                }
                None
            }
            State::FirstPress { since } => {
                if !self.stable {
                    self.state = State::AwaitSecond { released_at: now };
                    None
                } else if now.wrapping_sub(since) >= LONG_PRESS_MS {
                    self.state = State::HeldLong;
                    Some(ButtonEvent::LongPress)
                } else {
                    None
                }
            }
            State::HeldLong => {
                if !self.stable {
                    self.state = State::Idle;
                }
                None
            }
            State::AwaitSecond { released_at } => {
                if changed && self.stable {
                    self.state = State::SecondPress;
                    Some(ButtonEvent::DoubleClick)
                } else if now.wrapping_sub(released_at) >= DOUBLE_CLICK_MS {
                    self.state = State::Idle;
                    Some(ButtonEvent::SingleClick)
                } else {
                    None
                }
            }
            State::SecondPress => {
                if !self.stable {
                    self.state = State::Idle;
                }
                None
            }
        }
    }

    /// True while the line is pressed (raw or debounced) or a press is
    /// still being classified. Used to veto low-power stops.
    pub fn is_busy(&self) -> bool {
        self.raw || self.stable || self.state != State::Idle
    }
}

impl Default for ButtonClassifier {
    fn default() -> Self {
        Self::new()
    }
}
