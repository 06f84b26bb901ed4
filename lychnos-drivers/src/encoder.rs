//! Rotary encoder decoding
//!
//! Decodes quadrature signals from the knob wheel into signed detent
//! steps. Uses a state machine for reliable decoding with noise
//! rejection, plus an atomic accumulator so an interrupt or sampling
//! task can bank steps for the UI thread to drain.

use embedded_hal::digital::InputPin;
use portable_atomic::{AtomicI32, Ordering};

/// Decoder state machine states
#[derive(Clone, Copy, PartialEq)]
enum State {
    Idle,
    CwStep1,
    CwStep2,
    CcwStep1,
    CcwStep2,
}

/// Quadrature decoder fed sampled A/B levels.
///
/// Quadrature encoding:
/// CW:  A leads B (A changes first when rotating clockwise)
/// CCW: B leads A (B changes first when rotating counter-clockwise)
///
/// State transitions for CW rotation:
/// Idle (1,1) -> CwStep1 (0,1) -> CwStep2 (0,0) -> emit +1 -> Idle
///
/// State transitions for CCW rotation:
/// Idle (1,1) -> CcwStep1 (1,0) -> CcwStep2 (0,0) -> emit -1 -> Idle
pub struct QuadratureDecoder {
    state: State,
    last_a: bool,
    last_b: bool,
}

impl QuadratureDecoder {
    /// Create a decoder from the current A/B levels.
    pub fn new(a: bool, b: bool) -> Self {
        Self {
            state: State::Idle,
            last_a: a,
            last_b: b,
        }
    }

    /// Feed one sample of the A/B levels. Should be called every
    /// 1-5ms. Returns +1 or -1 when a full detent completes, else 0.
    pub fn update(&mut self, a: bool, b: bool) -> i32 {
        // No change
        if a == self.last_a && b == self.last_b {
            return 0;
        }

        let step = self.decode(a, b);

        self.last_a = a;
        self.last_b = b;

        step
    }

    /// [`update`](Self::update) reading directly from two input pins.
    /// Pin read errors are treated as "no change".
    pub fn update_from_pins<A, B>(&mut self, a: &mut A, b: &mut B) -> i32
    where
        A: InputPin,
        B: InputPin,
    {
        match (a.is_high(), b.is_high()) {
            (Ok(a), Ok(b)) => self.update(a, b),
            _ => 0,
        }
    }

    fn decode(&mut self, a: bool, b: bool) -> i32 {
        match self.state {
            State::Idle => {
                if !a && b {
                    // A fell first -> CW direction
                    self.state = State::CwStep1;
                } else if a && !b {
                    // B fell first -> CCW direction
                    self.state = State::CcwStep1;
                }
                0
            }
            State::CwStep1 => {
                if !a && !b {
                    // Both low -> continue CW
                    self.state = State::CwStep2;
                } else if a && b {
                    // Back to idle (noise/bounce)
                    self.state = State::Idle;
                }
                0
            }
            State::CwStep2 => {
                if a || b {
                    // Either went high -> complete CW step
                    self.state = State::Idle;
                    return 1;
                }
                0
            }
            State::CcwStep1 => {
                if !a && !b {
                    // Both low -> continue CCW
                    self.state = State::CcwStep2;
                } else if a && b {
                    // Back to idle (noise/bounce)
                    self.state = State::Idle;
                }
                0
            }
            State::CcwStep2 => {
                if a || b {
                    // Either went high -> complete CCW step
                    self.state = State::Idle;
                    return -1;
                }
                0
            }
        }
    }
}

/// Interrupt-safe accumulator for decoded steps.
///
/// The sampling context banks steps with [`add`](Self::add); the UI
/// thread drains them with [`take`](Self::take). The drain is a single
/// atomic exchange so no increment can be lost between read and clear.
pub struct RotationCounter {
    steps: AtomicI32,
}

impl RotationCounter {
    /// Create an empty counter.
    pub const fn new() -> Self {
        Self {
            steps: AtomicI32::new(0),
        }
    }

    /// Bank steps from the sampling context.
    pub fn add(&self, steps: i32) {
        if steps != 0 {
            self.steps.fetch_add(steps, Ordering::AcqRel);
        }
    }

    /// Read and clear the banked steps in one exchange.
    pub fn take(&self) -> i32 {
        self.steps.swap(0, Ordering::AcqRel)
    }

    /// True if no steps are waiting to be drained.
    pub fn is_empty(&self) -> bool {
        self.steps.load(Ordering::Acquire) == 0
    }
}

impl Default for RotationCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cw_detent_emits_plus_one() {
        let mut decoder = QuadratureDecoder::new(true, true);
        assert_eq!(decoder.update(false, true), 0);
        assert_eq!(decoder.update(false, false), 0);
        assert_eq!(decoder.update(true, false), 1);
    }

    #[test]
    fn test_ccw_detent_emits_minus_one() {
        let mut decoder = QuadratureDecoder::new(true, true);
        assert_eq!(decoder.update(true, false), 0);
        assert_eq!(decoder.update(false, false), 0);
        assert_eq!(decoder.update(false, true), -1);
    }

    #[test]
    fn test_unchanged_levels_do_nothing() {
        let mut decoder = QuadratureDecoder::new(true, true);
        for _ in 0..10 {
            assert_eq!(decoder.update(true, true), 0);
        }
    }

    #[test]
    fn test_bounce_returns_to_idle_without_step() {
        let mut decoder = QuadratureDecoder::new(true, true);
        // A dips and recovers without B ever moving
        assert_eq!(decoder.update(false, true), 0);
        assert_eq!(decoder.update(true, true), 0);
        // A full CW detent afterwards still decodes cleanly
        assert_eq!(decoder.update(false, true), 0);
        assert_eq!(decoder.update(false, false), 0);
        assert_eq!(decoder.update(true, true), 1);
    }

    #[test]
    fn test_consecutive_detents() {
        let mut decoder = QuadratureDecoder::new(true, true);
        let mut total = 0;
        for _ in 0..3 {
            total += decoder.update(false, true);
            total += decoder.update(false, false);
            total += decoder.update(true, true);
        }
        assert_eq!(total, 3);
    }

    #[test]
    fn test_counter_accumulates_and_drains_once() {
        let counter = RotationCounter::new();
        counter.add(2);
        counter.add(-1);
        counter.add(0);
        assert!(!counter.is_empty());
        assert_eq!(counter.take(), 1);
        assert_eq!(counter.take(), 0);
        assert!(counter.is_empty());
    }
}
