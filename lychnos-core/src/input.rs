//! Input events produced by the panel hardware
//!
//! The input source reports at most one event per poll. Rotation takes
//! priority over knob button edges, and the knob button takes priority
//! over the kill button; that ordering is the input source's job.

/// Kinds of input the panel can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputKind {
    /// Nothing happened since the last poll
    None,
    /// Knob rotated; signed detent count in [`InputEvent::steps`]
    Rotate,
    /// Knob button pressed briefly
    SingleClick,
    /// Knob button pressed twice within the double-click window
    DoubleClick,
    /// Knob button held past the long-press threshold
    LongPress,
    /// Kill button clicked (leave the current scene)
    Back,
    /// Kill button held (return to the root scene)
    Home,
}

/// One discrete input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputEvent {
    /// What happened
    pub kind: InputKind,
    /// Signed detent count; nonzero only for [`InputKind::Rotate`]
    pub steps: i32,
}

impl InputEvent {
    /// The "nothing happened" event.
    pub const fn none() -> Self {
        Self {
            kind: InputKind::None,
            steps: 0,
        }
    }

    /// A button or navigation event with no rotation payload.
    pub const fn new(kind: InputKind) -> Self {
        Self { kind, steps: 0 }
    }

    /// A rotation by a signed number of detents.
    pub const fn rotate(steps: i32) -> Self {
        Self {
            kind: InputKind::Rotate,
            steps,
        }
    }

    /// Returns true if nothing happened.
    pub fn is_none(&self) -> bool {
        self.kind == InputKind::None
    }

    /// Returns true if this is a rotation event.
    pub fn is_rotation(&self) -> bool {
        self.kind == InputKind::Rotate
    }
}

impl Default for InputEvent {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_event() {
        let event = InputEvent::none();
        assert!(event.is_none());
        assert!(!event.is_rotation());
        assert_eq!(event.steps, 0);
    }

    #[test]
    fn test_rotate_event() {
        let event = InputEvent::rotate(-3);
        assert!(event.is_rotation());
        assert!(!event.is_none());
        assert_eq!(event.steps, -3);
    }

    #[test]
    fn test_button_event() {
        let event = InputEvent::new(InputKind::Back);
        assert_eq!(event.kind, InputKind::Back);
        assert_eq!(event.steps, 0);
    }
}
