//! Hardware-adjacent driver logic
//!
//! This crate provides the panel's input and monitoring drivers as pure,
//! host-testable state machines:
//!
//! - Quadrature encoder decoding with an interrupt-safe step counter
//! - Button press classification (single/double click, long press)
//! - Battery voltage scaling, history recording, low-battery detection
//!
//! Register access stays in the firmware crate; everything here is fed
//! sampled levels and timestamps.

#![no_std]
#![deny(unsafe_code)]

pub mod battery;
pub mod button;
pub mod encoder;

pub use battery::{BatteryHistory, HistoryStore, LowBatteryDetector, Millivolts};
pub use button::{ButtonClassifier, ButtonEvent};
pub use encoder::{QuadratureDecoder, RotationCounter};
