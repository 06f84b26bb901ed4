//! Hardware abstraction traits
//!
//! These traits define the interface between the UI runtime and the
//! panel hardware implementation.

pub mod panel;
pub mod surface;

pub use panel::PanelBinding;
pub use surface::DrawSurface;
