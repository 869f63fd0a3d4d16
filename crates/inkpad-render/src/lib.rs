//! inkpad render library
//!
//! CPU implementation of the core's [`RenderBackend`](inkpad_core::RenderBackend).

mod coverage;
mod software;

pub use software::SoftwareRenderer;
