//! Animation evaluation for node transform channels:
//! - `KeyframeTrack`: sorted keys with linear/step interpolation, clamped
//!   extrapolation
//! - `AnimatedValue`: authored default plus an optional track per sequence
//! - `Sequence`: named clip with duration and loop flag

pub mod sequence;
pub mod tracks;
pub mod values;

pub use sequence::{AnimatedValue, Sequence};
pub use tracks::{InterpolationMode, KeyframeTrack};
pub use values::Interpolatable;
