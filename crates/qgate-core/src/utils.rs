//! Utility functions for rule implementations.

pub mod names;

#[doc(inline)]
pub use names::{is_public, last_segment, root_segment};
