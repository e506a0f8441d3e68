//! The memory image being translated, and the map that says what lives where.

// ------------------------------------------------------------------------------------------------
// Sub-modules
// ------------------------------------------------------------------------------------------------

mod image;
mod map;
mod region;

#[cfg(test)]
mod tests;

pub use image::*;
pub use map::*;
pub use region::*;
