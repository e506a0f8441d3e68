//! CPU architecture descriptions. Only the 6502 family is supported.

// ------------------------------------------------------------------------------------------------
// Sub-modules
// ------------------------------------------------------------------------------------------------

pub mod mos65xx;

pub use mos65xx::*;
