//! A static binary translator from 6502 machine code to C, in a flavor for AVR microcontrollers
//! and a portable one.
//!
//! The usual flow is [`MemoryImage::load`], then [`Translation::analyze`], then
//! [`Translation::translate`].

pub mod arch;
pub mod codegen;
pub mod config;
mod dataflow;
pub mod error;
pub mod memory;
pub mod program;
pub mod semantics;

pub use config::*;
pub use error::*;
pub use memory::MemoryImage;
pub use program::Translation;
