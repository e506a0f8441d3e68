
use std::fmt::{ Display, Formatter, Result as FmtResult };

use err_derive::Error;
use parse_display::Display;

// ------------------------------------------------------------------------------------------------
// Stage
// ------------------------------------------------------------------------------------------------

/// The pipeline stage an error was raised in.
#[derive(Debug, Display, PartialEq, Eq, Copy, Clone)]
pub enum Stage {
	#[display("discovering control flow")]
	Discovery,
	#[display("building blocks")]
	Blocks,
	#[display("emitting code")]
	Emit,
}

// ------------------------------------------------------------------------------------------------
// UnsupportedSite
// ------------------------------------------------------------------------------------------------

/// One place where an opcode the selected backend can't translate was found.
#[derive(Debug, Display, PartialEq, Eq, Copy, Clone)]
#[display("${at:04X}: {mnemonic} (opcode 0x{opcode:02X})")]
pub struct UnsupportedSite {
	/// Address of the instruction.
	pub at:       u16,
	/// The opcode byte.
	pub opcode:   u8,
	/// Its mnemonic.
	pub mnemonic: &'static str,
}

/// A list of [`UnsupportedSite`]s, displayed one per line.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct SiteList(pub Vec<UnsupportedSite>);

impl Display for SiteList {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		for site in &self.0 {
			write!(f, "\n    {}", site)?;
		}

		Ok(())
	}
}

// ------------------------------------------------------------------------------------------------
// TranslateError
// ------------------------------------------------------------------------------------------------

/// Everything that can stop a translation run. All of these are terminal.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TranslateError {
	/// An indirect jump reads its target from a writable region, so the target can't be known.
	#[error(display = "unresolvable jump at ${:04X} (while {}): pointer ${:04X} is in {}",
		at, during, ptr, region)]
	UnresolvableJump { at: u16, ptr: u16, region: &'static str, during: Stage },

	/// One or more opcodes the backend doesn't support, under the strict policy.
	#[error(display = "{} unsupported opcode(s) on the {} backend:{}", count, backend, sites)]
	UnsupportedOpcodes { count: usize, backend: &'static str, sites: SiteList },

	/// An instruction's operand bytes run off the end of the address space.
	#[error(display = "instruction at ${:04X} needs {} bytes but runs past $FFFF", at, expected)]
	OutOfBytes { at: u16, expected: usize },

	/// Two configured memory regions overlap.
	#[error(display = "memory regions '{}' and '{}' overlap", first, second)]
	BadLayout { first: &'static str, second: &'static str },

	/// The raw image doesn't fit at the requested load offset.
	#[error(display = "an image of {} bytes does not fit at offset ${:04X}", len, offset)]
	BadImage { offset: u16, len: usize },
}

impl TranslateError {
	/// Shorthand constructors.
	pub fn unresolvable_jump(at: u16, ptr: u16, region: &'static str, during: Stage) -> Self {
		TranslateError::UnresolvableJump { at, ptr, region, during }
	}

	/// Ditto.
	pub fn unsupported(backend: &'static str, sites: Vec<UnsupportedSite>) -> Self {
		TranslateError::UnsupportedOpcodes { count: sites.len(), backend, sites: SiteList(sites) }
	}

	/// Ditto.
	pub fn out_of_bytes(at: u16, expected: usize) -> Self {
		TranslateError::OutOfBytes { at, expected }
	}
}

// ------------------------------------------------------------------------------------------------
// TranslateResult
// ------------------------------------------------------------------------------------------------

/// Alias for a `Result` with a `TranslateError` as its error type.
pub type TranslateResult<T> = Result<T, TranslateError>;
