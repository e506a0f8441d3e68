//! Knobs for a translation run.

use parse_display::Display;

use crate::memory::MemoryLayout;

// ------------------------------------------------------------------------------------------------
// BackendKind
// ------------------------------------------------------------------------------------------------

/// Which flavor of target code to produce.
#[derive(Debug, Display, PartialEq, Eq, Copy, Clone)]
pub enum BackendKind {
	/// AVR-specific C: 6502 flags live in SREG, subroutines use native `rcall`/`ret`.
	#[display("avr")]
	Avr,

	/// Plain C: flags live in a byte, subroutines dispatch through a jump table.
	#[display("c")]
	Portable,
}

// ------------------------------------------------------------------------------------------------
// IllegalOpcodePolicy
// ------------------------------------------------------------------------------------------------

/// What to do with undocumented opcodes (other than the undocumented NOPs, which are harmless).
#[derive(Debug, Display, PartialEq, Eq, Copy, Clone)]
pub enum IllegalOpcodePolicy {
	/// Fail the whole run, listing every offending instruction.
	#[display("strict")]
	Strict,

	/// Translate as a NOP of the same cost and log a warning. `JAM` halts.
	#[display("permissive")]
	Permissive,
}

// ------------------------------------------------------------------------------------------------
// TimingPolicy
// ------------------------------------------------------------------------------------------------

/// Which conditional extra cycles get counted into block totals.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct TimingPolicy {
	/// Count the taken-branch penalty: +1, or +2 when the target is on another page.
	pub branch_penalty:       bool,
	/// Assume indexed reads (`abs,X`, `abs,Y`, `(zp),Y`) always cross a page: +1.
	pub indexed_page_penalty: bool,
}

impl TimingPolicy {
	/// Best case execution time: no conditional penalties at all.
	pub const BEST_CASE: TimingPolicy =
		TimingPolicy { branch_penalty: false, indexed_page_penalty: false };

	/// Worst case execution time: every conditional penalty is assumed to apply.
	pub const WORST_CASE: TimingPolicy =
		TimingPolicy { branch_penalty: true, indexed_page_penalty: true };
}

impl Default for TimingPolicy {
	fn default() -> Self {
		TimingPolicy { branch_penalty: true, indexed_page_penalty: false }
	}
}

// ------------------------------------------------------------------------------------------------
// ScanMarkers
// ------------------------------------------------------------------------------------------------

/// Fixed addresses that change how the discovery scan walks the image.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct ScanMarkers {
	/// When the cursor reaches `.0`, continue scanning at `.1` (the I/O service routine).
	pub resume: Option<(u16, u16)>,
	/// When the cursor reaches this, stop: what follows is a data table.
	pub stop:   Option<u16>,
}

impl Default for ScanMarkers {
	fn default() -> Self {
		ScanMarkers { resume: Some((0xFE2F, 0xFEB6)), stop: Some(0xFFC6) }
	}
}

// ------------------------------------------------------------------------------------------------
// TranslateConfig
// ------------------------------------------------------------------------------------------------

/// Everything that controls a translation run.
#[derive(Debug, Clone)]
pub struct TranslateConfig {
	pub backend:     BackendKind,
	/// Use flag liveness to skip dead flag updates.
	pub optimize:    bool,
	pub timing:      TimingPolicy,
	pub illegal_ops: IllegalOpcodePolicy,
	pub scan:        ScanMarkers,
	pub layout:      MemoryLayout,
	/// Target clock cycles per 6502 cycle, used to resynchronize the timer on I/O.
	pub clock_ratio: u32,
}

impl Default for TranslateConfig {
	fn default() -> Self {
		Self {
			backend:     BackendKind::Portable,
			optimize:    true,
			timing:      TimingPolicy::default(),
			illegal_ops: IllegalOpcodePolicy::Strict,
			scan:        ScanMarkers::default(),
			layout:      MemoryLayout::default(),
			clock_ratio: 16,
		}
	}
}

impl TranslateConfig {
	pub fn with_backend(mut self, backend: BackendKind) -> Self {
		self.backend = backend;
		self
	}

	pub fn with_optimize(mut self, optimize: bool) -> Self {
		self.optimize = optimize;
		self
	}

	pub fn with_timing(mut self, timing: TimingPolicy) -> Self {
		self.timing = timing;
		self
	}

	pub fn with_illegal_ops(mut self, illegal_ops: IllegalOpcodePolicy) -> Self {
		self.illegal_ops = illegal_ops;
		self
	}

	pub fn with_scan(mut self, scan: ScanMarkers) -> Self {
		self.scan = scan;
		self
	}

	pub fn with_layout(mut self, layout: MemoryLayout) -> Self {
		self.layout = layout;
		self
	}
}
