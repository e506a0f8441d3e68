//! What each opcode means: which flags it reads and writes, and how to emit code for it.
//!
//! Every opcode maps to an [`OpHandler`], and every handler answers the four kinds of [`Request`]
//! the pipeline makes of an instruction through the [`IOpSemantics`] methods.

use enum_dispatch::enum_dispatch;
use lazy_static::lazy_static;
use parse_display::Display;

use crate::arch::{ self, DecodedOperand, FlagSet, Inst, InstDesc, MetaOp, Reg };
use crate::codegen::EmitCtx;
use crate::error::TranslateResult;
use crate::memory::{ MemoryImage, MemoryLayout };

// ------------------------------------------------------------------------------------------------
// Sub-modules
// ------------------------------------------------------------------------------------------------

mod alu;
mod data;
mod flow;
mod misc;

#[cfg(test)]
mod tests;

pub use alu::*;
pub use data::*;
pub use flow::*;
pub use misc::*;

// ------------------------------------------------------------------------------------------------
// Request
// ------------------------------------------------------------------------------------------------

/// The things the pipeline asks of an instruction's semantics. Each one is a separate method of
/// [`IOpSemantics`]; this enum names them in diagnostics.
#[derive(Debug, Display, PartialEq, Eq, Copy, Clone)]
pub enum Request {
	#[display("classifying flags")]
	ClassifyFlags,
	#[display("computing length")]
	Length,
	#[display("resolving operand")]
	Resolve,
	#[display("emitting code")]
	Emit,
}

// ------------------------------------------------------------------------------------------------
// FlagEffect
// ------------------------------------------------------------------------------------------------

/// Which flags an instruction reads and which it unconditionally overwrites.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub struct FlagEffect {
	pub uses: FlagSet,
	pub defs: FlagSet,
}

impl FlagEffect {
	pub const NONE: FlagEffect = FlagEffect { uses: FlagSet::empty(), defs: FlagSet::empty() };

	pub fn new(uses: FlagSet, defs: FlagSet) -> Self {
		Self { uses, defs }
	}

	pub fn defs(defs: FlagSet) -> Self {
		Self { uses: FlagSet::empty(), defs }
	}

	pub fn uses(uses: FlagSet) -> Self {
		Self { uses, defs: FlagSet::empty() }
	}
}

// ------------------------------------------------------------------------------------------------
// IOpSemantics
// ------------------------------------------------------------------------------------------------

/// Trait for the semantics of a family of opcodes.
#[enum_dispatch(OpHandler)]
pub trait IOpSemantics {
	/// Answers [`Request::ClassifyFlags`]. Must not emit anything.
	fn classify(&self, inst: &Inst) -> FlagEffect;

	/// Answers [`Request::Length`]: the length in bytes of an instruction with this opcode.
	fn length(&self, desc: &InstDesc) -> usize {
		desc.len()
	}

	/// Answers [`Request::Resolve`]: decodes the operand of the instruction at `at`.
	fn resolve(&self, img: &MemoryImage, _layout: &MemoryLayout, at: u16)
	-> TranslateResult<DecodedOperand> {
		arch::resolve(img, at)
	}

	/// Answers [`Request::Emit`]: writes the target code for `inst` into `cx`.
	fn emit(&self, cx: &mut EmitCtx, inst: &Inst) -> TranslateResult<()>;
}

// ------------------------------------------------------------------------------------------------
// OpHandler
// ------------------------------------------------------------------------------------------------

/// One variant per opcode family.
#[enum_dispatch]
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum OpHandler {
	Load,
	Store,
	Transfer,
	Stack,
	Logic,
	Arith,
	Compare,
	Shift,
	Step,
	BitTest,
	Branch,
	Jump,
	Call,
	Return,
	FlagOp,
	Halt,
	Nop,
	Illegal,
}

lazy_static! {
	/// The handler for every opcode, indexed by opcode.
	pub static ref HANDLERS: Vec<OpHandler> = arch::INST_DESCS.iter().map(make_handler).collect();
}

/// The handler for an opcode.
pub fn handler_for(desc: &InstDesc) -> OpHandler {
	HANDLERS[desc.opcode as usize]
}

fn make_handler(desc: &InstDesc) -> OpHandler {
	use MetaOp::*;

	match desc.meta_op {
		LDA => Load { reg: Reg::A }.into(),
		LDX => Load { reg: Reg::X }.into(),
		LDY => Load { reg: Reg::Y }.into(),
		STA => Store { reg: Reg::A }.into(),
		STX => Store { reg: Reg::X }.into(),
		STY => Store { reg: Reg::Y }.into(),

		TAX => Transfer { from: Reg::A, to: Reg::X }.into(),
		TAY => Transfer { from: Reg::A, to: Reg::Y }.into(),
		TXA => Transfer { from: Reg::X, to: Reg::A }.into(),
		TYA => Transfer { from: Reg::Y, to: Reg::A }.into(),
		TSX => Transfer { from: Reg::S, to: Reg::X }.into(),
		TXS => Transfer { from: Reg::X, to: Reg::S }.into(),

		PHA => Stack { op: StackOp::PushA }.into(),
		PHP => Stack { op: StackOp::PushFlags }.into(),
		PLA => Stack { op: StackOp::PullA }.into(),
		PLP => Stack { op: StackOp::PullFlags }.into(),

		AND => Logic { op: LogicOp::And }.into(),
		ORA => Logic { op: LogicOp::Or }.into(),
		EOR => Logic { op: LogicOp::Xor }.into(),
		ADC => Arith { subtract: false }.into(),
		SBC => Arith { subtract: true }.into(),
		CMP => Compare { reg: Reg::A }.into(),
		CPX => Compare { reg: Reg::X }.into(),
		CPY => Compare { reg: Reg::Y }.into(),
		BIT => BitTest.into(),

		ASLA => Shift { op: ShiftOp::Asl, on_a: true }.into(),
		ASL  => Shift { op: ShiftOp::Asl, on_a: false }.into(),
		LSRA => Shift { op: ShiftOp::Lsr, on_a: true }.into(),
		LSR  => Shift { op: ShiftOp::Lsr, on_a: false }.into(),
		ROLA => Shift { op: ShiftOp::Rol, on_a: true }.into(),
		ROL  => Shift { op: ShiftOp::Rol, on_a: false }.into(),
		RORA => Shift { op: ShiftOp::Ror, on_a: true }.into(),
		ROR  => Shift { op: ShiftOp::Ror, on_a: false }.into(),

		INC => Step { target: None,         inc: true }.into(),
		DEC => Step { target: None,         inc: false }.into(),
		INX => Step { target: Some(Reg::X), inc: true }.into(),
		DEX => Step { target: Some(Reg::X), inc: false }.into(),
		INY => Step { target: Some(Reg::Y), inc: true }.into(),
		DEY => Step { target: Some(Reg::Y), inc: false }.into(),

		BCC | BCS | BEQ | BMI | BNE | BPL | BVC | BVS => {
			// every branch has a condition.
			let (flag, when_set) = desc.meta_op.branch_condition().unwrap_or((FlagSet::C, false));
			Branch { flag, when_set }.into()
		}

		JMP => Jump.into(),
		JSR => Call.into(),
		RTS => Return { interrupt: false }.into(),
		RTI => Return { interrupt: true }.into(),

		CLC => FlagOp { flag: FlagSet::C, set: false }.into(),
		SEC => FlagOp { flag: FlagSet::C, set: true }.into(),
		CLD => FlagOp { flag: FlagSet::D, set: false }.into(),
		SED => FlagOp { flag: FlagSet::D, set: true }.into(),
		CLI => FlagOp { flag: FlagSet::I, set: false }.into(),
		SEI => FlagOp { flag: FlagSet::I, set: true }.into(),
		CLV => FlagOp { flag: FlagSet::V, set: false }.into(),

		BRK => Halt.into(),
		NOP => Nop.into(),

		ALR | ANC | ARR | DCP | ISC | JAM | LAS | LAX | RLA | RRA |
		SAX | SBX | SHA | SHX | SHY | SLO | SRE | TAS | USBC | XAA => Illegal.into(),
	}
}
