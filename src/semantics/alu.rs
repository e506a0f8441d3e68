use crate::arch::{ FlagSet, Inst, Reg };
use crate::codegen::{ EmitCtx, IBackend };
use crate::error::TranslateResult;
use crate::semantics::{ FlagEffect, IOpSemantics };

// ------------------------------------------------------------------------------------------------
// Logic
// ------------------------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum LogicOp {
	And,
	Or,
	Xor,
}

/// `and`, `ora`, `eor`.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Logic {
	pub op: LogicOp,
}

impl IOpSemantics for Logic {
	fn classify(&self, _inst: &Inst) -> FlagEffect {
		FlagEffect::defs(FlagSet::NZ)
	}

	fn emit(&self, cx: &mut EmitCtx, inst: &Inst) -> TranslateResult<()> {
		let backend = cx.backend;
		let src = cx.fetch(inst);
		backend.logic(cx, self.op, src);
		Ok(())
	}
}

// ------------------------------------------------------------------------------------------------
// Arithmetic
// ------------------------------------------------------------------------------------------------

/// `adc` and `sbc`. These are the only instructions that care about D.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Arith {
	pub subtract: bool,
}

impl IOpSemantics for Arith {
	fn classify(&self, _inst: &Inst) -> FlagEffect {
		FlagEffect::new(FlagSet::C | FlagSet::D, FlagSet::NVZC)
	}

	fn emit(&self, cx: &mut EmitCtx, inst: &Inst) -> TranslateResult<()> {
		let backend = cx.backend;
		let src = cx.fetch(inst);
		backend.arith(cx, self.subtract, src);
		Ok(())
	}
}

/// `cmp`, `cpx`, `cpy`.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Compare {
	pub reg: Reg,
}

impl IOpSemantics for Compare {
	fn classify(&self, _inst: &Inst) -> FlagEffect {
		FlagEffect::defs(FlagSet::NZC)
	}

	fn emit(&self, cx: &mut EmitCtx, inst: &Inst) -> TranslateResult<()> {
		let backend = cx.backend;
		let src = cx.fetch(inst);
		backend.compare(cx, self.reg, src);
		Ok(())
	}
}

/// `bit`.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct BitTest;

impl IOpSemantics for BitTest {
	fn classify(&self, _inst: &Inst) -> FlagEffect {
		FlagEffect::defs(FlagSet::NVZ)
	}

	fn emit(&self, cx: &mut EmitCtx, inst: &Inst) -> TranslateResult<()> {
		let backend = cx.backend;
		let src = cx.fetch(inst);
		backend.bit_test(cx, src);
		Ok(())
	}
}

// ------------------------------------------------------------------------------------------------
// Shifts and steps
// ------------------------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ShiftOp {
	Asl,
	Lsr,
	Rol,
	Ror,
}

impl ShiftOp {
	/// Does it shift the old carry in?
	pub fn rotates(self) -> bool {
		matches!(self, ShiftOp::Rol | ShiftOp::Ror)
	}
}

/// Shifts and rotates, on A or on memory.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Shift {
	pub op:   ShiftOp,
	pub on_a: bool,
}

impl IOpSemantics for Shift {
	fn classify(&self, _inst: &Inst) -> FlagEffect {
		if self.op.rotates() {
			FlagEffect::new(FlagSet::C, FlagSet::NZC)
		} else {
			FlagEffect::defs(FlagSet::NZC)
		}
	}

	fn emit(&self, cx: &mut EmitCtx, inst: &Inst) -> TranslateResult<()> {
		let backend = cx.backend;
		let op = self.op;

		if self.on_a {
			backend.shift(cx, op, "ra");
		} else {
			cx.modify(inst, |cx| backend.shift(cx, op, "val"));
		}

		Ok(())
	}
}

/// Increments and decrements. `target` is `None` for the memory forms.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Step {
	pub target: Option<Reg>,
	pub inc:    bool,
}

impl IOpSemantics for Step {
	fn classify(&self, _inst: &Inst) -> FlagEffect {
		FlagEffect::defs(FlagSet::NZ)
	}

	fn emit(&self, cx: &mut EmitCtx, inst: &Inst) -> TranslateResult<()> {
		let backend = cx.backend;
		let inc = self.inc;

		match self.target {
			Some(reg) => backend.step(cx, &reg.to_string(), inc),
			None      => cx.modify(inst, |cx| backend.step(cx, "val", inc)),
		}

		Ok(())
	}
}
