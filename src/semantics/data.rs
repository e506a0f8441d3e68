use crate::arch::{ FlagSet, Inst, Reg };
use crate::codegen::{ EmitCtx, HelperId, IBackend, Operand };
use crate::error::TranslateResult;
use crate::semantics::{ FlagEffect, IOpSemantics };

// ------------------------------------------------------------------------------------------------
// Loads and stores
// ------------------------------------------------------------------------------------------------

/// `lda`, `ldx`, `ldy`.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Load {
	pub reg: Reg,
}

impl IOpSemantics for Load {
	fn classify(&self, _inst: &Inst) -> FlagEffect {
		FlagEffect::defs(FlagSet::NZ)
	}

	fn emit(&self, cx: &mut EmitCtx, inst: &Inst) -> TranslateResult<()> {
		let backend = cx.backend;
		let src = cx.fetch(inst);
		backend.load(cx, self.reg, src);
		Ok(())
	}
}

/// `sta`, `stx`, `sty`.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Store {
	pub reg: Reg,
}

impl IOpSemantics for Store {
	fn classify(&self, _inst: &Inst) -> FlagEffect {
		FlagEffect::NONE
	}

	fn emit(&self, cx: &mut EmitCtx, inst: &Inst) -> TranslateResult<()> {
		cx.store(inst, Operand::Reg(self.reg));
		Ok(())
	}
}

/// Register to register moves. All of them but `txs` set N and Z.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Transfer {
	pub from: Reg,
	pub to:   Reg,
}

impl IOpSemantics for Transfer {
	fn classify(&self, _inst: &Inst) -> FlagEffect {
		if self.to == Reg::S {
			FlagEffect::NONE
		} else {
			FlagEffect::defs(FlagSet::NZ)
		}
	}

	fn emit(&self, cx: &mut EmitCtx, _inst: &Inst) -> TranslateResult<()> {
		if self.to == Reg::S {
			writeln!(cx.out, "{} = {};", self.to, self.from);
		} else {
			let backend = cx.backend;
			backend.load(cx, self.to, Operand::Reg(self.from));
		}

		Ok(())
	}
}

// ------------------------------------------------------------------------------------------------
// Stack
// ------------------------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum StackOp {
	PushA,
	PushFlags,
	PullA,
	PullFlags,
}

/// `pha`, `php`, `pla`, `plp`.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Stack {
	pub op: StackOp,
}

impl IOpSemantics for Stack {
	fn classify(&self, _inst: &Inst) -> FlagEffect {
		match self.op {
			StackOp::PushA     => FlagEffect::NONE,
			StackOp::PushFlags => FlagEffect::uses(FlagSet::all()),
			StackOp::PullA     => FlagEffect::defs(FlagSet::NZ),
			StackOp::PullFlags => FlagEffect::defs(FlagSet::all()),
		}
	}

	fn emit(&self, cx: &mut EmitCtx, _inst: &Inst) -> TranslateResult<()> {
		let backend = cx.backend;

		match self.op {
			StackOp::PushA => {
				cx.helper(HelperId::Push8);
				cx.guarded(|cx| writeln!(cx.out, "push8(ra);"));
			}

			StackOp::PullA => {
				cx.helper(HelperId::Pull8);
				cx.guarded(|cx| writeln!(cx.out, "val = pull8();"));
				backend.load(cx, Reg::A, Operand::Val);
			}

			StackOp::PushFlags => backend.push_flags(cx),
			StackOp::PullFlags => backend.pull_flags(cx),
		}

		Ok(())
	}
}
