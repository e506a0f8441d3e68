use crate::arch::{ self, AddrMode, DecodedOperand, FlagSet, Inst };
use crate::codegen::{ EmitCtx, IBackend, label };
use crate::error::{ Stage, TranslateResult };
use crate::memory::{ ImageRead, MemoryImage, MemoryLayout };
use crate::semantics::{ FlagEffect, IOpSemantics };

// ------------------------------------------------------------------------------------------------
// Branches and jumps
// ------------------------------------------------------------------------------------------------

/// Conditional branches: taken when `flag` is set, or when it's clear if `when_set` is false.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Branch {
	pub flag:     FlagSet,
	pub when_set: bool,
}

impl IOpSemantics for Branch {
	fn classify(&self, _inst: &Inst) -> FlagEffect {
		FlagEffect::uses(self.flag)
	}

	fn emit(&self, cx: &mut EmitCtx, inst: &Inst) -> TranslateResult<()> {
		let backend = cx.backend;
		backend.branch(cx, self.flag, self.when_set, inst.operand().value);
		Ok(())
	}
}

/// `jmp`, absolute or indirect.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Jump;

impl IOpSemantics for Jump {
	fn classify(&self, _inst: &Inst) -> FlagEffect {
		FlagEffect::NONE
	}

	/// The indirect form resolves to its final target, read through the ROM pointer.
	fn resolve(&self, img: &MemoryImage, layout: &MemoryLayout, at: u16)
	-> TranslateResult<DecodedOperand> {
		let operand = arch::resolve(img, at)?;

		if arch::lookup_desc(img.read_u8(at)).addr_mode != AddrMode::IND {
			return Ok(operand);
		}

		let target = arch::resolve_indirect(img, layout, at, operand.value, Stage::Emit)?;
		Ok(DecodedOperand { is_static: true, value: target, ..operand })
	}

	fn emit(&self, cx: &mut EmitCtx, inst: &Inst) -> TranslateResult<()> {
		let target = self.resolve(cx.img, cx.layout, inst.addr())?.value;
		cx.add_cycles(cx.cycles);
		writeln!(cx.out, "goto {};", label(target));
		Ok(())
	}
}

// ------------------------------------------------------------------------------------------------
// Subroutines
// ------------------------------------------------------------------------------------------------

/// `jsr`.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Call;

impl IOpSemantics for Call {
	fn classify(&self, _inst: &Inst) -> FlagEffect {
		FlagEffect::NONE
	}

	fn emit(&self, cx: &mut EmitCtx, inst: &Inst) -> TranslateResult<()> {
		let backend = cx.backend;
		backend.call(cx, inst.addr(), inst.operand().value);
		Ok(())
	}
}

/// `rts`, and `rti` when `interrupt` is set.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Return {
	pub interrupt: bool,
}

impl IOpSemantics for Return {
	fn classify(&self, _inst: &Inst) -> FlagEffect {
		if self.interrupt {
			FlagEffect::defs(FlagSet::all())
		} else {
			FlagEffect::NONE
		}
	}

	fn emit(&self, cx: &mut EmitCtx, _inst: &Inst) -> TranslateResult<()> {
		let backend = cx.backend;
		backend.ret(cx, self.interrupt);
		Ok(())
	}
}

/// `brk`, which ends the program.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Halt;

impl IOpSemantics for Halt {
	fn classify(&self, _inst: &Inst) -> FlagEffect {
		FlagEffect::defs(FlagSet::I)
	}

	fn emit(&self, cx: &mut EmitCtx, inst: &Inst) -> TranslateResult<()> {
		if !inst.is_terminator() {
			log::debug!("${:04X}: brk with signature ${:02X} treated as the end", inst.addr(),
				inst.operand().value);
		}

		cx.add_cycles(cx.cycles);
		writeln!(cx.out, "return 0;");
		Ok(())
	}
}
