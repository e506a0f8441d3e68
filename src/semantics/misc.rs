use log::warn;

use crate::arch::{ FlagSet, Inst, MetaOp };
use crate::codegen::{ EmitCtx, IBackend };
use crate::config::IllegalOpcodePolicy;
use crate::error::{ TranslateResult, UnsupportedSite };
use crate::semantics::{ FlagEffect, IOpSemantics };

// ------------------------------------------------------------------------------------------------
// Flag instructions
// ------------------------------------------------------------------------------------------------

/// `clc`, `sec`, `cld`, `sed`, `cli`, `sei`, `clv`.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct FlagOp {
	pub flag: FlagSet,
	pub set:  bool,
}

impl IOpSemantics for FlagOp {
	fn classify(&self, _inst: &Inst) -> FlagEffect {
		FlagEffect::defs(self.flag)
	}

	fn emit(&self, cx: &mut EmitCtx, _inst: &Inst) -> TranslateResult<()> {
		if cx.needs(self.flag) {
			let backend = cx.backend;
			backend.set_flag(cx, self.flag, self.set);
		}

		Ok(())
	}
}

// ------------------------------------------------------------------------------------------------
// Everything else
// ------------------------------------------------------------------------------------------------

/// `nop`, and the undocumented NOPs of every size.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Nop;

impl IOpSemantics for Nop {
	fn classify(&self, _inst: &Inst) -> FlagEffect {
		FlagEffect::NONE
	}

	fn emit(&self, _cx: &mut EmitCtx, _inst: &Inst) -> TranslateResult<()> {
		Ok(())
	}
}

/// Undocumented opcodes that do something. They aren't translated: the policy decides whether
/// that's an error or a NOP.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Illegal;

impl IOpSemantics for Illegal {
	/// Nothing is known about what they read, so they read everything.
	fn classify(&self, _inst: &Inst) -> FlagEffect {
		FlagEffect::uses(FlagSet::all())
	}

	fn emit(&self, cx: &mut EmitCtx, inst: &Inst) -> TranslateResult<()> {
		let mnemonic = inst.meta_op().mnemonic();

		if cx.illegal_ops == IllegalOpcodePolicy::Strict && cx.reachable {
			cx.unsupported.push(UnsupportedSite { at: inst.addr(), opcode: inst.desc().opcode, mnemonic });
			return Ok(());
		}

		warn!("${:04X}: unsupported opcode {} (0x{:02X}) on the {} backend, translated as {}",
			inst.addr(), mnemonic, inst.desc().opcode, cx.backend.name(),
			if inst.meta_op() == MetaOp::JAM { "a halt" } else { "a nop" });

		if inst.meta_op() == MetaOp::JAM {
			cx.add_cycles(cx.cycles);
			writeln!(cx.out, "return 0;");
		} else {
			writeln!(cx.out, "// {} skipped", mnemonic);
		}

		Ok(())
	}
}
