use std::fmt::Display;

use crate::arch::{ FlagSet, Reg };
use crate::codegen::{ Backend, CodeWriter, EmitCtx, HelperId, IBackend, Operand, OutputPlan, label };
use crate::codegen::backend::{
	frombcd_body,
	logic_operator,
	pull8_body,
	push8_body,
	read8_body,
	reset_registers,
	tobcd_body,
	write8_body,
};
use crate::semantics::{ LogicOp, ShiftOp };

// ------------------------------------------------------------------------------------------------
// Portable
// ------------------------------------------------------------------------------------------------

/// Plain C. Every flag lives in the `flags` byte at its 6502 bit position, and subroutine returns
/// dispatch through a jump table keyed by call site.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Portable;

impl Portable {
	/// Emits `setflag(flag, cond);` if the flag is needed.
	fn set(&self, cx: &mut EmitCtx, flag: FlagSet, cond: impl Display) {
		if cx.needs(flag) {
			cx.helper(HelperId::SetFlag);
			writeln!(cx.out, "setflag({}, {});", flag.const_name(), cond);
		}
	}

	fn set_nz(&self, cx: &mut EmitCtx, value: &str) {
		self.set(cx, FlagSet::N, format!("{} & 0x80", value));
		self.set(cx, FlagSet::Z, format!("{} == 0", value));
	}

	fn carry() -> &'static str {
		"((flags >> CF) & 1)"
	}

	fn test(flag: FlagSet) -> String {
		format!("flags & (1 << {})", flag.const_name())
	}
}

impl IBackend for Portable {
	fn name(&self) -> &'static str {
		"c"
	}

	fn includes(&self) -> &'static [&'static str] {
		&[]
	}

	fn helper_deps(&self, id: HelperId) -> &'static [HelperId] {
		use HelperId::*;
		match id {
			Push8     => &[Write8],
			Pull8     => &[Read8],
			Add | Sub => &[SetFlag, ToBcd, FromBcd],
			_         => &[],
		}
	}

	fn helper_body(&self, id: HelperId, plan: &OutputPlan, out: &mut CodeWriter) {
		use HelperId::*;
		match id {
			Read8   => read8_body(&Backend::from(*self), plan, out),
			Write8  => write8_body(plan, out),
			Push8   => push8_body(out),
			Pull8   => pull8_body(out),
			ToBcd   => tobcd_body(out),
			FromBcd => frombcd_body(out),

			SetFlag => out.block("void setflag(uint8_t flag, int value)", |out| {
				writeln!(out, "if (value) flags |= (1 << flag);");
				writeln!(out, "else flags &= ~(1 << flag);");
			}),

			Add => out.block("uint8_t add(uint8_t a, uint8_t b)", |out| {
				writeln!(out, "uint16_t wide;");
				writeln!(out, "uint8_t result;");
				out.block("if (flags & (1 << DF))", |out| {
					writeln!(out, "wide = frombcd(a) + frombcd(b) + {};", Self::carry());
					writeln!(out, "setflag(CF, wide > 99);");
					writeln!(out, "result = tobcd(wide % 100);");
				});
				out.block("else", |out| {
					writeln!(out, "wide = a + b + {};", Self::carry());
					writeln!(out, "setflag(VF, ~(a ^ b) & (a ^ wide) & 0x80);");
					writeln!(out, "setflag(CF, wide > 0xff);");
					writeln!(out, "result = (uint8_t) wide;");
				});
				writeln!(out, "setflag(NF, result & 0x80);");
				writeln!(out, "setflag(ZF, result == 0);");
				writeln!(out, "return result;");
			}),

			Sub => out.block("uint8_t sub(uint8_t a, uint8_t b)", |out| {
				writeln!(out, "int16_t wide;");
				writeln!(out, "uint8_t result;");
				writeln!(out, "uint8_t borrow = 1 - {};", Self::carry());
				out.block("if (flags & (1 << DF))", |out| {
					writeln!(out, "wide = frombcd(a) - frombcd(b) - borrow;");
					writeln!(out, "setflag(CF, wide >= 0);");
					writeln!(out, "result = tobcd((wide + 100) % 100);");
				});
				out.block("else", |out| {
					writeln!(out, "wide = a - b - borrow;");
					writeln!(out, "setflag(VF, (a ^ b) & (a ^ wide) & 0x80);");
					writeln!(out, "setflag(CF, wide >= 0);");
					writeln!(out, "result = (uint8_t) wide;");
				});
				writeln!(out, "setflag(NF, result & 0x80);");
				writeln!(out, "setflag(ZF, result == 0);");
				writeln!(out, "return result;");
			}),
		}
	}

	fn state_decls(&self, plan: &OutputPlan, out: &mut CodeWriter) {
		let regs: Vec<_> = plan.registers.regs().map(|r| r.to_string()).collect();

		if !regs.is_empty() {
			writeln!(out, "uint8_t {};", regs.join(", "));
		}

		writeln!(out, "uint8_t flags;");
	}

	fn reset_state(&self, plan: &OutputPlan, out: &mut CodeWriter) {
		reset_registers(plan.registers, out);
		writeln!(out, "flags = (1 << UF) | (1 << IF);");
	}

	fn rom_table_decl(&self, name: &str, len: usize) -> String {
		format!("const uint8_t {}[{}]", name, len)
	}

	fn rom_byte(&self, table: &str, index: &str) -> String {
		format!("{}[{}]", table, index)
	}

	fn native_calls(&self) -> bool {
		false
	}

	fn guard_begin(&self, _cx: &mut EmitCtx) {}
	fn guard_end(&self, _cx: &mut EmitCtx) {}
	fn block_entry(&self, _cx: &mut EmitCtx, _addr: u16, _call_target: bool) {}

	fn load(&self, cx: &mut EmitCtx, reg: Reg, src: Operand) {
		writeln!(cx.out, "{} = {};", reg, src);
		self.set_nz(cx, &reg.to_string());
	}

	fn logic(&self, cx: &mut EmitCtx, op: LogicOp, src: Operand) {
		writeln!(cx.out, "ra {}= {};", logic_operator(op), src);
		self.set_nz(cx, "ra");
	}

	fn arith(&self, cx: &mut EmitCtx, subtract: bool, src: Operand) {
		if cx.decimal {
			let id = if subtract { HelperId::Sub } else { HelperId::Add };
			cx.helper(id);
			writeln!(cx.out, "ra = {}(ra, {});", id, src);
			return;
		}

		if subtract {
			writeln!(cx.out, "wide = ra - {} - (1 - {});", src, Self::carry());
			self.set(cx, FlagSet::V, format!("(ra ^ {}) & (ra ^ wide) & 0x80", src));
			self.set(cx, FlagSet::C, "wide < 0x100");
		} else {
			writeln!(cx.out, "wide = ra + {} + {};", src, Self::carry());
			self.set(cx, FlagSet::V, format!("~(ra ^ {}) & (ra ^ wide) & 0x80", src));
			self.set(cx, FlagSet::C, "wide > 0xff");
		}

		writeln!(cx.out, "ra = (uint8_t) wide;");
		self.set_nz(cx, "ra");
	}

	fn compare(&self, cx: &mut EmitCtx, reg: Reg, src: Operand) {
		self.set(cx, FlagSet::C, format!("{} >= {}", reg, src));
		self.set(cx, FlagSet::Z, format!("{} == {}", reg, src));
		self.set(cx, FlagSet::N, format!("(uint8_t) ({} - {}) & 0x80", reg, src));
	}

	fn bit_test(&self, cx: &mut EmitCtx, src: Operand) {
		self.set(cx, FlagSet::N, format!("{} & 0x80", src));
		self.set(cx, FlagSet::V, format!("{} & 0x40", src));
		self.set(cx, FlagSet::Z, format!("(ra & {}) == 0", src));
	}

	fn shift(&self, cx: &mut EmitCtx, op: ShiftOp, target: &str) {
		match op {
			ShiftOp::Asl => {
				self.set(cx, FlagSet::C, format!("{} & 0x80", target));
				writeln!(cx.out, "{} <<= 1;", target);
			}

			ShiftOp::Lsr => {
				self.set(cx, FlagSet::C, format!("{} & 0x01", target));
				writeln!(cx.out, "{} >>= 1;", target);
			}

			ShiftOp::Rol => {
				writeln!(cx.out, "wide = ({} << 1) | {};", target, Self::carry());
				self.set(cx, FlagSet::C, "wide & 0x100");
				writeln!(cx.out, "{} = (uint8_t) wide;", target);
			}

			ShiftOp::Ror => {
				writeln!(cx.out, "wide = {} | ({} << 8);", target, Self::carry());
				self.set(cx, FlagSet::C, "wide & 0x01");
				writeln!(cx.out, "{} = (uint8_t) (wide >> 1);", target);
			}
		}

		self.set_nz(cx, target);
	}

	fn step(&self, cx: &mut EmitCtx, target: &str, inc: bool) {
		writeln!(cx.out, "{}{};", target, if inc { "++" } else { "--" });
		self.set_nz(cx, target);
	}

	fn set_flag(&self, cx: &mut EmitCtx, flag: FlagSet, on: bool) {
		if on {
			writeln!(cx.out, "flags |= (1 << {});", flag.const_name());
		} else {
			writeln!(cx.out, "flags &= ~(1 << {});", flag.const_name());
		}
	}

	fn branch(&self, cx: &mut EmitCtx, flag: FlagSet, when_set: bool, target: u16) {
		let cond = if when_set {
			Self::test(flag)
		} else {
			format!("!({})", Self::test(flag))
		};

		let (taken, not_taken) = (cx.cycles, cx.cycles - cx.penalty);

		cx.out.block(format!("if ({})", cond), |out| {
			if taken != 0 {
				writeln!(out, "cycles += {};", taken);
			}

			writeln!(out, "goto {};", label(target));
		});

		cx.add_cycles(not_taken);
	}

	fn call(&self, cx: &mut EmitCtx, site: u16, target: u16) {
		let [lo, hi] = site.wrapping_add(2).to_le_bytes();
		cx.helper(HelperId::Push8);
		cx.add_cycles(cx.cycles);
		writeln!(cx.out, "push8(0x{:02x});", hi);
		writeln!(cx.out, "push8(0x{:02x});", lo);
		writeln!(cx.out, "goto {};", label(target));
	}

	fn ret(&self, cx: &mut EmitCtx, interrupt: bool) {
		cx.add_cycles(cx.cycles);

		if interrupt {
			self.pull_flags(cx);
		}

		if !cx.has_return_sites {
			writeln!(cx.out, "return 0;");
			return;
		}

		cx.helper(HelperId::Pull8);
		writeln!(cx.out, "address = pull8();");
		writeln!(cx.out, "address |= (uint16_t) pull8() << 8;");
		writeln!(cx.out, "address -= {};", if interrupt { 3 } else { 2 });
		writeln!(cx.out, "goto jump_table;");
	}

	fn push_flags(&self, cx: &mut EmitCtx) {
		cx.helper(HelperId::Push8);
		writeln!(cx.out, "push8(flags | (1 << BF) | (1 << UF));");
	}

	fn pull_flags(&self, cx: &mut EmitCtx) {
		cx.helper(HelperId::Pull8);
		writeln!(cx.out, "flags = (pull8() & ~(1 << BF)) | (1 << UF);");
	}
}
