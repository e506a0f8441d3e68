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
// Constants
// ------------------------------------------------------------------------------------------------

/// The 6502 flags that have an SREG bit of the same meaning.
const HARDWARE_FLAGS: FlagSet = FlagSet::NVZC;

/// Swaps SREG's C, which makes AVR borrow into 6502 carry and back. The labels are local, so it
/// can appear more than once in one asm statement.
const INVERT_CARRY: &str = "brcs 1f\\n\\tsec\\n\\trjmp 2f\\n1:\\tclc\\n2:";

/// Where the scratch register for saving SREG is pinned.
const TEMP_REG: &str = "r14";

// ------------------------------------------------------------------------------------------------
// Avr
// ------------------------------------------------------------------------------------------------

/// AVR-flavored C. The registers are pinned to AVR registers, C/Z/N/V live in SREG and are
/// computed by the AVR's own arithmetic instructions, and `jsr`/`rts` become `rcall`/`ret`.
/// I, D, B and U live in the `pflags` byte.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Avr;

impl Avr {
	/// Name of the SREG bit for a hardware flag.
	fn sreg_bit(flag: FlagSet) -> &'static str {
		match flag {
			FlagSet::C => "SREG_C",
			FlagSet::Z => "SREG_Z",
			FlagSet::N => "SREG_N",
			FlagSet::V => "SREG_V",
			_          => panic!("{:?} is not in SREG", flag),
		}
	}

	/// SREG mask for a set of hardware flags, as a C expression.
	fn sreg_mask(flags: FlagSet) -> String {
		let bits: Vec<_> = (flags & HARDWARE_FLAGS).iter()
			.map(|f| format!("(1 << {})", Self::sreg_bit(f)))
			.collect();

		match bits.len() {
			0 => "0".into(),
			1 => bits[0].clone(),
			_ => format!("({})", bits.join(" | ")),
		}
	}

	/// Emits the asm `body`, which may disturb `clobbers`. Any of those that are kept live across
	/// the instruction are saved around it.
	fn clobbering(&self, cx: &mut EmitCtx, clobbers: FlagSet, body: &str) {
		let saved = cx.keep() & clobbers & HARDWARE_FLAGS;

		if saved.is_empty() {
			writeln!(cx.out, "{}", body);
		} else {
			let mask = Self::sreg_mask(saved);
			writeln!(cx.out, "temp = SREG;");
			writeln!(cx.out, "{}", body);
			writeln!(cx.out, "SREG = (SREG & ~{0}) | (temp & {0});", mask);
		}
	}

	/// Sets N and Z from `reg` with `tst`, which also clears V.
	fn test_nz(&self, cx: &mut EmitCtx, value: &str) {
		if cx.needs(FlagSet::NZ) {
			let body = format!("__asm__ volatile(\"tst %0\" : : \"r\" ({}));", value);
			self.clobbering(cx, FlagSet::V, &body);
		}
	}

	/// The AVR register a 6502 register lives in.
	fn pinned_to(reg: Reg) -> &'static str {
		match reg {
			Reg::A => "r10",
			Reg::X => "r11",
			Reg::Y => "r12",
			Reg::S => "r13",
		}
	}

	fn is_hardware(flag: FlagSet) -> bool {
		HARDWARE_FLAGS.contains(flag)
	}
}

impl IBackend for Avr {
	fn name(&self) -> &'static str {
		"avr"
	}

	fn includes(&self) -> &'static [&'static str] {
		&["<avr/pgmspace.h>"]
	}

	fn helper_deps(&self, id: HelperId) -> &'static [HelperId] {
		use HelperId::*;
		match id {
			Push8     => &[Write8],
			Pull8     => &[Read8],
			Add | Sub => &[ToBcd, FromBcd],
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

			// flags are in SREG, so nothing calls this; it's here so every helper has a body.
			SetFlag => out.block("void setflag(uint8_t flag, int value)", |out| {
				writeln!(out, "if (value) pflags |= (1 << flag);");
				writeln!(out, "else pflags &= ~(1 << flag);");
			}),

			Add => out.block("uint8_t add(uint8_t a, uint8_t b)", |out| {
				writeln!(out, "uint8_t s = SREG;");
				writeln!(out, "uint8_t carry = (s >> SREG_C) & 1;");
				writeln!(out, "uint16_t wide;");
				writeln!(out, "uint8_t result;");
				writeln!(out, "s &= ~((1 << SREG_C) | (1 << SREG_Z) | (1 << SREG_N) | (1 << SREG_V));");
				out.block("if (pflags & (1 << DF))", |out| {
					writeln!(out, "wide = frombcd(a) + frombcd(b) + carry;");
					writeln!(out, "if (wide > 99) s |= (1 << SREG_C);");
					writeln!(out, "result = tobcd(wide % 100);");
				});
				out.block("else", |out| {
					writeln!(out, "wide = a + b + carry;");
					writeln!(out, "if (~(a ^ b) & (a ^ wide) & 0x80) s |= (1 << SREG_V);");
					writeln!(out, "if (wide > 0xff) s |= (1 << SREG_C);");
					writeln!(out, "result = (uint8_t) wide;");
				});
				writeln!(out, "if (result & 0x80) s |= (1 << SREG_N);");
				writeln!(out, "if (result == 0) s |= (1 << SREG_Z);");
				writeln!(out, "SREG = s;");
				writeln!(out, "return result;");
			}),

			Sub => out.block("uint8_t sub(uint8_t a, uint8_t b)", |out| {
				writeln!(out, "uint8_t s = SREG;");
				writeln!(out, "uint8_t borrow = 1 - ((s >> SREG_C) & 1);");
				writeln!(out, "int16_t wide;");
				writeln!(out, "uint8_t result;");
				writeln!(out, "s &= ~((1 << SREG_C) | (1 << SREG_Z) | (1 << SREG_N) | (1 << SREG_V));");
				out.block("if (pflags & (1 << DF))", |out| {
					writeln!(out, "wide = frombcd(a) - frombcd(b) - borrow;");
					writeln!(out, "if (wide >= 0) s |= (1 << SREG_C);");
					writeln!(out, "result = tobcd((wide + 100) % 100);");
				});
				out.block("else", |out| {
					writeln!(out, "wide = a - b - borrow;");
					writeln!(out, "if ((a ^ b) & (a ^ wide) & 0x80) s |= (1 << SREG_V);");
					writeln!(out, "if (wide >= 0) s |= (1 << SREG_C);");
					writeln!(out, "result = (uint8_t) wide;");
				});
				writeln!(out, "if (result & 0x80) s |= (1 << SREG_N);");
				writeln!(out, "if (result == 0) s |= (1 << SREG_Z);");
				writeln!(out, "SREG = s;");
				writeln!(out, "return result;");
			}),
		}
	}

	fn state_decls(&self, plan: &OutputPlan, out: &mut CodeWriter) {
		for reg in plan.registers.regs() {
			writeln!(out, "volatile register uint8_t {} asm(\"{}\");", reg, Self::pinned_to(reg));
		}

		writeln!(out, "volatile register uint8_t temp asm(\"{}\");", TEMP_REG);
		writeln!(out, "uint8_t pflags;");
	}

	fn reset_state(&self, plan: &OutputPlan, out: &mut CodeWriter) {
		reset_registers(plan.registers, out);
		writeln!(out, "pflags = (1 << UF) | (1 << IF);");
	}

	fn rom_table_decl(&self, name: &str, len: usize) -> String {
		format!("const uint8_t {}[{}] PROGMEM", name, len)
	}

	fn rom_byte(&self, table: &str, index: &str) -> String {
		format!("pgm_read_byte(&{}[{}])", table, index)
	}

	fn native_calls(&self) -> bool {
		true
	}

	fn guard_begin(&self, cx: &mut EmitCtx) {
		if cx.guarded_flags().intersects(HARDWARE_FLAGS) {
			writeln!(cx.out, "temp = SREG;");
		}
	}

	fn guard_end(&self, cx: &mut EmitCtx) {
		if cx.guarded_flags().intersects(HARDWARE_FLAGS) {
			writeln!(cx.out, "SREG = temp;");
		}
	}

	fn block_entry(&self, cx: &mut EmitCtx, addr: u16, call_target: bool) {
		if call_target {
			writeln!(cx.out, "__asm__ volatile(\"sub_{:04x}:\");", addr);
		}
	}

	fn load(&self, cx: &mut EmitCtx, reg: Reg, src: Operand) {
		writeln!(cx.out, "{} = {};", reg, src);
		self.test_nz(cx, &reg.to_string());
	}

	fn logic(&self, cx: &mut EmitCtx, op: LogicOp, src: Operand) {
		if !cx.needs(FlagSet::NZ) {
			cx.guarded(|cx| writeln!(cx.out, "ra {}= {};", logic_operator(op), src));
			return;
		}

		let insn = match op {
			LogicOp::And => "and",
			LogicOp::Or  => "or",
			LogicOp::Xor => "eor",
		};

		let body = format!("__asm__ volatile(\"{} %0, %1\" : \"+r\" (ra) : \"r\" ({}));", insn, src);
		self.clobbering(cx, FlagSet::V, &body);
	}

	fn arith(&self, cx: &mut EmitCtx, subtract: bool, src: Operand) {
		if cx.decimal {
			let id = if subtract { HelperId::Sub } else { HelperId::Add };
			cx.helper(id);
			writeln!(cx.out, "ra = {}(ra, {});", id, src);
			return;
		}

		if subtract {
			// AVR's carry is a borrow, and sbc only ever clears Z.
			writeln!(cx.out, "__asm__ volatile(\"{0}\\n\\tsez\\n\\tsbc %0, %1\\n\\t{0}\" : \"+r\" (ra) : \"r\" ({1}));",
				INVERT_CARRY, src);
		} else {
			writeln!(cx.out, "__asm__ volatile(\"adc %0, %1\" : \"+r\" (ra) : \"r\" ({}));", src);
		}
	}

	fn compare(&self, cx: &mut EmitCtx, reg: Reg, src: Operand) {
		let body = format!("__asm__ volatile(\"cp %0, %1\\n\\t{}\" : : \"r\" ({}), \"r\" ({}));",
			INVERT_CARRY, reg, src);
		self.clobbering(cx, FlagSet::V, &body);
	}

	fn bit_test(&self, cx: &mut EmitCtx, src: Operand) {
		let flags = cx.needed() & FlagSet::NVZ;

		if flags.is_empty() {
			return;
		}

		writeln!(cx.out, "temp = SREG & ~{};", Self::sreg_mask(flags));

		if flags.contains(FlagSet::Z) {
			writeln!(cx.out, "if ((ra & {}) == 0) temp |= (1 << SREG_Z);", src);
		}

		if flags.contains(FlagSet::N) {
			writeln!(cx.out, "if ({} & 0x80) temp |= (1 << SREG_N);", src);
		}

		if flags.contains(FlagSet::V) {
			writeln!(cx.out, "if ({} & 0x40) temp |= (1 << SREG_V);", src);
		}

		writeln!(cx.out, "SREG = temp;");
	}

	fn shift(&self, cx: &mut EmitCtx, op: ShiftOp, target: &str) {
		let insn = match op {
			ShiftOp::Asl => "lsl",
			ShiftOp::Lsr => "lsr",
			ShiftOp::Rol => "rol",
			ShiftOp::Ror => "ror",
		};

		let body = format!("__asm__ volatile(\"{} %0\" : \"+r\" ({}));", insn, target);
		self.clobbering(cx, FlagSet::V, &body);
	}

	fn step(&self, cx: &mut EmitCtx, target: &str, inc: bool) {
		if !cx.needs(FlagSet::NZ) {
			cx.guarded(|cx| writeln!(cx.out, "{}{};", target, if inc { "++" } else { "--" }));
			return;
		}

		let insn = if inc { "inc" } else { "dec" };
		let body = format!("__asm__ volatile(\"{} %0\" : \"+r\" ({}));", insn, target);
		self.clobbering(cx, FlagSet::V, &body);
	}

	fn set_flag(&self, cx: &mut EmitCtx, flag: FlagSet, on: bool) {
		if Self::is_hardware(flag) {
			let insn = match flag {
				FlagSet::C => if on { "sec" } else { "clc" },
				FlagSet::Z => if on { "sez" } else { "clz" },
				FlagSet::N => if on { "sen" } else { "cln" },
				_          => if on { "sev" } else { "clv" },
			};

			writeln!(cx.out, "__asm__ volatile(\"{}\");", insn);
		} else if on {
			writeln!(cx.out, "pflags |= (1 << {});", flag.const_name());
		} else {
			writeln!(cx.out, "pflags &= ~(1 << {});", flag.const_name());
		}
	}

	fn branch(&self, cx: &mut EmitCtx, flag: FlagSet, when_set: bool, target: u16) {
		let test = format!("SREG & (1 << {})", Self::sreg_bit(flag));
		let cond = if when_set { test } else { format!("!({})", test) };
		let (taken, not_taken) = (cx.cycles, cx.cycles - cx.penalty);

		writeln!(cx.out, "if ({}) {{", cond);
		cx.out.indent();
		cx.add_cycles(taken);
		writeln!(cx.out, "goto {};", label(target));
		cx.out.dedent();
		writeln!(cx.out, "}}");
		cx.add_cycles(not_taken);
	}

	fn call(&self, cx: &mut EmitCtx, _site: u16, target: u16) {
		cx.add_cycles(cx.cycles);
		writeln!(cx.out, "__asm__ volatile(\"rcall sub_{:04x}\");", target);
	}

	fn ret(&self, cx: &mut EmitCtx, interrupt: bool) {
		cx.add_cycles(cx.cycles);

		if interrupt {
			self.pull_flags(cx);
		}

		writeln!(cx.out, "__asm__ volatile(\"ret\");");
	}

	fn push_flags(&self, cx: &mut EmitCtx) {
		cx.helper(HelperId::Push8);
		writeln!(cx.out, "temp = SREG;");
		writeln!(cx.out, "val = pflags | (1 << BF) | (1 << UF);");

		for flag in HARDWARE_FLAGS.iter() {
			writeln!(cx.out, "if (temp & (1 << {})) val |= (1 << {});",
				Self::sreg_bit(flag), flag.const_name());
		}

		writeln!(cx.out, "push8(val);");
		writeln!(cx.out, "SREG = temp;");
	}

	fn pull_flags(&self, cx: &mut EmitCtx) {
		cx.helper(HelperId::Pull8);
		writeln!(cx.out, "val = pull8();");
		writeln!(cx.out, "pflags = (val & ((1 << IF) | (1 << DF))) | (1 << UF);");

		let bits: Vec<_> = HARDWARE_FLAGS.iter()
			.map(|f| format!("((val & (1 << {})) ? (1 << {}) : 0)", f.const_name(), Self::sreg_bit(f)))
			.collect();

		writeln!(cx.out, "temp = SREG;");
		writeln!(cx.out, "SREG = (temp & 0xf0) | {};", bits.join(" | "));
	}
}
