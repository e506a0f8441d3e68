//! The two flavors of target code. Both share the runtime (memory access, stack, timer sync);
//! they differ in where the 6502 flags live and how subroutines are lowered.

use enum_dispatch::enum_dispatch;

use crate::arch::{ FlagSet, Reg, RegSet };
use crate::codegen::{ CodeWriter, EmitCtx, HelperId, Operand, OutputPlan, RomShadows };
use crate::config::BackendKind;
use crate::memory::{ MemoryRegion, Region };
use crate::semantics::{ LogicOp, ShiftOp };

// ------------------------------------------------------------------------------------------------
// Sub-modules
// ------------------------------------------------------------------------------------------------

mod avr;
mod portable;

pub use avr::*;
pub use portable::*;

// ------------------------------------------------------------------------------------------------
// IBackend
// ------------------------------------------------------------------------------------------------

/// Trait for a target code flavor. The first group of methods describes the runtime; the rest emit
/// one kind of statement into `cx.out`, honoring `cx.needed()` and `cx.keep()`.
#[enum_dispatch(Backend)]
pub trait IBackend {
	/// Short name, as used on the command line.
	fn name(&self) -> &'static str;
	/// Extra `#include`s, beyond the ones every program gets.
	fn includes(&self) -> &'static [&'static str];
	/// Helpers the body of `id` calls.
	fn helper_deps(&self, id: HelperId) -> &'static [HelperId];
	/// Writes the definition of helper `id`.
	fn helper_body(&self, id: HelperId, plan: &OutputPlan, out: &mut CodeWriter);
	/// Declares the registers in `plan.registers` and the flags.
	fn state_decls(&self, plan: &OutputPlan, out: &mut CodeWriter);
	/// Puts those registers and the flags in their power-on state.
	fn reset_state(&self, plan: &OutputPlan, out: &mut CodeWriter);
	/// Declaration of a ROM shadow table.
	fn rom_table_decl(&self, name: &str, len: usize) -> String;
	/// Expression for reading `table[index]` from a ROM shadow table.
	fn rom_byte(&self, table: &str, index: &str) -> String;
	/// Are `jsr`/`rts` lowered to the target's own call and return?
	fn native_calls(&self) -> bool;

	/// Saves whatever flags compiler-generated code could disturb.
	fn guard_begin(&self, cx: &mut EmitCtx);
	/// Restores them.
	fn guard_end(&self, cx: &mut EmitCtx);
	/// Anything that has to come right after a block's label.
	fn block_entry(&self, cx: &mut EmitCtx, addr: u16, call_target: bool);

	/// `reg = src`, setting N and Z.
	fn load(&self, cx: &mut EmitCtx, reg: Reg, src: Operand);
	/// `ra = ra <op> src`, setting N and Z.
	fn logic(&self, cx: &mut EmitCtx, op: LogicOp, src: Operand);
	/// `adc`/`sbc`.
	fn arith(&self, cx: &mut EmitCtx, subtract: bool, src: Operand);
	/// `cmp`/`cpx`/`cpy`.
	fn compare(&self, cx: &mut EmitCtx, reg: Reg, src: Operand);
	/// `bit`.
	fn bit_test(&self, cx: &mut EmitCtx, src: Operand);
	/// Shifts or rotates the variable `target` in place.
	fn shift(&self, cx: &mut EmitCtx, op: ShiftOp, target: &str);
	/// Increments or decrements the variable `target` in place.
	fn step(&self, cx: &mut EmitCtx, target: &str, inc: bool);
	/// Sets or clears a single flag.
	fn set_flag(&self, cx: &mut EmitCtx, flag: FlagSet, on: bool);
	/// Ends a block with a conditional branch, counting cycles on both paths.
	fn branch(&self, cx: &mut EmitCtx, flag: FlagSet, when_set: bool, target: u16);
	/// Calls the subroutine at `target` from the `jsr` at `site`.
	fn call(&self, cx: &mut EmitCtx, site: u16, target: u16);
	/// `rts`, or `rti` if `interrupt`.
	fn ret(&self, cx: &mut EmitCtx, interrupt: bool);
	/// `php`.
	fn push_flags(&self, cx: &mut EmitCtx);
	/// `plp`.
	fn pull_flags(&self, cx: &mut EmitCtx);
}

// ------------------------------------------------------------------------------------------------
// Backend
// ------------------------------------------------------------------------------------------------

/// One variant per target code flavor.
#[enum_dispatch]
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Backend {
	Avr,
	Portable,
}

impl Backend {
	pub fn for_kind(kind: BackendKind) -> Self {
		match kind {
			BackendKind::Avr      => Avr.into(),
			BackendKind::Portable => Portable.into(),
		}
	}
}

// ------------------------------------------------------------------------------------------------
// Shared runtime
// ------------------------------------------------------------------------------------------------

/// Label of the block at `addr`.
pub fn label(addr: u16) -> String {
	format!("L{:04x}", addr)
}

/// Turns a region name into something usable in a C identifier.
pub fn c_name(name: &str) -> String {
	name.chars().map(|c| if c.is_ascii_alphanumeric() { c } else { '_' }).collect()
}

/// Name of the array backing a RAM bank.
pub(crate) fn bank_array(r: &MemoryRegion) -> String {
	c_name(r.name).to_ascii_lowercase()
}

fn in_region(r: &MemoryRegion) -> String {
	let name = c_name(r.name).to_ascii_uppercase();
	format!("address >= {0}_MIN && address <= {0}_MAX", name)
}

/// Shared between the backends; `rom_byte` is the only part that differs.
pub(crate) fn read8_body(backend: &Backend, plan: &OutputPlan, out: &mut CodeWriter) {
	out.block("uint8_t read8(uint16_t address)", |out| {
		for r in plan.layout.regions() {
			match r.kind {
				Region::MappedIo => {
					out.block(format!("if ({})", in_region(r)), |out| {
						writeln!(out, "sync_io(0, 0);");
						writeln!(out, "return 0;");
					});
				}

				Region::SecondaryRamBank => {
					writeln!(out, "if ({}) return {}[address - {}_MIN];",
						in_region(r), bank_array(r), c_name(r.name).to_ascii_uppercase());
				}

				_ => {}
			}
		}

		writeln!(out, "if (address >= RAM_MIN && address <= RAM_MAX) return m[address - RAM_MIN];");

		for (first, last) in plan.shadows.iter() {
			let table = RomShadows::table_name(first);
			let index = format!("address - 0x{:04x}", first);
			writeln!(out, "if (address >= 0x{:04x} && address <= 0x{:04x}) return {};",
				first, last, backend.rom_byte(&table, &index));
		}

		writeln!(out, "return 0;");
	});
}

pub(crate) fn write8_body(plan: &OutputPlan, out: &mut CodeWriter) {
	out.block("void write8(uint16_t address, uint8_t value)", |out| {
		for r in plan.layout.regions() {
			match r.kind {
				Region::MappedIo => {
					out.block(format!("if ({})", in_region(r)), |out| {
						writeln!(out, "sync_io(value, 1);");
						writeln!(out, "return;");
					});
				}

				Region::SecondaryRamBank => {
					out.block(format!("if ({})", in_region(r)), |out| {
						writeln!(out, "{}[address - {}_MIN] = value;",
							bank_array(r), c_name(r.name).to_ascii_uppercase());
						writeln!(out, "return;");
					});
				}

				_ => {}
			}
		}

		writeln!(out, "if (address >= RAM_MIN && address <= RAM_MAX) m[address - RAM_MIN] = value;");
	});
}

pub(crate) fn reset_registers(regs: RegSet, out: &mut CodeWriter) {
	for reg in regs.regs() {
		let value = if reg == Reg::S { "0xfd" } else { "0" };
		writeln!(out, "{} = {};", reg, value);
	}
}

pub(crate) fn push8_body(out: &mut CodeWriter) {
	out.block("void push8(uint8_t value)", |out| {
		writeln!(out, "write8(0x0100 | rs, value);");
		writeln!(out, "rs--;");
	});
}

pub(crate) fn pull8_body(out: &mut CodeWriter) {
	out.block("uint8_t pull8(void)", |out| {
		writeln!(out, "rs++;");
		writeln!(out, "return read8(0x0100 | rs);");
	});
}

pub(crate) fn tobcd_body(out: &mut CodeWriter) {
	out.block("uint8_t tobcd(uint8_t value)", |out| {
		writeln!(out, "return ((value / 10) << 4) | (value % 10);");
	});
}

pub(crate) fn frombcd_body(out: &mut CodeWriter) {
	out.block("uint8_t frombcd(uint8_t value)", |out| {
		writeln!(out, "return (value >> 4) * 10 + (value & 0x0f);");
	});
}

/// C operator for a logic op.
pub(crate) fn logic_operator(op: LogicOp) -> &'static str {
	match op {
		LogicOp::And => "&",
		LogicOp::Or  => "|",
		LogicOp::Xor => "^",
	}
}
