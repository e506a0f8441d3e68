use std::fmt::{ Display, Formatter, Result as FmtResult };

use log::trace;

use crate::arch::{ AddrMode, FlagSet, Inst, Reg };
use crate::codegen::{ Backend, CodeWriter, HelperId, HelperRegistry, IBackend, RomShadows };
use crate::config::IllegalOpcodePolicy;
use crate::error::UnsupportedSite;
use crate::memory::{ ImageRead, MemoryImage, MemoryLayout, Reach };

// ------------------------------------------------------------------------------------------------
// Operand
// ------------------------------------------------------------------------------------------------

/// A source value for an instruction, as it appears in the generated code.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Operand {
	/// A constant: an immediate, or a byte folded out of ROM.
	Imm(u8),
	/// A register.
	Reg(Reg),
	/// The `val` scratch variable, which was just loaded from memory.
	Val,
}

impl Display for Operand {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Operand::Imm(v) => write!(f, "0x{:02x}", v),
			Operand::Reg(r) => write!(f, "{}", r),
			Operand::Val    => write!(f, "val"),
		}
	}
}

// ------------------------------------------------------------------------------------------------
// EmitCtx
// ------------------------------------------------------------------------------------------------

/// Everything instruction semantics need to emit code: the image and memory map, the backend,
/// the output, and what the analyses said about the current block and instruction.
pub struct EmitCtx<'a> {
	pub img:     &'a MemoryImage,
	pub layout:  &'a MemoryLayout,
	pub backend: Backend,
	pub out:     CodeWriter,
	pub helpers: HelperRegistry,
	pub shadows: RomShadows,

	/// Can the program switch to decimal mode?
	pub decimal:          bool,
	/// Does any `jsr` exist? If not, `rts` has nowhere to go.
	pub has_return_sites: bool,
	pub illegal_ops:      IllegalOpcodePolicy,
	/// Illegal opcodes met in reachable code under the strict policy.
	pub unsupported:      Vec<UnsupportedSite>,

	/// Total cycles of the current block.
	pub cycles:    u32,
	/// The part of `cycles` only spent if its final branch is taken.
	pub penalty:   u32,
	/// Is the current block reachable from the entry point?
	pub reachable: bool,

	needed: FlagSet,
	keep:   FlagSet,
	reads:  FlagSet,
}

impl<'a> EmitCtx<'a> {
	pub fn new(img: &'a MemoryImage, layout: &'a MemoryLayout, backend: Backend) -> Self {
		Self {
			img,
			layout,
			backend,
			out:              CodeWriter::new(),
			helpers:          HelperRegistry::new(),
			shadows:          RomShadows::new(),
			decimal:          false,
			has_return_sites: false,
			illegal_ops:      IllegalOpcodePolicy::Strict,
			unsupported:      Vec::new(),
			cycles:           0,
			penalty:          0,
			reachable:        true,
			needed:           FlagSet::all(),
			keep:             FlagSet::empty(),
			reads:            FlagSet::empty(),
		}
	}

	// --------------------------------------------------------------------------------------------
	// Flags

	/// Sets which flags the next instruction must compute, which live flags it must leave alone,
	/// and which flags it reads itself.
	pub fn set_flag_demand(&mut self, needed: FlagSet, keep: FlagSet, reads: FlagSet) {
		self.needed = needed;
		self.keep = keep;
		self.reads = reads;
	}

	/// Must the current instruction compute any of `flags`?
	pub fn needs(&self, flags: FlagSet) -> bool {
		self.needed.intersects(flags)
	}

	/// Flags the current instruction defines and something later reads.
	pub fn needed(&self) -> FlagSet {
		self.needed
	}

	/// Flags the current instruction doesn't define but something later reads.
	pub fn keep(&self) -> FlagSet {
		self.keep
	}

	/// Flags that compiled code emitted for the current instruction must not disturb: the ones it
	/// computes or keeps, and the ones it has yet to read (like the carry into `adc`).
	pub fn guarded_flags(&self) -> FlagSet {
		self.needed | self.keep | self.reads
	}

	// --------------------------------------------------------------------------------------------
	// Helpers and guards

	/// Makes sure the helper `id` (and whatever it calls) gets defined.
	pub fn helper(&mut self, id: HelperId) {
		let backend = self.backend;

		if self.helpers.request(id, &|h| backend.helper_deps(h)) {
			trace!("helper {} requested", id);
		}
	}

	/// Emits `f`'s output between the backend's flag guards. Use around any compiler-generated
	/// code that might disturb flags kept in hardware.
	pub fn guarded(&mut self, f: impl FnOnce(&mut Self)) {
		let backend = self.backend;
		backend.guard_begin(self);
		f(self);
		backend.guard_end(self);
	}

	/// Emits `cycles += n;`, unless `n` is 0.
	pub fn add_cycles(&mut self, n: u32) {
		if n != 0 {
			self.guarded(|cx| writeln!(cx.out, "cycles += {};", n));
		}
	}

	// --------------------------------------------------------------------------------------------
	// Memory operands

	/// The C expression for the effective address of a memory operand.
	pub fn address_expr(&mut self, inst: &Inst) -> String {
		let v = inst.operand().value;

		use AddrMode::*;
		match inst.addr_mode() {
			ZPX => format!("(uint8_t) (0x{:02x} + rx)", v),
			ZPY => format!("(uint8_t) (0x{:02x} + ry)", v),
			ABX => format!("(uint16_t) (0x{:04x} + rx)", v),
			ABY => format!("(uint16_t) (0x{:04x} + ry)", v),

			IZX => {
				self.helper(HelperId::Read8);
				let hi = (v as u8).wrapping_add(1);
				format!("(uint16_t) (read8((uint8_t) (0x{:02x} + rx)) | (read8((uint8_t) (0x{:02x} + rx)) << 8))",
					v, hi)
			}

			IZY => {
				self.helper(HelperId::Read8);
				let hi = (v as u8).wrapping_add(1);
				format!("(uint16_t) ((read8(0x{:02x}) | (read8(0x{:02x}) << 8)) + ry)", v, hi)
			}

			_ => format!("0x{:04x}", v),
		}
	}

	/// Gets the value an instruction reads. Immediates and static ROM reads become constants;
	/// anything else is loaded into `val`.
	pub fn fetch(&mut self, inst: &Inst) -> Operand {
		if inst.addr_mode() == AddrMode::IMM {
			return Operand::Imm(inst.operand().value as u8);
		}

		if let Some(c) = self.folded(inst) {
			return Operand::Imm(c);
		}

		let addr = self.address_expr(inst);
		self.read_into_val(inst, &addr);
		Operand::Val
	}

	/// Stores `value` where `inst` points. Stores that can only land in ROM are dropped, but an
	/// indexed one still does its dummy read.
	pub fn store(&mut self, inst: &Inst, value: Operand) {
		let reach = match inst.reach() {
			Some(reach) => reach,
			None        => return,
		};

		if self.layout.all_immutable(reach) {
			trace!("${:04X}: store to ROM elided", inst.addr());

			if !inst.operand().is_static {
				let addr = self.address_expr(inst);
				self.shadow(reach);
				self.helper(HelperId::Read8);
				self.guarded(|cx| writeln!(cx.out, "(void) read8({});", addr));
			}

			writeln!(self.out, "// store to ROM elided");
			return;
		}

		let addr = self.address_expr(inst);
		self.helper(HelperId::Write8);
		self.guarded(|cx| writeln!(cx.out, "write8({}, {});", addr, value));
	}

	/// Read-modify-write: loads the operand into `val`, lets `modify` operate on `val`, and
	/// stores it back (unless it's in ROM, in which case only the flags come out of it).
	pub fn modify(&mut self, inst: &Inst, modify: impl FnOnce(&mut Self)) {
		let reach = inst.reach().unwrap_or(Reach::Anywhere);
		let folded = self.folded(inst);

		let addr = if inst.operand().is_static {
			self.address_expr(inst)
		} else {
			let expr = self.address_expr(inst);
			self.guarded(|cx| writeln!(cx.out, "addr = {};", expr));
			"addr".to_string()
		};

		match folded {
			Some(c) => writeln!(self.out, "val = 0x{:02x};", c),
			None    => self.read_into_val(inst, &addr),
		}

		modify(self);

		if self.layout.all_immutable(reach) {
			trace!("${:04X}: write-back to ROM elided", inst.addr());
			writeln!(self.out, "// write to ROM elided");
		} else {
			self.helper(HelperId::Write8);
			self.guarded(|cx| writeln!(cx.out, "write8({}, val);", addr));
		}
	}

	/// If `inst` reads a fixed ROM address, the byte there.
	fn folded(&self, inst: &Inst) -> Option<u8> {
		match inst.reach() {
			Some(Reach::Exact(a)) if self.layout.classify(a).is_immutable() => {
				let c = self.img.read_u8(a);
				trace!("${:04X}: read of ${:04X} folded to 0x{:02x}", inst.addr(), a, c);
				Some(c)
			}

			_ => None,
		}
	}

	fn read_into_val(&mut self, inst: &Inst, addr: &str) {
		if let Some(reach) = inst.reach() {
			self.shadow(reach);
		}

		self.helper(HelperId::Read8);
		self.guarded(|cx| writeln!(cx.out, "val = read8({});", addr));
	}

	/// Notes the ROM bytes a dynamic read could see.
	fn shadow(&mut self, reach: Reach) {
		if matches!(reach, Reach::Exact(_)) {
			return;
		}

		for (first, last) in self.layout.immutable_parts(reach) {
			self.shadows.add(first, last);
		}
	}
}
