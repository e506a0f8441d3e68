//! Turning an analyzed program into target C source.
//!
//! The output is assembled from five sections: prolog, globals, helpers, `main` (which holds the
//! translated body), and epilog. The body is generated first, since generating it is what decides
//! which helpers and ROM shadows the other sections need.

use std::collections::BTreeSet;

use log::{ debug, trace, warn };

use crate::arch::{ FlagSet, RegSet };
use crate::error::{ TranslateError, TranslateResult };
use crate::memory::{ MemoryImage, MemoryLayout, Region };
use crate::program::{ BlockEnd, CodeBlock, Translation, liveness };
use crate::semantics::{ handler_for, IOpSemantics };

// ------------------------------------------------------------------------------------------------
// Sub-modules
// ------------------------------------------------------------------------------------------------

mod backend;
mod ctx;
mod helpers;
mod shadow;
mod writer;

#[cfg(test)]
mod tests;

pub use backend::*;
pub use ctx::*;
pub use helpers::*;
pub use shadow::*;
pub use writer::*;

// ------------------------------------------------------------------------------------------------
// OutputPlan
// ------------------------------------------------------------------------------------------------

/// What the sections around the body need to know, once the body has been generated.
pub struct OutputPlan<'a> {
	pub img:         &'a MemoryImage,
	pub layout:      &'a MemoryLayout,
	pub clock_ratio: u32,
	pub shadows:     &'a RomShadows,
	pub entry:       u16,
	/// Registers to declare and reset. All of them unless optimizing.
	pub registers:   RegSet,
}

// ------------------------------------------------------------------------------------------------
// Translator
// ------------------------------------------------------------------------------------------------

/// Generates the target program for one analyzed [`Translation`].
pub struct Translator<'s> {
	session: &'s Translation,
	backend: Backend,
}

impl<'s> Translator<'s> {
	pub fn new(session: &'s Translation) -> Self {
		Self { session, backend: Backend::for_kind(session.config().backend) }
	}

	/// Generates the whole program. Fails if, under the strict policy, reachable code contains
	/// opcodes this backend can't translate; every one of them is listed.
	pub fn run(&self) -> TranslateResult<String> {
		let s = self.session;
		let config = s.config();

		let mut cx = EmitCtx::new(s.image(), &config.layout, self.backend);
		cx.decimal = s.blocks().uses_decimal();
		cx.has_return_sites = s.blocks().return_sites().next().is_some();
		cx.illegal_ops = config.illegal_ops;

		let labels = self.plan_labels();
		cx.out.indent();
		self.emit_body(&mut cx, &labels)?;

		if !cx.unsupported.is_empty() {
			return Err(TranslateError::unsupported(self.backend.name(), cx.unsupported));
		}

		let plan = OutputPlan {
			img:         s.image(),
			layout:      &config.layout,
			clock_ratio: config.clock_ratio,
			shadows:     &cx.shadows,
			entry:       s.entry(),
			registers:   if config.optimize { s.blocks().used_registers() } else { RegSet::all() },
		};

		debug!("{} backend: {} labels, {} helpers, {} ROM bytes shadowed",
			self.backend.name(), labels.len(), cx.helpers.len(), cx.shadows.byte_count());

		let mut out = CodeWriter::new();
		self.prolog(&plan, &mut out);
		self.globals(&plan, &mut out);
		self.helpers(&plan, &cx.helpers, &mut out);
		self.main(&plan, cx.out.as_str(), &mut out);
		self.epilog(&mut out);
		Ok(out.into_string())
	}

	// --------------------------------------------------------------------------------------------
	// Labels

	/// Every address that gets a label: the leaders, plus whatever some `goto` or the jump table
	/// refers to.
	fn plan_labels(&self) -> BTreeSet<u16> {
		let blocks = self.session.blocks();
		let mut labels: BTreeSet<u16> = blocks.leaders().collect();
		let starts: Vec<u16> = blocks.iter().map(|bb| bb.start).collect();

		for (i, bb) in blocks.iter().enumerate() {
			let next_emitted = starts.get(i + 1).copied();

			match bb.term {
				BlockEnd::Cond { target, .. } | BlockEnd::Jump { target }
				| BlockEnd::Call { target, .. } => {
					labels.insert(target);
				}

				_ => {}
			}

			match bb.term {
				BlockEnd::FallThru { next } | BlockEnd::Io { next } | BlockEnd::Cond { next, .. }
				if Some(next) != next_emitted => {
					labels.insert(next);
				}

				BlockEnd::Call { ret, .. }
				if !self.backend.native_calls() || Some(ret) != next_emitted => {
					labels.insert(ret);
				}

				_ => {}
			}
		}

		labels
	}

	// --------------------------------------------------------------------------------------------
	// Body

	fn emit_body(&self, cx: &mut EmitCtx, labels: &BTreeSet<u16>) -> TranslateResult<()> {
		let s = self.session;
		let blocks: Vec<&CodeBlock> = s.blocks().iter().collect();
		let call_targets: BTreeSet<u16> = blocks.iter()
			.filter_map(|bb| match bb.term {
				BlockEnd::Call { target, .. } => Some(target),
				_                             => None,
			})
			.collect();

		let jump_table = !self.backend.native_calls() && cx.has_return_sites;

		if jump_table || blocks.first().map(|bb| bb.start) != Some(s.entry()) {
			writeln!(cx.out, "goto {};", label(s.entry()));
		}

		if jump_table {
			self.emit_jump_table(cx);
		}

		for (i, bb) in blocks.iter().enumerate() {
			let next_emitted = blocks.get(i + 1).map(|b| b.start);
			self.emit_block(cx, bb, next_emitted, labels, call_targets.contains(&bb.start))?;
		}

		// a label with nothing behind it only happens when a branch goes into undecodable bytes.
		for &addr in labels.iter().filter(|&&a| s.block(a).is_none()) {
			warn!("no code at ${:04X}; the program ends there", addr);
			cx.out.label(label(addr));
			writeln!(cx.out, "return 0;");
		}

		Ok(())
	}

	fn emit_jump_table(&self, cx: &mut EmitCtx) {
		let calls: Vec<_> = self.session.blocks().calls().collect();
		trace!("jump table with {} entries", calls.len());

		cx.out.label("jump_table");
		cx.out.block("switch (address)", |out| {
			for &(site, ret) in &calls {
				writeln!(out, "case 0x{:04x}: goto {};", site, label(ret));
			}

			writeln!(out, "default: return 0;");
		});
	}

	fn emit_block(
		&self,
		cx:           &mut EmitCtx,
		bb:           &CodeBlock,
		next_emitted: Option<u16>,
		labels:       &BTreeSet<u16>,
		call_target:  bool,
	) -> TranslateResult<()> {
		let s = self.session;
		let optimize = s.config().optimize;

		if labels.contains(&bb.start) {
			cx.out.label(label(bb.start));
		}

		cx.cycles = bb.cycles;
		cx.penalty = bb.branch_penalty;
		cx.reachable = s.is_reachable(bb.start);
		self.backend.block_entry(cx, bb.start, call_target);

		let live = liveness::live_after(bb);
		let last = bb.insts.len() - 1;

		for (i, inst) in bb.insts.iter().enumerate() {
			let (needed, keep) = if optimize {
				(bb.defs[i] & live[i], live[i] & !bb.defs[i])
			} else {
				(bb.defs[i], FlagSet::all() & !bb.defs[i])
			};

			cx.set_flag_demand(needed, keep, bb.uses[i]);
			writeln!(cx.out, "// ${:04X}: {}", inst.addr(), inst);

			let handler = handler_for(inst.desc());
			let operand = handler.resolve(s.image(), &s.config().layout, inst.addr())?;
			debug_assert_eq!(operand.length as usize, handler.length(inst.desc()));
			trace!("${:04X}: {:?} needs {:?}, keeps {:?}", inst.addr(), handler, needed, keep);

			if i == last {
				if let BlockEnd::Io { .. } = bb.term {
					cx.add_cycles(bb.cycles_before_term());
				}
			}

			handler.emit(cx, inst)?;
		}

		let keep = if optimize { bb.live_out } else { FlagSet::all() };
		cx.set_flag_demand(FlagSet::empty(), keep, FlagSet::empty());

		let fall_to = match bb.term {
			BlockEnd::Io { next } => {
				cx.add_cycles(bb.term_cost());
				Some(next)
			}

			BlockEnd::FallThru { next } => {
				cx.add_cycles(bb.cycles);
				Some(next)
			}

			BlockEnd::Cond { next, .. } => Some(next),
			BlockEnd::Call { ret, .. } if self.backend.native_calls() => Some(ret),

			BlockEnd::DeadEnd => {
				cx.add_cycles(bb.cycles);
				writeln!(cx.out, "return 0;");
				None
			}

			// the last instruction already left the block.
			_ => None,
		};

		if let Some(next) = fall_to {
			if next_emitted != Some(next) {
				writeln!(cx.out, "goto {};", label(next));
			}
		}

		Ok(())
	}

	// --------------------------------------------------------------------------------------------
	// Sections

	fn prolog(&self, plan: &OutputPlan, out: &mut CodeWriter) {
		writeln!(out, "// translated from a 6502 image, entry ${:04X}, by sbt65 ({} backend)",
			plan.entry, self.backend.name());
		writeln!(out, "#include <stdint.h>");
		writeln!(out, "#include <avr/io.h>");
		writeln!(out, "#include <avr/interrupt.h>");

		for inc in self.backend.includes() {
			writeln!(out, "#include {}", inc);
		}

		writeln!(out, "#include \"serialCom.h\"");
		out.blank();

		for r in plan.layout.regions() {
			let name = c_name(r.name).to_ascii_uppercase();
			writeln!(out, "#define {}_MIN 0x{:04x}", name, r.base);
			writeln!(out, "#define {}_MAX 0x{:04x}", name, r.end);
		}

		let ram = plan.layout.ram_window();
		writeln!(out, "#define RAM_MIN 0x{:04x}", ram.base);
		writeln!(out, "#define RAM_MAX 0x{:04x}", ram.end);
		writeln!(out, "#define CLOCK_RATIO {}", plan.clock_ratio);
		out.blank();

		for flag in FlagSet::EACH.iter() {
			writeln!(out, "#define {} {}", flag.const_name(), flag.bit());
		}

		out.blank();
	}

	fn globals(&self, plan: &OutputPlan, out: &mut CodeWriter) {
		self.backend.state_decls(plan, out);
		writeln!(out, "volatile uint8_t wait, ioValue, io, overflow;");
		writeln!(out, "volatile uint32_t cycles;");
		writeln!(out, "uint8_t m[{}];", plan.layout.ram_window().len());

		for r in plan.layout.regions().filter(|r| r.kind == Region::SecondaryRamBank) {
			writeln!(out, "uint8_t {}[{}];", bank_array(r), r.len());
		}

		for (first, last) in plan.shadows.iter() {
			let len = (last - first) as usize + 1;
			let decl = self.backend.rom_table_decl(&RomShadows::table_name(first), len);
			let bytes: Vec<u8> = RomShadows::bytes(plan.img, first, last).collect();

			out.blank();
			writeln!(out, "{} = {{", decl);
			out.indent();

			for line in bytes.chunks(16) {
				let line: Vec<_> = line.iter().map(|b| format!("0x{:02x}", b)).collect();
				writeln!(out, "{},", line.join(", "));
			}

			out.dedent();
			writeln!(out, "}};");
		}

		out.blank();
		out.block("void set_up_timer(uint16_t start)", |out| {
			writeln!(out, "TCCR1A = 0;");
			writeln!(out, "TCCR1B = (1 << CS10);");
			writeln!(out, "TCNT1 = start;");
			writeln!(out, "TIMSK1 = (1 << TOIE1);");
		});

		out.blank();
		out.block("void sync_io(uint8_t value, uint8_t is_write)", |out| {
			writeln!(out, "uint32_t ticks = cycles * CLOCK_RATIO;");
			writeln!(out, "uint16_t low = (uint16_t) (ticks & 0xffff);");
			writeln!(out, "cycles = 0;");
			writeln!(out, "while (wait) {{ }}");
			writeln!(out, "ioValue = value;");
			writeln!(out, "io = is_write;");
			writeln!(out, "overflow = (uint8_t) (ticks >> 16);");

			// TCNT1 = 0 is a full period, so an exact multiple of it takes one overflow off, and
			// nothing at all expires on the next tick.
			out.block("if (low == 0)", |out| {
				writeln!(out, "if (overflow) overflow--;");
				writeln!(out, "else low = 1;");
			});

			writeln!(out, "wait = 1;");
			writeln!(out, "set_up_timer((uint16_t) (0x10000 - low));");
		});

		out.blank();
	}

	fn helpers(&self, plan: &OutputPlan, helpers: &HelperRegistry, out: &mut CodeWriter) {
		for id in helpers.iter() {
			self.backend.helper_body(id, plan, out);
			out.blank();
		}
	}

	fn main(&self, plan: &OutputPlan, body: &str, out: &mut CodeWriter) {
		writeln!(out, "int main(void) {{");
		out.indent();
		writeln!(out, "uint8_t val;");
		writeln!(out, "uint16_t addr;");
		writeln!(out, "uint16_t wide;");
		writeln!(out, "uint16_t address;");
		out.blank();
		writeln!(out, "set_up_timer(0);");
		writeln!(out, "sei();");
		self.backend.reset_state(plan, out);
		out.blank();
		out.raw(body);
		writeln!(out, "return 0;");
		out.dedent();
		writeln!(out, "}}");
		out.blank();
	}

	fn epilog(&self, out: &mut CodeWriter) {
		out.block("ISR(TIMER1_OVF_vect)", |out| {
			out.block("if (overflow)", |out| {
				writeln!(out, "overflow--;");
				writeln!(out, "return;");
			});

			writeln!(out, "if (io == 1) putChar(ioValue);");
			writeln!(out, "io = 0;");
			writeln!(out, "wait = 0;");
		});
	}
}
