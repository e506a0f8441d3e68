use std::collections::{ BTreeMap, BTreeSet };

use log::{ debug, trace, warn };
use smallvec::{ smallvec, SmallVec };

use crate::arch::{ FlagSet, Flow, Inst, MetaOp, RegSet, resolve_indirect };
use crate::config::TimingPolicy;
use crate::error::{ Stage, TranslateError, TranslateResult };
use crate::memory::{ MemoryImage, MemoryLayout, Region };
use crate::program::Discovery;

// ------------------------------------------------------------------------------------------------
// BlockEnd
// ------------------------------------------------------------------------------------------------

/// How a [`CodeBlock`] ends, and so what its successors are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockEnd {
	/// The next address starts another block.
	FallThru { next: u16 },
	/// The last instruction may touch the I/O window, which is a timing checkpoint. Execution
	/// continues at the next address.
	Io { next: u16 },
	/// Conditional branch.
	Cond { target: u16, next: u16 },
	/// Unconditional jump, absolute or through a ROM pointer.
	Jump { target: u16 },
	/// Subroutine call; `ret` is where the matching `rts` comes back to.
	Call { target: u16, ret: u16 },
	/// `rts`.
	Return,
	/// `rti`.
	ReturnInt,
	/// `brk` or `jam`.
	Halt,
	/// Ran off the end of memory or into undecodable bytes.
	DeadEnd,
}

impl BlockEnd {
	/// Successors that are written in the terminator itself. Returns from subroutines are
	/// added by the CFG, since they depend on every call site.
	pub fn successors(&self) -> SmallVec<[u16; 2]> {
		use BlockEnd::*;
		match *self {
			FallThru { next } | Io { next } => smallvec![next],
			Cond { target, next }           => smallvec![target, next],
			Jump { target }                 => smallvec![target],
			Call { target, .. }             => smallvec![target],
			Return | ReturnInt | Halt | DeadEnd => SmallVec::new(),
		}
	}

	/// The address after the block where execution continues without a jump, if any. A new
	/// block must start there.
	pub fn continuation(&self) -> Option<u16> {
		use BlockEnd::*;
		match *self {
			Io { next } | Cond { next, .. } => Some(next),
			Call { ret, .. }                => Some(ret),
			_                               => None,
		}
	}
}

// ------------------------------------------------------------------------------------------------
// CodeBlock
// ------------------------------------------------------------------------------------------------

/// A basic block: a run of instructions entered only at the top and left only at the bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
	/// Address of the first instruction.
	pub start:          u16,
	/// Address of the last instruction.
	pub end:            u16,
	/// Cycles to run the whole block, including any penalties the timing policy counts.
	pub cycles:         u32,
	/// The part of `cycles` that's only spent when the final branch is taken.
	pub branch_penalty: u32,
	pub insts:          Vec<Inst>,
	/// Cost of each instruction: base cycles, plus the indexed-read penalty if counted.
	pub costs:          Vec<u32>,
	/// Flags each instruction reads.
	pub uses:           Vec<FlagSet>,
	/// Flags each instruction overwrites.
	pub defs:           Vec<FlagSet>,
	/// Flags read before being overwritten; after liveness, also those live out and not killed.
	pub gen:            FlagSet,
	/// Flags overwritten somewhere in the block.
	pub kill:           FlagSet,
	/// Flags live on exit, filled in by liveness.
	pub live_out:       FlagSet,
	pub term:           BlockEnd,
}

impl CodeBlock {
	/// How many instructions it has.
	pub fn inst_count(&self) -> u16 {
		self.insts.len() as u16
	}

	/// The last instruction.
	pub fn term_inst(&self) -> &Inst {
		&self.insts[self.insts.len() - 1]
	}

	/// Cycles of every instruction before the last one.
	pub fn cycles_before_term(&self) -> u32 {
		self.costs[.. self.costs.len() - 1].iter().sum()
	}

	/// Cost of the last instruction, without any branch penalty.
	pub fn term_cost(&self) -> u32 {
		self.costs[self.costs.len() - 1]
	}

	/// Flags that must be assumed live on exit no matter what the successors need. Used for
	/// exits into code we can't see.
	pub fn exit_floor(&self, has_return_sites: bool) -> FlagSet {
		match self.term {
			BlockEnd::ReturnInt | BlockEnd::DeadEnd => FlagSet::all(),
			BlockEnd::Return if !has_return_sites  => FlagSet::all(),
			_                                      => FlagSet::empty(),
		}
	}
}

// ------------------------------------------------------------------------------------------------
// BlockTable
// ------------------------------------------------------------------------------------------------

/// All the blocks of a program, keyed by start address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTable {
	entry:        u16,
	blocks:       BTreeMap<u16, CodeBlock>,
	leaders:      BTreeSet<u16>,
	/// Continuations after calls, i.e. where `rts` can land.
	return_sites: BTreeSet<u16>,
	/// Does any block contain `sed`?
	decimal:      bool,
}

impl BlockTable {
	/// The entry block's address.
	pub fn entry(&self) -> u16 { self.entry }
	/// How many blocks there are.
	pub fn len(&self) -> usize { self.blocks.len() }
	/// True if there are none.
	pub fn is_empty(&self) -> bool { self.blocks.is_empty() }
	/// Is `addr` a leader?
	pub fn is_leader(&self, addr: u16) -> bool { self.leaders.contains(&addr) }
	/// Is `addr` somewhere an `rts` returns to?
	pub fn is_return_site(&self, addr: u16) -> bool { self.return_sites.contains(&addr) }
	/// Can the program switch to decimal mode?
	pub fn uses_decimal(&self) -> bool { self.decimal }

	/// Every register some instruction in some block refers to.
	pub fn used_registers(&self) -> RegSet {
		self.blocks.values()
			.flat_map(|bb| bb.insts.iter())
			.fold(RegSet::empty(), |regs, inst| regs | inst.registers())
	}

	/// The block that starts at `addr`.
	pub fn get(&self, addr: u16) -> Option<&CodeBlock> {
		self.blocks.get(&addr)
	}

	/// Same as above but mutable.
	pub fn get_mut(&mut self, addr: u16) -> Option<&mut CodeBlock> {
		self.blocks.get_mut(&addr)
	}

	/// All blocks in address order.
	pub fn iter(&self) -> impl Iterator<Item = &CodeBlock> + '_ {
		self.blocks.values()
	}

	/// Same as above but mutable.
	pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut CodeBlock> + '_ {
		self.blocks.values_mut()
	}

	/// All leaders in address order.
	pub fn leaders(&self) -> impl Iterator<Item = u16> + '_ {
		self.leaders.iter().copied()
	}

	/// All return sites in address order.
	pub fn return_sites(&self) -> impl Iterator<Item = u16> + '_ {
		self.return_sites.iter().copied()
	}

	/// `(call site, return site)` for every block that ends in a call.
	pub fn calls(&self) -> impl Iterator<Item = (u16, u16)> + '_ {
		self.blocks.values().filter_map(|b| match b.term {
			BlockEnd::Call { ret, .. } => Some((b.end, ret)),
			_                          => None,
		})
	}

	/// Partitions the code into blocks. Every leader starts a block, and so does every address
	/// following a branch, a call, or an I/O access.
	pub fn build(
		img:       &MemoryImage,
		layout:    &MemoryLayout,
		discovery: &Discovery,
		timing:    TimingPolicy,
	) -> TranslateResult<Self> {
		let builder = Builder { img, layout, timing };
		let leaders: BTreeSet<u16> = discovery.leaders.iter().copied().collect();

		// first, find all block starts by walking from each leader until no new ones show up.
		let mut starts = leaders.clone();
		let mut work: Vec<u16> = leaders.iter().copied().collect();
		let mut walked = BTreeSet::new();

		while let Some(start) = work.pop() {
			if !walked.insert(start) {
				continue;
			}

			if let Some(cont) = builder.walk(start, &leaders)?.term.continuation() {
				if starts.insert(cont) {
					work.push(cont);
				}
			}
		}

		// then build each block for real, stopping at any start.
		let mut blocks = BTreeMap::new();
		let mut return_sites = BTreeSet::new();

		for &start in &starts {
			let bb = builder.walk(start, &starts)?;

			if bb.insts.is_empty() {
				warn!("no decodable instruction at block start ${:04X}", start);
				continue;
			}

			if let BlockEnd::Call { ret, .. } = bb.term {
				return_sites.insert(ret);
			}

			trace!("block ${:04X}..=${:04X}: {} insts, {} cycles, {:?}",
				bb.start, bb.end, bb.insts.len(), bb.cycles, bb.term);
			blocks.insert(start, bb);
		}

		let decimal = blocks.values()
			.any(|b: &CodeBlock| b.insts.iter().any(|i| i.meta_op() == MetaOp::SED));

		debug!("{} blocks from {} leaders", blocks.len(), leaders.len());

		Ok(Self { entry: discovery.entry, blocks, leaders, return_sites, decimal })
	}
}

// ------------------------------------------------------------------------------------------------
// Builder
// ------------------------------------------------------------------------------------------------

struct Builder<'a> {
	img:    &'a MemoryImage,
	layout: &'a MemoryLayout,
	timing: TimingPolicy,
}

impl Builder<'_> {
	/// Decodes instructions from `start` until one ends the block or the next address is in
	/// `stop_at`.
	fn walk(&self, start: u16, stop_at: &BTreeSet<u16>) -> TranslateResult<CodeBlock> {
		let mut insts = Vec::new();
		let mut costs = Vec::new();
		let mut cycles = 0;
		let mut branch_penalty = 0;
		let mut at = start as u32;

		let term = loop {
			if at > 0xFFFF {
				break BlockEnd::DeadEnd;
			}

			let inst = match Inst::decode(self.img, at as u16) {
				Ok(inst) => inst,
				Err(TranslateError::OutOfBytes { .. }) => break BlockEnd::DeadEnd,
				Err(e) => return Err(e),
			};

			let cost = if self.timing.indexed_page_penalty {
				inst.cycles() + inst.page_penalty()
			} else {
				inst.cycles()
			};

			insts.push(inst);
			costs.push(cost);
			cycles += cost;

			let next = inst.next_addr();
			let term = match inst.flow() {
				Flow::Cond => {
					let target = inst.operand().value;

					if self.timing.branch_penalty {
						branch_penalty = if target & 0xFF00 == next & 0xFF00 { 1 } else { 2 };
						cycles += branch_penalty;
					}

					Some(BlockEnd::Cond { target, next })
				}

				Flow::Jump      => Some(BlockEnd::Jump { target: inst.operand().value }),
				Flow::IndirJump => {
					let ptr = inst.operand().value;
					Some(BlockEnd::Jump { target: resolve_indirect(self.img, self.layout, inst.addr(), ptr, Stage::Blocks)? })
				}

				Flow::Call      => Some(BlockEnd::Call { target: inst.operand().value, ret: next }),
				Flow::Return    => Some(BlockEnd::Return),
				Flow::ReturnInt => Some(BlockEnd::ReturnInt),
				Flow::Halt      => Some(BlockEnd::Halt),
				Flow::Next if self.may_touch_io(&inst) => Some(BlockEnd::Io { next }),
				Flow::Next      => None,
			};

			if let Some(term) = term {
				break term;
			}

			at = inst.end();

			if at <= 0xFFFF && stop_at.contains(&(at as u16)) {
				break BlockEnd::FallThru { next: at as u16 };
			}
		};

		let end = insts.last().map_or(start, |i: &Inst| i.addr());

		Ok(CodeBlock {
			start,
			end,
			cycles,
			branch_penalty,
			uses:     Vec::new(),
			defs:     Vec::new(),
			gen:      FlagSet::empty(),
			kill:     FlagSet::empty(),
			live_out: FlagSet::empty(),
			insts,
			costs,
			term,
		})
	}

	/// Could this instruction's data access land in the I/O window?
	fn may_touch_io(&self, inst: &Inst) -> bool {
		inst.reach().map_or(false, |r| self.layout.reaches(r, Region::MappedIo))
	}
}
