//! Backward flag liveness, used to skip computing flags nobody reads.

use log::debug;

use crate::arch::FlagSet;
use crate::dataflow::{ DataflowAlgorithm, JoinSemiLattice };
use crate::program::{ BlockTable, Cfg, CodeBlock };
use crate::semantics::{ handler_for, IOpSemantics };

// ------------------------------------------------------------------------------------------------
// LivenessStats
// ------------------------------------------------------------------------------------------------

/// What the liveness solver did.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub struct LivenessStats {
	/// Full passes over the CFG, including the final one that changed nothing.
	pub passes: usize,
	/// Number of blocks analyzed.
	pub blocks: usize,
}

// ------------------------------------------------------------------------------------------------
// Per-block summaries
// ------------------------------------------------------------------------------------------------

/// Fills in `uses`/`defs` for each instruction of every block, and the block-level `gen`/`kill`
/// derived from them. Resets any earlier liveness results.
pub fn classify_blocks(blocks: &mut BlockTable) {
	for bb in blocks.iter_mut() {
		let (uses, defs): (Vec<FlagSet>, Vec<FlagSet>) = bb.insts.iter()
			.map(|inst| handler_for(inst.desc()).classify(inst))
			.map(|effect| (effect.uses, effect.defs))
			.unzip();

		bb.uses = uses;
		bb.defs = defs;

		let (gen, kill) = summarize(&bb.uses, &bb.defs);
		bb.gen = gen;
		bb.kill = kill;
		bb.live_out = FlagSet::empty();
	}
}

/// Reduces per-instruction uses/defs to `(gen, kill)`, scanning tail to head.
pub fn summarize(uses: &[FlagSet], defs: &[FlagSet]) -> (FlagSet, FlagSet) {
	let mut gen = FlagSet::empty();
	let mut kill = FlagSet::empty();

	for (&u, &d) in uses.iter().zip(defs).rev() {
		gen = (gen & !d) | u;
		kill |= d;
	}

	(gen, kill)
}

/// Flags live just after each instruction of `bb`, given its `live_out`.
pub fn live_after(bb: &CodeBlock) -> Vec<FlagSet> {
	let mut ret = vec![FlagSet::empty(); bb.insts.len()];
	let mut live = bb.live_out;

	for i in (0 .. bb.insts.len()).rev() {
		ret[i] = live;
		live = (live & !bb.defs[i]) | bb.uses[i];
	}

	ret
}

// ------------------------------------------------------------------------------------------------
// Solver
// ------------------------------------------------------------------------------------------------

/// Runs liveness to a fixed point. Afterwards each block's `live_out` holds the flags that may be
/// read after it, and its `gen` the flags live on entry.
pub fn solve(blocks: &mut BlockTable, cfg: &Cfg) -> LivenessStats {
	let has_return_sites = blocks.return_sites().next().is_some();
	let mut algo = FlagLiveness { blocks, cfg, has_return_sites };
	let passes = algo.run(cfg);

	debug!("flag liveness converged after {} passes over {} blocks", passes, cfg.num_blocks());
	LivenessStats { passes, blocks: cfg.num_blocks() }
}

struct FlagLiveness<'a> {
	blocks:           &'a mut BlockTable,
	cfg:              &'a Cfg,
	has_return_sites: bool,
}

impl DataflowAlgorithm for FlagLiveness<'_> {
	type ID = u16;

	fn visit(&mut self, id: u16) -> bool {
		let mut live_out = match self.blocks.get(id) {
			Some(bb) => bb.exit_floor(self.has_return_sites),
			None     => return false,
		};

		if self.cfg.is_open(id) {
			live_out = FlagSet::all();
		}

		for succ in self.cfg.successors(id) {
			if let Some(s) = self.blocks.get(succ) {
				live_out |= s.gen;
			}
		}

		match self.blocks.get_mut(id) {
			Some(bb) => {
				bb.live_out = live_out;
				bb.gen.join(&(live_out & !bb.kill))
			}

			None => false,
		}
	}
}
