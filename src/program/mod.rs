//! Whole-program analysis: finding the code, cutting it into blocks, and working out which flags
//! matter where.

use delegate::delegate;
use log::debug;

use crate::codegen::Translator;
use crate::config::TranslateConfig;
use crate::error::TranslateResult;
use crate::memory::MemoryImage;

// ------------------------------------------------------------------------------------------------
// Sub-modules
// ------------------------------------------------------------------------------------------------

mod bb;
mod cfg;
mod discover;
pub mod liveness;

#[cfg(test)]
mod tests;

pub use bb::*;
pub use cfg::*;
pub use discover::*;
pub use liveness::LivenessStats;

// ------------------------------------------------------------------------------------------------
// Translation
// ------------------------------------------------------------------------------------------------

/// One translation session: the image, the configuration, and every analysis result. Analysis
/// happens all at once in [`analyze`](Self::analyze); after that the session is read-only, and
/// [`translate`](Self::translate) can be called any number of times.
pub struct Translation {
	config:    TranslateConfig,
	img:       MemoryImage,
	discovery: Discovery,
	blocks:    BlockTable,
	cfg:       Cfg,
	liveness:  LivenessStats,
}

impl Translation {
	/// Runs discovery, block building, flag classification and liveness over `img`.
	pub fn analyze(img: MemoryImage, config: TranslateConfig) -> TranslateResult<Self> {
		let discovery = discover(&img, &config.layout, &config.scan)?;
		let mut blocks = BlockTable::build(&img, &config.layout, &discovery, config.timing)?;
		let cfg = Cfg::build(&blocks);

		liveness::classify_blocks(&mut blocks);
		let liveness = liveness::solve(&mut blocks, &cfg);

		debug!("analysis done: {} leaders, {} blocks ({} reachable), {} liveness passes",
			discovery.leaders.len(), blocks.len(), cfg.reachable().len(), liveness.passes);

		Ok(Self { config, img, discovery, blocks, cfg, liveness })
	}

	/// Generates the target program.
	pub fn translate(&self) -> TranslateResult<String> {
		Translator::new(self).run()
	}

	/// The configuration this session was analyzed with.
	pub fn config(&self) -> &TranslateConfig { &self.config }
	/// The memory image.
	pub fn image(&self) -> &MemoryImage { &self.img }
	/// What the discovery scan found.
	pub fn discovery(&self) -> &Discovery { &self.discovery }
	/// All the blocks.
	pub fn blocks(&self) -> &BlockTable { &self.blocks }
	/// The control flow graph.
	pub fn cfg(&self) -> &Cfg { &self.cfg }
	/// How the liveness solver went.
	pub fn liveness(&self) -> LivenessStats { self.liveness }

	/// The block starting at `addr`, if any.
	pub fn block(&self, addr: u16) -> Option<&CodeBlock> {
		self.blocks.get(addr)
	}

	delegate! {
		to self.blocks {
			/// The entry point.
			pub fn entry(&self) -> u16;
			/// Is `addr` a leader?
			pub fn is_leader(&self, addr: u16) -> bool;
		}

		to self.cfg {
			/// How many blocks can go directly to the one at `addr`.
			pub fn in_degree(&self, addr: u16) -> usize;
			/// Can the block at `addr` be reached from the entry point?
			pub fn is_reachable(&self, addr: u16) -> bool;
			/// The CFG in Graphviz DOT format.
			pub fn to_dot(&self) -> String;
		}
	}
}
