//! Generic dataflow algorithm framework.

use std::hash::{ Hash };

use crate::arch::FlagSet;

// ------------------------------------------------------------------------------------------------
// JoinSemiLattice
// ------------------------------------------------------------------------------------------------

/// From rustc!
pub(crate) trait JoinSemiLattice: Eq {
	fn join(&mut self, other: &Self) -> bool;
}

impl JoinSemiLattice for FlagSet {
	fn join(&mut self, other: &Self) -> bool {
		let old = *self;
		*self |= *other;
		*self != old
	}
}

// ------------------------------------------------------------------------------------------------
// DataflowCfg
// ------------------------------------------------------------------------------------------------

/// Trait for a control flow graph used by `DataflowAlgorithm`. `ID` is meant to be a type used to
/// uniquely identify each node in the graph.
pub(crate) trait DataflowCfg<ID>
where
	ID: Eq + Hash + Clone + Copy
{
	/// Should return the number of nodes in the CFG.
	fn num_nodes(&self) -> usize;

	/// Should return an iterator which lists all nodes in the CFG in the order to visit them on
	/// each pass. For a forward analysis, reverse postorder (RPO) is preferred; for a backward
	/// analysis, postorder. Any order that covers every node converges, just more slowly.
	fn initial_order(&self) -> impl Iterator<Item = ID>;

	/// Should return an iterator over all successors of the given node.
	fn successors(&self, id: ID) -> impl Iterator<Item = ID>;
}

// ------------------------------------------------------------------------------------------------
// DataflowAlgorithm
// ------------------------------------------------------------------------------------------------

/// Trait for an abstract dataflow algorithm. This implements the "boring" parts of dataflow so that
/// all you have to do is implement the interesting bits.
///
/// Direction is up to `visit`: a backward analysis joins the state of the successors into the node,
/// a forward one the state of the predecessors.
pub(crate) trait DataflowAlgorithm {
	/// Associated type used to uniquely identify each node in a control flow graph. Used as the
	/// type parameter to `DataflowCfg`.
	type ID: Eq + Hash + Clone + Copy;

	/// The main method you need to implement. Visits a node of the CFG: joins the neighbors' state
	/// and applies the transfer function. Should return true if the node's state changed.
	fn visit(&mut self, id: Self::ID) -> bool;

	/// Runs the dataflow algorithm to fixpoint with full passes over `cfg` in its initial order,
	/// stopping after the first pass in which no node changed. Returns how many passes were run,
	/// counting that last one. For a monotone transfer function over a finite lattice this always
	/// terminates.
	fn run(&mut self, cfg: &impl DataflowCfg<Self::ID>) -> usize {
		let mut order = Vec::with_capacity(cfg.num_nodes());
		order.extend(cfg.initial_order());
		let mut passes = 0;

		loop {
			passes += 1;
			let mut changed = false;

			for &id in &order {
				changed |= self.visit(id);
			}

			if !changed {
				return passes;
			}
		}
	}
}
