use std::collections::HashSet;

use lazycell::LazyCell;
use log::{ debug, warn };
use petgraph::Direction;
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::{ DfsPostOrder, Walker };

use crate::dataflow::DataflowCfg;
use crate::program::{ BlockEnd, BlockTable };

// ------------------------------------------------------------------------------------------------
// Cfg
// ------------------------------------------------------------------------------------------------

/// Nodes are block start addresses.
pub type CfgGraph = DiGraphMap<u16, ()>;

/// The control flow graph over a [`BlockTable`], with lazily-computed orderings.
///
/// Besides the edges written in each block's terminator, every block ending in `rts` has an edge
/// to every call-return site, since without a call stack we can't tell which one it goes back to.
pub struct Cfg {
	entry:     u16,
	graph:     CfgGraph,
	/// blocks with an exit to an address where no block could be built.
	open:      HashSet<u16>,
	postorder: LazyCell<Vec<u16>>,
	reachable: LazyCell<HashSet<u16>>,
}

impl Cfg {
	/// Builds the graph for `blocks`.
	pub fn build(blocks: &BlockTable) -> Self {
		let mut graph = CfgGraph::with_capacity(blocks.len(), blocks.len() * 2);
		let mut open = HashSet::new();

		// add all nodes first, in address order, so that node iteration order is address order.
		for bb in blocks.iter() {
			graph.add_node(bb.start);
		}

		let return_sites: Vec<u16> = blocks.return_sites()
			.filter(|&site| blocks.get(site).is_some())
			.collect();

		for bb in blocks.iter() {
			for succ in bb.term.successors() {
				if graph.contains_node(succ) {
					graph.add_edge(bb.start, succ, ());
				} else {
					warn!("block ${:04X} exits to ${:04X}, which has no code", bb.start, succ);
					open.insert(bb.start);
				}
			}

			if bb.term == BlockEnd::Return {
				for &site in &return_sites {
					graph.add_edge(bb.start, site, ());
				}
			}
		}

		debug!("cfg: {} nodes, {} edges", graph.node_count(), graph.edge_count());

		Self {
			entry: blocks.entry(),
			graph,
			open,
			postorder: LazyCell::new(),
			reachable: LazyCell::new(),
		}
	}

	/// The entry block's address.
	pub fn entry(&self) -> u16 {
		self.entry
	}

	/// The underlying graph.
	pub fn graph(&self) -> &CfgGraph {
		&self.graph
	}

	/// Number of blocks.
	pub fn num_blocks(&self) -> usize {
		self.graph.node_count()
	}

	/// Blocks that control can go to directly from `addr`.
	pub fn successors(&self, addr: u16) -> impl Iterator<Item = u16> + '_ {
		self.graph.neighbors_directed(addr, Direction::Outgoing)
	}

	/// Blocks that can go directly to `addr`.
	pub fn predecessors(&self, addr: u16) -> impl Iterator<Item = u16> + '_ {
		self.graph.neighbors_directed(addr, Direction::Incoming)
	}

	/// How many distinct blocks can go directly to `addr`.
	pub fn in_degree(&self, addr: u16) -> usize {
		self.predecessors(addr).count()
	}

	/// Does the block at `addr` have an exit into an address with no block?
	pub fn is_open(&self, addr: u16) -> bool {
		self.open.contains(&addr)
	}

	/// Can the block at `addr` be reached from the entry point?
	pub fn is_reachable(&self, addr: u16) -> bool {
		self.reachable().contains(&addr)
	}

	/// All blocks reachable from the entry point, including it.
	pub fn reachable(&self) -> &HashSet<u16> {
		self.reachable.borrow_with(|| {
			if !self.graph.contains_node(self.entry) {
				return HashSet::new();
			}

			DfsPostOrder::new(&self.graph, self.entry).iter(&self.graph).collect()
		})
	}

	/// Every block in postorder from the entry, followed by the unreachable ones (each group again
	/// in postorder). Visiting in this order makes backward analyses converge quickly.
	pub fn postorder(&self) -> &[u16] {
		self.postorder.borrow_with(|| {
			let mut order = Vec::with_capacity(self.graph.node_count());
			let mut dfs = DfsPostOrder::empty(&self.graph);
			let roots = std::iter::once(self.entry)
				.filter(|&e| self.graph.contains_node(e))
				.chain(self.graph.nodes());

			for root in roots {
				// already-finished roots produce nothing.
				dfs.move_to(root);

				while let Some(node) = dfs.next(&self.graph) {
					order.push(node);
				}
			}

			order
		})
	}

	/// Renders the graph in Graphviz DOT format, with nodes labeled by address.
	pub fn to_dot(&self) -> String {
		use petgraph::dot::{ Config, Dot };

		let dot = Dot::with_attr_getters(
			&self.graph,
			&[Config::EdgeNoLabel, Config::NodeNoLabel],
			&|_, _| String::new(),
			&|_, (addr, _)| format!("label = \"${:04X}\"", addr),
		);

		format!("{:?}", dot)
	}
}

impl DataflowCfg<u16> for Cfg {
	fn num_nodes(&self) -> usize {
		self.graph.node_count()
	}

	fn initial_order(&self) -> impl Iterator<Item = u16> {
		self.postorder().iter().copied()
	}

	fn successors(&self, id: u16) -> impl Iterator<Item = u16> {
		self.graph.neighbors_directed(id, Direction::Outgoing)
	}
}
