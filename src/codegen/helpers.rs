use indexmap::IndexSet;
use parse_display::Display;

// ------------------------------------------------------------------------------------------------
// HelperId
// ------------------------------------------------------------------------------------------------

/// Runtime support routines the generated program may need. Displays as the C function name.
#[derive(Debug, Display, PartialEq, Eq, Hash, Copy, Clone)]
pub enum HelperId {
	#[display("read8")]    Read8,
	#[display("write8")]   Write8,
	#[display("push8")]    Push8,
	#[display("pull8")]    Pull8,
	#[display("setflag")]  SetFlag,
	#[display("add")]      Add,
	#[display("sub")]      Sub,
	#[display("tobcd")]    ToBcd,
	#[display("frombcd")]  FromBcd,
}

// ------------------------------------------------------------------------------------------------
// HelperRegistry
// ------------------------------------------------------------------------------------------------

/// The helpers a program needs, each at most once, in the order they were first requested.
///
/// Requesting a helper first requests whatever its body calls, so iterating the registry always
/// gives a valid order to define them in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelperRegistry {
	helpers: IndexSet<HelperId>,
}

impl HelperRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `id` after its dependencies, which `deps` lists. Returns true if `id` was new.
	pub fn request(&mut self, id: HelperId, deps: &impl Fn(HelperId) -> &'static [HelperId])
	-> bool {
		if self.helpers.contains(&id) {
			return false;
		}

		for &dep in deps(id) {
			self.request(dep, deps);
		}

		self.helpers.insert(id)
	}

	/// Has `id` been requested?
	pub fn contains(&self, id: HelperId) -> bool {
		self.helpers.contains(&id)
	}

	/// How many distinct helpers are registered.
	pub fn len(&self) -> usize {
		self.helpers.len()
	}

	/// True if none are.
	pub fn is_empty(&self) -> bool {
		self.helpers.is_empty()
	}

	/// The helpers in definition order.
	pub fn iter(&self) -> impl Iterator<Item = HelperId> + '_ {
		self.helpers.iter().copied()
	}
}
