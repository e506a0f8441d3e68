use parse_display::Display;

// ------------------------------------------------------------------------------------------------
// Region
// ------------------------------------------------------------------------------------------------

/// What you access when you use an address. Every address is in exactly one of these.
#[derive(Debug, Display, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Region {
	/// Plain RAM. Anything not claimed by another region is this.
	#[display("general RAM")]
	GeneralRam,
	/// The memory-mapped I/O window. Accesses here are timing checkpoints.
	#[display("mapped I/O")]
	MappedIo,
	/// The main ROM, which holds the program and the vectors.
	#[display("primary ROM")]
	PrimaryRom,
	/// ROM on the secondary (I/O chip) bank.
	#[display("secondary ROM bank")]
	SecondaryRomBank,
	/// RAM on the secondary (I/O chip) bank.
	#[display("secondary RAM bank")]
	SecondaryRamBank,
}

impl Region {
	/// Can stores to this region change anything? False for both ROMs.
	pub fn is_writable(self) -> bool {
		use Region::*;
		!matches!(self, PrimaryRom | SecondaryRomBank)
	}

	/// Are the contents of this region known at translation time?
	pub fn is_immutable(self) -> bool {
		!self.is_writable()
	}
}

// ------------------------------------------------------------------------------------------------
// MemoryRegion
// ------------------------------------------------------------------------------------------------

/// Describes part of the memory map: the name, address range, and what's there.
#[derive(Debug, Display, PartialEq, Eq, Clone, Copy)]
#[display("{name} [${base:04X} ..= ${end:04X}]")]
pub struct MemoryRegion {
	/// Human-readable name.
	pub name: &'static str,
	/// Address of first byte.
	pub base: u16,
	/// Address of last byte (inclusive, so a region can end at $FFFF).
	pub end:  u16,
	/// What kind of thing is at these addresses.
	pub kind: Region,
}

#[allow(clippy::len_without_is_empty)]
impl MemoryRegion {
	pub const fn new(name: &'static str, base: u16, end: u16, kind: Region) -> Self {
		Self { name, base, end, kind }
	}

	/// true if these two regions overlap one another.
	pub fn overlaps(&self, other: &MemoryRegion) -> bool {
		!(self.end < other.base || other.end < self.base)
	}

	/// true if `addr` is in this region.
	pub fn contains(&self, addr: u16) -> bool {
		self.base <= addr && addr <= self.end
	}

	/// gets the size in bytes.
	pub fn len(&self) -> usize {
		(self.end as usize) - (self.base as usize) + 1
	}
}
