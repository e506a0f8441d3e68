use std::collections::BTreeMap;

use crate::error::{ TranslateError, TranslateResult };
use crate::memory::{ MemoryRegion, Region };

// ------------------------------------------------------------------------------------------------
// Default memory map
// ------------------------------------------------------------------------------------------------

/// The regions of the KIM-style board the translator targets by default. Everything else is
/// general RAM.
pub const DEFAULT_REGIONS: &[MemoryRegion] = &[
	MemoryRegion::new("RRIOT_IO",  0x8B00, 0x8B7F, Region::MappedIo),
	MemoryRegion::new("RRIOT_RAM", 0x8B80, 0x8BFF, Region::SecondaryRamBank),
	MemoryRegion::new("RRIOT_ROM", 0x8C00, 0x8FFF, Region::SecondaryRomBank),
	MemoryRegion::new("ROM",       0xF000, 0xFFFF, Region::PrimaryRom),
];

/// The part of general RAM that the generated program actually backs with an array.
pub const DEFAULT_RAM_WINDOW: MemoryRegion =
	MemoryRegion::new("RAM", 0x0000, 0x01FF, Region::GeneralRam);

// ------------------------------------------------------------------------------------------------
// Reach
// ------------------------------------------------------------------------------------------------

/// The set of addresses an instruction's memory operand could refer to at run time.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Reach {
	/// Exactly this address.
	Exact(u16),
	/// `base + index` for an unsigned 8-bit index: 256 addresses, wrapping at $FFFF.
	Indexed(u16),
	/// Somewhere in the zero page.
	ZeroPage,
	/// Could be anywhere; the address is read from memory at run time.
	Anywhere,
}

impl Reach {
	/// First address and number of addresses covered (which may wrap around).
	fn span(self) -> (u16, u32) {
		match self {
			Reach::Exact(a)   => (a, 1),
			Reach::Indexed(a) => (a, 0x100),
			Reach::ZeroPage   => (0, 0x100),
			Reach::Anywhere   => (0, 0x10000),
		}
	}

	/// Splits the span into at most two non-wrapping inclusive ranges.
	pub fn ranges(self) -> impl Iterator<Item = (u16, u16)> {
		let (start, count) = self.span();
		let last = start as u32 + count - 1;

		let (first, second) = if last > 0xFFFF {
			((start, 0xFFFF), Some((0, (last - 0x10000) as u16)))
		} else {
			((start, last as u16), None)
		};

		std::iter::once(first).chain(second)
	}
}

// ------------------------------------------------------------------------------------------------
// MemoryLayout
// ------------------------------------------------------------------------------------------------

/// Describes the whole 64K address space as a set of non-overlapping `MemoryRegion`s. Addresses
/// not covered by any of them are general RAM, so classification is a total function.
///
/// Once created, the layout cannot change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryLayout {
	/// all the explicit regions, in address order.
	regions:    Vec<MemoryRegion>,
	/// maps from base addresses to an index into `regions`.
	addr_map:   BTreeMap<u16, usize>,
	/// the backed part of general RAM.
	ram_window: MemoryRegion,
}

impl Default for MemoryLayout {
	fn default() -> Self {
		Self::assemble(DEFAULT_REGIONS.to_vec(), DEFAULT_RAM_WINDOW)
	}
}

impl MemoryLayout {
	/// Given a list of regions and the backed RAM window, constructs a new layout. Fails if any
	/// two regions overlap.
	pub fn new(regions: &[MemoryRegion], ram_window: MemoryRegion) -> TranslateResult<Self> {
		let mut regions: Vec<_> = regions.into();
		regions.sort_by_key(|r| r.base);

		for i in 0 .. regions.len() {
			let r = &regions[i];

			if let Some(other) = regions[i + 1 ..].iter().find(|other| r.overlaps(other)) {
				return Err(TranslateError::BadLayout { first: r.name, second: other.name });
			}
		}

		Ok(Self::assemble(regions, ram_window))
	}

	fn assemble(regions: Vec<MemoryRegion>, ram_window: MemoryRegion) -> Self {
		let addr_map = regions.iter().enumerate().map(|(i, r)| (r.base, i)).collect();
		Self { regions, addr_map, ram_window }
	}

	/// Iterator over all explicit regions, in address order.
	pub fn regions(&self) -> impl Iterator<Item = &MemoryRegion> + '_ {
		self.regions.iter()
	}

	/// The part of general RAM the generated program backs with an array.
	pub fn ram_window(&self) -> &MemoryRegion {
		&self.ram_window
	}

	/// Given an address, get the explicit region which contains it, if any.
	pub fn region_for(&self, addr: u16) -> Option<&MemoryRegion> {
		match self.addr_map.range(..= addr).next_back() {
			Some((_, &idx)) if self.regions[idx].contains(addr) => Some(&self.regions[idx]),
			_ => None,
		}
	}

	/// What kind of memory is at `addr`.
	pub fn classify(&self, addr: u16) -> Region {
		self.region_for(addr).map_or(Region::GeneralRam, |r| r.kind)
	}

	/// Shorthand for `classify(addr).is_writable()`.
	pub fn is_writable(&self, addr: u16) -> bool {
		self.classify(addr).is_writable()
	}

	/// Every region kind that some address in `reach` belongs to.
	pub fn kinds_in(&self, reach: Reach) -> Vec<Region> {
		let mut ret = Vec::new();

		for (lo, hi) in reach.ranges() {
			self.kinds_between(lo, hi, &mut ret);
		}

		ret
	}

	/// Could an access with this reach touch a region of kind `kind`?
	pub fn reaches(&self, reach: Reach, kind: Region) -> bool {
		self.kinds_in(reach).contains(&kind)
	}

	/// Is every address in `reach` immutable?
	pub fn all_immutable(&self, reach: Reach) -> bool {
		self.kinds_in(reach).iter().all(|k| k.is_immutable())
	}

	/// The parts of `reach` that fall in immutable regions, as inclusive ranges in address order.
	pub fn immutable_parts(&self, reach: Reach) -> Vec<(u16, u16)> {
		let mut ret = Vec::new();

		for (lo, hi) in reach.ranges() {
			for r in self.regions.iter().filter(|r| r.kind.is_immutable()) {
				let (first, last) = (lo.max(r.base), hi.min(r.end));

				if first <= last {
					ret.push((first, last));
				}
			}
		}

		ret.sort_unstable();
		ret
	}

	fn kinds_between(&self, lo: u16, hi: u16, out: &mut Vec<Region>) {
		let mut push = |k: Region| if !out.contains(&k) { out.push(k) };
		let mut cur = lo as u32;
		let hi = hi as u32;

		while cur <= hi {
			if let Some(r) = self.region_for(cur as u16) {
				push(r.kind);
				cur = r.end as u32 + 1;
				continue;
			}

			// in a gap: general RAM until the next region starts (or forever).
			push(Region::GeneralRam);

			match self.addr_map.range((cur as u16) ..).next() {
				Some((&base, _)) => cur = base as u32,
				None             => break,
			}
		}
	}
}
