use std::collections::BTreeMap;

use crate::memory::{ ImageRead, MemoryImage };

// ------------------------------------------------------------------------------------------------
// RomShadows
// ------------------------------------------------------------------------------------------------

/// The ROM bytes the generated program must carry a copy of, because some read reaches them
/// through an address only known at run time. Kept as disjoint, non-adjacent inclusive ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RomShadows {
	/// first address -> last address.
	ranges: BTreeMap<u16, u16>,
}

impl RomShadows {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds `first ..= last`, merging it with any range it overlaps or touches.
	pub fn add(&mut self, first: u16, last: u16) {
		debug_assert!(first <= last);
		let (mut lo, mut hi) = (first as u32, last as u32);

		let touching: Vec<u16> = self.ranges.iter()
			.filter(|(&f, &l)| (f as u32) <= hi + 1 && lo <= (l as u32) + 1)
			.map(|(&f, _)| f)
			.collect();

		for f in touching {
			if let Some(l) = self.ranges.remove(&f) {
				lo = lo.min(f as u32);
				hi = hi.max(l as u32);
			}
		}

		self.ranges.insert(lo as u16, hi as u16);
	}

	pub fn is_empty(&self) -> bool {
		self.ranges.is_empty()
	}

	/// The ranges in address order.
	pub fn iter(&self) -> impl Iterator<Item = (u16, u16)> + '_ {
		self.ranges.iter().map(|(&f, &l)| (f, l))
	}

	/// Total number of shadowed bytes.
	pub fn byte_count(&self) -> usize {
		self.iter().map(|(f, l)| (l - f) as usize + 1).sum()
	}

	/// Name of the C array that shadows the range starting at `first`.
	pub fn table_name(first: u16) -> String {
		format!("rom_{:04x}", first)
	}

	/// The bytes of the range `first ..= last`.
	pub fn bytes<'i>(img: &'i MemoryImage, first: u16, last: u16) -> impl Iterator<Item = u8> + 'i {
		(first ..= last).map(move |addr| img.read_u8(addr))
	}
}
