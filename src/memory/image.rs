use crate::error::{ TranslateError, TranslateResult };

// ------------------------------------------------------------------------------------------------
// Constants
// ------------------------------------------------------------------------------------------------

/// Size of the 6502 address space.
pub const ADDRESS_SPACE: usize = 0x10000;

/// Where the CPU fetches its entry point from on reset (little-endian).
pub const RESET_VECTOR: u16 = 0xFFFC;

// ------------------------------------------------------------------------------------------------
// ImageRead
// ------------------------------------------------------------------------------------------------

/// Little-endian reads out of a 16-bit address space. Addresses wrap around at $FFFF.
pub trait ImageRead {
	fn read_u8(&self, addr: u16) -> u8;

	fn read_le_u16(&self, addr: u16) -> u16 {
		u16::from_le_bytes([self.read_u8(addr), self.read_u8(addr.wrapping_add(1))])
	}

	/// Like `read_le_u16`, but the high byte comes from the same page as the low byte. This is
	/// what NMOS 6502s do when reading the pointer of `jmp ($xxFF)`.
	fn read_le_u16_page_wrapped(&self, addr: u16) -> u16 {
		let hi_addr = (addr & 0xFF00) | (addr.wrapping_add(1) & 0x00FF);
		u16::from_le_bytes([self.read_u8(addr), self.read_u8(hi_addr)])
	}
}

// ------------------------------------------------------------------------------------------------
// MemoryImage
// ------------------------------------------------------------------------------------------------

/// The full 64K memory image a program is translated from. Loaded once; analysis and code
/// generation only read it.
#[derive(Clone, PartialEq, Eq)]
pub struct MemoryImage {
	data: Box<[u8]>,
}

impl std::fmt::Debug for MemoryImage {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "MemoryImage(entry = ${:04X})", self.entry_point())
	}
}

impl Default for MemoryImage {
	fn default() -> Self {
		Self { data: vec![0u8; ADDRESS_SPACE].into_boxed_slice() }
	}
}

impl ImageRead for MemoryImage {
	fn read_u8(&self, addr: u16) -> u8 {
		self.data[addr as usize]
	}
}

impl MemoryImage {
	/// Makes an all-zero image.
	pub fn new() -> Self {
		Self::default()
	}

	/// Copies `raw` into a fresh image at `offset`, then points the reset vector at `offset`.
	/// The vector is written last, so it wins over whatever the raw image had there.
	pub fn load(raw: &[u8], offset: u16) -> TranslateResult<Self> {
		let start = offset as usize;

		if start + raw.len() > ADDRESS_SPACE {
			return Err(TranslateError::BadImage { offset, len: raw.len() });
		}

		let mut ret = Self::new();
		ret.data[start .. start + raw.len()].copy_from_slice(raw);
		ret.set_entry_point(offset);

		log::debug!("loaded {} bytes at ${:04X}", raw.len(), offset);
		Ok(ret)
	}

	/// The address the reset vector points at.
	pub fn entry_point(&self) -> u16 {
		self.read_le_u16(RESET_VECTOR)
	}

	/// Points the reset vector at `entry`.
	pub fn set_entry_point(&mut self, entry: u16) {
		let [lo, hi] = entry.to_le_bytes();
		self.write_u8(RESET_VECTOR, lo);
		self.write_u8(RESET_VECTOR + 1, hi);
	}

	/// Pokes a byte. Only used while setting up an image.
	pub fn write_u8(&mut self, addr: u16, val: u8) {
		self.data[addr as usize] = val;
	}
}
