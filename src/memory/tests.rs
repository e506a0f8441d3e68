use super::*;

use crate::error::TranslateError;

#[test]
fn default_layout_classification() {
	let layout = MemoryLayout::default();

	assert_eq!(layout.classify(0x0000), Region::GeneralRam);
	assert_eq!(layout.classify(0x01FF), Region::GeneralRam);
	assert_eq!(layout.classify(0x8AFF), Region::GeneralRam);
	assert_eq!(layout.classify(0x8B00), Region::MappedIo);
	assert_eq!(layout.classify(0x8B7F), Region::MappedIo);
	assert_eq!(layout.classify(0x8B80), Region::SecondaryRamBank);
	assert_eq!(layout.classify(0x8BFF), Region::SecondaryRamBank);
	assert_eq!(layout.classify(0x8C00), Region::SecondaryRomBank);
	assert_eq!(layout.classify(0x8FFF), Region::SecondaryRomBank);
	assert_eq!(layout.classify(0x9000), Region::GeneralRam);
	assert_eq!(layout.classify(0xEFFF), Region::GeneralRam);
	assert_eq!(layout.classify(0xF000), Region::PrimaryRom);
	assert_eq!(layout.classify(0xFFFF), Region::PrimaryRom);
}

#[test]
fn classification_partitions_address_space() {
	let layout = MemoryLayout::default();
	let mut counts = std::collections::HashMap::new();

	for addr in 0 ..= 0xFFFFu16 {
		let kind = layout.classify(addr);

		// an address is in an explicit region exactly when it isn't in a gap.
		let explicit: Vec<_> = layout.regions().filter(|r| r.contains(addr)).collect();
		assert!(explicit.len() <= 1, "${:04X} is in {} regions", addr, explicit.len());

		match explicit.first() {
			Some(r) => assert_eq!(r.kind, kind),
			None    => assert_eq!(kind, Region::GeneralRam),
		}

		*counts.entry(kind).or_insert(0usize) += 1;
	}

	assert_eq!(counts.values().sum::<usize>(), ADDRESS_SPACE);
	assert_eq!(counts[&Region::MappedIo], 0x80);
	assert_eq!(counts[&Region::SecondaryRamBank], 0x80);
	assert_eq!(counts[&Region::SecondaryRomBank], 0x400);
	assert_eq!(counts[&Region::PrimaryRom], 0x1000);
}

#[test]
fn writability() {
	let layout = MemoryLayout::default();
	assert!(layout.is_writable(0x0010));
	assert!(layout.is_writable(0x8B00));
	assert!(layout.is_writable(0x8B80));
	assert!(!layout.is_writable(0x8C00));
	assert!(!layout.is_writable(0xF123));
}

#[test]
fn overlapping_regions_rejected() {
	let regions = [
		MemoryRegion::new("A", 0x1000, 0x1FFF, Region::PrimaryRom),
		MemoryRegion::new("B", 0x1800, 0x27FF, Region::MappedIo),
	];

	let err = MemoryLayout::new(&regions, DEFAULT_RAM_WINDOW).unwrap_err();
	assert_eq!(err, TranslateError::BadLayout { first: "A", second: "B" });
}

#[test]
fn reach_queries() {
	let layout = MemoryLayout::default();

	assert!(layout.reaches(Reach::Exact(0x8B00), Region::MappedIo));
	assert!(!layout.reaches(Reach::Exact(0x8AFF), Region::MappedIo));

	// $8A80 + 255 = $8B7F
	assert!(layout.reaches(Reach::Indexed(0x8A81), Region::MappedIo));
	assert!(!layout.reaches(Reach::Indexed(0x8A00), Region::MappedIo));
	assert!(!layout.reaches(Reach::ZeroPage, Region::MappedIo));
	assert!(layout.reaches(Reach::Anywhere, Region::MappedIo));

	assert!(layout.all_immutable(Reach::Exact(0xF000)));
	assert!(layout.all_immutable(Reach::Indexed(0xF000)));
	assert!(!layout.all_immutable(Reach::Indexed(0xEFF0)));

	// wraps around to the zero page.
	assert!(!layout.all_immutable(Reach::Indexed(0xFFF0)));
	assert_eq!(layout.kinds_in(Reach::Indexed(0xFFF0)), vec![Region::PrimaryRom, Region::GeneralRam]);
}

#[test]
fn load_writes_reset_vector() {
	let img = MemoryImage::load(&[0xA9, 0x41, 0x00], 0xF000).unwrap();
	assert_eq!(img.read_u8(0xF000), 0xA9);
	assert_eq!(img.read_u8(0xF001), 0x41);
	assert_eq!(img.read_u8(RESET_VECTOR), 0x00);
	assert_eq!(img.read_u8(RESET_VECTOR + 1), 0xF0);
	assert_eq!(img.entry_point(), 0xF000);
}

#[test]
fn load_rejects_oversized_images() {
	let raw = vec![0u8; 0x1001];
	assert_eq!(MemoryImage::load(&raw, 0xF000).unwrap_err(),
		TranslateError::BadImage { offset: 0xF000, len: 0x1001 });
	assert!(MemoryImage::load(&raw[.. 0x1000], 0xF000).is_ok());
}

#[test]
fn page_wrapped_pointer_read() {
	let mut img = MemoryImage::new();
	img.write_u8(0x30FF, 0x34);
	img.write_u8(0x3100, 0x12);
	img.write_u8(0x3000, 0x56);

	assert_eq!(img.read_le_u16(0x30FF), 0x1234);
	assert_eq!(img.read_le_u16_page_wrapped(0x30FF), 0x5634);
}

#[test]
fn immutable_parts_of_a_reach() {
	let layout = MemoryLayout::default();

	assert_eq!(layout.immutable_parts(Reach::Indexed(0xEFC0)), vec![(0xF000, 0xF0BF)]);
	assert_eq!(layout.immutable_parts(Reach::Indexed(0x8BC0)), vec![(0x8C00, 0x8CBF)]);
	assert_eq!(layout.immutable_parts(Reach::Indexed(0xFFF0)), vec![(0xFFF0, 0xFFFF)]);
	assert!(layout.immutable_parts(Reach::ZeroPage).is_empty());
	assert_eq!(layout.immutable_parts(Reach::Anywhere), vec![(0x8C00, 0x8FFF), (0xF000, 0xFFFF)]);
}
