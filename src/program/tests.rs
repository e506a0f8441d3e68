use super::*;

use std::collections::HashSet;

use crate::arch::FlagSet;
use crate::config::{ ScanMarkers, TimingPolicy, TranslateConfig };
use crate::error::{ Stage, TranslateError };
use crate::memory::MemoryImage;

/// lda #$41; sta $8B00; adc #$01; cmp #$5B; bcc *-9; brk
const SCENARIO: &[u8] = &[0xA9, 0x41, 0x8D, 0x00, 0x8B, 0x69, 0x01, 0xC9, 0x5B, 0x90, 0xF7, 0x00];

/// The same, with the usual `clc` in front.
const SCENARIO_CLC: &[u8] =
	&[0x18, 0xA9, 0x41, 0x8D, 0x00, 0x8B, 0x69, 0x01, 0xC9, 0x5B, 0x90, 0xF7, 0x00];

/// jsr $F007; bcc $F000; brk; (F007:) clc; rts
const CALL_RETURN: &[u8] = &[0x20, 0x07, 0xF0, 0x90, 0xFB, 0x00, 0x00, 0x18, 0x60];

fn analyze_with(raw: &[u8], config: TranslateConfig) -> Translation {
	let img = MemoryImage::load(raw, 0xF000).unwrap();
	Translation::analyze(img, config).unwrap()
}

fn analyze(raw: &[u8]) -> Translation {
	analyze_with(raw, TranslateConfig::default())
}

fn leaders(s: &Translation) -> HashSet<u16> {
	s.discovery().leaders.clone()
}

#[test]
fn scenario_leaders() {
	let s = analyze(SCENARIO);
	assert_eq!(s.entry(), 0xF000);
	assert_eq!(leaders(&s), [0xF000, 0xF002].iter().copied().collect::<HashSet<_>>());

	let s = analyze(SCENARIO_CLC);
	assert_eq!(leaders(&s), [0xF000, 0xF003].iter().copied().collect::<HashSet<_>>());
}

#[test]
fn scenario_blocks() {
	let s = analyze(SCENARIO);
	let starts: Vec<u16> = s.blocks().iter().map(|bb| bb.start).collect();
	assert_eq!(starts, vec![0xF000, 0xF002, 0xF005, 0xF00B]);

	let bb = s.block(0xF000).unwrap();
	assert_eq!((bb.cycles, bb.inst_count()), (2, 1));
	assert_eq!(bb.term, BlockEnd::FallThru { next: 0xF002 });

	let bb = s.block(0xF002).unwrap();
	assert_eq!((bb.cycles, bb.inst_count()), (4, 1));
	assert_eq!(bb.term, BlockEnd::Io { next: 0xF005 });

	// adc, cmp, bcc: 2 + 2 + 2, and 1 more when the branch is taken.
	let bb = s.block(0xF005).unwrap();
	assert_eq!((bb.cycles, bb.branch_penalty, bb.inst_count()), (7, 1, 3));
	assert_eq!(bb.term, BlockEnd::Cond { target: 0xF002, next: 0xF00B });

	let bb = s.block(0xF00B).unwrap();
	assert_eq!((bb.cycles, bb.inst_count()), (7, 1));
	assert_eq!(bb.term, BlockEnd::Halt);
	assert!(bb.term_inst().is_terminator());

	let s = analyze(SCENARIO_CLC);
	let bb = s.block(0xF000).unwrap();
	assert_eq!((bb.cycles, bb.inst_count()), (4, 2));
	assert_eq!(s.block(0xF003).unwrap().term, BlockEnd::Io { next: 0xF006 });
}

#[test]
fn block_cycles_match_the_table() {
	for raw in &[SCENARIO, SCENARIO_CLC, CALL_RETURN] {
		let s = analyze(raw);

		for bb in s.blocks().iter() {
			let base: u32 = bb.insts.iter().map(|i| i.cycles()).sum();
			assert_eq!(bb.cycles, base + bb.branch_penalty, "block ${:04X}", bb.start);
			assert_eq!(bb.costs.iter().sum::<u32>(), base);
			assert_eq!(bb.inst_count() as usize, bb.insts.len());

			// instructions are back to back from start to end.
			assert_eq!(bb.insts[0].addr(), bb.start);
			assert_eq!(bb.term_inst().addr(), bb.end);

			for pair in bb.insts.windows(2) {
				assert_eq!(pair[0].next_addr(), pair[1].addr());
			}
		}
	}
}

#[test]
fn blocks_do_not_overlap() {
	let s = analyze(SCENARIO_CLC);
	let blocks: Vec<_> = s.blocks().iter().collect();

	for pair in blocks.windows(2) {
		assert!(pair[0].term_inst().end() <= pair[1].start as u32);
	}
}

#[test]
fn wcet_timing_counts_indexed_reads() {
	// lda $F100,X; brk
	let raw = &[0xBD, 0x00, 0xF1, 0x00, 0x00];

	let best = analyze_with(raw, TranslateConfig::default().with_timing(TimingPolicy::BEST_CASE));
	let worst = analyze_with(raw, TranslateConfig::default().with_timing(TimingPolicy::WORST_CASE));

	// lda abs,X ends up in the same block as brk.
	assert_eq!(best.block(0xF000).unwrap().cycles, 4 + 7);
	assert_eq!(worst.block(0xF000).unwrap().cycles, 5 + 7);

	// and the best case never counts the branch penalty.
	let best = analyze_with(SCENARIO, TranslateConfig::default().with_timing(TimingPolicy::BEST_CASE));
	let bb = best.block(0xF005).unwrap();
	assert_eq!((bb.cycles, bb.branch_penalty), (6, 0));
}

#[test]
fn targets_are_leaders() {
	for raw in &[SCENARIO, SCENARIO_CLC, CALL_RETURN] {
		let s = analyze(raw);

		for bb in s.blocks().iter() {
			for inst in &bb.insts {
				if let Some(target) = inst.target() {
					assert!(s.is_leader(target), "${:04X} -> ${:04X}", inst.addr(), target);
				}
			}
		}
	}
}

#[test]
fn branches_into_one_place_merge() {
	// beq $F004; bne $F004; brk
	let s = analyze(&[0xF0, 0x02, 0xD0, 0x00, 0x00, 0x00]);

	assert!(s.is_leader(0xF004));
	assert_eq!(s.blocks().iter().filter(|bb| bb.start == 0xF004).count(), 1);
	assert_eq!(s.in_degree(0xF004), 2);
	assert_eq!(s.in_degree(0xF000), 0);
}

#[test]
fn io_access_ends_a_block() {
	let s = analyze(SCENARIO);

	// the block after the store is a continuation, not a leader.
	assert!(!s.is_leader(0xF005));
	assert!(s.block(0xF005).is_some());
	assert!(s.cfg().successors(0xF002).any(|a| a == 0xF005));
	assert_eq!(s.in_degree(0xF002), 2);
}

#[test]
fn returns_go_back_to_every_call_site() {
	let s = analyze(CALL_RETURN);

	assert_eq!(s.block(0xF000).unwrap().term, BlockEnd::Call { target: 0xF007, ret: 0xF003 });
	assert!(s.blocks().is_return_site(0xF003));
	assert!(!s.is_leader(0xF003));
	assert_eq!(s.blocks().calls().collect::<Vec<_>>(), vec![(0xF000, 0xF003)]);

	let succs: Vec<u16> = s.cfg().successors(0xF007).collect();
	assert_eq!(succs, vec![0xF003]);

	// bcc after the return reads C, so it's live out of the subroutine but not into it.
	let sub = s.block(0xF007).unwrap();
	assert_eq!(sub.live_out, FlagSet::C);
	assert!(!sub.gen.contains(FlagSet::C));
}

#[test]
fn unresolvable_indirect_jump() {
	// jmp ($0200)
	let img = MemoryImage::load(&[0x6C, 0x00, 0x02], 0xF000).unwrap();
	let err = Translation::analyze(img, TranslateConfig::default()).err().unwrap();

	assert!(matches!(err, TranslateError::UnresolvableJump {
		at: 0xF000, ptr: 0x0200, during: Stage::Discovery, .. }));
	assert!(err.to_string().contains("general RAM"));
	assert!(err.to_string().contains("(while discovering control flow)"), "{}", err);
}

#[test]
fn scan_markers() {
	let mut img = MemoryImage::load(&[0x00, 0x00], 0xF000).unwrap();

	// a jump sitting in the skipped range is never seen...
	img.write_u8(0xF010, 0x4C);
	img.write_u8(0xF011, 0x00);
	img.write_u8(0xF012, 0xF1);
	// ...but one after the resume point is.
	img.write_u8(0xF020, 0x4C);
	img.write_u8(0xF021, 0x00);
	img.write_u8(0xF022, 0xF2);

	let markers = ScanMarkers { resume: Some((0xF00C, 0xF020)), stop: Some(0xF031) };
	let found = discover(&img, &crate::memory::MemoryLayout::default(), &markers).unwrap();

	assert!(!found.is_leader(0xF100));
	assert!(found.is_leader(0xF200));
	assert_eq!(found.transfers, vec![(0xF020, 0xF200)]);
}

// ------------------------------------------------------------------------------------------------
// Liveness
// ------------------------------------------------------------------------------------------------

#[test]
fn liveness_is_a_fixed_point() {
	for raw in &[SCENARIO, SCENARIO_CLC, CALL_RETURN] {
		let s = analyze(raw);
		let stats = s.liveness();
		assert!(stats.passes >= 1);
		assert!(stats.passes <= stats.blocks + 1, "{:?}", stats);

		// one more run changes nothing, and notices so after a single pass.
		let mut blocks = s.blocks().clone();
		let again = liveness::solve(&mut blocks, s.cfg());
		assert_eq!(again.passes, 1);
		assert_eq!(&blocks, s.blocks());
	}
}

#[test]
fn summaries() {
	use liveness::summarize;

	// cmp defines C before bcc reads it, so C isn't read from outside.
	let (gen, kill) = summarize(
		&[FlagSet::C | FlagSet::D, FlagSet::empty(), FlagSet::C],
		&[FlagSet::NVZC, FlagSet::NZC, FlagSet::empty()]);
	assert_eq!(gen, FlagSet::C | FlagSet::D);
	assert_eq!(kill, FlagSet::NVZC);

	let (gen, kill) = summarize(&[FlagSet::empty(), FlagSet::C], &[FlagSet::NZC, FlagSet::empty()]);
	assert_eq!(gen, FlagSet::empty());
	assert_eq!(kill, FlagSet::NZC);
}

#[test]
fn dead_flags() {
	let s = analyze(SCENARIO_CLC);

	// adc reads C (set up by clc) and D, so both are live around the loop.
	let head = s.block(0xF000).unwrap();
	assert_eq!(head.live_out, FlagSet::C | FlagSet::D);
	assert_eq!(head.gen, FlagSet::D);

	let body = s.block(0xF006).unwrap();
	let after = liveness::live_after(body);

	// adc's result flags are all overwritten by cmp before anything reads them...
	assert_eq!(body.defs[0] & after[0], FlagSet::empty());
	// ...and of cmp's, only C matters.
	assert_eq!(body.defs[1] & after[1], FlagSet::C);

	// lda's N and Z are never read.
	let after = liveness::live_after(head);
	assert_eq!(head.defs[1] & after[1], FlagSet::empty());
	assert_eq!(head.defs[0] & after[0], FlagSet::C);

	// nothing is live after the final brk.
	assert_eq!(s.block(0xF00C).unwrap().live_out, FlagSet::empty());
}

#[test]
fn reachability_and_dot() {
	let s = analyze(CALL_RETURN);

	for bb in s.blocks().iter() {
		assert!(s.is_reachable(bb.start), "${:04X}", bb.start);
	}

	let dot = s.to_dot();
	assert!(dot.starts_with("digraph"));
	assert!(dot.contains("label = \"$F007\""));
}

#[test]
fn custom_layout_and_markers() {
	use crate::memory::{ MemoryLayout, MemoryRegion, Region, DEFAULT_RAM_WINDOW };

	// sta $0200; brk
	const STORE: &[u8] = &[0x8D, 0x00, 0x02, 0x00, 0x00];

	let s = analyze(STORE);
	assert_eq!(s.block(0xF000).unwrap().term, BlockEnd::Halt);

	let regions = [
		MemoryRegion::new("PORTS", 0x0200, 0x02FF, Region::MappedIo),
		MemoryRegion::new("ROM",   0xF000, 0xFFFF, Region::PrimaryRom),
	];

	let config = TranslateConfig::default()
		.with_layout(MemoryLayout::new(&regions, DEFAULT_RAM_WINDOW).unwrap())
		.with_scan(ScanMarkers { resume: None, stop: Some(0xF005) });

	let s = analyze_with(STORE, config);
	assert_eq!(s.block(0xF000).unwrap().term, BlockEnd::Io { next: 0xF003 });
	assert_eq!(s.block(0xF003).unwrap().term, BlockEnd::Halt);
}
