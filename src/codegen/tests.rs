use super::*;

use std::collections::HashMap;

use crate::config::{ BackendKind, IllegalOpcodePolicy, TranslateConfig };
use crate::error::UnsupportedSite;
use crate::memory::MemoryImage;

/// lda #$41; sta $8B00; adc #$01; cmp #$5B; bcc *-9; brk
const SCENARIO: &[u8] = &[0xA9, 0x41, 0x8D, 0x00, 0x8B, 0x69, 0x01, 0xC9, 0x5B, 0x90, 0xF7, 0x00];

/// The same, with `clc` in front.
const SCENARIO_CLC: &[u8] =
	&[0x18, 0xA9, 0x41, 0x8D, 0x00, 0x8B, 0x69, 0x01, 0xC9, 0x5B, 0x90, 0xF7, 0x00];

/// jsr $F007; bcc $F000; brk; (F007:) clc; rts
const CALL_RETURN: &[u8] = &[0x20, 0x07, 0xF0, 0x90, 0xFB, 0x00, 0x00, 0x18, 0x60];

fn translate_with(raw: &[u8], config: TranslateConfig) -> TranslateResult<String> {
	let img = MemoryImage::load(raw, 0xF000)?;
	Translation::analyze(img, config)?.translate()
}

fn translate(raw: &[u8]) -> String {
	translate_with(raw, TranslateConfig::default()).unwrap()
}

fn position(haystack: &str, needle: &str) -> usize {
	haystack.find(needle).unwrap_or_else(|| panic!("{:?} not in output", needle))
}

/// Lines at column 0 ending in a colon.
fn labels(out: &str) -> Vec<&str> {
	out.lines()
		.filter(|l| !l.starts_with(char::is_whitespace) && l.ends_with(':'))
		.collect()
}

// ------------------------------------------------------------------------------------------------
// Whole programs
// ------------------------------------------------------------------------------------------------

#[test]
fn sections_in_order() {
	let out = translate(SCENARIO);

	let prolog = position(&out, "#include <stdint.h>");
	let globals = position(&out, "uint8_t flags;");
	let helpers = position(&out, "void write8(");
	let main = position(&out, "int main(void) {");
	let epilog = position(&out, "ISR(TIMER1_OVF_vect)");

	assert!(prolog < globals && globals < helpers && helpers < main && main < epilog);
	assert!(out.contains("#define RRIOT_IO_MIN 0x8b00"));
	assert!(out.contains("#define CF 0"));
	assert!(out.contains("#define NF 7"));
}

#[test]
fn one_label_per_leader() {
	for raw in &[SCENARIO, SCENARIO_CLC, CALL_RETURN] {
		let out = translate(raw);
		let found = labels(&out);

		let mut counts = HashMap::new();

		for l in &found {
			*counts.entry(*l).or_insert(0) += 1;
		}

		assert!(counts.values().all(|&n| n == 1), "{:?}", found);
		assert_eq!(counts.get("Lf000:"), Some(&1));
	}

	let out = translate(SCENARIO);
	assert_eq!(labels(&out), vec!["Lf000:", "Lf002:"]);
}

#[test]
fn io_store_is_a_timing_checkpoint() {
	let out = translate(SCENARIO);
	assert!(out.contains(
		"\tcycles += 2;\nLf002:\n\t// $F002: sta $8B00\n\twrite8(0x8b00, ra);\n\tcycles += 4;\n"),
		"{}", out);

	// the taken branch pays its penalty, the fallthrough doesn't.
	assert!(out.contains("\tif (!(flags & (1 << CF))) {\n\t\tcycles += 7;\n\t\tgoto Lf002;\n\t}\n\tcycles += 6;\n"));

	let out = translate(SCENARIO_CLC);
	assert!(out.contains("\tra = 0x41;\n\tcycles += 4;\nLf003:\n"));
	assert!(out.contains("\twrite8(0x8b00, ra);\n\tcycles += 4;\n"));
}

#[test]
fn dead_flags_are_not_computed() {
	let out = translate(SCENARIO_CLC);

	assert!(out.contains("flags &= ~(1 << CF);"));
	assert!(out.contains("setflag(CF, ra >= 0x5b);"));
	assert!(!out.contains("setflag(ZF"));
	assert!(!out.contains("setflag(NF"));
	assert!(!out.contains("setflag(VF"));
	assert!(out.contains("\tra = (uint8_t) wide;\n"));

	let out = translate_with(SCENARIO_CLC, TranslateConfig::default().with_optimize(false)).unwrap();

	assert!(out.contains("setflag(NF, ra & 0x80);"));
	assert!(out.contains("setflag(ZF, ra == 0x5b);"));
	assert!(out.contains("setflag(VF, ~(ra ^ 0x01) & (ra ^ wide) & 0x80);"));
	assert!(out.contains("setflag(CF, ra >= 0x5b);"));
}

#[test]
fn only_needed_helpers_in_order() {
	let out = translate(SCENARIO);

	assert!(position(&out, "void write8(") < position(&out, "void setflag("));
	assert_eq!(out.matches("void write8(").count(), 1);
	assert_eq!(out.matches("void setflag(").count(), 1);
	assert!(!out.contains("uint8_t read8("));
	assert!(!out.contains("void push8("));
}

#[test]
fn decimal_mode_uses_helpers() {
	// sed; adc #$01; brk
	let out = translate(&[0xF8, 0x69, 0x01, 0x00, 0x00]);

	assert!(out.contains("flags |= (1 << DF);"));
	assert!(out.contains("\tra = add(ra, 0x01);\n"));

	let add = position(&out, "uint8_t add(");
	assert!(position(&out, "void setflag(") < add);
	assert!(position(&out, "uint8_t tobcd(") < add);
	assert!(position(&out, "uint8_t frombcd(") < add);
}

// ------------------------------------------------------------------------------------------------
// Memory
// ------------------------------------------------------------------------------------------------

#[test]
fn rom_stores_are_elided() {
	// sta $F100; sta $F100,X; brk
	let out = translate(&[0x8D, 0x00, 0xF1, 0x9D, 0x00, 0xF1, 0x00, 0x00]);

	assert_eq!(out.matches("// store to ROM elided").count(), 2);
	assert!(!out.contains("write8("));

	// the indexed one still reads.
	assert!(out.contains("\t(void) read8((uint16_t) (0xf100 + rx));\n"));
	assert!(out.contains("const uint8_t rom_f100[256] = {"));
}

#[test]
fn rom_reads() {
	// lda $F100; brk, with $42 at $F100
	let mut raw = vec![0; 0x102];
	raw[.. 3].copy_from_slice(&[0xAD, 0x00, 0xF1]);
	raw[0x100] = 0x42;

	let out = translate(&raw);
	assert!(out.contains("\tra = 0x42;\n"));
	assert!(!out.contains("read8("));
	assert!(!out.contains("rom_"));

	// lda $F100,X; brk
	let out = translate(&[0xBD, 0x00, 0xF1, 0x00, 0x00]);
	assert!(out.contains("\tval = read8((uint16_t) (0xf100 + rx));\n\tra = val;\n"));
	assert!(out.contains("const uint8_t rom_f100[256] = {"));
	assert!(out.contains("if (address >= 0xf100 && address <= 0xf1ff) return rom_f100[address - 0xf100];"));
}

#[test]
fn rom_shadows_merge() {
	let mut shadows = RomShadows::new();
	shadows.add(0xF010, 0xF020);
	shadows.add(0xF021, 0xF030);
	shadows.add(0xF040, 0xF050);
	assert_eq!(shadows.iter().collect::<Vec<_>>(), vec![(0xF010, 0xF030), (0xF040, 0xF050)]);
	assert_eq!(shadows.byte_count(), 0x21 + 0x11);

	shadows.add(0xF000, 0xF045);
	assert_eq!(shadows.iter().collect::<Vec<_>>(), vec![(0xF000, 0xF050)]);

	shadows.add(0xFF00, 0xFFFF);
	assert_eq!(shadows.iter().last(), Some((0xFF00, 0xFFFF)));
	assert_eq!(RomShadows::table_name(0xFF00), "rom_ff00");
}

#[test]
fn helper_registry() {
	let deps = |h: HelperId| Portable.helper_deps(h);
	let mut helpers = HelperRegistry::new();

	assert!(helpers.request(HelperId::Push8, &deps));
	assert_eq!(helpers.iter().collect::<Vec<_>>(), vec![HelperId::Write8, HelperId::Push8]);

	assert!(!helpers.request(HelperId::Write8, &deps));
	assert!(!helpers.request(HelperId::Push8, &deps));

	assert!(helpers.request(HelperId::Add, &deps));
	assert!(helpers.request(HelperId::Sub, &deps));
	assert_eq!(helpers.iter().collect::<Vec<_>>(), vec![
		HelperId::Write8, HelperId::Push8, HelperId::SetFlag, HelperId::ToBcd,
		HelperId::FromBcd, HelperId::Add, HelperId::Sub,
	]);

	assert!(helpers.len() <= 9);
	assert_eq!(HelperId::FromBcd.to_string(), "frombcd");
}

// ------------------------------------------------------------------------------------------------
// Illegal opcodes
// ------------------------------------------------------------------------------------------------

#[test]
fn strict_policy_lists_every_site() {
	// slo $10; rla $10; brk
	let raw = &[0x07, 0x10, 0x27, 0x10, 0x00, 0x00];
	let err = translate_with(raw, TranslateConfig::default()).unwrap_err();

	match &err {
		TranslateError::UnsupportedOpcodes { count, backend, sites } => {
			assert_eq!((*count, *backend), (2, "c"));
			assert_eq!(sites.0, vec![
				UnsupportedSite { at: 0xF000, opcode: 0x07, mnemonic: "slo" },
				UnsupportedSite { at: 0xF002, opcode: 0x27, mnemonic: "rla" },
			]);
		}

		other => panic!("wrong error {:?}", other),
	}

	let msg = err.to_string();
	assert!(msg.contains("$F000: slo (opcode 0x07)"));
	assert!(msg.contains("$F002: rla (opcode 0x27)"));
}

#[test]
fn permissive_policy_skips() {
	let config = TranslateConfig::default().with_illegal_ops(IllegalOpcodePolicy::Permissive);
	let out = translate_with(&[0x07, 0x10, 0x00, 0x00], config.clone()).unwrap();
	assert!(out.contains("// slo skipped"));

	// jam stops the program.
	let out = translate_with(&[0x02], config).unwrap();
	assert!(out.contains("// $F000: jam\n"));
}

#[test]
fn illegal_opcodes_outside_blocks_are_ignored() {
	// jmp $F005; slo $10; brk
	let out = translate_with(&[0x4C, 0x05, 0xF0, 0x07, 0x10, 0x00, 0x00], TranslateConfig::default());
	assert!(out.is_ok());
}

// ------------------------------------------------------------------------------------------------
// Subroutines
// ------------------------------------------------------------------------------------------------

#[test]
fn portable_calls_use_the_jump_table() {
	let out = translate(CALL_RETURN);

	assert!(out.contains("\tgoto Lf000;\njump_table:\n\tswitch (address) {\n"));
	assert!(out.contains("case 0xf000: goto Lf003;"));
	assert!(out.contains("default: return 0;"));
	assert!(out.contains("\tcycles += 6;\n\tpush8(0xf0);\n\tpush8(0x02);\n\tgoto Lf007;\n"));
	assert!(out.contains("\taddress = pull8();\n\taddress |= (uint16_t) pull8() << 8;\n\taddress -= 2;\n\tgoto jump_table;\n"));
	assert!(labels(&out).contains(&"Lf003:"));
}

#[test]
fn rts_without_calls_ends_the_program() {
	// clc; rts
	let out = translate(&[0x18, 0x60]);
	assert!(!out.contains("jump_table"));
	assert!(!out.contains("pull8"));
}

#[test]
fn avr_calls_are_native() {
	let config = TranslateConfig::default().with_backend(BackendKind::Avr);
	let out = translate_with(CALL_RETURN, config).unwrap();

	assert!(out.contains("__asm__ volatile(\"rcall sub_f007\");"));
	assert!(out.contains("__asm__ volatile(\"sub_f007:\");"));
	assert!(out.contains("__asm__ volatile(\"ret\");"));
	assert!(out.contains("volatile register uint8_t rs asm(\"r13\");"));
	assert!(out.contains("__asm__ volatile(\"clc\");"));
	assert!(out.contains("if (!(SREG & (1 << SREG_C))) {"));
	assert!(!out.contains("jump_table"));
	assert!(out.contains("#include <avr/pgmspace.h>"));
}

#[test]
fn avr_guards_live_flags() {
	let config = TranslateConfig::default().with_backend(BackendKind::Avr);
	let out = translate_with(SCENARIO, config).unwrap();

	// C is live into the loop, so compiled C around the store must not clobber SREG.
	assert!(out.contains("\ttemp = SREG;\n\twrite8(0x8b00, ra);\n\tSREG = temp;\n"), "{}", out);
}

#[test]
fn avr_guards_the_carry_an_instruction_reads() {
	let config = TranslateConfig::default().with_backend(BackendKind::Avr);

	// clc; adc $10; sta $11; brk. adc's own results are dead, but the read of its operand still
	// sits between clc and the adc that consumes C.
	let out = translate_with(&[0x18, 0x65, 0x10, 0x85, 0x11, 0x00, 0x00], config.clone()).unwrap();
	let clc = position(&out, "__asm__ volatile(\"clc\");");
	let read = position(&out, "\ttemp = SREG;\n\tval = read8(0x0010);\n\tSREG = temp;\n");
	let adc = position(&out, "__asm__ volatile(\"adc %0, %1\"");
	assert!(clc < read && read < adc, "{}", out);

	// clc; rol $8B00; brk. the cycle update before the I/O access is compiled code too.
	let out = translate_with(&[0x18, 0x2E, 0x00, 0x8B, 0x00, 0x00], config).unwrap();
	assert!(out.contains("\ttemp = SREG;\n\tcycles += 2;\n\tSREG = temp;\n"), "{}", out);
	assert!(out.contains("\ttemp = SREG;\n\tval = read8(0x8b00);\n\tSREG = temp;\n"), "{}", out);
}

#[test]
fn only_used_registers_are_declared() {
	let out = translate(SCENARIO);
	assert!(out.contains("\nuint8_t ra;\n"), "{}", out);
	assert!(out.contains("\tra = 0;\n"));
	assert!(!out.contains("rx = 0;"));
	assert!(!out.contains("rs = 0xfd;"));

	// ldx #$05; dex; sta $0200,y; brk
	let indexed: &[u8] = &[0xA2, 0x05, 0xCA, 0x99, 0x00, 0x02, 0x00, 0x00];
	let out = translate(indexed);
	assert!(out.contains("\nuint8_t ra, rx, ry;\n"), "{}", out);

	let out = translate_with(indexed, TranslateConfig::default().with_optimize(false)).unwrap();
	assert!(out.contains("\nuint8_t ra, rx, ry, rs;\n"));
	assert!(out.contains("\trs = 0xfd;\n"));

	let out = translate_with(SCENARIO, TranslateConfig::default().with_backend(BackendKind::Avr))
		.unwrap();
	assert!(out.contains("volatile register uint8_t ra asm(\"r10\");"));
	assert!(out.contains("volatile register uint8_t temp asm(\"r14\");"));
	assert!(!out.contains("asm(\"r11\")"));
	assert!(!out.contains("asm(\"r13\")"));
}

// ------------------------------------------------------------------------------------------------
// Timer runtime
// ------------------------------------------------------------------------------------------------

#[test]
fn zero_tick_checkpoints_expire_at_once() {
	// inc $8B00; brk. the write syncs right after the read, with no cycles in between.
	let out = translate(&[0xEE, 0x00, 0x8B, 0x00, 0x00]);
	let read = position(&out, "\tval = read8(0x8b00);\n");
	let write = position(&out, "\twrite8(0x8b00, val);\n");
	assert!(read < write);
	assert!(!out[read .. write].contains("cycles +="));

	assert!(out.contains(concat!(
		"void sync_io(uint8_t value, uint8_t is_write) {\n",
		"\tuint32_t ticks = cycles * CLOCK_RATIO;\n",
		"\tuint16_t low = (uint16_t) (ticks & 0xffff);\n",
		"\tcycles = 0;\n",
		"\twhile (wait) { }\n",
		"\tioValue = value;\n",
		"\tio = is_write;\n",
		"\toverflow = (uint8_t) (ticks >> 16);\n",
		"\tif (low == 0) {\n",
		"\t\tif (overflow) overflow--;\n",
		"\t\telse low = 1;\n",
		"\t}\n",
		"\twait = 1;\n",
		"\tset_up_timer((uint16_t) (0x10000 - low));\n",
		"}\n")), "{}", out);

	// whole periods count down in the overflow handler before the I/O goes out.
	assert!(out.contains(concat!(
		"ISR(TIMER1_OVF_vect) {\n",
		"\tif (overflow) {\n",
		"\t\toverflow--;\n",
		"\t\treturn;\n",
		"\t}\n",
		"\tif (io == 1) putChar(ioValue);\n")), "{}", out);
}

// ------------------------------------------------------------------------------------------------
// CodeWriter
// ------------------------------------------------------------------------------------------------

#[test]
fn code_writer() {
	let mut out = CodeWriter::new();
	writeln!(out, "int x;");
	out.block("if (x)", |out| {
		writeln!(out, "x = {};", 1);
		out.label("Lf000");
		writeln!(out, "x++;");
	});
	out.blank();
	write!(out, "a");
	write!(out, "b\n");

	assert_eq!(out.as_str(), "int x;\nif (x) {\n\tx = 1;\nLf000:\n\tx++;\n}\n\nab\n");
}
