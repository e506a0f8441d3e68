use super::*;

use crate::arch::{ lookup_desc, INST_DESCS };
use crate::memory::{ MemoryImage, MemoryLayout };

fn inst(bytes: &[u8]) -> Inst {
	let mut img = MemoryImage::new();

	for (i, b) in bytes.iter().enumerate() {
		img.write_u8(0x0200 + i as u16, *b);
	}

	Inst::decode(&img, 0x0200).unwrap()
}

fn effect(bytes: &[u8]) -> FlagEffect {
	let inst = inst(bytes);
	handler_for(inst.desc()).classify(&inst)
}

#[test]
fn every_opcode_has_a_handler() {
	assert_eq!(HANDLERS.len(), 256);

	for desc in INST_DESCS.iter() {
		let handler = handler_for(desc);
		assert_eq!(handler.length(desc), desc.len(), "opcode 0x{:02X}", desc.opcode);

		if desc.meta_op.is_illegal() {
			assert_eq!(handler, OpHandler::from(Illegal), "opcode 0x{:02X}", desc.opcode);
		}
	}

	// undocumented NOPs are plain NOPs.
	assert_eq!(handler_for(&lookup_desc(0x04)), OpHandler::from(Nop));
	assert_eq!(handler_for(&lookup_desc(0xEA)), OpHandler::from(Nop));
	assert_eq!(handler_for(&lookup_desc(0xA9)), OpHandler::from(Load { reg: Reg::A }));
	assert_eq!(handler_for(&lookup_desc(0x90)), OpHandler::from(Branch { flag: FlagSet::C, when_set: false }));
}

#[test]
fn classification() {
	// lda #$41
	assert_eq!(effect(&[0xA9, 0x41]), FlagEffect::defs(FlagSet::NZ));
	// sta $8B00
	assert_eq!(effect(&[0x8D, 0x00, 0x8B]), FlagEffect::NONE);
	// adc #$01
	assert_eq!(effect(&[0x69, 0x01]), FlagEffect::new(FlagSet::C | FlagSet::D, FlagSet::NVZC));
	// sbc $10
	assert_eq!(effect(&[0xE5, 0x10]), FlagEffect::new(FlagSet::C | FlagSet::D, FlagSet::NVZC));
	// cmp #$5B
	assert_eq!(effect(&[0xC9, 0x5B]), FlagEffect::defs(FlagSet::NZC));
	// bcc
	assert_eq!(effect(&[0x90, 0xF7]), FlagEffect::uses(FlagSet::C));
	// beq
	assert_eq!(effect(&[0xF0, 0x02]), FlagEffect::uses(FlagSet::Z));
	// bit $20
	assert_eq!(effect(&[0x24, 0x20]), FlagEffect::defs(FlagSet::NVZ));
	// asl a, rol a
	assert_eq!(effect(&[0x0A]), FlagEffect::defs(FlagSet::NZC));
	assert_eq!(effect(&[0x2A]), FlagEffect::new(FlagSet::C, FlagSet::NZC));
	// inx, dec $10
	assert_eq!(effect(&[0xE8]), FlagEffect::defs(FlagSet::NZ));
	assert_eq!(effect(&[0xC6, 0x10]), FlagEffect::defs(FlagSet::NZ));
	// tax sets flags, txs doesn't
	assert_eq!(effect(&[0xAA]), FlagEffect::defs(FlagSet::NZ));
	assert_eq!(effect(&[0x9A]), FlagEffect::NONE);
	// clc, sed, clv
	assert_eq!(effect(&[0x18]), FlagEffect::defs(FlagSet::C));
	assert_eq!(effect(&[0xF8]), FlagEffect::defs(FlagSet::D));
	assert_eq!(effect(&[0xB8]), FlagEffect::defs(FlagSet::V));
	// php reads everything, plp and rti write everything
	assert_eq!(effect(&[0x08]), FlagEffect::uses(FlagSet::all()));
	assert_eq!(effect(&[0x28]), FlagEffect::defs(FlagSet::all()));
	assert_eq!(effect(&[0x40]), FlagEffect::defs(FlagSet::all()));
	// jmp, jsr, rts, nop touch nothing
	assert_eq!(effect(&[0x4C, 0x00, 0xF0]), FlagEffect::NONE);
	assert_eq!(effect(&[0x20, 0x00, 0xF0]), FlagEffect::NONE);
	assert_eq!(effect(&[0x60]), FlagEffect::NONE);
	assert_eq!(effect(&[0xEA]), FlagEffect::NONE);
	// brk
	assert_eq!(effect(&[0x00, 0x00]), FlagEffect::defs(FlagSet::I));
}

#[test]
fn illegal_opcodes_read_every_flag() {
	// slo $10
	assert_eq!(effect(&[0x07, 0x10]), FlagEffect::uses(FlagSet::all()));
	// jam
	assert_eq!(effect(&[0x02]), FlagEffect::uses(FlagSet::all()));
}

#[test]
fn indirect_jump_resolves_through_rom() {
	let layout = MemoryLayout::default();
	let mut img = MemoryImage::new();

	// jmp ($F100), which holds $F234
	img.write_u8(0xF000, 0x6C);
	img.write_u8(0xF001, 0x00);
	img.write_u8(0xF002, 0xF1);
	img.write_u8(0xF100, 0x34);
	img.write_u8(0xF101, 0xF2);

	let op = Jump.resolve(&img, &layout, 0xF000).unwrap();
	assert_eq!(op, DecodedOperand { length: 3, is_static: true, value: 0xF234 });

	// an absolute jump is left alone.
	img.write_u8(0xF010, 0x4C);
	img.write_u8(0xF011, 0x00);
	img.write_u8(0xF012, 0xF0);
	let op = Jump.resolve(&img, &layout, 0xF010).unwrap();
	assert_eq!(op, DecodedOperand { length: 3, is_static: true, value: 0xF000 });

	// through a pointer in RAM, there's no telling where it goes.
	img.write_u8(0xF020, 0x6C);
	img.write_u8(0xF021, 0x00);
	img.write_u8(0xF022, 0x02);
	assert!(matches!(Jump.resolve(&img, &layout, 0xF020),
		Err(crate::error::TranslateError::UnresolvableJump {
			at: 0xF020, ptr: 0x0200, during: crate::error::Stage::Emit, .. })));
}

#[test]
fn request_names() {
	assert_eq!(Request::ClassifyFlags.to_string(), "classifying flags");
	assert_eq!(Request::Emit.to_string(), "emitting code");
}
