use super::{ InstDesc, MetaOp, AddrMode };

// ------------------------------------------------------------------------------------------------
// InstDesc table
// ------------------------------------------------------------------------------------------------

/// Looks up the description of an opcode. Every byte has one.
pub fn lookup_desc(opcode: u8) -> InstDesc {
	INST_DESCS[opcode as usize]
}

use MetaOp::*;
use AddrMode::*;

/// A documented instruction.
const fn doc(opcode: u8, meta_op: MetaOp, addr_mode: AddrMode, cycles: u8) -> InstDesc {
	InstDesc { opcode, meta_op, addr_mode, cycles, undocumented: false }
}

/// An undocumented ("illegal") instruction.
const fn und(opcode: u8, meta_op: MetaOp, addr_mode: AddrMode, cycles: u8) -> InstDesc {
	InstDesc { opcode, meta_op, addr_mode, cycles, undocumented: true }
}

/// All 256 opcodes, indexed by opcode byte. Cycle counts are NMOS base costs, without the
/// taken-branch and page-crossing extras.
pub const INST_DESCS: [InstDesc; 256] = [
	// 0x00
	doc(0x00, BRK,  IMM, 7),
	doc(0x01, ORA,  IZX, 6),
	und(0x02, JAM,  IMP, 2),
	und(0x03, SLO,  IZX, 8),
	und(0x04, NOP,  ZPG, 3),
	doc(0x05, ORA,  ZPG, 3),
	doc(0x06, ASL,  ZPG, 5),
	und(0x07, SLO,  ZPG, 5),
	doc(0x08, PHP,  IMP, 3),
	doc(0x09, ORA,  IMM, 2),
	doc(0x0A, ASLA, IMP, 2),
	und(0x0B, ANC,  IMM, 2),
	und(0x0C, NOP,  ABS, 4),
	doc(0x0D, ORA,  ABS, 4),
	doc(0x0E, ASL,  ABS, 6),
	und(0x0F, SLO,  ABS, 6),

	// 0x10
	doc(0x10, BPL,  REL, 2),
	doc(0x11, ORA,  IZY, 5),
	und(0x12, JAM,  IMP, 2),
	und(0x13, SLO,  IZY, 8),
	und(0x14, NOP,  ZPX, 4),
	doc(0x15, ORA,  ZPX, 4),
	doc(0x16, ASL,  ZPX, 6),
	und(0x17, SLO,  ZPX, 6),
	doc(0x18, CLC,  IMP, 2),
	doc(0x19, ORA,  ABY, 4),
	und(0x1A, NOP,  IMP, 2),
	und(0x1B, SLO,  ABY, 7),
	und(0x1C, NOP,  ABX, 4),
	doc(0x1D, ORA,  ABX, 4),
	doc(0x1E, ASL,  ABX, 7),
	und(0x1F, SLO,  ABX, 7),

	// 0x20
	doc(0x20, JSR,  LAB, 6),
	doc(0x21, AND,  IZX, 6),
	und(0x22, JAM,  IMP, 2),
	und(0x23, RLA,  IZX, 8),
	doc(0x24, BIT,  ZPG, 3),
	doc(0x25, AND,  ZPG, 3),
	doc(0x26, ROL,  ZPG, 5),
	und(0x27, RLA,  ZPG, 5),
	doc(0x28, PLP,  IMP, 4),
	doc(0x29, AND,  IMM, 2),
	doc(0x2A, ROLA, IMP, 2),
	und(0x2B, ANC,  IMM, 2),
	doc(0x2C, BIT,  ABS, 4),
	doc(0x2D, AND,  ABS, 4),
	doc(0x2E, ROL,  ABS, 6),
	und(0x2F, RLA,  ABS, 6),

	// 0x30
	doc(0x30, BMI,  REL, 2),
	doc(0x31, AND,  IZY, 5),
	und(0x32, JAM,  IMP, 2),
	und(0x33, RLA,  IZY, 8),
	und(0x34, NOP,  ZPX, 4),
	doc(0x35, AND,  ZPX, 4),
	doc(0x36, ROL,  ZPX, 6),
	und(0x37, RLA,  ZPX, 6),
	doc(0x38, SEC,  IMP, 2),
	doc(0x39, AND,  ABY, 4),
	und(0x3A, NOP,  IMP, 2),
	und(0x3B, RLA,  ABY, 7),
	und(0x3C, NOP,  ABX, 4),
	doc(0x3D, AND,  ABX, 4),
	doc(0x3E, ROL,  ABX, 7),
	und(0x3F, RLA,  ABX, 7),

	// 0x40
	doc(0x40, RTI,  IMP, 6),
	doc(0x41, EOR,  IZX, 6),
	und(0x42, JAM,  IMP, 2),
	und(0x43, SRE,  IZX, 8),
	und(0x44, NOP,  ZPG, 3),
	doc(0x45, EOR,  ZPG, 3),
	doc(0x46, LSR,  ZPG, 5),
	und(0x47, SRE,  ZPG, 5),
	doc(0x48, PHA,  IMP, 3),
	doc(0x49, EOR,  IMM, 2),
	doc(0x4A, LSRA, IMP, 2),
	und(0x4B, ALR,  IMM, 2),
	doc(0x4C, JMP,  LAB, 3),
	doc(0x4D, EOR,  ABS, 4),
	doc(0x4E, LSR,  ABS, 6),
	und(0x4F, SRE,  ABS, 6),

	// 0x50
	doc(0x50, BVC,  REL, 2),
	doc(0x51, EOR,  IZY, 5),
	und(0x52, JAM,  IMP, 2),
	und(0x53, SRE,  IZY, 8),
	und(0x54, NOP,  ZPX, 4),
	doc(0x55, EOR,  ZPX, 4),
	doc(0x56, LSR,  ZPX, 6),
	und(0x57, SRE,  ZPX, 6),
	doc(0x58, CLI,  IMP, 2),
	doc(0x59, EOR,  ABY, 4),
	und(0x5A, NOP,  IMP, 2),
	und(0x5B, SRE,  ABY, 7),
	und(0x5C, NOP,  ABX, 4),
	doc(0x5D, EOR,  ABX, 4),
	doc(0x5E, LSR,  ABX, 7),
	und(0x5F, SRE,  ABX, 7),

	// 0x60
	doc(0x60, RTS,  IMP, 6),
	doc(0x61, ADC,  IZX, 6),
	und(0x62, JAM,  IMP, 2),
	und(0x63, RRA,  IZX, 8),
	und(0x64, NOP,  ZPG, 3),
	doc(0x65, ADC,  ZPG, 3),
	doc(0x66, ROR,  ZPG, 5),
	und(0x67, RRA,  ZPG, 5),
	doc(0x68, PLA,  IMP, 4),
	doc(0x69, ADC,  IMM, 2),
	doc(0x6A, RORA, IMP, 2),
	und(0x6B, ARR,  IMM, 2),
	doc(0x6C, JMP,  IND, 5),
	doc(0x6D, ADC,  ABS, 4),
	doc(0x6E, ROR,  ABS, 6),
	und(0x6F, RRA,  ABS, 6),

	// 0x70
	doc(0x70, BVS,  REL, 2),
	doc(0x71, ADC,  IZY, 5),
	und(0x72, JAM,  IMP, 2),
	und(0x73, RRA,  IZY, 8),
	und(0x74, NOP,  ZPX, 4),
	doc(0x75, ADC,  ZPX, 4),
	doc(0x76, ROR,  ZPX, 6),
	und(0x77, RRA,  ZPX, 6),
	doc(0x78, SEI,  IMP, 2),
	doc(0x79, ADC,  ABY, 4),
	und(0x7A, NOP,  IMP, 2),
	und(0x7B, RRA,  ABY, 7),
	und(0x7C, NOP,  ABX, 4),
	doc(0x7D, ADC,  ABX, 4),
	doc(0x7E, ROR,  ABX, 7),
	und(0x7F, RRA,  ABX, 7),

	// 0x80
	und(0x80, NOP,  IMM, 2),
	doc(0x81, STA,  IZX, 6),
	und(0x82, NOP,  IMM, 2),
	und(0x83, SAX,  IZX, 6),
	doc(0x84, STY,  ZPG, 3),
	doc(0x85, STA,  ZPG, 3),
	doc(0x86, STX,  ZPG, 3),
	und(0x87, SAX,  ZPG, 3),
	doc(0x88, DEY,  IMP, 2),
	und(0x89, NOP,  IMM, 2),
	doc(0x8A, TXA,  IMP, 2),
	und(0x8B, XAA,  IMM, 2),
	doc(0x8C, STY,  ABS, 4),
	doc(0x8D, STA,  ABS, 4),
	doc(0x8E, STX,  ABS, 4),
	und(0x8F, SAX,  ABS, 4),

	// 0x90
	doc(0x90, BCC,  REL, 2),
	doc(0x91, STA,  IZY, 6),
	und(0x92, JAM,  IMP, 2),
	und(0x93, SHA,  IZY, 6),
	doc(0x94, STY,  ZPX, 4),
	doc(0x95, STA,  ZPX, 4),
	doc(0x96, STX,  ZPY, 4),
	und(0x97, SAX,  ZPY, 4),
	doc(0x98, TYA,  IMP, 2),
	doc(0x99, STA,  ABY, 5),
	doc(0x9A, TXS,  IMP, 2),
	und(0x9B, TAS,  ABY, 5),
	und(0x9C, SHY,  ABX, 5),
	doc(0x9D, STA,  ABX, 5),
	und(0x9E, SHX,  ABY, 5),
	und(0x9F, SHA,  ABY, 5),

	// 0xA0
	doc(0xA0, LDY,  IMM, 2),
	doc(0xA1, LDA,  IZX, 6),
	doc(0xA2, LDX,  IMM, 2),
	und(0xA3, LAX,  IZX, 6),
	doc(0xA4, LDY,  ZPG, 3),
	doc(0xA5, LDA,  ZPG, 3),
	doc(0xA6, LDX,  ZPG, 3),
	und(0xA7, LAX,  ZPG, 3),
	doc(0xA8, TAY,  IMP, 2),
	doc(0xA9, LDA,  IMM, 2),
	doc(0xAA, TAX,  IMP, 2),
	und(0xAB, LAX,  IMM, 2),
	doc(0xAC, LDY,  ABS, 4),
	doc(0xAD, LDA,  ABS, 4),
	doc(0xAE, LDX,  ABS, 4),
	und(0xAF, LAX,  ABS, 4),

	// 0xB0
	doc(0xB0, BCS,  REL, 2),
	doc(0xB1, LDA,  IZY, 5),
	und(0xB2, JAM,  IMP, 2),
	und(0xB3, LAX,  IZY, 5),
	doc(0xB4, LDY,  ZPX, 4),
	doc(0xB5, LDA,  ZPX, 4),
	doc(0xB6, LDX,  ZPY, 4),
	und(0xB7, LAX,  ZPY, 4),
	doc(0xB8, CLV,  IMP, 2),
	doc(0xB9, LDA,  ABY, 4),
	doc(0xBA, TSX,  IMP, 2),
	und(0xBB, LAS,  ABY, 4),
	doc(0xBC, LDY,  ABX, 4),
	doc(0xBD, LDA,  ABX, 4),
	doc(0xBE, LDX,  ABY, 4),
	und(0xBF, LAX,  ABY, 4),

	// 0xC0
	doc(0xC0, CPY,  IMM, 2),
	doc(0xC1, CMP,  IZX, 6),
	und(0xC2, NOP,  IMM, 2),
	und(0xC3, DCP,  IZX, 8),
	doc(0xC4, CPY,  ZPG, 3),
	doc(0xC5, CMP,  ZPG, 3),
	doc(0xC6, DEC,  ZPG, 5),
	und(0xC7, DCP,  ZPG, 5),
	doc(0xC8, INY,  IMP, 2),
	doc(0xC9, CMP,  IMM, 2),
	doc(0xCA, DEX,  IMP, 2),
	und(0xCB, SBX,  IMM, 2),
	doc(0xCC, CPY,  ABS, 4),
	doc(0xCD, CMP,  ABS, 4),
	doc(0xCE, DEC,  ABS, 6),
	und(0xCF, DCP,  ABS, 6),

	// 0xD0
	doc(0xD0, BNE,  REL, 2),
	doc(0xD1, CMP,  IZY, 5),
	und(0xD2, JAM,  IMP, 2),
	und(0xD3, DCP,  IZY, 8),
	und(0xD4, NOP,  ZPX, 4),
	doc(0xD5, CMP,  ZPX, 4),
	doc(0xD6, DEC,  ZPX, 6),
	und(0xD7, DCP,  ZPX, 6),
	doc(0xD8, CLD,  IMP, 2),
	doc(0xD9, CMP,  ABY, 4),
	und(0xDA, NOP,  IMP, 2),
	und(0xDB, DCP,  ABY, 7),
	und(0xDC, NOP,  ABX, 4),
	doc(0xDD, CMP,  ABX, 4),
	doc(0xDE, DEC,  ABX, 7),
	und(0xDF, DCP,  ABX, 7),

	// 0xE0
	doc(0xE0, CPX,  IMM, 2),
	doc(0xE1, SBC,  IZX, 6),
	und(0xE2, NOP,  IMM, 2),
	und(0xE3, ISC,  IZX, 8),
	doc(0xE4, CPX,  ZPG, 3),
	doc(0xE5, SBC,  ZPG, 3),
	doc(0xE6, INC,  ZPG, 5),
	und(0xE7, ISC,  ZPG, 5),
	doc(0xE8, INX,  IMP, 2),
	doc(0xE9, SBC,  IMM, 2),
	doc(0xEA, NOP,  IMP, 2),
	und(0xEB, USBC, IMM, 2),
	doc(0xEC, CPX,  ABS, 4),
	doc(0xED, SBC,  ABS, 4),
	doc(0xEE, INC,  ABS, 6),
	und(0xEF, ISC,  ABS, 6),

	// 0xF0
	doc(0xF0, BEQ,  REL, 2),
	doc(0xF1, SBC,  IZY, 5),
	und(0xF2, JAM,  IMP, 2),
	und(0xF3, ISC,  IZY, 8),
	und(0xF4, NOP,  ZPX, 4),
	doc(0xF5, SBC,  ZPX, 4),
	doc(0xF6, INC,  ZPX, 6),
	und(0xF7, ISC,  ZPX, 6),
	doc(0xF8, SED,  IMP, 2),
	doc(0xF9, SBC,  ABY, 4),
	und(0xFA, NOP,  IMP, 2),
	und(0xFB, ISC,  ABY, 7),
	und(0xFC, NOP,  ABX, 4),
	doc(0xFD, SBC,  ABX, 4),
	doc(0xFE, INC,  ABX, 7),
	und(0xFF, ISC,  ABX, 7),
];
