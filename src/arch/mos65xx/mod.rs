use std::fmt::{ Display, Formatter, Result as FmtResult };

use bitflags::bitflags;
use parse_display::Display;

use crate::error::{ Stage, TranslateError, TranslateResult };
use crate::memory::{ ImageRead, MemoryLayout, Reach };

// ------------------------------------------------------------------------------------------------
// Sub-modules
// ------------------------------------------------------------------------------------------------

mod descs;

pub use descs::{ lookup_desc, INST_DESCS };

// ------------------------------------------------------------------------------------------------
// FlagSet
// ------------------------------------------------------------------------------------------------

bitflags! {
	/// A set of processor status flags, each at its bit position in the P register.
	#[derive(Default)]
	pub struct FlagSet: u8 {
		/// Carry.
		const C = 1 << 0;
		/// Zero.
		const Z = 1 << 1;
		/// Interrupt disable.
		const I = 1 << 2;
		/// Decimal mode.
		const D = 1 << 3;
		/// Break.
		const B = 1 << 4;
		/// Unused; always reads as 1.
		const U = 1 << 5;
		/// Overflow.
		const V = 1 << 6;
		/// Negative.
		const N = 1 << 7;

		const NZ   = Self::N.bits | Self::Z.bits;
		const NZC  = Self::N.bits | Self::Z.bits | Self::C.bits;
		const NVZ  = Self::N.bits | Self::V.bits | Self::Z.bits;
		const NVZC = Self::N.bits | Self::V.bits | Self::Z.bits | Self::C.bits;
	}
}

impl FlagSet {
	/// All single flags, from bit 0 up.
	pub const EACH: [FlagSet; 8] = [
		FlagSet::C, FlagSet::Z, FlagSet::I, FlagSet::D,
		FlagSet::B, FlagSet::U, FlagSet::V, FlagSet::N,
	];

	/// Bit number of a single flag.
	pub fn bit(self) -> u32 {
		debug_assert_eq!(self.bits().count_ones(), 1);
		self.bits().trailing_zeros()
	}

	/// Name of a single flag's bit-number constant in generated code.
	pub fn const_name(self) -> &'static str {
		["CF", "ZF", "IF", "DF", "BF", "UF", "VF", "NF"][self.bit() as usize]
	}

	/// Iterates over the single flags in this set, from bit 0 up.
	pub fn iter(self) -> impl Iterator<Item = FlagSet> {
		FlagSet::EACH.iter().copied().filter(move |f| self.contains(*f))
	}
}

// ------------------------------------------------------------------------------------------------
// Reg
// ------------------------------------------------------------------------------------------------

/// 65xx registers, displayed as the variables that hold them in generated code.
#[derive(Debug, Display, PartialEq, Eq, Copy, Clone)]
pub enum Reg {
	#[display("ra")] A,
	#[display("rx")] X,
	#[display("ry")] Y,
	#[display("rs")] S,
}

impl Reg {
	/// In declaration order.
	pub const EACH: [Reg; 4] = [Reg::A, Reg::X, Reg::Y, Reg::S];

	/// This register's bit in a [`RegSet`].
	pub fn bit(self) -> RegSet {
		match self {
			Reg::A => RegSet::A,
			Reg::X => RegSet::X,
			Reg::Y => RegSet::Y,
			Reg::S => RegSet::S,
		}
	}
}

bitflags! {
	/// A set of registers.
	#[derive(Default)]
	pub struct RegSet: u8 {
		const A = 1 << 0;
		const X = 1 << 1;
		const Y = 1 << 2;
		const S = 1 << 3;
	}
}

impl RegSet {
	/// Iterates over the registers in this set, in declaration order.
	pub fn regs(self) -> impl Iterator<Item = Reg> {
		Reg::EACH.iter().copied().filter(move |r| self.contains(r.bit()))
	}
}

// ------------------------------------------------------------------------------------------------
// AddrMode
// ------------------------------------------------------------------------------------------------

/// All 65xx addressing modes.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum AddrMode {
	/// Implied (no operand bytes), e.g. `rol`.
	IMP,
	/// Immediate (1 byte), e.g. `lda #$30`.
	IMM,

	/// Zero-page absolute (1 byte), e.g. `lda $10`.
	ZPG,
	/// Zero-page, X-indexed (1 byte), e.g. `lda $80,X`.
	ZPX,
	/// Zero-page, Y-indexed (1 byte), e.g. `lda $80,Y`.
	ZPY,

	/// Absolute (2 bytes), e.g. `lda $8040`.
	ABS,
	/// Absolute, X-indexed (2 bytes), e.g. `lda $8040,X`
	ABX,
	/// Absolute, Y-indexed (2 bytes), e.g. `lda $8040,Y`
	ABY,

	/// Indirect (2 bytes); used only for indirect jump i.e. `jmp ($2000)`.
	IND,
	/// "Indexed Indirect" - double-indirect zero-page X-indexed (1 byte), e.g. `lda ($10,X)`.
	/// Loads a 2-byte address from `X + offset`, then accesses the byte at that address.
	IZX,
	/// "Indirect Indexed" - double-indirect zero-page Y-indexed (1 byte), e.g. `lda ($10),Y`.
	/// Loads a 2-byte address from `offset`, then accesses the byte at `Y + address`.
	IZY,

	/// PC-relative (1 byte), e.g. `bcc whatever`.
	/// Signed offset added to PC (+2 for size of branch instruction).
	REL,
	/// Alias for `ABS` but for `jmp`/`jsr` instructions, to distinguish their operand types.
	LAB,
}

impl AddrMode {
	/// How many operand bytes are needed for this mode?
	pub fn op_bytes(self) -> usize {
		use AddrMode::*;
		match self {
			IMP => 0,
			IZX | IZY | ZPG | ZPX | ZPY | IMM | REL => 1,
			ABS | ABX | ABY | IND | LAB => 2,
		}
	}

	/// Length of a whole instruction in this mode, opcode included.
	pub fn inst_len(self) -> usize {
		1 + self.op_bytes()
	}

	/// The index register this mode adds to its operand, if any.
	pub fn index_register(self) -> RegSet {
		use AddrMode::*;
		match self {
			ZPX | ABX | IZX => RegSet::X,
			ZPY | ABY | IZY => RegSet::Y,
			_               => RegSet::empty(),
		}
	}

	/// Is the effective address known without running the program?
	pub fn is_static(self) -> bool {
		use AddrMode::*;
		!matches!(self, ZPX | ZPY | ABX | ABY | IZX | IZY | IND)
	}

	/// Can a read in this mode take an extra cycle when indexing crosses a page?
	pub fn has_page_penalty(self) -> bool {
		use AddrMode::*;
		matches!(self, ABX | ABY | IZY)
	}

	/// Operand printing template.
	pub fn operand_template(self) -> &'static str {
		use AddrMode::*;
		match self {
			ABS | ZPG | REL | LAB => "${}",
			IMM                   => "#${}",
			ABX | ZPX             => "${},x",
			ABY | ZPY             => "${},y",
			IND                   => "(${})",
			IZX                   => "(${},x)",
			IZY                   => "(${}),y",
			IMP                   => "",
		}
	}
}

// ------------------------------------------------------------------------------------------------
// MetaOp
// ------------------------------------------------------------------------------------------------

/// The "fundamental operation" that an instruction performs, regardless of addressing mode.
/// Each meta-op can cover multiple real instructions with different addressing modes.
///
/// `ASLA, LSRA, ROLA` and `RORA` are the accumulator forms, split out because they work on a
/// register instead of memory. Everything after `TYA` is undocumented.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum MetaOp {
	ADC, AND,  ASLA, ASL,  BCC,  BCS,  BEQ,  BIT, BMI, BNE,
	BPL, BRK,  BVC,  BVS,  CLC,  CLD,  CLI,  CLV, CMP, CPX,
	CPY, DEC,  DEX,  DEY,  EOR,  INC,  INX,  INY, JMP, JSR,
	LDA, LDX,  LDY,  LSRA, LSR,  NOP,  ORA,  PHA, PHP, PLA,
	PLP, ROLA, ROL,  RORA, ROR,  RTI,  RTS,  SBC, SEC, SED,
	SEI, STA,  STX,  STY,  TAX,  TAY,  TSX,  TXA, TXS, TYA,

	ALR, ANC,  ARR,  DCP,  ISC,  JAM,  LAS,  LAX, RLA, RRA,
	SAX, SBX,  SHA,  SHX,  SHY,  SLO,  SRE,  TAS, USBC, XAA,
}

impl MetaOp {
	/// Registers an instruction with this operation reads or writes, leaving out the index
	/// register of its addressing mode. Anything that can push or pull counts as using S.
	/// Undocumented operations count as using every register.
	pub fn registers(self) -> RegSet {
		use MetaOp::*;
		match self {
			ADC | AND | ASLA | BIT | CMP | EOR | LDA | LSRA | ORA | ROLA | RORA | SBC | STA =>
				RegSet::A,
			CPX | DEX | INX | LDX | STX => RegSet::X,
			CPY | DEY | INY | LDY | STY => RegSet::Y,
			TAX | TXA => RegSet::A | RegSet::X,
			TAY | TYA => RegSet::A | RegSet::Y,
			TSX | TXS => RegSet::X | RegSet::S,
			PHA | PLA => RegSet::A | RegSet::S,
			PHP | PLP | JSR | RTS | RTI => RegSet::S,

			ASL | LSR | ROL | ROR | INC | DEC | JMP | NOP | JAM | BRK
			| BCC | BCS | BEQ | BMI | BNE | BPL | BVC | BVS
			| CLC | CLD | CLI | CLV | SEC | SED | SEI => RegSet::empty(),

			ALR | ANC | ARR | DCP | ISC | LAS | LAX | RLA | RRA | SAX
			| SBX | SHA | SHX | SHY | SLO | SRE | TAS | USBC | XAA => RegSet::all(),
		}
	}

	/// Instruction mnemonics
	pub fn mnemonic(self) -> &'static str {
		use MetaOp::*;
		match self {
			ADC  => "adc", AND  => "and", ASLA => "asl", ASL  => "asl",
			BCC  => "bcc", BCS  => "bcs", BEQ  => "beq", BIT  => "bit",
			BMI  => "bmi", BNE  => "bne", BPL  => "bpl", BRK  => "brk",
			BVC  => "bvc", BVS  => "bvs", CLC  => "clc", CLD  => "cld",
			CLI  => "cli", CLV  => "clv", CMP  => "cmp", CPX  => "cpx",
			CPY  => "cpy", DEC  => "dec", DEX  => "dex", DEY  => "dey",
			EOR  => "eor", INC  => "inc", INX  => "inx", INY  => "iny",
			JMP  => "jmp", JSR  => "jsr", LDA  => "lda", LDX  => "ldx",
			LDY  => "ldy", LSRA => "lsr", LSR  => "lsr", NOP  => "nop",
			ORA  => "ora", PHA  => "pha", PHP  => "php", PLA  => "pla",
			PLP  => "plp", ROLA => "rol", ROL  => "rol", RORA => "ror",
			ROR  => "ror", RTI  => "rti", RTS  => "rts", SBC  => "sbc",
			SEC  => "sec", SED  => "sed", SEI  => "sei", STA  => "sta",
			STX  => "stx", STY  => "sty", TAX  => "tax", TAY  => "tay",
			TSX  => "tsx", TXA  => "txa", TXS  => "txs", TYA  => "tya",

			ALR  => "alr", ANC  => "anc", ARR  => "arr", DCP  => "dcp",
			ISC  => "isc", JAM  => "jam", LAS  => "las", LAX  => "lax",
			RLA  => "rla", RRA  => "rra", SAX  => "sax", SBX  => "sbx",
			SHA  => "sha", SHX  => "shx", SHY  => "shy", SLO  => "slo",
			SRE  => "sre", TAS  => "tas", USBC => "usbc", XAA => "xaa",
		}
	}

	/// Is this one of the undocumented operations (as opposed to an undocumented NOP)?
	pub fn is_illegal(self) -> bool {
		use MetaOp::*;
		matches!(self,
			ALR | ANC | ARR | DCP | ISC | JAM | LAS | LAX | RLA | RRA |
			SAX | SBX | SHA | SHX | SHY | SLO | SRE | TAS | USBC | XAA)
	}

	/// For conditional branches, the flag tested and whether the branch is taken when it's set.
	pub fn branch_condition(self) -> Option<(FlagSet, bool)> {
		use MetaOp::*;
		match self {
			BCC => Some((FlagSet::C, false)),
			BCS => Some((FlagSet::C, true)),
			BNE => Some((FlagSet::Z, false)),
			BEQ => Some((FlagSet::Z, true)),
			BVC => Some((FlagSet::V, false)),
			BVS => Some((FlagSet::V, true)),
			BPL => Some((FlagSet::N, false)),
			BMI => Some((FlagSet::N, true)),
			_   => None,
		}
	}

	/// Is this a read that pays the indexed page-crossing cycle? Stores and read-modify-write
	/// instructions already include it in their base cost.
	pub fn is_plain_read(self) -> bool {
		use MetaOp::*;
		matches!(self,
			ADC | AND | CMP | EOR | LDA | LDX | LDY | ORA | SBC | NOP | LAX | LAS)
	}
}

// ------------------------------------------------------------------------------------------------
// InstDesc
// ------------------------------------------------------------------------------------------------

/// One row of the opcode table: what an opcode does, how it addresses memory, and how long it
/// takes.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct InstDesc {
	/// The actual opcode byte.
	pub opcode:       u8,
	/// Which meta-op this is.
	pub meta_op:      MetaOp,
	/// What addressing mode is used.
	pub addr_mode:    AddrMode,
	/// Base cost in cycles.
	pub cycles:       u8,
	/// Is this opcode missing from the official documentation?
	pub undocumented: bool,
}

impl InstDesc {
	/// Instruction length in bytes.
	pub fn len(&self) -> usize {
		self.addr_mode.inst_len()
	}

	/// How control leaves an instruction with this opcode.
	pub fn flow(&self) -> Flow {
		use MetaOp::*;
		match self.meta_op {
			BCC | BCS | BEQ | BMI | BNE | BPL | BVC | BVS => Flow::Cond,
			JMP if self.addr_mode == AddrMode::IND        => Flow::IndirJump,
			JMP                                           => Flow::Jump,
			JSR                                           => Flow::Call,
			RTS                                           => Flow::Return,
			RTI                                           => Flow::ReturnInt,
			BRK | JAM                                     => Flow::Halt,
			_                                             => Flow::Next,
		}
	}
}

// ------------------------------------------------------------------------------------------------
// Flow
// ------------------------------------------------------------------------------------------------

/// How control leaves an instruction.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Flow {
	/// Falls through to the next instruction.
	Next,
	/// Conditional branch: goes to the target or falls through.
	Cond,
	/// Unconditional absolute jump.
	Jump,
	/// `jmp ($xxxx)`.
	IndirJump,
	/// Subroutine call.
	Call,
	/// `rts`.
	Return,
	/// `rti`.
	ReturnInt,
	/// Stops the program: `brk` and `jam`.
	Halt,
}

// ------------------------------------------------------------------------------------------------
// DecodedOperand
// ------------------------------------------------------------------------------------------------

/// An instruction's operand, as far as it can be worked out without running the program.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct DecodedOperand {
	/// Length of the whole instruction, 1 to 3 bytes.
	pub length:    u8,
	/// True if `value` is the effective address (or the immediate/target). False if the effective
	/// address depends on an index register or on memory at run time; then `value` is the base.
	pub is_static: bool,
	/// Immediate value, address, base address, or branch target.
	pub value:     u16,
}

/// Decodes the operand of the instruction at `at`.
pub fn resolve(img: &impl ImageRead, at: u16) -> TranslateResult<DecodedOperand> {
	let desc = lookup_desc(img.read_u8(at));
	let length = desc.len();

	if at as usize + length > 0x10000 {
		return Err(TranslateError::out_of_bytes(at, length));
	}

	let lo = img.read_u8(at.wrapping_add(1));
	let hi = img.read_u8(at.wrapping_add(2));

	use AddrMode::*;
	let value = match desc.addr_mode {
		IMP => 0,
		IMM | ZPG | ZPX | ZPY | IZX | IZY => lo as u16,
		ABS | ABX | ABY | IND | LAB => u16::from_le_bytes([lo, hi]),
		REL => ((at as i32) + (lo as i8 as i32) + 2) as u16,
	};

	Ok(DecodedOperand {
		length: length as u8,
		is_static: desc.addr_mode.is_static(),
		value,
	})
}

/// Finds the target of `jmp (ptr)` at `at`. Only possible when both pointer bytes are in
/// immutable memory; otherwise the program could change the target at run time. `stage` is only
/// for the error.
pub fn resolve_indirect(img: &impl ImageRead, layout: &MemoryLayout, at: u16, ptr: u16, stage: Stage)
-> TranslateResult<u16> {
	let hi_addr = (ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF);

	for &addr in &[ptr, hi_addr] {
		let region = layout.classify(addr);

		if region.is_writable() {
			let name = layout.region_for(addr).map_or("general RAM", |r| r.name);
			return Err(TranslateError::unresolvable_jump(at, ptr, name, stage));
		}
	}

	Ok(img.read_le_u16_page_wrapped(ptr))
}

// ------------------------------------------------------------------------------------------------
// Inst
// ------------------------------------------------------------------------------------------------

/// A decoded instruction at a known address.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Inst {
	addr:    u16,
	desc:    InstDesc,
	operand: DecodedOperand,
}

impl Inst {
	/// Decodes the instruction at `at`.
	pub fn decode(img: &impl ImageRead, at: u16) -> TranslateResult<Inst> {
		let desc = lookup_desc(img.read_u8(at));
		let operand = resolve(img, at)?;
		Ok(Inst { addr: at, desc, operand })
	}

	/// Its address.
	pub fn addr     (&self) -> u16            { self.addr }
	/// Its opcode table entry.
	pub fn desc     (&self) -> &InstDesc      { &self.desc }
	/// Its meta-op.
	pub fn meta_op  (&self) -> MetaOp         { self.desc.meta_op }
	/// Its addressing mode.
	pub fn addr_mode(&self) -> AddrMode       { self.desc.addr_mode }
	/// Its decoded operand.
	pub fn operand  (&self) -> DecodedOperand { self.operand }
	/// Its length in bytes.
	pub fn len      (&self) -> usize          { self.operand.length as usize }
	/// How control leaves it.
	pub fn flow     (&self) -> Flow           { self.desc.flow() }
	/// Base cycle cost.
	pub fn cycles   (&self) -> u32            { self.desc.cycles as u32 }

	/// One past its last byte. Can be $10000 for an instruction at the very end of memory.
	pub fn end(&self) -> u32 {
		self.addr as u32 + self.len() as u32
	}

	/// Address of the next instruction, wrapping around.
	pub fn next_addr(&self) -> u16 {
		self.addr.wrapping_add(self.len() as u16)
	}

	/// Statically known control-flow destination: branch target or absolute jump/call target.
	pub fn target(&self) -> Option<u16> {
		match self.flow() {
			Flow::Cond | Flow::Jump | Flow::Call => Some(self.operand.value),
			_ => None,
		}
	}

	/// Registers its generated code refers to.
	pub fn registers(&self) -> RegSet {
		self.desc.meta_op.registers() | self.desc.addr_mode.index_register()
	}

	/// Is this `brk` with a zero signature byte, which marks the end of a program?
	pub fn is_terminator(&self) -> bool {
		self.desc.meta_op == MetaOp::BRK && self.operand.value == 0
	}

	/// Which addresses its data access could touch, if it accesses memory at all.
	pub fn reach(&self) -> Option<Reach> {
		use AddrMode::*;
		let v = self.operand.value;

		match self.desc.addr_mode {
			ZPG | ABS => Some(Reach::Exact(v)),
			ABX | ABY => Some(Reach::Indexed(v)),
			ZPX | ZPY => Some(Reach::ZeroPage),
			IZX | IZY => Some(Reach::Anywhere),
			IMP | IMM | IND | REL | LAB => None,
		}
	}

	/// Extra cycle charged for this instruction when indexed reads are assumed to cross a page.
	pub fn page_penalty(&self) -> u32 {
		(self.desc.addr_mode.has_page_penalty() && self.desc.meta_op.is_plain_read()) as u32
	}
}

impl Display for Inst {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}", self.desc.meta_op.mnemonic())?;

		use AddrMode::*;
		let operand = match self.desc.addr_mode {
			IMP => {
				if matches!(self.desc.meta_op, MetaOp::ASLA | MetaOp::LSRA | MetaOp::ROLA |
					MetaOp::RORA) {
					write!(f, " a")?;
				}

				return Ok(());
			}

			IMM | ZPG | ZPX | ZPY | IZX | IZY => format!("{:02X}", self.operand.value),
			_                                 => format!("{:04X}", self.operand.value),
		};

		write!(f, " {}", self.desc.addr_mode.operand_template().replace("{}", &operand))
	}
}
