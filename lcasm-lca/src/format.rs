use std::fmt;

use lcasm_core::cpu::opcode::{sign_extend16, Opcode32};
use lcasm_core::Register;

/// How the 26 bits below the opcode are split up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstructionFormat {
    /// `opcode rs rt rd shamt funct` (6/5/5/5/5/6)
    R,
    /// `opcode rs rt imm16` (6/5/5/16)
    I,
    /// `opcode target26` (6/26)
    J,
    /// Same layout as [`InstructionFormat::I`]; the immediate is a displacement.
    IBranch,
}

impl fmt::Display for InstructionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            InstructionFormat::R => "R",
            InstructionFormat::I => "I",
            InstructionFormat::J => "J",
            InstructionFormat::IBranch => "I-BRANCH",
        })
    }
}

/// Primary opcode, bits 31..26.
pub const fn opcode(word: Opcode32) -> u8 {
    word.field(31, 26) as u8
}

/// Secondary opcode of R-format words, bits 5..0.
pub const fn funct(word: Opcode32) -> u8 {
    word.field(5, 0) as u8
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RFields {
    pub rs: Register,
    pub rt: Register,
    pub rd: Register,
    pub shamt: u8,
    pub funct: u8,
}

impl RFields {
    pub fn new(rd: Register, rs: Register, rt: Register) -> Self {
        Self {
            rs,
            rt,
            rd,
            shamt: 0,
            funct: 0,
        }
    }

    pub fn decode(word: Opcode32) -> Self {
        Self {
            rs: Register::from_field(word.field(25, 21)),
            rt: Register::from_field(word.field(20, 16)),
            rd: Register::from_field(word.field(15, 11)),
            shamt: word.field(10, 6) as u8,
            funct: funct(word),
        }
    }

    pub fn encode(&self, opcode: u8) -> Opcode32 {
        Opcode32::new(0)
            .with_field(31, 26, opcode.into())
            .with_field(25, 21, self.rs.index().into())
            .with_field(20, 16, self.rt.index().into())
            .with_field(15, 11, self.rd.index().into())
            .with_field(10, 6, self.shamt.into())
            .with_field(5, 0, self.funct.into())
    }
}

/// Fields of I and I-BRANCH words. The immediate is kept raw.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IFields {
    pub rs: Register,
    pub rt: Register,
    pub imm: u16,
}

impl IFields {
    pub fn new(rs: Register, rt: Register, imm: i32) -> Self {
        Self {
            rs,
            rt,
            imm: imm as u16,
        }
    }

    /// The immediate as a signed 16-bit value.
    pub fn simm(&self) -> i32 {
        sign_extend16(self.imm.into())
    }

    pub fn decode(word: Opcode32) -> Self {
        Self {
            rs: Register::from_field(word.field(25, 21)),
            rt: Register::from_field(word.field(20, 16)),
            imm: word.field(15, 0) as u16,
        }
    }

    pub fn encode(&self, opcode: u8) -> Opcode32 {
        Opcode32::new(0)
            .with_field(31, 26, opcode.into())
            .with_field(25, 21, self.rs.index().into())
            .with_field(20, 16, self.rt.index().into())
            .with_field(15, 0, self.imm.into())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct JFields {
    /// 26-bit word index; the byte address is `target << 2`.
    pub target: u32,
}

impl JFields {
    pub fn new(target: u32) -> Self {
        Self {
            target: target & 0x03FF_FFFF,
        }
    }

    pub fn decode(word: Opcode32) -> Self {
        Self {
            target: word.field(25, 0),
        }
    }

    pub fn encode(&self, opcode: u8) -> Opcode32 {
        Opcode32::new(0)
            .with_field(31, 26, opcode.into())
            .with_field(25, 0, self.target)
    }
}

/// Decoded operand fields, tagged by format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operands {
    R(RFields),
    I(IFields),
    J(JFields),
    IBranch(IFields),
}

impl Operands {
    pub fn decode(format: InstructionFormat, word: Opcode32) -> Self {
        match format {
            InstructionFormat::R => Operands::R(RFields::decode(word)),
            InstructionFormat::I => Operands::I(IFields::decode(word)),
            InstructionFormat::J => Operands::J(JFields::decode(word)),
            InstructionFormat::IBranch => Operands::IBranch(IFields::decode(word)),
        }
    }

    pub fn format(&self) -> InstructionFormat {
        match self {
            Operands::R(_) => InstructionFormat::R,
            Operands::I(_) => InstructionFormat::I,
            Operands::J(_) => InstructionFormat::J,
            Operands::IBranch(_) => InstructionFormat::IBranch,
        }
    }

    pub fn encode(&self, opcode: u8) -> Opcode32 {
        match self {
            Operands::R(fields) => fields.encode(opcode),
            Operands::I(fields) | Operands::IBranch(fields) => fields.encode(opcode),
            Operands::J(fields) => fields.encode(opcode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T1: Register = Register::new(9);
    const T2: Register = Register::new(10);
    const T3: Register = Register::new(11);

    #[test]
    fn decode_r_format() {
        // add $t1, $t2, $t3
        let word = Opcode32::new(0x014B_4820);
        assert_eq!(opcode(word), 0);
        assert_eq!(funct(word), 0b100000);
        let fields = RFields::decode(word);
        assert_eq!(fields.rd, T1);
        assert_eq!(fields.rs, T2);
        assert_eq!(fields.rt, T3);
        assert_eq!(fields.shamt, 0);
    }

    #[test]
    fn decode_i_format_keeps_immediate_raw() {
        // addi $t1, $zero, -1
        let word = Opcode32::new(0x2009_FFFF);
        assert_eq!(opcode(word), 0b001000);
        let fields = IFields::decode(word);
        assert_eq!(fields.rs, Register::ZERO);
        assert_eq!(fields.rt, T1);
        assert_eq!(fields.imm, 0xFFFF);
        assert_eq!(fields.simm(), -1);
    }

    #[test]
    fn decode_j_format() {
        let word = Opcode32::new(0x0810_0004);
        assert_eq!(opcode(word), 0b000010);
        assert_eq!(JFields::decode(word).target, 0x0010_0004);
    }

    #[test]
    fn encode_packs_fields_at_their_offsets() {
        let mut fields = RFields::new(T1, T2, T3);
        fields.funct = 0b100000;
        assert_eq!(fields.encode(0).value(), 0x014B_4820);
        assert_eq!(
            IFields::new(Register::ZERO, T1, -1).encode(0b001000).value(),
            0x2009_FFFF
        );
        assert_eq!(JFields::new(0xFFFF_FFFF).encode(0b000011).value(), 0x0FFF_FFFF);
    }

    #[test]
    fn operands_carry_their_format() {
        let word = Opcode32::new(0x1109_0003);
        let operands = Operands::decode(InstructionFormat::IBranch, word);
        assert_eq!(operands.format(), InstructionFormat::IBranch);
        assert_eq!(operands.encode(opcode(word)), word);
    }

    #[test]
    fn format_names() {
        assert_eq!(InstructionFormat::IBranch.to_string(), "I-BRANCH");
        assert_eq!(InstructionFormat::R.to_string(), "R");
    }
}
