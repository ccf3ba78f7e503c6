use std::fmt;

use lcasm_core::cpu::opcode::Opcode32;

use crate::error::{ExecutionError, Result};
use crate::format::{IFields, InstructionFormat, JFields, Operands, RFields};
use crate::semantics::{base, extended, Context};

/// Semantic handler, tagged by the operand format it accepts.
#[derive(Clone, Copy)]
pub enum Handler {
    R(fn(&mut Context<'_>, RFields) -> Result<()>),
    I(fn(&mut Context<'_>, IFields) -> Result<()>),
    J(fn(&mut Context<'_>, JFields) -> Result<()>),
    IBranch(fn(&mut Context<'_>, IFields) -> Result<()>),
}

impl Handler {
    pub fn format(&self) -> InstructionFormat {
        match self {
            Handler::R(_) => InstructionFormat::R,
            Handler::I(_) => InstructionFormat::I,
            Handler::J(_) => InstructionFormat::J,
            Handler::IBranch(_) => InstructionFormat::IBranch,
        }
    }
}

/// How the operand fields appear in assembly text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandLayout {
    /// `rd, rs, rt`
    RdRsRt,
    /// `target`
    Target,
    /// `rs, rt, displacement`
    RsRtBranch,
    /// `rt, rs, imm`
    RtRsImm,
    /// `rt, imm(rs)`
    RtOffsetBase,
    /// `rs, rt, imm`
    RsRtImm,
    /// `imm`
    Imm,
    /// `rt, imm`
    RtImm,
    /// `rs`
    Rs,
}

#[derive(Clone, Copy)]
pub struct InstructionDescriptor {
    mnemonic: &'static str,
    syntax: &'static str,
    pattern: &'static str,
    description: &'static str,
    opcode: u8,
    funct: Option<u8>,
    layout: OperandLayout,
    handler: Handler,
}

impl InstructionDescriptor {
    const OPCODE_MASK: u32 = 0xFC00_0000;
    const FUNCT_MASK: u32 = 0x0000_003F;

    #[allow(clippy::too_many_arguments)]
    const fn new(
        mnemonic: &'static str,
        syntax: &'static str,
        pattern: &'static str,
        description: &'static str,
        opcode: u8,
        funct: Option<u8>,
        layout: OperandLayout,
        handler: Handler,
    ) -> Self {
        Self {
            mnemonic,
            syntax,
            pattern,
            description,
            opcode,
            funct,
            layout,
            handler,
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        self.mnemonic
    }

    /// Example assembly, e.g. `add $t1,$t2,$t3`.
    pub fn syntax(&self) -> &'static str {
        self.syntax
    }

    /// Bit pattern with `f`/`s`/`t` marking the first/second/third operand.
    pub fn pattern(&self) -> &'static str {
        self.pattern
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn format(&self) -> InstructionFormat {
        self.handler.format()
    }

    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    pub fn funct(&self) -> Option<u8> {
        self.funct
    }

    pub fn layout(&self) -> OperandLayout {
        self.layout
    }

    /// Bits that must match for a word to dispatch here.
    pub fn fixed_mask(&self) -> u32 {
        match self.funct {
            Some(_) => Self::OPCODE_MASK | Self::FUNCT_MASK,
            None => Self::OPCODE_MASK,
        }
    }

    /// Required values of the [`fixed_mask`](Self::fixed_mask) bits.
    pub fn fixed_bits(&self) -> u32 {
        (u32::from(self.opcode) << 26) | u32::from(self.funct.unwrap_or(0))
    }

    pub fn matches(&self, word: Opcode32) -> bool {
        word.value() & self.fixed_mask() == self.fixed_bits()
    }

    /// True when some word would match both descriptors.
    pub fn overlaps(&self, other: &InstructionDescriptor) -> bool {
        let common = self.fixed_mask() & other.fixed_mask();
        self.fixed_bits() & common == other.fixed_bits() & common
    }

    /// Packs `operands` together with this descriptor's fixed bits.
    pub fn encode(&self, operands: Operands) -> Opcode32 {
        let word = match (operands, self.funct) {
            (Operands::R(mut fields), Some(funct)) => {
                fields.funct = funct;
                fields.encode(self.opcode)
            }
            (operands, _) => operands.encode(self.opcode),
        };
        word.with_field(31, 26, self.opcode.into())
    }

    pub fn decode(&'static self, word: Opcode32) -> DecodedInstruction {
        DecodedInstruction {
            descriptor: self,
            word,
            operands: Operands::decode(self.format(), word),
        }
    }

    pub fn execute(&self, ctx: &mut Context<'_>, operands: Operands) -> Result<()> {
        match (self.handler, operands) {
            (Handler::R(handler), Operands::R(fields)) => handler(ctx, fields),
            (Handler::I(handler), Operands::I(fields)) => handler(ctx, fields),
            (Handler::J(handler), Operands::J(fields)) => handler(ctx, fields),
            (Handler::IBranch(handler), Operands::IBranch(fields)) => handler(ctx, fields),
            (handler, operands) => Err(ExecutionError::OperandFormat {
                mnemonic: self.mnemonic,
                expected: handler.format(),
                found: operands.format(),
            }),
        }
    }
}

impl fmt::Debug for InstructionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstructionDescriptor")
            .field("mnemonic", &self.mnemonic)
            .field("format", &self.format())
            .field("pattern", &self.pattern)
            .finish()
    }
}

impl fmt::Display for InstructionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.syntax)
    }
}

impl PartialEq for InstructionDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.mnemonic == other.mnemonic
            && self.opcode == other.opcode
            && self.funct == other.funct
    }
}
impl Eq for InstructionDescriptor {}

/// A word paired with the descriptor it dispatched to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodedInstruction {
    descriptor: &'static InstructionDescriptor,
    word: Opcode32,
    operands: Operands,
}

impl DecodedInstruction {
    pub fn descriptor(&self) -> &'static InstructionDescriptor {
        self.descriptor
    }

    pub fn word(&self) -> Opcode32 {
        self.word
    }

    pub fn operands(&self) -> Operands {
        self.operands
    }

    pub fn mnemonic(&self) -> &'static str {
        self.descriptor.mnemonic
    }

    pub fn execute(&self, ctx: &mut Context<'_>) -> Result<()> {
        self.descriptor.execute(ctx, self.operands)
    }
}

impl fmt::Display for DecodedInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = self.descriptor.mnemonic;
        match (self.descriptor.layout, self.operands) {
            (OperandLayout::RdRsRt, Operands::R(r)) => {
                write!(f, "{} {}, {}, {}", mnemonic, r.rd, r.rs, r.rt)
            }
            (OperandLayout::Target, Operands::J(j)) => {
                write!(f, "{} 0x{:08X}", mnemonic, j.target << 2)
            }
            (OperandLayout::RsRtBranch, Operands::I(i) | Operands::IBranch(i))
            | (OperandLayout::RsRtImm, Operands::I(i) | Operands::IBranch(i)) => {
                write!(f, "{} {}, {}, {}", mnemonic, i.rs, i.rt, i.simm())
            }
            (OperandLayout::RtRsImm, Operands::I(i) | Operands::IBranch(i)) => {
                write!(f, "{} {}, {}, {}", mnemonic, i.rt, i.rs, i.simm())
            }
            (OperandLayout::RtOffsetBase, Operands::I(i) | Operands::IBranch(i)) => {
                write!(f, "{} {}, {}({})", mnemonic, i.rt, i.simm(), i.rs)
            }
            (OperandLayout::Imm, Operands::I(i) | Operands::IBranch(i)) => {
                write!(f, "{} {}", mnemonic, i.simm())
            }
            (OperandLayout::RtImm, Operands::I(i) | Operands::IBranch(i)) => {
                write!(f, "{} {}, {}", mnemonic, i.rt, i.simm())
            }
            (OperandLayout::Rs, Operands::I(i) | Operands::IBranch(i)) => {
                write!(f, "{} {}", mnemonic, i.rs)
            }
            _ => write!(f, "{} {:?}", mnemonic, self.word),
        }
    }
}

const fn r_type(
    mnemonic: &'static str,
    syntax: &'static str,
    pattern: &'static str,
    description: &'static str,
    funct: u8,
    handler: fn(&mut Context<'_>, RFields) -> Result<()>,
) -> InstructionDescriptor {
    InstructionDescriptor::new(
        mnemonic,
        syntax,
        pattern,
        description,
        0,
        Some(funct),
        OperandLayout::RdRsRt,
        Handler::R(handler),
    )
}

pub const ADD: InstructionDescriptor = r_type(
    "add",
    "add $t1,$t2,$t3",
    "000000 sssss ttttt fffff 00000 100000",
    "Addition with overflow: set $t1 to ($t2 plus $t3)",
    0b100000,
    base::add,
);
pub const SUB: InstructionDescriptor = r_type(
    "sub",
    "sub $t1,$t2,$t3",
    "000000 sssss ttttt fffff 00000 100010",
    "Subtraction with overflow: set $t1 to ($t2 minus $t3)",
    0b100010,
    base::sub,
);
pub const MUL: InstructionDescriptor = r_type(
    "mul",
    "mul $t1,$t2,$t3",
    "000000 sssss ttttt fffff 00000 100100",
    "Multiplication: set $t1 to the low 32 bits of ($t2 times $t3)",
    0b100100,
    base::mul,
);
// Same fixed bits as MUL; unreachable through dispatch.
pub const AND: InstructionDescriptor = r_type(
    "and",
    "and $t1,$t2,$t3",
    "000000 sssss ttttt fffff 00000 100100",
    "Bitwise AND: set $t1 to ($t2 AND $t3)",
    0b100100,
    base::and,
);
pub const OR: InstructionDescriptor = r_type(
    "or",
    "or $t1,$t2,$t3",
    "000000 sssss ttttt fffff 00000 100101",
    "Bitwise OR: set $t1 to ($t2 OR $t3)",
    0b100101,
    base::or,
);
pub const SLT: InstructionDescriptor = r_type(
    "slt",
    "slt $t1,$t2,$t3",
    "000000 sssss ttttt fffff 00000 101010",
    "Set less than: set $t1 to 1 if $t2 < $t3 (signed) else 0",
    0b101010,
    base::slt,
);
pub const J: InstructionDescriptor = InstructionDescriptor::new(
    "j",
    "j target",
    "000010 ffffffffffffffffffffffffff",
    "Jump unconditionally: jump to statement at target address",
    0b000010,
    None,
    OperandLayout::Target,
    Handler::J(base::j),
);
pub const JAL: InstructionDescriptor = InstructionDescriptor::new(
    "jal",
    "jal target",
    "000011 ffffffffffffffffffffffffff",
    "Jump and link: set $ra to the return address then jump to target address",
    0b000011,
    None,
    OperandLayout::Target,
    Handler::J(base::jal),
);
pub const BEQ: InstructionDescriptor = InstructionDescriptor::new(
    "beq",
    "beq $t1,$t2,label",
    "000100 fffff sssss tttttttttttttttt",
    "Branch if equal: branch to statement at label's address if $t1 == $t2",
    0b000100,
    None,
    OperandLayout::RsRtBranch,
    Handler::IBranch(base::beq),
);
pub const BNE: InstructionDescriptor = InstructionDescriptor::new(
    "bne",
    "bne $t1,$t2,label",
    "000101 fffff sssss tttttttttttttttt",
    "Branch if not equal: branch to statement at label's address if $t1 != $t2",
    0b000101,
    None,
    OperandLayout::RsRtBranch,
    Handler::IBranch(base::bne),
);
pub const ADDI: InstructionDescriptor = InstructionDescriptor::new(
    "addi",
    "addi $t1,$t2,-100",
    "001000 sssss fffff tttttttttttttttt",
    "Addition immediate with overflow: set $t1 to ($t2 plus signed 16-bit immediate)",
    0b001000,
    None,
    OperandLayout::RtRsImm,
    Handler::I(base::addi),
);
pub const LW: InstructionDescriptor = InstructionDescriptor::new(
    "lw",
    "lw $t1,-100($t2)",
    "100011 ttttt fffff ssssssssssssssss",
    "Load word: set $t1 to contents of effective memory word address",
    0b100011,
    None,
    OperandLayout::RtOffsetBase,
    Handler::I(base::lw),
);
pub const SW: InstructionDescriptor = InstructionDescriptor::new(
    "sw",
    "sw $t1,-100($t2)",
    "101011 ttttt fffff ssssssssssssssss",
    "Store word: store contents of $t1 into effective memory word address",
    0b101011,
    None,
    OperandLayout::RtOffsetBase,
    Handler::I(base::sw),
);
pub const EXTRACT: InstructionDescriptor = InstructionDescriptor::new(
    "extract",
    "extract $t1,$t2,1",
    "010000 sssss fffff tttttttttttttttt",
    "Extract PE-Box: set $t1 to ($t2 plus a random amount scaled by risk)",
    0b010000,
    None,
    OperandLayout::RtRsImm,
    Handler::I(extended::extract),
);
pub const WINST: InstructionDescriptor = InstructionDescriptor::new(
    "winst",
    "winst $t1,$t2,15",
    "010001 sssss fffff tttttttttttttttt",
    "Work: Instinct (Fortitude): set $t1 to ($t2 plus signed immediate)",
    0b010001,
    None,
    OperandLayout::RtRsImm,
    Handler::I(extended::winst),
);
pub const WINSIGHT: InstructionDescriptor = InstructionDescriptor::new(
    "winsight",
    "winsight $t1,$t2,10",
    "010010 sssss fffff tttttttttttttttt",
    "Work: Insight (Prudence): set $t1 to ($t2 plus signed immediate)",
    0b010010,
    None,
    OperandLayout::RtRsImm,
    Handler::I(extended::winsight),
);
pub const WATTACH: InstructionDescriptor = InstructionDescriptor::new(
    "wattach",
    "wattach $t1,$t2,8",
    "010011 sssss fffff tttttttttttttttt",
    "Work: Attachment (Temperance): set $t1 to ($t2 plus signed immediate)",
    0b010011,
    None,
    OperandLayout::RtRsImm,
    Handler::I(extended::wattach),
);
pub const WREPRESS: InstructionDescriptor = InstructionDescriptor::new(
    "wrepress",
    "wrepress $t1,$t2,12",
    "010100 sssss fffff tttttttttttttttt",
    "Work: Repression (Justice): set $t1 to ($t2 plus signed immediate)",
    0b010100,
    None,
    OperandLayout::RtRsImm,
    Handler::I(extended::wrepress),
);
pub const SUPPRESS: InstructionDescriptor = InstructionDescriptor::new(
    "suppress",
    "suppress $t1,$t2,3",
    "010101 fffff sssss tttttttttttttttt",
    "Suppress breach: set $v0 to 1 if $t1 > ($t2 scaled by risk) else 0",
    0b010101,
    None,
    OperandLayout::RsRtImm,
    Handler::I(extended::suppress),
);
pub const ORDEAL: InstructionDescriptor = InstructionDescriptor::new(
    "ordeal",
    "ordeal 0",
    "010110 00000 00000 ffffffffffffffff",
    "Trigger an Ordeal (0 = Dawn, 1 = Noon, 2 = Dusk, 3 = Midnight) against a random agent",
    0b010110,
    None,
    OperandLayout::Imm,
    Handler::I(extended::ordeal),
);
pub const EGO: InstructionDescriptor = InstructionDescriptor::new(
    "ego",
    "ego $t0,3",
    "010111 00000 fffff ssssssssssssssss",
    "Equip E.G.O: add the bonus of E.G.O id to $t0",
    0b010111,
    None,
    OperandLayout::RtImm,
    Handler::IBranch(extended::ego),
);
pub const PANIC: InstructionDescriptor = InstructionDescriptor::new(
    "panic",
    "panic $t1",
    "011000 fffff 00000 0000000000000000",
    "Clerk panic: set $t1 to 0",
    0b011000,
    None,
    OperandLayout::Rs,
    Handler::I(extended::panic),
);
pub const MELTDOWN: InstructionDescriptor = InstructionDescriptor::new(
    "meltdown",
    "meltdown $s1",
    "011001 fffff 00000 0000000000000000",
    "Trigger Qliphoth Meltdown: penalize every agent and raise the global risk counter",
    0b011001,
    None,
    OperandLayout::Rs,
    Handler::I(extended::meltdown),
);

/// Registration order of the Lobotomy Corporation Assembly catalog.
pub static LCA_INSTRUCTIONS: [InstructionDescriptor; 23] = [
    ADD, SUB, MUL, AND, OR, SLT, J, JAL, BEQ, BNE, ADDI, LW, SW, EXTRACT, WINST, WINSIGHT,
    WATTACH, WREPRESS, SUPPRESS, ORDEAL, EGO, PANIC, MELTDOWN,
];

#[cfg(test)]
mod tests {
    use lcasm_core::{MachineState, Register};

    use super::*;
    use crate::semantics::testing::Harness;

    const T1: Register = Register::new(9);
    const T2: Register = Register::new(10);
    const T3: Register = Register::new(11);

    fn pattern_bits(pattern: &str) -> (u32, u32) {
        let bits: Vec<char> = pattern.chars().filter(|c| !c.is_whitespace()).collect();
        assert_eq!(bits.len(), 32, "{}", pattern);
        let mut mask = 0;
        let mut value = 0;
        for (idx, bit) in bits.iter().enumerate() {
            let shift = 31 - idx;
            match bit {
                '0' => mask |= 1 << shift,
                '1' => {
                    mask |= 1 << shift;
                    value |= 1 << shift;
                }
                _ => {}
            }
        }
        (mask, value)
    }

    #[test]
    fn fixed_bits_agree_with_patterns() {
        for desc in LCA_INSTRUCTIONS.iter() {
            let (mask, value) = pattern_bits(desc.pattern());
            assert_eq!(
                desc.fixed_mask() & mask,
                desc.fixed_mask(),
                "{}",
                desc.mnemonic()
            );
            assert_eq!(
                value & desc.fixed_mask(),
                desc.fixed_bits(),
                "{}",
                desc.mnemonic()
            );
        }
    }

    #[test]
    fn formats_match_table() {
        let expected = [
            ("add", InstructionFormat::R),
            ("slt", InstructionFormat::R),
            ("j", InstructionFormat::J),
            ("jal", InstructionFormat::J),
            ("beq", InstructionFormat::IBranch),
            ("bne", InstructionFormat::IBranch),
            ("addi", InstructionFormat::I),
            ("suppress", InstructionFormat::I),
            ("ego", InstructionFormat::IBranch),
            ("meltdown", InstructionFormat::I),
        ];
        for (mnemonic, format) in expected {
            let desc = LCA_INSTRUCTIONS
                .iter()
                .find(|d| d.mnemonic() == mnemonic)
                .unwrap();
            assert_eq!(desc.format(), format, "{}", mnemonic);
        }
    }

    #[test]
    fn encode_sets_opcode_and_funct() {
        let word = ADD.encode(Operands::R(RFields::new(T1, T2, T3)));
        assert_eq!(word.value(), 0x014B_4820);
        assert!(ADD.matches(word));
        assert!(!SUB.matches(word));

        let word = LW.encode(Operands::I(IFields::new(Register::SP, T1, -4)));
        assert_eq!(word.value(), 0x8FA9_FFFC);
        assert!(LW.matches(word));
    }

    #[test]
    fn overlaps_detects_shared_encodings() {
        assert!(MUL.overlaps(&AND));
        assert!(!MUL.overlaps(&OR));
        assert!(!ADD.overlaps(&J));
        assert!(!ORDEAL.overlaps(&EGO));
    }

    #[test]
    fn disassembles_each_layout() {
        let cases = [
            (ADD.encode(Operands::R(RFields::new(T1, T2, T3))), "add $t1, $t2, $t3"),
            (J.encode(Operands::J(JFields::new(0x0010_0000))), "j 0x00400000"),
            (
                BEQ.encode(Operands::IBranch(IFields::new(T1, T2, -3))),
                "beq $t1, $t2, -3",
            ),
            (
                ADDI.encode(Operands::I(IFields::new(T2, T1, -100))),
                "addi $t1, $t2, -100",
            ),
            (
                SW.encode(Operands::I(IFields::new(Register::SP, T1, 8))),
                "sw $t1, 8($sp)",
            ),
            (
                SUPPRESS.encode(Operands::I(IFields::new(T1, T2, 3))),
                "suppress $t1, $t2, 3",
            ),
            (
                ORDEAL.encode(Operands::I(IFields::new(Register::ZERO, Register::ZERO, 2))),
                "ordeal 2",
            ),
            (
                EGO.encode(Operands::IBranch(IFields::new(Register::ZERO, Register::T0, 3))),
                "ego $t0, 3",
            ),
            (
                PANIC.encode(Operands::I(IFields::new(T1, Register::ZERO, 0))),
                "panic $t1",
            ),
        ];
        for (word, text) in cases {
            let desc = LCA_INSTRUCTIONS.iter().find(|d| d.matches(word)).unwrap();
            assert_eq!(desc.decode(word).to_string(), text);
        }
    }

    #[test]
    fn mismatched_operands_are_rejected() {
        let mut h = Harness::new();
        h.machine.set_register(T2, 4);
        h.machine.set_register(T3, 5);
        let before = h.machine.registers().clone();
        let err = ADD
            .execute(&mut h.context(), Operands::J(JFields::new(0x014B_4820)))
            .unwrap_err();
        assert_eq!(
            err,
            ExecutionError::OperandFormat {
                mnemonic: "add",
                expected: InstructionFormat::R,
                found: InstructionFormat::J,
            }
        );
        assert_eq!(h.machine.registers(), &before);

        let err = EGO
            .execute(&mut h.context(), Operands::I(IFields::new(T1, T2, 1)))
            .unwrap_err();
        assert_eq!(err.to_string(), "ego expects I-BRANCH operands, got I");
        assert_eq!(h.machine.register(T2), 4);
        assert!(h.output.is_empty());
    }

    #[test]
    fn descriptor_display_is_syntax() {
        assert_eq!(MELTDOWN.to_string(), "meltdown $s1");
        assert_eq!(EGO.pattern(), "010111 00000 fffff ssssssssssssssss");
    }
}
