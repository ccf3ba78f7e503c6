use thiserror::Error;

use crate::cpu::opcode::Opcode32;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DecodeError {
    #[error("word {0} does not map to a known instruction")]
    UndefinedInstruction(Opcode32),
}

pub type Result<T> = std::result::Result<T, DecodeError>;

pub trait DecodeOne {
    type Instruction;

    fn decode_one(&self, word: Opcode32) -> Result<Self::Instruction>;
}
