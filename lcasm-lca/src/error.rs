use lcasm_core::cpu::decoder::DecodeError;
use lcasm_core::AddressError;
use thiserror::Error;

use crate::format::InstructionFormat;

/// Why a single instruction did not complete.
///
/// All variants are local to the failing instruction: register writes made
/// before the failure point stay committed and the machine remains usable.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("arithmetic overflow in {mnemonic}")]
    ArithmeticOverflow { mnemonic: &'static str },
    #[error("{mnemonic} expects {expected} operands, got {found}")]
    OperandFormat {
        mnemonic: &'static str,
        expected: InstructionFormat,
        found: InstructionFormat,
    },
    #[error("address error: {0}")]
    Address(#[from] AddressError),
}

pub type Result<T> = std::result::Result<T, ExecutionError>;
