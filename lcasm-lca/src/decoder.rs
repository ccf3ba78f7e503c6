use lcasm_core::cpu::decoder::{DecodeError, DecodeOne, Result};
use lcasm_core::cpu::opcode::Opcode32;

use crate::isa::catalog::Catalog;
use crate::isa::instruction::DecodedInstruction;

/// Resolves words against a [`Catalog`].
#[derive(Clone, Copy, Debug)]
pub struct LcaDecoder<'c> {
    catalog: &'c Catalog,
}

impl Default for LcaDecoder<'static> {
    fn default() -> Self {
        Self::new(Catalog::lca())
    }
}

impl<'c> LcaDecoder<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }
}

impl DecodeOne for LcaDecoder<'_> {
    type Instruction = DecodedInstruction;

    fn decode_one(&self, word: Opcode32) -> Result<Self::Instruction> {
        let desc = self
            .catalog
            .find(word)
            .ok_or(DecodeError::UndefinedInstruction(word))?;
        Ok(desc.decode(word))
    }
}
