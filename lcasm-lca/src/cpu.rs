use lcasm_core::cpu::decoder::DecodeOne;
use lcasm_core::cpu::opcode::Opcode32;
use lcasm_core::{MachineState, OutputSink, RandomSource, WORD_BYTES};

use crate::decoder::LcaDecoder;
use crate::error::Result;
use crate::isa::catalog::Catalog;
use crate::isa::instruction::{DecodedInstruction, InstructionDescriptor};
use crate::semantics::Context;

/// Decodes and executes single words against caller-supplied collaborators.
///
/// The CPU holds no machine state of its own; one instance can drive any
/// number of machines.
#[derive(Clone, Copy, Debug)]
pub struct LcaCpu<'c> {
    decoder: LcaDecoder<'c>,
}

impl Default for LcaCpu<'static> {
    fn default() -> Self {
        Self::new(Catalog::lca())
    }
}

impl<'c> LcaCpu<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            decoder: LcaDecoder::new(catalog),
        }
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.decoder.catalog()
    }

    pub fn decode(&self, word: Opcode32) -> Result<DecodedInstruction> {
        Ok(self.decoder.decode_one(word)?)
    }

    /// Runs `word` as if it had just been fetched. The PC is expected to
    /// already point past it.
    pub fn execute(
        &self,
        word: Opcode32,
        state: &mut dyn MachineState,
        random: &mut dyn RandomSource,
        output: &mut dyn OutputSink,
    ) -> Result<&'static InstructionDescriptor> {
        let ins = self.decode(word)?;
        tracing::trace!("{:?} {}", word, ins);
        let mut ctx = Context::new(state, random, output);
        ins.execute(&mut ctx)?;
        Ok(ins.descriptor())
    }

    /// Fetches the word at the PC, advances the PC past it and executes it.
    pub fn step(
        &self,
        state: &mut dyn MachineState,
        random: &mut dyn RandomSource,
        output: &mut dyn OutputSink,
    ) -> Result<&'static InstructionDescriptor> {
        let pc = state.pc();
        let word = Opcode32::new(state.read_word(pc)? as u32);
        state.set_pc(pc.wrapping_add(WORD_BYTES));
        tracing::trace!("fetched {:?} at 0x{:08X}", word, pc);
        self.execute(word, state, random, output)
    }
}
