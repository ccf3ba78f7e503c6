//! One handler per catalog entry.
//!
//! Handlers only see the collaborators in [`Context`] and the operand fields
//! of their own format, so each one can be exercised in isolation.

pub mod base;
pub mod extended;

use lcasm_core::{MachineState, OutputSink, RandomSource};

pub struct Context<'a> {
    pub state: &'a mut dyn MachineState,
    pub random: &'a mut dyn RandomSource,
    pub output: &'a mut dyn OutputSink,
}

impl<'a> Context<'a> {
    pub fn new(
        state: &'a mut dyn MachineState,
        random: &'a mut dyn RandomSource,
        output: &'a mut dyn OutputSink,
    ) -> Self {
        Self {
            state,
            random,
            output,
        }
    }

    pub(crate) fn emit(&mut self, line: &str) {
        tracing::debug!("emit: {}", line);
        self.output.emit(line);
    }
}
