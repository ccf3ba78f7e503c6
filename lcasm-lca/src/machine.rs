use std::fmt;
use std::ops::Range;

use rand::rngs::StdRng;
use rand::SeedableRng;

use lcasm_core::{Machine, MachineConfig, MachineState, OutputSink, RandomSource};

use crate::cpu::LcaCpu;
use crate::error::ExecutionError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The PC left the loaded program.
    EndOfProgram,
    StepLimit,
    Fault(ExecutionError),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EndOfProgram => f.write_str("end of program"),
            StopReason::StepLimit => f.write_str("step limit reached"),
            StopReason::Fault(err) => write!(f, "fault: {}", err),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Instructions that completed; a faulting instruction is not counted.
    pub steps: u64,
    pub stop: StopReason,
}

/// A reference [`Machine`] wired to its own random source and output sink.
pub struct LcaMachine<R, O> {
    machine: Machine,
    cpu: LcaCpu<'static>,
    random: R,
    output: O,
    program: Range<u32>,
}

impl<O: OutputSink> LcaMachine<StdRng, O> {
    /// Machine whose random draws replay identically for the same `seed`.
    pub fn seeded(config: MachineConfig, seed: u64, output: O) -> Self {
        Self::new(config, StdRng::seed_from_u64(seed), output)
    }
}

impl<R: RandomSource, O: OutputSink> LcaMachine<R, O> {
    pub fn new(config: MachineConfig, random: R, output: O) -> Self {
        let text_base = config.text_base;
        Self {
            machine: Machine::new(config),
            cpu: LcaCpu::default(),
            random,
            output,
            program: text_base..text_base,
        }
    }

    /// Resets the machine and places `words` at the text base.
    pub fn load(&mut self, words: &[u32]) -> lcasm_core::Result<()> {
        self.machine.reset();
        let end = self.machine.load_program(words)?;
        self.program = self.machine.config().text_base..end;
        Ok(())
    }

    /// Steps until the PC leaves the program, `max_steps` instructions have
    /// run, or an instruction fails.
    pub fn run(&mut self, max_steps: u64) -> RunSummary {
        tracing::info!(
            "running 0x{:08X} - 0x{:08X} for at most {} steps",
            self.program.start,
            self.program.end,
            max_steps
        );
        let mut steps = 0;
        let stop = loop {
            if !self.program.contains(&self.machine.pc()) {
                break StopReason::EndOfProgram;
            }
            if steps >= max_steps {
                break StopReason::StepLimit;
            }
            match self
                .cpu
                .step(&mut self.machine, &mut self.random, &mut self.output)
            {
                Ok(_) => steps += 1,
                Err(err) => {
                    tracing::debug!("fault at 0x{:08X}: {}", self.machine.pc(), err);
                    break StopReason::Fault(err);
                }
            }
        };
        tracing::info!("stopped after {} steps: {}", steps, stop);
        RunSummary { steps, stop }
    }

    pub fn cpu(&self) -> &LcaCpu<'static> {
        &self.cpu
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn into_output(self) -> O {
        self.output
    }
}
