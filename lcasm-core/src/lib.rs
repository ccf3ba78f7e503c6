pub mod cpu;

mod error;
mod machine;
mod memory;
mod output;
mod random;
mod register;

pub use crate::error::{AddressError, Result};
pub use crate::machine::{Machine, MachineConfig, MachineState};
pub use crate::memory::{Memory, Segment, WORD_BYTES};
pub use crate::output::{NullSink, OutputSink, StdoutSink};
pub use crate::random::RandomSource;
pub use crate::register::{Register, RegisterFile};
