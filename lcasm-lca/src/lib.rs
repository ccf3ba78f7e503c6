pub mod cpu;
pub mod decoder;
pub mod format;
pub mod isa;
pub mod machine;
pub mod risk;
pub mod semantics;

mod error;

pub use crate::cpu::LcaCpu;
pub use crate::decoder::LcaDecoder;
pub use crate::error::{ExecutionError, Result};
pub use crate::isa::catalog::{Catalog, CatalogError};
pub use crate::isa::instruction::{DecodedInstruction, InstructionDescriptor};
pub use crate::machine::{LcaMachine, RunSummary, StopReason};
