pub mod decoder;
pub mod opcode;
