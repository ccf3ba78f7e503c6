use std::ops::Range;

use crate::error::Result;
use crate::memory::{Memory, Segment, WORD_BYTES};
use crate::register::{Register, RegisterFile};

/// Everything an instruction handler may touch.
///
/// Handlers get exclusive access for the duration of one call; no
/// implementation needs internal locking.
pub trait MachineState {
    fn register(&self, register: Register) -> i32;
    fn set_register(&mut self, register: Register, value: i32);

    fn pc(&self) -> u32;
    fn set_pc(&mut self, address: u32);

    fn read_word(&self, address: u32) -> Result<i32>;
    fn write_word(&mut self, address: u32, value: i32) -> Result<()>;

    /// Takes a PC-relative branch. `displacement` counts instructions, not
    /// bytes, and is relative to the current (already advanced) PC.
    fn branch(&mut self, displacement: i32) {
        let offset = displacement.wrapping_shl(2) as u32;
        self.set_pc(self.pc().wrapping_add(offset));
    }

    fn jump(&mut self, target: u32) {
        self.set_pc(target);
    }

    /// Stores the return address (the current PC) in `register`.
    fn link(&mut self, register: Register) {
        self.set_register(register, self.pc() as i32);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MachineConfig {
    pub text_base: u32,
    pub global_pointer: u32,
    pub stack_pointer: u32,
    pub segments: Vec<(Range<u32>, Segment)>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            text_base: Self::DEFAULT_TEXT_BASE,
            global_pointer: Self::DEFAULT_GLOBAL_POINTER,
            stack_pointer: Self::DEFAULT_STACK_POINTER,
            segments: vec![
                (Self::DEFAULT_TEXT_BASE..0x1000_0000, Segment::TEXT),
                (0x1000_0000..0x8000_0000, Segment::DATA),
            ],
        }
    }
}

impl MachineConfig {
    pub const DEFAULT_TEXT_BASE: u32 = 0x0040_0000;
    pub const DEFAULT_GLOBAL_POINTER: u32 = 0x1000_8000;
    pub const DEFAULT_STACK_POINTER: u32 = 0x7FFF_EFFC;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text_base(mut self, address: u32) -> Self {
        self.text_base = address;
        self
    }

    pub fn with_global_pointer(mut self, address: u32) -> Self {
        self.global_pointer = address;
        self
    }

    pub fn with_segment(mut self, range: Range<u32>, segment: Segment) -> Self {
        self.segments.push((range, segment));
        self
    }

    /// Replaces the whole segment map.
    pub fn with_segments(mut self, segments: Vec<(Range<u32>, Segment)>) -> Self {
        self.segments = segments;
        self
    }
}

/// Reference [`MachineState`]: a register file over a segmented memory.
#[derive(Clone, Debug)]
pub struct Machine {
    config: MachineConfig,
    registers: RegisterFile,
    memory: Memory,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(MachineConfig::default())
    }
}

impl Machine {
    pub fn new(config: MachineConfig) -> Self {
        let memory = Memory::with_segments(config.segments.iter().cloned());
        let mut machine = Self {
            config,
            registers: RegisterFile::new(),
            memory,
        };
        machine.reset();
        machine
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Clears registers and memory, then restores `$gp`, `$sp` and the PC.
    pub fn reset(&mut self) {
        self.registers.reset();
        self.memory.clear();
        self.registers
            .write(Register::GP, self.config.global_pointer as i32);
        self.registers
            .write(Register::SP, self.config.stack_pointer as i32);
        self.registers.set_pc(self.config.text_base);
    }

    /// Places `words` at the text base and points the PC at the first one.
    /// Returns the address one past the last word.
    pub fn load_program(&mut self, words: &[u32]) -> Result<u32> {
        let mut address = self.config.text_base;
        for word in words {
            self.memory.load_word(address, *word as i32)?;
            address = address.wrapping_add(WORD_BYTES);
        }
        tracing::debug!(
            "loaded {} words at 0x{:08X} - 0x{:08X}",
            words.len(),
            self.config.text_base,
            address
        );
        self.registers.set_pc(self.config.text_base);
        Ok(address)
    }
}

impl MachineState for Machine {
    fn register(&self, register: Register) -> i32 {
        self.registers.read(register)
    }

    fn set_register(&mut self, register: Register, value: i32) {
        self.registers.write(register, value);
    }

    fn pc(&self) -> u32 {
        self.registers.pc()
    }

    fn set_pc(&mut self, address: u32) {
        self.registers.set_pc(address);
    }

    fn read_word(&self, address: u32) -> Result<i32> {
        self.memory.read_word(address)
    }

    fn write_word(&mut self, address: u32, value: i32) -> Result<()> {
        self.memory.write_word(address, value)
    }
}
