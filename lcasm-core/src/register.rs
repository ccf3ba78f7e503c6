use std::fmt;

/// Index of one of the 32 general-purpose registers.
///
/// Range validation is the register file's job; the index is masked to five
/// bits when it is looked up, the same way the hardware field is.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Register(u8);

impl Register {
    pub const COUNT: usize = 32;

    pub const ZERO: Register = Register(0);
    pub const AT: Register = Register(1);
    pub const V0: Register = Register(2);
    pub const T0: Register = Register(8);
    pub const T7: Register = Register(15);
    pub const GP: Register = Register(28);
    pub const SP: Register = Register(29);
    pub const RA: Register = Register(31);

    const NAMES: [&'static str; Register::COUNT] = [
        "$zero", "$at", "$v0", "$v1", "$a0", "$a1", "$a2", "$a3", "$t0", "$t1", "$t2", "$t3",
        "$t4", "$t5", "$t6", "$t7", "$s0", "$s1", "$s2", "$s3", "$s4", "$s5", "$s6", "$s7",
        "$t8", "$t9", "$k0", "$k1", "$gp", "$sp", "$fp", "$ra",
    ];

    pub const fn new(index: u8) -> Self {
        Register(index & 0x1F)
    }

    /// Builds a register from a decoded 5-bit instruction field.
    pub const fn from_field(field: u32) -> Self {
        Register((field & 0x1F) as u8)
    }

    pub const fn index(&self) -> u8 {
        self.0
    }

    /// Conventional assembler name, e.g. `$t1` for register 9.
    pub fn name(&self) -> &'static str {
        Self::NAMES[self.0 as usize]
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        if let Some(idx) = Self::NAMES.iter().position(|n| *n == name) {
            return Some(Register(idx as u8));
        }
        let number: u8 = name.strip_prefix('$')?.parse().ok()?;
        (usize::from(number) < Self::COUNT).then_some(Register(number))
    }
}

impl fmt::Debug for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(${})", self.name(), self.0)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl From<Register> for usize {
    fn from(register: Register) -> Self {
        register.0 as usize
    }
}

/// The 32 general-purpose registers and the program counter.
///
/// `$zero` is hardwired: writes to it are dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct RegisterFile {
    values: [i32; Register::COUNT],
    pc: u32,
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterFile {
    pub fn new() -> Self {
        Self {
            values: [0; Register::COUNT],
            pc: 0,
        }
    }

    pub fn read(&self, register: Register) -> i32 {
        self.values[usize::from(register)]
    }

    pub fn write(&mut self, register: Register, value: i32) {
        if register == Register::ZERO {
            tracing::trace!("ignoring write of {} to $zero", value);
            return;
        }
        self.values[usize::from(register)] = value;
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn set_pc(&mut self, address: u32) {
        self.pc = address;
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn iter(&self) -> impl Iterator<Item = (Register, i32)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(idx, value)| (Register::new(idx as u8), *value))
    }
}

impl fmt::Debug for RegisterFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        map.entry(&"pc", &format_args!("0x{:08X}", self.pc));
        for (register, value) in self.iter().filter(|(_, value)| *value != 0) {
            map.entry(&register.name(), &format_args!("0x{:08X}", value));
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_hardwired() {
        let mut regs = RegisterFile::new();
        regs.write(Register::ZERO, 42);
        assert_eq!(regs.read(Register::ZERO), 0);
        regs.write(Register::T0, -7);
        assert_eq!(regs.read(Register::T0), -7);
    }

    #[test]
    fn names_round_trip() {
        assert_eq!(Register::new(9).name(), "$t1");
        assert_eq!(Register::from_name("$t1"), Some(Register::new(9)));
        assert_eq!(Register::from_name("$31"), Some(Register::RA));
        assert_eq!(Register::from_name("$32"), None);
        assert_eq!(Register::from_name("t1"), None);
        assert_eq!(Register::GP.name(), "$gp");
    }

    #[test]
    fn index_is_masked_to_five_bits() {
        assert_eq!(Register::new(33), Register::AT);
        assert_eq!(Register::from_field(0xFFFF_FFE2), Register::V0);
    }

    #[test]
    fn reset_clears_pc_and_registers() {
        let mut regs = RegisterFile::new();
        regs.write(Register::SP, 100);
        regs.set_pc(0x0040_0000);
        regs.reset();
        assert_eq!(regs.read(Register::SP), 0);
        assert_eq!(regs.pc(), 0);
    }
}
