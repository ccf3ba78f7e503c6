use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressError {
    #[error("address 0x{0:08X} is not word-aligned")]
    Unaligned(u32),
    #[error("address 0x{0:08X} is outside of any mapped segment")]
    Unmapped(u32),
    #[error("address 0x{0:08X} is in a read-only segment")]
    ReadOnly(u32),
}

pub type Result<T> = std::result::Result<T, AddressError>;
