use thiserror::Error;

/// Conditions that stop instruction execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("unrecognized opcode 0x{opcode:02X}{} at 0x{address:04X}", if *prefixed { " (CB)" } else { "" })]
    UnknownOpcode { opcode: u8, address: u16, prefixed: bool },

    #[error("program counter ran past the end of memory at 0x{pc:04X}")]
    PcOverflow { pc: u16 },

    #[error("stack push below 0x0000 (SP=0x{sp:04X})")]
    StackOverflow { sp: u16 },

    #[error("stack pop past 0xFFFF (SP=0x{sp:04X})")]
    StackUnderflow { sp: u16 },
}

/// Invalid-argument conditions on the flag register. Never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("flag bit must be 0 or 1, got {0}")]
    InvalidFlagBit(u8),

    #[error("unknown flag name '{0}', flag names are Z, N, H, C")]
    InvalidFlagName(char),
}

#[derive(Debug, Error)]
pub enum RomError {
    #[error("failed to read ROM: {0}")]
    Io(#[from] std::io::Error),

    #[error("ROM image is empty")]
    Empty,

    #[error("ROM image is {len} bytes, larger than the 64 KiB address space")]
    TooLarge { len: usize },
}

pub type CpuResult<T> = Result<T, CpuError>;
