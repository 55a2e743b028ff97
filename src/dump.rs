//! Text dumps of memory contents and the decoded instruction stream.

use std::io::{self, Write};

use crate::disasm::disassemble;
use crate::memory::{Memory, MEMORY_SIZE};

const ENTRIES_PER_LINE: usize = 30;

/// Every byte as `0xAAAAA=>0xVV,`, thirty to a line.
pub fn write_memory_dump<W: Write>(memory: &Memory, out: &mut W) -> io::Result<()> {
    for (address, value) in memory.as_slice().iter().enumerate() {
        write!(out, "0x{address:05X}=>0x{value:02X},")?;
        if (address + 1) % ENTRIES_PER_LINE == 0 {
            writeln!(out)?;
        }
    }
    if MEMORY_SIZE % ENTRIES_PER_LINE != 0 {
        writeln!(out)?;
    }
    out.flush()
}

/// Linear sweep from `start` to the end of memory, one instruction per line.
///
/// Data is decoded as if it were code; no control flow is followed.
pub fn write_opcode_listing<W: Write>(memory: &Memory, start: u16, out: &mut W) -> io::Result<()> {
    let mut address = start as usize;
    while address < MEMORY_SIZE {
        let insn = disassemble(memory, address as u16);
        writeln!(
            out,
            "0x{:05X}\t=> 0x{:02X}\t{}",
            insn.address, insn.opcode, insn.mnemonic
        )?;
        address += insn.length as usize;
    }
    out.flush()
}
