//! PUSH/POP on top of memory and the stack pointer.
//!
//! The stack grows downward. A push that would take SP below 0x0000, or a pop
//! that would take it past 0xFFFF, fails without wrapping.

use crate::error::{CpuError, CpuResult};
use crate::memory::Memory;
use crate::registers::{pair, split, Registers};

pub fn push(regs: &mut Registers, memory: &mut Memory, value: u16) -> CpuResult<()> {
    let (high, low) = split(value);
    let sp = regs.sp;
    let high_addr = sp.checked_sub(1).ok_or(CpuError::StackOverflow { sp })?;
    let low_addr = high_addr.checked_sub(1).ok_or(CpuError::StackOverflow { sp })?;
    memory.write_byte(high_addr, high);
    memory.write_byte(low_addr, low);
    regs.sp = low_addr;
    Ok(())
}

pub fn pop(regs: &mut Registers, memory: &Memory) -> CpuResult<u16> {
    let sp = regs.sp;
    let high_addr = sp.checked_add(1).ok_or(CpuError::StackUnderflow { sp })?;
    let new_sp = high_addr.checked_add(1).ok_or(CpuError::StackUnderflow { sp })?;
    let low = memory.read_byte(sp);
    let high = memory.read_byte(high_addr);
    regs.sp = new_sp;
    Ok(pair(high, low))
}
