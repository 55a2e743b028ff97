//! Arithmetic, logic, rotate and shift routines.
//!
//! Each routine is total over its 8-bit (or 16-bit) domain. It returns the
//! result and leaves Z/N/H/C in the register file exactly as the hardware does.
//! Callers decide where the result is stored.

use crate::registers::{Flag, Registers};

pub fn add8(regs: &mut Registers, a: u8, b: u8) -> u8 {
    let result = a.wrapping_add(b);
    regs.set_flags(
        result == 0,
        false,
        (a & 0x0F) + (b & 0x0F) > 0x0F,
        (a as u16) + (b as u16) > 0xFF,
    );
    result
}

pub fn adc8(regs: &mut Registers, a: u8, b: u8) -> u8 {
    let carry = regs.flag_bit(Flag::Carry);
    let result = a.wrapping_add(b).wrapping_add(carry);
    regs.set_flags(
        result == 0,
        false,
        (a & 0x0F) + (b & 0x0F) + carry > 0x0F,
        (a as u16) + (b as u16) + (carry as u16) > 0xFF,
    );
    result
}

/// Half-carry follows the borrow out of bit 4.
pub fn sub8(regs: &mut Registers, a: u8, b: u8) -> u8 {
    let result = a.wrapping_sub(b);
    regs.set_flags(result == 0, true, (a & 0x0F) < (b & 0x0F), a < b);
    result
}

pub fn sbc8(regs: &mut Registers, a: u8, b: u8) -> u8 {
    let carry = regs.flag_bit(Flag::Carry);
    let result = a.wrapping_sub(b).wrapping_sub(carry);
    regs.set_flags(
        result == 0,
        true,
        (a & 0x0F) < (b & 0x0F) + carry,
        (a as u16) < (b as u16) + (carry as u16),
    );
    result
}

/// Compare: flags of `a - b`, result discarded.
pub fn cp8(regs: &mut Registers, a: u8, b: u8) {
    sub8(regs, a, b);
}

pub fn and8(regs: &mut Registers, a: u8, b: u8) -> u8 {
    let result = a & b;
    regs.set_flags(result == 0, false, true, false);
    result
}

pub fn or8(regs: &mut Registers, a: u8, b: u8) -> u8 {
    let result = a | b;
    regs.set_flags(result == 0, false, false, false);
    result
}

pub fn xor8(regs: &mut Registers, a: u8, b: u8) -> u8 {
    let result = a ^ b;
    regs.set_flags(result == 0, false, false, false);
    result
}

/// INC leaves carry alone.
pub fn inc8(regs: &mut Registers, value: u8) -> u8 {
    let result = value.wrapping_add(1);
    regs.set_flag(Flag::Zero, result == 0);
    regs.set_flag(Flag::Subtract, false);
    regs.set_flag(Flag::HalfCarry, (value & 0x0F) == 0x0F);
    result
}

/// DEC leaves carry alone.
pub fn dec8(regs: &mut Registers, value: u8) -> u8 {
    let result = value.wrapping_sub(1);
    regs.set_flag(Flag::Zero, result == 0);
    regs.set_flag(Flag::Subtract, true);
    regs.set_flag(Flag::HalfCarry, (value & 0x0F) == 0);
    result
}

/// ADD HL,rr: Z untouched, H out of bit 11, C out of bit 15.
pub fn add16(regs: &mut Registers, a: u16, b: u16) -> u16 {
    let result = a.wrapping_add(b);
    regs.set_flag(Flag::Subtract, false);
    regs.set_flag(Flag::HalfCarry, (a & 0x0FFF) + (b & 0x0FFF) > 0x0FFF);
    regs.set_flag(Flag::Carry, (a as u32) + (b as u32) > 0xFFFF);
    result
}

/// SP + signed offset, as used by ADD SP,e and LD HL,SP+e.
/// H and C come from the unsigned add of the low byte.
pub fn add_sp_offset(regs: &mut Registers, sp: u16, offset: i8) -> u16 {
    let unsigned = offset as u8 as u16;
    regs.set_flags(
        false,
        false,
        (sp & 0x0F) + (unsigned & 0x0F) > 0x0F,
        (sp & 0xFF) + unsigned > 0xFF,
    );
    sp.wrapping_add_signed(offset as i16)
}

pub fn rotate_left(regs: &mut Registers, value: u8) -> u8 {
    let result = value.rotate_left(1);
    regs.set_flags(result == 0, false, false, value & 0x80 != 0);
    result
}

pub fn rotate_right(regs: &mut Registers, value: u8) -> u8 {
    let result = value.rotate_right(1);
    regs.set_flags(result == 0, false, false, value & 0x01 != 0);
    result
}

/// 9-bit rotate: old carry enters bit 0, bit 7 becomes carry.
pub fn rotate_left_through_carry(regs: &mut Registers, value: u8) -> u8 {
    let carry_in = regs.flag_bit(Flag::Carry);
    let result = (value << 1) | carry_in;
    regs.set_flags(result == 0, false, false, value & 0x80 != 0);
    result
}

/// 9-bit rotate: old carry enters bit 7, bit 0 becomes carry.
pub fn rotate_right_through_carry(regs: &mut Registers, value: u8) -> u8 {
    let carry_in = regs.flag_bit(Flag::Carry);
    let result = (value >> 1) | (carry_in << 7);
    regs.set_flags(result == 0, false, false, value & 0x01 != 0);
    result
}

pub fn shift_left_arithmetic(regs: &mut Registers, value: u8) -> u8 {
    let result = value << 1;
    regs.set_flags(result == 0, false, false, value & 0x80 != 0);
    result
}

/// Bit 7 is kept.
pub fn shift_right_arithmetic(regs: &mut Registers, value: u8) -> u8 {
    let result = (value >> 1) | (value & 0x80);
    regs.set_flags(result == 0, false, false, value & 0x01 != 0);
    result
}

/// Bit 7 is cleared.
pub fn shift_right_logical(regs: &mut Registers, value: u8) -> u8 {
    let result = value >> 1;
    regs.set_flags(result == 0, false, false, value & 0x01 != 0);
    result
}

pub fn swap_nibbles(regs: &mut Registers, value: u8) -> u8 {
    let result = value.rotate_left(4);
    regs.set_flags(result == 0, false, false, false);
    result
}

/// BIT b: Z is the complement of the tested bit, C untouched.
pub fn test_bit(regs: &mut Registers, bit: u8, value: u8) {
    regs.set_flag(Flag::Zero, value & (1 << bit) == 0);
    regs.set_flag(Flag::Subtract, false);
    regs.set_flag(Flag::HalfCarry, true);
}

pub fn reset_bit(bit: u8, value: u8) -> u8 {
    value & !(1 << bit)
}

pub fn set_bit(bit: u8, value: u8) -> u8 {
    value | (1 << bit)
}

/// Decimal-adjust the accumulator after a BCD add or subtract.
pub fn daa(regs: &mut Registers, value: u8) -> u8 {
    let mut adjust = 0u8;
    let mut carry = regs.get_flag(Flag::Carry);
    let result = if regs.get_flag(Flag::Subtract) {
        if regs.get_flag(Flag::HalfCarry) {
            adjust |= 0x06;
        }
        if carry {
            adjust |= 0x60;
        }
        value.wrapping_sub(adjust)
    } else {
        if regs.get_flag(Flag::HalfCarry) || (value & 0x0F) > 0x09 {
            adjust |= 0x06;
        }
        if carry || value > 0x99 {
            adjust |= 0x60;
            carry = true;
        }
        value.wrapping_add(adjust)
    };
    regs.set_flag(Flag::Zero, result == 0);
    regs.set_flag(Flag::HalfCarry, false);
    regs.set_flag(Flag::Carry, carry);
    result
}

/// CPL
pub fn complement(regs: &mut Registers, value: u8) -> u8 {
    regs.set_flag(Flag::Subtract, true);
    regs.set_flag(Flag::HalfCarry, true);
    !value
}
