//! Base and CB-prefixed dispatch tables.
//!
//! Both tables hold 256 handlers indexed by opcode byte and are built once on
//! first use. Most instructions form regular grids, so a single handler serves a
//! whole row or column and decodes its operands from the opcode bits:
//!
//! ```text
//!   x = op >> 6    y = (op >> 3) & 7    z = op & 7
//!   p = y >> 1     q = y & 1
//! ```

use once_cell::sync::Lazy;

use crate::alu;
use crate::cpu::Cpu;
use crate::diagnostics::HaltReason;
use crate::error::{CpuError, CpuResult};
use crate::registers::{Flag, Reg16, Reg8, Registers};

pub type Handler = fn(&mut Cpu, u8) -> CpuResult<()>;

pub static BASE_TABLE: Lazy<[Handler; 256]> = Lazy::new(build_base_table);
pub static CB_TABLE: Lazy<[Handler; 256]> = Lazy::new(build_cb_table);

/// 8-bit operand: a register or the byte at (HL).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Reg(Reg8),
    IndirectHl,
}

impl Operand {
    /// Decode the 3-bit register field: B, C, D, E, H, L, (HL), A.
    pub fn from_bits(bits: u8) -> Operand {
        match bits & 0x07 {
            0 => Operand::Reg(Reg8::B),
            1 => Operand::Reg(Reg8::C),
            2 => Operand::Reg(Reg8::D),
            3 => Operand::Reg(Reg8::E),
            4 => Operand::Reg(Reg8::H),
            5 => Operand::Reg(Reg8::L),
            6 => Operand::IndirectHl,
            _ => Operand::Reg(Reg8::A),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    NotZero,
    Zero,
    NotCarry,
    Carry,
}

impl Condition {
    pub fn from_bits(bits: u8) -> Condition {
        match bits & 0x03 {
            0 => Condition::NotZero,
            1 => Condition::Zero,
            2 => Condition::NotCarry,
            _ => Condition::Carry,
        }
    }
}

/// Pair selected by bits 4-5 for loads and 16-bit arithmetic.
fn pair_sp(opcode: u8) -> Reg16 {
    match (opcode >> 4) & 0x03 {
        0 => Reg16::BC,
        1 => Reg16::DE,
        2 => Reg16::HL,
        _ => Reg16::SP,
    }
}

/// Pair selected by bits 4-5 for PUSH/POP.
fn pair_af(opcode: u8) -> Reg16 {
    match (opcode >> 4) & 0x03 {
        0 => Reg16::BC,
        1 => Reg16::DE,
        2 => Reg16::HL,
        _ => Reg16::AF,
    }
}

fn y(opcode: u8) -> u8 {
    (opcode >> 3) & 0x07
}

fn build_base_table() -> [Handler; 256] {
    let mut t: [Handler; 256] = [op_unknown as Handler; 256];

    // 0x00-0x3F
    t[0x00] = op_nop;
    t[0x08] = op_ld_nn_sp;
    t[0x10] = op_stop;
    t[0x18] = op_jr;
    for op in [0x20, 0x28, 0x30, 0x38] {
        t[op] = op_jr_cc;
    }
    for op in [0x01, 0x11, 0x21, 0x31] {
        t[op] = op_ld_rr_nn;
        t[op + 0x02] = op_inc_rr;
        t[op + 0x08] = op_add_hl_rr;
        t[op + 0x0A] = op_dec_rr;
    }
    t[0x02] = op_ld_bc_a;
    t[0x12] = op_ld_de_a;
    t[0x22] = op_ld_hli_a;
    t[0x32] = op_ld_hld_a;
    t[0x0A] = op_ld_a_bc;
    t[0x1A] = op_ld_a_de;
    t[0x2A] = op_ld_a_hli;
    t[0x3A] = op_ld_a_hld;
    for row in 0..8 {
        let base = row << 3;
        t[base | 0x04] = op_inc_r;
        t[base | 0x05] = op_dec_r;
        t[base | 0x06] = op_ld_r_n;
    }
    t[0x07] = op_rlca;
    t[0x0F] = op_rrca;
    t[0x17] = op_rla;
    t[0x1F] = op_rra;
    t[0x27] = op_daa;
    t[0x2F] = op_cpl;
    t[0x37] = op_scf;
    t[0x3F] = op_ccf;

    // 0x40-0x7F
    for op in 0x40..=0x7F {
        t[op] = op_ld_r_r;
    }
    t[0x76] = op_halt;

    // 0x80-0xBF
    for op in 0x80..=0xBF {
        t[op] = op_alu_r;
    }

    // 0xC0-0xFF
    for row in 0..4 {
        let base = 0xC0 | (row << 3);
        t[base] = op_ret_cc;
        t[base | 0x02] = op_jp_cc;
        t[base | 0x04] = op_call_cc;
    }
    for op in [0xC1, 0xD1, 0xE1, 0xF1] {
        t[op] = op_pop;
        t[op + 0x04] = op_push;
    }
    for row in 0..8 {
        let base = 0xC0 | (row << 3);
        t[base | 0x06] = op_alu_n;
        t[base | 0x07] = op_rst;
    }
    t[0xC3] = op_jp;
    t[0xC9] = op_ret;
    t[0xCB] = op_prefix_cb;
    t[0xCD] = op_call;
    t[0xD9] = op_reti;
    t[0xE0] = op_ldh_n_a;
    t[0xF0] = op_ldh_a_n;
    t[0xE2] = op_ld_c_a;
    t[0xF2] = op_ld_a_c;
    t[0xE8] = op_add_sp_e;
    t[0xF8] = op_ld_hl_sp_e;
    t[0xE9] = op_jp_hl;
    t[0xF9] = op_ld_sp_hl;
    t[0xEA] = op_ld_nn_a;
    t[0xFA] = op_ld_a_nn;
    t[0xF3] = op_di;
    t[0xFB] = op_ei;

    t
}

fn build_cb_table() -> [Handler; 256] {
    let mut t: [Handler; 256] = [op_cb_shift as Handler; 256];
    for op in 0x40..=0x7F {
        t[op] = op_cb_bit;
    }
    for op in 0x80..=0xBF {
        t[op] = op_cb_res;
    }
    for op in 0xC0..=0xFF {
        t[op] = op_cb_set;
    }
    t
}

/// True for the eleven opcode slots the hardware leaves undefined.
pub fn is_undefined(opcode: u8) -> bool {
    matches!(
        opcode,
        0xD3 | 0xDB | 0xDD | 0xE3 | 0xE4 | 0xEB | 0xEC | 0xED | 0xF4 | 0xFC | 0xFD
    )
}

// ---------------------------------------------------------------------------
// Misc / control

fn op_unknown(cpu: &mut Cpu, opcode: u8) -> CpuResult<()> {
    Err(CpuError::UnknownOpcode {
        opcode,
        address: cpu.registers.pc.wrapping_sub(1),
        prefixed: false,
    })
}

fn op_nop(_cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    Ok(())
}

fn op_halt(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    cpu.enter_halt(HaltReason::HaltInstruction);
    Ok(())
}

// STOP is two bytes; the second is padding.
fn op_stop(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    cpu.read_imm8()?;
    cpu.enter_halt(HaltReason::StopInstruction);
    Ok(())
}

fn op_di(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    cpu.ime = false;
    Ok(())
}

fn op_ei(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    cpu.ime = true;
    Ok(())
}

fn op_prefix_cb(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    let address = cpu.registers.pc;
    let opcode = cpu.read_imm8()?;
    cpu.begin_prefixed(opcode, address);
    CB_TABLE[opcode as usize](cpu, opcode)
}

// ---------------------------------------------------------------------------
// 8-bit loads

fn op_ld_r_r(cpu: &mut Cpu, opcode: u8) -> CpuResult<()> {
    let value = cpu.read_operand(Operand::from_bits(opcode));
    cpu.write_operand(Operand::from_bits(y(opcode)), value);
    Ok(())
}

fn op_ld_r_n(cpu: &mut Cpu, opcode: u8) -> CpuResult<()> {
    let value = cpu.read_imm8()?;
    cpu.write_operand(Operand::from_bits(y(opcode)), value);
    Ok(())
}

fn op_ld_bc_a(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    let addr = cpu.registers.bc();
    cpu.memory.write_byte(addr, cpu.registers.a);
    Ok(())
}

fn op_ld_de_a(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    let addr = cpu.registers.de();
    cpu.memory.write_byte(addr, cpu.registers.a);
    Ok(())
}

fn op_ld_a_bc(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    cpu.registers.a = cpu.memory.read_byte(cpu.registers.bc());
    Ok(())
}

fn op_ld_a_de(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    cpu.registers.a = cpu.memory.read_byte(cpu.registers.de());
    Ok(())
}

// LD (HL+),A
fn op_ld_hli_a(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    let addr = cpu.registers.hl();
    cpu.memory.write_byte(addr, cpu.registers.a);
    cpu.registers.set_hl(addr.wrapping_add(1));
    Ok(())
}

// LD (HL-),A
fn op_ld_hld_a(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    let addr = cpu.registers.hl();
    cpu.memory.write_byte(addr, cpu.registers.a);
    cpu.registers.set_hl(addr.wrapping_sub(1));
    Ok(())
}

// LD A,(HL+)
fn op_ld_a_hli(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    let addr = cpu.registers.hl();
    cpu.registers.a = cpu.memory.read_byte(addr);
    cpu.registers.set_hl(addr.wrapping_add(1));
    Ok(())
}

// LD A,(HL-)
fn op_ld_a_hld(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    let addr = cpu.registers.hl();
    cpu.registers.a = cpu.memory.read_byte(addr);
    cpu.registers.set_hl(addr.wrapping_sub(1));
    Ok(())
}

fn op_ld_nn_a(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    let addr = cpu.read_imm16()?;
    cpu.memory.write_byte(addr, cpu.registers.a);
    Ok(())
}

fn op_ld_a_nn(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    let addr = cpu.read_imm16()?;
    cpu.registers.a = cpu.memory.read_byte(addr);
    Ok(())
}

// LDH (n),A
fn op_ldh_n_a(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    let offset = cpu.read_imm8()?;
    cpu.memory.write_io(offset, cpu.registers.a);
    Ok(())
}

// LDH A,(n)
fn op_ldh_a_n(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    let offset = cpu.read_imm8()?;
    cpu.registers.a = cpu.memory.read_io(offset);
    Ok(())
}

// LD (C),A
fn op_ld_c_a(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    cpu.memory.write_io(cpu.registers.c, cpu.registers.a);
    Ok(())
}

// LD A,(C)
fn op_ld_a_c(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    cpu.registers.a = cpu.memory.read_io(cpu.registers.c);
    Ok(())
}

// ---------------------------------------------------------------------------
// 16-bit loads and stack

fn op_ld_rr_nn(cpu: &mut Cpu, opcode: u8) -> CpuResult<()> {
    let value = cpu.read_imm16()?;
    cpu.registers.set16(pair_sp(opcode), value);
    Ok(())
}

// LD (nn),SP stores low byte first.
fn op_ld_nn_sp(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    let addr = cpu.read_imm16()?;
    let sp = cpu.registers.sp;
    cpu.memory.write_byte(addr, sp as u8);
    cpu.memory.write_byte(addr.wrapping_add(1), (sp >> 8) as u8);
    Ok(())
}

fn op_ld_sp_hl(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    cpu.registers.sp = cpu.registers.hl();
    Ok(())
}

fn op_ld_hl_sp_e(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    let offset = cpu.read_imm8()? as i8;
    let sp = cpu.registers.sp;
    let result = alu::add_sp_offset(&mut cpu.registers, sp, offset);
    cpu.registers.set_hl(result);
    Ok(())
}

fn op_push(cpu: &mut Cpu, opcode: u8) -> CpuResult<()> {
    let value = cpu.registers.get16(pair_af(opcode));
    cpu.push(value)
}

// POP AF drops the low nibble of F via set_af.
fn op_pop(cpu: &mut Cpu, opcode: u8) -> CpuResult<()> {
    let value = cpu.pop()?;
    cpu.registers.set16(pair_af(opcode), value);
    Ok(())
}

// ---------------------------------------------------------------------------
// 8-bit arithmetic and logic

fn apply_alu(cpu: &mut Cpu, opcode: u8, value: u8) {
    let a = cpu.registers.a;
    let regs = &mut cpu.registers;
    let result = match y(opcode) {
        0 => alu::add8(regs, a, value),
        1 => alu::adc8(regs, a, value),
        2 => alu::sub8(regs, a, value),
        3 => alu::sbc8(regs, a, value),
        4 => alu::and8(regs, a, value),
        5 => alu::xor8(regs, a, value),
        6 => alu::or8(regs, a, value),
        _ => {
            alu::cp8(regs, a, value);
            a
        }
    };
    cpu.registers.a = result;
}

fn op_alu_r(cpu: &mut Cpu, opcode: u8) -> CpuResult<()> {
    let value = cpu.read_operand(Operand::from_bits(opcode));
    apply_alu(cpu, opcode, value);
    Ok(())
}

fn op_alu_n(cpu: &mut Cpu, opcode: u8) -> CpuResult<()> {
    let value = cpu.read_imm8()?;
    apply_alu(cpu, opcode, value);
    Ok(())
}

fn op_inc_r(cpu: &mut Cpu, opcode: u8) -> CpuResult<()> {
    let target = Operand::from_bits(y(opcode));
    let value = cpu.read_operand(target);
    let result = alu::inc8(&mut cpu.registers, value);
    cpu.write_operand(target, result);
    Ok(())
}

fn op_dec_r(cpu: &mut Cpu, opcode: u8) -> CpuResult<()> {
    let target = Operand::from_bits(y(opcode));
    let value = cpu.read_operand(target);
    let result = alu::dec8(&mut cpu.registers, value);
    cpu.write_operand(target, result);
    Ok(())
}

fn op_daa(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    let a = cpu.registers.a;
    cpu.registers.a = alu::daa(&mut cpu.registers, a);
    Ok(())
}

fn op_cpl(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    let a = cpu.registers.a;
    cpu.registers.a = alu::complement(&mut cpu.registers, a);
    Ok(())
}

fn op_scf(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    let zero = cpu.registers.get_flag(Flag::Zero);
    cpu.registers.set_flags(zero, false, false, true);
    Ok(())
}

fn op_ccf(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    let zero = cpu.registers.get_flag(Flag::Zero);
    let carry = cpu.registers.get_flag(Flag::Carry);
    cpu.registers.set_flags(zero, false, false, !carry);
    Ok(())
}

// ---------------------------------------------------------------------------
// 16-bit arithmetic

fn op_inc_rr(cpu: &mut Cpu, opcode: u8) -> CpuResult<()> {
    let reg = pair_sp(opcode);
    let value = cpu.registers.get16(reg).wrapping_add(1);
    cpu.registers.set16(reg, value);
    Ok(())
}

fn op_dec_rr(cpu: &mut Cpu, opcode: u8) -> CpuResult<()> {
    let reg = pair_sp(opcode);
    let value = cpu.registers.get16(reg).wrapping_sub(1);
    cpu.registers.set16(reg, value);
    Ok(())
}

fn op_add_hl_rr(cpu: &mut Cpu, opcode: u8) -> CpuResult<()> {
    let hl = cpu.registers.hl();
    let value = cpu.registers.get16(pair_sp(opcode));
    let result = alu::add16(&mut cpu.registers, hl, value);
    cpu.registers.set_hl(result);
    Ok(())
}

fn op_add_sp_e(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    let offset = cpu.read_imm8()? as i8;
    let sp = cpu.registers.sp;
    cpu.registers.sp = alu::add_sp_offset(&mut cpu.registers, sp, offset);
    Ok(())
}

// ---------------------------------------------------------------------------
// Accumulator rotates: like their CB forms, but Z is always cleared.

fn rotate_a(cpu: &mut Cpu, op: fn(&mut Registers, u8) -> u8) {
    let a = cpu.registers.a;
    cpu.registers.a = op(&mut cpu.registers, a);
    cpu.registers.set_flag(Flag::Zero, false);
}

fn op_rlca(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    rotate_a(cpu, alu::rotate_left);
    Ok(())
}

fn op_rrca(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    rotate_a(cpu, alu::rotate_right);
    Ok(())
}

fn op_rla(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    rotate_a(cpu, alu::rotate_left_through_carry);
    Ok(())
}

fn op_rra(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    rotate_a(cpu, alu::rotate_right_through_carry);
    Ok(())
}

// ---------------------------------------------------------------------------
// Jumps, calls, returns

fn op_jp(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    cpu.registers.pc = cpu.read_imm16()?;
    Ok(())
}

// The operand is consumed whether or not the jump is taken.
fn op_jp_cc(cpu: &mut Cpu, opcode: u8) -> CpuResult<()> {
    let target = cpu.read_imm16()?;
    if cpu.condition(Condition::from_bits(y(opcode))) {
        cpu.registers.pc = target;
    }
    Ok(())
}

fn op_jp_hl(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    cpu.registers.pc = cpu.registers.hl();
    Ok(())
}

fn op_jr(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    let offset = cpu.read_imm8()? as i8;
    cpu.jump_relative(offset)
}

fn op_jr_cc(cpu: &mut Cpu, opcode: u8) -> CpuResult<()> {
    let offset = cpu.read_imm8()? as i8;
    if cpu.condition(Condition::from_bits(y(opcode) - 4)) {
        cpu.jump_relative(offset)?;
    }
    Ok(())
}

fn op_call(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    let target = cpu.read_imm16()?;
    cpu.call(target)
}

fn op_call_cc(cpu: &mut Cpu, opcode: u8) -> CpuResult<()> {
    let target = cpu.read_imm16()?;
    if cpu.condition(Condition::from_bits(y(opcode))) {
        cpu.call(target)?;
    }
    Ok(())
}

fn op_ret(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    cpu.registers.pc = cpu.pop()?;
    Ok(())
}

fn op_ret_cc(cpu: &mut Cpu, opcode: u8) -> CpuResult<()> {
    if cpu.condition(Condition::from_bits(y(opcode))) {
        cpu.registers.pc = cpu.pop()?;
    }
    Ok(())
}

fn op_reti(cpu: &mut Cpu, _opcode: u8) -> CpuResult<()> {
    cpu.registers.pc = cpu.pop()?;
    cpu.ime = true;
    Ok(())
}

fn op_rst(cpu: &mut Cpu, opcode: u8) -> CpuResult<()> {
    cpu.call((opcode & 0x38) as u16)
}

// ---------------------------------------------------------------------------
// CB-prefixed

fn op_cb_shift(cpu: &mut Cpu, opcode: u8) -> CpuResult<()> {
    let target = Operand::from_bits(opcode);
    let value = cpu.read_operand(target);
    let regs = &mut cpu.registers;
    let result = match y(opcode) {
        0 => alu::rotate_left(regs, value),
        1 => alu::rotate_right(regs, value),
        2 => alu::rotate_left_through_carry(regs, value),
        3 => alu::rotate_right_through_carry(regs, value),
        4 => alu::shift_left_arithmetic(regs, value),
        5 => alu::shift_right_arithmetic(regs, value),
        6 => alu::swap_nibbles(regs, value),
        _ => alu::shift_right_logical(regs, value),
    };
    cpu.write_operand(target, result);
    Ok(())
}

fn op_cb_bit(cpu: &mut Cpu, opcode: u8) -> CpuResult<()> {
    let value = cpu.read_operand(Operand::from_bits(opcode));
    alu::test_bit(&mut cpu.registers, y(opcode), value);
    Ok(())
}

fn op_cb_res(cpu: &mut Cpu, opcode: u8) -> CpuResult<()> {
    let target = Operand::from_bits(opcode);
    let value = cpu.read_operand(target);
    cpu.write_operand(target, alu::reset_bit(y(opcode), value));
    Ok(())
}

fn op_cb_set(cpu: &mut Cpu, opcode: u8) -> CpuResult<()> {
    let target = Operand::from_bits(opcode);
    let value = cpu.read_operand(target);
    cpu.write_operand(target, alu::set_bit(y(opcode), value));
    Ok(())
}
