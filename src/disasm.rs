//! Mnemonics and instruction lengths, for listings and traces.

use crate::memory::Memory;
use crate::opcodes::is_undefined;

const R: [&str; 8] = ["B", "C", "D", "E", "H", "L", "(HL)", "A"];
const RP: [&str; 4] = ["BC", "DE", "HL", "SP"];
const RP2: [&str; 4] = ["BC", "DE", "HL", "AF"];
const CC: [&str; 4] = ["NZ", "Z", "NC", "C"];
const ALU: [&str; 8] = ["ADD A,", "ADC A,", "SUB ", "SBC A,", "AND ", "XOR ", "OR ", "CP "];
const ROT: [&str; 8] = ["RLC", "RRC", "RL", "RR", "SLA", "SRA", "SWAP", "SRL"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub address: u16,
    pub opcode: u8,
    /// Total length in bytes, including the opcode (and CB prefix).
    pub length: u8,
    pub mnemonic: String,
}

/// Bytes taken by the instruction starting with `opcode`.
pub fn instruction_length(opcode: u8) -> u8 {
    match opcode {
        0xCB => 2,
        0x10 | 0x18 | 0x20 | 0x28 | 0x30 | 0x38 | 0xE0 | 0xE8 | 0xF0 | 0xF8 => 2,
        op if op < 0x40 && op & 0x07 == 0x06 => 2,
        op if op >= 0xC0 && op & 0x07 == 0x06 => 2,
        0x01 | 0x11 | 0x21 | 0x31 | 0x08 | 0xEA | 0xFA => 3,
        0xC2 | 0xC3 | 0xC4 | 0xCA | 0xCC | 0xCD | 0xD2 | 0xD4 | 0xDA | 0xDC => 3,
        _ => 1,
    }
}

/// Decode the instruction at `address`. Operand bytes past 0xFFFF read as 0.
pub fn disassemble(memory: &Memory, address: u16) -> Instruction {
    let byte = |offset: u16| -> u8 {
        address
            .checked_add(offset)
            .map(|a| memory.read_byte(a))
            .unwrap_or(0)
    };
    let opcode = byte(0);
    let n = byte(1);
    let nn = ((byte(2) as u16) << 8) | n as u16;
    let mnemonic = if opcode == 0xCB {
        cb_mnemonic(n)
    } else {
        base_mnemonic(opcode, n, nn)
    };
    Instruction {
        address,
        opcode,
        length: instruction_length(opcode),
        mnemonic,
    }
}

fn base_mnemonic(op: u8, n: u8, nn: u16) -> String {
    if is_undefined(op) {
        return format!("DB 0x{op:02X}");
    }
    let x = op >> 6;
    let y = ((op >> 3) & 0x07) as usize;
    let z = op & 0x07;
    let p = y >> 1;
    let q = y & 1;
    let e = n as i8;

    match (x, z) {
        (0, 0) => match y {
            0 => "NOP".to_string(),
            1 => format!("LD (0x{nn:04X}),SP"),
            2 => "STOP".to_string(),
            3 => format!("JR {e:+}"),
            _ => format!("JR {},{e:+}", CC[y - 4]),
        },
        (0, 1) if q == 0 => format!("LD {},0x{nn:04X}", RP[p]),
        (0, 1) => format!("ADD HL,{}", RP[p]),
        (0, 2) => {
            let target = ["(BC)", "(DE)", "(HL+)", "(HL-)"][p];
            if q == 0 {
                format!("LD {target},A")
            } else {
                format!("LD A,{target}")
            }
        }
        (0, 3) if q == 0 => format!("INC {}", RP[p]),
        (0, 3) => format!("DEC {}", RP[p]),
        (0, 4) => format!("INC {}", R[y]),
        (0, 5) => format!("DEC {}", R[y]),
        (0, 6) => format!("LD {},0x{n:02X}", R[y]),
        (0, _) => ["RLCA", "RRCA", "RLA", "RRA", "DAA", "CPL", "SCF", "CCF"][y].to_string(),
        (1, _) if op == 0x76 => "HALT".to_string(),
        (1, _) => format!("LD {},{}", R[y], R[z as usize]),
        (2, _) => format!("{}{}", ALU[y], R[z as usize]),
        (_, 0) => match y {
            0..=3 => format!("RET {}", CC[y]),
            4 => format!("LDH (0x{n:02X}),A"),
            5 => format!("ADD SP,{e:+}"),
            6 => format!("LDH A,(0x{n:02X})"),
            _ => format!("LD HL,SP{e:+}"),
        },
        (_, 1) if q == 0 => format!("POP {}", RP2[p]),
        (_, 1) => ["RET", "RETI", "JP HL", "LD SP,HL"][p].to_string(),
        (_, 2) => match y {
            0..=3 => format!("JP {},0x{nn:04X}", CC[y]),
            4 => "LD (C),A".to_string(),
            5 => format!("LD (0x{nn:04X}),A"),
            6 => "LD A,(C)".to_string(),
            _ => format!("LD A,(0x{nn:04X})"),
        },
        (_, 3) => match y {
            0 => format!("JP 0x{nn:04X}"),
            6 => "DI".to_string(),
            _ => "EI".to_string(),
        },
        (_, 4) => format!("CALL {},0x{nn:04X}", CC[y]),
        (_, 5) if q == 0 => format!("PUSH {}", RP2[p]),
        (_, 5) => format!("CALL 0x{nn:04X}"),
        (_, 6) => format!("{}0x{n:02X}", ALU[y]),
        _ => format!("RST 0x{:02X}", y * 8),
    }
}

fn cb_mnemonic(op: u8) -> String {
    let y = ((op >> 3) & 0x07) as usize;
    let target = R[(op & 0x07) as usize];
    match op >> 6 {
        0 => format!("{} {target}", ROT[y]),
        1 => format!("BIT {y},{target}"),
        2 => format!("RES {y},{target}"),
        _ => format!("SET {y},{target}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Instruction {
        let mut mem = Memory::new();
        mem.load_at(0x0100, bytes);
        disassemble(&mem, 0x0100)
    }

    #[test]
    fn lengths() {
        assert_eq!(instruction_length(0x00), 1);
        assert_eq!(instruction_length(0x06), 2);
        assert_eq!(instruction_length(0x36), 2);
        assert_eq!(instruction_length(0xFE), 2);
        assert_eq!(instruction_length(0x01), 3);
        assert_eq!(instruction_length(0xCD), 3);
        assert_eq!(instruction_length(0xCB), 2);
        assert_eq!(instruction_length(0xE9), 1);
        assert_eq!(instruction_length(0xD3), 1);
    }

    #[test]
    fn base_mnemonics() {
        assert_eq!(decode(&[0x00]).mnemonic, "NOP");
        assert_eq!(decode(&[0x01, 0x13, 0x00]).mnemonic, "LD BC,0x0013");
        assert_eq!(decode(&[0x18, 0xFE]).mnemonic, "JR -2");
        assert_eq!(decode(&[0x20, 0x05]).mnemonic, "JR NZ,+5");
        assert_eq!(decode(&[0x22]).mnemonic, "LD (HL+),A");
        assert_eq!(decode(&[0x3A]).mnemonic, "LD A,(HL-)");
        assert_eq!(decode(&[0x36, 0x10]).mnemonic, "LD (HL),0x10");
        assert_eq!(decode(&[0x41]).mnemonic, "LD B,C");
        assert_eq!(decode(&[0x76]).mnemonic, "HALT");
        assert_eq!(decode(&[0x86]).mnemonic, "ADD A,(HL)");
        assert_eq!(decode(&[0xAF]).mnemonic, "XOR A");
        assert_eq!(decode(&[0xC3, 0x50, 0x01]).mnemonic, "JP 0x0150");
        assert_eq!(decode(&[0xE0, 0x40]).mnemonic, "LDH (0x40),A");
        assert_eq!(decode(&[0xF5]).mnemonic, "PUSH AF");
        assert_eq!(decode(&[0xFE, 0x90]).mnemonic, "CP 0x90");
        assert_eq!(decode(&[0xFF]).mnemonic, "RST 0x38");
        assert_eq!(decode(&[0xF3]).mnemonic, "DI");
        assert_eq!(decode(&[0xD3]).mnemonic, "DB 0xD3");
    }

    #[test]
    fn cb_mnemonics() {
        let insn = decode(&[0xCB, 0x37]);
        assert_eq!(insn.mnemonic, "SWAP A");
        assert_eq!(insn.length, 2);
        assert_eq!(decode(&[0xCB, 0x7C]).mnemonic, "BIT 7,H");
        assert_eq!(decode(&[0xCB, 0x87]).mnemonic, "RES 0,A");
        assert_eq!(decode(&[0xCB, 0xFE]).mnemonic, "SET 7,(HL)");
    }

    #[test]
    fn operands_past_end_of_memory_read_as_zero() {
        let mut mem = Memory::new();
        mem.write_byte(0xFFFF, 0xC3);
        let insn = disassemble(&mem, 0xFFFF);
        assert_eq!(insn.mnemonic, "JP 0x0000");
    }
}
