use crate::error::RegisterError;
use tracing::warn;

/// 8-bit registers addressable by instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg8 {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
}

/// 16-bit register pairs plus the stack pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg16 {
    AF,
    BC,
    DE,
    HL,
    SP,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Zero = 0b1000_0000,
    Subtract = 0b0100_0000,
    HalfCarry = 0b0010_0000,
    Carry = 0b0001_0000,
}

impl Flag {
    pub const ALL: [Flag; 4] = [Flag::Zero, Flag::Subtract, Flag::HalfCarry, Flag::Carry];

    /// Look up a flag by its conventional letter (case-insensitive).
    pub fn from_name(name: char) -> Result<Flag, RegisterError> {
        match name.to_ascii_uppercase() {
            'Z' => Ok(Flag::Zero),
            'N' => Ok(Flag::Subtract),
            'H' => Ok(Flag::HalfCarry),
            'C' => Ok(Flag::Carry),
            _ => Err(RegisterError::InvalidFlagName(name)),
        }
    }

    pub fn name(self) -> char {
        match self {
            Flag::Zero => 'Z',
            Flag::Subtract => 'N',
            Flag::HalfCarry => 'H',
            Flag::Carry => 'C',
        }
    }
}

/// Lower nibble of F is hardwired to zero.
const FLAG_MASK: u8 = 0xF0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    f: u8,
    pub sp: u16,
    pub pc: u16,
}

impl Registers {
    /// Values left behind by the DMG boot ROM.
    pub fn new() -> Self {
        Registers {
            a: 0x01,
            f: 0xB0,
            b: 0x00,
            c: 0x13,
            d: 0x00,
            e: 0xD8,
            h: 0x01,
            l: 0x4D,
            sp: 0xFFFE,
            pc: 0x0100,
        }
    }

    pub fn f(&self) -> u8 {
        self.f
    }

    pub fn set_f(&mut self, value: u8) {
        self.f = value & FLAG_MASK;
    }

    // 16-bit register pairs
    pub fn af(&self) -> u16 {
        pair(self.a, self.f)
    }

    pub fn bc(&self) -> u16 {
        pair(self.b, self.c)
    }

    pub fn de(&self) -> u16 {
        pair(self.d, self.e)
    }

    pub fn hl(&self) -> u16 {
        pair(self.h, self.l)
    }

    pub fn set_af(&mut self, value: u16) {
        self.a = (value >> 8) as u8;
        self.set_f(value as u8);
    }

    pub fn set_bc(&mut self, value: u16) {
        self.b = (value >> 8) as u8;
        self.c = value as u8;
    }

    pub fn set_de(&mut self, value: u16) {
        self.d = (value >> 8) as u8;
        self.e = value as u8;
    }

    pub fn set_hl(&mut self, value: u16) {
        self.h = (value >> 8) as u8;
        self.l = value as u8;
    }

    pub fn get8(&self, reg: Reg8) -> u8 {
        match reg {
            Reg8::A => self.a,
            Reg8::B => self.b,
            Reg8::C => self.c,
            Reg8::D => self.d,
            Reg8::E => self.e,
            Reg8::H => self.h,
            Reg8::L => self.l,
        }
    }

    pub fn set8(&mut self, reg: Reg8, value: u8) {
        match reg {
            Reg8::A => self.a = value,
            Reg8::B => self.b = value,
            Reg8::C => self.c = value,
            Reg8::D => self.d = value,
            Reg8::E => self.e = value,
            Reg8::H => self.h = value,
            Reg8::L => self.l = value,
        }
    }

    pub fn get16(&self, reg: Reg16) -> u16 {
        match reg {
            Reg16::AF => self.af(),
            Reg16::BC => self.bc(),
            Reg16::DE => self.de(),
            Reg16::HL => self.hl(),
            Reg16::SP => self.sp,
        }
    }

    pub fn set16(&mut self, reg: Reg16, value: u16) {
        match reg {
            Reg16::AF => self.set_af(value),
            Reg16::BC => self.set_bc(value),
            Reg16::DE => self.set_de(value),
            Reg16::HL => self.set_hl(value),
            Reg16::SP => self.sp = value,
        }
    }

    // Flag operations
    pub fn get_flag(&self, flag: Flag) -> bool {
        (self.f & (flag as u8)) != 0
    }

    pub fn set_flag(&mut self, flag: Flag, value: bool) {
        if value {
            self.f |= flag as u8;
        } else {
            self.f &= !(flag as u8);
        }
    }

    /// Flag as a 0/1 bit.
    pub fn flag_bit(&self, flag: Flag) -> u8 {
        self.get_flag(flag) as u8
    }

    /// Set a flag from a numeric bit. Anything other than 0 or 1 leaves F untouched.
    pub fn set_flag_bit(&mut self, flag: Flag, bit: u8) -> Result<(), RegisterError> {
        match bit {
            0 | 1 => {
                self.set_flag(flag, bit == 1);
                Ok(())
            }
            _ => {
                warn!(flag = %flag.name(), bit, "ignoring invalid flag bit");
                Err(RegisterError::InvalidFlagBit(bit))
            }
        }
    }

    /// Read a flag by letter. Unknown names read as 0 and are reported.
    pub fn flag_by_name(&self, name: char) -> u8 {
        match Flag::from_name(name) {
            Ok(flag) => self.flag_bit(flag),
            Err(err) => {
                warn!(%err, "flag lookup failed");
                0
            }
        }
    }

    /// Set a flag by letter. Unknown names and invalid bits are reported no-ops.
    pub fn set_flag_by_name(&mut self, name: char, bit: u8) -> Result<(), RegisterError> {
        let flag = Flag::from_name(name).inspect_err(|err| warn!(%err, "flag update ignored"))?;
        self.set_flag_bit(flag, bit)
    }

    /// Overwrite all four flags at once.
    pub fn set_flags(&mut self, zero: bool, subtract: bool, half_carry: bool, carry: bool) {
        self.set_flag(Flag::Zero, zero);
        self.set_flag(Flag::Subtract, subtract);
        self.set_flag(Flag::HalfCarry, half_carry);
        self.set_flag(Flag::Carry, carry);
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

/// Compose a big-endian pair from two unsigned halves.
pub fn pair(high: u8, low: u8) -> u16 {
    ((high as u16) << 8) | (low as u16)
}

/// Split a word into (high, low).
pub fn split(word: u16) -> (u8, u8) {
    ((word >> 8) as u8, (word & 0xFF) as u8)
}
