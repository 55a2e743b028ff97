pub const MEMORY_SIZE: usize = 0x10000;

/// Start of the memory-mapped I/O page.
pub const IO_PAGE: u16 = 0xFF00;

/// Flat 64 KiB address space shared by the CPU and its collaborators.
///
/// Addresses are `u16`, so every access is in bounds. Callers that compute an
/// address with arithmetic that can leave 16 bits must mask it themselves.
pub struct Memory {
    bytes: Box<[u8; MEMORY_SIZE]>,
}

impl Memory {
    pub fn new() -> Self {
        Memory {
            bytes: Box::new([0; MEMORY_SIZE]),
        }
    }

    pub fn read_byte(&self, address: u16) -> u8 {
        self.bytes[address as usize]
    }

    pub fn write_byte(&mut self, address: u16, value: u8) {
        self.bytes[address as usize] = value;
    }

    /// Little-endian word at `address`, `address + 1` (wrapping at the top of memory).
    pub fn read_word(&self, address: u16) -> u16 {
        let low = self.read_byte(address) as u16;
        let high = self.read_byte(address.wrapping_add(1)) as u16;
        (high << 8) | low
    }

    /// Read from the I/O page at `0xFF00 + offset`.
    pub fn read_io(&self, offset: u8) -> u8 {
        self.read_byte(IO_PAGE | offset as u16)
    }

    pub fn write_io(&mut self, offset: u8, value: u8) {
        self.write_byte(IO_PAGE | offset as u16, value);
    }

    /// Replace the whole address space: zero-fill, then copy `image` from 0x0000.
    /// Bytes past the end of the address space are ignored.
    pub fn load(&mut self, image: &[u8]) {
        self.bytes.fill(0);
        let len = image.len().min(MEMORY_SIZE);
        self.bytes[..len].copy_from_slice(&image[..len]);
    }

    /// Copy `data` starting at `address`, stopping at the end of memory.
    pub fn load_at(&mut self, address: u16, data: &[u8]) {
        let start = address as usize;
        let len = data.len().min(MEMORY_SIZE - start);
        self.bytes[start..start + len].copy_from_slice(&data[..len]);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..]
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_zero_filled() {
        let mem = Memory::new();
        assert!(mem.as_slice().iter().all(|&b| b == 0));
        assert_eq!(mem.as_slice().len(), MEMORY_SIZE);
    }

    #[test]
    fn load_replaces_previous_contents() {
        let mut mem = Memory::new();
        mem.write_byte(0x8000, 0xAA);
        mem.load(&[0x01, 0x02, 0x03]);
        assert_eq!(mem.read_byte(0x0000), 0x01);
        assert_eq!(mem.read_byte(0x0002), 0x03);
        assert_eq!(mem.read_byte(0x8000), 0x00);
    }

    #[test]
    fn read_word_is_little_endian() {
        let mut mem = Memory::new();
        mem.load_at(0xC000, &[0x34, 0x12]);
        assert_eq!(mem.read_word(0xC000), 0x1234);
    }

    #[test]
    fn io_page_is_ff00_relative() {
        let mut mem = Memory::new();
        mem.write_io(0x40, 0x91);
        assert_eq!(mem.read_byte(0xFF40), 0x91);
        assert_eq!(mem.read_io(0x40), 0x91);
    }

    #[test]
    fn load_at_clips_to_end_of_memory() {
        let mut mem = Memory::new();
        mem.load_at(0xFFFF, &[0x11, 0x22]);
        assert_eq!(mem.read_byte(0xFFFF), 0x11);
        assert_eq!(mem.read_byte(0x0000), 0x00);
    }
}
