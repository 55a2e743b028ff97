use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::RomError;
use crate::memory::{Memory, MEMORY_SIZE};

const TITLE_START: usize = 0x134;
const TITLE_END: usize = 0x144;
const CARTRIDGE_TYPE: usize = 0x147;

/// A ROM image ready to be copied into memory. No header validation.
pub struct Rom {
    bytes: Vec<u8>,
}

impl Rom {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, RomError> {
        if bytes.is_empty() {
            return Err(RomError::Empty);
        }
        if bytes.len() > MEMORY_SIZE {
            return Err(RomError::TooLarge { len: bytes.len() });
        }
        Ok(Rom { bytes })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RomError> {
        let path = path.as_ref();
        let rom = Rom::from_bytes(fs::read(path)?)?;
        info!(
            path = %path.display(),
            size = rom.len(),
            title = %rom.title().unwrap_or_default(),
            "loaded ROM"
        );
        Ok(rom)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Header title, if the image is long enough to have one.
    pub fn title(&self) -> Option<String> {
        let raw = self.bytes.get(TITLE_START..TITLE_END)?;
        let title = String::from_utf8_lossy(raw)
            .trim_matches('\0')
            .trim()
            .to_string();
        Some(title)
    }

    pub fn cartridge_type(&self) -> Option<u8> {
        self.bytes.get(CARTRIDGE_TYPE).copied()
    }

    /// Replace the whole of `memory` with this image.
    pub fn load_into(&self, memory: &mut Memory) {
        memory.load(&self.bytes);
    }
}
