use crate::error::{Chip8Error, Result};
use std::io;

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// Represents the byte-addressable memory of the machine
pub trait MemoryMap {
    /// write a chunk of bytes into "RAM"
    fn write(&mut self, data: &[u8], addr: u16) {
        self.get_rw_slice(addr, data.len()).copy_from_slice(data);
    }

    /// get a two-byte big-endian word (instruction fetch)
    fn get_word(&self, addr: u16) -> u16 {
        let word = self.get_ro_slice(addr, 2);
        ((word[0] as u16) << 8) + (word[1] as u16)
    }

    /// read a byte; addresses past the end wrap around
    fn get_byte(&self, addr: u16) -> u8;

    /// write a byte; addresses past the end wrap around
    fn set_byte(&mut self, addr: u16, value: u8);

    /// get a r/w slice of the underlying memory
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> &mut [u8];

    /// get a r/o slice of the underlying memory
    fn get_ro_slice(&self, addr: u16, len: usize) -> &[u8];
}

/// how much RAM we have
pub const MEMORY_SIZE: usize = 4096;

/// where the program label lives, and how much room it gets
pub const LABEL_ADDR: u16 = 0x000;
pub const LABEL_SIZE: usize = 80;

/// where the hex font lives
pub const FONT_ADDR: u16 = 0x050;
pub const FONT_GLYPH_SIZE: u16 = 5;

/// where the program is loaded
pub const PROGRAM_ADDR: u16 = 0x200;

/// the most program bytes that will fit above PROGRAM_ADDR
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - PROGRAM_ADDR as usize;

pub const DEFAULT_LABEL: &str = "Press Ctrl+m to exit";

/// Defines the memory map used by this interpreter
///   0x0000-0x004f  program label (nul-terminated)
///   0x0050-0x009f  font, 16 glyphs x 5 bytes
///   0x00a0-0x01ff  unused
///   0x0200-0x0fff  program and scratch memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chip8Memory {
    bytes: Box<[u8]>,
}

impl MemoryMap for Chip8Memory {
    fn get_byte(&self, addr: u16) -> u8 {
        self.bytes[addr as usize % MEMORY_SIZE]
    }

    fn set_byte(&mut self, addr: u16, value: u8) {
        self.bytes[addr as usize % MEMORY_SIZE] = value;
    }

    fn get_rw_slice(&mut self, addr: u16, len: usize) -> &mut [u8] {
        let a = addr as usize;
        &mut self.bytes[a..(a + len)]
    }

    fn get_ro_slice(&self, addr: u16, len: usize) -> &[u8] {
        let a = addr as usize;
        &self.bytes[a..(a + len)]
    }
}

impl Chip8Memory {
    /// zeroed memory with the font and the default label baked in
    pub fn new() -> Self {
        let mut mm = Chip8Memory::zeroed();
        mm.write(&CHIP8_FONT, FONT_ADDR);
        mm.set_label(DEFAULT_LABEL);
        mm
    }

    /// memory with nothing in it at all
    pub(crate) fn zeroed() -> Self {
        Chip8Memory {
            bytes: vec![0u8; MEMORY_SIZE].into_boxed_slice(),
        }
    }

    /// rebuild memory from a full image; caller guarantees the length
    pub(crate) fn from_image(image: &[u8]) -> Self {
        debug_assert_eq!(image.len(), MEMORY_SIZE);
        Chip8Memory {
            bytes: image.into(),
        }
    }

    /// the whole 4K, for snapshots
    pub fn image(&self) -> &[u8] {
        &self.bytes
    }

    /// stamp a label into the label region; anything too long is cut short so
    /// the terminating nul always fits
    pub fn set_label(&mut self, label: &str) {
        let region = self.get_rw_slice(LABEL_ADDR, LABEL_SIZE);
        region.fill(0);
        let len = label.len().min(LABEL_SIZE - 1);
        region[..len].copy_from_slice(&label.as_bytes()[..len]);
    }

    /// the label, up to the first nul
    pub fn label(&self) -> String {
        let region = self.get_ro_slice(LABEL_ADDR, LABEL_SIZE);
        let end = region.iter().position(|&b| b == 0).unwrap_or(LABEL_SIZE);
        String::from_utf8_lossy(&region[..end]).into_owned()
    }

    /// load a CHIP-8 program at 0x200
    pub fn load_program(&mut self, program: &[u8]) -> Result<()> {
        if program.len() > MAX_PROGRAM_SIZE {
            return Err(Chip8Error::ProgramTooLarge {
                size: program.len(),
                max: MAX_PROGRAM_SIZE,
            });
        }
        self.write(program, PROGRAM_ADDR);
        Ok(())
    }

    /// read a whole program from somewhere and load it at 0x200
    pub fn load_program_from(&mut self, reader: &mut impl io::Read) -> Result<()> {
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .map_err(Chip8Error::ProgramRead)?;
        self.load_program(&buf)
    }
}

impl Default for Chip8Memory {
    fn default() -> Self {
        Self::new()
    }
}

pub const CHIP8_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_zeroed() {
        let m = Chip8Memory::new();
        // NB. memory is zeroed from 0x200 because before that we bake in the
        //     font and the label
        assert_eq!(m.bytes[0x200..], [0; 0xe00]);
        assert_eq!(m.bytes[0xa0..0x200], [0; 0x160]);
    }

    #[test]
    fn test_font_baked_in() {
        let m = Chip8Memory::new();
        assert_eq!(m.get_ro_slice(FONT_ADDR, 80), &CHIP8_FONT);
    }

    #[test]
    fn test_default_label() {
        let m = Chip8Memory::new();
        assert_eq!(m.label(), DEFAULT_LABEL);
        assert_eq!(m.get_byte(DEFAULT_LABEL.len() as u16), 0);
    }

    #[test]
    fn test_long_label_keeps_terminator() {
        let mut m = Chip8Memory::new();
        m.set_label(&"z".repeat(200));
        assert_eq!(m.label().len(), LABEL_SIZE - 1);
        // the font must not have been touched
        assert_eq!(m.get_byte(FONT_ADDR), 0xF0);
    }

    #[test]
    fn test_write_slice_ok() {
        let mut dst = Chip8Memory::zeroed();
        let src: &[u8] = &[0, 1, 2, 3, 4, 5, 6, 7];
        dst.write(src, 8);
        assert_eq!(
            dst.bytes[..16],
            [0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7]
        );
    }

    #[test]
    fn test_read_word() {
        let mut m = Chip8Memory::zeroed();
        m.write(&[0, 1, 2, 3, 4, 5, 6, 7], 0);
        assert_eq!(m.get_word(0x4), 0x0405);
    }

    #[test]
    fn test_byte_access_wraps() {
        let mut m = Chip8Memory::zeroed();
        m.set_byte(0x1001, 0xAB);
        assert_eq!(m.get_byte(0x0001), 0xAB);
    }

    #[test]
    #[should_panic]
    fn test_read_too_much_panic() {
        let mut dst = Chip8Memory::zeroed();
        dst.write(&[0; 8], 4089);
    }

    #[test]
    fn test_program_load_ok() -> Result<()> {
        let mut dst = Chip8Memory::new();
        let mut prog: &[u8] = &[0x00, 0xe0]; // clear screen
        dst.load_program_from(&mut prog)?;
        assert_eq!(dst.get_ro_slice(0x200, 2), &[0x00, 0xe0]);
        Ok(())
    }

    #[test]
    fn test_program_fills_memory_exactly() -> Result<()> {
        let mut dst = Chip8Memory::new();
        dst.load_program(&[0xAA; MAX_PROGRAM_SIZE])?;
        assert_eq!(dst.get_byte(0xfff), 0xAA);
        Ok(())
    }

    #[test]
    fn test_program_too_large() {
        let mut dst = Chip8Memory::new();
        let err = dst.load_program(&[0; MAX_PROGRAM_SIZE + 1]).unwrap_err();
        assert!(matches!(
            err,
            Chip8Error::ProgramTooLarge { size: 3585, max: 3584 }
        ));
        // nothing was written
        assert_eq!(dst.get_byte(0x200), 0);
    }
}
