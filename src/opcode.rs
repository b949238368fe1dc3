use std::fmt;

/// # Opcodes
///
/// CHIP-8 opcodes are 16 bits each, fetched big-endian. Their behaviour is
/// cased on the top nibble, then for groups 0, 8, E and F on the low nibble or
/// low byte.
///
/// Nibbles not used to pick the operation carry its operands:
/// - `(_, n, n, n)` a 12-bit address
/// - `(_, _, n, n)` an 8-bit immediate
/// - `(_, n, _, _)` the register vX, or the range v0..=vX
/// - `(_, _, n, _)` the register vY
/// - `(_, _, _, n)` a 4-bit immediate (sprite height)
pub trait Opcode {
    /// `[o___]`
    fn op(&self) -> u8;

    /// `[_x__]`
    fn x(&self) -> u8;

    /// `[__y_]`
    fn y(&self) -> u8;

    /// `[___n]`
    fn n(&self) -> u8;

    /// `[__nn]`
    fn nn(&self) -> u8;

    /// `[_nnn]`
    fn nnn(&self) -> u16;
}

impl Opcode for u16 {
    fn op(&self) -> u8 {
        ((self & 0xF000) >> 12) as u8
    }

    fn x(&self) -> u8 {
        ((self & 0x0F00) >> 8) as u8
    }

    fn y(&self) -> u8 {
        ((self & 0x00F0) >> 4) as u8
    }

    fn n(&self) -> u8 {
        (self & 0x000F) as u8
    }

    fn nn(&self) -> u8 {
        (self & 0x00FF) as u8
    }

    fn nnn(&self) -> u16 {
        self & 0x0FFF
    }
}

/// the most recently fetched instruction, with the operand registers as they
/// were when it was fetched; kept for the status pane
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fetched {
    pub addr: u16,
    pub word: u16,
    pub vx: u8,
    pub vy: u8,
}

impl fmt::Display for Fetched {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let w = self.word;
        write!(
            f,
            "({:04x} @ {:04x})  {:x}({:x},{:x}) 0={:02x} 1={:02x} | 0x{:04x} 0x{:04x} 0x{:04x}",
            w,
            self.addr,
            w.op(),
            w.x(),
            w.y(),
            self.vx,
            self.vy,
            w.n(),
            w.nn(),
            w.nnn()
        )
    }
}
