//! # quirks
//!
//! CHIP-8 interpreters disagree on a handful of instructions. Each toggle here
//! picks one historical behaviour; the interpreter reads them, never writes.
//!
//! (from: https://tobiasvl.github.io/blog/write-a-chip-8-emulator/)
//!  * COSMAC VIP: 8xy6/8xyE shift vY, Bnnn jumps off v0, Fx55/Fx65 bump I,
//!    8xy1/2/3 reset vF
//!  * CHIP-48/SUPER-CHIP: shift vX in place, Bxnn jumps off vX, I untouched
//!  * Amiga interpreter: Fx1E sets vF when I runs past 0x1000

/// where 8xy6/8xyE read the value being shifted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftSource {
    /// shift vX in place (SUPER-CHIP)
    X,
    /// copy vY into vX, then shift (COSMAC VIP)
    Y,
}

/// which register Bnnn adds to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpOffset {
    /// vX, where X is the top nibble of nnn (SUPER-CHIP)
    Vx,
    /// always v0 (COSMAC VIP)
    V0,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quirks {
    pub shift_source: ShiftSource,
    pub jump_offset_register: JumpOffset,
    pub index_overflow_flag: bool,
    pub index_auto_increment: bool,
    pub flag_reset_on_logic: bool,
}

impl Quirks {
    /// SUPER-CHIP (modern) behaviour, with the Amiga Fx1E overflow flag
    pub const fn modern() -> Self {
        Quirks {
            shift_source: ShiftSource::X,
            jump_offset_register: JumpOffset::Vx,
            index_overflow_flag: true,
            index_auto_increment: false,
            flag_reset_on_logic: false,
        }
    }

    /// the original COSMAC VIP interpreter; Fx1E leaves vF alone
    pub const fn cosmac() -> Self {
        Quirks {
            shift_source: ShiftSource::Y,
            jump_offset_register: JumpOffset::V0,
            index_overflow_flag: false,
            index_auto_increment: true,
            flag_reset_on_logic: true,
        }
    }

    /// pack into a byte for snapshots; one bit per toggle
    pub(crate) fn to_bits(self) -> u8 {
        (self.shift_source == ShiftSource::Y) as u8
            | ((self.jump_offset_register == JumpOffset::V0) as u8) << 1
            | (self.index_overflow_flag as u8) << 2
            | (self.index_auto_increment as u8) << 3
            | (self.flag_reset_on_logic as u8) << 4
    }

    /// inverse of `to_bits`; None if any unknown bit is set
    pub(crate) fn from_bits(bits: u8) -> Option<Self> {
        if bits & !0x1f != 0 {
            return None;
        }
        Some(Quirks {
            shift_source: if bits & 0x01 != 0 {
                ShiftSource::Y
            } else {
                ShiftSource::X
            },
            jump_offset_register: if bits & 0x02 != 0 {
                JumpOffset::V0
            } else {
                JumpOffset::Vx
            },
            index_overflow_flag: bits & 0x04 != 0,
            index_auto_increment: bits & 0x08 != 0,
            flag_reset_on_logic: bits & 0x10 != 0,
        })
    }
}

impl Default for Quirks {
    fn default() -> Self {
        Self::modern()
    }
}
