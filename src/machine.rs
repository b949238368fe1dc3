//! # machine
//!
//! Everything the emulated hardware remembers, in one value owned by whoever
//! drives it:
//!  * 4K memory (label, font, program; see `memory`)
//!  * v0..vF, 8 bits each. vF doubles as the carry/borrow/collision flag
//!  * I, a 16-bit index register
//!  * the program counter, starting at 0x200
//!  * a return-address stack and its pointer
//!  * a 64x32 framebuffer
//!  * delay and sound timers, counting down once per executed cycle
//!  * a one-key latch, filled by the driver and emptied by the key opcodes
//!  * a fatal-error latch (first error wins, halts execution) and a last
//!    warning (overwritten freely)
//!  * a cycle counter

use crate::error::{Message, Result, Severity};
use crate::framebuffer::Framebuffer;
use crate::memory::{Chip8Memory, PROGRAM_ADDR};
use crate::opcode::Fetched;
use crate::quirks::Quirks;
use std::io;

pub const REGISTER_COUNT: usize = 16;
pub const FLAG_REGISTER: usize = 0xF;
pub const STACK_LIMIT: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Machine {
    pub(crate) quirks: Quirks,
    pub(crate) memory: Chip8Memory,
    pub(crate) registers: [u8; REGISTER_COUNT],
    pub(crate) index: u16,
    pub(crate) pc: u16,
    pub(crate) sp: u16,
    pub(crate) stack: [u16; STACK_LIMIT],
    pub(crate) framebuffer: Framebuffer,
    pub(crate) delay_timer: u8,
    pub(crate) sound_timer: u8,
    pub(crate) key: Option<u8>,
    pub(crate) fatal: Option<Message>,
    pub(crate) warning: Option<Message>,
    pub(crate) cycles: u64,
    pub(crate) last_instruction: Option<Fetched>,
}

/// what the status pane shows about the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFields {
    pub pc: u16,
    pub last_instruction: Option<String>,
    pub cycles: u64,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub last_warning: Option<String>,
    pub fatal_error: Option<String>,
}

impl Machine {
    /// a zeroed machine with the font and label stamped in, ready to run
    /// from 0x200
    pub fn new(quirks: Quirks) -> Self {
        Machine {
            quirks,
            memory: Chip8Memory::new(),
            registers: [0; REGISTER_COUNT],
            index: 0,
            pc: PROGRAM_ADDR,
            sp: 0,
            stack: [0; STACK_LIMIT],
            framebuffer: Framebuffer::new(),
            delay_timer: 0,
            sound_timer: 0,
            key: None,
            fatal: None,
            warning: None,
            cycles: 0,
            last_instruction: None,
        }
    }

    /// copy raw program bytes to 0x200
    pub fn load_program(&mut self, program: &[u8]) -> Result<()> {
        self.memory.load_program(program)?;
        log::info!("loaded {} byte program", program.len());
        Ok(())
    }

    /// read a whole program from somewhere and load it
    pub fn load_program_from(&mut self, reader: &mut impl io::Read) -> Result<()> {
        self.memory.load_program_from(reader)
    }

    /// Offer a key to the latch. A pending key is never overwritten, and
    /// anything outside 0x0..=0xF is dropped.
    pub fn feed_key(&mut self, key: Option<u8>) {
        match key {
            Some(k) if k > 0xF => log::warn!("ignoring key 0x{:02x}, not on the keypad", k),
            _ if self.key.is_some() => {}
            _ => self.key = key,
        }
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn status(&self) -> StatusFields {
        StatusFields {
            pc: self.pc,
            last_instruction: self.last_instruction.map(|f| f.to_string()),
            cycles: self.cycles,
            delay_timer: self.delay_timer,
            sound_timer: self.sound_timer,
            last_warning: self.warning.as_ref().map(|m| m.to_string()),
            fatal_error: self.fatal.as_ref().map(|m| m.to_string()),
        }
    }

    /// post a report. warnings replace the last warning; only the first fatal
    /// error is kept
    pub(crate) fn report(&mut self, message: Message) {
        match message.severity() {
            Severity::Warning => {
                log::warn!("{}", message);
                self.warning = Some(message);
            }
            Severity::Fatal if self.fatal.is_none() => {
                log::error!("{}", message);
                self.fatal = Some(message);
            }
            Severity::Fatal => log::debug!("already halted, dropping: {}", message),
        }
    }

    /// post an informational warning from outside the core, e.g. after a save
    pub fn warn(&mut self, text: impl Into<String>) {
        self.report(Message::warning(text));
    }

    /// has a fatal error stopped execution?
    pub fn is_halted(&self) -> bool {
        self.fatal.is_some()
    }

    pub fn fatal_error(&self) -> Option<&Message> {
        self.fatal.as_ref()
    }

    pub fn last_warning(&self) -> Option<&Message> {
        self.warning.as_ref()
    }

    pub fn quirks(&self) -> Quirks {
        self.quirks
    }

    pub fn label(&self) -> String {
        self.memory.label()
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.registers
    }

    pub fn stack_depth(&self) -> usize {
        self.sp as usize
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn pending_key(&self) -> Option<u8> {
        self.key
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// the whole 4K memory image
    pub fn memory(&self) -> &[u8] {
        self.memory.image()
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(Quirks::default())
    }
}
