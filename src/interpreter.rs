//! # interpreter
//!
//! One call to `Machine::step` is one CHIP-8 cycle:
//!  1. fetch the big-endian word at pc
//!  2. decode it by nibble (see `opcode`)
//!  3. execute it against the machine, honouring its `Quirks`
//!  4. move pc: +2 normally, +4 for a taken skip, somewhere else for jumps,
//!     calls and returns, or not at all while Fx0A waits for a key
//!
//! A fatal error (unknown instruction, stack under/overflow, pc leaving
//! memory) is latched on the machine and every later `step` does nothing.
//! Unknown group-0 instructions (machine-code calls on the COSMAC VIP) are
//! only a warning.

use crate::error::Message;
use crate::machine::{Machine, FLAG_REGISTER, STACK_LIMIT};
use crate::memory::{MemoryMap, FONT_ADDR, FONT_GLYPH_SIZE, MEMORY_SIZE};
use crate::opcode::{Fetched, Opcode};
use crate::quirks::{JumpOffset, ShiftSource};

/// highest address an instruction can be fetched from
pub const LAST_PC: u16 = (MEMORY_SIZE - 2) as u16;

/// Fx1E sets vF past this, when the quirk asks for it
const INDEX_OVERFLOW_LIMIT: u16 = 0x1000;

/// what came of one `step`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Continued,
    Fatal(String),
}

/// where pc goes after an instruction
#[derive(Debug)]
enum Flow {
    Next,
    Skip,
    /// odd targets are allowed, as on the COSMAC VIP
    Jump(u16),
    /// run this instruction again next cycle
    Wait,
    Halt(Message),
}

fn skip_if(cond: bool) -> Flow {
    if cond {
        Flow::Skip
    } else {
        Flow::Next
    }
}

impl Machine {
    /// fetch, decode and execute one instruction
    pub fn step(&mut self) -> Outcome {
        if let Some(fatal) = &self.fatal {
            return Outcome::Fatal(fatal.to_string());
        }

        let word = self.memory.get_word(self.pc);
        self.last_instruction = Some(Fetched {
            addr: self.pc,
            word,
            vx: self.registers[word.x() as usize],
            vy: self.registers[word.y() as usize],
        });
        self.cycles += 1;
        log::trace!("{:04x}: {:04x}", self.pc, word);

        let target = match self.execute(word) {
            Flow::Next => Some(self.pc as u32 + 2),
            Flow::Skip => Some(self.pc as u32 + 4),
            Flow::Jump(addr) => Some(addr as u32),
            Flow::Wait => None,
            Flow::Halt(message) => {
                self.report(message);
                None
            }
        };
        if let Some(target) = target {
            if target > LAST_PC as u32 {
                self.report(Message::fatal(format!(
                    "program counter would leave memory (0x{:04x}) after 0x{:04x} at 0x{:04x}",
                    target, word, self.pc
                )));
            } else {
                self.pc = target as u16;
            }
        }

        match &self.fatal {
            Some(fatal) => Outcome::Fatal(fatal.to_string()),
            None => Outcome::Continued,
        }
    }

    fn execute(&mut self, word: u16) -> Flow {
        let x = word.x() as usize;
        let vx = self.registers[x];
        let vy = self.registers[word.y() as usize];

        match word.op() {
            0x0 => match word {
                0x00E0 => {
                    self.framebuffer.clear();
                    Flow::Next
                }
                0x00EE => self.ret(),
                _ => {
                    self.report(Message::warning(format!(
                        "ignored instruction 0x{:04x}",
                        word
                    )));
                    Flow::Next
                }
            },
            0x1 => Flow::Jump(word.nnn()),
            0x2 => self.call(word.nnn()),
            0x3 => skip_if(vx == word.nn()),
            0x4 => skip_if(vx != word.nn()),
            0x5 => skip_if(vx == vy),
            0x6 => {
                self.registers[x] = word.nn();
                Flow::Next
            }
            0x7 => {
                self.registers[x] = vx.wrapping_add(word.nn());
                Flow::Next
            }
            0x8 => self.alu(word, vx, vy),
            0x9 => skip_if(vx != vy),
            0xA => {
                self.index = word.nnn();
                Flow::Next
            }
            0xB => {
                let offset = match self.quirks.jump_offset_register {
                    JumpOffset::Vx => vx,
                    JumpOffset::V0 => self.registers[0],
                };
                Flow::Jump(word.nnn() + offset as u16)
            }
            0xC => {
                self.registers[x] = rand::random::<u8>() & word.nn();
                Flow::Next
            }
            0xD => {
                self.draw_sprite(word.n(), self.index, vx, vy);
                Flow::Next
            }
            0xE => self.key_skip(word, vx),
            0xF => self.misc(word, vx),
            _ => self.unknown(word),
        }
    }

    fn unknown(&self, word: u16) -> Flow {
        Flow::Halt(Message::fatal(format!(
            "unknown instruction 0x{:04x} at address 0x{:04x}",
            word, self.pc
        )))
    }

    /// 00EE
    fn ret(&mut self) -> Flow {
        if self.sp == 0 {
            return Flow::Halt(Message::fatal("cannot return out of an empty stack"));
        }
        self.sp -= 1;
        // the call site was pushed, so carry on after it
        Flow::Jump(self.stack[self.sp as usize] + 2)
    }

    /// 2nnn
    fn call(&mut self, addr: u16) -> Flow {
        if self.sp as usize >= STACK_LIMIT {
            return Flow::Halt(Message::fatal(format!(
                "cannot call 0x{:04x}, stack is full at {} entries",
                addr, STACK_LIMIT
            )));
        }
        self.stack[self.sp as usize] = self.pc;
        self.sp += 1;
        Flow::Jump(addr)
    }

    /// 8xyN
    fn alu(&mut self, word: u16, vx: u8, vy: u8) -> Flow {
        let x = word.x() as usize;
        match word.n() {
            0x0 => self.registers[x] = vy,
            0x1 => {
                self.registers[x] = vx | vy;
                self.reset_flag_after_logic();
            }
            0x2 => {
                self.registers[x] = vx & vy;
                self.reset_flag_after_logic();
            }
            0x3 => {
                self.registers[x] = vx ^ vy;
                self.reset_flag_after_logic();
            }
            0x4 => {
                let (sum, carry) = vx.overflowing_add(vy);
                self.registers[x] = sum;
                self.registers[FLAG_REGISTER] = carry as u8;
            }
            0x5 => {
                self.registers[x] = vx.wrapping_sub(vy);
                self.registers[FLAG_REGISTER] = (vx >= vy) as u8;
            }
            0x6 => {
                let src = self.shift_operand(vx, vy);
                self.registers[x] = src >> 1;
                self.registers[FLAG_REGISTER] = src & 0x01;
            }
            0x7 => {
                self.registers[x] = vy.wrapping_sub(vx);
                self.registers[FLAG_REGISTER] = (vy >= vx) as u8;
            }
            0xE => {
                let src = self.shift_operand(vx, vy);
                self.registers[x] = src << 1;
                self.registers[FLAG_REGISTER] = src >> 7;
            }
            _ => return self.unknown(word),
        }
        Flow::Next
    }

    fn shift_operand(&self, vx: u8, vy: u8) -> u8 {
        match self.quirks.shift_source {
            ShiftSource::X => vx,
            ShiftSource::Y => vy,
        }
    }

    fn reset_flag_after_logic(&mut self) {
        if self.quirks.flag_reset_on_logic {
            self.registers[FLAG_REGISTER] = 0;
        }
    }

    /// Ex9E / ExA1. both empty the key latch, hit or miss
    fn key_skip(&mut self, word: u16, vx: u8) -> Flow {
        let wanted = Some(vx & 0xF);
        match word.nn() {
            0x9E => skip_if(self.key.take() == wanted),
            0xA1 => skip_if(self.key.take() != wanted),
            _ => self.unknown(word),
        }
    }

    /// FxNN
    fn misc(&mut self, word: u16, vx: u8) -> Flow {
        let x = word.x() as usize;
        match word.nn() {
            0x07 => self.registers[x] = self.delay_timer,
            0x0A => match self.key.take() {
                Some(key) => self.registers[x] = key,
                None => return Flow::Wait,
            },
            0x15 => self.delay_timer = vx,
            0x18 => self.sound_timer = vx,
            0x1E => {
                self.index = self.index.wrapping_add(vx as u16);
                if self.quirks.index_overflow_flag {
                    self.registers[FLAG_REGISTER] = (self.index > INDEX_OVERFLOW_LIMIT) as u8;
                }
            }
            0x29 => self.index = FONT_ADDR + vx as u16 * FONT_GLYPH_SIZE,
            0x33 => {
                let i = self.index;
                self.memory.set_byte(i, vx / 100);
                self.memory.set_byte(i.wrapping_add(1), (vx / 10) % 10);
                self.memory.set_byte(i.wrapping_add(2), vx % 10);
            }
            0x55 => {
                for r in 0..=x {
                    let addr = self.index.wrapping_add(r as u16);
                    self.memory.set_byte(addr, self.registers[r]);
                }
                self.bump_index(x);
            }
            0x65 => {
                for r in 0..=x {
                    let addr = self.index.wrapping_add(r as u16);
                    self.registers[r] = self.memory.get_byte(addr);
                }
                self.bump_index(x);
            }
            _ => return self.unknown(word),
        }
        Flow::Next
    }

    fn bump_index(&mut self, x: usize) {
        if self.quirks.index_auto_increment {
            self.index = self.index.wrapping_add(x as u16 + 1);
        }
    }
}
