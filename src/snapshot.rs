//! # snapshot
//!
//! A snapshot is the whole `Machine` as one fixed-length, big-endian blob:
//!
//! ```text
//!   "CH8S"            4   tag
//!   version           2   currently 1
//!   quirks            1   see Quirks::to_bits
//!   memory         4096
//!   v0..vF           16
//!   I, pc, sp       2+2+2
//!   stack        512x2
//!   framebuffer    2048   one byte per pixel, 0 or 1
//!   delay, sound    1+1
//!   key               1   0xff when the latch is empty
//!   cycles            8
//!   last instruction  7   present, addr, word, vx, vy
//!   fatal error     102   present, len, text padded to 100 bytes
//!   last warning    102
//! ```
//!
//! Anything that doesn't decode to a machine the interpreter could itself
//! have produced is rejected; a failed load never touches the running
//! machine.

use crate::error::{Chip8Error, Message, Result, MAX_MESSAGE_LEN};
use crate::framebuffer::{Framebuffer, SCREEN_COUNT};
use crate::interpreter::LAST_PC;
use crate::machine::{Machine, REGISTER_COUNT, STACK_LIMIT};
use crate::memory::{Chip8Memory, MEMORY_SIZE};
use crate::opcode::Fetched;
use crate::quirks::Quirks;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

pub const SNAPSHOT_TAG: &[u8; 4] = b"CH8S";
pub const SNAPSHOT_VERSION: u16 = 1;

const NO_KEY: u8 = 0xFF;
const FETCHED_LEN: usize = 1 + 2 + 2 + 1 + 1;
const MESSAGE_LEN: usize = 1 + 1 + MAX_MESSAGE_LEN;

/// size in bytes of every snapshot
pub const SNAPSHOT_LEN: usize = SNAPSHOT_TAG.len()
    + 2
    + 1
    + MEMORY_SIZE
    + REGISTER_COUNT
    + 2 * 3
    + STACK_LIMIT * 2
    + SCREEN_COUNT
    + 3
    + 8
    + FETCHED_LEN
    + MESSAGE_LEN * 2;

struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    fn new() -> Self {
        Encoder {
            buf: Vec::with_capacity(SNAPSHOT_LEN),
        }
    }

    fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn bytes(&mut self, v: &[u8]) {
        self.buf.extend_from_slice(v);
    }

    fn flag(&mut self, v: bool) {
        self.u8(v as u8);
    }

    fn fetched(&mut self, f: Option<Fetched>) {
        let f = f.map_or((false, 0, 0, 0, 0), |f| (true, f.addr, f.word, f.vx, f.vy));
        self.flag(f.0);
        self.u16(f.1);
        self.u16(f.2);
        self.u8(f.3);
        self.u8(f.4);
    }

    fn message(&mut self, m: Option<&Message>) {
        let text = m.map_or(&[][..], |m| m.text().as_bytes());
        self.flag(m.is_some());
        self.u8(text.len() as u8);
        let mut padded = [0u8; MAX_MESSAGE_LEN];
        padded[..text.len()].copy_from_slice(text);
        self.bytes(&padded);
    }
}

struct Decoder<'a> {
    buf: &'a [u8],
}

fn malformed(what: impl Into<String>) -> Chip8Error {
    Chip8Error::SnapshotFormat(what.into())
}

impl<'a> Decoder<'a> {
    /// the caller has already checked the total length, so every take fits
    fn take(&mut self, len: usize) -> &'a [u8] {
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        head
    }

    fn u8(&mut self) -> u8 {
        self.take(1)[0]
    }

    fn u16(&mut self) -> u16 {
        let b = self.take(2);
        u16::from_be_bytes([b[0], b[1]])
    }

    fn u64(&mut self) -> u64 {
        let mut b = [0u8; 8];
        b.copy_from_slice(self.take(8));
        u64::from_be_bytes(b)
    }

    fn flag(&mut self, field: &str) -> Result<bool> {
        match self.u8() {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(malformed(format!("{} flag is 0x{:02x}", field, other))),
        }
    }

    fn fetched(&mut self) -> Result<Option<Fetched>> {
        let present = self.flag("last instruction")?;
        let f = Fetched {
            addr: self.u16(),
            word: self.u16(),
            vx: self.u8(),
            vy: self.u8(),
        };
        if !present && f != Fetched::default() {
            return Err(malformed("absent last instruction has contents"));
        }
        Ok(present.then_some(f))
    }

    fn message(&mut self, field: &str, build: fn(String) -> Message) -> Result<Option<Message>> {
        let present = self.flag(field)?;
        let len = self.u8() as usize;
        let padded = self.take(MAX_MESSAGE_LEN);
        if len > MAX_MESSAGE_LEN {
            return Err(malformed(format!("{} is {} bytes long", field, len)));
        }
        if !present && len != 0 {
            return Err(malformed(format!("absent {} has a length", field)));
        }
        let (text, padding) = padded.split_at(len);
        if padding.iter().any(|&b| b != 0) {
            return Err(malformed(format!("{} padding is not zero", field)));
        }
        let text = std::str::from_utf8(text)
            .map_err(|_| malformed(format!("{} is not utf-8", field)))?;
        Ok(present.then(|| build(text.to_string())))
    }
}

impl Machine {
    /// serialise the whole machine
    pub fn save_state(&self) -> Vec<u8> {
        let mut e = Encoder::new();
        e.bytes(SNAPSHOT_TAG);
        e.u16(SNAPSHOT_VERSION);
        e.u8(self.quirks.to_bits());
        e.bytes(self.memory.image());
        e.bytes(&self.registers);
        e.u16(self.index);
        e.u16(self.pc);
        e.u16(self.sp);
        for addr in self.stack.iter() {
            e.u16(*addr);
        }
        e.bytes(self.framebuffer.cells());
        e.u8(self.delay_timer);
        e.u8(self.sound_timer);
        e.u8(self.key.unwrap_or(NO_KEY));
        e.u64(self.cycles);
        e.fetched(self.last_instruction);
        e.message(self.fatal.as_ref());
        e.message(self.warning.as_ref());
        debug_assert_eq!(e.buf.len(), SNAPSHOT_LEN);
        e.buf
    }

    /// rebuild a machine from `save_state` output
    pub fn load_state(bytes: &[u8]) -> Result<Machine> {
        if bytes.len() != SNAPSHOT_LEN {
            return Err(Chip8Error::SnapshotSize {
                expected: SNAPSHOT_LEN,
                actual: bytes.len(),
            });
        }
        let mut d = Decoder { buf: bytes };

        if d.take(SNAPSHOT_TAG.len()) != SNAPSHOT_TAG {
            return Err(malformed("not a CHIP-8 snapshot"));
        }
        let version = d.u16();
        if version != SNAPSHOT_VERSION {
            return Err(malformed(format!("unsupported version {}", version)));
        }
        let bits = d.u8();
        let quirks =
            Quirks::from_bits(bits).ok_or_else(|| malformed(format!("quirks are 0x{:02x}", bits)))?;
        let memory = Chip8Memory::from_image(d.take(MEMORY_SIZE));

        let mut registers = [0u8; REGISTER_COUNT];
        registers.copy_from_slice(d.take(REGISTER_COUNT));
        let index = d.u16();
        let pc = d.u16();
        if pc > LAST_PC {
            return Err(malformed(format!("pc 0x{:04x} is outside memory", pc)));
        }
        let sp = d.u16();
        if sp as usize > STACK_LIMIT {
            return Err(malformed(format!("stack pointer {} is past the limit", sp)));
        }
        let mut stack = [0u16; STACK_LIMIT];
        for addr in stack.iter_mut() {
            *addr = d.u16();
        }

        let framebuffer = Framebuffer::from_cells(d.take(SCREEN_COUNT))
            .ok_or_else(|| malformed("framebuffer holds something other than 0 and 1"))?;
        let delay_timer = d.u8();
        let sound_timer = d.u8();
        let key = match d.u8() {
            NO_KEY => None,
            k if k <= 0xF => Some(k),
            k => return Err(malformed(format!("key latch holds 0x{:02x}", k))),
        };
        let cycles = d.u64();
        let last_instruction = d.fetched()?;
        let fatal = d.message("fatal error", Message::fatal)?;
        let warning = d.message("last warning", Message::warning)?;

        Ok(Machine {
            quirks,
            memory,
            registers,
            index,
            pc,
            sp,
            stack,
            framebuffer,
            delay_timer,
            sound_timer,
            key,
            fatal,
            warning,
            cycles,
            last_instruction,
        })
    }
}

/// save a snapshot to `path`, creating its directory if need be
pub fn write_file(path: &Path, machine: &Machine) -> Result<()> {
    let create_err = |source| Chip8Error::SnapshotCreate {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(create_err)?;
    }
    let mut file = fs::File::create(path).map_err(create_err)?;
    file.write_all(&machine.save_state())
        .and_then(|_| file.flush())
        .map_err(|source| Chip8Error::SnapshotWrite {
            path: path.to_path_buf(),
            source,
        })?;
    log::info!("wrote snapshot to {}", path.display());
    Ok(())
}

/// load a snapshot from `path`
pub fn read_file(path: &Path) -> Result<Machine> {
    let mut file = fs::File::open(path).map_err(|source| Chip8Error::SnapshotOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let mut bytes = Vec::with_capacity(SNAPSHOT_LEN);
    file.read_to_end(&mut bytes)
        .map_err(|source| Chip8Error::SnapshotRead {
            path: path.to_path_buf(),
            source,
        })?;
    let machine = Machine::load_state(&bytes)?;
    log::info!("read snapshot from {}", path.display());
    Ok(machine)
}
