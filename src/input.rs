use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::time::Duration;

/// how long to wait for a keypress each frame
const POLL_TIMEOUT: Duration = Duration::from_micros(500);

/// map of characters read from the keyboard to what the chip8 might expect
/// where '1' => 0x01 and 'a' => 0x0a
const CHIP8_LITERAL_KEYMAP: [(char, u8); 16] = [
    ('0', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('4', 0x04),
    ('5', 0x05),
    ('6', 0x06),
    ('7', 0x07),
    ('8', 0x08),
    ('9', 0x09),
    ('a', 0x0a),
    ('b', 0x0b),
    ('c', 0x0c),
    ('d', 0x0d),
    ('e', 0x0e),
    ('f', 0x0f),
];

/// ditto using left-hand side of qwerty keyboard
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keymap {
    /// the key labelled with the hex digit
    Literal,
    /// the 1234/QWER/ASDF/ZXCV block
    Conventional,
}

impl Keymap {
    fn table(self) -> HashMap<char, u8> {
        match self {
            Keymap::Literal => HashMap::from(CHIP8_LITERAL_KEYMAP),
            Keymap::Conventional => HashMap::from(CHIP8_CONVENTIONAL_KEYMAP),
        }
    }
}

/// what a keypress asks the driver to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// a CHIP-8 key, 0x0..=0xF
    Key(u8),
    Quit,
    TogglePause,
    SaveState,
    LoadState,
}

/// one keypress: its character code, for the stat pane, and what it maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keypress {
    pub code: u32,
    pub control: Option<Control>,
}

impl Keypress {
    pub fn new(code: u32, control: Option<Control>) -> Self {
        Keypress { code, control }
    }
}

/// reads keypresses
pub trait Input {
    /// the next keypress, if one arrived in time; at most one per call
    fn read_key(&mut self) -> Result<Option<Keypress>, io::Error>;
}

/// turn a terminal key event into a keypress. Enter (Ctrl+M in raw mode)
/// quits, Backspace pauses, Tab saves, 'C' loads; anything else goes through
/// the keymap
fn translate(evt: KeyEvent, keymap: &HashMap<char, u8>) -> Option<Keypress> {
    let hotkey = |code, control| Some(Keypress::new(code, Some(control)));
    match evt.code {
        KeyCode::Enter => hotkey(13, Control::Quit),
        KeyCode::Char('m') if evt.modifiers.contains(KeyModifiers::CONTROL) => {
            hotkey(13, Control::Quit)
        }
        KeyCode::Backspace => hotkey(8, Control::TogglePause),
        KeyCode::Tab => hotkey(9, Control::SaveState),
        KeyCode::Char('C') => hotkey('C' as u32, Control::LoadState),
        KeyCode::Char(c) => {
            let control = keymap.get(&c).map(|k| Control::Key(*k));
            if control.is_none() {
                log::debug!("can't map {:?} to a COSMAC key", c);
            }
            Some(Keypress::new(c as u32, control))
        }
        other => {
            log::debug!("ignoring key {:?}", other);
            None
        }
    }
}

/// keyboard input from the terminal, in raw mode for as long as this lives
pub struct TermInput {
    keymap: HashMap<char, u8>,
}

impl TermInput {
    pub fn new(keymap: Keymap) -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(TermInput {
            keymap: keymap.table(),
        })
    }
}

impl Drop for TermInput {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            log::error!("could not leave raw mode: {}", e);
        }
    }
}

impl Input for TermInput {
    fn read_key(&mut self) -> Result<Option<Keypress>, io::Error> {
        if !poll(POLL_TIMEOUT)? {
            return Ok(None);
        }
        match read()? {
            Event::Key(evt) => Ok(translate(evt, &self.keymap)),
            other => {
                log::trace!("ignoring event {:?}", other);
                Ok(None)
            }
        }
    }
}

/// dummy Input implementation for testing; hands out one queued keypress per
/// call, then nothing
#[derive(Debug, Default)]
pub struct DummyInput {
    keys: VecDeque<Option<Keypress>>,
}

impl DummyInput {
    /// `None` entries are frames where no key arrived
    pub fn new(keys: &[Option<Control>]) -> Self {
        DummyInput {
            keys: keys
                .iter()
                .map(|c| c.map(|c| Keypress::new(0, Some(c))))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Input for DummyInput {
    fn read_key(&mut self) -> Result<Option<Keypress>, io::Error> {
        Ok(self.keys.pop_front().flatten())
    }
}
