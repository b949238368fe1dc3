use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// everything that can go wrong outside the emulated machine itself
#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error("could not read program: {0}")]
    ProgramRead(#[source] io::Error),

    #[error("program is too large ({size} bytes), at most {max} bytes fit in memory")]
    ProgramTooLarge { size: usize, max: usize },

    #[error("could not create snapshot {path}: {source}")]
    SnapshotCreate { path: PathBuf, source: io::Error },

    #[error("could not open snapshot {path}: {source}")]
    SnapshotOpen { path: PathBuf, source: io::Error },

    #[error("could not write snapshot {path}: {source}")]
    SnapshotWrite { path: PathBuf, source: io::Error },

    #[error("could not read snapshot {path}: {source}")]
    SnapshotRead { path: PathBuf, source: io::Error },

    #[error("snapshot is {actual} bytes, expected {expected}")]
    SnapshotSize { expected: usize, actual: usize },

    #[error("snapshot is malformed: {0}")]
    SnapshotFormat(String),

    #[error("terminal i/o failed: {0}")]
    Terminal(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Chip8Error>;

/// longest message the machine will hold; matches the stat pane width
pub const MAX_MESSAGE_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Fatal,
}

/// a status report from the machine, e.g. an ignored instruction or a halt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    severity: Severity,
    text: String,
}

impl Message {
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        let mut text = text.into();
        if text.len() > MAX_MESSAGE_LEN {
            let mut end = MAX_MESSAGE_LEN;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            text.truncate(end);
        }
        Message { severity, text }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Message::new(Severity::Warning, text)
    }

    pub fn fatal(text: impl Into<String>) -> Self {
        Message::new(Severity::Fatal, text)
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Warning => write!(f, "Warning: {}", self.text),
            Severity::Fatal => write!(f, "Error: {}", self.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_display() {
        let w = Message::warning("ignored instruction 0x0123");
        assert_eq!(w.to_string(), "Warning: ignored instruction 0x0123");
        let f = Message::fatal("cannot return out of an empty stack");
        assert_eq!(f.to_string(), "Error: cannot return out of an empty stack");
    }

    #[test]
    fn test_message_truncated_on_char_boundary() {
        // 'é' is two bytes, so byte 100 falls inside the 51st char
        let m = Message::warning("x".to_string() + &"é".repeat(60));
        assert!(m.text().len() <= MAX_MESSAGE_LEN);
        assert_eq!(m.text().len(), 99);
    }

    #[test]
    fn test_size_error_text() {
        let e = Chip8Error::SnapshotSize {
            expected: 10,
            actual: 3,
        };
        assert_eq!(e.to_string(), "snapshot is 3 bytes, expected 10");
    }
}
