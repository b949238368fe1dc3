//! # chip8-term
//!
//! A CHIP-8 virtual machine that runs in a terminal.
//!
//! ## Design
//!
//! * the machine is one plain value (`Machine`); everything it remembers is
//!   in there, so it can be cloned, compared and snapshotted whole
//! * one `step()` is one instruction; the driver decides how often to call it
//!   and ticks the timers separately
//! * historical disagreements about instruction behaviour are `Quirks`,
//!   chosen when the machine is built
//! * emulated faults never panic or exit: warnings and the (first) fatal
//!   error are latched on the machine for the stat pane to show
//! * abstract display and input so can plug alternatives; TUI in-console for
//!   now, dummies for testing
//!
//! Model
//!
//! ```text
//! main (clap args, env_logger to a file)
//!  `-- Emulator(display, input, options)
//!       |-- Machine(quirks)
//!       |    |-- memory: label, font, program
//!       |    |-- registers, stack, timers, key latch
//!       |    `-- framebuffer + sprite engine
//!       `-- frame loop (spin_sleep at the framerate)
//!            |-- input.read_key() -> keypad key or hotkey
//!            |-- machine.step(); machine.tick_timers()  // unless paused/halted
//!            |-- Tab/C: snapshot::write_file / read_file
//!            `-- display.draw(framebuffer, stat pane)
//! ```

pub mod display;
pub mod emulator;
pub mod error;
pub mod framebuffer;
pub mod input;
pub mod interpreter;
pub mod machine;
pub mod memory;
pub mod opcode;
pub mod quirks;
pub mod snapshot;
mod timer;

pub use error::{Chip8Error, Message, Result, Severity};
pub use framebuffer::{Framebuffer, SCREEN_HEIGHT, SCREEN_WIDTH};
pub use interpreter::Outcome;
pub use machine::{Machine, StatusFields};
pub use quirks::{JumpOffset, Quirks, ShiftSource};
