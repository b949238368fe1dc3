//! # emulator
//!
//! The driver: owns a `Machine` plus a `Display` and an `Input`, and runs one
//! frame per tick of a fixed framerate. Each frame
//!  1. reads at most one keypress; keypad keys go to the machine's latch,
//!     hotkeys are handled here
//!  2. unless paused or halted, executes one instruction and ticks the timers
//!  3. redraws the screen and stat pane
//!
//! A halted machine keeps being drawn and polled, so its message stays up
//! and the user can still save, load or quit.

use crate::display::{Display, StatPane};
use crate::error::Result;
use crate::input::{Control, Input};
use crate::machine::Machine;
use crate::snapshot;
use spin_sleep::LoopHelper;
use std::path::PathBuf;
use std::time::Duration;

/// frames per second when nobody says otherwise
pub const DEFAULT_FRAMERATE: u32 = 480;
pub const DEFAULT_SNAPSHOT_PATH: &str = "spn/m.ch8.bin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// frames (so instructions and timer ticks) per second
    pub framerate: u32,
    pub snapshot: PathBuf,
    pub pause_on_save: bool,
    pub unpause_on_load: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            framerate: DEFAULT_FRAMERATE,
            snapshot: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            pause_on_save: true,
            unpause_on_load: true,
        }
    }
}

pub struct Emulator<D: Display, I: Input> {
    machine: Machine,
    display: D,
    input: I,
    options: Options,
    paused: bool,
    last_input: u32,
    frame_time: Duration,
    fps: f64,
}

impl<D: Display, I: Input> Emulator<D, I> {
    pub fn new(machine: Machine, display: D, input: I, options: Options) -> Self {
        Emulator {
            machine,
            display,
            input,
            options,
            paused: false,
            last_input: 0,
            frame_time: Duration::ZERO,
            fps: 0.0,
        }
    }

    /// run frames at the configured rate until the user quits
    pub fn run(&mut self) -> Result<()> {
        let mut helper = LoopHelper::builder()
            .report_interval_s(0.5)
            .build_with_target_rate(self.options.framerate.max(1) as f64);
        log::info!("running at {} frames per second", self.options.framerate);

        loop {
            self.frame_time = helper.loop_start();
            if let Some(fps) = helper.report_rate() {
                self.fps = fps;
            }
            if !self.frame()? {
                log::info!("quit after {} cycles", self.machine.cycles());
                return Ok(());
            }
            helper.loop_sleep();
        }
    }

    /// one frame; false once the user has asked to quit
    pub fn frame(&mut self) -> Result<bool> {
        if let Some(key) = self.input.read_key()? {
            self.last_input = key.code;
            match key.control {
                Some(Control::Quit) => return Ok(false),
                Some(control) => self.handle(control),
                None => {}
            }
        }

        if !self.paused && !self.machine.is_halted() {
            self.machine.step();
            self.machine.tick_timers();
        }

        let pane = self.stat_pane();
        self.display.draw(self.machine.framebuffer(), &pane)?;
        Ok(true)
    }

    fn handle(&mut self, control: Control) {
        match control {
            Control::Key(k) => self.machine.feed_key(Some(k)),
            Control::TogglePause => {
                self.paused = !self.paused;
                log::debug!("paused: {}", self.paused);
            }
            Control::SaveState => self.save(),
            Control::LoadState => self.load(),
            Control::Quit => {}
        }
    }

    fn save(&mut self) {
        match snapshot::write_file(&self.options.snapshot, &self.machine) {
            Ok(()) => {
                self.machine.warn("wrote machine state to file");
                self.paused |= self.options.pause_on_save;
            }
            Err(e) => {
                log::error!("{}", e);
                self.machine.warn(e.to_string());
            }
        }
    }

    fn load(&mut self) {
        match snapshot::read_file(&self.options.snapshot) {
            Ok(machine) => {
                self.machine = machine;
                self.machine.warn("loaded machine from file");
                if self.options.unpause_on_load {
                    self.paused = false;
                }
            }
            Err(e) => {
                log::error!("{}", e);
                self.machine.warn(e.to_string());
            }
        }
    }

    fn stat_pane(&self) -> StatPane {
        StatPane {
            status: self.machine.status(),
            label: self.machine.label(),
            paused: self.paused,
            frame_time: self.frame_time,
            fps: self.fps,
            last_input: self.last_input,
            key: self.machine.pending_key(),
        }
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DummyDisplay;
    use crate::input::DummyInput;
    use crate::quirks::Quirks;

    fn emulator(program: &[u8], keys: &[Option<Control>]) -> Emulator<DummyDisplay, DummyInput> {
        let mut m = Machine::new(Quirks::modern());
        m.load_program(program).unwrap();
        let options = Options {
            framerate: 10_000,
            snapshot: std::env::temp_dir()
                .join(format!("chip8-term-emu-{}", std::process::id()))
                .join("m.ch8.bin"),
            ..Options::default()
        };
        Emulator::new(m, DummyDisplay::new(), DummyInput::new(keys), options)
    }

    // 6001, 7001, 1202: count up in v0 forever
    const COUNTER: [u8; 6] = [0x60, 0x01, 0x70, 0x01, 0x12, 0x02];

    #[test]
    fn test_one_instruction_per_frame() -> Result<()> {
        let mut emu = emulator(&COUNTER, &[]);
        for _ in 0..3 {
            assert!(emu.frame()?);
        }
        assert_eq!(emu.machine().cycles(), 3);
        assert_eq!(emu.machine().registers()[0], 2);
        assert_eq!(emu.display().frames, 3);
        Ok(())
    }

    #[test]
    fn test_run_until_quit() -> Result<()> {
        let mut emu = emulator(&COUNTER, &[None, None, Some(Control::Quit)]);
        emu.run()?;
        assert_eq!(emu.machine().cycles(), 2);
        Ok(())
    }

    #[test]
    fn test_timers_tick_with_steps() -> Result<()> {
        // 6005 F015: delay = 5, then loop on the jump
        let mut emu = emulator(&[0x60, 0x05, 0xF0, 0x15, 0x12, 0x04], &[]);
        emu.frame()?;
        emu.frame()?;
        assert_eq!(emu.machine().delay_timer(), 4);
        emu.frame()?;
        assert_eq!(emu.machine().delay_timer(), 3);
        Ok(())
    }

    #[test]
    fn test_pause_stops_execution() -> Result<()> {
        let keys = [Some(Control::TogglePause), None, None, Some(Control::TogglePause)];
        let mut emu = emulator(&COUNTER, &keys);
        for _ in 0..3 {
            emu.frame()?;
        }
        assert!(emu.is_paused());
        assert_eq!(emu.machine().cycles(), 0);
        let pane = emu.display().last_pane.clone().unwrap();
        assert_eq!(pane.lines()[1], "PAUSED");

        emu.frame()?;
        assert!(!emu.is_paused());
        assert_eq!(emu.machine().cycles(), 1);
        Ok(())
    }

    #[test]
    fn test_keys_feed_latch() -> Result<()> {
        // F30A: wait for a key into v3
        let mut emu = emulator(&[0xF3, 0x0A], &[None, Some(Control::Key(0x7))]);
        emu.frame()?;
        assert_eq!(emu.machine().pc(), 0x200);
        emu.frame()?;
        assert_eq!(emu.machine().pc(), 0x202);
        assert_eq!(emu.machine().registers()[3], 0x7);
        Ok(())
    }

    #[test]
    fn test_save_then_load() -> Result<()> {
        let keys = [
            None,
            None,
            Some(Control::SaveState),
            Some(Control::TogglePause),
            None,
            None,
            Some(Control::LoadState),
        ];
        let mut emu = emulator(&COUNTER, &keys);
        emu.frame()?;
        emu.frame()?;
        let saved_v0 = emu.machine().registers()[0];

        emu.frame()?;
        assert!(emu.is_paused());
        assert_eq!(
            emu.machine().last_warning().unwrap().text(),
            "wrote machine state to file"
        );

        for _ in 0..3 {
            emu.frame()?;
        }
        assert_ne!(emu.machine().registers()[0], saved_v0);

        emu.frame()?;
        assert_eq!(
            emu.machine().last_warning().unwrap().text(),
            "loaded machine from file"
        );
        // restored, then one more step on top
        assert_eq!(emu.machine().cycles(), 3);
        assert!(!emu.is_paused());
        std::fs::remove_file(&emu.options.snapshot).ok();
        Ok(())
    }

    #[test]
    fn test_failed_load_is_a_warning() -> Result<()> {
        let mut emu = emulator(&COUNTER, &[Some(Control::LoadState)]);
        emu.options.snapshot = std::env::temp_dir().join("chip8-term-missing/none.bin");
        assert!(emu.frame()?);
        let warning = emu.machine().last_warning().unwrap().text();
        assert!(warning.starts_with("could not open snapshot"), "{}", warning);
        assert!(!emu.machine().is_halted());
        Ok(())
    }

    #[test]
    fn test_halted_machine_still_drawn() -> Result<()> {
        // 00EE with nothing on the stack
        let mut emu = emulator(&[0x00, 0xEE], &[]);
        emu.frame()?;
        assert!(emu.machine().is_halted());
        emu.frame()?;
        emu.frame()?;
        assert_eq!(emu.machine().cycles(), 1);
        assert_eq!(emu.display().frames, 3);
        let pane = emu.display().last_pane.clone().unwrap();
        assert_eq!(pane.lines()[0], "Error: cannot return out of an empty stack");
        Ok(())
    }
}
