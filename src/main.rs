use clap::{Parser, ValueEnum};
use std::error::Error;
use std::fs::File;
use std::path::{Path, PathBuf};

use chip8_term::display::MonoTermDisplay;
use chip8_term::emulator::{Emulator, Options, DEFAULT_FRAMERATE, DEFAULT_SNAPSHOT_PATH};
use chip8_term::input::{Keymap, TermInput};
use chip8_term::{Chip8Error, JumpOffset, Machine, Quirks, ShiftSource};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Preset {
    /// SUPER-CHIP era behaviour
    Modern,
    /// the original COSMAC VIP interpreter
    Cosmac,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ShiftArg {
    X,
    Y,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum JumpArg {
    Vx,
    V0,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum KeymapArg {
    /// 0-9 and a-f are the keys they name
    Literal,
    /// 1234/qwer/asdf/zxcv
    Conventional,
}

/// Run a CHIP-8 program in the terminal.
///
/// Enter (Ctrl+M) quits, Backspace pauses, Tab saves a snapshot, C loads it.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// program to load at 0x200
    #[arg(value_name = "ROM")]
    rom: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Preset::Modern)]
    quirks: Preset,

    /// where 8xy6/8xyE read from
    #[arg(long, value_enum)]
    shift_source: Option<ShiftArg>,

    /// which register Bnnn adds
    #[arg(long, value_enum)]
    jump_offset: Option<JumpArg>,

    /// Fx1E sets vF when I passes 0x1000
    #[arg(long, value_name = "BOOL")]
    index_overflow_flag: Option<bool>,

    /// Fx55/Fx65 leave I past the last register
    #[arg(long, value_name = "BOOL")]
    index_auto_increment: Option<bool>,

    /// 8xy1/8xy2/8xy3 clear vF
    #[arg(long, value_name = "BOOL")]
    flag_reset_on_logic: Option<bool>,

    /// instructions (and timer ticks) per second
    #[arg(long, default_value_t = DEFAULT_FRAMERATE)]
    framerate: u32,

    #[arg(long, value_name = "PATH", default_value = DEFAULT_SNAPSHOT_PATH)]
    snapshot: PathBuf,

    #[arg(long, value_enum, default_value_t = KeymapArg::Literal)]
    keymap: KeymapArg,

    /// keep running after Tab saves a snapshot
    #[arg(long, default_value_t = false)]
    no_pause_on_save: bool,

    /// stay paused after C loads a snapshot
    #[arg(long, default_value_t = false)]
    no_unpause_on_load: bool,

    /// the terminal belongs to the display, so logs go here
    #[arg(long, value_name = "PATH", default_value = "chip8-term.log")]
    log_file: PathBuf,
}

impl Args {
    fn quirks(&self) -> Quirks {
        let mut quirks = match self.quirks {
            Preset::Modern => Quirks::modern(),
            Preset::Cosmac => Quirks::cosmac(),
        };
        if let Some(shift) = self.shift_source {
            quirks.shift_source = match shift {
                ShiftArg::X => ShiftSource::X,
                ShiftArg::Y => ShiftSource::Y,
            };
        }
        if let Some(jump) = self.jump_offset {
            quirks.jump_offset_register = match jump {
                JumpArg::Vx => JumpOffset::Vx,
                JumpArg::V0 => JumpOffset::V0,
            };
        }
        if let Some(flag) = self.index_overflow_flag {
            quirks.index_overflow_flag = flag;
        }
        if let Some(inc) = self.index_auto_increment {
            quirks.index_auto_increment = inc;
        }
        if let Some(reset) = self.flag_reset_on_logic {
            quirks.flag_reset_on_logic = reset;
        }
        quirks
    }

    fn options(&self) -> Options {
        Options {
            framerate: self.framerate,
            snapshot: self.snapshot.clone(),
            pause_on_save: !self.no_pause_on_save,
            unpause_on_load: !self.no_unpause_on_load,
        }
    }

    fn keymap(&self) -> Keymap {
        match self.keymap {
            KeymapArg::Literal => Keymap::Literal,
            KeymapArg::Conventional => Keymap::Conventional,
        }
    }
}

fn init_logging(path: &Path) -> Result<(), Box<dyn Error>> {
    let file = File::create(path)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(&args.log_file)?;

    let quirks = args.quirks();
    log::info!("quirks: {:?}", quirks);
    let mut machine = Machine::new(quirks);
    if let Some(rom) = &args.rom {
        let mut f = File::open(rom).map_err(Chip8Error::ProgramRead)?;
        machine.load_program_from(&mut f)?;
    }

    // the display goes first so it is dropped first, while still in raw mode
    let display = MonoTermDisplay::new()?;
    let input = TermInput::new(args.keymap())?;
    let mut emulator = Emulator::new(machine, display, input, args.options());
    emulator.run()?;
    Ok(())
}
