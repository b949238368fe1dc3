use crate::framebuffer::{Framebuffer, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::machine::StatusFields;
use crossterm::{cursor, execute, terminal};
use std::io;
use std::time::Duration;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::text::{Spans, Text};
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders, Paragraph};
use tui::Terminal;

/// Display is used by the driver to draw things on the screen. It should
/// abstract the implementation details, so a variety of kinds of screen would
/// work.
pub trait Display {
    /// draw one frame: the CHIP-8 screen plus the stat pane next to it
    fn draw(&mut self, frame: &Framebuffer, pane: &StatPane) -> Result<(), io::Error>;
}

/// everything the stat pane shows; the machine's own status plus what only
/// the driver knows
#[derive(Debug, Clone, PartialEq)]
pub struct StatPane {
    pub status: StatusFields,
    pub label: String,
    pub paused: bool,
    pub frame_time: Duration,
    pub fps: f64,
    /// code of the last key read from the terminal, 0 before any
    pub last_input: u32,
    /// the key latch, None when empty; shown as -1
    pub key: Option<u8>,
}

const SOUND_BAR: char = '█';

impl StatPane {
    /// one string per pane row, top to bottom. blank rows are kept so every
    /// item always lands on the same row
    pub fn lines(&self) -> Vec<String> {
        let s = &self.status;
        let message = s
            .fatal_error
            .as_deref()
            .or(s.last_warning.as_deref())
            .unwrap_or_default();
        vec![
            message.to_string(),
            if self.paused { "PAUSED".to_string() } else { String::new() },
            self.label.clone(),
            format!("Frame Time:  {:10.6}", self.frame_time.as_secs_f64()),
            format!("Frames per Second: {:4.0}", self.fps),
            format!("Code of Last Input: {:03}", self.last_input),
            format!("Key Buffer: {:02}", self.key.map_or(-1, |k| k as i16)),
            format!("Program Counter: {} 0x{:04x}", s.pc, s.pc),
            s.last_instruction.clone().unwrap_or_default(),
            format!("Current Cycle: {}", s.cycles),
            String::new(),
            String::new(),
            std::iter::repeat(SOUND_BAR)
                .take(s.sound_timer as usize)
                .collect(),
        ]
    }
}

// store useful metadata about the terminal
struct Resolution(usize, usize);

impl Resolution {
    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.0 - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.1 - 1) as f64, 0.0]
    }

    /// canvas coordinates of every pixel that is (or isn't) lit; y grows
    /// downwards on the CHIP-8, upwards on the canvas
    fn bitplane(&self, frame: &Framebuffer, lit: bool) -> Vec<(f64, f64)> {
        frame
            .rows()
            .enumerate()
            .flat_map(|(y, row)| {
                row.iter()
                    .enumerate()
                    .filter(move |&(_, &c)| (c == 1) == lit)
                    .map(move |(x, _)| (x as f64, -1.0 * y as f64))
            })
            .collect()
    }
}

/// monochrome display in a terminal, rendered using TUI and crossterm
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    resolution: Resolution,
}

impl MonoTermDisplay {
    pub fn new() -> Result<MonoTermDisplay, io::Error> {
        let mut stdout = io::stdout();
        execute!(stdout, terminal::EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.hide_cursor()?;
        terminal.clear()?;
        Ok(MonoTermDisplay {
            terminal,
            resolution: Resolution(SCREEN_WIDTH, SCREEN_HEIGHT),
        })
    }
}

impl Drop for MonoTermDisplay {
    fn drop(&mut self) {
        let out = self.terminal.backend_mut();
        if let Err(e) = execute!(out, terminal::LeaveAlternateScreen, cursor::Show) {
            log::error!("could not restore the terminal: {}", e);
        }
    }
}

impl Display for MonoTermDisplay {
    fn draw(&mut self, frame: &Framebuffer, pane: &StatPane) -> Result<(), io::Error> {
        let resolution = &self.resolution;
        let lines = pane.lines();

        // for now this assumes a 1:1 ratio between terminal, chip8 and the
        // internal TUI canvas
        self.terminal.draw(|f| {
            let screen = Rect::new(0, 0, 2 + resolution.0 as u16, 2 + resolution.1 as u16);
            let area = f.size().intersection(screen);

            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("CHIP-8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(resolution.x_bounds())
                .y_bounds(resolution.y_bounds())
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &resolution.bitplane(frame, false),
                        color: Color::Black,
                    });
                    ctx.draw(&Points {
                        coords: &resolution.bitplane(frame, true),
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, area);

            let size = f.size();
            if size.width > screen.width {
                let stats = Rect::new(
                    screen.width,
                    0,
                    size.width - screen.width,
                    screen.height.min(size.height),
                );
                let text = Text::from(
                    lines
                        .iter()
                        .map(|l| Spans::from(l.as_str()))
                        .collect::<Vec<_>>(),
                );
                let paragraph =
                    Paragraph::new(text).block(Block::default().title("stats").borders(Borders::ALL));
                f.render_widget(paragraph, stats);
            }
        })?;
        Ok(())
    }
}

/// useful for testing non-display routines; remembers the last pane drawn
#[derive(Default)]
pub struct DummyDisplay {
    pub frames: usize,
    pub last_pane: Option<StatPane>,
}

impl DummyDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Display for DummyDisplay {
    fn draw(&mut self, _frame: &Framebuffer, pane: &StatPane) -> Result<(), io::Error> {
        self.frames += 1;
        self.last_pane = Some(pane.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pane() -> StatPane {
        StatPane {
            status: StatusFields {
                pc: 0x202,
                last_instruction: Some("(6005 @ 0200)".to_string()),
                cycles: 1,
                delay_timer: 0,
                sound_timer: 3,
                last_warning: None,
                fatal_error: None,
            },
            label: "Press Ctrl+m to exit".to_string(),
            paused: false,
            frame_time: Duration::from_micros(2083),
            fps: 480.0,
            last_input: 0,
            key: None,
        }
    }

    // Resolution tests
    #[test]
    fn test_x_bounds() {
        let r = Resolution(64, 32);
        assert_eq!(r.x_bounds(), [0.0, 63.0]);
    }

    #[test]
    fn test_y_bounds() {
        let r = Resolution(64, 32);
        assert_eq!(r.y_bounds(), [-31.0, 0.0]);
    }

    #[test]
    fn test_bitplanes_split_screen() {
        let r = Resolution(64, 32);
        let mut fb = Framebuffer::new();
        fb.draw_sprite(&[0x80], 3, 2);
        assert_eq!(r.bitplane(&fb, true), vec![(3.0, -2.0)]);
        assert_eq!(r.bitplane(&fb, false).len(), 64 * 32 - 1);
    }

    // StatPane tests
    #[test]
    fn test_pane_rows() {
        let lines = pane().lines();
        assert_eq!(lines[0], "");
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "Press Ctrl+m to exit");
        assert_eq!(lines[3], "Frame Time:    0.002083");
        assert_eq!(lines[4], "Frames per Second:  480");
        assert_eq!(lines[5], "Code of Last Input: 000");
        assert_eq!(lines[6], "Key Buffer: -1");
        assert_eq!(lines[7], "Program Counter: 514 0x0202");
        assert_eq!(lines[8], "(6005 @ 0200)");
        assert_eq!(lines[9], "Current Cycle: 1");
        assert_eq!(lines[12], "███");
    }

    #[test]
    fn test_pane_prefers_fatal() {
        let mut p = pane();
        p.paused = true;
        p.key = Some(0xA);
        p.status.last_warning = Some("Warning: ignored instruction 0x0123".to_string());
        assert_eq!(p.lines()[0], "Warning: ignored instruction 0x0123");
        p.status.fatal_error = Some("Error: cannot return out of an empty stack".to_string());
        let lines = p.lines();
        assert_eq!(lines[0], "Error: cannot return out of an empty stack");
        assert_eq!(lines[1], "PAUSED");
        assert_eq!(lines[6], "Key Buffer: 10");
    }

    #[test]
    fn test_dummy_display_records() -> Result<(), io::Error> {
        let mut d = DummyDisplay::new();
        d.draw(&Framebuffer::new(), &pane())?;
        assert_eq!(d.frames, 1);
        assert_eq!(d.last_pane, Some(pane()));
        Ok(())
    }

    #[test]
    #[ignore]
    // NB. needs a real terminal
    fn test_draw_on_terminal() -> Result<(), io::Error> {
        let mut d = MonoTermDisplay::new()?;
        d.draw(&Framebuffer::new(), &pane())
    }
}
