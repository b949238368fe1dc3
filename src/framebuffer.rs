use crate::machine::{Machine, FLAG_REGISTER};
use crate::memory::MemoryMap;

pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;
pub const SCREEN_COUNT: usize = SCREEN_WIDTH * SCREEN_HEIGHT;

/// the tallest sprite Dxyn can ask for
pub const MAX_SPRITE_ROWS: usize = 15;

/// 64x32 monochrome screen, one byte per pixel, row-major. every cell is 0 or 1
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    cells: [u8; SCREEN_COUNT],
}

impl Framebuffer {
    pub fn new() -> Self {
        Framebuffer {
            cells: [0; SCREEN_COUNT],
        }
    }

    /// rebuild from raw cells; None unless there are exactly SCREEN_COUNT of
    /// them and every one is 0 or 1
    pub(crate) fn from_cells(cells: &[u8]) -> Option<Self> {
        if cells.len() != SCREEN_COUNT || cells.iter().any(|&c| c > 1) {
            return None;
        }
        let mut fb = Framebuffer::new();
        fb.cells.copy_from_slice(cells);
        Some(fb)
    }

    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// is the pixel at (x, y) lit?
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.cells[x + y * SCREEN_WIDTH] == 1
    }

    pub(crate) fn set(&mut self, x: usize, y: usize, lit: bool) {
        self.cells[x + y * SCREEN_WIDTH] = lit as u8;
    }

    /// the raw cells, row-major
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// one slice of SCREEN_WIDTH cells per screen row, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.cells.chunks(SCREEN_WIDTH)
    }

    /// Draw a sprite with its top-left corner at (x, y), returning whether any
    /// lit pixel was switched off.
    ///
    /// The origin wraps onto the screen, the sprite itself does not:
    ///
    /// * a row that would land below the bottom edge ends the draw
    /// * a column that would land past the right edge ALSO ends the whole
    ///   draw, not just that row. any rows below it are never drawn
    /// * once done, the origin pixel is forced on whatever the XOR left there
    ///
    /// The last two are compatibility behaviours existing programs were
    /// tested against; keep them.
    pub fn draw_sprite(&mut self, sprite: &[u8], x: u8, y: u8) -> bool {
        let px = x as usize % SCREEN_WIDTH;
        let py = y as usize % SCREEN_HEIGHT;

        let collided = self.xor_rows(sprite, px, py);
        self.set(px, py, true);
        collided
    }

    fn xor_rows(&mut self, sprite: &[u8], px: usize, py: usize) -> bool {
        let mut collided = false;
        for (row, bits) in sprite.iter().enumerate() {
            if py + row > SCREEN_HEIGHT - 1 {
                return collided;
            }
            for col in 0..8 {
                if px + col > SCREEN_WIDTH - 1 {
                    return collided;
                }
                if (bits << col) & 0x80 == 0 {
                    continue;
                }
                let cell = &mut self.cells[px + col + (py + row) * SCREEN_WIDTH];
                if *cell == 1 {
                    *cell = 0;
                    collided = true;
                } else {
                    *cell = 1;
                }
            }
        }
        collided
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    /// Dxyn: draw `size` rows of sprite data from `sprite_addr` at (x, y) and
    /// leave the collision result in vF
    pub(crate) fn draw_sprite(&mut self, size: u8, sprite_addr: u16, x: u8, y: u8) {
        let mut sprite = [0u8; MAX_SPRITE_ROWS];
        let rows = (size as usize).min(MAX_SPRITE_ROWS);
        for (i, row) in sprite.iter_mut().take(rows).enumerate() {
            *row = self.memory.get_byte(sprite_addr.wrapping_add(i as u16));
        }

        self.registers[FLAG_REGISTER] = 0;
        if self.framebuffer.draw_sprite(&sprite[..rows], x, y) {
            self.registers[FLAG_REGISTER] = 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(fb: &Framebuffer) -> usize {
        fb.cells().iter().filter(|&&c| c == 1).count()
    }

    #[test]
    fn test_draws_glyph() {
        let mut fb = Framebuffer::new();
        // the "0" glyph, drawn at 1,1
        let collided = fb.draw_sprite(&[0xF0, 0x90, 0x90, 0x90, 0xF0], 1, 1);
        assert!(!collided);
        assert_eq!(fb.rows().nth(1).unwrap()[1..5], [1, 1, 1, 1]);
        assert_eq!(fb.rows().nth(2).unwrap()[1..5], [1, 0, 0, 1]);
        assert_eq!(fb.rows().nth(5).unwrap()[1..5], [1, 1, 1, 1]);
        assert_eq!(lit(&fb), 14);
    }

    #[test]
    fn test_xor_and_collision() {
        let mut fb = Framebuffer::new();
        fb.set(2, 0, true);
        fb.set(3, 0, true);
        fb.set(5, 0, true);
        let collided = fb.draw_sprite(&[0b1100_0000], 2, 0);
        assert!(collided);
        assert!(fb.get(2, 0)); // origin forced back on
        assert!(!fb.get(3, 0));
        assert!(fb.get(5, 0));
    }

    #[test]
    fn test_no_collision_when_only_lighting() {
        let mut fb = Framebuffer::new();
        fb.set(10, 10, true);
        assert!(!fb.draw_sprite(&[0b0111_0000], 10, 10));
    }

    #[test]
    fn test_origin_forced_on_after_erase() {
        let mut fb = Framebuffer::new();
        assert!(!fb.draw_sprite(&[0x80], 3, 3));
        assert!(fb.draw_sprite(&[0x80], 3, 3));
        assert!(fb.get(3, 3));
    }

    #[test]
    fn test_empty_sprite_lights_origin() {
        let mut fb = Framebuffer::new();
        assert!(!fb.draw_sprite(&[], 7, 9));
        assert!(fb.get(7, 9));
        assert_eq!(lit(&fb), 1);
    }

    #[test]
    fn test_origin_wraps() {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(&[0x80], 64 + 2, 32 + 1);
        assert!(fb.get(2, 1));
        assert_eq!(lit(&fb), 1);
    }

    #[test]
    fn test_bottom_edge_ends_draw() {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(&[0x80; 5], 0, 30);
        assert!(fb.get(0, 30));
        assert!(fb.get(0, 31));
        // nothing wrapped to the top
        assert!(!fb.get(0, 0));
        assert!(!fb.get(0, 1));
    }

    #[test]
    fn test_rows_past_bottom_never_collide() {
        let mut fb = Framebuffer::new();
        fb.set(0, 0, true);
        fb.set(0, 1, true);
        assert!(!fb.draw_sprite(&[0x80; 5], 0, 30));
        assert!(fb.get(0, 0));
        assert!(fb.get(0, 1));
    }

    #[test]
    fn test_right_edge_ends_whole_draw() {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(&[0xFF, 0xFF], 60, 0);
        assert_eq!(fb.rows().next().unwrap()[60..], [1, 1, 1, 1]);
        // nothing wrapped to the left edge
        assert!(!fb.get(0, 0));
        // and the second row was never reached
        assert_eq!(fb.rows().nth(1).unwrap()[60..], [0, 0, 0, 0]);
    }

    #[test]
    fn test_clipped_pixels_never_collide() {
        let mut fb = Framebuffer::new();
        fb.set(61, 1, true);
        fb.set(0, 0, true);
        assert!(!fb.draw_sprite(&[0xF0, 0xFF], 60, 0));
        assert!(fb.get(61, 1));
    }

    #[test]
    fn test_from_cells_validates() {
        assert!(Framebuffer::from_cells(&[0; SCREEN_COUNT]).is_some());
        assert!(Framebuffer::from_cells(&[0; SCREEN_COUNT - 1]).is_none());
        let mut bad = [0u8; SCREEN_COUNT];
        bad[100] = 2;
        assert!(Framebuffer::from_cells(&bad).is_none());
    }

    #[test]
    fn test_clear() {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(&[0xFF; 8], 0, 0);
        fb.clear();
        assert_eq!(lit(&fb), 0);
    }
}
