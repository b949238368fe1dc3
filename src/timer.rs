use crate::machine::Machine;

impl Machine {
    /// Count both timers down by one, stopping at zero. Call once per executed
    /// cycle, and not at all while paused or halted.
    pub fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    /// should the renderer be showing/playing a tone?
    pub fn is_sounding(&self) -> bool {
        self.sound_timer > 0
    }
}
