//! Fixed-timestep accumulator.
//!
//! The host hands over its measured frame delta with `advance`; the driver
//! then drains whole `fixed_dt` slices with `should_step`. Simulation code
//! only ever sees `fixed_dt`, which keeps replays deterministic regardless of
//! the host's frame pacing.

/// Largest host delta a single `advance` accepts before capping.
pub const MAX_FRAME_DT: f64 = 0.25;

pub struct TimeState {
    pub fixed_dt: f64,
    pub max_accumulator: f64,
    accumulator: f64,
    pub total_time: f64,
    pub fixed_step_count: u64,
    pub frame_count: u64,
    pub steps_this_frame: u32,
    pub real_dt: f64,
    pub interpolation_alpha: f64,
}

impl TimeState {
    pub fn new() -> Self {
        Self::with_fixed_dt(1.0 / 60.0)
    }

    /// The cap never drops below `fixed_dt`, so an uncapped frame of exactly
    /// `fixed_dt` always runs one step.
    pub fn with_fixed_dt(fixed_dt: f64) -> Self {
        Self {
            fixed_dt,
            max_accumulator: MAX_FRAME_DT.max(fixed_dt),
            accumulator: 0.0,
            total_time: 0.0,
            fixed_step_count: 0,
            frame_count: 0,
            steps_this_frame: 0,
            real_dt: 0.0,
            interpolation_alpha: 0.0,
        }
    }

    pub fn advance(&mut self, real_dt: f64) {
        self.real_dt = real_dt.max(0.0);

        // Spiral-of-death cap
        if self.real_dt > self.max_accumulator {
            log::warn!(
                "Frame took {:.1}ms, capping accumulator to {}ms",
                self.real_dt * 1000.0,
                self.max_accumulator * 1000.0
            );
            self.real_dt = self.max_accumulator;
        }

        self.accumulator += self.real_dt;
        self.steps_this_frame = 0;
        self.frame_count += 1;
    }

    pub fn should_step(&mut self) -> bool {
        if self.accumulator >= self.fixed_dt {
            self.accumulator -= self.fixed_dt;
            self.total_time += self.fixed_dt;
            self.fixed_step_count += 1;
            self.steps_this_frame += 1;
            true
        } else {
            false
        }
    }

    pub fn end_frame(&mut self) {
        self.interpolation_alpha = self.accumulator / self.fixed_dt;
    }

    /// `fixed_dt` in whole microseconds, the unit animation timing runs on.
    pub fn fixed_dt_us(&self) -> u64 {
        (self.fixed_dt * 1_000_000.0).round() as u64
    }
}

impl Default for TimeState {
    fn default() -> Self {
        Self::new()
    }
}
