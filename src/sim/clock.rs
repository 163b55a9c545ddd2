//! Fixed-step simulation clock
//!
//! Decouples variable frame time from a deterministic physics step: frame
//! deltas pour into an accumulator and are drained in `step_size` chunks.
//! The same total elapsed time always yields the same step sequence, no
//! matter how it was split across frames.

use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::sanitize_delta;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationClock {
    accumulator: f32,
    step_size: f32,
    max_steps_per_frame: u32,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(SIM_DT, MAX_SUBSTEPS)
    }
}

impl SimulationClock {
    pub fn new(step_size: f32, max_steps_per_frame: u32) -> Self {
        let step_size = if step_size.is_finite() && step_size > 0.0 {
            step_size
        } else {
            log::warn!("Invalid step size {step_size}, using {SIM_DT}");
            SIM_DT
        };
        Self {
            accumulator: 0.0,
            step_size,
            max_steps_per_frame: max_steps_per_frame.max(1),
        }
    }

    /// Feed one frame's elapsed time; returns how many fixed steps to run.
    ///
    /// Invalid deltas count as zero. If the step cap is hit with a full step
    /// still pending, the backlog is dropped down to the fractional remainder.
    pub fn advance(&mut self, frame_delta: f32) -> u32 {
        self.accumulator += sanitize_delta(frame_delta);

        let mut steps = 0;
        while self.accumulator >= self.step_size && steps < self.max_steps_per_frame {
            self.accumulator -= self.step_size;
            steps += 1;
        }

        if self.accumulator >= self.step_size {
            let kept = self.accumulator % self.step_size;
            log::debug!(
                "Step cap hit, dropping {:.4}s of simulation time",
                self.accumulator - kept
            );
            self.accumulator = kept;
        }

        steps
    }

    /// Interpolation factor between the last two steps, in `[0, 1)`
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.step_size
    }

    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    pub fn step_size(&self) -> f32 {
        self.step_size
    }

    pub fn max_steps_per_frame(&self) -> u32 {
        self.max_steps_per_frame
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}
